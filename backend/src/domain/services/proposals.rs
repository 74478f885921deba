//! Proposal lifecycle: creation, edits, sharing and acceptance.
//!
//! Numbers are allocated as `max(seq for the day) + 1` and rely on the
//! database unique index to detect races; a collision retries with the next
//! sequence up to [`MAX_NUMBER_ATTEMPTS`] times.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use pagination::{PageRequest, Paginated};
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::order::{
    DocumentNumber, NEW_ORDER_STATUS, NumberingError, Order, SequenceCounters,
    with_snapshot_number,
};
use crate::domain::ports::{
    LocationRepository, ManufacturerRepository, OrderRepository, ProposalPersistenceError,
    ProposalRepository, UserRepository,
};
use crate::domain::proposal::{
    Acceptor, CustomerRef, Proposal, ProposalDraft, ProposalFilter, ProposalKind,
    ProposalStatus, TransitionError,
};
use crate::domain::share::{MAX_TOKEN_ATTEMPTS, ShareSession, ShareToken, ShareTtl};
use crate::domain::{EmailAddress, Error, Permission, Principal, UserId};

use super::{CustomerService, MAX_NUMBER_ATTEMPTS, found, invalid};

/// Prefixes for generated document numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingConfig {
    pub order_prefix: String,
    pub proposal_prefix: String,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            order_prefix: "NJ".to_owned(),
            proposal_prefix: "NJQ".to_owned(),
        }
    }
}

/// Repositories the proposal workflow reads and writes.
#[derive(Clone)]
pub struct ProposalPorts {
    pub proposals: Arc<dyn ProposalRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub manufacturers: Arc<dyn ManufacturerRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub users: Arc<dyn UserRepository>,
}

/// A freshly created share link. The plain token is only available here.
#[derive(Debug, Clone)]
pub struct SharedProposal {
    pub token: ShareToken,
    pub session: ShareSession,
}

#[derive(Clone)]
pub struct ProposalService {
    ports: ProposalPorts,
    customers: CustomerService,
    clock: Arc<dyn Clock>,
    numbering: NumberingConfig,
    share_ttl: ShareTtl,
}

fn conflict(err: TransitionError) -> Error {
    Error::conflict(err.to_string())
}

fn numbering(err: NumberingError) -> Error {
    Error::conflict(err.to_string())
}

impl ProposalService {
    pub fn new(ports: ProposalPorts, customers: CustomerService, clock: Arc<dyn Clock>) -> Self {
        Self {
            ports,
            customers,
            clock,
            numbering: NumberingConfig::default(),
            share_ttl: ShareTtl::default(),
        }
    }

    #[must_use]
    pub fn with_numbering(mut self, numbering: NumberingConfig) -> Self {
        self.numbering = numbering;
        self
    }

    #[must_use]
    pub fn with_share_ttl(mut self, ttl: ShareTtl) -> Self {
        self.share_ttl = ttl;
        self
    }

    pub async fn list(
        &self,
        principal: &Principal,
        mut filter: ProposalFilter,
        page: PageRequest,
    ) -> Result<Paginated<Proposal>, Error> {
        principal.require(Permission::ProposalsRead)?;
        filter.group_id = principal.scope.group_filter();
        Ok(self.ports.proposals.list(&filter, page).await?)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<Proposal, Error> {
        principal.require(Permission::ProposalsRead)?;
        self.visible(principal, id).await
    }

    /// Create a proposal and allocate its number.
    ///
    /// References to records that do not exist are stored as null.
    pub async fn create(
        &self,
        principal: &Principal,
        draft: ProposalDraft,
    ) -> Result<Proposal, Error> {
        principal.require(Permission::ProposalsCreate)?;
        let now = self.clock.utc();
        let owner_group_id = principal.scope.owner_for_new(draft.owner_group_id);
        let mut proposal = Proposal {
            id: Uuid::new_v4(),
            number: None,
            customer_id: None,
            manufacturer_id: None,
            owner_group_id,
            created_by: Some(principal.user_id()),
            designer_id: None,
            sales_rep: None,
            lead_source: None,
            location_id: None,
            kind: ProposalKind::Proposal,
            status: draft.status,
            date: now,
            follow_up_dates: Vec::new(),
            description: None,
            manufacturers_data: Value::Null,
            grand_total: None,
            is_locked: false,
            accepted_at: None,
            accepted_by: None,
            sent_at: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.apply_draft(principal, &mut proposal, draft).await?;

        let day = now.date_naive();
        for attempt in 0..MAX_NUMBER_ATTEMPTS {
            let number = self.next_proposal_number(day, attempt).await?;
            proposal.number = Some(number.to_string());
            match self.ports.proposals.insert(&proposal).await {
                Ok(()) => {
                    info!(proposal_id = %proposal.id, %number, "proposal created");
                    return Ok(proposal);
                }
                Err(ProposalPersistenceError::DuplicateNumber { number }) => {
                    warn!(%number, attempt, "proposal number collision; retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(Error::conflict("could not allocate a proposal number"))
    }

    /// Replace editable fields. Locked and finished proposals are refused.
    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        draft: ProposalDraft,
    ) -> Result<Proposal, Error> {
        principal.require(Permission::ProposalsUpdate)?;
        let mut proposal = self.visible(principal, id).await?;
        proposal.ensure_editable().map_err(conflict)?;
        proposal.ensure_transition(draft.status).map_err(conflict)?;
        principal
            .scope
            .ensure_owner_unchanged(proposal.owner_group_id, draft.owner_group_id)?;
        if let Some(owner) = draft.owner_group_id {
            proposal.owner_group_id = Some(owner);
        }
        proposal.status = draft.status;
        self.apply_draft(principal, &mut proposal, draft).await?;
        proposal.updated_at = self.clock.utc();
        self.ports.proposals.update(&proposal).await?;
        Ok(proposal)
    }

    /// Soft-delete a proposal. Locked proposals are kept.
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), Error> {
        principal.require(Permission::ProposalsDelete)?;
        let mut proposal = self.visible(principal, id).await?;
        if proposal.is_locked {
            return Err(conflict(TransitionError::Locked));
        }
        proposal.is_deleted = true;
        proposal.updated_at = self.clock.utc();
        self.ports.proposals.update(&proposal).await?;
        info!(proposal_id = %id, "proposal deleted");
        Ok(())
    }

    pub async fn reject(&self, principal: &Principal, id: Uuid) -> Result<Proposal, Error> {
        principal.require(Permission::ProposalsUpdate)?;
        let mut proposal = self.visible(principal, id).await?;
        proposal.reject(self.clock.utc()).map_err(conflict)?;
        self.ports.proposals.update(&proposal).await?;
        info!(proposal_id = %id, "proposal rejected");
        Ok(proposal)
    }

    /// Accept on behalf of the signed-in user.
    pub async fn accept(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> Result<(Proposal, Order), Error> {
        principal.require(Permission::ProposalsAccept)?;
        let proposal = self.visible(principal, id).await?;
        self.finish_acceptance(proposal, Acceptor::Internal(principal.user_id()))
            .await
    }

    /// Accept through a share link, signed by the customer.
    pub async fn accept_public(
        &self,
        token: &str,
        name: &str,
        email: &str,
    ) -> Result<(Proposal, Order), Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_request("signer name must not be empty"));
        }
        let email = EmailAddress::new(email).map_err(invalid)?;
        let proposal = self.resolve_share(token).await?;
        let acceptor = Acceptor::External {
            name: name.to_owned(),
            email,
        };
        self.finish_acceptance(proposal, acceptor).await
    }

    /// Open a share session for a proposal. Drafts are marked as sent.
    pub async fn share(
        &self,
        principal: &Principal,
        id: Uuid,
        recipient_email: Option<&str>,
    ) -> Result<SharedProposal, Error> {
        principal.require(Permission::ProposalsUpdate)?;
        let recipient_email = recipient_email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(EmailAddress::new)
            .transpose()
            .map_err(invalid)?;
        let mut proposal = self.visible(principal, id).await?;
        let now = self.clock.utc();

        let mut shared = None;
        for attempt in 0..MAX_TOKEN_ATTEMPTS {
            let token = ShareToken::generate();
            let session = ShareSession {
                id: Uuid::new_v4(),
                proposal_id: proposal.id,
                token_hash: token.digest(),
                recipient_email: recipient_email.clone(),
                created_by: Some(principal.user_id()),
                expires_at: self.share_ttl.expires_at(now),
                created_at: now,
            };
            match self.ports.proposals.insert_share_session(&session).await {
                Ok(()) => {
                    shared = Some(SharedProposal { token, session });
                    break;
                }
                Err(ProposalPersistenceError::DuplicateToken) => {
                    warn!(attempt, "share token collision; retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
        let shared = shared.ok_or_else(|| Error::internal("could not allocate a share token"))?;

        if proposal.status == ProposalStatus::Draft || proposal.sent_at.is_none() {
            proposal.mark_sent(now);
            self.ports.proposals.update(&proposal).await?;
        }
        info!(proposal_id = %id, session_id = %shared.session.id, "proposal shared");
        Ok(shared)
    }

    /// Proposal behind a share token. Unknown and expired tokens are both
    /// reported as missing.
    pub async fn resolve_share(&self, token: &str) -> Result<Proposal, Error> {
        let digest = ShareToken::from_raw(token).digest();
        let session = self
            .ports
            .proposals
            .find_share_session(&digest)
            .await?
            .filter(|s| !s.is_expired(self.clock.utc()));
        let session = found(session, "share link")?;
        found(
            self.ports
                .proposals
                .find_by_id(session.proposal_id)
                .await?
                .filter(|p| !p.is_deleted),
            "proposal",
        )
    }

    async fn finish_acceptance(
        &self,
        mut proposal: Proposal,
        acceptor: Acceptor,
    ) -> Result<(Proposal, Order), Error> {
        let now = self.clock.utc();
        proposal.accept(&acceptor, now).map_err(conflict)?;
        if self.ports.orders.find_by_proposal(proposal.id).await?.is_some() {
            return Err(conflict(TransitionError::AlreadyAccepted));
        }

        let day = now.date_naive();
        for attempt in 0..MAX_NUMBER_ATTEMPTS {
            let base = self.ports.orders.max_number_seq(day).await?;
            let number = SequenceCounters::from_max([(day, base + offset(attempt))])
                .next(&self.numbering.order_prefix, day)
                .map_err(numbering)?;
            let order = build_order(&proposal, &number, now);
            match self.ports.proposals.record_acceptance(&proposal, &order).await {
                Ok(()) => {
                    info!(
                        proposal_id = %proposal.id,
                        order_id = %order.id,
                        %number,
                        "proposal accepted"
                    );
                    return Ok((proposal, order));
                }
                Err(ProposalPersistenceError::DuplicateNumber { number }) => {
                    warn!(%number, attempt, "order number collision; retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(Error::conflict("could not allocate an order number"))
    }

    async fn next_proposal_number(
        &self,
        day: NaiveDate,
        attempt: usize,
    ) -> Result<DocumentNumber, Error> {
        let base = self.ports.proposals.max_number_seq(day).await?;
        SequenceCounters::from_max([(day, base + offset(attempt))])
            .next(&self.numbering.proposal_prefix, day)
            .map_err(numbering)
    }

    /// Copy draft fields, dropping references that do not resolve.
    async fn apply_draft(
        &self,
        principal: &Principal,
        proposal: &mut Proposal,
        draft: ProposalDraft,
    ) -> Result<(), Error> {
        proposal.customer_id = match draft.customer {
            CustomerRef::None => None,
            CustomerRef::Existing(id) => self
                .customers
                .find_visible(principal, id)
                .await?
                .map(|c| c.id),
            CustomerRef::FindOrCreate { name, email } => Some(
                self.customers
                    .find_or_create(&name, email, proposal.owner_group_id)
                    .await?
                    .id,
            ),
        };
        proposal.manufacturer_id = match draft.manufacturer_id {
            Some(id) => self
                .ports
                .manufacturers
                .find_by_id(id)
                .await?
                .map(|m| m.id),
            None => None,
        };
        proposal.location_id = match draft.location_id {
            Some(id) => self.ports.locations.find_by_id(id).await?.map(|l| l.id),
            None => None,
        };
        proposal.designer_id = match draft.designer_id {
            Some(id) => self.live_user(id).await?,
            None => None,
        };
        proposal.sales_rep = draft.sales_rep;
        proposal.lead_source = draft.lead_source;
        if let Some(date) = draft.date {
            proposal.date = date;
        }
        proposal.follow_up_dates = draft.follow_up_dates;
        proposal.description = draft.description;
        proposal.manufacturers_data = draft.manufacturers_data;
        proposal.grand_total = draft.grand_total;
        Ok(())
    }

    async fn live_user(&self, id: UserId) -> Result<Option<UserId>, Error> {
        Ok(self
            .ports
            .users
            .find_by_id(&id)
            .await?
            .filter(|u| !u.is_deleted)
            .map(|u| u.id))
    }

    async fn visible(&self, principal: &Principal, id: Uuid) -> Result<Proposal, Error> {
        let proposal = found(
            self.ports
                .proposals
                .find_by_id(id)
                .await?
                .filter(|p| !p.is_deleted),
            "proposal",
        )?;
        principal
            .scope
            .ensure_visible(proposal.owner_group_id, "proposal")?;
        Ok(proposal)
    }
}

fn offset(attempt: usize) -> u32 {
    u32::try_from(attempt).unwrap_or(u32::MAX)
}

fn build_order(proposal: &Proposal, number: &DocumentNumber, now: DateTime<Utc>) -> Order {
    let number_text = number.to_string();
    Order {
        id: Uuid::new_v4(),
        proposal_id: proposal.id,
        number: Some(number_text.clone()),
        number_date: Some(number.date()),
        number_seq: Some(number.seq()),
        owner_group_id: proposal.owner_group_id,
        customer_id: proposal.customer_id,
        manufacturer_id: proposal.manufacturer_id,
        style_name: style_name(&proposal.manufacturers_data),
        accepted_by: proposal.accepted_by.clone(),
        accepted_at: proposal.accepted_at,
        status: NEW_ORDER_STATUS.to_owned(),
        grand_total: proposal.total(),
        snapshot: with_snapshot_number(&snapshot(proposal), &number_text),
        created_at: now,
    }
}

/// Frozen view of the proposal stored on its order.
fn snapshot(proposal: &Proposal) -> Value {
    json!({
        "info": {
            "proposalId": proposal.id,
            "proposalNumber": proposal.number,
            "acceptedBy": proposal.accepted_by,
            "acceptedAt": proposal.accepted_at,
            "description": proposal.description,
        },
        "customerId": proposal.customer_id,
        "manufacturerId": proposal.manufacturer_id,
        "manufacturersData": proposal.manufacturers_data,
        "grandTotal": proposal.total(),
    })
}

/// Style picked in the first manufacturer block, if any.
fn style_name(data: &Value) -> Option<String> {
    let first = match data {
        Value::Array(blocks) => blocks.first()?,
        other => other,
    };
    ["styleName", "selectedStyle", "style"]
        .iter()
        .find_map(|key| first.get(*key)?.as_str())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    //! Numbering, acceptance and share-link behaviour against mocked ports.
    use super::*;
    use crate::domain::access::fixtures;
    use crate::domain::permissions::ModuleAccess;
    use crate::domain::ports::{
        MockCustomerRepository, MockLocationRepository, MockManufacturerRepository,
        MockOrderRepository, MockProposalRepository, MockUserRepository,
    };
    use crate::domain::proposal::{ProposalInput, sample};
    use crate::domain::services::fixtures::{clock, fixed_now};
    use crate::domain::ErrorCode;
    use chrono::Duration;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    struct Mocks {
        proposals: MockProposalRepository,
        orders: MockOrderRepository,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                proposals: MockProposalRepository::new(),
                orders: MockOrderRepository::new(),
            }
        }

        fn service(self) -> ProposalService {
            let clock = clock();
            let ports = ProposalPorts {
                proposals: Arc::new(self.proposals),
                orders: Arc::new(self.orders),
                manufacturers: Arc::new(MockManufacturerRepository::new()),
                locations: Arc::new(MockLocationRepository::new()),
                users: Arc::new(MockUserRepository::new()),
            };
            let customers = CustomerService::new(Arc::new(MockCustomerRepository::new()), clock.clone());
            ProposalService::new(ports, customers, clock)
        }
    }

    fn empty_draft() -> ProposalDraft {
        ProposalDraft::try_new(ProposalInput::default()).expect("draft")
    }

    fn stored(status: ProposalStatus) -> Proposal {
        let mut proposal = sample(status);
        proposal.number = Some("NJQ-001-031425".to_owned());
        proposal.grand_total = Some(dec!(1250.50));
        proposal
    }

    #[rstest]
    #[tokio::test]
    async fn create_allocates_next_daily_number() {
        let mut mocks = Mocks::new();
        mocks.proposals.expect_max_number_seq().return_once(|_| Ok(4));
        mocks
            .proposals
            .expect_insert()
            .withf(|p| p.number.as_deref() == Some("NJQ-005-031525"))
            .return_once(|_| Ok(()));

        let proposal = mocks
            .service()
            .create(&fixtures::admin(), empty_draft())
            .await
            .expect("created");
        assert_eq!(proposal.status, ProposalStatus::Draft);
        assert_eq!(proposal.date, fixed_now());
    }

    #[rstest]
    #[tokio::test]
    async fn create_retries_on_number_collision() {
        let mut mocks = Mocks::new();
        mocks.proposals.expect_max_number_seq().times(2).returning(|_| Ok(0));
        mocks
            .proposals
            .expect_insert()
            .withf(|p| p.number.as_deref() == Some("NJQ-001-031525"))
            .times(1)
            .returning(|_| Err(ProposalPersistenceError::duplicate_number("NJQ-001-031525")));
        mocks
            .proposals
            .expect_insert()
            .withf(|p| p.number.as_deref() == Some("NJQ-002-031525"))
            .times(1)
            .returning(|_| Ok(()));

        let proposal = mocks
            .service()
            .create(&fixtures::admin(), empty_draft())
            .await
            .expect("created");
        assert_eq!(proposal.number.as_deref(), Some("NJQ-002-031525"));
    }

    #[rstest]
    #[tokio::test]
    async fn contractor_proposals_belong_to_their_group() {
        let principal = fixtures::contractor(ModuleAccess::all());
        let own = principal.scope.group_filter();
        let mut mocks = Mocks::new();
        mocks.proposals.expect_max_number_seq().return_once(|_| Ok(0));
        mocks
            .proposals
            .expect_insert()
            .withf(move |p| p.owner_group_id == own)
            .return_once(|_| Ok(()));

        mocks
            .service()
            .create(&principal, empty_draft())
            .await
            .expect("created");
    }

    #[rstest]
    #[tokio::test]
    async fn accept_locks_proposal_and_creates_numbered_order() {
        let proposal = stored(ProposalStatus::Sent);
        let id = proposal.id;
        let mut mocks = Mocks::new();
        mocks
            .proposals
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(proposal)));
        mocks.orders.expect_find_by_proposal().return_once(|_| Ok(None));
        mocks.orders.expect_max_number_seq().return_once(|_| Ok(2));
        mocks
            .proposals
            .expect_record_acceptance()
            .withf(|p, o| p.is_locked && o.number.as_deref() == Some("NJ-003-031525"))
            .return_once(|_, _| Ok(()));

        let (proposal, order) = mocks
            .service()
            .accept(&fixtures::admin(), id)
            .await
            .expect("accepted");
        assert_eq!(proposal.status, ProposalStatus::Accepted);
        assert_eq!(proposal.kind, ProposalKind::Order);
        assert_eq!(order.grand_total, dec!(1250.50));
        assert_eq!(order.status, NEW_ORDER_STATUS);
        assert_eq!(
            crate::domain::order::snapshot_number(&order.snapshot),
            Some("NJ-003-031525")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn accept_fails_once_the_day_has_issued_every_order_number() {
        let proposal = stored(ProposalStatus::Sent);
        let id = proposal.id;
        let mut mocks = Mocks::new();
        mocks
            .proposals
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(proposal)));
        mocks.orders.expect_find_by_proposal().return_once(|_| Ok(None));
        mocks
            .orders
            .expect_max_number_seq()
            .return_once(|_| Ok(crate::domain::order::MAX_SEQUENCE));
        mocks.proposals.expect_record_acceptance().never();

        let err = mocks
            .service()
            .accept(&fixtures::admin(), id)
            .await
            .expect_err("numbers exhausted");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[case::accepted(ProposalStatus::Accepted, false)]
    #[case::rejected(ProposalStatus::Rejected, false)]
    #[case::locked(ProposalStatus::Sent, true)]
    #[tokio::test]
    async fn accept_refuses_finished_or_locked(
        #[case] status: ProposalStatus,
        #[case] locked: bool,
    ) {
        let mut proposal = stored(status);
        proposal.is_locked = locked;
        let id = proposal.id;
        let mut mocks = Mocks::new();
        mocks
            .proposals
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(proposal)));
        mocks.proposals.expect_record_acceptance().never();

        let err = mocks
            .service()
            .accept(&fixtures::admin(), id)
            .await
            .expect_err("refused");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn locked_proposal_cannot_be_edited() {
        let mut proposal = stored(ProposalStatus::Sent);
        proposal.is_locked = true;
        let id = proposal.id;
        let mut mocks = Mocks::new();
        mocks
            .proposals
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(proposal)));
        mocks.proposals.expect_update().never();

        let err = mocks
            .service()
            .update(&fixtures::admin(), id, empty_draft())
            .await
            .expect_err("locked");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn sharing_a_draft_marks_it_sent() {
        let proposal = stored(ProposalStatus::Draft);
        let id = proposal.id;
        let mut mocks = Mocks::new();
        mocks
            .proposals
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(proposal)));
        mocks
            .proposals
            .expect_insert_share_session()
            .withf(|s| s.token_hash.len() == 64 && s.expires_at == fixed_now() + Duration::hours(24))
            .return_once(|_| Ok(()));
        mocks
            .proposals
            .expect_update()
            .withf(|p| p.status == ProposalStatus::Sent && p.sent_at == Some(fixed_now()))
            .return_once(|_| Ok(()));

        let shared = mocks
            .service()
            .share(&fixtures::admin(), id, Some("client@home.test"))
            .await
            .expect("shared");
        assert_eq!(shared.session.token_hash, shared.token.digest());
    }

    #[rstest]
    #[tokio::test]
    async fn expired_share_link_is_not_found() {
        let mut mocks = Mocks::new();
        mocks.proposals.expect_find_share_session().return_once(|hash| {
            Ok(Some(ShareSession {
                id: Uuid::new_v4(),
                proposal_id: Uuid::new_v4(),
                token_hash: hash.to_owned(),
                recipient_email: None,
                created_by: None,
                expires_at: fixed_now(),
                created_at: fixed_now() - Duration::hours(24),
            }))
        });
        mocks.proposals.expect_find_by_id().never();

        let err = mocks
            .service()
            .resolve_share("stale-token")
            .await
            .expect_err("expired");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[case(json!([{"styleName": "Shaker White"}]), Some("Shaker White"))]
    #[case(json!({"selectedStyle": "Slab"}), Some("Slab"))]
    #[case(Value::Null, None)]
    fn style_name_reads_first_block(#[case] data: Value, #[case] expected: Option<&str>) {
        assert_eq!(style_name(&data).as_deref(), expected);
    }
}
