//! Port for proposals, their share sessions and acceptance.
//!
//! Accepting a proposal writes the locked proposal and its new order in one
//! transaction; adapters must never leave one without the other.

use async_trait::async_trait;
use chrono::NaiveDate;
use pagination::{PageRequest, Paginated};
use uuid::Uuid;

use crate::domain::order::{DocumentNumber, Order};
use crate::domain::proposal::{Proposal, ProposalFilter};
use crate::domain::share::ShareSession;
use crate::domain::Error;

use super::{BackfillQuery, define_port_error};

define_port_error! {
    /// Errors raised by proposal repository adapters.
    pub enum ProposalPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "proposal repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "proposal repository query failed: {message}",
        /// A proposal or order number is already taken.
        DuplicateNumber { number: String } => "document number already taken: {number}",
        /// A share token hash collided with an existing session.
        DuplicateToken => "share token already exists",
        /// An order already exists for the proposal.
        AlreadyOrdered { proposal_id: Uuid } => "proposal {proposal_id} already has an order",
    }
}

impl From<ProposalPersistenceError> for Error {
    fn from(error: ProposalPersistenceError) -> Self {
        match error {
            ProposalPersistenceError::Connection { message } => {
                Self::service_unavailable(format!("proposal repository unavailable: {message}"))
            }
            ProposalPersistenceError::Query { message } => {
                Self::internal(format!("proposal repository error: {message}"))
            }
            ProposalPersistenceError::DuplicateNumber { number } => {
                Self::conflict(format!("number {number} is already in use"))
            }
            ProposalPersistenceError::DuplicateToken => {
                Self::internal("could not allocate a unique share token")
            }
            ProposalPersistenceError::AlreadyOrdered { .. } => {
                Self::conflict("proposal has already been accepted")
            }
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProposalRepository: Send + Sync {
    /// Page through live proposals matching the filter, newest first.
    async fn list(
        &self,
        filter: &ProposalFilter,
        page: PageRequest,
    ) -> Result<Paginated<Proposal>, ProposalPersistenceError>;

    /// Every live proposal matching the filter.
    async fn list_all(&self, filter: &ProposalFilter)
    -> Result<Vec<Proposal>, ProposalPersistenceError>;

    /// Number of live proposals matching the filter.
    async fn count(&self, filter: &ProposalFilter) -> Result<u64, ProposalPersistenceError>;

    /// Most recently updated live proposals.
    async fn latest(
        &self,
        filter: &ProposalFilter,
        limit: u32,
    ) -> Result<Vec<Proposal>, ProposalPersistenceError>;

    /// Fetch a proposal by identifier, including soft-deleted rows.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Proposal>, ProposalPersistenceError>;

    /// Insert a proposal. Fails with `DuplicateNumber` on a number collision.
    async fn insert(&self, proposal: &Proposal) -> Result<(), ProposalPersistenceError>;

    async fn update(&self, proposal: &Proposal) -> Result<(), ProposalPersistenceError>;

    /// Highest proposal sequence used on a numbering date, zero when none.
    async fn max_number_seq(&self, date: NaiveDate) -> Result<u32, ProposalPersistenceError>;

    /// Persist an accepted proposal together with its order.
    async fn record_acceptance(
        &self,
        proposal: &Proposal,
        order: &Order,
    ) -> Result<(), ProposalPersistenceError>;

    /// Store a share session. Fails with `DuplicateToken` on a hash collision.
    async fn insert_share_session(
        &self,
        session: &ShareSession,
    ) -> Result<(), ProposalPersistenceError>;

    async fn find_share_session(
        &self,
        token_hash: &str,
    ) -> Result<Option<ShareSession>, ProposalPersistenceError>;

    /// Proposals considered by the numbering backfill, oldest first.
    async fn backfill_candidates(
        &self,
        query: &BackfillQuery,
    ) -> Result<Vec<Proposal>, ProposalPersistenceError>;

    /// Write a proposal number. Fails with `DuplicateNumber` on a collision.
    async fn set_number(
        &self,
        id: Uuid,
        number: &DocumentNumber,
    ) -> Result<(), ProposalPersistenceError>;
}
