//! Orders and the document-number backfill.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use pagination::{PageRequest, Paginated};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::order::{
    DateSource, DocumentNumber, Order, OrderBackfill, OrderFilter, ProposalBackfill,
    SequenceCounters, plan_order_backfill, plan_proposal_backfill, with_snapshot_number,
};
use crate::domain::ports::{
    BackfillQuery, OrderPersistenceError, OrderRepository, ProposalPersistenceError,
    ProposalRepository,
};
use crate::domain::proposal::Proposal;
use crate::domain::{Error, Permission, Principal};

use super::{MAX_NUMBER_ATTEMPTS, NumberingConfig, found};

/// Knobs for [`OrderService::backfill`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillOptions {
    /// Plan only; nothing is written.
    pub dry_run: bool,
    pub max: u32,
    pub since: Option<DateTime<Utc>>,
    pub ids: Vec<Uuid>,
    pub date_source: DateSource,
    /// Rewrite `snapshot.info.orderNumber` to match the order number.
    pub reconcile: bool,
    pub include_proposals: bool,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            max: 500,
            since: None,
            ids: Vec::new(),
            date_source: DateSource::default(),
            reconcile: true,
            include_proposals: false,
        }
    }
}

/// Kind of record touched by a backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackfillTarget {
    Order,
    Proposal,
}

/// One planned or applied number change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackfillChange {
    pub target: BackfillTarget,
    pub id: Uuid,
    pub from: Option<String>,
    pub to: String,
}

/// Outcome of a backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub dry_run: bool,
    pub scanned: u64,
    pub unchanged: u64,
    pub updated: u64,
    pub failed: u64,
    pub changes: Vec<BackfillChange>,
}

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    proposals: Arc<dyn ProposalRepository>,
    clock: Arc<dyn Clock>,
    numbering: NumberingConfig,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        proposals: Arc<dyn ProposalRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            proposals,
            clock,
            numbering: NumberingConfig::default(),
        }
    }

    #[must_use]
    pub fn with_numbering(mut self, numbering: NumberingConfig) -> Self {
        self.numbering = numbering;
        self
    }

    pub async fn list(
        &self,
        principal: &Principal,
        customer_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<Paginated<Order>, Error> {
        principal.require(Permission::ProposalsRead)?;
        let filter = OrderFilter {
            group_id: principal.scope.group_filter(),
            customer_id,
            ..OrderFilter::default()
        };
        Ok(self.orders.list(&filter, page).await?)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<Order, Error> {
        principal.require(Permission::ProposalsRead)?;
        let order = found(self.orders.find_by_id(id).await?, "order")?;
        principal.scope.ensure_visible(order.owner_group_id, "order")?;
        Ok(order)
    }

    /// Normalise order numbers (and optionally proposal numbers).
    ///
    /// Existing well-formed numbers are kept; missing or malformed ones get
    /// the next free sequence for their date. Collisions with rows written
    /// concurrently retry with a fresh sequence.
    pub async fn backfill(&self, options: &BackfillOptions) -> Result<BackfillReport, Error> {
        let query = BackfillQuery {
            ids: options.ids.clone(),
            since: options.since,
            limit: options.max,
        };
        let mut report = BackfillReport {
            dry_run: options.dry_run,
            ..BackfillReport::default()
        };
        self.backfill_orders(options, &query, &mut report).await?;
        if options.include_proposals {
            self.backfill_proposals(options, &query, &mut report).await?;
        }
        info!(
            dry_run = report.dry_run,
            scanned = report.scanned,
            updated = report.updated,
            unchanged = report.unchanged,
            failed = report.failed,
            "numbering backfill finished"
        );
        Ok(report)
    }

    async fn backfill_orders(
        &self,
        options: &BackfillOptions,
        query: &BackfillQuery,
        report: &mut BackfillReport,
    ) -> Result<(), Error> {
        let candidates = self.orders.backfill_candidates(query).await?;
        let today = self.clock.utc().date_naive();
        let date_of =
            |order: &Order| options.date_source.pick(order.accepted_at, order.created_at, today);
        let dates: Vec<NaiveDate> = candidates
            .iter()
            .map(date_of)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut counters = SequenceCounters::from_max(self.orders.max_number_seqs(&dates).await?);
        let prefix = self.numbering.order_prefix.as_str();

        for order in &candidates {
            report.scanned += 1;
            let date = date_of(order);
            let plan = match plan_order_backfill(order, date, prefix, options.reconcile, &mut counters)
            {
                Ok(plan) => plan,
                Err(err) => {
                    warn!(order_id = %order.id, error = %err, "cannot number order");
                    report.failed += 1;
                    continue;
                }
            };
            let OrderBackfill::Update {
                number, snapshot, ..
            } = plan
            else {
                report.unchanged += 1;
                continue;
            };
            if options.dry_run {
                report.record(BackfillTarget::Order, order.id, order.number.clone(), &number);
                continue;
            }
            match self
                .write_order_number(order, number, snapshot, date, &mut counters)
                .await?
            {
                Some(written) => {
                    report.record(BackfillTarget::Order, order.id, order.number.clone(), &written);
                }
                None => report.failed += 1,
            }
        }
        Ok(())
    }

    async fn write_order_number(
        &self,
        order: &Order,
        mut number: DocumentNumber,
        mut snapshot: bool,
        date: NaiveDate,
        counters: &mut SequenceCounters,
    ) -> Result<Option<DocumentNumber>, Error> {
        for attempt in 0..MAX_NUMBER_ATTEMPTS {
            let text = number.to_string();
            let new_snapshot = snapshot.then(|| with_snapshot_number(&order.snapshot, &text));
            match self.orders.set_number(order.id, &number, new_snapshot).await {
                Ok(()) => {
                    info!(order_id = %order.id, number = %text, "order numbered");
                    return Ok(Some(number));
                }
                Err(OrderPersistenceError::DuplicateNumber { number: taken }) => {
                    warn!(order_id = %order.id, %taken, attempt, "order number taken; reallocating");
                    number = match counters.next(&self.numbering.order_prefix, date) {
                        Ok(next) => next,
                        Err(err) => {
                            warn!(order_id = %order.id, error = %err, "no sequence left");
                            return Ok(None);
                        }
                    };
                    snapshot = true;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(None)
    }

    async fn backfill_proposals(
        &self,
        options: &BackfillOptions,
        query: &BackfillQuery,
        report: &mut BackfillReport,
    ) -> Result<(), Error> {
        let candidates = self.proposals.backfill_candidates(query).await?;
        let prefix = self.numbering.proposal_prefix.as_str();
        let mut counters = ProposalCounters::default();

        for proposal in &candidates {
            report.scanned += 1;
            let date = proposal.created_at.date_naive();
            let planned = match plan_proposal_backfill(proposal.number.as_deref(), prefix) {
                Ok(ProposalBackfill::Unchanged) => {
                    report.unchanged += 1;
                    continue;
                }
                Ok(ProposalBackfill::Rename(number)) => Ok(number),
                Ok(ProposalBackfill::Allocate) => {
                    counters.next(self.proposals.as_ref(), prefix, date).await?
                }
                Err(err) => Err(err),
            };
            let number = match planned {
                Ok(number) => number,
                Err(err) => {
                    warn!(proposal_id = %proposal.id, error = %err, "cannot number proposal");
                    report.failed += 1;
                    continue;
                }
            };
            if options.dry_run {
                report.record(BackfillTarget::Proposal, proposal.id, proposal.number.clone(), &number);
                continue;
            }
            match self
                .write_proposal_number(proposal, number, &mut counters)
                .await?
            {
                Some(written) => report.record(
                    BackfillTarget::Proposal,
                    proposal.id,
                    proposal.number.clone(),
                    &written,
                ),
                None => report.failed += 1,
            }
        }
        Ok(())
    }

    async fn write_proposal_number(
        &self,
        proposal: &Proposal,
        mut number: DocumentNumber,
        counters: &mut ProposalCounters,
    ) -> Result<Option<DocumentNumber>, Error> {
        let prefix = self.numbering.proposal_prefix.as_str();
        for attempt in 0..MAX_NUMBER_ATTEMPTS {
            match self.proposals.set_number(proposal.id, &number).await {
                Ok(()) => return Ok(Some(number)),
                Err(ProposalPersistenceError::DuplicateNumber { number: taken }) => {
                    warn!(proposal_id = %proposal.id, %taken, attempt, "proposal number taken; reallocating");
                    let date = number.date();
                    number = match counters.next(self.proposals.as_ref(), prefix, date).await? {
                        Ok(next) => next,
                        Err(err) => {
                            warn!(proposal_id = %proposal.id, error = %err, "no sequence left");
                            return Ok(None);
                        }
                    };
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(None)
    }
}

impl BackfillReport {
    fn record(
        &mut self,
        target: BackfillTarget,
        id: Uuid,
        from: Option<String>,
        to: &DocumentNumber,
    ) {
        self.updated += 1;
        self.changes.push(BackfillChange {
            target,
            id,
            from,
            to: to.to_string(),
        });
    }
}

/// Proposal counters seeded lazily from the repository, one date at a time.
#[derive(Default)]
struct ProposalCounters {
    counters: SequenceCounters,
    seeded: BTreeSet<NaiveDate>,
}

impl ProposalCounters {
    async fn next(
        &mut self,
        proposals: &dyn ProposalRepository,
        prefix: &str,
        date: NaiveDate,
    ) -> Result<Result<DocumentNumber, crate::domain::order::NumberingError>, Error> {
        if self.seeded.insert(date) {
            let max = proposals.max_number_seq(date).await?;
            self.counters.observe(date, max);
        }
        Ok(self.counters.next(prefix, date))
    }
}
