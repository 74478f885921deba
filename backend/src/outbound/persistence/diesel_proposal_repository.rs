//! PostgreSQL-backed `ProposalRepository`.
//!
//! Acceptance updates the proposal and inserts its order in one
//! transaction. Unique violations are told apart by constraint name:
//! `orders_proposal_id_key` means the proposal was already ordered, any
//! number key means a numbering collision.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use pagination::{PageRequest, Paginated};
use uuid::Uuid;

use crate::domain::ProposalStatus;
use crate::domain::order::{DocumentNumber, Order};
use crate::domain::ports::{BackfillQuery, ProposalPersistenceError, ProposalRepository};
use crate::domain::proposal::{Proposal, ProposalFilter};
use crate::domain::share::ShareSession;

use super::diesel_error_mapping::{
    convert_rows, count_u64, map_basic_diesel_error, map_basic_pool_error, offset_i64,
    unique_violation,
};
use super::models::{OrderRow, ProposalRow, ShareSessionRow};
use super::pool::{DbPool, PoolError};
use super::schema::{orders, proposals, share_sessions};
use super::sql_functions::{btrim, lower, regexp_replace};

const ORDER_PROPOSAL_KEY: &str = "orders_proposal_id_key";
const PROPOSAL_NUMBER_KEY: &str = "proposals_number_key";

/// Diesel-backed proposal storage.
#[derive(Clone)]
pub struct DieselProposalRepository {
    pool: DbPool,
}

impl DieselProposalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ProposalPersistenceError {
    map_basic_pool_error(error, ProposalPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ProposalPersistenceError {
    map_basic_diesel_error(
        error,
        ProposalPersistenceError::query,
        ProposalPersistenceError::connection,
    )
}

fn map_number_error(error: diesel::result::Error, number: &str) -> ProposalPersistenceError {
    if unique_violation(&error).is_some() {
        return ProposalPersistenceError::duplicate_number(number);
    }
    map_diesel_error(error)
}

fn map_acceptance_error(
    error: diesel::result::Error,
    proposal: &Proposal,
    order: &Order,
) -> ProposalPersistenceError {
    match unique_violation(&error) {
        Some(Some(ORDER_PROPOSAL_KEY)) => ProposalPersistenceError::already_ordered(proposal.id),
        Some(Some(PROPOSAL_NUMBER_KEY)) => {
            ProposalPersistenceError::duplicate_number(proposal.number.clone().unwrap_or_default())
        }
        Some(_) => {
            ProposalPersistenceError::duplicate_number(order.number.clone().unwrap_or_default())
        }
        None => map_diesel_error(error),
    }
}

/// Stored labels that parse to `status`, after lowercasing and turning
/// spaces and dashes into underscores.
fn stored_labels(status: ProposalStatus) -> Vec<&'static str> {
    let legacy: &[&'static str] = match status {
        ProposalStatus::Draft => &[""],
        ProposalStatus::FollowUp1 => &["followup_1"],
        ProposalStatus::FollowUp2 => &["followup_2"],
        ProposalStatus::FollowUp3 => &["followup_3"],
        ProposalStatus::Accepted => &["proposal_accepted"],
        ProposalStatus::Rejected => &["proposal_rejected"],
        _ => &[],
    };
    std::iter::once(status.as_str())
        .chain(legacy.iter().copied())
        .collect()
}

fn filtered(filter: &ProposalFilter) -> proposals::BoxedQuery<'static, Pg> {
    let mut query = proposals::table
        .filter(proposals::is_deleted.eq(false))
        .into_boxed();
    if let Some(group_id) = filter.group_id {
        query = query.filter(proposals::owner_group_id.eq(group_id));
    }
    let status_labels = filter.status.map(stored_labels);
    let set_labels = filter
        .status_set
        .map(|set| set.members().flat_map(stored_labels).collect::<Vec<_>>());
    for allowed in [status_labels, set_labels].into_iter().flatten() {
        let normalised = regexp_replace(
            lower(btrim(proposals::status)),
            "[ -]",
            "_",
            "g",
        );
        query = query.filter(normalised.eq_any(allowed));
    }
    if let Some(since) = filter.updated_since {
        query = query.filter(proposals::updated_at.ge(since));
    }
    if let Some(kind) = filter.kind {
        query = query.filter(lower(btrim(proposals::kind)).eq(kind.as_str()));
    }
    if let Some(customer_id) = filter.customer_id {
        query = query.filter(proposals::customer_id.eq(customer_id));
    }
    query
}

/// `LIKE` pattern matching every number issued on `date`.
fn date_suffix_pattern(date: NaiveDate) -> String {
    format!("%-{}", date.format("%m%d%y"))
}

fn max_seq_on(numbers: impl IntoIterator<Item = String>, date: NaiveDate) -> u32 {
    numbers
        .into_iter()
        .filter_map(|raw| raw.parse::<DocumentNumber>().ok())
        .filter(|number| number.date() == date)
        .map(|number| number.seq())
        .max()
        .unwrap_or(0)
}

#[async_trait]
impl ProposalRepository for DieselProposalRepository {
    async fn list(
        &self,
        filter: &ProposalFilter,
        page: PageRequest,
    ) -> Result<Paginated<Proposal>, ProposalPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<ProposalRow> = filtered(filter)
            .select(ProposalRow::as_select())
            .order_by((proposals::created_at.desc(), proposals::id))
            .limit(i64::from(page.limit()))
            .offset(offset_i64(page.offset()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let items = convert_rows(rows, ProposalPersistenceError::query)?;
        Ok(Paginated::new(items, page, count_u64(total)))
    }

    async fn list_all(
        &self,
        filter: &ProposalFilter,
    ) -> Result<Vec<Proposal>, ProposalPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ProposalRow> = filtered(filter)
            .select(ProposalRow::as_select())
            .order_by((proposals::created_at.desc(), proposals::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows, ProposalPersistenceError::query)
    }

    async fn count(&self, filter: &ProposalFilter) -> Result<u64, ProposalPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(count_u64(total))
    }

    async fn latest(
        &self,
        filter: &ProposalFilter,
        limit: u32,
    ) -> Result<Vec<Proposal>, ProposalPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ProposalRow> = filtered(filter)
            .select(ProposalRow::as_select())
            .order_by((proposals::updated_at.desc(), proposals::id))
            .limit(i64::from(limit))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows, ProposalPersistenceError::query)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Proposal>, ProposalPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ProposalRow> = proposals::table
            .find(id)
            .select(ProposalRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Proposal::try_from)
            .transpose()
            .map_err(ProposalPersistenceError::query)
    }

    async fn insert(&self, proposal: &Proposal) -> Result<(), ProposalPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(proposals::table)
            .values(ProposalRow::from(proposal))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_number_error(err, proposal.number.as_deref().unwrap_or_default()))
    }

    async fn update(&self, proposal: &Proposal) -> Result<(), ProposalPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(proposals::table.find(proposal.id))
            .set(ProposalRow::from(proposal))
            .execute(&mut conn)
            .await
            .map_err(|err| map_number_error(err, proposal.number.as_deref().unwrap_or_default()))?;
        if updated == 0 {
            return Err(ProposalPersistenceError::query(
                "proposal not found for update",
            ));
        }
        Ok(())
    }

    async fn max_number_seq(&self, date: NaiveDate) -> Result<u32, ProposalPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let numbers: Vec<Option<String>> = proposals::table
            .filter(proposals::number.like(date_suffix_pattern(date)))
            .select(proposals::number)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(max_seq_on(numbers.into_iter().flatten(), date))
    }

    async fn record_acceptance(
        &self,
        proposal: &Proposal,
        order: &Order,
    ) -> Result<(), ProposalPersistenceError> {
        let proposal_row = ProposalRow::from(proposal);
        let order_row = OrderRow::try_from(order).map_err(ProposalPersistenceError::query)?;
        let proposal_id = proposal.id;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let recorded = conn
            .transaction(|conn| {
                async move {
                    let existing: Option<Uuid> = orders::table
                        .filter(orders::proposal_id.eq(proposal_id))
                        .select(orders::id)
                        .first(conn)
                        .await
                        .optional()?;
                    if existing.is_some() {
                        return Ok(false);
                    }
                    diesel::update(proposals::table.find(proposal_id))
                        .set(&proposal_row)
                        .execute(conn)
                        .await?;
                    diesel::insert_into(orders::table)
                        .values(&order_row)
                        .execute(conn)
                        .await?;
                    Ok(true)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_acceptance_error(err, proposal, order))?;
        if !recorded {
            return Err(ProposalPersistenceError::already_ordered(proposal_id));
        }
        Ok(())
    }

    async fn insert_share_session(
        &self,
        session: &ShareSession,
    ) -> Result<(), ProposalPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(share_sessions::table)
            .values(ShareSessionRow::from(session))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if unique_violation(&err).is_some() {
                    ProposalPersistenceError::duplicate_token()
                } else {
                    map_diesel_error(err)
                }
            })
    }

    async fn find_share_session(
        &self,
        token_hash: &str,
    ) -> Result<Option<ShareSession>, ProposalPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ShareSessionRow> = share_sessions::table
            .filter(share_sessions::token_hash.eq(token_hash))
            .select(ShareSessionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(ShareSession::try_from)
            .transpose()
            .map_err(ProposalPersistenceError::query)
    }

    async fn backfill_candidates(
        &self,
        query: &BackfillQuery,
    ) -> Result<Vec<Proposal>, ProposalPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut statement = proposals::table
            .filter(proposals::is_deleted.eq(false))
            .into_boxed();
        if !query.ids.is_empty() {
            statement = statement.filter(proposals::id.eq_any(query.ids.clone()));
        }
        if let Some(since) = query.since {
            statement = statement.filter(proposals::created_at.ge(since));
        }
        let rows: Vec<ProposalRow> = statement
            .select(ProposalRow::as_select())
            .order_by((proposals::created_at, proposals::id))
            .limit(i64::from(query.limit))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows, ProposalPersistenceError::query)
    }

    async fn set_number(
        &self,
        id: Uuid,
        number: &DocumentNumber,
    ) -> Result<(), ProposalPersistenceError> {
        let formatted = number.to_string();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(proposals::table.find(id))
            .set(proposals::number.eq(&formatted))
            .execute(&mut conn)
            .await
            .map_err(|err| map_number_error(err, &formatted))?;
        if updated == 0 {
            return Err(ProposalPersistenceError::query(
                "proposal not found for numbering",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
    use diesel::debug_query;
    use rstest::rstest;

    use crate::domain::proposal::{StatusSet, sample};

    struct Violation(&'static str);

    impl DatabaseErrorInformation for Violation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some(self.0)
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn violation(constraint: &'static str) -> DieselError {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, Box::new(Violation(constraint)))
    }

    fn order_for(proposal: &Proposal, number: &str) -> Order {
        Order {
            id: Uuid::new_v4(),
            proposal_id: proposal.id,
            number: Some(number.to_owned()),
            number_date: None,
            number_seq: None,
            owner_group_id: None,
            customer_id: None,
            manufacturer_id: None,
            style_name: None,
            accepted_by: None,
            accepted_at: None,
            status: "new".to_owned(),
            grand_total: rust_decimal::Decimal::ZERO,
            snapshot: serde_json::Value::Null,
            created_at: proposal.created_at,
        }
    }

    #[rstest]
    fn second_order_for_a_proposal_is_already_ordered() {
        let proposal = sample(ProposalStatus::Accepted);
        let order = order_for(&proposal, "ORD-001-010225");

        let err = map_acceptance_error(violation(ORDER_PROPOSAL_KEY), &proposal, &order);

        assert_eq!(err, ProposalPersistenceError::already_ordered(proposal.id));
    }

    #[rstest]
    fn order_number_clash_reports_the_order_number() {
        let proposal = sample(ProposalStatus::Accepted);
        let order = order_for(&proposal, "ORD-001-010225");

        let err = map_acceptance_error(violation("orders_number_key"), &proposal, &order);

        assert_eq!(err, ProposalPersistenceError::duplicate_number("ORD-001-010225"));
    }

    #[rstest]
    #[case(ProposalStatus::Accepted, &["accepted", "proposal_accepted"])]
    #[case(ProposalStatus::Draft, &["draft", ""])]
    #[case(ProposalStatus::DesignDone, &["design_done"])]
    fn status_filter_covers_legacy_labels(
        #[case] status: ProposalStatus,
        #[case] expected: &[&str],
    ) {
        assert_eq!(stored_labels(status), expected);
    }

    #[rstest]
    fn stored_labels_round_trip_through_parse() {
        for status in ProposalStatus::ALL {
            for label in stored_labels(status) {
                assert_eq!(ProposalStatus::parse(label), Ok(status), "{label}");
            }
        }
    }

    #[rstest]
    fn highest_sequence_ignores_other_dates_and_junk() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).expect("date");
        let numbers = [
            "PRO-004-010225".to_owned(),
            "PRO-011-010225".to_owned(),
            "PRO-099-010224".to_owned(),
            "legacy-12".to_owned(),
        ];

        assert_eq!(max_seq_on(numbers, date), 11);
        assert_eq!(date_suffix_pattern(date), "%-010225");
    }

    #[rstest]
    fn no_numbers_means_sequence_zero() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).expect("date");

        assert_eq!(max_seq_on(Vec::new(), date), 0);
    }

    #[rstest]
    fn dashboard_filters_reach_the_query() {
        let filter = ProposalFilter {
            status_set: Some(StatusSet::AwaitingApproval),
            updated_since: Some(chrono::Utc::now()),
            ..ProposalFilter::default()
        };

        let query = filtered(&filter).count();
        let sql = debug_query::<Pg, _>(&query).to_string();

        assert!(sql.contains("= ANY("), "{sql}");
        assert!(sql.contains("\"proposals\".\"updated_at\" >= $"), "{sql}");
        assert!(sql.contains("\"proposals\".\"is_deleted\" = $1"), "{sql}");
    }
}
