//! PostgreSQL-backed `PaymentRepository`.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{PageRequest, Paginated};
use uuid::Uuid;

use crate::domain::payment::{Payment, PaymentFilter, PaymentStatus};
use crate::domain::ports::{PaymentPersistenceError, PaymentRepository};

use super::diesel_error_mapping::{
    convert_rows, count_u64, map_basic_diesel_error, map_basic_pool_error, offset_i64,
    unique_violation,
};
use super::models::PaymentRow;
use super::pool::{DbPool, PoolError};
use super::schema::{orders, payments};

/// Partial unique index over `order_id` for blocking statuses.
const ACTIVE_PAYMENT_INDEX: &str = "payments_one_active_per_order";

const BLOCKING: [PaymentStatus; 3] = [
    PaymentStatus::Pending,
    PaymentStatus::Processing,
    PaymentStatus::Completed,
];

/// Diesel-backed payment storage.
#[derive(Clone)]
pub struct DieselPaymentRepository {
    pool: DbPool,
}

impl DieselPaymentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PaymentPersistenceError {
    map_basic_pool_error(error, PaymentPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> PaymentPersistenceError {
    map_basic_diesel_error(
        error,
        PaymentPersistenceError::query,
        PaymentPersistenceError::connection,
    )
}

/// Map a write failure, recognising the one-active-payment index.
fn map_write_error(error: diesel::result::Error, order_id: Uuid) -> PaymentPersistenceError {
    match unique_violation(&error) {
        Some(Some(ACTIVE_PAYMENT_INDEX)) => PaymentPersistenceError::active_payment_exists(order_id),
        _ => map_diesel_error(error),
    }
}

fn to_payment(row: PaymentRow) -> Result<Payment, PaymentPersistenceError> {
    Payment::try_from(row).map_err(PaymentPersistenceError::query)
}

fn filtered(filter: &PaymentFilter) -> payments::BoxedQuery<'static, Pg> {
    let mut query = payments::table.into_boxed();
    if let Some(group_id) = filter.group_id {
        query = query.filter(
            payments::order_id.eq_any(
                orders::table
                    .filter(orders::owner_group_id.eq(group_id))
                    .select(orders::id),
            ),
        );
    }
    if let Some(status) = filter.status {
        query = query.filter(payments::status.eq(status.as_str()));
    }
    if let Some(order_id) = filter.order_id {
        query = query.filter(payments::order_id.eq(order_id));
    }
    query
}

fn blocking_labels() -> Vec<&'static str> {
    BLOCKING.iter().map(|status| status.as_str()).collect()
}

#[async_trait]
impl PaymentRepository for DieselPaymentRepository {
    async fn list(
        &self,
        filter: &PaymentFilter,
        page: PageRequest,
    ) -> Result<Paginated<Payment>, PaymentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<PaymentRow> = filtered(filter)
            .select(PaymentRow::as_select())
            .order_by((payments::created_at.desc(), payments::id))
            .limit(i64::from(page.limit()))
            .offset(offset_i64(page.offset()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let items = convert_rows(rows, PaymentPersistenceError::query)?;
        Ok(Paginated::new(items, page, count_u64(total)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, PaymentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<PaymentRow> = payments::table
            .find(id)
            .select(PaymentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_payment).transpose()
    }

    async fn find_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, PaymentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<PaymentRow> = payments::table
            .filter(payments::transaction_id.eq(transaction_id))
            .select(PaymentRow::as_select())
            .order_by(payments::created_at.desc())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_payment).transpose()
    }

    async fn find_latest_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<Payment>, PaymentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<PaymentRow> = payments::table
            .filter(payments::order_id.eq(order_id))
            .select(PaymentRow::as_select())
            .order_by((payments::created_at.desc(), payments::id.desc()))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_payment).transpose()
    }

    async fn find_blocking_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<Payment>, PaymentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<PaymentRow> = payments::table
            .filter(payments::order_id.eq(order_id))
            .filter(payments::status.eq_any(blocking_labels()))
            .select(PaymentRow::as_select())
            .order_by(payments::created_at.desc())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_payment).transpose()
    }

    async fn insert(&self, payment: &Payment) -> Result<(), PaymentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(payments::table)
            .values(PaymentRow::from(payment))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_write_error(err, payment.order_id))
    }

    async fn update(&self, payment: &Payment) -> Result<(), PaymentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(payments::table.find(payment.id))
            .set(PaymentRow::from(payment))
            .execute(&mut conn)
            .await
            .map_err(|err| map_write_error(err, payment.order_id))?;
        if updated == 0 {
            return Err(PaymentPersistenceError::query("payment not found for update"));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, PaymentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(payments::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::debug_query;
    use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

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
            Some("payments")
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

    #[rstest]
    #[case(ACTIVE_PAYMENT_INDEX, true)]
    #[case("payments_pkey", false)]
    fn active_payment_index_is_recognised(#[case] constraint: &'static str, #[case] active: bool) {
        let order_id = Uuid::new_v4();
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(Violation(constraint)),
        );

        let mapped = map_write_error(error, order_id);

        assert_eq!(
            mapped == PaymentPersistenceError::active_payment_exists(order_id),
            active,
            "{mapped}"
        );
    }

    #[rstest]
    fn blocking_statuses_match_the_domain_rule() {
        for status in BLOCKING {
            assert!(status.blocks_new_payment(), "{status}");
        }
        for status in [PaymentStatus::Failed, PaymentStatus::Cancelled] {
            assert!(!blocking_labels().contains(&status.as_str()));
        }
    }

    #[rstest]
    fn group_filter_goes_through_the_owning_order() {
        let filter = PaymentFilter {
            group_id: Some(Uuid::nil()),
            ..PaymentFilter::default()
        };

        let sql = debug_query::<Pg, _>(&filtered(&filter).select(payments::id)).to_string();

        assert!(sql.contains("\"payments\".\"order_id\" = ANY(SELECT"), "{sql}");
        assert!(sql.contains("\"orders\".\"owner_group_id\""), "{sql}");
    }
}
