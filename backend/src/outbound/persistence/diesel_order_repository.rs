//! PostgreSQL-backed `OrderRepository`.
//!
//! Order numbers are mirrored into `number_date` and `number_seq` so the
//! next sequence for a day is a `MAX` over an indexed column rather than a
//! parse of every number string.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::dsl::max;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{PageRequest, Paginated};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::order::{DocumentNumber, Order, OrderFilter};
use crate::domain::ports::{BackfillQuery, OrderPersistenceError, OrderRepository};

use super::diesel_error_mapping::{
    convert_rows, count_u64, map_basic_diesel_error, map_basic_pool_error, offset_i64,
    unique_violation,
};
use super::models::OrderRow;
use super::pool::{DbPool, PoolError};
use super::schema::orders;

/// Diesel-backed order storage.
#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OrderPersistenceError {
    map_basic_pool_error(error, OrderPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> OrderPersistenceError {
    map_basic_diesel_error(
        error,
        OrderPersistenceError::query,
        OrderPersistenceError::connection,
    )
}

fn filtered(filter: &OrderFilter) -> orders::BoxedQuery<'static, Pg> {
    let mut query = orders::table.into_boxed();
    if let Some(group_id) = filter.group_id {
        query = query.filter(orders::owner_group_id.eq(group_id));
    }
    if let Some(customer_id) = filter.customer_id {
        query = query.filter(orders::customer_id.eq(customer_id));
    }
    if let Some(since) = filter.created_since {
        query = query.filter(orders::created_at.ge(since));
    }
    query
}

/// Drop negative or missing maxima; the column check forbids both.
fn seq_u32(seq: Option<i32>) -> u32 {
    seq.and_then(|value| u32::try_from(value).ok()).unwrap_or(0)
}

fn to_order(row: OrderRow) -> Result<Order, OrderPersistenceError> {
    Order::try_from(row).map_err(OrderPersistenceError::query)
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn list(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<Paginated<Order>, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<OrderRow> = filtered(filter)
            .select(OrderRow::as_select())
            .order_by((orders::created_at.desc(), orders::id))
            .limit(i64::from(page.limit()))
            .offset(offset_i64(page.offset()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let items = convert_rows(rows, OrderPersistenceError::query)?;
        Ok(Paginated::new(items, page, count_u64(total)))
    }

    async fn list_all(&self, filter: &OrderFilter) -> Result<Vec<Order>, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<OrderRow> = filtered(filter)
            .select(OrderRow::as_select())
            .order_by((orders::created_at.desc(), orders::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows, OrderPersistenceError::query)
    }

    async fn count(&self, filter: &OrderFilter) -> Result<u64, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(count_u64(total))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<OrderRow> = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_order).transpose()
    }

    async fn find_by_proposal(
        &self,
        proposal_id: Uuid,
    ) -> Result<Option<Order>, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<OrderRow> = orders::table
            .filter(orders::proposal_id.eq(proposal_id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_order).transpose()
    }

    async fn max_number_seq(&self, date: NaiveDate) -> Result<u32, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let highest: Option<i32> = orders::table
            .filter(orders::number_date.eq(date))
            .select(max(orders::number_seq))
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(seq_u32(highest))
    }

    async fn max_number_seqs(
        &self,
        dates: &[NaiveDate],
    ) -> Result<Vec<(NaiveDate, u32)>, OrderPersistenceError> {
        if dates.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(Option<NaiveDate>, Option<i32>)> = orders::table
            .filter(orders::number_date.eq_any(dates))
            .filter(orders::number_seq.is_not_null())
            .group_by(orders::number_date)
            .select((orders::number_date, max(orders::number_seq)))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .filter_map(|(date, seq)| Some((date?, seq_u32(seq))))
            .collect())
    }

    async fn backfill_candidates(
        &self,
        query: &BackfillQuery,
    ) -> Result<Vec<Order>, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut statement = orders::table.into_boxed();
        if !query.ids.is_empty() {
            statement = statement.filter(orders::id.eq_any(query.ids.clone()));
        }
        if let Some(since) = query.since {
            statement = statement.filter(orders::created_at.ge(since));
        }
        let rows: Vec<OrderRow> = statement
            .select(OrderRow::as_select())
            .order_by((orders::created_at, orders::id))
            .limit(i64::from(query.limit))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows, OrderPersistenceError::query)
    }

    async fn set_number(
        &self,
        id: Uuid,
        number: &DocumentNumber,
        snapshot: Option<Value>,
    ) -> Result<(), OrderPersistenceError> {
        let formatted = number.to_string();
        let seq = i32::try_from(number.seq())
            .map_err(|_| OrderPersistenceError::query("order sequence out of range"))?;
        let columns = (
            orders::number.eq(&formatted),
            orders::number_date.eq(number.date()),
            orders::number_seq.eq(seq),
        );
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let target = orders::table.find(id);
        let result = match snapshot {
            Some(snapshot) => {
                diesel::update(target)
                    .set((columns, orders::snapshot.eq(snapshot)))
                    .execute(&mut conn)
                    .await
            }
            None => diesel::update(target).set(columns).execute(&mut conn).await,
        };
        let updated = result.map_err(|err| {
            if unique_violation(&err).is_some() {
                OrderPersistenceError::duplicate_number(formatted.as_str())
            } else {
                map_diesel_error(err)
            }
        })?;
        if updated == 0 {
            return Err(OrderPersistenceError::query("order not found for numbering"));
        }
        Ok(())
    }
}
