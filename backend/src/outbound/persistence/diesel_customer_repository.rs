//! PostgreSQL-backed `CustomerRepository`.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{PageRequest, Paginated};
use uuid::Uuid;

use crate::domain::EmailAddress;
use crate::domain::customer::{Customer, CustomerFilter};
use crate::domain::ports::{CustomerPersistenceError, CustomerRepository};

use super::diesel_error_mapping::{
    contains_pattern, convert_rows, count_u64, map_basic_diesel_error, map_basic_pool_error,
    offset_i64,
};
use super::models::CustomerRow;
use super::pool::{DbPool, PoolError};
use super::schema::customers;

/// Diesel-backed customer storage.
#[derive(Clone)]
pub struct DieselCustomerRepository {
    pool: DbPool,
}

impl DieselCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CustomerPersistenceError {
    map_basic_pool_error(error, CustomerPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CustomerPersistenceError {
    map_basic_diesel_error(
        error,
        CustomerPersistenceError::query,
        CustomerPersistenceError::connection,
    )
}

fn filtered(filter: &CustomerFilter) -> customers::BoxedQuery<'static, Pg> {
    let mut query = customers::table
        .filter(customers::is_deleted.eq(false))
        .into_boxed();
    if let Some(group_id) = filter.group_id {
        query = query.filter(customers::group_id.eq(group_id));
    }
    if let Some(needle) = filter.search.as_deref() {
        let pattern = contains_pattern(needle);
        query = query.filter(
            customers::name
                .ilike(pattern.clone())
                .or(customers::email.ilike(pattern.clone()))
                .or(customers::company.ilike(pattern)),
        );
    }
    query
}

#[async_trait]
impl CustomerRepository for DieselCustomerRepository {
    async fn list(
        &self,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> Result<Paginated<Customer>, CustomerPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<CustomerRow> = filtered(filter)
            .select(CustomerRow::as_select())
            .order_by((customers::created_at.desc(), customers::id))
            .limit(i64::from(page.limit()))
            .offset(offset_i64(page.offset()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let items = convert_rows(rows, CustomerPersistenceError::query)?;
        Ok(Paginated::new(items, page, count_u64(total)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, CustomerPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CustomerRow> = customers::table
            .find(id)
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Customer::try_from)
            .transpose()
            .map_err(CustomerPersistenceError::query)
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
        group_id: Option<Uuid>,
    ) -> Result<Option<Customer>, CustomerPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = customers::table
            .filter(customers::is_deleted.eq(false))
            .filter(customers::email.eq(email.as_str()))
            .into_boxed();
        query = match group_id {
            Some(group_id) => query.filter(customers::group_id.eq(group_id)),
            None => query.filter(customers::group_id.is_null()),
        };
        let row: Option<CustomerRow> = query
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Customer::try_from)
            .transpose()
            .map_err(CustomerPersistenceError::query)
    }

    async fn names(&self, ids: &[Uuid]) -> Result<Vec<(Uuid, String)>, CustomerPersistenceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        customers::table
            .filter(customers::id.eq_any(ids))
            .select((customers::id, customers::name))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn insert(&self, customer: &Customer) -> Result<(), CustomerPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(customers::table)
            .values(CustomerRow::from(customer))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, customer: &Customer) -> Result<(), CustomerPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(customers::table.find(customer.id))
            .set(CustomerRow::from(customer))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(CustomerPersistenceError::query(
                "customer not found for update",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::debug_query;
    use rstest::rstest;

    fn sql(filter: &CustomerFilter) -> String {
        debug_query::<Pg, _>(&filtered(filter).select(customers::id)).to_string()
    }

    #[rstest]
    fn unfiltered_listing_hides_deleted_customers() {
        let query = sql(&CustomerFilter::default());

        assert!(query.contains("\"is_deleted\" = $1"));
        assert!(!query.contains("ILIKE"));
    }

    #[rstest]
    fn search_covers_name_email_and_company() {
        let filter = CustomerFilter {
            group_id: Some(Uuid::nil()),
            search: Some("oak".to_owned()),
        };

        let query = sql(&filter);

        assert!(query.contains("\"customers\".\"group_id\" = $2"));
        for column in ["name", "email", "company"] {
            assert!(
                query.contains(&format!("\"customers\".\"{column}\" ILIKE")),
                "{column} missing from {query}"
            );
        }
    }
}
