//! Port for order persistence and order-number maintenance.
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use pagination::{PageRequest, Paginated};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::order::{DocumentNumber, Order, OrderFilter};

use super::define_port_error;

define_port_error! {
    /// Errors raised by order repository adapters.
    pub enum OrderPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "order repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "order repository query failed: {message}",
        /// The order number is already taken.
        DuplicateNumber { number: String } => "order number already taken: {number}",
    }
}

impl From<OrderPersistenceError> for Error {
    fn from(error: OrderPersistenceError) -> Self {
        match error {
            OrderPersistenceError::Connection { message } => {
                Self::service_unavailable(format!("order repository unavailable: {message}"))
            }
            OrderPersistenceError::Query { message } => {
                Self::internal(format!("order repository error: {message}"))
            }
            OrderPersistenceError::DuplicateNumber { number } => {
                Self::conflict(format!("order number {number} is already in use"))
            }
        }
    }
}

/// Rows considered by a numbering backfill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillQuery {
    /// Restrict to these ids when non-empty.
    pub ids: Vec<Uuid>,
    /// Only rows created at or after this instant.
    pub since: Option<DateTime<Utc>>,
    pub limit: u32,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Page through orders matching the filter, newest first.
    async fn list(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<Paginated<Order>, OrderPersistenceError>;

    /// Every order matching the filter.
    async fn list_all(&self, filter: &OrderFilter) -> Result<Vec<Order>, OrderPersistenceError>;

    /// Number of orders matching the filter.
    async fn count(&self, filter: &OrderFilter) -> Result<u64, OrderPersistenceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, OrderPersistenceError>;

    async fn find_by_proposal(
        &self,
        proposal_id: Uuid,
    ) -> Result<Option<Order>, OrderPersistenceError>;

    /// Highest order sequence used on a numbering date, zero when none.
    async fn max_number_seq(&self, date: NaiveDate) -> Result<u32, OrderPersistenceError>;

    /// Highest sequence per date for the given dates; dates without
    /// numbers are omitted.
    async fn max_number_seqs(
        &self,
        dates: &[NaiveDate],
    ) -> Result<Vec<(NaiveDate, u32)>, OrderPersistenceError>;

    /// Orders considered by the numbering backfill, oldest first.
    async fn backfill_candidates(
        &self,
        query: &BackfillQuery,
    ) -> Result<Vec<Order>, OrderPersistenceError>;

    /// Write number, date and sequence columns and, when given, a new
    /// snapshot. Fails with `DuplicateNumber` on a collision.
    async fn set_number(
        &self,
        id: Uuid,
        number: &DocumentNumber,
        snapshot: Option<Value>,
    ) -> Result<(), OrderPersistenceError>;
}
