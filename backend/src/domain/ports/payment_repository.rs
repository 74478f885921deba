//! Port for payment persistence.
use async_trait::async_trait;
use pagination::{PageRequest, Paginated};
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::payment::{Payment, PaymentFilter};

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment repository adapters.
    pub enum PaymentPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "payment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "payment repository query failed: {message}",
        /// The order already has a pending, processing or completed payment.
        ActivePaymentExists { order_id: Uuid } =>
            "order {order_id} already has an active payment",
    }
}

impl From<PaymentPersistenceError> for Error {
    fn from(error: PaymentPersistenceError) -> Self {
        match error {
            PaymentPersistenceError::Connection { message } => {
                Self::service_unavailable(format!("payment repository unavailable: {message}"))
            }
            PaymentPersistenceError::Query { message } => {
                Self::internal(format!("payment repository error: {message}"))
            }
            PaymentPersistenceError::ActivePaymentExists { order_id } => Self::invalid_request(
                format!("order {order_id} already has an active payment"),
            ),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Page through payments, newest first. A `group_id` filter matches the
    /// owner group of the payment's order.
    async fn list(
        &self,
        filter: &PaymentFilter,
        page: PageRequest,
    ) -> Result<Paginated<Payment>, PaymentPersistenceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, PaymentPersistenceError>;

    async fn find_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, PaymentPersistenceError>;

    /// Most recent payment of an order.
    async fn find_latest_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<Payment>, PaymentPersistenceError>;

    /// A pending, processing or completed payment of the order, if any.
    async fn find_blocking_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<Payment>, PaymentPersistenceError>;

    /// Store a new payment. Fails with `ActivePaymentExists` when the order
    /// already has a blocking payment.
    async fn insert(&self, payment: &Payment) -> Result<(), PaymentPersistenceError>;

    /// Same uniqueness rule as [`insert`](Self::insert).
    async fn update(&self, payment: &Payment) -> Result<(), PaymentPersistenceError>;

    /// Remove a payment. Returns `false` when it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, PaymentPersistenceError>;
}
