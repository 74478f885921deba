//! Payments against orders and the gateway callback.

use std::sync::Arc;

use mockable::Clock;
use pagination::{PageRequest, Paginated};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::domain::payment::{GatewayEvent, Payment, PaymentDraft, PaymentFilter, PaymentStatus};
use crate::domain::ports::{OrderRepository, PaymentRepository};
use crate::domain::{Error, Permission, Principal};

use super::found;

#[derive(Clone)]
pub struct PaymentService {
    payments: Arc<dyn PaymentRepository>,
    orders: Arc<dyn OrderRepository>,
    clock: Arc<dyn Clock>,
}

impl PaymentService {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        orders: Arc<dyn OrderRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            payments,
            orders,
            clock,
        }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        mut filter: PaymentFilter,
        page: PageRequest,
    ) -> Result<Paginated<Payment>, Error> {
        principal.require(Permission::PaymentsRead)?;
        filter.group_id = principal.scope.group_filter();
        Ok(self.payments.list(&filter, page).await?)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<Payment, Error> {
        principal.require(Permission::PaymentsRead)?;
        self.visible(principal, id).await
    }

    /// Open a pending payment. An order may only have one active payment.
    pub async fn create(
        &self,
        principal: &Principal,
        draft: PaymentDraft,
    ) -> Result<Payment, Error> {
        principal.require(Permission::PaymentsCreate)?;
        let order = found(self.orders.find_by_id(draft.order_id).await?, "order")?;
        principal.scope.ensure_visible(order.owner_group_id, "order")?;
        if let Some(existing) = self.payments.find_blocking_for_order(order.id).await? {
            return Err(Error::invalid_request(format!(
                "order already has a {} payment",
                existing.status
            )));
        }
        let now = self.clock.utc();
        let payment = Payment {
            id: Uuid::new_v4(),
            order_id: order.id,
            amount: draft.amount,
            currency: draft.currency,
            status: PaymentStatus::Pending,
            payment_method: draft.payment_method,
            transaction_id: None,
            gateway_response: None,
            created_by: Some(principal.user_id()),
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        self.payments.insert(&payment).await?;
        info!(payment_id = %payment.id, order_id = %order.id, amount = %payment.amount, "payment created");
        Ok(payment)
    }

    pub async fn update_status(
        &self,
        principal: &Principal,
        id: Uuid,
        status: PaymentStatus,
        transaction_id: Option<String>,
        gateway_response: Option<Value>,
    ) -> Result<Payment, Error> {
        principal.require(Permission::PaymentsUpdate)?;
        let mut payment = self.visible(principal, id).await?;
        let previous = payment.status;
        payment.set_status(status, transaction_id, gateway_response, self.clock.utc());
        self.payments.update(&payment).await?;
        info!(payment_id = %id, from = %previous, to = %status, "payment status changed");
        Ok(payment)
    }

    /// Mark a payment completed by hand. Completed payments are returned
    /// unchanged.
    pub async fn apply(
        &self,
        principal: &Principal,
        id: Uuid,
        transaction_id: Option<String>,
        payment_method: Option<String>,
    ) -> Result<Payment, Error> {
        principal.require(Permission::PaymentsUpdate)?;
        let mut payment = self.visible(principal, id).await?;
        if payment.apply(transaction_id, payment_method, self.clock.utc()) {
            self.payments.update(&payment).await?;
            info!(payment_id = %id, "payment applied");
        }
        Ok(payment)
    }

    /// Delete a payment that never took money: pending, failed or
    /// cancelled.
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), Error> {
        principal.require(Permission::PaymentsDelete)?;
        let payment = self.visible(principal, id).await?;
        if !payment.status.is_deletable() {
            return Err(Error::invalid_request(format!(
                "{} payments cannot be deleted",
                payment.status
            )));
        }
        if !self.payments.delete(id).await? {
            return Err(Error::not_found("payment not found"));
        }
        info!(payment_id = %id, "payment deleted");
        Ok(())
    }

    /// Record a gateway callback. The payment is found by transaction id,
    /// then by the latest payment of the named order.
    pub async fn webhook(&self, event: GatewayEvent) -> Result<Payment, Error> {
        let by_transaction = match event.transaction_id.as_deref() {
            Some(tx) => self.payments.find_by_transaction(tx).await?,
            None => None,
        };
        let payment = match (by_transaction, event.order_id) {
            (Some(payment), _) => Some(payment),
            (None, Some(order_id)) => self.payments.find_latest_for_order(order_id).await?,
            (None, None) => None,
        };
        let mut payment = found(payment, "payment")?;
        payment.record_gateway_event(&event, self.clock.utc());
        self.payments.update(&payment).await?;
        info!(
            payment_id = %payment.id,
            outcome = %event.status,
            status = %payment.status,
            "payment gateway callback recorded"
        );
        Ok(payment)
    }

    async fn visible(&self, principal: &Principal, id: Uuid) -> Result<Payment, Error> {
        let payment = found(self.payments.find_by_id(id).await?, "payment")?;
        let owner = self
            .orders
            .find_by_id(payment.order_id)
            .await?
            .and_then(|o| o.owner_group_id);
        principal.scope.ensure_visible(owner, "payment")?;
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::fixtures;
    use crate::domain::order::{NEW_ORDER_STATUS, Order};
    use crate::domain::payment::DEFAULT_CURRENCY;
    use crate::domain::ports::{
        MockOrderRepository, MockPaymentRepository, PaymentPersistenceError,
    };
    use crate::domain::services::fixtures::{clock, fixed_now};
    use crate::domain::ErrorCode;
    use rstest::{fixture, rstest};
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[fixture]
    fn order() -> Order {
        Order {
            id: Uuid::new_v4(),
            proposal_id: Uuid::new_v4(),
            number: Some("NJ-001-031525".to_owned()),
            number_date: None,
            number_seq: None,
            owner_group_id: None,
            customer_id: None,
            manufacturer_id: None,
            style_name: None,
            accepted_by: None,
            accepted_at: None,
            status: NEW_ORDER_STATUS.to_owned(),
            grand_total: dec!(900),
            snapshot: Value::Null,
            created_at: fixed_now(),
        }
    }

    fn payment(order_id: Uuid, status: PaymentStatus) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            order_id,
            amount: dec!(450),
            currency: DEFAULT_CURRENCY.to_owned(),
            status,
            payment_method: None,
            transaction_id: None,
            gateway_response: None,
            created_by: None,
            paid_at: None,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    fn service(payments: MockPaymentRepository, orders: MockOrderRepository) -> PaymentService {
        PaymentService::new(Arc::new(payments), Arc::new(orders), clock())
    }

    #[rstest]
    #[tokio::test]
    async fn missing_order_is_not_found() {
        let mut orders = MockOrderRepository::new();
        orders.expect_find_by_id().return_once(|_| Ok(None));
        let draft = PaymentDraft::try_new(Uuid::new_v4(), dec!(10), None, None).expect("draft");

        let err = service(MockPaymentRepository::new(), orders)
            .create(&fixtures::admin(), draft)
            .await
            .expect_err("missing order");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn active_payment_blocks_another(order: Order) {
        let order_id = order.id;
        let mut orders = MockOrderRepository::new();
        orders.expect_find_by_id().return_once(move |_| Ok(Some(order)));
        let mut payments = MockPaymentRepository::new();
        payments
            .expect_find_blocking_for_order()
            .return_once(move |_| Ok(Some(payment(order_id, PaymentStatus::Pending))));
        payments.expect_insert().never();
        let draft = PaymentDraft::try_new(order_id, dec!(10), None, None).expect("draft");

        let err = service(payments, orders)
            .create(&fixtures::admin(), draft)
            .await
            .expect_err("blocked");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn concurrent_create_losing_the_insert_is_rejected(order: Order) {
        let order_id = order.id;
        let mut orders = MockOrderRepository::new();
        orders.expect_find_by_id().return_once(move |_| Ok(Some(order)));
        let mut payments = MockPaymentRepository::new();
        payments
            .expect_find_blocking_for_order()
            .return_once(|_| Ok(None));
        payments
            .expect_insert()
            .return_once(move |_| Err(PaymentPersistenceError::active_payment_exists(order_id)));
        let draft = PaymentDraft::try_new(order_id, dec!(10), None, None).expect("draft");

        let err = service(payments, orders)
            .create(&fixtures::admin(), draft)
            .await
            .expect_err("lost the race");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[case::completed(PaymentStatus::Completed)]
    #[case::processing(PaymentStatus::Processing)]
    #[tokio::test]
    async fn payments_that_took_money_are_kept(order: Order, #[case] status: PaymentStatus) {
        let stored = payment(order.id, status);
        let id = stored.id;
        let mut payments = MockPaymentRepository::new();
        payments.expect_find_by_id().return_once(move |_| Ok(Some(stored)));
        payments.expect_delete().never();
        let mut orders = MockOrderRepository::new();
        orders.expect_find_by_id().return_once(move |_| Ok(Some(order)));

        let err = service(payments, orders)
            .delete(&fixtures::admin(), id)
            .await
            .expect_err("kept");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[case::pending(PaymentStatus::Pending)]
    #[case::failed(PaymentStatus::Failed)]
    #[case::cancelled(PaymentStatus::Cancelled)]
    #[tokio::test]
    async fn unpaid_payments_can_be_deleted(order: Order, #[case] status: PaymentStatus) {
        let stored = payment(order.id, status);
        let id = stored.id;
        let mut payments = MockPaymentRepository::new();
        payments.expect_find_by_id().return_once(move |_| Ok(Some(stored)));
        payments.expect_delete().return_once(|_| Ok(true));
        let mut orders = MockOrderRepository::new();
        orders.expect_find_by_id().return_once(move |_| Ok(Some(order)));

        service(payments, orders)
            .delete(&fixtures::admin(), id)
            .await
            .expect("deleted");
    }

    #[rstest]
    #[tokio::test]
    async fn contractors_have_no_payment_access() {
        let err = service(MockPaymentRepository::new(), MockOrderRepository::new())
            .list(
                &fixtures::contractor(crate::domain::ModuleAccess::all()),
                PaymentFilter::default(),
                PageRequest::default(),
            )
            .await
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn applying_a_completed_payment_is_a_no_op(order: Order) {
        let mut stored = payment(order.id, PaymentStatus::Completed);
        stored.paid_at = Some(fixed_now());
        let id = stored.id;
        let mut payments = MockPaymentRepository::new();
        payments.expect_find_by_id().return_once(move |_| Ok(Some(stored)));
        payments.expect_update().never();
        let mut orders = MockOrderRepository::new();
        orders.expect_find_by_id().return_once(move |_| Ok(Some(order)));

        let applied = service(payments, orders)
            .apply(&fixtures::admin(), id, Some("tx-9".to_owned()), None)
            .await
            .expect("applied");
        assert_eq!(applied.transaction_id, None);
    }

    #[rstest]
    #[case::success("success", PaymentStatus::Completed)]
    #[case::failure("failed", PaymentStatus::Failed)]
    #[case::other("review", PaymentStatus::Processing)]
    #[tokio::test]
    async fn webhook_falls_back_to_order_lookup(
        #[case] outcome: &str,
        #[case] expected: PaymentStatus,
    ) {
        let order_id = Uuid::new_v4();
        let mut payments = MockPaymentRepository::new();
        payments.expect_find_by_transaction().return_once(|_| Ok(None));
        payments
            .expect_find_latest_for_order()
            .return_once(move |_| Ok(Some(payment(order_id, PaymentStatus::Pending))));
        payments
            .expect_update()
            .withf(move |p| p.status == expected && p.transaction_id.as_deref() == Some("tx-1"))
            .return_once(|_| Ok(()));
        let event = GatewayEvent {
            transaction_id: Some("tx-1".to_owned()),
            order_id: Some(order_id),
            status: outcome.to_owned(),
            raw: json!({"status": outcome}),
        };

        let updated = service(payments, MockOrderRepository::new())
            .webhook(event)
            .await
            .expect("recorded");
        assert_eq!(updated.paid_at.is_some(), expected == PaymentStatus::Completed);
    }

    #[rstest]
    #[tokio::test]
    async fn webhook_without_match_is_not_found() {
        let mut payments = MockPaymentRepository::new();
        payments.expect_find_by_transaction().return_once(|_| Ok(None));
        let event = GatewayEvent {
            transaction_id: Some("tx-unknown".to_owned()),
            order_id: None,
            status: "success".to_owned(),
            raw: Value::Null,
        };

        let err = service(payments, MockOrderRepository::new())
            .webhook(event)
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
