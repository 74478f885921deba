//! Orders and payments.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use pagination::{PageRequest, Paginated};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::order::{DocumentNumber, Order, OrderFilter};
use crate::domain::payment::{Payment, PaymentFilter};
use crate::domain::ports::{
    BackfillQuery, OrderPersistenceError, OrderRepository, PaymentPersistenceError,
    PaymentRepository,
};

use super::{MemoryStore, Tables, paginate};

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn list(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<Paginated<Order>, OrderPersistenceError> {
        let rows = OrderRepository::list_all(self, filter).await?;
        Ok(paginate(rows, page))
    }

    async fn list_all(&self, filter: &OrderFilter) -> Result<Vec<Order>, OrderPersistenceError> {
        let tables = self.lock().map_err(OrderPersistenceError::query)?;
        let mut rows: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn count(&self, filter: &OrderFilter) -> Result<u64, OrderPersistenceError> {
        let tables = self.lock().map_err(OrderPersistenceError::query)?;
        Ok(tables.orders.values().filter(|o| filter.matches(o)).count() as u64)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, OrderPersistenceError> {
        let tables = self.lock().map_err(OrderPersistenceError::query)?;
        Ok(tables.orders.get(&id).cloned())
    }

    async fn find_by_proposal(
        &self,
        proposal_id: Uuid,
    ) -> Result<Option<Order>, OrderPersistenceError> {
        let tables = self.lock().map_err(OrderPersistenceError::query)?;
        Ok(tables
            .orders
            .values()
            .find(|o| o.proposal_id == proposal_id)
            .cloned())
    }

    async fn max_number_seq(&self, date: NaiveDate) -> Result<u32, OrderPersistenceError> {
        let found = OrderRepository::max_number_seqs(self, &[date]).await?;
        Ok(found.first().map_or(0, |(_, seq)| *seq))
    }

    async fn max_number_seqs(
        &self,
        dates: &[NaiveDate],
    ) -> Result<Vec<(NaiveDate, u32)>, OrderPersistenceError> {
        let tables = self.lock().map_err(OrderPersistenceError::query)?;
        let mut max: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        for order in tables.orders.values() {
            let (Some(date), Some(seq)) = (order.number_date, order.number_seq) else {
                continue;
            };
            if dates.contains(&date) {
                let entry = max.entry(date).or_default();
                *entry = (*entry).max(seq);
            }
        }
        Ok(max.into_iter().collect())
    }

    async fn backfill_candidates(
        &self,
        query: &BackfillQuery,
    ) -> Result<Vec<Order>, OrderPersistenceError> {
        let tables = self.lock().map_err(OrderPersistenceError::query)?;
        let mut rows: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| query.ids.is_empty() || query.ids.contains(&o.id))
            .filter(|o| query.since.is_none_or(|since| o.created_at >= since))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        rows.truncate(usize::try_from(query.limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn set_number(
        &self,
        id: Uuid,
        number: &DocumentNumber,
        snapshot: Option<Value>,
    ) -> Result<(), OrderPersistenceError> {
        let mut tables = self.lock().map_err(OrderPersistenceError::query)?;
        let text = number.to_string();
        if tables
            .orders
            .values()
            .any(|o| o.id != id && o.number.as_deref() == Some(text.as_str()))
        {
            return Err(OrderPersistenceError::duplicate_number(text));
        }
        if let Some(order) = tables.orders.get_mut(&id) {
            order.number = Some(text);
            order.number_date = Some(number.date());
            order.number_seq = Some(number.seq());
            if let Some(snapshot) = snapshot {
                order.snapshot = snapshot;
            }
        }
        Ok(())
    }
}

fn payment_visible(tables: &Tables, filter: &PaymentFilter, payment: &Payment) -> bool {
    let group_ok = filter.group_id.is_none_or(|group| {
        tables
            .orders
            .get(&payment.order_id)
            .is_some_and(|o| o.owner_group_id == Some(group))
    });
    group_ok
        && filter.status.is_none_or(|s| payment.status == s)
        && filter.order_id.is_none_or(|id| payment.order_id == id)
}

/// Another blocking payment exists for the order of a blocking `payment`.
fn second_active_payment(tables: &Tables, payment: &Payment) -> bool {
    payment.status.blocks_new_payment()
        && tables.payments.values().any(|other| {
            other.id != payment.id
                && other.order_id == payment.order_id
                && other.status.blocks_new_payment()
        })
}

fn newest_for_order<'a>(
    tables: &'a Tables,
    order_id: Uuid,
) -> impl Iterator<Item = &'a Payment> + 'a {
    let mut rows: Vec<&Payment> = tables
        .payments
        .values()
        .filter(|p| p.order_id == order_id)
        .collect();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows.into_iter()
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn list(
        &self,
        filter: &PaymentFilter,
        page: PageRequest,
    ) -> Result<Paginated<Payment>, PaymentPersistenceError> {
        let tables = self.lock().map_err(PaymentPersistenceError::query)?;
        let mut rows: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| payment_visible(&tables, filter, p))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(rows, page))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, PaymentPersistenceError> {
        let tables = self.lock().map_err(PaymentPersistenceError::query)?;
        Ok(tables.payments.get(&id).cloned())
    }

    async fn find_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, PaymentPersistenceError> {
        let tables = self.lock().map_err(PaymentPersistenceError::query)?;
        Ok(tables
            .payments
            .values()
            .find(|p| p.transaction_id.as_deref() == Some(transaction_id))
            .cloned())
    }

    async fn find_latest_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<Payment>, PaymentPersistenceError> {
        let tables = self.lock().map_err(PaymentPersistenceError::query)?;
        Ok(newest_for_order(&tables, order_id).next().cloned())
    }

    async fn find_blocking_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<Payment>, PaymentPersistenceError> {
        let tables = self.lock().map_err(PaymentPersistenceError::query)?;
        Ok(newest_for_order(&tables, order_id)
            .find(|p| p.status.blocks_new_payment())
            .cloned())
    }

    async fn insert(&self, payment: &Payment) -> Result<(), PaymentPersistenceError> {
        let mut tables = self.lock().map_err(PaymentPersistenceError::query)?;
        if second_active_payment(&tables, payment) {
            return Err(PaymentPersistenceError::active_payment_exists(
                payment.order_id,
            ));
        }
        tables.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<(), PaymentPersistenceError> {
        let mut tables = self.lock().map_err(PaymentPersistenceError::query)?;
        if second_active_payment(&tables, payment) {
            return Err(PaymentPersistenceError::active_payment_exists(
                payment.order_id,
            ));
        }
        tables.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, PaymentPersistenceError> {
        let mut tables = self.lock().map_err(PaymentPersistenceError::query)?;
        Ok(tables.payments.remove(&id).is_some())
    }
}
