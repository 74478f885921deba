//! Customers, proposals, share sessions and acceptance.

use async_trait::async_trait;
use chrono::NaiveDate;
use pagination::{PageRequest, Paginated};
use uuid::Uuid;

use crate::domain::EmailAddress;
use crate::domain::customer::{Customer, CustomerFilter};
use crate::domain::order::{DocumentNumber, Order};
use crate::domain::ports::{
    BackfillQuery, CustomerPersistenceError, CustomerRepository, ProposalPersistenceError,
    ProposalRepository,
};
use crate::domain::proposal::{Proposal, ProposalFilter};
use crate::domain::share::ShareSession;

use super::{MemoryStore, Tables, paginate};

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn list(
        &self,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> Result<Paginated<Customer>, CustomerPersistenceError> {
        let tables = self.lock().map_err(CustomerPersistenceError::query)?;
        let mut rows: Vec<Customer> = tables
            .customers
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(rows, page))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, CustomerPersistenceError> {
        let tables = self.lock().map_err(CustomerPersistenceError::query)?;
        Ok(tables.customers.get(&id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
        group_id: Option<Uuid>,
    ) -> Result<Option<Customer>, CustomerPersistenceError> {
        let tables = self.lock().map_err(CustomerPersistenceError::query)?;
        Ok(tables
            .customers
            .values()
            .find(|c| !c.is_deleted && c.group_id == group_id && c.email.as_ref() == Some(email))
            .cloned())
    }

    async fn names(&self, ids: &[Uuid]) -> Result<Vec<(Uuid, String)>, CustomerPersistenceError> {
        let tables = self.lock().map_err(CustomerPersistenceError::query)?;
        Ok(ids
            .iter()
            .filter_map(|id| tables.customers.get(id).map(|c| (*id, c.name.clone())))
            .collect())
    }

    async fn insert(&self, customer: &Customer) -> Result<(), CustomerPersistenceError> {
        let mut tables = self.lock().map_err(CustomerPersistenceError::query)?;
        tables.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn update(&self, customer: &Customer) -> Result<(), CustomerPersistenceError> {
        let mut tables = self.lock().map_err(CustomerPersistenceError::query)?;
        tables.customers.insert(customer.id, customer.clone());
        Ok(())
    }
}

fn number_taken(tables: &Tables, id: Uuid, number: Option<&str>) -> bool {
    number.is_some_and(|n| {
        tables
            .proposals
            .values()
            .any(|p| p.id != id && p.number.as_deref() == Some(n))
    })
}

fn order_number_taken(tables: &Tables, id: Uuid, number: Option<&str>) -> bool {
    number.is_some_and(|n| {
        tables
            .orders
            .values()
            .any(|o| o.id != id && o.number.as_deref() == Some(n))
    })
}

#[async_trait]
impl ProposalRepository for MemoryStore {
    async fn list(
        &self,
        filter: &ProposalFilter,
        page: PageRequest,
    ) -> Result<Paginated<Proposal>, ProposalPersistenceError> {
        let rows = ProposalRepository::list_all(self, filter).await?;
        Ok(paginate(rows, page))
    }

    async fn list_all(
        &self,
        filter: &ProposalFilter,
    ) -> Result<Vec<Proposal>, ProposalPersistenceError> {
        let tables = self.lock().map_err(ProposalPersistenceError::query)?;
        let mut rows: Vec<Proposal> = tables
            .proposals
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn count(&self, filter: &ProposalFilter) -> Result<u64, ProposalPersistenceError> {
        let tables = self.lock().map_err(ProposalPersistenceError::query)?;
        Ok(tables.proposals.values().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn latest(
        &self,
        filter: &ProposalFilter,
        limit: u32,
    ) -> Result<Vec<Proposal>, ProposalPersistenceError> {
        let mut rows = ProposalRepository::list_all(self, filter).await?;
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Proposal>, ProposalPersistenceError> {
        let tables = self.lock().map_err(ProposalPersistenceError::query)?;
        Ok(tables.proposals.get(&id).cloned())
    }

    async fn insert(&self, proposal: &Proposal) -> Result<(), ProposalPersistenceError> {
        let mut tables = self.lock().map_err(ProposalPersistenceError::query)?;
        if number_taken(&tables, proposal.id, proposal.number.as_deref()) {
            return Err(ProposalPersistenceError::duplicate_number(
                proposal.number.clone().unwrap_or_default(),
            ));
        }
        tables.proposals.insert(proposal.id, proposal.clone());
        Ok(())
    }

    async fn update(&self, proposal: &Proposal) -> Result<(), ProposalPersistenceError> {
        let mut tables = self.lock().map_err(ProposalPersistenceError::query)?;
        tables.proposals.insert(proposal.id, proposal.clone());
        Ok(())
    }

    async fn max_number_seq(&self, date: NaiveDate) -> Result<u32, ProposalPersistenceError> {
        let tables = self.lock().map_err(ProposalPersistenceError::query)?;
        Ok(tables
            .proposals
            .values()
            .filter_map(|p| p.number.as_deref()?.parse::<DocumentNumber>().ok())
            .filter(|n| n.date() == date)
            .map(|n| n.seq())
            .max()
            .unwrap_or(0))
    }

    async fn record_acceptance(
        &self,
        proposal: &Proposal,
        order: &Order,
    ) -> Result<(), ProposalPersistenceError> {
        let mut tables = self.lock().map_err(ProposalPersistenceError::query)?;
        if tables.orders.values().any(|o| o.proposal_id == proposal.id) {
            return Err(ProposalPersistenceError::already_ordered(proposal.id));
        }
        if order_number_taken(&tables, order.id, order.number.as_deref()) {
            return Err(ProposalPersistenceError::duplicate_number(
                order.number.clone().unwrap_or_default(),
            ));
        }
        tables.proposals.insert(proposal.id, proposal.clone());
        tables.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn insert_share_session(
        &self,
        session: &ShareSession,
    ) -> Result<(), ProposalPersistenceError> {
        let mut tables = self.lock().map_err(ProposalPersistenceError::query)?;
        if tables.share_sessions.contains_key(&session.token_hash) {
            return Err(ProposalPersistenceError::duplicate_token());
        }
        tables
            .share_sessions
            .insert(session.token_hash.clone(), session.clone());
        Ok(())
    }

    async fn find_share_session(
        &self,
        token_hash: &str,
    ) -> Result<Option<ShareSession>, ProposalPersistenceError> {
        let tables = self.lock().map_err(ProposalPersistenceError::query)?;
        Ok(tables.share_sessions.get(token_hash).cloned())
    }

    async fn backfill_candidates(
        &self,
        query: &BackfillQuery,
    ) -> Result<Vec<Proposal>, ProposalPersistenceError> {
        let tables = self.lock().map_err(ProposalPersistenceError::query)?;
        let mut rows: Vec<Proposal> = tables
            .proposals
            .values()
            .filter(|p| !p.is_deleted)
            .filter(|p| query.ids.is_empty() || query.ids.contains(&p.id))
            .filter(|p| query.since.is_none_or(|since| p.created_at >= since))
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
    ) -> Result<(), ProposalPersistenceError> {
        let mut tables = self.lock().map_err(ProposalPersistenceError::query)?;
        let text = number.to_string();
        if number_taken(&tables, id, Some(&text)) {
            return Err(ProposalPersistenceError::duplicate_number(text));
        }
        if let Some(proposal) = tables.proposals.get_mut(&id) {
            proposal.number = Some(text);
        }
        Ok(())
    }
}
