//! Customers, scoped to the caller's group.

use std::sync::Arc;

use mockable::Clock;
use pagination::{PageRequest, Paginated};
use tracing::info;
use uuid::Uuid;

use crate::domain::customer::{Customer, CustomerDraft, CustomerFilter, CustomerInput};
use crate::domain::ports::CustomerRepository;
use crate::domain::{EmailAddress, Error, Permission, Principal};

use super::{found, invalid};

#[derive(Clone)]
pub struct CustomerService {
    customers: Arc<dyn CustomerRepository>,
    clock: Arc<dyn Clock>,
}

impl CustomerService {
    pub fn new(customers: Arc<dyn CustomerRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { customers, clock }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        search: Option<String>,
        page: PageRequest,
    ) -> Result<Paginated<Customer>, Error> {
        principal.require(Permission::CustomersRead)?;
        let filter = CustomerFilter {
            group_id: principal.scope.group_filter(),
            search: search.filter(|s| !s.trim().is_empty()),
        };
        Ok(self.customers.list(&filter, page).await?)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<Customer, Error> {
        principal.require(Permission::CustomersRead)?;
        self.visible(principal, id).await
    }

    pub async fn create(
        &self,
        principal: &Principal,
        mut input: CustomerInput,
    ) -> Result<Customer, Error> {
        principal.require(Permission::CustomersCreate)?;
        input.group_id = principal.scope.owner_for_new(input.group_id);
        let draft = CustomerDraft::try_new(input).map_err(invalid)?;
        let customer = self.insert(draft).await?;
        info!(customer_id = %customer.id, "customer created");
        Ok(customer)
    }

    /// Replace a customer's fields. An omitted group keeps the current owner.
    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        mut input: CustomerInput,
    ) -> Result<Customer, Error> {
        principal.require(Permission::CustomersUpdate)?;
        let mut customer = self.visible(principal, id).await?;
        principal
            .scope
            .ensure_owner_unchanged(customer.group_id, input.group_id)?;
        input.group_id = input.group_id.or(customer.group_id);
        let draft = CustomerDraft::try_new(input).map_err(invalid)?;
        customer.name = draft.name;
        customer.email = draft.email;
        customer.mobile = draft.mobile;
        customer.home_phone = draft.home_phone;
        customer.address = draft.address;
        customer.city = draft.city;
        customer.state = draft.state;
        customer.zip = draft.zip;
        customer.company = draft.company;
        customer.customer_type = draft.customer_type;
        customer.lead_source = draft.lead_source;
        customer.note = draft.note;
        customer.group_id = draft.group_id;
        customer.updated_at = self.clock.utc();
        self.customers.update(&customer).await?;
        Ok(customer)
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), Error> {
        principal.require(Permission::CustomersDelete)?;
        let mut customer = self.visible(principal, id).await?;
        customer.is_deleted = true;
        customer.updated_at = self.clock.utc();
        self.customers.update(&customer).await?;
        info!(customer_id = %id, "customer deleted");
        Ok(())
    }

    /// Existing customer with this email in the group, or a new one.
    pub(crate) async fn find_or_create(
        &self,
        name: &str,
        email: EmailAddress,
        group_id: Option<Uuid>,
    ) -> Result<Customer, Error> {
        if let Some(existing) = self.customers.find_by_email(&email, group_id).await? {
            return Ok(existing);
        }
        let draft = CustomerDraft::contact(name, email, group_id).map_err(invalid)?;
        let customer = self.insert(draft).await?;
        info!(customer_id = %customer.id, "customer created from proposal");
        Ok(customer)
    }

    /// Live customer visible to the principal, if it exists at all.
    pub(crate) async fn find_visible(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> Result<Option<Customer>, Error> {
        Ok(self
            .customers
            .find_by_id(id)
            .await?
            .filter(|c| !c.is_deleted)
            .filter(|c| principal.scope.ensure_visible(c.group_id, "customer").is_ok()))
    }

    pub(crate) async fn names(&self, ids: &[Uuid]) -> Result<Vec<(Uuid, String)>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.customers.names(ids).await?)
    }

    async fn visible(&self, principal: &Principal, id: Uuid) -> Result<Customer, Error> {
        let customer = found(
            self.customers.find_by_id(id).await?.filter(|c| !c.is_deleted),
            "customer",
        )?;
        principal.scope.ensure_visible(customer.group_id, "customer")?;
        Ok(customer)
    }

    async fn insert(&self, draft: CustomerDraft) -> Result<Customer, Error> {
        let now = self.clock.utc();
        let customer = Customer {
            id: Uuid::new_v4(),
            name: draft.name,
            email: draft.email,
            mobile: draft.mobile,
            home_phone: draft.home_phone,
            address: draft.address,
            city: draft.city,
            state: draft.state,
            zip: draft.zip,
            company: draft.company,
            customer_type: draft.customer_type,
            lead_source: draft.lead_source,
            note: draft.note,
            group_id: draft.group_id,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.customers.insert(&customer).await?;
        Ok(customer)
    }
}
