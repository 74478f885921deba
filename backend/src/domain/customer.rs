//! Customers owned by a user group.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::user::{EmailAddress, UserValidationError};

/// Validation errors for customer payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustomerValidationError {
    #[error("customer name must not be empty")]
    EmptyName,
    #[error(transparent)]
    Email(#[from] UserValidationError),
}

/// Persisted customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: Option<EmailAddress>,
    pub mobile: Option<String>,
    pub home_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub company: Option<String>,
    pub customer_type: Option<String>,
    pub lead_source: Option<String>,
    pub note: Option<String>,
    /// Owning group; `None` for customers created by unscoped staff.
    pub group_id: Option<Uuid>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw customer fields as received.
#[derive(Debug, Clone, Default)]
pub struct CustomerInput {
    pub name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub home_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub company: Option<String>,
    pub customer_type: Option<String>,
    pub lead_source: Option<String>,
    pub note: Option<String>,
    pub group_id: Option<Uuid>,
}

/// Validated customer fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDraft {
    pub name: String,
    pub email: Option<EmailAddress>,
    pub mobile: Option<String>,
    pub home_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub company: Option<String>,
    pub customer_type: Option<String>,
    pub lead_source: Option<String>,
    pub note: Option<String>,
    /// Requested owner; services overwrite it for scoped principals.
    pub group_id: Option<Uuid>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl CustomerDraft {
    /// Validate raw input. A blank email is treated as absent.
    pub fn try_new(input: CustomerInput) -> Result<Self, CustomerValidationError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(CustomerValidationError::EmptyName);
        }
        let email = clean(input.email).map(EmailAddress::new).transpose()?;
        Ok(Self {
            name: name.to_owned(),
            email,
            mobile: clean(input.mobile),
            home_phone: clean(input.home_phone),
            address: clean(input.address),
            city: clean(input.city),
            state: clean(input.state),
            zip: clean(input.zip),
            company: clean(input.company),
            customer_type: clean(input.customer_type),
            lead_source: clean(input.lead_source),
            note: clean(input.note),
            group_id: input.group_id,
        })
    }

    /// Minimal draft used when a proposal names a customer that does not exist
    /// yet.
    pub fn contact(name: &str, email: EmailAddress, group_id: Option<Uuid>) -> Result<Self, CustomerValidationError> {
        Self::try_new(CustomerInput {
            name: name.to_owned(),
            email: Some(email.into()),
            group_id,
            ..CustomerInput::default()
        })
    }
}

/// Customer list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    /// Restrict to one owner group.
    pub group_id: Option<Uuid>,
    /// Case-insensitive substring match on name, email or company.
    pub search: Option<String>,
}

impl CustomerFilter {
    pub fn matches(&self, customer: &Customer) -> bool {
        if customer.is_deleted {
            return false;
        }
        if self.group_id.is_some() && customer.group_id != self.group_id {
            return false;
        }
        self.search.as_deref().is_none_or(|needle| {
            let needle = needle.to_lowercase();
            [
                Some(customer.name.as_str()),
                customer.email.as_ref().map(EmailAddress::as_str),
                customer.company.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
        })
    }
}
