//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Each row converts from a borrowed domain
//! value for writes and back into the domain value for reads; read
//! conversions fail with a message when a stored value no longer validates.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::catalog::{AssemblyCost, AssemblyCostKind, CatalogItem};
use crate::domain::customer::Customer;
use crate::domain::manufacturer::Manufacturer;
use crate::domain::modification::{
    AssignmentTarget, ModificationAssignment, ModificationCategory, ModificationTemplate, Owner,
};
use crate::domain::order::Order;
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::permissions::ModuleAccess;
use crate::domain::proposal::{Proposal, ProposalKind, ProposalStatus};
use crate::domain::resources::ResourceLink;
use crate::domain::settings::{Location, Tax};
use crate::domain::share::ShareSession;
use crate::domain::user_group::{GroupMultiplier, GroupType, UserGroup};
use crate::domain::{EmailAddress, User, UserId};

use super::schema::{
    catalog_assembly_costs, catalog_items, customers, locations, manufacturers,
    modification_assignments, modification_categories, modification_templates, orders, payments,
    proposals, resource_links, share_sessions, taxes, user_groups, users,
};

fn optional_email(raw: Option<String>, column: &str) -> Result<Option<EmailAddress>, String> {
    raw.map(|value| EmailAddress::new(&value).map_err(|err| format!("stored {column}: {err}")))
        .transpose()
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub group_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub password_hash: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            name: user.name.clone(),
            email: user.email.as_str().to_owned(),
            role: user.role.clone(),
            group_id: user.group_id,
            location_id: user.location_id,
            password_hash: user.password_hash.clone(),
            is_deleted: user.is_deleted,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email =
            EmailAddress::new(&row.email).map_err(|err| format!("stored user email: {err}"))?;
        Ok(Self {
            id: UserId::from_uuid(row.id),
            name: row.name,
            email,
            role: row.role,
            group_id: row.group_id,
            location_id: row.location_id,
            password_hash: row.password_hash,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = user_groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserGroupRow {
    pub id: Uuid,
    pub name: String,
    pub group_type: String,
    pub modules: Value,
    pub multiplier: Decimal,
    pub multiplier_enabled: bool,
    pub contractor_settings: Value,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&UserGroup> for UserGroupRow {
    type Error = String;

    fn try_from(group: &UserGroup) -> Result<Self, Self::Error> {
        let modules = serde_json::to_value(group.modules)
            .map_err(|err| format!("serialise group modules: {err}"))?;
        Ok(Self {
            id: group.id,
            name: group.name.clone(),
            group_type: group.group_type.as_str().to_owned(),
            modules,
            multiplier: group.multiplier.value,
            multiplier_enabled: group.multiplier.enabled,
            contractor_settings: group.contractor_settings.clone(),
            is_deleted: group.is_deleted,
            created_at: group.created_at,
            updated_at: group.updated_at,
        })
    }
}

impl TryFrom<UserGroupRow> for UserGroup {
    type Error = String;

    fn try_from(row: UserGroupRow) -> Result<Self, Self::Error> {
        let group_type = row
            .group_type
            .parse::<GroupType>()
            .map_err(|err| format!("stored group type: {err}"))?;
        Ok(Self {
            id: row.id,
            name: row.name,
            group_type,
            modules: ModuleAccess::from_stored(&row.modules),
            multiplier: GroupMultiplier {
                value: row.multiplier,
                enabled: row.multiplier_enabled,
            },
            contractor_settings: row.contractor_settings,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = manufacturers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ManufacturerRow {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    pub cost_multiplier: Decimal,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Manufacturer> for ManufacturerRow {
    fn from(m: &Manufacturer) -> Self {
        Self {
            id: m.id,
            name: m.name.clone(),
            email: m.email.clone(),
            phone: m.phone.clone(),
            address: m.address.clone(),
            website: m.website.clone(),
            is_active: m.is_active,
            cost_multiplier: m.cost_multiplier,
            instructions: m.instructions.clone(),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<ManufacturerRow> for Manufacturer {
    fn from(row: ManufacturerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            website: row.website,
            is_active: row.is_active,
            cost_multiplier: row.cost_multiplier,
            instructions: row.instructions,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = catalog_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct CatalogItemRow {
    pub id: Uuid,
    pub manufacturer_id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub style: String,
    pub item_type: Option<String>,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&CatalogItem> for CatalogItemRow {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: item.id,
            manufacturer_id: item.manufacturer_id,
            code: item.code.clone(),
            description: item.description.clone(),
            style: item.style.clone(),
            item_type: item.item_type.clone(),
            price: item.price,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

impl From<CatalogItemRow> for CatalogItem {
    fn from(row: CatalogItemRow) -> Self {
        Self {
            id: row.id,
            manufacturer_id: row.manufacturer_id,
            code: row.code,
            description: row.description,
            style: row.style,
            item_type: row.item_type,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = catalog_assembly_costs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AssemblyCostRow {
    pub catalog_item_id: Uuid,
    pub kind: String,
    pub amount: Decimal,
}

impl AssemblyCostRow {
    pub fn new(catalog_item_id: Uuid, cost: AssemblyCost) -> Self {
        Self {
            catalog_item_id,
            kind: cost.kind.as_str().to_owned(),
            amount: cost.amount,
        }
    }

    pub fn into_entry(self) -> (Uuid, AssemblyCost) {
        (
            self.catalog_item_id,
            AssemblyCost {
                kind: AssemblyCostKind::from_stored(&self.kind),
                amount: self.amount,
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Modifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = modification_categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ModificationCategoryRow {
    pub id: Uuid,
    pub name: String,
    pub manufacturer_id: Option<Uuid>,
    pub order_index: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ModificationCategory> for ModificationCategoryRow {
    fn from(c: &ModificationCategory) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            manufacturer_id: c.owner.manufacturer_id(),
            order_index: c.order_index,
            description: c.description.clone(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl From<ModificationCategoryRow> for ModificationCategory {
    fn from(row: ModificationCategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            owner: Owner::from_manufacturer(row.manufacturer_id),
            order_index: row.order_index,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = modification_templates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ModificationTemplateRow {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub manufacturer_id: Option<Uuid>,
    pub price: Option<Decimal>,
    pub is_ready: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ModificationTemplate> for ModificationTemplateRow {
    fn from(t: &ModificationTemplate) -> Self {
        Self {
            id: t.id,
            category_id: t.category_id,
            name: t.name.clone(),
            manufacturer_id: t.owner.manufacturer_id(),
            price: t.price,
            is_ready: t.is_ready,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

impl From<ModificationTemplateRow> for ModificationTemplate {
    fn from(row: ModificationTemplateRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            owner: Owner::from_manufacturer(row.manufacturer_id),
            price: row.price,
            is_ready: row.is_ready,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = modification_assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ModificationAssignmentRow {
    pub id: Uuid,
    pub template_id: Uuid,
    pub manufacturer_id: Uuid,
    pub scope: String,
    pub target_style: Option<String>,
    pub target_type: Option<String>,
    pub catalog_item_id: Option<Uuid>,
    pub override_price: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ModificationAssignment> for ModificationAssignmentRow {
    fn from(a: &ModificationAssignment) -> Self {
        Self {
            id: a.id,
            template_id: a.template_id,
            manufacturer_id: a.manufacturer_id,
            scope: a.target.scope().to_owned(),
            target_style: a.target.style().map(str::to_owned),
            target_type: a.target.item_type().map(str::to_owned),
            catalog_item_id: a.target.catalog_item_id(),
            override_price: a.override_price,
            is_active: a.is_active,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

impl TryFrom<ModificationAssignmentRow> for ModificationAssignment {
    type Error = String;

    fn try_from(row: ModificationAssignmentRow) -> Result<Self, Self::Error> {
        let target = AssignmentTarget::try_new(
            &row.scope,
            row.target_style.as_deref(),
            row.target_type.as_deref(),
            row.catalog_item_id,
        )
        .map_err(|err| format!("assignment {}: {err}", row.id))?;
        Ok(Self {
            id: row.id,
            template_id: row.template_id,
            manufacturer_id: row.manufacturer_id,
            target,
            override_price: row.override_price,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct CustomerRow {
    pub id: Uuid,
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
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Customer> for CustomerRow {
    fn from(c: &Customer) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            email: c.email.as_ref().map(|e| e.as_str().to_owned()),
            mobile: c.mobile.clone(),
            home_phone: c.home_phone.clone(),
            address: c.address.clone(),
            city: c.city.clone(),
            state: c.state.clone(),
            zip: c.zip.clone(),
            company: c.company.clone(),
            customer_type: c.customer_type.clone(),
            lead_source: c.lead_source.clone(),
            note: c.note.clone(),
            group_id: c.group_id,
            is_deleted: c.is_deleted,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl TryFrom<CustomerRow> for Customer {
    type Error = String;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            email: optional_email(row.email, "customer email")?,
            mobile: row.mobile,
            home_phone: row.home_phone,
            address: row.address,
            city: row.city,
            state: row.state,
            zip: row.zip,
            company: row.company,
            customer_type: row.customer_type,
            lead_source: row.lead_source,
            note: row.note,
            group_id: row.group_id,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = proposals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ProposalRow {
    pub id: Uuid,
    pub number: Option<String>,
    pub customer_id: Option<Uuid>,
    pub manufacturer_id: Option<Uuid>,
    pub owner_group_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub designer_id: Option<Uuid>,
    pub sales_rep: Option<String>,
    pub lead_source: Option<String>,
    pub location_id: Option<Uuid>,
    pub kind: String,
    pub status: String,
    pub date: DateTime<Utc>,
    pub follow_up_dates: Vec<DateTime<Utc>>,
    pub description: Option<String>,
    pub manufacturers_data: Value,
    pub grand_total: Option<Decimal>,
    pub is_locked: bool,
    pub accepted_at: Option<DateTime<Utc>>,
    pub accepted_by: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Proposal> for ProposalRow {
    fn from(p: &Proposal) -> Self {
        Self {
            id: p.id,
            number: p.number.clone(),
            customer_id: p.customer_id,
            manufacturer_id: p.manufacturer_id,
            owner_group_id: p.owner_group_id,
            created_by: p.created_by.map(|id| *id.as_uuid()),
            designer_id: p.designer_id.map(|id| *id.as_uuid()),
            sales_rep: p.sales_rep.clone(),
            lead_source: p.lead_source.clone(),
            location_id: p.location_id,
            kind: p.kind.as_str().to_owned(),
            status: p.status.as_str().to_owned(),
            date: p.date,
            follow_up_dates: p.follow_up_dates.clone(),
            description: p.description.clone(),
            manufacturers_data: p.manufacturers_data.clone(),
            grand_total: p.grand_total,
            is_locked: p.is_locked,
            accepted_at: p.accepted_at,
            accepted_by: p.accepted_by.clone(),
            sent_at: p.sent_at,
            is_deleted: p.is_deleted,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl TryFrom<ProposalRow> for Proposal {
    type Error = String;

    fn try_from(row: ProposalRow) -> Result<Self, Self::Error> {
        let status = ProposalStatus::parse(&row.status)
            .map_err(|err| format!("proposal {}: {err}", row.id))?;
        Ok(Self {
            id: row.id,
            number: row.number,
            customer_id: row.customer_id,
            manufacturer_id: row.manufacturer_id,
            owner_group_id: row.owner_group_id,
            created_by: row.created_by.map(UserId::from_uuid),
            designer_id: row.designer_id.map(UserId::from_uuid),
            sales_rep: row.sales_rep,
            lead_source: row.lead_source,
            location_id: row.location_id,
            kind: ProposalKind::from_stored(&row.kind),
            status,
            date: row.date,
            follow_up_dates: row.follow_up_dates,
            description: row.description,
            manufacturers_data: row.manufacturers_data,
            grand_total: row.grand_total,
            is_locked: row.is_locked,
            accepted_at: row.accepted_at,
            accepted_by: row.accepted_by,
            sent_at: row.sent_at,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = share_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ShareSessionRow {
    pub id: Uuid,
    pub proposal_id: Uuid,
    pub token_hash: String,
    pub recipient_email: Option<String>,
    pub created_by: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&ShareSession> for ShareSessionRow {
    fn from(s: &ShareSession) -> Self {
        Self {
            id: s.id,
            proposal_id: s.proposal_id,
            token_hash: s.token_hash.clone(),
            recipient_email: s.recipient_email.as_ref().map(|e| e.as_str().to_owned()),
            created_by: s.created_by.map(|id| *id.as_uuid()),
            expires_at: s.expires_at,
            created_at: s.created_at,
        }
    }
}

impl TryFrom<ShareSessionRow> for ShareSession {
    type Error = String;

    fn try_from(row: ShareSessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            proposal_id: row.proposal_id,
            token_hash: row.token_hash,
            recipient_email: optional_email(row.recipient_email, "share recipient")?,
            created_by: row.created_by.map(UserId::from_uuid),
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderRow {
    pub id: Uuid,
    pub proposal_id: Uuid,
    pub number: Option<String>,
    pub number_date: Option<NaiveDate>,
    pub number_seq: Option<i32>,
    pub owner_group_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub manufacturer_id: Option<Uuid>,
    pub style_name: Option<String>,
    pub accepted_by: Option<String>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub status: String,
    pub grand_total: Decimal,
    pub snapshot: Value,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Order> for OrderRow {
    type Error = String;

    fn try_from(o: &Order) -> Result<Self, Self::Error> {
        let number_seq = o
            .number_seq
            .map(i32::try_from)
            .transpose()
            .map_err(|_| format!("order {} sequence out of range", o.id))?;
        Ok(Self {
            id: o.id,
            proposal_id: o.proposal_id,
            number: o.number.clone(),
            number_date: o.number_date,
            number_seq,
            owner_group_id: o.owner_group_id,
            customer_id: o.customer_id,
            manufacturer_id: o.manufacturer_id,
            style_name: o.style_name.clone(),
            accepted_by: o.accepted_by.clone(),
            accepted_at: o.accepted_at,
            status: o.status.clone(),
            grand_total: o.grand_total,
            snapshot: o.snapshot.clone(),
            created_at: o.created_at,
        })
    }
}

impl TryFrom<OrderRow> for Order {
    type Error = String;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let number_seq = row
            .number_seq
            .map(u32::try_from)
            .transpose()
            .map_err(|_| format!("order {} has a negative sequence", row.id))?;
        Ok(Self {
            id: row.id,
            proposal_id: row.proposal_id,
            number: row.number,
            number_date: row.number_date,
            number_seq,
            owner_group_id: row.owner_group_id,
            customer_id: row.customer_id,
            manufacturer_id: row.manufacturer_id,
            style_name: row.style_name,
            accepted_by: row.accepted_by,
            accepted_at: row.accepted_at,
            status: row.status,
            grand_total: row.grand_total,
            snapshot: row.snapshot,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct PaymentRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub gateway_response: Option<Value>,
    pub created_by: Option<Uuid>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Payment> for PaymentRow {
    fn from(p: &Payment) -> Self {
        Self {
            id: p.id,
            order_id: p.order_id,
            amount: p.amount,
            currency: p.currency.clone(),
            status: p.status.as_str().to_owned(),
            payment_method: p.payment_method.clone(),
            transaction_id: p.transaction_id.clone(),
            gateway_response: p.gateway_response.clone(),
            created_by: p.created_by.map(|id| *id.as_uuid()),
            paid_at: p.paid_at,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl TryFrom<PaymentRow> for Payment {
    type Error = String;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<PaymentStatus>()
            .map_err(|err| format!("payment {}: {err}", row.id))?;
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            amount: row.amount,
            currency: row.currency,
            status,
            payment_method: row.payment_method,
            transaction_id: row.transaction_id,
            gateway_response: row.gateway_response,
            created_by: row.created_by.map(UserId::from_uuid),
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = locations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct LocationRow {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub time_zone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Location> for LocationRow {
    fn from(l: &Location) -> Self {
        Self {
            id: l.id,
            name: l.name.clone(),
            address: l.address.clone(),
            email: l.email.clone(),
            phone: l.phone.clone(),
            website: l.website.clone(),
            time_zone: l.time_zone.clone(),
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            address: row.address,
            email: row.email,
            phone: row.phone,
            website: row.website,
            time_zone: row.time_zone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = taxes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TaxRow {
    pub id: Uuid,
    pub label: String,
    pub value: Decimal,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Tax> for TaxRow {
    fn from(t: &Tax) -> Self {
        Self {
            id: t.id,
            label: t.label.clone(),
            value: t.value,
            is_default: t.is_default,
            created_at: t.created_at,
        }
    }
}

impl From<TaxRow> for Tax {
    fn from(row: TaxRow) -> Self {
        Self {
            id: row.id,
            label: row.label,
            value: row.value,
            is_default: row.is_default,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = resource_links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ResourceLinkRow {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub kind: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ResourceLink> for ResourceLinkRow {
    fn from(l: &ResourceLink) -> Self {
        Self {
            id: l.id,
            title: l.title.clone(),
            url: l.url.clone(),
            kind: l.kind.clone(),
            description: l.description.clone(),
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

impl From<ResourceLinkRow> for ResourceLink {
    fn from(row: ResourceLinkRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            url: row.url,
            kind: row.kind,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
