//! Proposals and their status lifecycle.
//!
//! A proposal moves through the sales pipeline (`draft` → `sent` →
//! follow-ups → measurement and design steps) until it is either accepted or
//! rejected. Both end states are final. Acceptance locks the proposal and
//! produces an order.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::user::EmailAddress;
use crate::domain::UserId;

/// Pipeline status of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Draft,
    Sent,
    #[serde(rename = "follow_up_1")]
    FollowUp1,
    #[serde(rename = "follow_up_2")]
    FollowUp2,
    #[serde(rename = "follow_up_3")]
    FollowUp3,
    MeasurementScheduled,
    MeasurementDone,
    DesignDone,
    ProposalDone,
    Accepted,
    Rejected,
}

/// Raised for a status label that matches no known status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown proposal status: {0}")]
pub struct UnknownStatus(pub String);

/// Dashboard grouping of statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Review,
    Negotiation,
    AwaitingSign,
}

impl ProposalStatus {
    /// Every status in pipeline order.
    pub const ALL: [Self; 11] = [
        Self::Draft,
        Self::Sent,
        Self::FollowUp1,
        Self::FollowUp2,
        Self::FollowUp3,
        Self::MeasurementScheduled,
        Self::MeasurementDone,
        Self::DesignDone,
        Self::ProposalDone,
        Self::Accepted,
        Self::Rejected,
    ];

    /// Canonical snake_case label, as stored and serialised.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::FollowUp1 => "follow_up_1",
            Self::FollowUp2 => "follow_up_2",
            Self::FollowUp3 => "follow_up_3",
            Self::MeasurementScheduled => "measurement_scheduled",
            Self::MeasurementDone => "measurement_done",
            Self::DesignDone => "design_done",
            Self::ProposalDone => "proposal_done",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Parse a status, accepting the human-readable labels older rows carry
    /// (`Follow up 1`, `Measurement Scheduled`, `Proposal accepted`, ...).
    ///
    /// A blank label is a draft.
    ///
    /// # Examples
    /// ```
    /// use cabinet_backend::domain::ProposalStatus;
    ///
    /// assert_eq!(ProposalStatus::parse("Follow up 2"), Ok(ProposalStatus::FollowUp2));
    /// assert_eq!(ProposalStatus::parse("Proposal accepted"), Ok(ProposalStatus::Accepted));
    /// assert_eq!(ProposalStatus::parse(""), Ok(ProposalStatus::Draft));
    /// ```
    pub fn parse(raw: &str) -> Result<Self, UnknownStatus> {
        let normalised: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        let status = match normalised.as_str() {
            "" | "draft" => Self::Draft,
            "sent" => Self::Sent,
            "follow_up_1" | "followup_1" => Self::FollowUp1,
            "follow_up_2" | "followup_2" => Self::FollowUp2,
            "follow_up_3" | "followup_3" => Self::FollowUp3,
            "measurement_scheduled" => Self::MeasurementScheduled,
            "measurement_done" => Self::MeasurementDone,
            "design_done" => Self::DesignDone,
            "proposal_done" => Self::ProposalDone,
            "accepted" | "proposal_accepted" => Self::Accepted,
            "rejected" | "proposal_rejected" => Self::Rejected,
            _ => return Err(UnknownStatus(raw.to_owned())),
        };
        Ok(status)
    }

    /// Accepted and rejected are final.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    pub const fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Sent to the customer and waiting for a decision.
    pub const fn is_awaiting_approval(self) -> bool {
        matches!(
            self,
            Self::Sent | Self::ProposalDone | Self::FollowUp1 | Self::FollowUp2 | Self::FollowUp3
        )
    }

    pub const fn stage(self) -> Stage {
        match self {
            Self::FollowUp1 | Self::FollowUp2 | Self::FollowUp3 => Stage::Negotiation,
            Self::Sent | Self::ProposalDone | Self::Accepted => Stage::AwaitingSign,
            _ => Stage::Review,
        }
    }

    /// Statuses counted as active on the dashboard.
    pub fn active() -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(|s| s.is_active())
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Whether a row is still a proposal or has become an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalKind {
    #[default]
    Proposal,
    Order,
}

impl ProposalKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proposal => "proposal",
            Self::Order => "order",
        }
    }

    /// Unknown labels are proposals.
    pub fn from_stored(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("order") {
            Self::Order
        } else {
            Self::Proposal
        }
    }
}

/// Rejected state changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("proposal is locked")]
    Locked,
    #[error("proposal is already accepted")]
    AlreadyAccepted,
    #[error("proposal is {status} and cannot change")]
    Terminal { status: ProposalStatus },
    #[error("proposal cannot move from {from} to {to}")]
    Illegal {
        from: ProposalStatus,
        to: ProposalStatus,
    },
}

/// Who accepted a proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acceptor {
    /// A signed-in user.
    Internal(UserId),
    /// A customer signing through a share link.
    External { name: String, email: EmailAddress },
}

impl Acceptor {
    /// Label stored in `accepted_by`.
    pub fn label(&self) -> String {
        match self {
            Self::Internal(id) => id.to_string(),
            Self::External { name, email } => format!("{name} <{email}>"),
        }
    }
}

/// Persisted proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub id: Uuid,
    pub number: Option<String>,
    pub customer_id: Option<Uuid>,
    pub manufacturer_id: Option<Uuid>,
    pub owner_group_id: Option<Uuid>,
    pub created_by: Option<UserId>,
    pub designer_id: Option<UserId>,
    pub sales_rep: Option<String>,
    pub lead_source: Option<String>,
    pub location_id: Option<Uuid>,
    pub kind: ProposalKind,
    pub status: ProposalStatus,
    pub date: DateTime<Utc>,
    pub follow_up_dates: Vec<DateTime<Utc>>,
    pub description: Option<String>,
    /// Per-manufacturer selections and pricing as edited by the client.
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

impl Proposal {
    /// Fail unless field edits are allowed.
    pub fn ensure_editable(&self) -> Result<(), TransitionError> {
        if self.is_locked {
            return Err(TransitionError::Locked);
        }
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal {
                status: self.status,
            });
        }
        Ok(())
    }

    /// Validate a status change requested through a regular update.
    ///
    /// Acceptance has its own action and is never reached this way.
    pub fn ensure_transition(&self, next: ProposalStatus) -> Result<(), TransitionError> {
        if next == self.status {
            return Ok(());
        }
        self.ensure_editable()?;
        if next == ProposalStatus::Accepted {
            return Err(TransitionError::Illegal {
                from: self.status,
                to: next,
            });
        }
        Ok(())
    }

    /// Accept the proposal, locking it.
    pub fn accept(&mut self, acceptor: &Acceptor, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.status == ProposalStatus::Accepted || self.accepted_at.is_some() {
            return Err(TransitionError::AlreadyAccepted);
        }
        if self.is_locked {
            return Err(TransitionError::Locked);
        }
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal {
                status: self.status,
            });
        }
        self.status = ProposalStatus::Accepted;
        self.kind = ProposalKind::Order;
        self.is_locked = true;
        self.accepted_at = Some(now);
        self.accepted_by = Some(acceptor.label());
        self.updated_at = now;
        Ok(())
    }

    pub fn reject(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.ensure_editable()?;
        self.status = ProposalStatus::Rejected;
        self.updated_at = now;
        Ok(())
    }

    /// Record that the proposal was shared. Drafts become `sent`.
    pub fn mark_sent(&mut self, now: DateTime<Utc>) {
        if self.status == ProposalStatus::Draft {
            self.status = ProposalStatus::Sent;
        }
        if self.sent_at.is_none() {
            self.sent_at = Some(now);
        }
        self.updated_at = now;
    }

    /// Grand total, read from the stored column or from `manufacturers_data`.
    pub fn total(&self) -> Decimal {
        self.grand_total
            .unwrap_or_else(|| extract_total(&self.manufacturers_data))
    }
}

/// Best-effort grand total from client-supplied pricing JSON.
///
/// Looks at `totalPrice`, `total_price`, `total`, `grandTotal`,
/// `grand_total` and the same keys under `summary`. Missing or unparsable
/// data yields zero.
pub fn extract_total(data: &Value) -> Decimal {
    let parsed;
    let data = match data {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(value) => {
                parsed = value;
                &parsed
            }
            Err(_) => return Decimal::ZERO,
        },
        other => other,
    };
    const KEYS: [&str; 5] = ["totalPrice", "total_price", "total", "grandTotal", "grand_total"];
    let top = KEYS.iter().map(|k| data.get(k));
    let summary = ["totalPrice", "grandTotal"]
        .iter()
        .map(|k| data.get("summary").and_then(|s| s.get(k)));
    top.chain(summary)
        .flatten()
        .find_map(decimal_from_json)
        .unwrap_or(Decimal::ZERO)
}

fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Customer reference on a new proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerRef {
    None,
    Existing(Uuid),
    /// Find by email within the owner group, creating the customer if needed.
    FindOrCreate { name: String, email: EmailAddress },
}

/// Validated proposal fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalDraft {
    pub customer: CustomerRef,
    pub manufacturer_id: Option<Uuid>,
    pub designer_id: Option<UserId>,
    pub sales_rep: Option<String>,
    pub lead_source: Option<String>,
    pub location_id: Option<Uuid>,
    pub owner_group_id: Option<Uuid>,
    pub status: ProposalStatus,
    pub date: Option<DateTime<Utc>>,
    pub follow_up_dates: Vec<DateTime<Utc>>,
    pub description: Option<String>,
    pub manufacturers_data: Value,
    pub grand_total: Option<Decimal>,
}

/// Raw proposal fields as received.
#[derive(Debug, Clone, Default)]
pub struct ProposalInput {
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub manufacturer_id: Option<Uuid>,
    pub designer_id: Option<String>,
    pub sales_rep: Option<String>,
    pub lead_source: Option<String>,
    pub location_id: Option<Uuid>,
    pub owner_group_id: Option<Uuid>,
    pub status: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub follow_up_dates: Vec<DateTime<Utc>>,
    pub description: Option<String>,
    pub manufacturers_data: Option<Value>,
    pub grand_total: Option<Decimal>,
}

/// Validation errors for proposal payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProposalValidationError {
    #[error(transparent)]
    Status(#[from] UnknownStatus),
    #[error("grand total must not be negative")]
    NegativeTotal,
}

impl ProposalDraft {
    /// Validate raw input.
    ///
    /// A malformed designer id is dropped rather than rejected, and a customer
    /// name without a usable email does not trigger customer creation.
    pub fn try_new(input: ProposalInput) -> Result<Self, ProposalValidationError> {
        let status = ProposalStatus::parse(input.status.as_deref().unwrap_or_default())?;
        if input.grand_total.is_some_and(|t| t < Decimal::ZERO) {
            return Err(ProposalValidationError::NegativeTotal);
        }
        let clean = |v: Option<String>| v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());
        let customer = match (input.customer_id, clean(input.customer_name), input.customer_email) {
            (Some(id), _, _) => CustomerRef::Existing(id),
            (None, Some(name), Some(email)) => match EmailAddress::new(&email) {
                Ok(email) => CustomerRef::FindOrCreate { name, email },
                Err(_) => CustomerRef::None,
            },
            _ => CustomerRef::None,
        };
        Ok(Self {
            customer,
            manufacturer_id: input.manufacturer_id,
            designer_id: input.designer_id.and_then(|raw| UserId::new(raw.trim()).ok()),
            sales_rep: clean(input.sales_rep),
            lead_source: clean(input.lead_source),
            location_id: input.location_id,
            owner_group_id: input.owner_group_id,
            status,
            date: input.date,
            follow_up_dates: input.follow_up_dates,
            description: clean(input.description),
            manufacturers_data: input.manufacturers_data.unwrap_or(Value::Null),
            grand_total: input.grand_total,
        })
    }
}

/// Status groups counted by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSet {
    /// Not accepted, rejected or expired.
    Active,
    /// Sent and waiting for the customer.
    AwaitingApproval,
}

impl StatusSet {
    pub const fn contains(self, status: ProposalStatus) -> bool {
        match self {
            Self::Active => status.is_active(),
            Self::AwaitingApproval => status.is_awaiting_approval(),
        }
    }

    pub fn members(self) -> impl Iterator<Item = ProposalStatus> {
        ProposalStatus::ALL
            .into_iter()
            .filter(move |status| self.contains(*status))
    }
}

/// Proposal list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalFilter {
    pub group_id: Option<Uuid>,
    pub status: Option<ProposalStatus>,
    pub status_set: Option<StatusSet>,
    pub kind: Option<ProposalKind>,
    pub customer_id: Option<Uuid>,
    /// Only proposals updated at or after this instant.
    pub updated_since: Option<DateTime<Utc>>,
}

impl ProposalFilter {
    pub fn matches(&self, proposal: &Proposal) -> bool {
        !proposal.is_deleted
            && (self.group_id.is_none() || proposal.owner_group_id == self.group_id)
            && self.status.is_none_or(|s| proposal.status == s)
            && self.status_set.is_none_or(|set| set.contains(proposal.status))
            && self.kind.is_none_or(|k| proposal.kind == k)
            && (self.customer_id.is_none() || proposal.customer_id == self.customer_id)
            && self.updated_since.is_none_or(|since| proposal.updated_at >= since)
    }
}

#[cfg(test)]
pub(crate) fn sample(status: ProposalStatus) -> Proposal {
    let now = Utc::now();
    Proposal {
        id: Uuid::new_v4(),
        number: None,
        customer_id: None,
        manufacturer_id: None,
        owner_group_id: None,
        created_by: None,
        designer_id: None,
        sales_rep: None,
        lead_source: None,
        location_id: None,
        kind: ProposalKind::Proposal,
        status,
        date: now,
        follow_up_dates: Vec::new(),
        description: None,
        manufacturers_data: Value::Null,
        grand_total: None,
        is_locked: false,
        accepted_at: None,
        accepted_by: None,
        sent_at: None,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests;
