//! Payments recorded against orders.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::UserId;

/// Currency used when a payment does not name one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Lifecycle of a payment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

/// Raised for an unknown payment status label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment status: {0}")]
pub struct UnknownPaymentStatus(pub String);

impl PaymentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Pending, processing and completed payments block a new payment for the
    /// same order.
    pub const fn blocks_new_payment(self) -> bool {
        matches!(self, Self::Pending | Self::Processing | Self::Completed)
    }

    /// Only payments that never took money may be deleted.
    pub const fn is_deletable(self) -> bool {
        matches!(self, Self::Pending | Self::Failed | Self::Cancelled)
    }

    /// Map a gateway outcome: `success` completes, `failed` fails, anything
    /// else is still processing.
    pub fn from_gateway(outcome: &str) -> Self {
        match outcome.trim().to_lowercase().as_str() {
            "success" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Processing,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownPaymentStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(UnknownPaymentStatus(s.to_owned())),
        }
    }
}

/// Persisted payment.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub gateway_response: Option<Value>,
    pub created_by: Option<UserId>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Apply a status change. Completion stamps `paid_at`.
    pub fn set_status(
        &mut self,
        status: PaymentStatus,
        transaction_id: Option<String>,
        gateway_response: Option<Value>,
        now: DateTime<Utc>,
    ) {
        self.status = status;
        if let Some(tx) = transaction_id.filter(|t| !t.trim().is_empty()) {
            self.transaction_id = Some(tx);
        }
        if gateway_response.is_some() {
            self.gateway_response = gateway_response;
        }
        if status == PaymentStatus::Completed {
            self.paid_at = Some(now);
        }
        self.updated_at = now;
    }

    /// Mark as completed by hand. Returns `false` when it already was.
    pub fn apply(
        &mut self,
        transaction_id: Option<String>,
        payment_method: Option<String>,
        now: DateTime<Utc>,
    ) -> bool {
        if self.status == PaymentStatus::Completed {
            return false;
        }
        if let Some(method) = payment_method.filter(|m| !m.trim().is_empty()) {
            self.payment_method = Some(method);
        }
        self.set_status(PaymentStatus::Completed, transaction_id, None, now);
        true
    }

    /// Record a gateway callback. A transaction id only fills an empty one.
    pub fn record_gateway_event(&mut self, event: &GatewayEvent, now: DateTime<Utc>) {
        let tx = match (&self.transaction_id, &event.transaction_id) {
            (None, Some(tx)) => Some(tx.clone()),
            _ => None,
        };
        self.set_status(
            PaymentStatus::from_gateway(&event.status),
            tx,
            Some(event.raw.clone()),
            now,
        );
    }
}

/// Validated new payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDraft {
    pub order_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: Option<String>,
}

/// Validation errors for payment payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentValidationError {
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("currency must be a three-letter code")]
    InvalidCurrency,
}

impl PaymentDraft {
    pub fn try_new(
        order_id: Uuid,
        amount: Decimal,
        currency: Option<&str>,
        payment_method: Option<&str>,
    ) -> Result<Self, PaymentValidationError> {
        if amount <= Decimal::ZERO {
            return Err(PaymentValidationError::NonPositiveAmount);
        }
        let currency = currency
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
            .to_uppercase();
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(PaymentValidationError::InvalidCurrency);
        }
        Ok(Self {
            order_id,
            amount,
            currency,
            payment_method: payment_method
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_owned),
        })
    }
}

/// Payment gateway callback.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayEvent {
    pub transaction_id: Option<String>,
    pub order_id: Option<Uuid>,
    /// Gateway outcome label, e.g. `success`.
    pub status: String,
    /// Full callback body, stored as the gateway response.
    pub raw: Value,
}

/// Payment list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentFilter {
    /// Restrict to payments of orders owned by this group.
    pub group_id: Option<Uuid>,
    pub status: Option<PaymentStatus>,
    pub order_id: Option<Uuid>,
}
