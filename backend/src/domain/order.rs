//! Orders and document numbering.
//!
//! Orders and proposals carry human-facing numbers of the form
//! `PREFIX-SSS-MMDDYY`: an upper-case prefix, a three-digit sequence that
//! restarts every day, and the numbering date.
//!
//! The sequence is fixed at three digits, so a prefix issues at most
//! [`MAX_SEQUENCE`] numbers per day. Allocation past that fails with
//! [`NumberingError::Exhausted`], which the services report as a conflict.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Highest sequence representable in three digits; the daily cap per prefix.
pub const MAX_SEQUENCE: u32 = 999;

/// Errors raised while parsing or allocating document numbers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumberingError {
    #[error("not a document number: {0}")]
    Malformed(String),
    #[error("prefix must be upper-case ASCII letters")]
    InvalidPrefix,
    #[error("no sequence left for {0}")]
    Exhausted(NaiveDate),
}

/// Parsed `PREFIX-SSS-MMDDYY` number.
///
/// # Examples
/// ```
/// use cabinet_backend::domain::DocumentNumber;
///
/// let number: DocumentNumber = "NJ-007-031525".parse().expect("valid");
/// assert_eq!(number.seq(), 7);
/// assert_eq!(number.date().to_string(), "2025-03-15");
/// assert_eq!(number.to_string(), "NJ-007-031525");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentNumber {
    prefix: String,
    seq: u32,
    date: NaiveDate,
}

fn valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_uppercase())
}

impl DocumentNumber {
    pub fn new(prefix: &str, seq: u32, date: NaiveDate) -> Result<Self, NumberingError> {
        if !valid_prefix(prefix) {
            return Err(NumberingError::InvalidPrefix);
        }
        if seq == 0 || seq > MAX_SEQUENCE {
            return Err(NumberingError::Exhausted(date));
        }
        Ok(Self {
            prefix: prefix.to_owned(),
            seq,
            date,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn seq(&self) -> u32 {
        self.seq
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Same date and sequence under another prefix.
    pub fn with_prefix(&self, prefix: &str) -> Result<Self, NumberingError> {
        Self::new(prefix, self.seq, self.date)
    }

    /// Whether `raw` is a well-formed number.
    pub fn is_normalised(raw: &str) -> bool {
        raw.parse::<Self>().is_ok()
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:03}-{:02}{:02}{:02}",
            self.prefix,
            self.seq,
            self.date.month(),
            self.date.day(),
            self.date.year().rem_euclid(100)
        )
    }
}

impl FromStr for DocumentNumber {
    type Err = NumberingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || NumberingError::Malformed(s.to_owned());
        let mut parts = s.split('-');
        let (Some(prefix), Some(seq), Some(date), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        let all_digits = |p: &str, len: usize| p.len() == len && p.bytes().all(|b| b.is_ascii_digit());
        if !valid_prefix(prefix) || !all_digits(seq, 3) || !all_digits(date, 6) {
            return Err(malformed());
        }
        let field = |range: std::ops::Range<usize>| date[range].parse::<u32>().map_err(|_| malformed());
        let (month, day, year) = (field(0..2)?, field(2..4)?, field(4..6)?);
        let year = i32::try_from(2000 + year).map_err(|_| malformed())?;
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(malformed)?;
        let seq = seq.parse::<u32>().map_err(|_| malformed())?;
        Self::new(prefix, seq, date).map_err(|_| malformed())
    }
}

/// Which timestamp buckets an order into a numbering date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    #[default]
    Accepted,
    Created,
    Today,
}

impl DateSource {
    /// Pick the numbering date, falling back along accepted → created → today.
    pub fn pick(
        self,
        accepted_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        today: NaiveDate,
    ) -> NaiveDate {
        match self {
            Self::Today => today,
            Self::Accepted => accepted_at.unwrap_or(created_at).date_naive(),
            Self::Created => created_at.date_naive(),
        }
    }
}

impl FromStr for DateSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(Self::Accepted),
            "created" => Ok(Self::Created),
            "today" => Ok(Self::Today),
            other => Err(format!("unknown date source: {other}")),
        }
    }
}

/// Per-date sequence counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceCounters(HashMap<NaiveDate, u32>);

impl SequenceCounters {
    /// Seed counters from the highest stored sequence per date.
    pub fn from_max(max_by_date: impl IntoIterator<Item = (NaiveDate, u32)>) -> Self {
        Self(max_by_date.into_iter().collect())
    }

    /// Raise the counter for `date` to at least `seq`.
    pub fn observe(&mut self, date: NaiveDate, seq: u32) {
        let current = self.0.entry(date).or_default();
        *current = (*current).max(seq);
    }

    /// Allocate the next number for `date`.
    pub fn next(&mut self, prefix: &str, date: NaiveDate) -> Result<DocumentNumber, NumberingError> {
        let current = self.0.entry(date).or_default();
        let next = *current + 1;
        let number = DocumentNumber::new(prefix, next, date)?;
        *current = next;
        Ok(number)
    }
}

/// Persisted order created when a proposal is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub proposal_id: Uuid,
    pub number: Option<String>,
    pub number_date: Option<NaiveDate>,
    pub number_seq: Option<u32>,
    pub owner_group_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub manufacturer_id: Option<Uuid>,
    pub style_name: Option<String>,
    pub accepted_by: Option<String>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub status: String,
    pub grand_total: Decimal,
    /// Frozen copy of the proposal at acceptance.
    pub snapshot: Value,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Parsed stored number, if well formed.
    pub fn document_number(&self) -> Option<DocumentNumber> {
        self.number.as_deref().and_then(|n| n.parse().ok())
    }
}

/// Status given to new orders.
pub const NEW_ORDER_STATUS: &str = "new";

/// Order number recorded inside the snapshot (`info.orderNumber`).
pub fn snapshot_number(snapshot: &Value) -> Option<&str> {
    snapshot.get("info")?.get("orderNumber")?.as_str()
}

/// Copy of `snapshot` with `info.orderNumber` set.
pub fn with_snapshot_number(snapshot: &Value, number: &str) -> Value {
    let mut root = match snapshot {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    let mut info = match root.get("info") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    info.insert("orderNumber".to_owned(), Value::String(number.to_owned()));
    root.insert("info".to_owned(), Value::Object(info));
    Value::Object(root)
}

/// Change planned for one order during a backfill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBackfill {
    /// Number and snapshot already agree.
    Unchanged,
    Update {
        number: DocumentNumber,
        /// Write number, date and sequence columns.
        model: bool,
        /// Write `snapshot.info.orderNumber`.
        snapshot: bool,
    },
}

/// Decide how to backfill one order.
///
/// A well-formed stored number wins, then a well-formed snapshot number;
/// otherwise a fresh number is allocated for the order's date. Existing
/// numbers on the same date raise that date's counter so later allocations
/// never collide with them.
pub fn plan_order_backfill(
    order: &Order,
    date: NaiveDate,
    prefix: &str,
    reconcile: bool,
    counters: &mut SequenceCounters,
) -> Result<OrderBackfill, NumberingError> {
    let model = order.document_number();
    let snap_raw = snapshot_number(&order.snapshot);
    let snap = snap_raw.and_then(|n| n.parse::<DocumentNumber>().ok());
    let target = match model.clone().or(snap) {
        Some(existing) => {
            if existing.date() == date {
                counters.observe(date, existing.seq());
            }
            existing
        }
        None => counters.next(prefix, date)?,
    };
    let needs_model =
        model.is_none() || order.number_date.is_none() || order.number_seq.is_none();
    let target_text = target.to_string();
    let needs_snapshot = reconcile && snap_raw != Some(target_text.as_str());
    if needs_model || needs_snapshot {
        Ok(OrderBackfill::Update {
            number: target,
            model: needs_model,
            snapshot: needs_snapshot,
        })
    } else {
        Ok(OrderBackfill::Unchanged)
    }
}

/// Change planned for one proposal number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalBackfill {
    Unchanged,
    /// Well-formed number under the wrong prefix; keep date and sequence.
    Rename(DocumentNumber),
    /// Missing or malformed number; allocate a fresh one.
    Allocate,
}

/// Decide how to backfill one proposal number.
pub fn plan_proposal_backfill(
    number: Option<&str>,
    prefix: &str,
) -> Result<ProposalBackfill, NumberingError> {
    match number.and_then(|n| n.parse::<DocumentNumber>().ok()) {
        Some(parsed) if parsed.prefix() == prefix => Ok(ProposalBackfill::Unchanged),
        Some(parsed) => Ok(ProposalBackfill::Rename(parsed.with_prefix(prefix)?)),
        None => Ok(ProposalBackfill::Allocate),
    }
}

/// Order list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub group_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    /// Only orders created at or after this instant.
    pub created_since: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        (self.group_id.is_none() || order.owner_group_id == self.group_id)
            && (self.customer_id.is_none() || order.customer_id == self.customer_id)
            && self.created_since.is_none_or(|since| order.created_at >= since)
    }
}

#[cfg(test)]
mod tests;
