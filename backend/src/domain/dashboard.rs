//! Dashboard metrics derived from a principal's proposals and orders.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::order::Order;
use crate::domain::proposal::{Proposal, ProposalStatus, Stage};

/// Deltas are clamped to this magnitude.
pub const MAX_DELTA: i64 = 999;

/// Number of proposals in the pipeline list.
pub const PIPELINE_LEN: usize = 6;

/// Number of follow-up tasks in the summary.
pub const TASKS_LEN: usize = 6;

/// Days of history the summary loads: two thirty-day comparison windows.
pub const SUMMARY_WINDOW_DAYS: i64 = 60;

fn clamp(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "value is rounded and clamped to ±999 first"
    )]
    let rounded = value.round().clamp(-999.0, 999.0) as i64;
    rounded
}

/// Percentage growth of `current` over `previous`.
///
/// With no previous activity any current activity counts as `100`.
///
/// # Examples
/// ```
/// use cabinet_backend::domain::dashboard::delta;
///
/// assert_eq!(delta(15.0, 10.0), 50);
/// assert_eq!(delta(3.0, 0.0), 100);
/// assert_eq!(delta(0.0, 0.0), 0);
/// ```
pub fn delta(current: f64, previous: f64) -> i64 {
    if previous == 0.0 {
        return if current > 0.0 { 100 } else { 0 };
    }
    clamp((current - previous) / previous * 100.0)
}

/// Percentage improvement where smaller is better (e.g. response times).
pub fn improvement_delta(current: f64, previous: f64) -> i64 {
    if previous == 0.0 {
        return 0;
    }
    clamp((previous - current) / previous * 100.0)
}

/// Urgency of a task by its due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Due within a day (or overdue) is high, within three days medium.
pub fn priority(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Priority {
    let Some(due) = due else {
        return Priority::Low;
    };
    let remaining = due - now;
    if remaining <= Duration::days(1) {
        Priority::High
    } else if remaining <= Duration::days(3) {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Active proposal and order totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub active_proposals: u64,
    pub active_orders: u64,
}

/// One headline metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub id: &'static str,
    pub value: Decimal,
    pub delta: i64,
}

/// Proposal shown in the pipeline strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineEntry {
    pub id: Uuid,
    pub name: String,
    pub stage: Stage,
    pub value: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Follow-up due on a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpTask {
    pub proposal_id: Uuid,
    pub title: String,
    pub due_on: NaiveDate,
    pub priority: Priority,
}

/// Totals counted by the repositories rather than from loaded rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub counts: Counts,
    pub awaiting_approvals: u64,
}

/// Full dashboard payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub counts: Counts,
    pub metrics: Vec<Metric>,
    pub pipeline: Vec<PipelineEntry>,
    pub tasks: Vec<FollowUpTask>,
}

fn in_window(at: DateTime<Utc>, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
    at >= from && at < to
}

#[expect(
    clippy::cast_precision_loss,
    reason = "dashboard counts stay far below 2^52"
)]
fn count_f64(n: usize) -> f64 {
    n as f64
}

/// Average seconds between sending and acceptance for proposals updated in
/// the window.
fn average_response_seconds(
    proposals: &[&Proposal],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> f64 {
    let samples: Vec<f64> = proposals
        .iter()
        .filter(|p| in_window(p.updated_at, from, to))
        .filter_map(|p| Some((p.accepted_at? - p.sent_at?).num_seconds()))
        .map(|secs| {
            #[expect(clippy::cast_precision_loss, reason = "durations fit in f64")]
            let secs = secs as f64;
            secs
        })
        .collect();
    if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<f64>() / count_f64(samples.len())
    }
}

/// Label for a proposal: customer name when known, else description, else
/// its number.
pub type NameLookup<'a> = dyn Fn(&Proposal) -> Option<String> + 'a;

/// Build the summary.
///
/// `proposals` and `orders` are the principal's records touched within the
/// last [`SUMMARY_WINDOW_DAYS`]; headline values come from `totals`.
pub fn build_summary(
    proposals: &[Proposal],
    orders: &[Order],
    totals: Totals,
    customer_name: &NameLookup<'_>,
    now: DateTime<Utc>,
) -> DashboardSummary {
    let live: Vec<&Proposal> = proposals.iter().filter(|p| !p.is_deleted).collect();
    let week = Duration::days(7);
    let month = Duration::days(30);

    let active: Vec<&Proposal> = live
        .iter()
        .copied()
        .filter(|p| p.status.is_active())
        .collect();
    let awaiting: Vec<&Proposal> = live
        .iter()
        .copied()
        .filter(|p| p.status.is_awaiting_approval())
        .collect();
    let windowed = |set: &[&Proposal], from, to| {
        count_f64(set.iter().filter(|p| in_window(p.updated_at, from, to)).count())
    };
    let created_in = |from, to| {
        count_f64(live.iter().filter(|p| in_window(p.created_at, from, to)).count())
    };
    let orders_in = |from, to| {
        count_f64(orders.iter().filter(|o| in_window(o.created_at, from, to)).count())
    };
    let far_future = now + Duration::days(1);

    let response_now = average_response_seconds(&live, now - month, far_future);
    let response_before = average_response_seconds(&live, now - month - month, now - month);
    let response_hours = crate::domain::pricing::round_money(
        Decimal::try_from(response_now / 3600.0).unwrap_or(Decimal::ZERO),
    );

    let metrics = vec![
        Metric {
            id: "activeQuotes",
            value: Decimal::from(totals.counts.active_proposals),
            delta: delta(
                windowed(&active, now - week, far_future),
                windowed(&active, now - week - week, now - week),
            ),
        },
        Metric {
            id: "awaitingApprovals",
            value: Decimal::from(totals.awaiting_approvals),
            delta: delta(
                windowed(&awaiting, now - week, far_future),
                windowed(&awaiting, now - week - week, now - week),
            ),
        },
        Metric {
            id: "newProposals",
            value: Decimal::try_from(created_in(now - month, far_future)).unwrap_or_default(),
            delta: delta(
                created_in(now - month, far_future),
                created_in(now - month - month, now - month),
            ),
        },
        Metric {
            id: "newOrders",
            value: Decimal::try_from(orders_in(now - month, far_future)).unwrap_or_default(),
            delta: delta(
                orders_in(now - month, far_future),
                orders_in(now - month - month, now - month),
            ),
        },
        Metric {
            id: "avgResponseTime",
            value: response_hours,
            delta: improvement_delta(response_now, response_before),
        },
    ];

    let mut recent = live.clone();
    recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    let pipeline = recent
        .iter()
        .filter(|p| p.status != ProposalStatus::Rejected)
        .take(PIPELINE_LEN)
        .map(|p| PipelineEntry {
            id: p.id,
            name: display_name(p, customer_name),
            stage: p.status.stage(),
            value: p.total(),
            updated_at: p.updated_at,
        })
        .collect();

    let mut tasks: Vec<FollowUpTask> = active
        .iter()
        .flat_map(|p| {
            p.follow_up_dates
                .iter()
                .filter(|due| **due >= now - Duration::days(1))
                .map(move |due| (p, *due))
        })
        .map(|(p, due)| FollowUpTask {
            proposal_id: p.id,
            title: format!("Follow up with {}", display_name(p, customer_name)),
            due_on: due.date_naive(),
            priority: priority(Some(due), now),
        })
        .collect();
    tasks.sort_by_key(|t| t.due_on);
    tasks.truncate(TASKS_LEN);

    DashboardSummary {
        counts: totals.counts,
        metrics,
        pipeline,
        tasks,
    }
}

fn display_name(proposal: &Proposal, customer_name: &NameLookup<'_>) -> String {
    customer_name(proposal)
        .or_else(|| proposal.description.clone())
        .or_else(|| proposal.number.clone())
        .unwrap_or_else(|| format!("Proposal {}", proposal.id))
}
