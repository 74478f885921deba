//! Numbering and backfill planning.

use super::*;
use chrono::TimeZone;
use rstest::{fixture, rstest};
use serde_json::json;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[fixture]
fn order() -> Order {
    Order {
        id: Uuid::new_v4(),
        proposal_id: Uuid::new_v4(),
        number: None,
        number_date: None,
        number_seq: None,
        owner_group_id: None,
        customer_id: None,
        manufacturer_id: None,
        style_name: None,
        accepted_by: None,
        accepted_at: None,
        status: NEW_ORDER_STATUS.to_owned(),
        grand_total: Decimal::ZERO,
        snapshot: Value::Null,
        created_at: Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).single().expect("ts"),
    }
}

#[rstest]
#[case("NJ-001-010125", "NJ", 1, date(2025, 1, 1))]
#[case("NJQ-120-123199", "NJQ", 120, date(2099, 12, 31))]
fn parses_numbers(
    #[case] raw: &str,
    #[case] prefix: &str,
    #[case] seq: u32,
    #[case] expected_date: NaiveDate,
) {
    let number: DocumentNumber = raw.parse().expect("valid number");
    assert_eq!(number.prefix(), prefix);
    assert_eq!(number.seq(), seq);
    assert_eq!(number.date(), expected_date);
    assert_eq!(number.to_string(), raw);
}

#[rstest]
#[case("nj-001-010125")]
#[case("NJ-01-010125")]
#[case("NJ-001-01012")]
#[case("NJ-001-130125")]
#[case("NJ-000-010125")]
#[case("NJ001010125")]
#[case("NJ-001-010125-X")]
#[case("")]
fn rejects_malformed(#[case] raw: &str) {
    assert!(!DocumentNumber::is_normalised(raw));
}

#[rstest]
fn counters_continue_from_max() {
    let day = date(2025, 3, 15);
    let mut counters = SequenceCounters::from_max([(day, 4)]);
    assert_eq!(
        counters.next("NJ", day).expect("seq").to_string(),
        "NJ-005-031525"
    );
    counters.observe(day, 9);
    assert_eq!(counters.next("NJ", day).expect("seq").seq(), 10);
    assert_eq!(
        counters.next("NJ", date(2025, 3, 16)).expect("seq").seq(),
        1
    );
}

#[rstest]
fn counters_refuse_overflow() {
    let day = date(2025, 3, 15);
    let mut counters = SequenceCounters::from_max([(day, MAX_SEQUENCE)]);
    assert_eq!(counters.next("NJ", day), Err(NumberingError::Exhausted(day)));
}

#[rstest]
fn date_source_fallbacks(order: Order) {
    let today = date(2026, 1, 2);
    let accepted = Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).single();
    assert_eq!(DateSource::Accepted.pick(None, order.created_at, today), date(2025, 3, 15));
    assert_eq!(DateSource::Accepted.pick(accepted, order.created_at, today), date(2025, 4, 1));
    assert_eq!(DateSource::Created.pick(accepted, order.created_at, today), date(2025, 3, 15));
    assert_eq!(DateSource::Today.pick(accepted, order.created_at, today), today);
}

#[rstest]
fn snapshot_number_is_inserted_without_losing_fields() {
    let snapshot = json!({"info": {"customer": "Jane"}, "items": [1]});
    let patched = with_snapshot_number(&snapshot, "NJ-001-010125");
    assert_eq!(snapshot_number(&patched), Some("NJ-001-010125"));
    assert_eq!(patched["info"]["customer"], "Jane");
    assert_eq!(patched["items"], json!([1]));
    assert_eq!(snapshot_number(&with_snapshot_number(&json!("x"), "A-001-010125")), Some("A-001-010125"));
}

#[rstest]
fn plan_allocates_for_missing_numbers(order: Order) {
    let day = date(2025, 3, 15);
    let mut counters = SequenceCounters::from_max([(day, 2)]);
    let plan = plan_order_backfill(&order, day, "NJ", true, &mut counters).expect("plan");
    let OrderBackfill::Update { number, model, snapshot } = plan else {
        panic!("expected update");
    };
    assert_eq!(number.to_string(), "NJ-003-031525");
    assert!(model && snapshot);
}

#[rstest]
fn plan_keeps_complete_numbers(mut order: Order) {
    let day = date(2025, 3, 15);
    order.number = Some("NJ-007-031525".to_owned());
    order.number_date = Some(day);
    order.number_seq = Some(7);
    order.snapshot = with_snapshot_number(&Value::Null, "NJ-007-031525");
    let mut counters = SequenceCounters::default();
    let plan = plan_order_backfill(&order, day, "NJ", true, &mut counters).expect("plan");
    assert_eq!(plan, OrderBackfill::Unchanged);
    // the existing sequence is reserved for later allocations
    assert_eq!(counters.next("NJ", day).expect("seq").seq(), 8);
}

#[rstest]
fn plan_reconciles_snapshot_only(mut order: Order) {
    let day = date(2025, 3, 15);
    order.number = Some("NJ-007-031525".to_owned());
    order.number_date = Some(day);
    order.number_seq = Some(7);
    order.snapshot = with_snapshot_number(&Value::Null, "NJ-001-031525");
    let mut counters = SequenceCounters::default();
    let plan = plan_order_backfill(&order, day, "NJ", true, &mut counters).expect("plan");
    assert!(matches!(
        plan,
        OrderBackfill::Update { model: false, snapshot: true, .. }
    ));
    let skipped = plan_order_backfill(&order, day, "NJ", false, &mut counters).expect("plan");
    assert_eq!(skipped, OrderBackfill::Unchanged);
}

#[rstest]
fn plan_promotes_snapshot_number(mut order: Order) {
    let day = date(2025, 3, 15);
    order.snapshot = with_snapshot_number(&Value::Null, "NJ-004-031525");
    let mut counters = SequenceCounters::default();
    let plan = plan_order_backfill(&order, day, "NJ", true, &mut counters).expect("plan");
    let OrderBackfill::Update { number, model, snapshot } = plan else {
        panic!("expected update");
    };
    assert_eq!(number.seq(), 4);
    assert!(model);
    assert!(!snapshot);
}

#[rstest]
#[case(Some("NJQ-003-010125"), ProposalBackfill::Unchanged)]
#[case(None, ProposalBackfill::Allocate)]
#[case(Some("Q-17"), ProposalBackfill::Allocate)]
fn proposal_backfill_plans(#[case] number: Option<&str>, #[case] expected: ProposalBackfill) {
    assert_eq!(plan_proposal_backfill(number, "NJQ"), Ok(expected));
}

#[rstest]
fn proposal_backfill_renames_order_prefix() {
    let plan = plan_proposal_backfill(Some("NJ-003-010125"), "NJQ").expect("plan");
    let ProposalBackfill::Rename(number) = plan else {
        panic!("expected rename");
    };
    assert_eq!(number.to_string(), "NJQ-003-010125");
}

#[rstest]
fn filter_windows_by_creation(order: Order) {
    let at_creation = OrderFilter {
        created_since: Some(order.created_at),
        ..OrderFilter::default()
    };
    let after = OrderFilter {
        created_since: Some(order.created_at + chrono::Duration::days(1)),
        ..OrderFilter::default()
    };
    assert!(at_creation.matches(&order));
    assert!(!after.matches(&order));
}
