//! Status parsing and lifecycle guards.

use super::*;
use rstest::rstest;
use rstest_bdd_macros::{given, then, when};
use rust_decimal_macros::dec;
use serde_json::json;

#[rstest]
#[case("draft", ProposalStatus::Draft)]
#[case("Draft", ProposalStatus::Draft)]
#[case("  ", ProposalStatus::Draft)]
#[case("sent", ProposalStatus::Sent)]
#[case("Follow up 1", ProposalStatus::FollowUp1)]
#[case("follow_up_3", ProposalStatus::FollowUp3)]
#[case("Measurement Scheduled", ProposalStatus::MeasurementScheduled)]
#[case("Measurement done", ProposalStatus::MeasurementDone)]
#[case("Design done", ProposalStatus::DesignDone)]
#[case("Proposal done", ProposalStatus::ProposalDone)]
#[case("Proposal accepted", ProposalStatus::Accepted)]
#[case("accepted", ProposalStatus::Accepted)]
#[case("Proposal rejected", ProposalStatus::Rejected)]
fn parses_legacy_labels(#[case] raw: &str, #[case] expected: ProposalStatus) {
    assert_eq!(ProposalStatus::parse(raw), Ok(expected));
}

#[rstest]
fn canonical_labels_round_trip() {
    for status in ProposalStatus::ALL {
        assert_eq!(ProposalStatus::parse(status.as_str()), Ok(status));
        let json = serde_json::to_value(status).expect("serialise");
        assert_eq!(json, json!(status.as_str()));
    }
}

#[rstest]
fn rejects_unknown_label() {
    assert!(ProposalStatus::parse("on hold").is_err());
}

#[rstest]
#[case(ProposalStatus::FollowUp1, Stage::Negotiation)]
#[case(ProposalStatus::FollowUp3, Stage::Negotiation)]
#[case(ProposalStatus::Sent, Stage::AwaitingSign)]
#[case(ProposalStatus::ProposalDone, Stage::AwaitingSign)]
#[case(ProposalStatus::Accepted, Stage::AwaitingSign)]
#[case(ProposalStatus::Draft, Stage::Review)]
#[case(ProposalStatus::DesignDone, Stage::Review)]
#[case(ProposalStatus::Rejected, Stage::Review)]
fn stage_mapping(#[case] status: ProposalStatus, #[case] expected: Stage) {
    assert_eq!(status.stage(), expected);
}

#[rstest]
fn active_and_awaiting_sets() {
    let active: Vec<_> = ProposalStatus::active().collect();
    assert_eq!(active.len(), 9);
    assert!(!active.contains(&ProposalStatus::Accepted));
    assert!(ProposalStatus::FollowUp2.is_awaiting_approval());
    assert!(!ProposalStatus::Draft.is_awaiting_approval());
    assert!(!ProposalStatus::MeasurementDone.is_awaiting_approval());
}

#[rstest]
fn terminal_proposals_reject_status_changes() {
    let proposal = sample(ProposalStatus::Rejected);
    assert_eq!(
        proposal.ensure_transition(ProposalStatus::Sent),
        Err(TransitionError::Terminal {
            status: ProposalStatus::Rejected
        })
    );
    assert!(proposal.ensure_transition(ProposalStatus::Rejected).is_ok());
}

#[rstest]
fn updates_cannot_accept() {
    let proposal = sample(ProposalStatus::Sent);
    assert!(matches!(
        proposal.ensure_transition(ProposalStatus::Accepted),
        Err(TransitionError::Illegal { .. })
    ));
    assert!(proposal.ensure_transition(ProposalStatus::FollowUp1).is_ok());
}

#[rstest]
fn reject_requires_active_status() {
    let mut proposal = sample(ProposalStatus::Accepted);
    proposal.is_locked = true;
    assert_eq!(proposal.reject(Utc::now()), Err(TransitionError::Locked));
}

#[rstest]
fn mark_sent_promotes_drafts_only() {
    let now = Utc::now();
    let mut draft = sample(ProposalStatus::Draft);
    draft.mark_sent(now);
    assert_eq!(draft.status, ProposalStatus::Sent);
    assert_eq!(draft.sent_at, Some(now));

    let mut measured = sample(ProposalStatus::MeasurementDone);
    measured.mark_sent(now);
    assert_eq!(measured.status, ProposalStatus::MeasurementDone);
}

#[rstest]
#[case(json!({"totalPrice": 1250.5}), dec!(1250.5))]
#[case(json!({"grand_total": "99.95"}), dec!(99.95))]
#[case(json!({"summary": {"grandTotal": 10}}), dec!(10))]
#[case(json!("{\"total\": 42}"), dec!(42))]
#[case(json!("not json"), dec!(0))]
#[case(json!(null), dec!(0))]
fn extracts_totals(#[case] data: Value, #[case] expected: Decimal) {
    assert_eq!(extract_total(&data), expected);
}

#[rstest]
fn draft_defaults_and_customer_resolution() {
    let draft = ProposalDraft::try_new(ProposalInput {
        customer_name: Some(" Jane ".to_owned()),
        customer_email: Some("Jane@Example.com".to_owned()),
        designer_id: Some("not-a-uuid".to_owned()),
        ..ProposalInput::default()
    })
    .expect("valid draft");
    assert_eq!(draft.status, ProposalStatus::Draft);
    assert_eq!(draft.designer_id, None);
    assert_eq!(
        draft.customer,
        CustomerRef::FindOrCreate {
            name: "Jane".to_owned(),
            email: EmailAddress::new("jane@example.com").expect("email"),
        }
    );
}

#[rstest]
fn draft_prefers_explicit_customer_id() {
    let id = Uuid::new_v4();
    let draft = ProposalDraft::try_new(ProposalInput {
        customer_id: Some(id),
        customer_name: Some("Jane".to_owned()),
        customer_email: Some("jane@example.com".to_owned()),
        ..ProposalInput::default()
    })
    .expect("valid draft");
    assert_eq!(draft.customer, CustomerRef::Existing(id));
}

#[rstest]
fn filter_matches_owner_and_status() {
    let group = Uuid::new_v4();
    let mut proposal = sample(ProposalStatus::Sent);
    proposal.owner_group_id = Some(group);
    let filter = ProposalFilter {
        group_id: Some(group),
        status: Some(ProposalStatus::Sent),
        ..ProposalFilter::default()
    };
    assert!(filter.matches(&proposal));
    proposal.is_deleted = true;
    assert!(!filter.matches(&proposal));
}

#[rstest]
#[case(StatusSet::Active, ProposalStatus::Draft, true)]
#[case(StatusSet::Active, ProposalStatus::Accepted, false)]
#[case(StatusSet::AwaitingApproval, ProposalStatus::FollowUp2, true)]
#[case(StatusSet::AwaitingApproval, ProposalStatus::Draft, false)]
fn filter_matches_status_sets(
    #[case] set: StatusSet,
    #[case] status: ProposalStatus,
    #[case] expected: bool,
) {
    let filter = ProposalFilter {
        status_set: Some(set),
        ..ProposalFilter::default()
    };
    assert_eq!(filter.matches(&sample(status)), expected);
    assert_eq!(set.members().any(|member| member == status), expected);
}

#[rstest]
fn filter_skips_proposals_untouched_since_the_window() {
    let proposal = sample(ProposalStatus::Sent);
    let filter = ProposalFilter {
        updated_since: Some(proposal.updated_at + chrono::Duration::seconds(1)),
        ..ProposalFilter::default()
    };
    assert!(!filter.matches(&proposal));
}

#[given("a sent proposal")]
fn a_sent_proposal() -> Proposal {
    sample(ProposalStatus::Sent)
}

#[given("an accepted proposal")]
fn an_accepted_proposal() -> Proposal {
    let mut proposal = sample(ProposalStatus::Sent);
    proposal
        .accept(&Acceptor::Internal(UserId::random()), Utc::now())
        .expect("first acceptance");
    proposal
}

#[when("the customer accepts it")]
fn the_customer_accepts_it(mut proposal: Proposal) -> (Proposal, Result<(), TransitionError>) {
    let acceptor = Acceptor::External {
        name: "Jane Roe".to_owned(),
        email: EmailAddress::new("jane@example.com").expect("email"),
    };
    let result = proposal.accept(&acceptor, Utc::now());
    (proposal, result)
}

#[then("the proposal is locked as an order")]
fn the_proposal_is_locked_as_an_order(outcome: (Proposal, Result<(), TransitionError>)) {
    let (proposal, result) = outcome;
    assert!(result.is_ok());
    assert!(proposal.is_locked);
    assert_eq!(proposal.kind, ProposalKind::Order);
    assert_eq!(proposal.status, ProposalStatus::Accepted);
    assert_eq!(proposal.accepted_by.as_deref(), Some("Jane Roe <jane@example.com>"));
    assert!(proposal.accepted_at.is_some());
}

#[then("acceptance is refused as a duplicate")]
fn acceptance_is_refused_as_a_duplicate(outcome: (Proposal, Result<(), TransitionError>)) {
    assert_eq!(outcome.1, Err(TransitionError::AlreadyAccepted));
}

#[rstest]
fn accepting_a_sent_proposal() {
    let outcome = the_customer_accepts_it(a_sent_proposal());
    the_proposal_is_locked_as_an_order(outcome);
}

#[rstest]
fn accepting_twice() {
    let outcome = the_customer_accepts_it(an_accepted_proposal());
    acceptance_is_refused_as_a_duplicate(outcome);
}
