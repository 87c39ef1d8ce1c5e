// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property tests and backend-shaped scenarios for the refresh pipeline.

use chrono::TimeDelta;
use proptest::prelude::*;
use serde_json::json;

use satchel_core::{
    AuthToken, PaymentRecord, RefreshTrigger, SatchelError, SessionPayload, SessionRecord,
    UserCategory,
};
use satchel_session::{
    RefreshDecision, RefreshOutcome, RefreshPolicy, RefreshState, RejectReason, SkipReason,
    evaluate_payment_status,
};
use satchel_test_utils::TestHarness;
use satchel_test_utils::fixtures;
use satchel_test_utils::harness::start_time;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn signed_in_state() -> RefreshState {
    RefreshState {
        last_updated_at: None,
        is_authenticated: true,
        token: Some(AuthToken::new("tok")),
    }
}

fn arb_category() -> impl Strategy<Value = Option<UserCategory>> {
    prop_oneof![
        Just(None),
        (1i64..=6).prop_map(|n| Some(UserCategory::from(n))),
    ]
}

fn arb_payments() -> impl Strategy<Value = Option<Vec<PaymentRecord>>> {
    proptest::option::of(proptest::collection::vec(
        (1i64..10_000, any::<bool>()).prop_map(|(id, active)| PaymentRecord {
            id: Some(id),
            ups_is_active: Some(active),
            ..PaymentRecord::default()
        }),
        0..3,
    ))
}

fn arb_name() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("   ".to_string())),
        "[A-Z][a-z]{1,10}( [A-Z][a-z]{1,10})?".prop_map(Some),
    ]
}

fn arb_record() -> impl Strategy<Value = SessionRecord> {
    (
        proptest::option::of(1i64..1_000),
        arb_name(),
        arb_category(),
        arb_payments(),
    )
        .prop_map(|(id, full_name, user_category, user_payments)| SessionRecord {
            id,
            full_name,
            user_category,
            user_payments,
            ..SessionRecord::default()
        })
}

fn arb_incomplete_record() -> impl Strategy<Value = SessionRecord> {
    arb_record().prop_filter("record must be incomplete", |r| !r.is_complete())
}

fn arb_complete_record() -> impl Strategy<Value = SessionRecord> {
    (1i64..1_000, "[A-Z][a-z]{1,10}", 1i64..=6, arb_payments()).prop_map(
        |(id, name, category, user_payments)| SessionRecord {
            id: Some(id),
            full_name: Some(name),
            user_category: Some(UserCategory::from(category)),
            user_payments,
            ..SessionRecord::default()
        },
    )
}

/// One fetch result a backend might hand back.
#[derive(Debug, Clone)]
enum Response {
    Record(SessionRecord),
    Collection(Vec<SessionRecord>),
    Null,
    TransportError,
    Unauthorized,
}

fn arb_response() -> impl Strategy<Value = Response> {
    prop_oneof![
        4 => arb_record().prop_map(Response::Record),
        2 => proptest::collection::vec(arb_record(), 0..3).prop_map(Response::Collection),
        1 => Just(Response::Null),
        1 => Just(Response::TransportError),
        1 => Just(Response::Unauthorized),
    ]
}

fn script(harness: &TestHarness, response: Response) {
    match response {
        Response::Record(record) => harness.source.push_ok(SessionPayload::Single(record)),
        Response::Collection(records) => harness.source.push_ok(SessionPayload::collection(records)),
        Response::Null => harness.source.push_ok(SessionPayload::Empty),
        Response::TransportError => harness.source.push_err(SatchelError::Transport {
            message: "connection reset".to_string(),
            source: None,
        }),
        Response::Unauthorized => harness.source.push_err(SatchelError::Unauthorized {
            message: "401 Unauthorized".to_string(),
        }),
    }
}

proptest! {
    #[test]
    fn incomplete_fetch_never_mutates_store(
        initial in arb_complete_record(),
        candidate in arb_incomplete_record(),
    ) {
        runtime().block_on(async {
            let harness = TestHarness::signed_in(None).await;
            harness.source.push_ok(SessionPayload::Single(initial.clone()));
            prop_assert_eq!(harness.sync.refresh(RefreshTrigger::Manual).await, RefreshOutcome::Updated);
            let before = harness.sync.reader().snapshot();

            harness.clock.advance(TimeDelta::minutes(11));
            harness.source.push_ok(SessionPayload::Single(candidate));
            let outcome = harness.sync.refresh(RefreshTrigger::Periodic).await;
            prop_assert!(matches!(outcome, RefreshOutcome::Rejected(RejectReason::Incomplete(_))));

            let after = harness.sync.reader().snapshot();
            prop_assert_eq!(after.record, before.record);
            prop_assert_eq!(after.refresh.last_updated_at, before.refresh.last_updated_at);
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn accepting_same_record_twice_is_idempotent(record in arb_complete_record()) {
        runtime().block_on(async {
            let harness = TestHarness::signed_in(None).await;
            harness.source.push_ok(SessionPayload::Single(record.clone()));
            harness.source.push_ok(SessionPayload::Single(record.clone()));

            harness.sync.refresh(RefreshTrigger::Manual).await;
            let first = harness.sync.reader().snapshot();
            harness.clock.advance(TimeDelta::seconds(30));
            harness.sync.refresh(RefreshTrigger::Manual).await;
            let second = harness.sync.reader().snapshot();

            prop_assert_eq!(first.record.as_deref(), Some(&record));
            prop_assert_eq!(second.record.as_deref(), Some(&record));
            prop_assert_eq!(second.refresh.last_updated_at, Some(start_time() + TimeDelta::seconds(30)));
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn complete_record_never_becomes_incomplete(
        initial in arb_complete_record(),
        responses in proptest::collection::vec(arb_response(), 1..12),
    ) {
        runtime().block_on(async {
            let harness = TestHarness::signed_in(Some(initial)).await;
            for response in responses {
                script(&harness, response);
                harness.clock.advance(TimeDelta::minutes(1));
                harness.sync.refresh(RefreshTrigger::Manual).await;
                let record = harness.sync.reader().record();
                prop_assert!(record.is_some_and(|r| r.is_complete()));
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn payment_evaluation_is_deterministic(
        category in arb_category(),
        payments in arb_payments(),
    ) {
        let record = SessionRecord {
            id: Some(1),
            full_name: Some("Sam".to_string()),
            user_category: category,
            user_payments: payments,
            ..SessionRecord::default()
        };
        let state = signed_in_state();
        let first = evaluate_payment_status(&state, Some(&record));
        let second = evaluate_payment_status(&state, Some(&record));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn non_parent_is_never_blocked(
        category in arb_category().prop_filter("non-parent", |c| *c != Some(UserCategory::Parent)),
        payments in arb_payments(),
    ) {
        let record = SessionRecord {
            id: Some(1),
            full_name: Some("Sam".to_string()),
            user_category: category,
            user_payments: payments,
            ..SessionRecord::default()
        };
        let status = evaluate_payment_status(&signed_in_state(), Some(&record));
        prop_assert!(!status.show_overlay);
        prop_assert!(status.is_valid);
    }

    #[test]
    fn unauthenticated_never_refreshes(
        record in proptest::option::of(arb_record()),
        trigger in prop_oneof![
            Just(RefreshTrigger::Mount),
            Just(RefreshTrigger::Foreground),
            Just(RefreshTrigger::Periodic),
            Just(RefreshTrigger::Manual),
        ],
        (is_authenticated, token) in prop_oneof![
            Just((false, Some("tok"))),
            Just((false, None)),
            Just((true, None)),
            Just((true, Some(""))),
            Just((true, Some("  "))),
        ],
    ) {
        let state = RefreshState {
            last_updated_at: None,
            is_authenticated,
            token: token.map(AuthToken::new),
        };
        let decision = RefreshPolicy::default().decide(trigger, &state, record.as_ref(), start_time());
        prop_assert_eq!(decision, RefreshDecision::Skip(SkipReason::NotAuthenticated));
    }
}

#[test]
fn fresh_record_skips_mount_but_periodic_refreshes() {
    let policy = RefreshPolicy::default();
    let now = start_time();
    let mut state = signed_in_state();
    state.last_updated_at = Some(now - TimeDelta::minutes(2));
    let record = fixtures::parent_with_payment();

    assert_eq!(
        policy.decide(RefreshTrigger::Mount, &state, Some(&record), now),
        RefreshDecision::Skip(SkipReason::Fresh)
    );

    state.last_updated_at = Some(now - TimeDelta::minutes(10));
    assert!(
        policy
            .decide(RefreshTrigger::Periodic, &state, Some(&record), now)
            .should_refresh()
    );
}

#[tokio::test]
async fn parent_without_payments_sees_overlay() {
    let harness = TestHarness::signed_in(None).await;
    let payload = SessionPayload::from_value(json!({
        "id": 61, "full_name": "Jane", "user_category": 1, "user_payments": []
    }))
    .unwrap();
    harness.source.push_ok(payload);

    harness.sync.refresh(RefreshTrigger::Mount).await;
    let status = harness.sync.payment_status();
    assert!(!status.is_valid);
    assert!(!status.is_subscription_active);
    assert!(status.show_overlay);
}

#[tokio::test]
async fn parent_with_payment_has_no_overlay() {
    let harness = TestHarness::signed_in(None).await;
    let payload = SessionPayload::from_value(json!({
        "id": 61, "full_name": "Jane", "user_category": 1,
        "user_payments": [{"id": 1, "ups_is_active": true}]
    }))
    .unwrap();
    harness.source.push_ok(payload);

    harness.sync.refresh(RefreshTrigger::Mount).await;
    let status = harness.sync.payment_status();
    assert!(status.is_valid);
    assert!(status.is_subscription_active);
    assert!(!status.show_overlay);
}

#[tokio::test]
async fn educator_without_payments_has_no_overlay() {
    let harness = TestHarness::signed_in(None).await;
    let payload =
        SessionPayload::from_value(json!({"id": 7, "full_name": "Mr. Lee", "user_category": 2}))
            .unwrap();
    harness.source.push_ok(payload);

    assert_eq!(
        harness.sync.refresh(RefreshTrigger::Mount).await,
        RefreshOutcome::Updated
    );
    assert!(!harness.sync.payment_status().show_overlay);
}

#[tokio::test]
async fn null_data_leaves_store_unchanged() {
    let harness = TestHarness::signed_in(Some(fixtures::parent_without_payment())).await;
    let before = harness.sync.reader().snapshot();
    harness
        .source
        .push_ok(SessionPayload::from_value(serde_json::Value::Null).unwrap());

    let outcome = harness.sync.refresh(RefreshTrigger::Manual).await;
    assert_eq!(outcome, RefreshOutcome::Rejected(RejectReason::EmptyPayload));
    let after = harness.sync.reader().snapshot();
    assert_eq!(after.record, before.record);
    assert_eq!(after.refresh.last_updated_at, before.refresh.last_updated_at);
}

#[tokio::test]
async fn array_form_takes_first_element() {
    let harness = TestHarness::signed_in(Some(fixtures::incomplete_record())).await;
    let payload = SessionPayload::from_value(json!([
        {"id": 61, "full_name": "Jane", "user_category": 1, "user_payments": []},
        {"id": 62, "full_name": "Other", "user_category": 2},
    ]))
    .unwrap();
    harness.source.push_ok(payload);

    assert_eq!(
        harness.sync.refresh(RefreshTrigger::Mount).await,
        RefreshOutcome::Updated
    );
    let record = harness.sync.reader().record().unwrap();
    assert_eq!(record.id, Some(61));
    assert_eq!(record.full_name.as_deref(), Some("Jane"));
}

#[tokio::test]
async fn incomplete_first_element_is_rejected() {
    let harness = TestHarness::signed_in(Some(fixtures::educator())).await;
    let payload = SessionPayload::from_value(json!([
        {"id": 61, "user_category": 1},
        {"id": 7, "full_name": "Mr. Lee", "user_category": 2},
    ]))
    .unwrap();
    harness.source.push_ok(payload);

    assert_eq!(
        harness.sync.refresh(RefreshTrigger::Manual).await,
        RefreshOutcome::Rejected(RejectReason::Incomplete(vec!["full_name"]))
    );
    assert_eq!(*harness.sync.reader().record().unwrap(), fixtures::educator());
}

#[tokio::test]
async fn token_is_sent_with_each_fetch() {
    let harness = TestHarness::signed_in(None).await;
    harness
        .source
        .push_ok(SessionPayload::Single(fixtures::educator()));
    harness.sync.refresh(RefreshTrigger::Mount).await;
    assert_eq!(harness.source.tokens_seen(), vec!["test-token"]);
}
