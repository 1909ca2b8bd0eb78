//! Contract Test: Task Evaluation
//!
//! This test verifies what one task evaluation reads, decides and writes.
//!
//! Constraints verified:
//! - A missing zone or static value stops the task before any record fetch
//! - Equal source and target values never trigger a write
//! - Dry-run tasks never trigger a write
//! - Exactly one write per differing task, with the target's old content
//!
//! If this test fails, someone has changed the order of the evaluation
//! checks or made the evaluator write when it should not.

mod common;

use common::*;
use dnssync_core::config::{DnsTask, RecordSelector, TaskType};
use dnssync_core::{Record, TaskError, TaskEvaluator, TaskOutcome};

const IP_EXTRACT: &str = r"ip=(\d+\.\d+\.\d+\.\d+)";
const IP_REPLACE: &str = r"\d+\.\d+\.\d+\.\d+";

fn ip_task() -> DnsTask {
    DnsTask::new(
        "example.com",
        RecordSelector::new("_acme", "TXT").with_extract_rule(rule(IP_EXTRACT, 1)),
        RecordSelector::new("www", "TXT")
            .with_extract_rule(rule(IP_EXTRACT, 1))
            .with_replace_rule(rule(IP_REPLACE, 0)),
    )
}

#[tokio::test]
async fn copies_raw_content_into_target() {
    let api = MockDnsApi::new()
        .with_zone("example.com")
        .with_records("example.com", vec![txt("_acme", "abc123"), txt("www", "old")]);

    let outcome = TaskEvaluator::new(&api)
        .evaluate(&copy_task())
        .await
        .expect("task succeeds");

    match outcome {
        TaskOutcome::Updated {
            old_content,
            new_content,
            response,
        } => {
            assert_eq!(old_content, "old");
            assert_eq!(new_content, "abc123");
            assert_eq!(response.content, "abc123");
        }
        other => panic!("expected Updated, got {:?}", other),
    }

    assert_eq!(
        api.updates(),
        vec![UpdateCall {
            zone: "example.com".to_string(),
            name: "www".to_string(),
            record_type: "TXT".to_string(),
            old_content: "old".to_string(),
            new_content: "abc123".to_string(),
        }]
    );
}

#[tokio::test]
async fn splices_extracted_value_into_target() {
    let api = MockDnsApi::new().with_zone("example.com").with_records(
        "example.com",
        vec![
            txt("_acme", "v=1; ip=1.2.3.4; tag=x"),
            txt("www", "v=1; ip=9.9.9.9"),
        ],
    );

    let outcome = TaskEvaluator::new(&api)
        .evaluate(&ip_task())
        .await
        .expect("task succeeds");

    assert!(matches!(
        outcome,
        TaskOutcome::Updated { ref new_content, .. } if new_content == "v=1; ip=1.2.3.4"
    ));
    assert_eq!(
        api.content_of("example.com", "www", "TXT").as_deref(),
        Some("v=1; ip=1.2.3.4")
    );
}

#[tokio::test]
async fn equal_values_need_no_write() {
    let api = MockDnsApi::new().with_zone("example.com").with_records(
        "example.com",
        vec![
            txt("_acme", "v=1; ip=1.2.3.4; tag=x"),
            txt("www", "v=2; ip=1.2.3.4"),
        ],
    );

    let outcome = TaskEvaluator::new(&api)
        .evaluate(&ip_task())
        .await
        .expect("task succeeds");

    assert_eq!(
        outcome,
        TaskOutcome::NoChangeNeeded {
            value: "1.2.3.4".to_string()
        }
    );
    assert_eq!(api.update_call_count(), 0, "no write when values agree");
}

#[tokio::test]
async fn second_evaluation_after_update_is_a_no_op() {
    let api = MockDnsApi::new().with_zone("example.com").with_records(
        "example.com",
        vec![
            txt("_acme", "v=1; ip=1.2.3.4; tag=x"),
            txt("www", "v=1; ip=9.9.9.9"),
        ],
    );
    let evaluator = TaskEvaluator::new(&api);
    let task = ip_task();

    evaluator.evaluate(&task).await.expect("first run succeeds");
    let second = evaluator.evaluate(&task).await.expect("second run succeeds");

    assert!(matches!(second, TaskOutcome::NoChangeNeeded { .. }));
    assert_eq!(api.update_call_count(), 1);
}

#[tokio::test]
async fn dry_run_reports_but_never_writes() {
    let api = MockDnsApi::new()
        .with_zone("example.com")
        .with_records("example.com", vec![txt("_acme", "abc123"), txt("www", "old")]);
    let task = copy_task().with_dry_run(true);

    let outcome = TaskEvaluator::new(&api)
        .evaluate(&task)
        .await
        .expect("task succeeds");

    assert_eq!(
        outcome,
        TaskOutcome::DryRunWouldUpdate {
            old_content: "old".to_string(),
            new_content: "abc123".to_string(),
        }
    );
    assert_eq!(api.update_call_count(), 0);
    assert_eq!(
        api.content_of("example.com", "www", "TXT").as_deref(),
        Some("old")
    );
}

#[tokio::test]
async fn missing_static_content_stops_before_record_fetch() {
    let api = MockDnsApi::new()
        .with_zone("example.com")
        .with_records("example.com", vec![txt("www", "old")]);
    let task = copy_task().with_task_type(TaskType::UpdateRecordContentStatic);

    let result = TaskEvaluator::new(&api).with_static_content("").evaluate(&task).await;

    assert!(matches!(result, Err(TaskError::MissingStaticContent)));
    assert_eq!(api.records_calls(), 0);
    assert_eq!(api.update_call_count(), 0);
}

#[tokio::test]
async fn static_content_replaces_target_without_source_record() {
    // No `_acme` record in the zone: static tasks never look for one
    let api = MockDnsApi::new()
        .with_zone("example.com")
        .with_records("example.com", vec![txt("www", "old")]);
    let task = copy_task().with_task_type(TaskType::UpdateRecordContentStatic);

    let outcome = TaskEvaluator::new(&api)
        .with_static_content("pinned")
        .evaluate(&task)
        .await
        .expect("task succeeds");

    assert!(matches!(
        outcome,
        TaskOutcome::Updated { ref new_content, .. } if new_content == "pinned"
    ));
}

#[tokio::test]
async fn unknown_zone_stops_before_record_fetch() {
    let api = MockDnsApi::new()
        .with_zone("other.org")
        .with_records("example.com", vec![txt("_acme", "abc123"), txt("www", "old")]);

    let result = TaskEvaluator::new(&api).evaluate(&copy_task()).await;

    assert!(matches!(result, Err(TaskError::ZoneNotFound { ref zone }) if zone == "example.com"));
    assert_eq!(api.records_calls(), 0);
}

#[tokio::test]
async fn zone_listing_failure_is_reported() {
    let api = MockDnsApi::new().with_zone("example.com").failing_zones();

    let result = TaskEvaluator::new(&api).evaluate(&copy_task()).await;

    assert!(matches!(result, Err(TaskError::ZonesFetch(_))));
    assert_eq!(api.records_calls(), 0);
}

#[tokio::test]
async fn record_listing_failure_is_reported() {
    let api = MockDnsApi::new().with_zone("example.com").failing_records();

    let result = TaskEvaluator::new(&api).evaluate(&copy_task()).await;

    assert!(matches!(result, Err(TaskError::RecordsFetch { ref zone, .. }) if zone == "example.com"));
}

#[tokio::test]
async fn missing_source_is_reported() {
    let api = MockDnsApi::new()
        .with_zone("example.com")
        .with_records("example.com", vec![txt("www", "old")]);

    let result = TaskEvaluator::new(&api).evaluate(&copy_task()).await;

    assert!(matches!(
        result,
        Err(TaskError::SourceNotFound { ref name, ref record_type }) if name == "_acme" && record_type == "TXT"
    ));
    assert_eq!(api.update_call_count(), 0);
}

#[tokio::test]
async fn missing_target_is_reported() {
    let api = MockDnsApi::new()
        .with_zone("example.com")
        .with_records("example.com", vec![txt("_acme", "abc123"), Record::new("www", "A", "1.2.3.4")]);

    let result = TaskEvaluator::new(&api).evaluate(&copy_task()).await;

    assert!(matches!(result, Err(TaskError::TargetNotFound { ref name, .. }) if name == "www"));
}

#[tokio::test]
async fn match_rule_skips_non_matching_records() {
    let api = MockDnsApi::new().with_zone("example.com").with_records(
        "example.com",
        vec![
            txt("_acme", "abc123"),
            txt("www", "google-site-verification=xyz"),
            txt("www", "sync=old"),
        ],
    );
    let task = DnsTask::new(
        "example.com",
        RecordSelector::new("_acme", "TXT"),
        RecordSelector::new("www", "TXT")
            .with_match_rule(rule(r"^sync=", 0))
            .with_replace_rule(rule(r"(?:old|abc123)$", 0)),
    );

    TaskEvaluator::new(&api)
        .evaluate(&task)
        .await
        .expect("task succeeds");

    let updates = api.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].old_content, "sync=old");
    assert_eq!(updates[0].new_content, "sync=abc123");
}

#[tokio::test]
async fn no_matching_target_when_match_rule_rejects_all() {
    let api = MockDnsApi::new().with_zone("example.com").with_records(
        "example.com",
        vec![txt("_acme", "abc123"), txt("www", "google-site-verification=xyz")],
    );
    let task = DnsTask::new(
        "example.com",
        RecordSelector::new("_acme", "TXT"),
        RecordSelector::new("www", "TXT").with_match_rule(rule(r"^sync=", 0)),
    );

    let result = TaskEvaluator::new(&api).evaluate(&task).await;

    assert!(matches!(result, Err(TaskError::TargetNotFound { .. })));
}

#[tokio::test]
async fn first_qualifying_record_wins() {
    let api = MockDnsApi::new().with_zone("example.com").with_records(
        "example.com",
        vec![
            txt("_acme", "first"),
            txt("_acme", "second"),
            txt("www", "old-1"),
            txt("www", "old-2"),
        ],
    );

    TaskEvaluator::new(&api)
        .evaluate(&copy_task())
        .await
        .expect("task succeeds");

    let updates = api.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].old_content, "old-1");
    assert_eq!(updates[0].new_content, "first");
}

#[tokio::test]
async fn one_record_can_fill_both_roles() {
    // Same name and type on both sides: the record is compared with itself
    let api = MockDnsApi::new()
        .with_zone("example.com")
        .with_records("example.com", vec![txt("www", "same")]);
    let task = DnsTask::new(
        "example.com",
        RecordSelector::new("www", "TXT"),
        RecordSelector::new("www", "TXT"),
    );

    let outcome = TaskEvaluator::new(&api)
        .evaluate(&task)
        .await
        .expect("task succeeds");

    assert!(matches!(outcome, TaskOutcome::NoChangeNeeded { .. }));
    assert_eq!(api.update_call_count(), 0);
}

#[tokio::test]
async fn empty_target_value_is_an_error() {
    let api = MockDnsApi::new().with_zone("example.com").with_records(
        "example.com",
        vec![txt("_acme", "v=1; ip=1.2.3.4"), txt("www", "v=1; no address yet")],
    );

    let result = TaskEvaluator::new(&api).evaluate(&ip_task()).await;

    assert!(matches!(result, Err(TaskError::TargetValueEmpty { ref name }) if name == "www"));
    assert_eq!(api.update_call_count(), 0);
}

#[tokio::test]
async fn empty_source_value_is_an_error() {
    let api = MockDnsApi::new().with_zone("example.com").with_records(
        "example.com",
        vec![txt("_acme", "v=1; pending"), txt("www", "v=1; ip=9.9.9.9")],
    );

    let result = TaskEvaluator::new(&api).evaluate(&ip_task()).await;

    assert!(matches!(result, Err(TaskError::SourceValueEmpty { ref name }) if name == "_acme"));
    assert_eq!(api.update_call_count(), 0);
}

#[tokio::test]
async fn rejected_write_is_reported() {
    let api = MockDnsApi::new()
        .with_zone("example.com")
        .with_records("example.com", vec![txt("_acme", "abc123"), txt("www", "old")])
        .failing_updates();

    let result = TaskEvaluator::new(&api).evaluate(&copy_task()).await;

    assert!(matches!(result, Err(TaskError::UpdateFailed { ref name, .. }) if name == "www"));
    assert_eq!(api.update_call_count(), 1, "exactly one attempt, no retry");
}
