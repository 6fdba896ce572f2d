//! Pipeline commands issued through the browser

mod common;

use common::*;
use sluice_core::domain::alert::Alert;
use sluice_core::domain::pipeline::PipelineInfo;
use sluice_core::domain::status::PipelineStatus;
use sluice_engine::{BulkPhase, CommandOutcome, PipelineBrowser};
use std::collections::HashMap;
use std::sync::Arc;

fn names(items: &[PipelineInfo]) -> Vec<&str> {
    items.iter().map(|p| p.name.as_str()).collect()
}

fn alert(pipeline: &str) -> Alert {
    Alert {
        pipeline_name: pipeline.to_string(),
        family: "data".to_string(),
        alert_text: format!("{} error rate above threshold", pipeline),
        drift_texts: Vec::new(),
    }
}

async fn record_alerts(browser: &PipelineBrowser, pipelines: &[&str]) {
    browser
        .store()
        .update(|state| {
            for pipeline in pipelines {
                state.alerts.record(alert(pipeline));
            }
        })
        .await;
}

async fn loaded_browser(
    transport: &Arc<MockTransport>,
    dialogs: &Arc<ScriptedDialogs>,
) -> Arc<PipelineBrowser> {
    let browser = browser(transport, dialogs);
    browser.init().await;
    browser
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_blocked_by_running_pipeline() {
    let transport = Arc::new(MockTransport::with_pipelines(&[
        ("A", PipelineStatus::Running),
        ("B", PipelineStatus::Stopped),
    ]));
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;
    browser.select_all().await;

    let outcome = browser.delete_selected().await;

    let expected = "Delete operation is not supported for Pipeline \"A\" with state RUNNING";
    assert_eq!(
        outcome,
        CommandOutcome::Blocked {
            issues: vec![expected.to_string()]
        }
    );
    assert_eq!(outcome.phase(), BulkPhase::Blocked);
    assert!(transport.mutating_calls().is_empty());
    assert!(dialogs.prompts().is_empty());
    assert_eq!(browser.errors().await, vec![expected]);
    assert_eq!(transport.names(), vec!["A", "B"]);
}

#[tokio::test]
async fn test_delete_refreshes_and_drops_alerts() {
    let transport = Arc::new(MockTransport::with_pipelines(&[
        ("A", PipelineStatus::Stopped),
        ("B", PipelineStatus::Edited),
    ]));
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;
    record_alerts(&browser, &["A", "A", "B"]).await;
    browser.toggle("A").await;
    let lists_before = transport.list_calls().len();

    let outcome = browser.delete_selected().await;

    assert!(matches!(outcome, CommandOutcome::Succeeded(ref effects) if effects.refresh));
    assert_eq!(dialogs.prompts(), vec!["delete:A"]);
    assert_eq!(transport.names(), vec!["B"]);
    assert_eq!(transport.list_calls().len(), lists_before + 1);
    assert_eq!(names(&browser.items().await), vec!["B"]);
    assert!(browser.selected().await.is_empty());
    assert_eq!(browser.store().alert_total().await, 1);
    assert!(browser.alert_messages("A").await.is_empty());
}

#[tokio::test]
async fn test_cancelled_delete_changes_nothing() {
    let transport = Arc::new(MockTransport::with_pipelines(&[("A", PipelineStatus::Stopped)]));
    let dialogs = Arc::new(ScriptedDialogs::cancelling());
    let browser = loaded_browser(&transport, &dialogs).await;
    browser.toggle("A").await;
    let lists_before = transport.list_calls().len();

    let outcome = browser.delete_selected().await;

    assert_eq!(outcome, CommandOutcome::Cancelled);
    assert!(transport.mutating_calls().is_empty());
    assert_eq!(transport.list_calls().len(), lists_before);
    assert_eq!(browser.selected().await, vec!["A"]);
}

#[tokio::test]
async fn test_delete_failure_surfaces_payload() {
    let transport = Arc::new(MockTransport::with_pipelines(&[("A", PipelineStatus::Stopped)]));
    transport.fail("delete");
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;
    browser.toggle("A").await;

    let outcome = browser.delete_selected().await;

    assert_eq!(
        outcome,
        CommandOutcome::Failed {
            error: "delete failed: server error".to_string()
        }
    );
    assert_eq!(browser.errors().await, vec!["delete failed: server error"]);
    assert_eq!(browser.selected().await, vec!["A"]);
}

#[tokio::test]
async fn test_single_delete_validates_state() {
    let transport = Arc::new(MockTransport::with_pipelines(&[
        ("A", PipelineStatus::Stopping),
        ("B", PipelineStatus::Stopped),
    ]));
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;

    let blocked = browser.delete_pipeline("A").await;
    assert_eq!(blocked.phase(), BulkPhase::Blocked);

    let deleted = browser.delete_pipeline("B").await;
    assert_eq!(deleted.phase(), BulkPhase::Succeeded);
    assert_eq!(transport.names(), vec!["A"]);

    assert_eq!(
        browser.delete_pipeline("missing").await,
        CommandOutcome::NothingSelected
    );
}

// =============================================================================
// Start / Stop
// =============================================================================

#[tokio::test]
async fn test_bulk_start_merges_states_and_reports_failures() {
    let transport = Arc::new(MockTransport::with_pipelines(&[
        ("A", PipelineStatus::Stopped),
        ("B", PipelineStatus::Stopped),
    ]));
    transport.reject("B", "Pipeline 'B' has no valid origin");
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;
    browser
        .store()
        .set_errors(vec!["old error".to_string()])
        .await;
    browser.select_all().await;

    let outcome = browser.start_selected().await;

    match &outcome {
        CommandOutcome::PartiallyFailed { effects, errors } => {
            assert_eq!(effects.succeeded, vec!["A"]);
            assert_eq!(effects.statuses_merged, 1);
            assert_eq!(errors, &vec!["Pipeline 'B' has no valid origin".to_string()]);
        }
        other => panic!("expected a partial failure, got {:?}", other),
    }
    assert!(dialogs.prompts().is_empty());
    assert_eq!(
        browser.status_of("A").await.map(|s| s.status),
        Some(PipelineStatus::Starting)
    );
    assert_eq!(
        browser.status_of("B").await.map(|s| s.status),
        Some(PipelineStatus::Stopped)
    );
    assert_eq!(
        browser.errors().await,
        vec!["Pipeline 'B' has no valid origin"]
    );
}

#[tokio::test]
async fn test_bulk_stop_confirms_and_drops_alerts() {
    let transport = Arc::new(MockTransport::with_pipelines(&[
        ("A", PipelineStatus::Running),
        ("B", PipelineStatus::Running),
        ("C", PipelineStatus::Running),
    ]));
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;
    record_alerts(&browser, &["A", "B", "C"]).await;
    browser.toggle("A").await;
    browser.toggle("B").await;

    let outcome = browser.stop_selected(true).await;

    assert_eq!(outcome.phase(), BulkPhase::Succeeded);
    assert_eq!(dialogs.prompts(), vec!["force-stop:A,B"]);
    assert_eq!(
        transport.mutating_calls(),
        vec![Call::StopAll(vec!["A".to_string(), "B".to_string()], true)]
    );
    for name in ["A", "B"] {
        assert_eq!(
            browser.status_of(name).await.map(|s| s.status),
            Some(PipelineStatus::Stopped)
        );
    }
    assert_eq!(browser.store().alert_total().await, 1);
    assert_eq!(browser.alert_messages("C").await.len(), 1);
}

#[tokio::test]
async fn test_bulk_stop_transport_failure() {
    let transport = Arc::new(MockTransport::with_pipelines(&[("A", PipelineStatus::Running)]));
    transport.fail("stop");
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;
    browser.toggle("A").await;

    let outcome = browser.stop_selected(false).await;

    assert_eq!(outcome.phase(), BulkPhase::Failed);
    assert_eq!(browser.errors().await, vec!["stop failed: server error"]);
    assert_eq!(
        browser.status_of("A").await.map(|s| s.status),
        Some(PipelineStatus::Running)
    );
}

#[tokio::test]
async fn test_single_start_refused_when_running() {
    let transport = Arc::new(MockTransport::with_pipelines(&[("A", PipelineStatus::Running)]));
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;

    let outcome = browser.start_pipeline("A", &HashMap::new()).await;

    assert_eq!(outcome.phase(), BulkPhase::Blocked);
    assert!(transport.mutating_calls().is_empty());
    assert_eq!(browser.errors().await, vec!["Pipeline \"A\" is already running"]);
}

#[tokio::test]
async fn test_single_start_merges_returned_state() {
    let transport = Arc::new(MockTransport::with_pipelines(&[("A", PipelineStatus::Stopped)]));
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;

    let outcome = browser.start_pipeline("A", &HashMap::new()).await;

    assert_eq!(outcome.phase(), BulkPhase::Succeeded);
    assert_eq!(transport.mutating_calls(), vec![Call::Start("A".to_string())]);
    assert_eq!(
        browser.status_of("A").await.map(|s| s.status),
        Some(PipelineStatus::Starting)
    );
}

#[tokio::test]
async fn test_single_stop_confirms_and_drops_alerts() {
    let transport = Arc::new(MockTransport::with_pipelines(&[("A", PipelineStatus::Running)]));
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;
    record_alerts(&browser, &["A", "A"]).await;

    let outcome = browser.stop_pipeline("A", false).await;

    assert_eq!(outcome.phase(), BulkPhase::Succeeded);
    assert_eq!(dialogs.prompts(), vec!["stop:A"]);
    assert_eq!(
        browser.status_of("A").await.map(|s| s.status),
        Some(PipelineStatus::Stopped)
    );
    assert_eq!(browser.store().alert_total().await, 0);
}

#[tokio::test]
async fn test_late_list_state_does_not_undo_stop() {
    let transport = Arc::new(MockTransport::with_pipelines(&[("A", PipelineStatus::Running)]));
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;
    let listed = browser.status_of("A").await.unwrap();

    browser.stop_pipeline("A", false).await;

    // the RUNNING state from the earlier listing arrives again
    assert_eq!(browser.store().merge_statuses(vec![listed]).await, 0);
    assert_eq!(
        browser.status_of("A").await.map(|s| s.status),
        Some(PipelineStatus::Stopped)
    );
}

// =============================================================================
// Labels / Reset / Publish
// =============================================================================

#[tokio::test]
async fn test_add_labels_merges_into_loaded_pipelines() {
    let transport = Arc::new(MockTransport::with_pipelines(&[
        ("A", PipelineStatus::Stopped),
        ("B", PipelineStatus::Stopped),
        ("C", PipelineStatus::Stopped),
    ]));
    transport.reject("B", "Pipeline 'B' is locked");
    let dialogs = Arc::new(ScriptedDialogs::confirming().with_labels(&["prod", "eu"]));
    let browser = loaded_browser(&transport, &dialogs).await;
    record_alerts(&browser, &["A", "B"]).await;
    browser.toggle("A").await;
    browser.toggle("B").await;

    let outcome = browser.add_labels_selected().await;

    assert!(matches!(outcome, CommandOutcome::PartiallyFailed { .. }));
    let items = browser.items().await;
    assert_eq!(items[0].labels(), ["prod".to_string(), "eu".to_string()]);
    assert!(items[1].labels().is_empty());
    assert!(items[2].labels().is_empty());
    assert_eq!(transport.labels_of("A"), vec!["prod", "eu"]);
    assert_eq!(browser.errors().await, vec!["Pipeline 'B' is locked"]);
    assert_eq!(browser.store().alert_total().await, 1);
}

#[tokio::test]
async fn test_add_labels_blocked_for_active_pipeline() {
    let transport = Arc::new(MockTransport::with_pipelines(&[("A", PipelineStatus::Starting)]));
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;
    browser.toggle("A").await;

    let outcome = browser.add_labels_selected().await;

    assert_eq!(
        outcome,
        CommandOutcome::Blocked {
            issues: vec!["Add Label is not supported for Pipeline \"A\" with state STARTING".to_string()]
        }
    );
    assert!(dialogs.prompts().is_empty());
}

#[tokio::test]
async fn test_reset_offset_clears_errors() {
    let transport = Arc::new(MockTransport::with_pipelines(&[
        ("A", PipelineStatus::Stopped),
        ("B", PipelineStatus::Finished),
    ]));
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;
    browser.store().set_errors(vec!["stale".to_string()]).await;
    browser.select_all().await;

    let outcome = browser.reset_offset_selected().await;

    assert_eq!(outcome.phase(), BulkPhase::Succeeded);
    assert_eq!(dialogs.prompts(), vec!["reset-offset:A,B"]);
    assert_eq!(
        transport.mutating_calls(),
        vec![Call::ResetOffsets(vec!["A".to_string(), "B".to_string()])]
    );
    assert!(browser.errors().await.is_empty());
}

#[tokio::test]
async fn test_reset_offset_blocked_for_running_pipeline() {
    let transport = Arc::new(MockTransport::with_pipelines(&[("A", PipelineStatus::Running)]));
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;
    browser.toggle("A").await;

    let outcome = browser.reset_offset_selected().await;

    assert_eq!(
        outcome,
        CommandOutcome::Blocked {
            issues: vec![
                "Reset Origin operation is not supported for Pipeline \"A\" with state RUNNING"
                    .to_string()
            ]
        }
    );
}

#[tokio::test]
async fn test_publish_triggers_refresh() {
    let transport = Arc::new(MockTransport::with_pipelines(&[
        ("A", PipelineStatus::Edited),
        ("B", PipelineStatus::Edited),
    ]));
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;
    browser.select_all().await;
    let lists_before = transport.list_calls().len();

    let outcome = browser.publish_selected().await;

    assert!(matches!(outcome, CommandOutcome::Succeeded(ref effects) if effects.refresh));
    assert_eq!(
        transport.mutating_calls(),
        vec![Call::Publish(
            vec!["A".to_string(), "B".to_string()],
            "nightly publish".to_string()
        )]
    );
    assert_eq!(transport.list_calls().len(), lists_before + 1);
    assert!(browser.selected().await.is_empty());
}

#[tokio::test]
async fn test_publish_blocked_for_invalid_and_remote_pipelines() {
    let transport = Arc::new(MockTransport::new());
    let mut invalid = PipelineInfo::new("broken");
    invalid.valid = false;
    transport.add(invalid, PipelineStatus::Edited);
    transport.add(PipelineInfo::new("hub"), PipelineStatus::Edited);
    transport.set_state(state("hub", PipelineStatus::Edited, 1).with_remote(true));

    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;
    browser.select_all().await;

    let outcome = browser.publish_selected().await;

    assert_eq!(
        outcome,
        CommandOutcome::Blocked {
            issues: vec![
                "Publish operation is not supported for Invalid Pipeline - broken".to_string(),
                "Publish operation is not supported for Remote Pipeline \"hub\"".to_string(),
            ]
        }
    );
    assert!(transport.mutating_calls().is_empty());
}

// =============================================================================
// Duplicate / Share / Export
// =============================================================================

#[tokio::test]
async fn test_duplicate_uses_first_selected() {
    let transport = Arc::new(MockTransport::with_pipelines(&[
        ("A", PipelineStatus::Stopped),
        ("B", PipelineStatus::Stopped),
    ]));
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;
    browser.toggle("B").await;
    browser.toggle("A").await;

    let outcome = browser.duplicate_selected().await;

    assert!(matches!(outcome, CommandOutcome::Succeeded(ref effects) if effects.refresh));
    assert_eq!(dialogs.prompts(), vec!["duplicate:B"]);
    assert!(names(&browser.items().await).contains(&"B copy"));
}

#[tokio::test]
async fn test_share_opens_dialog_only() {
    let transport = Arc::new(MockTransport::with_pipelines(&[
        ("A", PipelineStatus::Stopped),
        ("B", PipelineStatus::Stopped),
    ]));
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;
    browser.toggle("B").await;

    let outcome = browser.share_selected().await;

    assert_eq!(outcome.phase(), BulkPhase::Succeeded);
    assert_eq!(dialogs.prompts(), vec!["share:B"]);
    assert!(transport.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_export_single_and_bulk() {
    let transport = Arc::new(MockTransport::with_pipelines(&[
        ("A", PipelineStatus::Running),
        ("B", PipelineStatus::Stopped),
    ]));
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;

    browser.toggle("A").await;
    browser.export_selected(false).await;

    browser.toggle("B").await;
    browser.export_selected(true).await;

    let exports: Vec<Call> = transport
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::Export(..) | Call::ExportAll(..)))
        .collect();
    assert_eq!(
        exports,
        vec![
            Call::Export("A".to_string(), false),
            Call::ExportAll(vec!["A".to_string(), "B".to_string()], true),
        ]
    );
    assert!(dialogs.prompts().is_empty());
}

#[tokio::test]
async fn test_export_with_definitions_requires_valid_pipeline() {
    let transport = Arc::new(MockTransport::new());
    let mut invalid = PipelineInfo::new("broken");
    invalid.valid = false;
    transport.add(invalid, PipelineStatus::Edited);
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;

    let blocked = browser.export_pipeline("broken", true).await;
    assert_eq!(
        blocked,
        CommandOutcome::Blocked {
            issues: vec!["Pipeline \"broken\" is not valid".to_string()]
        }
    );

    let plain = browser.export_pipeline("broken", false).await;
    assert_eq!(plain.phase(), BulkPhase::Succeeded);
}

// =============================================================================
// Remote download / empty selection
// =============================================================================

#[tokio::test]
async fn test_download_remote_passes_existing_ids() {
    let transport = Arc::new(MockTransport::new());
    let mut remote = PipelineInfo::new("from-hub");
    remote.metadata.remote_pipeline_id = Some("hub:1".to_string());
    transport.add(remote, PipelineStatus::Edited);
    transport.add(PipelineInfo::new("local"), PipelineStatus::Edited);

    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;
    let lists_before = transport.list_calls().len();

    let outcome = browser.download_remote().await;

    assert_eq!(outcome.phase(), BulkPhase::Succeeded);
    assert_eq!(dialogs.remote_ids(), Some(vec!["hub:1".to_string()]));
    assert_eq!(transport.list_calls().len(), lists_before + 1);
}

#[tokio::test]
async fn test_empty_selection_does_nothing() {
    let transport = Arc::new(MockTransport::with_pipelines(&[("A", PipelineStatus::Stopped)]));
    let dialogs = Arc::new(ScriptedDialogs::confirming());
    let browser = loaded_browser(&transport, &dialogs).await;

    for outcome in [
        browser.delete_selected().await,
        browser.stop_selected(false).await,
        browser.duplicate_selected().await,
    ] {
        assert_eq!(outcome, CommandOutcome::NothingSelected);
    }
    assert!(dialogs.prompts().is_empty());
    assert!(transport.mutating_calls().is_empty());
}
