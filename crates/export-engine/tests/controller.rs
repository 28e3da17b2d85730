mod support;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lumen_common::error::ExportError;
use lumen_export_engine::{
    BatchEvent, EngineError, ExportContext, ExportProgress, ExportState, ExportStatus,
    SubmitOutcome, SubmitRequest,
};
use lumen_export_model::{
    AdjustmentField, ExportSettings, PartialAdjustments, WatermarkSpec, WatermarkType,
};

use tokio::sync::Notify;

use support::{controller, paths, ScriptedEngine, ScriptedPicker};

fn request(targets: Vec<PathBuf>, context: ExportContext) -> SubmitRequest {
    SubmitRequest {
        targets,
        adjustments: PartialAdjustments::default(),
        settings: ExportSettings {
            filename_template: "img".to_string(),
            ..ExportSettings::default()
        },
        context,
    }
}

fn batch_picker() -> Arc<ScriptedPicker> {
    Arc::new(ScriptedPicker {
        directory: Some(PathBuf::from("/out")),
        ..ScriptedPicker::default()
    })
}

#[tokio::test]
async fn empty_targets_stay_idle_without_engine_call() {
    let (engine, _script) = ScriptedEngine::new();
    let picker = batch_picker();
    let controller = controller(&engine, &picker);

    let result = controller
        .submit(request(Vec::new(), ExportContext::Library))
        .await;

    assert!(matches!(result, Err(ExportError::NoTargets)));
    assert_eq!(controller.state(), ExportState::default());
    assert!(engine.calls().is_empty());
    assert!(picker.calls().is_empty());
}

#[tokio::test]
async fn dismissed_directory_dialog_returns_to_idle() {
    let (engine, _script) = ScriptedEngine::new();
    let picker = Arc::new(ScriptedPicker::default());
    let controller = controller(&engine, &picker);

    let outcome = controller
        .submit(request(
            paths(&["/p/a.nef", "/p/b.nef", "/p/c.nef"]),
            ExportContext::Library,
        ))
        .await
        .unwrap();

    assert_eq!(outcome, SubmitOutcome::DestinationCancelled);
    let state = controller.state();
    assert_eq!(state.status, ExportStatus::Idle);
    assert_eq!(state.progress, ExportProgress { current: 0, total: 0 });
    assert!(state.error_message.is_empty());
    assert!(engine.calls().is_empty());
    assert_eq!(picker.calls(), vec!["pick_output_directory".to_string()]);
}

#[tokio::test]
async fn engine_fault_is_reported_verbatim() {
    let (engine, mut script) = ScriptedEngine::new();
    let picker = Arc::new(ScriptedPicker {
        file: Some(PathBuf::from("/out/a.jpg")),
        ..ScriptedPicker::default()
    });
    let controller = controller(&engine, &picker);

    let outcome = controller
        .submit(request(paths(&["/p/a.nef"]), ExportContext::Editor))
        .await
        .unwrap();
    assert!(matches!(outcome, SubmitOutcome::Started { .. }));
    assert_eq!(controller.state().progress, ExportProgress { current: 0, total: 1 });

    script
        .single
        .take()
        .unwrap()
        .send(Err(EngineError::fault("disk full")))
        .unwrap();

    let state = controller.wait_for_terminal().await;
    assert_eq!(state.status, ExportStatus::Error);
    assert_eq!(state.error_message, "disk full");
    assert_eq!(picker.calls(), vec!["pick_output_file:img.jpg".to_string()]);
}

#[tokio::test]
async fn single_export_carries_resolved_adjustments() {
    let (engine, mut script) = ScriptedEngine::new();
    let picker = Arc::new(ScriptedPicker {
        file: Some(PathBuf::from("/out/mine.png")),
        ..ScriptedPicker::default()
    });
    let controller = controller(&engine, &picker);

    let mut submit = request(paths(&["/p/a.nef"]), ExportContext::Editor);
    submit.adjustments =
        PartialAdjustments::default().merge_field(AdjustmentField::Saturation, -30.0);
    controller.submit(submit).await.unwrap();
    script.single.take().unwrap().send(Ok(())).unwrap();

    let state = controller.wait_for_terminal().await;
    assert_eq!(state.status, ExportStatus::Success);
    assert_eq!(state.progress, ExportProgress { current: 1, total: 1 });

    let requests = engine.single_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].original_path, PathBuf::from("/p/a.nef"));
    assert_eq!(requests[0].output_path, PathBuf::from("/out/mine.png"));
    assert_eq!(requests[0].adjustments.saturation, -30.0);
    assert_eq!(requests[0].adjustments.color_grading.blending, 50.0);
}

#[tokio::test]
async fn cancel_while_idle_is_a_no_op() {
    let (engine, _script) = ScriptedEngine::new();
    let picker = batch_picker();
    let controller = controller(&engine, &picker);
    let mut rx = controller.subscribe();

    assert!(!controller.cancel().await);
    assert!(engine.calls().is_empty());
    assert!(!rx.has_changed().unwrap());
    assert_eq!(controller.state(), ExportState::default());
}

#[tokio::test]
async fn success_is_not_overwritten_by_late_cancellation() {
    let (engine, mut script) = ScriptedEngine::new();
    let picker = batch_picker();
    let controller = controller(&engine, &picker);

    controller
        .submit(request(paths(&["/p/a.nef", "/p/b.nef"]), ExportContext::Library))
        .await
        .unwrap();
    assert!(controller.cancel().await);
    assert!(engine.called("cancel_export"));

    let events = script.batch.take().unwrap();
    events
        .send(BatchEvent::Progress { current: 1, total: 2 })
        .await
        .unwrap();
    events.send(BatchEvent::Completed).await.unwrap();
    // The pump may already have stopped listening.
    let _ = events.send(BatchEvent::Cancelled).await;

    let state = controller.wait_for_terminal().await;
    assert_eq!(state.status, ExportStatus::Success);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let state = controller.state();
    assert_eq!(state.status, ExportStatus::Success);
    assert_eq!(state.progress, ExportProgress { current: 2, total: 2 });
}

#[tokio::test]
async fn engine_cancellation_ends_in_cancelled() {
    let (engine, mut script) = ScriptedEngine::new();
    let picker = batch_picker();
    let controller = controller(&engine, &picker);

    controller
        .submit(request(paths(&["/p/a.nef", "/p/b.nef"]), ExportContext::Library))
        .await
        .unwrap();
    assert!(controller.cancel().await);
    script
        .batch
        .take()
        .unwrap()
        .send(BatchEvent::Cancelled)
        .await
        .unwrap();

    assert_eq!(controller.wait_for_terminal().await.status, ExportStatus::Cancelled);
}

#[tokio::test]
async fn second_submit_while_exporting_is_rejected() {
    let (engine, _script) = ScriptedEngine::new();
    let picker = batch_picker();
    let controller = controller(&engine, &picker);

    let first = controller
        .submit(request(paths(&["/p/a.nef", "/p/b.nef"]), ExportContext::Library))
        .await
        .unwrap();
    let second = controller
        .submit(request(paths(&["/p/c.nef"]), ExportContext::Library))
        .await;

    assert!(matches!(second, Err(ExportError::Busy)));
    let state = controller.state();
    assert_eq!(state.status, ExportStatus::Exporting);
    assert_eq!(
        first,
        SubmitOutcome::Started {
            job_id: state.job_id.unwrap()
        }
    );
    assert_eq!(state.progress.total, 2);
}

#[tokio::test]
async fn batch_request_carries_distinct_planned_names() {
    let (engine, _script) = ScriptedEngine::new();
    let picker = batch_picker();
    let controller = controller(&engine, &picker);

    controller
        .submit(request(
            paths(&["/p/a.nef", "/p/a.dng", "/p/b.nef"]),
            ExportContext::Library,
        ))
        .await
        .unwrap();

    let mut rx = controller.subscribe();
    tokio::time::timeout(Duration::from_secs(1), async {
        while !engine.called("batch_export_images") {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    assert!(rx.borrow_and_update().is_exporting());

    let requests = engine.batch_requests.lock().unwrap();
    let request = &requests[0];
    assert_eq!(request.output_folder, PathBuf::from("/out"));
    assert_eq!(request.paths, paths(&["/p/a.nef", "/p/a.dng", "/p/b.nef"]));
    assert_eq!(request.export_settings.filename_template, "img_{sequence}");
    let outputs: Vec<PathBuf> = request.outputs.iter().map(|o| o.output.clone()).collect();
    assert_eq!(
        outputs,
        paths(&["/out/img_1.jpg", "/out/img_2.jpg", "/out/img_3.jpg"])
    );
}

#[tokio::test]
async fn progress_moves_forward_only() {
    let (engine, mut script) = ScriptedEngine::new();
    let picker = batch_picker();
    let controller = controller(&engine, &picker);
    let mut rx = controller.subscribe();

    controller
        .submit(request(
            paths(&["/p/a.nef", "/p/b.nef", "/p/c.nef"]),
            ExportContext::Library,
        ))
        .await
        .unwrap();

    let events = script.batch.take().unwrap();
    events
        .send(BatchEvent::Progress { current: 2, total: 3 })
        .await
        .unwrap();
    events
        .send(BatchEvent::Progress { current: 1, total: 3 })
        .await
        .unwrap();
    events
        .send(BatchEvent::Progress { current: 9, total: 3 })
        .await
        .unwrap();

    let state = rx
        .wait_for(|state| state.progress.current == 3)
        .await
        .unwrap()
        .clone();
    assert_eq!(state.status, ExportStatus::Exporting);
    assert_eq!(state.progress, ExportProgress { current: 3, total: 3 });
}

#[tokio::test]
async fn closed_event_stream_is_an_error() {
    let (engine, mut script) = ScriptedEngine::new();
    let picker = batch_picker();
    let controller = controller(&engine, &picker);

    controller
        .submit(request(paths(&["/p/a.nef", "/p/b.nef"]), ExportContext::Library))
        .await
        .unwrap();
    drop(script.batch.take());

    let state = controller.wait_for_terminal().await;
    assert_eq!(state.status, ExportStatus::Error);
    assert!(!state.error_message.is_empty());
}

#[tokio::test]
async fn invalid_watermark_fails_before_any_dialog() {
    let (engine, _script) = ScriptedEngine::new();
    let picker = batch_picker();
    let controller = controller(&engine, &picker);

    let mut submit = request(paths(&["/p/a.nef", "/p/b.nef"]), ExportContext::Library);
    submit.settings.watermark = Some(WatermarkSpec {
        enabled: true,
        watermark_type: WatermarkType::Image,
        image_path: None,
        ..WatermarkSpec::default_spec()
    });

    let result = controller.submit(submit).await;
    assert!(matches!(result, Err(ExportError::Validation { .. })));
    let state = controller.state();
    assert_eq!(state.status, ExportStatus::Error);
    assert!(state.error_message.contains("image"));
    assert!(engine.calls().is_empty());
    assert!(picker.calls().is_empty());
}

#[tokio::test]
async fn selection_change_resets_only_finished_jobs() {
    let (engine, mut script) = ScriptedEngine::new();
    let picker = batch_picker();
    let controller = controller(&engine, &picker);
    controller.select(paths(&["/p/a.nef", "/p/b.nef"]));

    controller
        .submit(request(paths(&["/p/a.nef", "/p/b.nef"]), ExportContext::Library))
        .await
        .unwrap();

    controller.select(paths(&["/p/z.nef"]));
    assert_eq!(controller.state().status, ExportStatus::Exporting);

    script
        .batch
        .take()
        .unwrap()
        .send(BatchEvent::Completed)
        .await
        .unwrap();
    assert_eq!(controller.wait_for_terminal().await.status, ExportStatus::Success);

    controller.select(paths(&["/p/z.nef"]));
    assert_eq!(controller.state().status, ExportStatus::Success);

    controller.select(paths(&["/p/y.nef"]));
    assert_eq!(controller.state(), ExportState::default());
    assert_eq!(controller.selection(), paths(&["/p/y.nef"]));
}

#[tokio::test]
async fn resubmit_after_terminal_state_starts_a_new_job() {
    let (engine, mut script) = ScriptedEngine::new();
    let picker = Arc::new(ScriptedPicker {
        file: Some(PathBuf::from("/out/a.jpg")),
        ..ScriptedPicker::default()
    });
    let controller = controller(&engine, &picker);

    let first = controller
        .submit(request(paths(&["/p/a.nef"]), ExportContext::Editor))
        .await
        .unwrap();
    script
        .single
        .take()
        .unwrap()
        .send(Err(EngineError::fault("disk full")))
        .unwrap();
    assert_eq!(controller.wait_for_terminal().await.status, ExportStatus::Error);

    // The scripted engine only answers once; a retry reaches it and fails loudly.
    let second = controller
        .submit(request(paths(&["/p/a.nef"]), ExportContext::Editor))
        .await
        .unwrap();
    assert_ne!(first, second);
    let state = controller.wait_for_terminal().await;
    assert_eq!(state.status, ExportStatus::Error);
    assert_eq!(state.error_message, "export_image called twice");
}

#[tokio::test]
async fn abandoned_submit_during_dialog_returns_to_idle() {
    let (engine, _script) = ScriptedEngine::new();
    let picker = Arc::new(ScriptedPicker {
        directory: Some(PathBuf::from("/out")),
        gate: Some(Arc::new(Notify::new())),
        ..ScriptedPicker::default()
    });
    let controller = controller(&engine, &picker);
    let targets = paths(&["/p/a.nef", "/p/b.nef"]);

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        controller.submit(request(targets.clone(), ExportContext::Library)),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(controller.state(), ExportState::default());
    assert_eq!(controller.wait_for_terminal().await, ExportState::default());

    // A new submission opens the dialog again instead of failing as busy.
    let retry = tokio::time::timeout(
        Duration::from_millis(50),
        controller.submit(request(targets, ExportContext::Library)),
    )
    .await;
    assert!(retry.is_err());
    assert_eq!(
        picker.calls(),
        vec!["pick_output_directory".to_string(), "pick_output_directory".to_string()]
    );
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn cancel_during_dialog_ends_job_before_engine() {
    let (engine, _script) = ScriptedEngine::new();
    let gate = Arc::new(Notify::new());
    let picker = Arc::new(ScriptedPicker {
        directory: Some(PathBuf::from("/out")),
        gate: Some(gate.clone()),
        ..ScriptedPicker::default()
    });
    let controller = controller(&engine, &picker);

    let submit = controller.submit(request(
        paths(&["/p/a.nef", "/p/b.nef"]),
        ExportContext::Library,
    ));
    let cancel = async {
        let mut rx = controller.subscribe();
        rx.wait_for(|state| state.is_exporting()).await.unwrap();
        let accepted = controller.cancel().await;
        gate.notify_one();
        accepted
    };
    let (outcome, accepted) = tokio::join!(submit, cancel);

    assert!(accepted);
    assert!(matches!(outcome, Ok(SubmitOutcome::Started { .. })));
    let state = controller.wait_for_terminal().await;
    assert_eq!(state.status, ExportStatus::Cancelled);
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn single_export_cancellation_ends_in_cancelled() {
    let (engine, mut script) = ScriptedEngine::new();
    let picker = Arc::new(ScriptedPicker {
        file: Some(PathBuf::from("/out/a.jpg")),
        ..ScriptedPicker::default()
    });
    let controller = controller(&engine, &picker);

    controller
        .submit(request(paths(&["/p/a.nef"]), ExportContext::Editor))
        .await
        .unwrap();
    assert!(controller.cancel().await);
    assert!(engine.called("cancel_export"));
    script
        .single
        .take()
        .unwrap()
        .send(Err(EngineError::Cancelled))
        .unwrap();

    let state = controller.wait_for_terminal().await;
    assert_eq!(state.status, ExportStatus::Cancelled);
    assert_eq!(state.progress, ExportProgress { current: 0, total: 1 });
}

#[tokio::test]
async fn reselecting_exported_targets_keeps_the_result() {
    let (engine, mut script) = ScriptedEngine::new();
    let picker = batch_picker();
    let controller = controller(&engine, &picker);
    let targets = paths(&["/p/a.nef", "/p/b.nef"]);

    controller
        .submit(request(targets.clone(), ExportContext::Library))
        .await
        .unwrap();
    assert_eq!(controller.selection(), targets);
    script
        .batch
        .take()
        .unwrap()
        .send(BatchEvent::Completed)
        .await
        .unwrap();
    assert_eq!(controller.wait_for_terminal().await.status, ExportStatus::Success);

    controller.select(targets);
    assert_eq!(controller.state().status, ExportStatus::Success);
}
