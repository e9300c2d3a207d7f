mod common;

use common::{advance, create_villa, engine, run_to_completion};
use projectflow::domain::money::Money;
use projectflow::domain::project::FieldPatch;
use projectflow::error::WorkflowError;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_full_pipeline_runs_to_completion() {
    let engine = engine();
    let project = run_to_completion(&engine, Money::new(dec!(2500000))).await;

    assert_eq!(project.stage_index, engine.registry().completed_stage_index());
    assert!(project.completed_at.is_some());
    assert_eq!(engine.progress_percent(&project), 100);

    // Half the quote was collected through the booking and design gates.
    assert_eq!(project.paid_sum(), Money::new(dec!(1250000)));
}

#[tokio::test]
async fn test_skipping_a_sub_step_is_rejected() {
    let engine = engine();
    let project = create_villa(&engine).await;

    let result = advance(
        &engine,
        &project,
        FieldPatch::new().artifact("floor_plan_url", "mem://1/floor_plan_url/1"),
        Some(3),
        None,
    )
    .await;

    assert!(matches!(
        result,
        Err(WorkflowError::IllegalTransition { .. })
    ));

    // State unchanged, including the rejected patch.
    let stored = engine.get(project.id).await.unwrap();
    assert_eq!(stored.sub_step_index, 1);
    assert!(stored.stage_field("initial", "floor_plan_url").is_none());
}

#[tokio::test]
async fn test_replaying_an_applied_advance_does_not_double_advance() {
    let engine = engine();
    let project = create_villa(&engine).await;

    let advanced = advance(
        &engine,
        &project,
        FieldPatch::new().artifact("floor_plan_url", "mem://1/floor_plan_url/1"),
        Some(2),
        None,
    )
    .await
    .unwrap();
    assert_eq!(advanced.sub_step_index, 2);

    // Same request against the stale revision: transient conflict.
    let stale = advance(&engine, &project, FieldPatch::new(), Some(2), None).await;
    assert!(matches!(stale, Err(WorkflowError::Conflict { .. })));

    // Same target against the fresh snapshot: no longer the next step.
    let replayed = advance(&engine, &advanced, FieldPatch::new(), Some(2), None).await;
    assert!(matches!(
        replayed,
        Err(WorkflowError::IllegalTransition { .. })
    ));

    let stored = engine.get(project.id).await.unwrap();
    assert_eq!(stored.sub_step_index, 2);
}

#[tokio::test]
async fn test_stage_promotion_needs_every_sub_step() {
    let engine = engine();
    let project = create_villa(&engine).await;

    let result = advance(&engine, &project, FieldPatch::new(), None, Some(2)).await;
    assert!(matches!(
        result,
        Err(WorkflowError::IllegalTransition { .. })
    ));
}

#[tokio::test]
async fn test_completed_project_is_read_only() {
    let engine = engine();
    let project = run_to_completion(&engine, Money::new(dec!(100000))).await;

    // Any advance, even a bare field write, is rejected.
    let patch_only = advance(
        &engine,
        &project,
        FieldPatch::new().text("final_note", "left keys with client"),
        None,
        None,
    )
    .await;
    assert!(matches!(patch_only, Err(WorkflowError::ProjectClosed(_))));

    let move_again = advance(&engine, &project, FieldPatch::new(), Some(2), None).await;
    assert!(matches!(move_again, Err(WorkflowError::ProjectClosed(_))));
}

#[tokio::test]
async fn test_completed_at_is_stamped_only_at_the_sentinel() {
    let engine = engine();
    let project = create_villa(&engine).await;
    assert!(project.completed_at.is_none());

    let project = run_to_completion(&engine, Money::new(dec!(100000))).await;
    assert!(project.completed_at.is_some());
}

#[tokio::test]
async fn test_progress_is_monotonic_across_a_real_run() {
    let engine = engine();
    let mut project = create_villa(&engine).await;
    project = advance(
        &engine,
        &project,
        FieldPatch::new().total_quote(Money::new(dec!(100000))),
        None,
        None,
    )
    .await
    .unwrap();

    let registry = engine.registry().clone();
    let mut last = engine.progress_percent(&project);
    for stage_index in 1..=registry.stage_count() {
        let stage = registry.stage(stage_index).unwrap().clone();
        for (i, sub_step) in stage.sub_steps.iter().enumerate() {
            let patch = common::evidence_for(&sub_step.requirement, &project);
            project = advance(&engine, &project, patch, Some(i as u8 + 2), None)
                .await
                .unwrap();
            let percent = engine.progress_percent(&project);
            assert!(percent >= last);
            assert!(percent <= 99, "active project must stay below 100");
            last = percent;
        }
        project = advance(&engine, &project, FieldPatch::new(), None, Some(stage_index + 1))
            .await
            .unwrap();
        let percent = engine.progress_percent(&project);
        assert!(percent >= last);
        last = percent;
    }
    assert_eq!(engine.progress_percent(&project), 100);
}
