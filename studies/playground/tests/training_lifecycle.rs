//! End-to-end runs through the session with a hand-driven scheduler.

use std::time::Duration;

use playground::params::{ Dataset, ModelType, ParameterField };
use playground::scheduler::ManualScheduler;
use playground::shape::ModelShape;
use playground::views;
use playground::{
    lock,
    start_training,
    Parameters,
    PlaygroundError,
    Session,
    SharedSession,
    TrainingController,
    TrainingStatus,
};

fn session_with(params: Parameters, seed: u64) -> SharedSession {
    let controller = TrainingController::simulated(params, Some(seed)).unwrap();
    Session::new(controller, Duration::from_secs(1)).into_shared()
}

#[test]
fn five_epochs_complete_after_five_ticks() {
    let session = session_with(Parameters { epochs: 5, ..Parameters::default() }, 42);
    let scheduler = ManualScheduler::new();
    start_training(&session, &scheduler).unwrap();

    for epoch in 1..=4 {
        scheduler.advance();
        let state = lock(&session).get().training;
        assert_eq!(state.status, TrainingStatus::Training);
        assert_eq!(state.current_epoch, epoch);
        assert!((state.progress - (epoch as f64) * 20.0).abs() < 1e-9);
    }

    scheduler.advance();
    let state = lock(&session).get().training;
    assert_eq!(state.status, TrainingStatus::Complete);
    assert_eq!(state.current_epoch, 5);
    assert_eq!(state.progress, 100.0);
    assert!(state.metrics.accuracy >= 0.85 && state.metrics.accuracy <= 1.0);
    assert!(state.metrics.loss <= 0.15);

    // nothing left to fire
    assert_eq!(scheduler.advance(), 0);
}

#[test]
fn reset_mid_flight_discards_pending_ticks() {
    let session = session_with(Parameters { epochs: 5, ..Parameters::default() }, 1);
    let scheduler = ManualScheduler::new();
    start_training(&session, &scheduler).unwrap();
    scheduler.advance_by(2);

    lock(&session).reset_training();
    scheduler.advance_by(3);

    let state = lock(&session).get().training;
    assert_eq!(state.status, TrainingStatus::Idle);
    assert_eq!(state.current_epoch, 0);
    assert_eq!(state.progress, 0.0);
    assert_eq!(state.total_epochs, 5);
    assert_eq!(scheduler.live_tasks(), 0);
}

#[test]
fn save_while_idle_leaves_registry_unchanged() {
    let session = session_with(Parameters::default(), 1);
    let result = lock(&session).save_current_model();
    assert!(matches!(result, Err(PlaygroundError::CannotSave { status: TrainingStatus::Idle })));
    assert!(lock(&session).registry().is_empty());
    assert!(lock(&session).list_models().is_empty());
}

#[test]
fn saved_runs_show_up_in_comparison() {
    let session = session_with(Parameters { epochs: 2, ..Parameters::default() }, 8);
    let scheduler = ManualScheduler::new();

    start_training(&session, &scheduler).unwrap();
    scheduler.advance_by(2);
    lock(&session).save_current_model().unwrap();

    // changing a parameter after completion returns to idle
    lock(&session).adjust_parameter(ParameterField::Dataset, 1).unwrap();
    assert_eq!(lock(&session).get().training.status, TrainingStatus::Idle);

    start_training(&session, &scheduler).unwrap();
    scheduler.advance_by(2);
    let saved = lock(&session).save_current_model().unwrap();
    assert_eq!(saved.name, "Model 2 (neural-network - mnist)");

    let snapshot = lock(&session).get();
    assert_eq!(snapshot.saved, 2);
    let view = views::comparison(&snapshot.models).unwrap();
    assert_eq!(view.rows.len(), 3);
    assert!(view.rows[0].current);
    assert_eq!(view.parameters[2].layers, "64-32");
}

#[test]
fn iris_neural_network_lookup() {
    let shape = ModelShape::of(Dataset::Iris, ModelType::NeuralNetwork);
    assert_eq!(shape.input_dimension, 4);
    assert_eq!(shape.output_dimension, 3);
    assert_eq!(shape.output_activation, "softmax");
    assert_eq!(shape.loss_function, "categorical_crossentropy");
}

#[test]
fn same_seed_same_final_metrics() {
    let run = |seed| {
        let session = session_with(Parameters { epochs: 3, ..Parameters::default() }, seed);
        let scheduler = ManualScheduler::new();
        start_training(&session, &scheduler).unwrap();
        scheduler.advance_by(3);
        let metrics = lock(&session).get().training.metrics;
        metrics
    };
    assert_eq!(run(77), run(77));
}

#[test]
fn restart_requires_reset() {
    let session = session_with(Parameters { epochs: 1, ..Parameters::default() }, 3);
    let scheduler = ManualScheduler::new();
    start_training(&session, &scheduler).unwrap();
    assert!(matches!(start_training(&session, &scheduler), Err(PlaygroundError::AlreadyRunning)));

    scheduler.advance();
    assert!(matches!(
        start_training(&session, &scheduler),
        Err(PlaygroundError::InvalidTransition { from: TrainingStatus::Complete, .. })
    ));

    lock(&session).reset_training();
    start_training(&session, &scheduler).unwrap();
    assert_eq!(scheduler.live_tasks(), 1);
}

#[test]
fn edits_made_mid_run_leave_the_run_views_alone() {
    let session = session_with(Parameters { epochs: 3, ..Parameters::default() }, 21);
    let scheduler = ManualScheduler::new();
    start_training(&session, &scheduler).unwrap();
    scheduler.advance();

    lock(&session).adjust_parameter(ParameterField::Epochs, 5).unwrap();
    lock(&session).adjust_parameter(ParameterField::Dataset, 1).unwrap();
    scheduler.advance_by(2);

    let snapshot = lock(&session).get();
    assert_eq!(snapshot.training.status, TrainingStatus::Complete);
    assert_eq!(snapshot.training.total_epochs, 3);

    let view = views::metrics_view(&snapshot.run_parameters, &snapshot.training).unwrap();
    assert_eq!(view.history.len(), 4);
    assert!(view.insight.unwrap().contains("on the iris dataset"));
    assert_eq!(snapshot.models[0].parameters.dataset, Dataset::Iris);
    assert_eq!(snapshot.parameters.dataset, Dataset::Mnist);

    let saved = lock(&session).save_current_model().unwrap();
    assert_eq!(saved.name, "Model 1 (neural-network - iris)");
}
