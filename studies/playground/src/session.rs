//! The single owner of playground state.
//!
//! A `Session` holds the controller, the registry and the tick handle of the
//! running training. Views observe it through `get` and `subscribe`; every
//! mutation publishes a fresh snapshot to subscribers.

use std::{
    sync::{ mpsc::{ self, Receiver, Sender }, Arc, Mutex, MutexGuard, PoisonError },
    time::Duration,
};

use serde::Serialize;

use crate::config::PlaygroundConfig;
use crate::controller::{ RunId, TrainingController, TrainingState, TrainingStatus };
use crate::error::PlaygroundResult;
use crate::params::{ ParameterField, Parameters };
use crate::registry::{ ModelEntry, ModelRegistry };
use crate::scheduler::{ Scheduler, TickFlow, TickHandle };

pub type SharedSession = Arc<Mutex<Session>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Increases with every published change.
    pub revision: u64,
    /// Live parameters, including edits made after the run started.
    pub parameters: Parameters,
    /// Parameters of the current or last finished run.
    pub run_parameters: Parameters,
    pub training: TrainingState,
    /// Comparison list: the live model (when complete) followed by saved ones.
    pub models: Vec<ModelEntry>,
    pub saved: usize,
}

#[derive(Debug)]
pub struct Session {
    controller: TrainingController,
    registry: ModelRegistry,
    ticker: Option<TickHandle>,
    tick_interval: Duration,
    revision: u64,
    subscribers: Vec<Sender<SessionSnapshot>>,
}

impl Session {
    pub fn new(controller: TrainingController, tick_interval: Duration) -> Session {
        Session {
            controller,
            registry: ModelRegistry::new(),
            ticker: None,
            tick_interval,
            revision: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn from_config(config: &PlaygroundConfig) -> PlaygroundResult<Session> {
        let controller = TrainingController::simulated(config.parameters.clone(), config.seed)?;
        Ok(Session::new(controller, config.tick_interval()))
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn controller(&self) -> &TrainingController {
        &self.controller
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(TickHandle::is_active)
    }

    pub fn get(&self) -> SessionSnapshot {
        SessionSnapshot {
            revision: self.revision,
            parameters: self.controller.parameters().clone(),
            run_parameters: self.controller.run_parameters().clone(),
            training: self.controller.state().clone(),
            models: self.registry.list(&self.controller),
            saved: self.registry.len(),
        }
    }

    /// Receives the current snapshot right away, then one per change.
    pub fn subscribe(&mut self) -> Receiver<SessionSnapshot> {
        let (tx, rx) = mpsc::channel();
        if tx.send(self.get()).is_ok() {
            self.subscribers.push(tx);
        }
        rx
    }

    pub fn set_parameters(&mut self, parameters: Parameters) -> PlaygroundResult<()> {
        self.controller.set_parameters(parameters)?;
        self.publish();
        Ok(())
    }

    /// Steps one field. A step clamped away at a bound changes nothing.
    pub fn adjust_parameter(&mut self, field: ParameterField, delta: i32) -> PlaygroundResult<()> {
        let next = self.controller.parameters().adjusted(field, delta);
        if next == *self.controller.parameters() {
            return Ok(());
        }
        self.set_parameters(next)
    }

    /// Advances the run `run`. Called by the scheduled tick.
    pub fn tick(&mut self, run: RunId) -> TickFlow {
        let flow = self.controller.tick(run);
        if flow == TickFlow::Stop && self.controller.active_run() == Some(run) {
            self.ticker = None;
        }
        self.publish();
        flow
    }

    pub fn reset_training(&mut self) {
        self.cancel_ticker();
        self.controller.reset();
        self.publish();
    }

    /// Reports a failure from outside of the tick, e.g. a crashed backend.
    pub fn fail_training(&mut self, reason: impl Into<String>) {
        self.controller.fail(reason);
        if self.controller.status() != TrainingStatus::Training {
            self.cancel_ticker();
        }
        self.publish();
    }

    pub fn save_current_model(&mut self) -> PlaygroundResult<ModelEntry> {
        let entry = self.registry.save(&self.controller)?.clone();
        self.publish();
        Ok(entry)
    }

    pub fn list_models(&self) -> Vec<ModelEntry> {
        self.registry.list(&self.controller)
    }

    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    fn publish(&mut self) {
        self.revision += 1;
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.get();
        self.subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

pub fn lock(session: &SharedSession) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Starts a run and schedules its ticks.
///
/// The tick task only holds a weak reference, so dropping the last
/// `SharedSession` stops it as well.
pub fn start_training(session: &SharedSession, scheduler: &dyn Scheduler) -> PlaygroundResult<RunId> {
    let mut guard = lock(session);
    let run = guard.controller.start()?;

    let weak = Arc::downgrade(session);
    let handle = scheduler.every(
        guard.tick_interval,
        Box::new(move || {
            let Some(session) = weak.upgrade() else {
                return TickFlow::Stop;
            };
            let flow = lock(&session).tick(run);
            flow
        })
    );

    guard.ticker = Some(handle);
    guard.publish();
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Dataset;
    use crate::scheduler::ManualScheduler;

    fn shared(epochs: u32) -> SharedSession {
        let params = Parameters { epochs, ..Parameters::default() };
        let controller = TrainingController::simulated(params, Some(11)).unwrap();
        Session::new(controller, Duration::from_secs(1)).into_shared()
    }

    #[test]
    fn test_subscribers_see_every_tick() {
        let session = shared(3);
        let scheduler = ManualScheduler::new();
        let rx = lock(&session).subscribe();

        start_training(&session, &scheduler).unwrap();
        scheduler.advance_by(3);

        let statuses: Vec<_> = rx
            .try_iter()
            .map(|s| (s.training.status, s.training.current_epoch))
            .collect();
        assert_eq!(statuses, vec![
            (TrainingStatus::Idle, 0),
            (TrainingStatus::Training, 0),
            (TrainingStatus::Training, 1),
            (TrainingStatus::Training, 2),
            (TrainingStatus::Complete, 3),
        ]);
        assert!(!lock(&session).is_ticking());
        assert_eq!(scheduler.live_tasks(), 0);
    }

    #[test]
    fn test_dropping_the_session_stops_ticks() {
        let session = shared(5);
        let scheduler = ManualScheduler::new();
        start_training(&session, &scheduler).unwrap();
        scheduler.advance();
        drop(session);
        assert_eq!(scheduler.advance(), 0);
        assert_eq!(scheduler.live_tasks(), 0);
    }

    #[test]
    fn test_external_failure_cancels_ticks() {
        let session = shared(5);
        let scheduler = ManualScheduler::new();
        start_training(&session, &scheduler).unwrap();
        scheduler.advance();
        lock(&session).fail_training("backend crashed");

        assert_eq!(scheduler.live_tasks(), 0);
        let snapshot = lock(&session).get();
        assert_eq!(snapshot.training.status, TrainingStatus::Failed);
        assert_eq!(snapshot.training.failure.as_deref(), Some("backend crashed"));
    }

    #[test]
    fn test_snapshot_lists_current_model() {
        let session = shared(1);
        let scheduler = ManualScheduler::new();
        start_training(&session, &scheduler).unwrap();
        scheduler.advance();

        let mut guard = lock(&session);
        guard.save_current_model().unwrap();
        let snapshot = guard.get();
        assert_eq!(snapshot.saved, 1);
        assert_eq!(snapshot.models.len(), 2);
        assert!(snapshot.models[0].is_current());
    }

    #[test]
    fn test_edits_during_a_run_keep_run_parameters() {
        let session = shared(3);
        let scheduler = ManualScheduler::new();
        start_training(&session, &scheduler).unwrap();
        scheduler.advance();

        lock(&session).adjust_parameter(ParameterField::Epochs, 5).unwrap();
        lock(&session).adjust_parameter(ParameterField::Dataset, 1).unwrap();
        scheduler.advance_by(2);

        let snapshot = lock(&session).get();
        assert_eq!(snapshot.training.status, TrainingStatus::Complete);
        assert_eq!(snapshot.parameters.epochs, 8);
        assert_eq!(snapshot.parameters.dataset, Dataset::Mnist);
        assert_eq!(snapshot.run_parameters.epochs, 3);
        assert_eq!(snapshot.run_parameters.dataset, Dataset::Iris);
        assert_eq!(snapshot.models[0].parameters, snapshot.run_parameters);
    }

    #[test]
    fn test_clamped_adjustment_keeps_finished_run() {
        let session = shared(50);
        let scheduler = ManualScheduler::new();
        start_training(&session, &scheduler).unwrap();
        scheduler.advance_by(50);
        let before = lock(&session).get();
        assert_eq!(before.training.status, TrainingStatus::Complete);

        lock(&session).adjust_parameter(ParameterField::Epochs, 1).unwrap();
        let after = lock(&session).get();
        assert_eq!(after.revision, before.revision);
        assert_eq!(after.training, before.training);

        lock(&session).adjust_parameter(ParameterField::Epochs, -1).unwrap();
        assert_eq!(lock(&session).get().training.status, TrainingStatus::Idle);
    }

    #[test]
    fn test_revision_grows_with_every_change() {
        let session = shared(2);
        let scheduler = ManualScheduler::new();
        let first = lock(&session).get().revision;
        start_training(&session, &scheduler).unwrap();
        let started = lock(&session).get().revision;
        scheduler.advance();
        let ticked = lock(&session).get().revision;
        assert!(first < started && started < ticked);
    }
}
