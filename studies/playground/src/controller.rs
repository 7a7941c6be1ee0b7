//! Simulated training lifecycle: `idle → training → complete | failed`.

use std::fmt;

use serde::{ Deserialize, Serialize };

use crate::error::{ PlaygroundError, PlaygroundResult };
use crate::metrics::Metrics;
use crate::params::Parameters;
use crate::scheduler::TickFlow;
use crate::trainer::{ SimulatedTrainer, Trainer };

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingStatus {
    #[default]
    Idle,
    Training,
    Complete,
    Failed,
}

impl TrainingStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, TrainingStatus::Complete | TrainingStatus::Failed)
    }
}

impl fmt::Display for TrainingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrainingStatus::Idle => "idle",
            TrainingStatus::Training => "training",
            TrainingStatus::Complete => "complete",
            TrainingStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingState {
    pub status: TrainingStatus,
    pub progress: f64,
    pub current_epoch: u32,
    pub total_epochs: u32,
    pub metrics: Metrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Identifies one start-to-stop cycle, so ticks scheduled for an earlier run
/// can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub u64);

#[derive(Debug, Clone)]
struct ActiveRun {
    id: RunId,
    parameters: Parameters,
}

pub struct TrainingController {
    parameters: Parameters,
    state: TrainingState,
    run: Option<ActiveRun>,
    next_run: u64,
    trainer: Box<dyn Trainer>,
}

impl fmt::Debug for TrainingController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainingController")
            .field("parameters", &self.parameters)
            .field("state", &self.state)
            .field("run", &self.run)
            .finish_non_exhaustive()
    }
}

impl TrainingController {
    pub fn new(parameters: Parameters, trainer: Box<dyn Trainer>) -> PlaygroundResult<Self> {
        parameters.validate()?;
        Ok(TrainingController {
            parameters,
            state: TrainingState::default(),
            run: None,
            next_run: 0,
            trainer,
        })
    }

    pub fn simulated(parameters: Parameters, seed: Option<u64>) -> PlaygroundResult<Self> {
        TrainingController::new(parameters, Box::new(SimulatedTrainer::new(seed)))
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn state(&self) -> &TrainingState {
        &self.state
    }

    pub fn status(&self) -> TrainingStatus {
        self.state.status
    }

    pub fn active_run(&self) -> Option<RunId> {
        self.run.as_ref().map(|run| run.id)
    }

    /// Parameters the current (or last finished) run was started with.
    pub fn run_parameters(&self) -> &Parameters {
        self.run.as_ref().map_or(&self.parameters, |run| &run.parameters)
    }

    pub fn set_parameters(&mut self, parameters: Parameters) -> PlaygroundResult<()> {
        parameters.validate()?;
        self.parameters = parameters;

        if self.state.status.is_finished() {
            tracing::debug!("parameters changed after a finished run, back to idle");
            self.state.status = TrainingStatus::Idle;
            self.state.progress = 0.0;
            self.state.current_epoch = 0;
            self.state.failure = None;
            self.run = None;
        }
        Ok(())
    }

    pub fn start(&mut self) -> PlaygroundResult<RunId> {
        match self.state.status {
            TrainingStatus::Idle => {}
            TrainingStatus::Training => {
                return Err(PlaygroundError::AlreadyRunning);
            }
            from => {
                return Err(PlaygroundError::InvalidTransition { from, action: "start training" });
            }
        }

        self.next_run += 1;
        let id = RunId(self.next_run);
        let epochs = self.parameters.epochs;

        self.run = Some(ActiveRun { id, parameters: self.parameters.clone() });
        self.state = TrainingState {
            status: TrainingStatus::Training,
            progress: 0.0,
            current_epoch: 0,
            total_epochs: epochs,
            metrics: Metrics::baseline(),
            failure: None,
        };

        tracing::info!(run = id.0, epochs, "training started");
        Ok(id)
    }

    /// Advances `run` by one epoch, or completes it on the last one.
    ///
    /// Ticks for another run, or arriving after the run stopped, are ignored.
    pub fn tick(&mut self, run: RunId) -> TickFlow {
        let Some(active) = self.run.as_ref().filter(|active| active.id == run) else {
            return TickFlow::Stop;
        };
        if self.state.status != TrainingStatus::Training {
            return TickFlow::Stop;
        }
        let parameters = active.parameters.clone();
        let total = self.state.total_epochs;

        if self.state.current_epoch + 1 >= total {
            return match self.trainer.finish(&parameters) {
                Ok(metrics) => {
                    self.state.status = TrainingStatus::Complete;
                    self.state.current_epoch = total;
                    self.state.progress = 100.0;
                    self.state.metrics = metrics;
                    tracing::info!(
                        run = run.0,
                        accuracy = metrics.accuracy,
                        loss = metrics.loss,
                        "training complete"
                    );
                    TickFlow::Stop
                }
                Err(err) => {
                    self.fail(err.reason);
                    TickFlow::Stop
                }
            };
        }

        let epoch = self.state.current_epoch + 1;
        match self.trainer.epoch(epoch, total, &parameters) {
            Ok(metrics) => {
                self.state.current_epoch = epoch;
                self.state.progress = (100.0 * (epoch as f64)) / (total as f64);
                self.state.metrics = metrics;
                tracing::debug!(run = run.0, epoch, total, accuracy = metrics.accuracy, "epoch");
                TickFlow::Continue
            }
            Err(err) => {
                self.fail(err.reason);
                TickFlow::Stop
            }
        }
    }

    /// Marks the running training as failed. No-op unless training.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.state.status != TrainingStatus::Training {
            return;
        }
        let reason = reason.into();
        tracing::warn!(epoch = self.state.current_epoch, %reason, "training failed");
        self.state.status = TrainingStatus::Failed;
        self.state.failure = Some(reason);
    }

    pub fn reset(&mut self) {
        if let Some(run) = self.run.take() {
            tracing::info!(run = run.id.0, from = %self.state.status, "training reset");
        }
        self.state = TrainingState {
            total_epochs: self.parameters.epochs,
            ..TrainingState::default()
        };
    }
}
