//! Bridges the session to the terminal dashboard.
//!
//! Snapshots and key commands are merged into one channel. A single thread
//! applies commands to the session and turns every snapshot into the
//! display state the `ui` crate renders.

use std::{ sync::{ mpsc, Arc, Mutex }, thread };

use color_eyre::Result;
use ui::state::{
    CodeView,
    Command,
    ComparisonTable,
    DatasetView,
    MetricSeries,
    NetworkView,
    Node,
    NodeKind,
    ParamRow,
    Progress,
    StatePlayground,
    Step,
    StepStatus,
};

use crate::codegen::{ CodeExport, Framework };
use crate::config::PlaygroundConfig;
use crate::controller::TrainingStatus;
use crate::datasets::dataset_info;
use crate::error::PlaygroundError;
use crate::metrics::MetricKind;
use crate::params::{ layers_label, ParameterField };
use crate::scheduler::{ Scheduler, ThreadScheduler };
use crate::session::{ lock, start_training, Session, SessionSnapshot, SharedSession };
use crate::views::{ self, NeuronKind };

#[derive(Debug)]
pub enum DashboardEvent {
    Snapshot(SessionSnapshot),
    Command(Command),
}

pub struct Dashboard<S> {
    session: SharedSession,
    scheduler: S,
    framework: Framework,
    notice: Option<String>,
    last: SessionSnapshot,
}

impl<S: Scheduler> Dashboard<S> {
    pub fn new(session: SharedSession, scheduler: S) -> Self {
        let last = lock(&session).get();
        Dashboard {
            session,
            scheduler,
            framework: Framework::default(),
            notice: None,
            last,
        }
    }

    pub fn framework(&self) -> Framework {
        self.framework
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Returns `false` once the dashboard should stop.
    pub fn handle(&mut self, event: DashboardEvent) -> bool {
        match event {
            DashboardEvent::Snapshot(snapshot) => {
                // queued snapshots can be older than the one read after a command
                if snapshot.revision >= self.last.revision {
                    self.last = snapshot;
                }
                true
            }
            DashboardEvent::Command(Command::Quit) => false,
            DashboardEvent::Command(command) => {
                self.apply(command);
                self.last = lock(&self.session).get();
                true
            }
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Start => self.start(),
            Command::Reset => {
                lock(&self.session).reset_training();
                self.notice = Some("Training reset".to_string());
            }
            Command::Save => {
                let saved = lock(&self.session).save_current_model();
                self.notice = Some(match saved {
                    Ok(entry) => format!("Model Saved: {} has been saved for comparison.", entry.name),
                    Err(PlaygroundError::CannotSave { .. }) => {
                        "Cannot Save Model: You can only save completed models.".to_string()
                    }
                    Err(err) => err.to_string(),
                });
            }
            Command::Deploy => {
                let status = lock(&self.session).controller().status();
                self.notice = Some(if status == TrainingStatus::Complete {
                    tracing::info!("model deployed");
                    "Model Deployed: Your model has been successfully deployed to production!".to_string()
                } else {
                    "Cannot Deploy Model: Complete training before deploying.".to_string()
                });
            }
            Command::Adjust { field, delta } => {
                let Some(field) = ParameterField::from_index(field) else {
                    return;
                };
                if let Err(err) = lock(&self.session).adjust_parameter(field, delta) {
                    self.notice = Some(err.to_string());
                }
            }
            Command::CycleFramework => {
                self.framework = self.framework.cycle();
            }
            Command::Quit => {}
        }
    }

    fn start(&mut self) {
        // a finished run is cleared first so the button doubles as "train again"
        {
            let mut session = lock(&self.session);
            if session.controller().status().is_finished() {
                session.reset_training();
            }
        }
        self.notice = Some(match start_training(&self.session, &self.scheduler) {
            Ok(_) => {
                let epochs = lock(&self.session).controller().state().total_epochs;
                format!("Training Started: Model training has begun with {epochs} epochs.")
            }
            Err(err) => err.to_string(),
        });
    }

    pub fn present(&self) -> StatePlayground {
        present(&self.last, self.framework, self.notice.clone())
    }
}

fn step_status(status: views::StepStatus) -> StepStatus {
    match status {
        views::StepStatus::Pending => StepStatus::Pending,
        views::StepStatus::Current => StepStatus::Current,
        views::StepStatus::Completed => StepStatus::Completed,
        views::StepStatus::Error => StepStatus::Error,
    }
}

fn node_kind(kind: NeuronKind) -> NodeKind {
    match kind {
        NeuronKind::Input => NodeKind::Input,
        NeuronKind::Hidden => NodeKind::Hidden,
        NeuronKind::Output => NodeKind::Output,
    }
}

fn signed_percent(value: f64) -> String {
    format!("{value:+.1}%")
}

/// Formats a session snapshot for the terminal.
pub fn present(snapshot: &SessionSnapshot, framework: Framework, notice: Option<String>) -> StatePlayground {
    let params = &snapshot.parameters;
    let run_params = &snapshot.run_parameters;
    let training = &snapshot.training;

    let steps = views::workflow_steps(training)
        .into_iter()
        .map(|step| Step {
            name: step.name.to_string(),
            description: step.description.to_string(),
            status: step_status(step.status),
            detail: step.detail,
        })
        .collect();

    let param_rows = ParameterField::ALL.iter()
        .map(|&field| ParamRow {
            label: field.label().to_string(),
            value: params.value_label(field),
        })
        .collect();

    let metrics = views::metrics_view(run_params, training);
    let history = metrics.as_ref().map_or_else(MetricSeries::default, |view| MetricSeries {
        accuracy: view.history
            .iter()
            .map(|p| (p.epoch as f64, p.accuracy))
            .collect(),
        loss: view.history
            .iter()
            .map(|p| (p.epoch as f64, p.loss))
            .collect(),
    });

    let layers = views::architecture(params);
    let total_params = views::architecture_parameters(&layers);
    let architecture = layers
        .into_iter()
        .map(|layer| [layer.layer_type, layer.neurons.to_string(), layer.activation])
        .collect();

    let layout = views::network_layout(params, training);
    let network = NetworkView {
        structure: layers_label(&layout.structure, " → "),
        nodes: layout.neurons
            .iter()
            .map(|n| Node { x: n.position[0], y: n.position[1], kind: node_kind(n.kind) })
            .collect(),
        edges: layout.connections
            .iter()
            .map(|c| ((c.from[0], c.from[1]), (c.to[0], c.to[1])))
            .collect(),
        opacity: layout.connection_opacity,
        pulsing: layout.pulsing,
    };

    let comparison = views::comparison(&snapshot.models).map_or_else(ComparisonTable::default, |view| {
        ComparisonTable {
            header: ["Model", "Accuracy", "Precision", "Recall", "F1 Score", "Loss", "vs first"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            improved: view.rows
                .iter()
                .map(|r| r.accuracy_delta.as_ref().is_some_and(|d| d.improved))
                .collect(),
            rows: view.rows
                .iter()
                .map(|r| {
                    vec![
                        r.name.clone(),
                        format!("{:.1}%", r.accuracy_percent),
                        format!("{:.1}%", r.precision_percent),
                        format!("{:.1}%", r.recall_percent),
                        format!("{:.1}%", r.f1_percent),
                        format!("{:.4}", r.loss),
                        r.accuracy_delta.as_ref().map_or_else(|| "-".to_string(), |d| signed_percent(d.percent))
                    ]
                })
                .collect(),
            accuracy: view
                .series(MetricKind::Accuracy)
                .into_iter()
                .map(|(name, value)| (name, value.round().max(0.0) as u64))
                .collect(),
            parameters: view.parameters
                .iter()
                .map(|p| {
                    vec![
                        p.name.clone(),
                        p.learning_rate.to_string(),
                        p.epochs.to_string(),
                        p.batch_size.to_string(),
                        p.dropout.to_string(),
                        p.layers.clone()
                    ]
                })
                .collect(),
        }
    });

    let code = CodeExport::for_state(run_params, training, framework).map(|export| CodeView {
        framework: export.framework.to_string(),
        badge: export.badge().map(str::to_string),
        lines: export.code.lines().map(str::to_string).collect(),
        summary: export.summary,
        file_name: export.file_name,
    });

    let info = dataset_info(params.dataset);
    let split = info.split();
    let dataset = DatasetView {
        name: info.name.to_string(),
        description: info.description.to_string(),
        facts: vec![
            ("Dataset Size".into(), format!("{} samples", info.sample_size)),
            ("Target Variable".into(), info.target.to_string()),
            ("Task Type".into(), info.task.label()),
            (format!("Features ({})", info.features.len()), info.features.join(", ")),
            (
                "Split".into(),
                format!(
                    "training {} / validation {} / testing {}",
                    split.training,
                    split.validation,
                    split.testing
                ),
            )
        ],
        samples: info.samples
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect(),
    };

    StatePlayground {
        headline: views::status_headline(training),
        badge: views::status_badge(training.status).map(str::to_string),
        progress: Progress {
            current_epoch: training.current_epoch,
            max_epoch: training.total_epochs,
            percent: training.progress,
        },
        steps,
        params: param_rows,
        metrics: metrics
            .as_ref()
            .map(|view| {
                view.bars
                    .iter()
                    .map(|(label, value)| (label.to_string(), *value as u64))
                    .collect()
            })
            .unwrap_or_default(),
        loss: metrics.as_ref().map(|view| view.loss),
        quality: metrics.as_ref().map(|view| view.quality.to_string()),
        insight: metrics.and_then(|view| view.insight),
        history,
        architecture,
        total_params,
        network,
        comparison,
        code,
        dataset,
        saved_models: snapshot.saved,
        notice,
    }
}

/// Runs the terminal dashboard until the user quits.
pub fn run(config: &PlaygroundConfig) -> Result<()> {
    let session = Session::from_config(config)?.into_shared();
    let display = Arc::new(Mutex::new(StatePlayground::default()));

    let (event_tx, event_rx) = mpsc::channel::<DashboardEvent>();
    let (command_tx, command_rx) = mpsc::channel::<Command>();
    let (state_tx, state_rx) = mpsc::channel::<StatePlayground>();

    ui::spawn_editor(state_rx, Arc::clone(&display));

    let snapshots = lock(&session).subscribe();
    let snapshot_tx = event_tx.clone();
    thread::spawn(move || {
        for snapshot in snapshots {
            if snapshot_tx.send(DashboardEvent::Snapshot(snapshot)).is_err() {
                break;
            }
        }
    });

    thread::spawn(move || {
        for command in command_rx {
            if event_tx.send(DashboardEvent::Command(command)).is_err() {
                break;
            }
        }
    });

    let mut dashboard = Dashboard::new(session, ThreadScheduler);
    thread::spawn(move || {
        let _ = state_tx.send(dashboard.present());
        for event in event_rx {
            if !dashboard.handle(event) {
                break;
            }
            if state_tx.send(dashboard.present()).is_err() {
                break;
            }
        }
        tracing::info!("dashboard closed");
    });

    ui::run(display, command_tx)
}
