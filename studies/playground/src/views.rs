//! Read-only projections from session state to view models.
//!
//! Nothing here mutates state; every function is pure so the dashboard, the
//! CLI and the tests see the same numbers.

use serde::Serialize;

use crate::controller::{ TrainingState, TrainingStatus };
use crate::metrics::{ epoch_metrics, Metrics, MetricKind };
use crate::params::{ layers_label, Parameters };
use crate::registry::ModelEntry;
use crate::shape::{ self, ModelShape };

// ---------------------------------------------------------------------------
// Workflow stepper

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Current,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowStep {
    pub id: u8,
    pub name: &'static str,
    pub description: &'static str,
    pub status: StepStatus,
    /// Extra line shown under the step, e.g. the training progress
    pub detail: Option<String>,
}

const STEPS: [(&str, &str); 4] = [
    ("Data Preparation", "Clean, preprocess, and split the dataset"),
    ("Model Training", "Train the model with specified hyperparameters"),
    ("Model Evaluation", "Evaluate model performance on test data"),
    ("Deployment", "Deploy the model to production environment"),
];

pub fn step_status(status: TrainingStatus, step: u8) -> StepStatus {
    match status {
        TrainingStatus::Idle if step == 1 => StepStatus::Current,
        TrainingStatus::Idle => StepStatus::Pending,
        TrainingStatus::Training if step < 2 => StepStatus::Completed,
        TrainingStatus::Training if step == 2 => StepStatus::Current,
        TrainingStatus::Training => StepStatus::Pending,
        TrainingStatus::Complete if step < 3 => StepStatus::Completed,
        TrainingStatus::Complete if step == 3 => StepStatus::Current,
        TrainingStatus::Complete => StepStatus::Pending,
        TrainingStatus::Failed if step < 2 => StepStatus::Completed,
        TrainingStatus::Failed => StepStatus::Error,
    }
}

pub fn workflow_steps(state: &TrainingState) -> Vec<WorkflowStep> {
    STEPS.iter()
        .enumerate()
        .map(|(idx, (name, description))| {
            let id = (idx as u8) + 1;
            let detail = match (id, state.status) {
                (2, TrainingStatus::Training) => {
                    Some(format!("Training progress: {}%", state.progress.round() as u32))
                }
                (2, TrainingStatus::Failed) => state.failure.clone(),
                (3, TrainingStatus::Complete) => {
                    Some(
                        format!(
                            "Accuracy: {:.1}%  Loss: {:.3}",
                            state.metrics.accuracy * 100.0,
                            state.metrics.loss
                        )
                    )
                }
                _ => None,
            };
            WorkflowStep {
                id,
                name,
                description,
                status: step_status(state.status, id),
                detail,
            }
        })
        .collect()
}

pub fn status_headline(state: &TrainingState) -> String {
    match state.status {
        TrainingStatus::Idle => "Ready to Start".to_string(),
        TrainingStatus::Training => {
            format!("Training in Progress (Epoch {}/{})", state.current_epoch, state.total_epochs)
        }
        TrainingStatus::Complete => "Training Complete".to_string(),
        TrainingStatus::Failed => "Training Failed".to_string(),
    }
}

pub fn status_badge(status: TrainingStatus) -> Option<&'static str> {
    match status {
        TrainingStatus::Idle => None,
        TrainingStatus::Training => Some("Running"),
        TrainingStatus::Complete => Some("Success"),
        TrainingStatus::Failed => Some("Failed"),
    }
}

// ---------------------------------------------------------------------------
// Metrics panel

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub epoch: u32,
    pub accuracy: f64,
    pub loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsView {
    /// (label, rounded percentage) for accuracy, precision, recall and F1
    pub bars: Vec<(&'static str, u32)>,
    pub loss: f64,
    pub quality: &'static str,
    /// Only filled once the run is complete
    pub history: Vec<HistoryPoint>,
    pub insight: Option<String>,
}

fn percent(value: f64) -> u32 {
    (value * 100.0).round().max(0.0) as u32
}

pub fn quality_label(accuracy_percent: u32) -> &'static str {
    match accuracy_percent {
        90.. => "Excellent",
        80..=89 => "Good",
        70..=79 => "Fair",
        60..=69 => "Poor",
        _ => "Very Poor",
    }
}

/// Training curve replayed up to the final metrics of a finished run.
pub fn training_history(params: &Parameters, metrics: &Metrics) -> Vec<HistoryPoint> {
    (0..=params.epochs)
        .map(|epoch| {
            let point = epoch_metrics(epoch, params.epochs);
            HistoryPoint {
                epoch,
                accuracy: point.accuracy.min(metrics.accuracy),
                loss: point.loss.max(metrics.loss),
            }
        })
        .collect()
}

/// `params` are the parameters the run was started with.
pub fn metrics_view(params: &Parameters, state: &TrainingState) -> Option<MetricsView> {
    if state.status == TrainingStatus::Idle {
        return None;
    }
    let metrics = &state.metrics;
    let accuracy = percent(metrics.accuracy);
    let complete = state.status == TrainingStatus::Complete;

    Some(MetricsView {
        bars: vec![
            (MetricKind::Accuracy.label(), accuracy),
            (MetricKind::Precision.label(), percent(metrics.precision)),
            (MetricKind::Recall.label(), percent(metrics.recall)),
            (MetricKind::F1Score.label(), percent(metrics.f1_score))
        ],
        loss: metrics.loss,
        quality: quality_label(accuracy),
        history: if complete { training_history(params, metrics) } else { Vec::new() },
        insight: complete.then(|| {
            format!(
                "Your {} model trained on the {} dataset achieved {}% accuracy. This model uses {} as optimizer with a learning rate of {}.",
                params.model_type,
                params.dataset,
                accuracy,
                params.optimizer,
                params.learning_rate
            )
        }),
    })
}

// ---------------------------------------------------------------------------
// Architecture

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerView {
    pub layer_type: String,
    pub neurons: u32,
    pub activation: String,
}

pub fn architecture(params: &Parameters) -> Vec<LayerView> {
    let shape = ModelShape::for_parameters(params);
    let mut layers = Vec::with_capacity(params.neuron_layers.len() + 2);
    layers.push(LayerView {
        layer_type: "Input".into(),
        neurons: shape.input_dimension,
        activation: "N/A".into(),
    });
    layers.extend(
        params.neuron_layers
            .iter()
            .enumerate()
            .map(|(i, &neurons)| LayerView {
                layer_type: format!("Hidden {}", i + 1),
                neurons,
                activation: params.activation_function.to_string(),
            })
    );
    layers.push(LayerView {
        layer_type: "Output".into(),
        neurons: shape.output_dimension,
        activation: shape.output_activation.into(),
    });
    layers
}

pub fn architecture_parameters(layers: &[LayerView]) -> u64 {
    let widths: Vec<u32> = layers
        .iter()
        .map(|l| l.neurons)
        .collect();
    shape::total_parameters(&widths)
}

// ---------------------------------------------------------------------------
// 3D network layout

pub const MAX_DISPLAYED_NEURONS: u32 = 25;
pub const LAYER_SPACING: f64 = 4.0;
pub const MAX_LAYER_WIDTH: f64 = 8.0;
pub const CONNECTION_OPACITY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NeuronKind {
    Input,
    Hidden,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neuron {
    pub layer: usize,
    pub kind: NeuronKind,
    pub position: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Connection {
    pub from: [f64; 3],
    pub to: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkLayout {
    /// Real layer widths, input to output
    pub structure: Vec<u32>,
    pub neurons: Vec<Neuron>,
    pub connections: Vec<Connection>,
    pub connection_opacity: f64,
    /// Neurons pulse while a run is in progress
    pub pulsing: bool,
}

fn layer_x(layer: usize, layers: usize) -> f64 {
    (layer as f64) * LAYER_SPACING - ((layers as f64) * LAYER_SPACING) / 2.0
}

fn neuron_y(index: u32, displayed: u32) -> f64 {
    if displayed <= 1 {
        return 0.0;
    }
    ((index as f64) / ((displayed - 1) as f64) - 0.5) * MAX_LAYER_WIDTH
}

pub fn network_layout(params: &Parameters, state: &TrainingState) -> NetworkLayout {
    let structure = shape::network_structure(params);
    let layers = structure.len();
    let displayed: Vec<u32> = structure
        .iter()
        .map(|&n| n.min(MAX_DISPLAYED_NEURONS))
        .collect();

    let mut connections = Vec::new();
    for layer in 0..layers.saturating_sub(1) {
        let (x1, x2) = (layer_x(layer, layers), layer_x(layer + 1, layers));
        for i in 0..displayed[layer] {
            let y1 = neuron_y(i, displayed[layer]);
            for j in 0..displayed[layer + 1] {
                connections.push(Connection {
                    from: [x1, y1, 0.0],
                    to: [x2, neuron_y(j, displayed[layer + 1]), 0.0],
                });
            }
        }
    }

    let neurons = displayed
        .iter()
        .enumerate()
        .flat_map(|(layer, &count)| {
            let kind = match layer {
                0 => NeuronKind::Input,
                l if l == layers - 1 => NeuronKind::Output,
                _ => NeuronKind::Hidden,
            };
            (0..count).map(move |i| Neuron {
                layer,
                kind,
                position: [layer_x(layer, layers), neuron_y(i, count), 0.0],
            })
        })
        .collect();

    let training = state.status == TrainingStatus::Training;
    let connection_opacity = if training {
        CONNECTION_OPACITY.min(state.progress / 100.0)
    } else {
        CONNECTION_OPACITY
    };

    NetworkLayout {
        structure,
        neurons,
        connections,
        connection_opacity,
        pulsing: training,
    }
}

// ---------------------------------------------------------------------------
// Model comparison

/// Relative change of `value` against `base`, in percent. Zero base gives 0.
pub fn percent_difference(value: f64, base: f64) -> f64 {
    if base == 0.0 {
        return 0.0;
    }
    ((value - base) / base) * 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delta {
    pub percent: f64,
    pub improved: bool,
}

impl Delta {
    fn between(kind: MetricKind, value: f64, base: f64) -> Delta {
        let percent = percent_difference(value, base);
        let improved = if kind.higher_is_better() { percent > 0.0 } else { percent < 0.0 };
        Delta { percent, improved }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub name: String,
    pub current: bool,
    pub accuracy_percent: f64,
    pub precision_percent: f64,
    pub recall_percent: f64,
    pub f1_percent: f64,
    pub loss: f64,
    /// Change against the first row; `None` on the first row itself
    pub accuracy_delta: Option<Delta>,
    pub loss_delta: Option<Delta>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRow {
    pub name: String,
    pub learning_rate: f64,
    pub epochs: u32,
    pub batch_size: u32,
    pub dropout: f64,
    pub layers: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonView {
    pub rows: Vec<ComparisonRow>,
    pub parameters: Vec<ParameterRow>,
}

impl ComparisonView {
    /// Chart series for one metric. Rates are in percent, loss is raw.
    pub fn series(&self, kind: MetricKind) -> Vec<(String, f64)> {
        self.rows
            .iter()
            .map(|row| {
                let value = match kind {
                    MetricKind::Accuracy => row.accuracy_percent,
                    MetricKind::Precision => row.precision_percent,
                    MetricKind::Recall => row.recall_percent,
                    MetricKind::F1Score => row.f1_percent,
                    MetricKind::Loss => row.loss,
                };
                (row.name.clone(), value)
            })
            .collect()
    }

    /// Upper bound of the chart axis for `kind`.
    pub fn axis_max(&self, kind: MetricKind) -> f64 {
        if kind != MetricKind::Loss {
            return 100.0;
        }
        let max = self.rows
            .iter()
            .map(|row| row.loss)
            .fold(0.0, f64::max);
        max * 1.2
    }
}

/// `None` when there is nothing to compare yet.
pub fn comparison(models: &[ModelEntry]) -> Option<ComparisonView> {
    let base = models.first()?.metrics;

    let rows = models
        .iter()
        .enumerate()
        .map(|(idx, model)| {
            let m = &model.metrics;
            let delta = |kind: MetricKind| {
                (idx > 0).then(|| Delta::between(kind, m.get(kind), base.get(kind)))
            };
            ComparisonRow {
                name: model.name.clone(),
                current: model.is_current(),
                accuracy_percent: m.accuracy * 100.0,
                precision_percent: m.precision * 100.0,
                recall_percent: m.recall * 100.0,
                f1_percent: m.f1_score * 100.0,
                loss: m.loss,
                accuracy_delta: delta(MetricKind::Accuracy),
                loss_delta: delta(MetricKind::Loss),
            }
        })
        .collect();

    let parameters = models
        .iter()
        .map(|model| ParameterRow {
            name: model.name.clone(),
            learning_rate: model.parameters.learning_rate,
            epochs: model.parameters.epochs,
            batch_size: model.parameters.batch_size,
            dropout: model.parameters.dropout,
            layers: layers_label(&model.parameters.neuron_layers, "-"),
        })
        .collect();

    Some(ComparisonView { rows, parameters })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn state(status: TrainingStatus, epoch: u32, total: u32) -> TrainingState {
        TrainingState {
            status,
            progress: if total == 0 { 0.0 } else { (100.0 * (epoch as f64)) / (total as f64) },
            current_epoch: epoch,
            total_epochs: total,
            metrics: crate::metrics::epoch_metrics(epoch, total),
            failure: None,
        }
    }

    #[test]
    fn test_step_statuses_follow_training() {
        let statuses = |status| {
            (1..=4).map(|step| step_status(status, step)).collect::<Vec<_>>()
        };
        use StepStatus::*;
        assert_eq!(statuses(TrainingStatus::Idle), vec![Current, Pending, Pending, Pending]);
        assert_eq!(statuses(TrainingStatus::Training), vec![Completed, Current, Pending, Pending]);
        assert_eq!(statuses(TrainingStatus::Complete), vec![Completed, Completed, Current, Pending]);
        assert_eq!(statuses(TrainingStatus::Failed), vec![Completed, Error, Error, Error]);
    }

    #[test]
    fn test_failed_step_carries_reason() {
        let mut s = state(TrainingStatus::Failed, 2, 5);
        s.failure = Some("diverged".into());
        let steps = workflow_steps(&s);
        assert_eq!(steps[1].detail.as_deref(), Some("diverged"));
        assert_eq!(status_headline(&s), "Training Failed");
        assert_eq!(status_headline(&state(TrainingStatus::Training, 2, 5)), "Training in Progress (Epoch 2/5)");
    }

    #[test]
    fn test_metrics_view_hidden_while_idle() {
        let params = Parameters::default();
        assert!(metrics_view(&params, &TrainingState::default()).is_none());

        let view = metrics_view(&params, &state(TrainingStatus::Training, 5, 10)).unwrap();
        assert_eq!(view.bars[0], ("Accuracy", 70));
        assert_eq!(view.quality, "Fair");
        assert!(view.history.is_empty());
    }

    #[test]
    fn test_quality_thresholds() {
        assert_eq!(quality_label(95), "Excellent");
        assert_eq!(quality_label(90), "Excellent");
        assert_eq!(quality_label(85), "Good");
        assert_eq!(quality_label(60), "Poor");
        assert_eq!(quality_label(12), "Very Poor");
    }

    #[test]
    fn test_history_is_capped_by_final_metrics() {
        let params = Parameters { epochs: 4, ..Parameters::default() };
        let metrics = Metrics { accuracy: 0.8, loss: 0.3, ..Metrics::zeroed() };
        let history = training_history(&params, &metrics);
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].accuracy, 0.5);
        assert_eq!(history[4].accuracy, 0.8);
        assert_eq!(history[4].loss, 0.3);
        // below the cap the replay follows the per-epoch curve
        assert_eq!(history[2].accuracy, epoch_metrics(2, 4).accuracy);
        assert_eq!(history[2].loss, epoch_metrics(2, 4).loss);
    }

    #[test]
    fn test_architecture_layers() {
        let layers = architecture(&Parameters::default());
        let summary: Vec<_> = layers
            .iter()
            .map(|l| (l.layer_type.as_str(), l.neurons, l.activation.as_str()))
            .collect();
        assert_eq!(summary, vec![
            ("Input", 4, "N/A"),
            ("Hidden 1", 64, "relu"),
            ("Hidden 2", 32, "relu"),
            ("Output", 3, "softmax"),
        ]);
        assert_eq!(architecture_parameters(&layers), 2499);
    }

    #[test]
    fn test_network_layout_caps_displayed_neurons() {
        let params = Parameters { dataset: crate::params::Dataset::Mnist, ..Parameters::default() };
        let layout = network_layout(&params, &TrainingState::default());
        assert_eq!(layout.structure, vec![784, 64, 32, 10]);
        assert_eq!(layout.neurons.len(), 25 + 25 + 25 + 10);
        assert_eq!(layout.connections.len(), 25 * 25 + 25 * 25 + 25 * 10);
        assert_eq!(layout.connection_opacity, CONNECTION_OPACITY);
        assert!(!layout.pulsing);

        let first = layout.neurons[0];
        assert_eq!(first.kind, NeuronKind::Input);
        assert_eq!(first.position, [-8.0, -4.0, 0.0]);
    }

    #[test]
    fn test_network_layout_fades_in_while_training() {
        let params = Parameters { model_type: crate::params::ModelType::Svm, ..Parameters::default() };
        let layout = network_layout(&params, &state(TrainingStatus::Training, 1, 10));
        assert!((layout.connection_opacity - 0.1).abs() < 1e-12);
        assert!(layout.pulsing);

        let output = layout.neurons.last().unwrap();
        assert_eq!(output.kind, NeuronKind::Output);
        assert_eq!(output.position[1], 0.0);
    }

    fn entry(name: &str, accuracy: f64, loss: f64) -> ModelEntry {
        ModelEntry {
            name: name.into(),
            parameters: Parameters::default(),
            metrics: Metrics { accuracy, loss, ..Metrics::zeroed() },
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_comparison_deltas_against_first_row() {
        assert!(comparison(&[]).is_none());

        let models = vec![entry("Current Model", 0.8, 0.2), entry("Model 1", 0.88, 0.1)];
        let view = comparison(&models).unwrap();

        assert!(view.rows[0].current);
        assert!(view.rows[0].accuracy_delta.is_none());
        let acc = view.rows[1].accuracy_delta.clone().unwrap();
        assert!((acc.percent - 10.0).abs() < 1e-9);
        assert!(acc.improved);
        let loss = view.rows[1].loss_delta.clone().unwrap();
        assert!((loss.percent + 50.0).abs() < 1e-9);
        assert!(loss.improved);

        assert_eq!(view.parameters[0].layers, "64-32");
        assert!((view.axis_max(MetricKind::Loss) - 0.24).abs() < 1e-9);
        assert_eq!(view.axis_max(MetricKind::Recall), 100.0);
        assert_eq!(view.series(MetricKind::Accuracy)[1].1, 88.0);
    }

    #[test]
    fn test_zero_base_difference() {
        assert_eq!(percent_difference(0.5, 0.0), 0.0);
    }
}
