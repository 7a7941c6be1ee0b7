//! Hyperparameter record edited by the user before a run.

use std::fmt;

use clap::ValueEnum;
use serde::{ Deserialize, Serialize };

use crate::error::{ PlaygroundError, PlaygroundResult };

pub const MIN_LEARNING_RATE: f64 = 0.0001;
pub const MAX_LEARNING_RATE: f64 = 0.1;
pub const LEARNING_RATE_STEP: f64 = 0.0001;
pub const MIN_EPOCHS: u32 = 1;
pub const MAX_EPOCHS: u32 = 50;
pub const MIN_BATCH_SIZE: u32 = 8;
pub const MAX_BATCH_SIZE: u32 = 128;
pub const BATCH_SIZE_STEP: u32 = 8;
pub const MAX_DROPOUT: f64 = 0.5;
pub const DROPOUT_STEP: f64 = 0.05;

/// Hidden layer layouts offered by the dashboard when cycling the topology.
pub const LAYER_PRESETS: [&[u32]; 5] = [&[64, 32], &[128, 64], &[128, 64, 32], &[32], &[256, 128, 64]];

macro_rules! named_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Next (or previous, for a negative `delta`) variant, wrapping around.
            pub fn cycle(&self, delta: i32) -> $name {
                let len = Self::ALL.len() as i32;
                let idx = Self::ALL.iter().position(|v| v == self).unwrap_or(0) as i32;
                Self::ALL[(idx + delta).rem_euclid(len) as usize]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl std::str::FromStr for $name {
            type Err = PlaygroundError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL.iter()
                    .copied()
                    .find(|v| v.name() == s)
                    .ok_or_else(|| {
                        PlaygroundError::invalid_parameter(
                            stringify!($name),
                            format!("unknown value `{s}`")
                        )
                    })
            }
        }
    };
}

named_enum!(Optimizer {
    Adam => "adam",
    Sgd => "sgd",
    Rmsprop => "rmsprop",
    Adagrad => "adagrad",
});

named_enum!(Activation {
    Relu => "relu",
    Sigmoid => "sigmoid",
    Tanh => "tanh",
    Linear => "linear",
});

named_enum!(Dataset {
    Iris => "iris",
    Mnist => "mnist",
    Boston => "boston",
    California => "california",
});

named_enum!(ModelType {
    NeuralNetwork => "neural-network",
    DecisionTree => "decision-tree",
    RandomForest => "random-forest",
    Svm => "svm",
});

impl Dataset {
    pub fn is_regression(&self) -> bool {
        matches!(self, Dataset::Boston | Dataset::California)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Parameters {
    pub learning_rate: f64,
    pub epochs: u32,
    pub batch_size: u32,
    pub optimizer: Optimizer,
    pub neuron_layers: Vec<u32>,
    pub activation_function: Activation,
    pub dropout: f64,
    pub dataset: Dataset,
    pub model_type: ModelType,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            learning_rate: 0.01,
            epochs: 10,
            batch_size: 32,
            optimizer: Optimizer::Adam,
            neuron_layers: vec![64, 32],
            activation_function: Activation::Relu,
            dropout: 0.2,
            dataset: Dataset::Iris,
            model_type: ModelType::NeuralNetwork,
        }
    }
}

impl Parameters {
    pub fn validate(&self) -> PlaygroundResult<()> {
        let lr = self.learning_rate;
        if !lr.is_finite() || lr < MIN_LEARNING_RATE || lr > MAX_LEARNING_RATE {
            return Err(
                PlaygroundError::invalid_parameter(
                    "learningRate",
                    format!("{lr} is outside [{MIN_LEARNING_RATE}, {MAX_LEARNING_RATE}]")
                )
            );
        }
        if !(MIN_EPOCHS..=MAX_EPOCHS).contains(&self.epochs) {
            return Err(
                PlaygroundError::invalid_parameter(
                    "epochs",
                    format!("{} is outside [{MIN_EPOCHS}, {MAX_EPOCHS}]", self.epochs)
                )
            );
        }
        if
            !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&self.batch_size) ||
            self.batch_size % BATCH_SIZE_STEP != 0
        {
            return Err(
                PlaygroundError::invalid_parameter(
                    "batchSize",
                    format!(
                        "{} must be a multiple of {BATCH_SIZE_STEP} in [{MIN_BATCH_SIZE}, {MAX_BATCH_SIZE}]",
                        self.batch_size
                    )
                )
            );
        }
        if !self.dropout.is_finite() || self.dropout < 0.0 || self.dropout > MAX_DROPOUT {
            return Err(
                PlaygroundError::invalid_parameter(
                    "dropout",
                    format!("{} is outside [0, {MAX_DROPOUT}]", self.dropout)
                )
            );
        }
        if self.neuron_layers.is_empty() {
            return Err(
                PlaygroundError::invalid_parameter("neuronLayers", "at least one hidden layer is required")
            );
        }
        if self.neuron_layers.iter().any(|&n| n == 0) {
            return Err(
                PlaygroundError::invalid_parameter("neuronLayers", "hidden layers need at least one neuron")
            );
        }
        Ok(())
    }

    /// Returns a copy with `field` moved by `delta` steps, clamped to its domain.
    pub fn adjusted(&self, field: ParameterField, delta: i32) -> Parameters {
        let mut next = self.clone();
        match field {
            ParameterField::LearningRate => {
                let lr = self.learning_rate + (delta as f64) * LEARNING_RATE_STEP;
                next.learning_rate = round_to(lr.clamp(MIN_LEARNING_RATE, MAX_LEARNING_RATE), 4);
            }
            ParameterField::Epochs => {
                let epochs = (self.epochs as i64) + (delta as i64);
                next.epochs = epochs.clamp(MIN_EPOCHS as i64, MAX_EPOCHS as i64) as u32;
            }
            ParameterField::BatchSize => {
                let batch = (self.batch_size as i64) + (delta as i64) * (BATCH_SIZE_STEP as i64);
                next.batch_size = batch.clamp(MIN_BATCH_SIZE as i64, MAX_BATCH_SIZE as i64) as u32;
            }
            ParameterField::Dropout => {
                let dropout = self.dropout + (delta as f64) * DROPOUT_STEP;
                next.dropout = round_to(dropout.clamp(0.0, MAX_DROPOUT), 2);
            }
            ParameterField::Optimizer => {
                next.optimizer = self.optimizer.cycle(delta);
            }
            ParameterField::ActivationFunction => {
                next.activation_function = self.activation_function.cycle(delta);
            }
            ParameterField::NeuronLayers => {
                let len = LAYER_PRESETS.len() as i32;
                let current = LAYER_PRESETS.iter()
                    .position(|preset| *preset == self.neuron_layers.as_slice())
                    .map(|i| i as i32)
                    .unwrap_or(if delta >= 0 { -1 } else { 0 });
                let idx = (current + delta).rem_euclid(len) as usize;
                next.neuron_layers = LAYER_PRESETS[idx].to_vec();
            }
            ParameterField::Dataset => {
                next.dataset = self.dataset.cycle(delta);
            }
            ParameterField::ModelType => {
                next.model_type = self.model_type.cycle(delta);
            }
        }
        next
    }

    pub fn value_label(&self, field: ParameterField) -> String {
        match field {
            ParameterField::LearningRate => format!("{:.4}", self.learning_rate),
            ParameterField::Epochs => self.epochs.to_string(),
            ParameterField::BatchSize => self.batch_size.to_string(),
            ParameterField::Dropout => format!("{:.2}", self.dropout),
            ParameterField::Optimizer => self.optimizer.to_string(),
            ParameterField::ActivationFunction => self.activation_function.to_string(),
            ParameterField::NeuronLayers => layers_label(&self.neuron_layers, " → "),
            ParameterField::Dataset => self.dataset.to_string(),
            ParameterField::ModelType => self.model_type.to_string(),
        }
    }
}

pub fn layers_label(layers: &[u32], sep: &str) -> String {
    layers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = (10f64).powi(decimals);
    (value * factor).round() / factor
}

/// Editable fields, in the order the parameter panel lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterField {
    LearningRate,
    Epochs,
    BatchSize,
    Dropout,
    ModelType,
    ActivationFunction,
    Dataset,
    Optimizer,
    NeuronLayers,
}

impl ParameterField {
    pub const ALL: [ParameterField; 9] = [
        ParameterField::LearningRate,
        ParameterField::Epochs,
        ParameterField::BatchSize,
        ParameterField::Dropout,
        ParameterField::ModelType,
        ParameterField::ActivationFunction,
        ParameterField::Dataset,
        ParameterField::Optimizer,
        ParameterField::NeuronLayers,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ParameterField::LearningRate => "Learning Rate",
            ParameterField::Epochs => "Epochs",
            ParameterField::BatchSize => "Batch Size",
            ParameterField::Dropout => "Dropout Rate",
            ParameterField::ModelType => "Model Type",
            ParameterField::ActivationFunction => "Activation Function",
            ParameterField::Dataset => "Dataset",
            ParameterField::Optimizer => "Optimizer",
            ParameterField::NeuronLayers => "Hidden Layers",
        }
    }

    pub fn from_index(index: usize) -> Option<ParameterField> {
        Self::ALL.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = Parameters::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.neuron_layers, vec![64, 32]);
        assert_eq!(params.dataset, Dataset::Iris);
    }

    #[test]
    fn test_rejects_out_of_domain_values() {
        let mut params = Parameters::default();
        params.epochs = 0;
        assert!(matches!(
            params.validate(),
            Err(PlaygroundError::InvalidParameter { field: "epochs", .. })
        ));

        let mut params = Parameters::default();
        params.batch_size = 12;
        assert!(params.validate().is_err());

        let mut params = Parameters::default();
        params.learning_rate = 0.2;
        assert!(params.validate().is_err());

        let mut params = Parameters::default();
        params.dropout = 0.6;
        assert!(params.validate().is_err());

        let mut params = Parameters::default();
        params.neuron_layers.clear();
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_adjust_clamps_to_domain() {
        let params = Parameters::default();
        let p = params.adjusted(ParameterField::Epochs, 100);
        assert_eq!(p.epochs, MAX_EPOCHS);
        let p = params.adjusted(ParameterField::BatchSize, -100);
        assert_eq!(p.batch_size, MIN_BATCH_SIZE);
        let p = params.adjusted(ParameterField::Dropout, 1);
        assert!((p.dropout - 0.25).abs() < 1e-9);
        let p = params.adjusted(ParameterField::LearningRate, -1000);
        assert!((p.learning_rate - MIN_LEARNING_RATE).abs() < 1e-12);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_enum_cycling_wraps() {
        assert_eq!(Optimizer::Adagrad.cycle(1), Optimizer::Adam);
        assert_eq!(Dataset::Iris.cycle(-1), Dataset::California);

        let params = Parameters::default();
        let p = params.adjusted(ParameterField::NeuronLayers, 1);
        assert_eq!(p.neuron_layers, vec![128, 64]);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(ModelType::NeuralNetwork.to_string(), "neural-network");
        assert_eq!("random-forest".parse::<ModelType>().unwrap(), ModelType::RandomForest);
        assert!("xgboost".parse::<ModelType>().is_err());

        let json = serde_json::to_value(Parameters::default()).unwrap();
        assert_eq!(json["modelType"], "neural-network");
        assert_eq!(json["activationFunction"], "relu");
    }
}
