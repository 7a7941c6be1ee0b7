//! Static lookup tables shared by the code generator and the visualisers.

use serde::Serialize;

use crate::params::{ Dataset, ModelType, Parameters };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelShape {
    pub input_dimension: u32,
    pub output_dimension: u32,
    pub output_activation: &'static str,
    pub loss_function: &'static str,
}

const FALLBACK: ModelShape = ModelShape {
    input_dimension: 10,
    output_dimension: 2,
    output_activation: "sigmoid",
    loss_function: "binary_crossentropy",
};

impl ModelShape {
    pub fn of(dataset: Dataset, model_type: ModelType) -> ModelShape {
        ModelShape {
            input_dimension: input_dimension(dataset),
            output_dimension: output_dimension(dataset, model_type),
            output_activation: output_activation(dataset),
            loss_function: loss_function(dataset),
        }
    }

    pub fn for_parameters(params: &Parameters) -> ModelShape {
        ModelShape::of(params.dataset, params.model_type)
    }

    /// Lookup by wire names. Unknown datasets get the binary-classification row.
    pub fn for_names(dataset: &str, model_type: &str) -> ModelShape {
        let model_type = model_type.parse::<ModelType>().ok();
        match dataset.parse::<Dataset>() {
            Ok(dataset) => {
                let mut shape = ModelShape::of(dataset, ModelType::NeuralNetwork);
                if model_type != Some(ModelType::NeuralNetwork) {
                    shape.output_dimension = 1;
                }
                shape
            }
            Err(_) if model_type == Some(ModelType::NeuralNetwork) => FALLBACK,
            Err(_) => ModelShape { output_dimension: 1, ..FALLBACK },
        }
    }
}

pub fn input_dimension(dataset: Dataset) -> u32 {
    match dataset {
        Dataset::Iris => 4,
        Dataset::Mnist => 784,
        Dataset::Boston => 13,
        Dataset::California => 8,
    }
}

/// Output units. Only the neural network gets a per-dataset width.
pub fn output_dimension(dataset: Dataset, model_type: ModelType) -> u32 {
    if model_type != ModelType::NeuralNetwork {
        return 1;
    }
    match dataset {
        Dataset::Iris => 3,
        Dataset::Mnist => 10,
        Dataset::Boston | Dataset::California => 1,
    }
}

pub fn output_activation(dataset: Dataset) -> &'static str {
    match dataset {
        Dataset::Iris | Dataset::Mnist => "softmax",
        Dataset::Boston | Dataset::California => "linear",
    }
}

pub fn loss_function(dataset: Dataset) -> &'static str {
    match dataset {
        Dataset::Iris | Dataset::Mnist => "categorical_crossentropy",
        Dataset::Boston | Dataset::California => "mean_squared_error",
    }
}

/// Layer widths from input to output.
pub fn network_structure(params: &Parameters) -> Vec<u32> {
    let shape = ModelShape::for_parameters(params);
    let mut layers = Vec::with_capacity(params.neuron_layers.len() + 2);
    layers.push(shape.input_dimension);
    layers.extend(params.neuron_layers.iter().copied());
    layers.push(shape.output_dimension);
    layers
}

/// Weights plus biases of a dense stack with the given widths.
pub fn total_parameters(layers: &[u32]) -> u64 {
    layers
        .windows(2)
        .map(|pair| ((pair[0] as u64) + 1) * (pair[1] as u64))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iris_neural_network() {
        let shape = ModelShape::of(Dataset::Iris, ModelType::NeuralNetwork);
        assert_eq!(shape.input_dimension, 4);
        assert_eq!(shape.output_dimension, 3);
        assert_eq!(shape.output_activation, "softmax");
        assert_eq!(shape.loss_function, "categorical_crossentropy");
    }

    #[test]
    fn test_full_table() {
        let rows = [
            (Dataset::Mnist, 784, 10, "softmax", "categorical_crossentropy"),
            (Dataset::Boston, 13, 1, "linear", "mean_squared_error"),
            (Dataset::California, 8, 1, "linear", "mean_squared_error"),
        ];
        for (dataset, input, output, activation, loss) in rows {
            let shape = ModelShape::of(dataset, ModelType::NeuralNetwork);
            assert_eq!(
                (shape.input_dimension, shape.output_dimension, shape.output_activation, shape.loss_function),
                (input, output, activation, loss)
            );
        }
        assert_eq!(ModelShape::of(Dataset::Mnist, ModelType::RandomForest).output_dimension, 1);
    }

    #[test]
    fn test_unknown_dataset_falls_back() {
        let shape = ModelShape::for_names("titanic", "neural-network");
        assert_eq!(shape, FALLBACK);
        assert_eq!(ModelShape::for_names("titanic", "svm").output_dimension, 1);
        assert_eq!(ModelShape::for_names("iris", "svm").output_dimension, 1);
        assert_eq!(ModelShape::for_names("iris", "neural-network").output_dimension, 3);
    }

    #[test]
    fn test_parameter_count() {
        let params = Parameters::default();
        let layers = network_structure(&params);
        assert_eq!(layers, vec![4, 64, 32, 3]);
        // (4+1)*64 + (64+1)*32 + (32+1)*3
        assert_eq!(total_parameters(&layers), 320 + 2080 + 99);
    }
}
