//! Python source for the configured model in TensorFlow, PyTorch or Keras.

use std::fmt;

use clap::ValueEnum;
use serde::{ Deserialize, Serialize };

use crate::controller::{ TrainingState, TrainingStatus };
use crate::params::{ layers_label, Activation, Dataset, Optimizer, Parameters };
use crate::shape::ModelShape;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    #[default]
    Tensorflow,
    Pytorch,
    Keras,
}

impl Framework {
    pub const ALL: [Framework; 3] = [Framework::Tensorflow, Framework::Pytorch, Framework::Keras];

    /// Identifier used in file names.
    pub fn id(&self) -> &'static str {
        match self {
            Framework::Tensorflow => "tensorflow",
            Framework::Pytorch => "pytorch",
            Framework::Keras => "keras",
        }
    }

    pub fn documentation_url(&self) -> &'static str {
        match self {
            Framework::Tensorflow => "https://www.tensorflow.org/api_docs/python/tf/all_symbols",
            Framework::Pytorch => "https://pytorch.org/docs/stable/index.html",
            Framework::Keras => "https://keras.io/api/",
        }
    }

    pub fn cycle(&self) -> Framework {
        match self {
            Framework::Tensorflow => Framework::Pytorch,
            Framework::Pytorch => Framework::Keras,
            Framework::Keras => Framework::Tensorflow,
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Framework::Tensorflow => "TensorFlow",
            Framework::Pytorch => "PyTorch",
            Framework::Keras => "Keras",
        };
        f.write_str(label)
    }
}

fn optimizer_class(optimizer: Optimizer) -> &'static str {
    match optimizer {
        Optimizer::Adam => "Adam",
        Optimizer::Sgd => "SGD",
        Optimizer::Rmsprop => "RMSprop",
        Optimizer::Adagrad => "Adagrad",
    }
}

fn torch_activation(activation: Activation) -> &'static str {
    match activation {
        Activation::Relu => "ReLU",
        Activation::Sigmoid => "Sigmoid",
        Activation::Tanh => "Tanh",
        Activation::Linear => "Identity",
    }
}

fn torch_loss(loss: &str) -> &'static str {
    match loss {
        "categorical_crossentropy" => "nn.CrossEntropyLoss()",
        "binary_crossentropy" => "nn.BCELoss()",
        _ => "nn.MSELoss()",
    }
}

pub fn generate(params: &Parameters, framework: Framework) -> String {
    let shape = ModelShape::for_parameters(params);
    match framework {
        Framework::Tensorflow => tensorflow(params, &shape),
        Framework::Pytorch => pytorch(params, &shape),
        Framework::Keras => keras(params, &shape),
    }
}

pub fn file_name(params: &Parameters, framework: Framework) -> String {
    format!("{}_{}_{}.py", params.model_type, params.dataset, framework.id())
}

fn tensorflow(params: &Parameters, shape: &ModelShape) -> String {
    let act = params.activation_function;
    let dropout = params.dropout;
    let optimizer = optimizer_class(params.optimizer);
    let (first, rest) = split_layers(&params.neuron_layers);

    let mut code = format!(
        "import tensorflow as tf
from tensorflow.keras.models import Sequential
from tensorflow.keras.layers import Dense, Dropout
from tensorflow.keras.optimizers import {optimizer}
import numpy as np

# Define the model
model = Sequential()

# Input layer
model.add(Dense({first}, activation='{act}', input_shape=({input},)))
model.add(Dropout({dropout}))

# Hidden layers
",
        input = shape.input_dimension
    );
    for neurons in rest {
        code.push_str(&format!("model.add(Dense({neurons}, activation='{act}'))\n"));
        code.push_str(&format!("model.add(Dropout({dropout}))\n"));
    }
    code.push_str(
        &format!(
            "
# Output layer
model.add(Dense({output}, activation='{out_act}'))

# Compile the model
optimizer = {optimizer}(learning_rate={lr})

model.compile(
    optimizer=optimizer,
    loss='{loss}',
    metrics=['accuracy']
)

# Model summary
model.summary()

# Example training (replace X_train, y_train with your data)
# model.fit(
#     X_train, y_train,
#     epochs={epochs},
#     batch_size={batch},
#     validation_split=0.2
# )
",
            output = shape.output_dimension,
            out_act = shape.output_activation,
            lr = params.learning_rate,
            loss = shape.loss_function,
            epochs = params.epochs,
            batch = params.batch_size
        )
    );
    code
}

fn pytorch(params: &Parameters, shape: &ModelShape) -> String {
    let act = torch_activation(params.activation_function);
    let dropout = params.dropout;
    let layers = &params.neuron_layers;
    let (first, _) = split_layers(layers);
    let last = layers.last().copied().unwrap_or(first);

    let mut code = format!(
        "import torch
import torch.nn as nn
import torch.optim as optim
from torch.utils.data import DataLoader, TensorDataset

# Define the neural network
class NeuralNetwork(nn.Module):
    def __init__(self):
        super(NeuralNetwork, self).__init__()

        # Input layer
        layers = [nn.Linear({input}, {first}),
                  nn.{act}(),
                  nn.Dropout({dropout})]

        # Hidden layers
",
        input = shape.input_dimension
    );
    for pair in layers.windows(2) {
        code.push_str(
            &format!(
                "        layers.extend([
            nn.Linear({}, {}),
            nn.{act}(),
            nn.Dropout({dropout})
        ])
",
                pair[0],
                pair[1]
            )
        );
    }

    let output_activation = match shape.output_activation {
        "linear" => "# No activation for regression".to_string(),
        "softmax" => "layers.append(nn.Softmax(dim=1))".to_string(),
        _ => "layers.append(nn.Sigmoid())".to_string(),
    };
    code.push_str(
        &format!(
            "
        # Output layer
        layers.append(nn.Linear({last}, {output}))

        # Add output activation if needed
        {output_activation}

        self.model = nn.Sequential(*layers)

    def forward(self, x):
        return self.model(x)

# Initialize the model
model = NeuralNetwork()

# Define loss function
criterion = {criterion}

# Define optimizer
optimizer = optim.{optimizer}(
    model.parameters(),
    lr={lr}
)

# Example training loop
# for epoch in range({epochs}):
#     model.train()
#     for inputs, targets in DataLoader(train_set, batch_size={batch}):
#         optimizer.zero_grad()
#         outputs = model(inputs)
#         loss = criterion(outputs, targets)
#         loss.backward()
#         optimizer.step()
",
            output = shape.output_dimension,
            criterion = torch_loss(shape.loss_function),
            optimizer = optimizer_class(params.optimizer),
            lr = params.learning_rate,
            epochs = params.epochs,
            batch = params.batch_size
        )
    );
    code
}

fn keras(params: &Parameters, shape: &ModelShape) -> String {
    let act = params.activation_function;
    let dropout = params.dropout;
    let (first, rest) = split_layers(&params.neuron_layers);
    let loader = match params.dataset {
        Dataset::Mnist => "mnist.load_data()",
        _ => "boston_housing.load_data()",
    };

    let mut code = format!(
        "from tensorflow import keras
from tensorflow.keras.models import Sequential
from tensorflow.keras.layers import Dense, Dropout
import numpy as np

# Data preparation (example)
# (X_train, y_train), (X_test, y_test) = keras.datasets.{loader}
# X_train = X_train.reshape(X_train.shape[0], -1) / 255.0  # For MNIST

# Build the model
model = Sequential([
    # Input layer
    Dense({first}, activation='{act}', input_shape=({input},)),
    Dropout({dropout}),

    # Hidden layers
",
        input = shape.input_dimension
    );
    for neurons in rest {
        code.push_str(&format!("    Dense({neurons}, activation='{act}'),\n"));
        code.push_str(&format!("    Dropout({dropout}),\n"));
    }
    code.push_str(
        &format!(
            "
    # Output layer
    Dense({output}, activation='{out_act}')
])

# Compile the model
model.compile(
    optimizer=keras.optimizers.{optimizer}(
        learning_rate={lr}
    ),
    loss='{loss}',
    metrics=['accuracy']
)

# Model summary
model.summary()

# Train the model
# history = model.fit(
#     X_train, y_train,
#     epochs={epochs},
#     batch_size={batch},
#     validation_split=0.2,
#     verbose=1
# )

# Evaluate the model
# test_loss, test_acc = model.evaluate(X_test, y_test)
# print(f'Test accuracy: {{test_acc}}')
",
            output = shape.output_dimension,
            out_act = shape.output_activation,
            optimizer = optimizer_class(params.optimizer),
            lr = params.learning_rate,
            loss = shape.loss_function,
            epochs = params.epochs,
            batch = params.batch_size
        )
    );
    code
}

/// Parameters are validated to hold at least one hidden layer.
fn split_layers(layers: &[u32]) -> (u32, &[u32]) {
    match layers.split_first() {
        Some((first, rest)) => (*first, rest),
        None => (1, &[]),
    }
}

/// Generated code plus what the exporter panel shows around it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeExport {
    pub framework: Framework,
    pub file_name: String,
    pub code: String,
    /// Set once the run completed; the code then reflects a trained config
    pub optimal: bool,
    pub summary: Vec<String>,
}

impl CodeExport {
    /// `None` while no run has been started.
    pub fn for_state(params: &Parameters, state: &TrainingState, framework: Framework) -> Option<CodeExport> {
        if state.status == TrainingStatus::Idle {
            return None;
        }
        let shape = ModelShape::for_parameters(params);
        let output_kind = if params.dataset.is_regression() {
            "unit(s) (regression)"
        } else {
            "class(es) (classification)"
        };

        Some(CodeExport {
            framework,
            file_name: file_name(params, framework),
            code: generate(params, framework),
            optimal: state.status == TrainingStatus::Complete,
            summary: vec![
                format!("Input: {} features", shape.input_dimension),
                format!("Hidden Layers: {}", layers_label(&params.neuron_layers, " → ")),
                format!("Output: {} {output_kind}", shape.output_dimension),
                format!(
                    "Activation: {} (hidden), {} (output)",
                    params.activation_function,
                    shape.output_activation
                ),
                format!("Loss: {}", shape.loss_function)
            ],
        })
    }

    pub fn badge(&self) -> Option<&'static str> {
        self.optimal.then_some("Using optimal parameters")
    }
}
