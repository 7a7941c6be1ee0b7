//! Built-in dataset descriptions shown by the data explorer.

use serde::Serialize;

use crate::params::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Classification { classes: u32 },
    Regression,
}

impl TaskKind {
    pub fn label(&self) -> String {
        match self {
            TaskKind::Classification { classes } => format!("Classification ({classes} classes)"),
            TaskKind::Regression => "Regression".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
    pub target: &'static str,
    pub sample_size: u32,
    pub task: TaskKind,
    /// A few example rows, header first
    pub samples: &'static [&'static [&'static str]],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataSplit {
    pub training: u32,
    pub validation: u32,
    pub testing: u32,
}

impl DataSplit {
    pub fn of(sample_size: u32) -> DataSplit {
        let part = |ratio: f64| ((sample_size as f64) * ratio).round() as u32;
        DataSplit {
            training: part(0.7),
            validation: part(0.15),
            testing: part(0.15),
        }
    }
}

impl DatasetInfo {
    pub fn split(&self) -> DataSplit {
        DataSplit::of(self.sample_size)
    }
}

static IRIS: DatasetInfo = DatasetInfo {
    name: "Iris Flower Dataset",
    description: "A small dataset of iris flowers with measurements of sepals and petals",
    features: &["Sepal Length", "Sepal Width", "Petal Length", "Petal Width"],
    target: "Species (Setosa, Versicolor, Virginica)",
    sample_size: 150,
    task: TaskKind::Classification { classes: 3 },
    samples: &[
        &["Sepal Length", "Sepal Width", "Petal Length", "Petal Width", "Species"],
        &["5.1", "3.5", "1.4", "0.2", "Setosa"],
        &["7.0", "3.2", "4.7", "1.4", "Versicolor"],
        &["6.3", "3.3", "6.0", "2.5", "Virginica"],
    ],
};

static MNIST: DatasetInfo = DatasetInfo {
    name: "MNIST Digits",
    description: "Handwritten digit recognition dataset with 70,000 grayscale images",
    features: &["Pixel Values (28x28 = 784 features)"],
    target: "Digit (0-9)",
    sample_size: 70000,
    task: TaskKind::Classification { classes: 10 },
    samples: &[&["Image", "Label"], &["28x28 digit", "0"], &["28x28 digit", "1"], &["28x28 digit", "2"]],
};

static BOSTON: DatasetInfo = DatasetInfo {
    name: "Boston Housing Dataset",
    description: "Housing prices in Boston suburbs with various neighborhood characteristics",
    features: &[
        "CRIM",
        "ZN",
        "INDUS",
        "CHAS",
        "NOX",
        "RM",
        "AGE",
        "DIS",
        "RAD",
        "TAX",
        "PTRATIO",
        "B",
        "LSTAT",
    ],
    target: "Median Home Value",
    sample_size: 506,
    task: TaskKind::Regression,
    samples: &[
        &["CRIM", "ZN", "INDUS", "CHAS", "NOX", "RM", "Price"],
        &["0.00632", "18.0", "2.31", "0", "0.538", "6.575", "24.0"],
        &["0.02731", "0.0", "7.07", "0", "0.469", "6.421", "21.6"],
        &["0.02729", "0.0", "7.07", "0", "0.469", "7.185", "34.7"],
    ],
};

static CALIFORNIA: DatasetInfo = DatasetInfo {
    name: "California Housing Dataset",
    description: "Housing prices in California with neighborhood characteristics",
    features: &[
        "MedInc",
        "HouseAge",
        "AveRooms",
        "AveBedrms",
        "Population",
        "AveOccup",
        "Latitude",
        "Longitude",
    ],
    target: "Median House Value",
    sample_size: 20640,
    task: TaskKind::Regression,
    samples: &[
        &["MedInc", "HouseAge", "AveRooms", "AveBedrms", "Price"],
        &["8.3252", "41.0", "6.984", "1.023", "452600"],
        &["8.3014", "21.0", "6.238", "0.972", "358500"],
        &["7.2574", "52.0", "8.288", "1.073", "352100"],
    ],
};

pub fn dataset_info(dataset: Dataset) -> &'static DatasetInfo {
    match dataset {
        Dataset::Iris => &IRIS,
        Dataset::Mnist => &MNIST,
        Dataset::Boston => &BOSTON,
        Dataset::California => &CALIFORNIA,
    }
}
