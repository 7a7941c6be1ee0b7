use std::sync::{ Arc, Mutex };

#[derive(Debug, Default, Clone)]
pub struct MetricSeries {
    pub accuracy: Vec<(f64, f64)>,
    pub loss: Vec<(f64, f64)>,
}

#[derive(Debug, Default, Clone)]
pub struct Progress {
    pub current_epoch: u32,
    pub max_epoch: u32,
    pub percent: f64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    #[default]
    Pending,
    Current,
    Completed,
    Error,
}

#[derive(Debug, Default, Clone)]
pub struct Step {
    pub name: String,
    pub description: String,
    pub status: StepStatus,
    pub detail: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ParamRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    #[default]
    Input,
    Hidden,
    Output,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Node {
    pub x: f64,
    pub y: f64,
    pub kind: NodeKind,
}

#[derive(Debug, Default, Clone)]
pub struct NetworkView {
    pub structure: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<((f64, f64), (f64, f64))>,
    pub opacity: f64,
    pub pulsing: bool,
}

#[derive(Debug, Default, Clone)]
pub struct ComparisonTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Rows that improve on the first model, by index
    pub improved: Vec<bool>,
    pub accuracy: Vec<(String, u64)>,
    pub parameters: Vec<Vec<String>>,
}

#[derive(Debug, Default, Clone)]
pub struct CodeView {
    pub framework: String,
    pub file_name: String,
    pub badge: Option<String>,
    pub summary: Vec<String>,
    pub lines: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct DatasetView {
    pub name: String,
    pub description: String,
    pub facts: Vec<(String, String)>,
    pub samples: Vec<Vec<String>>,
}

/// Everything the dashboard draws, already formatted.
#[derive(Debug, Default, Clone)]
pub struct StatePlayground {
    pub headline: String,
    pub badge: Option<String>,
    pub progress: Progress,
    pub steps: Vec<Step>,
    pub params: Vec<ParamRow>,
    pub metrics: Vec<(String, u64)>,
    pub loss: Option<f64>,
    pub quality: Option<String>,
    pub insight: Option<String>,
    pub history: MetricSeries,
    pub architecture: Vec<[String; 3]>,
    pub total_params: u64,
    pub network: NetworkView,
    pub comparison: ComparisonTable,
    pub code: Option<CodeView>,
    pub dataset: DatasetView,
    pub saved_models: usize,
    pub notice: Option<String>,
}

/// Requests from the dashboard to whoever owns the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Reset,
    Save,
    Deploy,
    Adjust {
        field: usize,
        delta: i32,
    },
    CycleFramework,
    Quit,
}

pub type StateMutex = Arc<Mutex<StatePlayground>>;
