pub mod codegen;
pub mod config;
pub mod contact;
pub mod controller;
pub mod dashboard;
pub mod datasets;
pub mod error;
pub mod metrics;
pub mod params;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod shape;
pub mod site;
pub mod trainer;
pub mod views;

pub use config::PlaygroundConfig;
pub use controller::{ RunId, TrainingController, TrainingState, TrainingStatus };
pub use error::{ PlaygroundError, PlaygroundResult };
pub use metrics::Metrics;
pub use params::Parameters;
pub use registry::{ ModelEntry, ModelRegistry };
pub use session::{ lock, start_training, Session, SessionSnapshot, SharedSession };
