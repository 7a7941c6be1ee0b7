use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::TrainerError;
use crate::metrics::{ self, Metrics };
use crate::params::Parameters;

/// Source of metrics for a run. A real backend reports failures through
/// `Err`; the controller turns them into the `failed` status.
pub trait Trainer: Send {
    fn epoch(&mut self, epoch: u32, total: u32, params: &Parameters) -> Result<Metrics, TrainerError>;

    fn finish(&mut self, params: &Parameters) -> Result<Metrics, TrainerError>;
}

/// Fabricated metrics. Never fails.
#[derive(Debug, Clone)]
pub struct SimulatedTrainer {
    rng: ChaCha8Rng,
}

impl SimulatedTrainer {
    pub fn new(seed: Option<u64>) -> SimulatedTrainer {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        SimulatedTrainer { rng }
    }
}

impl Default for SimulatedTrainer {
    fn default() -> Self {
        SimulatedTrainer::new(None)
    }
}

impl Trainer for SimulatedTrainer {
    fn epoch(&mut self, epoch: u32, total: u32, _params: &Parameters) -> Result<Metrics, TrainerError> {
        Ok(metrics::epoch_metrics(epoch, total))
    }

    fn finish(&mut self, params: &Parameters) -> Result<Metrics, TrainerError> {
        Ok(metrics::final_metrics(params, &mut self.rng))
    }
}
