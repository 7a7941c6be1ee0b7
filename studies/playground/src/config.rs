use std::{ env, fs, path::Path, time::Duration };

use serde::{ Deserialize, Serialize };

use crate::error::{ PlaygroundError, PlaygroundResult };
use crate::params::Parameters;

pub const EMAILJS_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    pub endpoint: String,
    pub service_id: String,
    pub template_id: String,
    pub user_id: String,
    pub timeout_secs: u64,
}

impl Default for ContactConfig {
    fn default() -> Self {
        ContactConfig {
            endpoint: EMAILJS_ENDPOINT.to_string(),
            service_id: String::new(),
            template_id: String::new(),
            user_id: String::new(),
            timeout_secs: 10,
        }
    }
}

impl ContactConfig {
    pub fn is_configured(&self) -> bool {
        !self.service_id.is_empty() && !self.template_id.is_empty() && !self.user_id.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaygroundConfig {
    /// Wall-clock length of one simulated epoch
    pub tick_interval_ms: u64,
    /// Seed for the final-metric draw; `None` seeds from entropy
    pub seed: Option<u64>,
    pub parameters: Parameters,
    pub contact: ContactConfig,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        PlaygroundConfig {
            tick_interval_ms: 1000,
            seed: None,
            parameters: Parameters::default(),
            contact: ContactConfig::default(),
        }
    }
}

impl PlaygroundConfig {
    /// Reads `path` when given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> PlaygroundResult<PlaygroundConfig> {
        let config = match path {
            Some(path) => PlaygroundConfig::from_file(path)?,
            None => PlaygroundConfig::default(),
        };
        let config = config.with_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> PlaygroundResult<PlaygroundConfig> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Applies `PLAYGROUND_*` and `EMAILJS_*` overrides read through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> PlaygroundResult<PlaygroundConfig>
        where F: Fn(&str) -> Option<String>
    {
        if let Some(ms) = lookup("PLAYGROUND_TICK_MS") {
            self.tick_interval_ms = ms
                .trim()
                .parse()
                .map_err(|_| PlaygroundError::config(format!("PLAYGROUND_TICK_MS is not a number: {ms}")))?;
        }
        if let Some(seed) = lookup("PLAYGROUND_SEED") {
            self.seed = Some(
                seed
                    .trim()
                    .parse()
                    .map_err(|_| PlaygroundError::config(format!("PLAYGROUND_SEED is not a number: {seed}")))?
            );
        }
        if let Some(id) = lookup("EMAILJS_SERVICE_ID") {
            self.contact.service_id = id;
        }
        if let Some(id) = lookup("EMAILJS_TEMPLATE_ID") {
            self.contact.template_id = id;
        }
        if let Some(id) = lookup("EMAILJS_USER_ID") {
            self.contact.user_id = id;
        }
        Ok(self)
    }

    pub fn validate(&self) -> PlaygroundResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(PlaygroundError::config("tick_interval_ms must be positive"));
        }
        if self.contact.endpoint.is_empty() {
            return Err(PlaygroundError::config("contact.endpoint must not be empty"));
        }
        self.parameters.validate()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = PlaygroundConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
        assert!(!config.contact.is_configured());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("PLAYGROUND_TICK_MS", "250"),
            ("PLAYGROUND_SEED", "9"),
            ("EMAILJS_SERVICE_ID", "service"),
            ("EMAILJS_TEMPLATE_ID", "template"),
            ("EMAILJS_USER_ID", "user"),
        ]);
        let config = PlaygroundConfig::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.seed, Some(9));
        assert!(config.contact.is_configured());
    }

    #[test]
    fn test_bad_override_is_a_config_error() {
        let result = PlaygroundConfig::default().with_overrides(|key| {
            (key == "PLAYGROUND_TICK_MS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(PlaygroundError::Config(_))));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PlaygroundConfig = serde_json::from_str(
            r#"{ "tick_interval_ms": 10, "parameters": { "learningRate": 0.05, "epochs": 3, "batchSize": 16, "optimizer": "sgd", "neuronLayers": [8], "activationFunction": "tanh", "dropout": 0.1, "dataset": "boston", "modelType": "svm" } }"#
        ).unwrap();
        assert_eq!(config.tick_interval_ms, 10);
        assert_eq!(config.parameters.epochs, 3);
        assert_eq!(config.contact, ContactConfig::default());
    }
}
