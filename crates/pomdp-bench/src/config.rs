use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_ATTEMPTS_PER_PARTICLE: usize = 1_000;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root harness configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HarnessConfig {
    pub run_id: String,
    pub trials: TrialConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HarnessConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: HarnessConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.trials.validate()?;
        self.outputs.validate()?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary: resolve_template(&self.run_id, &self.outputs.summary),
        }
    }
}

/// Trial block: how many belief updates to run and at what size.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TrialConfig {
    pub seed: Option<u64>,
    pub count: usize,
    pub particles: usize,
    #[serde(default = "default_attempts")]
    pub attempts_per_particle: usize,
    /// Worker threads per update; 0 or 1 runs the serial path.
    #[serde(default)]
    pub workers: usize,
    #[serde(default = "default_listen_accuracy")]
    pub listen_accuracy: f64,
}

impl TrialConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::InvalidField {
                field: "trials.count".to_string(),
                message: "number of trials must be greater than zero".to_string(),
            });
        }

        if self.particles == 0 {
            return Err(ValidationError::InvalidField {
                field: "trials.particles".to_string(),
                message: "particle count must be greater than zero".to_string(),
            });
        }

        if self.attempts_per_particle == 0 {
            return Err(ValidationError::InvalidField {
                field: "trials.attempts_per_particle".to_string(),
                message: "attempt budget must be greater than zero".to_string(),
            });
        }

        if !(self.listen_accuracy > 0.0 && self.listen_accuracy <= 1.0) {
            return Err(ValidationError::InvalidField {
                field: "trials.listen_accuracy".to_string(),
                message: "listen accuracy must lie in (0, 1]".to_string(),
            });
        }

        Ok(())
    }
}

fn default_attempts() -> usize {
    DEFAULT_ATTEMPTS_PER_PARTICLE
}

fn default_listen_accuracy() -> f64 {
    0.85
}

/// Output locations block; values may contain `{run_id}` templates.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary: String,
}

impl OutputsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [("outputs.jsonl", &self.jsonl), ("outputs.summary", &self.summary)] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: field.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Concrete output paths after template resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary: PathBuf,
}

/// Structured-logging block.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default)]
    pub level: Option<String>,
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if let Some(level) = &mut self.level {
            *level = level.trim().to_ascii_lowercase();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.level.as_deref() {
            Some("trace") => Some(Level::TRACE),
            Some("debug") => Some(Level::DEBUG),
            Some("info") => Some(Level::INFO),
            Some("warn") => Some(Level::WARN),
            Some("error") => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.is_empty()
        || !run_id
            .chars()
            .all(|character| RUN_ID_ALLOWED.contains(character))
    {
        return Err(ValidationError::InvalidRunId(run_id.to_string()));
    }
    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    PathBuf::from(template.replace("{run_id}", run_id))
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("run_id may only contain [A-Za-z0-9._-] and must not be empty (got '{0}')")]
    InvalidRunId(String),
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
