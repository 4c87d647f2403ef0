//! Configuration system for MetaForge.
//!
//! Load search settings from TOML or YAML to choose stop criteria,
//! acceptance, pools and neighborhood selection without code changes.
//!
//! # Examples
//!
//! ```
//! use metaforge_config::{AcceptanceConfig, PoolConfig, SearchConfig, ThreadCount};
//! use std::time::Duration;
//!
//! let config = SearchConfig::from_toml_str(r#"
//!     random_seed = 7
//!     thread_count = { specific = 4 }
//!
//!     [stop]
//!     type = "time_iteration"
//!     time_limit_ms = 30000
//!     max_iterations = 1000
//!
//!     [acceptance]
//!     type = "simulated_annealing"
//!     t_start = 10.0
//!     t_end = 0.1
//!     iter_max = 1000
//!
//!     [pool]
//!     type = "elite_diverse"
//!     limit = 10
//!     diversity_weight = 0.5
//! "#).unwrap();
//!
//! assert_eq!(config.thread_count, ThreadCount::Specific(4));
//! assert_eq!(config.stop.time_limit(), Some(Duration::from_secs(30)));
//! assert!(matches!(config.acceptance, AcceptanceConfig::SimulatedAnnealing(_)));
//! assert!(matches!(config.pool, PoolConfig::EliteDiverse(_)));
//! ```
//!
//! Use the defaults when the file is missing:
//!
//! ```
//! use metaforge_config::SearchConfig;
//!
//! let config = SearchConfig::load("search.toml").unwrap_or_default();
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main search configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchConfig {
    /// Number of random streams and parallel workers.
    #[serde(default)]
    pub thread_count: ThreadCount,

    /// Random seed for reproducible results.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Stop criteria of the outermost search.
    #[serde(default)]
    pub stop: StopConfig,

    #[serde(default)]
    pub acceptance: AcceptanceConfig,

    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub selection: SelectionConfig,
}

impl SearchConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML or
    /// fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings that do not depend on a component constructor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_count == ThreadCount::Specific(0) {
            return Err(ConfigError::Invalid(
                "thread_count must be at least 1".to_string(),
            ));
        }
        if let Some(weight) = self
            .selection
            .weights
            .iter()
            .find(|w| !(w.is_finite() && **w >= 0.0))
        {
            return Err(ConfigError::Invalid(format!(
                "selection weights must be finite and non-negative, got {}",
                weight
            )));
        }
        Ok(())
    }

    pub fn with_thread_count(mut self, thread_count: ThreadCount) -> Self {
        self.thread_count = thread_count;
        self
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_stop(mut self, stop: StopConfig) -> Self {
        self.stop = stop;
        self
    }

    /// Sets the outer time limit, keeping the other stop settings.
    pub fn with_time_limit_ms(mut self, millis: u64) -> Self {
        match &mut self.stop {
            StopConfig::TimeIteration(limits) => limits.time_limit_ms = Some(millis),
            StopConfig::NoImprovement(plateau) => plateau.time_limit_ms = Some(millis),
        }
        self
    }

    pub fn with_acceptance(mut self, acceptance: AcceptanceConfig) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = selection;
        self
    }
}

/// Thread count configuration.
///
/// Written as `"auto"`, a bare count, or a `specific` map; the same forms
/// work in TOML and YAML.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "ThreadCountRepr", into = "ThreadCountRepr")]
pub enum ThreadCount {
    /// One thread per available core.
    #[default]
    Auto,

    /// Specific number of threads.
    Specific(usize),
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum ThreadKeyword {
    Auto,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(untagged)]
enum ThreadCountRepr {
    Keyword(ThreadKeyword),
    Count(usize),
    Specific { specific: usize },
}

impl From<ThreadCountRepr> for ThreadCount {
    fn from(repr: ThreadCountRepr) -> Self {
        match repr {
            ThreadCountRepr::Keyword(ThreadKeyword::Auto) => ThreadCount::Auto,
            ThreadCountRepr::Count(n) | ThreadCountRepr::Specific { specific: n } => {
                ThreadCount::Specific(n)
            }
        }
    }
}

impl From<ThreadCount> for ThreadCountRepr {
    fn from(count: ThreadCount) -> Self {
        match count {
            ThreadCount::Auto => ThreadCountRepr::Keyword(ThreadKeyword::Auto),
            ThreadCount::Specific(specific) => ThreadCountRepr::Specific { specific },
        }
    }
}

impl ThreadCount {
    /// Number of threads this setting stands for on the current machine.
    pub fn resolve(self) -> usize {
        match self {
            ThreadCount::Auto => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            ThreadCount::Specific(n) => n,
        }
    }
}

/// Stop criteria configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopConfig {
    /// Wall-clock and iteration bounds.
    TimeIteration(TimeIterationConfig),

    /// Plateau detection on top of time and iteration bounds.
    NoImprovement(NoImprovementConfig),
}

impl Default for StopConfig {
    fn default() -> Self {
        StopConfig::TimeIteration(TimeIterationConfig::default())
    }
}

impl StopConfig {
    /// Returns the time limit as a Duration, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        let millis = match self {
            StopConfig::TimeIteration(limits) => limits.time_limit_ms,
            StopConfig::NoImprovement(plateau) => plateau.time_limit_ms,
        };
        millis.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TimeIterationConfig {
    /// Maximum milliseconds to spend.
    pub time_limit_ms: Option<u64>,

    /// Maximum number of iterations.
    pub max_iterations: Option<u64>,

    /// Log progress every time this fraction of the budget is used.
    pub progress_step: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct NoImprovementConfig {
    pub time_limit_ms: Option<u64>,

    pub max_iterations: Option<u64>,

    pub progress_step: Option<f64>,

    /// Length of the window of objectives compared for a plateau.
    pub iterations_no_improv: usize,

    /// Relative change below which the window counts as a plateau.
    pub tolerance: Option<f64>,
}

/// Temperature or threshold schedule.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ScheduleConfig {
    pub t_start: f64,
    pub t_end: f64,
    /// Iterations over which the schedule decays from `t_start` to `t_end`.
    pub iter_max: u64,
}

/// Acceptance criteria configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AcceptanceConfig {
    /// Only strictly improving candidates.
    #[default]
    Better,

    /// Improving or equal candidates.
    BetterOrSame,

    /// Candidates within a decaying relative threshold.
    Threshold(ScheduleConfig),

    /// Metropolis acceptance with a decaying temperature.
    SimulatedAnnealing(ScheduleConfig),

    /// Improving candidates, with a chance to skip already known ones.
    BetterUnknown(BetterUnknownConfig),
}

/// Exactly one of the two rates is expected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BetterUnknownConfig {
    /// Constant acceptance probability for known solutions.
    pub fixed_percent: Option<f64>,

    /// Factor of the decaying acceptance probability for known solutions.
    pub log_factor: Option<f64>,
}

/// Pool configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PoolConfig {
    /// Unbounded, keeps everything.
    #[default]
    List,

    /// Bounded, evicts the worst member.
    Elite(EliteConfig),

    /// Bounded, evicts by quality and diversity.
    EliteDiverse(EliteDiverseConfig),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EliteConfig {
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EliteDiverseConfig {
    pub limit: usize,

    /// Weight of the average dissimilarity against the objective gap.
    pub diversity_weight: f64,
}

/// Order in which a neighborhood selection hands out its members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategyConfig {
    /// Insertion order.
    #[default]
    List,

    /// Uniform permutation on every reset.
    Random,

    /// Weighted random order on every reset.
    Probability,
}

/// Neighborhood selection configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SelectionConfig {
    #[serde(default)]
    pub strategy: SelectionStrategyConfig,

    /// Restart from the first member instead of running out.
    #[serde(default)]
    pub circular: bool,

    /// Per-neighborhood weights, in insertion order. Missing weights are 1.
    #[serde(default)]
    pub weights: Vec<f64>,
}

impl SelectionConfig {
    /// Weight of the neighborhood at `index`.
    pub fn weight(&self, index: usize) -> f64 {
        self.weights.get(index).copied().unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests;
