use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use euchre_bot::HeuristicParams;
use euchre_core::model::score::TARGET_SCORE;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::Level;

use crate::tournament::MAX_SEAT_PERMUTATIONS;

/// Every match seats exactly this many agents.
pub const SEATS: usize = 4;

const DEFAULT_SEAT_PERMUTATIONS: usize = 4;
const DEFAULT_LATENCY_BUDGET_MS: u64 = 1_200;
const DEFAULT_SIMULATIONS: u32 = 1_000;

/// Root benchmark configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub matches: MatchConfig,
    pub agents: Vec<AgentConfig>,
    pub outputs: OutputsConfig,
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            source,
            path: path.to_path_buf(),
        })?;
        Self::parse(&text, path)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse(yaml, Path::new("<inline>"))
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let cfg: BenchmarkConfig = serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            source,
            path: path.to_path_buf(),
        })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(cfg)
    }

    /// Checks everything a run depends on, including each agent's `params`.
    /// Call again after applying command-line overrides.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.run_id.is_empty()
            || !self
                .run_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(ValidationError::RunId(self.run_id.clone()));
        }
        self.matches.validate()?;
        self.logging.level()?;

        let outputs = self.resolved_outputs();
        if outputs.jsonl.as_os_str().is_empty() || outputs.summary_md.as_os_str().is_empty() {
            return Err(ValidationError::EmptyOutput);
        }
        if outputs.jsonl == outputs.summary_md {
            return Err(ValidationError::SharedOutput(outputs.jsonl));
        }

        validate_agents(&self.agents)?;
        if !self.agents.iter().any(|a| a.name == self.metrics.baseline) {
            return Err(ValidationError::UnknownBaseline(self.metrics.baseline.clone()));
        }
        Ok(())
    }

    /// Output paths with every `{run_id}` substituted.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        let resolve = |template: &str| PathBuf::from(template.replace("{run_id}", &self.run_id));
        ResolvedOutputs {
            jsonl: resolve(&self.outputs.jsonl),
            summary_md: resolve(&self.outputs.summary_md),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MatchConfig {
    pub seed: Option<u64>,
    pub count: usize,
    /// Seatings each match is replayed under; see [`SeatPermutations`](crate::tournament::SeatPermutations).
    #[serde(default = "default_permutations")]
    pub permutations: usize,
    #[serde(default = "default_target_score")]
    pub target_score: u32,
}

impl MatchConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::Zero("matches.count"));
        }
        if self.target_score == 0 {
            return Err(ValidationError::Zero("matches.target_score"));
        }
        if !(1..=MAX_SEAT_PERMUTATIONS).contains(&self.permutations) {
            return Err(ValidationError::Permutations {
                requested: self.permutations,
                max: MAX_SEAT_PERMUTATIONS,
            });
        }
        Ok(())
    }
}

fn default_permutations() -> usize {
    DEFAULT_SEAT_PERMUTATIONS
}

fn default_target_score() -> u32 {
    TARGET_SCORE
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub kind: AgentKind,
    /// Kind-specific settings, kept verbatim for the summary report.
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Heuristic,
    External,
    Human,
}

/// Typed form of an agent's `params`.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentSetup {
    Heuristic(HeuristicOptions),
    External(ExternalOptions),
    Human,
}

impl AgentConfig {
    pub fn setup(&self) -> Result<AgentSetup, ValidationError> {
        let invalid = |message: String| ValidationError::AgentParams {
            agent: self.name.clone(),
            message,
        };
        match self.kind {
            AgentKind::Heuristic => HeuristicOptions::from_params(&self.params)
                .map(AgentSetup::Heuristic)
                .map_err(invalid),
            AgentKind::External => ExternalOptions::from_params(&self.params)
                .map(AgentSetup::External)
                .map_err(invalid),
            AgentKind::Human => match &self.params {
                Value::Null => Ok(AgentSetup::Human),
                Value::Mapping(mapping) if mapping.is_empty() => Ok(AgentSetup::Human),
                _ => Err(invalid("human agents take no params".to_string())),
            },
        }
    }
}

/// Heuristic agent: any [`HeuristicParams`] field plus an optional `seed`
/// mixed into every seat seed.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicOptions {
    pub params: HeuristicParams,
    pub seed: Option<u64>,
}

impl HeuristicOptions {
    fn from_params(params: &Value) -> Result<Self, String> {
        let mut mapping = match params {
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => mapping.clone(),
            _ => return Err("params must be a mapping".to_string()),
        };
        let seed = match mapping.remove("seed") {
            Some(value) => Some(value.as_u64().ok_or("seed must be an unsigned integer")?),
            None => None,
        };
        let params: HeuristicParams =
            serde_yaml::from_value(Value::Mapping(mapping)).map_err(|err| err.to_string())?;
        check_heuristic(&params)?;
        Ok(Self { params, seed })
    }
}

/// What an external agent does when its process gives no usable answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExternalFallback {
    /// Answer with the built-in heuristic and carry on.
    #[default]
    Heuristic,
    /// Answer with the heuristic so the hand stays consistent, then fail the run.
    #[serde(alias = "none")]
    Error,
}

/// External search agent. One process is spawned per decision.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExternalOptions {
    pub command: Option<String>,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Wall-clock budget per decision. A process still running after it is
    /// killed and the decision falls back.
    pub timeout_ms: Option<u64>,
    pub simulations: u32,
    pub exploration: f64,
    pub fallback: ExternalFallback,
    /// Tuning for the fallback heuristic.
    pub heuristic: HeuristicParams,
}

impl Default for ExternalOptions {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            working_dir: None,
            timeout_ms: None,
            simulations: DEFAULT_SIMULATIONS,
            exploration: std::f64::consts::SQRT_2,
            fallback: ExternalFallback::Heuristic,
            heuristic: HeuristicParams::default(),
        }
    }
}

impl ExternalOptions {
    fn from_params(params: &Value) -> Result<Self, String> {
        let options: ExternalOptions = if params.is_null() {
            Self::default()
        } else {
            serde_yaml::from_value(params.clone()).map_err(|err| err.to_string())?
        };
        if options.simulations == 0 {
            return Err("simulations must be a positive integer".to_string());
        }
        if !options.exploration.is_finite() || options.exploration < 0.0 {
            return Err("exploration must be a non-negative number".to_string());
        }
        if options.timeout_ms == Some(0) {
            return Err("timeout_ms must be greater than zero".to_string());
        }
        let has_command = options.command.as_deref().is_some_and(|cmd| !cmd.is_empty());
        if options.fallback == ExternalFallback::Error && !has_command {
            return Err("a command is required when fallback is 'error'".to_string());
        }
        check_heuristic(&options.heuristic)?;
        Ok(options)
    }
}

fn check_heuristic(params: &HeuristicParams) -> Result<(), String> {
    if params
        .accept_chance
        .iter()
        .any(|chance| !(0.0..=1.0).contains(chance))
    {
        return Err("accept_chance entries must lie in [0, 1]".to_string());
    }
    let weights = [
        params.power_weight,
        params.bonus_weight,
        params.follow_scale,
        params.partner_winning_bonus,
    ];
    if weights.iter().any(|w| !w.is_finite()) {
        return Err("play weights must be finite".to_string());
    }
    Ok(())
}

/// Four uniquely named agents, at most one of them reading the terminal, each
/// with `params` that parse for its kind.
fn validate_agents(agents: &[AgentConfig]) -> Result<(), ValidationError> {
    if agents.len() != SEATS {
        return Err(ValidationError::AgentCount(agents.len()));
    }

    let mut seen = HashSet::new();
    for agent in agents {
        if agent.name.trim().is_empty() {
            return Err(ValidationError::EmptyAgentName);
        }
        if !seen.insert(agent.name.as_str()) {
            return Err(ValidationError::DuplicateAgent(agent.name.clone()));
        }
        agent.setup()?;
    }

    let humans = agents
        .iter()
        .filter(|agent| agent.kind == AgentKind::Human)
        .count();
    if humans > 1 {
        return Err(ValidationError::SharedTerminal(humans));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MetricsConfig {
    /// Agent every other agent's win rate is tested against.
    pub baseline: String,
    #[serde(default = "default_latency_budget_ms")]
    pub latency_budget_ms: u64,
}

fn default_latency_budget_ms() -> u64 {
    DEFAULT_LATENCY_BUDGET_MS
}

/// Structured logging stays off unless requested.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    pub fn level(&self) -> Result<Level, ValidationError> {
        self.tracing_level
            .parse()
            .map_err(|_| ValidationError::TracingLevel(self.tracing_level.clone()))
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
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
        #[source]
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("run_id '{0}' must be non-empty and use only letters, digits, '.', '_' or '-'")]
    RunId(String),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("matches.permutations is {requested}; between 1 and {max} seatings are possible")]
    Permutations { requested: usize, max: usize },
    #[error("a match seats exactly {SEATS} agents, found {0}")]
    AgentCount(usize),
    #[error("agent names must not be empty")]
    EmptyAgentName,
    #[error("agent '{0}' is defined more than once")]
    DuplicateAgent(String),
    #[error("{0} human agents configured; only one can read the terminal")]
    SharedTerminal(usize),
    #[error("agent '{agent}': {message}")]
    AgentParams { agent: String, message: String },
    #[error("baseline agent '{0}' is not among the agents")]
    UnknownBaseline(String),
    #[error("unknown tracing level '{0}'")]
    TracingLevel(String),
    #[error("output paths must not be empty")]
    EmptyOutput,
    #[error("jsonl and summary_md both resolve to {0:?}")]
    SharedOutput(PathBuf),
}
