//! Configuration system for driving and characterizing nodes.
//!
//! This module provides YAML/JSON configuration file support for describing
//! driver settings, characterization settings and the nodes to work on.
//!
//! # Configuration File Structure
//!
//! ```yaml
//! driver:
//!   liveness_threshold: 10000
//!   signal_separator: "_V_"
//!   trace_dir: traces
//!
//! characterization:
//!   period: 64
//!   fallback: min_folded
//!   input_filter: in
//!   output_filter: out
//!
//! nodes:
//!   - name: echo_0
//!     type: Echo
//!     attrs:
//!       latency: "2"
//!     folded_input_shape: [1, 4, 1]
//!     folded_output_shape: [1, 4, 1]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::characterize::{CharacterizationConfig, Characterizer, CycleFallback};
use crate::driver::{DriverConfig, DEFAULT_LIVENESS_THRESHOLD};
use crate::error::SimResult;
use crate::monitor::StreamFilter;
use crate::node::StreamNode;
use crate::registry::ModelRegistry;
use crate::stream::{SignalNaming, DEFAULT_SEPARATOR};
use crate::types::Cycle;

/// Environment variable overriding `driver.liveness_threshold`.
pub const LIVENESS_THRESHOLD_ENV: &str = "LIVENESS_THRESHOLD";

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Handshake driver parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverParams {
    /// Cycles without output progress before a run is aborted
    #[serde(default = "default_liveness_threshold")]
    pub liveness_threshold: Cycle,

    /// Separator between stream name and signal suffix
    #[serde(default = "default_separator")]
    pub signal_separator: String,

    /// Directory for waveform traces
    #[serde(default)]
    pub trace_dir: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_liveness_threshold() -> Cycle {
    DEFAULT_LIVENESS_THRESHOLD
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DriverParams {
    fn default() -> Self {
        Self {
            liveness_threshold: default_liveness_threshold(),
            signal_separator: default_separator(),
            trace_dir: None,
            log_level: default_log_level(),
        }
    }
}

impl DriverParams {
    /// Threshold after applying the `LIVENESS_THRESHOLD` environment override.
    pub fn effective_liveness_threshold(&self) -> Cycle {
        let env = std::env::var(LIVENESS_THRESHOLD_ENV).ok();
        threshold_override(env.as_deref()).unwrap_or(self.liveness_threshold)
    }
}

/// Parses a threshold override; unparsable or zero values are ignored.
fn threshold_override(raw: Option<&str>) -> Option<Cycle> {
    let raw = raw?;
    match raw.trim().parse::<Cycle>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            tracing::warn!(
                "Ignoring {}={:?}: expected a positive cycle count",
                LIVENESS_THRESHOLD_ENV,
                raw
            );
            None
        }
    }
}

/// Characterization parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CharacterizationParams {
    /// Period to characterize nodes for
    #[serde(default)]
    pub period: Option<Cycle>,

    /// Lower bound used when a node has no cycle estimate
    #[serde(default)]
    pub fallback: CycleFallback,

    /// Substring selecting tracked input streams
    #[serde(default = "default_input_filter")]
    pub input_filter: String,

    /// Substring selecting tracked output streams
    #[serde(default = "default_output_filter")]
    pub output_filter: String,

    /// Reset each model before its characterization run
    #[serde(default = "default_true")]
    pub reset_before_run: bool,
}

fn default_input_filter() -> String {
    "in".to_string()
}

fn default_output_filter() -> String {
    "out".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for CharacterizationParams {
    fn default() -> Self {
        Self {
            period: None,
            fallback: CycleFallback::default(),
            input_filter: default_input_filter(),
            output_filter: default_output_filter(),
            reset_before_run: true,
        }
    }
}

/// Configuration for a single node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Unique node name
    pub name: String,

    /// Registered model type
    #[serde(rename = "type")]
    pub model_type: String,

    /// Model attributes as key-value pairs
    #[serde(default)]
    pub attrs: HashMap<String, String>,

    #[serde(default)]
    pub folded_input_shape: Vec<usize>,

    #[serde(default)]
    pub folded_output_shape: Vec<usize>,

    /// Cycle estimate, 0 if unknown
    #[serde(default)]
    pub exp_cycles: Cycle,

    /// Waveform trace file, or `default` for `<name>.vcd`
    #[serde(default)]
    pub rtlsim_trace: Option<String>,
}

impl NodeConfig {
    /// Creates a node description with no attributes or shapes.
    pub fn new(name: impl Into<String>, model_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_type: model_type.into(),
            attrs: HashMap::new(),
            folded_input_shape: Vec::new(),
            folded_output_shape: Vec::new(),
            exp_cycles: 0,
            rtlsim_trace: None,
        }
    }
}

/// Complete configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub driver: DriverParams,

    #[serde(default)]
    pub characterization: CharacterizationParams,

    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

impl SimConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON string.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file, auto-detecting format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml(&std::fs::read_to_string(path)?),
            "json" => Self::from_json(&std::fs::read_to_string(path)?),
            _ => Err(ConfigError::UnknownFormat(ext.to_string())),
        }
    }

    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.driver.liveness_threshold == 0 {
            return Err(ConfigError::Validation(
                "liveness_threshold must be positive".to_string(),
            ));
        }
        if self.driver.signal_separator.is_empty() {
            return Err(ConfigError::Validation(
                "signal_separator must not be empty".to_string(),
            ));
        }
        if self.characterization.period == Some(0) {
            return Err(ConfigError::Validation(
                "characterization period must be positive".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for node in &self.nodes {
            if node.name.is_empty() {
                return Err(ConfigError::Validation("Node with empty name".to_string()));
            }
            if !names.insert(node.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate node name: {}",
                    node.name
                )));
            }
        }

        Ok(())
    }

    /// Saves configuration to a YAML file.
    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Converts to YAML string.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Converts to JSON string.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Installs the tracing subscriber at `driver.log_level`.
    ///
    /// `RUST_LOG` still takes precedence, as with [`crate::init_logging`].
    pub fn init_logging(&self) {
        crate::init_logging(&self.driver.log_level);
    }

    /// Signal naming convention of every node.
    pub fn naming(&self) -> SignalNaming {
        SignalNaming::new(self.driver.signal_separator.clone())
    }

    /// Driver configuration with the environment override applied.
    pub fn to_driver_config(&self) -> DriverConfig {
        DriverConfig::new(self.driver.effective_liveness_threshold()).with_naming(self.naming())
    }

    /// Characterizer configured from the `characterization` section.
    pub fn characterizer(&self) -> Characterizer {
        let params = &self.characterization;
        Characterizer::new(CharacterizationConfig {
            fallback: params.fallback,
            filter: StreamFilter::new(params.input_filter.clone(), params.output_filter.clone()),
            reset_before_run: params.reset_before_run,
        })
    }

    /// Instantiates every configured node through `registry`.
    pub fn build_nodes(&self, registry: &ModelRegistry) -> SimResult<Vec<StreamNode>> {
        let naming = self.naming();
        let driver = self.to_driver_config();

        self.nodes
            .iter()
            .map(|cfg| {
                let model = registry.create(&cfg.model_type, &naming, &cfg.attrs)?;
                let mut node = StreamNode::new(cfg.name.clone())
                    .with_model(model)
                    .with_folded_input_shape(cfg.folded_input_shape.clone())
                    .with_folded_output_shape(cfg.folded_output_shape.clone())
                    .with_exp_cycles(cfg.exp_cycles)
                    .with_driver_config(driver.clone());
                if let Some(trace) = &cfg.rtlsim_trace {
                    node = node.with_rtlsim_trace(trace.clone());
                }
                if let Some(dir) = &self.driver.trace_dir {
                    node = node.with_trace_dir(dir.clone());
                }
                Ok(node)
            })
            .collect()
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Finds a node configuration by name.
    pub fn find_node(&self, name: &str) -> Option<&NodeConfig> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

/// Builder for creating SimConfig programmatically.
#[derive(Default)]
pub struct SimConfigBuilder {
    config: SimConfig,
}

impl SimConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the liveness threshold.
    pub fn liveness_threshold(mut self, cycles: Cycle) -> Self {
        self.config.driver.liveness_threshold = cycles;
        self
    }

    /// Sets the signal separator.
    pub fn signal_separator(mut self, separator: impl Into<String>) -> Self {
        self.config.driver.signal_separator = separator.into();
        self
    }

    /// Sets the waveform trace directory.
    pub fn trace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.driver.trace_dir = Some(dir.into());
        self
    }

    /// Sets the log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.driver.log_level = level.into();
        self
    }

    /// Sets the characterization period.
    pub fn period(mut self, period: Cycle) -> Self {
        self.config.characterization.period = Some(period);
        self
    }

    /// Sets the cycle fallback.
    pub fn fallback(mut self, fallback: CycleFallback) -> Self {
        self.config.characterization.fallback = fallback;
        self
    }

    /// Adds a node configuration.
    pub fn add_node(mut self, node: NodeConfig) -> Self {
        self.config.nodes.push(node);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ConfigResult<SimConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::create_default_registry;

    #[test]
    fn test_default_config() {
        let config = SimConfig::new();
        assert_eq!(config.driver.liveness_threshold, 10_000);
        assert_eq!(config.driver.signal_separator, "_V_");
        assert_eq!(config.characterization.fallback, CycleFallback::MinFolded);
        assert!(config.nodes.is_empty());
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
driver:
  liveness_threshold: 500
  log_level: debug

characterization:
  period: 32
  fallback: disabled

nodes:
  - name: echo_0
    type: Echo
    attrs:
      latency: "2"
    folded_input_shape: [1, 4, 1]
    folded_output_shape: [1, 4, 1]
  - name: join_0
    type: Join
"#;

        let config = SimConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.driver.liveness_threshold, 500);
        assert_eq!(config.driver.log_level, "debug");
        assert_eq!(config.characterization.period, Some(32));
        assert_eq!(config.characterization.fallback, CycleFallback::Disabled);
        assert_eq!(config.characterization.input_filter, "in");
        assert_eq!(config.node_count(), 2);
        assert_eq!(config.find_node("echo_0").unwrap().attrs["latency"], "2");
    }

    #[test]
    fn test_json_parsing() {
        let json = r#"{
            "driver": {"signal_separator": "_"},
            "nodes": [{"name": "n", "type": "Stuck"}]
        }"#;

        let config = SimConfig::from_json(json).unwrap();
        assert_eq!(config.naming().signal_name("out", crate::stream::StreamSignal::Valid), "out_TVALID");
        assert_eq!(config.node_count(), 1);
    }

    #[test]
    fn test_validation_duplicate_node() {
        let result = SimConfigBuilder::new()
            .add_node(NodeConfig::new("a", "Echo"))
            .add_node(NodeConfig::new("a", "Stuck"))
            .build();
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validation_zero_values() {
        assert!(SimConfigBuilder::new().liveness_threshold(0).build().is_err());
        assert!(SimConfigBuilder::new().period(0).build().is_err());
        assert!(SimConfigBuilder::new().signal_separator("").build().is_err());
    }

    #[test]
    fn test_unknown_format() {
        let result = SimConfig::from_file("settings.toml");
        assert!(matches!(result, Err(ConfigError::UnknownFormat(ext)) if ext == "toml"));
    }

    #[test]
    fn test_threshold_override() {
        assert_eq!(threshold_override(None), None);
        assert_eq!(threshold_override(Some("250")), Some(250));
        assert_eq!(threshold_override(Some(" 42 ")), Some(42));
        assert_eq!(threshold_override(Some("0")), None);
        assert_eq!(threshold_override(Some("lots")), None);
    }

    #[test]
    fn test_build_nodes() {
        let mut echo = NodeConfig::new("echo_0", "Echo");
        echo.attrs.insert("latency".to_string(), "2".to_string());
        echo.folded_output_shape = vec![1, 4, 1];
        echo.rtlsim_trace = Some("default".to_string());

        let config = SimConfigBuilder::new()
            .trace_dir("waves")
            .add_node(echo)
            .build()
            .unwrap();
        let nodes = config.build_nodes(&create_default_registry()).unwrap();

        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].is_ready());
        assert_eq!(nodes[0].number_output_values(), 4);
        assert_eq!(nodes[0].trace_path(), Some(PathBuf::from("waves/echo_0.vcd")));
    }

    #[test]
    fn test_build_nodes_unknown_type() {
        let config = SimConfigBuilder::new()
            .add_node(NodeConfig::new("x", "Missing"))
            .build()
            .unwrap();
        assert!(config.build_nodes(&create_default_registry()).is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = SimConfigBuilder::new()
            .period(16)
            .add_node(NodeConfig::new("echo_0", "Echo"))
            .build()
            .unwrap();

        let yaml = config.to_yaml().unwrap();
        let restored = SimConfig::from_yaml(&yaml).unwrap();

        assert_eq!(restored.characterization.period, Some(16));
        assert_eq!(restored.node_count(), 1);
    }
}
