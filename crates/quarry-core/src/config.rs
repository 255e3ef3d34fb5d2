//! Configuration loading and typed config structures for the Quarry
//! controller.
//!
//! The canonical configuration lives in `quarry-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file. Every
//! field has a default matching the tuned values of the controller, so an
//! absent or partial file is always usable.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `quarry-config.yaml`. The `scenario` section is
/// consumed by the sim binary only; the controller itself reads `tuning`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HarvestConfig {
    /// Controller tuning constants.
    #[serde(default)]
    pub tuning: Tuning,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Scripted-world scenario parameters (sim binary).
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

impl HarvestConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yml::from_str(&contents)?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }
}

/// Controller tuning constants.
///
/// The distance bands and radii are in map units. Defaults are the values
/// the controller was tuned with; change them only with a stopwatch in hand.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tuning {
    /// Nodes strictly closer than this to the base host `near_capacity`
    /// workers.
    #[serde(default = "default_near_distance")]
    pub near_distance: f32,

    /// Nodes up to this distance (inclusive) host `mid_capacity` workers.
    #[serde(default = "default_mid_distance")]
    pub mid_distance: f32,

    /// Ideal crew size for near nodes.
    #[serde(default = "default_near_capacity")]
    pub near_capacity: u32,

    /// Ideal crew size for mid-range nodes.
    #[serde(default = "default_mid_capacity")]
    pub mid_capacity: u32,

    /// Beyond `mid_distance`, ideal crew size is `floor(distance / this)`.
    #[serde(default = "default_far_divisor")]
    pub far_divisor: f32,

    /// A worker within this distance of its node (or the node's approach
    /// point) counts as arrived and switches to gathering.
    #[serde(default = "default_gather_radius")]
    pub gather_radius: f32,

    /// Lateral (±x) offset of the approach-point candidates from the node
    /// center.
    #[serde(default = "default_lateral_offset")]
    pub lateral_offset: f32,

    /// How far the approach point is nudged from the node toward the base.
    #[serde(default = "default_approach_nudge")]
    pub approach_nudge: f32,

    /// Two workers closer than `overlap_factor x mean radius` are flagged
    /// as overlapping.
    #[serde(default = "default_overlap_factor")]
    pub overlap_factor: f32,

    /// Extra slots added to the ideal harvester total reported to callers
    /// (headroom for a worker in transit). Never enforced by the matcher.
    #[serde(default = "default_reserve_slots")]
    pub reserve_slots: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            near_distance: default_near_distance(),
            mid_distance: default_mid_distance(),
            near_capacity: default_near_capacity(),
            mid_capacity: default_mid_capacity(),
            far_divisor: default_far_divisor(),
            gather_radius: default_gather_radius(),
            lateral_offset: default_lateral_offset(),
            approach_nudge: default_approach_nudge(),
            overlap_factor: default_overlap_factor(),
            reserve_slots: default_reserve_slots(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log every emitted command at debug level (sim binary).
    #[serde(default)]
    pub log_commands: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_commands: false,
        }
    }
}

/// Scripted-world scenario parameters, consumed by the sim binary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioConfig {
    /// Random seed for worker spawn jitter.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// How many ticks to run.
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// How many workers to spawn.
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Worker travel speed in map units per tick.
    #[serde(default = "default_worker_speed")]
    pub worker_speed: f32,

    /// Worker collision radius.
    #[serde(default = "default_worker_radius")]
    pub worker_radius: f32,

    /// Ticks a worker spends at a node before its cargo flag is set.
    #[serde(default = "default_gather_ticks")]
    pub gather_ticks: u32,

    /// Amount drained from a node per completed gather.
    #[serde(default = "default_node_yield")]
    pub node_yield: u32,

    /// A carrying worker within this distance of the base delivers.
    #[serde(default = "default_deliver_radius")]
    pub deliver_radius: f32,

    /// Bases and their node fields.
    #[serde(default = "default_bases")]
    pub bases: Vec<ScenarioBase>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            ticks: default_ticks(),
            workers: default_workers(),
            worker_speed: default_worker_speed(),
            worker_radius: default_worker_radius(),
            gather_ticks: default_gather_ticks(),
            node_yield: default_node_yield(),
            deliver_radius: default_deliver_radius(),
            bases: default_bases(),
        }
    }
}

/// One base and the node field around it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioBase {
    /// Base x coordinate.
    pub x: f32,
    /// Base y coordinate.
    pub y: f32,
    /// Resource nodes belonging to this base.
    #[serde(default)]
    pub nodes: Vec<ScenarioNode>,
}

/// One resource node of a scenario base.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioNode {
    /// Node x coordinate.
    pub x: f32,
    /// Node y coordinate.
    pub y: f32,
    /// Starting resource amount.
    #[serde(default = "default_node_amount")]
    pub amount: u32,
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_near_distance() -> f32 {
    7.0
}

const fn default_mid_distance() -> f32 {
    9.0
}

const fn default_near_capacity() -> u32 {
    2
}

const fn default_mid_capacity() -> u32 {
    3
}

const fn default_far_divisor() -> f32 {
    5.0
}

const fn default_gather_radius() -> f32 {
    1.7
}

const fn default_lateral_offset() -> f32 {
    0.25
}

const fn default_approach_nudge() -> f32 {
    0.6
}

const fn default_overlap_factor() -> f32 {
    2.0
}

const fn default_reserve_slots() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_ticks() -> u64 {
    1500
}

const fn default_workers() -> u32 {
    12
}

const fn default_worker_speed() -> f32 {
    0.8
}

const fn default_worker_radius() -> f32 {
    0.4
}

const fn default_gather_ticks() -> u32 {
    3
}

const fn default_node_yield() -> u32 {
    5
}

const fn default_deliver_radius() -> f32 {
    1.5
}

const fn default_node_amount() -> u32 {
    900
}

/// One base at map center with a standard eight-node field around it.
fn default_bases() -> Vec<ScenarioBase> {
    let nodes = [
        (6.0, 0.5),
        (5.5, -2.0),
        (6.5, 2.5),
        (7.5, -1.0),
        (8.0, 1.5),
        (8.5, -3.0),
        (8.5, 3.5),
        (9.5, 0.0),
    ];
    vec![ScenarioBase {
        x: 32.0,
        y: 32.0,
        nodes: nodes
            .iter()
            .map(|&(dx, dy)| ScenarioNode {
                x: 32.0 + dx,
                y: 32.0 + dy,
                amount: default_node_amount(),
            })
            .collect(),
    }]
}
