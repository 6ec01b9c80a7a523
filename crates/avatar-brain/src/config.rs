//! Brain configuration, loaded from `avatar.yaml`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::{LlmSettings, Vec3};

pub const CONFIG_FILE: &str = "avatar.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    /// Settings handed to the LLM client unless the host overrides `llmSettings`
    pub llm: LlmSettings,

    #[serde(default)]
    pub mood: MoodConfig,

    #[serde(default)]
    pub motion: MotionConfig,

    /// Attempts for one user command before it is dropped
    #[serde(default = "default_llm_retry_attempts")]
    pub llm_retry_attempts: u64,

    /// Budget for a proactive LLM thought, in milliseconds
    #[serde(default = "default_proactive_timeout_ms")]
    pub proactive_timeout_ms: f64,

    /// Seconds each queued action plays for
    #[serde(default = "default_action_durations")]
    pub action_durations: BTreeMap<String, f64>,

    /// Seconds for actions missing from `action_durations`
    #[serde(default = "default_action_duration")]
    pub default_action_duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodConfig {
    /// Boredom gained per second
    #[serde(default = "default_boredom_rate")]
    pub boredom_per_second: f64,

    /// Energy regained per second while sleeping
    #[serde(default = "default_energy_recovery")]
    pub energy_recovery_per_second: f64,

    /// Boredom at which the penguin starts a conversation on its own
    #[serde(default = "default_proactive_threshold")]
    pub proactive_threshold: f64,

    /// Energy at or below which the penguin goes to sleep
    #[serde(default = "default_sleep_threshold")]
    pub sleep_threshold: f64,

    /// Seconds of one sleep cycle
    #[serde(default = "default_sleep_duration")]
    pub sleep_duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    #[serde(default = "default_origin")]
    pub origin: Vec3,

    /// Fraction of the remaining distance covered per frame when returning home
    #[serde(default = "default_return_factor")]
    pub return_factor: f64,

    /// Distance from the origin that counts as home
    #[serde(default = "default_arrive_tolerance")]
    pub arrive_tolerance: f64,

    #[serde(default = "default_move_speed")]
    pub move_speed: f64,

    /// Energy spent once per walk
    #[serde(default = "default_move_energy_cost")]
    pub move_energy_cost: f64,
}

fn default_llm_retry_attempts() -> u64 {
    2
}
fn default_proactive_timeout_ms() -> f64 {
    15_000.0
}
fn default_action_duration() -> f64 {
    3.0
}
fn default_boredom_rate() -> f64 {
    1.0
}
fn default_energy_recovery() -> f64 {
    5.0
}
fn default_proactive_threshold() -> f64 {
    80.0
}
fn default_sleep_threshold() -> f64 {
    20.0
}
fn default_sleep_duration() -> f64 {
    5.0
}
fn default_origin() -> Vec3 {
    [0.0, -1.0, 0.0]
}
fn default_return_factor() -> f64 {
    0.15
}
fn default_arrive_tolerance() -> f64 {
    0.05
}
fn default_move_speed() -> f64 {
    0.1
}
fn default_move_energy_cost() -> f64 {
    5.0
}

pub fn default_action_durations() -> BTreeMap<String, f64> {
    [
        ("IDLE", 2.0),
        ("WALK", 3.0),
        ("RUN", 3.0),
        ("JUMP", 1.5),
        ("WAVE", 2.0),
        ("DANCE", 4.0),
        ("SPIN", 2.0),
        ("SHIVER", 2.0),
        ("SLEEP", 5.0),
        ("BOW", 2.5),
        ("NO", 1.5),
        ("YES", 1.5),
        ("EAT", 3.0),
        ("SURPRISE", 2.0),
        ("ANGRY", 2.5),
        ("SAD", 3.0),
        ("HAPPY", 2.5),
        ("LOOK_LEFT", 1.5),
        ("LOOK_RIGHT", 1.5),
        ("ROLL", 2.0),
        ("BACKFLIP", 2.0),
        ("CLAP", 2.0),
        ("THINK", 3.0),
        ("SIT", 4.0),
        ("FIGHT", 3.0),
        ("SWIM", 4.0),
        ("DAZZLE", 3.0),
        ("HIDE", 3.0),
        ("PEEK", 2.0),
        ("LOVE", 3.0),
        ("FLY", 5.0),
        ("RUN_ACROSS", 4.0),
        ("SLIDE", 4.0),
        ("KICK", 1.5),
        ("PUNCH", 1.5),
        ("KUNG_FU", 4.0),
        ("TAI_CHI", 6.0),
        ("MEDITATE", 5.0),
        ("BREAKDANCE", 5.0),
        ("BALLET", 5.0),
        ("SALSA", 4.0),
        ("HIP_HOP", 4.0),
        ("MOONWALK", 4.0),
        ("PRAY", 3.0),
        ("SALUTE", 2.0),
        ("CRY", 4.0),
        ("LAUGH", 3.0),
        ("YAWN", 3.0),
        ("SNEEZE", 2.0),
        ("SHOCKED", 2.0),
    ]
    .into_iter()
    .map(|(name, secs)| (name.to_string(), secs))
    .collect()
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            mood: MoodConfig::default(),
            motion: MotionConfig::default(),
            llm_retry_attempts: default_llm_retry_attempts(),
            proactive_timeout_ms: default_proactive_timeout_ms(),
            action_durations: default_action_durations(),
            default_action_duration: default_action_duration(),
        }
    }
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            boredom_per_second: default_boredom_rate(),
            energy_recovery_per_second: default_energy_recovery(),
            proactive_threshold: default_proactive_threshold(),
            sleep_threshold: default_sleep_threshold(),
            sleep_duration: default_sleep_duration(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            return_factor: default_return_factor(),
            arrive_tolerance: default_arrive_tolerance(),
            move_speed: default_move_speed(),
            move_energy_cost: default_move_energy_cost(),
        }
    }
}

impl BrainConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load `avatar.yaml` from `dir`, or the defaults when there is none
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// How long `action` plays for, in milliseconds
    pub fn action_duration_ms(&self, action: &str) -> f64 {
        self.action_durations
            .get(action)
            .copied()
            .unwrap_or(self.default_action_duration)
            * 1000.0
    }
}
