//! Typed hub configuration
//!
//! Loaded once at startup from a TOML file; a missing file falls back to
//! defaults, a malformed one is a startup error. Every section and field
//! has a default so partial files work.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{HubError, HubResult};

/// Top-level hub configuration
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub network: NetworkConfig,
    pub volume: VolumeConfig,
    pub broadcast: BroadcastConfig,
    pub system: SystemConfig,
    pub advanced: AdvancedConfig,
    pub persistence: PersistenceConfig,
}

impl HubConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file is not an error: the hub runs on defaults, as the
    /// expected deployment is a single box with everything on one subnet.
    pub fn load(path: impl AsRef<Path>) -> HubResult<Self> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
                return Ok(HubConfig::default());
            }
            Err(e) => return Err(HubError::Config(format!("{}: {}", path.display(), e))),
        };

        let config: HubConfig = toml::from_str(&raw)
            .map_err(|e| HubError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Check cross-field invariants that deserialization cannot express.
    ///
    /// A config that passes here cannot drive the volume model or the
    /// staleness filter into a degenerate state at packet time; bad files
    /// fail at startup instead.
    pub fn validate(&self) -> HubResult<()> {
        let v = &self.volume;
        if v.min_volume > v.max_volume {
            return Err(HubError::Config(format!(
                "min_volume {} exceeds max_volume {}",
                v.min_volume, v.max_volume
            )));
        }
        if v.near_distance_m > v.far_distance_m {
            return Err(HubError::Config(format!(
                "near_distance_m {} exceeds far_distance_m {}",
                v.near_distance_m, v.far_distance_m
            )));
        }
        if v.far_distance_m > v.cutoff_distance_m {
            return Err(HubError::Config(format!(
                "far_distance_m {} exceeds cutoff_distance_m {}",
                v.far_distance_m, v.cutoff_distance_m
            )));
        }
        if !(0.0..=1.0).contains(&v.quality_threshold) {
            return Err(HubError::Config(format!(
                "quality_threshold {} outside [0, 1]",
                v.quality_threshold
            )));
        }
        if !self.system.stale_timeout_s.is_finite() || self.system.stale_timeout_s < 0.0 {
            return Err(HubError::Config(format!(
                "stale_timeout_s {} is not a non-negative duration",
                self.system.stale_timeout_s
            )));
        }
        Ok(())
    }
}

/// Socket addressing for the datagram listener
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub udp_bind_address: String,
    pub udp_listen_port: u16,
}

impl NetworkConfig {
    pub fn udp_addr(&self) -> String {
        format!("{}:{}", self.udp_bind_address, self.udp_listen_port)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            udp_bind_address: "0.0.0.0".to_string(),
            udp_listen_port: 9999,
        }
    }
}

/// Distance-to-volume model constants
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Within this distance, volume is max
    pub near_distance_m: f64,
    /// Beyond this distance, volume is min
    pub far_distance_m: f64,
    /// At or beyond this distance, volume is hard zero
    pub cutoff_distance_m: f64,
    pub min_volume: f64,
    pub max_volume: f64,
    pub curve_type: Curve,
    pub apply_quality_weighting: bool,
    /// Below this quality, the reading is treated as silence
    pub quality_threshold: f64,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        VolumeConfig {
            near_distance_m: 1.5,
            far_distance_m: 4.0,
            cutoff_distance_m: 5.0,
            min_volume: 0.0,
            max_volume: 1.0,
            curve_type: Curve::InverseSquare,
            apply_quality_weighting: true,
            quality_threshold: 0.5,
        }
    }
}

/// Interpolation curve between near and far distance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    Linear,
    InverseSquare,
    Logarithmic,
    /// Unrecognized curve names land here and evaluate as linear
    #[serde(other)]
    Unknown,
}

/// Snapshot push cadence
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    pub interval_ms: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        BroadcastConfig { interval_ms: 500 }
    }
}

/// Staleness and socket tuning
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Pairs older than this are excluded from snapshots
    pub stale_timeout_s: f64,
    pub udp_buffer_size: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            stale_timeout_s: 5.0,
            udp_buffer_size: 1024,
        }
    }
}

/// Validation and dedup policy
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AdvancedConfig {
    /// Require all wire fields to be present (lenient mode substitutes
    /// out-of-range defaults, which still reject)
    pub strict_validation: bool,
    pub deduplicate_packets: bool,
    pub dedup_window_ms: u64,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        AdvancedConfig {
            strict_validation: true,
            deduplicate_packets: true,
            dedup_window_ms: 1000,
        }
    }
}

/// Measurement history persistence
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub csv_export_enabled: bool,
    pub csv_export_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        PersistenceConfig {
            csv_export_enabled: true,
            csv_export_path: PathBuf::from("./data/ranging_data.csv"),
        }
    }
}
