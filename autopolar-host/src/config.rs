//! Host configuration file
//!
//! ```toml
//! [settings]
//! target_alignment = 0.5
//! resist_direction_change = true
//!
//! [settings.azimuth]
//! backlash = 30.0
//! backlash_calibration = true
//!
//! [simulation]
//! offset_jitter = 2.0
//! ```
//!
//! Every table and key is optional. A missing table takes the preset of
//! [`HostConfig::default`]; missing keys inside a table take the defaults
//! of that table's type.

use std::path::Path;

use anyhow::{Context, Result};
use autopolar_core::Settings;
use autopolar_drivers::RigConfig;
use serde::{Deserialize, Serialize};

/// Alignment settings plus the simulated rig they run against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub settings: Settings,
    pub simulation: RigConfig,
}

/// Settings matched to the default simulated rig
impl Default for HostConfig {
    fn default() -> Self {
        let mut settings = Settings {
            start_aggressiveness: 1.0,
            end_aggressiveness: 0.25,
            target_alignment: 1.0,
            ..Default::default()
        };
        for axis in [&mut settings.altitude, &mut settings.azimuth] {
            axis.backlash = 30.0;
            axis.calibration_distance = 150.0;
        }

        Self {
            settings,
            simulation: RigConfig::default(),
        }
    }
}

impl HostConfig {
    /// Read and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Parse and validate TOML text
    pub fn parse(text: &str) -> Result<Self> {
        let config: HostConfig = toml::from_str(text).context("malformed TOML")?;
        config
            .settings
            .validate()
            .context("alignment settings rejected")?;
        Ok(config)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopolar_core::Vec2;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = HostConfig::parse("").unwrap();
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.settings.validate(), Ok(()));
    }

    #[test]
    fn test_partial_tables() {
        let config = HostConfig::parse(
            r#"
            [settings]
            target_alignment = 0.5
            resist_direction_change = true

            [settings.azimuth]
            backlash = 30.0
            backlash_calibration = true

            [simulation]
            offset_jitter = 2.0
            initial_offset = { x = 10.0, y = -5.0 }
            "#,
        )
        .unwrap();

        assert_eq!(config.settings.target_alignment, 0.5);
        assert!(config.settings.resist_direction_change);
        assert_eq!(config.settings.azimuth.backlash, 30.0);
        assert!(config.settings.azimuth.backlash_calibration);
        // Untouched keys keep their defaults
        assert_eq!(config.settings.azimuth.calibration_distance, 90.0);
        assert_eq!(config.settings.altitude.backlash, 13.0);

        assert_eq!(config.simulation.offset_jitter, 2.0);
        assert_eq!(config.simulation.initial_offset, Vec2::new(10.0, -5.0));
        assert_eq!(config.simulation.move_jitter, RigConfig::default().move_jitter);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let err = HostConfig::parse("[settings]\nsamples_per_measurement = 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("samples per measurement"));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(HostConfig::parse("[settings\n").is_err());
        assert!(HostConfig::parse("[settings]\ntarget_alignment = \"far\"\n").is_err());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = HostConfig::default();
        config.settings.accept_best_effort = true;
        config.simulation.failed_solves = 3;

        let text = config.to_toml().unwrap();
        assert_eq!(HostConfig::parse(&text).unwrap(), config);
    }
}
