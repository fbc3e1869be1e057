use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::TesseraError;

/// Runtime tunables for the viewer. Every field falls back to the value in
/// `constants` when omitted from the RON source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub chunk_size: f32,
    pub visible_radius: u32,
    /// Assets are assumed to exist for x, z in `[-available_radius, available_radius]`.
    pub available_radius: i32,
    pub player_speed: f32,
    pub mouse_sensitivity: f32,
    pub pitch_limit_deg: f32,
    pub fetch_timeout_ms: f64,
    pub retry_delay_ms: f64,
    /// URL prefix prepended to `chunks/{x}_{z}.glb`. Empty means page-relative.
    pub asset_base_url: String,
    pub show_debug_panel: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            visible_radius: VISIBLE_RADIUS,
            available_radius: AVAILABLE_RADIUS,
            player_speed: PLAYER_SPEED,
            mouse_sensitivity: MOUSE_SENSITIVITY,
            pitch_limit_deg: PITCH_LIMIT_RAD.to_degrees(),
            fetch_timeout_ms: FETCH_TIMEOUT_MS,
            retry_delay_ms: RETRY_DELAY_MS,
            asset_base_url: String::new(),
            show_debug_panel: true,
        }
    }
}

impl ViewerConfig {
    /// Parse and validate a config from RON.
    pub fn from_ron_str(ron_str: &str) -> Result<Self, TesseraError> {
        let options = ron::Options::default();
        let config: ViewerConfig = options
            .from_str(ron_str)
            .map_err(|e| TesseraError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TesseraError> {
        if !(self.chunk_size.is_finite() && self.chunk_size > 0.0) {
            return Err(TesseraError::InvalidConfig(format!(
                "chunk_size must be positive, got {}",
                self.chunk_size
            )));
        }
        if self.visible_radius > MAX_VISIBLE_RADIUS {
            return Err(TesseraError::InvalidConfig(format!(
                "visible_radius must be <= {}, got {}",
                MAX_VISIBLE_RADIUS, self.visible_radius
            )));
        }
        if !(0..=MAX_AVAILABLE_RADIUS).contains(&self.available_radius) {
            return Err(TesseraError::InvalidConfig(format!(
                "available_radius must be in [0, {}], got {}",
                MAX_AVAILABLE_RADIUS, self.available_radius
            )));
        }
        if !(0.0..90.0).contains(&self.pitch_limit_deg) {
            return Err(TesseraError::InvalidConfig(format!(
                "pitch_limit_deg must be in [0, 90), got {}",
                self.pitch_limit_deg
            )));
        }
        if self.fetch_timeout_ms <= 0.0 || self.retry_delay_ms < 0.0 {
            return Err(TesseraError::InvalidConfig(
                "fetch_timeout_ms must be positive and retry_delay_ms non-negative".into(),
            ));
        }
        Ok(())
    }

    pub fn pitch_limit_rad(&self) -> f32 {
        self.pitch_limit_deg.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_config_parses() {
        let src = include_str!("../../../config/viewer.ron");
        let config = ViewerConfig::from_ron_str(src).expect("bundled config should parse");
        assert_eq!(config.chunk_size, 1500.0);
        assert_eq!(config.visible_radius, 2);
        assert_eq!(config.available_radius, 2);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = ViewerConfig::from_ron_str("(visible_radius: 3)").expect("parse");
        assert_eq!(config.visible_radius, 3);
        assert_eq!(config.chunk_size, CHUNK_SIZE);
        assert_eq!(config.player_speed, PLAYER_SPEED);
        assert!((config.pitch_limit_rad() - PITCH_LIMIT_RAD).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            ViewerConfig::from_ron_str("(chunk_size: 0.0)"),
            Err(TesseraError::InvalidConfig(_))
        ));
        assert!(matches!(
            ViewerConfig::from_ron_str("(pitch_limit_deg: 95.0)"),
            Err(TesseraError::InvalidConfig(_))
        ));
        assert!(matches!(
            ViewerConfig::from_ron_str("(chunk_size: \"big\")"),
            Err(TesseraError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_radius_caps() {
        let at_cap = format!("(visible_radius: {MAX_VISIBLE_RADIUS})");
        assert!(ViewerConfig::from_ron_str(&at_cap).is_ok());
        assert!(matches!(
            ViewerConfig::from_ron_str("(visible_radius: 4294967295)"),
            Err(TesseraError::InvalidConfig(_))
        ));
        assert!(matches!(
            ViewerConfig::from_ron_str("(available_radius: 2147483647)"),
            Err(TesseraError::InvalidConfig(_))
        ));
        assert!(matches!(
            ViewerConfig::from_ron_str("(available_radius: -1)"),
            Err(TesseraError::InvalidConfig(_))
        ));
    }
}
