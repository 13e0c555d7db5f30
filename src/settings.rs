//! Player settings and preferences
//!
//! Persisted separately from the courier profile in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::persistence;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Next preset in the in-game cycle
    pub fn next(self) -> Self {
        match self {
            QualityPreset::Low => QualityPreset::Medium,
            QualityPreset::Medium => QualityPreset::High,
            QualityPreset::High => QualityPreset::Low,
        }
    }

    /// Vehicles spawned for this preset
    pub fn vehicle_count(&self) -> usize {
        match self {
            QualityPreset::Low => 6,
            QualityPreset::Medium => 9,
            QualityPreset::High => 12,
        }
    }

    /// Pedestrians spawned for this preset
    pub fn pedestrian_count(&self) -> usize {
        match self {
            QualityPreset::Low => 4,
            QualityPreset::Medium => 6,
            QualityPreset::High => 8,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Mute when window loses focus
    pub mute_on_blur: bool,
    /// Play positional horns when cars stop for the courier
    pub horn_cues: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            show_fps: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            mute_on_blur: true,
            horn_cues: true,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "city_courier_settings";

    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Scale the traffic population to the quality preset, never above the config's own counts
    pub fn apply_to(&self, config: &mut SimConfig) {
        config.traffic.vehicle_count = config.traffic.vehicle_count.min(self.quality.vehicle_count());
        config.traffic.pedestrian_count = config
            .traffic
            .pedestrian_count
            .min(self.quality.pedestrian_count());
    }

    /// Clamp volumes into range after loading
    fn sanitized(mut self) -> Self {
        let unit = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 1.0 };
        self.master_volume = unit(self.master_volume);
        self.sfx_volume = unit(self.sfx_volume);
        self
    }

    /// Load settings from LocalStorage (defaults when absent)
    pub fn load() -> Self {
        match persistence::load::<Settings>(Self::STORAGE_KEY) {
            Some(settings) => {
                log::info!("Loaded settings from LocalStorage");
                settings.sanitized()
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        match persistence::save(Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(err) => log::warn!("Settings not saved: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_population() {
        assert_eq!(QualityPreset::Low.vehicle_count(), 6);
        assert_eq!(QualityPreset::Low.pedestrian_count(), 4);
        assert_eq!(QualityPreset::Medium.vehicle_count(), 9);
        assert_eq!(QualityPreset::High.pedestrian_count(), 8);
        assert_eq!(QualityPreset::from_str("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
    }

    #[test]
    fn test_quality_cycle_visits_every_preset() {
        let mut preset = QualityPreset::Low;
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(preset.as_str());
            preset = preset.next();
        }
        assert_eq!(seen, vec!["Low", "Medium", "High"]);
        assert_eq!(preset, QualityPreset::Low);
        for name in seen {
            assert!(QualityPreset::from_str(name).is_some());
        }
    }

    #[test]
    fn test_saved_settings_json_restores_preset() {
        let mut settings = Settings::from_preset(QualityPreset::High);
        settings.horn_cues = false;
        let json = persistence::encode(&settings).unwrap();
        let back: Settings = persistence::decode("settings", &json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_apply_to_caps_population() {
        let mut config = SimConfig::default();
        Settings::from_preset(QualityPreset::Low).apply_to(&mut config);
        assert_eq!(config.traffic.vehicle_count, 6);
        assert_eq!(config.traffic.pedestrian_count, 4);
        assert!(config.validate().is_ok());

        let mut small = SimConfig::default();
        small.traffic.vehicle_count = 2;
        Settings::from_preset(QualityPreset::High).apply_to(&mut small);
        assert_eq!(small.traffic.vehicle_count, 2);
    }

    #[test]
    fn test_partial_settings_json() {
        let settings: Settings =
            serde_json::from_str(r#"{ "quality": "High", "master_volume": 7.0 }"#).unwrap();
        let settings = settings.sanitized();
        assert_eq!(settings.quality, QualityPreset::High);
        assert_eq!(settings.master_volume, 1.0);
        assert!(settings.horn_cues);
    }
}
