use crate::morse::TimingProfile;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const MIN_WPM: f32 = 5.0;
pub const MAX_WPM: f32 = 40.0;
pub const MIN_FREQUENCY_HZ: f32 = 400.0;
pub const MAX_FREQUENCY_HZ: f32 = 1000.0;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub character_wpm: f32,
    pub effective_wpm: f32,
    pub farnsworth_enabled: bool,
    pub tone_frequency_hz: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            character_wpm: 20.0,
            effective_wpm: 10.0,
            farnsworth_enabled: false,
            tone_frequency_hz: 750.0,
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("dotdash");
            path.push("settings.json");
            path
        })
    }

    /// Load settings from disk, or return defaults if not found. Values
    /// are clamped on load so a hand-edited file cannot produce silly
    /// timings.
    pub fn load() -> Self {
        let path = match Self::config_path() {
            Some(p) => p,
            None => {
                eprintln!("[settings] Could not determine config path");
                return Self::default();
            }
        };

        if !path.exists() {
            return Self::default();
        }

        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("[settings] Failed to read config file: {}", e);
                return Self::default();
            }
        };

        match serde_json::from_str::<Settings>(&contents) {
            Ok(settings) => settings.clamped(),
            Err(e) => {
                eprintln!("[settings] Failed to parse config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<(), String> {
        use std::io::Write;

        let path = Self::config_path().ok_or("Could not determine config directory")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("Failed to create config dir: {}", e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        // Write with explicit sync to ensure data reaches disk
        let mut file = fs::File::create(&path)
            .map_err(|e| format!("Failed to create config file: {}", e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| format!("Failed to write config file: {}", e))?;
        file.sync_all()
            .map_err(|e| format!("Failed to sync config file: {}", e))?;

        eprintln!("[settings] Saved settings to {:?}", path);
        Ok(())
    }

    /// Clamp every field to its allowed range. The effective speed can
    /// never reach the character speed; at the bottom of the range the
    /// two collapse and Farnsworth becomes a no-op.
    pub fn clamped(mut self) -> Self {
        self.character_wpm = self.character_wpm.clamp(MIN_WPM, MAX_WPM);
        self.effective_wpm = self
            .effective_wpm
            .clamp(2.0, (self.character_wpm - 1.0).max(2.0));
        self.tone_frequency_hz = self
            .tone_frequency_hz
            .clamp(MIN_FREQUENCY_HZ, MAX_FREQUENCY_HZ);
        self
    }

    pub fn timing_profile(&self) -> TimingProfile {
        TimingProfile {
            character_wpm: self.character_wpm,
            effective_wpm: self.effective_wpm,
            farnsworth_enabled: self.farnsworth_enabled,
            tone_frequency_hz: self.tone_frequency_hz,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_expected_values() {
        let settings = Settings::default();
        assert_eq!(settings.character_wpm, 20.0);
        assert_eq!(settings.effective_wpm, 10.0);
        assert!(!settings.farnsworth_enabled);
        assert_eq!(settings.tone_frequency_hz, 750.0);
    }

    #[test]
    fn clamping_bounds_each_field() {
        let settings = Settings {
            character_wpm: 99.0,
            effective_wpm: 99.0,
            farnsworth_enabled: true,
            tone_frequency_hz: 50.0,
        }
        .clamped();

        assert_eq!(settings.character_wpm, 40.0);
        assert_eq!(settings.effective_wpm, 39.0);
        assert_eq!(settings.tone_frequency_hz, 400.0);
    }

    #[test]
    fn effective_wpm_stays_below_character_wpm() {
        let settings = Settings {
            character_wpm: 5.0,
            effective_wpm: 30.0,
            ..Settings::default()
        }
        .clamped();

        assert_eq!(settings.character_wpm, 5.0);
        assert_eq!(settings.effective_wpm, 4.0);
    }

    #[test]
    fn timing_profile_carries_settings_over() {
        let settings = Settings {
            character_wpm: 25.0,
            effective_wpm: 12.0,
            farnsworth_enabled: true,
            tone_frequency_hz: 600.0,
        };
        let profile = settings.timing_profile();
        assert_eq!(profile.character_wpm, 25.0);
        assert_eq!(profile.effective_wpm, 12.0);
        assert!(profile.farnsworth_enabled);
        assert_eq!(profile.tone_frequency_hz, 600.0);
    }
}
