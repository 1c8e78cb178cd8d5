//! Configuration settings for Klipp.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub download: DownloadSettings,
    pub encode: EncodeSettings,
    pub transcript: TranscriptSettings,
    pub bundle: BundleSettings,
    pub server: ServerSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data (cached videos, clips, bundles).
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.klipp".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Source video download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// yt-dlp format selector for the full source video.
    pub format: String,
    /// yt-dlp format sort order.
    pub format_sort: String,
    /// Optional cookies file passed to yt-dlp (for age/region restricted videos).
    pub cookies_file: Option<String>,
    /// Maximum time a single download may take, in seconds.
    pub timeout_seconds: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            format: "bestvideo[ext=mp4][height<=1080][fps<=60]+bestaudio[ext=m4a]/best".to_string(),
            format_sort: "res:1080,fps:60".to_string(),
            cookies_file: None,
            timeout_seconds: 1800,
        }
    }
}

/// Re-encoding settings shared by cache population and clip extraction.
///
/// The defaults favor encode speed over file size: cached sources and clips
/// are working material, not final deliverables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeSettings {
    /// Video codec.
    pub video_codec: String,
    /// Audio codec.
    pub audio_codec: String,
    /// Audio bitrate.
    pub audio_bitrate: String,
    /// x264 encode preset.
    pub preset: String,
    /// Maximum time a single ffmpeg invocation may take, in seconds.
    pub timeout_seconds: u64,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            preset: "ultrafast".to_string(),
            timeout_seconds: 900,
        }
    }
}

/// Transcript fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Preferred caption language.
    pub language: String,
    /// Maximum time a transcript fetch may take, in seconds.
    pub timeout_seconds: u64,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Bundle lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleSettings {
    /// Seconds a bundle archive lives before the deferred deletion task removes it.
    pub expiry_seconds: u64,
}

impl Default for BundleSettings {
    fn default() -> Self {
        Self { expiry_seconds: 5 }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::KlippError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("klipp")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Directory holding cached full source videos, one per video id.
    pub fn videos_dir(&self) -> PathBuf {
        self.data_dir().join("media").join("videos")
    }

    /// Root directory for extracted clips, keyed by video id.
    pub fn clips_root(&self) -> PathBuf {
        self.data_dir().join("media").join("clips")
    }

    /// Directory holding transient bundle archives.
    pub fn bundles_dir(&self) -> PathBuf {
        self.data_dir().join("media").join("bundles")
    }

    /// Expanded cookies file path, if configured and present on disk.
    pub fn cookies_file(&self) -> Option<PathBuf> {
        self.download
            .cookies_file
            .as_deref()
            .map(Self::expand_path)
            .filter(|p| p.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_round_trip() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.encode.preset, "ultrafast");
        assert_eq!(parsed.bundle.expiry_seconds, 5);
    }

    #[test]
    fn partial_config_uses_section_defaults() {
        let parsed: Settings = toml::from_str("[bundle]\nexpiry_seconds = 30\n").unwrap();
        assert_eq!(parsed.bundle.expiry_seconds, 30);
        assert_eq!(parsed.encode.video_codec, "libx264");
        assert_eq!(parsed.transcript.language, "en");
    }

    #[test]
    fn storage_roots_derive_from_data_dir() {
        let mut settings = Settings::default();
        settings.general.data_dir = "/tmp/klipp-test".to_string();
        assert_eq!(
            settings.videos_dir(),
            PathBuf::from("/tmp/klipp-test/media/videos")
        );
        assert_eq!(
            settings.clips_root(),
            PathBuf::from("/tmp/klipp-test/media/clips")
        );
        assert_eq!(
            settings.bundles_dir(),
            PathBuf::from("/tmp/klipp-test/media/bundles")
        );
    }
}
