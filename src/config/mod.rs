//! Configuration module for Klipp.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    BundleSettings, DownloadSettings, EncodeSettings, GeneralSettings, ServerSettings, Settings,
    TranscriptSettings,
};
