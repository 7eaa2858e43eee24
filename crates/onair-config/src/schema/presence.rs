//! Presence payload and playback observation settings.

use serde::{Deserialize, Serialize};

/// A link button shown under the activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonConfig {
    pub label: String,
    pub url: String,
}

/// Presence activity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    pub enabled: bool,
    /// Application the activity is published under; also the OAuth client id.
    pub application_id: String,
    /// Asset id of the large image shown next to the activity.
    pub image_asset_id: String,
    /// Activity name shown as "Listening to <name>".
    pub activity_name: String,
    pub buttons: Vec<ButtonConfig>,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            application_id: String::new(),
            image_asset_id: String::new(),
            activity_name: "NTS Radio".into(),
            buttons: Vec::new(),
        }
    }
}

/// Playback observation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Quiet period before a burst of page mutations is evaluated (valid range: 50-10000).
    pub debounce_ms: u64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self { debounce_ms: 1_000 }
    }
}
