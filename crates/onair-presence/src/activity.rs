//! The "now playing" activity and its change detection.

use onair_config::{ButtonConfig, PresenceConfig};
use serde::{Deserialize, Serialize};

use crate::observer::Observation;

/// Activity type; the gateway shows `Listening` as "Listening to <name>".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ActivityKind {
    Playing,
    Streaming,
    Listening,
    Watching,
    Competing,
}

impl From<ActivityKind> for u8 {
    fn from(kind: ActivityKind) -> Self {
        match kind {
            ActivityKind::Playing => 0,
            ActivityKind::Streaming => 1,
            ActivityKind::Listening => 2,
            ActivityKind::Watching => 3,
            ActivityKind::Competing => 5,
        }
    }
}

impl TryFrom<u8> for ActivityKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Playing),
            1 => Ok(Self::Streaming),
            2 => Ok(Self::Listening),
            3 => Ok(Self::Watching),
            5 => Ok(Self::Competing),
            other => Err(format!("unknown activity type {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTimestamps {
    /// Epoch milliseconds.
    pub start: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityAssets {
    pub large_image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityButton {
    pub label: String,
    pub url: String,
}

impl From<&ButtonConfig> for ActivityButton {
    fn from(button: &ButtonConfig) -> Self {
        Self {
            label: button.label.clone(),
            url: button.url.clone(),
        }
    }
}

/// A published presence. Never mutated; a new value replaces the old one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub timestamps: ActivityTimestamps,
    pub assets: ActivityAssets,
    pub application_id: String,
    /// Show name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Channel label.
    pub state: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<ActivityButton>,
}

impl Activity {
    /// The fields that make two activities "the same presence".
    /// `timestamps.start` is left out so page churn does not reset the
    /// elapsed-time display.
    pub fn presence_key(&self) -> (Option<&str>, &str) {
        (self.details.as_deref(), self.state.as_str())
    }
}

/// Whether publishing `next` would change what is shown.
pub fn presence_changed(previous: Option<&Activity>, next: Option<&Activity>) -> bool {
    previous.map(Activity::presence_key) != next.map(Activity::presence_key)
}

/// The configured, observation-independent part of every activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityTemplate {
    pub name: String,
    pub application_id: String,
    pub large_image: String,
    pub buttons: Vec<ActivityButton>,
}

impl ActivityTemplate {
    pub fn from_config(config: &PresenceConfig) -> Self {
        Self {
            name: config.activity_name.clone(),
            application_id: config.application_id.clone(),
            large_image: config.image_asset_id.clone(),
            buttons: config.buttons.iter().map(ActivityButton::from).collect(),
        }
    }

    /// Build the activity for an observation, or `None` when nothing plays.
    pub fn activity_for(&self, observation: &Observation) -> Option<Activity> {
        let channel = observation.channel?;
        Some(Activity {
            name: self.name.clone(),
            kind: ActivityKind::Listening,
            timestamps: ActivityTimestamps {
                start: chrono::Utc::now().timestamp_millis(),
            },
            assets: ActivityAssets {
                large_image: self.large_image.clone(),
            },
            application_id: self.application_id.clone(),
            details: observation.show_name.clone(),
            state: channel.label(),
            buttons: self.buttons.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::ChannelSelector;
    use serde_json::json;

    fn template() -> ActivityTemplate {
        ActivityTemplate {
            name: "NTS Radio".into(),
            application_id: "1234".into(),
            large_image: "5678".into(),
            buttons: Vec::new(),
        }
    }

    fn live(show: &str, n: u8) -> Observation {
        Observation {
            show_name: Some(show.into()),
            channel: Some(ChannelSelector::Live(n)),
        }
    }

    #[test]
    fn live_observation_becomes_listening_activity() {
        let activity = template().activity_for(&live("Evening Mix", 1)).unwrap();
        assert_eq!(activity.kind, ActivityKind::Listening);
        assert_eq!(activity.details.as_deref(), Some("Evening Mix"));
        assert_eq!(activity.state, "Channel 1");
        assert_eq!(activity.assets.large_image, "5678");
        assert!(activity.timestamps.start > 0);
    }

    #[test]
    fn nothing_playing_has_no_activity() {
        assert!(template().activity_for(&Observation::nothing()).is_none());
    }

    #[test]
    fn wire_shape() {
        let mut activity = template().activity_for(&live("Show", 2)).unwrap();
        activity.timestamps.start = 1_000;
        assert_eq!(
            serde_json::to_value(&activity).unwrap(),
            json!({
                "name": "NTS Radio",
                "type": 2,
                "timestamps": {"start": 1000},
                "assets": {"large_image": "5678"},
                "application_id": "1234",
                "details": "Show",
                "state": "Channel 2",
            })
        );
    }

    #[test]
    fn buttons_are_serialized_when_configured() {
        let mut template = template();
        template.buttons.push(ActivityButton {
            label: "Listen".into(),
            url: "https://www.nts.live".into(),
        });
        let activity = template.activity_for(&live("Show", 1)).unwrap();
        let value = serde_json::to_value(&activity).unwrap();
        assert_eq!(value["buttons"][0]["label"], "Listen");
    }

    #[test]
    fn start_time_does_not_count_as_a_change() {
        let a = template().activity_for(&live("Show", 1)).unwrap();
        let mut b = a.clone();
        b.timestamps.start += 60_000;
        assert!(!presence_changed(Some(&a), Some(&b)));
    }

    #[test]
    fn details_state_and_presence_count_as_changes() {
        let a = template().activity_for(&live("Show", 1)).unwrap();
        let other_show = template().activity_for(&live("Other", 1)).unwrap();
        let other_channel = template().activity_for(&live("Show", 2)).unwrap();
        assert!(presence_changed(Some(&a), Some(&other_show)));
        assert!(presence_changed(Some(&a), Some(&other_channel)));
        assert!(presence_changed(Some(&a), None));
        assert!(presence_changed(None, Some(&a)));
        assert!(!presence_changed(None, None));
    }

    #[test]
    fn kind_rejects_unknown_values() {
        assert!(serde_json::from_value::<ActivityKind>(json!(4)).is_err());
        assert_eq!(
            serde_json::from_value::<ActivityKind>(json!(2)).unwrap(),
            ActivityKind::Listening
        );
    }
}
