//! Fixed-order playback heuristics.

use super::types::{ChannelSelector, Observation, PageSnapshot, TransportEvent};

/// Derive what is playing from the latest snapshot and the transport event
/// that triggered this evaluation, if any.
///
/// Sources are checked in order: the live channel indicator, then the
/// same-origin embedded player, then a forwarded play event from an
/// embedded frame. Anything ambiguous reads as nothing playing.
pub fn evaluate(page: &PageSnapshot, trigger: Option<TransportEvent>) -> Observation {
    if let Some(live) = page.live_channel.as_ref().filter(|live| live.playing) {
        let n = if live.channel_two { 2 } else { 1 };
        return Observation {
            show_name: live.heading.clone(),
            channel: Some(ChannelSelector::Live(n)),
        };
    }

    let archive = Observation {
        show_name: page.expanded_episode_heading.clone(),
        channel: Some(ChannelSelector::Archive),
    };

    if let Some(player) = page.embedded_player.as_ref().filter(|p| !p.hidden) {
        if !player.paused {
            return archive;
        }
    }

    match trigger {
        Some(TransportEvent::Play) => archive,
        Some(TransportEvent::Pause) | None => Observation::nothing(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::types::{EmbeddedPlayer, LiveChannel};

    fn live(channel_two: bool, heading: &str) -> PageSnapshot {
        PageSnapshot {
            live_channel: Some(LiveChannel {
                playing: true,
                channel_two,
                heading: Some(heading.into()),
            }),
            ..Default::default()
        }
    }

    fn archive(hidden: bool, paused: bool) -> PageSnapshot {
        PageSnapshot {
            embedded_player: Some(EmbeddedPlayer { hidden, paused }),
            expanded_episode_heading: Some("Sunday Special".into()),
            ..Default::default()
        }
    }

    #[test]
    fn playing_live_channel_one() {
        let obs = evaluate(&live(false, "Evening Mix"), None);
        assert_eq!(obs.show_name.as_deref(), Some("Evening Mix"));
        assert_eq!(obs.channel, Some(ChannelSelector::Live(1)));
    }

    #[test]
    fn channel_two_marker() {
        let obs = evaluate(&live(true, "Late Show"), None);
        assert_eq!(obs.channel, Some(ChannelSelector::Live(2)));
        assert_eq!(obs.channel.unwrap().label(), "Channel 2");
    }

    #[test]
    fn live_indicator_gone_is_nothing() {
        assert_eq!(
            evaluate(&PageSnapshot::default(), None),
            Observation::nothing()
        );
    }

    #[test]
    fn live_channel_not_playing_falls_through() {
        let mut page = archive(false, false);
        page.live_channel = Some(LiveChannel {
            playing: false,
            channel_two: false,
            heading: Some("Idle".into()),
        });
        assert_eq!(evaluate(&page, None).channel, Some(ChannelSelector::Archive));
    }

    #[test]
    fn live_wins_over_archive() {
        let mut page = archive(false, false);
        page.live_channel = live(false, "Evening Mix").live_channel;
        assert_eq!(evaluate(&page, None).channel, Some(ChannelSelector::Live(1)));
    }

    #[test]
    fn unpaused_embedded_player_is_archive() {
        let obs = evaluate(&archive(false, false), None);
        assert_eq!(obs.show_name.as_deref(), Some("Sunday Special"));
        assert_eq!(obs.channel, Some(ChannelSelector::Archive));
        assert_eq!(obs.channel.unwrap().label(), "Archive");
    }

    #[test]
    fn paused_embedded_player_needs_a_play_event() {
        assert!(!evaluate(&archive(false, true), None).is_playing());
        assert!(!evaluate(&archive(false, true), Some(TransportEvent::Pause)).is_playing());

        let obs = evaluate(&archive(false, true), Some(TransportEvent::Play));
        assert_eq!(obs.show_name.as_deref(), Some("Sunday Special"));
        assert_eq!(obs.channel, Some(ChannelSelector::Archive));
    }

    #[test]
    fn hidden_embedded_player_is_ignored() {
        assert!(!evaluate(&archive(true, false), None).is_playing());
    }

    #[test]
    fn frame_play_without_any_player() {
        let page = PageSnapshot {
            expanded_episode_heading: Some("Guest Mix".into()),
            ..Default::default()
        };
        let obs = evaluate(&page, Some(TransportEvent::Play));
        assert_eq!(obs.show_name.as_deref(), Some("Guest Mix"));
        assert_eq!(obs.channel, Some(ChannelSelector::Archive));
        assert!(!evaluate(&page, Some(TransportEvent::Pause)).is_playing());
    }

    #[test]
    fn snapshot_parses_from_content_script_json() {
        let page: PageSnapshot = serde_json::from_str(
            r#"{"live_channel":{"playing":true,"channel_two":true,"heading":"Late Show"}}"#,
        )
        .unwrap();
        assert_eq!(
            evaluate(&page, None).channel,
            Some(ChannelSelector::Live(2))
        );
    }
}
