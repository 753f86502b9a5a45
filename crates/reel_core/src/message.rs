//! Event Types for Thread Communication
//!
//! Events flow from the player and the audio thread to the UI thread over a
//! bounded crossbeam channel. Senders use `try_send`, so a full channel drops
//! the event instead of blocking audio.

use serde::{Deserialize, Serialize};

/// Events sent from the playback engine to the UI thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// A track was opened and its pipeline installed
    TrackLoaded {
        sample_rate: u32,
        channels: u16,
        duration_secs: f64,
    },

    /// Playback started or resumed
    Playing,

    /// Playback paused
    Paused,

    /// Playback stopped and the pipeline released
    Stopped,

    /// The decoded stream ran out (sent from the audio thread)
    TrackFinished,

    /// Seek applied; position after clamping
    SeekCompleted { position_secs: f64 },

    /// Error occurred
    Error { message: String },
}

impl Event {
    /// Create an error event from any error type
    pub fn error<E: std::fmt::Display>(err: E) -> Self {
        Event::Error {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = Event::TrackLoaded {
            sample_rate: 44100,
            channels: 2,
            duration_secs: 12.5,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("TrackLoaded"));
        assert!(json.contains("payload"));

        let deserialized: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[test]
    fn test_unit_variant_serialization() {
        let json = serde_json::to_string(&Event::TrackFinished).unwrap();
        assert_eq!(json, r#"{"type":"TrackFinished"}"#);
    }

    #[test]
    fn test_error_event() {
        let event = Event::error("Test error message");
        if let Event::Error { message } = event {
            assert_eq!(message, "Test error message");
        } else {
            panic!("Should be Error variant");
        }
    }
}
