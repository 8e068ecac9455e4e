use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a room.
///
/// `Paused` is a valid stored value kept for forward compatibility, but no
/// current operation produces it: pausing the timer leaves the room `Active`
/// and only toggles the running flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Active,
    Paused,
    Completed,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Active => "active",
            RoomStatus::Paused => "paused",
            RoomStatus::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "waiting" => Some(RoomStatus::Waiting),
            "active" => Some(RoomStatus::Active),
            "paused" => Some(RoomStatus::Paused),
            "completed" => Some(RoomStatus::Completed),
            _ => None,
        }
    }

    /// Completed rooms accept no further mutations.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoomStatus::Completed)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of emotions a participant can signal. Unknown tags are
/// rejected at the API boundary, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Sleepy,
    Thinking,
}

impl Emotion {
    pub const ALL: [Emotion; 5] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Sleepy,
        Emotion::Thinking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Sleepy => "sleepy",
            Emotion::Thinking => "thinking",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "happy" => Some(Emotion::Happy),
            "sad" => Some(Emotion::Sad),
            "angry" => Some(Emotion::Angry),
            "sleepy" => Some(Emotion::Sleepy),
            "thinking" => Some(Emotion::Thinking),
            _ => None,
        }
    }

    /// Emoji rendered by clients for this emotion.
    pub fn emoji(&self) -> &'static str {
        match self {
            Emotion::Happy => "😊",
            Emotion::Sad => "😢",
            Emotion::Angry => "😠",
            Emotion::Sleepy => "😴",
            Emotion::Thinking => "🤔",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format elapsed seconds as zero-padded `MM:SS` with unbounded minutes.
pub fn format_elapsed(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for status in [
            RoomStatus::Waiting,
            RoomStatus::Active,
            RoomStatus::Paused,
            RoomStatus::Completed,
        ] {
            assert_eq!(RoomStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RoomStatus::parse("finished"), None);
        assert!(RoomStatus::Completed.is_terminal());
        assert!(!RoomStatus::Paused.is_terminal());
    }

    #[test]
    fn emotion_round_trips() {
        for emotion in Emotion::ALL {
            assert_eq!(Emotion::parse(emotion.as_str()), Some(emotion));
            assert!(!emotion.emoji().is_empty());
        }
        assert_eq!(Emotion::parse("excited"), None);
        assert_eq!(Emotion::parse("HAPPY"), None);
    }

    #[test]
    fn emotion_serde_uses_lowercase_tags() {
        let json = serde_json::to_string(&Emotion::Thinking).unwrap();
        assert_eq!(json, "\"thinking\"");
        let parsed: Emotion = serde_json::from_str("\"sleepy\"").unwrap();
        assert_eq!(parsed, Emotion::Sleepy);
        assert!(serde_json::from_str::<Emotion>("\"bored\"").is_err());
    }

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(125), "02:05");
        assert_eq!(format_elapsed(59), "00:59");
        // minutes are unbounded, never wrapped at an hour
        assert_eq!(format_elapsed(3725), "62:05");
        assert_eq!(format_elapsed(-3), "00:00");
    }
}
