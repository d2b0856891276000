use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of one player on the deck (e.g. `"transparencia"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Commands the adapter layer (HTTP API, page glue) sends to the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum Command {
    Play { player: PlayerId },
    Pause { player: PlayerId },
    /// The play/pause button: play when not playing, pause otherwise.
    Toggle { player: PlayerId },
    /// Volume slider position, 0–100.
    Volume { player: PlayerId, value: u8 },
    ToggleMute { player: PlayerId },
}

impl Command {
    pub fn player(&self) -> &PlayerId {
        match self {
            Command::Play { player }
            | Command::Pause { player }
            | Command::Toggle { player }
            | Command::Volume { player, .. }
            | Command::ToggleMute { player } => player,
        }
    }
}

/// Playback state of one player.
///
/// Transitions: `Idle -> Playing -> Paused -> Playing -> ...`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// Which icon the play/pause button shows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayIcon {
    /// Stopped or paused: the button offers "play".
    #[default]
    Play,
    /// Playing: the button offers "pause".
    Pause,
}

/// Two-color gradient, serialised as `["#from", "#to"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gradient(pub String, pub String);

impl Gradient {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self(from.into(), to.into())
    }

    pub fn from_color(&self) -> &str {
        &self.0
    }

    pub fn to_color(&self) -> &str {
        &self.1
    }
}

/// One of the two stacked background layers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    A,
    B,
}

impl Layer {
    pub fn other(self) -> Self {
        match self {
            Layer::A => Layer::B,
            Layer::B => Layer::A,
        }
    }
}

/// Mute icon + slider position derived from the media element.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VolumeView {
    pub muted_icon: bool,
    /// Slider position, 0–100.
    pub slider: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmbientSnapshot {
    pub active: Layer,
    pub layer_a: Gradient,
    pub layer_b: Gradient,
    /// 0 or 1; layer A underneath is always opaque.
    pub layer_b_opacity: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub state: PlaybackState,
    pub title: String,
    pub artwork_url: String,
    /// Stream URL currently bound to the media element, if any.
    pub bound_source: Option<String>,
    pub volume: VolumeView,
}

/// Full state of the deck.  `rev` is a monotonically increasing counter
/// incremented every time the state changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeckState {
    #[serde(default)]
    pub rev: u64,
    pub players: Vec<PlayerSnapshot>,
    pub ambient: AmbientSnapshot,
}

impl DeckState {
    pub fn playing(&self) -> impl Iterator<Item = &PlayerSnapshot> {
        self.players
            .iter()
            .filter(|p| p.state == PlaybackState::Playing)
    }
}
