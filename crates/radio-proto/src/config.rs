use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::platform;
use super::protocol::{Gradient, PlayerId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub visualizer: VisualizerConfig,
    #[serde(default)]
    pub metadata: MetadataDefaults,
    #[serde(default)]
    pub artwork: ArtworkConfig,
    #[serde(default)]
    pub ambient: AmbientConfig,
    #[serde(default, rename = "player")]
    pub players: Vec<PlayerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_enabled")]
    pub enabled: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizerConfig {
    /// Delay between two visualizer frames.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// Size of each player's bar surface, in pixels.
    #[serde(default = "default_surface_width")]
    pub width: u32,
    #[serde(default = "default_surface_height")]
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataDefaults {
    /// Poll interval used when a poll-strategy player does not set its own.
    #[serde(default = "default_poll_interval_ms")]
    pub default_poll_interval_ms: u64,
    /// Shown while playing before the first title arrives.
    #[serde(default = "default_loading_text")]
    pub loading_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtworkConfig {
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Size token in the provider's thumbnail URL...
    #[serde(default = "default_upscale_from")]
    pub upscale_from: String,
    /// ...and what it is replaced with.
    #[serde(default = "default_upscale_to")]
    pub upscale_to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbientConfig {
    /// Neutral gradient shown while nothing is playing.
    #[serde(default = "default_gradient")]
    pub default_gradient: Gradient,
}

/// One `[[player]]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerConfig {
    pub id: PlayerId,
    pub stream_url: String,
    pub default_artwork_url: String,
    #[serde(default = "default_bar_color")]
    pub bar_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_gradient: Option<Gradient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataConfig>,
}

/// How a player learns about the current track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// Server-sent events; each message is a JSON object carrying the title.
    Push {
        endpoint: String,
        #[serde(default = "default_push_title_field")]
        title_field: String,
    },
    /// Periodic GET of a JSON document carrying the title.
    Poll {
        endpoint: String,
        /// Dot-separated path to the title, e.g. `now.title`.
        #[serde(default = "default_poll_title_field")]
        title_field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        poll_interval_ms: Option<u64>,
    },
}

impl MetadataConfig {
    pub fn endpoint(&self) -> &str {
        match self {
            MetadataConfig::Push { endpoint, .. } | MetadataConfig::Poll { endpoint, .. } => {
                endpoint
            }
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_http_enabled(),
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            width: default_surface_width(),
            height: default_surface_height(),
        }
    }
}

impl Default for MetadataDefaults {
    fn default() -> Self {
        Self {
            default_poll_interval_ms: default_poll_interval_ms(),
            loading_text: default_loading_text(),
        }
    }
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            timeout_secs: default_timeout_secs(),
            upscale_from: default_upscale_from(),
            upscale_to: default_upscale_to(),
        }
    }
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            default_gradient: default_gradient(),
        }
    }
}

fn default_http_enabled() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8989
}

fn default_frame_interval_ms() -> u64 {
    16
}

fn default_surface_width() -> u32 {
    320
}

fn default_surface_height() -> u32 {
    80
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_loading_text() -> String {
    "Loading track info…".to_string()
}

fn default_search_url() -> String {
    "https://itunes.apple.com/search".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_upscale_from() -> String {
    "100x100".to_string()
}

fn default_upscale_to() -> String {
    "600x600".to_string()
}

fn default_gradient() -> Gradient {
    Gradient::new("#1b1b1f", "#2b2b33")
}

fn default_bar_color() -> String {
    "#ffffff".to_string()
}

fn default_push_title_field() -> String {
    "streamTitle".to_string()
}

fn default_poll_title_field() -> String {
    "title".to_string()
}

/// The two zeno.fm stations the deck ships with.
fn sample_players() -> Vec<PlayerConfig> {
    vec![
        PlayerConfig {
            id: PlayerId::new("transparencia"),
            stream_url: "https://stream.zeno.fm/a5tnl0xjodbvv".to_string(),
            default_artwork_url: "img/logo.png".to_string(),
            bar_color: "#0077cc".to_string(),
            ambient_gradient: Some(Gradient::new("#0077cc", "#00395f")),
            metadata: Some(MetadataConfig::Push {
                endpoint: "https://api.zeno.fm/mounts/metadata/subscribe/a5tnl0xjodbvv/"
                    .to_string(),
                title_field: default_push_title_field(),
            }),
        },
        PlayerConfig {
            id: PlayerId::new("extasis"),
            stream_url: "https://stream.zeno.fm/xfwg9mmhrd0uv".to_string(),
            default_artwork_url: "img/exlogo.png".to_string(),
            bar_color: "#e4002b".to_string(),
            ambient_gradient: Some(Gradient::new("#e4002b", "#5c0011")),
            metadata: Some(MetadataConfig::Push {
                endpoint: "https://api.zeno.fm/mounts/metadata/subscribe/xfwg9mmhrd0uv/"
                    .to_string(),
                title_field: default_push_title_field(),
            }),
        },
    ]
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load `path`, writing the default config there first if it is missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            visualizer: VisualizerConfig::default(),
            metadata: MetadataDefaults::default(),
            artwork: ArtworkConfig::default(),
            ambient: AmbientConfig::default(),
            players: sample_players(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.http.enabled);
        assert_eq!(config.http.port, 8989);
        assert_eq!(config.http.bind_address, "127.0.0.1");
        assert_eq!(config.visualizer.frame_interval_ms, 16);
        assert_eq!((config.visualizer.width, config.visualizer.height), (320, 80));
        assert_eq!(config.metadata.default_poll_interval_ms, 5000);
        assert_eq!(config.artwork.upscale_from, "100x100");
        assert_eq!(config.artwork.upscale_to, "600x600");
        assert_eq!(config.players.len(), 2);
        assert!(Config::config_path().ends_with("radiodeck/config.toml"));
    }

    #[test]
    fn test_parse_players() {
        let toml = r##"
[http]
port = 9000

[[player]]
id = "a"
stream_url = "https://example.com/a"
default_artwork_url = "img/a.png"
bar_color = "#0077cc"
ambient_gradient = ["#0077cc", "#001122"]
[player.metadata]
strategy = "push"
endpoint = "https://example.com/a/meta"

[[player]]
id = "b"
stream_url = "https://example.com/b"
default_artwork_url = "img/b.png"
[player.metadata]
strategy = "poll"
endpoint = "https://example.com/b/now"
title_field = "now.title"
poll_interval_ms = 4000
"##;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.http.port, 9000);
        assert!(config.http.enabled);
        assert_eq!(config.players.len(), 2);

        let a = &config.players[0];
        assert_eq!(a.id, PlayerId::new("a"));
        assert_eq!(
            a.ambient_gradient,
            Some(Gradient::new("#0077cc", "#001122"))
        );
        assert_eq!(
            a.metadata,
            Some(MetadataConfig::Push {
                endpoint: "https://example.com/a/meta".to_string(),
                title_field: "streamTitle".to_string(),
            })
        );

        let b = &config.players[1];
        assert_eq!(b.bar_color, "#ffffff");
        assert_eq!(b.ambient_gradient, None);
        match &b.metadata {
            Some(MetadataConfig::Poll {
                title_field,
                poll_interval_ms,
                ..
            }) => {
                assert_eq!(title_field, "now.title");
                assert_eq!(*poll_interval_ms, Some(4000));
            }
            other => panic!("expected poll metadata, got {:?}", other),
        }
    }

    #[test]
    fn test_load_writes_default_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let first = Config::load_from(&path).unwrap();
        assert!(path.exists());

        let second = Config::load_from(&path).unwrap();
        assert_eq!(first.players, second.players);
        assert_eq!(
            second.ambient.default_gradient,
            Gradient::new("#1b1b1f", "#2b2b33")
        );
    }
}
