//! One radio player: its media element, analyzer, visualizer, metadata
//! watcher and view, plus the per-player state the coordinator drives.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use radio_proto::config::{Config, PlayerConfig};
use radio_proto::protocol::{Gradient, PlayIcon, PlaybackState, PlayerId, PlayerSnapshot};
use tracing::{debug, warn};

use crate::analyzer::{AudioAnalyzer, AudioBackend};
use crate::error::{DeckError, PlaybackError, Result};
use crate::media::MediaElement;
use crate::metadata::{EventSink, MetadataSource, MetadataWatcher, TrackTracker};
use crate::view::PlayerView;
use crate::visualizer::{SharedAnalyzer, SharedSurface, VisualizerRenderer};
use crate::volume;

/// Platform objects a player is bound to. Any of them may be missing when
/// setup could not find it; such a player is not built.
#[derive(Default)]
pub struct PlayerWiring {
    pub media: Option<Arc<dyn MediaElement>>,
    pub surface: Option<SharedSurface>,
    pub view: Option<Box<dyn PlayerView>>,
}

/// Shared collaborators and settings for building players.
#[derive(Clone)]
pub struct DeckContext {
    pub backend: Arc<dyn AudioBackend>,
    pub client: reqwest::Client,
    pub frame_interval: Duration,
    pub default_poll_interval: Duration,
}

impl DeckContext {
    pub fn from_config(
        config: &Config,
        backend: Arc<dyn AudioBackend>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            backend,
            client,
            frame_interval: Duration::from_millis(config.visualizer.frame_interval_ms.max(1)),
            default_poll_interval: Duration::from_millis(
                config.metadata.default_poll_interval_ms.max(1),
            ),
        }
    }
}

pub struct PlayerInstance {
    id: PlayerId,
    stream_url: String,
    default_artwork_url: String,
    bar_color: String,
    ambient_gradient: Option<Gradient>,

    media: Arc<dyn MediaElement>,
    surface: SharedSurface,
    view: Box<dyn PlayerView>,
    analyzer: SharedAnalyzer,
    renderer: VisualizerRenderer,
    watcher: MetadataWatcher,

    state: PlaybackState,
    session: u64,
    tracker: TrackTracker,
    artwork_url: String,
}

impl PlayerInstance {
    /// Build a player from its config and the objects it is bound to.
    pub fn build(config: &PlayerConfig, wiring: PlayerWiring, ctx: &DeckContext) -> Result<Self> {
        let missing = |what| DeckError::MissingWiring {
            id: config.id.clone(),
            what,
        };
        if config.stream_url.trim().is_empty() {
            return Err(missing("a stream URL"));
        }
        let media = wiring.media.ok_or_else(|| missing("a media element"))?;
        let surface = wiring.surface.ok_or_else(|| missing("a visualizer surface"))?;
        let mut view = wiring.view.ok_or_else(|| missing("a view"))?;

        let source = config
            .metadata
            .as_ref()
            .map(|m| MetadataSource::from_config(m, ctx.default_poll_interval));
        if source.is_none() {
            warn!("player {}: no metadata endpoint, titles stay empty", config.id);
        }

        view.render_icon(PlayIcon::Play);
        view.render_artwork(&config.default_artwork_url);
        view.render_volume(volume::read_view(media.as_ref()));

        Ok(Self {
            id: config.id.clone(),
            stream_url: config.stream_url.clone(),
            default_artwork_url: config.default_artwork_url.clone(),
            bar_color: config.bar_color.clone(),
            ambient_gradient: config.ambient_gradient.clone(),
            media,
            surface,
            view,
            analyzer: Arc::new(Mutex::new(AudioAnalyzer::new(ctx.backend.clone()))),
            renderer: VisualizerRenderer::new(ctx.frame_interval),
            watcher: MetadataWatcher::new(source, ctx.client.clone()),
            state: PlaybackState::Idle,
            session: 0,
            tracker: TrackTracker::new(),
            artwork_url: config.default_artwork_url.clone(),
        })
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }

    pub fn default_artwork_url(&self) -> &str {
        &self.default_artwork_url
    }

    pub fn ambient_gradient(&self) -> Option<&Gradient> {
        self.ambient_gradient.as_ref()
    }

    pub fn title(&self) -> &str {
        self.tracker.current()
    }

    pub fn artwork_url(&self) -> &str {
        &self.artwork_url
    }

    /// Tag of the current playing session; bumped on every successful play.
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn media(&self) -> &Arc<dyn MediaElement> {
        &self.media
    }

    pub fn is_visualizing(&self) -> bool {
        self.renderer.is_running()
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_subscribed()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id.clone(),
            state: self.state,
            title: self.tracker.current().to_string(),
            artwork_url: self.artwork_url.clone(),
            bound_source: self.media.source(),
            volume: volume::read_view(self.media.as_ref()),
        }
    }

    /// Rebind and reload the configured stream if something else (or
    /// nothing) is bound.
    pub(crate) fn ensure_source(&self) {
        if self.media.source().as_deref() != Some(self.stream_url.as_str()) {
            debug!("player {}: binding {}", self.id, self.stream_url);
            self.media.set_source(Some(&self.stream_url));
            self.media.load();
        }
    }

    /// Bind or resume the analyzer. Failure only costs the visualization.
    pub(crate) fn attach_analyzer(&self) {
        let Ok(mut analyzer) = self.analyzer.lock() else {
            return;
        };
        if let Err(e) = analyzer.attach(self.media.as_ref()) {
            debug!("player {}: playing without analyzer: {}", self.id, e);
        }
    }

    pub(crate) fn start_media(&self) -> std::result::Result<(), PlaybackError> {
        self.media.play()
    }

    /// Enter Playing after the media has started. Returns the new session.
    pub(crate) fn enter_playing(&mut self, loading_text: &str) -> u64 {
        self.state = PlaybackState::Playing;
        self.session += 1;
        self.view.render_icon(PlayIcon::Pause);
        if self.tracker.current().is_empty() {
            self.view.render_title(loading_text);
        }
        self.renderer.start(
            self.analyzer.clone(),
            self.surface.clone(),
            self.bar_color.clone(),
            self.media.clone(),
        );
        self.session
    }

    pub(crate) fn watch_metadata(&mut self, sink: EventSink) {
        self.watcher.subscribe(sink);
    }

    pub(crate) fn show_play_icon(&mut self) {
        self.view.render_icon(PlayIcon::Play);
    }

    /// Stop the frame loop and the metadata subscription.
    pub(crate) fn teardown(&mut self) {
        self.renderer.stop();
        self.watcher.unsubscribe();
    }

    /// Record a pause that already happened on the media element.
    pub(crate) fn enter_paused(&mut self) {
        self.teardown();
        self.state = PlaybackState::Paused;
        self.view.render_icon(PlayIcon::Play);
    }

    /// Silence this player and release its stream so it stops buffering.
    pub(crate) fn force_stop(&mut self) {
        self.media.pause();
        self.media.set_source(None);
        self.media.load();
        self.enter_paused();
    }

    /// Apply a title candidate. On a change the title is rendered and
    /// returned.
    pub(crate) fn accept_title(&mut self, candidate: &str) -> Option<String> {
        let title = self.tracker.accept(candidate)?.to_string();
        self.view.render_title(&title);
        Some(title)
    }

    pub(crate) fn show_artwork(&mut self, url: &str) {
        self.artwork_url = url.to_string();
        self.view.render_artwork(url);
    }

    pub(crate) fn set_volume(&mut self, slider: u8) {
        volume::apply_slider(self.media.as_ref(), slider);
        self.view.render_volume(volume::read_view(self.media.as_ref()));
    }

    pub(crate) fn toggle_mute(&mut self) {
        volume::toggle_mute(self.media.as_ref());
        self.view.render_volume(volume::read_view(self.media.as_ref()));
    }
}
