//! In-crate fakes for the platform seams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use radio_proto::config::{ArtworkConfig, PlayerConfig};
use radio_proto::protocol::{Gradient, Layer, PlayIcon, PlayerId, VolumeView};
use tokio::sync::mpsc;

use crate::ambient::{AmbientBackground, AmbientSink};
use crate::analyzer::{AudioBackend, AudioGraph, GraphState};
use crate::artwork::{ArtworkResolver, LookupService, SearchResponse, SearchResult};
use crate::coordinator::{DeckEvent, PlaybackCoordinator};
use crate::error::{AnalyzerError, LookupError, PlaybackError};
use crate::media::{MediaElement, PcmFeed};
use crate::player::{DeckContext, PlayerInstance, PlayerWiring};
use crate::view::PlayerView;
use crate::visualizer::{BarRect, Surface};

// ── Media ─────────────────────────────────────────────────────────────────────

struct MediaState {
    source: Option<String>,
    paused: bool,
    volume: f32,
    muted: bool,
    loads: usize,
    failure: Option<PlaybackError>,
}

pub struct FakeMedia {
    state: Mutex<MediaState>,
    feed: Option<PcmFeed>,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MediaState {
                source: None,
                paused: true,
                volume: 1.0,
                muted: false,
                loads: 0,
                failure: None,
            }),
            feed: None,
        }
    }

    pub fn with_feed(feed: PcmFeed) -> Self {
        Self {
            feed: Some(feed),
            ..Self::new()
        }
    }

    /// Make the next `play` fail.
    pub fn fail_play(&self, reason: &str) {
        self.state.lock().unwrap().failure = Some(PlaybackError::Blocked(reason.to_string()));
    }

    pub fn allow_play(&self) {
        self.state.lock().unwrap().failure = None;
    }

    pub fn loads(&self) -> usize {
        self.state.lock().unwrap().loads
    }
}

impl MediaElement for FakeMedia {
    fn source(&self) -> Option<String> {
        self.state.lock().unwrap().source.clone()
    }

    fn set_source(&self, url: Option<&str>) {
        self.state.lock().unwrap().source = url.map(str::to_string);
    }

    fn load(&self) {
        let mut s = self.state.lock().unwrap();
        s.loads += 1;
        s.paused = true;
    }

    fn play(&self) -> Result<(), PlaybackError> {
        let mut s = self.state.lock().unwrap();
        if let Some(e) = s.failure.take() {
            return Err(e);
        }
        s.paused = false;
        Ok(())
    }

    fn pause(&self) {
        self.state.lock().unwrap().paused = true;
    }

    fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    fn volume(&self) -> f32 {
        self.state.lock().unwrap().volume
    }

    fn set_volume(&self, volume: f32) {
        self.state.lock().unwrap().volume = volume.clamp(0.0, 1.0);
    }

    fn is_muted(&self) -> bool {
        self.state.lock().unwrap().muted
    }

    fn set_muted(&self, muted: bool) {
        self.state.lock().unwrap().muted = muted;
    }

    fn pcm_feed(&self) -> Option<PcmFeed> {
        self.feed.clone()
    }
}

// ── Audio backend ─────────────────────────────────────────────────────────────

/// Backend whose graphs report the same magnitude in every bin.
pub struct StaticBackend {
    level: u8,
    fails: bool,
    connections: AtomicUsize,
}

impl StaticBackend {
    pub fn with_level(level: u8) -> Self {
        Self {
            level,
            fails: false,
            connections: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fails: true,
            ..Self::with_level(0)
        }
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

struct StaticGraph {
    level: u8,
    state: GraphState,
}

impl AudioGraph for StaticGraph {
    fn state(&self) -> GraphState {
        self.state
    }

    fn resume(&mut self) {
        self.state = GraphState::Running;
    }

    fn frequency_data(&mut self, out: &mut [u8]) {
        out.fill(self.level);
    }
}

impl AudioBackend for StaticBackend {
    fn connect(&self, _media: &dyn MediaElement) -> Result<Box<dyn AudioGraph>, AnalyzerError> {
        self.connections.fetch_add(1, Ordering::SeqCst);
        if self.fails {
            return Err(AnalyzerError::Unavailable("test backend".to_string()));
        }
        Ok(Box::new(StaticGraph {
            level: self.level,
            state: GraphState::Suspended,
        }))
    }
}

// ── Surface ───────────────────────────────────────────────────────────────────

pub struct RecordingSurface {
    width: u32,
    height: u32,
    clears: usize,
    current: Vec<(BarRect, String)>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            clears: 0,
            current: Vec::new(),
        }
    }

    pub fn clears(&self) -> usize {
        self.clears
    }

    /// Bars drawn since the last clear.
    pub fn rects(&self) -> Vec<BarRect> {
        self.current.iter().map(|(r, _)| *r).collect()
    }

    pub fn fills(&self) -> Vec<(BarRect, String)> {
        self.current.clone()
    }

    pub fn is_blank(&self) -> bool {
        self.current.is_empty()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.current.clear();
    }

    fn fill_rect(&mut self, rect: BarRect, color: &str) {
        self.current.push((rect, color.to_string()));
    }
}

// ── View ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ViewCall {
    Title(String),
    Artwork(String),
    Icon(PlayIcon),
    Volume(VolumeView),
}

#[derive(Clone, Default)]
pub struct RecordingView {
    calls: Arc<Mutex<Vec<ViewCall>>>,
}

impl RecordingView {
    pub fn calls(&self) -> Vec<ViewCall> {
        self.calls.lock().unwrap().clone()
    }

    fn last<T>(&self, pick: impl Fn(&ViewCall) -> Option<T>) -> Option<T> {
        self.calls.lock().unwrap().iter().rev().find_map(pick)
    }

    pub fn last_title(&self) -> Option<String> {
        self.last(|c| match c {
            ViewCall::Title(t) => Some(t.clone()),
            _ => None,
        })
    }

    pub fn last_artwork(&self) -> Option<String> {
        self.last(|c| match c {
            ViewCall::Artwork(u) => Some(u.clone()),
            _ => None,
        })
    }

    pub fn last_icon(&self) -> Option<PlayIcon> {
        self.last(|c| match c {
            ViewCall::Icon(i) => Some(*i),
            _ => None,
        })
    }

    pub fn last_volume(&self) -> Option<VolumeView> {
        self.last(|c| match c {
            ViewCall::Volume(v) => Some(*v),
            _ => None,
        })
    }
}

impl PlayerView for RecordingView {
    fn render_title(&mut self, title: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(ViewCall::Title(title.to_string()));
    }

    fn render_artwork(&mut self, url: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(ViewCall::Artwork(url.to_string()));
    }

    fn render_icon(&mut self, icon: PlayIcon) {
        self.calls.lock().unwrap().push(ViewCall::Icon(icon));
    }

    fn render_volume(&mut self, volume: VolumeView) {
        self.calls.lock().unwrap().push(ViewCall::Volume(volume));
    }
}

// ── Ambient ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum AmbientWrite {
    Gradient(Layer, Gradient),
    Opacity(u8),
}

#[derive(Clone, Default)]
pub struct RecordingAmbient {
    writes: Arc<Mutex<Vec<AmbientWrite>>>,
}

impl RecordingAmbient {
    pub fn writes(&self) -> Vec<AmbientWrite> {
        self.writes.lock().unwrap().clone()
    }
}

impl AmbientSink for RecordingAmbient {
    fn set_gradient(&mut self, layer: Layer, gradient: &Gradient) {
        self.writes
            .lock()
            .unwrap()
            .push(AmbientWrite::Gradient(layer, gradient.clone()));
    }

    fn set_layer_b_opacity(&mut self, opacity: u8) {
        self.writes
            .lock()
            .unwrap()
            .push(AmbientWrite::Opacity(opacity));
    }
}

// ── Lookup ────────────────────────────────────────────────────────────────────

pub struct CannedLookup {
    response: Option<SearchResponse>,
    terms: Mutex<Vec<String>>,
}

impl CannedLookup {
    pub fn with_response(response: SearchResponse) -> Self {
        Self {
            response: Some(response),
            terms: Mutex::new(Vec::new()),
        }
    }

    pub fn found(artwork_url_100: &str) -> Self {
        Self::with_response(SearchResponse {
            result_count: 1,
            results: vec![SearchResult {
                artwork_url_100: Some(artwork_url_100.to_string()),
            }],
        })
    }

    pub fn empty() -> Self {
        Self::with_response(SearchResponse::default())
    }

    /// Every search fails with a 503.
    pub fn failing() -> Self {
        Self {
            response: None,
            terms: Mutex::new(Vec::new()),
        }
    }

    pub fn terms(&self) -> Vec<String> {
        self.terms.lock().unwrap().clone()
    }
}

#[async_trait]
impl LookupService for CannedLookup {
    async fn search_song(&self, term: &str) -> Result<SearchResponse, LookupError> {
        self.terms.lock().unwrap().push(term.to_string());
        self.response.clone().ok_or(LookupError::Status(503))
    }
}

// ── Players and decks ─────────────────────────────────────────────────────────

/// Handles a test keeps on a built player's fakes.
pub struct Handles {
    pub media: Arc<FakeMedia>,
    pub view: RecordingView,
    pub surface: Arc<Mutex<RecordingSurface>>,
}

pub fn player_config(id: &str) -> PlayerConfig {
    PlayerConfig {
        id: PlayerId::new(id),
        stream_url: format!("https://stream/{}", id),
        default_artwork_url: format!("img/{}.png", id),
        bar_color: format!("#{}", id),
        ambient_gradient: Some(Gradient::new(format!("#{}", id), format!("#{}0", id))),
        metadata: None,
    }
}

pub fn context() -> DeckContext {
    DeckContext {
        backend: Arc::new(StaticBackend::with_level(100)),
        client: reqwest::Client::new(),
        frame_interval: Duration::from_millis(16),
        default_poll_interval: Duration::from_secs(5),
    }
}

pub fn rig() -> (PlayerWiring, Handles) {
    let media = Arc::new(FakeMedia::new());
    let view = RecordingView::default();
    let surface = Arc::new(Mutex::new(RecordingSurface::new(320, 100)));
    let wiring = PlayerWiring {
        media: Some(media.clone()),
        surface: Some(surface.clone()),
        view: Some(Box::new(view.clone())),
    };
    (
        wiring,
        Handles {
            media,
            view,
            surface,
        },
    )
}

pub fn built(config: &PlayerConfig) -> (PlayerInstance, Handles) {
    let (wiring, handles) = rig();
    let player = PlayerInstance::build(config, wiring, &context()).unwrap();
    (player, handles)
}

pub struct Deck {
    pub coord: PlaybackCoordinator,
    pub handles: Vec<Handles>,
    pub ambient: RecordingAmbient,
    /// Keeps the coordinator's channel open for background tasks.
    pub events: Option<mpsc::Receiver<DeckEvent>>,
}

pub fn neutral() -> Gradient {
    Gradient::new("#000", "#111")
}

/// Coordinator over players `ids` whose artwork comes from `lookup`.
pub fn coordinator_with(
    ids: &[&str],
    lookup: Arc<CannedLookup>,
) -> (Deck, mpsc::Receiver<DeckEvent>) {
    let (tx, rx) = mpsc::channel(64);
    let ambient = RecordingAmbient::default();
    let resolver = Arc::new(ArtworkResolver::new(lookup, &ArtworkConfig::default()));
    let mut coord = PlaybackCoordinator::new(
        AmbientBackground::new(neutral()),
        Box::new(ambient.clone()),
        resolver,
        "Loading…",
        tx,
    );

    let mut handles = Vec::new();
    for id in ids {
        let (player, h) = built(&player_config(id));
        coord.register(player).unwrap();
        handles.push(h);
    }

    (
        Deck {
            coord,
            handles,
            ambient,
            events: None,
        },
        rx,
    )
}

pub fn deck(ids: &[&str]) -> Deck {
    let (mut d, rx) = coordinator_with(ids, Arc::new(CannedLookup::empty()));
    d.events = Some(rx);
    d
}
