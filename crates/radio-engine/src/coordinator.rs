//! PlaybackCoordinator: single-owner event loop over every player.
//!
//! All inputs (user commands, metadata from watcher tasks, artwork results,
//! media that stopped on its own) arrive as [`DeckEvent`]s on one mpsc
//! channel. The coordinator is the only code that touches player state and
//! the ambient background, so the "one player audible" rule holds between
//! any two events.
//!
//! After every event the full [`DeckState`] is published on a `watch`
//! channel for readers such as the HTTP API.

use std::sync::Arc;

use radio_proto::protocol::{Command, DeckState, PlayerId};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::ambient::{AmbientBackground, AmbientSink};
use crate::artwork::ArtworkResolver;
use crate::error::{DeckError, Result};
use crate::metadata::{EventSink, MetadataEvent};
use crate::player::PlayerInstance;

/// All inputs into the coordinator loop.
#[derive(Debug)]
pub enum DeckEvent {
    /// A command from the HTTP API or another front end.
    Command(Command),
    /// A title seen by a player's watcher during `session`.
    Metadata {
        player: PlayerId,
        session: u64,
        event: MetadataEvent,
    },
    /// Result of an artwork lookup for `title`.
    Artwork {
        player: PlayerId,
        title: String,
        url: String,
    },
    /// The media element stopped without being asked to.
    MediaEnded { player: PlayerId },
    Shutdown,
}

pub struct PlaybackCoordinator {
    players: Vec<PlayerInstance>,
    ambient: AmbientBackground,
    ambient_sink: Box<dyn AmbientSink>,
    resolver: Arc<ArtworkResolver>,
    loading_text: String,
    /// Handed to watcher and artwork tasks so results come back here.
    events: mpsc::Sender<DeckEvent>,
    rev: u64,
}

impl PlaybackCoordinator {
    pub fn new(
        ambient: AmbientBackground,
        mut ambient_sink: Box<dyn AmbientSink>,
        resolver: Arc<ArtworkResolver>,
        loading_text: impl Into<String>,
        events: mpsc::Sender<DeckEvent>,
    ) -> Self {
        ambient.paint(ambient_sink.as_mut());
        Self {
            players: Vec::new(),
            ambient,
            ambient_sink,
            resolver,
            loading_text: loading_text.into(),
            events,
            rev: 0,
        }
    }

    /// Add a player. Ids are unique; registration order is display order.
    pub fn register(&mut self, player: PlayerInstance) -> Result<()> {
        if self.players.iter().any(|p| p.id() == player.id()) {
            return Err(DeckError::DuplicatePlayer(player.id().clone()));
        }
        info!("coordinator: registered player {}", player.id());
        self.players.push(player);
        Ok(())
    }

    pub fn players(&self) -> &[PlayerInstance] {
        &self.players
    }

    pub fn player(&self, id: &PlayerId) -> Option<&PlayerInstance> {
        self.players.iter().find(|p| p.id() == id)
    }

    pub fn ambient(&self) -> &AmbientBackground {
        &self.ambient
    }

    fn index_of(&self, id: &PlayerId) -> Result<usize> {
        self.players
            .iter()
            .position(|p| p.id() == id)
            .ok_or_else(|| DeckError::UnknownPlayer(id.clone()))
    }

    /// Start `id`, silencing whichever player is currently audible.
    pub fn request_play(&mut self, id: &PlayerId) -> Result<()> {
        let idx = self.index_of(id)?;
        if self.players[idx].is_playing() {
            debug!("coordinator: {} already playing", id);
            return Ok(());
        }

        let mut stopped = 0;
        for (i, other) in self.players.iter_mut().enumerate() {
            if i != idx && other.is_playing() {
                info!("coordinator: stopping {} for {}", other.id(), id);
                other.force_stop();
                stopped += 1;
            }
        }

        let player = &mut self.players[idx];
        player.ensure_source();
        player.attach_analyzer();

        if let Err(e) = player.start_media() {
            error!("coordinator: {} failed to start: {}", id, e);
            player.show_play_icon();
            if stopped > 0 {
                self.ambient.revert(self.ambient_sink.as_mut());
            }
            return Err(DeckError::PlaybackStart {
                id: id.clone(),
                source: e,
            });
        }

        let session = player.enter_playing(&self.loading_text);
        player.watch_metadata(metadata_sink(self.events.clone(), id.clone(), session));

        let gradient = player
            .ambient_gradient()
            .cloned()
            .unwrap_or_else(|| self.ambient.default_gradient().clone());
        self.ambient
            .transition_to(&gradient, self.ambient_sink.as_mut());

        info!("coordinator: {} playing (session {})", id, session);
        Ok(())
    }

    pub fn request_pause(&mut self, id: &PlayerId) -> Result<()> {
        let idx = self.index_of(id)?;
        self.players[idx].media().pause();
        self.notify_paused(id)
    }

    /// The play/pause button.
    pub fn toggle(&mut self, id: &PlayerId) -> Result<()> {
        let idx = self.index_of(id)?;
        if self.players[idx].is_playing() {
            self.request_pause(id)
        } else {
            self.request_play(id)
        }
    }

    /// Record that `id`'s media has paused. Does nothing unless the player
    /// was playing.
    pub fn notify_paused(&mut self, id: &PlayerId) -> Result<()> {
        let idx = self.index_of(id)?;
        let player = &mut self.players[idx];
        if !player.is_playing() {
            return Ok(());
        }
        player.enter_paused();
        info!("coordinator: {} paused", id);

        if !self.players.iter().any(PlayerInstance::is_playing) {
            self.ambient.revert(self.ambient_sink.as_mut());
        }
        Ok(())
    }

    /// Handle a title seen by `id`'s watcher. Accepted changes are rendered
    /// at once; the artwork lookup runs in the background.
    pub fn on_metadata(&mut self, id: &PlayerId, session: u64, event: MetadataEvent) {
        let Ok(idx) = self.index_of(id) else {
            warn!("coordinator: metadata for unknown player {}", id);
            return;
        };
        let player = &mut self.players[idx];
        if !player.is_playing() || player.session() != session {
            debug!(
                "coordinator: dropping stale metadata for {} (session {})",
                id, session
            );
            return;
        }
        let Some(title) = player.accept_title(&event.title) else {
            return;
        };
        info!("coordinator: {} now playing {:?}", id, title);

        let resolver = self.resolver.clone();
        let fallback = player.default_artwork_url().to_string();
        let events = self.events.clone();
        let player_id = id.clone();
        tokio::spawn(async move {
            let url = resolver.resolve(&title, &fallback).await;
            let event = DeckEvent::Artwork {
                player: player_id,
                title,
                url,
            };
            if events.send(event).await.is_err() {
                debug!("coordinator: gone before artwork arrived");
            }
        });
    }

    /// Show artwork resolved for `title`, unless the track has moved on.
    pub fn on_artwork(&mut self, id: &PlayerId, title: &str, url: &str) {
        let Ok(idx) = self.index_of(id) else {
            return;
        };
        let player = &mut self.players[idx];
        if player.title() != title {
            debug!(
                "coordinator: discarding artwork for {:?}, {} is on {:?}",
                title,
                id,
                player.title()
            );
            return;
        }
        player.show_artwork(url);
    }

    pub fn set_volume(&mut self, id: &PlayerId, slider: u8) -> Result<()> {
        let idx = self.index_of(id)?;
        self.players[idx].set_volume(slider);
        Ok(())
    }

    pub fn toggle_mute(&mut self, id: &PlayerId) -> Result<()> {
        let idx = self.index_of(id)?;
        self.players[idx].toggle_mute();
        Ok(())
    }

    pub fn snapshot(&self) -> DeckState {
        DeckState {
            rev: self.rev,
            players: self.players.iter().map(PlayerInstance::snapshot).collect(),
            ambient: self.ambient.snapshot(),
        }
    }

    /// Stop every player and drop them.
    pub fn dispose(&mut self) {
        let was_playing = self.players.iter().any(PlayerInstance::is_playing);
        for player in &mut self.players {
            player.force_stop();
        }
        if was_playing {
            self.ambient.revert(self.ambient_sink.as_mut());
        }
        self.players.clear();
        info!("coordinator: disposed");
    }

    /// Apply one event. Returns `false` once the loop should end.
    pub fn handle(&mut self, event: DeckEvent) -> bool {
        match event {
            DeckEvent::Shutdown => return false,
            DeckEvent::Command(cmd) => {
                debug!("coordinator: command {:?}", cmd);
                if let Err(e) = self.handle_command(cmd) {
                    match e {
                        DeckError::PlaybackStart { .. } => {}
                        other => warn!("coordinator: {}", other),
                    }
                }
            }
            DeckEvent::Metadata {
                player,
                session,
                event,
            } => self.on_metadata(&player, session, event),
            DeckEvent::Artwork { player, title, url } => self.on_artwork(&player, &title, &url),
            DeckEvent::MediaEnded { player } => {
                warn!("coordinator: media for {} ended", player);
                if let Err(e) = self.notify_paused(&player) {
                    warn!("coordinator: {}", e);
                }
            }
        }
        true
    }

    fn handle_command(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::Play { player } => self.request_play(&player),
            Command::Pause { player } => self.request_pause(&player),
            Command::Toggle { player } => self.toggle(&player),
            Command::Volume { player, value } => self.set_volume(&player, value),
            Command::ToggleMute { player } => self.toggle_mute(&player),
        }
    }

    /// Run until `Shutdown`, publishing the deck state after every event.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<DeckEvent>,
        state_tx: watch::Sender<DeckState>,
    ) {
        info!(
            "coordinator: starting event loop with {} players",
            self.players.len()
        );
        self.publish(&state_tx);

        while let Some(event) = events.recv().await {
            if !self.handle(event) {
                info!("coordinator: shutdown requested");
                break;
            }
            self.publish(&state_tx);
        }

        self.dispose();
        self.publish(&state_tx);
    }

    fn publish(&mut self, state_tx: &watch::Sender<DeckState>) {
        self.rev += 1;
        state_tx.send_replace(self.snapshot());
    }
}

/// Watcher callback that tags titles with the player and session and posts
/// them to the coordinator.
fn metadata_sink(events: mpsc::Sender<DeckEvent>, player: PlayerId, session: u64) -> EventSink {
    Arc::new(move |event: MetadataEvent| {
        let msg = DeckEvent::Metadata {
            player: player.clone(),
            session,
            event,
        };
        match events.try_send(msg) {
            Ok(()) => {}
            // A push source will not resend this title, so wait for room.
            Err(TrySendError::Full(msg)) => {
                debug!("coordinator: event queue full, deferring metadata for {}", player);
                let events = events.clone();
                tokio::spawn(async move {
                    let _ = events.send(msg).await;
                });
            }
            Err(TrySendError::Closed(_)) => {
                warn!("coordinator: dropping metadata for {}: event loop gone", player);
            }
        }
    })
}
