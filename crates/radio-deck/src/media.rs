//! `MediaElement` backed by a per-player mpv process, with an ffmpeg tap
//! feeding decoded PCM to the analyzer.
//!
//! The engine calls the element synchronously; the element forwards work to
//! an actor task that owns the processes.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use radio_engine::error::PlaybackError;
use radio_engine::media::{MediaElement, PcmFeed};
use radio_engine::DeckEvent;
use radio_proto::protocol::PlayerId;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use crate::mpv::{MpvDriver, MpvEvent, MpvHandle};

/// Sample rate the ffmpeg tap decodes to.
pub const TAP_SAMPLE_RATE: u32 = 11025;
const TAP_READ_BYTES: usize = 1024;
const FEED_CAPACITY: usize = 4096;
const LIVENESS_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug)]
enum MediaCommand {
    Start { url: String, volume: f32, muted: bool },
    Stop,
    Volume(f32),
    Mute(bool),
}

#[derive(Debug)]
struct ElementState {
    source: Option<String>,
    paused: bool,
    volume: f32,
    muted: bool,
}

pub struct MpvElement {
    state: Arc<Mutex<ElementState>>,
    feed: PcmFeed,
    can_play: bool,
    commands: mpsc::UnboundedSender<MediaCommand>,
}

impl MpvElement {
    /// Create the element and spawn its actor. Without an mpv binary the
    /// element still exists but every `play` fails.
    pub fn spawn(player: PlayerId, mpv: Option<PathBuf>, events: mpsc::Sender<DeckEvent>) -> Self {
        let state = Arc::new(Mutex::new(ElementState {
            source: None,
            paused: true,
            volume: 1.0,
            muted: false,
        }));
        let feed = PcmFeed::new(FEED_CAPACITY);
        let (tx, rx) = mpsc::unbounded_channel();

        let can_play = mpv.is_some();
        match mpv {
            Some(binary) => {
                let actor = MediaActor {
                    driver: MpvDriver::new(player.as_str(), binary),
                    player,
                    handle: None,
                    tap: None,
                    feed: feed.clone(),
                    state: state.clone(),
                    events,
                };
                tokio::spawn(actor.run(rx));
            }
            None => warn!("player {}: mpv not found, playback disabled", player),
        }

        Self {
            state,
            feed,
            can_play,
            commands: tx,
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ElementState) -> R) -> Option<R> {
        self.state.lock().ok().map(|mut s| f(&mut s))
    }

    fn command(&self, cmd: MediaCommand) {
        if self.commands.send(cmd).is_err() && self.can_play {
            debug!("media actor gone, command dropped");
        }
    }
}

impl MediaElement for MpvElement {
    fn source(&self) -> Option<String> {
        self.with_state(|s| s.source.clone()).flatten()
    }

    fn set_source(&self, url: Option<&str>) {
        self.with_state(|s| s.source = url.map(str::to_string));
    }

    fn load(&self) {
        self.with_state(|s| s.paused = true);
        self.feed.clear();
        self.command(MediaCommand::Stop);
    }

    fn play(&self) -> Result<(), PlaybackError> {
        if !self.can_play {
            return Err(PlaybackError::Backend("mpv binary not found".into()));
        }
        let start = self
            .with_state(|s| {
                let url = s.source.clone()?;
                let already = !s.paused;
                s.paused = false;
                Some((url, s.volume, s.muted, already))
            })
            .flatten();
        let Some((url, volume, muted, already)) = start else {
            return Err(PlaybackError::NoSource);
        };
        if already {
            return Ok(());
        }
        self.commands
            .send(MediaCommand::Start { url, volume, muted })
            .map_err(|_| PlaybackError::Backend("media actor stopped".into()))
    }

    fn pause(&self) {
        let was_playing = self
            .with_state(|s| std::mem::replace(&mut s.paused, true))
            .is_some_and(|paused| !paused);
        if was_playing {
            self.command(MediaCommand::Stop);
        }
    }

    fn is_paused(&self) -> bool {
        self.with_state(|s| s.paused).unwrap_or(true)
    }

    fn volume(&self) -> f32 {
        self.with_state(|s| s.volume).unwrap_or(1.0)
    }

    fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.with_state(|s| s.volume = volume);
        self.command(MediaCommand::Volume(volume));
    }

    fn is_muted(&self) -> bool {
        self.with_state(|s| s.muted).unwrap_or(false)
    }

    fn set_muted(&self, muted: bool) {
        self.with_state(|s| s.muted = muted);
        self.command(MediaCommand::Mute(muted));
    }

    fn pcm_feed(&self) -> Option<PcmFeed> {
        Some(self.feed.clone())
    }
}

/// Owns one player's mpv process and PCM tap.
struct MediaActor {
    player: PlayerId,
    driver: MpvDriver,
    handle: Option<MpvHandle>,
    tap: Option<AbortHandle>,
    feed: PcmFeed,
    state: Arc<Mutex<ElementState>>,
    events: mpsc::Sender<DeckEvent>,
}

impl MediaActor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<MediaCommand>) {
        let (mpv_tx, mut mpv_rx) = mpsc::channel::<MpvEvent>(64);
        let mut liveness = tokio::time::interval(LIVENESS_INTERVAL);

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.apply(cmd, &mpv_tx).await,
                    None => break,
                },
                Some(event) = mpv_rx.recv() => self.on_mpv_event(event).await,
                _ = liveness.tick() => {
                    if self.handle.is_some() && !self.driver.process_alive() {
                        self.ended("mpv exited").await;
                    }
                }
            }
        }

        self.stop().await;
        debug!("player {}: media actor stopped", self.player);
    }

    async fn apply(&mut self, cmd: MediaCommand, mpv_tx: &mpsc::Sender<MpvEvent>) {
        match cmd {
            MediaCommand::Start { url, volume, muted } => {
                self.stop().await;
                let handle = match self
                    .driver
                    .spawn_and_connect(volume, muted, mpv_tx.clone())
                    .await
                {
                    Ok(h) => h,
                    Err(e) => {
                        error!("player {}: mpv start failed: {}", self.player, e);
                        self.ended("mpv did not start").await;
                        return;
                    }
                };
                if let Err(e) = handle.load_stream(&url).await {
                    error!("player {}: loadfile failed: {}", self.player, e);
                    self.ended("stream did not load").await;
                    return;
                }
                info!("player {}: streaming {}", self.player, url);
                self.handle = Some(handle);
                self.tap = Some(spawn_tap(self.player.clone(), url, self.feed.clone()));
            }
            MediaCommand::Stop => self.stop().await,
            MediaCommand::Volume(v) => {
                if let Some(h) = &self.handle {
                    if let Err(e) = h.set_volume(v).await {
                        warn!("player {}: set volume failed: {}", self.player, e);
                    }
                }
            }
            MediaCommand::Mute(m) => {
                if let Some(h) = &self.handle {
                    if let Err(e) = h.set_mute(m).await {
                        warn!("player {}: set mute failed: {}", self.player, e);
                    }
                }
            }
        }
    }

    async fn on_mpv_event(&mut self, event: MpvEvent) {
        match event.end_reason() {
            Some(reason @ ("eof" | "error")) => {
                let why = format!("stream ended ({})", reason);
                self.ended(&why).await;
            }
            _ => {
                if let Some(name) = event.event_name() {
                    debug!("player {}: mpv event {}", self.player, name);
                }
            }
        }
    }

    async fn stop(&mut self) {
        if let Some(tap) = self.tap.take() {
            tap.abort();
        }
        self.handle = None;
        self.driver.kill().await;
        self.feed.clear();
    }

    /// Playback stopped without being asked to. Report it if the element
    /// still believed it was playing.
    async fn ended(&mut self, why: &str) {
        self.stop().await;
        let was_playing = self
            .state
            .lock()
            .map(|mut s| !std::mem::replace(&mut s.paused, true))
            .unwrap_or(false);
        if was_playing {
            warn!("player {}: {}", self.player, why);
            let _ = self
                .events
                .send(DeckEvent::MediaEnded {
                    player: self.player.clone(),
                })
                .await;
        }
    }
}

fn spawn_tap(player: PlayerId, url: String, feed: PcmFeed) -> AbortHandle {
    tokio::spawn(async move {
        if let Err(e) = run_pcm_tap(&url, &feed).await {
            warn!("player {}: pcm tap stopped: {}", player, e);
        }
    })
    .abort_handle()
}

/// Decode the stream to mono s16le with ffmpeg and push samples into `feed`.
async fn run_pcm_tap(url: &str, feed: &PcmFeed) -> anyhow::Result<()> {
    let rate = TAP_SAMPLE_RATE.to_string();
    let ffmpeg_bin =
        radio_proto::platform::find_ffmpeg_binary().unwrap_or_else(|| PathBuf::from("ffmpeg"));
    let mut child = tokio::process::Command::new(ffmpeg_bin)
        .args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-nostdin",
            "-fflags",
            "nobuffer",
            "-flags",
            "low_delay",
            "-probesize",
            "64k",
            "-analyzeduration",
            "200000",
            "-i",
            url,
            "-vn",
            "-ac",
            "1",
            "-ar",
            &rate,
            "-f",
            "s16le",
            "pipe:1",
        ])
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow::anyhow!("ffmpeg stdout not captured"))?;
    let mut buf = vec![0u8; TAP_READ_BYTES];
    let mut decoder = S16Decoder::default();
    let mut samples = Vec::with_capacity(TAP_READ_BYTES / 2 + 1);

    loop {
        let n = stdout.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        samples.clear();
        decoder.decode(&buf[..n], &mut samples);
        feed.push(&samples);
    }

    let status = child.wait().await?;
    if !status.success() {
        anyhow::bail!("ffmpeg exited: {}", status);
    }
    Ok(())
}

/// s16le to f32 across reads that may split a sample.
#[derive(Debug, Default)]
struct S16Decoder {
    carry: Option<u8>,
}

impl S16Decoder {
    fn decode(&mut self, bytes: &[u8], out: &mut Vec<f32>) {
        let mut rest = bytes;
        if let Some(lo) = self.carry.take() {
            let Some((&hi, tail)) = rest.split_first() else {
                self.carry = Some(lo);
                return;
            };
            out.push(i16::from_le_bytes([lo, hi]) as f32 / 32768.0);
            rest = tail;
        }
        let mut pairs = rest.chunks_exact(2);
        for pair in &mut pairs {
            out.push(i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0);
        }
        self.carry = pairs.remainder().first().copied();
    }
}
