mod frame;
mod http;
mod media;
mod mpv;
mod view;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use radio_engine::ambient::AmbientBackground;
use radio_engine::artwork::{ArtworkResolver, ItunesSearch, LookupService};
use radio_engine::spectrum::SpectrumBackend;
use radio_engine::{DeckContext, DeckEvent, PlaybackCoordinator, PlayerInstance, PlayerWiring};
use radio_proto::config::Config;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::frame::FrameSurface;
use crate::media::MpvElement;
use crate::view::{CssAmbient, SharedBackground, SharedViews, StateView};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = radio_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("radiodeck.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "info,radio_engine=debug,radio_deck=debug,hyper=warn,reqwest=warn",
                )
            }),
        )
        .init();

    eprintln!("radiodeck: logging to {}", log_path.display());
    info!("Log file: {:?}", log_path);

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!("Config load failed, using defaults: {}", e);
            Config::default()
        }
    };
    info!("Config loaded from: {:?}", Config::config_path());

    // Every external input funnels into the coordinator through this channel.
    let (event_tx, event_rx) = mpsc::channel::<DeckEvent>(1024);

    let client = reqwest::Client::builder()
        .user_agent(concat!("radiodeck/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let ctx = DeckContext::from_config(&config, Arc::new(SpectrumBackend), client.clone());

    let lookup: Arc<dyn LookupService> = Arc::new(ItunesSearch::new(client, &config.artwork));
    let resolver = Arc::new(ArtworkResolver::new(lookup, &config.artwork));

    let background = SharedBackground::default();
    let views = SharedViews::default();
    let mut coordinator = PlaybackCoordinator::new(
        AmbientBackground::new(config.ambient.default_gradient.clone()),
        Box::new(CssAmbient::new(background.clone())),
        resolver,
        config.metadata.loading_text.clone(),
        event_tx.clone(),
    );

    let mpv_binary = radio_proto::platform::find_mpv_binary();
    if mpv_binary.is_none() {
        error!("mpv not found on PATH or MPV_PATH; players will not play");
    }

    let mut surfaces = BTreeMap::new();
    for player in &config.players {
        let surface = Arc::new(Mutex::new(FrameSurface::new(
            config.visualizer.width,
            config.visualizer.height,
        )));
        let wiring = PlayerWiring {
            media: Some(Arc::new(MpvElement::spawn(
                player.id.clone(),
                mpv_binary.clone(),
                event_tx.clone(),
            ))),
            surface: Some(surface.clone()),
            view: Some(Box::new(StateView::new(player.id.clone(), views.clone()))),
        };
        match PlayerInstance::build(player, wiring, &ctx).and_then(|p| coordinator.register(p)) {
            Ok(()) => {
                surfaces.insert(player.id.clone(), surface);
            }
            Err(e) => error!("Skipping player {}: {}", player.id, e),
        }
    }
    if surfaces.is_empty() {
        warn!("No players configured in {:?}", Config::config_path());
    }

    let (state_tx, state_rx) = watch::channel(coordinator.snapshot());

    if config.http.enabled {
        let _http_handle = http::start_server(
            config.http.bind_address.clone(),
            config.http.port,
            http::HttpState {
                state_rx,
                event_tx: event_tx.clone(),
                views,
                background,
                surfaces: Arc::new(surfaces),
            },
        );
    }

    let shutdown_tx = event_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            let _ = shutdown_tx.send(DeckEvent::Shutdown).await;
        }
    });
    drop(event_tx);

    info!("Deck initialised, running event loop");
    coordinator.run(event_rx, state_tx).await;
    info!("Deck stopped");

    Ok(())
}
