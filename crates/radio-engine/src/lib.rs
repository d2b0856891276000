//! Player coordination and real-time rendering for radiodeck.
//!
//! The engine knows nothing about windows, pages or audio devices. It drives
//! them through the [`MediaElement`](media::MediaElement),
//! [`Surface`](visualizer::Surface), [`PlayerView`](view::PlayerView) and
//! [`AmbientSink`](ambient::AmbientSink) traits, which the binary
//! implements.

pub mod ambient;
pub mod analyzer;
pub mod artwork;
pub mod coordinator;
pub mod error;
pub mod media;
pub mod metadata;
pub mod player;
pub mod spectrum;
pub mod view;
pub mod visualizer;
pub mod volume;

#[cfg(test)]
mod testing;

pub use coordinator::{DeckEvent, PlaybackCoordinator};
pub use error::{DeckError, Result};
pub use player::{DeckContext, PlayerInstance, PlayerWiring};
