//! What a player shows: title, artwork, play/pause icon and volume.

use radio_proto::protocol::{PlayIcon, VolumeView};

/// Display sink for one player. Implementations only render; they never
/// call back into the engine.
pub trait PlayerView: Send {
    fn render_title(&mut self, title: &str);

    fn render_artwork(&mut self, url: &str);

    fn render_icon(&mut self, icon: PlayIcon);

    fn render_volume(&mut self, volume: VolumeView);
}
