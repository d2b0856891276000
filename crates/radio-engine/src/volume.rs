//! Volume slider and mute icon, derived from the media element.

use radio_proto::protocol::VolumeView;

use crate::media::MediaElement;

/// Mute icon and slider position for a volume/mute pair. Muted and silent
/// look the same: muted icon, slider at zero.
pub fn volume_view(volume: f32, muted: bool) -> VolumeView {
    if muted || volume <= 0.0 {
        return VolumeView {
            muted_icon: true,
            slider: 0,
        };
    }
    VolumeView {
        muted_icon: false,
        slider: (volume.min(1.0) * 100.0).round() as u8,
    }
}

pub fn read_view(media: &dyn MediaElement) -> VolumeView {
    volume_view(media.volume(), media.is_muted())
}

/// Apply a slider position (0–100) to `media`.
pub fn apply_slider(media: &dyn MediaElement, slider: u8) {
    media.set_volume(f32::from(slider.min(100)) / 100.0);
}

pub fn toggle_mute(media: &dyn MediaElement) {
    media.set_muted(!media.is_muted());
}
