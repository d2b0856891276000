//! View and ambient sinks that record what a page would show, for the HTTP
//! API to serve.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use radio_engine::ambient::AmbientSink;
use radio_engine::view::PlayerView;
use radio_proto::protocol::{Gradient, Layer, PlayIcon, PlayerId, VolumeView};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderedView {
    pub title: String,
    pub artwork_url: String,
    pub icon: PlayIcon,
    pub volume: VolumeView,
}

pub type SharedViews = Arc<RwLock<BTreeMap<PlayerId, RenderedView>>>;

pub struct StateView {
    id: PlayerId,
    views: SharedViews,
}

impl StateView {
    pub fn new(id: PlayerId, views: SharedViews) -> Self {
        Self { id, views }
    }

    fn update(&self, f: impl FnOnce(&mut RenderedView)) {
        if let Ok(mut views) = self.views.write() {
            f(views.entry(self.id.clone()).or_default());
        }
    }
}

impl PlayerView for StateView {
    fn render_title(&mut self, title: &str) {
        self.update(|v| v.title = title.to_string());
    }

    fn render_artwork(&mut self, url: &str) {
        self.update(|v| v.artwork_url = url.to_string());
    }

    fn render_icon(&mut self, icon: PlayIcon) {
        self.update(|v| v.icon = icon);
    }

    fn render_volume(&mut self, volume: VolumeView) {
        self.update(|v| v.volume = volume);
    }
}

/// Both background layers as CSS values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BackgroundCss {
    pub layer_a: String,
    pub layer_b: String,
    pub layer_b_opacity: u8,
}

pub type SharedBackground = Arc<RwLock<BackgroundCss>>;

pub fn linear_gradient(g: &Gradient) -> String {
    format!(
        "linear-gradient(135deg, {}, {})",
        g.from_color(),
        g.to_color()
    )
}

pub struct CssAmbient {
    css: SharedBackground,
}

impl CssAmbient {
    pub fn new(css: SharedBackground) -> Self {
        Self { css }
    }
}

impl AmbientSink for CssAmbient {
    fn set_gradient(&mut self, layer: Layer, gradient: &Gradient) {
        let Ok(mut css) = self.css.write() else {
            return;
        };
        let value = linear_gradient(gradient);
        match layer {
            Layer::A => css.layer_a = value,
            Layer::B => css.layer_b = value,
        }
    }

    fn set_layer_b_opacity(&mut self, opacity: u8) {
        if let Ok(mut css) = self.css.write() {
            css.layer_b_opacity = opacity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_view_records_per_player() {
        let views = SharedViews::default();
        let mut a = StateView::new(PlayerId::new("a"), views.clone());
        let mut b = StateView::new(PlayerId::new("b"), views.clone());

        a.render_title("Artist - Song");
        a.render_icon(PlayIcon::Pause);
        b.render_volume(VolumeView {
            muted_icon: true,
            slider: 0,
        });

        let views = views.read().unwrap();
        assert_eq!(views[&PlayerId::new("a")].title, "Artist - Song");
        assert_eq!(views[&PlayerId::new("a")].icon, PlayIcon::Pause);
        assert!(views[&PlayerId::new("b")].volume.muted_icon);
        assert_eq!(views[&PlayerId::new("b")].title, "");
    }

    #[test]
    fn css_ambient_writes_layers() {
        let css = SharedBackground::default();
        let mut sink = CssAmbient::new(css.clone());

        sink.set_gradient(Layer::B, &Gradient::new("#0077cc", "#00395f"));
        sink.set_layer_b_opacity(1);

        let css = css.read().unwrap();
        assert_eq!(css.layer_b, "linear-gradient(135deg, #0077cc, #00395f)");
        assert_eq!(css.layer_a, "");
        assert_eq!(css.layer_b_opacity, 1);
    }
}
