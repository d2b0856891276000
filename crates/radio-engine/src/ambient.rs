//! Two-layer page background that cross-fades between player gradients.
//!
//! Layer A sits under layer B and is always opaque, so B's opacity alone
//! decides what shows. A transition paints the hidden layer, then reveals
//! it: the visible layer is always the active one and no intermediate state
//! shows a blank background.

use radio_proto::protocol::{AmbientSnapshot, Gradient, Layer};
use tracing::debug;

/// Where gradient and opacity writes land (page CSS, state mirror, ...).
pub trait AmbientSink: Send {
    fn set_gradient(&mut self, layer: Layer, gradient: &Gradient);

    fn set_layer_b_opacity(&mut self, opacity: u8);
}

#[derive(Debug, Clone)]
pub struct AmbientBackground {
    default_gradient: Gradient,
    active: Layer,
    layer_a: Gradient,
    layer_b: Gradient,
    layer_b_opacity: u8,
}

impl AmbientBackground {
    pub fn new(default_gradient: Gradient) -> Self {
        Self {
            active: Layer::A,
            layer_a: default_gradient.clone(),
            layer_b: default_gradient.clone(),
            layer_b_opacity: 0,
            default_gradient,
        }
    }

    /// Push the full current state into `sink`, e.g. after setup.
    pub fn paint(&self, sink: &mut dyn AmbientSink) {
        sink.set_gradient(Layer::A, &self.layer_a);
        sink.set_gradient(Layer::B, &self.layer_b);
        sink.set_layer_b_opacity(self.layer_b_opacity);
    }

    pub fn transition_to(&mut self, gradient: &Gradient, sink: &mut dyn AmbientSink) {
        let target = self.active.other();
        match target {
            Layer::A => self.layer_a = gradient.clone(),
            Layer::B => self.layer_b = gradient.clone(),
        }
        sink.set_gradient(target, gradient);

        self.layer_b_opacity = match target {
            Layer::A => 0,
            Layer::B => 1,
        };
        sink.set_layer_b_opacity(self.layer_b_opacity);

        self.active = target;
        debug!(
            "ambient: layer {:?} now shows {} -> {}",
            target,
            gradient.from_color(),
            gradient.to_color()
        );
    }

    /// Fade back to the neutral gradient.
    pub fn revert(&mut self, sink: &mut dyn AmbientSink) {
        let neutral = self.default_gradient.clone();
        self.transition_to(&neutral, sink);
    }

    pub fn default_gradient(&self) -> &Gradient {
        &self.default_gradient
    }

    pub fn active(&self) -> Layer {
        self.active
    }

    /// Gradient currently on screen.
    pub fn visible(&self) -> &Gradient {
        if self.layer_b_opacity == 1 {
            &self.layer_b
        } else {
            &self.layer_a
        }
    }

    pub fn snapshot(&self) -> AmbientSnapshot {
        AmbientSnapshot {
            active: self.active,
            layer_a: self.layer_a.clone(),
            layer_b: self.layer_b.clone(),
            layer_b_opacity: self.layer_b_opacity,
        }
    }
}
