use crate::world::canvas::{Canvas, DrawImage, Drawable, FrameTiming, Layer, Layered};
use crate::world::geometry::{Camera2D, Vec2};
use crate::world::sprites::{Animation, SpriteFrame};

/// A player or other character placed in the world by the host.
#[derive(Debug, Clone)]
pub struct Character {
    pub name: String,
    pub position: Vec2,
    pub layer: Layer,
    pub flip: bool,
    animation: Animation,
    level_up: Option<Animation>,
}

impl Character {
    pub fn new(name: impl Into<String>, position: Vec2, animation: Animation) -> Self {
        Self {
            name: name.into(),
            position,
            layer: Layer::Overlay,
            flip: false,
            animation,
            level_up: None,
        }
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    /// Plays `effect` once above the character.
    pub fn start_level_up(&mut self, mut effect: Animation) {
        if effect.is_empty() {
            return;
        }
        effect.restart();
        self.level_up = Some(effect);
    }

    pub fn is_leveling_up(&self) -> bool {
        self.level_up.is_some()
    }

    pub fn level_up_frame(&self) -> Option<&SpriteFrame> {
        self.level_up.as_ref().and_then(Animation::current)
    }

    pub fn update(&mut self, tick_ms: f32) {
        self.animation.update(tick_ms);
        if let Some(effect) = &mut self.level_up {
            effect.update(tick_ms);
            if effect.is_finished() {
                self.level_up = None;
            }
        }
    }
}

impl Layered for Character {
    fn layer(&self) -> Layer {
        self.layer
    }
}

impl Drawable for Character {
    fn draw(&self, canvas: &mut dyn Canvas, camera: &Camera2D, _timing: &FrameTiming) {
        let Some(frame) = self.animation.current() else {
            return;
        };
        canvas.draw_image(
            DrawImage::new(
                &frame.image,
                self.position.x - frame.origin_x - camera.x(),
                self.position.y - frame.origin_y - camera.y(),
            )
            .flipped(self.flip),
        );
    }
}
