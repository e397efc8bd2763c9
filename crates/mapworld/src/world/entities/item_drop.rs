use crate::world::canvas::{Canvas, DrawImage, Drawable, FrameTiming};
use crate::world::geometry::{Camera2D, Vec2};
use crate::world::sprites::Animation;

/// An item lying on the ground. Built by the host and handed to the world.
#[derive(Debug, Clone)]
pub struct ItemDrop {
    pub item_id: u32,
    position: Vec2,
    animation: Animation,
    age_ms: f32,
    lifetime_ms: Option<f32>,
    destroyed: bool,
}

impl ItemDrop {
    pub fn new(item_id: u32, position: Vec2, animation: Animation) -> Self {
        Self {
            item_id,
            position,
            animation,
            age_ms: 0.0,
            lifetime_ms: None,
            destroyed: false,
        }
    }

    /// Overrides the world's default expiry for this drop.
    pub fn with_lifetime_ms(mut self, lifetime_ms: f32) -> Self {
        self.lifetime_ms = Some(lifetime_ms);
        self
    }

    pub(crate) fn apply_default_lifetime(&mut self, lifetime_ms: f32) {
        self.lifetime_ms.get_or_insert(lifetime_ms);
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn pick_up(&mut self) {
        self.destroyed = true;
    }

    pub fn update(&mut self, tick_ms: f32) {
        if self.destroyed {
            return;
        }
        self.animation.update(tick_ms);
        self.age_ms += tick_ms;
        if self.lifetime_ms.is_some_and(|lifetime| self.age_ms >= lifetime) {
            self.destroyed = true;
        }
    }
}

impl Drawable for ItemDrop {
    fn draw(&self, canvas: &mut dyn Canvas, camera: &Camera2D, _timing: &FrameTiming) {
        let Some(frame) = self.animation.current() else {
            return;
        };
        canvas.draw_image(DrawImage::new(
            &frame.image,
            self.position.x - frame.origin_x - camera.x(),
            self.position.y - frame.origin_y - camera.y(),
        ));
    }
}
