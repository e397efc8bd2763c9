use crate::assets::{AssetError, AssetNode, AssetResolver};
use crate::world::canvas::{Canvas, DrawImage, Drawable, FrameTiming};
use crate::world::geometry::{Camera2D, Vec2};
use crate::world::sprites::{Animation, SpriteCache, SpriteFrame};

/// Periods below one pixel, or non-finite ones, are not tiled.
const MIN_TILE_PERIOD: f32 = 1.0;

/// A parallax backdrop. Non-front backgrounds are drawn before the scene,
/// front ones after portals.
#[derive(Debug, Clone)]
pub struct Background {
    pub set: String,
    pub no: i64,
    pub animated: bool,
    /// Raw tiling/scrolling mode, 0..=7.
    pub kind: i64,
    pub x: f32,
    pub y: f32,
    /// Parallax factor in percent, or scroll speed for scrolling kinds.
    pub rx: f32,
    pub ry: f32,
    /// Tiling period; 0 means the frame size.
    pub cx: f32,
    pub cy: f32,
    pub alpha: f32,
    pub flip: bool,
    pub front: bool,
    pub z: i64,
    animation: Animation,
    scroll: Vec2,
}

impl Background {
    pub async fn from_node(
        node: &AssetNode,
        cache: &mut SpriteCache,
        assets: &dyn AssetResolver,
    ) -> Result<Self, AssetError> {
        let set = node.require_text("bS")?.to_string();
        let no = node.int_or("no", 0);
        let animated = node.int_or("ani", 0) != 0;
        let group = if animated { "ani" } else { "back" };
        let animation = cache
            .animation(assets, &format!("Map.wz/Back/{set}.img/{group}/{no}"))
            .await?;

        Ok(Self {
            set,
            no,
            animated,
            kind: node.int_or("type", 0),
            x: node.require_int("x")? as f32,
            y: node.require_int("y")? as f32,
            rx: node.int_or("rx", 0) as f32,
            ry: node.int_or("ry", 0) as f32,
            cx: node.int_or("cx", 0) as f32,
            cy: node.int_or("cy", 0) as f32,
            alpha: node.int_or("a", 255).clamp(0, 255) as f32 / 255.0,
            flip: node.int_or("f", 0) != 0,
            front: node.int_or("front", 0) != 0,
            z: node
                .get_int("z")
                .or_else(|| node.name_as_int())
                .unwrap_or_default(),
            animation,
            scroll: Vec2::default(),
        })
    }

    pub fn from_animation(animation: Animation, z: i64, front: bool) -> Self {
        Self {
            set: String::new(),
            no: 0,
            animated: false,
            kind: 0,
            x: 0.0,
            y: 0.0,
            rx: 0.0,
            ry: 0.0,
            cx: 0.0,
            cy: 0.0,
            alpha: 1.0,
            flip: false,
            front,
            z,
            animation,
            scroll: Vec2::default(),
        }
    }

    fn tiles_x(&self) -> bool {
        matches!(self.kind, 1 | 3 | 4 | 6 | 7)
    }

    fn tiles_y(&self) -> bool {
        matches!(self.kind, 2 | 3 | 5 | 6 | 7)
    }

    fn scrolls_x(&self) -> bool {
        matches!(self.kind, 4 | 6)
    }

    fn scrolls_y(&self) -> bool {
        matches!(self.kind, 5 | 7)
    }

    pub fn update(&mut self, tick_ms: f32) {
        self.animation.update(tick_ms);
        let seconds = tick_ms / 1000.0;
        if self.scrolls_x() {
            self.scroll.x += self.rx * seconds;
        }
        if self.scrolls_y() {
            self.scroll.y += self.ry * seconds;
        }
    }

    /// Top-left screen position of the untiled copy.
    fn screen_origin(&self, frame: &SpriteFrame, camera: &Camera2D) -> Vec2 {
        let half_w = camera.viewport.width as f32 * 0.5;
        let half_h = camera.viewport.height as f32 * 0.5;
        let x = if self.scrolls_x() {
            self.x + self.scroll.x - camera.x()
        } else {
            self.x + half_w - (camera.x() + half_w) * (100.0 + self.rx) / 100.0
        };
        let y = if self.scrolls_y() {
            self.y + self.scroll.y - camera.y()
        } else {
            self.y + half_h - (camera.y() + half_h) * (100.0 + self.ry) / 100.0
        };
        Vec2::new(x - frame.origin_x, y - frame.origin_y)
    }
}

impl Drawable for Background {
    fn draw(&self, canvas: &mut dyn Canvas, camera: &Camera2D, _timing: &FrameTiming) {
        let Some(frame) = self.animation.current() else {
            return;
        };
        let origin = self.screen_origin(frame, camera);
        let xs = tile_positions(
            origin.x,
            self.tiles_x(),
            period(self.cx, frame.width),
            camera.viewport.width as f32,
        );
        let ys = tile_positions(
            origin.y,
            self.tiles_y(),
            period(self.cy, frame.height),
            camera.viewport.height as f32,
        );
        for dy in &ys {
            for dx in &xs {
                canvas.draw_image(
                    DrawImage::new(&frame.image, *dx, *dy)
                        .flipped(self.flip)
                        .with_alpha(self.alpha),
                );
            }
        }
    }
}

fn period(explicit: f32, frame_extent: u32) -> f32 {
    if explicit > 0.0 {
        explicit
    } else {
        frame_extent as f32
    }
}

fn tile_positions(start: f32, tiled: bool, period: f32, extent: f32) -> Vec<f32> {
    if !tiled || !period.is_finite() || period < MIN_TILE_PERIOD {
        return vec![start];
    }
    let first = start.rem_euclid(period) - period;
    let copies = (extent.max(0.0) / period).ceil() as usize + 1;
    (0..copies)
        .map(|index| first + index as f32 * period)
        .collect()
}
