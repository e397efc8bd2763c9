use crate::assets::{AssetError, AssetNode};
use crate::world::canvas::{Canvas, DrawImage, Drawable, FrameTiming, Layer, Layered};
use crate::world::geometry::{Camera2D, Vec2};
use crate::world::sprites::Animation;

/// Placement of an NPC, as read from a map's `life` list or built by a host.
#[derive(Debug, Clone, PartialEq)]
pub struct NpcSpawn {
    pub id: u32,
    pub x: f32,
    pub cy: f32,
    pub fh: i64,
    pub flip: bool,
    pub hidden: bool,
}

impl NpcSpawn {
    pub fn new(id: u32, x: f32, cy: f32, fh: i64) -> Self {
        Self {
            id,
            x,
            cy,
            fh,
            flip: false,
            hidden: false,
        }
    }

    pub fn from_life_node(node: &AssetNode) -> Result<Self, AssetError> {
        Ok(Self {
            id: parse_life_id(node)?,
            x: node.require_int("x")? as f32,
            cy: node.require_int("cy")? as f32,
            fh: node.require_int("fh")?,
            flip: node.int_or("f", 0) != 0,
            hidden: node.int_or("hide", 0) != 0,
        })
    }
}

/// Life ids are stored as zero-padded strings in most dumps.
pub(crate) fn parse_life_id(node: &AssetNode) -> Result<u32, AssetError> {
    let raw = node.require_text_or_int("id")?;
    raw.trim().parse().map_err(|_| AssetError::WrongType {
        path: format!("{}/id", node.path()),
        expected: "a numeric life id",
    })
}

/// Sprites and strings of an NPC template.
#[derive(Debug, Clone, Default)]
pub struct NpcAppearance {
    pub stand: Animation,
    pub name: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcKind {
    Standard,
    Taxi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialog {
    Hidden,
    /// Plain speech bubble, hidden again once its display time runs out.
    Speech,
    Taxi,
}

#[derive(Debug, Clone)]
pub struct Npc {
    pub id: u32,
    pub name: String,
    pub lines: Vec<String>,
    pub fh: i64,
    pub flip: bool,
    pub hidden: bool,
    pub kind: NpcKind,
    pub layer: Layer,
    position: Vec2,
    dialog: Dialog,
    dialog_timer_ms: f32,
    last_dialog_ms: f32,
    dialog_duration_ms: f32,
    animation: Animation,
}

impl Npc {
    pub fn new(
        spawn: NpcSpawn,
        appearance: NpcAppearance,
        kind: NpcKind,
        layer: Layer,
        dialog_duration_ms: f32,
    ) -> Self {
        Self {
            id: spawn.id,
            name: appearance.name,
            lines: appearance.lines,
            fh: spawn.fh,
            flip: spawn.flip,
            hidden: spawn.hidden,
            kind,
            layer,
            position: Vec2::new(spawn.x, spawn.cy),
            dialog: Dialog::Hidden,
            dialog_timer_ms: 0.0,
            last_dialog_ms: 0.0,
            dialog_duration_ms,
            animation: appearance.stand,
        }
    }

    /// World position: spawn x and the foothold height `cy`.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn dialog(&self) -> Dialog {
        self.dialog
    }

    pub fn is_dialog_visible(&self) -> bool {
        self.dialog != Dialog::Hidden
    }

    pub fn is_clickable(&self) -> bool {
        !self.hidden
    }

    pub fn show_speech(&mut self) {
        self.dialog = Dialog::Speech;
        self.last_dialog_ms = self.dialog_timer_ms;
    }

    pub fn show_taxi_dialog(&mut self) {
        self.dialog = Dialog::Taxi;
    }

    pub fn hide_dialog(&mut self) {
        self.dialog = Dialog::Hidden;
    }

    pub fn update(&mut self, tick_ms: f32) {
        self.animation.update(tick_ms);
        self.dialog_timer_ms += tick_ms;
        if self.dialog == Dialog::Speech
            && self.dialog_timer_ms - self.last_dialog_ms >= self.dialog_duration_ms
        {
            self.dialog = Dialog::Hidden;
        }
    }
}

impl Layered for Npc {
    fn layer(&self) -> Layer {
        self.layer
    }
}

impl Drawable for Npc {
    fn draw(&self, canvas: &mut dyn Canvas, camera: &Camera2D, _timing: &FrameTiming) {
        if self.hidden {
            return;
        }
        let Some(frame) = self.animation.current() else {
            return;
        };
        // Sprites face left; flip mirrors around the origin.
        let origin_x = if self.flip {
            frame.width as f32 - frame.origin_x
        } else {
            frame.origin_x
        };
        canvas.draw_image(
            DrawImage::new(
                &frame.image,
                self.position.x - origin_x - camera.x(),
                self.position.y - frame.origin_y - camera.y(),
            )
            .flipped(self.flip),
        );
    }
}
