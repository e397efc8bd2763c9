use std::collections::HashSet;

use super::geometry::Camera2D;

/// Highest layer index drawn in the per-layer pass.
pub const MAX_LAYER: u8 = 7;

/// Depth bucket of a placed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Index(u8),
    /// Drawn after every indexed layer.
    Overlay,
}

impl Layer {
    pub fn from_index(index: i64) -> Self {
        match u8::try_from(index) {
            Ok(index) if index <= MAX_LAYER => Layer::Index(index),
            _ => Layer::Overlay,
        }
    }

    pub fn index(&self) -> Option<u8> {
        match self {
            Layer::Index(index) => Some(*index),
            Layer::Overlay => None,
        }
    }
}

/// Interpolation data handed to every draw call by the host loop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTiming {
    pub lag: f32,
    pub tick_ms: f32,
    pub tdelta: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawImage<'a> {
    /// Asset path of the canvas node to blit.
    pub image: &'a str,
    pub dx: f32,
    pub dy: f32,
    pub flip: bool,
    pub alpha: f32,
}

impl<'a> DrawImage<'a> {
    pub fn new(image: &'a str, dx: f32, dy: f32) -> Self {
        Self {
            image,
            dx,
            dy,
            flip: false,
            alpha: 1.0,
        }
    }

    pub fn flipped(mut self, flip: bool) -> Self {
        self.flip = flip;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawLine {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Drawing surface supplied by the host.
pub trait Canvas {
    fn is_key_down(&self, key: &str) -> bool;
    fn draw_image(&mut self, image: DrawImage<'_>);
    fn draw_line(&mut self, line: DrawLine);
}

pub trait Drawable {
    fn draw(&self, canvas: &mut dyn Canvas, camera: &Camera2D, timing: &FrameTiming);
}

pub trait Layered {
    fn layer(&self) -> Layer;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Image {
        image: String,
        dx: f32,
        dy: f32,
        flip: bool,
        alpha: f32,
    },
    Line(DrawLine),
}

/// Canvas that records every call in order. Used by headless hosts and
/// tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingCanvas {
    calls: Vec<DrawCall>,
    keys_down: HashSet<String>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press_key(&mut self, key: impl Into<String>) {
        self.keys_down.insert(key.into());
    }

    pub fn release_key(&mut self, key: &str) {
        self.keys_down.remove(key);
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Image paths in draw order, lines skipped.
    pub fn images(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Image { image, .. } => Some(image.as_str()),
                DrawCall::Line(_) => None,
            })
            .collect()
    }

    pub fn image_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::Image { .. }))
            .count()
    }

    pub fn line_count(&self) -> usize {
        self.calls.len() - self.image_count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }
}

impl Canvas for RecordingCanvas {
    fn is_key_down(&self, key: &str) -> bool {
        self.keys_down.contains(key)
    }

    fn draw_image(&mut self, image: DrawImage<'_>) {
        self.calls.push(DrawCall::Image {
            image: image.image.to_string(),
            dx: image.dx,
            dy: image.dy,
            flip: image.flip,
            alpha: image.alpha,
        });
    }

    fn draw_line(&mut self, line: DrawLine) {
        self.calls.push(DrawCall::Line(line));
    }
}
