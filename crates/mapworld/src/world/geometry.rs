#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Camera clamp box in world pixels. `top` is numerically smaller than
/// `bottom` since y grows downward.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Boundaries {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Boundaries {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            ((self.left + self.right) * 0.5).floor(),
            ((self.top + self.bottom) * 0.5).floor(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// Screen-space camera. `position` is the world coordinate of the top-left
/// corner of the viewport.
#[derive(Debug, Clone, Copy, Default)]
pub struct Camera2D {
    pub position: Vec2,
    pub viewport: Viewport,
    boundaries: Option<Boundaries>,
}

impl Camera2D {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            position: Vec2::default(),
            viewport,
            boundaries: None,
        }
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn boundaries(&self) -> Option<Boundaries> {
        self.boundaries
    }

    pub fn set_boundaries(&mut self, boundaries: Boundaries) {
        self.boundaries = Some(boundaries);
        self.clamp_to_boundaries();
    }

    /// Centers the viewport on `(x, y)`, then clamps it inside the
    /// boundaries if any are set.
    pub fn look_at(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(
            x - self.viewport.width as f32 * 0.5,
            y - self.viewport.height as f32 * 0.5,
        );
        self.clamp_to_boundaries();
    }

    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        Vec2::new(world.x - self.position.x, world.y - self.position.y)
    }

    fn clamp_to_boundaries(&mut self) {
        let Some(bounds) = self.boundaries else {
            return;
        };
        self.position.x = clamp_axis(
            self.position.x,
            bounds.left,
            bounds.right,
            self.viewport.width as f32,
        );
        self.position.y = clamp_axis(
            self.position.y,
            bounds.top,
            bounds.bottom,
            self.viewport.height as f32,
        );
    }
}

fn clamp_axis(value: f32, min: f32, max: f32, extent: f32) -> f32 {
    let upper = max - extent;
    if upper < min {
        // Map narrower than the viewport: center it.
        return min - (extent - (max - min)) * 0.5;
    }
    value.clamp(min, upper)
}
