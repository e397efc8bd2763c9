use crate::assets::{AssetError, AssetNode};
use crate::world::canvas::{Canvas, DrawImage, Drawable, FrameTiming, Layer, Layered};
use crate::world::geometry::{Camera2D, Vec2};
use crate::world::sprites::Animation;

use super::npc::parse_life_id;

#[derive(Debug, Clone, PartialEq)]
pub struct MonsterSpawn {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub fh: i64,
    /// Patrol range `[min_x, max_x]`.
    pub min_x: f32,
    pub max_x: f32,
    pub flip: bool,
}

impl MonsterSpawn {
    pub fn new(id: u32, x: f32, y: f32, fh: i64) -> Self {
        Self {
            id,
            x,
            y,
            fh,
            min_x: x,
            max_x: x,
            flip: false,
        }
    }

    pub fn with_patrol_range(mut self, min_x: f32, max_x: f32) -> Self {
        self.min_x = min_x.min(max_x);
        self.max_x = max_x.max(min_x);
        self
    }

    pub fn from_life_node(node: &AssetNode) -> Result<Self, AssetError> {
        let x = node.require_int("x")? as f32;
        let spawn = Self {
            id: parse_life_id(node)?,
            x,
            y: node.require_int("y")? as f32,
            fh: node.require_int("fh")?,
            min_x: x,
            max_x: x,
            flip: node.int_or("f", 0) != 0,
        };
        let min_x = node.get_int("rx0").map_or(x, |v| v as f32);
        let max_x = node.get_int("rx1").map_or(x, |v| v as f32);
        Ok(spawn.with_patrol_range(min_x, max_x))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MonsterAppearance {
    pub stand: Animation,
    /// Walk cycle; monsters without one never patrol.
    pub movement: Option<Animation>,
}

#[derive(Debug, Clone)]
pub struct Monster {
    pub id: u32,
    pub fh: i64,
    pub min_x: f32,
    pub max_x: f32,
    pub layer: Layer,
    position: Vec2,
    /// +1 walking right, -1 walking left.
    direction: f32,
    speed: f32,
    destroyed: bool,
    stand: Animation,
    movement: Option<Animation>,
}

impl Monster {
    pub fn new(
        spawn: MonsterSpawn,
        appearance: MonsterAppearance,
        layer: Layer,
        speed: f32,
    ) -> Self {
        Self {
            id: spawn.id,
            fh: spawn.fh,
            min_x: spawn.min_x,
            max_x: spawn.max_x,
            layer,
            position: Vec2::new(spawn.x, spawn.y),
            direction: if spawn.flip { 1.0 } else { -1.0 },
            speed,
            destroyed: false,
            stand: appearance.stand,
            movement: appearance.movement,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    pub fn is_patrolling(&self) -> bool {
        self.movement.is_some() && self.max_x > self.min_x && self.speed > 0.0
    }

    fn facing_right(&self) -> bool {
        self.direction > 0.0
    }

    fn current_animation(&self) -> &Animation {
        match &self.movement {
            Some(movement) if self.is_patrolling() => movement,
            _ => &self.stand,
        }
    }

    pub fn update(&mut self, tick_ms: f32) {
        if self.destroyed {
            return;
        }
        if !self.is_patrolling() {
            self.stand.update(tick_ms);
            return;
        }
        if let Some(movement) = &mut self.movement {
            movement.update(tick_ms);
        }

        let mut x = self.position.x + self.direction * self.speed * tick_ms / 1000.0;
        if x <= self.min_x {
            x = self.min_x;
            self.direction = 1.0;
        } else if x >= self.max_x {
            x = self.max_x;
            self.direction = -1.0;
        }
        self.position.x = x;
    }
}

impl Layered for Monster {
    fn layer(&self) -> Layer {
        self.layer
    }
}

impl Drawable for Monster {
    fn draw(&self, canvas: &mut dyn Canvas, camera: &Camera2D, _timing: &FrameTiming) {
        if self.destroyed {
            return;
        }
        let Some(frame) = self.current_animation().current() else {
            return;
        };
        let flip = self.facing_right();
        let origin_x = if flip {
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
            .flipped(flip),
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::world::sprites::SpriteFrame;

    use super::*;

    fn walk() -> Animation {
        Animation::looping(vec![SpriteFrame {
            image: "Mob.wz/0100100.img/move/0".to_string(),
            origin_x: 0.0,
            origin_y: 0.0,
            width: 10,
            height: 10,
            delay_ms: 100.0,
        }])
    }

    #[test]
    fn life_node_patrol_range_is_normalized() {
        let node = AssetNode::dir("7")
            .with_child(AssetNode::text("id", "0100100"))
            .with_child(AssetNode::int("x", 50))
            .with_child(AssetNode::int("y", 30))
            .with_child(AssetNode::int("fh", 4))
            .with_child(AssetNode::int("rx0", 120))
            .with_child(AssetNode::int("rx1", 10));
        let spawn = MonsterSpawn::from_life_node(&node).expect("spawn");
        assert_eq!(spawn.id, 100_100);
        assert_eq!((spawn.min_x, spawn.max_x), (10.0, 120.0));
    }

    #[test]
    fn patrol_turns_around_at_range_edges() {
        let spawn = MonsterSpawn::new(100_100, 20.0, 0.0, 1).with_patrol_range(0.0, 100.0);
        let appearance = MonsterAppearance {
            stand: Animation::empty(),
            movement: Some(walk()),
        };
        let mut mob = Monster::new(spawn, appearance, Layer::Index(0), 40.0);

        mob.update(1000.0);
        assert_eq!(mob.position().x, 0.0);
        assert!(mob.facing_right());
        mob.update(1000.0);
        assert_eq!(mob.position().x, 40.0);
    }

    #[test]
    fn monster_without_walk_cycle_stands_still() {
        let spawn = MonsterSpawn::new(100_100, 20.0, 0.0, 1).with_patrol_range(0.0, 100.0);
        let mut mob = Monster::new(spawn, MonsterAppearance::default(), Layer::Overlay, 40.0);
        mob.update(1000.0);
        assert_eq!(mob.position().x, 20.0);
    }

    #[test]
    fn destroyed_monster_is_not_drawn() {
        use crate::world::canvas::RecordingCanvas;

        let spawn = MonsterSpawn::new(100_100, 20.0, 0.0, 1);
        let appearance = MonsterAppearance {
            stand: walk(),
            movement: None,
        };
        let mut mob = Monster::new(spawn, appearance, Layer::Index(0), 40.0);
        mob.destroy();
        let mut canvas = RecordingCanvas::new();
        mob.draw(&mut canvas, &Camera2D::default(), &FrameTiming::default());
        assert_eq!(canvas.image_count(), 0);
    }
}
