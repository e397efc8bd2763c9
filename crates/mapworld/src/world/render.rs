//! Frame composition. Draw order is fixed; entities only know how to draw
//! themselves.

use super::canvas::{Canvas, DrawImage, Drawable, FrameTiming, Layer, Layered, MAX_LAYER};
use super::entities::{Background, Character, ItemDrop, Monster, Npc, Obj, Portal, Tile};
use super::foothold::FootholdGraph;
use super::geometry::Camera2D;

/// Borrowed view of everything one frame draws.
pub struct Scene<'a> {
    pub backgrounds: &'a [Background],
    pub objects: &'a [Obj],
    pub tiles: &'a [Tile],
    pub monsters: &'a [Monster],
    pub characters: &'a [Character],
    pub npcs: &'a [Npc],
    pub portals: &'a [Portal],
    pub player: Option<&'a Character>,
    pub item_drops: &'a [ItemDrop],
    pub tracked: &'a [Box<dyn Drawable + Send>],
    pub footholds: &'a FootholdGraph,
}

pub fn compose(
    scene: &Scene<'_>,
    canvas: &mut dyn Canvas,
    camera: &Camera2D,
    timing: &FrameTiming,
) {
    for background in scene.backgrounds.iter().filter(|bg| !bg.front) {
        background.draw(canvas, camera, timing);
    }

    for index in 0..=MAX_LAYER {
        let layer = Layer::Index(index);
        draw_layer(scene.objects, layer, canvas, camera, timing);
        draw_layer(scene.tiles, layer, canvas, camera, timing);
        draw_layer(scene.monsters, layer, canvas, camera, timing);
        draw_layer(scene.characters, layer, canvas, camera, timing);
        draw_layer(scene.npcs, layer, canvas, camera, timing);
    }

    draw_layer(scene.monsters, Layer::Overlay, canvas, camera, timing);
    draw_layer(scene.characters, Layer::Overlay, canvas, camera, timing);
    draw_layer(scene.npcs, Layer::Overlay, canvas, camera, timing);

    for portal in scene.portals {
        portal.draw(canvas, camera, timing);
    }

    for background in scene.backgrounds.iter().filter(|bg| bg.front) {
        background.draw(canvas, camera, timing);
    }

    for character in scene.characters {
        draw_level_up(character, canvas, camera);
    }

    if let Some(player) = scene.player {
        player.draw(canvas, camera, timing);
        draw_level_up(player, canvas, camera);
    }

    for drop in scene.item_drops {
        drop.draw(canvas, camera, timing);
    }

    for tracked in scene.tracked {
        tracked.draw(canvas, camera, timing);
    }

    for foothold in scene.footholds.iter() {
        foothold.draw(canvas, camera, timing);
    }
}

fn draw_layer<T: Drawable + Layered>(
    entities: &[T],
    layer: Layer,
    canvas: &mut dyn Canvas,
    camera: &Camera2D,
    timing: &FrameTiming,
) {
    for entity in entities.iter().filter(|entity| entity.layer() == layer) {
        entity.draw(canvas, camera, timing);
    }
}

fn draw_level_up(character: &Character, canvas: &mut dyn Canvas, camera: &Camera2D) {
    let Some(frame) = character.level_up_frame() else {
        return;
    };
    canvas.draw_image(DrawImage::new(
        &frame.image,
        character.position.x - frame.origin_x - camera.x(),
        character.position.y - frame.origin_y - camera.y(),
    ));
}

#[cfg(test)]
mod tests {
    use super::super::canvas::{DrawCall, RecordingCanvas};
    use super::super::entities::{MonsterAppearance, MonsterSpawn};
    use super::super::foothold::Foothold;
    use super::super::geometry::Vec2;
    use super::super::sprites::{Animation, SpriteFrame};
    use super::*;

    fn still(image: &str) -> Animation {
        Animation::looping(vec![SpriteFrame {
            image: image.to_string(),
            origin_x: 10.0,
            origin_y: 20.0,
            width: 20,
            height: 20,
            delay_ms: 100.0,
        }])
    }

    fn monster(image: &str, layer: Layer) -> Monster {
        Monster::new(
            MonsterSpawn::new(100_100, 0.0, 0.0, 0),
            MonsterAppearance {
                stand: still(image),
                movement: None,
            },
            layer,
            0.0,
        )
    }

    struct Marker;

    impl Drawable for Marker {
        fn draw(&self, canvas: &mut dyn Canvas, _camera: &Camera2D, _timing: &FrameTiming) {
            canvas.draw_image(DrawImage::new("marker", 0.0, 0.0));
        }
    }

    #[test]
    fn layers_interleave_entity_kinds_and_overlay_follows() {
        let objects = vec![
            Obj::new(0.0, 0.0, Layer::Index(1), still("obj-1")),
            Obj::new(0.0, 0.0, Layer::Index(0), still("obj-0")),
        ];
        let monsters = vec![
            monster("mob-overlay", Layer::Overlay),
            monster("mob-0", Layer::Index(0)),
        ];
        let characters = vec![
            Character::new("other", Vec2::default(), still("char-1")).with_layer(Layer::Index(1)),
        ];
        let footholds = FootholdGraph::default();
        let scene = Scene {
            backgrounds: &[],
            objects: &objects,
            tiles: &[],
            monsters: &monsters,
            characters: &characters,
            npcs: &[],
            portals: &[],
            player: None,
            item_drops: &[],
            tracked: &[],
            footholds: &footholds,
        };
        let mut canvas = RecordingCanvas::new();
        compose(&scene, &mut canvas, &Camera2D::default(), &FrameTiming::default());

        assert_eq!(
            canvas.images(),
            vec!["obj-0", "mob-0", "obj-1", "char-1", "mob-overlay"]
        );
    }

    #[test]
    fn late_passes_follow_the_scene() {
        let mut player = Character::new("player", Vec2::new(100.0, 200.0), still("player"));
        player.start_level_up(Animation::once(vec![SpriteFrame {
            image: "level-up".to_string(),
            origin_x: 50.0,
            origin_y: 150.0,
            width: 100,
            height: 150,
            delay_ms: 100.0,
        }]));
        let drops = vec![ItemDrop::new(2_000_000, Vec2::default(), still("drop"))];
        let tracked: Vec<Box<dyn Drawable + Send>> = vec![Box::new(Marker)];
        let footholds = FootholdGraph::from_footholds([Foothold::new(
            1,
            0,
            (0.0, 0.0),
            (10.0, 0.0),
        )]);
        let scene = Scene {
            backgrounds: &[],
            objects: &[],
            tiles: &[],
            monsters: &[],
            characters: &[],
            npcs: &[],
            portals: &[],
            player: Some(&player),
            item_drops: &drops,
            tracked: &tracked,
            footholds: &footholds,
        };
        let mut camera = Camera2D::default();
        camera.position = Vec2::new(20.0, 30.0);
        let mut canvas = RecordingCanvas::new();
        compose(&scene, &mut canvas, &camera, &FrameTiming::default());

        assert_eq!(canvas.images(), vec!["player", "level-up", "drop", "marker"]);
        assert_eq!(
            canvas.calls()[1],
            DrawCall::Image {
                image: "level-up".to_string(),
                dx: 30.0,
                dy: 20.0,
                flip: false,
                alpha: 1.0,
            }
        );
        assert!(matches!(canvas.calls().last(), Some(DrawCall::Line(_))));
    }

    #[test]
    fn front_backgrounds_draw_after_portals() {
        let backgrounds = vec![
            Background::from_animation(still("front"), 0, true),
            Background::from_animation(still("back"), 1, false),
        ];
        let footholds = FootholdGraph::default();
        let scene = Scene {
            backgrounds: &backgrounds,
            objects: &[],
            tiles: &[],
            monsters: &[],
            characters: &[],
            npcs: &[],
            portals: &[],
            player: None,
            item_drops: &[],
            tracked: &[],
            footholds: &footholds,
        };
        let mut canvas = RecordingCanvas::new();
        compose(&scene, &mut canvas, &Camera2D::default(), &FrameTiming::default());
        assert_eq!(canvas.images(), vec!["back", "front"]);
    }
}
