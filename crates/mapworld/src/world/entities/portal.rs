use crate::assets::{AssetError, AssetNode, AssetResolver};
use crate::world::canvas::{Canvas, DrawImage, Drawable, FrameTiming};
use crate::world::geometry::Camera2D;
use crate::world::map_id::MapId;
use crate::world::sprites::{Animation, SpriteCache};

/// Portal type whose sprite is drawn in the world.
pub const VISIBLE_PORTAL_TYPE: i64 = 2;
/// Target map id meaning "no destination".
const NO_TARGET_MAP: i64 = 999_999_999;
const VISIBLE_PORTAL_SPRITE: &str = "Map.wz/MapHelper.img/portal/game/pv";

#[derive(Debug, Clone)]
pub struct Portal {
    pub name: String,
    pub kind: i64,
    pub x: f32,
    pub y: f32,
    pub target_map: Option<MapId>,
    pub target_portal: String,
    animation: Option<Animation>,
}

impl Portal {
    pub async fn from_node(
        node: &AssetNode,
        cache: &mut SpriteCache,
        assets: &dyn AssetResolver,
    ) -> Result<Self, AssetError> {
        let kind = node.require_int("pt")?;
        let animation = if kind == VISIBLE_PORTAL_TYPE {
            Some(cache.animation(assets, VISIBLE_PORTAL_SPRITE).await?)
        } else {
            None
        };
        let target_map = match node.int_or("tm", NO_TARGET_MAP) {
            NO_TARGET_MAP => None,
            id => u32::try_from(id).ok().map(MapId::Field),
        };

        Ok(Self {
            name: node.text_or("pn", ""),
            kind,
            x: node.require_int("x")? as f32,
            y: node.require_int("y")? as f32,
            target_map,
            target_portal: node.text_or("tn", ""),
            animation,
        })
    }

    pub fn is_visible(&self) -> bool {
        self.animation.is_some()
    }

    pub fn update(&mut self, tick_ms: f32) {
        if let Some(animation) = &mut self.animation {
            animation.update(tick_ms);
        }
    }
}

impl Drawable for Portal {
    fn draw(&self, canvas: &mut dyn Canvas, camera: &Camera2D, _timing: &FrameTiming) {
        let Some(frame) = self.animation.as_ref().and_then(Animation::current) else {
            return;
        };
        canvas.draw_image(DrawImage::new(
            &frame.image,
            self.x - frame.origin_x - camera.x(),
            self.y - frame.origin_y - camera.y(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use crate::assets::MemoryAssetStore;

    use super::*;

    fn portal_node(pt: i64, tm: i64) -> AssetNode {
        AssetNode::dir("0")
            .with_child(AssetNode::text("pn", "east00"))
            .with_child(AssetNode::int("pt", pt))
            .with_child(AssetNode::int("x", 10))
            .with_child(AssetNode::int("y", 20))
            .with_child(AssetNode::int("tm", tm))
            .with_child(AssetNode::text("tn", "west00"))
    }

    #[tokio::test]
    async fn spawn_points_need_no_sprite_and_have_no_target() {
        let store = MemoryAssetStore::new();
        let mut cache = SpriteCache::new();
        let portal = Portal::from_node(&portal_node(0, 999_999_999), &mut cache, &store)
            .await
            .expect("portal");
        assert!(!portal.is_visible());
        assert_eq!(portal.target_map, None);
        assert_eq!(portal.name, "east00");
    }

    #[tokio::test]
    async fn visible_portal_loads_helper_sprite() {
        let store = MemoryAssetStore::new().with_image(
            "Map.wz/MapHelper.img",
            AssetNode::dir("MapHelper.img").with_child(
                AssetNode::dir("portal").with_child(
                    AssetNode::dir("game").with_child(
                        AssetNode::dir("pv").with_child(AssetNode::canvas("0", 90, 120)),
                    ),
                ),
            ),
        );
        let mut cache = SpriteCache::new();
        let portal = Portal::from_node(&portal_node(2, 104_040_000), &mut cache, &store)
            .await
            .expect("portal");
        assert!(portal.is_visible());
        assert_eq!(portal.target_map, Some(MapId::Field(104_040_000)));
    }
}
