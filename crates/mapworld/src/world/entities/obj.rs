use crate::assets::{AssetError, AssetNode, AssetResolver};
use crate::world::canvas::{Canvas, DrawImage, Drawable, FrameTiming, Layer, Layered};
use crate::world::geometry::Camera2D;
use crate::world::sprites::{Animation, SpriteCache};

/// Decorative map object.
#[derive(Debug, Clone)]
pub struct Obj {
    pub set: String,
    pub l0: String,
    pub l1: String,
    pub l2: String,
    pub x: f32,
    pub y: f32,
    pub z: i64,
    pub zid: i64,
    pub flip: bool,
    pub layer: Layer,
    animation: Animation,
}

impl Obj {
    pub async fn from_node(
        node: &AssetNode,
        layer: u8,
        cache: &mut SpriteCache,
        assets: &dyn AssetResolver,
    ) -> Result<Self, AssetError> {
        let set = node.require_text("oS")?.to_string();
        let l0 = node.require_text_or_int("l0")?;
        let l1 = node.require_text_or_int("l1")?;
        let l2 = node.require_text_or_int("l2")?;
        let animation = cache
            .animation(assets, &format!("Map.wz/Obj/{set}.img/{l0}/{l1}/{l2}"))
            .await?;

        Ok(Self {
            x: node.require_int("x")? as f32,
            y: node.require_int("y")? as f32,
            z: node.int_or("z", 0),
            zid: node.int_or("zid", 0),
            flip: node.int_or("f", 0) != 0,
            layer: Layer::Index(layer),
            set,
            l0,
            l1,
            l2,
            animation,
        })
    }

    pub fn new(x: f32, y: f32, layer: Layer, animation: Animation) -> Self {
        Self {
            set: String::new(),
            l0: String::new(),
            l1: String::new(),
            l2: String::new(),
            x,
            y,
            z: 0,
            zid: 0,
            flip: false,
            layer,
            animation,
        }
    }

    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    pub fn update(&mut self, tick_ms: f32) {
        self.animation.update(tick_ms);
    }
}

impl Layered for Obj {
    fn layer(&self) -> Layer {
        self.layer
    }
}

impl Drawable for Obj {
    fn draw(&self, canvas: &mut dyn Canvas, camera: &Camera2D, _timing: &FrameTiming) {
        let Some(frame) = self.animation.current() else {
            return;
        };
        canvas.draw_image(
            DrawImage::new(
                &frame.image,
                self.x - frame.origin_x - camera.x(),
                self.y - frame.origin_y - camera.y(),
            )
            .flipped(self.flip),
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::assets::MemoryAssetStore;
    use crate::world::canvas::RecordingCanvas;

    use super::*;

    #[tokio::test]
    async fn resolves_animation_from_three_level_path() {
        let store = MemoryAssetStore::new().with_image(
            "Map.wz/Obj/houseGS.img",
            AssetNode::dir("houseGS.img").with_child(
                AssetNode::dir("house").with_child(
                    AssetNode::dir("3").with_child(
                        AssetNode::dir("0")
                            .with_child(AssetNode::canvas("0", 10, 10))
                            .with_child(AssetNode::canvas("1", 10, 10)),
                    ),
                ),
            ),
        );
        let node = AssetNode::dir("5")
            .with_child(AssetNode::text("oS", "houseGS"))
            .with_child(AssetNode::text("l0", "house"))
            .with_child(AssetNode::int("l1", 3))
            .with_child(AssetNode::text("l2", "0"))
            .with_child(AssetNode::int("x", 40))
            .with_child(AssetNode::int("y", 60))
            .with_child(AssetNode::int("z", 2))
            .with_child(AssetNode::int("zid", 9))
            .with_child(AssetNode::int("f", 1));
        let mut cache = SpriteCache::new();
        let mut obj = Obj::from_node(&node, 2, &mut cache, &store)
            .await
            .expect("obj");
        assert_eq!((obj.z, obj.zid), (2, 9));
        assert_eq!(obj.animation().frames().len(), 2);

        obj.update(100.0);
        let mut canvas = RecordingCanvas::new();
        obj.draw(&mut canvas, &Camera2D::default(), &FrameTiming::default());
        assert_eq!(canvas.images(), vec!["Map.wz/Obj/houseGS.img/house/3/0/1"]);
    }
}
