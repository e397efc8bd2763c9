use crate::assets::{AssetError, AssetNode, AssetResolver};
use crate::world::canvas::{Canvas, DrawImage, Drawable, FrameTiming, Layer, Layered};
use crate::world::geometry::Camera2D;
use crate::world::sprites::{SpriteCache, SpriteFrame};

#[derive(Debug, Clone)]
pub struct Tile {
    pub set: String,
    pub u: String,
    pub no: i64,
    pub x: f32,
    pub y: f32,
    /// Depth inside the layer, read from the tile canvas.
    pub z: i64,
    pub layer: Layer,
    frame: SpriteFrame,
}

impl Tile {
    /// `layer_set` is the `info/tS` of the owning layer; a tile may override
    /// it with its own `tS`.
    pub async fn from_node(
        node: &AssetNode,
        layer: u8,
        layer_set: Option<&str>,
        cache: &mut SpriteCache,
        assets: &dyn AssetResolver,
    ) -> Result<Self, AssetError> {
        let set = match node.get_text("tS").or(layer_set) {
            Some(set) => set.to_string(),
            None => {
                return Err(AssetError::MissingChild {
                    path: node.path().to_string(),
                    child: "tS".to_string(),
                })
            }
        };
        let u = node.require_text("u")?.to_string();
        let no = node.require_int("no")?;
        let canvas = cache
            .node(assets, &format!("Map.wz/Tile/{set}.img/{u}/{no}"))
            .await?;
        let frame = SpriteFrame::from_canvas(&canvas)?;

        Ok(Self {
            z: canvas.get_int("z").unwrap_or_else(|| node.int_or("zM", 0)),
            set,
            u,
            no,
            x: node.require_int("x")? as f32,
            y: node.require_int("y")? as f32,
            layer: Layer::Index(layer),
            frame,
        })
    }

    pub fn frame(&self) -> &SpriteFrame {
        &self.frame
    }
}

impl Layered for Tile {
    fn layer(&self) -> Layer {
        self.layer
    }
}

impl Drawable for Tile {
    fn draw(&self, canvas: &mut dyn Canvas, camera: &Camera2D, _timing: &FrameTiming) {
        canvas.draw_image(DrawImage::new(
            &self.frame.image,
            self.x - self.frame.origin_x - camera.x(),
            self.y - self.frame.origin_y - camera.y(),
        ));
    }
}
