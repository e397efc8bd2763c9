//! Ground segments of a map.
//!
//! Footholds are stored three levels deep in the map image
//! (`foothold/<layer>/<group>/<id>`). Each segment names its neighbours by
//! id; those links are resolved after every segment is known and stay
//! empty when the id does not exist.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::assets::{AssetError, AssetNode};

use super::canvas::{Canvas, DrawLine, Drawable, FrameTiming, Layer};
use super::geometry::{Boundaries, Camera2D, Vec2};

const HORIZONTAL_MARGIN: f32 = 10.0;
const TOP_MARGIN: f32 = 360.0;
const BOTTOM_MARGIN: f32 = 110.0;

pub type FootholdId = i64;

#[derive(Debug, Clone, PartialEq)]
pub struct Foothold {
    pub id: FootholdId,
    pub layer: i64,
    pub group: i64,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    prev: Option<FootholdId>,
    next: Option<FootholdId>,
}

impl Foothold {
    pub fn new(id: FootholdId, layer: i64, (x1, y1): (f32, f32), (x2, y2): (f32, f32)) -> Self {
        Self {
            id,
            layer,
            group: 0,
            x1,
            y1,
            x2,
            y2,
            prev: None,
            next: None,
        }
    }

    fn from_node(node: &AssetNode, layer: i64, group: i64) -> Result<(Self, i64, i64), AssetError> {
        let id = node.name_as_int().ok_or_else(|| AssetError::WrongType {
            path: node.path().to_string(),
            expected: "a numeric foothold id",
        })?;
        let foothold = Self {
            id,
            layer,
            group,
            x1: node.require_int("x1")? as f32,
            y1: node.require_int("y1")? as f32,
            x2: node.require_int("x2")? as f32,
            y2: node.require_int("y2")? as f32,
            prev: None,
            next: None,
        };
        Ok((foothold, node.int_or("prev", 0), node.int_or("next", 0)))
    }

    pub fn prev(&self) -> Option<FootholdId> {
        self.prev
    }

    pub fn next(&self) -> Option<FootholdId> {
        self.next
    }

    pub fn is_horizontal(&self) -> bool {
        self.y1 == self.y2
    }

    /// Midpoint x and the y of the first endpoint.
    pub fn location_above(&self) -> Vec2 {
        Vec2::new((self.x1 + self.x2) / 2.0, self.y1)
    }
}

impl Drawable for Foothold {
    fn draw(&self, canvas: &mut dyn Canvas, camera: &Camera2D, _timing: &FrameTiming) {
        canvas.draw_line(DrawLine {
            x1: self.x1 - camera.x(),
            y1: self.y1 - camera.y(),
            x2: self.x2 - camera.x(),
            y2: self.y2 - camera.y(),
        });
    }
}

/// All footholds of one map, keyed and iterated by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FootholdGraph {
    footholds: BTreeMap<FootholdId, Foothold>,
}

impl FootholdGraph {
    /// Builds the graph from the map's `foothold` node. A map without one
    /// has no footholds.
    pub fn from_node(root: Option<&AssetNode>) -> Result<Self, AssetError> {
        let mut raw_links = Vec::new();
        let mut footholds = BTreeMap::new();
        for layer_node in root.map(AssetNode::children).unwrap_or_default() {
            let layer = layer_node.name_as_int().unwrap_or(-1);
            for group_node in layer_node.children() {
                let group = group_node.name_as_int().unwrap_or(0);
                for segment in group_node.children() {
                    let (foothold, prev, next) = Foothold::from_node(segment, layer, group)?;
                    raw_links.push((foothold.id, prev, next));
                    footholds.insert(foothold.id, foothold);
                }
            }
        }

        let mut graph = Self { footholds };
        graph.link(raw_links);
        Ok(graph)
    }

    pub fn from_footholds(footholds: impl IntoIterator<Item = Foothold>) -> Self {
        Self {
            footholds: footholds.into_iter().map(|fh| (fh.id, fh)).collect(),
        }
    }

    fn link(&mut self, raw_links: Vec<(FootholdId, i64, i64)>) {
        for (id, prev, next) in raw_links {
            let prev = self.footholds.contains_key(&prev).then_some(prev);
            let next = self.footholds.contains_key(&next).then_some(next);
            if let Some(foothold) = self.footholds.get_mut(&id) {
                foothold.prev = prev;
                foothold.next = next;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.footholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footholds.is_empty()
    }

    pub fn get(&self, id: FootholdId) -> Option<&Foothold> {
        self.footholds.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Foothold> {
        self.footholds.values()
    }

    pub fn location_above_foothold(&self, id: FootholdId) -> Option<Vec2> {
        self.get(id).map(Foothold::location_above)
    }

    pub fn horizontal_footholds(&self) -> Vec<&Foothold> {
        self.iter().filter(|fh| fh.is_horizontal()).collect()
    }

    /// Uniform pick over the flat segments; `None` when there are none.
    pub fn location_above_random_foothold<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec2> {
        self.horizontal_footholds()
            .choose(rng)
            .map(|fh| fh.location_above())
    }

    /// Render layer of whatever stands on foothold `id`.
    pub fn layer_of(&self, id: FootholdId) -> Option<Layer> {
        self.get(id).map(|fh| Layer::from_index(fh.layer))
    }

    /// Extrema of every endpoint, padded so the camera never shows past
    /// the terrain. An empty graph yields a zero box.
    pub fn derived_boundaries(&self) -> Boundaries {
        let mut points = self
            .iter()
            .flat_map(|fh| [(fh.x1, fh.y1), (fh.x2, fh.y2)]);
        let Some((x, y)) = points.next() else {
            return Boundaries::default();
        };
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (x, x, y, y);
        for (x, y) in points {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        Boundaries {
            left: min_x + HORIZONTAL_MARGIN,
            right: max_x - HORIZONTAL_MARGIN,
            top: min_y - TOP_MARGIN,
            bottom: max_y + BOTTOM_MARGIN,
        }
    }
}

/// Prefers the explicit `VRLeft`/`VRRight`/`VRTop`/`VRBottom` box of the
/// map's `info` node; falls back to the foothold extrema.
pub fn derive_boundaries(
    info: Option<&AssetNode>,
    footholds: &FootholdGraph,
) -> Result<Boundaries, AssetError> {
    match info {
        Some(info) if info.has_child("VRLeft") => Ok(Boundaries {
            left: info.require_int("VRLeft")? as f32,
            right: info.require_int("VRRight")? as f32,
            top: info.require_int("VRTop")? as f32,
            bottom: info.require_int("VRBottom")? as f32,
        }),
        _ => Ok(footholds.derived_boundaries()),
    }
}
