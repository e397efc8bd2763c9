//! In-memory map images for world tests.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::assets::{AssetError, AssetNode, AssetResolver, MemoryAssetStore};

use super::map_id::{name_area, MapId};

pub(crate) const TILE_SET: &str = "woodMarble";
pub(crate) const OBJ_SET: &str = "houseGS";

/// Canvas every fixture sprite uses: 40x60 anchored at its bottom centre.
fn sprite_canvas(name: &str) -> AssetNode {
    AssetNode::canvas(name, 40, 60).with_child(AssetNode::vector("origin", 20, 60))
}

fn frames_dir(name: &str) -> AssetNode {
    AssetNode::dir(name).with_child(sprite_canvas("0"))
}

type Point = (i64, i64);

enum LifeFixture {
    Npc { id: u32, pos: Point, fh: i64 },
    Monster { id: u32, pos: Point, fh: i64 },
}

pub(crate) struct MapFixture {
    id: u32,
    town: bool,
    bgm: Option<String>,
    return_map: Option<u32>,
    explicit_bounds: Option<[i64; 4]>,
    footholds: Vec<(i64, i64, i64, Point, Point)>,
    backgrounds: Vec<(String, i64, bool)>,
    tiles: Vec<(u8, i64, Point)>,
    objects: Vec<(u8, i64, i64, Point)>,
    portals: Vec<(i64, Point, i64)>,
    life: Vec<LifeFixture>,
    npc_templates: Vec<(u32, Option<u32>)>,
    names: bool,
}

impl MapFixture {
    pub(crate) fn new(id: u32) -> Self {
        Self {
            id,
            town: false,
            bgm: None,
            return_map: None,
            explicit_bounds: None,
            footholds: Vec::new(),
            backgrounds: Vec::new(),
            tiles: Vec::new(),
            objects: Vec::new(),
            portals: Vec::new(),
            life: Vec::new(),
            npc_templates: Vec::new(),
            names: true,
        }
    }

    pub(crate) fn map_id(&self) -> MapId {
        MapId::Field(self.id)
    }

    pub(crate) fn town(mut self) -> Self {
        self.town = true;
        self
    }

    pub(crate) fn bgm(mut self, track: &str) -> Self {
        self.bgm = Some(track.to_string());
        self
    }

    pub(crate) fn return_map(mut self, id: u32) -> Self {
        self.return_map = Some(id);
        self
    }

    pub(crate) fn explicit_bounds(mut self, left: i64, right: i64, top: i64, bottom: i64) -> Self {
        self.explicit_bounds = Some([left, right, top, bottom]);
        self
    }

    pub(crate) fn foothold(
        mut self,
        layer: i64,
        group: i64,
        id: i64,
        from: Point,
        to: Point,
    ) -> Self {
        self.footholds.push((layer, group, id, from, to));
        self
    }

    /// An empty `set` produces a background entry the loader must skip.
    pub(crate) fn background(mut self, set: &str, z: i64, front: bool) -> Self {
        self.backgrounds.push((set.to_string(), z, front));
        self
    }

    pub(crate) fn tile(mut self, layer: u8, z: i64, pos: Point) -> Self {
        self.tiles.push((layer, z, pos));
        self
    }

    pub(crate) fn object(mut self, layer: u8, z: i64, zid: i64, pos: Point) -> Self {
        self.objects.push((layer, z, zid, pos));
        self
    }

    pub(crate) fn portal(mut self, pt: i64, pos: Point, target: i64) -> Self {
        self.portals.push((pt, pos, target));
        self
    }

    pub(crate) fn npc(mut self, id: u32, pos: Point, fh: i64) -> Self {
        self.life.push(LifeFixture::Npc { id, pos, fh });
        self
    }

    pub(crate) fn monster(mut self, id: u32, pos: Point, fh: i64) -> Self {
        self.life.push(LifeFixture::Monster { id, pos, fh });
        self
    }

    /// NPC template with strings, optionally linking to another template's
    /// sprites.
    pub(crate) fn npc_template(mut self, id: u32, link: Option<u32>) -> Self {
        self.npc_templates.push((id, link));
        self
    }

    pub(crate) fn without_names(mut self) -> Self {
        self.names = false;
        self
    }

    pub(crate) fn build(&self) -> MemoryAssetStore {
        Self::build_all(std::slice::from_ref(self))
    }

    /// One store holding the images of several maps.
    pub(crate) fn build_all(fixtures: &[MapFixture]) -> MemoryAssetStore {
        let mut images = Images::default();
        for fixture in fixtures {
            fixture.write(&mut images);
        }
        images.into_store()
    }

    fn write(&self, images: &mut Images) {
        let map_path = self.map_id().asset_path();
        images.root(&map_path);
        images.set(&map_path, "info/town", AssetNode::int("town", i64::from(self.town)));
        if let Some(bgm) = &self.bgm {
            images.set(&map_path, "info/bgm", AssetNode::text("bgm", bgm.as_str()));
        }
        if let Some(return_map) = self.return_map {
            images.set(
                &map_path,
                "info/returnMap",
                AssetNode::int("returnMap", i64::from(return_map)),
            );
        }
        if let Some(bounds) = self.explicit_bounds {
            let names = ["VRLeft", "VRRight", "VRTop", "VRBottom"];
            for (name, value) in names.into_iter().zip(bounds) {
                images.set(&map_path, &format!("info/{name}"), AssetNode::int(name, value));
            }
        }

        for (layer, group, id, (x1, y1), (x2, y2)) in &self.footholds {
            let segment = AssetNode::dir("fh")
                .with_child(AssetNode::int("x1", *x1))
                .with_child(AssetNode::int("y1", *y1))
                .with_child(AssetNode::int("x2", *x2))
                .with_child(AssetNode::int("y2", *y2))
                .with_child(AssetNode::int("prev", 0))
                .with_child(AssetNode::int("next", 0));
            images.set(&map_path, &format!("foothold/{layer}/{group}/{id}"), segment);
        }

        let mut back_sets = BTreeSet::new();
        for (index, (set, z, front)) in self.backgrounds.iter().enumerate() {
            let node = AssetNode::dir("back")
                .with_child(AssetNode::text("bS", set.as_str()))
                .with_child(AssetNode::int("no", 0))
                .with_child(AssetNode::int("x", 0))
                .with_child(AssetNode::int("y", 0))
                .with_child(AssetNode::int("z", *z))
                .with_child(AssetNode::int("front", i64::from(*front)));
            images.set(&map_path, &format!("back/{index}"), node);
            if !set.is_empty() {
                back_sets.insert(set.clone());
            }
        }
        for set in back_sets {
            images.set(
                &format!("Map.wz/Back/{set}.img"),
                "back/0",
                sprite_canvas("0"),
            );
        }

        for (index, (layer, z, (x, y))) in self.tiles.iter().enumerate() {
            images.set(&map_path, &format!("{layer}/info/tS"), AssetNode::text("tS", TILE_SET));
            let node = AssetNode::dir("tile")
                .with_child(AssetNode::text("u", "bsc"))
                .with_child(AssetNode::int("no", index as i64))
                .with_child(AssetNode::int("x", *x))
                .with_child(AssetNode::int("y", *y));
            images.set(&map_path, &format!("{layer}/tile/{index}"), node);
            images.set(
                &format!("Map.wz/Tile/{TILE_SET}.img"),
                &format!("bsc/{index}"),
                sprite_canvas("0").with_child(AssetNode::int("z", *z)),
            );
        }

        for (index, (layer, z, zid, (x, y))) in self.objects.iter().enumerate() {
            let node = AssetNode::dir("obj")
                .with_child(AssetNode::text("oS", OBJ_SET))
                .with_child(AssetNode::text("l0", "house"))
                .with_child(AssetNode::text("l1", "0"))
                .with_child(AssetNode::text("l2", "0"))
                .with_child(AssetNode::int("x", *x))
                .with_child(AssetNode::int("y", *y))
                .with_child(AssetNode::int("z", *z))
                .with_child(AssetNode::int("zid", *zid));
            images.set(&map_path, &format!("{layer}/obj/{index}"), node);
        }
        if !self.objects.is_empty() {
            images.set(&format!("Map.wz/Obj/{OBJ_SET}.img"), "house/0/0", frames_dir("0"));
        }

        for (index, (pt, (x, y), target)) in self.portals.iter().enumerate() {
            let node = AssetNode::dir("portal")
                .with_child(AssetNode::text("pn", format!("portal{index}")))
                .with_child(AssetNode::int("pt", *pt))
                .with_child(AssetNode::int("x", *x))
                .with_child(AssetNode::int("y", *y))
                .with_child(AssetNode::int("tm", *target))
                .with_child(AssetNode::text("tn", ""));
            images.set(&map_path, &format!("portal/{index}"), node);
        }
        if self.portals.iter().any(|(pt, _, _)| *pt == 2) {
            images.set("Map.wz/MapHelper.img", "portal/game/pv", frames_dir("pv"));
        }

        for (index, life) in self.life.iter().enumerate() {
            let node = match life {
                LifeFixture::Npc { id, pos: (x, cy), fh } => {
                    images.set(&format!("Npc.wz/{id:07}.img"), "stand", frames_dir("stand"));
                    AssetNode::dir("life")
                        .with_child(AssetNode::text("type", "n"))
                        .with_child(AssetNode::text("id", id.to_string()))
                        .with_child(AssetNode::int("x", *x))
                        .with_child(AssetNode::int("cy", *cy))
                        .with_child(AssetNode::int("fh", *fh))
                }
                LifeFixture::Monster { id, pos: (x, y), fh } => {
                    let image = format!("Mob.wz/{id:07}.img");
                    images.set(&image, "stand", frames_dir("stand"));
                    images.set(&image, "move", frames_dir("move"));
                    AssetNode::dir("life")
                        .with_child(AssetNode::text("type", "m"))
                        .with_child(AssetNode::text("id", format!("{id:07}")))
                        .with_child(AssetNode::int("x", *x))
                        .with_child(AssetNode::int("y", *y))
                        .with_child(AssetNode::int("cy", *y))
                        .with_child(AssetNode::int("fh", *fh))
                        .with_child(AssetNode::int("rx0", *x - 50))
                        .with_child(AssetNode::int("rx1", *x + 50))
                }
            };
            images.set(&map_path, &format!("life/{index}"), node);
        }

        for (id, link) in &self.npc_templates {
            let image = format!("Npc.wz/{id:07}.img");
            match link {
                Some(target) => {
                    images.set(&image, "info/link", AssetNode::text("link", target.to_string()));
                    images.set(&format!("Npc.wz/{target:07}.img"), "stand", frames_dir("stand"));
                }
                None => images.set(&image, "stand", frames_dir("stand")),
            }
            let strings = AssetNode::dir("strings")
                .with_child(AssetNode::text("name", format!("NPC {id}")))
                .with_child(AssetNode::text("d1", "line 1"))
                .with_child(AssetNode::text("d0", "line 0"));
            images.set("String.wz/Npc.img", &id.to_string(), strings);
        }

        if self.names {
            let names = AssetNode::dir("names")
                .with_child(AssetNode::text("streetName", "Fixture Street"))
                .with_child(AssetNode::text("mapName", format!("Fixture {}", self.id)));
            images.set(
                "String.wz/Map.img",
                &format!("{}/{}", name_area(self.id), self.id),
                names,
            );
        }
    }
}

#[derive(Default)]
struct Images {
    roots: BTreeMap<String, AssetNode>,
}

impl Images {
    fn root(&mut self, image_path: &str) -> &mut AssetNode {
        self.roots
            .entry(image_path.to_string())
            .or_insert_with(|| {
                let name = image_path.rsplit('/').next().unwrap_or(image_path);
                AssetNode::dir(name)
            })
    }

    fn set(&mut self, image_path: &str, rel_path: &str, node: AssetNode) {
        self.root(image_path).insert_at(rel_path, node);
    }

    fn into_store(self) -> MemoryAssetStore {
        let mut store = MemoryAssetStore::new();
        for (path, node) in self.roots {
            store.insert(path, node);
        }
        store
    }
}

/// Wraps a store and never completes fetches whose path starts with
/// `stalled_prefix`.
pub(crate) struct StallingResolver {
    pub(crate) inner: MemoryAssetStore,
    pub(crate) stalled_prefix: String,
}

#[async_trait]
impl AssetResolver for StallingResolver {
    async fn resolve(&self, path: &str) -> Result<AssetNode, AssetError> {
        if path.starts_with(&self.stalled_prefix) {
            std::future::pending::<()>().await;
        }
        self.inner.resolve(path).await
    }
}
