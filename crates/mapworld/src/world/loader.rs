//! Map load pipeline.
//!
//! Turns a [`MapId`] into a fully built [`LoadedMap`]. The loader never
//! touches a `World`; the caller commits the result, which lets a host keep
//! ticking the (gated) world while a load is suspended on asset fetches.

use std::sync::Arc;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::assets::{AssetError, AssetNode, AssetResolver};

use super::audio::MusicPlayer;
use super::canvas::MAX_LAYER;
use super::config::WorldConfig;
use super::entities::{
    Background, MonsterAppearance, MonsterSpawn, NpcAppearance, NpcSpawn, Obj, Portal, Tile,
};
use super::foothold::{derive_boundaries, FootholdGraph};
use super::geometry::Boundaries;
use super::map_id::MapId;
use super::names::{load_map_names, MapNames};
use super::registry::{EntityRegistry, SpawnContext};
use super::sprites::SpriteCache;

const NPC_STRINGS_PATH: &str = "String.wz/Npc.img";
const LIFE_TYPE_NPC: &str = "n";
const LIFE_TYPE_MONSTER: &str = "m";

#[derive(Debug, Error)]
pub enum WorldError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("invalid value for '{field}' at {path}: {message}")]
    InvalidField {
        path: String,
        field: &'static str,
        message: String,
    },
}

/// Values of a map's `info` node the world keeps after loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapInfo {
    pub is_town: bool,
    pub bgm: Option<String>,
    pub return_map: Option<MapId>,
}

impl MapInfo {
    fn from_node(info: Option<&AssetNode>) -> Result<Self, WorldError> {
        let Some(info) = info else {
            return Ok(Self::default());
        };
        let return_map = match info.get_int("returnMap") {
            None => None,
            Some(raw) => Some(u32::try_from(raw).map(MapId::Field).map_err(|_| {
                WorldError::InvalidField {
                    path: info.path().to_string(),
                    field: "returnMap",
                    message: format!("{raw} is not a map id"),
                }
            })?),
        };
        Ok(Self {
            is_town: info.int_or("town", 0) != 0,
            bgm: info
                .get_text("bgm")
                .filter(|bgm| !bgm.is_empty())
                .map(str::to_string),
            return_map,
        })
    }
}

/// Everything one load produced, ready to be committed to a world.
#[derive(Debug, Clone)]
pub struct LoadedMap {
    pub map_id: MapId,
    pub info: MapInfo,
    pub footholds: FootholdGraph,
    pub boundaries: Boundaries,
    pub backgrounds: Vec<Background>,
    pub tiles: Vec<Tile>,
    pub objects: Vec<Obj>,
    pub portals: Vec<Portal>,
    pub names: MapNames,
    pub entities: EntityRegistry,
}

#[derive(Clone)]
pub struct WorldLoader {
    assets: Arc<dyn AssetResolver>,
    music: Arc<dyn MusicPlayer>,
    config: WorldConfig,
}

impl WorldLoader {
    pub fn new(
        assets: Arc<dyn AssetResolver>,
        music: Arc<dyn MusicPlayer>,
        config: WorldConfig,
    ) -> Self {
        Self {
            assets,
            music,
            config,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub async fn load(&self, map_id: MapId) -> Result<LoadedMap, WorldError> {
        let started = Instant::now();
        let path = map_id.asset_path();
        let map = self.assets.resolve(&path).await?;

        let info_node = match map_id {
            MapId::Login => map.child("info"),
            MapId::Field(_) => Some(map.require_child("info")?),
        };
        let info = MapInfo::from_node(info_node)?;
        debug!(map_id = %map_id, path, is_town = info.is_town, "map_image_resolved");

        if let Some(bgm) = &info.bgm {
            self.music.play_background_music(bgm);
        }

        let footholds = FootholdGraph::from_node(map.child("foothold"))?;
        let boundaries = derive_boundaries(info_node, &footholds)?;

        let mut cache = SpriteCache::new();
        let backgrounds = self.load_backgrounds(&map, &mut cache).await?;
        let tiles = self.load_tiles(&map, &mut cache).await?;
        let objects = self.load_objects(&map, &mut cache).await?;
        let portals = self.load_portals(&map, &mut cache).await?;
        let names = load_map_names(self.assets.as_ref(), map_id).await;

        let mut entities = EntityRegistry::new();
        let ctx = SpawnContext {
            map_id,
            footholds: &footholds,
            config: &self.config,
        };
        let life = map.child("life").map(AssetNode::children).unwrap_or_default();
        self.load_npcs(life, &ctx, &mut entities, &mut cache).await?;
        self.load_monsters(life, &ctx, &mut entities, &mut cache).await?;

        info!(
            map_id = %map_id,
            map_name = %names.map_name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            footholds = footholds.len(),
            backgrounds = backgrounds.len(),
            tiles = tiles.len(),
            objects = objects.len(),
            portals = portals.len(),
            npcs = entities.npcs().len(),
            monsters = entities.monsters().len(),
            sprite_images = cache.cached_images(),
            "map_load_complete"
        );

        Ok(LoadedMap {
            map_id,
            info,
            footholds,
            boundaries,
            backgrounds,
            tiles,
            objects,
            portals,
            names,
            entities,
        })
    }

    /// Backgrounds with an empty set name are skipped. Stable sort by z.
    async fn load_backgrounds(
        &self,
        map: &AssetNode,
        cache: &mut SpriteCache,
    ) -> Result<Vec<Background>, WorldError> {
        let mut backgrounds = Vec::new();
        for node in map.child("back").map(AssetNode::children).unwrap_or_default() {
            if node.get_text("bS").unwrap_or_default().is_empty() {
                continue;
            }
            backgrounds.push(Background::from_node(node, cache, self.assets.as_ref()).await?);
        }
        backgrounds.sort_by_key(|bg| bg.z);
        Ok(backgrounds)
    }

    async fn load_tiles(
        &self,
        map: &AssetNode,
        cache: &mut SpriteCache,
    ) -> Result<Vec<Tile>, WorldError> {
        let mut tiles = Vec::new();
        for layer in 0..=MAX_LAYER {
            let Some(layer_node) = map.child(&layer.to_string()) else {
                continue;
            };
            let layer_set = layer_node
                .descend("info/tS")
                .and_then(AssetNode::as_text)
                .filter(|set| !set.is_empty());
            for node in layer_node
                .child("tile")
                .map(AssetNode::children)
                .unwrap_or_default()
            {
                tiles.push(
                    Tile::from_node(node, layer, layer_set, cache, self.assets.as_ref()).await?,
                );
            }
        }
        tiles.sort_by_key(|tile| tile.z);
        Ok(tiles)
    }

    /// Objects across all layers, sorted by `(z, zid)`.
    async fn load_objects(
        &self,
        map: &AssetNode,
        cache: &mut SpriteCache,
    ) -> Result<Vec<Obj>, WorldError> {
        let mut objects = Vec::new();
        for layer in 0..=MAX_LAYER {
            let Some(layer_node) = map.child(&layer.to_string()) else {
                continue;
            };
            for node in layer_node
                .child("obj")
                .map(AssetNode::children)
                .unwrap_or_default()
            {
                objects.push(Obj::from_node(node, layer, cache, self.assets.as_ref()).await?);
            }
        }
        objects.sort_by_key(|obj| (obj.z, obj.zid));
        Ok(objects)
    }

    async fn load_portals(
        &self,
        map: &AssetNode,
        cache: &mut SpriteCache,
    ) -> Result<Vec<Portal>, WorldError> {
        let mut portals = Vec::new();
        for node in map.child("portal").map(AssetNode::children).unwrap_or_default() {
            portals.push(Portal::from_node(node, cache, self.assets.as_ref()).await?);
        }
        Ok(portals)
    }

    async fn load_npcs(
        &self,
        life: &[AssetNode],
        ctx: &SpawnContext<'_>,
        entities: &mut EntityRegistry,
        cache: &mut SpriteCache,
    ) -> Result<(), WorldError> {
        for node in life {
            if node.require_text("type")? != LIFE_TYPE_NPC {
                continue;
            }
            let spawn = NpcSpawn::from_life_node(node)?;
            let appearance = self.npc_appearance(cache, spawn.id).await?;
            entities.spawn_npc(spawn, appearance, ctx);
        }
        Ok(())
    }

    async fn load_monsters(
        &self,
        life: &[AssetNode],
        ctx: &SpawnContext<'_>,
        entities: &mut EntityRegistry,
        cache: &mut SpriteCache,
    ) -> Result<(), WorldError> {
        for node in life {
            if node.require_text("type")? != LIFE_TYPE_MONSTER {
                continue;
            }
            let spawn = MonsterSpawn::from_life_node(node)?;
            let appearance = self.monster_appearance(cache, spawn.id).await?;
            entities.spawn_monster(spawn, appearance, ctx);
        }
        Ok(())
    }

    /// Sprites of NPC template `id` plus its name and speech lines. The
    /// strings are optional.
    pub async fn npc_appearance(
        &self,
        cache: &mut SpriteCache,
        id: u32,
    ) -> Result<NpcAppearance, WorldError> {
        let image = self.template_image(cache, "Npc.wz", id).await?;
        let stand = cache
            .animation(self.assets.as_ref(), &format!("{image}/stand"))
            .await?;

        let mut appearance = NpcAppearance {
            stand,
            ..NpcAppearance::default()
        };
        match self.assets.resolve(&format!("{NPC_STRINGS_PATH}/{id}")).await {
            Ok(strings) => {
                appearance.name = strings.text_or("name", "");
                appearance.lines = speech_lines(&strings);
            }
            Err(error) => {
                debug!(npc_id = id, error = %error, "npc_strings_lookup_miss");
            }
        }
        Ok(appearance)
    }

    pub async fn monster_appearance(
        &self,
        cache: &mut SpriteCache,
        id: u32,
    ) -> Result<MonsterAppearance, WorldError> {
        let image = self.template_image(cache, "Mob.wz", id).await?;
        let assets = self.assets.as_ref();
        let stand = cache.animation(assets, &format!("{image}/stand")).await?;
        let move_path = format!("{image}/move");
        let movement = match cache.optional_node(assets, &move_path).await? {
            Some(_) => Some(cache.animation(assets, &move_path).await?),
            None => None,
        };
        Ok(MonsterAppearance { stand, movement })
    }

    /// Image path of a life template, following one `info/link` redirect.
    async fn template_image(
        &self,
        cache: &mut SpriteCache,
        archive: &str,
        id: u32,
    ) -> Result<String, WorldError> {
        let image = format!("{archive}/{id:07}.img");
        let link_path = format!("{image}/info/link");
        let Some(link) = cache.optional_node(self.assets.as_ref(), &link_path).await? else {
            return Ok(image);
        };
        let linked = link
            .as_int()
            .and_then(|raw| u32::try_from(raw).ok())
            .ok_or_else(|| WorldError::InvalidField {
                path: link_path.clone(),
                field: "link",
                message: "expected a template id".to_string(),
            })?;
        Ok(format!("{archive}/{linked:07}.img"))
    }
}

/// `d0`, `d1`, ... in numeric order.
fn speech_lines(strings: &AssetNode) -> Vec<String> {
    let mut lines = strings
        .children()
        .iter()
        .filter_map(|child| {
            let index = child.name().strip_prefix('d')?.parse::<u32>().ok()?;
            Some((index, child.as_text()?.to_string()))
        })
        .collect::<Vec<_>>();
    lines.sort_by_key(|(index, _)| *index);
    lines.into_iter().map(|(_, line)| line).collect()
}

#[cfg(test)]
mod tests {
    use crate::assets::MemoryAssetStore;
    use crate::world::audio::MockMusicPlayer;
    use crate::world::canvas::Layer;
    use crate::world::entities::NpcKind;
    use crate::world::test_support::MapFixture;

    use super::*;

    fn loader_with(store: MemoryAssetStore, music: MockMusicPlayer) -> WorldLoader {
        WorldLoader::new(Arc::new(store), Arc::new(music), WorldConfig::default())
    }

    fn quiet_music() -> MockMusicPlayer {
        let mut music = MockMusicPlayer::new();
        music.expect_play_background_music().return_const(());
        music
    }

    #[tokio::test]
    async fn town_without_explicit_bounds_derives_them_from_footholds() {
        let fixture = MapFixture::new(100_000_000)
            .town()
            .foothold(0, 1, 1, (0, 500), (500, 500))
            .foothold(0, 1, 2, (500, 500), (1000, 0));
        let loader = loader_with(fixture.build(), quiet_music());

        let loaded = loader.load(MapId::Field(100_000_000)).await.expect("load");
        assert!(loaded.info.is_town);
        assert_eq!(
            loaded.boundaries,
            Boundaries {
                left: 10.0,
                right: 990.0,
                top: -360.0,
                bottom: 610.0,
            }
        );
    }

    #[tokio::test]
    async fn plays_bgm_without_waiting() {
        let fixture = MapFixture::new(100_000_000).bgm("Bgm00/FloralLife");
        let mut music = MockMusicPlayer::new();
        music
            .expect_play_background_music()
            .withf(|track: &str| track == "Bgm00/FloralLife")
            .times(1)
            .return_const(());
        let loader = loader_with(fixture.build(), music);
        loader.load(MapId::Field(100_000_000)).await.expect("load");
    }

    #[tokio::test]
    async fn skips_backgrounds_without_set_and_sorts_by_z() {
        let fixture = MapFixture::new(100_000_000)
            .background("grassySoil", 5, false)
            .background("", 0, false)
            .background("grassySoil", 1, true);
        let loader = loader_with(fixture.build(), quiet_music());

        let loaded = loader.load(MapId::Field(100_000_000)).await.expect("load");
        let order = loaded
            .backgrounds
            .iter()
            .map(|bg| (bg.z, bg.front))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![(1, true), (5, false)]);
    }

    #[tokio::test]
    async fn objects_sort_by_z_then_zid_and_tiles_by_z() {
        let fixture = MapFixture::new(100_000_000)
            .object(1, 3, 2, (0, 0))
            .object(0, 3, 1, (0, 0))
            .object(4, 0, 7, (0, 0))
            .tile(2, 6, (0, 0))
            .tile(0, 1, (0, 0));
        let loader = loader_with(fixture.build(), quiet_music());

        let loaded = loader.load(MapId::Field(100_000_000)).await.expect("load");
        let objects = loaded
            .objects
            .iter()
            .map(|obj| (obj.z, obj.zid))
            .collect::<Vec<_>>();
        assert_eq!(objects, vec![(0, 7), (3, 1), (3, 2)]);
        let tiles = loaded
            .tiles
            .iter()
            .map(|tile| (tile.z, tile.layer))
            .collect::<Vec<_>>();
        assert_eq!(tiles, vec![(1, Layer::Index(0)), (6, Layer::Index(2))]);
    }

    #[tokio::test]
    async fn life_is_split_by_type_and_spawned_in_node_order() {
        let fixture = MapFixture::new(100_000_000)
            .foothold(3, 1, 20, (0, 100), (300, 100))
            .npc(1_012_000, (50, 100), 20)
            .monster(100_100, (60, 100), 20)
            .npc(1_012_100, (150, 100), 99)
            .monster(100_101, (70, 100), 20);
        let loader = loader_with(fixture.build(), quiet_music());

        let loaded = loader.load(MapId::Field(100_000_000)).await.expect("load");
        let npcs = loaded
            .entities
            .npcs()
            .iter()
            .map(|npc| (npc.id, npc.kind, npc.layer))
            .collect::<Vec<_>>();
        assert_eq!(
            npcs,
            vec![
                (1_012_000, NpcKind::Taxi, Layer::Index(3)),
                (1_012_100, NpcKind::Standard, Layer::Overlay),
            ]
        );
        let monsters = loaded
            .entities
            .monsters()
            .iter()
            .map(|mob| mob.id)
            .collect::<Vec<_>>();
        assert_eq!(monsters, vec![100_100, 100_101]);
        assert!(loaded.entities.characters().is_empty());
    }

    #[tokio::test]
    async fn missing_map_image_aborts_with_not_found() {
        let loader = loader_with(MemoryAssetStore::new(), MockMusicPlayer::new());
        let err = loader
            .load(MapId::Field(100_000_000))
            .await
            .expect_err("missing");
        assert!(matches!(err, WorldError::Asset(ref error) if error.is_not_found()));
    }

    #[tokio::test]
    async fn missing_required_entity_field_aborts() {
        let mut store = MapFixture::new(100_000_000).build();
        let map = store
            .image_mut("Map.wz/Map/Map1/100000000.img")
            .expect("map image");
        map.insert_at(
            "portal/0",
            AssetNode::dir("0").with_child(AssetNode::int("pt", 0)),
        );
        let loader = loader_with(store, quiet_music());

        let err = loader
            .load(MapId::Field(100_000_000))
            .await
            .expect_err("portal without x");
        assert!(matches!(
            err,
            WorldError::Asset(AssetError::MissingChild { ref child, .. }) if child == "x"
        ));
    }

    #[tokio::test]
    async fn missing_names_fall_back() {
        let fixture = MapFixture::new(104_040_000).without_names();
        let loader = loader_with(fixture.build(), quiet_music());
        let loaded = loader.load(MapId::Field(104_040_000)).await.expect("load");
        assert_eq!(loaded.names.map_name, "Map 104040000");
        assert_eq!(loaded.names.street_name, "");
    }

    #[tokio::test]
    async fn npc_template_link_and_strings_are_followed() {
        let store = MapFixture::new(100_000_000)
            .npc_template(9_000_001, Some(9_000_000))
            .build();
        let loader = loader_with(store, quiet_music());
        let mut cache = SpriteCache::new();

        let appearance = loader
            .npc_appearance(&mut cache, 9_000_001)
            .await
            .expect("appearance");
        let first = appearance.stand.current().expect("frame");
        assert_eq!(first.image, "Npc.wz/9000000.img/stand/0");
        assert_eq!(appearance.name, "NPC 9000001");
        assert_eq!(appearance.lines, vec!["line 0".to_string(), "line 1".to_string()]);
    }

    #[tokio::test]
    async fn login_map_has_fixed_path_and_optional_info() {
        let store = MemoryAssetStore::new()
            .with_image("UI.wz/MapLogin.img", AssetNode::dir("MapLogin.img"));
        let loader = loader_with(store, MockMusicPlayer::new());
        let loaded = loader.load(MapId::Login).await.expect("login");
        assert_eq!(loaded.boundaries, Boundaries::default());
        assert_eq!(loaded.names.map_name, "Map MapLogin");
    }
}
