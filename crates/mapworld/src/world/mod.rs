//! The runtime world: one loaded map, its entities and the readiness gate
//! that keeps a half-built map from being simulated or drawn.

mod audio;
mod canvas;
mod config;
mod entities;
mod foothold;
mod geometry;
mod interaction;
mod loader;
mod map_id;
mod names;
mod registry;
mod render;
mod sprites;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::assets::AssetResolver;

pub use audio::{MusicPlayer, SilentMusicPlayer};
pub use canvas::{
    Canvas, DrawCall, DrawImage, DrawLine, Drawable, FrameTiming, Layer, Layered,
    RecordingCanvas, MAX_LAYER,
};
pub use config::{NpcHitbox, WorldConfig, DEFAULT_TAXI_NPC_IDS};
pub use entities::{
    Background, Character, Dialog, ItemDrop, Monster, MonsterAppearance, MonsterSpawn, Npc,
    NpcAppearance, NpcKind, NpcSpawn, Obj, Portal, Tile, VISIBLE_PORTAL_TYPE,
};
pub use foothold::{derive_boundaries, Foothold, FootholdGraph, FootholdId};
pub use geometry::{Boundaries, Camera2D, Vec2, Viewport};
pub use interaction::{resolve_click, CanvasRect, ClickOutcome, PointerEvent};
pub use loader::{LoadedMap, MapInfo, WorldError, WorldLoader};
pub use map_id::{name_area, MapId, MapIdParseError};
pub use names::{load_map_names, MapNames, MAP_STRINGS_PATH};
pub use registry::{EntityRegistry, SpawnContext};
pub use render::{compose, Scene};
pub use sprites::{resolve_link, Animation, SpriteCache, SpriteFrame};

/// Whether update and render may touch the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessGate {
    /// Nothing has been loaded yet.
    Idle,
    Loading,
    /// The last load aborted; stays closed until another load commits.
    Failed,
    /// Loaded, waiting out the minimum loading-screen duration.
    Opening { at: Instant },
    Open,
}

impl ReadinessGate {
    pub fn is_open(&self, now: Instant) -> bool {
        match self {
            ReadinessGate::Open => true,
            ReadinessGate::Opening { at } => now >= *at,
            ReadinessGate::Idle | ReadinessGate::Loading | ReadinessGate::Failed => false,
        }
    }
}

/// Handed out when a load starts; only the ticket of the latest load can
/// commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub map_id: MapId,
    pub started_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// A newer load started after this one; the result was dropped.
    Stale,
}

/// Aggregate state of the current map. The host owns exactly one and
/// passes it by reference into update and render.
pub struct World {
    loader: WorldLoader,
    sprites: SpriteCache,
    gate: ReadinessGate,
    generation: u64,
    map_id: Option<MapId>,
    info: MapInfo,
    names: MapNames,
    footholds: FootholdGraph,
    boundaries: Boundaries,
    backgrounds: Vec<Background>,
    tiles: Vec<Tile>,
    objects: Vec<Obj>,
    portals: Vec<Portal>,
    entities: EntityRegistry,
    player: Option<Character>,
    tracked: Vec<Box<dyn Drawable + Send>>,
}

impl World {
    pub fn new(
        assets: Arc<dyn AssetResolver>,
        music: Arc<dyn MusicPlayer>,
        config: WorldConfig,
    ) -> Self {
        Self::with_loader(WorldLoader::new(assets, music, config))
    }

    pub fn with_loader(loader: WorldLoader) -> Self {
        Self {
            loader,
            sprites: SpriteCache::new(),
            gate: ReadinessGate::Idle,
            generation: 0,
            map_id: None,
            info: MapInfo::default(),
            names: MapNames::default(),
            footholds: FootholdGraph::default(),
            boundaries: Boundaries::default(),
            backgrounds: Vec::new(),
            tiles: Vec::new(),
            objects: Vec::new(),
            portals: Vec::new(),
            entities: EntityRegistry::new(),
            player: None,
            tracked: Vec::new(),
        }
    }

    /// A handle that can run a load without borrowing the world.
    pub fn loader(&self) -> WorldLoader {
        self.loader.clone()
    }

    pub fn config(&self) -> &WorldConfig {
        self.loader.config()
    }

    /// Closes the gate and empties the dynamic collections. The returned
    /// ticket supersedes every earlier one.
    pub fn begin_load(&mut self, map_id: MapId) -> LoadTicket {
        self.generation += 1;
        self.gate = ReadinessGate::Loading;
        self.entities.clear();
        self.tracked.clear();
        info!(map_id = %map_id, generation = self.generation, "map_load_started");
        LoadTicket {
            generation: self.generation,
            map_id,
            started_at: Instant::now(),
        }
    }

    pub fn begin_change_map(&mut self, map_id: MapId) -> LoadTicket {
        debug!(
            from = ?self.map_id.map(|id| id.to_string()),
            to = %map_id,
            "map_change_requested"
        );
        self.begin_load(map_id)
    }

    /// Installs a finished load and schedules the gate to open once the
    /// minimum loading duration, counted from the ticket, has passed. A load
    /// of a different map than the ticket names is discarded like a stale one.
    pub fn commit_load(
        &mut self,
        ticket: LoadTicket,
        loaded: LoadedMap,
        camera: &mut Camera2D,
    ) -> CommitOutcome {
        if ticket.generation != self.generation {
            warn!(
                map_id = %ticket.map_id,
                generation = ticket.generation,
                current_generation = self.generation,
                "stale_map_load_discarded"
            );
            return CommitOutcome::Stale;
        }
        if loaded.map_id != ticket.map_id {
            warn!(
                ticket_map_id = %ticket.map_id,
                loaded_map_id = %loaded.map_id,
                generation = ticket.generation,
                "mismatched_map_load_discarded"
            );
            return CommitOutcome::Stale;
        }

        let LoadedMap {
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
        } = loaded;
        self.map_id = Some(map_id);
        self.info = info;
        self.names = names;
        self.footholds = footholds;
        self.boundaries = boundaries;
        self.backgrounds = backgrounds;
        self.tiles = tiles;
        self.objects = objects;
        self.portals = portals;
        self.entities = entities;
        self.tracked.clear();
        self.sprites = SpriteCache::new();

        camera.set_boundaries(boundaries);
        camera.look_at(boundaries.left, boundaries.top);

        let opens_at = ticket.started_at + self.config().min_load_duration();
        self.gate = ReadinessGate::Opening { at: opens_at };
        info!(
            map_id = %map_id,
            map_name = %self.names.map_name,
            generation = ticket.generation,
            "map_committed"
        );
        CommitOutcome::Committed
    }

    /// Records a failed load. The gate stays closed.
    pub fn abort_load(&mut self, ticket: LoadTicket, error: &WorldError) {
        if ticket.generation != self.generation {
            warn!(
                map_id = %ticket.map_id,
                generation = ticket.generation,
                error = %error,
                "stale_map_load_failed"
            );
            return;
        }
        self.gate = ReadinessGate::Failed;
        error!(map_id = %ticket.map_id, error = %error, "map_load_failed");
    }

    pub async fn load(
        &mut self,
        map_id: MapId,
        camera: &mut Camera2D,
    ) -> Result<CommitOutcome, WorldError> {
        let ticket = self.begin_load(map_id);
        self.finish_load(ticket, camera).await
    }

    pub async fn change_map(
        &mut self,
        map_id: MapId,
        camera: &mut Camera2D,
    ) -> Result<CommitOutcome, WorldError> {
        let ticket = self.begin_change_map(map_id);
        self.finish_load(ticket, camera).await
    }

    async fn finish_load(
        &mut self,
        ticket: LoadTicket,
        camera: &mut Camera2D,
    ) -> Result<CommitOutcome, WorldError> {
        let loader = self.loader();
        match loader.load(ticket.map_id).await {
            Ok(loaded) => Ok(self.commit_load(ticket, loaded, camera)),
            Err(error) => {
                self.abort_load(ticket, &error);
                Err(error)
            }
        }
    }

    pub fn gate(&self) -> ReadinessGate {
        self.gate
    }

    pub fn done_loading(&self) -> bool {
        self.gate.is_open(Instant::now())
    }

    pub fn load_failed(&self) -> bool {
        self.gate == ReadinessGate::Failed
    }

    pub fn map_id(&self) -> Option<MapId> {
        self.map_id
    }

    pub fn info(&self) -> &MapInfo {
        &self.info
    }

    pub fn is_town(&self) -> bool {
        self.info.is_town
    }

    pub fn names(&self) -> &MapNames {
        &self.names
    }

    pub fn boundaries(&self) -> Boundaries {
        self.boundaries
    }

    pub fn footholds(&self) -> &FootholdGraph {
        &self.footholds
    }

    pub fn location_above_foothold(&self, id: FootholdId) -> Option<Vec2> {
        self.footholds.location_above_foothold(id)
    }

    pub fn horizontal_footholds(&self) -> Vec<&Foothold> {
        self.footholds.horizontal_footholds()
    }

    pub fn location_above_random_foothold<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec2> {
        self.footholds.location_above_random_foothold(rng)
    }

    pub fn backgrounds(&self) -> &[Background] {
        &self.backgrounds
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn objects(&self) -> &[Obj] {
        &self.objects
    }

    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityRegistry {
        &mut self.entities
    }

    pub fn npcs(&self) -> &[Npc] {
        self.entities.npcs()
    }

    pub fn monsters(&self) -> &[Monster] {
        self.entities.monsters()
    }

    pub fn characters(&self) -> &[Character] {
        self.entities.characters()
    }

    pub fn item_drops(&self) -> &[ItemDrop] {
        self.entities.item_drops()
    }

    /// The current map if it is a town, otherwise its return map.
    pub fn nearby_town_map_id(&self) -> Option<MapId> {
        if self.info.is_town {
            self.map_id
        } else {
            self.info.return_map
        }
    }

    pub fn player(&self) -> Option<&Character> {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut Character> {
        self.player.as_mut()
    }

    pub fn set_player(&mut self, player: Option<Character>) {
        self.player = player;
    }

    pub fn add_item_drop(&mut self, drop: ItemDrop) {
        let config = self.loader.config();
        self.entities.add_item_drop(drop, config);
    }

    pub fn add_character(&mut self, character: Character) {
        self.entities.add_character(character);
    }

    pub async fn spawn_npc(&mut self, spawn: NpcSpawn) -> Result<&Npc, WorldError> {
        let appearance = self
            .loader
            .npc_appearance(&mut self.sprites, spawn.id)
            .await?;
        let ctx = SpawnContext {
            map_id: self.map_id.unwrap_or(MapId::Login),
            footholds: &self.footholds,
            config: self.loader.config(),
        };
        Ok(self.entities.spawn_npc(spawn, appearance, &ctx))
    }

    pub async fn spawn_monster(&mut self, spawn: MonsterSpawn) -> Result<&Monster, WorldError> {
        let appearance = self
            .loader
            .monster_appearance(&mut self.sprites, spawn.id)
            .await?;
        let ctx = SpawnContext {
            map_id: self.map_id.unwrap_or(MapId::Login),
            footholds: &self.footholds,
            config: self.loader.config(),
        };
        Ok(self.entities.spawn_monster(spawn, appearance, &ctx))
    }

    /// Extra drawables (click effects, markers) drawn after item drops until
    /// the next load.
    pub fn track_interaction_object(&mut self, object: Box<dyn Drawable + Send>) {
        self.tracked.push(object);
    }

    pub fn update(&mut self, tick_ms: f32) {
        if !self.done_loading() {
            return;
        }
        self.gate = ReadinessGate::Open;

        self.entities.purge_destroyed();
        self.backgrounds
            .iter_mut()
            .for_each(|background| background.update(tick_ms));
        self.objects.iter_mut().for_each(|obj| obj.update(tick_ms));
        self.entities.update_npcs(tick_ms);
        self.entities.update_monsters(tick_ms);
        self.entities.update_characters(tick_ms);
        if let Some(player) = &mut self.player {
            player.update(tick_ms);
        }
        self.portals
            .iter_mut()
            .for_each(|portal| portal.update(tick_ms));
        self.entities.update_item_drops(tick_ms);
    }

    pub fn render(&self, canvas: &mut dyn Canvas, camera: &Camera2D, timing: &FrameTiming) {
        if !self.done_loading() {
            return;
        }
        let scene = Scene {
            backgrounds: &self.backgrounds,
            objects: &self.objects,
            tiles: &self.tiles,
            monsters: self.entities.monsters(),
            characters: self.entities.characters(),
            npcs: self.entities.npcs(),
            portals: &self.portals,
            player: self.player.as_ref(),
            item_drops: self.entities.item_drops(),
            tracked: &self.tracked,
            footholds: &self.footholds,
        };
        compose(&scene, canvas, camera, timing);
    }

    /// Resolves a click against the NPCs. Ignored while the gate is closed.
    pub fn handle_click(
        &mut self,
        event: PointerEvent,
        rect: CanvasRect,
        camera: &Camera2D,
    ) -> Option<ClickOutcome> {
        if !self.done_loading() {
            return None;
        }
        let hitbox = self.loader.config().npc_hitbox;
        Some(resolve_click(
            self.entities.npcs_mut(),
            event,
            rect,
            camera,
            &hitbox,
        ))
    }
}
