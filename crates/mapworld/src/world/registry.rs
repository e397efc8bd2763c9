use tracing::debug;

use super::canvas::Layer;
use super::config::WorldConfig;
use super::entities::{
    Character, ItemDrop, Monster, MonsterAppearance, MonsterSpawn, Npc, NpcAppearance, NpcKind,
    NpcSpawn,
};
use super::foothold::FootholdGraph;
use super::map_id::MapId;

/// What a spawn needs to know about the map it lands in.
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext<'a> {
    pub map_id: MapId,
    pub footholds: &'a FootholdGraph,
    pub config: &'a WorldConfig,
}

impl SpawnContext<'_> {
    /// Layer of the foothold an entity stands on, overlay when unknown.
    pub fn layer_for(&self, fh: i64) -> Layer {
        self.footholds.layer_of(fh).unwrap_or(Layer::Overlay)
    }
}

/// Dynamic entities of the current map.
#[derive(Debug, Default, Clone)]
pub struct EntityRegistry {
    npcs: Vec<Npc>,
    monsters: Vec<Monster>,
    characters: Vec<Character>,
    item_drops: Vec<ItemDrop>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    pub fn npcs_mut(&mut self) -> &mut [Npc] {
        &mut self.npcs
    }

    pub fn monsters(&self) -> &[Monster] {
        &self.monsters
    }

    pub fn monsters_mut(&mut self) -> &mut [Monster] {
        &mut self.monsters
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn characters_mut(&mut self) -> &mut [Character] {
        &mut self.characters
    }

    pub fn item_drops(&self) -> &[ItemDrop] {
        &self.item_drops
    }

    pub fn item_drops_mut(&mut self) -> &mut [ItemDrop] {
        &mut self.item_drops
    }

    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
            && self.monsters.is_empty()
            && self.characters.is_empty()
            && self.item_drops.is_empty()
    }

    pub fn spawn_npc(
        &mut self,
        spawn: NpcSpawn,
        appearance: NpcAppearance,
        ctx: &SpawnContext<'_>,
    ) -> &Npc {
        let kind = if ctx.config.is_taxi_npc(spawn.id) {
            NpcKind::Taxi
        } else {
            NpcKind::Standard
        };
        let layer = ctx.layer_for(spawn.fh);
        let npc = Npc::new(
            spawn,
            appearance,
            kind,
            layer,
            ctx.config.npc_dialog_duration_ms as f32,
        );
        debug!(
            map_id = %ctx.map_id,
            npc_id = npc.id,
            x = npc.position().x,
            y = npc.position().y,
            layer = ?npc.layer,
            kind = ?npc.kind,
            "npc_spawned"
        );
        self.npcs.push(npc);
        &self.npcs[self.npcs.len() - 1]
    }

    pub fn spawn_monster(
        &mut self,
        spawn: MonsterSpawn,
        appearance: MonsterAppearance,
        ctx: &SpawnContext<'_>,
    ) -> &Monster {
        let layer = ctx.layer_for(spawn.fh);
        let monster = Monster::new(spawn, appearance, layer, ctx.config.monster_patrol_speed);
        debug!(
            map_id = %ctx.map_id,
            monster_id = monster.id,
            layer = ?monster.layer,
            "monster_spawned"
        );
        self.monsters.push(monster);
        &self.monsters[self.monsters.len() - 1]
    }

    pub fn add_item_drop(&mut self, mut drop: ItemDrop, config: &WorldConfig) {
        drop.apply_default_lifetime(config.item_drop_lifetime_ms as f32);
        self.item_drops.push(drop);
    }

    pub fn add_character(&mut self, character: Character) {
        self.characters.push(character);
    }

    /// Empties every collection.
    pub fn clear(&mut self) {
        self.npcs.clear();
        self.monsters.clear();
        self.characters.clear();
        self.item_drops.clear();
    }

    pub fn purge_destroyed(&mut self) {
        self.monsters.retain(|monster| !monster.is_destroyed());
        self.item_drops.retain(|drop| !drop.is_destroyed());
    }

    pub(crate) fn update_npcs(&mut self, tick_ms: f32) {
        self.npcs.iter_mut().for_each(|npc| npc.update(tick_ms));
    }

    pub(crate) fn update_monsters(&mut self, tick_ms: f32) {
        self.monsters.iter_mut().for_each(|mob| mob.update(tick_ms));
    }

    pub(crate) fn update_characters(&mut self, tick_ms: f32) {
        self.characters
            .iter_mut()
            .for_each(|character| character.update(tick_ms));
    }

    pub(crate) fn update_item_drops(&mut self, tick_ms: f32) {
        self.item_drops
            .iter_mut()
            .for_each(|drop| drop.update(tick_ms));
    }
}
