use std::time::Duration;

use serde::Deserialize;

/// NPC ids that open the taxi dialog instead of plain speech.
pub const DEFAULT_TAXI_NPC_IDS: [u32; 5] = [1_002_000, 1_012_000, 1_022_001, 1_032_000, 1_052_016];

/// Tunables for loading and simulating a map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Shortest time the loading state stays visible, measured from the
    /// start of a load.
    pub min_load_duration_ms: u64,
    pub taxi_npc_ids: Vec<u32>,
    pub npc_dialog_duration_ms: u64,
    pub npc_hitbox: NpcHitbox,
    /// Monster patrol speed in pixels per second.
    pub monster_patrol_speed: f32,
    pub item_drop_lifetime_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            min_load_duration_ms: 500,
            taxi_npc_ids: DEFAULT_TAXI_NPC_IDS.to_vec(),
            npc_dialog_duration_ms: 5_000,
            npc_hitbox: NpcHitbox::default(),
            monster_patrol_speed: 40.0,
            item_drop_lifetime_ms: 180_000,
        }
    }
}

impl WorldConfig {
    pub fn min_load_duration(&self) -> Duration {
        Duration::from_millis(self.min_load_duration_ms)
    }

    pub fn is_taxi_npc(&self, npc_id: u32) -> bool {
        self.taxi_npc_ids.contains(&npc_id)
    }
}

/// Screen-space click box of an NPC, anchored at the NPC's world position
/// minus `(offset_x, offset_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NpcHitbox {
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for NpcHitbox {
    fn default() -> Self {
        Self {
            width: 56.0,
            height: 70.0,
            offset_x: 25.0,
            offset_y: 70.0,
        }
    }
}
