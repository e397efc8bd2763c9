mod background;
mod character;
mod item_drop;
mod monster;
mod npc;
mod obj;
mod portal;
mod tile;

pub use background::Background;
pub use character::Character;
pub use item_drop::ItemDrop;
pub use monster::{Monster, MonsterAppearance, MonsterSpawn};
pub use npc::{Dialog, Npc, NpcAppearance, NpcKind, NpcSpawn};
pub use obj::Obj;
pub use portal::{Portal, VISIBLE_PORTAL_TYPE};
pub use tile::Tile;
