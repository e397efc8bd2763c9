use tracing::debug;

use crate::assets::AssetResolver;

use super::map_id::{name_area, MapId};

pub const MAP_STRINGS_PATH: &str = "String.wz/Map.img";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapNames {
    pub street_name: String,
    pub map_name: String,
}

impl MapNames {
    pub fn fallback(map_id: MapId) -> Self {
        Self {
            street_name: String::new(),
            map_name: format!("Map {map_id}"),
        }
    }
}

/// Looks up the street and map name of `map_id`. Names are cosmetic, so any
/// failure falls back to an empty street and `"Map <id>"`.
pub async fn load_map_names(assets: &dyn AssetResolver, map_id: MapId) -> MapNames {
    let fallback = MapNames::fallback(map_id);
    let Some(id) = map_id.field_id() else {
        return fallback;
    };

    let path = format!("{MAP_STRINGS_PATH}/{}/{id}", name_area(id));
    let node = match assets.resolve(&path).await {
        Ok(node) => node,
        Err(error) => {
            debug!(map_id = %map_id, path, error = %error, "map_name_lookup_miss");
            return fallback;
        }
    };

    let map_name = node
        .get_text("mapName")
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or(fallback.map_name);
    MapNames {
        street_name: node.text_or("streetName", ""),
        map_name,
    }
}
