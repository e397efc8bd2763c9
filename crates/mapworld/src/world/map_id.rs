use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const LOGIN_ASSET_PATH: &str = "UI.wz/MapLogin.img";
const LOGIN_NAME: &str = "MapLogin";

/// Identifies a loadable map. The login screen has its own fixed asset and
/// no numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapId {
    Login,
    Field(u32),
}

impl MapId {
    /// `Map.wz/Map/Map{id / 100000000}/{id:09}.img` for field maps.
    pub fn asset_path(&self) -> String {
        match self {
            MapId::Login => LOGIN_ASSET_PATH.to_string(),
            MapId::Field(id) => format!("Map.wz/Map/Map{}/{id:09}.img", id / 100_000_000),
        }
    }

    pub fn field_id(&self) -> Option<u32> {
        match self {
            MapId::Login => None,
            MapId::Field(id) => Some(*id),
        }
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapId::Login => f.write_str(LOGIN_NAME),
            MapId::Field(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid map id '{0}': expected 'login', 'MapLogin' or a numeric id")]
pub struct MapIdParseError(pub String);

impl FromStr for MapId {
    type Err = MapIdParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("login") || trimmed == LOGIN_NAME {
            return Ok(MapId::Login);
        }
        trimmed
            .parse::<u32>()
            .map(MapId::Field)
            .map_err(|_| MapIdParseError(raw.to_string()))
    }
}

/// Region bucket of the map string table that holds a field's names.
pub fn name_area(id: u32) -> &'static str {
    let first_digit = id / 100_000_000;
    let first_two = id / 10_000_000;
    let first_three = id / 1_000_000;

    if first_two == 54 {
        "singapore"
    } else if first_digit == 9 {
        "etc"
    } else if first_digit == 8 {
        "jp"
    } else if first_three == 682 {
        "HalloweenGL"
    } else if first_two == 60 || first_two == 61 {
        "MasteriaGL"
    } else if first_two == 67 || first_two == 68 {
        "weddingGL"
    } else if first_digit == 2 {
        "ossyria"
    } else if first_digit == 1 {
        "victoria"
    } else {
        "maple"
    }
}
