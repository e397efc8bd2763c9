use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod assets;
pub mod world;

pub use assets::{
    split_image_path, validate_asset_path, AssetError, AssetNode, AssetPathError, AssetResolver,
    MemoryAssetStore, NodeValue, XmlAssetStore,
};
pub use world::{
    name_area, Animation, Background, Boundaries, Camera2D, Canvas, CanvasRect, Character,
    ClickOutcome, CommitOutcome, Dialog, DrawCall, DrawImage, DrawLine, Drawable,
    EntityRegistry, Foothold, FootholdGraph, FrameTiming, ItemDrop, Layer, Layered, LoadTicket,
    LoadedMap, MapId, MapIdParseError, MapInfo, MapNames, Monster, MonsterAppearance,
    MonsterSpawn, MusicPlayer, Npc, NpcAppearance, NpcHitbox, NpcKind, NpcSpawn, Obj,
    PointerEvent, Portal, ReadinessGate, RecordingCanvas, SilentMusicPlayer, SpriteFrame, Tile,
    Vec2, Viewport, World, WorldConfig, WorldError, WorldLoader,
};

pub const ASSET_ROOT_ENV_VAR: &str = "MAPWORLD_ASSET_ROOT";

/// Directory every usable asset dump root must contain.
const ASSET_ROOT_MARKER: &str = "Map.wz";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "asset root {path} is not a valid asset dump\n\
A valid root must contain a {ASSET_ROOT_MARKER}/ directory."
    )]
    InvalidAssetRoot { path: PathBuf },
    #[error(
        "Could not detect an asset root by walking upward from executable directory: {start_dir}\n\
Expected a directory (or its assets/ subdirectory) containing {ASSET_ROOT_MARKER}/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/asset-dump\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

/// Finds the XML asset dump root.
///
/// An explicit path wins, then `MAPWORLD_ASSET_ROOT`, then the first
/// ancestor of the running executable that holds a dump directly or under
/// `assets/`.
pub fn resolve_asset_root(explicit: Option<&Path>) -> Result<PathBuf, StartupError> {
    if let Some(path) = explicit {
        return validated_root(path);
    }

    match env::var(ASSET_ROOT_ENV_VAR) {
        Ok(value) => validated_root(Path::new(&value)),
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_asset_root(candidate) {
                    return Ok(normalize_path(candidate));
                }
                let nested = candidate.join("assets");
                if is_asset_root(&nested) {
                    return Ok(normalize_path(&nested));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ASSET_ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ASSET_ROOT_ENV_VAR,
            source,
        }),
    }
}

fn validated_root(path: &Path) -> Result<PathBuf, StartupError> {
    let normalized = normalize_path(path);
    if is_asset_root(&normalized) {
        Ok(normalized)
    } else {
        Err(StartupError::InvalidAssetRoot { path: normalized })
    }
}

fn is_asset_root(path: &Path) -> bool {
    path.join(ASSET_ROOT_MARKER).is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
