//! Hierarchical asset access.
//!
//! Map data, sprites and string tables are addressed by `/`-separated paths
//! such as `Map.wz/Map/Map1/100000000.img/info`. An [`AssetResolver`] turns a
//! path into a typed [`AssetNode`] tree; everything above this module only
//! talks to the trait.

mod memory;
mod node;
mod path;
mod xml_store;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryAssetStore;
pub use node::{AssetNode, NodeValue};
pub use path::{split_image_path, validate_asset_path, AssetPathError};
pub use xml_store::XmlAssetStore;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {path}")]
    NotFound { path: String },
    #[error("asset node {path} has no child '{child}'")]
    MissingChild { path: String, child: String },
    #[error("asset node {path} is not {expected}")]
    WrongType {
        path: String,
        expected: &'static str,
    },
    #[error("invalid asset path '{path}': {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: AssetPathError,
    },
    #[error("failed to read asset file {file}: {source}")]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed asset XML in {file} (line={line}, column={column}): {message}")]
    Xml {
        file: PathBuf,
        line: u32,
        column: u32,
        message: String,
    },
}

impl AssetError {
    /// True for errors caused by a path or node that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AssetError::NotFound { .. } | AssetError::MissingChild { .. }
        )
    }
}

/// Resolves asset paths to node trees.
///
/// Implementations may suspend on I/O. No timeout or retry is applied by
/// callers; a stalled resolve stalls the load that issued it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetResolver: Send + Sync {
    async fn resolve(&self, path: &str) -> Result<AssetNode, AssetError>;
}
