use std::collections::HashMap;

use async_trait::async_trait;

use super::path::{split_image_path, validate_asset_path};
use super::{AssetError, AssetNode, AssetResolver};

/// Asset store backed by image trees held in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryAssetStore {
    images: HashMap<String, AssetNode>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `node` as the root of image `image_path` (for example
    /// `String.wz/Map.img`), replacing any previous image at that path.
    pub fn insert(&mut self, image_path: impl Into<String>, mut node: AssetNode) {
        let image_path = image_path.into();
        node.set_root_path(&image_path);
        self.images.insert(image_path, node);
    }

    pub fn with_image(mut self, image_path: impl Into<String>, node: AssetNode) -> Self {
        self.insert(image_path, node);
        self
    }

    pub fn image_mut(&mut self, image_path: &str) -> Option<&mut AssetNode> {
        self.images.get_mut(image_path)
    }

    pub fn contains_image(&self, image_path: &str) -> bool {
        self.images.contains_key(image_path)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn lookup(&self, path: &str) -> Result<&AssetNode, AssetError> {
        validate_asset_path(path).map_err(|source| AssetError::InvalidPath {
            path: path.to_string(),
            source,
        })?;
        let (image_path, inner) = split_image_path(path);
        let not_found = || AssetError::NotFound {
            path: path.to_string(),
        };
        let image = self.images.get(image_path).ok_or_else(not_found)?;
        if inner.is_empty() {
            return Ok(image);
        }
        image.descend(inner).ok_or_else(not_found)
    }
}

#[async_trait]
impl AssetResolver for MemoryAssetStore {
    async fn resolve(&self, path: &str) -> Result<AssetNode, AssetError> {
        self.lookup(path).cloned()
    }
}
