use thiserror::Error;

const IMAGE_SUFFIX: &str = ".img";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetPathError {
    #[error("asset path must not be empty")]
    Empty,
    #[error("asset path must not start with '/'")]
    LeadingSlash,
    #[error("asset path must not contain '\\\\'")]
    Backslash,
    #[error("asset path must not contain '..'")]
    ParentTraversal,
    #[error("asset path must not contain empty segments")]
    EmptySegment,
}

pub fn validate_asset_path(path: &str) -> Result<(), AssetPathError> {
    if path.is_empty() {
        return Err(AssetPathError::Empty);
    }
    if path.starts_with('/') {
        return Err(AssetPathError::LeadingSlash);
    }
    if path.contains('\\') {
        return Err(AssetPathError::Backslash);
    }
    if path.contains("..") {
        return Err(AssetPathError::ParentTraversal);
    }
    if path.split('/').any(str::is_empty) {
        return Err(AssetPathError::EmptySegment);
    }
    Ok(())
}

/// Splits `Map.wz/Obj/house.img/a/0` into the image file path
/// (`Map.wz/Obj/house.img`) and the path inside it (`a/0`).
///
/// Paths without an `.img` segment are returned whole with an empty inner path.
pub fn split_image_path(path: &str) -> (&str, &str) {
    let mut offset = 0usize;
    for segment in path.split('/') {
        offset += segment.len();
        if segment.ends_with(IMAGE_SUFFIX) {
            let inner = path.get(offset + 1..).unwrap_or_default();
            return (&path[..offset], inner);
        }
        offset += 1;
    }
    (path, "")
}
