use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use roxmltree::{Document, Node};
use tracing::debug;

use super::node::{AssetNode, NodeValue};
use super::path::{split_image_path, validate_asset_path};
use super::{AssetError, AssetResolver};

/// Reads images from an XML dump laid out on disk, one `<image>.xml` file per
/// image: `Map.wz/Map/Map1/100000000.img` lives at
/// `<root>/Map.wz/Map/Map1/100000000.img.xml`.
#[derive(Debug, Clone)]
pub struct XmlAssetStore {
    root: PathBuf,
}

impl XmlAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, image_path: &str) -> PathBuf {
        let mut file = self.root.clone();
        for segment in image_path.split('/') {
            file.push(segment);
        }
        file.set_file_name(format!(
            "{}.xml",
            file.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        ));
        file
    }
}

#[async_trait]
impl AssetResolver for XmlAssetStore {
    async fn resolve(&self, path: &str) -> Result<AssetNode, AssetError> {
        validate_asset_path(path).map_err(|source| AssetError::InvalidPath {
            path: path.to_string(),
            source,
        })?;
        let (image_path, inner) = split_image_path(path);
        let file = self.file_for(image_path);
        let raw = match tokio::fs::read_to_string(&file).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(AssetError::NotFound {
                    path: path.to_string(),
                })
            }
            Err(source) => return Err(AssetError::Io { file, source }),
        };
        debug!(path, file = %file.display(), bytes = raw.len(), "asset_image_read");

        let image = parse_image_document(&file, image_path, &raw)?;
        if inner.is_empty() {
            return Ok(image);
        }
        image
            .descend(inner)
            .cloned()
            .ok_or_else(|| AssetError::NotFound {
                path: path.to_string(),
            })
    }
}

pub(crate) fn parse_image_document(
    file: &Path,
    image_path: &str,
    raw: &str,
) -> Result<AssetNode, AssetError> {
    let doc = Document::parse(raw).map_err(|error| AssetError::Xml {
        file: file.to_path_buf(),
        line: error.pos().row,
        column: error.pos().col,
        message: error.to_string(),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "imgdir" {
        return Err(error_at_node(
            file,
            &doc,
            root,
            "root element must be <imgdir>".to_string(),
        ));
    }

    let name = image_path
        .rsplit('/')
        .next()
        .unwrap_or(image_path)
        .to_string();
    let children = convert_children(file, &doc, root, image_path)?;
    Ok(AssetNode::from_parts(
        image_path.to_string(),
        name,
        NodeValue::None,
        children,
    ))
}

fn convert_children(
    file: &Path,
    doc: &Document<'_>,
    parent: Node<'_, '_>,
    parent_path: &str,
) -> Result<Vec<AssetNode>, AssetError> {
    parent
        .children()
        .filter(|child| child.is_element())
        .map(|child| convert_node(file, doc, child, parent_path))
        .collect()
}

fn convert_node(
    file: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    parent_path: &str,
) -> Result<AssetNode, AssetError> {
    let tag = node.tag_name().name();
    let Some(name) = node.attribute("name") else {
        return Err(error_at_node(
            file,
            doc,
            node,
            format!("<{tag}> is missing its name attribute"),
        ));
    };
    let path = format!("{parent_path}/{name}");

    let value = match tag {
        "imgdir" | "extended" | "sound" | "null" => NodeValue::None,
        "int" | "short" | "long" => NodeValue::Int(parse_attr(file, doc, node, "value")?),
        "float" | "double" => NodeValue::Float(parse_attr(file, doc, node, "value")?),
        "string" => NodeValue::Text(node.attribute("value").unwrap_or_default().to_string()),
        "uol" => NodeValue::Uol(node.attribute("value").unwrap_or_default().to_string()),
        "vector" => NodeValue::Vector {
            x: parse_attr(file, doc, node, "x")?,
            y: parse_attr(file, doc, node, "y")?,
        },
        "canvas" => NodeValue::Canvas {
            width: parse_attr(file, doc, node, "width")?,
            height: parse_attr(file, doc, node, "height")?,
        },
        other => {
            return Err(error_at_node(
                file,
                doc,
                node,
                format!("unsupported element <{other}>"),
            ))
        }
    };

    let children = convert_children(file, doc, node, &path)?;
    Ok(AssetNode::from_parts(path, name.to_string(), value, children))
}

fn parse_attr<T: std::str::FromStr>(
    file: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    attribute: &str,
) -> Result<T, AssetError> {
    let raw = node.attribute(attribute).ok_or_else(|| {
        error_at_node(
            file,
            doc,
            node,
            format!(
                "<{}> is missing attribute '{attribute}'",
                node.tag_name().name()
            ),
        )
    })?;
    raw.trim().parse::<T>().map_err(|_| {
        error_at_node(
            file,
            doc,
            node,
            format!("attribute {attribute}='{raw}' is not a valid number"),
        )
    })
}

fn error_at_node(
    file: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    message: String,
) -> AssetError {
    let pos = doc.text_pos_at(node.range().start);
    AssetError::Xml {
        file: file.to_path_buf(),
        line: pos.row,
        column: pos.col,
        message,
    }
}
