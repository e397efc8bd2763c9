use super::AssetError;

/// Leaf payload of an asset node. Directory-like nodes carry `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    None,
    Int(i64),
    Float(f64),
    Text(String),
    Vector { x: i64, y: i64 },
    Canvas { width: u32, height: u32 },
    Uol(String),
}

/// One node of a resolved asset image.
///
/// Every node remembers its full path from the store root so accessor errors
/// can point at the exact node that was missing or mistyped.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetNode {
    path: String,
    name: String,
    value: NodeValue,
    children: Vec<AssetNode>,
}

impl AssetNode {
    pub fn new(name: impl Into<String>, value: NodeValue) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            value,
            children: Vec::new(),
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self::new(name, NodeValue::None)
    }

    pub fn int(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, NodeValue::Int(value))
    }

    pub fn float(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, NodeValue::Float(value))
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, NodeValue::Text(value.into()))
    }

    pub fn vector(name: impl Into<String>, x: i64, y: i64) -> Self {
        Self::new(name, NodeValue::Vector { x, y })
    }

    pub fn canvas(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self::new(name, NodeValue::Canvas { width, height })
    }

    pub fn with_child(mut self, child: AssetNode) -> Self {
        self.push_child(child);
        self
    }

    pub fn push_child(&mut self, mut child: AssetNode) {
        child.rebase(&self.path);
        self.children.push(child);
    }

    /// Inserts `node` at `rel_path` below this node, creating directory
    /// nodes for missing intermediate segments. The last segment names the
    /// inserted node.
    pub fn insert_at(&mut self, rel_path: &str, mut node: AssetNode) {
        let mut segments = rel_path.split('/').filter(|s| !s.is_empty()).collect::<Vec<_>>();
        let Some(last) = segments.pop() else {
            return;
        };
        let mut current = self;
        for segment in segments {
            let index = match current.children.iter().position(|c| c.name == segment) {
                Some(index) => index,
                None => {
                    current.push_child(AssetNode::dir(segment));
                    current.children.len() - 1
                }
            };
            current = &mut current.children[index];
        }
        node.name = last.to_string();
        match current.children.iter().position(|c| c.name == last) {
            Some(index) => {
                node.rebase(&current.path);
                current.children[index] = node;
            }
            None => current.push_child(node),
        }
    }

    pub(crate) fn from_parts(
        path: String,
        name: String,
        value: NodeValue,
        children: Vec<AssetNode>,
    ) -> Self {
        Self {
            path,
            name,
            value,
            children,
        }
    }

    /// Re-roots this node so its path becomes `path`.
    pub(crate) fn set_root_path(&mut self, path: &str) {
        self.path = path.to_string();
        let own_path = self.path.clone();
        for child in &mut self.children {
            child.rebase(&own_path);
        }
    }

    fn rebase(&mut self, parent_path: &str) {
        self.path = format!("{parent_path}/{}", self.name);
        let own_path = self.path.clone();
        for child in &mut self.children {
            child.rebase(&own_path);
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    pub fn children(&self) -> &[AssetNode] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&AssetNode> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    pub fn require_child(&self, name: &str) -> Result<&AssetNode, AssetError> {
        self.child(name).ok_or_else(|| AssetError::MissingChild {
            path: self.path.clone(),
            child: name.to_string(),
        })
    }

    /// Walks a `/`-separated relative path.
    pub fn descend(&self, rel_path: &str) -> Option<&AssetNode> {
        rel_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| node.child(segment))
    }

    pub fn is_canvas(&self) -> bool {
        matches!(self.value, NodeValue::Canvas { .. })
    }

    /// Numeric names identify footholds, frames and life entries.
    pub fn name_as_int(&self) -> Option<i64> {
        self.name.trim().parse().ok()
    }

    pub fn as_int(&self) -> Option<i64> {
        match &self.value {
            NodeValue::Int(value) => Some(*value),
            NodeValue::Float(value) => Some(*value as i64),
            NodeValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match &self.value {
            NodeValue::Int(value) => Some(*value as f64),
            NodeValue::Float(value) => Some(*value),
            NodeValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Text(text) | NodeValue::Uol(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<(i64, i64)> {
        match self.value {
            NodeValue::Vector { x, y } => Some((x, y)),
            _ => None,
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.child(name).and_then(AssetNode::as_int)
    }

    pub fn int_or(&self, name: &str, default: i64) -> i64 {
        self.get_int(name).unwrap_or(default)
    }

    pub fn float_or(&self, name: &str, default: f64) -> f64 {
        self.child(name)
            .and_then(AssetNode::as_float)
            .unwrap_or(default)
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(AssetNode::as_text)
    }

    pub fn text_or(&self, name: &str, default: &str) -> String {
        self.get_text(name).unwrap_or(default).to_string()
    }

    pub fn require_int(&self, name: &str) -> Result<i64, AssetError> {
        let child = self.require_child(name)?;
        child.as_int().ok_or_else(|| AssetError::WrongType {
            path: child.path.clone(),
            expected: "an integer",
        })
    }

    pub fn require_text(&self, name: &str) -> Result<&str, AssetError> {
        let child = self.require_child(name)?;
        child.as_text().ok_or_else(|| AssetError::WrongType {
            path: child.path.clone(),
            expected: "a string",
        })
    }

    /// Reads a string field that some dumps store as an integer (ids, for one).
    pub fn require_text_or_int(&self, name: &str) -> Result<String, AssetError> {
        let child = self.require_child(name)?;
        match &child.value {
            NodeValue::Text(text) => Ok(text.clone()),
            NodeValue::Int(value) => Ok(value.to_string()),
            _ => Err(AssetError::WrongType {
                path: child.path.clone(),
                expected: "a string or integer",
            }),
        }
    }
}
