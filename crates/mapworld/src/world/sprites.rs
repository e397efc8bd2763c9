use std::collections::HashMap;

use tracing::debug;

use crate::assets::{split_image_path, AssetError, AssetNode, AssetResolver, NodeValue};

const DEFAULT_FRAME_DELAY_MS: f32 = 100.0;

/// One canvas of an animation, addressed by its asset path.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteFrame {
    pub image: String,
    pub origin_x: f32,
    pub origin_y: f32,
    pub width: u32,
    pub height: u32,
    pub delay_ms: f32,
}

impl SpriteFrame {
    /// Reads a canvas node. Missing `origin` means (0, 0) and missing
    /// `delay` means 100ms.
    pub fn from_canvas(node: &AssetNode) -> Result<Self, AssetError> {
        let NodeValue::Canvas { width, height } = *node.value() else {
            return Err(AssetError::WrongType {
                path: node.path().to_string(),
                expected: "a canvas",
            });
        };
        let (origin_x, origin_y) = node
            .child("origin")
            .and_then(AssetNode::as_vector)
            .unwrap_or((0, 0));
        let delay_ms = node
            .get_int("delay")
            .filter(|delay| *delay > 0)
            .map(|delay| delay as f32)
            .unwrap_or(DEFAULT_FRAME_DELAY_MS);
        Ok(Self {
            image: node.path().to_string(),
            origin_x: origin_x as f32,
            origin_y: origin_y as f32,
            width,
            height,
            delay_ms,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Animation {
    frames: Vec<SpriteFrame>,
    looping: bool,
    index: usize,
    elapsed_ms: f32,
    finished: bool,
}

impl Animation {
    pub fn looping(frames: Vec<SpriteFrame>) -> Self {
        Self {
            frames,
            looping: true,
            ..Self::default()
        }
    }

    pub fn once(frames: Vec<SpriteFrame>) -> Self {
        Self {
            frames,
            looping: false,
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[SpriteFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame_index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&SpriteFrame> {
        self.frames.get(self.index)
    }

    /// True once a non-looping animation has shown its last frame for its
    /// full delay.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn restart(&mut self) {
        self.index = 0;
        self.elapsed_ms = 0.0;
        self.finished = false;
    }

    pub fn update(&mut self, tick_ms: f32) {
        if self.finished || self.frames.len() <= 1 && self.looping {
            return;
        }
        self.elapsed_ms += tick_ms;
        while let Some(frame) = self.frames.get(self.index) {
            let delay_ms = frame_delay(frame);
            if self.elapsed_ms < delay_ms {
                break;
            }
            self.elapsed_ms -= delay_ms;
            if self.index + 1 < self.frames.len() {
                self.index += 1;
            } else if self.looping {
                self.index = 0;
            } else {
                self.finished = true;
                self.elapsed_ms = 0.0;
                break;
            }
        }
    }
}

/// Non-positive or NaN delays fall back to the default so a frame always
/// consumes time.
fn frame_delay(frame: &SpriteFrame) -> f32 {
    if frame.delay_ms > 0.0 {
        frame.delay_ms
    } else {
        DEFAULT_FRAME_DELAY_MS
    }
}

/// Image cache scoped to one load or spawn. Each image file is fetched once
/// and every lookup inside it is served from memory.
#[derive(Default)]
pub struct SpriteCache {
    images: HashMap<String, AssetNode>,
}

impl SpriteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached_images(&self) -> usize {
        self.images.len()
    }

    pub async fn node(
        &mut self,
        assets: &dyn AssetResolver,
        path: &str,
    ) -> Result<AssetNode, AssetError> {
        let (image_path, inner) = split_image_path(path);
        if !self.images.contains_key(image_path) {
            let image = assets.resolve(image_path).await?;
            debug!(image = image_path, "sprite_image_cached");
            self.images.insert(image_path.to_string(), image);
        }
        let not_found = || AssetError::NotFound {
            path: path.to_string(),
        };
        let image = self.images.get(image_path).ok_or_else(not_found)?;
        if inner.is_empty() {
            return Ok(image.clone());
        }
        image.descend(inner).cloned().ok_or_else(not_found)
    }

    pub async fn optional_node(
        &mut self,
        assets: &dyn AssetResolver,
        path: &str,
    ) -> Result<Option<AssetNode>, AssetError> {
        match self.node(assets, path).await {
            Ok(node) => Ok(Some(node)),
            Err(error) if error.is_not_found() => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Frames at `path`: either a single canvas or a directory of numbered
    /// canvases (or links to canvases) in numeric order.
    pub async fn frames(
        &mut self,
        assets: &dyn AssetResolver,
        path: &str,
    ) -> Result<Vec<SpriteFrame>, AssetError> {
        let node = self.node(assets, path).await?;
        if node.is_canvas() {
            return Ok(vec![SpriteFrame::from_canvas(&node)?]);
        }

        let mut numbered = node
            .children()
            .iter()
            .filter_map(|child| child.name_as_int().map(|index| (index, child)))
            .collect::<Vec<_>>();
        numbered.sort_by_key(|(index, _)| *index);

        let mut frames = Vec::with_capacity(numbered.len());
        for (_, child) in numbered {
            match child.value() {
                NodeValue::Canvas { .. } => frames.push(SpriteFrame::from_canvas(child)?),
                NodeValue::Uol(link) => {
                    let target = resolve_link(node.path(), link);
                    let linked = self.node(assets, &target).await?;
                    frames.push(SpriteFrame::from_canvas(&linked)?);
                }
                _ => {}
            }
        }

        if frames.is_empty() {
            return Err(AssetError::WrongType {
                path: node.path().to_string(),
                expected: "a canvas or a list of frames",
            });
        }
        Ok(frames)
    }

    pub async fn animation(
        &mut self,
        assets: &dyn AssetResolver,
        path: &str,
    ) -> Result<Animation, AssetError> {
        Ok(Animation::looping(self.frames(assets, path).await?))
    }
}

/// Resolves a relative link (`../1/0`) against the directory `base`.
pub fn resolve_link(base: &str, link: &str) -> String {
    let mut segments = base
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();
    for segment in link.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
