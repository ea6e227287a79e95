//! A complete in-process [`CanvasHost`], for headless runs and tests.

use super::canvas::{Bounds, CanvasHost, CanvasNode, NodeId, NodeKind, NodeSpec};
use crate::settings::FontName;
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::{
    collections::{HashMap, HashSet},
    io::Cursor,
};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct MemoryNode {
    node: CanvasNode,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct CanvasState {
    nodes: HashMap<NodeId, MemoryNode>,
    // creation order, so name lookup is stable
    order: Vec<NodeId>,
    selection: Vec<NodeId>,
    revealed: Option<NodeId>,
    fonts: HashSet<String>,
    // fail every instance creation after this many succeeded
    instance_budget: Option<usize>,
}

#[derive(Debug, Default)]
pub struct InMemoryCanvas {
    state: Mutex<CanvasState>,
}

impl InMemoryCanvas {
    /// Empty page with the given font families installed.
    pub fn new(fonts: &[&str]) -> Self {
        Self {
            state: Mutex::new(CanvasState {
                fonts: fonts.iter().map(|v| v.to_string()).collect(),
                ..Default::default()
            }),
        }
    }

    pub async fn add_node(
        &self,
        name: &str,
        kind: NodeKind,
        bounds: Bounds,
        parent: Option<&NodeId>,
    ) -> anyhow::Result<NodeId> {
        let mut state = self.state.lock().await;
        let id = state.insert(name, kind, bounds, None);
        if let Some(parent) = parent {
            state.attach(parent, &id)?;
        }
        Ok(id)
    }

    pub async fn select(&self, ids: &[NodeId]) {
        self.state.lock().await.selection = ids.to_vec();
    }

    pub async fn fail_instances_after(&self, count: usize) {
        self.state.lock().await.instance_budget = Some(count);
    }

    pub async fn node(&self, id: &NodeId) -> Option<CanvasNode> {
        self.state.lock().await.nodes.get(id).map(|v| v.node.clone())
    }

    pub async fn text(&self, id: &NodeId) -> Option<String> {
        self.state.lock().await.nodes.get(id).and_then(|v| v.text.clone())
    }

    pub async fn child_ids(&self, id: &NodeId) -> Vec<NodeId> {
        self.state
            .lock()
            .await
            .nodes
            .get(id)
            .map(|v| v.children.clone())
            .unwrap_or_default()
    }

    pub async fn nodes_named(&self, name: &str) -> Vec<NodeId> {
        let state = self.state.lock().await;
        state
            .order
            .iter()
            .filter(|id| state.nodes.get(*id).is_some_and(|v| v.node.name == name))
            .cloned()
            .collect()
    }

    pub async fn node_count(&self) -> usize {
        self.state.lock().await.nodes.len()
    }

    pub async fn revealed(&self) -> Option<NodeId> {
        self.state.lock().await.revealed.clone()
    }
}

impl CanvasState {
    fn insert(
        &mut self,
        name: &str,
        kind: NodeKind,
        bounds: Bounds,
        text: Option<String>,
    ) -> NodeId {
        let id = NodeId(uuid::Uuid::new_v4().to_string());
        self.nodes.insert(
            id.clone(),
            MemoryNode {
                node: CanvasNode {
                    id: id.clone(),
                    name: name.to_string(),
                    kind,
                    bounds,
                },
                text,
                parent: None,
                children: vec![],
            },
        );
        self.order.push(id.clone());
        id
    }

    fn get(&self, id: &NodeId) -> anyhow::Result<&MemoryNode> {
        self.nodes.get(id).ok_or(anyhow!("node not found: {}", id))
    }

    fn attach(&mut self, parent: &NodeId, child: &NodeId) -> anyhow::Result<()> {
        self.get(child)?;
        if self.get(parent)?.children.contains(child) {
            return Ok(());
        }
        let previous = self.get(child)?.parent.clone();
        if let Some(previous) = previous {
            if let Some(v) = self.nodes.get_mut(&previous) {
                v.children.retain(|c| c != child);
            }
        }
        if let Some(v) = self.nodes.get_mut(child) {
            v.parent = Some(parent.clone());
        }
        if let Some(v) = self.nodes.get_mut(parent) {
            v.children.push(child.clone());
        }
        Ok(())
    }

    fn remove(&mut self, id: &NodeId) -> anyhow::Result<()> {
        let node = self.nodes.remove(id).ok_or(anyhow!("node not found: {}", id))?;
        self.order.retain(|v| v != id);
        self.selection.retain(|v| v != id);
        if let Some(parent) = node.parent {
            if let Some(v) = self.nodes.get_mut(&parent) {
                v.children.retain(|c| c != id);
            }
        }
        for child in node.children {
            self.remove(&child)?;
        }
        Ok(())
    }
}

#[async_trait]
impl CanvasHost for InMemoryCanvas {
    async fn current_selection(&self) -> Vec<CanvasNode> {
        let state = self.state.lock().await;
        state
            .selection
            .iter()
            .filter_map(|id| state.nodes.get(id).map(|v| v.node.clone()))
            .collect()
    }

    async fn children(&self, parent: &NodeId) -> anyhow::Result<Vec<CanvasNode>> {
        let state = self.state.lock().await;
        state
            .get(parent)?
            .children
            .iter()
            .map(|id| state.get(id).map(|v| v.node.clone()))
            .collect()
    }

    async fn export_png(&self, node: &NodeId, scale: f64) -> anyhow::Result<Vec<u8>> {
        let bounds = self.state.lock().await.get(node)?.node.bounds;
        let width = ((bounds.width * scale).round() as u32).max(1);
        let height = ((bounds.height * scale).round() as u32).max(1);

        let image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    async fn load_font(&self, font: &FontName) -> anyhow::Result<()> {
        if self.state.lock().await.fonts.contains(&font.family) {
            Ok(())
        } else {
            bail!("font not installed: {} {}", font.family, font.style)
        }
    }

    async fn find_node_by_name(&self, name: &str) -> anyhow::Result<Option<NodeId>> {
        let state = self.state.lock().await;
        Ok(state
            .order
            .iter()
            .find(|id| state.nodes.get(*id).is_some_and(|v| v.node.name == name))
            .cloned())
    }

    async fn create_node(&self, spec: NodeSpec) -> anyhow::Result<NodeId> {
        let mut state = self.state.lock().await;
        let id = match spec {
            NodeSpec::Frame(frame) => {
                state.insert(&frame.name, NodeKind::Frame, frame.bounds, None)
            }
            NodeSpec::TagTemplate { name, .. } => {
                state.insert(&name, NodeKind::Component, Bounds::default(), Some(String::new()))
            }
            NodeSpec::TagInstance {
                template,
                name,
                text,
            } => {
                if state.get(&template)?.node.kind != NodeKind::Component {
                    bail!("{} is not a component", template);
                }
                if let Some(budget) = state.instance_budget {
                    if budget == 0 {
                        bail!("instance creation failed");
                    }
                    state.instance_budget = Some(budget - 1);
                }
                state.insert(&name, NodeKind::Instance, Bounds::default(), Some(text))
            }
        };
        Ok(id)
    }

    async fn append_child(&self, parent: &NodeId, child: &NodeId) -> anyhow::Result<()> {
        self.state.lock().await.attach(parent, child)
    }

    async fn remove_node(&self, node: &NodeId) -> anyhow::Result<()> {
        self.state.lock().await.remove(node)
    }

    async fn reveal(&self, node: &NodeId) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        state.get(node)?;
        state.selection = vec![node.clone()];
        state.revealed = Some(node.clone());
        Ok(())
    }
}
