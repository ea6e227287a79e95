use super::Presenter;
use crate::{
    error::{HashtagError, HashtagResult},
    label::CategoryLabel,
    parse::HashtagList,
    settings::{CanvasStyle, FontName, Rgb},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum NodeKind {
    Frame,
    Component,
    Instance,
    Text,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameSpec {
    pub name: String,
    pub bounds: Bounds,
    pub fill: Rgb,
    pub corner_radius: f64,
    pub padding: f64,
    pub item_spacing: f64,
    /// horizontal auto layout, wrapping, fixed width and auto height
    pub wrap: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: FontName,
    pub font_size: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeSpec {
    Frame(FrameSpec),
    /// Reusable styled component every tag instance derives from.
    TagTemplate { name: String, style: TextStyle },
    TagInstance {
        template: NodeId,
        name: String,
        text: String,
    },
}

/// What the pipeline needs from a design tool.
#[async_trait]
pub trait CanvasHost: Send + Sync {
    async fn current_selection(&self) -> Vec<CanvasNode>;

    async fn children(&self, parent: &NodeId) -> anyhow::Result<Vec<CanvasNode>>;

    async fn export_png(&self, node: &NodeId, scale: f64) -> anyhow::Result<Vec<u8>>;

    async fn load_font(&self, font: &FontName) -> anyhow::Result<()>;

    async fn find_node_by_name(&self, name: &str) -> anyhow::Result<Option<NodeId>>;

    /// Created nodes are detached until appended somewhere.
    async fn create_node(&self, spec: NodeSpec) -> anyhow::Result<NodeId>;

    async fn append_child(&self, parent: &NodeId, child: &NodeId) -> anyhow::Result<()>;

    async fn remove_node(&self, node: &NodeId) -> anyhow::Result<()>;

    /// Select the node and scroll it into view.
    async fn reveal(&self, node: &NodeId) -> anyhow::Result<()>;
}

/// Progress of a canvas run, for the plugin panel.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasStatus {
    Exporting,
    Analyzing,
    Created(usize),
    Failed(String),
}

impl std::fmt::Display for CanvasStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exporting => write!(f, "Exporting image..."),
            Self::Analyzing => write!(f, "Analyzing image with AI..."),
            Self::Created(count) => {
                write!(f, "Created {} hashtag elements automatically!", count)
            }
            Self::Failed(message) => write!(f, "{}", message),
        }
    }
}

/// Insert tags as a wrapping container below the existing content of a frame.
pub struct CanvasPresenter {
    host: Arc<dyn CanvasHost>,
    style: CanvasStyle,
    max_count: usize,
    template_guard: Mutex<()>,
    status: Option<mpsc::UnboundedSender<CanvasStatus>>,
}

impl CanvasPresenter {
    pub fn new(host: Arc<dyn CanvasHost>, style: CanvasStyle, max_count: usize) -> Self {
        Self {
            host,
            style,
            max_count,
            template_guard: Mutex::new(()),
            status: None,
        }
    }

    /// Report progress and the outcome of each run on `tx`.
    pub fn with_status(mut self, tx: mpsc::UnboundedSender<CanvasStatus>) -> Self {
        self.status = Some(tx);
        self
    }

    pub(crate) fn notify(&self, status: CanvasStatus) {
        if let Some(tx) = &self.status {
            // a closed panel only loses the message
            if tx.send(status).is_err() {
                tracing::debug!("status receiver dropped");
            }
        }
    }

    pub fn host(&self) -> &dyn CanvasHost {
        self.host.as_ref()
    }

    async fn load_font(&self) -> HashtagResult<FontName> {
        let primary = &self.style.primary_font;
        match self.host.load_font(primary).await {
            Ok(_) => return Ok(primary.clone()),
            Err(e) => {
                tracing::warn!("failed to load font {}: {}", primary.family, e);
            }
        }

        let fallback = &self.style.fallback_font;
        match self.host.load_font(fallback).await {
            Ok(_) => Ok(fallback.clone()),
            Err(e) => {
                tracing::error!("failed to load fallback font {}: {}", fallback.family, e);
                Err(HashtagError::FontUnavailable)
            }
        }
    }

    /// Reuse the template found by name, otherwise create it once.
    async fn ensure_template(&self, font: FontName) -> HashtagResult<NodeId> {
        let _guard = self.template_guard.lock().await;

        if let Some(id) = self.host.find_node_by_name(&self.style.template_name).await? {
            tracing::debug!("reuse template {}", id);
            return Ok(id);
        }

        let id = self
            .host
            .create_node(NodeSpec::TagTemplate {
                name: self.style.template_name.clone(),
                style: TextStyle {
                    font,
                    font_size: self.style.font_size,
                    color: self.style.text_color,
                },
            })
            .await?;
        tracing::info!("created template {}", id);
        Ok(id)
    }

    async fn content_bottom(&self, target: &NodeId) -> HashtagResult<f64> {
        let children = self.host.children(target).await?;
        Ok(children
            .iter()
            .map(|v| v.bounds.bottom())
            .fold(0.0, f64::max))
    }

    fn container_spec(
        &self,
        target: &CanvasNode,
        bottom: f64,
        label: Option<&CategoryLabel>,
    ) -> FrameSpec {
        let name = match label {
            Some(label) if !label.is_empty() => {
                format!("{}: {}", self.style.container_name, label)
            }
            _ => self.style.container_name.clone(),
        };

        FrameSpec {
            name,
            bounds: Bounds {
                x: self.style.margin_x,
                y: bottom + self.style.gap_below_content,
                width: (target.bounds.width - 2.0 * self.style.margin_x).max(0.0),
                height: self.style.base_height,
            },
            fill: self.style.background,
            corner_radius: self.style.corner_radius,
            padding: self.style.padding,
            item_spacing: self.style.item_spacing,
            wrap: true,
        }
    }

    async fn fill_container(
        &self,
        container: &NodeId,
        template: &NodeId,
        tags: &HashtagList,
    ) -> HashtagResult<usize> {
        let mut count = 0;
        for text in tags.display_tags().take(self.max_count) {
            let instance = self
                .host
                .create_node(NodeSpec::TagInstance {
                    template: template.clone(),
                    name: format!("Hashtag: {}", text),
                    text,
                })
                .await?;
            self.host.append_child(container, &instance).await?;
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl Presenter for CanvasPresenter {
    type Target = CanvasNode;

    #[tracing::instrument(name = "CanvasPresenter::render", skip_all, err(Debug), fields(target = %target.id))]
    async fn render(
        &self,
        tags: &HashtagList,
        label: Option<&CategoryLabel>,
        target: &CanvasNode,
    ) -> HashtagResult<usize> {
        // nothing is created before a font is available
        let font = self.load_font().await?;
        let template = self.ensure_template(font).await?;

        let bottom = self.content_bottom(&target.id).await?;
        let container = self
            .host
            .create_node(NodeSpec::Frame(self.container_spec(target, bottom, label)))
            .await?;

        let filled = match self.fill_container(&container, &template, tags).await {
            Ok(count) => self
                .host
                .append_child(&target.id, &container)
                .await
                .map(|_| count)
                .map_err(HashtagError::from),
            Err(e) => Err(e),
        };

        let count = match filled {
            Ok(count) => count,
            Err(e) => {
                if let Err(remove_error) = self.host.remove_node(&container).await {
                    tracing::error!("failed to remove detached container: {}", remove_error);
                }
                return Err(e);
            }
        };

        if let Err(e) = self.host.reveal(&container).await {
            tracing::warn!("failed to reveal container: {}", e);
        }

        tracing::info!("created {} hashtag elements", count);
        Ok(count)
    }
}
