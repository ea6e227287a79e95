use super::Presenter;
use crate::{
    error::{HashtagError, HashtagResult},
    label::CategoryLabel,
    parse::HashtagList,
};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

const STACK_PREVIEW_SIZE: usize = 5;

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> anyhow::Result<()>;
}

/// Everything a rendering layer needs to draw the result panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub tags: Vec<String>,
    pub label: Option<CategoryLabel>,
    pub loading: bool,
    pub error: Option<String>,
    pub expanded: bool,
}

/// Collapsed preview: the label on top, then the first few tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackPreview {
    pub label: Option<CategoryLabel>,
    pub top: Vec<String>,
    pub total: usize,
}

pub struct ViewModel {
    state: watch::Sender<ViewState>,
    clipboard: Arc<dyn Clipboard>,
}

impl ViewModel {
    pub fn new(clipboard: Arc<dyn Clipboard>) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self { state, clipboard }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn begin_run(&self) {
        self.state.send_modify(|v| {
            v.loading = true;
            v.error = None;
            v.tags.clear();
            v.label = None;
            v.expanded = false;
        });
    }

    pub fn finish_err(&self, e: &HashtagError) {
        let message = e.to_string();
        self.state.send_modify(|v| {
            v.loading = false;
            v.error = Some(message);
        });
    }

    fn finish_ok(&self, tags: &HashtagList, label: Option<&CategoryLabel>) {
        self.state.send_modify(|v| {
            v.loading = false;
            v.error = None;
            v.tags = tags.tags().to_vec();
            v.label = label.filter(|l| !l.is_empty()).cloned();
            v.expanded = false;
        });
    }

    pub fn toggle_expanded(&self) {
        self.state.send_modify(|v| v.expanded = !v.expanded);
    }

    /// The image was removed, drop every result.
    pub fn reset(&self) {
        self.state.send_replace(ViewState::default());
    }

    pub fn stack_preview(&self) -> StackPreview {
        let state = self.state.borrow();
        StackPreview {
            label: state.label.clone(),
            top: state
                .tags
                .iter()
                .take(STACK_PREVIEW_SIZE)
                .map(|v| format!("#{}", v))
                .collect(),
            total: state.tags.len(),
        }
    }

    /// Copies `#tag`. An index past the end copies nothing.
    pub async fn copy_tag(&self, index: usize) -> HashtagResult<()> {
        let tag = self
            .state
            .borrow()
            .tags
            .get(index)
            .map(|v| format!("#{}", v));
        match tag {
            Some(tag) => self.clipboard.write_text(&tag).await?,
            None => tracing::debug!("no tag at index {}, nothing copied", index),
        }
        Ok(())
    }

    pub async fn copy_label(&self) -> HashtagResult<()> {
        let label = self.state.borrow().label.clone();
        if let Some(label) = label {
            self.clipboard.write_text(&label).await?;
        }
        Ok(())
    }

    pub async fn copy_all(&self) -> HashtagResult<()> {
        let all = self
            .state
            .borrow()
            .tags
            .iter()
            .map(|v| format!("#{}", v))
            .collect::<Vec<_>>()
            .join(" ");
        if all.is_empty() {
            return Err(HashtagError::NoHashtagsFound);
        }
        self.clipboard.write_text(&all).await?;
        Ok(())
    }
}

/// Publishes results into a [`ViewModel`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ViewPresenter;

#[async_trait]
impl Presenter for ViewPresenter {
    type Target = ViewModel;

    async fn render(
        &self,
        tags: &HashtagList,
        label: Option<&CategoryLabel>,
        target: &ViewModel,
    ) -> HashtagResult<usize> {
        target.finish_ok(tags, label);
        Ok(tags.len())
    }
}
