pub mod canvas;
pub mod memory;
pub mod view_model;

use crate::{error::HashtagResult, label::CategoryLabel, parse::HashtagList};
use async_trait::async_trait;

/// Materialize a result on some surface. Returns how many tags ended up there.
#[async_trait]
pub trait Presenter: Send + Sync {
    type Target: Send + Sync;

    async fn render(
        &self,
        tags: &HashtagList,
        label: Option<&CategoryLabel>,
        target: &Self::Target,
    ) -> HashtagResult<usize>;
}
