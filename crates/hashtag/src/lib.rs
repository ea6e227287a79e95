mod error;
mod parse;

pub mod acquire;
pub mod label;
pub mod pipeline;
pub mod presentation;
pub mod prompt;
pub mod settings;

pub use error::{HashtagError, HashtagResult};
pub use label::{CategoryLabel, Taxonomy};
pub use parse::{parse_hashtags, HashtagList, ParseOptions};
pub use pipeline::{Generated, HashtagPipeline};
pub use settings::{CanvasStyle, LabelStrategy, PipelineSettings, TagDelimiter};
pub use vision_llm;
