use crate::{
    error::{HashtagError, HashtagResult},
    settings::TagDelimiter,
};
use serde::Serialize;

/// Normalized tags in provider order. Never empty, every tag lowercase,
/// without a leading `#` and within the length bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashtagList(Vec<String>);

impl HashtagList {
    pub fn tags(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(|v| v.as_str())
    }

    /// `#tag` form used for display and clipboard.
    pub fn display_tags(&self) -> impl Iterator<Item = String> + '_ {
        self.0.iter().map(|v| format!("#{}", v))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub delimiter: TagDelimiter,
    pub max_count: usize,
    pub max_length: usize,
}

fn normalize(token: &str, max_length: usize) -> Option<String> {
    let token = token.trim();
    let token = token.strip_prefix('#').unwrap_or(token).trim();
    let token = token.to_lowercase();

    let length = token.chars().count();
    if length == 0 || length > max_length {
        return None;
    }
    Some(token)
}

pub fn parse_hashtags(raw: &str, options: &ParseOptions) -> HashtagResult<HashtagList> {
    let tags = raw
        .split(options.delimiter.as_char())
        .filter_map(|token| normalize(token, options.max_length))
        .take(options.max_count)
        .collect::<Vec<String>>();

    tracing::debug!("parsed {} hashtags ({} delimited)", tags.len(), options.delimiter);

    if tags.is_empty() {
        return Err(HashtagError::NoHashtagsFound);
    }
    Ok(HashtagList(tags))
}

#[cfg(test)]
impl From<Vec<&str>> for HashtagList {
    fn from(v: Vec<&str>) -> Self {
        Self(v.into_iter().map(|t| t.to_string()).collect())
    }
}
