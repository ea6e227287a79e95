use crate::parse::HashtagList;

pub type CategoryLabel = String;

const MAX_MODEL_LABEL_CHARS: usize = 32;

/// Ordered (category, keywords) pairs. On equal scores the earlier entry wins.
pub struct Taxonomy(Vec<(String, Vec<String>)>);

impl Taxonomy {
    pub fn new(categories: Vec<(&str, Vec<&str>)>) -> Self {
        Self(
            categories
                .into_iter()
                .map(|(name, keywords)| {
                    (
                        name.to_string(),
                        keywords.into_iter().map(|v| v.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(name, keywords)| (name.as_str(), keywords.as_slice()))
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::new(vec![
            (
                "Beach/Ocean",
                vec![
                    "beach", "ocean", "sea", "waves", "sand", "tropical", "coastline", "shore",
                    "surfing",
                ],
            ),
            (
                "Nature",
                vec![
                    "nature", "forest", "trees", "mountains", "hiking", "wilderness", "outdoor",
                    "landscape",
                ],
            ),
            (
                "Food",
                vec![
                    "food", "delicious", "cuisine", "restaurant", "cooking", "meal", "dining",
                    "tasty",
                ],
            ),
            (
                "City/Urban",
                vec![
                    "city", "urban", "architecture", "building", "street", "downtown", "skyline",
                ],
            ),
            (
                "Animals",
                vec![
                    "pet", "dog", "cat", "animal", "wildlife", "cute", "furry", "puppy", "kitten",
                ],
            ),
            (
                "Travel",
                vec![
                    "travel", "vacation", "adventure", "journey", "explore", "destination", "trip",
                ],
            ),
            (
                "Photography",
                vec![
                    "photography", "photo", "camera", "artistic", "creative", "visual", "capture",
                ],
            ),
            (
                "Sports",
                vec![
                    "sports", "fitness", "exercise", "athletic", "game", "competition", "training",
                ],
            ),
            (
                "Art",
                vec![
                    "art", "artistic", "creative", "design", "painting", "drawing", "colorful",
                ],
            ),
            (
                "Technology",
                vec!["tech", "technology", "digital", "modern", "innovation", "electronic"],
            ),
        ])
    }
}

/// Number of keywords that contain, or are contained in, any tag.
fn score(keywords: &[String], tags: &[String]) -> usize {
    keywords
        .iter()
        .filter(|keyword| {
            tags.iter()
                .any(|tag| tag.contains(keyword.as_str()) || keyword.contains(tag.as_str()))
        })
        .count()
}

fn capitalize(tag: &str) -> String {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Pick a category by keyword matching. Falls back to the capitalized first
/// tag when nothing matches.
pub fn heuristic_label(tags: &HashtagList, taxonomy: &Taxonomy) -> CategoryLabel {
    let Some(first) = tags.first() else {
        return CategoryLabel::new();
    };
    let tags = tags
        .tags()
        .iter()
        .map(|v| v.to_lowercase())
        .collect::<Vec<_>>();

    let mut best: Option<(&str, usize)> = None;
    for (name, keywords) in taxonomy.categories() {
        let matches = score(keywords, &tags);
        if matches > best.map(|(_, v)| v).unwrap_or(0) {
            best = Some((name, matches));
        }
    }

    match best {
        Some((name, _)) => name.to_string(),
        None => capitalize(first),
    }
}

/// Clean up a model reply into a short label. Empty when nothing usable remains.
pub fn normalize_model_label(raw: &str) -> CategoryLabel {
    let line = raw.lines().map(|v| v.trim()).find(|v| !v.is_empty()).unwrap_or("");
    let line = line
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '#' || c == '.')
        .trim();
    line.chars().take(MAX_MODEL_LABEL_CHARS).collect::<String>().trim().to_string()
}
