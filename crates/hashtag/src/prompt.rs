use crate::settings::{PipelineSettings, TagDelimiter};

/// Instruction sent alongside the image. The format sentence is derived from
/// the same delimiter the parser splits on.
pub fn hashtag_prompt(settings: &PipelineSettings) -> String {
    let (min, max) = settings.requested_tags;
    let format = match settings.delimiter {
        TagDelimiter::Comma => {
            "Return only a comma-separated list of hashtag words (without the # symbol), on a single line."
        }
        TagDelimiter::Newline => {
            "Return the hashtags as a simple list, one per line, each starting with #, with no other text."
        }
    };

    format!(
        "Analyze this image and generate relevant hashtags for social media. \
Focus on: visual elements, objects, colors, style, mood, themes, and potential use cases. \
{format} Return {min}-{max} hashtags. Make them specific and useful for discoverability."
    )
}

pub fn label_prompt(tags: &[String]) -> String {
    format!(
        "Here is a list of social media hashtags: {}. \
Reply with a short category label of 1-3 words that summarizes them. \
Reply with the label only, without # and without quotes.",
        tags.join(", ")
    )
}
