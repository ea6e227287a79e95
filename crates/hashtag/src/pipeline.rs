use crate::{
    acquire::{acquire_from_canvas, acquire_from_file, FileBlob, ImageInput},
    error::{HashtagError, HashtagResult},
    label::{heuristic_label, normalize_model_label, CategoryLabel, Taxonomy},
    parse::{parse_hashtags, HashtagList, ParseOptions},
    presentation::{
        canvas::{CanvasPresenter, CanvasStatus},
        view_model::{ViewModel, ViewPresenter},
        Presenter,
    },
    prompt::{hashtag_prompt, label_prompt},
    settings::{LabelStrategy, PipelineSettings},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use vision_llm::{LLMInferenceParams, LLMMessage, OpenAI, VisionChat};

const LABEL_MAX_TOKENS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub tags: HashtagList,
    pub label: Option<CategoryLabel>,
}

/// Acquisition, inference and presentation for one image at a time.
/// Runs are serialized: a second trigger waits for the first to finish.
pub struct HashtagPipeline {
    client: Arc<dyn VisionChat>,
    settings: PipelineSettings,
    taxonomy: Taxonomy,
    run_lock: Mutex<()>,
}

impl HashtagPipeline {
    pub fn new(client: Arc<dyn VisionChat>, settings: PipelineSettings) -> Self {
        Self {
            client,
            settings,
            taxonomy: Taxonomy::default(),
            run_lock: Mutex::new(()),
        }
    }

    /// Build against the configured OpenAI compatible endpoint with a key
    /// entered for this session.
    pub fn with_openai(api_key: &str, settings: PipelineSettings) -> HashtagResult<Self> {
        if api_key.trim().is_empty() {
            return Err(HashtagError::MissingCredential);
        }
        let client = OpenAI::new(&settings.base_url, api_key, &settings.model)?;
        Ok(Self::new(Arc::new(client), settings))
    }

    pub fn with_taxonomy(mut self, taxonomy: Taxonomy) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            delimiter: self.settings.delimiter,
            max_count: self.settings.max_count,
            max_length: self.settings.max_tag_length,
        }
    }

    /// One completion for the tags, then the label pass.
    #[tracing::instrument(name = "HashtagPipeline::generate", skip_all, err(Debug), fields(model = %self.client.model_name()))]
    pub async fn generate(&self, image: ImageInput) -> HashtagResult<Generated> {
        let history = vec![LLMMessage::user_with_image(
            hashtag_prompt(&self.settings),
            image.into_image_url(self.settings.image_detail),
        )];

        let raw = self
            .client
            .get_completion(&history, &self.settings.inference_params())
            .await?;
        tracing::debug!("raw hashtag output: {}", raw);

        let tags = parse_hashtags(&raw, &self.parse_options())?;
        let label = self.label(&tags).await;

        Ok(Generated { tags, label })
    }

    async fn label(&self, tags: &HashtagList) -> Option<CategoryLabel> {
        match self.settings.label_strategy {
            LabelStrategy::Off => None,
            LabelStrategy::Heuristic => {
                Some(heuristic_label(tags, &self.taxonomy)).filter(|v| !v.is_empty())
            }
            LabelStrategy::Model => {
                let history = vec![LLMMessage::user_text(label_prompt(tags.tags()))];
                let params = LLMInferenceParams {
                    max_tokens: Some(LABEL_MAX_TOKENS),
                    temperature: self.settings.temperature,
                };
                // a failed label pass never blocks the tags
                match self.client.get_completion(&history, &params).await {
                    Ok(raw) => Some(normalize_model_label(&raw)).filter(|v| !v.is_empty()),
                    Err(e) => {
                        tracing::warn!("label generation failed: {}", e);
                        None
                    }
                }
            }
        }
    }

    /// Web flow: a picked file in, chips in the view model out.
    /// Errors are also published to the view.
    pub async fn run_for_view(
        &self,
        blob: Option<&dyn FileBlob>,
        view: &ViewModel,
    ) -> HashtagResult<usize> {
        let _run = self.run_lock.lock().await;
        view.begin_run();

        let result = self.view_run(blob, view).await;

        match &result {
            Ok(count) => tracing::info!("generated {} hashtags", count),
            Err(e) => {
                tracing::error!("hashtag run failed: {}", e);
                view.finish_err(e);
            }
        }
        result
    }

    /// Design tool flow: export the selected frame, insert tags below its content.
    pub async fn run_on_canvas(&self, presenter: &CanvasPresenter) -> HashtagResult<usize> {
        let _run = self.run_lock.lock().await;

        let result = self.canvas_run(presenter).await;

        match &result {
            Ok(count) => presenter.notify(CanvasStatus::Created(*count)),
            Err(e) => {
                tracing::error!("canvas hashtag run failed: {}", e);
                presenter.notify(CanvasStatus::Failed(e.to_string()));
            }
        }
        result
    }

    async fn view_run(
        &self,
        blob: Option<&dyn FileBlob>,
        view: &ViewModel,
    ) -> HashtagResult<usize> {
        let image = acquire_from_file(blob, self.settings.max_image_bytes).await?;
        let generated = self.generate(image).await?;
        ViewPresenter
            .render(&generated.tags, generated.label.as_ref(), view)
            .await
    }

    async fn canvas_run(&self, presenter: &CanvasPresenter) -> HashtagResult<usize> {
        presenter.notify(CanvasStatus::Exporting);
        let (target, image) =
            acquire_from_canvas(presenter.host(), self.settings.export_scale).await?;

        presenter.notify(CanvasStatus::Analyzing);
        let generated = self.generate(image).await?;
        presenter
            .render(&generated.tags, generated.label.as_ref(), &target)
            .await
    }
}
