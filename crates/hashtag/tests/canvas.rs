mod common;

use common::{artboard, newline_tags, ScriptedChat};
use hashtag::{
    presentation::{
        canvas::{CanvasHost, CanvasPresenter, CanvasStatus, NodeKind, NodeSpec, TextStyle},
        memory::InMemoryCanvas,
    },
    settings::{FontName, Rgb},
    vision_llm::CompletionError,
    CanvasStyle, HashtagError, HashtagPipeline, LabelStrategy, PipelineSettings,
};
use std::sync::Arc;
use tokio::sync::mpsc;

fn canvas_pipeline(chat: Arc<ScriptedChat>, label_strategy: LabelStrategy) -> HashtagPipeline {
    HashtagPipeline::new(
        chat,
        PipelineSettings {
            label_strategy,
            ..PipelineSettings::canvas()
        },
    )
}

fn presenter(canvas: &Arc<InMemoryCanvas>) -> CanvasPresenter {
    CanvasPresenter::new(canvas.clone(), CanvasStyle::default(), 20)
}

#[test_log::test(tokio::test)]
async fn test_end_to_end_with_model_label() {
    let canvas = Arc::new(InMemoryCanvas::new(&["Inter"]));
    let target = artboard(&canvas).await;

    let chat = Arc::new(ScriptedChat::new(vec![
        Ok(newline_tags(25)),
        Ok("\"Beach Vibes\"".to_string()),
    ]));
    let pipeline = canvas_pipeline(chat.clone(), LabelStrategy::Model);
    let presenter = presenter(&canvas);

    let count = pipeline.run_on_canvas(&presenter).await.expect("run");
    assert_eq!(count, 20);
    assert_eq!(chat.request_count().await, 2);

    let image_url = chat.image_url(0).await.expect("image part");
    assert!(image_url.starts_with("data:image/png;base64,"));
    assert!(chat.image_url(1).await.is_none());

    let containers = canvas.nodes_named("Generated Hashtags: Beach Vibes").await;
    assert_eq!(containers.len(), 1);
    let container = canvas.node(&containers[0]).await.expect("container");
    assert_eq!(container.kind, NodeKind::Frame);
    assert_eq!(container.bounds.y, 300.0 + 50.0);
    assert_eq!(container.bounds.x, 20.0);
    assert_eq!(container.bounds.width, 360.0);

    let children = canvas.child_ids(&container.id).await;
    assert_eq!(children.len(), 20);
    assert_eq!(canvas.text(&children[0]).await.as_deref(), Some("#beach0"));
    assert_eq!(
        canvas.node(&children[0]).await.map(|v| v.name),
        Some("Hashtag: #beach0".to_string())
    );

    // appended to the selected artboard and revealed
    assert!(canvas.child_ids(&target).await.contains(&container.id));
    assert_eq!(canvas.revealed().await, Some(container.id.clone()));
}

#[test_log::test(tokio::test)]
async fn test_template_is_reused_across_runs() {
    let canvas = Arc::new(InMemoryCanvas::new(&["Inter"]));
    let target = artboard(&canvas).await;
    let existing = canvas
        .create_node(NodeSpec::TagTemplate {
            name: "Hashtag Template".to_string(),
            style: TextStyle {
                font: FontName::new("Inter", "Regular"),
                font_size: 11.0,
                color: Rgb {
                    r: 0.3,
                    g: 0.4,
                    b: 0.9,
                },
            },
        })
        .await
        .expect("template");

    let chat = Arc::new(ScriptedChat::new(vec![
        Ok(newline_tags(3)),
        Ok(newline_tags(4)),
    ]));
    let pipeline = canvas_pipeline(chat, LabelStrategy::Off);
    let presenter = presenter(&canvas);

    assert_eq!(pipeline.run_on_canvas(&presenter).await.expect("first"), 3);
    // the first container is now the lowest content, select the artboard again
    canvas.select(&[target.clone()]).await;
    assert_eq!(pipeline.run_on_canvas(&presenter).await.expect("second"), 4);

    assert_eq!(canvas.nodes_named("Hashtag Template").await, vec![existing]);
    let containers = canvas.nodes_named("Generated Hashtags").await;
    assert_eq!(containers.len(), 2);

    let first = canvas.node(&containers[0]).await.expect("first");
    let second = canvas.node(&containers[1]).await.expect("second");
    assert_eq!(second.bounds.y, first.bounds.y + first.bounds.height + 50.0);
}

#[test_log::test(tokio::test)]
async fn test_template_created_once_when_missing() {
    let canvas = Arc::new(InMemoryCanvas::new(&["Inter"]));
    let target = artboard(&canvas).await;
    let chat = Arc::new(ScriptedChat::new(vec![
        Ok(newline_tags(2)),
        Ok(newline_tags(2)),
    ]));
    let pipeline = canvas_pipeline(chat, LabelStrategy::Heuristic);
    let presenter = presenter(&canvas);

    pipeline.run_on_canvas(&presenter).await.expect("first");
    canvas.select(&[target]).await;
    pipeline.run_on_canvas(&presenter).await.expect("second");

    let templates = canvas.nodes_named("Hashtag Template").await;
    assert_eq!(templates.len(), 1);
    assert_eq!(
        canvas.node(&templates[0]).await.map(|v| v.kind),
        Some(NodeKind::Component)
    );
    assert_eq!(canvas.nodes_named("Generated Hashtags: Beach/Ocean").await.len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_font_fallback() {
    let canvas = Arc::new(InMemoryCanvas::new(&["Arial"]));
    artboard(&canvas).await;
    let chat = Arc::new(ScriptedChat::new(vec![Ok(newline_tags(5))]));
    let pipeline = canvas_pipeline(chat, LabelStrategy::Off);

    assert_eq!(
        pipeline.run_on_canvas(&presenter(&canvas)).await.expect("run"),
        5
    );
}

#[test_log::test(tokio::test)]
async fn test_no_font_inserts_nothing() {
    let canvas = Arc::new(InMemoryCanvas::new(&[]));
    artboard(&canvas).await;
    let before = canvas.node_count().await;

    let chat = Arc::new(ScriptedChat::new(vec![Ok(newline_tags(5))]));
    let pipeline = canvas_pipeline(chat, LabelStrategy::Off);

    let result = pipeline.run_on_canvas(&presenter(&canvas)).await;
    assert!(matches!(result, Err(HashtagError::FontUnavailable)));
    assert_eq!(canvas.node_count().await, before);
}

#[test_log::test(tokio::test)]
async fn test_failed_instance_rolls_back_container() {
    let canvas = Arc::new(InMemoryCanvas::new(&["Inter"]));
    let target = artboard(&canvas).await;
    let chat = Arc::new(ScriptedChat::new(vec![Ok(newline_tags(10))]));
    let pipeline = canvas_pipeline(chat, LabelStrategy::Off);
    let presenter = presenter(&canvas);

    canvas.fail_instances_after(3).await;
    let children_before = canvas.child_ids(&target).await;

    let result = pipeline.run_on_canvas(&presenter).await;
    assert!(matches!(result, Err(HashtagError::Host(_))));

    assert_eq!(canvas.child_ids(&target).await, children_before);
    assert!(canvas.nodes_named("Generated Hashtags").await.is_empty());
    // only the reusable template is left behind
    assert_eq!(canvas.nodes_named("Hashtag Template").await.len(), 1);
    assert_eq!(canvas.node_count().await, 3 + 1);
}

#[test_log::test(tokio::test)]
async fn test_selection_errors() {
    let canvas = Arc::new(InMemoryCanvas::new(&["Inter"]));
    let chat = Arc::new(ScriptedChat::new(vec![]));
    let pipeline = canvas_pipeline(chat.clone(), LabelStrategy::Off);
    let presenter = presenter(&canvas);

    assert!(matches!(
        pipeline.run_on_canvas(&presenter).await,
        Err(HashtagError::NoSelection)
    ));

    let text = canvas
        .add_node("Caption", NodeKind::Text, common::bounds(0.0, 0.0, 10.0, 10.0), None)
        .await
        .expect("text");
    canvas.select(&[text]).await;
    assert!(matches!(
        pipeline.run_on_canvas(&presenter).await,
        Err(HashtagError::InvalidSelectionType)
    ));

    assert_eq!(chat.request_count().await, 0);
}

#[test_log::test(tokio::test)]
async fn test_provider_failure_inserts_nothing() {
    let canvas = Arc::new(InMemoryCanvas::new(&["Inter"]));
    artboard(&canvas).await;
    let before = canvas.node_count().await;

    let chat = Arc::new(ScriptedChat::new(vec![Err(CompletionError::Unauthorized)]));
    let pipeline = canvas_pipeline(chat, LabelStrategy::Off);

    assert!(matches!(
        pipeline.run_on_canvas(&presenter(&canvas)).await,
        Err(HashtagError::AuthError)
    ));
    assert_eq!(canvas.node_count().await, before);
}

#[test_log::test(tokio::test)]
async fn test_status_messages() {
    let canvas = Arc::new(InMemoryCanvas::new(&["Inter"]));
    artboard(&canvas).await;
    let chat = Arc::new(ScriptedChat::new(vec![
        Ok(newline_tags(3)),
        Err(CompletionError::RateLimited),
    ]));
    let pipeline = canvas_pipeline(chat, LabelStrategy::Off);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let presenter = presenter(&canvas).with_status(tx);

    assert_eq!(pipeline.run_on_canvas(&presenter).await.expect("run"), 3);
    let mut messages = Vec::new();
    while let Ok(status) = rx.try_recv() {
        messages.push(status.to_string());
    }
    assert_eq!(
        messages,
        vec![
            "Exporting image...",
            "Analyzing image with AI...",
            "Created 3 hashtag elements automatically!",
        ]
    );

    // the revealed container is now the selection, pick the artboard again
    let artboard_id = canvas.nodes_named("Artboard").await[0].clone();
    canvas.select(&[artboard_id]).await;
    assert!(pipeline.run_on_canvas(&presenter).await.is_err());
    let mut statuses = Vec::new();
    while let Ok(status) = rx.try_recv() {
        statuses.push(status);
    }
    assert_eq!(
        statuses.last(),
        Some(&CanvasStatus::Failed(
            "Rate limit exceeded. Please try again in a moment.".to_string()
        ))
    );
}
