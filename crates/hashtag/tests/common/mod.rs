#![allow(dead_code)]

use async_trait::async_trait;
use hashtag::{
    presentation::{
        canvas::{Bounds, NodeId, NodeKind},
        memory::InMemoryCanvas,
    },
    vision_llm::{
        CompletionError, CompletionResult, LLMInferenceParams, LLMMessage, LLMUserMessage,
        VisionChat,
    },
};
use std::{collections::VecDeque, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::Mutex,
};

/// Replies with canned results in order and records every request.
#[derive(Default)]
pub struct ScriptedChat {
    replies: Mutex<VecDeque<CompletionResult<String>>>,
    pub requests: Mutex<Vec<(Vec<LLMMessage>, LLMInferenceParams)>>,
    pub events: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedChat {
    pub fn new(replies: Vec<CompletionResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Image url of the n-th request, if it carried one.
    pub async fn image_url(&self, n: usize) -> Option<String> {
        let requests = self.requests.lock().await;
        let (history, _) = requests.get(n)?;
        history.iter().find_map(|message| match message {
            LLMMessage::User(parts) => parts.iter().find_map(|part| match part {
                LLMUserMessage::ImageUrl(image) => Some(image.url.clone()),
                _ => None,
            }),
            _ => None,
        })
    }
}

#[async_trait]
impl VisionChat for ScriptedChat {
    async fn get_completion(
        &self,
        history: &[LLMMessage],
        params: &LLMInferenceParams,
    ) -> CompletionResult<String> {
        let n = {
            let mut requests = self.requests.lock().await;
            requests.push((history.to_vec(), params.clone()));
            requests.len()
        };
        self.events.lock().await.push(format!("start {}", n));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.events.lock().await.push(format!("end {}", n));

        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(CompletionError::EmptyCompletion))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

pub fn bounds(x: f64, y: f64, width: f64, height: f64) -> Bounds {
    Bounds {
        x,
        y,
        width,
        height,
    }
}

/// An artboard 400 wide whose lowest child ends at y = 300, selected.
pub async fn artboard(canvas: &InMemoryCanvas) -> NodeId {
    let frame = canvas
        .add_node("Artboard", NodeKind::Frame, bounds(0.0, 0.0, 400.0, 600.0), None)
        .await
        .expect("artboard");
    canvas
        .add_node("Title", NodeKind::Text, bounds(20.0, 20.0, 200.0, 100.0), Some(&frame))
        .await
        .expect("title");
    canvas
        .add_node("Photo", NodeKind::Frame, bounds(20.0, 140.0, 360.0, 160.0), Some(&frame))
        .await
        .expect("photo");
    canvas.select(&[frame.clone()]).await;
    frame
}

pub fn newline_tags(count: usize) -> String {
    (0..count)
        .map(|i| format!("#Beach{}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A chat completions endpoint that answers one request with `content`.
/// Returns the base url to configure.
pub async fn completion_server(content: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let body = serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
    })
    .to_string();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = Vec::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = socket.read(&mut buf).await.expect("read");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request).to_string();
            let Some(header_end) = text.find("\r\n\r\n") else {
                continue;
            };
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if request.len() >= header_end + 4 + content_length {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        socket.shutdown().await.ok();
    });

    format!("http://{}/v1", addr)
}

/// Base url of a port nothing listens on.
pub async fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{}/v1", addr)
}
