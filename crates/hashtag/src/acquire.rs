use crate::{
    error::{HashtagError, HashtagResult},
    presentation::canvas::{CanvasHost, CanvasNode, NodeKind},
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use vision_llm::{ImageDetail, ImageUrl};

/// Raw image bytes ready to be sent once.
#[derive(Clone)]
pub struct ImageInput {
    bytes: Vec<u8>,
    mime_type: String,
}

impl std::fmt::Debug for ImageInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageInput")
            .field("bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, mime_type: &str) -> Self {
        Self {
            bytes,
            mime_type: mime_type.to_string(),
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    /// Consume the bytes into the image part of a request.
    pub fn into_image_url(self, detail: Option<ImageDetail>) -> ImageUrl {
        ImageUrl {
            url: self.to_data_url(),
            detail,
        }
    }
}

/// A file picked by the user: type and size are known before reading.
#[async_trait]
pub trait FileBlob: Send + Sync {
    fn mime_type(&self) -> String;

    fn size(&self) -> u64;

    async fn read(&self) -> anyhow::Result<Vec<u8>>;
}

/// Bytes already held by the host, e.g. handed over from a browser.
#[derive(Debug, Clone)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[async_trait]
impl FileBlob for ImageBlob {
    fn mime_type(&self) -> String {
        self.mime_type.clone()
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    async fn read(&self) -> anyhow::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// Enough leading bytes for every signature `image::guess_format` knows.
const SNIFF_LEN: usize = 64;

#[derive(Debug, Clone)]
pub struct LocalImageFile {
    path: PathBuf,
    mime_type: String,
    size: u64,
}

impl LocalImageFile {
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;

        let mime_type = match ImageFormat::from_path(&path) {
            Ok(format) => format.to_mime_type().to_string(),
            Err(_) => {
                // no usable extension, sniff the header instead
                let mut head = [0u8; SNIFF_LEN];
                let mut file = tokio::fs::File::open(&path).await?;
                let mut filled = 0;
                while filled < SNIFF_LEN {
                    let n = file.read(&mut head[filled..]).await?;
                    if n == 0 {
                        break;
                    }
                    filled += n;
                }
                image::guess_format(&head[..filled])
                    .map(|v| v.to_mime_type().to_string())
                    .unwrap_or_else(|_| "application/octet-stream".to_string())
            }
        };

        Ok(Self {
            path,
            mime_type,
            size: metadata.len(),
        })
    }
}

#[async_trait]
impl FileBlob for LocalImageFile {
    fn mime_type(&self) -> String {
        self.mime_type.clone()
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read(&self) -> anyhow::Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

/// Validate a file selection and read it in full.
#[tracing::instrument(skip_all, err(Debug))]
pub async fn acquire_from_file(
    blob: Option<&dyn FileBlob>,
    max_bytes: u64,
) -> HashtagResult<ImageInput> {
    let blob = blob.ok_or(HashtagError::NoSelection)?;

    let mime_type = blob.mime_type();
    if !mime_type.starts_with("image/") {
        return Err(HashtagError::InvalidSelectionType);
    }

    let size = blob.size();
    if size > max_bytes {
        return Err(HashtagError::SizeLimitExceeded {
            size,
            limit: max_bytes,
        });
    }

    let bytes = blob.read().await?;
    tracing::debug!("read {} bytes of {}", bytes.len(), mime_type);
    Ok(ImageInput::new(bytes, &mime_type))
}

/// Validate the canvas selection and export it as PNG. Returns the selected
/// node too, it is the insertion target afterwards.
#[tracing::instrument(skip_all, err(Debug))]
pub async fn acquire_from_canvas(
    host: &dyn CanvasHost,
    scale: f64,
) -> HashtagResult<(CanvasNode, ImageInput)> {
    let node = host
        .current_selection()
        .await
        .into_iter()
        .next()
        .ok_or(HashtagError::NoSelection)?;

    if !matches!(node.kind, NodeKind::Frame | NodeKind::Component) {
        return Err(HashtagError::InvalidSelectionType);
    }

    let bytes = host.export_png(&node.id, scale).await?;
    tracing::debug!("exported {} as {} bytes png", node.id, bytes.len());

    Ok((node, ImageInput::new(bytes, ImageFormat::Png.to_mime_type())))
}
