use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Reference to an uploaded file, as consumed by the annotation source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaHandle {
    pub uri: String,
    pub name: String,
    pub mime_type: String,
}

/// Processing state reported by the upload/transcode service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    Processing,
    Active,
    Failed,
    #[serde(other)]
    Unknown,
}

impl FileState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FileState::Active | FileState::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Multipart upload endpoint.
    pub upload_endpoint: String,

    /// Base endpoint for polling file processing state.
    pub files_endpoint: String,

    /// API key; falls back to the `MEDIA_ANNOTATOR_API_KEY` environment
    /// variable when absent.
    pub api_key: Option<String>,

    /// File extensions accepted for upload.
    pub supported_extensions: Vec<String>,

    /// Delay between processing-state polls, in milliseconds.
    pub poll_interval_ms: u64,

    /// Polls before giving up on a file stuck in processing.
    pub max_poll_attempts: u32,

    /// Per-request HTTP timeout, in seconds.
    pub timeout_seconds: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_endpoint: "https://generativelanguage.googleapis.com/upload/v1beta/files"
                .to_string(),
            files_endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            supported_extensions: vec![
                "mp4".to_string(),
                "mov".to_string(),
                "mkv".to_string(),
                "webm".to_string(),
                "avi".to_string(),
                "mp3".to_string(),
                "wav".to_string(),
                "m4a".to_string(),
                "flac".to_string(),
                "ogg".to_string(),
            ],
            poll_interval_ms: 2000,
            max_poll_attempts: 60,
            timeout_seconds: 300,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: FileInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileInfo {
    name: String,
    uri: String,
    #[serde(default = "default_state")]
    state: FileState,
    mime_type: Option<String>,
}

fn default_state() -> FileState {
    FileState::Processing
}

/// Client for the media upload/transcode service.
///
/// Uploads the raw file and waits for the service's processing stream to
/// reach a terminal state; only a `Ready` handle is handed onward. Media
/// duration is not taken from this service.
pub struct MediaUploader {
    config: UploadConfig,
    client: reqwest::Client,
    api_key: String,
}

impl MediaUploader {
    pub fn new(config: UploadConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("MEDIA_ANNOTATOR_API_KEY").ok())
            .ok_or_else(|| anyhow!("upload API key required (config or MEDIA_ANNOTATOR_API_KEY)"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            client,
            api_key,
        })
    }

    /// Reject unsupported file types locally, before any network call.
    pub fn validate_file_type(&self, path: &Path) -> Result<()> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if self
            .config
            .supported_extensions
            .iter()
            .any(|supported| supported == &extension)
        {
            Ok(())
        } else {
            Err(anyhow!(
                "unsupported file type '.{}' for {}",
                extension,
                path.display()
            ))
        }
    }

    /// Upload a file and wait until the service finishes processing it.
    pub async fn upload(&self, path: &Path) -> Result<MediaHandle> {
        self.validate_file_type(path)?;

        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        info!("⬆️ Uploading {} ({})", path.display(), mime_type);

        let bytes = tokio::fs::read(path).await?;
        let metadata = serde_json::json!({"file": {"display_name": file_name}});

        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata.to_string())
                    .mime_str("application/json")?,
            )
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(&mime_type)?,
            );

        let url = format!("{}?key={}", self.config.upload_endpoint, self.api_key);
        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("upload failed with {}: {}", status, body));
        }

        let uploaded: UploadResponse = response.json().await?;
        let info = self.wait_until_ready(uploaded.file).await?;

        Ok(MediaHandle {
            uri: info.uri,
            name: info.name,
            mime_type: info.mime_type.unwrap_or(mime_type),
        })
    }

    /// Poll the processing-state stream until `processing` resolves to
    /// `ready` or `failed`.
    async fn wait_until_ready(&self, mut info: FileInfo) -> Result<FileInfo> {
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        for attempt in 0..self.config.max_poll_attempts {
            match info.state {
                FileState::Active => {
                    info!("✅ File {} ready", info.name);
                    return Ok(info);
                }
                FileState::Failed => {
                    return Err(anyhow!("upload service failed to process {}", info.name));
                }
                FileState::Processing | FileState::Unknown => {
                    debug!(
                        "File {} still processing (poll {}/{})",
                        info.name,
                        attempt + 1,
                        self.config.max_poll_attempts
                    );
                    tokio::time::sleep(interval).await;
                    info = self.fetch_state(&info.name).await?;
                }
            }
        }

        Err(anyhow!(
            "file {} did not become ready after {} polls",
            info.name,
            self.config.max_poll_attempts
        ))
    }

    async fn fetch_state(&self, name: &str) -> Result<FileInfo> {
        let url = format!("{}/{}?key={}", self.config.files_endpoint, name, self.api_key);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("file state poll failed with {}", response.status()));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn uploader() -> MediaUploader {
        MediaUploader::new(UploadConfig {
            api_key: Some("test-key".to_string()),
            ..UploadConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_supported_extensions_pass_validation() {
        let uploader = uploader();
        assert!(uploader.validate_file_type(&PathBuf::from("clip.mp4")).is_ok());
        assert!(uploader.validate_file_type(&PathBuf::from("Track.MP3")).is_ok());
        assert!(uploader.validate_file_type(&PathBuf::from("a/b/talk.wav")).is_ok());
    }

    #[test]
    fn test_unsupported_extensions_are_rejected_locally() {
        let uploader = uploader();
        assert!(uploader.validate_file_type(&PathBuf::from("notes.txt")).is_err());
        assert!(uploader.validate_file_type(&PathBuf::from("no_extension")).is_err());
    }

    #[test]
    fn test_file_state_decoding() {
        let state: FileState = serde_json::from_str("\"ACTIVE\"").unwrap();
        assert_eq!(state, FileState::Active);
        assert!(state.is_terminal());

        let state: FileState = serde_json::from_str("\"PROCESSING\"").unwrap();
        assert!(!state.is_terminal());

        // Unrecognized states poll again instead of failing.
        let state: FileState = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(state, FileState::Unknown);
    }

    #[test]
    fn test_file_info_decoding_defaults_to_processing() {
        let info: FileInfo = serde_json::from_value(serde_json::json!({
            "name": "files/abc",
            "uri": "https://example.com/files/abc",
            "mimeType": "video/mp4",
        }))
        .unwrap();

        assert_eq!(info.state, FileState::Processing);
        assert_eq!(info.mime_type.as_deref(), Some("video/mp4"));
    }
}
