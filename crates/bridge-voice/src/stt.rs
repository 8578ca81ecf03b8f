//! **Speech-to-Text (STT)**: turn an uploaded or downloaded [`AudioClip`] into text.
//!
//! Implement `SttBackend` for a remote OpenAI-compatible transcription API or for an
//! offline stand-in. Backends are async because the gateway calls them from request
//! handlers.

use crate::error::{VoiceError, VoiceResult};
use async_trait::async_trait;
use std::time::Duration;

const DEFAULT_STT_URL: &str = "https://api.openai.com/v1";
const DEFAULT_STT_MODEL: &str = "whisper-1";
const STT_TIMEOUT_SECS: u64 = 30;

/// Encoded audio as received: raw container bytes plus the name the client gave it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
        }
    }

    /// `.m4a` uploads are AAC in an MP4 container; everything else is sent as WAV.
    pub fn mime(&self) -> &'static str {
        if self.file_name.to_lowercase().ends_with(".m4a") {
            "audio/mp4"
        } else {
            "audio/wav"
        }
    }

    /// Name used for the upload part; keeps the extension consistent with [`mime`](Self::mime).
    pub fn upload_name(&self) -> &'static str {
        if self.mime() == "audio/mp4" {
            "audio.m4a"
        } else {
            "audio.wav"
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Download a clip from an http(s) URL. Other schemes are rejected as configuration errors.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> VoiceResult<Self> {
        if !is_http_url(url) {
            return Err(VoiceError::Config(format!("unsupported audio_url scheme: {}", url)));
        }
        let res = client.get(url).send().await?;
        if !res.status().is_success() {
            return Err(VoiceError::Stt(format!("audio download failed: {}", res.status())));
        }
        let file_name = url
            .split(['?', '#'])
            .next()
            .and_then(|u| u.rsplit('/').next())
            .filter(|n| !n.is_empty())
            .unwrap_or("audio.wav")
            .to_string();
        let bytes = res.bytes().await?.to_vec();
        Ok(Self { bytes, file_name })
    }
}

pub fn is_http_url(url: &str) -> bool {
    let lower = url.trim().to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Backend for converting an audio clip to text.
#[async_trait]
pub trait SttBackend: Send + Sync {
    /// Transcribe one clip; return an empty string if nothing was said.
    async fn transcribe(&self, clip: &AudioClip) -> VoiceResult<String>;

    /// Short label for logs and health output.
    fn name(&self) -> &'static str;
}

/// Placeholder STT: returns a fixed string so the vent flow can run without a provider.
#[derive(Debug, Default)]
pub struct PlaceholderStt {
    /// If set, return this instead of the default message.
    pub response: Option<String>,
}

impl PlaceholderStt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(s: String) -> Self {
        Self { response: Some(s) }
    }
}

#[async_trait]
impl SttBackend for PlaceholderStt {
    async fn transcribe(&self, clip: &AudioClip) -> VoiceResult<String> {
        if let Some(ref r) = self.response {
            return Ok(r.clone());
        }
        Ok(format!(
            "[STT placeholder: {} bytes of {}; set STT_API_KEY for real transcription]",
            clip.bytes.len(),
            clip.mime()
        ))
    }

    fn name(&self) -> &'static str {
        "placeholder"
    }
}

/// Production STT backend: OpenAI-compatible transcription API (OpenAI Whisper, OpenRouter, etc.).
/// Uses `STT_API_URL` (e.g. https://api.openai.com/v1), `STT_API_KEY`, and `STT_MODEL` (default whisper-1).
#[derive(Debug, Clone)]
pub struct OpenRouterStt {
    /// Base URL without trailing slash.
    pub base_url: String,
    api_key: String,
    pub model: String,
    client: reqwest::Client,
}

impl OpenRouterStt {
    /// Build from environment: STT_API_URL, STT_API_KEY (or OPENAI_API_KEY / OPENROUTER_API_KEY), STT_MODEL.
    pub fn from_env() -> VoiceResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> VoiceResult<Self> {
        let opt = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let base_url = opt("STT_API_URL").unwrap_or_else(|| DEFAULT_STT_URL.to_string());
        let api_key = opt("STT_API_KEY")
            .or_else(|| opt("OPENAI_API_KEY"))
            .or_else(|| opt("OPENROUTER_API_KEY"))
            .ok_or_else(|| {
                VoiceError::Config(
                    "STT requires STT_API_KEY, OPENAI_API_KEY, or OPENROUTER_API_KEY".to_string(),
                )
            })?;
        let model = opt("STT_MODEL").unwrap_or_else(|| DEFAULT_STT_MODEL.to_string());
        Self::new(base_url, api_key, model)
    }

    /// Create with explicit config.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> VoiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(STT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/transcriptions", self.base_url)
    }
}

#[async_trait]
impl SttBackend for OpenRouterStt {
    async fn transcribe(&self, clip: &AudioClip) -> VoiceResult<String> {
        if clip.is_empty() {
            return Ok(String::new());
        }
        let part = reqwest::multipart::Part::bytes(clip.bytes.clone())
            .file_name(clip.upload_name())
            .mime_str(clip.mime())?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());
        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(VoiceError::Stt(format!("STT API error {}: {}", status, body)));
        }
        let json: serde_json::Value = res.json().await?;
        let text = json
            .get("text")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .trim()
            .to_string();
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "openai-compatible"
    }
}

/// Create the best available STT backend from environment.
/// OpenRouterStt if a key is set, otherwise PlaceholderStt.
pub fn create_best_stt() -> Box<dyn SttBackend> {
    match OpenRouterStt::from_env() {
        Ok(remote) => {
            tracing::info!("STT backend: {} (model={})", remote.name(), remote.model);
            Box::new(remote)
        }
        Err(e) => {
            tracing::warn!("STT backend: placeholder ({})", e);
            Box::new(PlaceholderStt::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn m4a_is_sent_as_mp4() {
        assert_eq!(AudioClip::new(vec![1], "vent.m4a").mime(), "audio/mp4");
        assert_eq!(AudioClip::new(vec![1], "VENT.M4A").upload_name(), "audio.m4a");
        assert_eq!(AudioClip::new(vec![1], "vent.wav").mime(), "audio/wav");
        assert_eq!(AudioClip::new(vec![1], "vent.ogg").mime(), "audio/wav");
        assert_eq!(AudioClip::new(vec![1], "").upload_name(), "audio.wav");
    }

    #[test]
    fn only_http_urls_are_fetchable() {
        assert!(is_http_url("https://storage.example.com/a.m4a"));
        assert!(is_http_url("HTTP://host/a.wav"));
        assert!(!is_http_url("/tmp/a.wav"));
        assert!(!is_http_url("file:///etc/passwd"));
    }

    #[tokio::test]
    async fn fetch_rejects_local_paths() {
        let client = reqwest::Client::new();
        let err = AudioClip::fetch(&client, "/etc/hosts").await.unwrap_err();
        assert!(matches!(err, VoiceError::Config(_)));
    }

    #[tokio::test]
    async fn placeholder_reports_clip() {
        let stt = PlaceholderStt::new();
        let s = stt.transcribe(&AudioClip::new(vec![0; 480], "a.m4a")).await.unwrap();
        assert!(s.contains("STT placeholder"));
        assert!(s.contains("480"));
        assert!(s.contains("audio/mp4"));
    }

    #[tokio::test]
    async fn placeholder_with_response() {
        let stt = PlaceholderStt::with_response("hello world".to_string());
        let clip = AudioClip::new(vec![], "a.wav");
        assert_eq!(stt.transcribe(&clip).await.unwrap(), "hello world");
    }

    #[test]
    fn remote_requires_a_key() {
        let err = OpenRouterStt::from_lookup(lookup(&[("STT_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, VoiceError::Config(_)));
    }

    #[test]
    fn remote_reads_env_with_fallback_key() {
        let stt = OpenRouterStt::from_lookup(lookup(&[
            ("OPENROUTER_API_KEY", "sk-or"),
            ("STT_API_URL", "https://openrouter.ai/api/v1/"),
        ]))
        .unwrap();
        assert_eq!(stt.model, "whisper-1");
        assert_eq!(stt.endpoint(), "https://openrouter.ai/api/v1/audio/transcriptions");
    }

    #[tokio::test]
    async fn remote_skips_empty_clip() {
        let stt = OpenRouterStt::new("http://127.0.0.1:9", "k", "whisper-1").unwrap();
        assert_eq!(stt.transcribe(&AudioClip::new(vec![], "a.wav")).await.unwrap(), "");
    }
}
