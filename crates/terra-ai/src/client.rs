//! The external model call (spec §4.7 step 3). `ModelClient` is the
//! swappable I/O seam the driver dispatches through, mirroring
//! `terra-pipeline`'s `DocumentConverter`/`ObjectStore` pattern: a real
//! `reqwest`-backed implementation for production, a stub for tests.

use std::time::Duration;

use async_trait::async_trait;
use terra_core::config::AiConfig;

use crate::error::{AiError, AiResult};

/// One JSON-producing chat completion. `json_mode` requests the
/// provider's structured-output hint; the driver drops it on the first
/// parse-failure retry (spec §7).
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str, json_mode: bool) -> AiResult<String>;
}

pub struct HttpModelClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpModelClient {
    pub fn new(config: &AiConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("build reqwest client");
        Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn complete(&self, system: &str, user: &str, json_mode: bool) -> AiResult<String> {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });
        if json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(AiError::Request(format!("model endpoint returned {status}: {text}")));
        }

        let envelope: serde_json::Value = resp.json().await.map_err(|e| AiError::Request(e.to_string()))?;
        envelope
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or(AiError::MissingKey("choices[0].message.content"))
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays fixed responses in order, one per call, regardless of
    /// `json_mode`; cycles back to the first response once exhausted so a
    /// driver's retry attempts don't run out of scripted answers.
    pub struct ScriptedClient {
        responses: Vec<AiResult<String>>,
        calls: AtomicUsize,
        seen_json_modes: Mutex<Vec<bool>>,
    }

    impl ScriptedClient {
        pub fn new(responses: Vec<AiResult<String>>) -> Self {
            Self { responses, calls: AtomicUsize::new(0), seen_json_modes: Mutex::new(Vec::new()) }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn json_modes_seen(&self) -> Vec<bool> {
            self.seen_json_modes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedClient {
        async fn complete(&self, _system: &str, _user: &str, json_mode: bool) -> AiResult<String> {
            self.seen_json_modes.lock().unwrap().push(json_mode);
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.responses[idx % self.responses.len()] {
                Ok(s) => Ok(s.clone()),
                Err(AiError::Request(m)) => Err(AiError::Request(m.clone())),
                Err(AiError::Parse(m)) => Err(AiError::Parse(m.clone())),
                Err(AiError::MissingKey(k)) => Err(AiError::MissingKey(k)),
            }
        }
    }
}
