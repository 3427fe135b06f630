//! Text-generation collaborator - cosmetic strings from a local LLM, with
//! deterministic fallbacks.
//!
//! The simulation never blocks on this: the host fetches strings here and
//! hands them to the orchestrator. Any failure (service absent, timeout, bad
//! payload) is absorbed into the fixed fallback set and logged at warn level.

use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::warn;

/// Default local generation endpoint
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:11434";

/// Model used for tip and welcome generation
pub const TIP_MODEL: &str = "llama3.2:3b";

/// Short attempt window; past this the fallback wins
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

const TIPS_PROMPT: &str = "Write five short, friendly tips shown during an \
operating system installation, one per line, no numbering.";

/// Fixed tip list used whenever generation is unavailable
pub fn fallback_tips() -> Vec<String> {
    [
        "Tip: Keep your product key somewhere safe - you may need it later.",
        "Tip: GPT-partitioned media boots in UEFI mode; MBR media needs Legacy.",
        "Tip: Secure Boot only works when the firmware boots in UEFI mode.",
        "Tip: Your PC will restart several times during installation.",
        "Tip: Sign-in security questions help you recover a forgotten password.",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

/// Templated welcome used whenever generation is unavailable
pub fn fallback_welcome(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        "Welcome! Your PC is ready to go.".to_string()
    } else {
        format!("Hi {}, welcome to your new desktop. Everything is ready to go.", name)
    }
}

/// Client for the local generation service
pub struct TipClient {
    base_url: String,
    model: String,
    timeout: Duration,
}

impl Default for TipClient {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ENDPOINT.to_string(),
            model: TIP_MODEL.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl TipClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Installation tips, falling back to the fixed list on any failure
    pub async fn generate_tips(&self) -> Vec<String> {
        match self.generate(TIPS_PROMPT).await {
            Ok(text) => {
                let tips = parse_tip_lines(&text);
                if tips.is_empty() {
                    warn!("tip generation returned no usable lines, using fallback");
                    fallback_tips()
                } else {
                    tips
                }
            }
            Err(e) => {
                warn!("tip generation unavailable ({}), using fallback", e);
                fallback_tips()
            }
        }
    }

    /// Personalized welcome line, falling back to the template on any failure
    pub async fn generate_welcome(&self, name: &str) -> String {
        let prompt = format!(
            "Write one short, warm welcome sentence for a user named {} who \
             just finished installing their operating system.",
            name
        );
        match self.generate(&prompt).await {
            Ok(text) => {
                let line = text.lines().map(str::trim).find(|l| !l.is_empty());
                match line {
                    Some(l) => l.to_string(),
                    None => fallback_welcome(name),
                }
            }
            Err(e) => {
                warn!("welcome generation unavailable ({}), using fallback", e);
                fallback_welcome(name)
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false
        });

        let response = client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("generation request failed: {}", response.status()));
        }

        let json: serde_json::Value = response.json().await?;
        let text = json
            .get("response")
            .and_then(|r| r.as_str())
            .unwrap_or("")
            .to_string();

        if text.trim().is_empty() {
            return Err(anyhow!("generation returned an empty response"));
        }
        Ok(text)
    }
}

/// Split generated text into clean tip lines, stripping list markers
fn parse_tip_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['-', '*', '•'])
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
                .trim()
        })
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect()
}
