// src/screen/openai.rs
//! OpenAI chat-completions screener. Requires `OPENAI_API_KEY`.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{ScreenDecision, Screener};
use crate::sources::types::{Category, SourceItem};

const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You are a general-purpose reader assessing whether an item represents a meaningful tech trend. \
Keep items that describe real developments, launches, research advances, or infra shifts. \
Discard items that are minor edits, change logs without substance, wiki/diff noise, spam, or off-topic posts. \
Also classify the item as one of: product (launches, APIs, platforms, dev tools, pricing), \
research (papers, benchmarks, datasets, model capability advances), \
infra (compute, accelerators, inference/serving, cloud capacity, MLOps). \
Reply with a JSON object: {\"keep\": bool, \"confidence\": number 0-1, \"rationale\": string, \"category\": string}.";

pub struct OpenAiScreener {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiScreener {
    /// `None` when `OPENAI_API_KEY` is unset or empty.
    pub fn from_env(timeout: Duration) -> Result<Option<Self>> {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            return Ok(None);
        }
        let model = std::env::var("TRENDS_LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Self::new(api_key, model, timeout).map(Some)
    }

    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tech-trends/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building openai http client")?;
        Ok(Self {
            http,
            api_key,
            model,
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: String,
}

/// Lenient view of the model's JSON reply.
#[derive(Deserialize)]
struct Verdict {
    keep: bool,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    rationale: String,
    #[serde(default)]
    category: Option<String>,
}

pub(crate) fn parse_verdict(content: &str) -> Result<ScreenDecision> {
    let v: Verdict = serde_json::from_str(content.trim()).context("parsing screen verdict")?;
    let category = v
        .category
        .as_deref()
        .and_then(|c| c.parse::<Category>().ok());
    let decision = if v.keep {
        ScreenDecision::keep(v.confidence, v.rationale)
    } else {
        ScreenDecision::discard(v.confidence, v.rationale)
    };
    Ok(decision.recategorized(category))
}

#[async_trait::async_trait]
impl Screener for OpenAiScreener {
    async fn screen(&self, item: &SourceItem) -> Result<ScreenDecision> {
        let user = format!(
            "Source: {}\nTitle: {}\nSummary: {}\nURL: {}",
            item.source,
            item.title,
            item.summary.as_deref().unwrap_or_default(),
            item.url
        );
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.2,
            max_tokens: 200,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let resp = self
            .http
            .post(ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("openai request")?
            .error_for_status()
            .context("openai status")?;
        let body: Resp = resp.json().await.context("openai body")?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("");
        parse_verdict(content)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
