use poster_core::Design;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::OnceLock;
use thiserror::Error;

use crate::models::LlmConfig;

const DASHSCOPE_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
const ZHIPU_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const BAIDU_BASE_URL: &str = "https://aip.baidubce.com";
const TEMPERATURE: f32 = 0.7;

const SYSTEM_PROMPT: &str = r##"你是一个专业的海报设计师。根据用户的具体需求，生成海报设计方案。
重要：title、subtitle、description 必须根据用户输入来写，不能使用示例占位文字（如"标题内容"、"海报主标题"）。每条用户需求都要得到不同的、与之对应的文案。
template_id 根据内容选择：template_001 活动/竖版、template_002 产品/横版、template_003 节日/方形。color_scheme 的 primary/secondary 可根据主题换不同颜色（如节日用红金、产品用蓝白）。
请只返回一个 JSON 对象，不要其他说明。格式如下：
{
    "title": "根据用户需求写的标题",
    "subtitle": "根据用户需求写的副标题",
    "description": "根据用户需求写的描述",
    "template_id": "template_001 或 template_002 或 template_003",
    "color_scheme": {
        "primary": "#4A90E2",
        "secondary": "#FFFFFF",
        "accent": "#FFD700"
    },
    "elements": [
        {
            "id": "title",
            "content": "与上面 title 一致的具体标题文案",
            "position": {"x": 400, "y": 200},
            "style": {"fontSize": 48, "fontWeight": "bold", "color": "#FFFFFF", "textAlign": "center"}
        }
    ]
}"##;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Language model is not configured")]
    Disabled,

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response had no message content")]
    MissingContent,

    #[error("Response is not a JSON design: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Supported chat completion providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    DashScope,
    Zhipu,
    Baidu,
    OpenAi,
}

impl Provider {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dashscope" => Some(Provider::DashScope),
            "zhipu" => Some(Provider::Zhipu),
            "baidu" => Some(Provider::Baidu),
            "openai" => Some(Provider::OpenAi),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::DashScope => "dashscope",
            Provider::Zhipu => "zhipu",
            Provider::Baidu => "baidu",
            Provider::OpenAi => "openai",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Provider::DashScope => DASHSCOPE_BASE_URL,
            Provider::Zhipu => ZHIPU_BASE_URL,
            Provider::Baidu => BAIDU_BASE_URL,
            Provider::OpenAi => OPENAI_BASE_URL,
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Provider::DashScope => "qwen-turbo",
            Provider::Zhipu => "glm-4",
            Provider::Baidu => "ernie",
            Provider::OpenAi => "gpt-4o-mini",
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct BaiduTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct BaiduChatResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error_msg: Option<String>,
}

/// Asks a chat model for a poster design
///
/// Disabled when no API key is configured; callers then use a fallback design.
pub struct LlmService {
    config: LlmConfig,
    provider: Option<Provider>,
    client: reqwest::Client,
}

impl LlmService {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let provider = Provider::parse(&config.provider);
        if provider.is_none() {
            tracing::warn!(provider = %config.provider, "Unknown language model provider");
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("postercraft/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            config,
            provider,
            client,
        })
    }

    /// An API key is configured for a known provider
    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
            && self
                .config
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty())
    }

    /// Same as [`Self::is_enabled`]; no network probe
    pub fn is_available(&self) -> bool {
        self.is_enabled()
    }

    pub fn provider_name(&self) -> &str {
        &self.config.provider
    }

    fn model(&self, provider: Provider) -> String {
        self.config
            .model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string())
    }

    fn base_url(&self, provider: Provider) -> String {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    pub async fn generate_design(&self, prompt: &str) -> Result<Design, LlmError> {
        if !self.is_enabled() {
            return Err(LlmError::Disabled);
        }
        let provider = self
            .provider
            .ok_or_else(|| LlmError::UnsupportedProvider(self.config.provider.clone()))?;

        tracing::debug!(provider = provider.as_str(), "Requesting poster design");
        let content = match provider {
            Provider::Baidu => self.call_baidu(prompt).await?,
            _ => self.call_chat_completions(provider, prompt).await?,
        };

        let value: Value = serde_json::from_str(extract_json(&content))?;
        Ok(Design::from_value(value))
    }

    async fn call_chat_completions(&self, provider: Provider, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url(provider));
        let body = json!({
            "model": self.model(provider),
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
            "temperature": TEMPERATURE,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.as_deref().unwrap_or_default())
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::MissingContent)
    }

    async fn call_baidu(&self, prompt: &str) -> Result<String, LlmError> {
        let base = self.base_url(Provider::Baidu);

        let token_response = self
            .client
            .post(format!("{base}/oauth/2.0/token"))
            .query(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.api_key.as_deref().unwrap_or_default()),
                ("client_secret", self.config.secret_key.as_deref().unwrap_or_default()),
            ])
            .send()
            .await?;
        let token: BaiduTokenResponse = check_status(token_response).await?.json().await?;

        let body = json!({
            "messages": [
                {"role": "user", "content": format!("{SYSTEM_PROMPT}\n\n用户需求：{prompt}")},
            ],
            "temperature": TEMPERATURE,
        });
        let response = self
            .client
            .post(format!(
                "{base}/rpc/2.0/ai_custom/v1/wenxinworkshop/chat/completions"
            ))
            .query(&[("access_token", token.access_token.as_str())])
            .json(&body)
            .send()
            .await?;
        let chat: BaiduChatResponse = check_status(response).await?.json().await?;

        match (chat.result, chat.error_msg) {
            (Some(result), _) => Ok(result),
            (None, Some(message)) => Err(LlmError::Status { status: 200, body: message }),
            (None, None) => Err(LlmError::MissingContent),
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LlmError::Status {
        status: status.as_u16(),
        body: body.chars().take(200).collect(),
    })
}

fn fenced_json() -> Option<&'static Regex> {
    static FENCED: OnceLock<Option<Regex>> = OnceLock::new();
    FENCED
        .get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").ok())
        .as_ref()
}

/// The JSON object inside a model reply: a fenced block if present, else the
/// outermost braces, else the whole text.
pub fn extract_json(text: &str) -> &str {
    if let Some(captures) = fenced_json().and_then(|re| re.captures(text)) {
        if let Some(m) = captures.get(1) {
            return m.as_str();
        }
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}
