use std::sync::OnceLock;

use async_trait::async_trait;
use eyre::{Result, eyre};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use super::{ExchangeError, ExchangeProvider};

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    /// Block until a cold model has loaded instead of failing with 503
    wait_for_model: bool,
}

pub struct HuggingFaceClient {
    api_base: Url,
    api_token: Option<String>,
    client: reqwest::Client,
}

impl HuggingFaceClient {
    pub fn new(api_base: &str, api_token: Option<String>) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), api_base, api_token)
    }

    pub fn with_client(
        client: reqwest::Client,
        api_base: &str,
        api_token: Option<String>,
    ) -> Result<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| eyre!("Invalid API base URL '{}': {}", api_base, e))?;

        Ok(Self {
            api_base,
            api_token,
            client,
        })
    }

    /// `{api_base}models/{model_id}`
    pub fn endpoint(&self, model_id: &str) -> Result<Url, ExchangeError> {
        if !is_valid_model_id(model_id) {
            return Err(ExchangeError::InvalidModelId(model_id.to_string()));
        }
        self.api_base
            .join(&format!("models/{}", model_id))
            .map_err(|_| ExchangeError::InvalidModelId(model_id.to_string()))
    }

    async fn query(&self, input: &str, model_id: &str) -> Result<String, ExchangeError> {
        let token = match self.api_token.as_deref() {
            Some(token) if !token.is_empty() => token,
            _ => return Err(ExchangeError::ConfigurationMissing),
        };
        let url = self.endpoint(model_id)?;

        let request_body = InferenceRequest {
            inputs: input,
            options: InferenceOptions {
                wait_for_model: true,
            },
        };
        debug!("Sending request to {}: {:?}", url, request_body);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ExchangeError::Http {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Received response: {}", body);
        extract_generated_text(&body)
    }
}

#[async_trait]
impl ExchangeProvider for HuggingFaceClient {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    async fn exchange(&self, input: &str, model_id: &str) -> Result<String, ExchangeError> {
        self.query(input, model_id).await.map_err(|e| {
            error!("Inference request to {} failed: {}", model_id, e);
            e
        })
    }
}

/// Pull `generated_text` out of the first element of the response array.
/// An empty string counts as missing.
fn extract_generated_text(body: &str) -> Result<String, ExchangeError> {
    let value: Value = serde_json::from_str(body).map_err(|_| ExchangeError::MalformedResponse)?;

    value
        .as_array()
        .and_then(|results| results.first())
        .and_then(|first| first.get("generated_text"))
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or(ExchangeError::MalformedResponse)
}

/// Hub repo ids: `name` or `owner/name`.
fn is_valid_model_id(model_id: &str) -> bool {
    static MODEL_ID: OnceLock<Option<Regex>> = OnceLock::new();
    let re = MODEL_ID.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*(/[A-Za-z0-9][A-Za-z0-9._-]*)?$").ok()
    });
    re.as_ref().is_some_and(|re| re.is_match(model_id)) && !model_id.contains("..")
}
