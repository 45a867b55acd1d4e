//! Exchange providers
//!
//! An exchange provider turns one user input into one reply for a given
//! model. The live provider calls the Hugging Face Inference API; the
//! simulated one answers locally after a fixed delay.

pub mod hugging_face;
pub mod simulated;

use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use thiserror::Error;

use crate::config::{ChatConfig, ProviderKind};

pub use hugging_face::HuggingFaceClient;
pub use simulated::SimulatedProvider;

/// Ways a single exchange can fail
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Hugging Face API token is not configured")]
    ConfigurationMissing,

    #[error("Invalid model id: {0}")]
    InvalidModelId(String),

    #[error("HTTP error! status: {status}, body: {body}")]
    Http { status: u16, body: String },

    #[error("Unexpected response format from Hugging Face API")]
    MalformedResponse,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[async_trait]
pub trait ExchangeProvider: Send + Sync {
    /// Short label used in the banner and logs
    fn name(&self) -> &'static str;

    /// Send `input` to `model_id` and return the generated reply.
    async fn exchange(&self, input: &str, model_id: &str) -> Result<String, ExchangeError>;
}

/// Pick the provider implementation named by the configuration.
pub fn build_provider(config: &ChatConfig) -> Result<Box<dyn ExchangeProvider>> {
    let provider: Box<dyn ExchangeProvider> = match config.provider {
        ProviderKind::Live => Box::new(HuggingFaceClient::new(
            &config.api_base,
            config.api_token.clone(),
        )?),
        ProviderKind::Simulated => Box::new(SimulatedProvider::new(Duration::from_millis(
            config.simulated_delay_ms,
        ))),
    };
    Ok(provider)
}
