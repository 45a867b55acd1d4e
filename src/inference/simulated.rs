use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{ExchangeError, ExchangeProvider};

/// Answers every input with a canned reply after a fixed delay.
pub struct SimulatedProvider {
    delay: Duration,
}

impl SimulatedProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ExchangeProvider for SimulatedProvider {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn exchange(&self, input: &str, model_id: &str) -> Result<String, ExchangeError> {
        debug!("Simulating {} reply after {:?}", model_id, self.delay);
        tokio::time::sleep(self.delay).await;
        Ok(format!(
            "This is a simulated response from the {} model for the input: \"{}\"",
            model_id, input
        ))
    }
}
