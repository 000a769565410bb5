pub mod media;
pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

/// Boundary to the external model provider. The server constructs one
/// implementation at startup when credentials are present and injects it
/// into the pipeline; tests substitute a scripted double.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// One text completion constrained to a JSON object response. Returns
    /// the raw message content for the caller to parse.
    async fn complete_json(&self, system_prompt: &str, user_content: &str) -> Result<String>;

    /// One vision call describing the supplied photo (a data URL).
    async fn describe_image(&self, system_prompt: &str, photo_data_url: &str) -> Result<String>;

    /// One image synthesis call. Returns the finished image bytes.
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::ModelClient;

    pub struct ImageStep {
        pub delay: Duration,
        pub result: Result<Vec<u8>, String>,
    }

    impl ImageStep {
        pub fn ok(bytes: &[u8]) -> Self {
            ImageStep {
                delay: Duration::ZERO,
                result: Ok(bytes.to_vec()),
            }
        }

        pub fn ok_after(delay: Duration, bytes: &[u8]) -> Self {
            ImageStep {
                delay,
                result: Ok(bytes.to_vec()),
            }
        }

        pub fn fail(message: &str) -> Self {
            ImageStep {
                delay: Duration::ZERO,
                result: Err(message.to_string()),
            }
        }
    }

    /// Scripted stand-in for the provider. Image calls consume per-prompt
    /// step queues so tests can shape completion order and retry outcomes.
    pub struct MockModel {
        pub complete_calls: AtomicUsize,
        pub describe_calls: AtomicUsize,
        pub image_calls: AtomicUsize,
        complete_response: Mutex<Result<String, String>>,
        describe_response: Mutex<Result<String, String>>,
        image_plans: Mutex<HashMap<String, Vec<ImageStep>>>,
        image_attempts: Mutex<HashMap<String, usize>>,
        default_image: Vec<u8>,
    }

    impl MockModel {
        pub fn new() -> Self {
            MockModel {
                complete_calls: AtomicUsize::new(0),
                describe_calls: AtomicUsize::new(0),
                image_calls: AtomicUsize::new(0),
                complete_response: Mutex::new(Ok("[]".to_string())),
                describe_response: Mutex::new(Ok("a short description".to_string())),
                image_plans: Mutex::new(HashMap::new()),
                image_attempts: Mutex::new(HashMap::new()),
                default_image: b"png-bytes".to_vec(),
            }
        }

        pub fn with_complete_response(self, raw: &str) -> Self {
            *self.complete_response.lock() = Ok(raw.to_string());
            self
        }

        pub fn with_complete_error(self, message: &str) -> Self {
            *self.complete_response.lock() = Err(message.to_string());
            self
        }

        pub fn with_describe_response(self, description: &str) -> Self {
            *self.describe_response.lock() = Ok(description.to_string());
            self
        }

        pub fn with_describe_error(self, message: &str) -> Self {
            *self.describe_response.lock() = Err(message.to_string());
            self
        }

        /// Queue the outcomes of successive image calls whose prompt
        /// contains `prompt_fragment`. Unmatched prompts succeed with the
        /// default bytes.
        pub fn plan_images(self, prompt_fragment: &str, steps: Vec<ImageStep>) -> Self {
            self.image_plans
                .lock()
                .insert(prompt_fragment.to_string(), steps);
            self
        }

        pub fn total_calls(&self) -> usize {
            self.complete_calls.load(Ordering::SeqCst)
                + self.describe_calls.load(Ordering::SeqCst)
                + self.image_calls.load(Ordering::SeqCst)
        }

        pub fn image_attempts(&self, prompt_fragment: &str) -> usize {
            self.image_attempts
                .lock()
                .get(prompt_fragment)
                .copied()
                .unwrap_or(0)
        }

        fn next_image_step(&self, prompt: &str) -> ImageStep {
            let mut plans = self.image_plans.lock();
            let mut attempts = self.image_attempts.lock();
            for (fragment, steps) in plans.iter_mut() {
                if prompt.contains(fragment.as_str()) {
                    *attempts.entry(fragment.clone()).or_insert(0) += 1;
                    if steps.is_empty() {
                        return ImageStep::ok(&self.default_image);
                    }
                    return steps.remove(0);
                }
            }
            ImageStep::ok(&self.default_image)
        }
    }

    #[async_trait]
    impl ModelClient for MockModel {
        async fn complete_json(&self, _system_prompt: &str, _user_content: &str) -> Result<String> {
            self.complete_calls.fetch_add(1, Ordering::SeqCst);
            self.complete_response
                .lock()
                .clone()
                .map_err(|message| anyhow!(message))
        }

        async fn describe_image(
            &self,
            _system_prompt: &str,
            _photo_data_url: &str,
        ) -> Result<String> {
            self.describe_calls.fetch_add(1, Ordering::SeqCst);
            self.describe_response
                .lock()
                .clone()
                .map_err(|message| anyhow!(message))
        }

        async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>> {
            self.image_calls.fetch_add(1, Ordering::SeqCst);
            let step = self.next_image_step(prompt);
            if !step.delay.is_zero() {
                tokio::time::sleep(step.delay).await;
            }
            step.result.map_err(|message| anyhow!(message))
        }
    }
}
