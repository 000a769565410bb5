use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tracing::{info, warn};

use crate::error::{CardError, CardResult};
use crate::llm::media::encode_image_data_url;
use crate::llm::ModelClient;
use crate::models::FanoutRequest;
use crate::pipeline::portrait::card_portrait_prompt;

/// Fixed style catalog. Index order is the card's style slot order and is
/// what callers see; it never changes at runtime.
pub const STYLE_PROMPTS: [&str; 3] = [
    "Dramatic collectible card style with rich gold and dark tones, cinematic lighting",
    "Watercolor artistic style with soft flowing colors and painterly brushstrokes",
    "Bold comic book pop art style with strong outlines, vibrant flat colors, and dynamic energy",
];

pub const STYLE_COUNT: usize = STYLE_PROMPTS.len();

const STYLE_RETRY_LIMIT: usize = 1;
const STYLE_RETRY_DELAY: Duration = Duration::from_secs(2);

struct StylePortrait {
    style_id: usize,
    image: String,
}

/// Generate one portrait per catalog style, in parallel, and return them in
/// catalog order regardless of completion order. Each style task owns an
/// independent retry budget; if any style still fails after its retry the
/// whole fan-out fails and no partial set is returned.
pub async fn generate_portraits(
    model: Arc<dyn ModelClient>,
    request: &FanoutRequest,
) -> CardResult<Vec<String>> {
    request.validate()?;

    let mut handles = Vec::with_capacity(STYLE_COUNT);
    for (style_id, style_prompt) in STYLE_PROMPTS.iter().enumerate() {
        let model = Arc::clone(&model);
        let prompt = card_portrait_prompt(
            request.name.trim(),
            request.title.trim(),
            request.description.trim(),
            style_prompt,
        );
        handles.push(tokio::spawn(async move {
            run_style_task(model.as_ref(), style_id, &prompt).await
        }));
    }

    // Slots are keyed by style id, so ordering is structural rather than
    // dependent on which call happens to finish first. All tasks are awaited
    // to a terminal state even once a failure is known.
    let mut slots: [Option<String>; STYLE_COUNT] = [None, None, None];
    let mut first_failure: Option<CardError> = None;
    for handle in handles {
        match handle.await {
            Ok(Ok(portrait)) => slots[portrait.style_id] = Some(portrait.image),
            Ok(Err(err)) => {
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
            Err(err) => {
                if first_failure.is_none() {
                    first_failure = Some(CardError::generation(
                        "generate portraits",
                        anyhow!("portrait task panicked: {err}"),
                    ));
                }
            }
        }
    }

    if let Some(err) = first_failure {
        return Err(err);
    }

    let mut images = Vec::with_capacity(STYLE_COUNT);
    for (style_id, slot) in slots.into_iter().enumerate() {
        images.push(slot.ok_or_else(|| {
            CardError::generation(
                "generate portraits",
                anyhow!("missing portrait for style {style_id}"),
            )
        })?);
    }

    info!("Generated {} style portraits for {}", images.len(), request.name.trim());
    Ok(images)
}

async fn run_style_task(
    model: &dyn ModelClient,
    style_id: usize,
    prompt: &str,
) -> CardResult<StylePortrait> {
    let mut attempt = 0usize;
    loop {
        attempt += 1;
        match model.generate_image(prompt).await {
            Ok(bytes) => {
                return Ok(StylePortrait {
                    style_id,
                    image: encode_image_data_url(&bytes),
                })
            }
            Err(err) if attempt <= STYLE_RETRY_LIMIT => {
                warn!(
                    "Portrait for style {style_id} failed on attempt {attempt}, retrying: {err:#}"
                );
                tokio::time::sleep(STYLE_RETRY_DELAY).await;
            }
            Err(err) => {
                warn!("Portrait for style {style_id} failed after {attempt} attempts");
                return Err(CardError::generation("generate portraits", err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::media::decode_data_url;
    use crate::llm::testing::{ImageStep, MockModel};
    use std::sync::atomic::Ordering;

    fn request() -> FanoutRequest {
        FanoutRequest {
            description: "short dark hair, round glasses".to_string(),
            name: "Ada Lovelace".to_string(),
            title: "Staff Engineer".to_string(),
            skills: vec!["Rust".to_string()],
        }
    }

    // Style prompts are embedded verbatim in the task prompts, so a
    // distinctive fragment of each selects its plan.
    const FRAGMENTS: [&str; 3] = ["Dramatic collectible", "Watercolor artistic", "comic book pop art"];

    #[tokio::test(start_paused = true)]
    async fn results_follow_catalog_order_not_completion_order() {
        // Style 2 resolves first, style 0 last.
        let model = Arc::new(
            MockModel::new()
                .plan_images(
                    FRAGMENTS[0],
                    vec![ImageStep::ok_after(Duration::from_millis(300), b"style-0")],
                )
                .plan_images(
                    FRAGMENTS[1],
                    vec![ImageStep::ok_after(Duration::from_millis(150), b"style-1")],
                )
                .plan_images(FRAGMENTS[2], vec![ImageStep::ok(b"style-2")]),
        );

        let images = generate_portraits(model, &request()).await.unwrap();
        assert_eq!(images.len(), 3);
        for (style_id, image) in images.iter().enumerate() {
            let (_, bytes) = decode_data_url(image).unwrap();
            assert_eq!(bytes, format!("style-{style_id}").into_bytes());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_retries_once_and_succeeds() {
        let model = Arc::new(
            MockModel::new()
                .plan_images(FRAGMENTS[0], vec![ImageStep::ok(b"style-0")])
                .plan_images(
                    FRAGMENTS[1],
                    vec![ImageStep::fail("transient"), ImageStep::ok(b"style-1")],
                )
                .plan_images(FRAGMENTS[2], vec![ImageStep::ok(b"style-2")]),
        );

        let images = generate_portraits(model.clone(), &request()).await.unwrap();
        assert_eq!(images.len(), 3);
        // The failing style used exactly 2 attempts; the others only 1.
        assert_eq!(model.image_attempts(FRAGMENTS[1]), 2);
        assert_eq!(model.image_attempts(FRAGMENTS[0]), 1);
        assert_eq!(model.image_attempts(FRAGMENTS[2]), 1);
        assert_eq!(model.image_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retry_budget_fails_the_whole_fanout() {
        let model = Arc::new(
            MockModel::new()
                .plan_images(FRAGMENTS[0], vec![ImageStep::ok(b"style-0")])
                .plan_images(FRAGMENTS[1], vec![ImageStep::ok(b"style-1")])
                .plan_images(
                    FRAGMENTS[2],
                    vec![ImageStep::fail("down"), ImageStep::fail("still down")],
                ),
        );

        let err = generate_portraits(model.clone(), &request())
            .await
            .unwrap_err();
        assert!(matches!(err, CardError::Generation { .. }));
        // One style exhausting its own budget never consumes the others'.
        assert_eq!(model.image_attempts(FRAGMENTS[2]), 2);
        assert_eq!(model.image_attempts(FRAGMENTS[0]), 1);
        assert_eq!(model.image_attempts(FRAGMENTS[1]), 1);
    }

    #[tokio::test]
    async fn blank_description_is_rejected_before_any_call() {
        let model = Arc::new(MockModel::new());
        let invalid = FanoutRequest {
            description: " ".to_string(),
            name: "Ada".to_string(),
            title: "Engineer".to_string(),
            skills: vec![],
        };
        let err = generate_portraits(model.clone(), &invalid)
            .await
            .unwrap_err();
        assert!(matches!(err, CardError::Validation(_)));
        assert_eq!(model.total_calls(), 0);
    }
}
