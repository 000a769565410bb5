use tracing::warn;

use crate::error::{CardError, CardResult};
use crate::llm::media::encode_image_data_url;
use crate::llm::ModelClient;
use crate::models::{EnhanceRequest, PortraitRequest};
use crate::pipeline::fanout::STYLE_PROMPTS;

const VISION_SYSTEM_PROMPT: &str = "Describe this person's physical appearance concisely: hair color/style, skin tone, facial features, expression, glasses, facial hair, and any distinguishing characteristics. Keep it to 2-3 sentences.";

/// Shared prompt template for stylized card portraits.
pub fn card_portrait_prompt(name: &str, title: &str, description: &str, style: &str) -> String {
    format!(
        "A stylized premium trading card portrait of {name}, {title}. Based on this appearance: {description}. Painted in a {style} and a polished background. Upper body portrait, facing the viewer."
    )
}

fn headshot_prompt(description: &str) -> String {
    format!(
        "Professional corporate headshot portrait of {description}. Clean background, studio lighting, business attire, photorealistic style. Suitable for a premium trading card."
    )
}

/// Text path: one synthesis call from a free-text description, single
/// attempt. Failure surfaces to the caller.
pub async fn synthesize_portrait(
    model: &dyn ModelClient,
    request: &PortraitRequest,
) -> CardResult<String> {
    request.validate()?;
    let prompt = headshot_prompt(request.description.trim());
    let bytes = model
        .generate_image(&prompt)
        .await
        .map_err(|err| CardError::generation("generate image", err))?;
    Ok(encode_image_data_url(&bytes))
}

/// Enhancement path: describe the uploaded photo, then regenerate it as a
/// stylized card portrait. Both stages soft-fail: any error yields `None`
/// and the caller keeps the original photo.
pub async fn enhance_portrait(
    model: &dyn ModelClient,
    request: &EnhanceRequest,
) -> CardResult<Option<String>> {
    request.validate()?;

    let Some(photo) = request
        .photo
        .as_deref()
        .filter(|photo| !photo.trim().is_empty())
    else {
        return Ok(None);
    };

    let description = match model.describe_image(VISION_SYSTEM_PROMPT, photo).await {
        Ok(description) => description,
        Err(err) => {
            warn!("Photo description failed, keeping original photo: {err:#}");
            return Ok(None);
        }
    };

    let prompt = card_portrait_prompt(
        request.name.trim(),
        request.title.trim(),
        description.trim(),
        STYLE_PROMPTS[0],
    );
    match model.generate_image(&prompt).await {
        Ok(bytes) => Ok(Some(encode_image_data_url(&bytes))),
        Err(err) => {
            warn!("Portrait enhancement failed, keeping original photo: {err:#}");
            Ok(None)
        }
    }
}
