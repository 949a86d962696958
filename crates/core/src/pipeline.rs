//! One complete edit cycle: validate, encode, call, extract, decode.

use crate::codec::{DisplayResource, ImageCodec, UploadedImage};
use crate::error::{AppError, Result, ValidationError};
use crate::gemini::{ContentPart, EditRequest, ImageEditService};
use std::sync::Arc;

/// Outcome of one submission: the edited image, or the error whose message
/// is shown to the user.
pub type EditResult = Result<DisplayResource>;

/// Runs edit requests against an [`ImageEditService`].
///
/// Holds no per-request state, so clones may run concurrently.
#[derive(Clone)]
pub struct EditPipeline {
    service: Arc<dyn ImageEditService>,
}

impl EditPipeline {
    pub fn new(service: Arc<dyn ImageEditService>) -> Self {
        Self { service }
    }

    /// Edits `image` according to `prompt`.
    ///
    /// Inputs are validated before anything is encoded or sent; a missing
    /// image or blank prompt never reaches the network.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::MissingImage`] / [`ValidationError::MissingPrompt`]
    /// - [`AppError::Read`] if the image cannot be encoded
    /// - [`AppError::Config`] / [`AppError::RemoteService`] from the service
    /// - [`AppError::NoImageReturned`] if no part carries image data
    pub async fn submit(&self, image: Option<&UploadedImage>, prompt: &str) -> EditResult {
        let image = image.ok_or(ValidationError::MissingImage)?;
        if prompt.trim().is_empty() {
            return Err(ValidationError::MissingPrompt.into());
        }

        let request = EditRequest {
            image: ImageCodec::encode(image)?,
            prompt: prompt.to_string(),
        };

        tracing::debug!(
            model = %self.service.model(),
            file = %image.name(),
            bytes = image.size(),
            "submitting edit"
        );

        let parts = self.service.edit(&request).await?;
        let resource = first_inline_image(&parts).ok_or(AppError::NoImageReturned)?;

        tracing::debug!(mime_type = %resource.mime_type(), "edit returned an image");
        Ok(resource)
    }
}

/// The first image-bearing part, in response order.
pub fn first_inline_image(parts: &[ContentPart]) -> Option<DisplayResource> {
    parts.iter().find_map(|part| match part {
        ContentPart::InlineImage { mime_type, data } => Some(ImageCodec::decode(data, mime_type)),
        _ => None,
    })
}


#[cfg(test)]
mod tests {
    use super::testing::{ScriptedService, png_part};
    use super::*;
    use crate::codec::ImageMime;

    fn jpeg(size: usize) -> UploadedImage {
        UploadedImage::new("photo.jpg", vec![0xAB; size], ImageMime::Jpeg)
    }

    #[tokio::test]
    async fn test_add_a_hat_scenario() {
        let service = ScriptedService::replying(vec![png_part("QUJD")]);
        let pipeline = EditPipeline::new(service.clone());

        let resource = pipeline
            .submit(Some(&jpeg(2 * 1024 * 1024)), "add a hat")
            .await
            .unwrap();

        assert_eq!(resource.data_uri(), "data:image/png;base64,QUJD");
        assert_eq!(service.calls(), 1);

        let sent = service.last_request().unwrap();
        assert_eq!(sent.prompt, "add a hat");
        assert_eq!(sent.image.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_missing_image_makes_no_call() {
        let service = ScriptedService::replying(vec![png_part("QUJD")]);
        let pipeline = EditPipeline::new(service.clone());

        let err = pipeline.submit(None, "add a hat").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::MissingImage)));
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_prompt_makes_no_call() {
        let service = ScriptedService::replying(vec![png_part("QUJD")]);
        let pipeline = EditPipeline::new(service.clone());

        for prompt in ["", "   ", "\n\t "] {
            let err = pipeline.submit(Some(&jpeg(16)), prompt).await.unwrap_err();
            assert_eq!(err.to_string(), "Please enter an editing prompt.");
        }
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_text_only_response_is_no_image_error() {
        let service = ScriptedService::replying(vec![
            ContentPart::Text("I can't help with that.".to_string()),
        ]);
        let pipeline = EditPipeline::new(service);

        let err = pipeline.submit(Some(&jpeg(16)), "do it").await.unwrap_err();
        assert!(matches!(err, AppError::NoImageReturned));
    }

    #[tokio::test]
    async fn test_empty_response_is_no_image_error() {
        let pipeline = EditPipeline::new(ScriptedService::replying(Vec::new()));
        let err = pipeline.submit(Some(&jpeg(16)), "do it").await.unwrap_err();
        assert!(matches!(err, AppError::NoImageReturned));
    }

    #[tokio::test]
    async fn test_image_after_text_part_is_selected() {
        let service = ScriptedService::replying(vec![
            ContentPart::Text("Sure! Here you go.".to_string()),
            png_part("Rk9P"),
            png_part("QkFS"),
        ]);
        let pipeline = EditPipeline::new(service);

        let resource = pipeline.submit(Some(&jpeg(16)), "do it").await.unwrap();
        assert_eq!(resource.payload(), "Rk9P");
    }

    #[tokio::test]
    async fn test_service_errors_pass_through() {
        let pipeline = EditPipeline::new(ScriptedService::failing(|| {
            AppError::remote("HTTP 503: overloaded")
        }));
        let err = pipeline.submit(Some(&jpeg(16)), "do it").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to edit image: HTTP 503: overloaded");

        let pipeline = EditPipeline::new(ScriptedService::failing(|| {
            AppError::config("credential not set")
        }));
        let err = pipeline.submit(Some(&jpeg(16)), "do it").await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_first_inline_image_skips_other_parts() {
        let parts = vec![ContentPart::Other, ContentPart::Text("hi".into()), png_part("QUJD")];
        assert_eq!(first_inline_image(&parts).unwrap().payload(), "QUJD");
        assert!(first_inline_image(&[ContentPart::Other]).is_none());
    }
}
