//! Model stages of the translation pipeline: translate and refine.
//!
//! Both are single free-text calls with no retry. All prompt text lives in
//! [`crate::prompts`]. They differ in what a failure means:
//!
//! - **Translate** has nothing to fall back to, so its error aborts the
//!   conversion.
//! - **Refine** always has the draft. A failed call or a reply that is
//!   empty after cleanup degrades to the draft with a warning.

use crate::config::ServiceConfig;
use crate::error::AnkonaError;
use crate::model::{generate_text, GenerativeModel, ModelRequest};
use crate::pipeline::input::CaseFileUpload;
use crate::pipeline::postprocess::clean_model_markdown;
use crate::prompts::{refine_prompt, translate_prompt, REFINE_INSTRUCTION, TRANSLATE_INSTRUCTION};
use tracing::{info, warn};

/// Result of the refinement stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refinement {
    /// Refined text, or the draft when refinement degraded.
    pub markdown: String,
    /// `false` when the draft was used as-is.
    pub refined: bool,
}

/// Translate the uploaded PDF into a Markdown draft.
pub async fn translate_draft(
    model: Option<&dyn GenerativeModel>,
    config: &ServiceConfig,
    upload: &CaseFileUpload,
) -> Result<String, AnkonaError> {
    let request = ModelRequest::new(&config.document_model, translate_prompt(upload.display_name()))
        .system_instruction(TRANSLATE_INSTRUCTION)
        .attachment(upload.attachment());

    let raw = generate_text(model, &request).await?;
    let draft = clean_model_markdown(&raw);
    info!(
        "Translated '{}' → {} chars of draft",
        upload.display_name(),
        draft.len()
    );
    Ok(draft)
}

/// Polish the draft, optionally against a style sample.
///
/// Never fails.
pub async fn refine_draft(
    model: Option<&dyn GenerativeModel>,
    config: &ServiceConfig,
    draft: &str,
    style_sample: Option<&str>,
) -> Refinement {
    let request = ModelRequest::new(&config.document_model, refine_prompt(draft, style_sample))
        .system_instruction(REFINE_INSTRUCTION);

    let fallback = || Refinement {
        markdown: draft.to_string(),
        refined: false,
    };

    match generate_text(model, &request).await {
        Ok(raw) => {
            let markdown = clean_model_markdown(&raw);
            if markdown.is_empty() {
                warn!("Refinement returned no text; using the draft");
                return fallback();
            }
            info!("Refined draft → {} chars", markdown.len());
            Refinement {
                markdown,
                refined: true,
            }
        }
        Err(e) => {
            warn!("Refinement failed, using the draft: {e}");
            fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Replay {
        replies: Mutex<Vec<Result<String, String>>>,
        seen: Mutex<Vec<ModelRequest>>,
    }

    impl Replay {
        fn new(replies: Vec<Result<&str, &str>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .rev()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GenerativeModel for Replay {
        fn name(&self) -> &str {
            "replay"
        }

        async fn generate(&self, request: &ModelRequest) -> Result<String, AnkonaError> {
            self.seen.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err("script exhausted".into()))
                .map_err(|message| AnkonaError::LlmApiError { message })
        }
    }

    fn pdf() -> CaseFileUpload {
        CaseFileUpload::new(
            Some("warrant.pdf".into()),
            Some("application/pdf".into()),
            b"%PDF-1.4 scan".to_vec(),
        )
    }

    #[tokio::test]
    async fn translate_sends_pdf_inline() {
        let model = Replay::new(vec![Ok("```markdown\n# Warrant\n```")]);
        let config = ServiceConfig::default();
        let draft = translate_draft(Some(&model), &config, &pdf()).await.unwrap();
        assert_eq!(draft, "# Warrant");

        let seen = model.seen.lock().unwrap();
        let req = &seen[0];
        assert_eq!(req.model, "gemini-2.5-flash");
        assert_eq!(req.system_instruction.as_deref(), Some(TRANSLATE_INSTRUCTION));
        assert!(req.prompt.contains("warrant.pdf"));
        let attachment = req.attachment.as_ref().unwrap();
        assert_eq!(attachment.mime_type, "application/pdf");
        assert_eq!(attachment.data, b"%PDF-1.4 scan");
        assert!(req.response_schema.is_none());
    }

    #[tokio::test]
    async fn translate_failure_propagates() {
        let model = Replay::new(vec![Err("HTTP 500")]);
        let err = translate_draft(Some(&model), &ServiceConfig::default(), &pdf())
            .await
            .unwrap_err();
        assert!(matches!(err, AnkonaError::LlmApiError { .. }));
    }

    #[tokio::test]
    async fn refine_uses_style_sample() {
        let model = Replay::new(vec![Ok("# Warrant\nRefined")]);
        let out = refine_draft(
            Some(&model),
            &ServiceConfig::default(),
            "# Warrant\ndraft",
            Some("# Heading Sample"),
        )
        .await;
        assert!(out.refined);
        assert_eq!(out.markdown, "# Warrant\nRefined");

        let seen = model.seen.lock().unwrap();
        assert!(seen[0].prompt.contains("# Heading Sample"));
        assert!(seen[0].prompt.ends_with("# Warrant\ndraft"));
        assert!(seen[0].attachment.is_none());
    }

    #[tokio::test]
    async fn refine_error_falls_back_to_draft() {
        let model = Replay::new(vec![Err("quota exceeded")]);
        let out = refine_draft(Some(&model), &ServiceConfig::default(), "draft text", None).await;
        assert_eq!(
            out,
            Refinement {
                markdown: "draft text".into(),
                refined: false
            }
        );
    }

    #[tokio::test]
    async fn refine_empty_reply_falls_back_to_draft() {
        let model = Replay::new(vec![Ok("```\n```")]);
        let out = refine_draft(Some(&model), &ServiceConfig::default(), "draft text", None).await;
        assert!(!out.refined);
        assert_eq!(out.markdown, "draft text");
    }

    #[tokio::test]
    async fn refine_without_model_falls_back() {
        let out = refine_draft(None, &ServiceConfig::default(), "draft", None).await;
        assert!(!out.refined);
    }
}
