//! Model invocation: the one seam between the service and the external
//! generative model.
//!
//! [`GenerativeModel`] is the provider trait; [`crate::gemini::GeminiClient`]
//! is the production implementation and tests plug in scripted doubles.
//! Two free functions sit on top of it:
//!
//! * [`generate_text`]: free-text mode, returns the raw model text.
//! * [`generate_structured`]: schema mode, parses the text as a
//!   [`ResponseSchema`] record and fails hard on any mismatch.
//!
//! Both take `Option<&dyn GenerativeModel>`: `None` is the "not configured"
//! state and fails immediately without touching the network. Neither
//! retries.

use crate::config::ServiceConfig;
use crate::error::AnkonaError;
use crate::gemini::GeminiClient;
use crate::records::ResponseSchema;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Binary content sent inline with a prompt.
#[derive(Clone)]
pub struct Attachment {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl Attachment {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// A single model call. Built once, never mutated after it is sent.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model: String,
    pub prompt: String,
    pub attachment: Option<Attachment>,
    pub system_instruction: Option<String>,
    pub temperature: Option<f64>,
    /// When set, the model is asked for `application/json` conforming to it.
    pub response_schema: Option<Value>,
}

impl ModelRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            attachment: None,
            system_instruction: None,
            temperature: None,
            response_schema: None,
        }
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn temperature(mut self, t: f64) -> Self {
        self.temperature = Some(t);
        self
    }

    pub fn response_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// A generative model that answers one request with one text.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Send the request and return the concatenated response text.
    ///
    /// Transport and API failures are reported as
    /// [`AnkonaError::LlmApiError`].
    async fn generate(&self, request: &ModelRequest) -> Result<String, AnkonaError>;
}

/// Resolve the process-wide model client.
///
/// Called once at start-up. The result is shared by every endpoint:
///
/// 1. **Pre-built provider** (`config.provider`) is used as-is.
/// 2. **API key** (`config.api_key`) builds a [`GeminiClient`].
/// 3. Otherwise the service runs unconfigured and every model-backed
///    endpoint answers 503.
pub fn resolve_model(config: &ServiceConfig) -> Option<Arc<dyn GenerativeModel>> {
    if let Some(ref provider) = config.provider {
        info!("Using pre-configured model provider '{}'", provider.name());
        return Some(Arc::clone(provider));
    }

    match config.api_key.as_deref() {
        Some(key) => match GeminiClient::new(key, &config.api_base_url) {
            Ok(client) => {
                info!("Gemini client initialised ({})", config.api_base_url);
                Some(Arc::new(client))
            }
            Err(e) => {
                warn!("Gemini client failed to initialise: {e}");
                None
            }
        },
        None => {
            warn!("No Gemini API key found; set GEMINI_API_KEY. Model-backed endpoints will return 503.");
            None
        }
    }
}

/// Free-text mode: return the model's raw text.
pub async fn generate_text(
    model: Option<&dyn GenerativeModel>,
    request: &ModelRequest,
) -> Result<String, AnkonaError> {
    let model = model.ok_or_else(AnkonaError::not_configured)?;
    let start = Instant::now();
    let text = model.generate(request).await?;
    debug!(
        "{} / {}: {} chars in {:?}",
        model.name(),
        request.model,
        text.len(),
        start.elapsed()
    );
    Ok(text)
}

/// Schema mode: ask for `T`'s schema and parse the reply as `T`.
///
/// The schema is attached here, so callers cannot forget it. Any text that
/// is not valid JSON of the requested shape is a
/// [`AnkonaError::SchemaMismatch`]; nothing is salvaged from it.
pub async fn generate_structured<T: ResponseSchema>(
    model: Option<&dyn GenerativeModel>,
    request: ModelRequest,
) -> Result<T, AnkonaError> {
    let request = request.response_schema(T::response_schema());
    let text = generate_text(model, &request).await?;
    serde_json::from_str(text.trim()).map_err(|e| {
        warn!("{} response rejected: {e}", T::NAME);
        AnkonaError::SchemaMismatch {
            schema: T::NAME,
            detail: e.to_string(),
        }
    })
}
