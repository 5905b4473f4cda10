//! Configuration for the ankona service.
//!
//! Every knob lives in [`ServiceConfig`], built via its
//! [`ServiceConfigBuilder`]. The config is created once at start-up and
//! shared read-only behind an `Arc` by every request handler.

use crate::error::AnkonaError;
use crate::model::GenerativeModel;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default Gemini REST endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variables checked, in order, for the Gemini credential.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Configuration for the ankona service.
///
/// Built via [`ServiceConfig::builder()`] or using
/// [`ServiceConfig::default()`].
///
/// # Example
/// ```rust
/// use ankona::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .api_key("AIza...")
///     .output_dir("translated")
///     .persist_output(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ServiceConfig {
    /// Gemini API key. `None` leaves the service in the "not configured"
    /// state: every model-backed endpoint answers 503.
    pub api_key: Option<String>,

    /// Pre-constructed model client. Takes precedence over `api_key`.
    pub provider: Option<Arc<dyn GenerativeModel>>,

    /// Base URL of the Gemini REST API, without a trailing slash.
    pub api_base_url: String,

    /// Model used by the three schema-mode endpoints. Default: `gemini-2.0-flash`.
    pub structured_model: String,

    /// Model used for translation and refinement. Default: `gemini-2.5-flash`.
    pub document_model: String,

    /// Sampling temperature for schema-mode calls. Default: 0.01.
    ///
    /// The structured records must come out the same for the same input, so
    /// sampling variance is kept as close to zero as the API allows.
    pub structured_temperature: f64,

    /// Directory translated documents are written to. Default: `.`.
    pub output_dir: PathBuf,

    /// Write each translated document to `output_dir`. Default: true.
    ///
    /// Files are never cleaned up, so the directory grows with traffic.
    /// Turn this off to serve documents from memory only.
    pub persist_output: bool,

    /// DOCX whose structure is offered to the refinement call as a style
    /// template. Skipped silently when absent. Default: `style_reference.docx`.
    pub style_reference: PathBuf,

    /// Directory mounted at `/static`. Default: `static`.
    pub static_dir: PathBuf,

    /// Page served at `/`. Default: `static/ai_legal_converter.html`.
    pub landing_page: PathBuf,

    /// Largest accepted request body in bytes. Default: 20 MiB.
    ///
    /// Gemini rejects inline payloads above roughly 20 MB, so anything
    /// bigger would only fail later at the translate stage.
    pub max_upload_bytes: usize,

    /// Optional stage-level progress callback for case-file conversion.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            structured_model: "gemini-2.0-flash".to_string(),
            document_model: "gemini-2.5-flash".to_string(),
            structured_temperature: 0.01,
            output_dir: PathBuf::from("."),
            persist_output: true,
            style_reference: PathBuf::from("style_reference.docx"),
            static_dir: PathBuf::from("static"),
            landing_page: PathBuf::from("static/ai_legal_converter.html"),
            max_upload_bytes: 20 * 1024 * 1024,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .field("api_base_url", &self.api_base_url)
            .field("structured_model", &self.structured_model)
            .field("document_model", &self.document_model)
            .field("structured_temperature", &self.structured_temperature)
            .field("output_dir", &self.output_dir)
            .field("persist_output", &self.persist_output)
            .field("style_reference", &self.style_reference)
            .field("static_dir", &self.static_dir)
            .field("landing_page", &self.landing_page)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default configuration with the API key taken from the environment.
    pub fn from_env() -> Self {
        Self {
            api_key: api_key_from_env(),
            ..Self::default()
        }
    }
}

/// First non-empty value among [`API_KEY_ENV_VARS`].
pub fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.config.api_key = (!key.trim().is_empty()).then_some(key);
        self
    }

    pub fn provider(mut self, provider: Arc<dyn GenerativeModel>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn structured_model(mut self, model: impl Into<String>) -> Self {
        self.config.structured_model = model.into();
        self
    }

    pub fn document_model(mut self, model: impl Into<String>) -> Self {
        self.config.document_model = model.into();
        self
    }

    pub fn structured_temperature(mut self, t: f64) -> Self {
        self.config.structured_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn persist_output(mut self, v: bool) -> Self {
        self.config.persist_output = v;
        self
    }

    pub fn style_reference(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.style_reference = path.into();
        self
    }

    pub fn static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.static_dir = dir.into();
        self
    }

    pub fn landing_page(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.landing_page = path.into();
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, AnkonaError> {
        let c = &self.config;
        if c.api_base_url.is_empty() {
            return Err(AnkonaError::InvalidConfig(
                "API base URL must not be empty".into(),
            ));
        }
        if c.structured_model.trim().is_empty() || c.document_model.trim().is_empty() {
            return Err(AnkonaError::InvalidConfig(
                "Model identifiers must not be empty".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(AnkonaError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}
