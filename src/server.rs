//! HTTP surface: axum router, handlers and error responses.
//!
//! | Route                           | Body                      | Reply                 |
//! |---------------------------------|---------------------------|-----------------------|
//! | `GET /`                         |                           | landing page HTML     |
//! | `GET /static/*`                 |                           | static files          |
//! | `POST /parse-natural-khata-entry/` | `input`                | `BookkeepingEntry`    |
//! | `POST /select-khata-customer/`  | `input`, `customer_list`  | `CustomerSelection`   |
//! | `POST /information-desk/`       | `input`                   | `InfoDeskReply`       |
//! | `POST /convert-case-file/`      | multipart `file` (PDF)    | DOCX download         |
//!
//! Form bodies may be urlencoded or multipart. Every error is answered as
//! JSON `{"detail": "<message>"}` with the status from
//! [`AnkonaError::status_code`].

use crate::assistant;
use crate::config::ServiceConfig;
use crate::convert;
use crate::error::AnkonaError;
use crate::model::{resolve_model, GenerativeModel};
use crate::pipeline::input::CaseFileUpload;
use crate::records::{BookkeepingEntry, CustomerSelection, InfoDeskReply};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no credential was configured.
    pub model: Option<Arc<dyn GenerativeModel>>,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    /// Resolve the model client once and wrap the config for sharing.
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            model: resolve_model(&config),
            config: Arc::new(config),
        }
    }

    fn model(&self) -> Option<&dyn GenerativeModel> {
        self.model.as_deref()
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(landing_page))
        .route("/parse-natural-khata-entry/", post(parse_khata_entry))
        .route("/select-khata-customer/", post(select_khata_customer))
        .route("/information-desk/", post(information_desk))
        .route("/convert-case-file/", post(convert_case_file))
        .nest_service("/static", static_files)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), AnkonaError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AnkonaError::Internal(format!("bind {addr}: {e}")))?;
    info!(
        "Listening on http://{}",
        listener.local_addr().unwrap_or(addr)
    );
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AnkonaError::Internal(format!("server: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not install Ctrl-C handler: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

// ── Errors ───────────────────────────────────────────────────────────────

impl AnkonaError {
    /// HTTP status reported for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnkonaError::InvalidAttachment { .. } => StatusCode::BAD_REQUEST,
            AnkonaError::InvalidForm { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AnkonaError::ProviderNotConfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AnkonaError::LandingPageMissing { .. } => StatusCode::NOT_FOUND,
            AnkonaError::LlmApiError { .. }
            | AnkonaError::SchemaMismatch { .. }
            | AnkonaError::DocumentRenderFailed { .. }
            | AnkonaError::OutputWriteFailed { .. }
            | AnkonaError::InvalidConfig(_)
            | AnkonaError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AnkonaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{status}: {self}");
        } else {
            debug!("{status}: {self}");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

// ── Form extraction ──────────────────────────────────────────────────────

/// Form fields decoded from either an urlencoded or a multipart body.
///
/// A missing or undecodable field is an [`AnkonaError::InvalidForm`].
pub struct FormFields<T>(pub T);

impl<T, S> FromRequest<S> for FormFields<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AnkonaError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.trim_start().starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| invalid_form(e.body_text()))?;
            return Ok(FormFields(fields));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| invalid_form(e.body_text()))?;
        let mut fields = Map::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| invalid_form(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let text = field.text().await.map_err(|e| invalid_form(e.body_text()))?;
            fields.insert(name, Value::String(text));
        }
        serde_json::from_value(Value::Object(fields))
            .map(FormFields)
            .map_err(|e| invalid_form(e.to_string()))
    }
}

fn invalid_form(detail: String) -> AnkonaError {
    AnkonaError::InvalidForm { detail }
}

#[derive(Debug, Deserialize)]
struct InputForm {
    input: String,
}

#[derive(Debug, Deserialize)]
struct CustomerForm {
    input: String,
    customer_list: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn landing_page(State(state): State<AppState>) -> Result<Html<String>, AnkonaError> {
    let path = &state.config.landing_page;
    tokio::fs::read_to_string(path)
        .await
        .map(Html)
        .map_err(|e| {
            warn!("Landing page {} unavailable: {e}", path.display());
            AnkonaError::LandingPageMissing { path: path.clone() }
        })
}

async fn parse_khata_entry(
    State(state): State<AppState>,
    FormFields(form): FormFields<InputForm>,
) -> Result<Json<BookkeepingEntry>, AnkonaError> {
    assistant::parse_khata_entry(state.model(), &state.config, &form.input)
        .await
        .map(Json)
}

async fn select_khata_customer(
    State(state): State<AppState>,
    FormFields(form): FormFields<CustomerForm>,
) -> Result<Json<CustomerSelection>, AnkonaError> {
    assistant::select_khata_customer(state.model(), &state.config, &form.input, &form.customer_list)
        .await
        .map(Json)
}

async fn information_desk(
    State(state): State<AppState>,
    FormFields(form): FormFields<InputForm>,
) -> Result<Json<InfoDeskReply>, AnkonaError> {
    assistant::information_desk(state.model(), &state.config, &form.input)
        .await
        .map(Json)
}

async fn convert_case_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AnkonaError> {
    let multipart = multipart.map_err(|e| invalid_form(e.body_text()))?;
    let upload = read_upload(multipart).await?;
    let doc = convert::convert_case_file(state.model(), &upload, &state.config).await?;

    let headers = [
        (CONTENT_TYPE, HeaderValue::from_static(doc.media_type())),
        (CONTENT_DISPOSITION, content_disposition(&doc.filename)),
    ];
    Ok((headers, doc.docx).into_response())
}

/// Pull the `file` field out of a multipart body. Other fields are ignored.
async fn read_upload(mut multipart: Multipart) -> Result<CaseFileUpload, AnkonaError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| invalid_form(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|e| invalid_form(e.body_text()))?;
        return Ok(CaseFileUpload::new(filename, content_type, data.to_vec()));
    }
    Err(invalid_form("missing field `file`".into()))
}

/// RFC 5987 `attr-char`: everything else in `filename*` is percent-encoded.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// `attachment` disposition with an ASCII fallback and a UTF-8 `filename*`.
fn content_disposition(filename: &str) -> HeaderValue {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            ' ' => ' ',
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    let encoded = utf8_percent_encode(filename, ATTR_CHAR);
    HeaderValue::from_str(&format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}"
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (
                AnkonaError::InvalidAttachment { content_type: None },
                StatusCode::BAD_REQUEST,
            ),
            (invalid_form("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AnkonaError::not_configured(), StatusCode::SERVICE_UNAVAILABLE),
            (
                AnkonaError::LlmApiError {
                    message: "x".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AnkonaError::SchemaMismatch {
                    schema: "InfoDeskReply",
                    detail: "x".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AnkonaError::LandingPageMissing {
                    path: "static/x.html".into(),
                },
                StatusCode::NOT_FOUND,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }

    #[test]
    fn disposition_ascii_name() {
        let v = content_disposition("FIR_12_Translated.docx");
        assert_eq!(
            v.to_str().unwrap(),
            "attachment; filename=\"FIR_12_Translated.docx\"; filename*=UTF-8''FIR_12_Translated.docx"
        );
    }

    #[test]
    fn disposition_non_ascii_name() {
        let v = content_disposition("মামলা \"1\"_Translated.docx");
        let s = v.to_str().unwrap();
        assert!(s.starts_with("attachment; filename=\"_____ _1__Translated.docx\""), "{s}");
        assert!(s.contains("filename*=UTF-8''%E0%A6%AE"), "{s}");
        assert!(s.contains("%20%221%22_Translated.docx"), "{s}");
    }
}
