//! Input: the uploaded case file and what we derive from it before any
//! model call.
//!
//! Validation looks at the declared media type only. The bytes are handed
//! to the model as-is, so a mislabelled file is the model's problem, not a
//! parse failure here.

use crate::error::AnkonaError;
use crate::model::Attachment;
use std::path::Path;
use tracing::debug;

/// Media type every case file must be declared as.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Suffix appended to the upload's stem to name the output document.
pub const OUTPUT_SUFFIX: &str = "_Translated.docx";

/// Stem used when the upload carries no usable filename.
const FALLBACK_STEM: &str = "document";

/// One uploaded case file.
#[derive(Clone)]
pub struct CaseFileUpload {
    /// Client-supplied filename, if any. Never trusted as a path.
    pub filename: Option<String>,
    /// Declared media type, if any.
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for CaseFileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseFileUpload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

impl CaseFileUpload {
    pub fn new(
        filename: Option<String>,
        content_type: Option<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename,
            content_type,
            data: data.into(),
        }
    }

    /// Build an upload from a local file path, declared as PDF when the
    /// extension says so.
    pub fn from_path(path: &Path, data: Vec<u8>) -> Self {
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        Self {
            filename: path.file_name().map(|n| n.to_string_lossy().into_owned()),
            content_type: is_pdf.then(|| PDF_MEDIA_TYPE.to_string()),
            data,
        }
    }

    /// Name used in the translation prompt.
    pub fn display_name(&self) -> &str {
        self.filename.as_deref().unwrap_or("document.pdf")
    }

    /// The upload as an inline model attachment.
    pub fn attachment(&self) -> Attachment {
        Attachment::new(self.data.clone(), PDF_MEDIA_TYPE)
    }

    /// The filename the translated document is delivered and saved under.
    pub fn output_filename(&self) -> String {
        output_filename(self.filename.as_deref())
    }
}

/// Reject anything not declared as `application/pdf`.
///
/// Media type parameters (`; name=...`) and letter case are ignored.
pub fn validate_upload(upload: &CaseFileUpload) -> Result<(), AnkonaError> {
    let essence = upload
        .content_type
        .as_deref()
        .and_then(|ct| ct.split(';').next())
        .map(str::trim);

    match essence {
        Some(ct) if ct.eq_ignore_ascii_case(PDF_MEDIA_TYPE) => {
            debug!(
                "Accepted upload '{}' ({} bytes)",
                upload.display_name(),
                upload.data.len()
            );
            Ok(())
        }
        _ => Err(AnkonaError::InvalidAttachment {
            content_type: upload.content_type.clone(),
        }),
    }
}

/// `<stem>_Translated.docx` for a client-supplied filename.
///
/// Directory components are dropped, so `../../etc/x.pdf` yields
/// `x_Translated.docx`. Backslash separators count too.
pub fn output_filename(original: Option<&str>) -> String {
    let stem = original
        .map(|name| name.rsplit(['/', '\\']).next().unwrap_or(name))
        .map(|base| {
            Path::new(base)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "." && s != "..")
        .unwrap_or_else(|| FALLBACK_STEM.to_string());
    format!("{stem}{OUTPUT_SUFFIX}")
}
