//! Case-file conversion: scanned Bangla PDF → refined English DOCX.
//!
//! [`convert_case_file`] runs the five stages strictly in order. Only
//! validation and translation can fail the conversion; style sampling and
//! refinement degrade to a fallback value and the document is still
//! produced.

use crate::config::ServiceConfig;
use crate::error::AnkonaError;
use crate::model::GenerativeModel;
use crate::output::{ConversionStats, TranslatedDocument};
use crate::pipeline::{extract, input, llm, render};
use crate::pipeline::input::CaseFileUpload;
use crate::progress::ConversionStage;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Translate an uploaded case file into a DOCX.
///
/// # Errors
/// - [`AnkonaError::InvalidAttachment`] if the upload is not declared as PDF.
///   No model call is made.
/// - [`AnkonaError::ProviderNotConfigured`] if `model` is `None`. Neither
///   the style reference nor the model is touched.
/// - [`AnkonaError::LlmApiError`] if translation fails.
/// - [`AnkonaError::DocumentRenderFailed`] / [`AnkonaError::OutputWriteFailed`]
///   for local rendering or persistence failures.
pub async fn convert_case_file(
    model: Option<&dyn GenerativeModel>,
    upload: &CaseFileUpload,
    config: &ServiceConfig,
) -> Result<TranslatedDocument, AnkonaError> {
    let total_start = Instant::now();

    // ── Step 1: Validate ─────────────────────────────────────────────────
    input::validate_upload(upload)?;
    let model = model.ok_or_else(AnkonaError::not_configured)?;
    info!(
        "Converting case file '{}' ({} bytes)",
        upload.display_name(),
        upload.data.len()
    );

    let stage_start = |stage: ConversionStage| {
        if let Some(ref cb) = config.progress_callback {
            cb.on_stage_start(stage);
        }
        Instant::now()
    };
    let stage_done = |stage: ConversionStage, started: Instant| {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if let Some(ref cb) = config.progress_callback {
            cb.on_stage_complete(stage, elapsed_ms);
        }
        elapsed_ms
    };
    let stage_degraded = |stage: ConversionStage, reason: &str| {
        if let Some(ref cb) = config.progress_callback {
            cb.on_stage_degraded(stage, reason);
        }
    };

    // ── Step 2: Translate ────────────────────────────────────────────────
    let started = stage_start(ConversionStage::Translate);
    let draft = llm::translate_draft(Some(model), config, upload).await?;
    let translate_ms = stage_done(ConversionStage::Translate, started);

    // ── Step 3: Style sample ─────────────────────────────────────────────
    let started = stage_start(ConversionStage::StyleSample);
    let sample = load_style_sample(&config.style_reference).await;
    match sample {
        Some(_) => {
            stage_done(ConversionStage::StyleSample, started);
        }
        None => stage_degraded(ConversionStage::StyleSample, "no style reference"),
    }

    // ── Step 4: Refine ───────────────────────────────────────────────────
    let started = stage_start(ConversionStage::Refine);
    let refinement = llm::refine_draft(Some(model), config, &draft, sample.as_deref()).await;
    let refine_ms = if refinement.refined {
        stage_done(ConversionStage::Refine, started)
    } else {
        stage_degraded(ConversionStage::Refine, "using the unrefined draft");
        started.elapsed().as_millis() as u64
    };

    // ── Step 5: Render & persist ─────────────────────────────────────────
    let started = stage_start(ConversionStage::Render);
    let markdown = refinement.markdown;
    let docx = render_docx(markdown.clone()).await?;
    let render_ms = stage_done(ConversionStage::Render, started);

    let filename = upload.output_filename();
    let saved_to = if config.persist_output {
        let started = stage_start(ConversionStage::Persist);
        let path = config.output_dir.join(&filename);
        write_atomic(&path, &docx).await?;
        stage_done(ConversionStage::Persist, started);
        info!("Saved translated document to {}", path.display());
        Some(path)
    } else {
        None
    };

    let stats = ConversionStats {
        translate_ms,
        refine_ms,
        render_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Conversion complete: '{}' → '{}' ({} bytes, refined={}, {}ms total)",
        upload.display_name(),
        filename,
        docx.len(),
        refinement.refined,
        stats.total_ms
    );

    Ok(TranslatedDocument {
        filename,
        docx,
        markdown,
        refined: refinement.refined,
        style_sample_used: sample.is_some(),
        saved_to,
        stats,
    })
}

/// Read the style reference and extract its Markdown.
///
/// Missing file, read failure or an empty extraction all yield `None`.
pub async fn load_style_sample(path: &Path) -> Option<String> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No style reference at {}", path.display());
            return None;
        }
        Err(e) => {
            warn!("Could not read style reference {}: {e}", path.display());
            return None;
        }
    };

    let markup = match tokio::task::spawn_blocking(move || extract::extract_markup(&bytes)).await {
        Ok(markup) => markup,
        Err(e) => {
            warn!("Style reference extraction panicked: {e}");
            return None;
        }
    };

    if markup.trim().is_empty() {
        warn!(
            "Style reference {} yielded no text; refining without a sample",
            path.display()
        );
        return None;
    }
    debug!("Style sample: {} chars from {}", markup.len(), path.display());
    Some(markup)
}

/// Render on the blocking pool; docx-rs packing is CPU-bound zip work.
async fn render_docx(markdown: String) -> Result<Vec<u8>, AnkonaError> {
    tokio::task::spawn_blocking(move || render::markup_to_docx(&markdown))
        .await
        .map_err(|e| AnkonaError::Internal(format!("render task: {e}")))?
}

/// Write `bytes` to `path` via a uniquely named temp file in the same
/// directory, then rename it into place. Parent directories are created as
/// needed. Readers never observe a partial file, and concurrent writers to
/// the same path each persist a complete file (last rename wins).
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), AnkonaError> {
    let path = path.to_path_buf();
    let bytes = bytes.to_vec();
    tokio::task::spawn_blocking(move || write_atomic_blocking(&path, &bytes))
        .await
        .map_err(|e| AnkonaError::Internal(format!("write task: {e}")))?
}

fn write_atomic_blocking(path: &Path, bytes: &[u8]) -> Result<(), AnkonaError> {
    let write_err = |source| AnkonaError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelRequest;
    use crate::progress::ConversionProgressCallback;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Answers each call from a script, in order.
    struct Scripted {
        replies: Mutex<Vec<Result<String, String>>>,
        calls: Mutex<Vec<ModelRequest>>,
    }

    impl Scripted {
        fn new(replies: &[Result<&str, &str>]) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .iter()
                        .rev()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GenerativeModel for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: &ModelRequest) -> Result<String, AnkonaError> {
            self.calls.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err("script exhausted".into()))
                .map_err(|message| AnkonaError::LlmApiError { message })
        }
    }

    fn pdf(name: &str) -> CaseFileUpload {
        CaseFileUpload::new(
            Some(name.into()),
            Some("application/pdf".into()),
            b"%PDF-1.4".to_vec(),
        )
    }

    fn config_in(dir: &TempDir) -> ServiceConfig {
        ServiceConfig::builder()
            .output_dir(dir.path().join("out"))
            .style_reference(dir.path().join("style_reference.docx"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn full_conversion_persists_document() {
        let dir = TempDir::new().unwrap();
        let model = Scripted::new(&[Ok("# Draft"), Ok("# Final\n* Accused: Rahim")]);
        let doc = convert_case_file(Some(&model), &pdf("uploads/FIR-12.pdf"), &config_in(&dir))
            .await
            .unwrap();

        assert_eq!(doc.filename, "FIR-12_Translated.docx");
        assert_eq!(doc.markdown, "# Final\n* Accused: Rahim");
        assert!(doc.refined);
        assert!(!doc.style_sample_used);
        let saved = doc.saved_to.as_ref().unwrap();
        assert_eq!(saved, &dir.path().join("out").join("FIR-12_Translated.docx"));
        assert_eq!(std::fs::read(saved).unwrap(), doc.docx);
        assert_eq!(
            extract::extract_markup(&doc.docx),
            "# Final\n* Accused: Rahim"
        );
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn non_pdf_makes_no_model_calls() {
        let dir = TempDir::new().unwrap();
        let model = Scripted::new(&[]);
        let upload = CaseFileUpload::new(Some("a.png".into()), Some("image/png".into()), vec![0]);
        let err = convert_case_file(Some(&model), &upload, &config_in(&dir))
            .await
            .unwrap_err();
        assert!(matches!(err, AnkonaError::InvalidAttachment { .. }));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_model_is_not_configured() {
        let dir = TempDir::new().unwrap();
        let err = convert_case_file(None, &pdf("x.pdf"), &config_in(&dir))
            .await
            .unwrap_err();
        assert!(matches!(err, AnkonaError::ProviderNotConfigured { .. }));
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn translate_failure_aborts() {
        let dir = TempDir::new().unwrap();
        let model = Scripted::new(&[Err("HTTP 429: quota")]);
        let err = convert_case_file(Some(&model), &pdf("x.pdf"), &config_in(&dir))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota"));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn refine_failure_renders_draft() {
        let dir = TempDir::new().unwrap();
        let model = Scripted::new(&[Ok("# Draft Title\nBody line"), Err("HTTP 500")]);
        let doc = convert_case_file(Some(&model), &pdf("x.pdf"), &config_in(&dir))
            .await
            .unwrap();
        assert!(!doc.refined);
        assert_eq!(
            extract::extract_markup(&doc.docx),
            "# Draft Title\nBody line"
        );
    }

    #[tokio::test]
    async fn style_reference_is_offered_to_refine() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let reference = render::markup_to_docx("# COURT ORDER\n* Case No.").unwrap();
        std::fs::write(&config.style_reference, reference).unwrap();

        let model = Scripted::new(&[Ok("draft"), Ok("final")]);
        let doc = convert_case_file(Some(&model), &pdf("x.pdf"), &config)
            .await
            .unwrap();
        assert!(doc.style_sample_used);

        let calls = model.calls.lock().unwrap();
        assert!(calls[1].prompt.contains("# COURT ORDER\n* Case No."));
        assert!(!calls[0].prompt.contains("COURT ORDER"));
    }

    #[tokio::test]
    async fn unreadable_style_reference_is_skipped() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        std::fs::write(&config.style_reference, b"not a docx").unwrap();
        assert_eq!(load_style_sample(&config.style_reference).await, None);
        assert_eq!(load_style_sample(&dir.path().join("missing.docx")).await, None);
    }

    #[tokio::test]
    async fn persistence_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let config = ServiceConfig::builder()
            .output_dir(dir.path().join("out"))
            .style_reference(dir.path().join("none.docx"))
            .persist_output(false)
            .build()
            .unwrap();
        let model = Scripted::new(&[Ok("a"), Ok("b")]);
        let doc = convert_case_file(Some(&model), &pdf("x.pdf"), &config)
            .await
            .unwrap();
        assert!(doc.saved_to.is_none());
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn progress_events_follow_stages() {
        #[derive(Default)]
        struct Recorder(Mutex<Vec<String>>);
        impl ConversionProgressCallback for Recorder {
            fn on_stage_complete(&self, stage: ConversionStage, _ms: u64) {
                self.0.lock().unwrap().push(format!("{stage:?}"));
            }
            fn on_stage_degraded(&self, stage: ConversionStage, _reason: &str) {
                self.0.lock().unwrap().push(format!("{stage:?}!"));
            }
        }

        let dir = TempDir::new().unwrap();
        let recorder = Arc::new(Recorder::default());
        let config = ServiceConfig::builder()
            .output_dir(dir.path())
            .style_reference(dir.path().join("none.docx"))
            .progress_callback(recorder.clone())
            .build()
            .unwrap();
        let model = Scripted::new(&[Ok("a"), Err("boom")]);
        convert_case_file(Some(&model), &pdf("x.pdf"), &config)
            .await
            .unwrap();
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec!["Translate", "StyleSample!", "Refine!", "Render", "Persist"]
        );
    }

    #[tokio::test]
    async fn atomic_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("a_Translated.docx");
        write_atomic(&path, b"PK").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"PK");
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("a_Translated.docx")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_to_same_path_all_succeed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("case_Translated.docx");

        for round in 0..20u8 {
            let writers: Vec<_> = (0..8u8)
                .map(|i| {
                    let path = path.clone();
                    tokio::spawn(async move { write_atomic(&path, &[round, i, i, i]).await })
                })
                .collect();
            for writer in writers {
                writer.await.unwrap().unwrap();
            }

            let written = std::fs::read(&path).unwrap();
            assert_eq!(written.len(), 4);
            assert_eq!(written[0], round);
            assert!(written[1..].iter().all(|b| *b == written[1]), "torn write");
        }

        let leftovers = std::fs::read_dir(dir.path().join("out")).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
