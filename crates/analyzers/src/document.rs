//! Document text extraction followed by the text-scam scan.
//!
//! PDFs go through `pdf-extract`; anything else is treated as an image and
//! handed to the `tesseract` CLI when the probe found it at startup.

use std::io::{Read, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use pdf_extract::{Document, PlainTextOutput};
use serde_json::Value;
use tracing::{debug, warn};
use trustbot_core::config::AnalyzerConfig;
use trustbot_core::{PipelineResult, ReasonCode};

use crate::capability::Capability;
use crate::error::AnalyzerError;
use crate::scam_text;

pub const PIPELINE: &str = "document_ocr";

pub const UNAVAILABLE_PENALTY: f64 = 0.8;
pub const EMPTY_TEXT_PENALTY: f64 = 0.6;

const OCR_POLL: Duration = Duration::from_millis(20);

/// True when the mime type, file name or magic bytes say PDF.
pub fn is_pdf(bytes: &[u8], mime: &str, name: &str) -> bool {
    mime.contains("pdf") || name.ends_with(".pdf") || bytes.starts_with(b"%PDF")
}

fn pdf_error(e: impl std::fmt::Display) -> AnalyzerError {
    AnalyzerError::Extraction(e.to_string())
}

fn first_pages_text(bytes: &[u8], max_pages: usize) -> Result<String, AnalyzerError> {
    let doc = Document::load_mem(bytes).map_err(pdf_error)?;
    let mut pages = Vec::new();
    // Only the pages kept are rendered to text.
    for page_num in doc.get_pages().into_keys().take(max_pages.max(1)) {
        let mut text = String::new();
        {
            let mut output = PlainTextOutput::new(&mut text);
            pdf_extract::output_doc_page(&doc, &mut output, page_num).map_err(pdf_error)?;
        }
        pages.push(text.trim().to_string());
    }
    Ok(pages.join("\n").trim().to_string())
}

/// Text of the first `max_pages` pages, pages joined by newlines.
pub fn extract_pdf_text(bytes: &[u8], max_pages: usize) -> Result<String, AnalyzerError> {
    // pdf-extract panics on some malformed inputs.
    catch_unwind(AssertUnwindSafe(|| first_pages_text(bytes, max_pages)))
        .map_err(|_| AnalyzerError::Extraction("pdf parser panicked".into()))?
}

/// Drain a child pipe on its own thread so the child never blocks on a full pipe.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Run `cmd stdin stdout` with `input` on stdin. The child is killed once
/// `timeout` passes.
fn run_ocr(cmd: &str, input: &[u8], timeout: Duration) -> Result<String, AnalyzerError> {
    let mut child = Command::new(cmd)
        .args(["stdin", "stdout"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| AnalyzerError::Extraction("tesseract stdin not captured".into()))?;
    let input = input.to_vec();
    let writer = thread::spawn(move || stdin.write_all(&input));
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(AnalyzerError::Extraction(format!(
                "tesseract timed out after {}ms",
                timeout.as_millis()
            )));
        }
        thread::sleep(OCR_POLL);
    };

    // A child that exits without reading its input leaves a broken pipe; the exit status decides.
    let _ = writer.join();
    let stdout = stdout
        .join()
        .map_err(|_| AnalyzerError::Extraction("tesseract reader panicked".into()))?;
    let stderr = stderr.join().unwrap_or_default();

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr);
        return Err(AnalyzerError::Extraction(format!("tesseract failed: {}", stderr.trim())));
    }
    Ok(String::from_utf8_lossy(&stdout).trim().to_string())
}

pub struct DocumentAnalyzer {
    ocr: Capability,
    tesseract_cmd: String,
    ocr_timeout: Duration,
    pdf_max_pages: usize,
    max_text_chars: usize,
}

impl DocumentAnalyzer {
    /// Probes the OCR tool once; the result holds for the analyzer's lifetime.
    pub fn new(config: &AnalyzerConfig) -> Self {
        let ocr = Capability::probe_command(&config.tesseract_cmd);
        Self::with_capability(config, ocr)
    }

    pub fn with_capability(config: &AnalyzerConfig, ocr: Capability) -> Self {
        Self {
            ocr,
            tesseract_cmd: config.tesseract_cmd.clone(),
            ocr_timeout: Duration::from_secs(config.ocr_timeout_secs),
            pdf_max_pages: config.pdf_max_pages,
            max_text_chars: config.doc_max_text_chars,
        }
    }

    pub fn ocr_capability(&self) -> &Capability {
        &self.ocr
    }

    fn ocr_image(&self, bytes: &[u8]) -> Result<String, AnalyzerError> {
        if let Capability::Unavailable(reason) = &self.ocr {
            return Err(AnalyzerError::Unavailable(reason.clone()));
        }
        run_ocr(&self.tesseract_cmd, bytes, self.ocr_timeout)
    }

    /// Blocking: may parse a PDF or run the OCR subprocess.
    pub fn analyze(&self, bytes: Option<&[u8]>, mime: Option<&str>, name: Option<&str>) -> PipelineResult {
        let bytes = match bytes {
            Some(b) if !b.is_empty() => b,
            _ => return PipelineResult::missing(PIPELINE, "document"),
        };
        let mime = mime.unwrap_or_default().to_lowercase();
        let name = name.unwrap_or_default().to_lowercase();

        let (method, extracted) = if is_pdf(bytes, &mime, &name) {
            ("pdf_text", extract_pdf_text(bytes, self.pdf_max_pages))
        } else {
            ("ocr_image", self.ocr_image(bytes))
        };
        debug!("Document extraction via {}", method);

        let mut out = self.score_extraction(extracted);
        out.note("method", method);
        out.note("mime", mime);
        out.note("file_name", name);
        out
    }

    /// Turn an extraction outcome into the pipeline result.
    pub fn score_extraction(&self, extracted: Result<String, AnalyzerError>) -> PipelineResult {
        let text = match extracted {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("Document extraction unavailable: {}", e);
                let mut out = PipelineResult::degraded(
                    PIPELINE,
                    "doc_unavailable",
                    "Document OCR/text extraction is not available in this environment.",
                    ReasonCode::DocOcrUnavailable,
                    UNAVAILABLE_PENALTY,
                );
                out.reasons
                    .push("Install Tesseract or send the content as text.".to_string());
                out.note("error", e.to_string());
                return out;
            }
        };

        if text.is_empty() {
            let mut out = PipelineResult::degraded(
                PIPELINE,
                "doc_empty_text",
                "Could not extract readable text from the document.",
                ReasonCode::DocOcrUnavailable,
                EMPTY_TEXT_PENALTY,
            );
            out.note("extracted_chars", 0);
            return out;
        }

        let head: String = text.chars().take(self.max_text_chars).collect();
        let scan = scam_text::analyze_text(&head);

        let mut out = PipelineResult::new(PIPELINE);
        out.reason_codes.push(ReasonCode::DocTextExtracted);
        out.reasons.push("Extracted text analyzed:".to_string());
        out.signals.extend(scan.result.signals);
        out.reasons.extend(scan.result.reasons);
        out.reason_codes.extend(scan.result.reason_codes);
        out.raise_penalty(scan.result.quality_penalty);
        out.note("extracted_chars", text.chars().count());
        out.note(
            "urls",
            scan.result.debug.get("urls").cloned().unwrap_or(Value::Array(Vec::new())),
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> DocumentAnalyzer {
        DocumentAnalyzer::with_capability(
            &AnalyzerConfig::default(),
            Capability::Unavailable("not installed".into()),
        )
    }

    #[test]
    fn pdf_detection() {
        assert!(is_pdf(b"", "application/pdf", ""));
        assert!(is_pdf(b"", "", "statement.pdf"));
        assert!(is_pdf(b"%PDF-1.7\n", "", ""));
        assert!(!is_pdf(b"\x89PNG", "image/png", "shot.png"));
    }

    #[test]
    fn ocr_unavailable_degrades_with_resendable_penalty() {
        let r = analyzer().analyze(Some(&b"\x89PNG fake"[..]), Some("image/png"), Some("x.png"));
        assert_eq!(r.signals[0].name, "doc_unavailable");
        assert_eq!(r.signals[0].score, 0.5);
        assert_eq!(r.reason_codes, vec![ReasonCode::DocOcrUnavailable]);
        assert_eq!(r.quality_penalty, UNAVAILABLE_PENALTY);
        assert_eq!(r.reasons.len(), 2);
        assert_eq!(r.debug["method"], "ocr_image");
    }

    #[test]
    fn broken_pdf_degrades_instead_of_failing() {
        let r = analyzer().analyze(Some(&b"%PDF-1.4 truncated garbage"[..]), None, None);
        assert_eq!(r.debug["method"], "pdf_text");
        assert_eq!(r.reason_codes, vec![ReasonCode::DocOcrUnavailable]);
        assert!(r.quality_penalty >= EMPTY_TEXT_PENALTY);
    }

    #[test]
    fn extracted_text_runs_the_scam_scan() {
        let r = analyzer().score_extraction(Ok("Share the OTP now".into()));
        assert_eq!(
            r.reason_codes,
            vec![ReasonCode::DocTextExtracted, ReasonCode::ScamOtpRequest]
        );
        assert_eq!(r.reasons[0], "Extracted text analyzed:");
        assert_eq!(r.signals[0].name, "otp_request");
        assert_eq!(r.quality_penalty, 0.0);
        assert_eq!(r.name(), PIPELINE);
    }

    #[test]
    fn extracted_text_is_capped() {
        let long = format!("{} otp", "a".repeat(5000));
        let r = analyzer().score_extraction(Ok(long));
        // "otp" sits past the cap, so only the neutral signal remains.
        assert_eq!(r.signals[0].name, "no_strong_text_indicators");
        assert_eq!(r.debug["extracted_chars"], 5004);
    }

    #[test]
    fn empty_extraction_is_penalised() {
        let r = analyzer().score_extraction(Ok("  \n ".into()));
        assert_eq!(r.signals[0].name, "doc_empty_text");
        assert_eq!(r.quality_penalty, EMPTY_TEXT_PENALTY);
    }

    #[test]
    fn missing_document() {
        let r = analyzer().analyze(None, None, None);
        assert_eq!(r.signals[0].name, "missing_document");
        assert_eq!(r.quality_penalty, 1.0);
    }

    /// Minimal PDF: one Helvetica text line per page, xref offsets computed.
    fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                (0..pages.len())
                    .map(|i| format!("{} 0 R", 4 + 2 * i))
                    .collect::<Vec<_>>()
                    .join(" "),
                pages.len()
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];
        for (i, text) in pages.iter().enumerate() {
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                5 + 2 * i
            ));
            let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text);
            objects.push(format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                content.len(),
                content
            ));
        }

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, obj) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, obj).as_bytes());
        }
        let xref_at = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            xref.push_str(&format!("{:010} 00000 n \n", offset));
        }
        out.extend_from_slice(xref.as_bytes());
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_at
            )
            .as_bytes(),
        );
        out
    }

    #[test]
    fn pdf_text_stops_at_page_limit() {
        let pdf = pdf_with_pages(&["Page one", "Page two", "Page three"]);
        let text = extract_pdf_text(&pdf, 2).unwrap();
        let one = text.find("one").expect("first page text");
        let two = text.find("two").expect("second page text");
        assert!(one < two);
        assert!(!text.contains("three"));
    }

    #[test]
    fn pdf_text_runs_the_scam_scan() {
        let pdf = pdf_with_pages(&["Share the OTP now"]);
        let r = analyzer().analyze(Some(pdf.as_slice()), Some("application/pdf"), Some("Statement.PDF"));
        assert_eq!(r.debug["method"], "pdf_text");
        assert_eq!(r.debug["file_name"], "statement.pdf");
        assert_eq!(r.reason_codes[0], ReasonCode::DocTextExtracted);
        assert!(r.reason_codes.contains(&ReasonCode::ScamOtpRequest));
        assert_eq!(r.quality_penalty, 0.0);
    }

    #[cfg(unix)]
    mod ocr_process {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;

        /// Shell script standing in for the tesseract binary.
        fn fake_tesseract(dir: &Path, body: &str) -> String {
            let path = dir.join("tesseract");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path.to_string_lossy().into_owned()
        }

        fn ocr_analyzer(cmd: String) -> DocumentAnalyzer {
            let config = AnalyzerConfig {
                tesseract_cmd: cmd,
                ocr_timeout_secs: 1,
                ..AnalyzerConfig::default()
            };
            DocumentAnalyzer::with_capability(&config, Capability::Available)
        }

        #[test]
        fn hung_ocr_is_killed_and_degrades() {
            let dir = tempfile::tempdir().unwrap();
            let analyzer = ocr_analyzer(fake_tesseract(dir.path(), "exec sleep 30"));

            let started = Instant::now();
            let r = analyzer.analyze(Some(&b"\x89PNG scan"[..]), Some("image/png"), None);

            assert!(started.elapsed() < Duration::from_secs(5));
            assert_eq!(r.signals[0].name, "doc_unavailable");
            assert_eq!(r.quality_penalty, UNAVAILABLE_PENALTY);
            assert!(r.debug["error"].as_str().unwrap().contains("timed out"));
        }

        #[test]
        fn ocr_output_is_scanned() {
            let dir = tempfile::tempdir().unwrap();
            let analyzer = ocr_analyzer(fake_tesseract(
                dir.path(),
                "cat > /dev/null\necho 'Share the OTP now'",
            ));

            let r = analyzer.analyze(Some(&b"\x89PNG scan"[..]), Some("image/png"), None);

            assert_eq!(r.debug["method"], "ocr_image");
            assert_eq!(
                r.reason_codes,
                vec![ReasonCode::DocTextExtracted, ReasonCode::ScamOtpRequest]
            );
        }

        #[test]
        fn failing_ocr_reports_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let analyzer = ocr_analyzer(fake_tesseract(dir.path(), "echo 'bad image' >&2\nexit 3"));

            let r = analyzer.analyze(Some(&b"\x89PNG scan"[..]), Some("image/png"), None);

            assert_eq!(r.signals[0].name, "doc_unavailable");
            assert!(r.debug["error"].as_str().unwrap().contains("bad image"));
        }
    }
}
