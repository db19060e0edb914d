//! Build the `POST /v1/analyze` body from command-line input.

use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Map, Value};

use crate::cli::CliArgs;

/// Best-effort MIME type from the file extension.
pub fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn encode_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(STANDARD.encode(bytes))
}

pub fn request_body(args: &CliArgs) -> Result<Value> {
    let mut body = Map::new();

    if let Some(text) = &args.text {
        body.insert("content_type".into(), json!("text"));
        body.insert("text".into(), json!(text));
    } else if let Some(url) = &args.url {
        body.insert("content_type".into(), json!("link"));
        body.insert("url".into(), json!(url));
    } else if let Some(path) = &args.image {
        body.insert("content_type".into(), json!("image"));
        body.insert("image_b64".into(), json!(encode_file(path)?));
    } else if let Some(path) = &args.file {
        body.insert("content_type".into(), json!("document"));
        body.insert("file_b64".into(), json!(encode_file(path)?));
        if let Some(mime) = guess_mime(path) {
            body.insert("file_mime".into(), json!(mime));
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            body.insert("file_name".into(), json!(name));
        }
    }

    if let Some(locale) = &args.locale {
        body.insert("locale".into(), json!(locale));
    }

    Ok(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn args(argv: &[&str]) -> CliArgs {
        let mut full = vec!["trustbot-cli"];
        full.extend_from_slice(argv);
        CliArgs::try_parse_from(full).unwrap()
    }

    #[test]
    fn text_body() {
        let body = request_body(&args(&["--text", "share your OTP", "--locale", "hi_IN"])).unwrap();
        assert_eq!(
            body,
            json!({ "content_type": "text", "text": "share your OTP", "locale": "hi_IN" })
        );
    }

    #[test]
    fn document_body_carries_name_and_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Invoice.PDF");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"abc").unwrap();

        let body = request_body(&args(&["--file", path.to_str().unwrap()])).unwrap();
        assert_eq!(body["content_type"], "document");
        assert_eq!(body["file_b64"], "YWJj");
        assert_eq!(body["file_mime"], "application/pdf");
        assert_eq!(body["file_name"], "Invoice.PDF");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(request_body(&args(&["--image", "/definitely/not/here.png"])).is_err());
    }

    #[test]
    fn unknown_extension_has_no_mime() {
        assert_eq!(guess_mime(Path::new("notes.txt")), None);
        assert_eq!(guess_mime(Path::new("scan.JPEG")), Some("image/jpeg"));
    }
}
