use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Declared type of the forwarded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Link,
    Image,
    Document,
    /// Anything else the caller declared. Not an error.
    #[serde(other)]
    Unsupported,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Link => "link",
            ContentType::Image => "image",
            ContentType::Document => "document",
            ContentType::Unsupported => "unsupported",
        }
    }

    /// Media types whose evidence can be improved by resending the original file.
    pub fn is_media(&self) -> bool {
        matches!(self, ContentType::Image | ContentType::Document)
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_locale() -> String {
    "en_IN".to_string()
}

/// Dispatch input. Media arrives already decoded to raw bytes; the HTTP
/// layer owns the base64 wire form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub content_type: ContentType,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, skip_serializing)]
    pub image_bytes: Option<Vec<u8>>,
    #[serde(default, skip_serializing)]
    pub file_bytes: Option<Vec<u8>>,
    #[serde(default)]
    pub file_mime: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl AnalyzeRequest {
    fn of(content_type: ContentType) -> Self {
        Self {
            content_type,
            text: None,
            url: None,
            image_bytes: None,
            file_bytes: None,
            file_mime: None,
            file_name: None,
            locale: default_locale(),
            user_id: None,
            metadata: HashMap::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        let mut req = Self::of(ContentType::Text);
        req.text = Some(text.into());
        req
    }

    pub fn link(url: impl Into<String>) -> Self {
        let mut req = Self::of(ContentType::Link);
        req.url = Some(url.into());
        req
    }

    pub fn image(bytes: Vec<u8>) -> Self {
        let mut req = Self::of(ContentType::Image);
        req.image_bytes = Some(bytes);
        req
    }

    pub fn document(bytes: Vec<u8>, mime: Option<String>, name: Option<String>) -> Self {
        let mut req = Self::of(ContentType::Document);
        req.file_bytes = Some(bytes);
        req.file_mime = mime;
        req.file_name = name;
        req
    }

    /// A request with only the content type set (all inputs absent).
    pub fn empty(content_type: ContentType) -> Self {
        Self::of(content_type)
    }

    /// The media bytes relevant for this content type, if any.
    pub fn media_bytes(&self) -> Option<&[u8]> {
        match self.content_type {
            ContentType::Image => self.image_bytes.as_deref(),
            ContentType::Document => self.file_bytes.as_deref(),
            _ => None,
        }
    }
}
