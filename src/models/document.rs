use serde::{Deserialize, Serialize};

/// The two source kinds the extraction capability accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Image,
    Pdf,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "pdf",
        }
    }

    /// Classify a declared media type.
    ///
    /// `image/<subtype>` is an image, `application/pdf` is a PDF, anything
    /// else is unsupported. Parameters (`; charset=...`) and case are ignored.
    pub fn classify(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match essence.split_once('/') {
            Some(("image", subtype)) if !subtype.is_empty() => Some(Self::Image),
            Some(("application", "pdf")) => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// A document whose media type has been classified as supported.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    bytes: Vec<u8>,
    media_type: String,
    kind: SourceKind,
    name: Option<String>,
}

impl SourceDocument {
    /// Returns `None` when the media type is neither an image nor a PDF.
    pub fn classify(bytes: Vec<u8>, media_type: &str) -> Option<Self> {
        let kind = SourceKind::classify(media_type)?;
        Some(Self {
            bytes,
            media_type: media_type.trim().to_ascii_lowercase(),
            kind,
            name: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
