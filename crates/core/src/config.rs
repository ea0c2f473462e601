use serde::{Deserialize, Serialize};

/// Language used when prompting the OCR/captioning/tree-correction models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Thai (default)
    Th,
    /// English
    En,
}

impl Default for Language {
    fn default() -> Self {
        Self::Th
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Th => write!(f, "th"),
            Self::En => write!(f, "en"),
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "th" => Ok(Self::Th),
            "en" => Ok(Self::En),
            other => Err(format!("unknown language: {other}. Use: th | en")),
        }
    }
}

/// Configuration for the ingestion pipeline (§6 of the specification).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// DPI used to rasterize PDF pages (default: 150).
    pub page_dpi: u32,

    /// Minimum embedded-image area in px^2 to keep the asset (default: 500).
    #[serde(default = "default_min_image_area")]
    pub min_image_area: u32,

    /// Minimum accepted embedded-image width (default: 100).
    #[serde(default = "default_min_dim")]
    pub min_width: u32,
    /// Minimum accepted embedded-image height (default: 100).
    #[serde(default = "default_min_dim")]
    pub min_height: u32,
    /// Maximum accepted embedded-image width (default: 5000).
    #[serde(default = "default_max_dim")]
    pub max_width: u32,
    /// Maximum accepted embedded-image height (default: 5000).
    #[serde(default = "default_max_dim")]
    pub max_height: u32,

    /// Target chunk size, in characters, for the contextual text splitter (default: 1000).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Overlap, in characters, between consecutive chunks (default: 200).
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Number of Document contents embedded per Gateway call (default: 128).
    #[serde(default = "default_embedding_batch")]
    pub embedding_batch: usize,

    /// Document language for OCR/caption/tree-correction prompts.
    #[serde(default)]
    pub language: Language,

    /// Enable low-value page advisory detection (TOC/boilerplate/blank).
    #[serde(default = "default_true")]
    pub detect_trash: bool,
}

fn default_min_image_area() -> u32 {
    500
}
fn default_min_dim() -> u32 {
    100
}
fn default_max_dim() -> u32 {
    5000
}
fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_embedding_batch() -> usize {
    128
}
fn default_true() -> bool {
    true
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            page_dpi: 150,
            min_image_area: default_min_image_area(),
            min_width: default_min_dim(),
            min_height: default_min_dim(),
            max_width: default_max_dim(),
            max_height: default_max_dim(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            embedding_batch: default_embedding_batch(),
            language: Language::default(),
            detect_trash: default_true(),
        }
    }
}

impl IngestConfig {
    /// Whether an embedded image of the given dimensions passes the acceptance window.
    pub fn image_size_ok(&self, width: u32, height: u32) -> bool {
        let area_ok = (width as u64) * (height as u64) >= self.min_image_area as u64;
        area_ok
            && width >= self.min_width
            && width <= self.max_width
            && height >= self.min_height
            && height <= self.max_height
    }
}
