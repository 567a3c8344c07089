//! Wire types shared between the State of Solana service and its clients.
//!
//! Everything here serialises with camelCase field names, matching what the
//! dashboard front-end consumes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Date, OffsetDateTime};

/// Serde adapter rendering [`Date`] as `YYYY-MM-DD`.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
    use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

    pub const FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let formatted = date
            .format(FORMAT)
            .map_err(<S::Error as serde::ser::Error>::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Date::parse(&raw, FORMAT).map_err(D::Error::custom)
    }
}

// ----- Charts -----

/// Where the rows behind a chart came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Fallback,
}

impl DataSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DataSource::Live => "live",
            DataSource::Fallback => "fallback",
        }
    }
}

/// Time bucket size of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrushRange {
    #[serde(with = "iso_date")]
    pub start: Date,
    #[serde(with = "iso_date")]
    pub end: Date,
}

/// One bucket of a dense matrix; `values` is aligned with [`ChartView::dimensions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    #[serde(with = "iso_date")]
    pub bucket: Date,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionColor {
    pub dimension: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartView {
    pub dataset: String,
    pub title: String,
    pub granularity: Granularity,
    pub source: DataSource,
    pub percent: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub brush: Option<BrushRange>,
    pub dimensions: Vec<String>,
    pub rows: Vec<ChartRow>,
    pub colors: Vec<DimensionColor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSummary {
    pub dataset: String,
    pub title: String,
    pub granularity: Granularity,
    pub percent_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub dataset: String,
    pub source: DataSource,
    pub records: usize,
    pub applied: bool,
}

// ----- Admin -----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadApiDataResponse {
    pub success: bool,
    #[serde(default)]
    pub has_data: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveApiDataResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

// ----- Blog -----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub status: BlogStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    Ordered,
    #[default]
    Unordered,
}

/// A typed block of blog content, discriminated on `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Paragraph {
        text: String,
    },
    Heading {
        level: u8,
        text: String,
    },
    Quote {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        attribution: Option<String>,
    },
    List {
        #[serde(default)]
        style: ListStyle,
        items: Vec<String>,
    },
    Image {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        alt: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        caption: Option<String>,
    },
    Divider,
    Chart {
        #[serde(rename = "chartId")]
        chart_id: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        title: Option<String>,
    },
}

impl ContentBlock {
    pub fn kind(&self) -> &'static str {
        match self {
            ContentBlock::Paragraph { .. } => "paragraph",
            ContentBlock::Heading { .. } => "heading",
            ContentBlock::Quote { .. } => "quote",
            ContentBlock::List { .. } => "list",
            ContentBlock::Image { .. } => "image",
            ContentBlock::Divider => "divider",
            ContentBlock::Chart { .. } => "chart",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDocument {
    pub blog_post: BlogPost,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogSaveResponse {
    pub success: bool,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListResponse {
    pub slugs: Vec<String>,
}
