//! Block document schema
//!
//! Mirrors the shape of the documentation workspace's page blocks closely
//! enough to be translated one-to-one by a publishing client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Default,
    Gray,
    Blue,
    Orange,
}

impl Color {
    fn is_default(&self) -> bool {
        *self == Self::Default
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub code: bool,
    #[serde(default, skip_serializing_if = "Color::is_default")]
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichText {
    Text {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        link: Option<String>,
        #[serde(default)]
        annotations: Annotations,
    },
    DateMention {
        start: DateTime<Utc>,
    },
}

impl RichText {
    pub fn plain(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            link: None,
            annotations: Annotations::default(),
        }
    }

    pub fn code(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            link: None,
            annotations: Annotations {
                code: true,
                ..Annotations::default()
            },
        }
    }

    pub fn bold(content: impl Into<String>, color: Color) -> Self {
        Self::Text {
            content: content.into(),
            link: None,
            annotations: Annotations {
                bold: true,
                color,
                ..Annotations::default()
            },
        }
    }

    pub fn link(content: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            link: Some(url.into()),
            annotations: Annotations::default(),
        }
    }

    /// Plain text of this span, dates rendered as RFC 3339
    pub fn text(&self) -> String {
        match self {
            Self::Text { content, .. } => content.clone(),
            Self::DateMention { start } => start.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading1 { rich_text: Vec<RichText> },
    Paragraph { rich_text: Vec<RichText> },
    Embed { url: String },
    BulletedListItem { rich_text: Vec<RichText> },
}

impl Block {
    pub fn heading(title: &str) -> Self {
        Self::Heading1 {
            rich_text: vec![RichText::plain(title)],
        }
    }

    /// Concatenated text of the block, the URL for embeds
    pub fn text(&self) -> String {
        match self {
            Self::Heading1 { rich_text }
            | Self::Paragraph { rich_text }
            | Self::BulletedListItem { rich_text } => {
                rich_text.iter().map(RichText::text).collect()
            }
            Self::Embed { url } => url.clone(),
        }
    }
}
