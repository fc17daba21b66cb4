//! Core data models for content fetched from an Igloo community.
//!
//! Everything here is built fresh from a backend response and never mutated
//! afterwards; nothing outlives the request that produced it.

use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

/// Tags the kind of payload a source object carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Attachment,
    File,
    Image,
    Page,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Attachment => "attachment",
            ContentType::File => "file",
            ContentType::Image => "image",
            ContentType::Page => "page",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document attached to a page.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub name: String,
    pub content: Vec<u8>,
    pub content_type: ContentType,
}

impl Attachment {
    pub fn new(name: String, content: Vec<u8>) -> Self {
        Self {
            name,
            content,
            content_type: ContentType::Attachment,
        }
    }
}

/// An image referenced by a page.
#[derive(Debug, Clone)]
pub struct Image {
    pub name: String,
    pub content: Vec<u8>,
    pub mimetype: Option<String>,
    pub content_type: ContentType,
}

impl Image {
    pub fn new(name: String, content: Vec<u8>, mimetype: Option<String>) -> Self {
        Self {
            name,
            content,
            mimetype,
            content_type: ContentType::Image,
        }
    }
}

/// The canonical document entity: one page (or standalone file) of the
/// community, normalized from a raw object record.
///
/// `content` holds HTML text for regular pages (`content_type = Page`) and
/// opaque binary for anything with a non-`.html` extension
/// (`content_type = File`). The timestamp blocks and `statistics` are kept as
/// opaque JSON maps; the backend's shape for them is not part of this model.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub page_id: String,
    pub title: String,
    pub url_path: String,
    pub extension: String,
    pub is_published: bool,
    pub is_archived: bool,
    pub is_scheduled_for_archiving: bool,
    pub statistics: Map<String, Value>,
    pub created: Map<String, Value>,
    pub modified: Map<String, Value>,
    pub published: Map<String, Value>,
    pub content: Vec<u8>,
    pub content_type: ContentType,
    pub images: Vec<Image>,
    pub attachments: Vec<Attachment>,
}

impl Page {
    /// Number of embedded images. Computed, never stored.
    pub fn num_images(&self) -> usize {
        self.images.len()
    }

    /// Number of attached documents. Computed, never stored.
    pub fn num_attachments(&self) -> usize {
        self.attachments.len()
    }
}

/// A single hit returned by the search tool.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub keywords: Map<String, Value>,
    pub last_updated: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_page() -> Page {
        Page {
            url: Url::parse("https://intranet.example.com/x").unwrap(),
            page_id: "1".to_string(),
            title: "T".to_string(),
            url_path: "/x".to_string(),
            extension: ".html".to_string(),
            is_published: true,
            is_archived: false,
            is_scheduled_for_archiving: false,
            statistics: Map::new(),
            created: Map::new(),
            modified: Map::new(),
            published: Map::new(),
            content: Vec::new(),
            content_type: ContentType::Page,
            images: Vec::new(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn test_counts_match_empty_collections() {
        let page = empty_page();
        assert_eq!(page.num_images(), 0);
        assert_eq!(page.num_attachments(), 0);
    }

    #[test]
    fn test_counts_track_collections() {
        let mut page = empty_page();
        page.images.push(Image::new(
            "logo.png".to_string(),
            vec![0u8; 4],
            Some("image/png".to_string()),
        ));
        page.attachments
            .push(Attachment::new("budget.xlsx".to_string(), vec![1u8; 8]));
        page.attachments
            .push(Attachment::new("notes.docx".to_string(), vec![2u8; 8]));

        assert_eq!(page.num_images(), page.images.len());
        assert_eq!(page.num_attachments(), page.attachments.len());
        assert_eq!(page.num_attachments(), 2);
    }

    #[test]
    fn test_constructors_pin_content_type() {
        let attachment = Attachment::new("a.pdf".to_string(), Vec::new());
        assert_eq!(attachment.content_type, ContentType::Attachment);

        let image = Image::new("b.png".to_string(), Vec::new(), None);
        assert_eq!(image.content_type, ContentType::Image);
    }

    #[test]
    fn test_content_type_serializes_lowercase() {
        let json = serde_json::to_string(&ContentType::Page).unwrap();
        assert_eq!(json, "\"page\"");
        assert_eq!(ContentType::File.as_str(), "file");
    }
}
