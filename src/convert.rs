//! Normalization of raw backend records into [`Page`]s, plus the Markdown
//! conversion boundary.
//!
//! Records arrive as loose JSON from the community API. Required keys are
//! validated up front and missing or mistyped ones surface as
//! [`SourceError::MissingField`]; nothing is recovered partially. Content
//! resolution depends on the record's `fileExtension`: HTML pages carry
//! their body inline, anything else is fetched as a stored document binary.

use serde_json::{Map, Value};

use crate::client::ContentFetcher;
use crate::error::SourceError;
use crate::html;
use crate::models::{Attachment, ContentType, Page};

/// Extension assumed when a record carries none; the only one the Markdown
/// converter accepts.
pub const HTML_EXTENSION: &str = ".html";

/// Build a [`Page`] from a raw object record.
pub async fn page_from_object(
    fetcher: &dyn ContentFetcher,
    record: &Value,
) -> Result<Page, SourceError> {
    let page_id = required_str(record, "id")?;
    let title = required_str(record, "title")?;
    let href = required_str(record, "href")?;
    // Field casing follows the community API: `isPublished`, but `IsArchived`.
    let is_published = required_bool(record, "isPublished")?;
    let is_archived = required_bool(record, "IsArchived")?;
    let is_scheduled_for_archiving = required_bool(record, "IsScheduledForArchiving")?;

    let extension = record
        .get("fileExtension")
        .and_then(Value::as_str)
        .unwrap_or(HTML_EXTENSION)
        .to_string();

    let (mut content, content_type) = if extension != HTML_EXTENSION {
        (
            fetcher.get_document_binary(page_id).await?,
            ContentType::File,
        )
    } else {
        let inline = record.get("content").and_then(Value::as_str).unwrap_or("");
        (inline.as_bytes().to_vec(), ContentType::Page)
    };

    // Widget fallback: pages built from widgets keep their HTML in the
    // rendered page rather than the object record. One fetch attempt; if it
    // yields nothing the page legitimately stays empty.
    if content.is_empty() {
        if let Some(widget_html) = fetcher.get_widget_html_by_path(href).await? {
            content = widget_html;
        }
    }

    let url = fetcher.endpoint().join(href).map_err(|e| {
        SourceError::BackendError(format!("record href {:?} does not resolve: {}", href, e))
    })?;

    Ok(Page {
        url,
        page_id: page_id.to_string(),
        title: title.to_string(),
        url_path: href.to_string(),
        extension,
        is_published,
        is_archived,
        is_scheduled_for_archiving,
        statistics: map_field(record, "statistics"),
        created: map_field(record, "created"),
        modified: map_field(record, "modified"),
        published: map_field(record, "published"),
        content,
        content_type,
        images: Vec::new(),
        attachments: Vec::new(),
    })
}

/// Render a page's content as Markdown.
///
/// Only `.html` pages are convertible; any other extension fails with
/// [`SourceError::UnsupportedFormat`] without looking at the bytes.
pub fn page_to_markdown(page: &Page) -> Result<String, SourceError> {
    if page.extension != HTML_EXTENSION {
        return Err(SourceError::UnsupportedFormat(page.extension.clone()));
    }
    let content = String::from_utf8_lossy(&page.content);
    Ok(html::html_to_markdown(&content))
}

/// Resolve an object's attachment listing into [`Attachment`]s.
///
/// Each listing item points at a stored document via `ToId`; its metadata
/// supplies the name and a second fetch supplies the bytes.
pub async fn attachments_for_page(
    fetcher: &dyn ContentFetcher,
    object_id: &str,
) -> Result<Vec<Attachment>, SourceError> {
    let listing = fetcher.attachments_view(object_id).await?;
    let items = listing
        .get("items")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut attachments = Vec::with_capacity(items.len());
    for item in &items {
        let document_id = required_str(item, "ToId")?;
        let metadata = fetcher.get_object(document_id).await?;
        let name = required_str(&metadata, "title")?.to_string();
        let content = fetcher.get_document_binary(document_id).await?;
        attachments.push(Attachment::new(name, content));
    }
    Ok(attachments)
}

pub(crate) fn required_str<'a>(record: &'a Value, key: &str) -> Result<&'a str, SourceError> {
    record
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| SourceError::MissingField(key.to_string()))
}

fn required_bool(record: &Value, key: &str) -> Result<bool, SourceError> {
    record
        .get(key)
        .and_then(Value::as_bool)
        .ok_or_else(|| SourceError::MissingField(key.to_string()))
}

pub(crate) fn map_field(record: &Value, key: &str) -> Map<String, Value> {
    record
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use url::Url;

    struct StubFetcher {
        endpoint: Url,
        binary: Option<Vec<u8>>,
        widget_html: Option<Vec<u8>>,
        listing: Value,
        objects: Value,
    }

    impl StubFetcher {
        fn new() -> Self {
            Self {
                endpoint: Url::parse("https://intranet.example.com").unwrap(),
                binary: None,
                widget_html: None,
                listing: json!({ "items": [] }),
                objects: json!({}),
            }
        }
    }

    #[async_trait]
    impl ContentFetcher for StubFetcher {
        fn endpoint(&self) -> &Url {
            &self.endpoint
        }

        async fn get_object(&self, object_id: &str) -> Result<Value, SourceError> {
            self.objects
                .get(object_id)
                .cloned()
                .ok_or_else(|| SourceError::NotFound(format!("object {}", object_id)))
        }

        async fn get_document_binary(&self, document_id: &str) -> Result<Vec<u8>, SourceError> {
            self.binary
                .clone()
                .ok_or_else(|| SourceError::NotFound(format!("document {}", document_id)))
        }

        async fn get_widget_html_by_path(
            &self,
            _path: &str,
        ) -> Result<Option<Vec<u8>>, SourceError> {
            Ok(self.widget_html.clone())
        }

        async fn attachments_view(&self, _object_id: &str) -> Result<Value, SourceError> {
            Ok(self.listing.clone())
        }
    }

    fn page_record() -> Value {
        json!({
            "id": "306",
            "title": "Engineering Handbook",
            "href": "/engineering/handbook",
            "isPublished": true,
            "IsArchived": false,
            "IsScheduledForArchiving": false,
            "statistics": { "views": 12 },
            "created": { "date": "2023-01-10" },
            "content": "<h1>Handbook</h1><p>Welcome.</p>",
        })
    }

    #[tokio::test]
    async fn test_html_record_keeps_inline_content() {
        let fetcher = StubFetcher::new();
        let page = page_from_object(&fetcher, &page_record()).await.unwrap();

        assert_eq!(page.page_id, "306");
        assert_eq!(page.title, "Engineering Handbook");
        assert_eq!(page.extension, ".html");
        assert_eq!(page.content_type, ContentType::Page);
        assert_eq!(page.content, b"<h1>Handbook</h1><p>Welcome.</p>".to_vec());
        assert_eq!(
            page.url.as_str(),
            "https://intranet.example.com/engineering/handbook"
        );
        assert_eq!(page.url_path, "/engineering/handbook");
        assert!(page.is_published);
        assert!(!page.is_archived);
        assert_eq!(page.statistics["views"], json!(12));
        assert_eq!(page.created["date"], json!("2023-01-10"));
        assert!(page.modified.is_empty());
        assert_eq!(page.num_images(), 0);
        assert_eq!(page.num_attachments(), 0);
    }

    #[tokio::test]
    async fn test_missing_extension_defaults_to_html() {
        let fetcher = StubFetcher::new();
        let mut record = page_record();
        record["fileExtension"] = Value::Null;
        let page = page_from_object(&fetcher, &record).await.unwrap();
        assert_eq!(page.extension, ".html");
        assert_eq!(page.content_type, ContentType::Page);
    }

    #[tokio::test]
    async fn test_binary_record_fetches_document() {
        let mut fetcher = StubFetcher::new();
        fetcher.binary = Some(b"%PDF-1.4 fake".to_vec());
        // Widget content present, but a non-empty binary must win.
        fetcher.widget_html = Some(b"<div>widget</div>".to_vec());

        let mut record = page_record();
        record["fileExtension"] = json!(".pdf");
        record.as_object_mut().unwrap().remove("content");

        let page = page_from_object(&fetcher, &record).await.unwrap();
        assert_eq!(page.extension, ".pdf");
        assert_eq!(page.content_type, ContentType::File);
        assert_eq!(page.content, b"%PDF-1.4 fake".to_vec());
    }

    #[tokio::test]
    async fn test_missing_required_field_is_reported() {
        let fetcher = StubFetcher::new();
        let mut record = page_record();
        record.as_object_mut().unwrap().remove("href");

        let err = page_from_object(&fetcher, &record).await.unwrap_err();
        match err {
            SourceError::MissingField(key) => assert_eq!(key, "href"),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mistyped_flag_is_missing_field() {
        let fetcher = StubFetcher::new();
        let mut record = page_record();
        record["isPublished"] = json!("yes");

        let err = page_from_object(&fetcher, &record).await.unwrap_err();
        assert!(matches!(err, SourceError::MissingField(key) if key == "isPublished"));
    }

    #[tokio::test]
    async fn test_empty_content_falls_back_to_widget_html() {
        let mut fetcher = StubFetcher::new();
        fetcher.widget_html = Some(b"<div class=\"ig-cpt\"><p>From widget</p></div>".to_vec());

        let mut record = page_record();
        record["content"] = json!("");

        let page = page_from_object(&fetcher, &record).await.unwrap();
        assert_eq!(
            page.content,
            b"<div class=\"ig-cpt\"><p>From widget</p></div>".to_vec()
        );
        assert_eq!(page.content_type, ContentType::Page);
    }

    #[tokio::test]
    async fn test_absent_content_key_also_falls_back() {
        let mut fetcher = StubFetcher::new();
        fetcher.widget_html = Some(b"<p>rendered</p>".to_vec());

        let mut record = page_record();
        record.as_object_mut().unwrap().remove("content");

        let page = page_from_object(&fetcher, &record).await.unwrap();
        assert_eq!(page.content, b"<p>rendered</p>".to_vec());
    }

    #[tokio::test]
    async fn test_failed_widget_fallback_leaves_content_empty() {
        let fetcher = StubFetcher::new();
        let mut record = page_record();
        record["content"] = json!("");

        let page = page_from_object(&fetcher, &record).await.unwrap();
        assert!(page.content.is_empty());
        assert_eq!(page.content_type, ContentType::Page);
    }

    #[tokio::test]
    async fn test_page_to_markdown_renders_html() {
        let fetcher = StubFetcher::new();
        let mut record = page_record();
        record["content"] = json!("<p>Hi</p>");

        let page = page_from_object(&fetcher, &record).await.unwrap();
        let markdown = page_to_markdown(&page).unwrap();
        assert_eq!(markdown.trim(), "Hi");
    }

    #[tokio::test]
    async fn test_page_to_markdown_rejects_non_html() {
        let mut fetcher = StubFetcher::new();
        fetcher.binary = Some(b"<p>Hi</p>".to_vec());

        let mut record = page_record();
        record["fileExtension"] = json!(".pdf");

        let page = page_from_object(&fetcher, &record).await.unwrap();
        let err = page_to_markdown(&page).unwrap_err();
        assert!(matches!(&err, SourceError::UnsupportedFormat(ext) if ext == ".pdf"));
        assert!(err.to_string().contains(".pdf"));
    }

    #[tokio::test]
    async fn test_attachments_resolved_by_to_id() {
        let mut fetcher = StubFetcher::new();
        fetcher.listing = json!({ "items": [ { "ToId": "900" } ] });
        fetcher.objects = json!({ "900": { "title": "budget.xlsx" } });
        fetcher.binary = Some(b"XLSX-DATA".to_vec());

        let attachments = attachments_for_page(&fetcher, "306").await.unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].name, "budget.xlsx");
        assert_eq!(attachments[0].content, b"XLSX-DATA".to_vec());
        assert_eq!(attachments[0].content_type, ContentType::Attachment);
    }

    #[tokio::test]
    async fn test_empty_attachment_listing() {
        let fetcher = StubFetcher::new();
        let attachments = attachments_for_page(&fetcher, "306").await.unwrap();
        assert!(attachments.is_empty());
    }
}
