use std::sync::Arc;

use ego_tree::NodeRef;
use engine_logging::engine_debug;
use harvester_core::{truncate_chars, ExtractedContent, Resource};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::capability::ContentExtractor;
use crate::snapshot::{decode_snapshot, SnapshotSource};
use crate::ExtractionError;

pub const DEFAULT_MAX_BODY_CHARS: usize = 30_000;

/// Title and URL only. Works for every resource that has a URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataExtractor;

#[async_trait::async_trait]
impl ContentExtractor for MetadataExtractor {
    async fn extract(&self, resource: &Resource) -> Result<ExtractedContent, ExtractionError> {
        let url = resource.url().ok_or(ExtractionError::MissingUrl(resource.id))?;
        let title = resource.title.trim();
        let body_text = if title.is_empty() {
            url.to_string()
        } else {
            format!("{title}\n{url}")
        };
        Ok(ExtractedContent {
            source_url: url.to_string(),
            title: title.to_string(),
            body_text,
        })
    }
}

/// Reduces a rendered page snapshot to readable text.
pub struct SnapshotExtractor<S> {
    source: S,
    max_body_chars: usize,
}

impl<S: SnapshotSource> SnapshotExtractor<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            max_body_chars: DEFAULT_MAX_BODY_CHARS,
        }
    }

    pub fn with_max_body_chars(mut self, max_body_chars: usize) -> Self {
        self.max_body_chars = max_body_chars;
        self
    }
}

#[async_trait::async_trait]
impl<S: SnapshotSource> ContentExtractor for SnapshotExtractor<S> {
    async fn extract(&self, resource: &Resource) -> Result<ExtractedContent, ExtractionError> {
        let url = resource.url().ok_or(ExtractionError::MissingUrl(resource.id))?;
        let raw = self.source.snapshot(resource).await?;
        let decoded = decode_snapshot(&raw.bytes, raw.content_type.as_deref())?;
        let page = readable_text(&decoded.html);
        if page.body.is_empty() {
            return Err(ExtractionError::Unavailable(format!(
                "snapshot of resource {} has no text",
                resource.id
            )));
        }

        let title = page
            .title
            .unwrap_or_else(|| resource.title.trim().to_string());
        Ok(ExtractedContent {
            source_url: url.to_string(),
            title,
            body_text: truncate_chars(&page.body, self.max_body_chars).to_string(),
        })
    }
}

/// Tries `primary`, and on any failure falls back to `fallback`.
pub struct FallbackExtractor {
    primary: Arc<dyn ContentExtractor>,
    fallback: Arc<dyn ContentExtractor>,
}

impl FallbackExtractor {
    pub fn new(primary: Arc<dyn ContentExtractor>, fallback: Arc<dyn ContentExtractor>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait::async_trait]
impl ContentExtractor for FallbackExtractor {
    async fn extract(&self, resource: &Resource) -> Result<ExtractedContent, ExtractionError> {
        match self.primary.extract(resource).await {
            Ok(content) => Ok(content),
            Err(err) => {
                engine_debug!(
                    "resource={} rich extraction unavailable ({}), using fallback",
                    resource.id,
                    err
                );
                self.fallback.extract(resource).await
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub title: Option<String>,
    pub body: String,
}

/// Pulls `<title>` and the text of `<article>` (else `<body>`, else the whole
/// document), one line per block element, scripts and styles skipped.
pub fn readable_text(html: &str) -> PageText {
    let doc = Html::parse_document(html);
    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let root = ["article", "body"]
        .iter()
        .filter_map(|tag| Selector::parse(tag).ok())
        .find_map(|sel| doc.select(&sel).next())
        .unwrap_or_else(|| doc.root_element());

    let mut collector = TextCollector::default();
    for child in root.children() {
        collector.visit(child);
    }

    PageText {
        title,
        body: collector.finish(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Default)]
struct TextCollector {
    builder: String,
    last_char: Option<char>,
}

impl TextCollector {
    fn visit(&mut self, node: NodeRef<'_, Node>) {
        match node.value() {
            Node::Text(text) => self.append_text(text),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(node) {
                    self.visit_element(element);
                }
            }
            _ => {
                for child in node.children() {
                    self.visit(child);
                }
            }
        }
    }

    fn visit_element(&mut self, element: ElementRef<'_>) {
        let tag = element.value().name().to_ascii_lowercase();
        match tag.as_str() {
            "script" | "style" | "noscript" | "template" | "iframe" | "svg" => {}
            "br" => self.ensure_newline(),
            "p" | "div" | "section" | "article" | "header" | "footer" | "nav" | "main"
            | "aside" | "figure" | "figcaption" | "table" | "tr" | "blockquote" | "pre"
            | "ul" | "ol" | "li" | "dl" | "dt" | "dd" | "h1" | "h2" | "h3" | "h4" | "h5"
            | "h6" => {
                self.ensure_newline();
                self.visit_children(element);
                self.ensure_newline();
            }
            _ => self.visit_children(element),
        }
    }

    fn visit_children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            self.visit(child);
        }
    }

    fn append_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_whitespace() {
                if self.last_char.is_none()
                    || self.last_char == Some(' ')
                    || self.last_char == Some('\n')
                {
                    continue;
                }
                self.push_char(' ');
            } else {
                self.push_char(ch);
            }
        }
    }

    fn ensure_newline(&mut self) {
        if self.builder.is_empty() || self.last_char == Some('\n') {
            return;
        }
        if self.last_char == Some(' ') {
            self.builder.pop();
        }
        self.push_char('\n');
    }

    fn push_char(&mut self, ch: char) {
        self.builder.push(ch);
        self.last_char = Some(ch);
    }

    fn finish(self) -> String {
        self.builder.trim().to_string()
    }
}
