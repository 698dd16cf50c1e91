//! Heading-aware splitting of narrative markdown into `learning` chunks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ExtractionReport;
use crate::chunk::{ChunkType, DocumentChunk};
use crate::tokens::TokenCounter;
use crate::windower::ChunkWindower;

const FRONT_MATTER_DELIMITER: &str = "---";
const MIN_WINDOW_TOKENS: usize = 800;
const MAX_WINDOW_TOKENS: usize = 1200;

/// Window tuning for prose, independent of the spec chunking limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    pub target_tokens: usize,
    pub overlap_tokens: usize,
    pub min_tokens: usize,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            target_tokens: 1000,
            overlap_tokens: 100,
            min_tokens: 800,
        }
    }
}

impl MarkdownConfig {
    /// `target_tokens` clamped into the supported 800..=1200 window.
    #[must_use]
    pub fn window_tokens(&self) -> usize {
        self.target_tokens
            .clamp(MIN_WINDOW_TOKENS, MAX_WINDOW_TOKENS)
    }
}

#[derive(Debug, Clone)]
pub struct MarkdownExtractor {
    counter: TokenCounter,
    windower: ChunkWindower,
    min_tokens: usize,
}

impl MarkdownExtractor {
    #[must_use]
    pub fn new(counter: TokenCounter, config: &MarkdownConfig) -> Self {
        let windower =
            ChunkWindower::new(counter.clone(), config.window_tokens(), config.overlap_tokens);
        Self {
            counter,
            windower,
            min_tokens: config.min_tokens,
        }
    }

    /// Split a markdown document into `learning` chunks.
    ///
    /// Front-matter keys are copied into every chunk's metadata. Sections
    /// shorter than `min_tokens` are merged with the sections that follow;
    /// whatever remains at the end of the document is always emitted, so a
    /// short document yields exactly one chunk. `section` holds a chunk's
    /// first heading and `sections` every merged heading, joined by ` | `.
    #[must_use]
    pub fn extract(&self, doc: &str) -> ExtractionReport {
        let (front_matter, body) = split_front_matter(doc);
        let mut base = front_matter;
        if let Some(title) = base.get("title").or_else(|| base.get("name")).cloned() {
            base.insert("doc".to_owned(), title);
        }

        let sections = split_sections(body);
        let mut report = ExtractionReport::default();
        let mut buffer = String::new();
        let mut headings: Vec<String> = Vec::new();

        for (idx, section) in sections.iter().enumerate() {
            let is_last = idx + 1 == sections.len();
            if buffer.is_empty() {
                headings.clear();
            } else {
                buffer.push_str("\n\n");
            }
            headings.extend(section.heading.clone());
            buffer.push_str(section.text.trim());

            if is_last || self.counter.count(&buffer) < self.min_tokens {
                continue;
            }

            let mut pieces = self.windower.split(&buffer);
            // A short trailing window is carried into the next unit so only
            // the document's final chunk can fall under the minimum.
            let carry = if pieces.len() > 1
                && pieces
                    .last()
                    .is_some_and(|p| self.counter.count(p) < self.min_tokens)
            {
                pieces.pop()
            } else {
                None
            };
            self.emit(&mut report, pieces, &headings, &base);
            buffer = carry.unwrap_or_default();
            // The carried tail belongs to the most recent section.
            if headings.len() > 1 {
                headings.drain(..headings.len() - 1);
            }
        }

        if !buffer.trim().is_empty() {
            let pieces = self.windower.split(&buffer);
            self.emit(&mut report, pieces, &headings, &base);
        }
        report
    }

    fn emit(
        &self,
        report: &mut ExtractionReport,
        pieces: Vec<String>,
        headings: &[String],
        base: &BTreeMap<String, String>,
    ) {
        let mut metadata = base.clone();
        if let Some(first) = headings.first() {
            metadata.insert("section".to_owned(), first.clone());
            metadata.insert("sections".to_owned(), headings.join(" | "));
        }
        for piece in pieces {
            if piece.trim().is_empty() {
                continue;
            }
            report.chunks.push(DocumentChunk::new(
                &self.counter,
                piece,
                ChunkType::Learning,
                metadata.clone(),
            ));
        }
    }
}

struct Section {
    heading: Option<String>,
    text: String,
}

/// Parse a leading `---` block of `key: value` lines. An unclosed block is
/// treated as ordinary body text.
fn split_front_matter(doc: &str) -> (BTreeMap<String, String>, &str) {
    let trimmed = doc.trim_start();
    let Some(after_open) = trimmed.strip_prefix(FRONT_MATTER_DELIMITER) else {
        return (BTreeMap::new(), doc);
    };
    if !after_open.starts_with(['\n', '\r']) {
        return (BTreeMap::new(), doc);
    }
    let Some(close) = after_open.find("\n---") else {
        return (BTreeMap::new(), doc);
    };

    let mut metadata = BTreeMap::new();
    for line in after_open[..close].lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            let key = key.trim();
            if !key.is_empty() && !value.is_empty() {
                metadata.insert(key.to_owned(), value.to_owned());
            }
        }
    }

    let rest = &after_open[close + 4..];
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    (metadata, body)
}

/// Heading text for `#`, `##` or `###` lines.
fn heading(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if !(1..=3).contains(&level) {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    Some(rest.trim())
}

fn split_sections(body: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section {
        heading: None,
        text: String::new(),
    };
    let mut in_fence = false;

    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }
        if !in_fence && let Some(title) = heading(line) {
            if !current.text.trim().is_empty() {
                sections.push(current);
            }
            current = Section {
                heading: Some(title.to_owned()).filter(|t| !t.is_empty()),
                text: String::new(),
            };
        }
        current.text.push_str(line);
        current.text.push('\n');
    }
    if !current.text.trim().is_empty() {
        sections.push(current);
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> MarkdownExtractor {
        MarkdownExtractor::new(TokenCounter::new().unwrap(), &MarkdownConfig::default())
    }

    fn words(n: usize) -> String {
        vec!["token"; n].join(" ")
    }

    #[test]
    fn short_document_yields_one_chunk() {
        let doc = format!("# Notes\n\n{}\n", words(50));
        let report = extractor().extract(&doc);
        assert_eq!(report.chunks.len(), 1);
        let chunk = &report.chunks[0];
        assert_eq!(chunk.chunk_type(), ChunkType::Learning);
        assert_eq!(chunk.meta("section"), Some("Notes"));
        assert!(chunk.text().starts_with("# Notes"));
    }

    #[test]
    fn merged_sections_keep_every_heading() {
        let doc = "# Install\nRun the installer.\n# Uninstall\nRemove the binary.\n";
        let report = extractor().extract(doc);
        assert_eq!(report.chunks.len(), 1);
        let chunk = &report.chunks[0];
        assert_eq!(chunk.meta("section"), Some("Install"));
        assert_eq!(chunk.meta("sections"), Some("Install | Uninstall"));
        assert!(chunk.text().contains("# Uninstall"));
    }

    #[test]
    fn empty_document_yields_nothing() {
        assert!(extractor().extract("").chunks.is_empty());
        assert!(extractor().extract("---\ntitle: x\n---\n").chunks.is_empty());
    }

    #[test]
    fn front_matter_is_metadata_not_text() {
        let doc = "---\ntitle: \"Payroll guide\"\nowner: hr\n---\n## Usage\nCall the payroll API.";
        let report = extractor().extract(doc);
        assert_eq!(report.chunks.len(), 1);
        let chunk = &report.chunks[0];
        assert_eq!(chunk.meta("title"), Some("Payroll guide"));
        assert_eq!(chunk.meta("doc"), Some("Payroll guide"));
        assert_eq!(chunk.meta("owner"), Some("hr"));
        assert!(!chunk.text().contains("owner"));
    }

    #[test]
    fn unclosed_front_matter_is_body() {
        let report = extractor().extract("---\ntitle: x\nno closing line");
        assert_eq!(report.chunks.len(), 1);
        assert!(report.chunks[0].text().contains("title: x"));
        assert!(report.chunks[0].meta("title").is_none());
    }

    #[test]
    fn long_documents_respect_window_and_minimum() {
        let doc = format!(
            "# Intro\n{}\n## Details\n{}\n### More\n{}\n## Tail\n{}",
            words(500),
            words(500),
            words(500),
            words(30)
        );
        let counter = TokenCounter::new().unwrap();
        let report = extractor().extract(&doc);
        assert!(report.chunks.len() > 1);
        let (last, rest) = report.chunks.split_last().unwrap();
        for chunk in rest {
            assert!(chunk.token_count() >= 800, "{}", chunk.token_count());
        }
        for chunk in &report.chunks {
            assert!(chunk.token_count() <= 1000);
            assert_eq!(chunk.token_count(), counter.count(chunk.text()));
        }
        assert!(last.token_count() > 0);
        assert_eq!(report.chunks[0].meta("section"), Some("Intro"));
    }

    #[test]
    fn headings_inside_code_fences_do_not_split() {
        let body = "# Real\ntext\n```\n# comment in code\n```\nmore";
        let sections = split_sections(body);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading.as_deref(), Some("Real"));
    }

    #[test]
    fn only_three_heading_levels_split() {
        assert_eq!(heading("## Setup"), Some("Setup"));
        assert_eq!(heading("### Deep"), Some("Deep"));
        assert_eq!(heading("#### Deeper"), None);
        assert_eq!(heading("#hashtag"), None);
        assert_eq!(split_sections("# A\nx\n#### B\ny").len(), 1);
    }

    #[test]
    fn window_is_clamped() {
        let small = MarkdownConfig {
            target_tokens: 100,
            ..MarkdownConfig::default()
        };
        assert_eq!(small.window_tokens(), 800);
        let large = MarkdownConfig {
            target_tokens: 5000,
            ..MarkdownConfig::default()
        };
        assert_eq!(large.window_tokens(), 1200);
        assert_eq!(MarkdownConfig::default().window_tokens(), 1000);
    }
}
