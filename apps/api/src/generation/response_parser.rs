//! Turns raw completion text into structured generation output.
//!
//! Body extraction tries, in order: a fenced `markdown`/`md`/`html` (or
//! unlabelled) block, the text with assistant preamble/postamble removed,
//! then the raw text.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::analysis::headings::markdown_outline;
use crate::analysis::text::{front_matter_value, split_front_matter};
use crate::llm_client::TokenUsage;
use crate::requirements::HeadingLevel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineHeading {
    pub level: HeadingLevel,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub id: Uuid,
    pub meta_title: String,
    pub meta_description: String,
    pub heading_outline: Vec<OutlineHeading>,
    pub body_markdown: String,
    pub html: Option<String>,
    pub token_usage: TokenUsage,
}

/// Result of the outline phase. Absent sections are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub meta_title: String,
    pub meta_description: String,
    pub headings: Vec<OutlineHeading>,
    /// The HEADING STRUCTURE section as returned, for prompts when no
    /// heading lines could be recognised.
    pub raw_structure: String,
}

/// Which extraction rule produced the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySource {
    Fenced,
    Stripped,
    Raw,
}

pub fn parse_response(text: &str) -> GenerationResult {
    let (body, source) = extract_body(text);
    if source == BodySource::Raw {
        warn!("Completion text had no fenced block or known preamble; using it verbatim");
    }

    let (front_matter, rest) = split_front_matter(&body);
    let meta_title = front_matter
        .and_then(|fm| front_matter_value(fm, "title"))
        .unwrap_or_default();
    let meta_description = front_matter
        .and_then(|fm| front_matter_value(fm, "description"))
        .unwrap_or_default();

    let heading_outline = markdown_outline(rest)
        .into_iter()
        .map(|(level, text)| OutlineHeading { level, text })
        .collect();

    GenerationResult {
        id: Uuid::new_v4(),
        meta_title,
        meta_description,
        heading_outline,
        body_markdown: body,
        html: None,
        token_usage: TokenUsage::default(),
    }
}

/// Document body of a completion, and the rule that found it.
pub fn extract_body(text: &str) -> (String, BodySource) {
    if let Some(fenced) = fenced_block(text, &["markdown", "md", "html", ""]) {
        return (fenced, BodySource::Fenced);
    }
    if let Some(stripped) = strip_chatter(text) {
        return (stripped, BodySource::Stripped);
    }
    (text.trim().to_string(), BodySource::Raw)
}

/// Content of the first fenced block whose label is in `labels` (`""` means
/// unlabelled). Labelled fences inside the block open nested code blocks; the
/// block ends at the bare fence that closes it. An opener with no closing
/// fence is skipped.
pub fn fenced_block(text: &str, labels: &[&str]) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();

    lines.iter().enumerate().find_map(|(start, line)| {
        let label = fence_label(line)?;
        if !labels.iter().any(|l| label.eq_ignore_ascii_case(l)) {
            return None;
        }

        let mut depth = 0usize;
        let end = lines
            .iter()
            .enumerate()
            .skip(start + 1)
            .find_map(|(i, inner)| match fence_label(inner) {
                Some("") if depth == 0 => Some(i),
                Some("") => {
                    depth -= 1;
                    None
                }
                Some(_) => {
                    depth += 1;
                    None
                }
                None => None,
            })?;

        let content = lines[start + 1..end].join("\n");
        let content = content.trim();
        (!content.is_empty()).then(|| content.to_string())
    })
}

/// Label of a fence line (`""` for a bare fence), `None` for any other line.
fn fence_label(line: &str) -> Option<&str> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE
        .get_or_init(|| Regex::new(r"^[ \t]*```[ \t]*([A-Za-z0-9_-]*)[ \t]*$").expect("static regex"));
    Some(fence.captures(line)?.get(1)?.as_str())
}

/// Drops a leading "Here is…" line and trailing "Let me know…" lines.
/// `None` when there was nothing to drop.
fn strip_chatter(text: &str) -> Option<String> {
    static PREAMBLE: OnceLock<Regex> = OnceLock::new();
    static POSTAMBLE: OnceLock<Regex> = OnceLock::new();
    let preamble = PREAMBLE.get_or_init(|| {
        Regex::new(
            r"(?i)^(here('s| is| are)|sure|certainly|of course|absolutely|below is|i've (written|created|generated))\b",
        )
        .expect("static regex")
    });
    let postamble = POSTAMBLE.get_or_init(|| {
        Regex::new(
            r"(?i)^(let me know|i hope|feel free|hope this|this (content|article|page|draft) (meets|follows|covers|includes))\b",
        )
        .expect("static regex")
    });

    let mut lines: Vec<&str> = text.trim().lines().collect();
    let before = lines.len();

    if lines.first().is_some_and(|l| preamble.is_match(l.trim())) {
        lines.remove(0);
    }
    while lines
        .last()
        .is_some_and(|l| l.trim().is_empty() || postamble.is_match(l.trim()))
    {
        lines.pop();
    }

    if lines.len() == before {
        return None;
    }
    let body = lines.join("\n").trim().to_string();
    (!body.is_empty()).then_some(body)
}

/// Splits an outline reply on its `META TITLE:` / `META DESCRIPTION:` /
/// `HEADING STRUCTURE:` markers. Markers may appear in any order or not at all.
pub fn parse_outline(text: &str) -> Outline {
    const MARKERS: [&str; 3] = ["META TITLE:", "META DESCRIPTION:", "HEADING STRUCTURE:"];

    let cleaned = text.replace("**", "");
    let upper = cleaned.to_ascii_uppercase();

    let mut positions: Vec<(usize, usize)> = MARKERS
        .iter()
        .enumerate()
        .filter_map(|(i, marker)| upper.find(marker).map(|pos| (pos, i)))
        .collect();
    positions.sort();

    let mut sections = [String::new(), String::new(), String::new()];
    for (n, &(pos, marker)) in positions.iter().enumerate() {
        let start = pos + MARKERS[marker].len();
        let end = positions.get(n + 1).map(|&(p, _)| p).unwrap_or(cleaned.len());
        sections[marker] = cleaned[start..end].trim().to_string();
    }

    let [title, description, structure] = sections;
    if structure.is_empty() && title.is_empty() {
        warn!("Outline reply had none of the expected section markers");
    }

    Outline {
        meta_title: first_line_unquoted(&title),
        meta_description: first_line_unquoted(&description),
        headings: outline_headings(&structure),
        raw_structure: structure,
    }
}

fn first_line_unquoted(section: &str) -> String {
    section
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim()
        .to_string()
}

/// Markdown `##` lines, or `H2: text` lines when the model used labels.
fn outline_headings(structure: &str) -> Vec<OutlineHeading> {
    static LABELLED: OnceLock<Regex> = OnceLock::new();
    let labelled = LABELLED.get_or_init(|| {
        Regex::new(r"(?im)^[\s\-*]*H([1-6])\s*[:.)\-]\s*(.+?)\s*$").expect("static regex")
    });

    let markdown = markdown_outline(structure);
    if !markdown.is_empty() {
        return markdown
            .into_iter()
            .map(|(level, text)| OutlineHeading { level, text })
            .collect();
    }

    labelled
        .captures_iter(structure)
        .filter_map(|caps| {
            let level = HeadingLevel::from_depth(caps[1].parse().ok()?)?;
            Some(OutlineHeading {
                level,
                text: caps[2].to_string(),
            })
        })
        .collect()
}

/// HTML from a conversion reply: fenced `html` block, else the
/// `<html>…</html>` span, else the trimmed text.
pub fn extract_html(text: &str) -> String {
    static DOCUMENT: OnceLock<Regex> = OnceLock::new();
    let document =
        DOCUMENT.get_or_init(|| Regex::new(r"(?is)<html[^>]*>.*</html\s*>").expect("static regex"));

    if let Some(fenced) = fenced_block(text, &["html", ""]) {
        return fenced;
    }
    if let Some(m) = document.find(text) {
        return m.as_str().to_string();
    }
    text.trim().to_string()
}
