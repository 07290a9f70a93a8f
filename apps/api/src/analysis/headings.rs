//! Heading detection for markdown and HTML content.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::analysis::text::split_front_matter;
use crate::analysis::ContentKind;
use crate::requirements::HeadingLevel;

/// Heading count per level, every level H1..H6 present.
pub type HeadingCounts = BTreeMap<HeadingLevel, u32>;

/// Headings in document order as `(level, text)`.
pub fn outline(content: &str, kind: ContentKind) -> Vec<(HeadingLevel, String)> {
    match kind {
        ContentKind::Markdown => markdown_outline(content),
        ContentKind::Html => html_outline(content),
    }
}

pub fn count_headings(content: &str, kind: ContentKind) -> HeadingCounts {
    let mut counts: HeadingCounts = HeadingLevel::ALL.into_iter().map(|l| (l, 0)).collect();
    for (level, _) in outline(content, kind) {
        *counts.entry(level).or_insert(0) += 1;
    }
    counts
}

/// ATX headings (`## Title`), skipping front matter and fenced code blocks.
pub fn markdown_outline(content: &str) -> Vec<(HeadingLevel, String)> {
    static ATX: OnceLock<Regex> = OnceLock::new();
    let atx = ATX.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*#*\s*$").expect("static regex"));

    let (_, body) = split_front_matter(content);
    let mut in_fence = false;
    let mut headings = Vec::new();

    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = atx.captures(line.trim_end()) {
            if let Some(level) = HeadingLevel::from_depth(caps[1].len()) {
                headings.push((level, caps[2].trim().to_string()));
            }
        }
    }

    headings
}

/// `<hN ...>…</hN>` elements, case-insensitive, inner tags stripped.
pub fn html_outline(content: &str) -> Vec<(HeadingLevel, String)> {
    static ELEMENT: OnceLock<Regex> = OnceLock::new();
    static TAG: OnceLock<Regex> = OnceLock::new();
    let element = ELEMENT.get_or_init(|| {
        Regex::new(r"(?is)<h([1-6])(?:\s[^>]*)?>(.*?)</h[1-6]\s*>").expect("static regex")
    });
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"));

    element
        .captures_iter(content)
        .filter_map(|caps| {
            let depth: usize = caps[1].parse().ok()?;
            let level = HeadingLevel::from_depth(depth)?;
            let text = tag.replace_all(&caps[2], "");
            Some((level, text.split_whitespace().collect::<Vec<_>>().join(" ")))
        })
        .collect()
}
