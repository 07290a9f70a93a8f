//! Prompt construction: pure templating of a Requirements object.
//!
//! No state and no I/O. The same requirements and options always produce the
//! same prompt.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::generation::prompts::{
    ARTICLE_PROMPT_TEMPLATE, ARTICLE_SYSTEM, BODY_PROMPT_TEMPLATE, BODY_SYSTEM, HTML_PROMPT_TEMPLATE,
    HTML_SYSTEM, OUTLINE_PROMPT_TEMPLATE, OUTLINE_SYSTEM,
};
use crate::generation::response_parser::Outline;
use crate::llm_client::prompts::FENCED_OUTPUT_INSTRUCTION;
use crate::requirements::models::{DESCRIPTION_LENGTH_CODE, TITLE_LENGTH_CODE};
use crate::requirements::{HeadingLevel, Requirements};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptOptions {
    /// Maximum LSI keywords listed, highest targets first.
    pub lsi_limit: usize,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self { lsi_limit: 40 }
    }
}

/// Single-pass article prompt.
pub fn build_prompt(requirements: &Requirements, options: &PromptOptions) -> Prompt {
    let user = fill_template(
        ARTICLE_PROMPT_TEMPLATE,
        &[
            ("requirements", requirements_section(requirements).as_str()),
            ("variations", list_section(&requirements.variations).as_str()),
            ("lsi", lsi_section(requirements, options.lsi_limit).as_str()),
            ("entities", list_section(&requirements.entities).as_str()),
            ("headings", headings_section(requirements).as_str()),
            ("location", location_section(requirements).as_str()),
            ("word_count", requirements.word_count.to_string().as_str()),
            ("title_length", requirements.title_length().to_string().as_str()),
            (
                "description_length",
                requirements.description_length().to_string().as_str(),
            ),
        ],
    );

    Prompt {
        system: format!("{ARTICLE_SYSTEM} {FENCED_OUTPUT_INSTRUCTION}"),
        user,
    }
}

/// First phase of two-phase generation: metadata and heading plan only.
pub fn build_outline_prompt(requirements: &Requirements, options: &PromptOptions) -> Prompt {
    let user = fill_template(
        OUTLINE_PROMPT_TEMPLATE,
        &[
            ("primary_keyword", requirements.primary_keyword.as_str()),
            ("requirements", requirements_section(requirements).as_str()),
            ("variations", list_section(&requirements.variations).as_str()),
            ("lsi", lsi_section(requirements, options.lsi_limit).as_str()),
            ("entities", list_section(&requirements.entities).as_str()),
            ("headings", headings_section(requirements).as_str()),
            ("location", location_section(requirements).as_str()),
            ("title_length", requirements.title_length().to_string().as_str()),
            (
                "description_length",
                requirements.description_length().to_string().as_str(),
            ),
        ],
    );

    Prompt {
        system: OUTLINE_SYSTEM.to_string(),
        user,
    }
}

/// Second phase: the body, written against an accepted outline.
pub fn build_body_prompt(
    requirements: &Requirements,
    outline: &Outline,
    options: &PromptOptions,
) -> Prompt {
    let outline_text = if outline.headings.is_empty() {
        outline.raw_structure.trim().to_string()
    } else {
        outline
            .headings
            .iter()
            .map(|h| format!("{} {}", "#".repeat(h.level.depth()), h.text))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let user = fill_template(
        BODY_PROMPT_TEMPLATE,
        &[
            ("meta_title", outline.meta_title.as_str()),
            ("meta_description", outline.meta_description.as_str()),
            ("outline", outline_text.as_str()),
            ("variations", list_section(&requirements.variations).as_str()),
            ("lsi", lsi_section(requirements, options.lsi_limit).as_str()),
            ("entities", list_section(&requirements.entities).as_str()),
            ("word_count", requirements.word_count.to_string().as_str()),
        ],
    );

    Prompt {
        system: format!("{BODY_SYSTEM} {FENCED_OUTPUT_INSTRUCTION}"),
        user,
    }
}

pub fn build_html_prompt(markdown: &str) -> Prompt {
    Prompt {
        system: HTML_SYSTEM.to_string(),
        user: fill_template(HTML_PROMPT_TEMPLATE, &[("markdown", markdown)]),
    }
}

/// Substitutes `{name}` placeholders in one pass. Inserted values are never
/// rescanned, so braces in report or model text stay literal. Unknown
/// placeholders are left as they are.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let placeholder =
        PLACEHOLDER.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("static regex"));

    placeholder
        .replace_all(template, |caps: &regex::Captures<'_>| {
            values
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

/// "Number of H2 tags"-style rows; quotas already live in the headings section.
fn is_heading_tag_row(label: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)\bh[1-6]\b.*\btags?\b").expect("static regex"));
    re.is_match(label)
}

/// Override directives first, then the primary keyword, then the report's rows.
pub fn requirements_section(requirements: &Requirements) -> String {
    let mut lines: Vec<String> = requirements.heading_overrides.clone();
    lines.push(format!("Primary keyword: {}", requirements.primary_keyword));

    lines.extend(
        requirements
            .requirements
            .iter()
            .filter(|(label, _)| {
                !is_heading_tag_row(label)
                    && label.as_str() != TITLE_LENGTH_CODE
                    && label.as_str() != DESCRIPTION_LENGTH_CODE
            })
            .map(|(label, amount)| format!("{label}: add {amount}")),
    );

    lines.join("\n")
}

fn list_section(items: &[String]) -> String {
    if items.is_empty() {
        return "None".to_string();
    }
    items.join(", ")
}

pub fn lsi_section(requirements: &Requirements, limit: usize) -> String {
    let lines: Vec<String> = requirements
        .lsi_keywords
        .top(limit)
        .into_iter()
        .map(|(keyword, target)| format!("'{keyword}' => at least {target} occurrences"))
        .collect();
    if lines.is_empty() {
        return "None".to_string();
    }
    lines.join("\n")
}

pub fn headings_section(requirements: &Requirements) -> String {
    let mut lines = vec![format!(
        "H1: exactly 1, containing the primary keyword '{}'",
        requirements.primary_keyword
    )];
    for level in HeadingLevel::QUOTA_LEVELS {
        let count = requirements.heading_structure.get(level);
        if count > 0 {
            lines.push(format!("{level}: {count}"));
        }
    }
    lines.push(format!("Total headings: {}", requirements.total_headings));
    lines.join("\n")
}

fn location_section(requirements: &Requirements) -> String {
    match &requirements.location {
        Some(location) => format!(
            "\n<location>\nThe page serves {location}. Mention the location naturally in the title, \
            the H1 and the opening paragraph.\n</location>\n"
        ),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::response_parser::OutlineHeading;
    use crate::requirements::{normalize, HeadingOverrides, Location, LsiSource};

    fn requirements() -> Requirements {
        let mut req = Requirements {
            primary_keyword: "hiking boots".into(),
            variations: vec!["trail boots".into(), "hiking shoes".into()],
            entities: vec!["Gore-Tex".into(), "Vibram".into()],
            lsi_keywords: LsiSource::FromMapping(vec![
                ("waterproof".into(), 3),
                ("ankle support".into(), 2),
                ("tread".into(), 1),
            ])
            .into(),
            heading_structure: [(HeadingLevel::H2, 4), (HeadingLevel::H3, 6)]
                .into_iter()
                .collect(),
            word_count: 1200,
            ..Requirements::default()
        };
        req.requirements.insert("Number of H2 tags".into(), 4);
        req.requirements.insert("Exact keyword in H1".into(), 1);
        req.requirements.insert(TITLE_LENGTH_CODE.into(), 55);
        req
    }

    #[test]
    fn test_prompt_embeds_every_section() {
        let prompt = build_prompt(&requirements(), &PromptOptions::default());

        assert!(prompt.user.contains("Exact keyword in H1: add 1"));
        assert!(!prompt.user.contains("Number of H2 tags"));
        assert!(!prompt.user.contains("CP480: add"));
        assert!(prompt.user.contains("trail boots, hiking shoes"));
        assert!(prompt.user.contains("'waterproof' => at least 3 occurrences"));
        assert!(prompt.user.contains("Gore-Tex, Vibram"));
        assert!(prompt.user.contains("H2: 4\nH3: 6"));
        assert!(prompt.user.contains("about 1200 words"));
        assert!(prompt.user.contains("at most 55 characters"));
        assert!(prompt.user.contains("close to 160 characters"));
        for placeholder in ["{requirements}", "{lsi}", "{word_count}", "{location}"] {
            assert!(!prompt.user.contains(placeholder), "{placeholder} left in prompt");
        }
    }

    #[test]
    fn test_braces_in_report_text_stay_literal() {
        let mut req = requirements();
        req.requirements.insert("Mention {word_count} and {lsi}".into(), 1);
        let prompt = build_prompt(&req, &PromptOptions::default());
        assert!(prompt.user.contains("Mention {word_count} and {lsi}: add 1"));

        let outline = Outline {
            meta_title: "Boots".into(),
            meta_description: "Read {meta_title} now".into(),
            ..Outline::default()
        };
        let body = build_body_prompt(&req, &outline, &PromptOptions::default());
        assert!(body.user.contains("Description: Read {meta_title} now"));
    }

    #[test]
    fn test_fill_template_keeps_unknown_placeholders() {
        assert_eq!(fill_template("{a} {b} {a}", &[("a", "{b}")]), "{b} {b} {b}");
    }

    #[test]
    fn test_lsi_truncated_by_rank() {
        let lsi = lsi_section(&requirements(), 2);
        assert_eq!(
            lsi,
            "'waterproof' => at least 3 occurrences\n'ankle support' => at least 2 occurrences"
        );
    }

    #[test]
    fn test_override_directives_come_first() {
        let overrides = HeadingOverrides {
            h2: 7,
            ..HeadingOverrides::default()
        };
        let req = normalize(requirements(), &overrides);
        let section = requirements_section(&req);
        assert!(section.starts_with("IMPORTANT: Use exactly 7 H2 headings."));
        assert!(build_prompt(&req, &PromptOptions::default())
            .user
            .contains("H2: 7"));
    }

    #[test]
    fn test_empty_lists_render_none() {
        let req = Requirements {
            primary_keyword: "x".into(),
            ..Requirements::default()
        };
        let prompt = build_prompt(&req, &PromptOptions::default());
        assert!(prompt.user.contains("<variations>\nNone\n</variations>"));
        assert!(prompt.user.contains("<lsi>\nNone\n</lsi>"));
    }

    #[test]
    fn test_location_hint_only_when_known() {
        let mut req = requirements();
        assert!(!build_prompt(&req, &PromptOptions::default())
            .user
            .contains("<location>"));
        req.location = Some(Location {
            city: "Denver".into(),
            state: Some("CO".into()),
        });
        assert!(build_prompt(&req, &PromptOptions::default())
            .user
            .contains("The page serves Denver, CO."));
    }

    #[test]
    fn test_body_prompt_embeds_outline() {
        let outline = Outline {
            meta_title: "Best Hiking Boots".into(),
            meta_description: "Pick the right pair.".into(),
            headings: vec![
                OutlineHeading {
                    level: HeadingLevel::H1,
                    text: "Best Hiking Boots".into(),
                },
                OutlineHeading {
                    level: HeadingLevel::H2,
                    text: "Fit".into(),
                },
            ],
            raw_structure: String::new(),
        };
        let prompt = build_body_prompt(&requirements(), &outline, &PromptOptions::default());
        assert!(prompt.user.contains("<outline>\n# Best Hiking Boots\n## Fit\n</outline>"));
        assert!(prompt.user.contains("Title: Best Hiking Boots"));
    }

    #[test]
    fn test_outline_prompt_asks_for_markers() {
        let prompt = build_outline_prompt(&requirements(), &PromptOptions::default());
        assert!(prompt.user.contains("META TITLE:"));
        assert!(prompt.user.contains("META DESCRIPTION:"));
        assert!(prompt.user.contains("HEADING STRUCTURE:"));
        assert!(prompt.user.contains("\"hiking boots\""));
    }
}
