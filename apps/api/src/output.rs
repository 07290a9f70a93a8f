//! Output bundle writer: one timestamped directory per generated page.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::info;

use crate::analysis::AnalysisReport;
use crate::generation::GenerationResult;
use crate::requirements::{HeadingLevel, Requirements};

const MAX_SLUG_LEN: usize = 60;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize analysis: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Writes `content.md`, `content.html` (if any), `analysis.json` and
/// `requirements.txt` under `<root>/<timestamp>_<keyword>/`.
pub fn write_bundle(
    root: &Path,
    requirements: &Requirements,
    result: &GenerationResult,
    report: &AnalysisReport,
) -> Result<PathBuf, OutputError> {
    let dir = root.join(format!(
        "{}_{}",
        Local::now().format("%Y%m%d_%H%M%S"),
        sanitize_keyword(&requirements.primary_keyword)
    ));
    fs::create_dir_all(&dir).map_err(|source| OutputError::Io {
        path: dir.clone(),
        source,
    })?;

    write_file(&dir.join("content.md"), &result.body_markdown)?;
    if let Some(html) = &result.html {
        write_file(&dir.join("content.html"), html)?;
    }
    write_file(
        &dir.join("analysis.json"),
        &serde_json::to_string_pretty(report)?,
    )?;
    write_file(
        &dir.join("requirements.txt"),
        &requirements_summary(requirements),
    )?;

    info!("Wrote output bundle to {}", dir.display());
    Ok(dir)
}

fn write_file(path: &Path, contents: &str) -> Result<(), OutputError> {
    fs::write(path, contents).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// ASCII alphanumerics kept, every other run collapsed to one `-`.
pub fn sanitize_keyword(keyword: &str) -> String {
    let mut slug = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let mut slug: String = slug.trim_matches('-').chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        return "content".to_string();
    }
    slug
}

pub fn requirements_summary(requirements: &Requirements) -> String {
    let mut lines = vec![
        format!("Primary keyword: {}", requirements.primary_keyword),
        format!("URL: {}", requirements.url),
    ];
    if let Some(location) = &requirements.location {
        lines.push(format!("Location: {location}"));
    }
    lines.push(format!("Word count: {}", requirements.word_count));
    lines.push(format!("Title length: {}", requirements.title_length()));
    lines.push(format!(
        "Description length: {}",
        requirements.description_length()
    ));

    lines.push(String::new());
    lines.push(format!("Headings (total {}):", requirements.total_headings));
    lines.extend(HeadingLevel::QUOTA_LEVELS.into_iter().filter_map(|level| {
        let count = requirements.heading_structure.get(level);
        (count > 0).then(|| format!("  {level}: {count}"))
    }));
    lines.extend(
        requirements
            .heading_overrides
            .iter()
            .map(|directive| format!("  {directive}")),
    );

    lines.push(String::new());
    lines.push(format!("Variations: {}", requirements.variations.join(", ")));
    lines.push(format!("Entities: {}", requirements.entities.join(", ")));

    lines.push(String::new());
    lines.push("LSI keywords:".to_string());
    lines.extend(
        requirements
            .lsi_keywords
            .ranked()
            .into_iter()
            .map(|(keyword, target)| format!("  {keyword}: {target}")),
    );

    if !requirements.requirements.is_empty() {
        lines.push(String::new());
        lines.push("Requirements:".to_string());
        lines.extend(
            requirements
                .requirements
                .iter()
                .map(|(label, amount)| format!("  {label}: {amount}")),
        );
    }

    let mut summary = lines.join("\n");
    summary.push('\n');
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, ContentKind};
    use crate::generation::response_parser::parse_response;
    use crate::requirements::{normalize, HeadingOverrides};

    #[test]
    fn test_sanitize_keyword() {
        assert_eq!(sanitize_keyword("Hiking Boots!"), "hiking-boots");
        assert_eq!(sanitize_keyword("  plumber / denver, co "), "plumber-denver-co");
        assert_eq!(sanitize_keyword("¿¡!!"), "content");
        assert_eq!(sanitize_keyword(&"a ".repeat(50)).len(), 59);
    }

    #[test]
    fn test_write_bundle_files() {
        let root = tempfile::tempdir().unwrap();
        let req = normalize(
            Requirements {
                primary_keyword: "hiking boots".into(),
                ..Requirements::default()
            },
            &HeadingOverrides::default(),
        );
        let mut result = parse_response("```markdown\n# Hiking Boots\nText.\n```");
        let report = analyze(&result.body_markdown, &req, ContentKind::Markdown);

        let dir = write_bundle(root.path(), &req, &result, &report).unwrap();
        let name = dir.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("_hiking-boots"), "{name}");
        assert_eq!(
            fs::read_to_string(dir.join("content.md")).unwrap(),
            "# Hiking Boots\nText."
        );
        assert!(!dir.join("content.html").exists());

        let analysis: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("analysis.json")).unwrap()).unwrap();
        assert_eq!(analysis["passes_validation"], false);

        let summary = fs::read_to_string(dir.join("requirements.txt")).unwrap();
        assert!(summary.starts_with("Primary keyword: hiking boots\n"));
        assert!(summary.contains("Word count: 1500"));

        result.html = Some("<h1>Hiking Boots</h1>".into());
        let dir = write_bundle(root.path(), &req, &result, &report).unwrap();
        assert!(dir.join("content.html").exists());
    }

    #[test]
    fn test_requirements_summary_sections() {
        let mut req = normalize(
            Requirements {
                primary_keyword: "roof repair".into(),
                lsi_keywords: crate::requirements::LsiSource::FromMapping(vec![
                    ("shingles".into(), 3),
                    ("leak".into(), 1),
                ])
                .into(),
                ..Requirements::default()
            },
            &HeadingOverrides {
                h2: 4,
                ..HeadingOverrides::default()
            },
        );
        req.requirements.insert("Exact keyword in H1".into(), 1);

        let summary = requirements_summary(&req);
        assert!(summary.contains("\nHeadings (total 5):\n  H2: 4\n  IMPORTANT: Use exactly 4 H2"));
        assert!(summary.contains("\nLSI keywords:\n  shingles: 3\n  leak: 1\n"));
        assert!(summary.ends_with("\nRequirements:\n  Exact keyword in H1: 1\n"));
        assert!(!summary.contains("Location:"));
    }

    #[test]
    fn test_unwritable_root_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let req = Requirements::default();
        let result = parse_response("x");
        let report = analyze("x", &req, ContentKind::Markdown);
        assert!(matches!(
            write_bundle(&blocker, &req, &result, &report),
            Err(OutputError::Io { .. })
        ));
    }
}
