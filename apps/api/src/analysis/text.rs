//! Text normalization and boundary-safe phrase counting.

use std::sync::OnceLock;

use regex::Regex;

use crate::analysis::ContentKind;

/// Front matter block at the very start of a document, if any.
///
/// Returns `(front_matter_body, rest)`. A `---` opener without a closing
/// `---` line is not front matter.
pub fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    let Some(after_open) = trimmed
        .strip_prefix("---\n")
        .or_else(|| trimmed.strip_prefix("---\r\n"))
    else {
        return (None, content);
    };

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let front = &after_open[..offset];
            let rest = &after_open[offset + line.len()..];
            return (Some(front), rest);
        }
        offset += line.len();
    }
    (None, content)
}

/// Looks up `key: value` in a front matter body, unquoting the value.
pub fn front_matter_value(front_matter: &str, key: &str) -> Option<String> {
    front_matter.lines().find_map(|line| {
        let (k, v) = line.split_once(':')?;
        if !k.trim().eq_ignore_ascii_case(key) {
            return None;
        }
        let value = v.trim().trim_matches(|c: char| c == '"' || c == '\'').trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Prose with markup removed: front matter, tags, URLs, heading markers,
/// emphasis and inline-code markers.
pub fn plain_text(content: &str, kind: ContentKind) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    static URL: OnceLock<Regex> = OnceLock::new();
    static LINK: OnceLock<Regex> = OnceLock::new();
    static HEADING_MARK: OnceLock<Regex> = OnceLock::new();
    static LIST_MARK: OnceLock<Regex> = OnceLock::new();

    let tag = TAG.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"));
    let entity = ENTITY.get_or_init(|| Regex::new(r"&(?:[a-zA-Z]+|#\d+);").expect("static regex"));
    let url = URL.get_or_init(|| Regex::new(r"(?:https?://|www\.)\S+").expect("static regex"));
    let link = LINK.get_or_init(|| Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").expect("static regex"));
    let heading_mark =
        HEADING_MARK.get_or_init(|| Regex::new(r"(?m)^\s{0,3}#{1,6}\s*").expect("static regex"));
    let list_mark = LIST_MARK
        .get_or_init(|| Regex::new(r"(?m)^\s*(?:[-*+>]|\d+\.)\s+").expect("static regex"));

    let (_, body) = split_front_matter(content);

    let text = match kind {
        ContentKind::Html => entity.replace_all(&tag.replace_all(body, " "), " ").into_owned(),
        ContentKind::Markdown => {
            let text = link.replace_all(body, "$1");
            let text = tag.replace_all(&text, " ");
            let text = heading_mark.replace_all(&text, "");
            list_mark.replace_all(&text, "").into_owned()
        }
    };

    let text = url.replace_all(&text, " ");
    text.chars()
        .map(|c| match c {
            '*' | '`' | '~' | '|' => ' ',
            other => other,
        })
        .collect()
}

/// Lower-cased word tokens. Hyphens and apostrophes inside a word are kept
/// ("gore-tex", "don't"); any other non-alphanumeric character separates.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '\'' || c == '’'))
        .map(|t| t.trim_matches(|c: char| c == '-' || c == '\'' || c == '’'))
        .filter(|t| !t.is_empty())
        .map(|t| t.replace('’', "'"))
        .collect()
}

/// Non-overlapping whole-phrase occurrences of `phrase` in `tokens`.
///
/// Matching is token-aligned, so "cat" never matches inside "category" and a
/// phrase at the very start or end of the text counts once.
pub fn count_phrase(tokens: &[String], phrase: &str) -> usize {
    let needle = tokenize(phrase);
    if needle.is_empty() || needle.len() > tokens.len() {
        return 0;
    }

    let mut count = 0;
    let mut i = 0;
    while i + needle.len() <= tokens.len() {
        if tokens[i..i + needle.len()] == needle[..] {
            count += 1;
            i += needle.len();
        } else {
            i += 1;
        }
    }
    count
}

/// Occurrences per hundred words. Zero words gives 0.0.
pub fn density(count: usize, word_count: usize) -> f64 {
    if word_count == 0 {
        return 0.0;
    }
    count as f64 / word_count as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cat_is_not_counted_inside_longer_words() {
        let tokens = tokenize("category cat catalog cat");
        assert_eq!(count_phrase(&tokens, "cat"), 2);
    }

    #[test]
    fn test_phrase_at_text_boundaries() {
        let tokens = tokenize("hiking boots are great. Buy hiking boots");
        assert_eq!(count_phrase(&tokens, "hiking boots"), 2);
        assert_eq!(count_phrase(&tokens, "Hiking Boots"), 2);
    }

    #[test]
    fn test_phrase_matching_ignores_punctuation() {
        let tokens = tokenize("Waterproof, breathable; waterproof! (waterproof)");
        assert_eq!(count_phrase(&tokens, "waterproof"), 3);
    }

    #[test]
    fn test_hyphenated_terms_stay_whole() {
        let tokens = tokenize("Gore-Tex lining beats plain gore lining");
        assert_eq!(count_phrase(&tokens, "gore-tex"), 1);
        assert_eq!(count_phrase(&tokens, "gore"), 1);
    }

    #[test]
    fn test_count_phrase_is_non_overlapping() {
        let tokens = tokenize("go go go");
        assert_eq!(count_phrase(&tokens, "go go"), 1);
        assert_eq!(count_phrase(&tokens, ""), 0);
        assert_eq!(count_phrase(&[], "go"), 0);
    }

    #[test]
    fn test_density_zero_words() {
        assert_eq!(density(5, 0), 0.0);
        assert_eq!(density(0, 0), 0.0);
        assert!((density(3, 200) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_split_front_matter() {
        let doc = "---\ntitle: \"Best Boots\"\ndescription: Guide\n---\n# Heading\nBody";
        let (front, rest) = split_front_matter(doc);
        let front = front.unwrap();
        assert_eq!(front_matter_value(front, "title").as_deref(), Some("Best Boots"));
        assert_eq!(front_matter_value(front, "Description").as_deref(), Some("Guide"));
        assert_eq!(front_matter_value(front, "author"), None);
        assert_eq!(rest, "# Heading\nBody");
    }

    #[test]
    fn test_unterminated_front_matter_is_body() {
        let doc = "---\ntitle: x\n# Heading";
        assert_eq!(split_front_matter(doc), (None, doc));
    }

    #[test]
    fn test_plain_text_markdown() {
        let md = "---\ntitle: T\n---\n# Big **Title**\n- item [link text](https://x.com/a)\nSee https://example.com now `code`";
        let words = tokenize(&plain_text(md, ContentKind::Markdown));
        assert_eq!(
            words,
            vec!["big", "title", "item", "link", "text", "see", "now", "code"]
        );
    }

    #[test]
    fn test_plain_text_html() {
        let html = "<h1 class=\"x\">Boots &amp; Shoes</h1><p>Trail <b>ready</b></p>";
        let words = tokenize(&plain_text(html, ContentKind::Html));
        assert_eq!(words, vec!["boots", "shoes", "trail", "ready"]);
    }
}
