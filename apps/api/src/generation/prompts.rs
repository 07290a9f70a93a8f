// All LLM prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for single-pass article generation.
pub const ARTICLE_SYSTEM: &str = "You are an SEO and content writing expert. \
    Write a complete, SEO-optimized, user-friendly page that satisfies every \
    requirement you are given. Follow the steps in the order they are listed. \
    Respond with the Markdown document only.";

/// Article prompt template.
/// Replace: {requirements}, {variations}, {lsi}, {entities}, {headings},
///          {location}, {word_count}, {title_length}, {description_length}
pub const ARTICLE_PROMPT_TEMPLATE: &str = r#"<requirements>
{requirements}
</requirements>

<variations>
{variations}
</variations>

<lsi>
{lsi}
</lsi>

<entities>
{entities}
</entities>

<headings>
{headings}
</headings>
{location}
<step 1>
Settle the title tag, meta description and heading tags before writing any content.
1. Title: at least one instance of the primary keyword, at most {title_length} characters.
2. Meta description: close to {description_length} characters.
3. No redundancy: every section adds new information or a new angle; link ideas with transitions.
4. Add an FAQ when the topic has common questions. The FAQ section is an H2 and each question is an H3.
5. Merge variations into a single heading where it reads naturally and the heading quotas allow it.
</step 1>

<step 2>
1. Plan the page as a strict heading hierarchy (# > ## > ###).
2. Check the plan against the heading quotas, the title and the description requirements.
</step 2>

<step 3>
1. Integrate every variation, LSI keyword and entity naturally, meeting the listed minimums.
2. Sections under ## headings carry at least 75 words; sections under ### headings at least 15.
3. Lead each section with its most valuable information.
4. Prefer scannable formatting: bullet lists, numbered steps and tables.
5. FAQ answers open with a direct answer of about 15 words.
6. Use Markdown: # for the H1, ## for H2, ### for H3, #### and below for deeper levels, **bold**, *italic*, lists, [text](url) links and pipe tables.
7. Do not use em dashes.
8. Aim for about {word_count} words; go slightly over if needed to meet every requirement.
</step 3>

<final step>
1. Confirm every entity and LSI keyword appears, and that the content flows without repetition.
2. Confirm the heading hierarchy is never skipped.
3. Start the document with front matter:
---
title: "Your Title Here"
description: "Your meta description here"
---
</final step>"#;

/// System prompt for the outline phase of two-phase generation.
pub const OUTLINE_SYSTEM: &str = "You are an SEO strategist. You plan page \
    metadata and heading structures that satisfy SEO requirements exactly. \
    Reply with the three labelled sections requested and nothing else.";

/// Outline prompt template.
/// Replace: {primary_keyword}, {requirements}, {variations}, {lsi}, {entities},
///          {headings}, {location}, {title_length}, {description_length}
pub const OUTLINE_PROMPT_TEMPLATE: &str = r#"Plan a page targeting "{primary_keyword}".

<requirements>
{requirements}
</requirements>

<variations>
{variations}
</variations>

<lsi>
{lsi}
</lsi>

<entities>
{entities}
</entities>

<headings>
{headings}
</headings>
{location}
Reply in exactly this format:

META TITLE: <title with the primary keyword, at most {title_length} characters>
META DESCRIPTION: <description of about {description_length} characters>
HEADING STRUCTURE:
# <H1>
## <H2>
### <H3>
..."#;

/// System prompt for the body phase of two-phase generation.
pub const BODY_SYSTEM: &str = ARTICLE_SYSTEM;

/// Body prompt template. Embeds the accepted outline.
/// Replace: {meta_title}, {meta_description}, {outline}, {variations}, {lsi},
///          {entities}, {word_count}
pub const BODY_PROMPT_TEMPLATE: &str = r#"Write the full page for this approved plan. Keep every heading exactly as given, in the same order and at the same level.

Title: {meta_title}
Description: {meta_description}

<outline>
{outline}
</outline>

<variations>
{variations}
</variations>

<lsi>
{lsi}
</lsi>

<entities>
{entities}
</entities>

Rules:
1. Integrate every variation, LSI keyword and entity naturally, meeting the listed minimums.
2. Sections under ## headings carry at least 75 words; sections under ### headings at least 15.
3. Use Markdown formatting and do not use em dashes.
4. Aim for about {word_count} words.
5. Start the document with front matter holding the title and description above:
---
title: "..."
description: "..."
---"#;

/// System prompt for Markdown → HTML conversion.
pub const HTML_SYSTEM: &str = "You are a web developer who converts Markdown \
    into clean, semantic HTML5. Keep the heading hierarchy intact, use \
    semantic elements (article, section, lists), indent for readability, and \
    add no CSS or JavaScript. Return only the HTML.";

/// HTML conversion prompt template. Replace: {markdown}
pub const HTML_PROMPT_TEMPLATE: &str = r#"Convert this Markdown document to HTML5:

{markdown}

Return ONLY the HTML code."#;

/// System prompt for the LLM validation pass.
pub const VALIDATION_SYSTEM: &str = "You are a content validation expert who \
    checks Markdown pages for SEO compliance.";

/// Validation prompt template.
/// Replace: {content}, {lsi}, {entities}, {headings}
pub const VALIDATION_PROMPT_TEMPLATE: &str = r#"Check whether this content meets its SEO requirements.

CONTENT:
```markdown
{content}
```

CHECKS:
1. Front matter contains a title and a description.
2. These LSI keywords appear at least the stated number of times: {lsi}
3. These entities appear at least once: {entities}
4. Heading hierarchy is well formed (# > ## > ###). Required quotas: {headings}

Return JSON in exactly this shape:
{
  "passes_validation": true,
  "issues": [
    {"type": "keyword_frequency", "keyword": "keyword", "required": 5, "found": 2, "fix": "how to fix it"}
  ],
  "summary": "one or two sentence assessment"
}"#;
