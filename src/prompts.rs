use crate::processors::signal::truncate_chars;

const NO_DESCRIPTION: &str = "No description provided";
const NO_README: &str = "No README provided";
const NO_TREE: &str = "No file tree provided";
const NO_FILES: &str = "No code files provided";

/// Characters of README kept by the one-sentence prompt
pub const QUICK_README_CHARS: usize = 2_000;
/// Characters of README kept by the bullet-point prompt
pub const SIMPLE_README_CHARS: usize = 4_000;
/// Characters of tree outline kept by the bullet-point prompt
pub const SIMPLE_TREE_CHARS: usize = 1_500;

/// Default explanation; fills `{name}`, `{description}`, `{readme}`, `{tree}` and `{files}`
pub const EXPLAIN_PROMPT: &str = r#"
You are a senior software engineer.

Your task is to explain a GitHub repository clearly and concisely for a human reader.

Repository:
- Name: {name}
- Description: {description}

README content:
{readme}

Repository structure:
{tree}

Key files (snippets):
{files}

Instructions:
- Explain what this project does.
- Say who it is for.
- Explain how to run or use it.
- Do not assume missing details.
- If something is unclear, say so.
- Avoid hype or marketing language.
- Be concise and practical.
- Use clear markdown headings.
"#;

/// Appended to [`EXPLAIN_PROMPT`] by `--detailed`
pub const DETAILED_INSTRUCTIONS: &str = r#"
Additional instructions:
- Explain the high-level architecture.
- Describe the folder structure.
- Mention important files and their roles.
"#;

/// Heading layout requested from every explanation
pub const OUTPUT_FORMAT: &str = r#"
Output format:
# Overview
# What this project does
# Who it is for
# How to run or use it
# Notes or limitations
"#;

/// One-sentence definition used by `--quick`
pub const QUICK_PROMPT: &str = r#"
You are a senior software engineer.

Write a ONE-SENTENCE plain-English definition of what this GitHub repository is.

Repository:
- Name: {name}
- Description: {description}

README snippet:
{readme}

Rules:
- Output MUST be exactly 1 sentence.
- Plain English.
- No markdown.
- No quotes.
- No bullet points.
- No extra text.
- Do not add features not stated in the description/README.
"#;

/// Short bullet summary used by `--simple`
pub const SIMPLE_PROMPT: &str = r#"
You are a senior software engineer.

Summarize this GitHub repository in a concise bullet-point format.

Repository:
- Name: {name}
- Description: {description}

README content:
{readme}

Repo structure:
{tree}

Output style rules:
- Plain English.
- No markdown.
- Do NOT use headings like "Overview", "What this project does", etc.
- Start with exactly this line:
Key points from the repo:
- Then output 4 to 7 bullets only.
- Each bullet MUST start with: ⬤
- Each bullet title should be 1-3 words only (example: "Purpose", "Stack", "Entrypoints", "How it works", "Usage", "Structure").
- Each bullet body should be 1-2 lines max.
- Base bullets strictly on the provided README and structure.
- Do NOT invent features, architecture, or details not present in the input.
- Optional: end with one extra line starting with:
Also interesting:
- No quotes.

Make it feel like a human developer explaining to another developer in simple terms.
"#;

fn or_sentinel<'a>(value: Option<&'a str>, sentinel: &'a str) -> &'a str {
    match value {
        Some(text) if !text.trim().is_empty() => text,
        _ => sentinel,
    }
}

/// Substitutes `{key}` placeholders in one pass, so inserted text is never re-expanded
fn fill(template: &str, fields: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let field = after.find('}').and_then(|end| {
            fields
                .iter()
                .find(|(key, _)| *key == &after[..end])
                .map(|(_, value)| (end, *value))
        });
        match field {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Full explanation prompt; `detailed` adds architecture and folder-structure instructions
pub fn build_prompt(
    name: &str,
    description: Option<&str>,
    readme: Option<&str>,
    detailed: bool,
    tree_text: Option<&str>,
    files_text: Option<&str>,
) -> String {
    let mut prompt = fill(
        EXPLAIN_PROMPT.trim(),
        &[
            ("name", name),
            ("description", or_sentinel(description, NO_DESCRIPTION)),
            ("tree", or_sentinel(tree_text, NO_TREE)),
            ("files", or_sentinel(files_text, NO_FILES)),
            ("readme", or_sentinel(readme, NO_README)),
        ],
    );
    if detailed {
        prompt.push('\n');
        prompt.push_str(DETAILED_INSTRUCTIONS);
    }
    prompt.push_str(OUTPUT_FORMAT);
    prompt.trim().to_string()
}

/// One-sentence definition prompt
pub fn build_quick_prompt(name: &str, description: Option<&str>, readme: Option<&str>) -> String {
    let readme = truncate_chars(or_sentinel(readme, NO_README), QUICK_README_CHARS);
    fill(
        QUICK_PROMPT.trim(),
        &[
            ("name", name),
            ("description", or_sentinel(description, NO_DESCRIPTION)),
            ("readme", readme.as_str()),
        ],
    )
}

/// Bullet-point summary prompt
pub fn build_simple_prompt(
    name: &str,
    description: Option<&str>,
    readme: Option<&str>,
    tree_text: Option<&str>,
) -> String {
    let readme = truncate_chars(or_sentinel(readme, NO_README), SIMPLE_README_CHARS);
    let tree = truncate_chars(or_sentinel(tree_text, NO_TREE), SIMPLE_TREE_CHARS);
    fill(
        SIMPLE_PROMPT.trim(),
        &[
            ("name", name),
            ("description", or_sentinel(description, NO_DESCRIPTION)),
            ("tree", tree.as_str()),
            ("readme", readme.as_str()),
        ],
    )
}
