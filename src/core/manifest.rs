//! Manifest parsing.
//!
//! Extracts a display name and a short description from a `SKILL.md`-style
//! manifest. A leading `---` block is read as YAML front matter; when YAML
//! parsing fails the block is scanned line by line so a sloppy header still
//! yields its `description:`.

use std::path::Path;

use serde_yaml::Value;

/// Longest description extracted from body text before truncation.
pub const MAX_DESCRIPTION_CHARS: usize = 100;

const DELIMITER: &str = "---";
const ELLIPSIS: &str = "...";

/// Fields pulled out of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestInfo {
    /// `name:` from the front matter, if any.
    pub name: Option<String>,
    /// Front matter `description:`, else the first content line of the body.
    pub description: Option<String>,
}

/// Parse manifest text. Never fails.
#[must_use]
pub fn parse(text: &str) -> ManifestInfo {
    let (front, body) = split_front_matter(text);

    let mut info = front.map(parse_front_matter).unwrap_or_default();
    if info.description.is_none() {
        info.description = first_content_line(body).map(truncate_description);
    }
    info
}

/// Parse a manifest file. An unreadable file yields empty info.
#[must_use]
pub fn parse_file(path: &Path) -> ManifestInfo {
    match std::fs::read(path) {
        Ok(bytes) => parse(&String::from_utf8_lossy(&bytes)),
        Err(err) => {
            tracing::debug!("manifest unreadable {}: {err}", path.display());
            ManifestInfo::default()
        }
    }
}

/// Split into (front matter block, body). Without a closing delimiter the
/// whole text is body.
fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return (None, text);
    };
    if first.trim_end() != DELIMITER {
        return (None, text);
    }

    let block_start = first.len();
    let mut offset = block_start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            let block = &text[block_start..offset];
            let body = &text[offset + line.len()..];
            return (Some(block), body);
        }
        offset += line.len();
    }
    (None, text)
}

fn parse_front_matter(block: &str) -> ManifestInfo {
    if let Ok(Value::Mapping(map)) = serde_yaml::from_str::<Value>(block) {
        let field = |key: &str| {
            map.get(key)
                .and_then(scalar_to_string)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        return ManifestInfo {
            name: field("name"),
            description: field("description"),
        };
    }

    let mut info = ManifestInfo::default();
    for line in block.lines() {
        if let Some(value) = line.strip_prefix("description:") {
            info.description = unquote(value);
        } else if let Some(value) = line.strip_prefix("name:") {
            info.name = unquote(value);
        }
    }
    info
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn unquote(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(trimmed)
        .trim();
    (!inner.is_empty()).then(|| inner.to_string())
}

fn first_content_line(body: &str) -> Option<&str> {
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && *line != DELIMITER && !line.starts_with('#'))
}

fn truncate_description(line: &str) -> String {
    if line.chars().count() <= MAX_DESCRIPTION_CHARS {
        return line.to_string();
    }
    let cut: String = line.chars().take(MAX_DESCRIPTION_CHARS).collect();
    format!("{}{ELLIPSIS}", cut.trim_end())
}
