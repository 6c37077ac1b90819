//! Route template compilation.
//!
//! A template such as `/admin/categories/{id:[0-9]+}` is compiled into one anchored
//! regular expression. Each `{name}` becomes a named capture group matching one path
//! segment (`[^/]+`); `{name:constraint}` uses the given sub-pattern instead. Literal
//! text is escaped, so only the tokens carry regex meaning.

use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

/// Sub-pattern for parameters declared without a constraint: one non-empty segment.
pub const DEFAULT_CONSTRAINT: &str = "[^/]+";

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("unclosed `{{` in route template `{0}`")]
    UnclosedBrace(String),

    #[error("invalid parameter name `{name}` in route template `{template}`")]
    InvalidParamName { template: String, name: String },

    #[error("parameter `{name}` declared twice in route template `{template}`")]
    DuplicateParam { template: String, name: String },

    #[error("route template `{template}` does not compile: {source}")]
    Regex {
        template: String,
        #[source]
        source: regex::Error,
    },
}

/// normalize_path
///
/// Strips trailing slashes. The root path stays `/`, and an empty path becomes `/`.
pub fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// RoutePattern
///
/// A compiled route template: exactly one anchored matcher plus the declared
/// parameter names in order of appearance.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    template: String,
    regex: Regex,
    params: Vec<String>,
}

impl RoutePattern {
    /// compile
    ///
    /// Compiles a template into a full-path matcher. The template itself is normalized
    /// first, so `/admin/login/` and `/admin/login` compile identically.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let normalized = normalize_path(template);

        if normalized == "/" {
            return Ok(Self {
                template: normalized.to_string(),
                regex: build_regex(normalized, "^/$")?,
                params: Vec::new(),
            });
        }

        let mut source = String::from("^");
        let mut params: Vec<String> = Vec::new();
        let mut cursor = 0;

        while let Some(offset) = normalized[cursor..].find('{') {
            let open = cursor + offset;
            source.push_str(&regex::escape(&normalized[cursor..open]));

            let close = closing_brace(normalized, open)
                .ok_or_else(|| PatternError::UnclosedBrace(normalized.to_string()))?;
            let token = &normalized[open + 1..close];

            let (name, constraint) = match token.split_once(':') {
                Some((name, constraint)) if !constraint.is_empty() => (name, constraint),
                Some((name, _)) => (name, DEFAULT_CONSTRAINT),
                None => (token, DEFAULT_CONSTRAINT),
            };

            if !is_valid_name(name) {
                return Err(PatternError::InvalidParamName {
                    template: normalized.to_string(),
                    name: name.to_string(),
                });
            }
            if params.iter().any(|existing| existing == name) {
                return Err(PatternError::DuplicateParam {
                    template: normalized.to_string(),
                    name: name.to_string(),
                });
            }

            source.push_str(&format!("(?P<{name}>{constraint})"));
            params.push(name.to_string());
            cursor = close + 1;
        }

        source.push_str(&regex::escape(&normalized[cursor..]));
        source.push('$');

        Ok(Self {
            template: normalized.to_string(),
            regex: build_regex(normalized, &source)?,
            params,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn param_names(&self) -> &[String] {
        &self.params
    }

    /// True when the whole (normalized) path matches.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(normalize_path(path))
    }

    /// extract_params
    ///
    /// Re-runs the match and returns the named captures only; unnamed groups inside
    /// constraints are dropped. `None` when the path does not match.
    pub fn extract_params(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(normalize_path(path))?;

        Some(
            self.params
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|value| (name.clone(), value.as_str().to_string()))
                })
                .collect(),
        )
    }
}

fn build_regex(template: &str, source: &str) -> Result<Regex, PatternError> {
    Regex::new(source).map_err(|source| PatternError::Regex {
        template: template.to_string(),
        source,
    })
}

// Finds the `}` closing the token opened at `open`, allowing balanced braces inside
// constraints (`{year:[0-9]{4}}`) and backslash escapes.
fn closing_brace(template: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;

    for (index, byte) in template.bytes().enumerate().skip(open + 1) {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' => escaped = true,
            b'{' => depth += 1,
            b'}' if depth == 0 => return Some(index),
            b'}' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
