//! Resource address templates such as `project://file/{file_path}`.
//!
//! Templates and addresses are compared segment by segment on `/`. A
//! placeholder fills a whole segment and captures exactly one non-empty
//! address segment, percent-decoded.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

use crate::error::{McpError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed resource address template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    /// Parse a template, rejecting malformed placeholders.
    pub fn parse(template: &str) -> Result<Self> {
        let invalid = |reason: &str| McpError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut names: Vec<&str> = Vec::new();
        for part in template.split('/') {
            if let Some(name) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                if name.is_empty() || name.contains(['{', '}']) {
                    return Err(invalid("placeholder names must be non-empty and brace-free"));
                }
                if names.contains(&name) {
                    return Err(invalid(&format!("placeholder '{}' appears twice", name)));
                }
                names.push(name);
                segments.push(Segment::Placeholder(name.to_string()));
            } else if part.contains(['{', '}']) {
                return Err(invalid("a placeholder must fill a whole segment"));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in order.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Whether the template has no placeholders, i.e. names a single resource.
    pub fn is_concrete(&self) -> bool {
        self.placeholders().next().is_none()
    }

    /// Match `address`, returning the decoded placeholder captures.
    pub fn matches(&self, address: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = address.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut captures = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Placeholder(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    let decoded = percent_decode_str(part).decode_utf8().ok()?;
                    captures.insert(name.clone(), decoded.into_owned());
                }
            }
        }
        Some(captures)
    }

    /// Whether some address could match both templates.
    pub fn overlaps(&self, other: &UriTemplate) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Placeholder(_), Segment::Placeholder(_)) => true,
                    (Segment::Placeholder(_), Segment::Literal(lit))
                    | (Segment::Literal(lit), Segment::Placeholder(_)) => !lit.is_empty(),
                })
    }
}

impl std::fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_decoded_capture() {
        let template = UriTemplate::parse("project://file/{file_path}").unwrap();
        let captures = template.matches("project://file/notes%2Fa.txt").unwrap();
        assert_eq!(captures["file_path"], "notes/a.txt");
    }

    #[test]
    fn test_segment_count_mismatch() {
        let template = UriTemplate::parse("a/b/{x}").unwrap();
        assert!(template.matches("a/b/c/d").is_none());
        assert!(template.matches("a/b").is_none());
        assert_eq!(template.matches("a/b/c").unwrap()["x"], "c");
    }

    #[test]
    fn test_literal_must_match_exactly() {
        let template = UriTemplate::parse("notes://schema").unwrap();
        assert!(template.is_concrete());
        assert!(template.matches("notes://schema").is_some());
        assert!(template.matches("notes://Schema").is_none());
        assert!(template.matches("notes://schema/").is_none());
    }

    #[test]
    fn test_empty_segment_does_not_capture() {
        let template = UriTemplate::parse("project://file/{file_path}").unwrap();
        assert!(template.matches("project://file/").is_none());
    }

    #[test]
    fn test_invalid_utf8_does_not_match() {
        let template = UriTemplate::parse("x/{y}").unwrap();
        assert!(template.matches("x/%FF").is_none());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(UriTemplate::parse("a/{}").is_err());
        assert!(UriTemplate::parse("a/pre{x}").is_err());
        assert!(UriTemplate::parse("a/{x}/{x}").is_err());
        assert!(UriTemplate::parse("a/{x").is_err());
    }

    #[test]
    fn test_placeholders() {
        let template = UriTemplate::parse("db://{table}/rows/{id}").unwrap();
        let names: Vec<&str> = template.placeholders().collect();
        assert_eq!(names, vec!["table", "id"]);
        assert!(!template.is_concrete());
    }

    #[test]
    fn test_overlaps() {
        let file = UriTemplate::parse("project://file/{file_path}").unwrap();
        let readme = UriTemplate::parse("project://file/README").unwrap();
        let dir = UriTemplate::parse("project://dir/{path}").unwrap();
        let deeper = UriTemplate::parse("project://file/{a}/{b}").unwrap();

        assert!(file.overlaps(&readme));
        assert!(readme.overlaps(&file));
        assert!(!file.overlaps(&dir));
        assert!(!file.overlaps(&deeper));
        assert!(file.overlaps(&file.clone()));
    }
}
