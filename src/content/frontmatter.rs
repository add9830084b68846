//! Front-matter parsing and validation

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_yaml::{Mapping, Value};

use super::error::{DocumentError, FieldIssue};
use crate::i18n::Locale;

/// Validated front-matter of a post
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub cover_image: Option<String>,
    pub published_at: DateTime<Utc>,
    pub locale: Locale,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

impl FrontMatter {
    /// Parse and validate the front-matter of a file
    /// Returns (front_matter, body)
    pub fn parse(content: &str) -> Result<(Self, &str), DocumentError> {
        let (yaml, body) = split(content).ok_or(DocumentError::MissingFrontMatter)?;

        let data = if yaml.trim().is_empty() {
            Mapping::new()
        } else {
            match serde_yaml::from_str::<Value>(yaml)? {
                Value::Mapping(map) => map,
                Value::Null => Mapping::new(),
                _ => {
                    return Err(DocumentError::Invalid(vec![FieldIssue::new(
                        "(root)",
                        "Expected a mapping",
                    )]))
                }
            }
        };

        let fm = validate(&data)?;
        Ok((fm, body))
    }
}

/// Split a file into its YAML block and the body that follows
///
/// The block must open on the first line with `---` and close with a line
/// that is exactly `---`.
pub fn split(content: &str) -> Option<(&str, &str)> {
    let content = content.trim_start_matches('\u{feff}');
    let first_line_end = content.find('\n').unwrap_or(content.len());
    if content[..first_line_end].trim_end() != "---" {
        return None;
    }

    let rest = content.get(first_line_end + 1..).unwrap_or("");
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }

    None
}

/// Check a raw front-matter mapping against the post schema
///
/// Every field problem is collected so one warning describes the whole file.
/// An unparsable `publishedAt` is reported separately once the schema passes.
pub fn validate(data: &Mapping) -> Result<FrontMatter, DocumentError> {
    let mut issues = Vec::new();

    let title = required_string(data, "title", &mut issues);
    let slug = required_string(data, "slug", &mut issues);
    let excerpt = optional_string(data, "excerpt", &mut issues).unwrap_or_default();
    let cover_image = optional_string(data, "coverImage", &mut issues);
    let published_at = required_string(data, "publishedAt", &mut issues);
    let locale = required_string(data, "locale", &mut issues).and_then(|code| {
        match code.parse::<Locale>() {
            Ok(locale) => Some(locale),
            Err(_) => {
                issues.push(FieldIssue::new("locale", "Unsupported locale"));
                None
            }
        }
    });
    let tags = string_list(data, "tags", &mut issues);
    let categories = string_list(data, "categories", &mut issues);

    if !issues.is_empty() {
        return Err(DocumentError::Invalid(issues));
    }

    // All required fields are present once `issues` is empty
    let (Some(title), Some(slug), Some(published_at), Some(locale)) =
        (title, slug, published_at, locale)
    else {
        return Err(DocumentError::Invalid(issues));
    };

    let published_at =
        parse_date(&published_at).ok_or(DocumentError::InvalidDate(published_at))?;

    Ok(FrontMatter {
        title,
        slug,
        excerpt,
        cover_image,
        published_at,
        locale,
        tags,
        categories,
    })
}

fn required_string(
    data: &Mapping,
    field: &'static str,
    issues: &mut Vec<FieldIssue>,
) -> Option<String> {
    match data.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        None | Some(Value::Null) => {
            issues.push(FieldIssue::new(field, "Required"));
            None
        }
        Some(other) => {
            issues.push(FieldIssue::new(
                field,
                format!("Expected string, received {}", type_name(other)),
            ));
            None
        }
    }
}

fn optional_string(
    data: &Mapping,
    field: &'static str,
    issues: &mut Vec<FieldIssue>,
) -> Option<String> {
    match data.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        None | Some(Value::Null) => None,
        Some(other) => {
            issues.push(FieldIssue::new(
                field,
                format!("Expected string, received {}", type_name(other)),
            ));
            None
        }
    }
}

fn string_list(data: &Mapping, field: &'static str, issues: &mut Vec<FieldIssue>) -> Vec<String> {
    match data.get(field) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(items)) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => values.push(s.clone()),
                    other => {
                        issues.push(FieldIssue::new(
                            field,
                            format!("Expected string item, received {}", type_name(other)),
                        ));
                        return Vec::new();
                    }
                }
            }
            values
        }
        Some(other) => {
            issues.push(FieldIssue::new(
                field,
                format!("Expected array, received {}", type_name(other)),
            ));
            Vec::new()
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "array",
        Value::Mapping(_) => "object",
        Value::Tagged(_) => "tagged value",
    }
}

/// Parse a date string in various formats
///
/// Values without an offset are taken as UTC.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    const VALID: &str = r#"---
title: Hello World
slug: hello-world
excerpt: A first post
publishedAt: 2024-01-15
locale: zh
tags:
  - rust
  - intro
categories:
  - programming
---

This is the content.
"#;

    #[test]
    fn test_parse_valid_frontmatter() {
        let (fm, body) = FrontMatter::parse(VALID).unwrap();
        assert_eq!(fm.title, "Hello World");
        assert_eq!(fm.slug, "hello-world");
        assert_eq!(fm.excerpt, "A first post");
        assert_eq!(fm.locale, Locale::Zh);
        assert_eq!(fm.tags, vec!["rust", "intro"]);
        assert_eq!(fm.categories, vec!["programming"]);
        assert_eq!(fm.cover_image, None);
        assert_eq!(fm.published_at.year(), 2024);
        assert!(body.contains("This is the content."));
        assert!(!body.contains("---"));
    }

    #[test]
    fn test_optional_fields_default() {
        let content = "---\ntitle: T\nslug: t\npublishedAt: '2024-03-01'\nlocale: en\n---\nBody";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.excerpt, "");
        assert!(fm.tags.is_empty());
        assert!(fm.categories.is_empty());
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_missing_required_fields_are_all_reported() {
        let content = "---\nexcerpt: nothing else\n---\nBody";
        let err = FrontMatter::parse(content).unwrap_err();
        match err {
            DocumentError::Invalid(issues) => {
                let fields: Vec<_> = issues.iter().map(|i| i.field).collect();
                assert_eq!(fields, vec!["title", "slug", "publishedAt", "locale"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unsupported_locale() {
        let content = "---\ntitle: T\nslug: t\npublishedAt: 2024-01-01\nlocale: fr\n---\n";
        let err = FrontMatter::parse(content).unwrap_err();
        assert!(err.to_string().contains("locale: Unsupported locale"));
    }

    #[test]
    fn test_wrong_types_rejected() {
        let content = "---\ntitle: 42\nslug: t\npublishedAt: 2024-01-01\nlocale: en\ntags: rust\n---\n";
        let err = FrontMatter::parse(content).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("title: Expected string, received number"));
        assert!(message.contains("tags: Expected array, received string"));
    }

    #[test]
    fn test_invalid_date() {
        let content = "---\ntitle: T\nslug: t\npublishedAt: not a date\nlocale: en\n---\n";
        assert!(matches!(
            FrontMatter::parse(content),
            Err(DocumentError::InvalidDate(s)) if s == "not a date"
        ));
    }

    #[test]
    fn test_missing_block() {
        assert!(matches!(
            FrontMatter::parse("# Just markdown\n"),
            Err(DocumentError::MissingFrontMatter)
        ));
        // Unterminated block
        assert!(matches!(
            FrontMatter::parse("---\ntitle: T\n"),
            Err(DocumentError::MissingFrontMatter)
        ));
    }

    #[test]
    fn test_split_keeps_thematic_breaks_in_body() {
        let content = "---\ntitle: T\n---\nIntro\n\n---\n\nMore";
        let (yaml, body) = split(content).unwrap();
        assert_eq!(yaml, "title: T\n");
        assert_eq!(body, "Intro\n\n---\n\nMore");
    }

    #[test]
    fn test_parse_date_formats() {
        let d = parse_date("2024-01-15").unwrap();
        assert_eq!(d.to_rfc3339(), "2024-01-15T00:00:00+00:00");

        let d = parse_date("2024-01-15 10:30:00").unwrap();
        assert_eq!(d.format("%H:%M").to_string(), "10:30");

        let d = parse_date("2024-01-15T10:30:00+08:00").unwrap();
        assert_eq!(d.format("%H:%M").to_string(), "02:30");

        assert!(parse_date("2024-13-45").is_none());
        assert!(parse_date("").is_none());
    }
}
