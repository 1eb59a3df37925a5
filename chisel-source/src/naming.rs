//! Canonical type names for content types.
//!
//! Raw model names coming from the backend (`blog_post`, `Author`, ...) are
//! joined with a site-wide prefix into a single PascalCase identifier that
//! the graph store uses as its collection name.

use std::collections::HashMap;

use convert_case::{Boundary, Case, Casing};

use crate::error::SchemaLoadError;
use crate::schema::Schema;

/// Join `prefix` and `raw_name` into one PascalCase type name.
///
/// Word boundaries inside either part (underscores, hyphens, spaces, case
/// changes) are respected: `("Site", "blog_post")` becomes `SiteBlogPost`.
/// A digit next to a lowercase letter does not start a new word, so
/// `2d_map` becomes `2dMap` and `post2` stays `Post2`.
pub fn canonicalize(prefix: &str, raw_name: &str) -> String {
    format!("{} {}", prefix, raw_name)
        .remove_boundaries(&[Boundary::LowerDigit, Boundary::DigitLower])
        .to_case(Case::Pascal)
}

/// Reverse lookup: the type name of the content type stored in `table_id`.
///
/// Returns `None` when no registered content type owns the table.
pub fn type_name_for_source_table<'a>(schema: &'a Schema, table_id: &str) -> Option<&'a str> {
    schema
        .content_type_for_table(table_id)
        .map(|content_type| content_type.type_name.as_str())
}

/// Hands out canonical type names and remembers which raw name claimed each.
///
/// Two different raw names that canonicalize to the same type name would
/// make their collections indistinguishable in the store, so the second
/// claim is reported as a collision.
#[derive(Debug, Clone)]
pub struct TypeNameRegistry {
    prefix: String,
    claimed: HashMap<String, String>,
}

impl TypeNameRegistry {
    /// Create an empty registry for the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            claimed: HashMap::new(),
        }
    }

    /// Canonicalize `raw_name` and claim the result.
    pub fn claim(&mut self, raw_name: &str) -> Result<String, SchemaLoadError> {
        let type_name = canonicalize(&self.prefix, raw_name);

        if let Some(existing) = self.claimed.get(&type_name) {
            return Err(SchemaLoadError::TypeNameCollision {
                type_name,
                first: existing.clone(),
                second: raw_name.to_string(),
            });
        }

        self.claimed.insert(type_name.clone(), raw_name.to_string());
        Ok(type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ContentType, FieldDefinition, FieldType};

    #[test]
    fn test_canonicalize_joins_words() {
        assert_eq!(canonicalize("Site", "blog_post"), "SiteBlogPost");
        assert_eq!(canonicalize("Chisel", "Post"), "ChiselPost");
        assert_eq!(canonicalize("Chisel", "MediaItem"), "ChiselMediaItem");
        assert_eq!(canonicalize("chisel", "news-article"), "ChiselNewsArticle");
    }

    #[test]
    fn test_canonicalize_keeps_digits_in_words() {
        assert_eq!(canonicalize("Chisel", "2d_map"), "Chisel2dMap");
        assert_eq!(canonicalize("Chisel", "post2"), "ChiselPost2");
        assert_eq!(canonicalize("Chisel", "v2Item"), "ChiselV2Item");
        assert_eq!(canonicalize("Chisel", "html_page"), "ChiselHtmlPage");
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let first = canonicalize("Site", "blog_post");
        let second = canonicalize("Site", "blog_post");
        assert_eq!(first, second);
    }

    #[test]
    fn test_registry_reports_collision() {
        let mut registry = TypeNameRegistry::new("Site");

        let name = registry.claim("blog_post").unwrap();
        assert_eq!(name, "SiteBlogPost");

        let err = registry.claim("BlogPost").unwrap_err();
        match err {
            SchemaLoadError::TypeNameCollision {
                type_name,
                first,
                second,
            } => {
                assert_eq!(type_name, "SiteBlogPost");
                assert_eq!(first, "blog_post");
                assert_eq!(second, "BlogPost");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_type_name_for_source_table() {
        let author = ContentType::new(
            "m1",
            "Author",
            "SiteAuthor",
            "t_author",
            vec![FieldDefinition::new("name", "Name", FieldType::Scalar)],
        );
        let schema = Schema::new("Site", vec![author]).unwrap();

        assert_eq!(type_name_for_source_table(&schema, "t_author"), Some("SiteAuthor"));
        assert_eq!(type_name_for_source_table(&schema, "t_unknown"), None);
    }
}
