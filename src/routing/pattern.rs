//! Route pattern parsing and path matching.
//!
//! # Responsibilities
//! - Parse slash-delimited patterns into literal and parameter segments
//! - Recognise collection patterns (trailing `/`) and named wildcards (`*name`)
//! - Classify each pattern by specificity
//! - Match request paths, binding parameters
//!
//! # Design Decisions
//! - `/blobs/` and `/blobs` are different patterns and match different paths
//! - A collection pattern needs its trailing slash on the request path too;
//!   everything after it is the remainder
//! - Parameters never bind an empty segment
//! - Matching walks the path in place; only bound params allocate

use std::fmt;

use crate::routing::error::RouteError;
use crate::routing::params::Params;

/// Marks a parameter segment (`/blobs/:sha`).
pub const PARAM_MARKER: char = ':';

/// Marks a named trailing wildcard (`/files/*rest`).
pub const WILDCARD_MARKER: char = '*';

/// One fixed-position segment of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path segment exactly (case-sensitive).
    Literal(String),
    /// Binds one non-empty path segment.
    Param(String),
}

/// How specific a pattern is. Larger wins.
///
/// Variant order is the precedence order, so the derived `Ord` is the
/// dispatch rule: exact beats parameterized beats wildcard, and among
/// wildcards the one with the longer prefix wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Specificity {
    Wildcard { depth: usize },
    Parameterized,
    Exact,
}

impl Specificity {
    pub fn is_wildcard(self) -> bool {
        matches!(self, Specificity::Wildcard { .. })
    }
}

/// Trailing wildcard. `name` is `None` for plain collection patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Wildcard {
    name: Option<String>,
}

/// A parsed, immutable route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
    wildcard: Option<Wildcard>,
}

impl Pattern {
    /// Parse a pattern such as `/config`, `/blobs/`, `/blobs/:sha` or
    /// `/files/*rest`.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        if raw.is_empty() {
            return Err(RouteError::EmptyPattern);
        }
        let body = raw
            .strip_prefix('/')
            .ok_or_else(|| RouteError::MissingLeadingSlash(raw.to_owned()))?;

        let collection = raw.ends_with('/');
        let body = if collection {
            match body.strip_suffix('/') {
                // "//" and friends: an empty segment before the slash
                Some("") => return Err(RouteError::EmptySegment(raw.to_owned())),
                Some(inner) => inner,
                None => body,
            }
        } else {
            body
        };

        let mut segments = Vec::new();
        let mut wildcard = collection.then_some(Wildcard { name: None });

        if !body.is_empty() {
            let parts: Vec<&str> = body.split('/').collect();
            let last = parts.len() - 1;

            for (index, part) in parts.into_iter().enumerate() {
                if part.is_empty() {
                    return Err(RouteError::EmptySegment(raw.to_owned()));
                }

                if let Some(name) = part.strip_prefix(PARAM_MARKER) {
                    if name.is_empty() {
                        return Err(RouteError::UnnamedParam(raw.to_owned()));
                    }
                    ensure_unique(raw, name, &segments)?;
                    segments.push(Segment::Param(name.to_owned()));
                } else if let Some(name) = part.strip_prefix(WILDCARD_MARKER) {
                    if index != last || collection {
                        return Err(RouteError::MisplacedWildcard(raw.to_owned()));
                    }
                    if !name.is_empty() {
                        ensure_unique(raw, name, &segments)?;
                    }
                    wildcard = Some(Wildcard {
                        name: (!name.is_empty()).then(|| name.to_owned()),
                    });
                } else {
                    segments.push(Segment::Literal(part.to_owned()));
                }
            }
        }

        Ok(Self {
            raw: raw.to_owned(),
            segments,
            wildcard,
        })
    }

    /// The pattern as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_collection(&self) -> bool {
        self.wildcard.is_some()
    }

    pub fn specificity(&self) -> Specificity {
        if self.wildcard.is_some() {
            Specificity::Wildcard {
                depth: self.segments.len(),
            }
        } else if self
            .segments
            .iter()
            .any(|s| matches!(s, Segment::Param(_)))
        {
            Specificity::Parameterized
        } else {
            Specificity::Exact
        }
    }

    /// Canonical form with parameter names erased.
    ///
    /// Two patterns with the same shape match exactly the same paths, so a
    /// later registration of the same shape replaces the earlier one.
    pub fn shape(&self) -> String {
        let mut shape = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            shape.push('/');
            match segment {
                Segment::Literal(literal) => shape.push_str(literal),
                Segment::Param(_) => shape.push(PARAM_MARKER),
            }
        }
        if self.wildcard.is_some() {
            shape.push('/');
            shape.push(WILDCARD_MARKER);
        }
        if shape.is_empty() {
            shape.push('/');
        }
        shape
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.walk(path, |_, _| {}).is_some()
    }

    /// Whether `path` is exactly the path this pattern was registered for.
    ///
    /// Same as [`Pattern::is_match`] for exact and parameterized patterns.
    /// A collection only counts with an empty remainder: `/blobs/` names
    /// `/blobs/` but not `/blobs/x`.
    pub fn is_registered_path(&self, path: &str) -> bool {
        match self.walk(path, |_, _| {}) {
            Some(rest) => self.wildcard.is_none() || rest.is_empty(),
            None => false,
        }
    }

    /// Match `path` and collect its parameters.
    pub fn captures(&self, path: &str) -> Option<Params> {
        let mut params = Params::new();
        let matched = self.walk(path, |name, value| params.push(name, value));
        matched.map(|_| params)
    }

    /// Returns the wildcard remainder on a match (`""` without a wildcard).
    fn walk<'p>(&self, path: &'p str, mut bind: impl FnMut(&str, &'p str)) -> Option<&'p str> {
        // `None` once the path has no segments left
        let mut remaining = Some(path.strip_prefix('/')?);

        for segment in &self.segments {
            let current = remaining?;
            let (head, next) = match current.split_once('/') {
                Some((head, tail)) => (head, Some(tail)),
                None => (current, None),
            };
            match segment {
                Segment::Literal(literal) => {
                    if head != literal {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if head.is_empty() {
                        return None;
                    }
                    bind(name, head);
                }
            }
            remaining = next;
        }

        match (&self.wildcard, remaining) {
            (None, None) => Some(""),
            (None, Some(_)) => None,
            (Some(_), None) => None,
            (Some(wildcard), Some(rest)) => {
                if let Some(name) = &wildcard.name {
                    bind(name, rest);
                }
                Some(rest)
            }
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn ensure_unique(raw: &str, name: &str, segments: &[Segment]) -> Result<(), RouteError> {
    let taken = segments
        .iter()
        .any(|s| matches!(s, Segment::Param(existing) if existing == name));
    if taken {
        return Err(RouteError::DuplicateParam {
            pattern: raw.to_owned(),
            name: name.to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal_and_param() {
        let pattern = Pattern::parse("/blobs/:sha").unwrap();
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("blobs".into()),
                Segment::Param("sha".into())
            ]
        );
        assert!(!pattern.is_collection());
        assert_eq!(pattern.specificity(), Specificity::Parameterized);
        assert_eq!(pattern.to_string(), "/blobs/:sha");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Pattern::parse(""), Err(RouteError::EmptyPattern));
        assert_eq!(
            Pattern::parse("blobs"),
            Err(RouteError::MissingLeadingSlash("blobs".into()))
        );
        assert_eq!(
            Pattern::parse("/a//b"),
            Err(RouteError::EmptySegment("/a//b".into()))
        );
        assert_eq!(
            Pattern::parse("//"),
            Err(RouteError::EmptySegment("//".into()))
        );
        assert_eq!(
            Pattern::parse("/blobs/:"),
            Err(RouteError::UnnamedParam("/blobs/:".into()))
        );
        assert_eq!(
            Pattern::parse("/:id/:id"),
            Err(RouteError::DuplicateParam {
                pattern: "/:id/:id".into(),
                name: "id".into()
            })
        );
        assert_eq!(
            Pattern::parse("/files/*rest/more"),
            Err(RouteError::MisplacedWildcard("/files/*rest/more".into()))
        );
        assert_eq!(
            Pattern::parse("/files/*rest/"),
            Err(RouteError::MisplacedWildcard("/files/*rest/".into()))
        );
    }

    #[test]
    fn test_wildcard_name_clashes_with_param() {
        assert!(matches!(
            Pattern::parse("/:repo/*repo"),
            Err(RouteError::DuplicateParam { .. })
        ));
    }

    #[test]
    fn test_specificity_order() {
        let exact = Pattern::parse("/blobs/latest").unwrap().specificity();
        let param = Pattern::parse("/blobs/:sha").unwrap().specificity();
        let shallow = Pattern::parse("/").unwrap().specificity();
        let deep = Pattern::parse("/blobs/").unwrap().specificity();

        assert!(exact > param);
        assert!(param > deep);
        assert!(deep > shallow);
        assert_eq!(deep, Specificity::Wildcard { depth: 1 });
        assert!(shallow.is_wildcard());
    }

    #[test]
    fn test_shape_ignores_param_names() {
        let a = Pattern::parse("/blobs/:id").unwrap();
        let b = Pattern::parse("/blobs/:sha").unwrap();
        assert_eq!(a.shape(), b.shape());

        let collection = Pattern::parse("/blobs/").unwrap();
        let named = Pattern::parse("/blobs/*rest").unwrap();
        assert_eq!(collection.shape(), named.shape());

        assert_ne!(
            Pattern::parse("/blobs").unwrap().shape(),
            collection.shape()
        );
        assert_eq!(Pattern::parse("/").unwrap().shape(), "/*");
    }

    #[test]
    fn test_exact_match_segment_count() {
        let pattern = Pattern::parse("/config").unwrap();
        assert!(pattern.is_match("/config"));
        assert!(!pattern.is_match("/config/"));
        assert!(!pattern.is_match("/config/x"));
        assert!(!pattern.is_match("/Config"));
        assert!(!pattern.is_match("config"));
    }

    #[test]
    fn test_param_binds_non_empty_segment() {
        let pattern = Pattern::parse("/blobs/:sha").unwrap();

        let params = pattern.captures("/blobs/test").unwrap();
        assert_eq!(params.get("sha"), Some("test"));

        assert!(pattern.captures("/blobs/").is_none());
        assert!(pattern.captures("/blobs").is_none());
        assert!(pattern.captures("/blobs/a/b").is_none());
    }

    #[test]
    fn test_collection_requires_trailing_slash() {
        let pattern = Pattern::parse("/blobs/").unwrap();
        assert!(pattern.is_match("/blobs/"));
        assert!(pattern.is_match("/blobs/x"));
        assert!(pattern.is_match("/blobs/x/y"));
        assert!(!pattern.is_match("/blobs"));
        assert!(!pattern.is_match("/blobsx/"));

        // unnamed remainder is not bound
        assert!(pattern.captures("/blobs/x/y").unwrap().is_empty());
    }

    #[test]
    fn test_registered_path_excludes_deeper_collection_paths() {
        let collection = Pattern::parse("/blobs/").unwrap();
        assert!(collection.is_registered_path("/blobs/"));
        assert!(!collection.is_registered_path("/blobs/x"));
        assert!(!collection.is_registered_path("/blobs"));

        let item = Pattern::parse("/blobs/:sha").unwrap();
        assert!(item.is_registered_path("/blobs/x"));
        assert!(!item.is_registered_path("/blobs/"));
    }

    #[test]
    fn test_named_wildcard_binds_remainder() {
        let pattern = Pattern::parse("/files/*rest").unwrap();
        assert_eq!(
            pattern.captures("/files/a/b/c").unwrap().get("rest"),
            Some("a/b/c")
        );
        assert_eq!(pattern.captures("/files/").unwrap().get("rest"), Some(""));
        assert!(pattern.captures("/files").is_none());
    }

    #[test]
    fn test_root_collection_matches_everything() {
        let pattern = Pattern::parse("/").unwrap();
        assert!(pattern.is_match("/"));
        assert!(pattern.is_match("/anything/at/all"));
        assert!(!pattern.is_match(""));
    }

    #[test]
    fn test_params_inside_collection_prefix() {
        let pattern = Pattern::parse("/:repo/locks/").unwrap();
        let params = pattern.captures("/alice/locks/").unwrap();
        assert_eq!(params.get("repo"), Some("alice"));
        assert_eq!(pattern.specificity(), Specificity::Wildcard { depth: 2 });
    }
}
