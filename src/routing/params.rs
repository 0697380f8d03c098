//! Path parameters bound by a match.

/// Name/value pairs extracted from the request path.
///
/// Produced once per request and handed to the handler by value, so
/// nothing about a match is stored on the router.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: &str, value: &str) {
        self.pairs.push((name.to_owned(), value.to_owned()));
    }

    /// Value bound to `name`, if the matched pattern declared it.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Pairs in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        let mut params = Params::new();
        params.push("user", "alice");
        params.push("sha", "abc123");

        assert_eq!(params.get("sha"), Some("abc123"));
        assert_eq!(params.get("user"), Some("alice"));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.len(), 2);

        let names: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["user", "sha"]);
    }
}
