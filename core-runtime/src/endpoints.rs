//! Endpoint derivation from the configured root URL.

use crate::error::{Error, Result};
use url::Url;

/// The three canonical endpoints of a remote instance.
///
/// `base` never ends with a slash, so configuring `https://cms.example.com`
/// or `https://cms.example.com/` yields identical endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoints {
    pub base: String,
    /// Query endpoint of the primary dataset
    pub graphql: String,
    /// Query endpoint of the system dataset
    pub system: String,
}

impl Endpoints {
    /// Derive endpoints from a root URL.
    ///
    /// Query string and fragment are dropped; the base path is kept.
    pub fn resolve(root: &str) -> Result<Self> {
        let mut url = Url::parse(root.trim())
            .map_err(|e| Error::Config(format!("Invalid root URL '{}': {}", root, e)))?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(Error::Config(format!(
                "Root URL '{}' must be an absolute http(s) URL",
                root
            )));
        }

        url.set_query(None);
        url.set_fragment(None);

        let base = url.as_str().trim_end_matches('/').to_string();
        let graphql = format!("{}/graphql", base);
        let system = format!("{}/graphql/system", base);

        Ok(Self {
            base,
            graphql,
            system,
        })
    }

    /// File listing endpoint
    pub fn files(&self) -> String {
        format!("{}/files", self.base)
    }

    /// Download URL of one file's bytes
    pub fn asset(&self, file_id: &str) -> String {
        format!("{}/assets/{}", self.base, urlencoding::encode(file_id))
    }

    pub fn login(&self) -> String {
        format!("{}/auth/login", self.base)
    }

    pub fn refresh(&self) -> String {
        format!("{}/auth/refresh", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_derives_query_endpoints() {
        let endpoints = Endpoints::resolve("https://cms.example.com").unwrap();

        assert_eq!(endpoints.base, "https://cms.example.com");
        assert_eq!(endpoints.graphql, "https://cms.example.com/graphql");
        assert_eq!(endpoints.system, "https://cms.example.com/graphql/system");
    }

    #[test]
    fn test_trailing_slashes_do_not_change_endpoints() {
        let plain = Endpoints::resolve("https://cms.example.com/api").unwrap();
        let slashed = Endpoints::resolve("https://cms.example.com/api/").unwrap();
        let doubled = Endpoints::resolve("https://cms.example.com/api//").unwrap();

        assert_eq!(plain, slashed);
        assert_eq!(plain, doubled);
        assert_eq!(plain.graphql, "https://cms.example.com/api/graphql");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let first = Endpoints::resolve("http://localhost:8055/").unwrap();
        let second = Endpoints::resolve("http://localhost:8055/").unwrap();
        let again = Endpoints::resolve(&first.base).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, again);
    }

    #[test]
    fn test_resolve_strips_query_and_fragment() {
        let endpoints = Endpoints::resolve("https://cms.example.com/?access_token=x#top").unwrap();
        assert_eq!(endpoints.base, "https://cms.example.com");
    }

    #[test]
    fn test_resolve_rejects_non_absolute_urls() {
        assert!(matches!(Endpoints::resolve("cms.example.com"), Err(Error::Config(_))));
        assert!(matches!(Endpoints::resolve("/relative"), Err(Error::Config(_))));
        assert!(matches!(Endpoints::resolve(""), Err(Error::Config(_))));
        assert!(matches!(
            Endpoints::resolve("mailto:editor@example.com"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_rest_endpoints() {
        let endpoints = Endpoints::resolve("https://cms.example.com/").unwrap();

        assert_eq!(endpoints.files(), "https://cms.example.com/files");
        assert_eq!(endpoints.login(), "https://cms.example.com/auth/login");
        assert_eq!(endpoints.refresh(), "https://cms.example.com/auth/refresh");
        assert_eq!(
            endpoints.asset("a b"),
            "https://cms.example.com/assets/a%20b"
        );
    }
}
