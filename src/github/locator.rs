use std::fmt;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::error::{ArchaeologistError, Result};

lazy_static! {
    // Repository segment must be the last path component.
    static ref ANCHORED: Regex =
        Regex::new(r"github\.com/([^/\s]+)/([^/\s]+?)(?:\.git)?/?$").expect("valid regex");
    // Any two segments after the host; the rest of the path is ignored.
    static ref LOOSE: Regex =
        Regex::new(r"github\.com/([^/\s]+)/([^/\s]+)").expect("valid regex");
}

/// Owner and name of a hosted repository
///
/// Every hosting API call is keyed by this pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryIdentity {
    /// Account or organization that owns the repository
    pub owner: String,
    /// Repository name, without any `.git` suffix
    pub name: String,
}

impl RepositoryIdentity {
    /// Creates an identity from its parts
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses a GitHub repository URL
    ///
    /// Accepts `https://github.com/owner/repo`, `github.com/owner/repo.git`,
    /// and URLs with trailing path segments such as `/tree/main`.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();

        for pattern in [&*ANCHORED, &*LOOSE] {
            if let Some(captures) = pattern.captures(url) {
                let owner = &captures[1];
                let name = captures[2].trim_end_matches('/');
                let name = name.strip_suffix(".git").unwrap_or(name);
                if !owner.is_empty() && !name.is_empty() {
                    return Ok(Self::new(owner, name));
                }
            }
        }

        Err(ArchaeologistError::InvalidRepositoryUrl(url.to_string()))
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Browser URL of the repository
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("https://github.com/acme/widgets.git", "acme", "widgets" ; "git suffix")]
    #[test_case("https://github.com/acme/widgets", "acme", "widgets" ; "plain")]
    #[test_case("https://github.com/acme/widgets/", "acme", "widgets" ; "trailing slash")]
    #[test_case("github.com/acme/widgets/tree/main", "acme", "widgets" ; "loose fallback")]
    #[test_case("  http://www.github.com/acme/my.repo  ", "acme", "my.repo" ; "dotted name with whitespace")]
    fn test_parse_accepts(url: &str, owner: &str, name: &str) {
        let identity = RepositoryIdentity::parse(url).unwrap();
        assert_eq!(identity, RepositoryIdentity::new(owner, name));
    }

    #[test_case("not a url" ; "free text")]
    #[test_case("https://gitlab.com/acme/widgets" ; "other host")]
    #[test_case("https://github.com/acme" ; "owner only")]
    #[test_case("" ; "empty")]
    fn test_parse_rejects(url: &str) {
        assert!(matches!(
            RepositoryIdentity::parse(url),
            Err(ArchaeologistError::InvalidRepositoryUrl(_))
        ));
    }

    #[test]
    fn test_display_and_urls() {
        let identity = RepositoryIdentity::new("acme", "widgets");
        assert_eq!(identity.to_string(), "acme/widgets");
        assert_eq!(identity.full_name(), "acme/widgets");
        assert_eq!(identity.html_url(), "https://github.com/acme/widgets");
    }
}
