//! Structural URI parsing following RFC 3986 Appendix B.
//!
//! Editors store non-standard authorities such as `wsl+Ubuntu` or
//! `ssh-remote+build-box`, which general-purpose URL parsers reject or
//! normalize. This parser only splits the string into its five components and
//! performs no validation or percent-decoding.

use once_cell::sync::Lazy;
use regex::Regex;

static RFC3986: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)^(?:(?P<scheme>[^:/?#]+):)?(?://(?P<authority>[^/?#]*))?(?P<path>[^?#]*)(?:\?(?P<query>[^#]*))?(?:#(?P<fragment>.*))?$",
    )
    .expect("rfc3986 regex")
});

/// The five syntactic components of a URI reference. Missing components are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUri {
    scheme: String,
    authority: String,
    path: String,
    query: String,
    fragment: String,
}

impl ParsedUri {
    /// Split `input` into components.
    ///
    /// Every component of the grammar is optional, so any string matches;
    /// `None` is only returned if the pattern somehow fails to match.
    pub fn parse(input: &str) -> Option<Self> {
        let caps = RFC3986.captures(input)?;
        let group = |name: &str| {
            caps.name(name)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        };
        Some(Self {
            scheme: group("scheme"),
            authority: group("authority"),
            path: group("path"),
            query: group("query"),
            fragment: group("fragment"),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Reassemble the components into a string that parses back to `self`.
    pub fn to_uri_string(&self) -> String {
        let mut out = String::with_capacity(
            self.scheme.len()
                + self.authority.len()
                + self.path.len()
                + self.query.len()
                + self.fragment.len()
                + 5,
        );
        if !self.scheme.is_empty() {
            out.push_str(&self.scheme);
            out.push(':');
        }
        // A path starting with `//` can only come from an empty authority.
        if !self.authority.is_empty() || self.path.starts_with("//") {
            out.push_str("//");
            out.push_str(&self.authority);
        }
        out.push_str(&self.path);
        if !self.query.is_empty() {
            out.push('?');
            out.push_str(&self.query);
        }
        if !self.fragment.is_empty() {
            out.push('#');
            out.push_str(&self.fragment);
        }
        out
    }
}

impl std::fmt::Display for ParsedUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_uri_string())
    }
}
