use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use bizops_core::DomainError;

/// Slug that grants every page.
pub const WILDCARD_PAGE: &str = "all";

/// Feature page identifier (e.g. "stocks", "laundry").
///
/// Slugs are lowercase `[a-z0-9_-]`, 1..=64 chars. The special slug `"all"`
/// acts as a wildcard inside a [`PageAccess`] set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageSlug(String);

impl PageSlug {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let slug = raw.as_ref().trim().to_lowercase();
        if slug.is_empty() || slug.len() > 64 {
            return Err(DomainError::validation("page slug must be 1..=64 characters"));
        }
        if !slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(DomainError::validation(format!("invalid page slug '{slug}'")));
        }
        Ok(Self(slug))
    }

    pub fn wildcard() -> Self {
        Self(WILDCARD_PAGE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD_PAGE
    }
}

impl TryFrom<String> for PageSlug {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<PageSlug> for String {
    fn from(value: PageSlug) -> Self {
        value.0
    }
}

impl core::fmt::Display for PageSlug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-identity allowlist of feature pages, independent of role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageAccess(BTreeSet<PageSlug>);

impl PageAccess {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self(BTreeSet::from([PageSlug::wildcard()]))
    }

    /// Parse a list of raw slugs, rejecting the whole list on the first bad one.
    pub fn parse<I, S>(raw: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw.into_iter()
            .map(PageSlug::parse)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    pub fn allows(&self, slug: &PageSlug) -> bool {
        self.0.iter().any(|granted| granted.is_wildcard() || granted == slug)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|s| s.as_str().to_string()).collect()
    }
}

impl FromIterator<PageSlug> for PageAccess {
    fn from_iter<T: IntoIterator<Item = PageSlug>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
