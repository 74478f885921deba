//! Shared resource links (catalog PDFs, supplier portals, training videos).

use chrono::{DateTime, Utc};
use url::Url;
use uuid::Uuid;

/// Validation errors for resource link payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("type must not be empty")]
    EmptyKind,
    #[error("please enter a valid URL")]
    InvalidUrl,
}

/// Persisted link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLink {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    /// Free-form category such as `catalog` or `video`.
    pub kind: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated link fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLinkDraft {
    pub title: String,
    pub url: String,
    pub kind: String,
    pub description: Option<String>,
}

/// Parse a link, assuming `https://` when no scheme is given.
///
/// Only `http` and `https` URLs whose host is a dotted domain or an IP
/// address are accepted.
pub fn normalise_url(raw: &str) -> Result<String, ResourceValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ResourceValidationError::InvalidUrl);
    }
    let candidate = if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("https://{raw}")
    };
    let parsed = Url::parse(&candidate).map_err(|_| ResourceValidationError::InvalidUrl)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ResourceValidationError::InvalidUrl);
    }
    match parsed.host() {
        Some(url::Host::Domain(domain)) if domain.contains('.') => Ok(parsed.into()),
        Some(url::Host::Ipv4(_) | url::Host::Ipv6(_)) => Ok(parsed.into()),
        _ => Err(ResourceValidationError::InvalidUrl),
    }
}

impl ResourceLinkDraft {
    pub fn try_new(
        title: &str,
        url: &str,
        kind: &str,
        description: Option<&str>,
    ) -> Result<Self, ResourceValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ResourceValidationError::EmptyTitle);
        }
        let kind = kind.trim();
        if kind.is_empty() {
            return Err(ResourceValidationError::EmptyKind);
        }
        Ok(Self {
            title: title.to_owned(),
            url: normalise_url(url)?,
            kind: kind.to_owned(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_owned),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://example.com/catalog.pdf", "https://example.com/catalog.pdf")]
    #[case("example.com", "https://example.com/")]
    #[case("http://10.0.0.5:8080/docs", "http://10.0.0.5:8080/docs")]
    fn accepts_links(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalise_url(raw).as_deref(), Ok(expected));
    }

    #[rstest]
    #[case("")]
    #[case("localhost")]
    #[case("ftp://example.com/file")]
    #[case("javascript:alert(1)")]
    #[case("https://")]
    fn rejects_links(#[case] raw: &str) {
        assert_eq!(normalise_url(raw), Err(ResourceValidationError::InvalidUrl));
    }

    #[rstest]
    fn draft_requires_title_and_kind() {
        assert_eq!(
            ResourceLinkDraft::try_new(" ", "example.com", "video", None),
            Err(ResourceValidationError::EmptyTitle)
        );
        assert_eq!(
            ResourceLinkDraft::try_new("Spec sheet", "example.com", "", None),
            Err(ResourceValidationError::EmptyKind)
        );
    }
}
