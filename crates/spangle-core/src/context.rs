//! Render context threaded through the conversion
//!
//! The context is immutable per render pass. Everything that changes how a
//! message converts lives here, so the walk itself stays pure.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use url::Url;

/// What kind of content a message belongs to
///
/// Used to scope embedded sub-content lookups (video positions, layout
/// hints), never to change conversion rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Chat,
    Post,
    Comment,
    Mission,
    Profile,
    Video,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Chat => "chat",
            ContentKind::Post => "post",
            ContentKind::Comment => "comment",
            ContentKind::Mission => "mission",
            ContentKind::Profile => "profile",
            ContentKind::Video => "video",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Site configuration used to recognize URLs that point back into the
/// application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Canonical origin of the application, e.g. `https://spangle.social`
    pub origin: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: "https://spangle.social".to_string(),
        }
    }
}

impl SiteConfig {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }

    /// True when the href points within the application
    ///
    /// Path-relative hrefs count as internal; absolute URLs match on host,
    /// ignoring a `www.` prefix.
    pub fn is_internal(&self, href: &str) -> bool {
        let href = href.trim();
        if href.starts_with('/') && !href.starts_with("//") {
            return true;
        }
        match (Url::parse(href), Url::parse(&self.origin)) {
            (Ok(url), Ok(origin)) => match (url.host_str(), origin.host_str()) {
                (Some(a), Some(b)) => {
                    a.trim_start_matches("www.") == b.trim_start_matches("www.")
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Path (plus query) component of an internal URL, for client-side
    /// navigation
    pub fn internal_path(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.starts_with('/') && !href.starts_with("//") {
            return Some(href.to_string());
        }
        if !self.is_internal(href) {
            return None;
        }
        let url = Url::parse(href).ok()?;
        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }
        Some(path)
    }
}

/// Immutable per-render configuration
///
/// Threaded through the whole recursive conversion, never mutated mid-walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderContext {
    /// Identity of the content being rendered
    pub content_id: u64,
    pub content_kind: ContentKind,
    /// Rendering inside a profile view (routes embedded sub-content lookups)
    pub is_profile_component: bool,
    /// Flips the em/strong convention and disables newline splitting
    pub is_ai_message: bool,
    /// CSS color applied to links
    pub link_color: String,
    /// CSS color applied to list markers
    pub marker_color: String,
    pub site: SiteConfig,
    /// Sources the host view reported as failed image loads; these render
    /// as plain links instead of images on the next pass
    pub broken_images: HashSet<String>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            content_id: 0,
            content_kind: ContentKind::default(),
            is_profile_component: false,
            is_ai_message: false,
            link_color: "#2d6ccb".to_string(),
            marker_color: "#2d6ccb".to_string(),
            site: SiteConfig::default(),
            broken_images: HashSet::new(),
        }
    }
}

impl RenderContext {
    /// Context for a piece of content, everything else defaulted
    pub fn for_content(kind: ContentKind, id: u64) -> Self {
        Self {
            content_id: id,
            content_kind: kind,
            ..Self::default()
        }
    }

    /// Stable fingerprint for cache keys
    ///
    /// Covers every field that changes conversion output, including the
    /// broken-image set (hashed in sorted order).
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.content_id.hash(&mut hasher);
        self.content_kind.hash(&mut hasher);
        self.is_profile_component.hash(&mut hasher);
        self.is_ai_message.hash(&mut hasher);
        self.link_color.hash(&mut hasher);
        self.marker_color.hash(&mut hasher);
        self.site.origin.hash(&mut hasher);
        let mut broken: Vec<&String> = self.broken_images.iter().collect();
        broken.sort();
        broken.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_detection() {
        let site = SiteConfig::default();
        assert!(site.is_internal("/users/abc"));
        assert!(site.is_internal("https://spangle.social/missions/4"));
        assert!(site.is_internal("https://www.spangle.social/missions/4"));
        assert!(!site.is_internal("https://example.com/users/abc"));
        assert!(!site.is_internal("//evil.example/x"));
    }

    #[test]
    fn test_internal_path() {
        let site = SiteConfig::default();
        assert_eq!(
            site.internal_path("https://spangle.social/videos/12?t=30"),
            Some("/videos/12?t=30".to_string())
        );
        assert_eq!(site.internal_path("/users/abc"), Some("/users/abc".to_string()));
        assert_eq!(site.internal_path("https://example.com/x"), None);
    }

    #[test]
    fn test_fingerprint_changes_with_flags() {
        let ctx = RenderContext::default();
        let mut ai = ctx.clone();
        ai.is_ai_message = true;
        assert_ne!(ctx.fingerprint(), ai.fingerprint());

        let mut broken = ctx.clone();
        broken.broken_images.insert("https://x/y.png".to_string());
        assert_ne!(ctx.fingerprint(), broken.fingerprint());
    }
}
