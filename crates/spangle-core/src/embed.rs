//! Embedded-content classification and resolution
//!
//! Given an image node's source, decide what it really is - an internal
//! reference, a video, a plain image - and produce the matching embed node.
//! Classification never fails; anything unrecognizable degrades to the
//! literal `![]()` placeholder instead of silently dropping content.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::context::{RenderContext, SiteConfig};
use crate::render::node::{EmbedNode, RenderNode};
use crate::state::{ContentKey, ContentStateStore};

/// YouTube watch and short-link forms, capturing the video code
static YOUTUBE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?(?:[^\s]*&)?v=|youtu\.be/)([A-Za-z0-9_-]+)").unwrap()
});

/// Internal paths under this prefix host platform video
const VIDEO_PATH_PREFIX: &str = "/videos/";

#[derive(Debug, Clone, PartialEq)]
enum EmbedClass {
    Internal(String),
    YouTube { id: String, url: String },
    PlatformVideo(String),
    Image,
    Invalid,
}

/// Classifies sources and renders embed nodes
///
/// Classification is memoized per source string for the life of the
/// resolver; a resolver lives for one render pass.
pub struct EmbedResolver {
    site: SiteConfig,
    state: Option<Arc<ContentStateStore>>,
    cache: HashMap<String, EmbedClass>,
}

impl EmbedResolver {
    pub fn new(site: SiteConfig) -> Self {
        Self {
            site,
            state: None,
            cache: HashMap::new(),
        }
    }

    /// Resolver that can look up playback state for video embeds
    pub fn with_state(site: SiteConfig, state: Arc<ContentStateStore>) -> Self {
        Self {
            site,
            state: Some(state),
            cache: HashMap::new(),
        }
    }

    /// Classify a source and render the matching embed node
    pub fn resolve(&mut self, src: &str, alt: &str, ctx: &RenderContext) -> RenderNode {
        let class = self.classify(src).clone();
        let embed = match class {
            EmbedClass::Invalid => {
                debug!(src, "unrecognized embed source");
                EmbedNode::Broken
            }
            EmbedClass::Internal(path) => EmbedNode::InternalLink {
                label: if alt.is_empty() {
                    path.clone()
                } else {
                    alt.to_string()
                },
                path,
            },
            EmbedClass::PlatformVideo(path) => EmbedNode::PlatformVideo { path },
            EmbedClass::YouTube { id, url } => {
                let playback = self
                    .state
                    .as_ref()
                    .and_then(|store| store.playback(&youtube_key(ctx, &id)));
                EmbedNode::YouTube {
                    video_id: id,
                    url,
                    resume_at: playback.map(|p| p.position_secs),
                    started: playback.is_some_and(|p| p.started),
                }
            }
            EmbedClass::Image => {
                let src = src.trim();
                if ctx.broken_images.contains(src) {
                    EmbedNode::LinkFallback {
                        href: ensure_scheme(src),
                        label: if alt.is_empty() {
                            src.to_string()
                        } else {
                            alt.to_string()
                        },
                    }
                } else {
                    EmbedNode::Image {
                        src: src.to_string(),
                        alt: alt.to_string(),
                        secret: alt == "secret",
                    }
                }
            }
        };
        RenderNode::Embed { embed }
    }

    fn classify(&mut self, src: &str) -> &EmbedClass {
        if !self.cache.contains_key(src) {
            let class = classify_source(&self.site, src);
            self.cache.insert(src.to_string(), class);
        }
        &self.cache[src]
    }

    #[cfg(test)]
    fn cached(&self) -> usize {
        self.cache.len()
    }
}

fn youtube_key(ctx: &RenderContext, id: &str) -> ContentKey {
    ContentKey::new(ctx.content_kind, ctx.content_id, format!("yt:{id}"))
}

fn classify_source(site: &SiteConfig, src: &str) -> EmbedClass {
    let src = src.trim();
    if src.is_empty() || src.chars().any(char::is_whitespace) {
        return EmbedClass::Invalid;
    }
    if let Some(caps) = YOUTUBE_RE.captures(src) {
        return EmbedClass::YouTube {
            id: caps[1].to_string(),
            url: ensure_scheme(src),
        };
    }
    if let Some(path) = site.internal_path(src) {
        if path.starts_with(VIDEO_PATH_PREFIX) {
            return EmbedClass::PlatformVideo(path);
        }
        return EmbedClass::Internal(path);
    }
    EmbedClass::Image
}

/// Hrefs without a scheme get a plain `http://` prefix
pub fn ensure_scheme(href: &str) -> String {
    if has_scheme(href) {
        href.to_string()
    } else {
        format!("http://{href}")
    }
}

pub fn has_scheme(href: &str) -> bool {
    href.contains("://") || href.starts_with("mailto:") || href.starts_with("tel:")
}
