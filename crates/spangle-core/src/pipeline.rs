//! Pipeline orchestration
//!
//! Wires the stages together: preprocess, Markdown, tree parse, mention
//! expansion, render conversion. Conversion failures degrade to a raw-text
//! render at this level; a message is always displayed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::RenderContext;
use crate::embed::EmbedResolver;
use crate::error::{RenderError, RenderResult};
use crate::render::node::RenderNode;
use crate::state::ContentStateStore;
use crate::{markdown, mentions, preprocess, render, tree};

/// Unbroken runs longer than this bypass the pipeline entirely
pub const LONG_WORD_LIMIT: usize = 800;

/// A fully rendered message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendered {
    pub nodes: Vec<RenderNode>,
    /// True when the pipeline degraded to raw text
    pub fallback: bool,
}

/// The rendering pipeline
///
/// Cheap to clone; the shared content state travels with it.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    state: Arc<ContentStateStore>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline sharing an existing content state store
    pub fn with_state(state: Arc<ContentStateStore>) -> Self {
        Self { state }
    }

    /// Shared per-content view state (playback positions and the like)
    pub fn state(&self) -> &Arc<ContentStateStore> {
        &self.state
    }

    /// Render author text; never fails, degrading to raw text instead
    pub fn render(&self, raw: &str, ctx: &RenderContext) -> Rendered {
        match self.try_render(raw, ctx) {
            Ok(rendered) => rendered,
            Err(err) => {
                warn!(%err, "render degraded to raw text");
                fallback_raw(raw)
            }
        }
    }

    fn try_render(&self, raw: &str, ctx: &RenderContext) -> RenderResult<Rendered> {
        if let Some(len) = oversized_word(raw) {
            return Err(RenderError::OversizedWord(len));
        }
        let pre = preprocess::preprocess(raw, ctx.is_ai_message);
        let html = markdown::to_html(&pre.text);
        let mut nodes = tree::parse_fragment(&html);
        mentions::expand(&mut nodes);
        let mut resolver =
            EmbedResolver::with_state(ctx.site.clone(), Arc::clone(&self.state));
        let mut rendered = render::convert(&nodes, ctx, &mut resolver)?;
        if pre.spoiler {
            rendered = vec![RenderNode::Spoiler { children: rendered }];
        }
        debug!(nodes = rendered.len(), "render complete");
        Ok(Rendered {
            nodes: rendered,
            fallback: false,
        })
    }
}

fn oversized_word(raw: &str) -> Option<usize> {
    raw.split_whitespace()
        .map(|word| word.chars().count())
        .find(|&len| len > LONG_WORD_LIMIT)
}

fn fallback_raw(raw: &str) -> Rendered {
    Rendered {
        nodes: vec![RenderNode::text(raw)],
        fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::node::plain_text;

    #[test]
    fn test_basic_message_renders() {
        let pipeline = Pipeline::new();
        let rendered = pipeline.render("hello *there*", &RenderContext::default());
        assert!(!rendered.fallback);
        assert_eq!(plain_text(&rendered.nodes), "hello there");
    }

    #[test]
    fn test_oversized_word_falls_back_to_raw_text() {
        let pipeline = Pipeline::new();
        let raw = "x".repeat(LONG_WORD_LIMIT + 1);
        let rendered = pipeline.render(&raw, &RenderContext::default());
        assert!(rendered.fallback);
        assert_eq!(rendered.nodes, vec![RenderNode::text(&raw)]);
    }

    #[test]
    fn test_spoiler_prefix_gates_the_tree() {
        let pipeline = Pipeline::new();
        let rendered = pipeline.render("/secret the twist", &RenderContext::default());
        assert!(matches!(rendered.nodes[0], RenderNode::Spoiler { .. }));
        assert_eq!(plain_text(&rendered.nodes), "the twist");
    }
}
