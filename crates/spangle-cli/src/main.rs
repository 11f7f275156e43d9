//! Spangle - terminal renderer for platform rich text
//!
//! Reads a message, runs it through the core pipeline, and draws the
//! resulting render tree as ANSI text (or dumps it as JSON for other
//! consumers).

mod term;
mod theme;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use spangle_core::{ContentKind, Pipeline, RenderContext, RenderService, SiteConfig};
use theme::Theme;

#[derive(Parser, Debug)]
#[command(
    name = "spangle",
    about = "Render Spangle rich text to the terminal",
    version
)]
struct Args {
    /// Input file; stdin when omitted
    file: Option<PathBuf>,

    /// Treat the input as AI-authored
    #[arg(long)]
    ai: bool,

    /// Render as part of a profile view
    #[arg(long)]
    profile: bool,

    /// Content identity the message belongs to
    #[arg(long, default_value_t = 0)]
    content_id: u64,

    /// Content kind: chat, post, comment, mission, profile or video
    #[arg(long, default_value = "chat")]
    content_kind: String,

    /// Wrap width in columns (0 disables wrapping)
    #[arg(long, default_value_t = 80)]
    width: usize,

    /// Emit the render tree as JSON instead of ANSI text
    #[arg(long)]
    json: bool,

    /// Reveal spoiler and secret content
    #[arg(long)]
    reveal: bool,

    /// Override the link color (CSS color)
    #[arg(long)]
    link_color: Option<String>,

    /// Override the list-marker color (CSS color)
    #[arg(long)]
    marker_color: Option<String>,

    /// Site origin used to recognize internal links
    #[arg(long)]
    origin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let text = read_input(args.file.as_deref())?;
    let ctx = build_context(&args)?;
    tracing::debug!(bytes = text.len(), ai = ctx.is_ai_message, "rendering input");

    let service = RenderService::new(Pipeline::new());
    let rendered = service
        .submit(text, ctx)
        .await
        .context("render was superseded")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rendered.nodes)?);
    } else {
        print!(
            "{}",
            term::render(&rendered, &Theme::default(), args.width, args.reveal)
        );
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

fn build_context(args: &Args) -> Result<RenderContext> {
    let mut ctx = RenderContext::for_content(parse_kind(&args.content_kind)?, args.content_id);
    ctx.is_ai_message = args.ai;
    ctx.is_profile_component = args.profile;
    if let Some(color) = &args.link_color {
        ctx.link_color = color.clone();
    }
    if let Some(color) = &args.marker_color {
        ctx.marker_color = color.clone();
    }
    if let Some(origin) = &args.origin {
        ctx.site = SiteConfig::new(origin.clone());
    }
    Ok(ctx)
}

fn parse_kind(value: &str) -> Result<ContentKind> {
    match value {
        "chat" => Ok(ContentKind::Chat),
        "post" => Ok(ContentKind::Post),
        "comment" => Ok(ContentKind::Comment),
        "mission" => Ok(ContentKind::Mission),
        "profile" => Ok(ContentKind::Profile),
        "video" => Ok(ContentKind::Video),
        other => anyhow::bail!("unknown content kind: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_input_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "hello *there*").expect("write");
        let text = read_input(Some(file.path())).expect("read");
        assert_eq!(text, "hello *there*");
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("mission").expect("kind"), ContentKind::Mission);
        assert!(parse_kind("nonsense").is_err());
    }

    #[test]
    fn test_build_context_applies_flags() {
        let args = Args::parse_from(["spangle", "--ai", "--link-color", "#ff0000"]);
        let ctx = build_context(&args).expect("ctx");
        assert!(ctx.is_ai_message);
        assert_eq!(ctx.link_color, "#ff0000");
    }
}
