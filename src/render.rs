// src/render.rs
//! Markdown rendering of a digest for a chat message.

use std::fmt::Write as _;

use crate::aggregate::{Digest, DEFAULT_WINDOW_HOURS};
use crate::feed::SourceFailure;

pub const DIGEST_HEADING: &str = "# 📰 Tech News Briefing";

/// Render with the default 48h wording for an empty digest.
pub fn render_digest(digest: &Digest, failures: &[SourceFailure]) -> String {
    render_digest_with_window(digest, failures, DEFAULT_WINDOW_HOURS)
}

/// Flat numbered list, newest first, plus a note naming failed sources.
pub fn render_digest_with_window(
    digest: &Digest,
    failures: &[SourceFailure],
    window_hours: u32,
) -> String {
    let mut out = String::new();

    if digest.is_empty() {
        let _ = write!(
            out,
            "No relevant news found in the last {window_hours} hours."
        );
    } else {
        out.push_str(DIGEST_HEADING);
        out.push_str("\n\n");
        for (i, e) in digest.iter().enumerate() {
            let _ = writeln!(
                out,
                "**{}. [{}]({})**",
                i + 1,
                escape_link_text(&e.title),
                escape_link_target(&e.link)
            );
            let _ = writeln!(
                out,
                "*{}* · {}\n",
                e.source,
                e.published.format("%Y-%m-%d %H:%M UTC")
            );
        }
    }

    if !failures.is_empty() {
        let names: Vec<&str> = failures.iter().map(|f| f.source.as_str()).collect();
        let trimmed = out.trim_end().len();
        out.truncate(trimmed);
        let _ = write!(out, "\n\n_Could not load: {}_", names.join(", "));
    }

    out.trim_end().to_string()
}

fn escape_link_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('[', "\\[")
        .replace(']', "\\]")
}

fn escape_link_target(s: &str) -> String {
    s.replace(' ', "%20")
        .replace('(', "%28")
        .replace(')', "%29")
}
