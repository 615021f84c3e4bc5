//! Terminal reporting for the CLI
//!
//! Query results go to stdout as plain JSON so they can be piped; status and
//! diagnostics go to stderr.

mod report;
mod table;

pub use report::{config_written, failure, format_path, query_outcome, serving, store_summary};
pub use table::stats_table;

use owo_colors::{OwoColorize, Style};
use std::sync::OnceLock;

static COLOR: OnceLock<bool> = OnceLock::new();

/// What a piece of terminal text means to the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Heading,
    Done,
    Failed,
    Warning,
    Label,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Tone::Heading => Style::new().cyan().bold(),
            Tone::Done => Style::new().green().bold(),
            Tone::Failed => Style::new().red().bold(),
            Tone::Warning => Style::new().yellow().bold(),
            Tone::Label => Style::new().dimmed(),
        }
    }
}

/// Colors only when stderr is a terminal and `NO_COLOR` is unset
fn color_enabled() -> bool {
    *COLOR.get_or_init(|| {
        std::env::var_os("NO_COLOR").is_none() && console::Term::stderr().is_term()
    })
}

pub fn paint(text: &str, tone: Tone) -> String {
    if color_enabled() {
        text.style(tone.style()).to_string()
    } else {
        text.to_string()
    }
}
