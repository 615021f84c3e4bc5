use std::path::Path;
use crate::config::GraphConfig;
use crate::query::{FieldError, PathSegment, Response};
use crate::storage::StoreStats;
use super::{paint, stats_table, Tone};

pub fn serving(port: u16) {
    eprintln!(
        "{} {}",
        paint("▶", Tone::Heading),
        paint(&format!("Serving /graphql on 0.0.0.0:{}", port), Tone::Heading)
    );
}

pub fn failure(message: &str) {
    eprintln!("{} {}", paint("✗", Tone::Failed), paint(message, Tone::Failed));
}

pub fn config_written(path: &Path, config: &GraphConfig) {
    eprintln!("{} Wrote {}", paint("✓", Tone::Done), path.display());
    eprintln!("  {} {}", paint("entity store", Tone::Label), config.entity_store.display());
    eprintln!("  {} {}", paint("blob store", Tone::Label), config.blob_store.display());
    eprintln!("  {} {} ms", paint("busy timeout", Tone::Label), config.busy_timeout_ms);
}

/// Summarize the errors of an executed query on stderr
pub fn query_outcome(response: &Response) {
    if response.errors.is_empty() {
        return;
    }

    if response.data.is_none() {
        failure("Query aborted");
    } else {
        eprintln!(
            "{} {}",
            paint("!", Tone::Warning),
            paint(
                &format!("{} field(s) failed to resolve", response.errors.len()),
                Tone::Warning
            )
        );
    }
    for error in &response.errors {
        print_field_error(error);
    }
}

fn print_field_error(error: &FieldError) {
    eprintln!(
        "  {} {} [{}]",
        paint(&format_path(&error.path), Tone::Label),
        error.message,
        error.extensions.code
    );
}

/// Row counts of the entity store at `path`
pub fn store_summary(path: &Path, stats: &StoreStats) {
    eprintln!("{}", paint(&path.display().to_string(), Tone::Heading));
    println!("{}", stats_table(&stats.rows()));
}

/// Render an error path the way it is written in a query, e.g.
/// `ensemble.realizations[0].values`
pub fn format_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return "<document>".to_string();
    }

    let mut rendered = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if !rendered.is_empty() {
                    rendered.push('.');
                }
                rendered.push_str(key);
            }
            PathSegment::Index(index) => rendered.push_str(&format!("[{}]", index)),
        }
    }
    rendered
}
