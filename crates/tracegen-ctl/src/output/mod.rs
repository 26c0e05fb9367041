//! Styled terminal output for `tracegen-ctl`.
//!
//! `anstream` strips the styles when stdout is not a terminal, so piped output
//! stays plain text.

mod styles;

use std::fmt::Display;
use std::io::Write;
use std::path::Path;

pub(crate) use styles::clap_styles;

use styles::{DIM, ERROR, HEADER, PREVIEW, WARNING, WRITTEN};

/// Where a generated resource ended up.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Destination<'a> {
    Written(&'a Path),
    Unchanged(&'a Path),
    Preview,
}

pub(crate) fn header(title: impl Display) {
    let mut out = anstream::stdout().lock();
    writeln!(out, "{HEADER}{title}{HEADER:#}").ok();
}

/// "  name: value" with the name in bold.
pub(crate) fn label(name: impl Display, value: impl Display) {
    let mut out = anstream::stdout().lock();
    writeln!(out, "  {HEADER}{name}:{HEADER:#} {value}").ok();
}

/// One line per generated resource, colored by destination.
pub(crate) fn resource(location: &str, destination: Destination<'_>) {
    let mut out = anstream::stdout().lock();
    writeln!(out, "{}", resource_line(location, destination)).ok();
}

fn resource_line(location: &str, destination: Destination<'_>) -> String {
    match destination {
        Destination::Written(path) => {
            format!("  {WRITTEN}{location}{WRITTEN:#} -> {}", path.display())
        }
        Destination::Unchanged(path) => {
            format!("  {DIM}{location} unchanged ({}){DIM:#}", path.display())
        }
        Destination::Preview => format!("  {PREVIEW}{location}{PREVIEW:#} (preview)"),
    }
}

pub(crate) fn done(msg: impl Display) {
    let mut out = anstream::stdout().lock();
    writeln!(out, "{WRITTEN}✓ {msg}{WRITTEN:#}").ok();
}

pub(crate) fn warning(msg: impl Display) {
    let mut out = anstream::stdout().lock();
    writeln!(out, "{WARNING}! {msg}{WARNING:#}").ok();
}

/// Errors go to stderr.
pub(crate) fn error(msg: impl Display) {
    let mut out = anstream::stderr().lock();
    writeln!(out, "{ERROR}✗ {msg}{ERROR:#}").ok();
}

pub(crate) fn dim(msg: impl Display) {
    let mut out = anstream::stdout().lock();
    writeln!(out, "{DIM}{msg}{DIM:#}").ok();
}

pub(crate) fn item(msg: impl Display) {
    let mut out = anstream::stdout().lock();
    writeln!(out, "  • {msg}").ok();
}

pub(crate) fn plain(msg: impl Display) {
    let mut out = anstream::stdout().lock();
    writeln!(out, "{msg}").ok();
}

/// Generated text as-is, newline-terminated.
pub(crate) fn text(content: &str) {
    let mut out = anstream::stdout().lock();
    write!(out, "{content}").ok();
    if !content.is_empty() && !content.ends_with('\n') {
        writeln!(out).ok();
    }
}
