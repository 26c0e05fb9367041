//! Palette shared by command output and clap help.

use anstyle::{AnsiColor, Color, Effects, Style};

const fn fg(color: AnsiColor) -> Style {
    Style::new().fg_color(Some(Color::Ansi(color)))
}

/// Resources written to disk and the closing summary.
pub(crate) const WRITTEN: Style = fg(AnsiColor::Green);

/// Resources kept in memory by the preview strategy.
pub(crate) const PREVIEW: Style = fg(AnsiColor::Cyan);

/// Lost protected regions and abandoned resources.
pub(crate) const WARNING: Style = fg(AnsiColor::Yellow);

pub(crate) const ERROR: Style = fg(AnsiColor::Red).effects(Effects::BOLD);

/// Section headers and the name half of "name: value" lines.
pub(crate) const HEADER: Style = Style::new().effects(Effects::BOLD);

/// Unchanged files, static-text markers and other secondary detail.
pub(crate) const DIM: Style = Style::new().effects(Effects::DIMMED);

/// Help output drawn from the same palette.
pub(crate) fn clap_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .header(HEADER)
        .usage(HEADER)
        .literal(PREVIEW)
        .placeholder(DIM)
        .error(ERROR)
        .valid(WRITTEN)
        .invalid(WARNING)
}
