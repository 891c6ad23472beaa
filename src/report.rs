//! Modal overlay that shows a probe report as pretty-printed JSON.

use crossterm::event::KeyEvent;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};
use serde_json::Value;

use crate::{
    layout,
    shortcuts::{self, ReportShortcuts},
};

/// Lines moved by a page scroll.
const PAGE: u16 = 10;

/// Pretty-print a document with two-space indentation.
pub fn render_report(doc: &Value) -> String {
    // Compact form if pretty printing ever fails.
    serde_json::to_string_pretty(doc).unwrap_or_else(|_| doc.to_string())
}

/// Scroll position of the open report.
#[derive(Clone, Debug, Default)]
pub struct ReportView {
    pub scroll: u16,
}

impl ReportView {
    /// Handle a key while the overlay is open. Closing only calls `on_close`.
    pub fn handle_key<F: FnOnce()>(
        &mut self,
        k: &KeyEvent,
        sc: &ReportShortcuts,
        doc: &Value,
        on_close: F,
    ) {
        let max = max_scroll(doc);
        if shortcuts::matches_shortcut(k, &sc.close) {
            on_close();
        } else if shortcuts::matches_shortcut(k, &sc.down) {
            self.scroll = self.scroll.saturating_add(1).min(max);
        } else if shortcuts::matches_shortcut(k, &sc.up) {
            self.scroll = self.scroll.saturating_sub(1);
        } else if shortcuts::matches_shortcut(k, &sc.page_down) {
            self.scroll = self.scroll.saturating_add(PAGE).min(max);
        } else if shortcuts::matches_shortcut(k, &sc.page_up) {
            self.scroll = self.scroll.saturating_sub(PAGE);
        } else if shortcuts::matches_shortcut(k, &sc.top) {
            self.scroll = 0;
        }
    }
}

fn max_scroll(doc: &Value) -> u16 {
    let lines = render_report(doc).lines().count();
    u16::try_from(lines.saturating_sub(1)).unwrap_or(u16::MAX)
}

/// Draw the report overlay on top of everything else.
pub fn render_report_overlay(f: &mut Frame, doc: &Value, view: &ReportView, help: &str) {
    let area = layout::centered_rect(f.area(), 80, 80);
    f.render_widget(Clear, area);

    let body = Paragraph::new(render_report(doc))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("ffprobe results")
                .title_bottom(Line::from(help.to_string()).centered()),
        )
        .style(Style::default().fg(Color::Black).bg(Color::Rgb(195, 166, 123)))
        .scroll((view.scroll, 0));
    f.render_widget(body, area);
}
