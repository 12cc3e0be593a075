//! Screen rendering.

mod scan;
mod select;

pub use scan::ScanScreen;
pub use select::{SelectScreen, neighbour};

use jiff::Timestamp;
use jiff::tz::TimeZone;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Padding, Paragraph};

use crate::controller::{ActivityLevel, ActivityLine, SessionSnapshot};

fn muted() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn normal() -> Style {
    Style::default().fg(Color::Gray)
}

fn highlight() -> Style {
    Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

fn level_style(level: ActivityLevel) -> Style {
    match level {
        ActivityLevel::Info => normal(),
        ActivityLevel::Success => Style::default().fg(Color::Green),
        ActivityLevel::Warn => Style::default().fg(Color::Yellow),
        ActivityLevel::Error => Style::default().fg(Color::Red),
    }
}

/// `HH:MM:SS` in the local time zone.
fn local_time(at: Timestamp) -> String {
    at.to_zoned(TimeZone::system())
        .strftime("%H:%M:%S")
        .to_string()
}

fn render_title(frame: &mut Frame, area: Rect, subtitle: &str) {
    let title = Paragraph::new(Line::from(vec![
        Span::styled("scantui", highlight()),
        Span::styled(format!("  {subtitle}"), muted()),
    ]))
    .block(Block::default().padding(Padding::new(2, 0, 1, 0)));
    frame.render_widget(title, area);
}

/// Status on the left, the last error (if any) after it.
fn status_line(snapshot: &SessionSnapshot) -> Line<'static> {
    let mut spans = vec![Span::styled(snapshot.status.clone(), normal())];
    if snapshot.state.queued_scan_requested {
        spans.push(Span::styled("  (1 queued)", Style::default().fg(Color::Yellow)));
    }
    if let Some(error) = &snapshot.state.last_error {
        spans.push(Span::styled(
            format!("  Error: {error}"),
            Style::default().fg(Color::Red),
        ));
    }
    Line::from(spans)
}

/// The newest activity lines that fit in `height`, oldest first.
fn activity_lines(lines: &[ActivityLine], height: usize) -> Vec<Line<'static>> {
    let skip = lines.len().saturating_sub(height);
    lines[skip..]
        .iter()
        .map(|line| {
            Line::from(vec![
                Span::styled(format!("{} ", local_time(line.at)), muted()),
                Span::styled(line.text.clone(), level_style(line.level)),
            ])
        })
        .collect()
}

fn render_activity(frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
    let block = Block::bordered()
        .title(" Activity ")
        .border_style(muted())
        .padding(Padding::horizontal(1));
    let height = block.inner(area).height as usize;
    let log = Paragraph::new(activity_lines(&snapshot.activity, height)).block(block);
    frame.render_widget(log, area);
}

fn render_help(frame: &mut Frame, area: Rect, keys: &str) {
    let help = Paragraph::new(Line::from(vec![Span::styled(format!(" {keys}"), muted())]));
    frame.render_widget(help, area);
}
