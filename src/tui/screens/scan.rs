//! Scan screen: current settings, session totals, and the activity log.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Padding, Paragraph};

use crate::controller::SessionSnapshot;
use crate::disk::format_bytes;
use crate::tui::app::Edit;

use super::{
    highlight, local_time, muted, normal, render_activity, render_help, render_title, status_line,
};

const KEYS: &str = "space scan  b back  p prefix  o dir  e extra  t/y date  1/2/3 preset  \
                    g gray  d dpi  s source  m format  a more  v/w open  x/c/z clear  q quit";

const EDIT_KEYS: &str = "⏎ save  esc cancel";

pub struct ScanScreen<'a> {
    snapshot: &'a SessionSnapshot,
    edit: Option<&'a Edit>,
}

impl<'a> ScanScreen<'a> {
    pub fn new(snapshot: &'a SessionSnapshot, edit: Option<&'a Edit>) -> Self {
        Self { snapshot, edit }
    }

    pub fn render(&self, frame: &mut Frame) {
        let settings = settings_lines(self.snapshot);
        let stats = stats_lines(self.snapshot);
        let chunks = Layout::vertical([
            Constraint::Length(3),                      // title
            Constraint::Length(boxed_height(&settings)), // settings
            Constraint::Length(boxed_height(&stats)),    // totals
            Constraint::Length(1),                      // status or input
            Constraint::Min(4),                         // activity
            Constraint::Length(1),                      // help
        ])
        .split(frame.area());

        let device = self
            .snapshot
            .selected_device
            .as_ref()
            .map_or_else(|| "No scanner".to_string(), |d| d.label());
        render_title(frame, chunks[0], &device);

        let boxed = |title: &'static str| {
            Block::bordered()
                .title(title)
                .border_style(muted())
                .padding(Padding::horizontal(1))
        };
        frame.render_widget(Paragraph::new(settings).block(boxed(" Settings ")), chunks[1]);
        frame.render_widget(Paragraph::new(stats).block(boxed(" Session ")), chunks[2]);

        match self.edit {
            Some(edit) => {
                let input = Line::from(vec![
                    Span::styled(format!("{}: ", edit.field.label()), highlight()),
                    Span::styled(edit.input.clone(), normal()),
                    Span::styled("█", muted()),
                ]);
                frame.render_widget(Paragraph::new(input), chunks[3]);
            }
            None => frame.render_widget(Paragraph::new(status_line(self.snapshot)), chunks[3]),
        }

        render_activity(frame, chunks[4], self.snapshot);
        render_help(
            frame,
            chunks[5],
            if self.edit.is_some() { EDIT_KEYS } else { KEYS },
        );
    }
}

/// Rows for `lines` plus a border above and below.
fn boxed_height(lines: &[Line<'_>]) -> u16 {
    u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(2)
}

fn field(label: &str, value: String) -> Vec<Span<'static>> {
    vec![
        Span::styled(format!("{label}: "), muted()),
        Span::styled(value, normal()),
    ]
}

fn settings_lines(snapshot: &SessionSnapshot) -> Vec<Line<'static>> {
    let s = &snapshot.settings;
    let next = snapshot
        .next_file
        .as_ref()
        .and_then(|p| p.file_name())
        .map_or_else(|| "-".to_string(), |n| n.to_string_lossy().into_owned());
    let free = snapshot
        .free_space
        .map(|b| format!("  ({} free)", format_bytes(b)))
        .unwrap_or_default();
    let resolution = if s.resolution_dpi == 0 {
        "auto".to_string()
    } else {
        format!("{} DPI", s.resolution_dpi)
    };

    let mut prefix = field("Prefix", s.prefix.clone());
    prefix.extend(field("   Next", next));

    let mut output = field("Output", s.output_dir.display().to_string());
    output.push(Span::styled(free, muted()));

    let mut format = field("Format", s.format.as_str().to_uppercase());
    format.extend(field("   Resolution", resolution));
    format.extend(field("   Mode", s.mode.label().to_string()));
    format.extend(field("   Source", s.source.label().to_string()));

    let mut lines = vec![Line::from(prefix), Line::from(output), Line::from(format)];
    if s.advanced_visible {
        let extra = if s.extra_args.is_empty() {
            "(none)".to_string()
        } else {
            s.extra_args.clone()
        };
        let auto = if s.auto_continue_on_single_device { "on" } else { "off" };
        let mut advanced = field("Extra args", extra);
        advanced.extend(field("   Auto-continue", auto.to_string()));
        lines.push(Line::from(advanced));
    }
    lines
}

fn stats_lines(snapshot: &SessionSnapshot) -> Vec<Line<'static>> {
    let stats = &snapshot.stats;
    let average = stats
        .average_seconds()
        .map_or_else(|| "-".to_string(), |a| format!("{a:.1}s"));

    let mut totals = field("Scans", stats.scan_count.to_string());
    totals.extend(field("   Size", format_bytes(stats.total_bytes)));
    totals.extend(field("   Time", format!("{:.1}s", stats.total_seconds)));
    totals.extend(field("   Avg", average));

    let mut last = match &snapshot.last_saved {
        Some(path) => vec![
            Span::styled("Last: ", muted()),
            Span::styled(path.display().to_string(), Style::default().fg(Color::Green)),
        ],
        None => field("Last", "-".to_string()),
    };
    if let Some(at) = snapshot.last_scan_at {
        last.push(Span::styled(format!("  at {}", local_time(at)), muted()));
    }

    vec![Line::from(totals), Line::from(last)]
}
