//! Device selection screen.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, List, ListItem, Padding, Paragraph};

use crate::controller::SessionSnapshot;
use crate::model::DeviceHandle;

use super::{highlight, muted, normal, render_activity, render_help, render_title, status_line};

pub struct SelectScreen<'a> {
    snapshot: &'a SessionSnapshot,
}

impl<'a> SelectScreen<'a> {
    pub fn new(snapshot: &'a SessionSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::vertical([
            Constraint::Length(3), // title
            Constraint::Min(3),    // devices
            Constraint::Length(1), // status
            Constraint::Length(8), // activity
            Constraint::Length(1), // help
        ])
        .split(frame.area());

        render_title(frame, chunks[0], "Select a scanner");

        let selected = self.snapshot.selected_device.as_ref();
        let items: Vec<ListItem> = if self.snapshot.devices.is_empty() {
            let text = if self.snapshot.refreshing {
                "Looking for scanners…"
            } else {
                "No scanners found. Press r to look again."
            };
            vec![ListItem::new(Line::from(Span::styled(text, muted())))]
        } else {
            self.snapshot
                .devices
                .iter()
                .map(|device| {
                    let is_selected = selected.is_some_and(|s| s.id == device.id);
                    let style = if is_selected { highlight() } else { normal() };
                    let pointer = if is_selected { "› " } else { "  " };
                    ListItem::new(Line::from(vec![
                        Span::styled(pointer, style),
                        Span::styled(device.display_name.clone(), style),
                        Span::styled(format!("  {}", device.short_id()), muted()),
                    ]))
                })
                .collect()
        };
        let list = List::new(items).block(Block::default().padding(Padding::new(2, 2, 0, 0)));
        frame.render_widget(list, chunks[1]);

        frame.render_widget(Paragraph::new(status_line(self.snapshot)), chunks[2]);
        render_activity(frame, chunks[3], self.snapshot);

        let auto = if self.snapshot.settings.auto_continue_on_single_device {
            "on"
        } else {
            "off"
        };
        render_help(
            frame,
            chunks[4],
            &format!("↑↓ choose  ⏎ continue  r refresh  u auto-continue ({auto})  q quit"),
        );
    }
}

/// The device one step up or down from `selected`, clamped at the ends.
/// With nothing selected, the first device.
pub fn neighbour<'d>(
    devices: &'d [DeviceHandle],
    selected: Option<&DeviceHandle>,
    down: bool,
) -> Option<&'d DeviceHandle> {
    let current = selected.and_then(|s| devices.iter().position(|d| d.id == s.id));
    let index = match current {
        None => 0,
        Some(i) if down => (i + 1).min(devices.len().saturating_sub(1)),
        Some(i) => i.saturating_sub(1),
    };
    devices.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> Vec<DeviceHandle> {
        vec![
            DeviceHandle::new("a", "A"),
            DeviceHandle::new("b", "B"),
            DeviceHandle::new("c", "C"),
        ]
    }

    #[test]
    fn moves_and_clamps() {
        let list = devices();
        assert_eq!(neighbour(&list, Some(&list[0]), true).unwrap().id, "b");
        assert_eq!(neighbour(&list, Some(&list[2]), true).unwrap().id, "c");
        assert_eq!(neighbour(&list, Some(&list[1]), false).unwrap().id, "a");
        assert_eq!(neighbour(&list, Some(&list[0]), false).unwrap().id, "a");
    }

    #[test]
    fn starts_at_first_without_selection() {
        let list = devices();
        assert_eq!(neighbour(&list, None, true).unwrap().id, "a");

        let stranger = DeviceHandle::new("zz", "zz");
        assert_eq!(neighbour(&list, Some(&stranger), false).unwrap().id, "a");
    }

    #[test]
    fn empty_list() {
        assert!(neighbour(&[], None, true).is_none());
    }
}
