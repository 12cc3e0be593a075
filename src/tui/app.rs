//! Application loop and key routing.
//!
//! The loop only reads snapshots and forwards keys. Scans and device
//! refreshes run on their own threads, so the screen keeps updating while
//! the scanner works.

use std::io::{self, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use jiff::Timestamp;
use ratatui::DefaultTerminal;
use tracing::debug;

use crate::controller::{ScanController, SessionSnapshot};
use crate::model::{Preset, ScanSettings, Stage};

use super::screens::{ScanScreen, SelectScreen, neighbour};

/// Redraw interval while no key is pressed.
const TICK: Duration = Duration::from_millis(200);

/// A settings field that is typed rather than cycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Prefix,
    OutputDir,
    ExtraArgs,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Self::Prefix => "Prefix",
            Self::OutputDir => "Output dir",
            Self::ExtraArgs => "Extra args",
        }
    }
}

/// Text being edited. Nothing is saved until Enter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub field: Field,
    pub input: String,
}

impl Edit {
    /// Start editing `field` from its current value.
    pub fn new(field: Field, settings: &ScanSettings) -> Self {
        let input = match field {
            Field::Prefix => settings.prefix.clone(),
            Field::OutputDir => settings.output_dir.display().to_string(),
            Field::ExtraArgs => settings.extra_args.clone(),
        };
        Self { field, input }
    }

    pub fn on_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn on_backspace(&mut self) {
        self.input.pop();
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct App {
    controller: Arc<ScanController>,
    edit: Option<Edit>,

    /// Last completed scan already announced with the bell.
    announced: Option<Timestamp>,
}

/// Runs the session until the operator quits.
pub fn run(controller: Arc<ScanController>) -> io::Result<()> {
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, controller);
    ratatui::restore();
    result
}

fn event_loop(terminal: &mut DefaultTerminal, controller: Arc<ScanController>) -> io::Result<()> {
    let mut app = App {
        controller,
        edit: None,
        announced: None,
    };
    app.refresh();

    loop {
        let snapshot = app.controller.current_state();
        app.announce(&snapshot)?;

        terminal.draw(|frame| match snapshot.state.stage {
            Stage::SelectingDevice => SelectScreen::new(&snapshot).render(frame),
            Stage::Ready => ScanScreen::new(&snapshot, app.edit.as_ref()).render(frame),
        })?;

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.on_key(key) == Flow::Quit {
                return Ok(());
            }
        }
    }
}

impl App {
    /// Ring the terminal bell once per completed scan.
    fn announce(&mut self, snapshot: &SessionSnapshot) -> io::Result<()> {
        if snapshot.last_scan_at.is_some() && snapshot.last_scan_at != self.announced {
            self.announced = snapshot.last_scan_at;
            let mut out = io::stdout();
            out.write_all(b"\x07")?;
            out.flush()?;
        }
        Ok(())
    }

    fn refresh(&self) {
        let controller = Arc::clone(&self.controller);
        thread::spawn(move || {
            if let Err(e) = controller.refresh_devices() {
                debug!(error = %e, "refresh failed");
            }
        });
    }

    fn scan(&self) {
        let controller = Arc::clone(&self.controller);
        thread::spawn(move || {
            let result = controller.request_scan();
            debug!(?result, "scan request finished");
        });
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        if let Some(edit) = &mut self.edit {
            match key.code {
                KeyCode::Enter => self.commit_edit(),
                KeyCode::Esc => self.edit = None,
                KeyCode::Backspace => edit.on_backspace(),
                KeyCode::Char(c) => edit.on_char(c),
                _ => {}
            }
            return Flow::Continue;
        }

        let snapshot = self.controller.current_state();
        match snapshot.state.stage {
            Stage::SelectingDevice => self.on_select_key(key, &snapshot),
            Stage::Ready => self.on_scan_key(key, &snapshot),
        }
    }

    fn commit_edit(&mut self) {
        let Some(edit) = self.edit.take() else {
            return;
        };
        let c = &self.controller;
        match edit.field {
            Field::Prefix => c.set_prefix(&edit.input),
            Field::OutputDir => c.set_output_dir(&edit.input),
            Field::ExtraArgs => c.set_extra_args(&edit.input),
        }
    }

    fn on_select_key(&self, key: KeyEvent, snapshot: &SessionSnapshot) -> Flow {
        let c = &self.controller;
        match key.code {
            KeyCode::Char('q') if c.request_quit() => return Flow::Quit,
            KeyCode::Char('r') | KeyCode::F(5) => self.refresh(),
            KeyCode::Up | KeyCode::Char('k') | KeyCode::Down | KeyCode::Char('j') => {
                let down = matches!(key.code, KeyCode::Down | KeyCode::Char('j'));
                let target = neighbour(
                    &snapshot.devices,
                    snapshot.selected_device.as_ref(),
                    down,
                );
                if let Some(device) = target {
                    c.select_device(&device.id);
                }
            }
            KeyCode::Enter => {
                if let Err(e) = c.confirm_device() {
                    debug!(error = %e, "confirm refused");
                }
            }
            KeyCode::Char('u') => c.toggle_auto_continue(),
            KeyCode::Char('x') => c.clear_last_error(),
            KeyCode::Char('c') => c.clear_log(),
            _ => {}
        }
        Flow::Continue
    }

    fn on_scan_key(&mut self, key: KeyEvent, snapshot: &SessionSnapshot) -> Flow {
        let c = &self.controller;
        match key.code {
            KeyCode::Char('q') if c.request_quit() => return Flow::Quit,
            KeyCode::Char(' ') | KeyCode::Enter => self.scan(),
            KeyCode::Char('b') | KeyCode::Esc => c.back(),
            KeyCode::Char('r') | KeyCode::F(5) => self.refresh(),
            KeyCode::Char('p') => self.edit = Some(Edit::new(Field::Prefix, &snapshot.settings)),
            KeyCode::Char('o') => {
                self.edit = Some(Edit::new(Field::OutputDir, &snapshot.settings));
            }
            KeyCode::Char('e') => {
                self.edit = Some(Edit::new(Field::ExtraArgs, &snapshot.settings));
            }
            KeyCode::Char('t') => c.use_date_prefix(),
            KeyCode::Char('y') => c.use_date_dir(),
            KeyCode::Char('g') => c.toggle_gray(),
            KeyCode::Char('d') => c.cycle_resolution(),
            KeyCode::Char('s') => c.cycle_source(),
            KeyCode::Char('m') => c.cycle_format(),
            KeyCode::Char('1') => c.apply_preset(Preset::Document),
            KeyCode::Char('2') => c.apply_preset(Preset::Photo),
            KeyCode::Char('3') => c.apply_preset(Preset::Draft),
            KeyCode::Char('a') => c.toggle_advanced(),
            KeyCode::Char('u') => c.toggle_auto_continue(),
            KeyCode::Char('x') => c.clear_last_error(),
            KeyCode::Char('c') => c.clear_log(),
            KeyCode::Char('z') => c.reset_stats(),
            KeyCode::Char('v') => c.open_last_scan(),
            KeyCode::Char('w') => c.open_output_dir(),
            _ => {}
        }
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    fn settings() -> ScanSettings {
        ScanSettings {
            prefix: "invoice".into(),
            output_dir: PathBuf::from("/srv/scans"),
            extra_args: "--brightness 10".into(),
            ..ScanSettings::default()
        }
    }

    #[test]
    fn edit_starts_from_current_value() {
        let s = settings();
        assert_eq!(Edit::new(Field::Prefix, &s).input, "invoice");
        assert_eq!(Edit::new(Field::OutputDir, &s).input, "/srv/scans");
        assert_eq!(Edit::new(Field::ExtraArgs, &s).input, "--brightness 10");
    }

    #[test]
    fn typing_and_backspace() {
        let mut edit = Edit::new(Field::Prefix, &settings());
        edit.on_backspace();
        edit.on_backspace();
        for c in "ces".chars() {
            edit.on_char(c);
        }
        assert_eq!(edit.input, "invoices");
    }

    #[test]
    fn backspace_on_empty_is_harmless() {
        let mut edit = Edit::new(Field::ExtraArgs, &ScanSettings::default());
        edit.on_backspace();
        assert!(edit.input.is_empty());
    }
}
