//! Application state and TUI event loop.
//!
//! [`App`] owns the theme, the selection and the ingestion status. Every tick
//! it takes a fresh [`StoreSnapshot`] from the shared store and redraws the
//! cluster table, so the table follows new records and aging without any
//! explicit notification.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use tokio::sync::mpsc;

use logspark_core::error::SparkError;
use logspark_core::store::{SharedStore, StoreSnapshot};
use logspark_runtime::ingest::IngestOutcome;
use logspark_runtime::orchestrator::RuntimeEvent;

use crate::detail_view;
use crate::table_view;
use crate::themes::Theme;

/// Redraw interval; also bounds key latency.
const TICK_RATE: Duration = Duration::from_millis(100);

// ── Status types ──────────────────────────────────────────────────────────────

/// What the status line reports about the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestStatus {
    /// Records may still arrive.
    Reading,
    /// The input ended normally.
    Exhausted { pushed: u64, skipped: u64 },
    /// The ingestion task went away without reporting.
    Lost,
}

/// Why the event loop returned.
#[derive(Debug)]
pub enum SessionEnd {
    /// The user quit.
    Quit,
    /// Ingestion stopped on an error; the caller reports it and exits non-zero.
    IngestFailed(SparkError),
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state.
pub struct App {
    /// Active colour theme.
    pub theme: Theme,
    store: SharedStore,
    /// Highlighted row, `None` until the user moves the selection.
    pub selected: Option<usize>,
    /// Whether the sample panel is shown next to the table.
    pub detail_open: bool,
    pub ingest: IngestStatus,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    failure: Option<SparkError>,
}

impl App {
    pub fn new(theme_name: &str, store: SharedStore) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            store,
            selected: None,
            detail_open: false,
            ingest: IngestStatus::Reading,
            should_quit: false,
            failure: None,
        }
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the TUI until the user quits or ingestion fails.
    ///
    /// Key events are polled synchronously with a short timeout; runtime
    /// events arrive on `rx` and are drained with `try_recv` each tick. The
    /// terminal is restored even when drawing fails.
    pub async fn run(mut self, mut rx: mpsc::Receiver<RuntimeEvent>) -> io::Result<SessionEnd> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal, &mut rx);

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result?;
        Ok(match self.failure.take() {
            Some(error) => SessionEnd::IngestFailed(error),
            None => SessionEnd::Quit,
        })
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        rx: &mut mpsc::Receiver<RuntimeEvent>,
    ) -> io::Result<()> {
        loop {
            terminal.draw(|frame| self.render(frame))?;

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }

            // Drain pending runtime events (non-blocking).
            loop {
                match rx.try_recv() {
                    Ok(ev) => self.handle_runtime_event(ev),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        if self.ingest == IngestStatus::Reading {
                            tracing::warn!("ingestion task ended without an outcome");
                            self.ingest = IngestStatus::Lost;
                        }
                        break;
                    }
                }
            }

            if self.should_quit {
                return Ok(());
            }
        }
    }

    // ── Input handling ────────────────────────────────────────────────────────

    /// Apply one key press to the selection and panel state.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        let rows = self.store.len();

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') if rows > 0 => {
                self.selected = Some(match self.selected {
                    Some(i) => (i + 1).min(rows - 1),
                    None => 0,
                });
            }
            KeyCode::Up | KeyCode::Char('k') if rows > 0 => {
                self.selected = Some(self.selected.map_or(0, |i| i.saturating_sub(1)));
            }
            KeyCode::Home if rows > 0 => self.selected = Some(0),
            KeyCode::End if rows > 0 => self.selected = Some(rows - 1),
            KeyCode::Enter if rows > 0 => {
                self.selected.get_or_insert(0);
                self.detail_open = true;
            }
            KeyCode::Esc => {
                if self.detail_open {
                    self.detail_open = false;
                } else {
                    self.selected = None;
                }
            }
            _ => {}
        }
    }

    /// Record an ingestion outcome; a failure ends the session.
    pub fn handle_runtime_event(&mut self, ev: RuntimeEvent) {
        match ev {
            RuntimeEvent::IngestFinished(IngestOutcome::Exhausted { pushed, skipped }) => {
                self.ingest = IngestStatus::Exhausted { pushed, skipped };
            }
            RuntimeEvent::IngestFinished(IngestOutcome::Failed { error, .. }) => {
                self.failure = Some(error);
                self.should_quit = true;
            }
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Render the current store contents into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let snapshot = self.store.snapshot();
        let selected = self
            .selected
            .filter(|_| !snapshot.rows.is_empty())
            .map(|i| i.min(snapshot.rows.len() - 1));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(frame.area());

        if snapshot.rows.is_empty() {
            table_view::render_no_data(frame, chunks[0], &self.theme);
        } else if self.detail_open {
            let halves = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[0]);
            table_view::render_cluster_table(frame, halves[0], &snapshot, selected, &self.theme);
            let sample = selected.and_then(|i| snapshot.rows.get(i)).map(|r| &*r.sample);
            detail_view::render_detail(frame, halves[1], sample, &self.theme);
        } else {
            table_view::render_cluster_table(frame, chunks[0], &snapshot, selected, &self.theme);
        }

        self.render_status(frame, chunks[1], &snapshot);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, snapshot: &StoreSnapshot) {
        let records: u64 = snapshot.rows.iter().map(|r| r.count).sum();
        let state = match &self.ingest {
            IngestStatus::Reading => Span::styled("reading", self.theme.success),
            IngestStatus::Exhausted { pushed, skipped } if *skipped > 0 => Span::styled(
                format!("input ended ({pushed} read, {skipped} skipped)"),
                self.theme.warning,
            ),
            IngestStatus::Exhausted { pushed, .. } => {
                Span::styled(format!("input ended ({pushed} read)"), self.theme.info)
            }
            IngestStatus::Lost => Span::styled("input lost", self.theme.error),
        };

        let line = Line::from(vec![
            Span::styled(
                format!(" {} clusters  {} records  ", snapshot.rows.len(), records),
                self.theme.label,
            ),
            state,
            Span::styled(
                "  [↑↓] select  [enter] sample  [esc] close  [q] quit",
                self.theme.dim,
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
