//! TUI for the soundboard
//!
//! Effect list on the left, oscilloscope and spectrum of the live output on
//! the right.

mod spectrum;
mod waveform;

use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    DefaultTerminal, Frame,
};

use spectrum::{render_spectrum, SpectrumAnalyzer};
use waveform::render_waveform;

use super::app::Soundboard;

/// Audio visualization buffer size
pub const VIS_BUFFER_SIZE: usize = 1024;

/// How often finished chains are dropped from the render context.
const PRUNE_INTERVAL: Duration = Duration::from_millis(250);

/// UI application state
pub struct UiApp {
    effects: Vec<String>,
    selection: ListState,
    /// Last play result shown in the status line
    status: String,
    audio_buffer: Vec<f32>,
    incoming: Vec<f32>,
    analyzer: SpectrumAnalyzer,
    should_quit: bool,
}

impl UiApp {
    pub fn new(effects: Vec<String>, sample_rate: f32) -> Self {
        let mut selection = ListState::default();
        selection.select(if effects.is_empty() { None } else { Some(0) });
        Self {
            effects,
            selection,
            status: String::from("ready"),
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            incoming: Vec::with_capacity(VIS_BUFFER_SIZE * 8),
            analyzer: SpectrumAnalyzer::new(VIS_BUFFER_SIZE, sample_rate),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal, board: &mut Soundboard) -> EyreResult<()> {
        let mut last_prune = Instant::now();

        while !self.should_quit {
            self.poll_audio(board);

            if last_prune.elapsed() >= PRUNE_INTERVAL {
                board.prune()?;
                last_prune = Instant::now();
            }

            terminal.draw(|frame| self.render(frame))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, board);
                    }
                }
            }
        }

        Ok(())
    }

    /// Keep the newest VIS_BUFFER_SIZE samples from the tap.
    fn poll_audio(&mut self, board: &mut Soundboard) {
        self.incoming.clear();
        board.drain_tap(&mut self.incoming);
        if self.incoming.is_empty() {
            return;
        }

        self.audio_buffer.extend_from_slice(&self.incoming);
        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
        self.analyzer.update(&self.audio_buffer);
    }

    fn handle_key(&mut self, key: KeyCode, board: &Soundboard) {
        let count = self.effects.len();
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Down | KeyCode::Char('j') if count > 0 => {
                let next = self.selection.selected().map_or(0, |i| (i + 1) % count);
                self.selection.select(Some(next));
            }
            KeyCode::Up | KeyCode::Char('k') if count > 0 => {
                let prev = self
                    .selection
                    .selected()
                    .map_or(0, |i| (i + count - 1) % count);
                self.selection.select(Some(prev));
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(name) = self.selection.selected().and_then(|i| self.effects.get(i)) {
                    self.status = match board.play(name) {
                        Ok(()) => format!("played {name}"),
                        Err(err) => format!("{name}: {err}"),
                    };
                }
            }
            _ => {}
        }
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(8),    // Main area
                Constraint::Length(1), // Status line
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(24), Constraint::Min(20)])
            .split(rows[0]);

        let scopes = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);

        let items: Vec<ListItem> = self
            .effects
            .iter()
            .map(|name| ListItem::new(name.as_str()))
            .collect();
        let list = List::new(items)
            .block(Block::default().title(" Effects ").borders(Borders::ALL))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, columns[0], &mut self.selection);

        render_waveform(frame, scopes[0], &self.audio_buffer);
        render_spectrum(frame, scopes[1], self.analyzer.data());

        let status = Paragraph::new(format!(" {}", self.status));
        frame.render_widget(status, rows[1]);

        let help = Paragraph::new(" [Enter] Play  [Up/Down] Select  [Q] Quit")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, rows[2]);
    }
}
