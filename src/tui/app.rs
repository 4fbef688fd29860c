//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Service integration

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::forest::ForestPredictor;
use crate::application::RecommendationService;
use crate::config::AppConfig;

use super::ui::{
    form::{render_form, FormState},
    render_disclaimer,
    result::{render_result, ResultState},
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Form,
    Result,
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,

    /// Loaded once; stays unavailable for the whole run if loading failed.
    service: RecommendationService<ForestPredictor>,

    /// Shown in the model status banner.
    model_path: PathBuf,

    form_state: FormState,
    result_state: ResultState,
}

impl App {
    /// Create the application, loading the configured model.
    ///
    /// A missing or unusable model does not fail startup; the form shows
    /// the reason and every request is rejected.
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        let service = RecommendationService::load(&config.model);
        Self::with_service(service, config.model.path.clone())
    }

    /// Create application with an injected service (Composition Root pattern).
    #[must_use]
    pub fn with_service(
        service: RecommendationService<ForestPredictor>,
        model_path: PathBuf,
    ) -> Self {
        Self {
            screen: Screen::Form,
            should_quit: false,
            service,
            model_path,
            form_state: FormState::default(),
            result_state: ResultState::default(),
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        self.form_state.clear_sensitive();
        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                match self.screen {
                    Screen::Form => render_form(
                        f,
                        chunks[0],
                        &self.form_state,
                        self.service.status(),
                        &self.model_path,
                    ),
                    Screen::Result => render_result(f, chunks[0], &self.result_state),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    // Windows reports releases too.
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Form => self.handle_form_key(key),
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::BackTab => self.form_state.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.form_state.next_field(),
            KeyCode::Left => self.form_state.cycle_option(false),
            KeyCode::Right => self.form_state.cycle_option(true),
            KeyCode::Char('s') | KeyCode::Char('S') => self.form_state.load_sample_data(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.form_state.reset(),
            KeyCode::Char(c) => self.form_state.input_char(c),
            KeyCode::Backspace => self.form_state.delete_char(),
            KeyCode::Delete => self.form_state.clear_field(),
            KeyCode::Enter => self.submit_form(),
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter => self.screen = Screen::Form,
            KeyCode::Char('d') | KeyCode::Char('D') => self.result_state.toggle_debug(),
            KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        let input = match self.form_state.to_raw_input() {
            Ok(input) => input,
            Err(e) => {
                self.form_state.error_message = Some(e);
                return;
            }
        };

        // Show the clamped values that were actually submitted.
        self.form_state.show_input(&input);

        let outcome = self.service.generate(&input);
        if let Err(e) = &outcome {
            tracing::warn!("Recommendation request failed: {}", e);
        }
        self.result_state = ResultState::from_outcome(outcome);
        self.screen = Screen::Result;
    }
}
