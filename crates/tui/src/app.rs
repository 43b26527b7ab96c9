use std::{io, sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use qeid_core::{
    backend::BackendClient,
    engine::MatchEngine,
    form::RoundForm,
    game::MatchState,
    models::{Multiplier, ProjectType, RoundMode, Team},
    rating::SharedRatingTracker,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{spawn, sync::mpsc};
use tracing::info;

use crate::block_font;

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_TICKET_LEN: usize = 500;

#[derive(Debug, Clone)]
struct Theme {
    fg: Color,
    accent: Color,
    muted: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Board,
    AddRound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Mode,
    Multiplier,
    DoubleProjects,
    AutoComplete,
    ProjectsUs,
    ProjectsThem,
    BaseUs,
    BaseThem,
    CoffeeWinner,
}

impl FormField {
    fn label(self) -> &'static str {
        match self {
            FormField::Mode => "Mode",
            FormField::Multiplier => "Multiplier",
            FormField::DoubleProjects => "Double projects",
            FormField::AutoComplete => "Auto-complete",
            FormField::ProjectsUs => "Projects (Us)",
            FormField::ProjectsThem => "Projects (Them)",
            FormField::BaseUs => "Base (Us)",
            FormField::BaseThem => "Base (Them)",
            FormField::CoffeeWinner => "Coffee winner",
        }
    }
}

#[derive(Debug, Clone, Default)]
struct TicketModal {
    input: String,
    submitting: bool,
}

#[derive(Debug, Clone)]
enum Modal {
    ConfirmReset,
    Winner(Team),
    RatePrompt,
    Ticket(TicketModal),
}

enum AppEvent {
    Input(Event),
    Tick,
    TicketSubmitted(Result<(), String>),
}

/// High-level application state for the scorekeeper TUI.
pub struct QeidApp {
    engine: MatchEngine,
    rating: SharedRatingTracker,
    backend: Option<Arc<BackendClient>>,
    screen: Screen,
    form: RoundForm,
    form_field: FormField,
    project_cursor: usize,
    round_cursor: usize,
    modal: Option<Modal>,
    status: String,
    should_quit: bool,
    theme: Theme,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    /// Winner modal already shown for the current won state.
    win_seen: bool,
    rate_prompt_pending: bool,
}

impl QeidApp {
    pub fn new(
        engine: MatchEngine,
        rating: SharedRatingTracker,
        backend: Option<Arc<BackendClient>>,
    ) -> Self {
        // A match loaded as already won should not greet the user with
        // the winner modal again.
        let win_seen = engine.winner().is_some();
        Self {
            engine,
            rating,
            backend,
            screen: Screen::Board,
            form: RoundForm::new(),
            form_field: FormField::Mode,
            project_cursor: 0,
            round_cursor: 0,
            modal: None,
            status: "Ready".to_string(),
            should_quit: false,
            theme: Theme::default(),
            event_tx: None,
            win_seen,
            rate_prompt_pending: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let rounds = self.engine.game().rounds.len();
        if rounds > 0 {
            self.status = format!("Restored match with {rounds} round(s)");
            self.round_cursor = rounds - 1;
        }

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            match event_rx.recv().await {
                Some(AppEvent::Input(Event::Key(key))) => {
                    if let Err(err) = self.handle_key(key) {
                        self.status = format!("Error: {err}");
                    }
                }
                Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => {}
                Some(AppEvent::TicketSubmitted(result)) => self.handle_ticket_result(result),
                None => break,
            }

            if self.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    // ---- key handling -------------------------------------------------

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.modal.is_some() {
            self.handle_modal_key(key);
            return Ok(());
        }
        match self.screen {
            Screen::Board => self.handle_board_key(key),
            Screen::AddRound => self.handle_form_key(key),
        }
        Ok(())
    }

    fn handle_board_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.should_quit = true,
            KeyCode::Char('a') if key.modifiers.is_empty() => self.open_add_round(),
            KeyCode::Char('u') if key.modifiers.is_empty() => {
                if self.engine.can_undo() {
                    self.engine.undo_last_round();
                    self.clamp_round_cursor();
                    self.after_mutation("Round undone");
                } else {
                    self.status = "Nothing to undo".to_string();
                }
            }
            KeyCode::Char('r') if key.modifiers.is_empty() => {
                if self.engine.can_redo() {
                    self.engine.redo_last_round();
                    self.round_cursor = self.engine.game().rounds.len().saturating_sub(1);
                    self.after_mutation("Round restored");
                } else {
                    self.status = "Nothing to redo".to_string();
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected_round(),
            KeyCode::Char('n') if key.modifiers.is_empty() => {
                if self.engine.state() == MatchState::Empty {
                    self.status = "Match is already empty".to_string();
                } else {
                    self.modal = Some(Modal::ConfirmReset);
                }
            }
            KeyCode::Char('t') if key.modifiers.is_empty() => {
                if self.backend.is_some() {
                    self.modal = Some(Modal::Ticket(TicketModal::default()));
                } else {
                    self.status = "Support tickets need backend_enabled = true".to_string();
                }
            }
            KeyCode::Char('s') if key.modifiers.is_empty() => {
                self.status = self.engine.score_line();
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_round_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_round_cursor(-1),
            KeyCode::Home => self.round_cursor = 0,
            KeyCode::End => self.round_cursor = self.engine.game().rounds.len().saturating_sub(1),
            _ => {}
        }
    }

    fn open_add_round(&mut self) {
        self.form = RoundForm::new();
        self.form_field = FormField::Mode;
        self.project_cursor = 0;
        self.screen = Screen::AddRound;
        self.status = "Tab/↑↓ move, ←→ change, Space toggle, Enter save, Esc cancel".to_string();
    }

    fn delete_selected_round(&mut self) {
        let Some(round) = self.engine.game().rounds.get(self.round_cursor) else {
            self.status = "No round selected".to_string();
            return;
        };
        let id = round.id;
        let index = round.index;
        self.engine.delete_round(id);
        self.clamp_round_cursor();
        self.after_mutation(&format!("Deleted round {index}"));
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.screen = Screen::Board;
                self.status = "Round discarded".to_string();
            }
            KeyCode::Tab | KeyCode::Down => self.move_form_field(1),
            KeyCode::BackTab | KeyCode::Up => self.move_form_field(-1),
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Char(' ') => self.toggle_field(),
            KeyCode::Char(ch) if ch.is_ascii_digit() => self.type_digit(ch),
            KeyCode::Backspace => self.erase_digit(),
            KeyCode::Enter => self.commit_round(),
            _ => {}
        }
    }

    fn form_fields(&self) -> Vec<FormField> {
        let mut fields = vec![
            FormField::Mode,
            FormField::Multiplier,
            FormField::DoubleProjects,
        ];
        if self.form.is_coffee_round() {
            fields.push(FormField::CoffeeWinner);
        } else {
            fields.push(FormField::AutoComplete);
        }
        fields.push(FormField::ProjectsUs);
        fields.push(FormField::ProjectsThem);
        if !self.form.is_coffee_round() {
            fields.push(FormField::BaseUs);
            fields.push(FormField::BaseThem);
        }
        fields
    }

    fn move_form_field(&mut self, delta: isize) {
        let fields = self.form_fields();
        let current = fields
            .iter()
            .position(|field| *field == self.form_field)
            .unwrap_or(0);
        let len = fields.len() as isize;
        let next = (current as isize + delta).rem_euclid(len) as usize;
        self.form_field = fields[next];
        self.clamp_project_cursor();
    }

    fn adjust_field(&mut self, delta: isize) {
        let rules = self.engine.rules().clone();
        match self.form_field {
            FormField::Mode => {
                let next = match self.form.mode {
                    RoundMode::Sun => RoundMode::Hokom,
                    RoundMode::Hokom => RoundMode::Sun,
                };
                self.form.set_mode(next, &rules);
                self.clamp_project_cursor();
            }
            FormField::Multiplier => {
                let options = Multiplier::ALL;
                let current = options
                    .iter()
                    .position(|option| *option == self.form.multiplier)
                    .unwrap_or(0);
                let next =
                    (current as isize + delta).rem_euclid(options.len() as isize) as usize;
                self.form.set_multiplier(options[next], &rules);
                // Field list changes between coffee and normal rounds.
                if !self.form_fields().contains(&self.form_field) {
                    self.form_field = FormField::Multiplier;
                }
            }
            FormField::DoubleProjects => {
                self.form.double_projects = !self.form.double_projects;
            }
            FormField::AutoComplete => {
                let enabled = !self.form.auto_complete;
                self.form.set_auto_complete(enabled, &rules);
            }
            FormField::CoffeeWinner => {
                self.form.coffee_winner = Some(match self.form.coffee_winner {
                    Some(Team::Us) => Team::Them,
                    _ => Team::Us,
                });
            }
            FormField::ProjectsUs | FormField::ProjectsThem => {
                let len = self.form.available_projects().len() as isize;
                if len > 0 {
                    self.project_cursor =
                        (self.project_cursor as isize + delta).rem_euclid(len) as usize;
                }
            }
            FormField::BaseUs | FormField::BaseThem => {}
        }
    }

    fn toggle_field(&mut self) {
        match self.form_field {
            FormField::ProjectsUs | FormField::ProjectsThem => {
                let team = if self.form_field == FormField::ProjectsUs {
                    Team::Us
                } else {
                    Team::Them
                };
                let available = self.form.available_projects();
                if let Some(project) = available.get(self.project_cursor).copied() {
                    self.form.toggle_project(team, project);
                }
            }
            FormField::DoubleProjects | FormField::AutoComplete | FormField::CoffeeWinner => {
                self.adjust_field(1)
            }
            _ => {}
        }
    }

    fn type_digit(&mut self, ch: char) {
        let rules = self.engine.rules().clone();
        match self.form_field {
            FormField::BaseUs => {
                let mut text = self.form.base_us_text.clone();
                text.push(ch);
                self.form.edit_base_us(text, &rules);
            }
            FormField::BaseThem => {
                let mut text = self.form.base_them_text.clone();
                text.push(ch);
                self.form.edit_base_them(text, &rules);
            }
            _ => {}
        }
    }

    fn erase_digit(&mut self) {
        let rules = self.engine.rules().clone();
        match self.form_field {
            FormField::BaseUs => {
                let mut text = self.form.base_us_text.clone();
                text.pop();
                self.form.edit_base_us(text, &rules);
            }
            FormField::BaseThem => {
                let mut text = self.form.base_them_text.clone();
                text.pop();
                self.form.edit_base_them(text, &rules);
            }
            _ => {}
        }
    }

    fn commit_round(&mut self) {
        let rules = self.engine.rules().clone();
        if !self.form.is_valid(&rules) {
            self.status = self
                .form
                .validation_error(&rules)
                .unwrap_or_else(|| "Round is incomplete".to_string());
            return;
        }
        match self.form.build(&rules) {
            Ok(round) => {
                self.engine.add_round(round);
                self.round_cursor = self.engine.game().rounds.len().saturating_sub(1);
                self.screen = Screen::Board;
                self.after_mutation("Round added");
            }
            Err(err) => {
                self.status = format!("Error: {err}");
            }
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.modal.clone() else {
            return;
        };
        match modal {
            Modal::ConfirmReset => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.engine.reset_match();
                    self.round_cursor = 0;
                    self.win_seen = false;
                    self.modal = None;
                    self.status = "New match started".to_string();
                }
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.modal = None;
                    self.status = "Reset cancelled".to_string();
                }
                _ => {}
            },
            Modal::Winner(_) => match key.code {
                KeyCode::Enter | KeyCode::Esc => {
                    self.modal = None;
                    self.maybe_show_rate_prompt();
                }
                KeyCode::Char('n') => {
                    self.engine.reset_match();
                    self.round_cursor = 0;
                    self.win_seen = false;
                    self.modal = None;
                    self.status = "New match started".to_string();
                    self.maybe_show_rate_prompt();
                }
                _ => {}
            },
            Modal::RatePrompt => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                    self.modal = None;
                }
            }
            Modal::Ticket(mut ticket) => match key.code {
                KeyCode::Esc => {
                    self.modal = None;
                    self.status = "Ticket discarded".to_string();
                }
                KeyCode::Enter => self.submit_ticket(ticket),
                KeyCode::Backspace => {
                    ticket.input.pop();
                    self.modal = Some(Modal::Ticket(ticket));
                }
                KeyCode::Char(ch) => {
                    if (key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT)
                        && ticket.input.len() < MAX_TICKET_LEN
                        && !ch.is_control()
                    {
                        ticket.input.push(ch);
                    }
                    self.modal = Some(Modal::Ticket(ticket));
                }
                _ => {}
            },
        }
    }

    fn submit_ticket(&mut self, mut ticket: TicketModal) {
        if ticket.submitting {
            self.modal = Some(Modal::Ticket(ticket));
            return;
        }
        let message = ticket.input.trim().to_string();
        if message.is_empty() {
            self.status = "Ticket message is empty".to_string();
            self.modal = Some(Modal::Ticket(ticket));
            return;
        }
        let (Some(client), Some(sender)) = (self.backend.clone(), self.event_tx.clone()) else {
            self.status = "Backend is disabled".to_string();
            self.modal = None;
            return;
        };
        ticket.submitting = true;
        self.modal = Some(Modal::Ticket(ticket));
        spawn(async move {
            let result = client
                .submit_ticket("support", &message)
                .await
                .map_err(|err| err.to_string());
            let _ = sender.send(AppEvent::TicketSubmitted(result)).await;
        });
    }

    fn handle_ticket_result(&mut self, result: Result<(), String>) {
        match result {
            Ok(()) => {
                self.modal = None;
                self.status = "Ticket submitted, thank you".to_string();
            }
            Err(err) => {
                if let Some(Modal::Ticket(ticket)) = self.modal.as_mut() {
                    // Keep the text so the user can retry.
                    ticket.submitting = false;
                }
                self.status = format!("Ticket failed: {err}");
            }
        }
    }

    // ---- win / rating lifecycle ---------------------------------------

    fn after_mutation(&mut self, message: &str) {
        self.status = message.to_string();
        match self.engine.winner() {
            Some(winner) => {
                if !self.win_seen {
                    self.win_seen = true;
                    info!(winner = winner.label(), "showing winner modal");
                    self.modal = Some(Modal::Winner(winner));
                }
            }
            None => self.win_seen = false,
        }
        if self.rating.take_prompt() {
            self.rate_prompt_pending = true;
        }
        if self.modal.is_none() {
            self.maybe_show_rate_prompt();
        }
    }

    fn maybe_show_rate_prompt(&mut self) {
        if self.rate_prompt_pending {
            self.rate_prompt_pending = false;
            self.modal = Some(Modal::RatePrompt);
        }
    }

    fn move_round_cursor(&mut self, delta: isize) {
        let len = self.engine.game().rounds.len();
        if len == 0 {
            return;
        }
        let next = (self.round_cursor as isize + delta).clamp(0, len as isize - 1);
        self.round_cursor = next as usize;
    }

    fn clamp_round_cursor(&mut self) {
        let len = self.engine.game().rounds.len();
        if len == 0 {
            self.round_cursor = 0;
        } else if self.round_cursor >= len {
            self.round_cursor = len - 1;
        }
    }

    fn clamp_project_cursor(&mut self) {
        let len = self.form.available_projects().len();
        if len == 0 {
            self.project_cursor = 0;
        } else if self.project_cursor >= len {
            self.project_cursor = len - 1;
        }
    }

    // ---- drawing ------------------------------------------------------

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Board => self.draw_board(frame),
            Screen::AddRound => self.draw_add_round(frame),
        }
        if let Some(modal) = self.modal.clone() {
            self.render_modal(frame, &modal);
        }
    }

    fn draw_board(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let banner_lines = block_font::render(&format!(
            "{}:{}",
            self.engine.game().total_us(),
            self.engine.game().total_them()
        ));
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(banner_lines.len() as u16 + 2),
                Constraint::Length(4),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_banner(frame, chunks[0], &banner_lines);
        self.render_score_cards(frame, chunks[1]);
        self.render_round_list(frame, chunks[2]);
        self.render_status(frame, chunks[3]);
    }

    fn render_banner(&self, frame: &mut Frame, area: Rect, lines: &[String]) {
        let content: Vec<Line> = lines
            .iter()
            .map(|line| {
                Line::from(Span::styled(
                    line.clone(),
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                ))
            })
            .collect();
        let paragraph = Paragraph::new(content)
            .block(Block::default().borders(Borders::ALL).title("Us : Them"))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    fn render_score_cards(&self, frame: &mut Frame, area: Rect) {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);
        let game = self.engine.game();
        let winner = game.winner();
        for (chunk, team, total, top_up) in [
            (halves[0], Team::Us, game.total_us(), game.coffee_top_up_us),
            (
                halves[1],
                Team::Them,
                game.total_them(),
                game.coffee_top_up_them,
            ),
        ] {
            let mut line = format!("{total} / {}", game.target_score);
            if top_up > 0 {
                line.push_str(&format!("  (coffee +{top_up})"));
            }
            let style = if winner == Some(team) {
                Style::default()
                    .fg(self.theme.success)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.fg)
            };
            let title = if winner == Some(team) {
                format!("{} — winner", team.label())
            } else {
                team.label().to_string()
            };
            let card = Paragraph::new(Line::from(Span::styled(line, style)))
                .block(Block::default().borders(Borders::ALL).title(title))
                .alignment(Alignment::Center);
            frame.render_widget(card, chunk);
        }
    }

    fn render_round_list(&self, frame: &mut Frame, area: Rect) {
        let rounds = &self.engine.game().rounds;
        let items: Vec<ListItem> = if rounds.is_empty() {
            vec![ListItem::new(Line::from(Span::styled(
                "  No rounds yet — press 'a' to add one",
                Style::default().fg(self.theme.muted),
            )))]
        } else {
            rounds
                .iter()
                .enumerate()
                .map(|(position, round)| {
                    let marker = if position == self.round_cursor {
                        Span::styled("▶ ", Style::default().fg(self.theme.accent))
                    } else {
                        Span::raw("  ")
                    };
                    let time = round.created_at.with_timezone(&Local).format("%H:%M");
                    let mut tags = String::new();
                    if round.double_projects {
                        tags.push_str(" 2xP");
                    }
                    if let Some(team) = round.coffee_winner {
                        tags.push_str(&format!(" ☕{}", team.label()));
                    }
                    let body = format!(
                        "#{:<3} {:<6} {:<7} {:>4} : {:<4}  [{}]{}",
                        round.index,
                        round.mode.label(),
                        round.multiplier.label(),
                        round.final_us,
                        round.final_them,
                        time,
                        tags,
                    );
                    let style = if round.coffee_winner.is_some() {
                        Style::default().fg(self.theme.warning)
                    } else {
                        Style::default().fg(self.theme.fg)
                    };
                    ListItem::new(Line::from(vec![marker, Span::styled(body, style)]))
                })
                .collect()
        };
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Rounds ({})", rounds.len())),
        );
        frame.render_widget(list, area);
    }

    fn draw_add_round(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(3)])
            .split(area);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[0]);

        self.render_form_fields(frame, body[0]);
        self.render_form_summary(frame, body[1]);
        self.render_status(frame, chunks[1]);
    }

    fn render_form_fields(&self, frame: &mut Frame, area: Rect) {
        let mut lines = Vec::new();
        for field in self.form_fields() {
            let selected = field == self.form_field;
            let marker = if selected { "▶ " } else { "  " };
            let value = match field {
                FormField::Mode => self.form.mode.label().to_string(),
                FormField::Multiplier => self.form.multiplier.label().to_string(),
                FormField::DoubleProjects => on_off(self.form.double_projects),
                FormField::AutoComplete => on_off(self.form.auto_complete),
                FormField::CoffeeWinner => self
                    .form
                    .coffee_winner
                    .map(|team| team.label().to_string())
                    .unwrap_or_else(|| "— choose —".to_string()),
                FormField::ProjectsUs => {
                    self.project_line(&self.form.projects_us, selected)
                }
                FormField::ProjectsThem => {
                    self.project_line(&self.form.projects_them, selected)
                }
                FormField::BaseUs => render_base(&self.form.base_us_text),
                FormField::BaseThem => render_base(&self.form.base_them_text),
            };
            let style = if selected {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.fg)
            };
            lines.push(Line::from(Span::styled(
                format!("{marker}{:<16} {value}", field.label()),
                style,
            )));
        }
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Add Round"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn project_line(&self, selected_set: &std::collections::BTreeSet<ProjectType>, focused: bool) -> String {
        let available = self.form.available_projects();
        let mut parts = Vec::new();
        for (position, project) in available.iter().enumerate() {
            let mark = if selected_set.contains(project) {
                "■"
            } else {
                "□"
            };
            let cursor = if focused && position == self.project_cursor {
                ">"
            } else {
                " "
            };
            parts.push(format!("{cursor}{mark} {}", project.label()));
        }
        parts.join("  ")
    }

    fn render_form_summary(&self, frame: &mut Frame, area: Rect) {
        let rules = self.engine.rules();
        let adjusted = self.form.base_adjusted(rules);
        let mut lines = vec![
            Line::from(format!("Adjusted base   {adjusted}")),
            Line::from(format!(
                "Projects        {} : {}",
                self.form.project_points_us(rules),
                self.form.project_points_them(rules)
            )),
            Line::from(format!(
                "Round total     {} : {}",
                self.form.final_us(rules),
                self.form.final_them(rules)
            )),
        ];
        if self.form.is_coffee_round() {
            lines.push(Line::from(Span::styled(
                "Coffee round: winner takes the match",
                Style::default().fg(self.theme.warning),
            )));
        }
        if let Some(error) = self.form.validation_error(rules) {
            lines.push(Line::from(Span::styled(
                error,
                Style::default().fg(self.theme.danger),
            )));
        } else if self.form.sums_mismatch(rules) {
            lines.push(Line::from(Span::styled(
                format!("Bases do not sum to {adjusted}"),
                Style::default().fg(self.theme.warning),
            )));
        }
        if self.form.is_valid(rules) {
            lines.push(Line::from(Span::styled(
                "Enter to save",
                Style::default().fg(self.theme.success),
            )));
        }
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Summary"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let keys = match self.screen {
            Screen::Board => "a add  u undo  r redo  d delete  n new  s score  t ticket  q quit",
            Screen::AddRound => "Tab move  ←→ change  Space toggle  Enter save  Esc cancel",
        };
        let paragraph = Paragraph::new(vec![
            Line::from(self.status.clone()),
            Line::from(Span::styled(keys, Style::default().fg(self.theme.muted))),
        ])
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_modal(&self, frame: &mut Frame, modal: &Modal) {
        let (title, lines) = match modal {
            Modal::ConfirmReset => (
                "New match".to_string(),
                vec![
                    Line::from("Throw away the current match?"),
                    Line::from(""),
                    Line::from(Span::styled(
                        "y/Enter confirm   n/Esc cancel",
                        Style::default().fg(self.theme.muted),
                    )),
                ],
            ),
            Modal::Winner(team) => (
                "Match won".to_string(),
                vec![
                    Line::from(Span::styled(
                        format!("{} win the match!", team.label()),
                        Style::default()
                            .fg(self.theme.success)
                            .add_modifier(Modifier::BOLD),
                    )),
                    Line::from(self.engine.score_line()),
                    Line::from(""),
                    Line::from(Span::styled(
                        "Enter close   n new match",
                        Style::default().fg(self.theme.muted),
                    )),
                ],
            ),
            Modal::RatePrompt => (
                "Enjoying Qeid?".to_string(),
                vec![
                    Line::from(format!(
                        "{} matches scored so far — consider starring the project!",
                        self.rating.games_completed()
                    )),
                    Line::from(""),
                    Line::from(Span::styled(
                        "Enter close",
                        Style::default().fg(self.theme.muted),
                    )),
                ],
            ),
            Modal::Ticket(ticket) => {
                let state = if ticket.submitting {
                    Span::styled("Submitting…", Style::default().fg(self.theme.warning))
                } else {
                    Span::styled(
                        "Enter submit   Esc cancel",
                        Style::default().fg(self.theme.muted),
                    )
                };
                (
                    "Support ticket".to_string(),
                    vec![
                        Line::from(format!("{}▏", ticket.input)),
                        Line::from(""),
                        Line::from(state),
                    ],
                )
            }
        };

        let width = 56.min(frame.size().width.saturating_sub(2));
        let height = (lines.len() as u16 + 2).min(frame.size().height);
        let area = centered_rect(width, height, frame.size());
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn on_off(value: bool) -> String {
    if value { "on" } else { "off" }.to_string()
}

fn render_base(text: &str) -> String {
    if text.is_empty() {
        "—".to_string()
    } else {
        text.to_string()
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
