use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use lesion_terminal::api::ApiClient;
use lesion_terminal::config::Config;
use lesion_terminal::logging;
use lesion_terminal::prediction::{LabeledPrediction, format_score};
use lesion_terminal::state::{
    apply_delta, display_name, AppState, AuthField, AuthMode, Delta, Screen, WorkerCommand,
};
use lesion_terminal::worker::spawn_worker;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<WorkerCommand>,
}

impl App {
    fn new(state: AppState, cmd_tx: mpsc::Sender<WorkerCommand>) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx,
        }
    }

    fn dispatch(&mut self, cmd: Option<WorkerCommand>) {
        let Some(cmd) = cmd else {
            return;
        };
        if self.cmd_tx.send(cmd).is_err() {
            self.state.loading = None;
            self.state.push_log("[WARN] Worker unavailable");
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.state.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.state.dismiss_alert();
            }
            return;
        }

        if self.state.help_overlay {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.state.help_overlay = false;
            }
            return;
        }

        if self.state.is_busy() {
            return;
        }

        match self.state.screen.clone() {
            Screen::Authorize { mode } => self.on_auth_key(key, mode),
            Screen::Home => self.on_home_key(key),
            Screen::ChoosingPhoto => self.on_picker_key(key),
            Screen::Predicting => {}
            Screen::ViewingHistory { .. } => self.on_history_key(key),
        }
    }

    fn on_auth_key(&mut self, key: KeyEvent, mode: AuthMode) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::F(2) => self.state.toggle_auth_mode(),
            KeyCode::Tab | KeyCode::Down => self.state.auth.focus_next(mode),
            KeyCode::BackTab | KeyCode::Up => self.state.auth.focus_prev(mode),
            KeyCode::Enter => {
                let cmd = self.state.submit_auth();
                self.dispatch(cmd);
            }
            KeyCode::Backspace => {
                let field = self.state.auth.focused(mode);
                self.state.auth.value_mut(field).pop();
            }
            KeyCode::Char(c) => {
                let field = self.state.auth.focused(mode);
                self.state.auth.value_mut(field).push(c);
            }
            _ => {}
        }
    }

    fn on_home_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('p') | KeyCode::Char('P') => {
                let cmd = self.state.open_photo_picker();
                self.dispatch(cmd);
            }
            KeyCode::Enter | KeyCode::Char('r') | KeyCode::Char('R') => {
                let cmd = self.state.request_prediction();
                self.dispatch(cmd);
            }
            KeyCode::Char('h') | KeyCode::Char('H') => {
                let cmd = self.state.open_history();
                self.dispatch(cmd);
            }
            KeyCode::Char('o') | KeyCode::Char('O') => self.state.log_out(),
            KeyCode::Char('?') => self.state.help_overlay = true,
            _ => {}
        }
    }

    fn on_picker_key(&mut self, key: KeyEvent) {
        if let Some(input) = self.state.path_input.as_mut() {
            match key.code {
                KeyCode::Esc => self.state.path_input = None,
                KeyCode::Enter => {
                    self.state.submit_path_input();
                }
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('b') | KeyCode::Esc => self.state.cancel_photo_picker(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Enter => {
                self.state.pick_selected_photo();
            }
            KeyCode::Char('/') => self.state.start_path_input(),
            KeyCode::Char('r') => {
                let dir = self.state.photo_dir.clone();
                self.dispatch(Some(WorkerCommand::ScanPhotos(dir)));
            }
            _ => {}
        }
    }

    fn on_history_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('b') | KeyCode::Esc => self.state.close_history(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Enter => {
                if self.state.enlarged_history().is_some() {
                    self.state.close_history();
                } else {
                    self.state.enlarge_selected_history();
                }
            }
            _ => {}
        }
    }
}

fn main() -> io::Result<()> {
    let config = Config::load();
    if let Some(path) = &config.log_file
        && let Err(err) = logging::init_file(path)
    {
        eprintln!("warning: {err:#}");
    }

    let api = match ApiClient::new(config.clone()) {
        Ok(api) => api,
        Err(err) => {
            eprintln!("error: {err:#}");
            return Ok(());
        }
    };
    tracing::info!(api_url = %config.api_url, "starting terminal client");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let _worker = spawn_worker(api, tx, cmd_rx);

    let mut app = App::new(AppState::new(config.photo_dir.clone()), cmd_tx);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let state = &app.state;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match &state.screen {
        Screen::Authorize { mode } => render_authorize(frame, chunks[1], state, *mode),
        Screen::Home | Screen::Predicting => render_home(frame, chunks[1], state),
        Screen::ChoosingPhoto => render_picker(frame, chunks[1], state),
        Screen::ViewingHistory { .. } => render_history(frame, chunks[1], state),
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    let screen = frame.size();
    if state.enlarged_history().is_some() {
        render_history_detail(frame, centered_rect(70, 80, screen), state);
    }
    if let Some(text) = &state.loading {
        render_loading(frame, text);
    }
    if let Some(message) = &state.alert {
        render_alert(frame, message);
    }
    if state.help_overlay {
        render_help_overlay(frame, screen);
    }
}

fn header_text(state: &AppState) -> String {
    let title = match &state.screen {
        Screen::Authorize { mode } => format!("LESION CHECK | {}", auth_mode_label(*mode)),
        Screen::Home => "LESION CHECK | HOME".to_string(),
        Screen::ChoosingPhoto => "LESION CHECK | CHOOSE PHOTO".to_string(),
        Screen::Predicting => "LESION CHECK | PREDICTING".to_string(),
        Screen::ViewingHistory { .. } => "LESION CHECK | HISTORY".to_string(),
    };
    let user = state
        .session
        .as_ref()
        .map(|c| format!("  user: {}", c.email))
        .unwrap_or_default();
    format!(" (+)  {title}\n{user}")
}

fn footer_text(state: &AppState) -> String {
    if state.alert.is_some() {
        return "Enter/Esc Dismiss".to_string();
    }
    match &state.screen {
        Screen::Authorize { .. } => {
            "Tab/↑/↓ Field | Enter Submit | F2 Login/Sign up | Esc Quit".to_string()
        }
        Screen::Home => {
            "p Photo | Enter/r Predict | h History | o Log out | ? Help | q Quit".to_string()
        }
        Screen::ChoosingPhoto => {
            if state.path_input.is_some() {
                "Enter Use path | Esc Cancel".to_string()
            } else {
                "j/k/↑/↓ Move | Enter Pick | / Type path | r Rescan | b/Esc Back | q Quit"
                    .to_string()
            }
        }
        Screen::Predicting => "Waiting for the server... | Ctrl+C Quit".to_string(),
        Screen::ViewingHistory { enlarged: Some(_) } => "Enter/b/Esc Minimize".to_string(),
        Screen::ViewingHistory { enlarged: None } => {
            "j/k/↑/↓ Move | Enter Enlarge | b/Esc Back | q Quit".to_string()
        }
    }
}

fn render_authorize(frame: &mut Frame, area: Rect, state: &AppState, mode: AuthMode) {
    let form_area = centered_rect(60, 80, area);
    let focused = state.auth.focused(mode);

    let mut lines = Vec::new();
    for field in mode.fields() {
        let value = state.auth.value(*field);
        let shown = if is_secret(*field) {
            "*".repeat(value.chars().count())
        } else {
            value.to_string()
        };
        let selected = *field == focused;
        let prefix = if selected { "> " } else { "  " };
        let style = if selected {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::styled(
            format!("{prefix}{:<16} {shown}", field_label(*field)),
            style,
        ));
    }
    lines.push(Line::from(""));
    let hint = match mode {
        AuthMode::Login => "New here? Press F2 to sign up.",
        AuthMode::SignUp => "Have an account? Press F2 to log in.",
    };
    lines.push(Line::styled(hint, Style::default().fg(Color::DarkGray)));

    let form = Paragraph::new(lines).block(
        Block::default()
            .title(auth_mode_label(mode))
            .borders(Borders::ALL),
    );
    frame.render_widget(form, form_area);
}

fn render_home(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let photo_text = match &state.image_path {
        Some(path) => format!(
            "{}\n\n{}",
            display_name(path),
            path.display()
        ),
        None => "No photo selected.\nPress p to choose one.".to_string(),
    };
    let photo = Paragraph::new(photo_text)
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Photo").borders(Borders::ALL));
    frame.render_widget(photo, columns[0]);

    let width = columns[1].width.saturating_sub(4) as usize;
    let prediction_text = match &state.prediction {
        Some(outcome) => {
            let mut lines = vec![match outcome.predicted_class {
                Some(class) => format!("Predicted class: {class}"),
                None => "Unrecognised prediction".to_string(),
            }];
            lines.push(String::new());
            lines.extend(score_lines(&outcome.binary, width));
            if !outcome.multiclass.is_empty() {
                lines.push(String::new());
                lines.extend(score_lines(&outcome.multiclass, width));
            }
            lines.join("\n")
        }
        None if state.image_path.is_some() => "Press Enter to predict.".to_string(),
        None => "No prediction yet".to_string(),
    };
    let prediction = Paragraph::new(prediction_text)
        .block(Block::default().title("Prediction").borders(Borders::ALL));
    frame.render_widget(prediction, columns[1]);
}

fn render_picker(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(area);

    let block = Block::default()
        .title(format!("Photos in {}", state.photo_dir.display()))
        .borders(Borders::ALL);
    let inner = block.inner(rows[0]);
    frame.render_widget(block, rows[0]);

    if state.photos.is_empty() {
        let empty = Paragraph::new("No images found. Press / to type a path.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
    } else {
        let visible = inner.height as usize;
        let (start, end) = visible_range(state.photo_selected, state.photos.len(), visible);
        let lines: Vec<Line> = (start..end)
            .map(|idx| {
                let name = display_name(&state.photos[idx]);
                if idx == state.photo_selected {
                    Line::styled(
                        format!("> {name}"),
                        Style::default().fg(Color::White).bg(Color::DarkGray),
                    )
                } else {
                    Line::from(format!("  {name}"))
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    let input_text = match &state.path_input {
        Some(input) => format!("{input}_"),
        None => String::new(),
    };
    let input = Paragraph::new(input_text)
        .block(Block::default().title("Path").borders(Borders::ALL));
    frame.render_widget(input, rows[1]);
}

fn render_history(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title("Investigated photos")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.history.is_empty() {
        let text = if state.is_busy() {
            ""
        } else {
            "No history yet"
        };
        let empty = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let visible = inner.height as usize;
    let (start, end) = visible_range(state.history_selected, state.history.len(), visible);
    let lines: Vec<Line> = (start..end)
        .map(|idx| {
            let entry = &state.history[idx];
            let scores = entry
                .binary
                .entries()
                .iter()
                .map(|(label, score)| format!("{label} {}", format_score(*score)))
                .collect::<Vec<_>>()
                .join(" | ");
            let text = format!("{:<28} {scores}", entry.name);
            if idx == state.history_selected {
                Line::styled(
                    format!("> {text}"),
                    Style::default().fg(Color::White).bg(Color::DarkGray),
                )
            } else {
                Line::from(format!("  {text}"))
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_history_detail(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(entry) = state.enlarged_history() else {
        return;
    };
    frame.render_widget(Clear, area);

    let width = area.width.saturating_sub(4) as usize;
    let mut lines = vec![entry.url.clone(), String::new(), "Binary".to_string()];
    lines.extend(sorted_score_lines(&entry.binary, width));
    lines.push(String::new());
    lines.push("Multiclass".to_string());
    lines.extend(sorted_score_lines(&entry.multiclass, width));

    let detail = Paragraph::new(lines.join("\n"))
        .wrap(Wrap { trim: false })
        .block(Block::default().title(entry.name.as_str()).borders(Borders::ALL));
    frame.render_widget(detail, area);
}

fn render_loading(frame: &mut Frame, text: &str) {
    let area = centered_rect(40, 20, frame.size());
    frame.render_widget(Clear, area);
    let loading = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(loading, area);
}

fn render_alert(frame: &mut Frame, message: &str) {
    let area = centered_rect(50, 30, frame.size());
    frame.render_widget(Clear, area);
    let alert = Paragraph::new(format!("{message}\n\n[ OK ]"))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Red))
        .block(Block::default().title("Error").borders(Borders::ALL));
    frame.render_widget(alert, area);
}

fn score_lines(prediction: &LabeledPrediction, width: usize) -> Vec<String> {
    if prediction.is_empty() {
        return vec!["Unrecognised prediction".to_string()];
    }
    prediction
        .entries()
        .iter()
        .map(|(label, score)| score_line(label, *score, width))
        .collect()
}

fn sorted_score_lines(prediction: &LabeledPrediction, width: usize) -> Vec<String> {
    if prediction.is_empty() {
        return vec!["Unrecognised prediction".to_string()];
    }
    prediction
        .sorted_desc()
        .into_iter()
        .map(|(label, score)| score_line(label, score, width))
        .collect()
}

fn score_line(label: &str, score: f64, width: usize) -> String {
    const LABEL_WIDTH: usize = 30;
    const PCT_WIDTH: usize = 9;
    let bar_width = width.saturating_sub(LABEL_WIDTH + PCT_WIDTH + 2);
    let filled = ((score.clamp(0.0, 1.0)) * bar_width as f64).round() as usize;
    let bar = format!("{}{}", "█".repeat(filled), "·".repeat(bar_width - filled));
    format!(
        "{label:<lw$} {bar} {pct:>pw$}",
        lw = LABEL_WIDTH,
        pw = PCT_WIDTH,
        pct = format_score(score)
    )
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 || visible == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn is_secret(field: AuthField) -> bool {
    matches!(field, AuthField::Password | AuthField::RepeatPassword)
}

fn field_label(field: AuthField) -> &'static str {
    match field {
        AuthField::Email => "Email",
        AuthField::Password => "Password",
        AuthField::RepeatPassword => "Repeat Password",
        AuthField::FirstName => "First Name",
    }
}

fn auth_mode_label(mode: AuthMode) -> &'static str {
    match mode {
        AuthMode::Login => "LOG IN",
        AuthMode::SignUp => "SIGN UP",
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Lesion Check - Help",
        "",
        "Home:",
        "  p            Choose photo",
        "  Enter / r    Predict selected photo",
        "  h            History",
        "  o            Log out",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Photo picker:",
        "  j/k or ↑/↓   Move",
        "  Enter        Pick photo",
        "  /            Type a path",
        "  b / Esc      Back",
        "",
        "History:",
        "  Enter        Enlarge / minimize",
        "  b / Esc      Back",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
