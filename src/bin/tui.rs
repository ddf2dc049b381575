//! Tiltdeck TUI - play a session in the terminal
//!
//! Keyboard stands in for the accelerometer: tilting the device forward
//! or back becomes Up/Down arrows, each injecting a short synthetic tilt
//! into the engine's sample channel.
//!
//! Keyboard shortcuts:
//! - Up/Down: select a deck (before start), tilt correct/skip (in play)
//! - Enter: start the selected deck
//! - q / Esc: stop the session / quit
//!
//! Usage:
//!   cargo run --bin tiltdeck-tui -- --config config/dev.toml

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tiltdeck::domain::summary::{epoch_ms, SessionSummary};
use tiltdeck::domain::types::{ItemStatus, ResolveAction, Score, TiltSample};
use tiltdeck::infra::{Config, Metrics};
use tiltdeck::io::{DeckStore, Egress};
use tiltdeck::services::{
    GestureConfig, GestureInterpreter, SessionController, SessionEngine, SessionEvent,
};
use tokio::sync::{mpsc, watch, Mutex};

#[derive(Parser, Debug)]
#[command(name = "tiltdeck-tui")]
#[command(about = "Play a tiltdeck session in the terminal")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,

    /// Requested time limit in seconds (clamped to the configured range)
    #[arg(short, long)]
    time_limit: Option<u32>,
}

/// What the UI is currently showing
#[derive(Debug, Clone)]
enum View {
    DeckSelect,
    Countdown { label: String },
    Playing { word: String, remaining_secs: u32, score: Score },
    Ended { summary: SessionSummary },
}

/// UI state shared between the event-drain task and the draw loop
struct AppState {
    view: View,
    decks: Vec<String>,
    selected: usize,
    last_action: Option<ResolveAction>,
}

impl AppState {
    fn new(decks: Vec<String>) -> Self {
        Self { view: View::DeckSelect, decks, selected: 0, last_action: None }
    }

    fn apply_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::CountdownStep { label } => {
                self.view = View::Countdown { label };
            }
            SessionEvent::Activated { word, remaining_secs } => {
                self.view = View::Playing { word, remaining_secs, score: Score::default() };
            }
            SessionEvent::Tick { remaining_secs } => {
                if let View::Playing { remaining_secs: r, .. } = &mut self.view {
                    *r = remaining_secs;
                }
            }
            SessionEvent::Resolved { action, score, next_word, .. } => {
                self.last_action = Some(action);
                if let View::Playing { word, score: s, .. } = &mut self.view {
                    *s = score;
                    if let Some(next) = next_word {
                        *word = next;
                    }
                }
            }
            SessionEvent::Ended { summary } => {
                self.view = View::Ended { summary };
            }
        }
    }
}

type SharedState = Arc<Mutex<AppState>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    let store = DeckStore::new(config.decks_file());
    store.init_defaults()?;
    let mut decks: Vec<String> = store.load().into_keys().collect();
    decks.sort();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let state = Arc::new(Mutex::new(AppState::new(decks)));
    let result = run_ui(&mut terminal, state, &config, &store, args.time_limit).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_ui(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: SharedState,
    config: &Config,
    store: &DeckStore,
    requested_time_limit: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    // Wired up once a deck is chosen and a session starts
    let mut sample_tx: Option<mpsc::Sender<TiltSample>> = None;
    let mut shutdown_tx: Option<watch::Sender<bool>> = None;

    loop {
        let s = state.lock().await;
        terminal.draw(|f| draw_ui(f, &s))?;
        let view = s.view.clone();
        let selected = s.selected;
        drop(s);

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match (&view, key.code) {
                        (View::DeckSelect, KeyCode::Char('q') | KeyCode::Esc) => return Ok(()),
                        (View::DeckSelect, KeyCode::Up) => {
                            let mut s = state.lock().await;
                            s.selected = s.selected.saturating_sub(1);
                        }
                        (View::DeckSelect, KeyCode::Down) => {
                            let mut s = state.lock().await;
                            if s.selected + 1 < s.decks.len() {
                                s.selected += 1;
                            }
                        }
                        (View::DeckSelect, KeyCode::Enter) => {
                            let deck_name = {
                                let s = state.lock().await;
                                s.decks.get(selected).cloned()
                            };
                            if let Some(name) = deck_name {
                                let (tx, sh) = start_session(
                                    config,
                                    store,
                                    &name,
                                    requested_time_limit,
                                    state.clone(),
                                )?;
                                sample_tx = Some(tx);
                                shutdown_tx = Some(sh);
                            }
                        }
                        (View::Playing { .. }, KeyCode::Up) => {
                            if let Some(tx) = &sample_tx {
                                inject_tilt(tx, 1.0);
                            }
                        }
                        (View::Playing { .. }, KeyCode::Down) => {
                            if let Some(tx) = &sample_tx {
                                inject_tilt(tx, -1.0);
                            }
                        }
                        (View::Ended { .. }, _) => return Ok(()),
                        (_, KeyCode::Char('q') | KeyCode::Esc) => {
                            if let Some(sh) = &shutdown_tx {
                                let _ = sh.send(true);
                            } else {
                                return Ok(());
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
}

/// Build the session for a deck and spawn its engine and event-drain tasks
fn start_session(
    config: &Config,
    store: &DeckStore,
    deck_name: &str,
    requested_time_limit: Option<u32>,
    state: SharedState,
) -> Result<(mpsc::Sender<TiltSample>, watch::Sender<bool>), Box<dyn std::error::Error>> {
    use rand::seq::SliceRandom;

    let mut items = store
        .deck(deck_name)
        .ok_or_else(|| format!("no deck named '{}'", deck_name))?;
    items.shuffle(&mut rand::thread_rng());

    let requested = requested_time_limit.unwrap_or_else(|| config.default_time_limit_secs());
    let time_limit = config.clamp_time_limit(requested);

    let session = SessionController::new(deck_name, items, time_limit)?;
    let gesture = GestureInterpreter::new(GestureConfig {
        tilt_threshold: config.tilt_threshold(),
        rearm_threshold: config.rearm_threshold(),
        debounce_ms: config.debounce_ms(),
        // Keyboard tilts are deliberate; no settling grace needed
        grace_ms: 0,
        polarity: config.polarity(),
    });

    let (event_tx, mut event_rx) = mpsc::channel(256);
    let (sample_tx, sample_rx) = mpsc::channel(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let engine = SessionEngine::new(
        session,
        gesture,
        config.countdown_steps().to_vec(),
        Arc::new(Metrics::new()),
    )
    .with_egress(Egress::new(config.egress_file()))
    .with_event_tx(event_tx);

    tokio::spawn(async move {
        engine.run(sample_rx, shutdown_rx).await;
    });

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let mut s = state.lock().await;
            s.apply_event(event);
        }
    });

    Ok((sample_tx, shutdown_tx))
}

/// One keypress becomes a short tilt: past the threshold, then back to
/// level so the interpreter re-arms for the next press.
fn inject_tilt(tx: &mpsc::Sender<TiltSample>, z: f64) {
    let now = epoch_ms();
    let _ = tx.try_send(TiltSample::new(z, now));
    let _ = tx.try_send(TiltSample::new(0.0, now + 1));
}

fn draw_ui(f: &mut Frame, state: &AppState) {
    match &state.view {
        View::DeckSelect => draw_deck_select(f, state),
        View::Countdown { label } => draw_big_label(f, label, Color::Yellow),
        View::Playing { word, remaining_secs, score } => {
            draw_playing(f, word, *remaining_secs, *score, state.last_action)
        }
        View::Ended { summary } => draw_summary(f, summary),
    }
}

fn draw_deck_select(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    let header = Paragraph::new("tiltdeck")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let items: Vec<ListItem> = state
        .decks
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let style = if i == state.selected {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(format!(" {} ", name), style)))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Pick a deck ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(list, chunks[1]);

    let help = Paragraph::new("Up/Down select · Enter start · q quit")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[2]);
}

fn draw_big_label(f: &mut Frame, label: &str, color: Color) {
    let area = centered_rect(f.area(), 60, 20);
    let text = Paragraph::new(label)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(text, area);
}

fn draw_playing(
    f: &mut Frame,
    word: &str,
    remaining_secs: u32,
    score: Score,
    last_action: Option<ResolveAction>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3), Constraint::Length(1)])
        .split(f.area());

    let word_widget = Paragraph::new(word)
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(word_widget, chunks[0]);

    let feedback = match last_action {
        Some(ResolveAction::Correct) => Span::styled("Correct!", Style::default().fg(Color::Green)),
        Some(ResolveAction::Skip) => Span::styled("Skip", Style::default().fg(Color::Red)),
        None => Span::raw(""),
    };
    let footer = Paragraph::new(Line::from(vec![
        Span::styled(
            format_time(remaining_secs),
            Style::default().fg(if remaining_secs <= 10 { Color::Red } else { Color::White }),
        ),
        Span::raw("   "),
        Span::styled(format!("Score: {}", score.correct), Style::default().fg(Color::Green)),
        Span::raw("   "),
        feedback,
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[1]);

    let help = Paragraph::new("Up correct · Down skip · q stop")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[2]);
}

fn draw_summary(f: &mut Frame, summary: &SessionSummary) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("Score: {}", summary.score.correct),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "{} · {} correct · {} skipped · {}",
            summary.category,
            summary.score.correct,
            summary.score.skipped,
            summary.reason.as_str()
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().title(" Game Over ").borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let items: Vec<ListItem> = summary
        .items
        .iter()
        .map(|item| {
            let (icon, color) = match item.status {
                ItemStatus::Correct => ("✓", Color::Green),
                ItemStatus::Skipped => ("✗", Color::Red),
                ItemStatus::Pending => ("·", Color::DarkGray),
            };
            ListItem::new(Line::from(vec![
                Span::styled(icon, Style::default().fg(color)),
                Span::raw(format!(" {}", item.text)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Words ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(list, chunks[1]);

    let help = Paragraph::new("any key to exit").style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[2]);
}

fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
