use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::cursor::SetCursorStyle;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod auto_scroll;
mod catalog;
mod command;
mod config;
mod error;
mod events;
mod feed;
mod messages;
mod outbox;
mod progress;
mod step_tree;
mod text_layout;
mod theme;
mod timer;
mod ui;

use app::{App, Pane, SendIntent};
use catalog::{CatalogProvider, FileCatalog};
use config::ViewConfig;
use events::AppEvent;
use feed::{FeedReader, FeedSource, open_feed_file, read_feed};
use outbox::Outbox;
use theme::Theme;

const MAX_FEED_EVENTS_PER_LOOP: usize = 128;
const TICK_RATE: Duration = Duration::from_millis(50);
const DEFAULT_LOG_FILTER: &str = "agent_liveview=debug,warn";

/// Live terminal view of an agent's steps, messages and workflow commands.
#[derive(Parser, Debug)]
#[command(name = "agent-liveview")]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON-lines feed of step and message events; `-` reads stdin.
    #[arg(long, value_name = "PATH")]
    feed: Option<PathBuf>,

    /// Keep reading the feed file as the host appends to it.
    #[arg(long)]
    follow: bool,

    /// View config (TOML).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Theme colors (TOML). Overrides the config file.
    #[arg(long, value_name = "PATH")]
    theme: Option<PathBuf>,

    /// Workflow catalog (JSON array). Overrides the config file.
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,

    /// File that receives one JSON line per sent message. Overrides the
    /// config file.
    #[arg(long, value_name = "PATH")]
    outbox: Option<PathBuf>,

    /// Write tracing output to this file. Nothing is logged without it.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Apply the whole feed without a terminal and print the resulting state
    /// as JSON.
    #[arg(long)]
    dump_state: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let config = ViewConfig::load_or_default(args.config.as_deref());
    let catalog_file = args
        .catalog
        .clone()
        .or_else(|| config.paths.catalog.clone())
        .map(FileCatalog::new);
    let catalog =
        catalog::load_or_default(catalog_file.as_ref().map(|c| c as &dyn CatalogProvider));
    let mut app = App::new(&config, catalog);

    if args.dump_state {
        return dump_state(app, args.feed.as_deref());
    }

    let theme = match args.theme.as_ref().or(config.paths.theme.as_ref()) {
        Some(path) => Theme::load_or_default(path),
        None => Theme::default(),
    };
    let outbox = args
        .outbox
        .clone()
        .or_else(|| config.paths.outbox.clone())
        .map(Outbox::new);

    let feed = FeedReader::new();
    if let Some(path) = &args.feed {
        feed.start(FeedSource::from_arg(path, args.follow || config.feed.follow))
            .with_context(|| format!("failed to open feed {}", path.display()))?;
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        SetCursorStyle::SteadyBar
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app, &theme, &feed, outbox.as_ref());
    app.quit();
    feed.stop();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        SetCursorStyle::DefaultUserShape,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Headless mode: reads the feed to its end, applies every event and prints
/// the snapshot. Without `--feed` the events come from stdin.
fn dump_state(mut app: App, feed: Option<&Path>) -> anyhow::Result<()> {
    let events = match FeedSource::from_arg(feed.unwrap_or(Path::new("-")), false) {
        FeedSource::Stdin => read_feed(io::stdin().lock()),
        FeedSource::File { path, .. } => read_feed(open_feed_file(&path)?),
    };
    let now = Instant::now();
    let count = events.len();
    for event in events {
        app.apply_feed_event(event, now);
    }
    info!(events = count, "feed applied headless");
    println!("{}", serde_json::to_string_pretty(&app.snapshot())?);
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    theme: &Theme,
    feed: &FeedReader,
    outbox: Option<&Outbox>,
) -> anyhow::Result<()> {
    let mut redraw = true;
    while app.running {
        let now = Instant::now();
        for item in feed.drain_events_limited(MAX_FEED_EVENTS_PER_LOOP) {
            redraw |= app.apply_feed_item(item, now);
        }

        let size = terminal.size()?;
        let screen = Rect::new(0, 0, size.width, size.height);
        sync_chat_viewport(app, screen, redraw);
        redraw |= app.on_tick(Instant::now()) || app.is_animating();

        if redraw {
            terminal.draw(|frame| ui::render(frame, app, theme))?;
            redraw = false;
        }

        let event = events::next_event(TICK_RATE)?;
        redraw |= event != AppEvent::Tick;
        if let Some(intent) = handle_event(app, event, screen, Instant::now()) {
            deliver(app, intent, outbox);
        }
    }
    Ok(())
}

/// Re-measures the chat history for scrolling. Wrapping the whole history is
/// the expensive part of a frame, so it only happens on frames that redraw.
fn sync_chat_viewport(app: &mut App, screen: Rect, redraw: bool) {
    if redraw {
        app.set_chat_viewport(
            ui::chat_max_scroll(screen, app),
            ui::chat_page_rows(screen, app),
        );
    }
}

/// Applies one input event. Returns the intent to deliver when the user sent
/// a message.
fn handle_event(app: &mut App, event: AppEvent, screen: Rect, now: Instant) -> Option<SendIntent> {
    match event {
        AppEvent::Tick | AppEvent::Resize => {}
        AppEvent::Quit => app.quit(),
        AppEvent::MoveUp => app.move_up(ui::chat_input_text_width(screen)),
        AppEvent::MoveDown => app.move_down(ui::chat_input_text_width(screen)),
        AppEvent::CursorLeft => app.move_cursor_left(),
        AppEvent::CursorRight => app.move_cursor_right(),
        AppEvent::CursorHome => app.move_cursor_home(),
        AppEvent::CursorEnd => app.move_cursor_end(),
        AppEvent::Complete => {
            app.complete_command();
        }
        AppEvent::Dismiss => app.dismiss_command_panel(),
        AppEvent::ScrollChatUp => app.scroll_chat_up(),
        AppEvent::ScrollChatDown => app.scroll_chat_down(),
        AppEvent::PageChatUp => app.page_chat_up(),
        AppEvent::PageChatDown => app.page_chat_down(),
        AppEvent::JumpToBottom => app.jump_to_bottom(now),
        AppEvent::ScrollTreeUp => app.scroll_tree_up(),
        AppEvent::ScrollTreeDown => {
            let max_scroll = ui::tree_max_scroll(screen, app);
            app.scroll_tree_down(max_scroll);
        }
        AppEvent::InputChar(c) => app.input_char(c),
        AppEvent::Backspace => app.backspace_input(),
        AppEvent::Delete => app.delete_input(),
        AppEvent::Submit => return app.submit(now),
        AppEvent::MouseScrollUp(column, row) => match ui::pane_hit_test(screen, column, row) {
            Some(Pane::Chat) => app.scroll_chat_up(),
            Some(Pane::Steps) => app.scroll_tree_up(),
            None => {}
        },
        AppEvent::MouseScrollDown(column, row) => match ui::pane_hit_test(screen, column, row) {
            Some(Pane::Chat) => app.scroll_chat_down(),
            Some(Pane::Steps) => {
                let max_scroll = ui::tree_max_scroll(screen, app);
                app.scroll_tree_down(max_scroll);
            }
            None => {}
        },
        AppEvent::MouseLeftClick(column, row) => {
            if let Some(index) = ui::command_panel_hit_test(screen, app, column, row) {
                app.select_command(index);
            }
        }
    }
    None
}

fn deliver(app: &mut App, intent: SendIntent, outbox: Option<&Outbox>) {
    let Some(outbox) = outbox else {
        return;
    };
    if let Err(err) = outbox.append(&intent) {
        warn!(path = %outbox.path().display(), error = %err, "failed to write send intent");
        app.push_notice(format!("Could not deliver message: {err}"), Instant::now());
    }
}
