use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::auto_scroll::{
    AutoScrollController, FollowState, ScrollBehavior, ScrollSample, ScrollState,
};
use crate::catalog::default_catalog;
use crate::command::{CommandParser, CommandSuggestion, Selection};
use crate::config::ViewConfig;
use crate::feed::{FeedEvent, FeedItem, StepEvent};
use crate::messages::{ExecutingTurn, Message, MessageStream, Role};
use crate::progress::{ProgressSummary, aggregate};
use crate::step_tree::{Step, StepRow, StepTree, UpdateOutcome};
use crate::text_layout::wrap_word_with_positions;

const LOCAL_TURN_PREFIX: &str = "pending-";
const SMOOTH_SCROLL_DIVISOR: u16 = 4;

/// Outbound request produced when the user submits the input buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendIntent {
    pub text: String,
    pub attached_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Chat,
    Steps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Waiting,
    Live,
    Ended { lines: usize, skipped: usize },
}

/// JSON view of the presentation state, printed by `--dump-state`.
#[derive(Debug, Serialize)]
pub struct StateSnapshot<'a> {
    pub progress: ProgressSummary,
    pub current_step: Option<&'a str>,
    pub steps: &'a [Step],
    pub messages: &'a [Message],
    pub executing: Vec<&'a ExecutingTurn>,
    pub follow_state: FollowState,
    pub scroll: ScrollState,
}

#[derive(Debug)]
pub struct App {
    pub running: bool,
    pub ticks: u64,
    steps: StepTree,
    authoritative_progress: Option<f64>,
    messages: MessageStream,
    awaiting_reply: VecDeque<ExecutingTurn>,
    auto_scroll: AutoScrollController,
    parser: CommandParser,
    chat_input: String,
    chat_cursor: usize,
    chat_cursor_goal_col: Option<u16>,
    chat_scroll: u16,
    chat_max_scroll: u16,
    chat_page_rows: u16,
    smooth_scrolling: bool,
    tree_scroll: u16,
    row_height_units: u32,
    max_tree_depth: usize,
    feed_status: FeedStatus,
    next_local_id: u64,
}

impl Default for App {
    fn default() -> Self {
        Self::new(&ViewConfig::default(), default_catalog())
    }
}

impl App {
    pub fn new(config: &ViewConfig, catalog: Vec<CommandSuggestion>) -> Self {
        Self {
            running: true,
            ticks: 0,
            steps: StepTree::new(),
            authoritative_progress: None,
            messages: MessageStream::new(),
            awaiting_reply: VecDeque::new(),
            auto_scroll: AutoScrollController::new(config.scroll.auto_scroll()),
            parser: CommandParser::new(catalog),
            chat_input: String::new(),
            chat_cursor: 0,
            chat_cursor_goal_col: None,
            chat_scroll: 0,
            chat_max_scroll: 0,
            chat_page_rows: 1,
            smooth_scrolling: false,
            tree_scroll: 0,
            row_height_units: config.scroll.row_height_units.max(1),
            max_tree_depth: config.tree.max_depth.max(1),
            feed_status: FeedStatus::Waiting,
            next_local_id: 0,
        }
    }

    /// Advances timers and scroll animation. Returns true when the chat
    /// viewport moved.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        let before = self.chat_scroll;
        self.ticks = self.ticks.saturating_add(1);
        if let Some(command) = self.auto_scroll.poll(now) {
            match command.behavior {
                ScrollBehavior::Instant => {
                    self.smooth_scrolling = false;
                    self.chat_scroll = self.chat_max_scroll;
                }
                ScrollBehavior::Smooth => self.smooth_scrolling = true,
            }
        }
        if self.smooth_scrolling {
            self.advance_smooth_scroll(now);
        }
        self.chat_scroll != before
    }

    /// Whether frames change without new input: a working indicator is
    /// spinning or a smooth scroll is under way.
    pub fn is_animating(&self) -> bool {
        self.smooth_scrolling
            || !self.awaiting_reply.is_empty()
            || !self.messages.executing().is_empty()
    }

    /// Stops the app and tears down the scroll timers.
    pub fn quit(&mut self) {
        self.running = false;
        self.auto_scroll.shutdown();
    }

    /// Applies one item from the feed. Returns true when anything visible
    /// changed.
    pub fn apply_feed_item(&mut self, item: FeedItem, now: Instant) -> bool {
        match item {
            FeedItem::Event(event) => self.apply_feed_event(event, now),
            FeedItem::Ended { lines, skipped } => {
                info!(lines, skipped, "feed ended");
                self.feed_status = FeedStatus::Ended { lines, skipped };
                true
            }
        }
    }

    pub fn apply_feed_event(&mut self, event: FeedEvent, now: Instant) -> bool {
        let first = self.feed_status == FeedStatus::Waiting;
        if first {
            self.feed_status = FeedStatus::Live;
        }
        let changed = match event {
            FeedEvent::Step(step) => self.apply_step_event(step).needs_render(),
            FeedEvent::Message(message) => {
                let change = self.messages.apply(message);
                if change.grew() {
                    self.auto_scroll.on_content_growth(
                        self.messages.is_streaming(),
                        self.messages.len(),
                        now,
                    );
                }
                change.grew()
            }
            FeedEvent::Progress { percentage } => {
                let changed = self.authoritative_progress != Some(percentage);
                self.authoritative_progress = Some(percentage);
                changed
            }
            FeedEvent::TurnStarted { turn_id, agent_tag } => {
                debug!(%turn_id, "turn started, resetting step tree");
                self.steps.reset();
                self.authoritative_progress = None;
                self.tree_scroll = 0;
                self.awaiting_reply.pop_front();
                self.messages.start_turn(turn_id, agent_tag, Utc::now());
                true
            }
            FeedEvent::TurnFinished { turn_id } => self.messages.finish_turn(&turn_id).is_some(),
        };
        first || changed
    }

    /// An unknown id carrying a name is an announcement; anything else is an
    /// update for an existing step.
    pub fn apply_step_event(&mut self, event: StepEvent) -> UpdateOutcome {
        if !self.steps.contains(&event.step_id)
            && let Some(name) = event.name.as_deref()
        {
            self.steps.insert_step(
                event.parent_id.as_deref(),
                Step::new(event.step_id.clone(), name),
            );
            debug!(step_id = %event.step_id, total = self.steps.len(), "step announced");
            self.steps.apply_update(&event.step_id, &event.update());
            return UpdateOutcome::StatusChanged;
        }
        self.steps.apply_update(&event.step_id, &event.update())
    }

    pub fn steps(&self) -> &StepTree {
        &self.steps
    }

    pub fn messages(&self) -> &MessageStream {
        &self.messages
    }

    pub fn progress_summary(&self) -> ProgressSummary {
        aggregate(self.steps.roots(), self.authoritative_progress)
    }

    pub fn step_rows(&self) -> Vec<StepRow> {
        self.steps.rows(self.max_tree_depth)
    }

    pub fn executing_turns(&self) -> Vec<&ExecutingTurn> {
        self.messages
            .executing()
            .iter()
            .chain(self.awaiting_reply.iter())
            .collect()
    }

    pub fn follow_state(&self) -> FollowState {
        self.auto_scroll.state()
    }

    pub fn feed_status(&self) -> FeedStatus {
        self.feed_status
    }

    pub fn snapshot(&self) -> StateSnapshot<'_> {
        StateSnapshot {
            progress: self.progress_summary(),
            current_step: self.steps.current_step().map(|step| step.id.as_str()),
            steps: self.steps.roots(),
            messages: self.messages.messages(),
            executing: self.executing_turns(),
            follow_state: self.auto_scroll.state(),
            scroll: self.auto_scroll.scroll_state(),
        }
    }

    pub fn input_char(&mut self, c: char) {
        let byte_idx = char_to_byte_idx(&self.chat_input, self.chat_cursor);
        self.chat_input.insert(byte_idx, c);
        self.chat_cursor = self.chat_cursor.saturating_add(1);
        self.chat_cursor_goal_col = None;
        self.refresh_command_panel();
    }

    pub fn backspace_input(&mut self) {
        if self.chat_cursor == 0 {
            return;
        }

        let start = char_to_byte_idx(&self.chat_input, self.chat_cursor.saturating_sub(1));
        let end = char_to_byte_idx(&self.chat_input, self.chat_cursor);
        self.chat_input.drain(start..end);
        self.chat_cursor = self.chat_cursor.saturating_sub(1);
        self.chat_cursor_goal_col = None;
        self.refresh_command_panel();
    }

    pub fn delete_input(&mut self) {
        let char_len = self.chat_input.chars().count();
        if self.chat_cursor >= char_len {
            return;
        }
        let start = char_to_byte_idx(&self.chat_input, self.chat_cursor);
        let end = char_to_byte_idx(&self.chat_input, self.chat_cursor + 1);
        self.chat_input.drain(start..end);
        self.chat_cursor_goal_col = None;
        self.refresh_command_panel();
    }

    pub fn move_cursor_left(&mut self) {
        self.chat_cursor = self.chat_cursor.saturating_sub(1);
        self.chat_cursor_goal_col = None;
        self.refresh_command_panel();
    }

    pub fn move_cursor_right(&mut self) {
        let char_len = self.chat_input.chars().count();
        self.chat_cursor = (self.chat_cursor + 1).min(char_len);
        self.chat_cursor_goal_col = None;
        self.refresh_command_panel();
    }

    pub fn move_cursor_home(&mut self) {
        self.chat_cursor = 0;
        self.chat_cursor_goal_col = None;
        self.refresh_command_panel();
    }

    pub fn move_cursor_end(&mut self) {
        self.chat_cursor = self.chat_input.chars().count();
        self.chat_cursor_goal_col = None;
        self.refresh_command_panel();
    }

    /// Up arrow: moves the suggestion highlight while the panel is open,
    /// otherwise the caret.
    pub fn move_up(&mut self, width: u16) {
        if self.parser.is_visible() {
            self.parser.move_highlight_up();
            return;
        }
        let width = width.max(1);
        let positions = wrap_word_with_positions(&self.chat_input, width).positions;
        let (line, col) = positions[self.chat_cursor];
        if line == 0 {
            return;
        }
        let goal_col = self.chat_cursor_goal_col.unwrap_or(col);
        self.chat_cursor = nearest_index_for_line_col(&positions, line - 1, goal_col);
        self.chat_cursor_goal_col = Some(goal_col);
    }

    pub fn move_down(&mut self, width: u16) {
        if self.parser.is_visible() {
            self.parser.move_highlight_down();
            return;
        }
        let width = width.max(1);
        let positions = wrap_word_with_positions(&self.chat_input, width).positions;
        let (line, col) = positions[self.chat_cursor];
        let max_line = positions.iter().map(|(l, _)| *l).max().unwrap_or(0);
        if line >= max_line {
            return;
        }
        let goal_col = self.chat_cursor_goal_col.unwrap_or(col);
        self.chat_cursor = nearest_index_for_line_col(&positions, line + 1, goal_col);
        self.chat_cursor_goal_col = Some(goal_col);
    }

    pub fn chat_input(&self) -> &str {
        &self.chat_input
    }

    pub fn chat_cursor_line_col(&self, width: u16) -> (u16, u16) {
        let positions = wrap_word_with_positions(&self.chat_input, width.max(1)).positions;
        positions[self.chat_cursor]
    }

    pub fn should_show_command_panel(&self) -> bool {
        self.parser.is_visible()
    }

    pub fn command_suggestions(&self) -> Vec<&CommandSuggestion> {
        if !self.parser.is_visible() {
            return Vec::new();
        }
        self.parser.suggestions()
    }

    pub fn highlighted_command(&self) -> usize {
        self.parser.highlighted()
    }

    /// Tab: accepts the highlighted workflow.
    pub fn complete_command(&mut self) -> bool {
        let Some(selection) = self.parser.select_highlighted(&self.chat_input) else {
            return false;
        };
        self.apply_selection(selection);
        true
    }

    pub fn select_command(&mut self, index: usize) -> bool {
        let Some(token) = self.command_suggestions().get(index).map(|entry| entry.token.clone())
        else {
            return false;
        };
        match self.parser.select(&self.chat_input, &token) {
            Some(selection) => {
                self.apply_selection(selection);
                true
            }
            None => false,
        }
    }

    pub fn dismiss_command_panel(&mut self) {
        self.parser.dismiss();
    }

    /// Enter: accepts a highlighted workflow while one is being typed,
    /// otherwise sends the buffer.
    pub fn submit(&mut self, now: Instant) -> Option<SendIntent> {
        if self.parser.accepts_enter() && self.complete_command() {
            return None;
        }
        let text = self.consume_chat_input_trimmed()?;
        self.next_local_id += 1;
        let id = self.next_local_id;
        self.messages
            .push_local(format!("local-{id}"), Role::User, text.clone());
        self.awaiting_reply.push_back(ExecutingTurn {
            turn_id: format!("{LOCAL_TURN_PREFIX}{id}"),
            agent_tag: None,
            started_at: Utc::now(),
        });
        self.auto_scroll.jump_to_bottom(now);

        let intent = SendIntent {
            attached_files: attached_files(&text),
            text,
        };
        info!(
            chars = intent.text.len(),
            attachments = intent.attached_files.len(),
            "send intent"
        );
        Some(intent)
    }

    /// Adds a local system line to the chat, for host-side problems the user
    /// should see.
    pub fn push_notice(&mut self, text: impl Into<String>, now: Instant) {
        self.next_local_id += 1;
        let id = format!("notice-{}", self.next_local_id);
        if self.messages.push_local(id, Role::System, text) {
            self.auto_scroll
                .on_content_growth(false, self.messages.len(), now);
        }
    }

    pub fn consume_chat_input_trimmed(&mut self) -> Option<String> {
        let message = self.chat_input.trim().to_string();
        self.chat_input.clear();
        self.chat_cursor = 0;
        self.chat_cursor_goal_col = None;
        self.refresh_command_panel();
        if message.is_empty() {
            None
        } else {
            Some(message)
        }
    }

    /// Layout feedback from the renderer: how far the chat can scroll and how
    /// many rows one page holds.
    pub fn set_chat_viewport(&mut self, max_scroll: u16, page_rows: u16) {
        self.chat_max_scroll = max_scroll;
        self.chat_page_rows = page_rows.max(1);
        self.chat_scroll = self.chat_scroll.min(max_scroll);
    }

    pub fn chat_scroll(&self) -> u16 {
        self.chat_scroll
    }

    pub fn scroll_chat_up(&mut self) {
        self.user_scroll_to(self.chat_scroll.saturating_sub(1));
    }

    pub fn scroll_chat_down(&mut self) {
        self.user_scroll_to(self.chat_scroll.saturating_add(1));
    }

    pub fn page_chat_up(&mut self) {
        self.user_scroll_to(self.chat_scroll.saturating_sub(self.chat_page_rows));
    }

    pub fn page_chat_down(&mut self) {
        self.user_scroll_to(self.chat_scroll.saturating_add(self.chat_page_rows));
    }

    pub fn jump_to_bottom(&mut self, now: Instant) {
        self.auto_scroll.jump_to_bottom(now);
    }

    pub fn tree_scroll(&self) -> u16 {
        self.tree_scroll
    }

    pub fn scroll_tree_up(&mut self) {
        self.tree_scroll = self.tree_scroll.saturating_sub(1);
    }

    pub fn scroll_tree_down(&mut self, max_scroll: u16) {
        self.tree_scroll = (self.tree_scroll + 1).min(max_scroll);
    }

    fn user_scroll_to(&mut self, scroll: u16) {
        self.smooth_scrolling = false;
        self.chat_scroll = scroll.min(self.chat_max_scroll);
        self.auto_scroll.on_user_scroll(self.scroll_sample());
    }

    fn advance_smooth_scroll(&mut self, now: Instant) {
        let remaining = self.chat_max_scroll.saturating_sub(self.chat_scroll);
        if remaining == 0 || !self.auto_scroll.is_following() {
            self.smooth_scrolling = false;
            return;
        }
        let step = remaining.div_ceil(SMOOTH_SCROLL_DIVISOR).max(1);
        self.chat_scroll += step;
        self.auto_scroll.note_programmatic_scroll(now);
        self.auto_scroll.on_scroll_sample(self.scroll_sample(), now);
    }

    /// Current chat position in scroll units.
    fn scroll_sample(&self) -> ScrollSample {
        let units = self.row_height_units;
        let page = u32::from(self.chat_page_rows);
        ScrollSample::from_metrics(
            u32::from(self.chat_scroll).saturating_mul(units),
            page.saturating_mul(units),
            (u32::from(self.chat_max_scroll) + page).saturating_mul(units),
        )
    }

    fn apply_selection(&mut self, selection: Selection) {
        self.chat_cursor = selection.buffer[..selection.caret].chars().count();
        self.chat_input = selection.buffer;
        self.chat_cursor_goal_col = None;
        self.refresh_command_panel();
    }

    fn refresh_command_panel(&mut self) {
        let caret = char_to_byte_idx(&self.chat_input, self.chat_cursor);
        self.parser.evaluate(&self.chat_input, caret);
    }
}

/// `@path` words name files to attach.
fn attached_files(text: &str) -> Vec<PathBuf> {
    text.split_whitespace()
        .filter_map(|word| word.strip_prefix('@'))
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn char_to_byte_idx(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(byte_idx, _)| byte_idx)
        .unwrap_or_else(|| s.len())
}

fn nearest_index_for_line_col(positions: &[(u16, u16)], target_line: u16, goal_col: u16) -> usize {
    let mut best: Option<(usize, u16)> = None;
    let mut fallback: Option<usize> = None;

    for (idx, (line, col)) in positions.iter().copied().enumerate() {
        if line != target_line {
            continue;
        }
        if fallback.is_none() {
            fallback = Some(idx);
        }
        if col <= goal_col {
            best = match best {
                Some((_, best_col)) if best_col >= col => best,
                _ => Some((idx, col)),
            };
        }
    }

    if let Some((idx, _)) = best {
        idx
    } else {
        fallback.unwrap_or(positions.len().saturating_sub(1))
    }
}

#[cfg(test)]
#[path = "../tests/unit/app_tests.rs"]
mod tests;
