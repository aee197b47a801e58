use ratatui::prelude::*;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Clear, Gauge, Padding, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, FeedStatus, Pane};
use crate::auto_scroll::FollowState;
use crate::command::CommandSuggestion;
use crate::messages::{ExecutingTurn, Message, Role};
use crate::progress::{display_percent, progress_bar};
use crate::step_tree::{StepRow, StepStatus, walk};
use crate::text_layout::{truncate_to_width, wrap_lines, wrap_word_with_positions};
use crate::theme::Theme;

const MAX_INPUT_TEXT_LINES: u16 = 5;
const TEXT_PADDING: u16 = 1;
const STATUS_HEIGHT: u16 = 3;
const TITLE_BAR_HEIGHT: u16 = 3;
const TREE_HEADER_ROWS: u16 = 3;
const CHAT_PERCENT: u16 = 60;
const ROW_BAR_WIDTH: usize = 10;
const META_BAR_WIDTH: usize = 16;
const STREAM_CURSOR: &str = "▍";
const ACTIVE_TITLE_BG: Color = Color::Rgb(90, 145, 200);
const ACTIVE_TITLE_FG: Color = Color::Black;
const STATUS_HELP_TEXT: &str = "Enter send | Tab complete | Esc dismiss | Shift+Up/Down or PgUp/PgDn scroll chat | Ctrl+U/Ctrl+D scroll steps | Ctrl+G bottom | Ctrl+C quit";

fn split_screen(screen: Rect) -> (Rect, Rect, Rect) {
    let [body, status] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(STATUS_HEIGHT)]).areas(screen);
    let [chat, steps] = Layout::horizontal([
        Constraint::Percentage(CHAT_PERCENT),
        Constraint::Percentage(100 - CHAT_PERCENT),
    ])
    .areas(body);
    (chat, steps, status)
}

fn split_title(area: Rect) -> (Rect, Rect) {
    let [title, content] =
        Layout::vertical([Constraint::Length(TITLE_BAR_HEIGHT), Constraint::Min(0)]).areas(area);
    (title, content)
}

#[derive(Debug, Clone, Copy)]
struct ChatLayout {
    messages_area: Rect,
    input_area: Rect,
    input_scroll: u16,
    cursor_line: u16,
    cursor_col: u16,
}

fn chat_layout(screen: Rect, app: &App) -> Option<ChatLayout> {
    let (chat, _steps, _status) = split_screen(screen);
    let (_title, content) = split_title(chat);
    if content.width < 1 || content.height < 2 {
        return None;
    }

    let input_text_width = content.width.saturating_sub(TEXT_PADDING * 2).max(1);
    let input_text_lines = wrap_word_with_positions(app.chat_input(), input_text_width).line_count;
    let (cursor_line, cursor_col) = app.chat_cursor_line_col(input_text_width);
    let max_input_height = content.height.saturating_sub(1).max(1);
    let (input_height, input_scroll) =
        input_box_metrics(input_text_lines, cursor_line, max_input_height);
    let [messages_area, input_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(input_height)]).areas(content);
    Some(ChatLayout {
        messages_area,
        input_area,
        input_scroll,
        cursor_line,
        cursor_col,
    })
}

pub fn chat_input_text_width(screen: Rect) -> u16 {
    let (chat, _steps, _status) = split_screen(screen);
    let (_title, content) = split_title(chat);
    content.width.saturating_sub(TEXT_PADDING * 2).max(1)
}

pub fn chat_max_scroll(screen: Rect, app: &App) -> u16 {
    let Some(layout) = chat_layout(screen, app) else {
        return 0;
    };
    let visible = layout.messages_area.height.saturating_sub(TEXT_PADDING * 2);
    let width = layout.messages_area.width.saturating_sub(TEXT_PADDING * 2).max(1);
    let total = saturating_rows(chat_display_lines(app, width).len());
    total.saturating_sub(visible)
}

pub fn chat_page_rows(screen: Rect, app: &App) -> u16 {
    chat_layout(screen, app)
        .map(|layout| layout.messages_area.height.saturating_sub(TEXT_PADDING * 2))
        .unwrap_or(0)
        .max(1)
}

fn saturating_rows(count: usize) -> u16 {
    u16::try_from(count).unwrap_or(u16::MAX)
}

fn tree_rows_area(screen: Rect) -> Rect {
    let (_chat, steps, _status) = split_screen(screen);
    let (_title, content) = split_title(steps);
    let inner = content.inner(Margin {
        horizontal: TEXT_PADDING,
        vertical: TEXT_PADDING,
    });
    let [_header, rows] =
        Layout::vertical([Constraint::Length(TREE_HEADER_ROWS), Constraint::Min(0)]).areas(inner);
    rows
}

pub fn tree_max_scroll(screen: Rect, app: &App) -> u16 {
    let rows = tree_rows_area(screen);
    saturating_rows(app.step_rows().len()).saturating_sub(rows.height)
}

pub fn pane_hit_test(screen: Rect, x: u16, y: u16) -> Option<Pane> {
    let (chat, steps, _status) = split_screen(screen);
    if point_in_rect(chat, x, y) {
        return Some(Pane::Chat);
    }
    if point_in_rect(steps, x, y) {
        return Some(Pane::Steps);
    }
    None
}

/// Index into `app.command_suggestions()` of the panel row under `(x, y)`.
pub fn command_panel_hit_test(screen: Rect, app: &App, x: u16, y: u16) -> Option<usize> {
    if !app.should_show_command_panel() {
        return None;
    }
    let layout = chat_layout(screen, app)?;
    let panel = command_panel_layout(
        app.command_suggestions().len(),
        app.highlighted_command(),
        layout.messages_area,
        layout.input_area,
    )?;
    if !point_in_rect(panel.area, x, y) {
        return None;
    }
    let row = y.checked_sub(panel.area.y + TEXT_PADDING)? as usize;
    (row < panel.shown).then_some(panel.start + row)
}

pub fn render(frame: &mut Frame, app: &App, theme: &Theme) {
    let (chat, steps, status) = split_screen(frame.area());
    render_chat_pane(frame, chat, app, theme);
    render_steps_pane(frame, steps, app, theme);

    frame.render_widget(
        Block::default().style(Style::default().bg(theme.status_bg)),
        status,
    );
    let help = Paragraph::new(status_line_text(app))
        .style(Style::default().bg(theme.status_bg).fg(theme.muted_fg))
        .block(
            Block::default()
                .style(Style::default().bg(theme.status_bg))
                .padding(Padding::uniform(TEXT_PADDING)),
        );
    frame.render_widget(help, status);
}

fn status_line_text(app: &App) -> String {
    let follow = match app.follow_state() {
        FollowState::Following => "following".to_string(),
        FollowState::PinnedByUser => "paused - Ctrl+G to jump".to_string(),
    };
    let feed = match app.feed_status() {
        FeedStatus::Waiting => "feed waiting".to_string(),
        FeedStatus::Live => "feed live".to_string(),
        FeedStatus::Ended { lines, skipped } if skipped > 0 => {
            format!("feed ended ({lines} lines, {skipped} skipped)")
        }
        FeedStatus::Ended { lines, .. } => format!("feed ended ({lines} lines)"),
    };
    format!("{follow} | {feed} | {STATUS_HELP_TEXT}")
}

fn working_dots(ticks: u64) -> &'static str {
    const FRAMES: [&str; 6] = ["[   ]", "[.  ]", "[.. ]", "[...]", "[ ..]", "[  .]"];
    FRAMES[((ticks / 2) as usize) % FRAMES.len()]
}

fn render_title_bar(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    base_bg: Color,
    active: bool,
    theme: &Theme,
) {
    let title_bg = title_bar_bg(base_bg, active);
    let title_fg = if active {
        ACTIVE_TITLE_FG
    } else {
        theme.muted_fg
    };
    let text_width = area.width.saturating_sub(TEXT_PADDING * 2) as usize;
    frame.render_widget(
        Block::default().style(Style::default().bg(title_bg)),
        area,
    );
    frame.render_widget(
        Paragraph::new(truncate_to_width(title, text_width))
            .style(Style::default().bg(title_bg).fg(title_fg))
            .block(
                Block::default()
                    .style(Style::default().bg(title_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        area,
    );
}

fn render_chat_pane(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let (title_area, content) = split_title(area);
    let executing = app.executing_turns();
    let title = if executing.is_empty() {
        "Agent Chat".to_string()
    } else {
        format!("Agent Chat | working {}", working_dots(app.ticks))
    };
    render_title_bar(
        frame,
        title_area,
        &title,
        theme.chat_bg,
        !executing.is_empty(),
        theme,
    );

    frame.render_widget(
        Block::default().style(Style::default().bg(theme.chat_bg)),
        content,
    );
    let Some(layout) = chat_layout(frame.area(), app) else {
        return;
    };

    let width = layout.messages_area.width.saturating_sub(TEXT_PADDING * 2).max(1);
    let lines = chat_display_lines(app, width);
    let messages = Paragraph::new(chat_text(&lines, theme))
        .scroll((app.chat_scroll().min(chat_max_scroll(frame.area(), app)), 0))
        .style(Style::default().bg(theme.chat_bg).fg(theme.text_fg))
        .block(
            Block::default()
                .style(Style::default().bg(theme.chat_bg))
                .padding(Padding::uniform(TEXT_PADDING)),
        );
    frame.render_widget(messages, layout.messages_area);

    let input_text_width = layout.input_area.width.saturating_sub(TEXT_PADDING * 2).max(1);
    let input = Paragraph::new(wrap_word_with_positions(app.chat_input(), input_text_width).rendered)
        .block(
            Block::default()
                .style(Style::default().bg(theme.input_bg))
                .padding(Padding::uniform(TEXT_PADDING)),
        )
        .style(Style::default().bg(theme.input_bg).fg(theme.text_fg))
        .scroll((layout.input_scroll, 0));
    frame.render_widget(input, layout.input_area);

    if app.should_show_command_panel() {
        render_command_panel(
            frame,
            &app.command_suggestions(),
            app.highlighted_command(),
            layout.messages_area,
            layout.input_area,
            theme,
        );
    }

    let input_inner = layout.input_area.inner(Margin {
        horizontal: TEXT_PADDING,
        vertical: TEXT_PADDING,
    });
    if input_inner.width > 0 && input_inner.height > 0 {
        let visible_cursor_line = layout.cursor_line.saturating_sub(layout.input_scroll);
        if visible_cursor_line < input_inner.height {
            frame.set_cursor_position((
                input_inner.x.saturating_add(
                    layout
                        .cursor_col
                        .min(input_inner.width.saturating_sub(1)),
                ),
                input_inner.y.saturating_add(visible_cursor_line),
            ));
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CommandPanelLayout {
    area: Rect,
    start: usize,
    shown: usize,
}

/// Places the suggestion panel directly above the input box, scrolled so the
/// highlighted row stays visible.
fn command_panel_layout(
    total: usize,
    highlighted: usize,
    messages_area: Rect,
    input_area: Rect,
) -> Option<CommandPanelLayout> {
    if total == 0 || messages_area.height == 0 || input_area.width == 0 {
        return None;
    }
    let max_items = messages_area.height.saturating_sub(TEXT_PADDING * 2).max(1) as usize;
    let shown = total.min(max_items);
    let start = highlighted.saturating_sub(shown.saturating_sub(1));
    let height = (shown as u16)
        .saturating_add(TEXT_PADDING * 2)
        .min(messages_area.height.max(1));
    let y = input_area.y.saturating_sub(height).max(messages_area.y);
    Some(CommandPanelLayout {
        area: Rect::new(input_area.x, y, input_area.width, height),
        start,
        shown,
    })
}

fn render_command_panel(
    frame: &mut Frame,
    suggestions: &[&CommandSuggestion],
    highlighted: usize,
    messages_area: Rect,
    input_area: Rect,
    theme: &Theme,
) {
    let Some(panel) = command_panel_layout(suggestions.len(), highlighted, messages_area, input_area)
    else {
        return;
    };

    let mut lines = Vec::with_capacity(panel.shown);
    for (idx, item) in suggestions
        .iter()
        .enumerate()
        .skip(panel.start)
        .take(panel.shown)
    {
        let selected = idx == highlighted;
        let style = if selected {
            Style::default()
                .fg(theme.active_fg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text_fg)
        };
        let detail = if item.description.is_empty() {
            item.display_name.as_str()
        } else {
            item.description.as_str()
        };
        lines.push(Line::from(vec![
            Span::styled(
                if selected { ">" } else { " " }.to_string(),
                Style::default().fg(theme.muted_fg),
            ),
            Span::raw(" "),
            Span::styled(item.slash_token(), style),
            Span::raw(" "),
            Span::styled(detail.to_string(), Style::default().fg(theme.muted_fg)),
        ]));
    }

    frame.render_widget(Clear, panel.area);
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().bg(theme.panel_bg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.panel_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        panel.area,
    );
}

#[derive(Debug, Clone, PartialEq)]
enum ChatLineKind {
    Body(Role),
    Reasoning,
    Progress,
    Plan(StepStatus),
    Working,
    Placeholder,
    Separator,
}

#[derive(Debug, Clone)]
struct ChatDisplayLine {
    kind: ChatLineKind,
    label: Option<String>,
    indent: usize,
    body: String,
}

impl ChatDisplayLine {
    fn plain(kind: ChatLineKind, indent: usize, body: String) -> Self {
        Self {
            kind,
            label: None,
            indent,
            body,
        }
    }
}

fn message_label(message: &Message) -> String {
    match (message.role, message.agent_tag.as_deref()) {
        (Role::Assistant, Some(tag)) => format!("{} [{tag}]:", message.role.label()),
        (role, _) => format!("{}:", role.label()),
    }
}

fn turn_label(turn: &ExecutingTurn) -> String {
    match turn.agent_tag.as_deref() {
        Some(tag) => format!("{} [{tag}]", Role::Assistant.label()),
        None => Role::Assistant.label().to_string(),
    }
}

fn chat_display_lines(app: &App, width: u16) -> Vec<ChatDisplayLine> {
    let width = width.max(1);
    let messages = app.messages().messages();
    let executing = app.executing_turns();
    let mut out = Vec::new();

    if app.messages().is_empty() && executing.is_empty() {
        out.push(ChatDisplayLine::plain(
            ChatLineKind::Placeholder,
            0,
            "Waiting for agent activity...".to_string(),
        ));
        return out;
    }

    for (idx, message) in messages.iter().enumerate() {
        push_message_lines(&mut out, message, width);
        if idx + 1 < messages.len() || !executing.is_empty() {
            out.push(ChatDisplayLine::plain(
                ChatLineKind::Separator,
                0,
                "─".repeat(width as usize),
            ));
        }
    }

    for turn in executing {
        out.push(ChatDisplayLine::plain(
            ChatLineKind::Working,
            0,
            format!("{} is working {}", turn_label(turn), working_dots(app.ticks)),
        ));
    }
    out
}

fn push_message_lines(out: &mut Vec<ChatDisplayLine>, message: &Message, width: u16) {
    let label = message_label(message);
    let label_width = label.width() + 1;
    let body_width = (width as usize).saturating_sub(label_width).max(1) as u16;
    let mut body = message.content.clone();
    if message.is_streaming {
        body.push_str(STREAM_CURSOR);
    }
    let kind = ChatLineKind::Body(message.role);
    for (idx, line) in wrap_lines(&body, body_width).into_iter().enumerate() {
        out.push(ChatDisplayLine {
            kind: kind.clone(),
            label: (idx == 0).then(|| label.clone()),
            indent: label_width,
            body: line,
        });
    }

    let Some(metadata) = &message.metadata else {
        return;
    };
    let nested_width = (width as usize).saturating_sub(label_width).max(1);
    if let Some(reasoning) = &metadata.reasoning {
        for line in wrap_lines(reasoning, nested_width as u16) {
            out.push(ChatDisplayLine::plain(
                ChatLineKind::Reasoning,
                label_width,
                line,
            ));
        }
    }
    if let Some(progress) = metadata.progress {
        let bar_width = META_BAR_WIDTH.min(nested_width.saturating_sub(5)).max(1);
        out.push(ChatDisplayLine::plain(
            ChatLineKind::Progress,
            label_width,
            format!(
                "{} {}%",
                progress_bar(progress, bar_width),
                display_percent(progress)
            ),
        ));
    }
    for (depth, step) in walk(&metadata.plan_steps) {
        let row = format!(
            "{}{} {}",
            "  ".repeat(depth),
            status_icon(step.status),
            step.name
        );
        out.push(ChatDisplayLine::plain(
            ChatLineKind::Plan(step.status),
            label_width,
            truncate_to_width(&row, nested_width),
        ));
    }
}

fn role_style(role: Role, theme: &Theme) -> Style {
    match role {
        Role::User => Style::default().fg(theme.user_fg),
        Role::Assistant => Style::default().fg(theme.assistant_fg),
        Role::System => Style::default()
            .fg(theme.system_fg)
            .add_modifier(Modifier::DIM),
    }
}

fn chat_text(lines: &[ChatDisplayLine], theme: &Theme) -> Text<'static> {
    let mut out_lines = Vec::with_capacity(lines.len());
    for line in lines {
        let body_style = match &line.kind {
            ChatLineKind::Body(Role::System) => role_style(Role::System, theme),
            ChatLineKind::Body(_) => Style::default(),
            ChatLineKind::Reasoning => Style::default()
                .fg(theme.muted_fg)
                .add_modifier(Modifier::DIM | Modifier::ITALIC),
            ChatLineKind::Progress => Style::default().fg(theme.gauge_fg),
            ChatLineKind::Plan(status) => Style::default().fg(theme.status_fg(*status)),
            ChatLineKind::Working => Style::default().fg(theme.running_fg),
            ChatLineKind::Placeholder => Style::default().fg(theme.muted_fg),
            ChatLineKind::Separator => Style::default().fg(chat_separator_color(theme)),
        };
        let mut spans = Vec::with_capacity(3);
        match (&line.label, &line.kind) {
            (Some(label), ChatLineKind::Body(role)) => {
                spans.push(Span::styled(label.clone(), role_style(*role, theme)));
                spans.push(Span::raw(" "));
            }
            _ if line.indent > 0 => spans.push(Span::raw(" ".repeat(line.indent))),
            _ => {}
        }
        spans.push(Span::styled(line.body.clone(), body_style));
        out_lines.push(Line::from(spans));
    }
    Text::from(out_lines)
}

fn chat_separator_color(theme: &Theme) -> Color {
    match theme.chat_bg {
        Color::Rgb(r, g, b) => Color::Rgb(
            r.saturating_add(12),
            g.saturating_add(12),
            b.saturating_add(12),
        ),
        _ => theme.muted_fg,
    }
}

fn status_icon(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pending => "[ ]",
        StepStatus::Running => "[~]",
        StepStatus::Completed => "[x]",
        StepStatus::Error => "[!]",
    }
}

fn render_steps_pane(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let (title_area, content) = split_title(area);
    let current = app.steps().current_step();
    let title = match current {
        Some(step) => format!("Steps | {}", step.name),
        None => "Steps".to_string(),
    };
    render_title_bar(frame, title_area, &title, theme.tree_bg, current.is_some(), theme);

    frame.render_widget(
        Block::default().style(Style::default().bg(theme.tree_bg)),
        content,
    );
    let inner = content.inner(Margin {
        horizontal: TEXT_PADDING,
        vertical: TEXT_PADDING,
    });
    if inner.width == 0 || inner.height == 0 {
        return;
    }
    let [header, rows_area] =
        Layout::vertical([Constraint::Length(TREE_HEADER_ROWS), Constraint::Min(0)]).areas(inner);
    let [gauge_area, counts_area, _gap] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(header);

    let summary = app.progress_summary();
    let percent = summary.display_percent();
    frame.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(theme.gauge_fg).bg(theme.panel_bg))
            .percent(u16::from(percent))
            .label(format!("{percent}%"))
            .use_unicode(true),
        gauge_area,
    );

    let counts = summary.counts;
    let counts_text = format!(
        "{}/{} done | {} running | {} failed",
        counts.completed,
        counts.total(),
        counts.running,
        counts.error
    );
    frame.render_widget(
        Paragraph::new(counts_text).style(Style::default().bg(theme.tree_bg).fg(theme.muted_fg)),
        counts_area,
    );

    let rows = app.step_rows();
    let text = if app.steps().is_empty() {
        Text::from(Line::from(Span::styled(
            "No steps yet",
            Style::default().fg(theme.muted_fg),
        )))
    } else {
        step_rows_text(&rows, rows_area.width as usize, theme)
    };
    let max_scroll = saturating_rows(rows.len()).saturating_sub(rows_area.height);
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().bg(theme.tree_bg).fg(theme.text_fg))
            .scroll((app.tree_scroll().min(max_scroll), 0)),
        rows_area,
    );
}

fn step_rows_text(rows: &[StepRow], width: usize, theme: &Theme) -> Text<'static> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        match row {
            StepRow::Step {
                depth,
                name,
                status,
                percentage,
                current,
                ..
            } => {
                let indent = "  ".repeat(*depth);
                let mut suffix = String::new();
                if *status == StepStatus::Running
                    && let Some(percent) = percentage
                {
                    suffix = format!(
                        " {} {}%",
                        progress_bar(*percent, ROW_BAR_WIDTH),
                        display_percent(*percent)
                    );
                }
                let fixed = indent.width() + status_icon(*status).width() + 1 + suffix.width();
                let name = truncate_to_width(name, width.saturating_sub(fixed));
                let mut name_style = Style::default().fg(theme.text_fg);
                if *current {
                    name_style = name_style.fg(theme.active_fg).add_modifier(Modifier::BOLD);
                } else if status.is_terminal() {
                    name_style = name_style.fg(theme.muted_fg);
                }
                out.push(Line::from(vec![
                    Span::raw(indent),
                    Span::styled(
                        status_icon(*status).to_string(),
                        Style::default().fg(theme.status_fg(*status)),
                    ),
                    Span::raw(" "),
                    Span::styled(name, name_style),
                    Span::styled(suffix, Style::default().fg(theme.gauge_fg)),
                ]));
            }
            StepRow::Truncated { depth, hidden } => {
                out.push(Line::from(vec![
                    Span::raw("  ".repeat(*depth)),
                    Span::styled(
                        format!("... {hidden} more nested"),
                        Style::default()
                            .fg(theme.muted_fg)
                            .add_modifier(Modifier::DIM),
                    ),
                ]));
            }
        }
    }
    Text::from(out)
}

fn input_box_metrics(input_text_lines: u16, cursor_line: u16, max_input_height: u16) -> (u16, u16) {
    let capped_text_lines = input_text_lines.clamp(1, MAX_INPUT_TEXT_LINES);
    let desired_height = capped_text_lines.saturating_add(TEXT_PADDING * 2);
    let input_height = desired_height.clamp(1, max_input_height.max(1));
    let visible_text_lines = input_height.saturating_sub(TEXT_PADDING * 2).max(1);
    let max_scroll = input_text_lines.saturating_sub(visible_text_lines);
    let middle_line = visible_text_lines / 2;
    let input_scroll = cursor_line.saturating_sub(middle_line).min(max_scroll);
    (input_height, input_scroll)
}

fn title_bar_bg(base: Color, active: bool) -> Color {
    if active {
        return ACTIVE_TITLE_BG;
    }
    match base {
        Color::Rgb(r, g, b) => {
            let delta = -12;
            Color::Rgb(
                adjust_channel(r, delta),
                adjust_channel(g, delta),
                adjust_channel(b, delta),
            )
        }
        _ => base,
    }
}

fn point_in_rect(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x
        && x < rect.x.saturating_add(rect.width)
        && y >= rect.y
        && y < rect.y.saturating_add(rect.height)
}

fn adjust_channel(channel: u8, delta: i16) -> u8 {
    let value = channel as i16 + delta;
    value.clamp(0, 255) as u8
}

#[cfg(test)]
#[path = "../tests/unit/ui_tests.rs"]
mod tests;
