use std::io;
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Tick,
    Resize,
    Quit,
    MoveUp,
    MoveDown,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    Complete,
    Dismiss,
    ScrollChatUp,
    ScrollChatDown,
    PageChatUp,
    PageChatDown,
    JumpToBottom,
    ScrollTreeUp,
    ScrollTreeDown,
    InputChar(char),
    Backspace,
    Delete,
    Submit,
    MouseScrollUp(u16, u16),
    MouseScrollDown(u16, u16),
    MouseLeftClick(u16, u16),
}

fn map_key_event(key_event: KeyEvent) -> AppEvent {
    if key_event.kind != KeyEventKind::Press {
        return AppEvent::Tick;
    }

    let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);
    let shift = key_event.modifiers.contains(KeyModifiers::SHIFT);
    match key_event.code {
        KeyCode::Char('c') if ctrl => AppEvent::Quit,
        KeyCode::Char('u') if ctrl => AppEvent::ScrollTreeUp,
        KeyCode::Char('d') if ctrl => AppEvent::ScrollTreeDown,
        KeyCode::Char('g') if ctrl => AppEvent::JumpToBottom,
        KeyCode::Char('a') if ctrl => AppEvent::CursorHome,
        KeyCode::Char('e') if ctrl => AppEvent::CursorEnd,
        KeyCode::Up if shift || ctrl => AppEvent::ScrollChatUp,
        KeyCode::Down if shift || ctrl => AppEvent::ScrollChatDown,
        KeyCode::End if ctrl => AppEvent::JumpToBottom,
        KeyCode::PageUp => AppEvent::PageChatUp,
        KeyCode::PageDown => AppEvent::PageChatDown,
        KeyCode::Up => AppEvent::MoveUp,
        KeyCode::Down => AppEvent::MoveDown,
        KeyCode::Left => AppEvent::CursorLeft,
        KeyCode::Right => AppEvent::CursorRight,
        KeyCode::Home => AppEvent::CursorHome,
        KeyCode::End => AppEvent::CursorEnd,
        KeyCode::Tab => AppEvent::Complete,
        KeyCode::Esc => AppEvent::Dismiss,
        KeyCode::Backspace => AppEvent::Backspace,
        KeyCode::Delete => AppEvent::Delete,
        KeyCode::Enter => AppEvent::Submit,
        KeyCode::Char(c) => AppEvent::InputChar(c),
        _ => AppEvent::Tick,
    }
}

fn map_mouse_event(kind: MouseEventKind, column: u16, row: u16) -> AppEvent {
    match kind {
        MouseEventKind::ScrollUp => AppEvent::MouseScrollUp(column, row),
        MouseEventKind::ScrollDown => AppEvent::MouseScrollDown(column, row),
        MouseEventKind::Down(MouseButton::Left) => AppEvent::MouseLeftClick(column, row),
        _ => AppEvent::Tick,
    }
}

pub fn next_event(timeout: Duration) -> io::Result<AppEvent> {
    if event::poll(timeout)? {
        match event::read()? {
            Event::Key(key_event) => return Ok(map_key_event(key_event)),
            Event::Mouse(mouse_event) => {
                return Ok(map_mouse_event(
                    mouse_event.kind,
                    mouse_event.column,
                    mouse_event.row,
                ));
            }
            Event::Resize(_, _) => return Ok(AppEvent::Resize),
            _ => {}
        }
    }

    Ok(AppEvent::Tick)
}
