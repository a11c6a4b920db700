use std::time::Duration;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use crate::editor::{PointerButton, PointerEvent, Pos};
use crate::shared::InputEvent;
use super::mode::TuiState;

// poll for input from the terminal and resolve it into input events; waits
// up to `timeout` for the first event, then drains whatever else is queued
// so a fast mouse drag doesn't lag behind
pub fn poll_input(timeout: Duration, ts: &TuiState) -> anyhow::Result<Vec<InputEvent>> {
    let mut events = Vec::new();
    if !event::poll(timeout)? {
        return Ok(events);
    }
    loop {
        match event::read()? {
            Event::Key(key) => events.extend(handle_key(key)),
            Event::Mouse(mouse) => events.extend(handle_mouse(mouse, ts)),
            _ => {}
        }
        if !event::poll(Duration::ZERO)? {
            return Ok(events);
        }
    }
}

fn handle_key(key: KeyEvent) -> Option<InputEvent> {
    match (key.kind, key.code) {
        (KeyEventKind::Press, KeyCode::Esc) => Some(InputEvent::Quit),

        // any keys on the 4x4 grid pad; releases only arrive when the
        // terminal reports event types
        (KeyEventKind::Press, KeyCode::Char(c)) if char_to_pad(c).is_some() => {
            char_to_pad(c).map(InputEvent::PadDown)
        }
        (KeyEventKind::Release, KeyCode::Char(c)) => char_to_pad(c).map(InputEvent::PadUp),

        (KeyEventKind::Press, KeyCode::Char(',')) => Some(InputEvent::OctaveDown),
        (KeyEventKind::Press, KeyCode::Char('.')) => Some(InputEvent::OctaveUp),
        (KeyEventKind::Press, KeyCode::Char('[')) => Some(InputEvent::SampleNoteDown),
        (KeyEventKind::Press, KeyCode::Char(']')) => Some(InputEvent::SampleNoteUp),
        (KeyEventKind::Press, KeyCode::Char('p')) => Some(InputEvent::ToggleAlgorithm),
        _ => None,
    }
}

// mouse positions become editor-local. moves and releases are passed on
// wherever they happen; a drag in progress owns the pointer
fn handle_mouse(mouse: MouseEvent, ts: &TuiState) -> Option<InputEvent> {
    let area = ts.editor_area?;
    let pos = Pos::new(
        mouse.column as f32 - area.x as f32,
        mouse.row as f32 - area.y as f32,
    );
    let pointer = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => PointerEvent::Down { button: PointerButton::Left, pos },
        MouseEventKind::Down(_) => PointerEvent::Down { button: PointerButton::Other, pos },
        MouseEventKind::Drag(_) | MouseEventKind::Moved => PointerEvent::Move { pos },
        MouseEventKind::Up(_) => PointerEvent::Up { pos },
        _ => return None,
    };
    Some(InputEvent::Pointer(pointer))
}

// convert char to pad index
fn char_to_pad(c: char) -> Option<u8> {
    let idx = match c {
        '1' => 0, '2' => 1, '3' => 2, '4' => 3,
        'q' => 4, 'w' => 5, 'e' => 6, 'r' => 7,
        'a' => 8, 's' => 9, 'd' => 10, 'f' => 11,
        'z' => 12, 'x' => 13, 'c' => 14, 'v' => 15,
        _ => return None,
    };
    Some(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};
    use ratatui::layout::Rect;

    fn key(kind: KeyEventKind, c: char) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent { kind, column, row, modifiers: KeyModifiers::NONE }
    }

    #[test]
    fn pad_keys_press_and_release() {
        assert_eq!(handle_key(key(KeyEventKind::Press, 'z')), Some(InputEvent::PadDown(12)));
        assert_eq!(handle_key(key(KeyEventKind::Release, 'z')), Some(InputEvent::PadUp(12)));
        assert_eq!(handle_key(key(KeyEventKind::Repeat, 'z')), None);
    }

    #[test]
    fn control_keys() {
        assert_eq!(handle_key(key(KeyEventKind::Press, 'p')), Some(InputEvent::ToggleAlgorithm));
        assert_eq!(handle_key(key(KeyEventKind::Press, ']')), Some(InputEvent::SampleNoteUp));
        assert_eq!(handle_key(key(KeyEventKind::Press, '.')), Some(InputEvent::OctaveUp));
        assert_eq!(handle_key(key(KeyEventKind::Release, 'p')), None);
    }

    #[test]
    fn mouse_is_editor_local() {
        let mut ts = TuiState::new(48);
        let down = mouse(MouseEventKind::Down(MouseButton::Left), 12, 7);
        assert_eq!(handle_mouse(down, &ts), None);

        ts.editor_area = Some(Rect::new(10, 5, 40, 10));
        assert_eq!(
            handle_mouse(down, &ts),
            Some(InputEvent::Pointer(PointerEvent::Down {
                button: PointerButton::Left,
                pos: Pos::new(2.0, 2.0),
            }))
        );
        let up = mouse(MouseEventKind::Up(MouseButton::Right), 0, 0);
        assert_eq!(
            handle_mouse(up, &ts),
            Some(InputEvent::Pointer(PointerEvent::Up { pos: Pos::new(-10.0, -5.0) }))
        );
    }
}
