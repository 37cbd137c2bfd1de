use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::action::Action;

/// Map a crossterm terminal event to a TUI action.
pub fn map_event(event: &Event) -> Action {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => map_key(key),
        Event::Resize(w, h) => Action::Resize(*w, *h),
        _ => Action::None,
    }
}

fn map_key(key: &KeyEvent) -> Action {
    // Ctrl+C always quits
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('n') | KeyCode::Char('j') | KeyCode::Char(' ') | KeyCode::Down => {
            Action::NextItem
        }
        KeyCode::Char('p') | KeyCode::Char('k') | KeyCode::Up => Action::PreviousItem,
        KeyCode::Char('v') | KeyCode::Enter => Action::OpenCurrent,
        KeyCode::Char('b') => Action::SaveCurrent,
        KeyCode::Char('r') => Action::ReloadSieve,
        KeyCode::Char('?') => Action::ToggleHelp,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn triage_keys_map_to_their_actions() {
        assert_eq!(map_event(&press(KeyCode::Char('n'))), Action::NextItem);
        assert_eq!(map_event(&press(KeyCode::Char(' '))), Action::NextItem);
        assert_eq!(map_event(&press(KeyCode::Down)), Action::NextItem);
        assert_eq!(map_event(&press(KeyCode::Char('p'))), Action::PreviousItem);
        assert_eq!(map_event(&press(KeyCode::Up)), Action::PreviousItem);
        assert_eq!(map_event(&press(KeyCode::Char('v'))), Action::OpenCurrent);
        assert_eq!(map_event(&press(KeyCode::Enter)), Action::OpenCurrent);
        assert_eq!(map_event(&press(KeyCode::Char('b'))), Action::SaveCurrent);
        assert_eq!(map_event(&press(KeyCode::Char('r'))), Action::ReloadSieve);
        assert_eq!(map_event(&press(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(map_event(&press(KeyCode::Char('?'))), Action::ToggleHelp);
        assert_eq!(map_event(&press(KeyCode::Char('x'))), Action::None);
    }

    #[test]
    fn ctrl_c_quits_regardless_of_key() {
        let event = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(map_event(&event), Action::Quit);
    }

    #[test]
    fn releases_and_resizes() {
        let mut release = KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(map_event(&Event::Key(release)), Action::None);
        assert_eq!(map_event(&Event::Resize(80, 24)), Action::Resize(80, 24));
    }
}
