//! Key bindings: arrows, with vim-style aliases.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Rotate,
    SoftDrop,
    Pause,
    /// Dismiss the game-over alert.
    Confirm,
    Quit,
    None,
}

/// Map key event to game action. Arrows drive the piece; h/l/k/j are aliases.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('k') => Action::Rotate,
        KeyCode::Down | KeyCode::Char('j') => Action::SoftDrop,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Confirm,
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_arrows() {
        assert_eq!(key_to_action(press(KeyCode::Left)), Action::MoveLeft);
        assert_eq!(key_to_action(press(KeyCode::Right)), Action::MoveRight);
        assert_eq!(key_to_action(press(KeyCode::Up)), Action::Rotate);
        assert_eq!(key_to_action(press(KeyCode::Down)), Action::SoftDrop);
    }

    #[test]
    fn test_vim_aliases() {
        assert_eq!(key_to_action(press(KeyCode::Char('h'))), Action::MoveLeft);
        assert_eq!(key_to_action(press(KeyCode::Char('l'))), Action::MoveRight);
        assert_eq!(key_to_action(press(KeyCode::Char('k'))), Action::Rotate);
        assert_eq!(key_to_action(press(KeyCode::Char('j'))), Action::SoftDrop);
    }

    #[test]
    fn test_other_keys_ignored() {
        assert_eq!(key_to_action(press(KeyCode::Char('x'))), Action::None);
        assert_eq!(key_to_action(press(KeyCode::Tab)), Action::None);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Left, KeyModifiers::ALT)),
            Action::None
        );
    }

    #[test]
    fn test_confirm_keys() {
        assert_eq!(key_to_action(press(KeyCode::Enter)), Action::Confirm);
        assert_eq!(key_to_action(press(KeyCode::Char(' '))), Action::Confirm);
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(key_to_action(press(KeyCode::Esc)), Action::Quit);
        assert_eq!(key_to_action(press(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
    }
}
