/// Keyboard shortcuts
///
/// Key presses that a focused text input did not capture arrive here. What
/// a key means depends on which modal, if any, is on screen: while a modal
/// is open only its own keys work.

use iced::keyboard::key::Named;
use iced::keyboard::Key;

use crate::state::data::DisplayMode;
use crate::state::resolution::Outcome;

/// Modal currently covering the main view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    None,
    Challenge,
    ConfirmDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Previous,
    Next,
    Submit,
    RequestDelete,
    ConfirmDelete,
    DismissDelete,
    Mode(DisplayMode),
    Resolve(Outcome),
}

pub fn route(key: &Key, modal: Modal) -> Option<Shortcut> {
    let key = key.as_ref();
    match modal {
        Modal::Challenge => match key {
            Key::Named(Named::Escape) => Some(Shortcut::Resolve(Outcome::Cancel)),
            Key::Character("1") => Some(Shortcut::Resolve(Outcome::KeepExisting)),
            Key::Character("2") => Some(Shortcut::Resolve(Outcome::KeepNew)),
            _ => None,
        },
        Modal::ConfirmDelete => match key {
            Key::Named(Named::Enter) => Some(Shortcut::ConfirmDelete),
            Key::Character(c) if c.eq_ignore_ascii_case("y") => Some(Shortcut::ConfirmDelete),
            Key::Named(Named::Escape) => Some(Shortcut::DismissDelete),
            Key::Character(c) if c.eq_ignore_ascii_case("n") => Some(Shortcut::DismissDelete),
            _ => None,
        },
        Modal::None => match key {
            Key::Named(Named::ArrowLeft) => Some(Shortcut::Previous),
            Key::Named(Named::ArrowRight) => Some(Shortcut::Next),
            Key::Named(Named::Enter) => Some(Shortcut::Submit),
            Key::Named(Named::Delete) => Some(Shortcut::RequestDelete),
            Key::Character("1") => Some(Shortcut::Mode(DisplayMode::Original)),
            Key::Character("2") => Some(Shortcut::Mode(DisplayMode::Inverted)),
            _ => None,
        },
    }
}
