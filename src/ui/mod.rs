/// User interface module
///
/// - Keyboard shortcut routing (keyboard.rs)
/// - Widget tree for the tagging screen (view.rs)

pub mod keyboard;
pub mod view;
