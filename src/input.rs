use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::catalog::Catalog;

/// Rows skipped by PageUp/PageDown.
const PAGE: isize = 10;

// --- Event Handling ---

pub fn handle_key_event<C: Catalog>(app: &mut App<C>, key: KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  match key.code {
    KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
    KeyCode::Down | KeyCode::Char('j') => app.move_by(1),
    KeyCode::Up | KeyCode::Char('k') => app.move_by(-1),
    KeyCode::PageDown => app.move_by(PAGE),
    KeyCode::PageUp => app.move_by(-PAGE),
    KeyCode::Home | KeyCode::Char('g') => app.select_first(),
    KeyCode::End | KeyCode::Char('G') => app.select_last(),
    KeyCode::Enter | KeyCode::Char(' ') => {
      app.status_message = None;
      app.activate();
    }
    KeyCode::Left | KeyCode::Char('h') => app.collapse(),
    KeyCode::Right | KeyCode::Char('l') => app.expand(),
    _ => {}
  }
}
