use ratatui::widgets::ListState;
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tracing::debug;

use crate::catalog::Catalog;
use crate::constants::constants;
use crate::engine::{AppEvent, Engine};
use crate::info::InfoRow;
use crate::theme::Theme;
use crate::tree::{NodeId, Payload, Row, Tree, TreeEvent};

pub struct App<C> {
  pub tree: Tree,
  /// Flattened visible tree, rebuilt whenever the tree changes.
  pub rows: Vec<Row>,
  pub list_state: ListState,
  engine: Engine<C>,
  events_rx: mpsc::UnboundedReceiver<AppEvent>,
  /// Rows describing the node under the cursor.
  pub info: Vec<InfoRow>,
  info_generation: u64,
  info_node: Option<NodeId>,
  /// Recent dispatcher and loader output, newest last.
  pub log: VecDeque<String>,
  pub debug: bool,
  pub status_message: Option<String>,
  pub should_quit: bool,
}

impl<C: Catalog> App<C> {
  pub fn new(engine: Engine<C>, events_rx: mpsc::UnboundedReceiver<AppEvent>, debug: bool) -> Self {
    let mut tree = Tree::new(&constants().root_title);
    engine.populate_root(&mut tree);
    let mut app = Self {
      tree,
      rows: Vec::new(),
      list_state: ListState::default(),
      engine,
      events_rx,
      info: Vec::new(),
      info_generation: 0,
      info_node: None,
      log: VecDeque::new(),
      debug,
      status_message: None,
      should_quit: false,
    };
    app.refresh_rows();
    // Start on the first entry below the root.
    app.list_state.select(Some(app.rows.len().min(2).saturating_sub(1)));
    app.on_cursor_moved();
    app
  }

  pub fn theme(&self) -> &'static Theme {
    &Theme::DEFAULT
  }

  /// Apply everything the workers have sent since the last tick.
  pub fn check_pending(&mut self) {
    let mut tree_changed = false;
    let mut info_stale = false;
    while let Ok(event) = self.events_rx.try_recv() {
      match event {
        AppEvent::Tree(event) => {
          if let TreeEvent::Attach { parent, .. } = &event
            && self.info_node == Some(*parent)
          {
            info_stale = true;
          }
          self.tree.apply(event);
          tree_changed = true;
        }
        AppEvent::Info { generation, rows } => {
          if generation == self.info_generation {
            self.info = rows;
          } else {
            debug!(generation, current = self.info_generation, "app: dropping stale info");
          }
        }
        AppEvent::Log(line) => self.push_log(line),
      }
    }
    if tree_changed {
      self.refresh_rows();
    }
    if info_stale {
      self.request_info();
    }
  }

  fn push_log(&mut self, line: String) {
    while self.log.len() >= constants().log_pane_lines.max(1) {
      self.log.pop_front();
    }
    self.log.push_back(line);
  }

  /// Rebuild the visible rows, keeping the cursor on the same node.
  fn refresh_rows(&mut self) {
    let selected = self.selected_node();
    self.rows = self.tree.visible_rows();
    let index = selected
      .and_then(|id| self.rows.iter().position(|row| row.id == id))
      .or_else(|| self.list_state.selected().map(|i| i.min(self.rows.len().saturating_sub(1))));
    self.list_state.select(index);
  }

  pub fn selected_node(&self) -> Option<NodeId> {
    self.list_state.selected().and_then(|i| self.rows.get(i)).map(|row| row.id)
  }

  fn select_row(&mut self, index: usize) {
    if self.rows.is_empty() {
      return;
    }
    self.list_state.select(Some(index.min(self.rows.len() - 1)));
    self.on_cursor_moved();
  }

  pub fn move_by(&mut self, delta: isize) {
    let current = self.list_state.selected().unwrap_or(0);
    self.select_row(current.saturating_add_signed(delta));
  }

  pub fn select_first(&mut self) {
    self.select_row(0);
  }

  pub fn select_last(&mut self) {
    self.select_row(self.rows.len().saturating_sub(1));
  }

  /// Enter on the current node: toggle, expand, or dispatch.
  pub fn activate(&mut self) {
    let Some(id) = self.selected_node() else { return };
    self.engine.select(&mut self.tree, id);
    self.refresh_rows();
  }

  /// Collapse the current node, or jump to its parent if it is already collapsed.
  pub fn collapse(&mut self) {
    let Some(id) = self.selected_node() else { return };
    let node = self.tree.get(id);
    if node.expanded && !node.children.is_empty() {
      self.tree.toggle(id);
      self.refresh_rows();
    } else if let Some(parent) = node.parent
      && let Some(index) = self.rows.iter().position(|row| row.id == parent)
    {
      self.select_row(index);
    }
  }

  /// Expand the current node, loading it first if needed. Command and action leaves are left alone.
  pub fn expand(&mut self) {
    let Some(id) = self.selected_node() else { return };
    let node = self.tree.get(id);
    if node.children.is_empty() {
      if node.payload.as_ref().is_some_and(Payload::is_expandable) {
        self.activate();
      }
    } else if !node.expanded {
      self.tree.toggle(id);
      self.refresh_rows();
    }
  }

  /// Ask for a fresh description when the cursor lands on a different node.
  fn on_cursor_moved(&mut self) {
    let node = self.selected_node();
    if node == self.info_node {
      return;
    }
    self.info_node = node;
    self.info.clear();
    self.request_info();
  }

  /// Describe `info_node` again; any answer still in flight becomes stale.
  fn request_info(&mut self) {
    self.info_generation += 1;
    if let Some(payload) = self.info_node.and_then(|id| self.tree.get(id).payload.clone()) {
      self.engine.request_info(self.info_generation, payload);
    }
  }
}
