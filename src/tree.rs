//! Arena-backed navigation tree.
//!
//! Only the UI loop owns a `Tree`. Worker tasks describe the subtrees they built
//! as `NodeSpec`s and hand them over in a `TreeEvent`; a whole batch of children
//! is attached in one call so a partial child set is never visible.

use crate::config::CustomCommand;
use crate::model::{Channel, Episode, Event, Season, Seasons, SessionStreams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Semantic node colors; the theme maps them to terminal colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeColor {
  Root,
  Category,
  Folder,
  Item,
  Action,
  Live,
  NoContent,
  Dispatched,
}

/// Leaf actions that only need an identifier and a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
  Download,
  ShowUrl,
}

/// What a playback command node runs, and against which asset.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandContext {
  pub id: String,
  pub title: String,
  pub command: CustomCommand,
}

/// Data attached to a node. The variant never changes after creation, except
/// `AllSeasons` going from `None` to the loaded list on first expansion.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
  /// Index into the VOD category list.
  Category(usize),
  AllSeasons(Option<Seasons>),
  Season(Season),
  Event(Event),
  Session(SessionStreams),
  Channel(Channel),
  YearBucket(String),
  Episode(Episode),
  Command(CommandContext),
  Action { kind: ActionKind, id: String, title: String },
}

impl Payload {
  /// Whether selecting the node grows children rather than running something.
  pub fn is_expandable(&self) -> bool {
    !matches!(self, Payload::Command(_) | Payload::Action { .. })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
  Unexpanded,
  Loading,
  Populated,
  NoContent,
}

pub const LOADING_TEXT: &str = "loading...";
pub const NO_CONTENT_SUFFIX: &str = " - NO CONTENT AVAILABLE";

#[derive(Debug, Clone)]
pub struct Node {
  pub text: String,
  pub color: NodeColor,
  pub payload: Option<Payload>,
  pub parent: Option<NodeId>,
  pub children: Vec<NodeId>,
  pub expanded: bool,
  pub selectable: bool,
  pub state: NodeState,
  /// Blink phase while a busy indicator is running.
  pub busy: Option<bool>,
}

impl Node {
  fn new(text: String, color: NodeColor, payload: Option<Payload>, expanded: bool) -> Self {
    Self {
      text,
      color,
      payload,
      parent: None,
      children: Vec::new(),
      expanded,
      selectable: true,
      state: NodeState::Unexpanded,
      busy: None,
    }
  }

  /// Text to render: the loading placeholder while busy.
  pub fn display_text(&self) -> &str {
    if self.busy.is_some() { LOADING_TEXT } else { &self.text }
  }
}

/// A detached subtree built off the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
  pub text: String,
  pub color: NodeColor,
  pub payload: Option<Payload>,
  pub expanded: bool,
  pub children: Vec<NodeSpec>,
}

impl NodeSpec {
  pub fn new(text: impl Into<String>, color: NodeColor) -> Self {
    Self { text: text.into(), color, payload: None, expanded: true, children: Vec::new() }
  }

  pub fn with_payload(mut self, payload: Payload) -> Self {
    self.payload = Some(payload);
    self
  }

  pub fn with_children(mut self, children: Vec<NodeSpec>) -> Self {
    self.children = children;
    self
  }

  pub fn collapsed(mut self) -> Self {
    self.expanded = false;
    self
  }
}

/// Tree mutations produced by worker tasks, applied by the UI loop.
#[derive(Debug)]
pub enum TreeEvent {
  /// Result of an expansion. An empty batch flags the node as having no content.
  Attach { parent: NodeId, children: Vec<NodeSpec>, payload: Option<Payload> },
  Blink { node: NodeId, on: bool },
  BusyDone { node: NodeId },
  Dispatched { node: NodeId },
}

/// One visible line of the flattened tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
  pub id: NodeId,
  pub depth: usize,
}

#[derive(Debug)]
pub struct Tree {
  nodes: Vec<Node>,
}

impl Tree {
  pub fn new(root_text: &str) -> Self {
    let mut root = Node::new(root_text.to_string(), NodeColor::Root, None, true);
    root.selectable = false;
    Self { nodes: vec![root] }
  }

  pub fn root(&self) -> NodeId {
    NodeId(0)
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn get(&self, id: NodeId) -> &Node {
    &self.nodes[id.0]
  }

  pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
    &mut self.nodes[id.0]
  }

  pub fn children(&self, id: NodeId) -> &[NodeId] {
    &self.get(id).children
  }

  /// Append `spec` and its subtree under `parent`.
  pub fn add(&mut self, parent: NodeId, spec: NodeSpec) -> NodeId {
    let NodeSpec { text, color, payload, expanded, children } = spec;
    let id = NodeId(self.nodes.len());
    let mut node = Node::new(text, color, payload, expanded);
    node.parent = Some(parent);
    self.nodes.push(node);
    self.nodes[parent.0].children.push(id);
    for child in children {
      self.add(id, child);
    }
    id
  }

  /// Mark an unexpanded node as loading. Returns `false` if the node is not eligible.
  pub fn begin_loading(&mut self, id: NodeId) -> bool {
    let node = self.get_mut(id);
    if node.state != NodeState::Unexpanded || !node.children.is_empty() || node.payload.is_none() {
      return false;
    }
    node.state = NodeState::Loading;
    true
  }

  /// Attach a complete batch of children, or flag the node when the batch is empty.
  pub fn attach_batch(&mut self, parent: NodeId, children: Vec<NodeSpec>) {
    if children.is_empty() {
      self.mark_no_content(parent);
      return;
    }
    for child in children {
      self.add(parent, child);
    }
    let node = self.get_mut(parent);
    node.state = NodeState::Populated;
    node.expanded = true;
  }

  pub fn mark_no_content(&mut self, id: NodeId) {
    let node = self.get_mut(id);
    if node.state == NodeState::NoContent {
      return;
    }
    node.state = NodeState::NoContent;
    node.text.push_str(NO_CONTENT_SUFFIX);
    node.color = NodeColor::NoContent;
    node.selectable = false;
  }

  pub fn toggle(&mut self, id: NodeId) {
    let node = self.get_mut(id);
    node.expanded = !node.expanded;
  }

  pub fn apply(&mut self, event: TreeEvent) {
    match event {
      TreeEvent::Attach { parent, children, payload } => {
        if let Some(payload) = payload {
          self.get_mut(parent).payload = Some(payload);
        }
        self.attach_batch(parent, children);
      }
      TreeEvent::Blink { node, on } => self.get_mut(node).busy = Some(on),
      TreeEvent::BusyDone { node } => self.get_mut(node).busy = None,
      TreeEvent::Dispatched { node } => self.get_mut(node).color = NodeColor::Dispatched,
    }
  }

  /// Depth-first listing of every node reachable through expanded ancestors, root included.
  pub fn visible_rows(&self) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut stack = vec![Row { id: self.root(), depth: 0 }];
    while let Some(row) = stack.pop() {
      rows.push(row);
      let node = self.get(row.id);
      if node.expanded {
        stack.extend(node.children.iter().rev().map(|&id| Row { id, depth: row.depth + 1 }));
      }
    }
    rows
  }
}
