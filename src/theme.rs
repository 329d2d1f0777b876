use ratatui::style::Color;

use crate::tree::NodeColor;

/// Terminal palette. Tree nodes carry a semantic `NodeColor`; this maps it to a real color.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,

  pub root: Color,
  pub category: Color,
  pub folder: Color,
  pub item: Color,
  pub action: Color,
  pub live: Color,
  pub no_content: Color,
  pub dispatched: Color,
  /// Alternate phase of a blinking node.
  pub loading: Color,
}

impl Theme {
  pub const DEFAULT: Theme = Theme {
    name: "paddock",
    bg: Color::Rgb(21, 21, 30),
    fg: Color::Rgb(224, 224, 232),
    accent: Color::Rgb(225, 6, 0),
    muted: Color::Rgb(120, 120, 140),
    border: Color::Rgb(60, 60, 80),
    highlight_bg: Color::Rgb(70, 30, 40),
    status: Color::Rgb(250, 200, 80),
    error: Color::Rgb(255, 90, 90),
    key_fg: Color::Rgb(21, 21, 30),
    key_bg: Color::Rgb(160, 160, 180),

    root: Color::Rgb(225, 6, 0),
    category: Color::Rgb(130, 170, 255),
    folder: Color::Rgb(224, 224, 232),
    item: Color::Rgb(190, 190, 205),
    action: Color::Rgb(120, 210, 160),
    live: Color::Rgb(255, 70, 70),
    no_content: Color::Rgb(100, 100, 115),
    dispatched: Color::Rgb(200, 140, 255),
    loading: Color::Rgb(250, 200, 80),
  };

  pub fn node_color(&self, color: NodeColor) -> Color {
    match color {
      NodeColor::Root => self.root,
      NodeColor::Category => self.category,
      NodeColor::Folder => self.folder,
      NodeColor::Item => self.item,
      NodeColor::Action => self.action,
      NodeColor::Live => self.live,
      NodeColor::NoContent => self.no_content,
      NodeColor::Dispatched => self.dispatched,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn node_colors_are_distinct_from_loading() {
    let theme = Theme::DEFAULT;
    assert_eq!(theme.node_color(NodeColor::Live), theme.live);
    for color in [NodeColor::Category, NodeColor::Folder, NodeColor::Item, NodeColor::Action] {
      assert_ne!(theme.node_color(color), theme.loading);
    }
  }
}
