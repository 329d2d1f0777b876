use ratatui::{
  Frame,
  layout::{Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span, Text},
  widgets::{Block, BorderType, Cell, List, ListItem, Padding, Paragraph, Row, Table},
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::catalog::Catalog;
use crate::theme::Theme;
use crate::tree::Node;

// --- Helpers ---

/// Truncate a string to `max_width` display columns, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.width() <= max_width {
    return s.to_string();
  }
  let mut out = String::new();
  let mut used = 0;
  for c in s.chars() {
    let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
    if used + w + 1 > max_width {
      break;
    }
    used += w;
    out.push(c);
  }
  format!("{}…", out)
}

/// Expansion marker shown before a node's text.
fn marker(node: &Node) -> &'static str {
  match (node.children.is_empty(), node.expanded) {
    (true, _) => "  ",
    (false, true) => "▾ ",
    (false, false) => "▸ ",
  }
}

fn bordered<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
}

// --- UI Rendering ---

pub fn ui<C: Catalog>(frame: &mut Frame, app: &mut App<C>) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, footer_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
      .areas(frame.area());

  let [tree_area, side_area] =
    Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(main_area);

  render_header(frame, theme, header_area);
  render_tree(frame, app, tree_area);
  if app.debug {
    let [info_area, log_area] =
      Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(side_area);
    render_info(frame, app, info_area);
    render_log(frame, app, log_area);
  } else {
    render_info(frame, app, side_area);
  }
  render_status(frame, app, status_area);
  render_footer(frame, theme, footer_area);
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" ▶ f1view ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_tree<C: Catalog>(frame: &mut Frame, app: &mut App<C>, area: Rect) {
  let theme = app.theme();
  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;

  let items: Vec<ListItem> = app
    .rows
    .iter()
    .map(|row| {
      let node = app.tree.get(row.id);
      let color = match node.busy {
        Some(true) => theme.loading,
        _ => theme.node_color(node.color),
      };
      let indent = "  ".repeat(row.depth);
      let prefix = format!("{}{}", indent, marker(node));
      let text = truncate_str(node.display_text(), inner_w.saturating_sub(prefix.width()));
      let mut style = Style::default().fg(color);
      if row.depth <= 1 {
        style = style.add_modifier(Modifier::BOLD);
      }
      ListItem::new(Line::from(vec![Span::styled(prefix, Style::default().fg(theme.muted)), Span::styled(text, style)]))
    })
    .collect();

  let list = List::new(items)
    .block(bordered(" Catalog ", theme))
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_info<C: Catalog>(frame: &mut Frame, app: &App<C>, area: Rect) {
  let theme = app.theme();
  let block = bordered(" Info ", theme).padding(Padding::horizontal(1));

  let rows: Vec<Row> = app
    .info
    .iter()
    .map(|row| {
      let height = row.values.len().max(1) as u16;
      Row::new(vec![
        Cell::from(Span::styled(row.label.clone(), Style::default().fg(theme.muted))),
        Cell::from(Text::from(row.values.join("\n"))).fg(theme.fg),
      ])
      .height(height)
    })
    .collect();

  let table = Table::new(rows, [Constraint::Length(14), Constraint::Min(10)]).block(block).column_spacing(1);
  frame.render_widget(table, area);
}

fn render_log<C: Catalog>(frame: &mut Frame, app: &App<C>, area: Rect) {
  let theme = app.theme();
  let visible = area.height.saturating_sub(2) as usize;
  let inner_w = area.width.saturating_sub(2) as usize;
  let lines: Vec<Line> = app
    .log
    .iter()
    .skip(app.log.len().saturating_sub(visible))
    .map(|line| Line::from(Span::styled(truncate_str(line, inner_w), Style::default().fg(theme.fg))))
    .collect();
  frame.render_widget(Paragraph::new(lines).block(bordered(" Debug ", theme)), area);
}

fn render_status<C: Catalog>(frame: &mut Frame, app: &App<C>, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⚠  {}", msg), Style::default().fg(theme.error))
  } else if let Some(line) = app.log.back() {
    (format!(" {}", line), Style::default().fg(theme.status))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  let text = truncate_str(&text, area.width as usize);
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer(frame: &mut Frame, theme: &Theme, area: Rect) {
  let keys = [("Enter", "Open"), ("j/k", "Navigate"), ("←/→", "Collapse/Expand"), ("g/G", "Top/Bottom"), ("q", "Quit")];

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}
