//! Descriptions for the info pane.

use chrono::NaiveDate;

use crate::catalog::Catalog;
use crate::model::VodTypes;
use crate::resolver::{Resolver, driver_label};
use crate::tree::{ActionKind, Payload};

/// One labelled line of the info pane; multi-valued rows render one value per line.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoRow {
  pub label: String,
  pub values: Vec<String>,
}

impl InfoRow {
  fn new(label: &str, values: Vec<String>) -> Self {
    Self { label: label.to_string(), values }
  }

  fn single(label: &str, value: impl Into<String>) -> Self {
    Self::new(label, vec![value.into()])
  }
}

/// `2019-03-17` → `17 Mar 2019`. Unparseable dates are shown as-is.
pub fn format_date(raw: &str) -> String {
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .map(|d| d.format("%-d %b %Y").to_string())
    .unwrap_or_else(|_| raw.to_string())
}

fn date_range(start: &str, end: &str) -> String {
  match (start.is_empty(), end.is_empty()) {
    (true, true) => String::new(),
    (false, true) => format_date(start),
    (true, false) => format_date(end),
    (false, false) => format!("{} – {}", format_date(start), format_date(end)),
  }
}

/// Build the rows for `payload`, resolving cross-referenced names through the caches.
///
/// Rows whose values are all blank are dropped.
pub async fn describe<C: Catalog>(payload: &Payload, categories: &VodTypes, resolver: &Resolver<C>) -> Vec<InfoRow> {
  let rows = match payload {
    Payload::Category(index) => match categories.objects.get(*index) {
      Some(category) => vec![
        InfoRow::single("Category", category.name.clone()),
        InfoRow::single("Entries", category.content_urls.len().to_string()),
      ],
      None => Vec::new(),
    },
    Payload::AllSeasons(None) => vec![InfoRow::single("Seasons", "select to load")],
    Payload::AllSeasons(Some(seasons)) => {
      vec![InfoRow::new("Seasons", seasons.objects.iter().map(|s| s.name.clone()).collect())]
    }
    Payload::Season(season) => vec![
      InfoRow::single("Season", season.name.clone()),
      InfoRow::single("Year", season.year.to_string()),
      InfoRow::single("Events", season.eventoccurrence_urls.len().to_string()),
    ],
    Payload::Event(event) => vec![
      InfoRow::single("Event", event.name.clone()),
      InfoRow::single("Official name", event.official_name.clone()),
      InfoRow::single("Dates", date_range(&event.start_date, &event.end_date)),
      InfoRow::single("Sessions", event.sessionoccurrence_urls.len().to_string()),
    ],
    Payload::Session(streams) => {
      vec![InfoRow::new("Perspectives", streams.channels().iter().map(|c| c.name.clone()).collect())]
    }
    Payload::Channel(channel) => vec![
      InfoRow::single("Perspective", channel.name.clone()),
      InfoRow::new("Driver", channel.driver_urls.iter().map(driver_label).collect()),
    ],
    Payload::YearBucket(year) => vec![InfoRow::single("Year", year.clone())],
    Payload::Episode(episode) => {
      let (drivers, teams) =
        tokio::join!(resolver.resolve_names(&episode.driver_urls), resolver.resolve_names(&episode.team_urls));
      vec![
        InfoRow::single("Title", episode.title.clone()),
        InfoRow::single("Subtitle", episode.subtitle.clone()),
        InfoRow::single("Synopsis", episode.synopsis.clone()),
        InfoRow::new("Drivers", drivers.names),
        InfoRow::new("Teams", teams.names),
      ]
    }
    Payload::Command(ctx) => vec![
      InfoRow::single("Title", ctx.title.clone()),
      InfoRow::new("Commands", ctx.command.commands.iter().map(|argv| argv.join(" ")).collect()),
      InfoRow::single("Watch for", ctx.command.watch_target().map(|(_, phrase)| phrase).unwrap_or_default()),
    ],
    Payload::Action { kind, id, title } => vec![
      InfoRow::single("Title", title.clone()),
      InfoRow::single("Asset", id.clone()),
      InfoRow::single(
        "Action",
        match kind {
          ActionKind::Download => "save playlist",
          ActionKind::ShowUrl => "show stream URL",
        },
      ),
    ],
  };
  rows.into_iter().filter(|row| row.values.iter().any(|v| !v.trim().is_empty())).collect()
}
