//! Groups a category's episodes into year buckets.
//!
//! Episodes carry no clean date field, but the first four characters of their
//! `data_source_id` usually encode a two-digit year and a race number
//! (`"1905..."` → 2019, race 05). Episodes whose identifier does not start with
//! four digits end up in a residual list shown after all year buckets.

use crate::model::Episode;

/// Identifiers from these seasons start with the full year instead of `YYRR`.
const IRREGULAR_YEARS: [&str; 2] = ["2018", "2019"];
/// Race number assigned to identifiers in the irregular format.
pub const IRREGULAR_RACE: &str = "0";
/// Two-digit years at or above this map to the 1900s. Identifiers from 2030 on will be misplaced.
const CENTURY_PIVOT: u32 = 30;

/// Year and race number derived from a source identifier, compared as strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RaceCode {
  pub year: String,
  pub race: String,
}

pub fn parse_race_code(source_id: &str) -> Option<RaceCode> {
  let head = source_id.get(..4)?;
  if !head.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  if IRREGULAR_YEARS.contains(&head) {
    return Some(RaceCode { year: head.to_string(), race: IRREGULAR_RACE.to_string() });
  }
  let short_year = &head[..2];
  let century = if short_year.parse::<u32>().ok()? < CENTURY_PIVOT { "20" } else { "19" };
  Some(RaceCode { year: format!("{}{}", century, short_year), race: head[2..4].to_string() })
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearBucket {
  pub year: String,
  pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Organized {
  /// In first-encountered order of the sorted dated episodes.
  pub buckets: Vec<YearBucket>,
  /// Episodes without a race code, by title.
  pub residual: Vec<Episode>,
}

pub fn organize(episodes: Vec<Episode>) -> Organized {
  let mut dated = Vec::new();
  let mut residual = Vec::new();
  for episode in episodes {
    match parse_race_code(&episode.data_source_id) {
      Some(code) => dated.push((code, episode)),
      None => residual.push(episode),
    }
  }

  dated.sort_by(|(a, ea), (b, eb)| a.cmp(b).then_with(|| ea.title.cmp(&eb.title)));
  residual.sort_by(|a, b| a.title.cmp(&b.title));

  let mut buckets: Vec<YearBucket> = Vec::new();
  for (code, episode) in dated {
    match buckets.iter_mut().find(|b| b.year == code.year) {
      Some(bucket) => bucket.episodes.push(episode),
      None => buckets.push(YearBucket { year: code.year, episodes: vec![episode] }),
    }
  }

  Organized { buckets, residual }
}
