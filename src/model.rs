//! Catalog entities as returned by the remote API.
//!
//! Every field is defaulted so partial responses still decode, and an explicit
//! `null` decodes to the field's zero value. The tree only needs a handful of
//! fields per entity.

use serde::{Deserialize, Deserializer, Serialize};

/// Missing and `null` both become `T::default()`.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// List of VOD categories ("vod-type tags").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VodTypes {
  #[serde(deserialize_with = "null_default")]
  pub objects: Vec<VodType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VodType {
  #[serde(deserialize_with = "null_default")]
  pub name: String,
  #[serde(rename = "self", deserialize_with = "null_default")]
  pub id: String,
  #[serde(deserialize_with = "null_default")]
  pub content_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Episode {
  #[serde(rename = "self", deserialize_with = "null_default")]
  pub id: String,
  #[serde(deserialize_with = "null_default")]
  pub title: String,
  #[serde(deserialize_with = "null_default")]
  pub subtitle: String,
  #[serde(deserialize_with = "null_default")]
  pub synopsis: String,
  /// Encodes the race weekend, e.g. `"1905..."` for the fifth race of 2019.
  #[serde(deserialize_with = "null_default")]
  pub data_source_id: String,
  #[serde(deserialize_with = "null_default")]
  pub driver_urls: Vec<String>,
  #[serde(deserialize_with = "null_default")]
  pub team_urls: Vec<String>,
  /// Playable asset identifiers; the first one is used for playback.
  #[serde(deserialize_with = "null_default")]
  pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Driver {
  #[serde(rename = "self", deserialize_with = "null_default")]
  pub id: String,
  #[serde(deserialize_with = "null_default")]
  pub first_name: String,
  #[serde(deserialize_with = "null_default")]
  pub last_name: String,
  #[serde(deserialize_with = "null_default")]
  pub driver_racingnumber: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Team {
  #[serde(rename = "self", deserialize_with = "null_default")]
  pub id: String,
  #[serde(deserialize_with = "null_default")]
  pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seasons {
  #[serde(deserialize_with = "null_default")]
  pub objects: Vec<Season>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Season {
  #[serde(rename = "self", deserialize_with = "null_default")]
  pub id: String,
  #[serde(deserialize_with = "null_default")]
  pub name: String,
  #[serde(deserialize_with = "null_default")]
  pub year: i32,
  #[serde(deserialize_with = "null_default")]
  pub has_content: bool,
  #[serde(deserialize_with = "null_default")]
  pub eventoccurrence_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
  #[serde(rename = "self", deserialize_with = "null_default")]
  pub id: String,
  #[serde(deserialize_with = "null_default")]
  pub name: String,
  #[serde(deserialize_with = "null_default")]
  pub official_name: String,
  #[serde(deserialize_with = "null_default")]
  pub start_date: String,
  #[serde(deserialize_with = "null_default")]
  pub end_date: String,
  #[serde(deserialize_with = "null_default")]
  pub sessionoccurrence_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
  #[serde(rename = "self", deserialize_with = "null_default")]
  pub id: String,
  #[serde(deserialize_with = "null_default")]
  pub name: String,
  #[serde(deserialize_with = "null_default")]
  pub session_name: String,
  #[serde(deserialize_with = "null_default")]
  pub status: String,
  #[serde(deserialize_with = "null_default")]
  pub slug: String,
  pub start_time: Option<String>,
}

impl Session {
  pub fn is_upcoming(&self) -> bool {
    self.status == "upcoming"
  }

  pub fn is_live(&self) -> bool {
    self.status == "live"
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStreams {
  #[serde(deserialize_with = "null_default")]
  pub objects: Vec<SessionStreamSet>,
}

impl SessionStreams {
  /// Perspectives of the first stream set, or an empty slice if there is none.
  pub fn channels(&self) -> &[Channel] {
    self.objects.first().map(|o| o.channel_urls.as_slice()).unwrap_or_default()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStreamSet {
  #[serde(deserialize_with = "null_default")]
  pub channel_urls: Vec<Channel>,
}

/// One camera or data feed within a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
  #[serde(rename = "self", deserialize_with = "null_default")]
  pub id: String,
  #[serde(deserialize_with = "null_default")]
  pub name: String,
  #[serde(deserialize_with = "null_default")]
  pub driver_urls: Vec<Driver>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn episode_decodes_partial_payload() {
    let ep: Episode = serde_json::from_str(
      r#"{"self":"/api/episodes/ep_1/","title":"Race Highlights","data_source_id":"1905x","items":["/api/assets/a/"]}"#,
    )
    .unwrap();
    assert_eq!(ep.id, "/api/episodes/ep_1/");
    assert_eq!(ep.data_source_id, "1905x");
    assert!(ep.driver_urls.is_empty());
    assert_eq!(ep.items, ["/api/assets/a/"]);
  }

  #[test]
  fn episode_null_fields_decode_to_zero_values() {
    let ep: Episode = serde_json::from_str(
      r#"{"self":"/api/episodes/ep_2/","title":"Onboard","subtitle":null,"synopsis":null,
          "driver_urls":null,"items":["/a/"]}"#,
    )
    .unwrap();
    assert_eq!(ep.title, "Onboard");
    assert_eq!(ep.subtitle, "");
    assert_eq!(ep.synopsis, "");
    assert!(ep.driver_urls.is_empty());
    assert_eq!(ep.items, ["/a/"]);
  }

  #[test]
  fn driver_and_team_null_fields_decode() {
    let driver: Driver = serde_json::from_str(
      r#"{"self":"/api/driver/x/","first_name":"Nyck","last_name":null,"driver_racingnumber":null}"#,
    )
    .unwrap();
    assert_eq!(driver.first_name, "Nyck");
    assert_eq!(driver.last_name, "");
    assert_eq!(driver.driver_racingnumber, 0);

    let team: Team = serde_json::from_str(r#"{"self":null,"name":"Williams"}"#).unwrap();
    assert_eq!(team, Team { id: String::new(), name: "Williams".into() });
  }

  #[test]
  fn category_and_season_lists_tolerate_nulls() {
    let types: VodTypes =
      serde_json::from_str(r#"{"objects":[{"name":"Highlights","self":"/t/1/","content_urls":null}]}"#).unwrap();
    assert!(types.objects[0].content_urls.is_empty());
    let empty: VodTypes = serde_json::from_str(r#"{"objects":null}"#).unwrap();
    assert!(empty.objects.is_empty());

    let seasons: Seasons = serde_json::from_str(
      r#"{"objects":[{"self":"/s/2019/","name":"2019","year":2019,"has_content":null,"eventoccurrence_urls":null}]}"#,
    )
    .unwrap();
    assert_eq!(seasons.objects[0].year, 2019);
    assert!(!seasons.objects[0].has_content);
    assert!(seasons.objects[0].eventoccurrence_urls.is_empty());
  }

  #[test]
  fn event_and_session_null_fields_decode() {
    let event: Event = serde_json::from_str(
      r#"{"self":"/ev/1/","name":"Monaco","official_name":null,"start_date":"2019-05-23","end_date":null,
          "sessionoccurrence_urls":null}"#,
    )
    .unwrap();
    assert_eq!(event.name, "Monaco");
    assert_eq!(event.official_name, "");
    assert!(event.sessionoccurrence_urls.is_empty());

    let session: Session = serde_json::from_str(
      r#"{"self":"/s/1/","name":"Race","session_name":null,"status":"replay","slug":null,"start_time":null}"#,
    )
    .unwrap();
    assert_eq!(session.status, "replay");
    assert_eq!(session.slug, "");
    assert_eq!(session.start_time, None);
  }

  #[test]
  fn one_null_racing_number_keeps_every_perspective() {
    let streams: SessionStreams = serde_json::from_str(
      r#"{"objects":[{"channel_urls":[
        {"self":"/c/wif/","name":"WIF","driver_urls":[]},
        {"self":"/c/lat/","name":"LAT onboard","driver_urls":[
          {"self":"/d/lat/","first_name":"Nicholas","driver_racingnumber":null}
        ]},
        {"self":"/c/ham/","name":"HAM onboard","driver_urls":[{"self":"/d/ham/","driver_racingnumber":44}]}
      ]}]}"#,
    )
    .unwrap();
    let channels = streams.channels();
    assert_eq!(channels.len(), 3);
    assert_eq!(channels[1].driver_urls[0].driver_racingnumber, 0);
    assert_eq!(channels[2].driver_urls[0].driver_racingnumber, 44);

    let nulls: SessionStreams = serde_json::from_str(r#"{"objects":[{"channel_urls":null}]}"#).unwrap();
    assert!(nulls.channels().is_empty());
  }

  #[test]
  fn session_streams_without_objects_have_no_channels() {
    let streams = SessionStreams::default();
    assert!(streams.channels().is_empty());
  }

  #[test]
  fn session_status_helpers() {
    let s = Session { status: "live".into(), ..Default::default() };
    assert!(s.is_live());
    assert!(!s.is_upcoming());
  }
}
