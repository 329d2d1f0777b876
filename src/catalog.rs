use reqwest::Client;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::constants::constants;
use crate::model::{Driver, Episode, Event, Season, Seasons, Session, SessionStreams, Team, VodTypes};

/// Why a single catalog entity could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("{url} returned HTTP {status}")]
  Status { url: String, status: u16 },
  #[error("could not decode response: {0}")]
  Decode(#[from] serde_json::Error),
  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),
  #[error("missing data: {0}")]
  Missing(String),
}

/// The remote VOD catalog.
///
/// Implementations must be cheap to share across worker tasks; every call may fail
/// and callers treat a failure as "no data" for that one entity.
pub trait Catalog: Send + Sync + 'static {
  fn fetch_vod_categories(&self) -> impl Future<Output = Result<VodTypes, FetchError>> + Send;
  fn fetch_episode(&self, id: &str) -> impl Future<Output = Result<Episode, FetchError>> + Send;
  fn fetch_driver(&self, id: &str) -> impl Future<Output = Result<Driver, FetchError>> + Send;
  fn fetch_team(&self, id: &str) -> impl Future<Output = Result<Team, FetchError>> + Send;
  fn fetch_seasons(&self) -> impl Future<Output = Result<Seasons, FetchError>> + Send;
  fn fetch_event(&self, id: &str) -> impl Future<Output = Result<Event, FetchError>> + Send;
  fn fetch_session(&self, id: &str) -> impl Future<Output = Result<Session, FetchError>> + Send;
  fn fetch_session_streams(&self, slug: &str) -> impl Future<Output = Result<SessionStreams, FetchError>> + Send;
  /// Exchange an asset or channel identifier for a tokenised stream URL.
  fn resolve_playable_url(&self, id: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
  /// Save the playlist behind `url` to a local file and return its path.
  fn download_asset(&self, url: &str, suggested_name: &str)
  -> impl Future<Output = Result<PathBuf, FetchError>> + Send;
}

const EPISODE_FIELDS: &str = "self,title,subtitle,synopsis,data_source_id,driver_urls,team_urls,items";
const DRIVER_FIELDS: &str = "self,first_name,last_name,driver_racingnumber";
const EVENT_FIELDS: &str = "self,name,official_name,start_date,end_date,sessionoccurrence_urls";
const SESSION_FIELDS: &str = "self,name,session_name,status,slug,start_time";
const STREAM_FIELDS: &str = "channel_urls,channel_urls__name,channel_urls__self,channel_urls__driver_urls,\
channel_urls__driver_urls__self,channel_urls__driver_urls__first_name,channel_urls__driver_urls__last_name,\
channel_urls__driver_urls__driver_racingnumber";

/// `Catalog` backed by the F1TV HTTP API.
#[derive(Clone)]
pub struct HttpCatalog {
  client: Client,
  base: String,
}

impl HttpCatalog {
  pub fn new() -> Result<Self, FetchError> {
    let client = Client::builder().timeout(constants().http_timeout()).build()?;
    Ok(Self { client, base: constants().api_base.trim_end_matches('/').to_string() })
  }

  fn entity_url(&self, id: &str, fields: &str) -> String {
    format!("{}{}?fields={}", self.base, id, fields)
  }

  async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
    debug!(url = %url, "catalog: GET");
    let response = self.client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
  }
}

impl Catalog for HttpCatalog {
  async fn fetch_vod_categories(&self) -> Result<VodTypes, FetchError> {
    let url = format!("{}/api/vod-type-tag/?fields=id,name,self,content_urls&order=id", self.base);
    self.get_json(&url).await
  }

  async fn fetch_episode(&self, id: &str) -> Result<Episode, FetchError> {
    self.get_json(&self.entity_url(id, EPISODE_FIELDS)).await
  }

  async fn fetch_driver(&self, id: &str) -> Result<Driver, FetchError> {
    self.get_json(&self.entity_url(id, DRIVER_FIELDS)).await
  }

  async fn fetch_team(&self, id: &str) -> Result<Team, FetchError> {
    self.get_json(&self.entity_url(id, "self,name")).await
  }

  async fn fetch_seasons(&self) -> Result<Seasons, FetchError> {
    let url = format!(
      "{}/api/race-season/?fields=year,name,self,has_content,eventoccurrence_urls&year__gt=2017&order=year",
      self.base
    );
    let mut seasons: Seasons = self.get_json(&url).await?;
    seasons.objects.retain(|s: &Season| s.has_content || !s.eventoccurrence_urls.is_empty());
    Ok(seasons)
  }

  async fn fetch_event(&self, id: &str) -> Result<Event, FetchError> {
    self.get_json(&self.entity_url(id, EVENT_FIELDS)).await
  }

  async fn fetch_session(&self, id: &str) -> Result<Session, FetchError> {
    self.get_json(&self.entity_url(id, SESSION_FIELDS)).await
  }

  async fn fetch_session_streams(&self, slug: &str) -> Result<SessionStreams, FetchError> {
    let url = format!(
      "{}/api/session-occurrence/?fields={}&fields_to_expand=channel_urls,channel_urls__driver_urls&slug={}",
      self.base, STREAM_FIELDS, slug
    );
    self.get_json(&url).await
  }

  async fn resolve_playable_url(&self, id: &str) -> Result<String, FetchError> {
    let url = format!("{}/api/viewings/", self.base);
    let body = if is_channel_id(id) {
      serde_json::json!({ "channel_url": id })
    } else {
      serde_json::json!({ "asset_url": id })
    };
    debug!(id = %id, "catalog: resolving playable URL");
    let response = self.client.post(&url).json(&body).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status { url, status: status.as_u16() });
    }
    let value: serde_json::Value = serde_json::from_slice(&response.bytes().await?)?;
    tokenised_url(&value).ok_or_else(|| FetchError::Missing(format!("no tokenised_url for {}", id)))
  }

  async fn download_asset(&self, url: &str, suggested_name: &str) -> Result<PathBuf, FetchError> {
    let response = self.client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
    }
    let body = response.text().await?;
    let playlist = absolutize_playlist(&body, playlist_base(url));
    let path = PathBuf::from(format!("{}.m3u8", sanitize_file_name(suggested_name)));
    tokio::fs::write(&path, playlist).await?;
    info!(path = %path.display(), "catalog: saved playlist");
    Ok(path)
  }
}

fn is_channel_id(id: &str) -> bool {
  id.starts_with("/api/channels/")
}

/// Channel viewings answer with a top-level `tokenised_url`, asset viewings nest it.
fn tokenised_url(value: &serde_json::Value) -> Option<String> {
  value
    .get("tokenised_url")
    .or_else(|| value.pointer("/objects/0/tata/tokenised_url"))
    .and_then(|v| v.as_str())
    .map(str::to_string)
}

/// Everything up to and including the last `/` before any query string.
fn playlist_base(url: &str) -> &str {
  let path_end = url.find('?').unwrap_or(url.len());
  match url[..path_end].rfind('/') {
    Some(i) => &url[..=i],
    None => url,
  }
}

/// Rewrite relative segment and `URI="..."` references so a saved playlist plays offline.
fn absolutize_playlist(body: &str, base: &str) -> String {
  let absolute = |reference: &str| -> String {
    if reference.contains("://") { reference.to_string() } else { format!("{}{}", base, reference) }
  };
  let mut out = String::with_capacity(body.len());
  for line in body.lines() {
    let trimmed = line.trim();
    if trimmed.is_empty() {
      out.push_str(line);
    } else if trimmed.starts_with('#') {
      match trimmed.split_once("URI=\"") {
        Some((head, rest)) => match rest.split_once('"') {
          Some((uri, tail)) => {
            out.push_str(head);
            out.push_str("URI=\"");
            out.push_str(&absolute(uri));
            out.push('"');
            out.push_str(tail);
          }
          None => out.push_str(line),
        },
        None => out.push_str(line),
      }
    } else {
      out.push_str(&absolute(trimmed));
    }
    out.push('\n');
  }
  out
}

/// Make a title safe to use as a file name on the current platform.
pub fn sanitize_file_name(name: &str) -> String {
  let illegal: &[char] = if cfg!(windows) { &['<', '>', ':', '"', '/', '\\', '|', '?', '*'] } else { &['/'] };
  let replaced: String = name.chars().map(|c| if illegal.contains(&c) { ' ' } else { c }).collect();
  replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
