//! Turns driver/team identifier lists into sorted display names.

use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, warn};

use crate::cache::Caches;
use crate::catalog::{Catalog, FetchError};
use crate::model::{Driver, Episode, Team};

pub const DRIVER_PREFIX: &str = "/api/driver/";
pub const TEAM_PREFIX: &str = "/api/team/";

/// Identifiers of this length or shorter are never classified, for either kind.
///
/// The driver prefix is exactly this long, the team prefix two characters shorter,
/// so a team identifier needs at least three characters after its prefix.
const MIN_CLASSIFIED_LEN: usize = DRIVER_PREFIX.len();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
  Driver,
  Team,
}

impl IdKind {
  pub fn of(id: &str) -> Option<Self> {
    if id.len() <= MIN_CLASSIFIED_LEN {
      return None;
    }
    if id.starts_with(DRIVER_PREFIX) {
      Some(IdKind::Driver)
    } else if id.starts_with(TEAM_PREFIX) {
      Some(IdKind::Team)
    } else {
      None
    }
  }

  /// Kind of a whole list, decided by its first element. Lists are assumed homogeneous.
  pub fn of_list(ids: &[String]) -> Option<Self> {
    ids.first().and_then(|id| Self::of(id))
  }
}

/// Prefix `name` with a racing number so one- and two-digit numbers line up.
pub fn numbered_name(number: u32, name: &str) -> String {
  if number >= 10 { format!("({}) {}", number, name) } else { format!(" ({}) {}", number, name) }
}

pub fn driver_label(driver: &Driver) -> String {
  numbered_name(driver.driver_racingnumber, &format!("{} {}", driver.first_name, driver.last_name))
}

/// Outcome of a batch resolution: sorted names plus the identifiers that failed.
///
/// Failed identifiers still contribute a (blank) name so the list length matches the input.
#[derive(Debug, Default)]
pub struct ResolvedNames {
  pub names: Vec<String>,
  pub failures: Vec<(String, FetchError)>,
}

/// Cache-backed lookups of cross-referenced entities.
pub struct Resolver<C> {
  catalog: Arc<C>,
  caches: Arc<Caches>,
}

impl<C> Clone for Resolver<C> {
  fn clone(&self) -> Self {
    Self { catalog: Arc::clone(&self.catalog), caches: Arc::clone(&self.caches) }
  }
}

impl<C: Catalog> Resolver<C> {
  pub fn new(catalog: Arc<C>, caches: Arc<Caches>) -> Self {
    Self { catalog, caches }
  }

  pub fn caches(&self) -> &Caches {
    &self.caches
  }

  pub async fn episode(&self, id: &str) -> Result<Episode, FetchError> {
    self.caches.episodes.get_or_fetch(id, || self.catalog.fetch_episode(id)).await
  }

  pub async fn driver(&self, id: &str) -> Result<Driver, FetchError> {
    self.caches.drivers.get_or_fetch(id, || self.catalog.fetch_driver(id)).await
  }

  pub async fn team(&self, id: &str) -> Result<Team, FetchError> {
    self.caches.teams.get_or_fetch(id, || self.catalog.fetch_team(id)).await
  }

  async fn name(&self, kind: IdKind, id: &str) -> Result<String, FetchError> {
    match kind {
      IdKind::Driver => self.driver(id).await.map(|d| driver_label(&d)),
      IdKind::Team => self.team(id).await.map(|t| t.name),
    }
  }

  /// Resolve every identifier concurrently and return the names sorted.
  ///
  /// Lists whose first identifier is neither a driver nor a team are returned unchanged.
  pub async fn resolve_names(&self, ids: &[String]) -> ResolvedNames {
    let Some(kind) = IdKind::of_list(ids) else {
      return ResolvedNames { names: ids.to_vec(), failures: Vec::new() };
    };

    let mut tasks = JoinSet::new();
    for id in ids {
      let this = self.clone();
      let id = id.clone();
      tasks.spawn(async move {
        let result = this.name(kind, &id).await;
        (id, result)
      });
    }

    let mut resolved = ResolvedNames::default();
    while let Some(joined) = tasks.join_next().await {
      match joined {
        Ok((_, Ok(name))) => resolved.names.push(name),
        Ok((id, Err(e))) => {
          warn!(id = %id, err = %e, "resolver: lookup failed, showing blank entry");
          resolved.names.push(match kind {
            IdKind::Driver => driver_label(&Driver::default()),
            IdKind::Team => Team::default().name,
          });
          resolved.failures.push((id, e));
        }
        Err(e) => error!(err = %e, "resolver: lookup task panicked"),
      }
    }
    resolved.names.sort();
    resolved
  }
}
