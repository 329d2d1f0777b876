//! Tree population engine.
//!
//! `Engine::select` inspects the payload of the chosen node and either toggles it,
//! dispatches a playback action, or starts an expansion. Expansions run the matching
//! loader in a worker task that fetches every child, waits for all of them, and hands
//! the finished batch back to the UI loop as a single `TreeEvent::Attach`.

use futures::{StreamExt, stream};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::busy::BusyIndicator;
use crate::catalog::{Catalog, FetchError};
use crate::config::{Config, CustomCommand};
use crate::constants::constants;
use crate::dispatch::{Dispatcher, Launcher};
use crate::info::{self, InfoRow};
use crate::model::{Channel, Episode, Season, SessionStreams, VodTypes};
use crate::organizer::organize;
use crate::resolver::{Resolver, numbered_name};
use crate::tree::{ActionKind, CommandContext, NodeColor, NodeId, NodeSpec, NodeState, Payload, Tree, TreeEvent};

pub const ALL_SEASONS_TITLE: &str = "Full Race Weekends";
pub const LIVE_SUFFIX: &str = " - LIVE";

/// Messages from worker tasks to the UI loop. Receiving one is a redraw request.
#[derive(Debug)]
pub enum AppEvent {
  Tree(TreeEvent),
  /// Description of the node under the cursor; stale generations are dropped.
  Info { generation: u64, rows: Vec<InfoRow> },
  Log(String),
}

/// Children produced by one loader run, plus how many child fetches failed.
#[derive(Debug, Default)]
pub struct Loaded {
  pub children: Vec<NodeSpec>,
  pub failures: usize,
}

impl Loaded {
  fn new(children: Vec<NodeSpec>, failures: usize) -> Self {
    Self { children, failures }
  }
}

/// Display name for a perspective. Driver onboards prefix the channel name with the aligned racing number.
pub fn perspective_name(channel: &Channel) -> String {
  if let Some(driver) = channel.driver_urls.first() {
    return numbered_name(driver.driver_racingnumber, &channel.name);
  }
  match channel.name.as_str() {
    "WIF" => "Main Feed".to_string(),
    "pit lane" => "Pit Lane".to_string(),
    "driver" => "Driver Tracker".to_string(),
    "data" => "Data Channel".to_string(),
    other => other.to_string(),
  }
}

/// One node per perspective: shared feeds first, then driver onboards by label.
pub fn perspective_nodes(streams: &SessionStreams) -> Vec<NodeSpec> {
  let (mut onboards, feeds): (Vec<&Channel>, Vec<&Channel>) =
    streams.channels().iter().partition(|c| !c.driver_urls.is_empty());
  onboards.sort_by_cached_key(|c| perspective_name(c));
  feeds
    .into_iter()
    .chain(onboards)
    .map(|c| NodeSpec::new(perspective_name(c), NodeColor::Item).with_payload(Payload::Channel(c.clone())).collapsed())
    .collect()
}

fn episode_node(episode: Episode) -> NodeSpec {
  NodeSpec::new(episode.title.clone(), NodeColor::Item).with_payload(Payload::Episode(episode)).collapsed()
}

fn season_node(season: &Season) -> NodeSpec {
  NodeSpec::new(season.name.clone(), NodeColor::Folder).with_payload(Payload::Season(season.clone())).collapsed()
}

/// Built-in player option: mpv with the preferred audio language, watched until video starts.
pub fn mpv_command(language: &str) -> CustomCommand {
  CustomCommand {
    title: "Play with MPV".to_string(),
    commands: vec![vec!["mpv".into(), "$url".into(), format!("--alang={}", language), "--start=0".into()]],
    watchphrase: Some("Video".to_string()),
    command_to_watch: Some(0),
  }
}

/// Spawn one task per identifier and collect the successful, non-empty results in input order.
async fn fan_out<T, F, Fut>(ids: &[String], fetch: F) -> (Vec<T>, usize)
where
  T: Send + 'static,
  F: Fn(String) -> Fut,
  Fut: Future<Output = Result<Option<T>, FetchError>> + Send + 'static,
{
  let mut tasks = JoinSet::new();
  for (index, id) in ids.iter().enumerate() {
    let fut = fetch(id.clone());
    tasks.spawn(async move { (index, fut.await) });
  }

  let mut slots = Vec::with_capacity(ids.len());
  let mut failures = 0;
  while let Some(joined) = tasks.join_next().await {
    match joined {
      Ok((index, Ok(Some(value)))) => slots.push((index, value)),
      Ok((_, Ok(None))) => {}
      Ok((index, Err(e))) => {
        warn!(id = %ids[index], err = %e, "engine: child fetch failed, omitting");
        failures += 1;
      }
      Err(e) => {
        error!(err = %e, "engine: child task panicked");
        failures += 1;
      }
    }
  }
  slots.sort_by_key(|(index, _)| *index);
  (slots.into_iter().map(|(_, value)| value).collect(), failures)
}

/// The fetch-and-build half of an expansion. Runs off the UI loop.
pub struct Loader<C> {
  catalog: Arc<C>,
  resolver: Resolver<C>,
  concurrency: usize,
}

impl<C> Clone for Loader<C> {
  fn clone(&self) -> Self {
    Self { catalog: Arc::clone(&self.catalog), resolver: self.resolver.clone(), concurrency: self.concurrency }
  }
}

impl<C: Catalog> Loader<C> {
  pub fn new(catalog: Arc<C>, resolver: Resolver<C>, concurrency: usize) -> Self {
    Self { catalog, resolver, concurrency: concurrency.max(1) }
  }

  /// Episodes of a category, at most `concurrency` fetches in flight, grouped by year.
  pub async fn episodes(&self, ids: Vec<String>) -> Loaded {
    let results: Vec<(String, Result<Episode, FetchError>)> = stream::iter(ids)
      .map(|id| async move {
        let result = self.resolver.episode(&id).await;
        (id, result)
      })
      .buffered(self.concurrency)
      .collect()
      .await;

    let mut episodes = Vec::with_capacity(results.len());
    let mut failures = 0;
    for (id, result) in results {
      match result {
        Ok(episode) => episodes.push(episode),
        Err(e) => {
          warn!(id = %id, err = %e, "engine: episode fetch failed, omitting");
          failures += 1;
        }
      }
    }

    let organized = organize(episodes);
    let mut children: Vec<NodeSpec> = organized
      .buckets
      .into_iter()
      .map(|bucket| {
        NodeSpec::new(bucket.year.clone(), NodeColor::Folder)
          .with_payload(Payload::YearBucket(bucket.year))
          .collapsed()
          .with_children(bucket.episodes.into_iter().map(episode_node).collect())
      })
      .collect();
    children.extend(organized.residual.into_iter().map(episode_node));
    debug!(cached = self.resolver.caches().episodes.len(), "engine: episode cache size");
    Loaded::new(children, failures)
  }

  pub async fn seasons(&self) -> (Loaded, Option<Payload>) {
    match self.catalog.fetch_seasons().await {
      Ok(seasons) => {
        let children = seasons.objects.iter().map(season_node).collect();
        (Loaded::new(children, 0), Some(Payload::AllSeasons(Some(seasons))))
      }
      Err(e) => {
        warn!(err = %e, "engine: season list fetch failed");
        (Loaded::new(Vec::new(), 1), None)
      }
    }
  }

  /// Events of a season. Events without sessions are omitted.
  pub async fn events(&self, season: &Season) -> Loaded {
    let catalog = &self.catalog;
    let (children, failures) =
      fan_out(&season.eventoccurrence_urls, |id| Self::event_node(Arc::clone(catalog), id)).await;
    Loaded::new(children, failures)
  }

  /// Sessions of an event. Upcoming sessions and sessions without perspectives are omitted.
  pub async fn sessions(&self, session_ids: &[String]) -> Loaded {
    let catalog = &self.catalog;
    let (children, failures) = fan_out(session_ids, |id| Self::session_node(Arc::clone(catalog), id)).await;
    Loaded::new(children, failures)
  }

  async fn event_node(catalog: Arc<C>, id: String) -> Result<Option<NodeSpec>, FetchError> {
    let event = catalog.fetch_event(&id).await?;
    if event.sessionoccurrence_urls.is_empty() {
      return Ok(None);
    }
    let text = if event.official_name.is_empty() { event.name.clone() } else { event.official_name.clone() };
    Ok(Some(NodeSpec::new(text, NodeColor::Folder).with_payload(Payload::Event(event)).collapsed()))
  }

  async fn session_node(catalog: Arc<C>, id: String) -> Result<Option<NodeSpec>, FetchError> {
    let session = catalog.fetch_session(&id).await?;
    if session.is_upcoming() {
      return Ok(None);
    }
    let streams = catalog.fetch_session_streams(&session.slug).await?;
    if streams.channels().is_empty() {
      return Ok(None);
    }
    let mut text = if session.session_name.is_empty() { session.name.clone() } else { session.session_name.clone() };
    let color = if session.is_live() {
      text.push_str(LIVE_SUFFIX);
      NodeColor::Live
    } else {
      NodeColor::Folder
    };
    Ok(Some(NodeSpec::new(text, color).with_payload(Payload::Session(streams)).collapsed()))
  }
}

pub struct Engine<C> {
  loader: Loader<C>,
  resolver: Resolver<C>,
  dispatcher: Dispatcher<C>,
  config: Arc<Config>,
  categories: Arc<VodTypes>,
  events: mpsc::UnboundedSender<AppEvent>,
  debug: bool,
}

impl<C: Catalog> Engine<C> {
  pub fn new(
    catalog: Arc<C>,
    resolver: Resolver<C>,
    launcher: Arc<dyn Launcher>,
    config: Arc<Config>,
    categories: VodTypes,
    events: mpsc::UnboundedSender<AppEvent>,
    debug: bool,
  ) -> Self {
    let loader = Loader::new(Arc::clone(&catalog), resolver.clone(), constants().fetch_concurrency);
    let dispatcher = Dispatcher::new(catalog, launcher, events.clone());
    Self { loader, resolver, dispatcher, config, categories: Arc::new(categories), events, debug }
  }

  /// Top level: every category with content, then the season browser.
  pub fn populate_root(&self, tree: &mut Tree) {
    let root = tree.root();
    for (index, category) in self.categories.objects.iter().enumerate() {
      if category.content_urls.is_empty() {
        continue;
      }
      tree.add(root, NodeSpec::new(category.name.clone(), NodeColor::Category).with_payload(Payload::Category(index)));
    }
    tree.add(root, NodeSpec::new(ALL_SEASONS_TITLE, NodeColor::Category).with_payload(Payload::AllSeasons(None)));
  }

  /// Handle the user choosing `id`.
  pub fn select(&self, tree: &mut Tree, id: NodeId) {
    let node = tree.get(id);
    if !node.selectable || node.state == NodeState::Loading || node.busy.is_some() {
      return;
    }
    if !node.children.is_empty() {
      tree.toggle(id);
      return;
    }
    let Some(payload) = node.payload.clone() else {
      return;
    };
    let title = node.text.clone();

    match payload {
      Payload::Category(index) => {
        let ids = self.categories.objects.get(index).map(|c| c.content_urls.clone()).unwrap_or_default();
        let loader = self.loader.clone();
        self.expand(tree, id, async move { (loader.episodes(ids).await, None) });
      }
      Payload::AllSeasons(None) => {
        let loader = self.loader.clone();
        self.expand(tree, id, async move { loader.seasons().await });
      }
      Payload::Season(season) => {
        let loader = self.loader.clone();
        self.expand(tree, id, async move { (loader.events(&season).await, None) });
      }
      Payload::Event(event) => {
        let loader = self.loader.clone();
        self.expand(tree, id, async move { (loader.sessions(&event.sessionoccurrence_urls).await, None) });
      }
      Payload::Session(streams) => attach_now(tree, id, perspective_nodes(&streams)),
      Payload::Channel(channel) => attach_now(tree, id, self.playback_nodes(&title, &channel.id)),
      Payload::Episode(episode) => {
        let nodes = match episode.items.first() {
          Some(asset) => self.playback_nodes(&episode.title, asset),
          None => Vec::new(),
        };
        attach_now(tree, id, nodes);
      }
      Payload::Command(ctx) => self.dispatcher.dispatch(id, ctx),
      Payload::Action { kind: ActionKind::Download, id: asset, title } => {
        self.dispatcher.save_playlist(id, asset, title)
      }
      Payload::Action { kind: ActionKind::ShowUrl, id: asset, .. } => self.dispatcher.show_url(asset),
      // Populated on creation or by an earlier expansion.
      Payload::AllSeasons(Some(_)) | Payload::YearBucket(_) => {}
    }
  }

  /// Flag `id` as loading, blink it, and attach whatever `work` produces as one batch.
  fn expand<F>(&self, tree: &mut Tree, id: NodeId, work: F)
  where
    F: Future<Output = (Loaded, Option<Payload>)> + Send + 'static,
  {
    if !tree.begin_loading(id) {
      return;
    }
    let events = self.events.clone();
    let busy = BusyIndicator::start(id, events.clone(), constants().blink_interval());
    tokio::spawn(async move {
      let (loaded, payload) = work.await;
      if loaded.failures > 0 {
        warn!(failures = loaded.failures, "engine: expansion finished with omitted children");
      }
      info!(children = loaded.children.len(), "engine: expansion finished");
      let _ = events.send(AppEvent::Tree(TreeEvent::Attach { parent: id, children: loaded.children, payload }));
      busy.finish();
    });
  }

  /// Leaf actions for one playable asset.
  pub fn playback_nodes(&self, title: &str, id: &str) -> Vec<NodeSpec> {
    let command = |command: CustomCommand| {
      let ctx = CommandContext { id: id.to_string(), title: title.to_string(), command };
      NodeSpec::new(ctx.command.title.clone(), NodeColor::Action).with_payload(Payload::Command(ctx))
    };
    let action = |text: &str, kind: ActionKind| {
      NodeSpec::new(text, NodeColor::Action).with_payload(Payload::Action {
        kind,
        id: id.to_string(),
        title: title.to_string(),
      })
    };

    let mut nodes: Vec<NodeSpec> = self.config.playable_options().cloned().map(command).collect();
    nodes.push(command(mpv_command(&self.config.preferred_language)));
    nodes.push(action("Download .m3u8", ActionKind::Download));
    if self.debug {
      nodes.push(action("GET URL", ActionKind::ShowUrl));
    }
    nodes
  }

  /// Describe `payload` in the background and report it tagged with `generation`.
  pub fn request_info(&self, generation: u64, payload: Payload) {
    let resolver = self.resolver.clone();
    let categories = Arc::clone(&self.categories);
    let events = self.events.clone();
    tokio::spawn(async move {
      let rows = info::describe(&payload, &categories, &resolver).await;
      let _ = events.send(AppEvent::Info { generation, rows });
    });
  }
}

/// Attach children that need no fetch.
fn attach_now(tree: &mut Tree, id: NodeId, children: Vec<NodeSpec>) {
  if tree.begin_loading(id) {
    tree.attach_batch(id, children);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::Caches;
  use crate::catalog::testing::{Calls, MockCatalog};
  use crate::dispatch::testing::RecordingLauncher;
  use crate::model::{Driver, Event, Session, SessionStreamSet, VodType};
  use std::time::Duration;

  struct Harness {
    engine: Engine<MockCatalog>,
    catalog: Arc<MockCatalog>,
    launcher: Arc<RecordingLauncher>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tree: Tree,
  }

  impl Harness {
    fn new(catalog: MockCatalog, config: Config, debug: bool) -> Self {
      let catalog = Arc::new(catalog);
      let resolver = Resolver::new(Arc::clone(&catalog), Arc::new(Caches::new()));
      let launcher = Arc::new(RecordingLauncher::default());
      let (tx, rx) = mpsc::unbounded_channel();
      let categories = catalog.categories.clone();
      let engine =
        Engine::new(Arc::clone(&catalog), resolver, launcher.clone(), Arc::new(config), categories, tx, debug);
      let mut tree = Tree::new("F1TV");
      engine.populate_root(&mut tree);
      Self { engine, catalog, launcher, rx, tree }
    }

    fn child(&self, parent: NodeId, text: &str) -> NodeId {
      *self.tree.children(parent).iter().find(|&&c| self.tree.get(c).text == text).unwrap()
    }

    fn texts(&self, parent: NodeId) -> Vec<String> {
      self.tree.children(parent).iter().map(|&c| self.tree.get(c).text.clone()).collect()
    }

    /// Apply events until `node` has finished expanding and its blink has stopped.
    async fn settle(&mut self, node: NodeId) {
      loop {
        let event = tokio::time::timeout(Duration::from_secs(5), self.rx.recv()).await.unwrap().unwrap();
        let done = matches!(&event, AppEvent::Tree(TreeEvent::BusyDone { node: n }) if *n == node);
        if let AppEvent::Tree(event) = event {
          self.tree.apply(event);
        }
        if done {
          return;
        }
      }
    }

    async fn select_and_settle(&mut self, node: NodeId) {
      self.engine.select(&mut self.tree, node);
      self.settle(node).await;
    }
  }

  fn episode(id: &str, title: &str, source: &str) -> Episode {
    Episode {
      id: id.into(),
      title: title.into(),
      data_source_id: source.into(),
      items: vec![format!("/api/assets/{}/", title)],
      ..Default::default()
    }
  }

  fn category(name: &str, content: &[&str]) -> VodType {
    VodType {
      name: name.into(),
      id: format!("/api/vod-type-tag/{}/", name),
      content_urls: content.iter().map(|s| s.to_string()).collect(),
    }
  }

  fn session(id: &str, name: &str, status: &str) -> Session {
    Session {
      id: id.into(),
      session_name: name.into(),
      status: status.into(),
      slug: format!("slug-{}", id),
      ..Default::default()
    }
  }

  fn channel(name: &str, driver: Option<(&str, &str, u32)>) -> Channel {
    Channel {
      id: format!("/api/channels/{}/", name),
      name: name.into(),
      driver_urls: driver
        .map(|(first, last, number)| {
          let driver = Driver { first_name: first.into(), last_name: last.into(), ..Default::default() };
          vec![Driver { driver_racingnumber: number, ..driver }]
        })
        .unwrap_or_default(),
    }
  }

  fn streams(channels: Vec<Channel>) -> SessionStreams {
    SessionStreams { objects: vec![SessionStreamSet { channel_urls: channels }] }
  }

  #[tokio::test]
  async fn root_lists_categories_with_content_then_seasons() {
    let mut catalog = MockCatalog::default();
    catalog.categories.objects =
      vec![category("Highlights", &["/e1/"]), category("Empty", &[]), category("Docs", &["/e2/"])];
    let h = Harness::new(catalog, Config::default(), false);
    assert_eq!(h.texts(h.tree.root()), ["Highlights", "Docs", ALL_SEASONS_TITLE]);
    assert_eq!(h.tree.get(h.child(h.tree.root(), "Docs")).payload, Some(Payload::Category(2)));
  }

  #[tokio::test]
  async fn category_expansion_groups_episodes_by_year() {
    let mut catalog = MockCatalog::default()
      .with_episode(episode("/e/monaco/", "Monaco", "0506aaaa"))
      .with_episode(episode("/e/melbourne/", "Melbourne", "0501aaaa"))
      .with_episode(episode("/e/doc/", "Doc", "doc"))
      .with_episode(episode("/e/classic/", "Classic", "99040000"))
      .failing("/e/broken/");
    catalog.categories.objects =
      vec![category("Highlights", &["/e/monaco/", "/e/doc/", "/e/broken/", "/e/melbourne/", "/e/classic/"])];
    let mut h = Harness::new(catalog, Config::default(), false);
    let cat = h.child(h.tree.root(), "Highlights");

    h.select_and_settle(cat).await;

    assert_eq!(h.tree.get(cat).state, NodeState::Populated);
    assert_eq!(h.texts(cat), ["1999", "2005", "Doc"]);
    let y2005 = h.child(cat, "2005");
    assert_eq!(h.texts(y2005), ["Melbourne", "Monaco"]);
    assert!(!h.tree.get(y2005).expanded);
    assert_eq!(Calls::get(&h.catalog.calls.episodes), 5);
  }

  #[tokio::test]
  async fn children_are_attached_in_one_batch() {
    let mut catalog = MockCatalog::default()
      .with_episode(episode("/e/a/", "A", "0501"))
      .with_episode(episode("/e/b/", "B", "0502"))
      .with_episode(episode("/e/c/", "C", "0503"));
    catalog.delay = Some(Duration::from_millis(5));
    catalog.categories.objects = vec![category("Highlights", &["/e/a/", "/e/b/", "/e/c/"])];
    let mut h = Harness::new(catalog, Config::default(), false);
    let cat = h.child(h.tree.root(), "Highlights");
    h.engine.select(&mut h.tree, cat);
    assert_eq!(h.tree.get(cat).state, NodeState::Loading);

    loop {
      let Some(AppEvent::Tree(event)) = h.rx.recv().await else { continue };
      let done = matches!(event, TreeEvent::BusyDone { .. });
      h.tree.apply(event);
      // Either nothing is attached yet or the whole batch is.
      let year_count = h.tree.children(cat).len();
      let episode_count: usize = h.tree.children(cat).iter().map(|&y| h.tree.children(y).len()).sum();
      assert!(year_count == 0 || episode_count == 3);
      if done {
        break;
      }
    }
    assert_eq!(h.texts(h.child(cat, "2005")), ["A", "B", "C"]);
  }

  #[tokio::test]
  async fn episode_fetches_are_bounded() {
    let ids: Vec<String> = (0..12).map(|i| format!("/e/{}/", i)).collect();
    let mut catalog = MockCatalog::default();
    for id in &ids {
      catalog = catalog.with_episode(episode(id, id, "0501"));
    }
    catalog.delay = Some(Duration::from_millis(5));
    let catalog = Arc::new(catalog);
    let resolver = Resolver::new(Arc::clone(&catalog), Arc::new(Caches::new()));
    let loader = Loader::new(Arc::clone(&catalog), resolver, 3);

    let loaded = loader.episodes(ids).await;

    assert_eq!(loaded.failures, 0);
    assert_eq!(loaded.children[0].children.len(), 12);
    let peak = Calls::get(&catalog.calls.max_in_flight);
    assert!(peak > 1 && peak <= 3, "peak in-flight fetches was {}", peak);
  }

  #[tokio::test]
  async fn seasons_replace_marker_and_list_events() {
    let mut catalog = MockCatalog::default()
      .with_event(Event {
        id: "/ev/aus/".into(),
        name: "Australia".into(),
        official_name: "Formula 1 Rolex Australian Grand Prix 2019".into(),
        sessionoccurrence_urls: vec!["/s/1/".into()],
        ..Default::default()
      })
      .with_event(Event {
        id: "/ev/bah/".into(),
        name: "Bahrain".into(),
        sessionoccurrence_urls: vec!["/s/2/".into()],
        ..Default::default()
      })
      .with_event(Event { id: "/ev/test/".into(), name: "Testing".into(), ..Default::default() })
      .failing("/ev/gone/");
    let season = Season {
      id: "/season/2019/".into(),
      name: "2019".into(),
      year: 2019,
      has_content: true,
      eventoccurrence_urls: vec!["/ev/aus/".into(), "/ev/test/".into(), "/ev/gone/".into(), "/ev/bah/".into()],
    };
    catalog.seasons.objects = vec![season.clone()];
    let mut h = Harness::new(catalog, Config::default(), false);
    let all = h.child(h.tree.root(), ALL_SEASONS_TITLE);

    h.select_and_settle(all).await;
    assert_eq!(h.texts(all), ["2019"]);
    assert!(matches!(h.tree.get(all).payload, Some(Payload::AllSeasons(Some(_)))));

    let y2019 = h.child(all, "2019");
    h.select_and_settle(y2019).await;
    assert_eq!(h.texts(y2019), ["Formula 1 Rolex Australian Grand Prix 2019", "Bahrain"]);
  }

  #[tokio::test]
  async fn event_without_usable_sessions_has_no_content() {
    let catalog = MockCatalog::default()
      .with_event(Event {
        id: "/ev/aus/".into(),
        name: "Australia".into(),
        sessionoccurrence_urls: vec!["/s/fp1/".into()],
        ..Default::default()
      })
      .with_session(session("/s/fp1/", "FP1", "upcoming"), streams(vec![channel("WIF", None)]));
    let mut h = Harness::new(catalog, Config::default(), false);
    let ev = h.tree.add(h.tree.root(), NodeSpec::new("Australia", NodeColor::Folder).with_payload(Payload::Event(
      Event { sessionoccurrence_urls: vec!["/s/fp1/".into()], ..Default::default() },
    )));

    h.select_and_settle(ev).await;

    let node = h.tree.get(ev);
    assert_eq!(node.state, NodeState::NoContent);
    assert!(!node.selectable);
    assert!(node.children.is_empty());
    assert_eq!(node.text, "Australia - NO CONTENT AVAILABLE");
    // Upcoming sessions are skipped before their streams are requested.
    assert_eq!(Calls::get(&h.catalog.calls.streams), 0);

    // A no-content node ignores further selection.
    h.engine.select(&mut h.tree, ev);
    assert_eq!(h.tree.get(ev).state, NodeState::NoContent);
  }

  #[tokio::test]
  async fn sessions_mark_live_and_list_perspectives() {
    let catalog = MockCatalog::default()
      .with_session(
        session("/s/race/", "Race", "live"),
        streams(vec![
          channel("HAM onboard", Some(("Lewis", "Hamilton", 44))),
          channel("WIF", None),
          channel("NOR onboard", Some(("Lando", "Norris", 4))),
          channel("data", None),
        ]),
      )
      .with_session(session("/s/quali/", "Qualifying", "replay"), streams(vec![]));
    let mut h = Harness::new(catalog, Config::default(), false);
    let ev = h.tree.add(h.tree.root(), NodeSpec::new("Monaco", NodeColor::Folder).with_payload(Payload::Event(
      Event { sessionoccurrence_urls: vec!["/s/race/".into(), "/s/quali/".into()], ..Default::default() },
    )));

    h.select_and_settle(ev).await;
    assert_eq!(h.texts(ev), ["Race - LIVE"]);
    let race = h.child(ev, "Race - LIVE");
    assert_eq!(h.tree.get(race).color, NodeColor::Live);

    h.engine.select(&mut h.tree, race);
    assert_eq!(h.texts(race), ["Main Feed", "Data Channel", " (4) NOR onboard", "(44) HAM onboard"]);
  }

  #[tokio::test]
  async fn selecting_while_loading_is_ignored() {
    let mut catalog = MockCatalog::default().with_episode(episode("/e/a/", "A", "0501"));
    catalog.delay = Some(Duration::from_millis(20));
    catalog.categories.objects = vec![category("Highlights", &["/e/a/"])];
    let mut h = Harness::new(catalog, Config::default(), false);
    let cat = h.child(h.tree.root(), "Highlights");

    h.engine.select(&mut h.tree, cat);
    h.engine.select(&mut h.tree, cat);
    h.settle(cat).await;

    assert_eq!(Calls::get(&h.catalog.calls.episodes), 1);
    assert_eq!(h.texts(cat), ["2005"]);

    // Selecting a populated node only toggles it.
    h.engine.select(&mut h.tree, cat);
    assert!(!h.tree.get(cat).expanded);
    assert_eq!(Calls::get(&h.catalog.calls.episodes), 1);
  }

  #[tokio::test]
  async fn episode_selection_offers_playback_actions() {
    let config = Config {
      preferred_language: "de".into(),
      custom_playback_options: vec![
        CustomCommand { title: "VLC".into(), commands: vec![vec!["vlc".into(), "$url".into()]], ..Default::default() },
        CustomCommand { title: "Nothing".into(), ..Default::default() },
      ],
    };
    let mut h = Harness::new(MockCatalog::default(), config, true);
    let ep = h.tree.add(h.tree.root(), episode_node(episode("/e/a/", "Race", "1905")));

    h.engine.select(&mut h.tree, ep);
    assert_eq!(h.texts(ep), ["VLC", "Play with MPV", "Download .m3u8", "GET URL"]);

    let mpv = h.child(ep, "Play with MPV");
    let Some(Payload::Command(ctx)) = &h.tree.get(mpv).payload else { panic!("expected command payload") };
    assert_eq!(ctx.id, "/api/assets/Race/");
    assert_eq!(ctx.command.commands[0][2], "--alang=de");

    let vlc = h.child(ep, "VLC");
    h.engine.select(&mut h.tree, vlc);
    let event = tokio::time::timeout(Duration::from_secs(5), h.rx.recv()).await.unwrap().unwrap();
    assert!(matches!(event, AppEvent::Tree(TreeEvent::Dispatched { node }) if node == vlc));
    assert_eq!(h.launcher.argvs(), [["vlc", "https://cdn.example/api/assets/Race/master.m3u8"]]);
  }

  #[tokio::test]
  async fn episode_without_items_has_no_content() {
    let mut h = Harness::new(MockCatalog::default(), Config::default(), false);
    let ep = h.tree.add(
      h.tree.root(),
      episode_node(Episode { title: "Teaser".into(), ..Default::default() }),
    );
    h.engine.select(&mut h.tree, ep);
    assert_eq!(h.tree.get(ep).state, NodeState::NoContent);
  }

  #[tokio::test]
  async fn playback_nodes_hide_url_action_outside_debug() {
    let h = Harness::new(MockCatalog::default(), Config::default(), false);
    let texts: Vec<_> = h.engine.playback_nodes("Race", "/api/assets/a/").into_iter().map(|n| n.text).collect();
    assert_eq!(texts, ["Play with MPV", "Download .m3u8"]);
  }
}
