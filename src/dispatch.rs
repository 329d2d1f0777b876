//! Runs playback commands against a resolved stream URL.

use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::busy::BusyIndicator;
use crate::catalog::Catalog;
use crate::constants::constants;
use crate::engine::AppEvent;
use crate::tree::{CommandContext, NodeId, TreeEvent};

pub type OutputStream = Box<dyn AsyncRead + Send + Unpin>;

/// Starts external processes. Returns the child's stdout when `capture_stdout` is set.
pub trait Launcher: Send + Sync {
  fn spawn(&self, argv: &[String], capture_stdout: bool) -> Result<Option<OutputStream>>;
}

/// Launches real processes with `tokio::process`.
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
  fn spawn(&self, argv: &[String], capture_stdout: bool) -> Result<Option<OutputStream>> {
    let (program, args) = argv.split_first().context("Empty command")?;
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(if capture_stdout { Stdio::piped() } else { Stdio::null() });
    // Uncaptured stderr would interleave with the TUI.
    cmd.stderr(Stdio::null());

    let mut child = cmd.spawn().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("{} not found on PATH", program)
      } else {
        anyhow!(e).context(format!("Failed to spawn {}", program))
      }
    })?;

    let stdout = if capture_stdout {
      let out = child.stdout.take().context("Failed to get child stdout")?;
      Some(Box::new(out) as OutputStream)
    } else {
      None
    };
    // Reap in the background so finished players don't linger as zombies.
    tokio::spawn(async move {
      let _ = child.wait().await;
    });
    Ok(stdout)
  }
}

/// Whether `name` resolves to a file in one of the `PATH` directories.
pub fn command_available(name: &str) -> bool {
  let Some(path) = std::env::var_os("PATH") else {
    return false;
  };
  std::env::split_paths(&path).any(|dir| {
    let candidate = dir.join(name);
    candidate.is_file() || (cfg!(windows) && candidate.with_extension("exe").is_file())
  })
}

/// Fill in the `$file` and `$url` placeholders of one argument token.
pub fn substitute(token: &str, url: &str, file: &str) -> String {
  token.replace("$file", file).replace("$url", url)
}

/// Read `stream` line by line until a line contains `phrase` or the stream ends.
///
/// Every line is forwarded as a log event. Once the phrase is seen the rest of the
/// stream is drained in the background so the process never blocks on a full pipe.
async fn monitor_output(stream: OutputStream, phrase: &str, events: &mpsc::UnboundedSender<AppEvent>) -> bool {
  let mut lines = BufReader::new(stream).lines();
  loop {
    match lines.next_line().await {
      Ok(Some(line)) => {
        let found = line.contains(phrase);
        let _ = events.send(AppEvent::Log(line));
        if found {
          tokio::spawn(async move { while let Ok(Some(_)) = lines.next_line().await {} });
          return true;
        }
      }
      Ok(None) => return false,
      Err(e) => {
        warn!(err = %e, "dispatch: reading command output failed");
        return false;
      }
    }
  }
}

pub struct Dispatcher<C> {
  catalog: Arc<C>,
  launcher: Arc<dyn Launcher>,
  events: mpsc::UnboundedSender<AppEvent>,
}

impl<C> Clone for Dispatcher<C> {
  fn clone(&self) -> Self {
    Self { catalog: Arc::clone(&self.catalog), launcher: Arc::clone(&self.launcher), events: self.events.clone() }
  }
}

impl<C: Catalog> Dispatcher<C> {
  pub fn new(catalog: Arc<C>, launcher: Arc<dyn Launcher>, events: mpsc::UnboundedSender<AppEvent>) -> Self {
    Self { catalog, launcher, events }
  }

  fn log(&self, line: String) {
    let _ = self.events.send(AppEvent::Log(line));
  }

  fn mark_dispatched(&self, node: NodeId) {
    let _ = self.events.send(AppEvent::Tree(TreeEvent::Dispatched { node }));
  }

  /// Run `ctx` for `node` in the background.
  pub fn dispatch(&self, node: NodeId, ctx: CommandContext) {
    let this = self.clone();
    tokio::spawn(async move {
      if let Err(e) = this.run(node, &ctx).await {
        warn!(title = %ctx.command.title, err = %format!("{:#}", e), "dispatch: command failed");
        this.log(format!("{}: {:#}", ctx.command.title, e));
      }
    });
  }

  /// Resolve the stream URL, launch every command in order and, if configured,
  /// blink the node until the watched command prints its watch-phrase.
  pub async fn run(&self, node: NodeId, ctx: &CommandContext) -> Result<()> {
    let url = self.catalog.resolve_playable_url(&ctx.id).await.context("Failed to resolve stream URL")?;
    debug!(id = %ctx.id, "dispatch: resolved stream URL");

    let watch = ctx.command.watch_target();
    let mut file: Option<String> = None;
    let mut watched: Option<OutputStream> = None;
    let mut launched = 0;

    for (index, template) in ctx.command.commands.iter().enumerate() {
      if file.is_none() && template.iter().any(|t| t.contains("$file")) {
        file = Some(self.download(&url, &ctx.title).await);
      }
      let argv: Vec<String> =
        template.iter().map(|t| substitute(t, &url, file.as_deref().unwrap_or_default())).collect();
      let capture = watch.is_some_and(|(i, _)| i == index);

      match self.launcher.spawn(&argv, capture) {
        Ok(stdout) => {
          info!(program = %argv.first().map(String::as_str).unwrap_or_default(), "dispatch: launched");
          launched += 1;
          if capture {
            watched = stdout;
          }
        }
        Err(e) => {
          warn!(err = %format!("{:#}", e), "dispatch: launch failed");
          self.log(format!("launch failed: {:#}", e));
        }
      }
    }

    match (watch, watched) {
      (Some((_, phrase)), Some(stream)) => {
        let busy = BusyIndicator::start(node, self.events.clone(), constants().blink_interval());
        let found = monitor_output(stream, phrase, &self.events).await;
        debug!(found, "dispatch: watch finished");
        busy.finish();
      }
      (Some(_), None) => {}
      (None, _) if launched > 0 => self.mark_dispatched(node),
      (None, _) => {}
    }
    Ok(())
  }

  /// Download once for a dispatch; a failure substitutes an empty path.
  async fn download(&self, url: &str, title: &str) -> String {
    match self.catalog.download_asset(url, title).await {
      Ok(path) => path.display().to_string(),
      Err(e) => {
        warn!(err = %e, "dispatch: asset download failed");
        self.log(format!("download failed: {}", e));
        String::new()
      }
    }
  }

  /// Save the asset's playlist next to the working directory.
  pub fn save_playlist(&self, node: NodeId, id: String, title: String) {
    let this = self.clone();
    tokio::spawn(async move {
      let result = match this.catalog.resolve_playable_url(&id).await {
        Ok(url) => this.catalog.download_asset(&url, &title).await,
        Err(e) => Err(e),
      };
      match result {
        Ok(path) => {
          this.log(format!("saved {}", display_path(&path)));
          this.mark_dispatched(node);
        }
        Err(e) => {
          warn!(id = %id, err = %e, "dispatch: download failed");
          this.log(format!("download failed: {}", e));
        }
      }
    });
  }

  /// Resolve the stream URL and show it in the log.
  pub fn show_url(&self, id: String) {
    let this = self.clone();
    tokio::spawn(async move {
      match this.catalog.resolve_playable_url(&id).await {
        Ok(url) => {
          info!(id = %id, "dispatch: resolved URL requested");
          this.log(url);
        }
        Err(e) => this.log(format!("could not resolve {}: {}", id, e)),
      }
    });
  }
}

fn display_path(path: &Path) -> String {
  std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()).display().to_string()
}
