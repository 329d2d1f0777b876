//! Blinking "busy" indicator for tree nodes.

use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use crate::engine::AppEvent;
use crate::tree::{NodeId, TreeEvent};

/// Handle to a running blink task. Dropping it without calling `finish` also stops the blink.
pub struct BusyIndicator {
  done: oneshot::Sender<()>,
}

impl BusyIndicator {
  /// Start alternating `node` between its own color and the loading color every `interval`.
  pub fn start(node: NodeId, events: mpsc::UnboundedSender<AppEvent>, interval: Duration) -> Self {
    let (done, mut done_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval);
      let mut on = false;
      loop {
        tokio::select! {
          biased;
          _ = &mut done_rx => break,
          _ = ticker.tick() => {
            on = !on;
            if events.send(AppEvent::Tree(TreeEvent::Blink { node, on })).is_err() {
              return;
            }
          }
        }
      }
      let _ = events.send(AppEvent::Tree(TreeEvent::BusyDone { node }));
    });
    Self { done }
  }

  pub fn finish(self) {
    let _ = self.done.send(());
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tree::{NodeColor, NodeSpec, Tree};

  #[tokio::test(start_paused = true)]
  async fn blinks_until_finished() {
    let mut tree = Tree::new("root");
    let node = tree.add(tree.root(), NodeSpec::new("Race", NodeColor::Item));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let busy = BusyIndicator::start(node, tx, Duration::from_millis(200));
    tokio::time::sleep(Duration::from_millis(650)).await;
    busy.finish();

    let mut blinks = Vec::new();
    let mut done = false;
    while let Some(AppEvent::Tree(event)) = rx.recv().await {
      match event {
        TreeEvent::Blink { on, .. } => blinks.push(on),
        TreeEvent::BusyDone { .. } => {
          done = true;
          tree.apply(event);
          break;
        }
        other => panic!("unexpected event {:?}", other),
      }
    }
    assert!(done);
    assert!(blinks.len() >= 3);
    assert_eq!(&blinks[..3], [true, false, true]);
    assert_eq!(tree.get(node).busy, None);
  }

  #[tokio::test]
  async fn dropping_the_handle_stops_the_blink() {
    let mut tree = Tree::new("root");
    let node = tree.add(tree.root(), NodeSpec::new("Race", NodeColor::Item));
    let (tx, mut rx) = mpsc::unbounded_channel();
    drop(BusyIndicator::start(node, tx, Duration::from_millis(10)));

    loop {
      match rx.recv().await {
        Some(AppEvent::Tree(TreeEvent::BusyDone { node: done })) => {
          assert_eq!(done, node);
          break;
        }
        Some(_) => continue,
        None => panic!("blink task ended without BusyDone"),
      }
    }
  }
}
