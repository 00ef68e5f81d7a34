//! Render coordination: only the newest edit's output is ever published.
//!
//! Every call to [`RenderCoordinator::begin`] mints a [`RenderToken`] greater
//! than all earlier ones. A finished render is published only if its token is
//! still the latest minted one; anything older is dropped. Work is never
//! cancelled, superseded renders simply run to completion unseen.

use crate::pipeline::{Pipeline, Render, ERROR_MARKER};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderToken(u64);

impl RenderToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A published render result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub token: RenderToken,
    pub html: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Idle,
    Rendering(RenderToken),
    Accepted(RenderToken),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Accepted,
    Superseded,
}

struct State {
    minted: u64,
    phase: RenderPhase,
}

struct Inner<R> {
    renderer: R,
    state: Mutex<State>,
    published: watch::Sender<Option<Rendered>>,
}

/// Cheap to clone; clones share tokens and the published result.
pub struct RenderCoordinator<R: Render = Pipeline> {
    inner: Arc<Inner<R>>,
}

impl<R: Render> Clone for RenderCoordinator<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Render> RenderCoordinator<R> {
    pub fn new(renderer: R) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                renderer,
                state: Mutex::new(State {
                    minted: 0,
                    phase: RenderPhase::Idle,
                }),
                published,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Mint the token for a new input and enter `Rendering`.
    pub fn begin(&self) -> RenderToken {
        let mut state = self.state();
        state.minted += 1;
        let token = RenderToken(state.minted);
        state.phase = RenderPhase::Rendering(token);
        trace!(token = token.value(), "render started");
        token
    }

    /// Offer a finished render. The staleness check and the publish happen
    /// under one lock, so two completions cannot interleave between them.
    pub fn complete(&self, token: RenderToken, html: String) -> RenderOutcome {
        let mut state = self.state();
        if token.value() != state.minted {
            debug!(
                token = token.value(),
                latest = state.minted,
                "discarding superseded render"
            );
            return RenderOutcome::Superseded;
        }
        state.phase = RenderPhase::Accepted(token);
        self.inner
            .published
            .send_replace(Some(Rendered { token, html }));
        RenderOutcome::Accepted
    }

    /// Render `source` off the caller's task and publish it if still current.
    pub fn submit(&self, source: impl Into<String>) -> (RenderToken, JoinHandle<RenderOutcome>) {
        let token = self.begin();
        let source = source.into();
        let this = self.clone();
        let handle = tokio::spawn(async move {
            let worker = this.clone();
            let html = tokio::task::spawn_blocking(move || worker.inner.renderer.render(&source))
                .await
                .unwrap_or_else(|e| {
                    error!(error = %e, "render task failed");
                    ERROR_MARKER.to_string()
                });
            this.complete(token, html)
        });
        (token, handle)
    }

    /// Render synchronously on the current thread.
    pub fn render_now(&self, source: &str) -> Rendered {
        let token = self.begin();
        let html = self.inner.renderer.render(source);
        self.complete(token, html.clone());
        Rendered { token, html }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Rendered>> {
        self.inner.published.subscribe()
    }

    /// The most recently accepted result, if any.
    pub fn latest(&self) -> Option<Rendered> {
        self.inner.published.borrow().clone()
    }

    pub fn phase(&self) -> RenderPhase {
        self.state().phase
    }
}

impl Default for RenderCoordinator<Pipeline> {
    fn default() -> Self {
        Self::new(Pipeline::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::mpsc;

    #[test]
    fn test_tokens_strictly_increase() {
        let coordinator = RenderCoordinator::default();
        let a = coordinator.begin();
        let b = coordinator.begin();
        assert!(b > a);
        assert_eq!(coordinator.phase(), RenderPhase::Rendering(b));
    }

    #[test]
    fn test_late_completion_is_discarded() {
        let coordinator = RenderCoordinator::default();
        assert_eq!(coordinator.phase(), RenderPhase::Idle);
        let a = coordinator.begin();
        let b = coordinator.begin();

        assert_eq!(
            coordinator.complete(b, "<p>B</p>".to_string()),
            RenderOutcome::Accepted
        );
        assert_eq!(
            coordinator.complete(a, "<p>A</p>".to_string()),
            RenderOutcome::Superseded
        );

        let latest = coordinator.latest().unwrap();
        assert_eq!(latest.html, "<p>B</p>");
        assert_eq!(latest.token, b);
        assert_eq!(coordinator.phase(), RenderPhase::Accepted(b));
    }

    #[test]
    fn test_superseded_before_any_completion() {
        let coordinator = RenderCoordinator::default();
        let a = coordinator.begin();
        let _b = coordinator.begin();
        assert_eq!(
            coordinator.complete(a, "<p>A</p>".to_string()),
            RenderOutcome::Superseded
        );
        assert!(coordinator.latest().is_none());
    }

    #[test]
    fn test_render_now_publishes() {
        let coordinator = RenderCoordinator::default();
        let rendered = coordinator.render_now("*hi*");
        assert_eq!(rendered.html, "<p><em>hi</em></p>");
        assert_eq!(coordinator.latest(), Some(rendered));
    }

    /// Blocks each render until the test releases the matching input.
    struct Gated {
        gates: Mutex<HashMap<String, mpsc::Receiver<()>>>,
    }

    impl Gated {
        fn new(inputs: &[&str]) -> (Self, HashMap<String, mpsc::Sender<()>>) {
            let mut gates = HashMap::new();
            let mut releases = HashMap::new();
            for input in inputs {
                let (tx, rx) = mpsc::channel();
                gates.insert(input.to_string(), rx);
                releases.insert(input.to_string(), tx);
            }
            (
                Self {
                    gates: Mutex::new(gates),
                },
                releases,
            )
        }
    }

    impl Render for Gated {
        fn render(&self, source: &str) -> String {
            let gate = self.gates.lock().unwrap().remove(source);
            if let Some(gate) = gate {
                let _ = gate.recv();
            }
            format!("<p>{}</p>", source)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_out_of_order_completion_publishes_newest() {
        let (renderer, releases) = Gated::new(&["A", "B"]);
        let coordinator = RenderCoordinator::new(renderer);
        let mut updates = coordinator.subscribe();

        let (_, first) = coordinator.submit("A");
        let (b, second) = coordinator.submit("B");

        releases["B"].send(()).unwrap();
        assert_eq!(second.await.unwrap(), RenderOutcome::Accepted);
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow().as_ref().unwrap().html, "<p>B</p>");

        releases["A"].send(()).unwrap();
        assert_eq!(first.await.unwrap(), RenderOutcome::Superseded);

        let latest = coordinator.latest().unwrap();
        assert_eq!(latest.html, "<p>B</p>");
        assert_eq!(latest.token, b);
        assert!(!updates.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_in_order_completion_publishes_each() {
        let coordinator = RenderCoordinator::default();
        let (_, first) = coordinator.submit("one");
        assert_eq!(first.await.unwrap(), RenderOutcome::Accepted);
        assert_eq!(coordinator.latest().unwrap().html, "<p>one</p>");

        let (_, second) = coordinator.submit("two");
        assert_eq!(second.await.unwrap(), RenderOutcome::Accepted);
        assert_eq!(coordinator.latest().unwrap().html, "<p>two</p>");
    }
}
