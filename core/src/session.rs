//! # Navigation Sessions
//!
//! A page can change its fragment while a push is still in flight. The newer
//! navigation wins: the older run is left to finish on its own, but nothing
//! it says reaches the presenter anymore.
//!
//! Supersession is a single generation counter. Each navigation takes the
//! next generation, and a run may only present while its generation is the
//! latest one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::message::Message;
use crate::pipeline::PushTx;
use crate::present::Presenter;

/// Drives a pipeline from a stream of navigation events.
#[derive(Clone)]
pub struct NavigationSession {
    pipeline: Arc<PushTx>,
    generation: Arc<AtomicU64>,
}

impl NavigationSession {
    /// Creates a session with no navigation yet.
    pub fn new(pipeline: Arc<PushTx>) -> Self {
        Self {
            pipeline,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Generation of the latest navigation. Zero before the first one.
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Starts a run for `target`, superseding every earlier run.
    ///
    /// The handle resolves to the run's terminal message, or `None` if a
    /// later navigation superseded it before it finished.
    pub fn navigate(
        &self,
        target: Option<String>,
        presenter: Arc<dyn Presenter>,
    ) -> JoinHandle<Option<Message>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "navigation started");

        let gate = GatedPresenter {
            generation,
            latest: Arc::clone(&self.generation),
            inner: presenter,
        };
        let pipeline = Arc::clone(&self.pipeline);

        tokio::spawn(async move {
            let message = pipeline.run(target.as_deref(), &gate).await;
            if gate.is_current() {
                Some(message)
            } else {
                debug!(generation, "superseded run finished, output dropped");
                None
            }
        })
    }
}

/// Forwards messages only while its run is the latest navigation.
struct GatedPresenter {
    generation: u64,
    latest: Arc<AtomicU64>,
    inner: Arc<dyn Presenter>,
}

impl GatedPresenter {
    fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }
}

impl Presenter for GatedPresenter {
    fn present(&self, message: &Message) {
        if self.is_current() {
            self.inner.present(message);
        }
    }
}
