//! Join barriers for concurrently started tasks.
//!
//! [`WaitGroup`] is the bare barrier: every participant holds a
//! [`DoneToken`] and the group's [`wait`](WaitGroup::wait) resolves once all
//! outstanding tokens have been spent. Spending a token consumes it, so a
//! participant can signal at most once, and dropping it counts as signalling,
//! so early returns and panics still release the barrier. The only way to
//! never signal is to leak the token (e.g. `std::mem::forget`), which leaves
//! `wait` blocked for good.
//!
//! [`Supervisor`] spawns tasks on tokio, hands each one a token, and joins
//! them in spawn order. It never cancels anything.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use futures::future::BoxFuture;

use crate::core::{Error, Result};

/// A type-erased task, for handing differently shaped futures to
/// [`Supervisor::run_all`].
pub type BoxTask = BoxFuture<'static, Result<()>>;

#[derive(Debug, Default)]
struct Inner {
    pending: AtomicUsize,
    notify: Notify,
}

/// Counts outstanding participants and wakes waiters when the count hits zero.
#[derive(Debug, Clone, Default)]
pub struct WaitGroup {
    inner: Arc<Inner>,
}

impl WaitGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one more participant.
    pub fn token(&self) -> DoneToken {
        self.inner.pending.fetch_add(1, Ordering::AcqRel);
        DoneToken {
            inner: self.inner.clone(),
        }
    }

    /// Participants that have not signalled yet.
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Wait until every token handed out so far has been spent.
    ///
    /// Returns immediately if nothing is pending.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register interest before checking, so a signal landing between
            // the check and the await is not lost.
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// One participant's completion signal.
#[derive(Debug)]
#[must_use = "dropping a DoneToken signals completion immediately"]
pub struct DoneToken {
    inner: Arc<Inner>,
}

impl DoneToken {
    /// Signal completion.
    pub fn done(self) {
        drop(self);
    }
}

impl Drop for DoneToken {
    fn drop(&mut self) {
        if self.inner.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.notify.notify_waiters();
        }
    }
}

/// Starts tasks concurrently and waits for all of them.
pub struct Supervisor<T = ()> {
    wait_group: WaitGroup,
    tasks: Vec<(String, JoinHandle<Result<T>>)>,
}

impl<T: Send + 'static> Supervisor<T> {
    pub fn new() -> Self {
        Self {
            wait_group: WaitGroup::new(),
            tasks: Vec::new(),
        }
    }

    /// Start `task` on the runtime right away.
    pub fn spawn<F>(&mut self, name: impl Into<String>, task: F)
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let name = name.into();
        let token = self.wait_group.token();
        debug!(task = %name, "task spawned");
        let handle = tokio::spawn(async move {
            let _token = token;
            task.await
        });
        self.tasks.push((name, handle));
    }

    /// Number of spawned tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks that have not signalled completion yet.
    pub fn pending(&self) -> usize {
        self.wait_group.pending()
    }

    /// Block until every task has signalled, then collect results in spawn
    /// order.
    ///
    /// Fails if any task returned an error or panicked; a single failure is
    /// returned as is, several are wrapped in [`Error::Multiple`].
    pub async fn join(self) -> Result<Vec<T>> {
        self.wait_group.wait().await;

        let mut outputs = Vec::with_capacity(self.tasks.len());
        let mut errors = Vec::new();
        for (name, handle) in self.tasks {
            match handle.await {
                Ok(Ok(output)) => outputs.push(output),
                Ok(Err(e)) => {
                    error!(task = %name, error = %e, "task failed");
                    errors.push(e);
                }
                Err(e) => {
                    error!(task = %name, error = %e, "task panicked");
                    errors.push(Error::TaskPanicked {
                        task: name,
                        message: e.to_string(),
                    });
                }
            }
        }

        match errors.len() {
            0 => Ok(outputs),
            1 => Err(errors.remove(0)),
            _ => Err(Error::Multiple(errors)),
        }
    }
}

impl Supervisor<()> {
    /// Start every task concurrently and wait for all of them.
    ///
    /// Box the tasks into [`BoxTask`] to mix different future types.
    pub async fn run_all<I, F>(tasks: I) -> Result<()>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let mut supervisor = Supervisor::new();
        for (index, task) in tasks.into_iter().enumerate() {
            supervisor.spawn(format!("task-{}", index), task);
        }
        supervisor.join().await.map(|_| ())
    }
}

impl<T: Send + 'static> Default for Supervisor<T> {
    fn default() -> Self {
        Self::new()
    }
}
