//! Eviction callback dispatch.
//!
//! User callbacks never run while a cache lock is held. Mutating calls
//! collect the entries they unlinked, release the lock, and then hand each
//! `(key, value)` to a [`CallbackPool`]: a fixed set of worker threads fed
//! by an unbounded channel, so submitting never blocks the caller. `clear`
//! is the exception and runs its callbacks inline before returning.
//!
//! A panicking callback is caught and logged. It neither kills its worker
//! nor touches cache state.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Sender, unbounded};
use tracing::{debug, warn};

use crate::error::Result;

/// Invoked with every entry that leaves a cache: evicted, expired, removed or cleared.
pub type EvictCallback<K, V> = Arc<dyn Fn(K, V) + Send + Sync>;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size worker pool for fire-and-forget jobs.
pub struct CallbackPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl CallbackPool {
    pub fn new(size: usize) -> Result<Self> {
        let size = size.max(1);
        let (sender, receiver) = unbounded::<Job>();
        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("evictkit-callback-{id}"))
                .spawn(move || {
                    for job in receiver.iter() {
                        if catch_unwind(AssertUnwindSafe(job)).is_err() {
                            warn!(worker = id, "eviction callback panicked");
                        }
                    }
                })?;
            workers.push(handle);
        }
        debug!(workers = size, "callback pool started");
        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(sender) = &self.sender {
            // Workers only hang up after the sender is dropped.
            let _ = sender.send(Box::new(job));
        }
    }
}

impl Drop for CallbackPool {
    fn drop(&mut self) {
        // Queued jobs still run; workers leave once the channel drains.
        self.sender.take();
        let current = thread::current().id();
        for handle in self.workers.drain(..) {
            if handle.thread().id() != current {
                let _ = handle.join();
            }
        }
    }
}

impl std::fmt::Debug for CallbackPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackPool")
            .field("size", &self.size())
            .finish()
    }
}

/// Routes unlinked entries to the user callback.
pub(crate) struct Notifier<K, V> {
    callback: Option<EvictCallback<K, V>>,
    pool: Option<CallbackPool>,
}

impl<K, V> Notifier<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    /// The pool is only started when there is a callback to run.
    pub(crate) fn new(callback: Option<EvictCallback<K, V>>, workers: usize) -> Result<Self> {
        let pool = match callback {
            Some(_) => Some(CallbackPool::new(workers)?),
            None => None,
        };
        Ok(Self { callback, pool })
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.callback.is_some()
    }

    pub(crate) fn pool_size(&self) -> usize {
        self.pool.as_ref().map_or(0, CallbackPool::size)
    }

    /// Queues one callback per entry on the pool.
    pub(crate) fn dispatch(&self, entries: Vec<(K, V)>) {
        let (Some(callback), Some(pool)) = (&self.callback, &self.pool) else {
            return;
        };
        for (key, value) in entries {
            let callback = Arc::clone(callback);
            pool.execute(move || callback(key, value));
        }
    }

    /// Runs callbacks on the calling thread, one after another.
    pub(crate) fn run_inline(&self, entries: Vec<(K, V)>) {
        let Some(callback) = &self.callback else {
            return;
        };
        for (key, value) in entries {
            if catch_unwind(AssertUnwindSafe(|| callback(key, value))).is_err() {
                warn!("eviction callback panicked during clear");
            }
        }
    }
}
