//! Fixed-rate background job bound to a weakly held owner.
//!
//! A `Watchdog` runs `job(&owner)` on its own thread every `interval`. It
//! only keeps a `Weak` to the owner, so it never extends the owner's life:
//! once the last strong handle is gone the next tick notices and the thread
//! exits. [`Watchdog::stop`] ends it explicitly, and dropping the watchdog
//! stops it too.
//!
//! ```text
//!   loop {
//!       select! {
//!           tick  ─► owner.upgrade()? ─► job(&owner)
//!           stop  ─► return
//!       }
//!   }
//! ```

use std::sync::Weak;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Sender, bounded, select, tick};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::Result;

pub struct Watchdog {
    name: String,
    interval: Duration,
    stop_tx: Mutex<Option<Sender<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Watchdog {
    /// Starts a thread named `name` that calls `job` every `interval` while
    /// `owner` is alive.
    pub fn spawn<S, F>(name: &str, interval: Duration, owner: Weak<S>, job: F) -> Result<Self>
    where
        S: Send + Sync + 'static,
        F: Fn(&S) + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let thread_name = name.to_owned();
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                let ticker = tick(interval);
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            let Some(owner) = owner.upgrade() else {
                                debug!(watchdog = %thread_name, "owner dropped, exiting");
                                return;
                            };
                            trace!(watchdog = %thread_name, "tick");
                            job(&owner);
                        }
                        recv(stop_rx) -> _ => {
                            debug!(watchdog = %thread_name, "stopped");
                            return;
                        }
                    }
                }
            })?;

        debug!(watchdog = name, ?interval, "started");
        Ok(Self {
            name: name.to_owned(),
            interval,
            stop_tx: Mutex::new(Some(stop_tx)),
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signals the thread and waits for it. Safe to call more than once.
    pub fn stop(&self) {
        // Dropping the sender disconnects the stop channel, which wakes the select.
        drop(self.stop_tx.lock().take());
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Watchdog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watchdog")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    const TICK: Duration = Duration::from_millis(5);

    fn wait_until(deadline: Duration, cond: impl Fn() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        cond()
    }

    #[test]
    fn runs_job_periodically() {
        let counter = Arc::new(AtomicUsize::new(0));
        let dog = Watchdog::spawn("test-tick", TICK, Arc::downgrade(&counter), |c| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        assert!(wait_until(Duration::from_secs(2), || counter.load(Ordering::SeqCst) >= 3));
        assert_eq!(dog.interval(), TICK);
        assert!(dog.is_running());
        dog.stop();
        assert!(!dog.is_running());
    }

    #[test]
    fn stop_is_idempotent_and_halts_ticks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let dog = Watchdog::spawn("test-stop", TICK, Arc::downgrade(&counter), |c| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        dog.stop();
        dog.stop();
        let after_stop = counter.load(Ordering::SeqCst);
        thread::sleep(TICK * 6);
        assert_eq!(counter.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn exits_when_owner_is_dropped() {
        let owner = Arc::new(AtomicUsize::new(0));
        let dog = Watchdog::spawn("test-owner", TICK, Arc::downgrade(&owner), |_| {}).unwrap();
        drop(owner);
        assert!(wait_until(Duration::from_secs(2), || !dog.is_running()));
    }

    #[test]
    fn drop_stops_thread() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let _dog = Watchdog::spawn("test-drop", TICK, Arc::downgrade(&counter), |c| {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        let after_drop = counter.load(Ordering::SeqCst);
        thread::sleep(TICK * 6);
        assert_eq!(counter.load(Ordering::SeqCst), after_drop);
    }
}
