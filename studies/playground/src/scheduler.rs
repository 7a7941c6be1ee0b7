//! Repeating tasks with explicit cancellation.
//!
//! Every scheduled task hands back a `TickHandle`. The task stops when it
//! returns `TickFlow::Stop`, when the handle is cancelled, or when the handle
//! is dropped.

use std::{
    sync::{
        atomic::{ AtomicBool, Ordering },
        mpsc::{ self, RecvTimeoutError, Sender },
        Arc,
        Mutex,
        PoisonError,
    },
    thread,
    time::Duration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFlow {
    Continue,
    Stop,
}

pub type Task = Box<dyn FnMut() -> TickFlow + Send + 'static>;

pub trait Scheduler {
    fn every(&self, interval: Duration, task: Task) -> TickHandle;
}

#[derive(Debug)]
pub struct TickHandle {
    stopped: Arc<AtomicBool>,
    wake: Option<Sender<()>>,
}

impl TickHandle {
    fn new(stopped: Arc<AtomicBool>, wake: Option<Sender<()>>) -> TickHandle {
        TickHandle { stopped, wake }
    }

    pub fn cancel(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(wake) = &self.wake {
            // the worker may already be gone
            let _ = wake.send(());
        }
    }

    /// False once the task was cancelled or asked to stop.
    pub fn is_active(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Runs each task on its own thread, waking every `interval`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn every(&self, interval: Duration, mut task: Task) -> TickHandle {
        let (wake_tx, wake_rx) = mpsc::channel::<()>();
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stopped);

        let spawned = thread::Builder::new()
            .name("training-tick".into())
            .spawn(move || {
                loop {
                    match wake_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if flag.load(Ordering::SeqCst) {
                                break;
                            }
                            if task() == TickFlow::Stop {
                                flag.store(true, Ordering::SeqCst);
                                break;
                            }
                        }
                        // cancelled, or the handle went away
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                            break;
                        }
                    }
                }
            });

        if let Err(err) = spawned {
            tracing::error!("failed to spawn tick thread: {err}");
            stopped.store(true, Ordering::SeqCst);
        }

        TickHandle::new(stopped, Some(wake_tx))
    }
}

struct ManualTask {
    stopped: Arc<AtomicBool>,
    task: Task,
}

/// Scheduler driven by hand, one `advance` per elapsed interval.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    tasks: Arc<Mutex<Vec<ManualTask>>>,
}

impl ManualScheduler {
    pub fn new() -> ManualScheduler {
        ManualScheduler::default()
    }

    /// Fires every live task once. Returns how many tasks ran.
    pub fn advance(&self) -> usize {
        let mut due = std::mem::take(&mut *self.lock());
        let mut fired = 0;

        for entry in due.iter_mut() {
            if entry.stopped.load(Ordering::SeqCst) {
                continue;
            }
            fired += 1;
            if (entry.task)() == TickFlow::Stop {
                entry.stopped.store(true, Ordering::SeqCst);
            }
        }

        due.retain(|entry| !entry.stopped.load(Ordering::SeqCst));
        let mut tasks = self.lock();
        // tasks scheduled while these ran go after the survivors
        let added = std::mem::take(&mut *tasks);
        tasks.extend(due);
        tasks.extend(added);
        fired
    }

    pub fn advance_by(&self, ticks: usize) -> usize {
        (0..ticks).map(|_| self.advance()).sum()
    }

    pub fn live_tasks(&self) -> usize {
        self.lock()
            .iter()
            .filter(|entry| !entry.stopped.load(Ordering::SeqCst))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ManualTask>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for ManualScheduler {
    fn every(&self, _interval: Duration, task: Task) -> TickHandle {
        let stopped = Arc::new(AtomicBool::new(false));
        self.lock().push(ManualTask { stopped: Arc::clone(&stopped), task });
        TickHandle::new(stopped, None)
    }
}
