//! Frontier and seen-set
//!
//! The seen-set records every URL ever enqueued in a crawl and only grows.
//! The frontier queue holds fetch tasks waiting for a worker, in FIFO order.
//! Both live behind one lock so that a membership check and the matching
//! enqueue happen atomically.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// A URL waiting to be fetched, with the redirect hops its chain may still follow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    pub url: String,
    pub remaining_redirects: u32,
}

impl FetchTask {
    pub fn new(url: impl Into<String>, remaining_redirects: u32) -> Self {
        Self {
            url: url.into(),
            remaining_redirects,
        }
    }
}

#[derive(Debug, Default)]
struct FrontierState {
    seen: HashSet<String>,
    queue: VecDeque<FetchTask>,
}

/// Shared frontier owned by one crawl
#[derive(Debug, Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    work_available: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the URL as seen and queues a fetch task for it
    ///
    /// Does not check the seen-set; callers that have not already checked
    /// should use [`Frontier::add_if_unseen`].
    pub fn add_url(&self, url: impl Into<String>, remaining_redirects: u32) {
        let url = url.into();
        {
            let mut state = self.lock();
            state.seen.insert(url.clone());
            state.queue.push_back(FetchTask::new(url, remaining_redirects));
        }
        self.work_available.notify_one();
    }

    /// Atomically checks the seen-set and enqueues the URL if it is new
    ///
    /// # Returns
    ///
    /// * `true` - The URL was new and a fetch task was queued
    /// * `false` - The URL had already been seen; nothing changed
    pub fn add_if_unseen(&self, url: impl Into<String>, remaining_redirects: u32) -> bool {
        let url = url.into();
        {
            let mut state = self.lock();
            if !state.seen.insert(url.clone()) {
                return false;
            }
            state.queue.push_back(FetchTask::new(url, remaining_redirects));
        }
        self.work_available.notify_one();
        true
    }

    /// Queues a task without touching the seen-set
    pub fn push(&self, task: FetchTask) {
        self.lock().queue.push_back(task);
        self.work_available.notify_one();
    }

    /// Takes the oldest queued task
    pub fn pop(&self) -> Option<FetchTask> {
        self.lock().queue.pop_front()
    }

    /// Returns true if the URL was ever enqueued in this crawl
    pub fn contains(&self, url: &str) -> bool {
        self.lock().seen.contains(url)
    }

    /// Number of tasks waiting for a worker
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    /// Number of distinct URLs enqueued so far
    pub fn seen_count(&self) -> usize {
        self.lock().seen.len()
    }

    /// Resolves once a task has been queued since the last wake-up
    pub async fn work_available(&self) {
        self.work_available.notified().await;
    }
}
