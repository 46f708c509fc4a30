//! Bounded worker pool
//!
//! This module handles:
//! - Pulling fetch tasks off the frontier in FIFO order
//! - Running at most `max_tasks` of them concurrently
//! - Detecting drain: empty frontier and nothing in flight
//! - Stopping dispatch when the crawl is cancelled

use crate::crawler::frontier::{FetchTask, Frontier};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// What happened during one scheduler run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    /// Tasks handed to a worker
    pub dispatched: u64,

    /// Tasks that panicked; the pool kept running
    pub panicked: u64,

    /// Tasks still queued when the run stopped (only non-zero after cancellation)
    pub abandoned: usize,

    /// Whether the run stopped because of cancellation
    pub cancelled: bool,
}

/// Scheduler runs fetch tasks from the frontier with a concurrency ceiling
///
/// Tasks may enqueue further work while they run; the scheduler only reports
/// drained once the transitive closure of queued work has completed.
pub struct Scheduler {
    /// Maximum number of tasks executing at once
    max_tasks: usize,

    /// Shared frontier the tasks are pulled from
    frontier: Arc<Frontier>,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// A ceiling of zero is treated as one.
    pub fn new(max_tasks: usize, frontier: Arc<Frontier>) -> Self {
        Self {
            max_tasks: max_tasks.max(1),
            frontier,
        }
    }

    pub fn max_tasks(&self) -> usize {
        self.max_tasks
    }

    /// Queues a task for a worker
    pub fn push(&self, task: FetchTask) {
        self.frontier.push(task);
    }

    /// Runs queued tasks until the frontier drains or `cancel` fires
    ///
    /// Each task is executed by `handler` on its own tokio task. After
    /// cancellation no new task is dispatched; tasks already running are
    /// allowed to finish.
    pub async fn run<F, Fut>(&self, handler: F, cancel: &CancellationToken) -> SchedulerReport
    where
        F: Fn(FetchTask) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut in_flight = JoinSet::new();
        let mut report = SchedulerReport::default();

        loop {
            let cancelled = cancel.is_cancelled();

            if !cancelled {
                while in_flight.len() < self.max_tasks {
                    let Some(task) = self.frontier.pop() else {
                        break;
                    };
                    tracing::trace!(
                        "Dispatching {} ({} in flight, {} queued)",
                        task.url,
                        in_flight.len(),
                        self.frontier.pending()
                    );
                    in_flight.spawn(handler(task));
                    report.dispatched += 1;
                }
            }

            if in_flight.is_empty() {
                // Nothing running: either drained, or cancelled and settled
                break;
            }

            let has_capacity = in_flight.len() < self.max_tasks;

            tokio::select! {
                joined = in_flight.join_next() => {
                    if let Some(Err(e)) = joined {
                        if e.is_panic() {
                            report.panicked += 1;
                            tracing::error!("Fetch task panicked: {}", e);
                        }
                    }
                }
                _ = self.frontier.work_available(), if has_capacity && !cancelled => {}
                _ = cancel.cancelled(), if !cancelled => {
                    tracing::info!(
                        "Cancellation requested; waiting for {} in-flight tasks",
                        in_flight.len()
                    );
                }
            }
        }

        report.cancelled = cancel.is_cancelled();
        report.abandoned = self.frontier.pending();

        if report.cancelled {
            tracing::info!(
                "Crawl cancelled after {} tasks, {} left queued",
                report.dispatched,
                report.abandoned
            );
        } else {
            tracing::info!("All tasks done: {} fetch tasks completed", report.dispatched);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn create_scheduler(max_tasks: usize) -> (Scheduler, Arc<Frontier>) {
        let frontier = Arc::new(Frontier::new());
        (Scheduler::new(max_tasks, Arc::clone(&frontier)), frontier)
    }

    #[tokio::test]
    async fn test_empty_frontier_drains_immediately() {
        let (scheduler, _) = create_scheduler(4);
        let report = scheduler.run(|_| async {}, &CancellationToken::new()).await;

        assert_eq!(report, SchedulerReport::default());
    }

    #[test]
    fn test_zero_ceiling_becomes_one() {
        let (scheduler, _) = create_scheduler(0);
        assert_eq!(scheduler.max_tasks(), 1);
    }

    #[tokio::test]
    async fn test_runs_every_task() {
        let (scheduler, frontier) = create_scheduler(3);
        for i in 0..10 {
            frontier.add_url(format!("http://a.test/{}", i), 0);
        }

        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);
        let report = scheduler
            .run(
                move |_| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                },
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(ran.load(Ordering::SeqCst), 10);
        assert_eq!(report.dispatched, 10);
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_pushed_tasks_run_in_order_without_marking_seen() {
        let (scheduler, frontier) = create_scheduler(1);
        scheduler.push(FetchTask::new("http://a.test/1", 2));
        scheduler.push(FetchTask::new("http://a.test/2", 2));
        scheduler.push(FetchTask::new("http://a.test/1", 2));

        assert_eq!(frontier.pending(), 3);
        assert_eq!(frontier.seen_count(), 0);

        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&order);
        let report = scheduler
            .run(
                move |task| {
                    let sink = Arc::clone(&sink);
                    async move {
                        sink.lock().unwrap().push(task.url);
                    }
                },
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(report.dispatched, 3);
        assert_eq!(
            *order.lock().unwrap(),
            vec!["http://a.test/1", "http://a.test/2", "http://a.test/1"]
        );
        assert!(!frontier.contains("http://a.test/1"));
    }

    #[tokio::test]
    async fn test_concurrency_ceiling() {
        let (scheduler, frontier) = create_scheduler(2);
        for i in 0..8 {
            frontier.add_url(format!("http://a.test/{}", i), 0);
        }

        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (c, p) = (Arc::clone(&current), Arc::clone(&peak));

        scheduler
            .run(
                move |_| {
                    let (current, peak) = (Arc::clone(&c), Arc::clone(&p));
                    async move {
                        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        current.fetch_sub(1, Ordering::SeqCst);
                    }
                },
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_tasks_enqueued_by_tasks_extend_the_run() {
        let (scheduler, frontier) = create_scheduler(2);
        frontier.add_url("http://a.test/0", 0);

        let spawner = Arc::clone(&frontier);
        let report = scheduler
            .run(
                move |task| {
                    let frontier = Arc::clone(&spawner);
                    async move {
                        let depth: usize = task.url.rsplit('/').next().unwrap().parse().unwrap();
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        if depth < 5 {
                            frontier.add_if_unseen(format!("http://a.test/{}", depth + 1), 0);
                        }
                    }
                },
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(report.dispatched, 6);
        assert_eq!(frontier.seen_count(), 6);
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_stop_pool() {
        let (scheduler, frontier) = create_scheduler(2);
        for i in 0..4 {
            frontier.add_url(format!("http://a.test/{}", i), 0);
        }

        let report = scheduler
            .run(
                |task| async move {
                    if task.url.ends_with("/1") {
                        panic!("boom");
                    }
                },
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(report.dispatched, 4);
        assert_eq!(report.panicked, 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_dispatch() {
        let (scheduler, frontier) = create_scheduler(1);
        for i in 0..5 {
            frontier.add_url(format!("http://a.test/{}", i), 0);
        }

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let report = scheduler
            .run(
                move |_| {
                    let trigger = trigger.clone();
                    async move {
                        trigger.cancel();
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                },
                &cancel,
            )
            .await;

        assert!(report.cancelled);
        assert_eq!(report.dispatched, 1);
        assert_eq!(report.abandoned, 4);
    }
}
