//! Per-request database statement counter.
//!
//! A counter is created for each inbound request and handed explicitly to
//! every service call made on its behalf. Clones share one underlying count,
//! so work moved onto spawned tasks still lands on the owning request.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use metrics::counter;

#[derive(Debug, Clone, Default)]
pub struct QueryCounter {
    statements: Arc<AtomicU64>,
}

impl QueryCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one executed statement.
    pub fn record(&self) {
        self.statements.fetch_add(1, Ordering::Relaxed);
        counter!("quillpost_db_statements_total").increment(1);
    }

    pub fn get(&self) -> u64 {
        self.statements.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.statements.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_count() {
        let counter = QueryCounter::new();
        let handle = counter.clone();
        handle.record();
        handle.record();
        assert_eq!(counter.get(), 2);

        counter.reset();
        assert_eq!(handle.get(), 0);
    }

    #[test]
    fn separate_counters_are_isolated() {
        let first = QueryCounter::new();
        let second = QueryCounter::new();
        first.record();
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 0);
    }

    #[tokio::test]
    async fn spawned_work_counts_toward_its_request() {
        let request_a = QueryCounter::new();
        let request_b = QueryCounter::new();

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let a = request_a.clone();
            tasks.push(tokio::spawn(async move {
                tokio::task::yield_now().await;
                a.record();
            }));
        }
        let b = request_b.clone();
        tasks.push(tokio::spawn(async move { b.record() }));

        for task in tasks {
            task.await.expect("task completes");
        }

        assert_eq!(request_a.get(), 4);
        assert_eq!(request_b.get(), 1);
    }
}
