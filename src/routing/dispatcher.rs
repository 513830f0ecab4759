//! The live, swappable dispatch table.
//!
//! # Design Decisions
//! - `ArcSwap` holds the current table: readers do a lock-free load,
//!   the reload coordinator is the single writer
//! - A request resolves against exactly one table and releases it before
//!   any delay or body write, so retired tables are dropped promptly
//! - Publishing is the only side effect of a reload

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::routing::matcher::QueryParams;
use crate::routing::router::DispatchTable;
use crate::routing::selector::{NotFound, ResolvedResponse};

/// Holds the table currently used to answer requests.
pub struct Dispatcher {
    current: ArcSwap<DispatchTable>,
    generation: AtomicU64,
}

impl Dispatcher {
    /// Create a dispatcher serving `initial` as generation 1.
    pub fn new(mut initial: DispatchTable) -> Self {
        initial.set_generation(1);
        Self {
            current: ArcSwap::from_pointee(initial),
            generation: AtomicU64::new(1),
        }
    }

    /// Atomically replace the current table. Returns the retired one.
    pub fn publish(&self, mut table: DispatchTable) -> Arc<DispatchTable> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        table.set_generation(generation);

        let paths = table.len();
        let previous = self.current.swap(Arc::new(table));

        tracing::debug!(
            generation,
            previous_generation = previous.generation(),
            paths,
            "Dispatch table published"
        );
        previous
    }

    /// The table as of now. Holding it keeps it alive past a reload.
    pub fn snapshot(&self) -> Arc<DispatchTable> {
        self.current.load_full()
    }

    /// Generation of the current table.
    pub fn generation(&self) -> u64 {
        self.current.load().generation()
    }

    /// Resolve a request against the current table.
    pub fn handle(
        &self,
        path: &str,
        method: &str,
        params: &QueryParams,
    ) -> Result<ResolvedResponse, NotFound> {
        let table = self.current.load();
        table.resolve(path, method, params)
    }

    /// Resolve a request, then wait out its configured delay.
    ///
    /// The table is released before sleeping; only this request is delayed.
    pub async fn serve(
        &self,
        path: &str,
        method: &str,
        params: &QueryParams,
    ) -> Result<ResolvedResponse, NotFound> {
        let outcome = self.handle(path, method, params);

        if let Ok(response) = &outcome {
            if !response.delay.is_zero() {
                tokio::time::sleep(response.delay).await;
            }
        }

        outcome
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatchTable::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigurationSnapshot, RouteDeclaration};
    use crate::routing::router::{compile, CompileOptions};
    use std::time::{Duration, Instant};

    fn table_with_body(body: &str) -> DispatchTable {
        compile(
            &ConfigurationSnapshot::new(vec![
                RouteDeclaration::new("/v", "GET").with_body(body),
                RouteDeclaration::new("/slow", "GET").with_delay_ms(100).with_body(body),
            ]),
            CompileOptions::default(),
        )
    }

    #[test]
    fn test_publish_swaps_and_bumps_generation() {
        let dispatcher = Dispatcher::new(table_with_body("one"));
        assert_eq!(dispatcher.generation(), 1);

        let retired = dispatcher.publish(table_with_body("two"));
        assert_eq!(retired.generation(), 1);
        assert_eq!(dispatcher.generation(), 2);

        let res = dispatcher.handle("/v", "GET", &QueryParams::default()).unwrap();
        assert_eq!(res.body, "two");
    }

    #[test]
    fn test_snapshot_survives_publish() {
        let dispatcher = Dispatcher::new(table_with_body("old"));
        let held = dispatcher.snapshot();

        dispatcher.publish(table_with_body("new"));

        let params = QueryParams::default();
        assert_eq!(held.resolve("/v", "GET", &params).unwrap().body, "old");
        assert_eq!(dispatcher.handle("/v", "GET", &params).unwrap().body, "new");
    }

    #[test]
    fn test_unknown_path() {
        let dispatcher = Dispatcher::default();
        assert_eq!(
            dispatcher.handle("/v", "GET", &QueryParams::default()),
            Err(NotFound::UnknownPath)
        );
    }

    #[tokio::test]
    async fn test_delay_applies_only_to_its_request() {
        let dispatcher = Arc::new(Dispatcher::new(table_with_body("x")));

        let slow = {
            let d = dispatcher.clone();
            tokio::spawn(async move {
                let start = Instant::now();
                d.serve("/slow", "GET", &QueryParams::default()).await.unwrap();
                start.elapsed()
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        let start = Instant::now();
        dispatcher.serve("/v", "GET", &QueryParams::default()).await.unwrap();
        let fast_elapsed = start.elapsed();

        // A publish during the delay must not wait for the sleeping request.
        let start = Instant::now();
        dispatcher.publish(table_with_body("y"));
        assert!(start.elapsed() < Duration::from_millis(50));

        assert!(slow.await.unwrap() >= Duration::from_millis(100));
        assert!(fast_elapsed < Duration::from_millis(100));
    }

    #[test]
    fn test_concurrent_readers_see_whole_tables() {
        let dispatcher = Arc::new(Dispatcher::new(table_with_body("v0")));
        let params = QueryParams::default();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let d = dispatcher.clone();
                let params = params.clone();
                scope.spawn(move || {
                    for _ in 0..2_000 {
                        let table = d.snapshot();
                        let a = table.resolve("/v", "GET", &params).unwrap();
                        let b = table.resolve("/slow", "GET", &params).unwrap();
                        assert_eq!(a.body, b.body);
                    }
                });
            }

            for i in 1..=200 {
                dispatcher.publish(table_with_body(&format!("v{i}")));
            }
        });

        assert_eq!(dispatcher.generation(), 201);
    }
}
