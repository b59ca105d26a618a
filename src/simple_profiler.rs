//! Lightweight profiling of the decision pipeline using thread-local counters
//!
//! Enable with environment variable: BATTLESNAKE_PROFILE=1
//! Each worker thread accumulates locally; `merge_thread_local` folds its
//! counters into the global totals that `print_report` reads.
//! Sections opened while another one is running on the same thread are not
//! timed, so the report's percentages never overlap.

use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// Profiled sections, in report order
pub const CATEGORIES: [&str; 6] = [
    "graph_build",
    "regions",
    "area_center",
    "path_search",
    "trap_search",
    "space_delta",
];

const N: usize = CATEGORIES.len();

thread_local! {
    static LOCAL_TIME: RefCell<[u64; N]> = const { RefCell::new([0; N]) };
    static LOCAL_COUNT: RefCell<[usize; N]> = const { RefCell::new([0; N]) };
    static SECTION_OPEN: Cell<bool> = const { Cell::new(false) };
}

static GLOBAL_TIME: [AtomicU64; N] = [const { AtomicU64::new(0) }; N];
static GLOBAL_COUNT: [AtomicUsize; N] = [const { AtomicUsize::new(0) }; N];

#[inline]
pub fn is_profiling_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var("BATTLESNAKE_PROFILE").is_ok())
}

fn slot(category: &str) -> Option<usize> {
    CATEGORIES.iter().position(|c| *c == category)
}

/// Records the time between its creation and drop under `category`
pub struct ProfileGuard {
    start: Instant,
    slot: usize,
}

impl ProfileGuard {
    pub fn new(category: &'static str) -> Option<Self> {
        if !is_profiling_enabled() {
            return None;
        }
        Self::open(slot(category)?)
    }

    fn open(slot: usize) -> Option<Self> {
        if SECTION_OPEN.with(|open| open.replace(true)) {
            return None;
        }
        Some(ProfileGuard {
            start: Instant::now(),
            slot,
        })
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        SECTION_OPEN.with(|open| open.set(false));
        let elapsed_ns = self.start.elapsed().as_nanos() as u64;
        LOCAL_TIME.with(|t| t.borrow_mut()[self.slot] += elapsed_ns);
        LOCAL_COUNT.with(|c| c.borrow_mut()[self.slot] += 1);
    }
}

pub fn merge_thread_local() {
    if !is_profiling_enabled() {
        return;
    }

    LOCAL_TIME.with(|t| {
        for (i, v) in t.borrow_mut().iter_mut().enumerate() {
            GLOBAL_TIME[i].fetch_add(*v, Ordering::Relaxed);
            *v = 0;
        }
    });
    LOCAL_COUNT.with(|c| {
        for (i, v) in c.borrow_mut().iter_mut().enumerate() {
            GLOBAL_COUNT[i].fetch_add(*v, Ordering::Relaxed);
            *v = 0;
        }
    });
}

pub fn print_report(total_time_ms: u64) {
    if !is_profiling_enabled() {
        return;
    }

    let total_ns = total_time_ms * 1_000_000;

    eprintln!("\n═══════════════════════════════════════════════════════════");
    eprintln!("                 PERFORMANCE PROFILE");
    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!("Total Time: {}ms\n", total_time_ms);

    for (i, name) in CATEGORIES.iter().enumerate() {
        let time = GLOBAL_TIME[i].load(Ordering::Relaxed);
        let count = GLOBAL_COUNT[i].load(Ordering::Relaxed);
        let ms = time as f64 / 1_000_000.0;
        let pct = if total_ns > 0 { 100.0 * time as f64 / total_ns as f64 } else { 0.0 };
        let avg_us = if count > 0 { time as f64 / (count * 1000) as f64 } else { 0.0 };

        eprintln!(
            "  {:<12} {:>9.2}ms ({:>5.1}%) - {} calls, {:.2}µs avg",
            name, ms, pct, count, avg_us
        );
    }

    eprintln!("═══════════════════════════════════════════════════════════\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_a_slot() {
        for name in CATEGORIES {
            assert!(slot(name).is_some());
        }
        assert_eq!(slot("unknown"), None);
    }

    #[test]
    fn test_nested_sections_count_once() {
        let regions = slot("regions").unwrap();
        let path = slot("path_search").unwrap();

        let outer = ProfileGuard::open(regions);
        assert!(outer.is_some());
        assert!(ProfileGuard::open(path).is_none());
        drop(outer);

        LOCAL_COUNT.with(|c| {
            assert_eq!(c.borrow()[regions], 1);
            assert_eq!(c.borrow()[path], 0);
        });

        // closed again, so the next section is timed
        assert!(ProfileGuard::open(path).is_some());
    }
}
