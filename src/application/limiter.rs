//! Minimum-interval admission gates.
//!
//! `DomainLimiter` keeps one rate window per domain; `GlobalLimiter` keeps a
//! single window shared by every domain. Both perform check-and-update as one
//! critical section so that concurrent callers for the same scope can never
//! both be admitted within one interval.

use crate::application::ports::{Clock, Storage};
use crate::domain::window::{interval_for, RateWindow, DOMAIN_BASE_PERIOD, GLOBAL_BASE_PERIOD};
use crate::infrastructure::storage::ShardedStorage;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Per-domain admission gate.
///
/// Windows are created on a domain's first admission and removed by
/// [`DomainLimiter::cleanup`] once they have been idle for more than twice the
/// interval.
#[derive(Debug)]
pub struct DomainLimiter<S = ShardedStorage<String, RateWindow>>
where
    S: Storage<String, RateWindow>,
{
    windows: S,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl DomainLimiter {
    /// Create a limiter allowing `per_five_minutes` notifications per domain.
    pub fn new(per_five_minutes: u32, clock: Arc<dyn Clock>) -> Self {
        Self::with_storage(ShardedStorage::new(), per_five_minutes, clock)
    }
}

impl<S> DomainLimiter<S>
where
    S: Storage<String, RateWindow>,
{
    /// Create a limiter over a custom storage backend.
    pub fn with_storage(windows: S, per_five_minutes: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows,
            clock,
            interval: interval_for(per_five_minutes, DOMAIN_BASE_PERIOD),
        }
    }

    /// Minimum spacing between two admissions for one domain.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Admit `domain` if its window is absent or has been open for at least
    /// one interval, recording the admission.
    ///
    /// A denied call leaves the stored timestamp unchanged.
    pub fn should_notify(&self, domain: &str) -> bool {
        let interval = self.interval;
        self.windows.upsert_if(domain.to_string(), |current| {
            // Read under the entry lock, same as the global gate
            let now = self.clock.now();
            match current {
                Some(window) if !window.is_open(now, interval) => None,
                _ => Some(RateWindow::opened_at(now)),
            }
        })
    }

    /// Remove windows idle for strictly longer than twice the interval.
    ///
    /// # Returns
    /// The number of windows removed
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let max_age = self.interval * 2;
        let before = self.windows.len();
        let mut removed = 0;
        self.windows.retain(|_, window| {
            let keep = !window.is_stale(now, max_age);
            if !keep {
                removed += 1;
            }
            keep
        });
        tracing::trace!(before, removed, "pruned domain rate windows");
        removed
    }

    /// Get the stored window for a domain.
    pub fn window(&self, domain: &str) -> Option<RateWindow> {
        self.windows.get_cloned(&domain.to_string())
    }

    /// Get the number of tracked domains.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Check if no domain is tracked.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Process-wide admission gate.
///
/// Open until its first admission.
#[derive(Debug)]
pub struct GlobalLimiter {
    window: Mutex<Option<RateWindow>>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl GlobalLimiter {
    /// Create a limiter allowing `per_minute` notifications in total.
    pub fn new(per_minute: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            window: Mutex::new(None),
            clock,
            interval: interval_for(per_minute, GLOBAL_BASE_PERIOD),
        }
    }

    /// Minimum spacing between two admissions across all domains.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Admit if the shared window is open, recording the admission.
    pub fn should_notify(&self) -> bool {
        // The guarded value is a plain timestamp, always consistent even after a panic
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();
        match window.as_mut() {
            Some(current) => current.try_admit(now, self.interval),
            None => {
                *window = Some(RateWindow::opened_at(now));
                true
            }
        }
    }

    /// Get the current shared window.
    pub fn window(&self) -> Option<RateWindow> {
        *self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::OnceLock;
    use std::time::Instant;

    fn domain_limiter(rate: u32) -> (DomainLimiter, MockClock) {
        let clock = MockClock::new(Instant::now());
        (DomainLimiter::new(rate, Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_domain_interval() {
        let (limiter, _) = domain_limiter(0);
        assert_eq!(limiter.interval(), Duration::from_secs(300));
        let (limiter, _) = domain_limiter(1);
        assert_eq!(limiter.interval(), Duration::from_secs(300));
        let (limiter, _) = domain_limiter(5);
        assert_eq!(limiter.interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_global_interval() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        assert_eq!(
            GlobalLimiter::new(0, clock.clone()).interval(),
            Duration::from_secs(60)
        );
        assert_eq!(
            GlobalLimiter::new(6, clock).interval(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_domain_first_admission_creates_window() {
        let (limiter, clock) = domain_limiter(1);
        assert!(limiter.is_empty());

        assert!(limiter.should_notify("a.com"));
        assert_eq!(limiter.len(), 1);
        assert_eq!(limiter.window("a.com").unwrap().last_admit(), clock.now());
    }

    #[test]
    fn test_domain_denial_keeps_timestamp() {
        let (limiter, clock) = domain_limiter(5);
        let first = clock.now();
        assert!(limiter.should_notify("a.com"));

        clock.advance(Duration::from_secs(59));
        assert!(!limiter.should_notify("a.com"));
        assert_eq!(limiter.window("a.com").unwrap().last_admit(), first);

        // Exactly one interval after the admission, not after the denial
        clock.advance(Duration::from_secs(1));
        assert!(limiter.should_notify("a.com"));
    }

    #[test]
    fn test_domains_are_independent() {
        let (limiter, _) = domain_limiter(1);

        assert!(limiter.should_notify("a.com"));
        assert!(limiter.should_notify("b.com"));
        assert!(!limiter.should_notify("a.com"));
        assert!(!limiter.should_notify("b.com"));
    }

    #[test]
    fn test_cleanup_removes_only_stale_windows() {
        let (limiter, clock) = domain_limiter(5);
        // interval = 60s, stale after strictly more than 120s

        assert!(limiter.should_notify("old.com"));
        clock.advance(Duration::from_secs(60));
        assert!(limiter.should_notify("edge.com"));
        clock.advance(Duration::from_secs(60));
        assert!(limiter.should_notify("fresh.com"));

        // old.com: 120s + 1ns, edge.com: 60s + 1ns, fresh.com: 1ns
        clock.advance(Duration::from_nanos(1));
        assert_eq!(limiter.cleanup(), 1);
        assert!(limiter.window("old.com").is_none());
        assert!(limiter.window("edge.com").is_some());
        assert!(limiter.window("fresh.com").is_some());

        // edge.com is now exactly 2 x interval old and stays
        clock.advance(Duration::from_secs(60) - Duration::from_nanos(1));
        assert_eq!(limiter.cleanup(), 0);
        assert_eq!(limiter.len(), 2);

        clock.advance(Duration::from_nanos(1));
        assert_eq!(limiter.cleanup(), 1);
        assert!(limiter.window("edge.com").is_none());
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let (limiter, clock) = domain_limiter(1);
        assert!(limiter.should_notify("a.com"));
        clock.advance(Duration::from_secs(601));

        assert_eq!(limiter.cleanup(), 1);
        assert_eq!(limiter.cleanup(), 0);
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_pruned_domain_is_admitted_again() {
        let (limiter, clock) = domain_limiter(1);
        assert!(limiter.should_notify("a.com"));
        clock.advance(Duration::from_secs(601));
        limiter.cleanup();

        assert!(limiter.should_notify("a.com"));
    }

    #[test]
    fn test_global_open_until_first_admission() {
        let clock = MockClock::new(Instant::now());
        let limiter = GlobalLimiter::new(1, Arc::new(clock.clone()));
        assert!(limiter.window().is_none());

        assert!(limiter.should_notify());
        assert!(!limiter.should_notify());

        clock.advance(Duration::from_secs(59));
        assert!(!limiter.should_notify());

        clock.advance(Duration::from_secs(1));
        assert!(limiter.should_notify());
        assert_eq!(limiter.window().unwrap().last_admit(), clock.now());
    }

    /// Clock counting how often it has been read.
    #[derive(Debug, Default)]
    struct CountingClock {
        reads: AtomicUsize,
        start: OnceLock<Instant>,
    }

    impl CountingClock {
        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl Clock for CountingClock {
        fn now(&self) -> Instant {
            self.reads.fetch_add(1, Ordering::SeqCst);
            *self.start.get_or_init(Instant::now)
        }
    }

    /// Storage recording how many clock reads happened before each entry lock.
    #[derive(Debug)]
    struct ObservingStorage {
        inner: ShardedStorage<String, RateWindow>,
        clock: Arc<CountingClock>,
        reads_at_lock: Mutex<Vec<usize>>,
    }

    impl Storage<String, RateWindow> for ObservingStorage {
        fn upsert_if<F>(&self, key: String, decide: F) -> bool
        where
            F: FnOnce(Option<&RateWindow>) -> Option<RateWindow>,
        {
            self.inner.upsert_if(key, |current| {
                self.reads_at_lock.lock().unwrap().push(self.clock.reads());
                decide(current)
            })
        }

        fn get_cloned(&self, key: &String) -> Option<RateWindow> {
            self.inner.get_cloned(key)
        }

        fn len(&self) -> usize {
            self.inner.len()
        }

        fn is_empty(&self) -> bool {
            self.inner.is_empty()
        }

        fn retain<F>(&self, f: F)
        where
            F: FnMut(&String, &mut RateWindow) -> bool,
        {
            self.inner.retain(f)
        }
    }

    #[test]
    fn test_domain_clock_read_under_entry_lock() {
        let clock = Arc::new(CountingClock::default());
        let storage = ObservingStorage {
            inner: ShardedStorage::new(),
            clock: Arc::clone(&clock),
            reads_at_lock: Mutex::new(Vec::new()),
        };
        let limiter = DomainLimiter::with_storage(storage, 1, clock.clone());

        assert!(limiter.should_notify("a.com"));
        assert!(!limiter.should_notify("a.com"));

        // No read before the lock is taken, exactly one inside it
        assert_eq!(*limiter.windows.reads_at_lock.lock().unwrap(), vec![0, 1]);
        assert_eq!(clock.reads(), 2);
    }

    #[test]
    fn test_concurrent_same_domain_admits_once() {
        use std::thread;

        let clock = MockClock::new(Instant::now());
        let limiter = Arc::new(DomainLimiter::new(1, Arc::new(clock)));
        let mut handles = vec![];

        for _ in 0..16 {
            let limiter = Arc::clone(&limiter);
            handles.push(thread::spawn(move || {
                (0..100).filter(|_| limiter.should_notify("hot.com")).count()
            }));
        }

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 1);
    }

    #[test]
    fn test_concurrent_global_admits_once() {
        use std::thread;

        let clock = MockClock::new(Instant::now());
        let limiter = Arc::new(GlobalLimiter::new(1, Arc::new(clock)));
        let mut handles = vec![];

        for _ in 0..16 {
            let limiter = Arc::clone(&limiter);
            handles.push(thread::spawn(move || {
                (0..100).filter(|_| limiter.should_notify()).count()
            }));
        }

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 1);
    }
}
