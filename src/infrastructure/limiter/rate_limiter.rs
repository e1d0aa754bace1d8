use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::sleep;

/// Weighted two-window counter. The previous window's count decays linearly
/// as the current window advances.
#[derive(Debug)]
pub struct SlidingWindow {
    window_size: Duration,
    limit: u64,
    current_window_start: Instant,
    current_count: u64,
    prev_count: u64,
    last_seen: Instant,
}

impl SlidingWindow {
    fn new(window_size: Duration, limit: u64, now: Instant) -> Self {
        Self {
            window_size,
            limit,
            current_window_start: now,
            current_count: 0,
            prev_count: 0,
            last_seen: now,
        }
    }

    fn roll(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.current_window_start);
        if elapsed >= self.window_size * 2 {
            self.prev_count = 0;
            self.current_count = 0;
            self.current_window_start = now;
        } else if elapsed >= self.window_size {
            self.prev_count = self.current_count;
            self.current_count = 0;
            self.current_window_start += self.window_size;
        }
    }

    fn effective(&self, now: Instant) -> f64 {
        let elapsed = now.duration_since(self.current_window_start).as_secs_f64();
        let weight = (elapsed / self.window_size.as_secs_f64()).min(1.0);
        (self.prev_count as f64) * (1.0 - weight) + self.current_count as f64
    }

    fn allow(&mut self, now: Instant) -> RateDecision {
        self.last_seen = now;
        self.roll(now);

        let effective = self.effective(now);
        if effective + 1.0 <= self.limit as f64 {
            self.current_count += 1;
            return RateDecision {
                allowed: true,
                limit: self.limit,
                remaining: (self.limit as f64 - effective - 1.0).floor().max(0.0) as u64,
                retry_after: None,
            };
        }

        let window_end = self.current_window_start + self.window_size;
        let retry_after = window_end.saturating_duration_since(now).as_secs_f64().ceil() as u64;
        RateDecision {
            allowed: false,
            limit: self.limit,
            remaining: 0,
            retry_after: Some(retry_after.max(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    pub retry_after: Option<u64>,
}

type Key = String;

/// Per-key sliding windows shared across workers.
#[derive(Clone)]
pub struct RateLimiterStore {
    map: Arc<DashMap<Key, Arc<Mutex<SlidingWindow>>>>,
    window_size: Duration,
    limit: u64,
}

impl RateLimiterStore {
    pub fn new(limit: u64, window_size: Duration) -> Self {
        Self {
            map: Arc::new(DashMap::new()),
            window_size,
            limit,
        }
    }

    fn window(&self, key: &str, now: Instant) -> Arc<Mutex<SlidingWindow>> {
        if let Some(existing) = self.map.get(key) {
            return existing.clone();
        }
        self.map
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(SlidingWindow::new(self.window_size, self.limit, now))))
            .clone()
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let window = self.window(key, now);
        let mut window = window.lock();
        window.allow(now)
    }

    /// Drops keys idle for two full windows. Returns how many were removed.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let ttl = self.window_size * 2;
        let before = self.map.len();
        self.map
            .retain(|_, window| now.duration_since(window.lock().last_seen) <= ttl);
        before - self.map.len()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Spawns the periodic eviction loop on the current runtime.
    pub fn start_eviction(&self, interval: Duration) {
        let store = self.clone();
        tokio::spawn(async move {
            loop {
                sleep(interval).await;
                let removed = store.evict_idle(Instant::now());
                if removed > 0 {
                    tracing::debug!(removed, "Evicted idle rate limit windows");
                }
            }
        });
    }
}
