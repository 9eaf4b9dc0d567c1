//! Per-address attempt budget for `/api/login`.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct Window {
    started: Instant,
    attempts: u32,
}

/// Fixed-window login throttle keyed by client address.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<HashMap<IpAddr, Window>>>,
    pub max_attempts: u32,
    pub window: Duration,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_attempts,
            window,
        }
    }

    /// Count one attempt from `ip`. False once the window's budget is spent.
    pub async fn check_and_increment(&self, ip: IpAddr) -> bool {
        self.check_and_increment_at(ip, Instant::now()).await
    }

    async fn check_and_increment_at(&self, ip: IpAddr, now: Instant) -> bool {
        let mut windows = self.inner.lock().await;
        let window = windows.entry(ip).or_insert(Window { started: now, attempts: 0 });
        if now.saturating_duration_since(window.started) > self.window {
            *window = Window { started: now, attempts: 0 };
        }
        if window.attempts >= self.max_attempts {
            return false;
        }
        window.attempts += 1;
        true
    }

    /// Forget addresses whose last window started more than two windows ago.
    pub async fn cleanup(&self) {
        self.cleanup_at(Instant::now()).await;
    }

    async fn cleanup_at(&self, now: Instant) {
        let keep_for = self.window.saturating_mul(2);
        let mut windows = self.inner.lock().await;
        let before = windows.len();
        windows.retain(|_, window| now.saturating_duration_since(window.started) < keep_for);
        let dropped = before - windows.len();
        if dropped > 0 {
            tracing::debug!(dropped, "expired login throttle entries");
        }
    }

    pub async fn tracked(&self) -> usize {
        self.inner.lock().await.len()
    }
}
