// Token-bucket rate limiter for the remote quality model: one token added
// per interval, callers sleep until one is available.

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

pub struct RateLimiter {
    inner: Mutex<Inner>,
}

struct Inner {
    interval: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    pub fn new(requests_per_second: f64) -> Self {
        let interval = Duration::from_secs_f64(1.0 / requests_per_second);
        Self {
            inner: Mutex::new(Inner {
                interval,
                last_request: None,
            }),
        }
    }

    pub async fn acquire(&self) {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();

        if let Some(last) = inner.last_request {
            let elapsed = now.duration_since(last);
            if elapsed < inner.interval {
                let sleep_time = inner.interval - elapsed;
                drop(inner);
                tokio::time::sleep(sleep_time).await;
                inner = self.inner.lock().await;
            }
        }

        inner.last_request = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_request_is_immediate() {
        let limiter = RateLimiter::new(1.0);
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn second_request_is_delayed() {
        let limiter = RateLimiter::new(5.0);
        limiter.acquire().await;
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(150));
    }
}
