use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{FetchError, Result};

/// Cancellation signal plus an optional absolute deadline shared by every
/// request of one logical operation.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    cancel:   CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self { Self::default() }

    pub fn with_timeout(self, timeout: Duration) -> Self { self.with_deadline(Instant::now() + timeout) }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Pull the deadline in to at most `timeout` from now; an earlier
    /// deadline is kept.
    pub fn limit_timeout(self, timeout: Duration) -> Self {
        let at = Instant::now() + timeout;
        match self.deadline {
            Some(existing) if existing <= at => self,
            _ => self.with_deadline(at),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn deadline(&self) -> Option<Instant> { self.deadline }

    pub fn cancellation_token(&self) -> &CancellationToken { &self.cancel }

    pub fn is_cancelled(&self) -> bool { self.cancel.is_cancelled() }

    /// Drive `fut` until it finishes, the token fires, or the deadline passes.
    /// Cancellation wins over an expired deadline.
    pub async fn run<T, F>(&self, url: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(FetchError::Cancelled { url: url.to_string() }),
            _ = deadline => Err(FetchError::Timeout { url: url.to_string() }),
            out = fut => out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_before_deadline() {
        let ctx = RequestContext::new().with_timeout(Duration::from_secs(5));
        let out = ctx.run("u", async { Ok(7) }).await.unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_surfaces_timeout() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));
        let err = ctx
            .run("http://slow", async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(err.is_timeout(), "{err}");
    }

    #[tokio::test(start_paused = true)]
    async fn limit_timeout_keeps_earlier_deadline() {
        let early = RequestContext::new().with_timeout(Duration::from_secs(1));
        let at = early.deadline().unwrap();
        assert_eq!(early.limit_timeout(Duration::from_secs(30)).deadline(), Some(at));

        let open = RequestContext::new().limit_timeout(Duration::from_secs(30));
        assert!(open.deadline().is_some());
    }

    #[tokio::test]
    async fn cancellation_surfaces_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = RequestContext::new().with_cancellation(token).with_timeout(Duration::ZERO);
        let err = ctx.run("http://x", std::future::pending::<Result<()>>()).await.unwrap_err();
        assert!(err.is_cancelled(), "{err}");
    }
}
