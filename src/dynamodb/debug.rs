use std::{
    env,
    future::Future,
    sync::OnceLock,
    time::{Duration, Instant},
};

use tracing::{Instrument, Span};

const DEBUG_DELAY_ENV: &str = "DUI_DEBUG_DYNAMO_DELAY_MS";

/// Sends one backend request inside `span`, logging its latency and, on
/// failure, the error as rendered by `describe`.
pub async fn send_dynamo_request<F, Fut, T, E, D>(span: Span, send: F, describe: D) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    D: FnOnce(&E) -> String,
{
    async move {
        debug_dynamo_delay().await;
        let started = Instant::now();
        let result = send().await;
        let elapsed_ms = started.elapsed().as_millis();
        match &result {
            Ok(_) => tracing::trace!(elapsed_ms, "request finished"),
            Err(err) => tracing::error!(elapsed_ms, error = %describe(err), "request failed"),
        }
        result
    }
    .instrument(span)
    .await
}

async fn debug_dynamo_delay() {
    if let Some(delay) = debug_dynamo_delay_duration() {
        tracing::trace!(
            delay_ms = delay.as_millis(),
            "Applying debug DynamoDB delay"
        );
        tokio::time::sleep(delay).await;
    }
}

fn debug_dynamo_delay_duration() -> Option<Duration> {
    static DELAY: OnceLock<Option<Duration>> = OnceLock::new();
    *DELAY.get_or_init(|| parse_delay(env::var(DEBUG_DELAY_ENV).ok().as_deref()))
}

fn parse_delay(raw: Option<&str>) -> Option<Duration> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u64>() {
        Ok(0) => None,
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            tracing::warn!(
                env = DEBUG_DELAY_ENV,
                value = %raw,
                "Invalid DynamoDB debug delay"
            );
            None
        }
    }
}
