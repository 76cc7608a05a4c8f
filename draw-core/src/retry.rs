//! Error taxonomy and jittered-backoff retry helper, shared by the
//! writer, the LLM client, and (for classification purposes only, since
//! source polls never retry within a tick) the source pollers. Spec.md
//! section 7.

use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    TransientTransport,
    TerminalTransport,
    DataInvariant,
    IdempotentDuplicate,
    ParseFailure,
    StatefulInvariant,
    FatalConfig,
}

impl ErrorClass {
    pub fn is_retriable(&self) -> bool {
        matches!(self, ErrorClass::TransientTransport)
    }
}

/// Classifies a Postgres error for the writer's retry wrapper (spec.md
/// section 4.4, last paragraph): unique-violation is terminal (and
/// converted to success by the caller), deadlock/lost-connection are
/// transient, everything else is a terminal constraint failure.
pub fn classify_sqlx(err: &sqlx::Error) -> ErrorClass {
    match err {
        sqlx::Error::Database(db_err) => {
            // Postgres SQLSTATE: 23505 unique_violation, 40P01 deadlock_detected.
            match db_err.code().as_deref() {
                Some("23505") => ErrorClass::IdempotentDuplicate,
                Some("40P01") => ErrorClass::TransientTransport,
                _ => ErrorClass::DataInvariant,
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => ErrorClass::TransientTransport,
        // Decode/TypeNotFound/Protocol/Configuration and the like are
        // bugs or schema mismatches, not transient backend hiccups —
        // retrying them burns attempts on an error that will never
        // resolve itself.
        _ => ErrorClass::TerminalTransport,
    }
}

/// Classifies an HTTP status for source polls, the writer's collaborators,
/// and the LLM client's retry policy (spec.md section 4.8 step 4: 429,
/// 502, 503, 504 retriable).
pub fn classify_http_status(status: StatusCode) -> ErrorClass {
    match status.as_u16() {
        429 | 502 | 503 | 504 => ErrorClass::TransientTransport,
        400..=499 => ErrorClass::TerminalTransport,
        _ => ErrorClass::TransientTransport,
    }
}

/// Runs `op` with jittered exponential backoff: base 2s, ceiling 10s,
/// up to `max_attempts` tries. Retries only while `should_retry` holds
/// for the returned error; the first non-retriable error (or exhausted
/// attempts) is returned as-is.
pub async fn with_retry<T, E, F, Fut>(
    base: Duration,
    ceiling: Duration,
    max_attempts: u32,
    should_retry: impl Fn(&E) -> bool,
    mut op: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_attempts && should_retry(&e) => {
                let exp = base.saturating_mul(1 << (attempt - 1).min(8));
                let capped = exp.min(ceiling);
                let jitter_ms = rand::rng().random_range(0..=capped.as_millis() as u64 / 4 + 1);
                tokio::time::sleep(capped + Duration::from_millis(jitter_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_retriable_statuses() {
        assert!(classify_http_status(StatusCode::TOO_MANY_REQUESTS).is_retriable());
        assert!(classify_http_status(StatusCode::BAD_GATEWAY).is_retriable());
        assert!(!classify_http_status(StatusCode::NOT_FOUND).is_retriable());
        assert!(!classify_http_status(StatusCode::UNAUTHORIZED).is_retriable());
    }

    #[tokio::test]
    async fn retries_until_success() {
        let mut calls = 0;
        let result: std::result::Result<u32, &str> = with_retry(
            Duration::from_millis(1),
            Duration::from_millis(2),
            3,
            |_| true,
            || {
                calls += 1;
                async move {
                    if calls < 3 {
                        Err("transient")
                    } else {
                        Ok(42)
                    }
                }
            },
        )
        .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls, 3);
    }
}
