use std::future::ready;
use std::time::Duration;

use podcast_engine::{retry_async, HttpError, RetryPolicy};
use tokio::time::Instant;

fn disconnected() -> HttpError {
    HttpError::Disconnected("connection closed before message completed".into())
}

#[tokio::test(start_paused = true)]
async fn always_disconnecting_op_gets_exactly_max_attempts() {
    let policy = RetryPolicy::default();
    let mut calls = 0;
    let mut notices = Vec::new();
    let start = Instant::now();

    let result: Result<(), HttpError> = retry_async(
        &policy,
        HttpError::is_disconnect,
        |attempt, delay, _err| notices.push((attempt, delay)),
        |_| {
            calls += 1;
            ready(Err(disconnected()))
        },
    )
    .await;

    assert_eq!(result, Err(disconnected()));
    assert_eq!(calls, 5);
    assert_eq!(
        notices,
        (1..=4).map(|a| (a, Duration::from_secs(5))).collect::<Vec<_>>()
    );
    // Four pauses between five attempts.
    assert_eq!(start.elapsed(), Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn other_errors_are_not_retried() {
    let policy = RetryPolicy::default();
    let mut calls = 0;
    let start = Instant::now();

    let result: Result<(), HttpError> = retry_async(
        &policy,
        HttpError::is_disconnect,
        |_, _, _| panic!("must not retry"),
        |_| {
            calls += 1;
            ready(Err(HttpError::Payload("truncated".into())))
        },
    )
    .await;

    assert_eq!(result, Err(HttpError::Payload("truncated".into())));
    assert_eq!(calls, 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn success_after_transient_disconnects() {
    let policy = RetryPolicy {
        max_attempts: 5,
        delay: Duration::from_secs(2),
    };
    let mut seen = Vec::new();

    let result = retry_async(
        &policy,
        HttpError::is_disconnect,
        |_, _, _| {},
        |attempt| {
            seen.push(attempt);
            ready(if attempt < 3 {
                Err(disconnected())
            } else {
                Ok(attempt)
            })
        },
    )
    .await;

    assert_eq!(result, Ok(3));
    assert_eq!(seen, vec![1, 2, 3]);
}
