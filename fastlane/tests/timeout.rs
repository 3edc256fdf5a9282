use fastlane::task;
use fastlane::time::{Elapsed, sleep, timeout};
use std::time::Duration;

#[fastlane::test]
async fn test_timeout_completes_before_deadline() {
    let handle = task::spawn(async {
        sleep(Duration::from_millis(10)).await;
        123
    });

    let result = timeout(Duration::from_millis(50), handle).await;

    assert_eq!(result, Ok(123), "Timeout should return Ok(123)");
}

#[fastlane::test]
async fn test_timeout_expires() {
    let handle = task::spawn(async {
        sleep(Duration::from_millis(100)).await;
        456
    });
    let result = timeout(Duration::from_millis(20), handle).await;

    assert!(
        result.is_err(),
        "Timeout should return an error when deadline is exceeded"
    );
}

#[fastlane::test]
async fn test_timeout_ready_future_wins() {
    let result = timeout(Duration::ZERO, async { "ready" }).await;

    assert_eq!(result, Ok("ready"));
}

#[test]
fn test_elapsed_message() {
    let runtime = fastlane::RuntimeBuilder::new().build();
    let err: Elapsed = runtime
        .block_on(timeout(Duration::from_millis(1), sleep(Duration::from_secs(1))))
        .unwrap_err();

    assert_eq!(err.to_string(), "deadline has elapsed");
}
