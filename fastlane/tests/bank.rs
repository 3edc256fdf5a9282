use fastlane::bank::{Account, BankError};
use fastlane::join;
use fastlane::sync::Mutex;
use std::time::Duration;

#[fastlane::test]
async fn test_unguarded_sells_lose_updates() {
    let account = Account::new(0);

    let _ = join!(
        account.sell(50),
        account.sell(50),
        account.sell(50),
        account.sell(50)
    );

    assert_eq!(account.snapshot(), 50, "every sale read the same opening balance");
}

#[fastlane::test]
async fn test_guarded_sells_keep_every_update() {
    let account = Account::new(0);
    let mutex = Mutex::new();

    let _ = join!(
        mutex.run(|| account.sell(50)),
        mutex.run(|| account.sell(50)),
        mutex.run(|| account.sell(50)),
        mutex.run(|| account.sell(50))
    );

    assert_eq!(account.snapshot(), 200);
}

#[fastlane::test]
async fn test_buy_checks_funds() {
    let account = Account::with_latency(30, Duration::from_millis(1));

    let err = account.buy(50).await.unwrap_err();
    assert_eq!(
        err,
        BankError::InsufficientFunds {
            balance: 30,
            requested: 50
        }
    );
    assert_eq!(account.snapshot(), 30);

    assert_eq!(account.buy(20).await, Ok(10));
    assert_eq!(account.balance().await, 10);
}

#[fastlane::test]
async fn test_sell_reports_overflow() {
    let account = Account::with_latency(u64::MAX - 1, Duration::ZERO);

    let err = account.sell(2).await.unwrap_err();
    assert!(matches!(err, BankError::Overflow { amount: 2, .. }));
    assert_eq!(account.snapshot(), u64::MAX - 1);
}

#[fastlane::test]
async fn test_set_balance_waits_for_latency() {
    let account = Account::with_latency(0, Duration::from_millis(15));
    let start = std::time::Instant::now();

    account.set_balance(5).await;

    assert!(start.elapsed() >= Duration::from_millis(15));
    assert_eq!(account.snapshot(), 5);
}
