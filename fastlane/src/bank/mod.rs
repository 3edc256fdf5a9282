//! A simulated account store.
//!
//! [`Account`] keeps a single balance behind an artificial round-trip
//! latency. Every read and write suspends the calling task, so two tasks
//! running an unguarded read-modify-write interleave and one update is lost.
//! Running the same operations through a [`Mutex`](crate::sync::Mutex) or
//! [`PriorityMutex`](crate::sync::PriorityMutex) keeps every update.
//!
//! # Examples
//!
//! ```rust
//! use fastlane::bank::Account;
//! use fastlane::sync::Mutex;
//!
//! let runtime = fastlane::RuntimeBuilder::new().build();
//! let account = Account::new(0);
//! let mutex = Mutex::new();
//!
//! runtime.block_on(async {
//!     fastlane::join!(
//!         mutex.run(|| account.sell(50)),
//!         mutex.run(|| account.sell(50)),
//!     );
//! });
//!
//! assert_eq!(account.snapshot(), 100);
//! ```

mod error;

pub use error::BankError;

use crate::time::sleep;

use std::cell::Cell;
use std::time::Duration;

/// A single balance stored behind a simulated round-trip.
#[derive(Debug)]
pub struct Account {
    balance: Cell<u64>,
    latency: Duration,
}

impl Account {
    /// Latency of every store access unless configured otherwise.
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(10);

    /// Opens an account holding `opening`, with the default latency.
    pub fn new(opening: u64) -> Self {
        Self::with_latency(opening, Self::DEFAULT_LATENCY)
    }

    /// Opens an account holding `opening` whose accesses take `latency`.
    pub fn with_latency(opening: u64, latency: Duration) -> Self {
        Self {
            balance: Cell::new(opening),
            latency,
        }
    }

    /// Reads the stored balance.
    pub async fn balance(&self) -> u64 {
        sleep(self.latency).await;
        self.balance.get()
    }

    /// Overwrites the stored balance.
    pub async fn set_balance(&self, value: u64) {
        sleep(self.latency).await;
        self.balance.set(value);
    }

    /// Current balance, without the simulated latency.
    pub fn snapshot(&self) -> u64 {
        self.balance.get()
    }

    /// Credits `amount` and returns the balance written.
    ///
    /// The read and the write are separate round-trips.
    pub async fn sell(&self, amount: u64) -> Result<u64, BankError> {
        let balance = self.balance().await;
        let updated = balance
            .checked_add(amount)
            .ok_or(BankError::Overflow { balance, amount })?;

        self.set_balance(updated).await;
        tracing::trace!(amount, balance = updated, "sold");

        Ok(updated)
    }

    /// Debits `amount` if the balance covers it and returns the balance
    /// written.
    pub async fn buy(&self, amount: u64) -> Result<u64, BankError> {
        let balance = self.balance().await;

        if balance < amount {
            return Err(BankError::InsufficientFunds {
                balance,
                requested: amount,
            });
        }

        let updated = balance - amount;

        self.set_balance(updated).await;
        tracing::trace!(amount, balance = updated, "bought");

        Ok(updated)
    }
}
