use thiserror::Error;

/// Errors returned by [`Account`](super::Account) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BankError {
    /// A purchase costs more than the balance it was checked against.
    #[error("insufficient funds: balance is {balance}, purchase costs {requested}")]
    InsufficientFunds {
        /// Balance read before the purchase.
        balance: u64,
        /// Cost of the purchase.
        requested: u64,
    },

    /// A sale would push the balance past `u64::MAX`.
    #[error("balance overflow: {balance} + {amount}")]
    Overflow {
        /// Balance read before the sale.
        balance: u64,
        /// Proceeds of the sale.
        amount: u64,
    },
}
