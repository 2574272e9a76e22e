// Constants for the Strategy Vault program

/// Basis-point denominator (100%)
pub const MAX_BPS: u16 = 10_000;

/// Fixed-point scale applied to the profit unlocking rate
pub const MAX_BPS_EXTENDED: u128 = 1_000_000_000_000;

/// Maximum number of strategies in the default withdrawal queue
pub const MAX_QUEUE_LENGTH: usize = 10;

/// Upper bound for `profit_max_unlock_time` (one year, in seconds)
pub const MAX_PROFIT_UNLOCK_TIME: u64 = 31_556_952;

/// Default unlock period for newly reported profit (ten days)
pub const DEFAULT_PROFIT_MAX_UNLOCK_TIME: u64 = 10 * 24 * 60 * 60;

/// Sentinel meaning "the whole balance" for amounts and "unlimited" for allowances
pub const MAX_AMOUNT: u64 = u64::MAX;
