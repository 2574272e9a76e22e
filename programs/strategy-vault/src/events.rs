use anchor_lang::prelude::*;

use crate::state::StrategyChangeType;

/// Event emitted when a new vault is initialized
#[event]
pub struct VaultInitialized {
    pub vault: Pubkey,
    pub authority: Pubkey,
    pub asset_mint: Pubkey,
    pub timestamp: i64,
}

/// Event emitted when assets are deposited
#[event]
pub struct Deposited {
    pub vault: Pubkey,
    pub sender: Pubkey,
    pub owner: Pubkey,
    pub assets: u64,
    pub shares: u64,
    pub timestamp: i64,
}

/// Event emitted when shares are burned for assets
#[event]
pub struct Withdrawn {
    pub vault: Pubkey,
    pub sender: Pubkey,
    pub receiver: Pubkey,
    pub owner: Pubkey,
    pub assets: u64,
    pub shares: u64,
    pub timestamp: i64,
}

/// Event emitted on every share balance change (mint: from = default, burn: to = default)
#[event]
pub struct SharesTransferred {
    pub vault: Pubkey,
    pub from: Pubkey,
    pub to: Pubkey,
    pub shares: u64,
}

#[event]
pub struct SharesApproved {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub spender: Pubkey,
    pub shares: u64,
}

/// Event emitted when a strategy is added or revoked
#[event]
pub struct StrategyChanged {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub change_type: StrategyChangeType,
    pub timestamp: i64,
}

/// Event emitted when a strategy report is processed
#[event]
pub struct StrategyReported {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub gain: u64,
    pub loss: u64,
    pub current_debt: u64,
    pub protocol_fees: u64,
    pub total_fees: u64,
    pub total_refunds: u64,
    pub timestamp: i64,
}

/// Event emitted whenever a strategy's recorded debt changes
#[event]
pub struct DebtUpdated {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub current_debt: u64,
    pub new_debt: u64,
}

#[event]
pub struct DebtPurchased {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub buyer: Pubkey,
    pub amount: u64,
    pub strategy_shares: u64,
}

#[event]
pub struct UpdatedMaxDebtForStrategy {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub new_max_debt: u64,
}

#[event]
pub struct UpdatedDefaultQueue {
    pub vault: Pubkey,
    pub new_default_queue: Vec<Pubkey>,
}

#[event]
pub struct UpdatedUseDefaultQueue {
    pub vault: Pubkey,
    pub use_default_queue: bool,
}

#[event]
pub struct UpdatedAccountant {
    pub vault: Pubkey,
    pub accountant: Option<Pubkey>,
}

#[event]
pub struct UpdatedDepositLimit {
    pub vault: Pubkey,
    pub deposit_limit: u64,
}

#[event]
pub struct UpdatedMinimumTotalIdle {
    pub vault: Pubkey,
    pub minimum_total_idle: u64,
}

#[event]
pub struct UpdatedProfitMaxUnlockTime {
    pub vault: Pubkey,
    pub profit_max_unlock_time: u64,
}

#[event]
pub struct UpdatedDepositLimitModule {
    pub vault: Pubkey,
    pub deposit_limit_module: Option<Pubkey>,
}

#[event]
pub struct UpdatedWithdrawLimitModule {
    pub vault: Pubkey,
    pub withdraw_limit_module: Option<Pubkey>,
}

/// Event emitted when the vault is shut down
#[event]
pub struct VaultShutdown {
    pub vault: Pubkey,
    pub timestamp: i64,
}
