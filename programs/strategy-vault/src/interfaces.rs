// Collaborator capability traits
//
// The vault only ever talks to these narrow interfaces. Any implementation
// may run arbitrary logic, including calling back into the vault, before it
// returns; the vault re-reads balances after every mutating call instead of
// trusting returned amounts. Ledgers the vault moves funds through are
// `Checkpointed` so a failed operation leaves them untouched too.

use anchor_lang::prelude::*;

/// Ledger whose writes can be undone when a vault operation fails
///
/// The vault opens a checkpoint on the asset token and on every linked
/// strategy before a mutating operation runs, then closes each one with
/// `commit` on success or `rollback` on failure. Checkpoints nest: each call
/// closes the most recently opened one.
pub trait Checkpointed {
    fn checkpoint(&self);

    /// Keep every write made since the matching `checkpoint`
    fn commit(&self);

    /// Undo every write made since the matching `checkpoint`
    fn rollback(&self);
}

/// Fungible asset ledger (the token program for the vault's asset mint)
pub trait AssetToken: Checkpointed {
    /// Mint of the asset this ledger tracks
    fn mint(&self) -> Pubkey;

    fn balance_of(&self, owner: &Pubkey) -> u64;

    fn allowance(&self, owner: &Pubkey, spender: &Pubkey) -> u64;

    fn approve(&self, owner: &Pubkey, spender: &Pubkey, amount: u64) -> Result<()>;

    /// Move `amount` out of `from`, authorised by `from` itself
    fn transfer(&self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()>;

    /// Move `amount` out of `from`, authorised by an allowance granted to `spender`
    fn transfer_from(&self, spender: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u64)
        -> Result<()>;
}

/// Yield-generating delegate the vault allocates debt to
///
/// Shape follows a tokenized vault: the vault holds strategy shares and
/// values them with the strategy's own pricing.
pub trait Strategy: Checkpointed {
    fn key(&self) -> Pubkey;

    /// Mint of the asset the strategy accepts
    fn asset(&self) -> Pubkey;

    /// Strategy shares held by `owner`
    fn balance_of(&self, owner: &Pubkey) -> u64;

    fn convert_to_assets(&self, shares: u64) -> u64;

    fn convert_to_shares(&self, assets: u64) -> u64;

    /// Shares that must be burned to receive `assets`
    fn preview_withdraw(&self, assets: u64) -> u64;

    fn max_deposit(&self, receiver: &Pubkey) -> u64;

    fn max_redeem(&self, owner: &Pubkey) -> u64;

    /// Pull `assets` from the caller (via allowance) and credit shares to `receiver`
    fn deposit(&self, assets: u64, receiver: &Pubkey) -> Result<u64>;

    /// Burn `shares` of `owner` and send the assets to `receiver`
    fn redeem(&self, shares: u64, receiver: &Pubkey, owner: &Pubkey) -> Result<u64>;

    /// Move strategy shares between holders
    fn transfer(&self, from: &Pubkey, to: &Pubkey, shares: u64) -> Result<()>;
}

/// Fee policy consulted on every strategy report
pub trait Accountant {
    fn key(&self) -> Pubkey;

    /// Returns `(total_fees, total_refunds)` in asset units
    fn report(&self, strategy: &Pubkey, gain: u64, loss: u64) -> Result<(u64, u64)>;
}

/// Optional override for the vault's deposit limit
pub trait DepositLimitModule {
    fn key(&self) -> Pubkey;

    fn available_deposit_limit(&self, receiver: &Pubkey) -> u64;
}

/// Optional override for the vault's withdraw limit
pub trait WithdrawLimitModule {
    fn key(&self) -> Pubkey;

    fn available_withdraw_limit(&self, owner: &Pubkey, max_loss: u16, strategies: &[Pubkey])
        -> u64;
}

/// Registry that deployed the vault; owns the protocol fee configuration
pub trait FeeRegistry {
    fn key(&self) -> Pubkey;

    /// Returns `(protocol_fee_bps, protocol_fee_recipient)`
    fn protocol_fee_config(&self) -> (u16, Pubkey);
}
