use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::VaultError,
    math::{self, Rounding},
};

pub mod shares;
pub mod strategy;
pub mod unlock;

pub use shares::*;
pub use strategy::*;
pub use unlock::*;

/// Parameters a vault is initialized with
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct VaultConfig {
    /// Key allowed to run administrative operations
    pub authority: Pubkey,

    /// Decimals of the asset mint (shares use the same)
    pub decimals: u8,

    /// Ceiling on total assets accepted through deposits
    pub deposit_limit: u64,

    /// Idle assets debt allocation must leave in the vault
    pub minimum_total_idle: u64,

    /// Seconds over which reported profit unlocks
    pub profit_max_unlock_time: u64,

    /// Ignore caller-supplied withdrawal queues
    pub use_default_queue: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            authority: Pubkey::default(),
            decimals: 6,
            deposit_limit: 0,
            minimum_total_idle: 0,
            profit_max_unlock_time: DEFAULT_PROFIT_MAX_UNLOCK_TIME,
            use_default_queue: false,
        }
    }
}

/// Complete accounting state of one vault
///
/// Invariants:
/// - `total_assets() == total_idle + total_debt`
/// - `total_debt` equals the sum of `current_debt` over `strategies`
/// - every key in `default_queue` is an active strategy, at most once
#[account]
#[derive(Debug, Default, PartialEq)]
pub struct VaultState {
    /// Authority for strategy management and configuration
    pub authority: Pubkey,

    /// Mint of the underlying asset token
    pub asset_mint: Pubkey,

    pub decimals: u8,

    /// Assets held directly by the vault
    pub total_idle: u64,

    /// Sum of `current_debt` across strategies
    pub total_debt: u64,

    pub minimum_total_idle: u64,

    pub deposit_limit: u64,

    pub shutdown: bool,

    pub use_default_queue: bool,

    pub profit_max_unlock_time: u64,

    pub profit_unlock: ProfitUnlock,

    pub shares: ShareLedger,

    pub strategies: BTreeMap<Pubkey, StrategyParams>,

    /// Order in which strategies are drawn from on withdrawal
    pub default_queue: Vec<Pubkey>,

    pub accountant: Option<Pubkey>,

    pub deposit_limit_module: Option<Pubkey>,

    pub withdraw_limit_module: Option<Pubkey>,

    /// Registry that deployed this vault (protocol fee source)
    pub fee_registry: Option<Pubkey>,
}

impl VaultState {
    pub fn new(asset_mint: Pubkey, config: &VaultConfig) -> Result<Self> {
        require!(
            config.profit_max_unlock_time <= MAX_PROFIT_UNLOCK_TIME,
            VaultError::InvalidUnlockTime
        );

        Ok(Self {
            authority: config.authority,
            asset_mint,
            decimals: config.decimals,
            deposit_limit: config.deposit_limit,
            minimum_total_idle: config.minimum_total_idle,
            profit_max_unlock_time: config.profit_max_unlock_time,
            use_default_queue: config.use_default_queue,
            ..Self::default()
        })
    }

    pub fn total_assets(&self) -> u64 {
        // Both sides are bounded by the asset mint supply
        self.total_idle.saturating_add(self.total_debt)
    }

    /// Profit shares held by `vault` that have unlocked by `now`
    pub fn unlocked_shares(&self, vault: &Pubkey, now: i64) -> u64 {
        self.profit_unlock
            .unlocked_shares(self.shares.balance_of(vault), now)
    }

    /// Outstanding supply net of profit shares that have already unlocked
    pub fn total_supply(&self, vault: &Pubkey, now: i64) -> u64 {
        self.shares.total_supply - self.unlocked_shares(vault, now)
    }

    pub fn convert_to_shares(
        &self,
        vault: &Pubkey,
        assets: u64,
        rounding: Rounding,
        now: i64,
    ) -> Result<u64> {
        math::convert_to_shares(
            assets,
            self.total_supply(vault, now),
            self.total_assets(),
            rounding,
        )
    }

    pub fn convert_to_assets(
        &self,
        vault: &Pubkey,
        shares: u64,
        rounding: Rounding,
        now: i64,
    ) -> Result<u64> {
        math::convert_to_assets(
            shares,
            self.total_supply(vault, now),
            self.total_assets(),
            rounding,
        )
    }

    /// Record for `strategy`, zeroed if it is not registered
    pub fn strategy(&self, strategy: &Pubkey) -> StrategyParams {
        self.strategies.get(strategy).copied().unwrap_or_default()
    }

    pub fn active_strategy_mut(&mut self, strategy: &Pubkey) -> Result<&mut StrategyParams> {
        self.strategies
            .get_mut(strategy)
            .filter(|params| params.is_active())
            .ok_or_else(|| error!(VaultError::InactiveStrategy))
    }

    /// Queue to walk for a withdrawal: the caller's unless empty or pinned
    pub fn withdrawal_queue(&self, requested: &[Pubkey]) -> Vec<Pubkey> {
        if requested.is_empty() || self.use_default_queue {
            self.default_queue.clone()
        } else {
            requested.to_vec()
        }
    }
}
