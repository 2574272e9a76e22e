use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use anchor_lang::prelude::*;

use crate::{
    context::{Call, CollaboratorJournal, Invocation, Links, ReentrancyGuard},
    errors::VaultError,
    instructions,
    interfaces::*,
    math::Rounding,
    state::{StrategyParams, VaultConfig, VaultState},
};

/// One multi-strategy vault: committed accounting state plus collaborator handles
///
/// Every mutating entry point takes the non-reentrancy lock, runs the
/// instruction on a working copy and commits it only on success. Writes the
/// instruction caused on the asset token and strategy ledgers are committed
/// or rolled back with it. A
/// collaborator calling back into a mutating entry point mid-operation gets
/// `VaultError::Reentrancy`; views remain available and see the last
/// committed state.
pub struct Vault {
    key: Pubkey,
    asset: Rc<dyn AssetToken>,
    committed: RefCell<Committed>,
    entered: Cell<bool>,
}

struct Committed {
    state: VaultState,
    links: Links,
}

impl Vault {
    /// Create an empty vault for `asset`
    pub fn initialize(
        key: Pubkey,
        config: VaultConfig,
        asset: Rc<dyn AssetToken>,
        fee_registry: Option<Rc<dyn FeeRegistry>>,
        now: i64,
    ) -> Result<Self> {
        let state = instructions::initialize::handler(
            key,
            &config,
            asset.as_ref(),
            fee_registry.as_deref(),
            now,
        )?;
        let links = Links {
            fee_registry,
            ..Links::default()
        };

        Ok(Self::assemble(key, asset, state, links))
    }

    /// Rebuild a vault from persisted state and the handles it refers to
    pub fn load(
        key: Pubkey,
        state: VaultState,
        asset: Rc<dyn AssetToken>,
        links: Links,
    ) -> Result<Self> {
        require_keys_eq!(asset.mint(), state.asset_mint, VaultError::InvalidAsset);
        links.check_against(&state)?;

        Ok(Self::assemble(key, asset, state, links))
    }

    fn assemble(key: Pubkey, asset: Rc<dyn AssetToken>, state: VaultState, links: Links) -> Self {
        Self {
            key,
            asset,
            committed: RefCell::new(Committed { state, links }),
            entered: Cell::new(false),
        }
    }

    /// Run `op` atomically under the reentrancy lock
    ///
    /// Strategies registered by `op` itself are not journaled; registering
    /// one never writes to it.
    fn execute<T>(
        &self,
        call: &Call,
        op: impl FnOnce(&mut Invocation<'_>) -> Result<T>,
    ) -> Result<T> {
        let _guard = ReentrancyGuard::acquire(&self.entered)?;

        let mut inv = {
            let committed = self.committed.borrow();
            Invocation {
                vault: self.key,
                signer: call.signer,
                now: call.unix_timestamp,
                asset: self.asset.as_ref(),
                state: committed.state.clone(),
                links: committed.links.clone(),
            }
        };

        let journal = CollaboratorJournal::open(
            self.asset.as_ref(),
            inv.links.strategies.values().cloned().collect(),
        );

        let output = op(&mut inv)?;

        journal.commit();
        let Invocation { state, links, .. } = inv;
        *self.committed.borrow_mut() = Committed { state, links };
        Ok(output)
    }

    /// Evaluate a read-only query against a copy of the committed state
    fn view<T>(&self, now: i64, query: impl FnOnce(&Invocation<'_>) -> T) -> T {
        let committed = self.committed.borrow();
        let inv = Invocation {
            vault: self.key,
            signer: Pubkey::default(),
            now,
            asset: self.asset.as_ref(),
            state: committed.state.clone(),
            links: committed.links.clone(),
        };
        drop(committed);
        query(&inv)
    }

    // ---------------------------------------------------------------------
    // Deposits and withdrawals
    // ---------------------------------------------------------------------

    /// Returns the shares issued to `receiver`
    ///
    /// Security considerations:
    /// - Shares are priced before the asset is pulled
    /// - Rejects amounts over the deposit limit or its module
    /// - Asset pulled by allowance from the signer, never from `receiver`
    pub fn deposit(&self, call: &Call, assets: u64, receiver: Pubkey) -> Result<u64> {
        self.execute(call, |inv| {
            instructions::deposit::handler(inv, assets, receiver)
        })
    }

    /// Returns the assets pulled from the signer
    pub fn mint(&self, call: &Call, shares: u64, receiver: Pubkey) -> Result<u64> {
        self.execute(call, |inv| {
            instructions::deposit::mint_handler(inv, shares, receiver)
        })
    }

    /// Returns the shares burned from `owner`
    ///
    /// An empty `strategies` slice uses the default queue.
    ///
    /// Security considerations:
    /// - A signer other than `owner` spends its share allowance
    /// - Custom queues may only name active strategies, without duplicates
    /// - Assets received from strategies are measured, not taken on trust
    /// - Realised loss above `max_loss` fails the whole withdrawal
    pub fn withdraw(
        &self,
        call: &Call,
        assets: u64,
        receiver: Pubkey,
        owner: Pubkey,
        max_loss: u16,
        strategies: &[Pubkey],
    ) -> Result<u64> {
        self.execute(call, |inv| {
            instructions::withdraw::handler(inv, assets, receiver, owner, max_loss, strategies)
        })
    }

    /// Returns the assets sent to `receiver`
    pub fn redeem(
        &self,
        call: &Call,
        shares: u64,
        receiver: Pubkey,
        owner: Pubkey,
        max_loss: u16,
        strategies: &[Pubkey],
    ) -> Result<u64> {
        self.execute(call, |inv| {
            instructions::withdraw::redeem_handler(inv, shares, receiver, owner, max_loss, strategies)
        })
    }

    // ---------------------------------------------------------------------
    // Share token
    // ---------------------------------------------------------------------

    pub fn transfer(&self, call: &Call, to: Pubkey, shares: u64) -> Result<()> {
        self.execute(call, |inv| instructions::share_token::transfer(inv, to, shares))
    }

    pub fn transfer_from(&self, call: &Call, from: Pubkey, to: Pubkey, shares: u64) -> Result<()> {
        self.execute(call, |inv| {
            instructions::share_token::transfer_from(inv, from, to, shares)
        })
    }

    pub fn approve(&self, call: &Call, spender: Pubkey, shares: u64) -> Result<()> {
        self.execute(call, |inv| instructions::share_token::approve(inv, spender, shares))
    }

    pub fn increase_allowance(&self, call: &Call, spender: Pubkey, shares: u64) -> Result<()> {
        self.execute(call, |inv| {
            instructions::share_token::increase_allowance(inv, spender, shares)
        })
    }

    pub fn decrease_allowance(&self, call: &Call, spender: Pubkey, shares: u64) -> Result<()> {
        self.execute(call, |inv| {
            instructions::share_token::decrease_allowance(inv, spender, shares)
        })
    }

    // ---------------------------------------------------------------------
    // Strategy management
    // ---------------------------------------------------------------------

    /// Security considerations:
    /// - Authority-only
    /// - Strategy asset must match the vault asset
    /// - Starts with zero max debt; funds move only after `update_max_debt_for_strategy`
    pub fn add_strategy(&self, call: &Call, strategy: Rc<dyn Strategy>) -> Result<()> {
        self.execute(call, |inv| instructions::add_strategy::handler(inv, strategy))
    }

    /// Fails while the strategy still carries debt
    pub fn revoke_strategy(&self, call: &Call, strategy: Pubkey) -> Result<()> {
        self.execute(call, |inv| {
            instructions::revoke_strategy::handler(inv, strategy, false)
        })
    }

    /// Revoke and write any remaining debt off as a loss
    pub fn force_revoke_strategy(&self, call: &Call, strategy: Pubkey) -> Result<()> {
        self.execute(call, |inv| {
            instructions::revoke_strategy::handler(inv, strategy, true)
        })
    }

    pub fn update_max_debt_for_strategy(
        &self,
        call: &Call,
        strategy: Pubkey,
        new_max_debt: u64,
    ) -> Result<()> {
        self.execute(call, |inv| {
            instructions::add_strategy::update_max_debt_handler(inv, strategy, new_max_debt)
        })
    }

    /// Returns the strategy's new debt
    ///
    /// Security considerations:
    /// - Authority-only
    /// - Never draws idle below `minimum_total_idle`
    /// - Refuses to pull from a strategy sitting on unrealised losses
    /// - Strategy allowance is revoked after every deposit
    pub fn update_debt(
        &self,
        call: &Call,
        strategy: Pubkey,
        target_debt: u64,
        max_loss: u16,
    ) -> Result<u64> {
        self.execute(call, |inv| {
            instructions::update_debt::handler(inv, strategy, target_debt, max_loss)
        })
    }

    /// Security considerations:
    /// - Authority-only
    /// - Pays at most the recorded debt, priced from the strategy's own shares
    pub fn buy_debt(&self, call: &Call, strategy: Pubkey, amount: u64) -> Result<()> {
        self.execute(call, |inv| instructions::buy_debt::handler(inv, strategy, amount))
    }

    /// Returns `(gain, loss)`
    ///
    /// Security considerations:
    /// - Authority-only, strategy must be active
    /// - Gain is locked and released linearly, so a report cannot be
    ///   sandwiched for an instant price jump
    /// - Refunds are capped by the accountant's balance and allowance
    pub fn process_report(&self, call: &Call, strategy: Pubkey) -> Result<(u64, u64)> {
        self.execute(call, |inv| instructions::process_report::handler(inv, strategy))
    }

    /// Irreversible; deposits stop, withdrawals keep working
    pub fn shutdown(&self, call: &Call) -> Result<()> {
        self.execute(call, instructions::shutdown::handler)
    }

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------

    pub fn set_default_queue(&self, call: &Call, new_default_queue: Vec<Pubkey>) -> Result<()> {
        self.execute(call, |inv| {
            instructions::set_default_queue::handler(inv, new_default_queue)
        })
    }

    pub fn set_use_default_queue(&self, call: &Call, use_default_queue: bool) -> Result<()> {
        self.execute(call, |inv| {
            instructions::set_default_queue::use_default_queue_handler(inv, use_default_queue)
        })
    }

    pub fn set_accountant(&self, call: &Call, accountant: Option<Rc<dyn Accountant>>) -> Result<()> {
        self.execute(call, |inv| instructions::configure::set_accountant(inv, accountant))
    }

    pub fn set_deposit_limit(&self, call: &Call, deposit_limit: u64) -> Result<()> {
        self.execute(call, |inv| {
            instructions::configure::set_deposit_limit(inv, deposit_limit)
        })
    }

    pub fn set_deposit_limit_module(
        &self,
        call: &Call,
        module: Option<Rc<dyn DepositLimitModule>>,
    ) -> Result<()> {
        self.execute(call, |inv| {
            instructions::configure::set_deposit_limit_module(inv, module)
        })
    }

    pub fn set_withdraw_limit_module(
        &self,
        call: &Call,
        module: Option<Rc<dyn WithdrawLimitModule>>,
    ) -> Result<()> {
        self.execute(call, |inv| {
            instructions::configure::set_withdraw_limit_module(inv, module)
        })
    }

    pub fn set_minimum_total_idle(&self, call: &Call, minimum_total_idle: u64) -> Result<()> {
        self.execute(call, |inv| {
            instructions::configure::set_minimum_total_idle(inv, minimum_total_idle)
        })
    }

    pub fn set_profit_max_unlock_time(&self, call: &Call, profit_max_unlock_time: u64) -> Result<()> {
        self.execute(call, |inv| {
            instructions::configure::set_profit_max_unlock_time(inv, profit_max_unlock_time)
        })
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    pub fn key(&self) -> Pubkey {
        self.key
    }

    /// Snapshot of the committed state, suitable for persisting
    pub fn state(&self) -> VaultState {
        self.committed.borrow().state.clone()
    }

    pub fn total_idle(&self) -> u64 {
        self.committed.borrow().state.total_idle
    }

    pub fn total_debt(&self) -> u64 {
        self.committed.borrow().state.total_debt
    }

    pub fn total_assets(&self) -> u64 {
        self.committed.borrow().state.total_assets()
    }

    pub fn total_supply(&self, now: i64) -> u64 {
        self.committed.borrow().state.total_supply(&self.key, now)
    }

    pub fn unlocked_shares(&self, now: i64) -> u64 {
        self.committed.borrow().state.unlocked_shares(&self.key, now)
    }

    /// Share balance; the vault's own balance excludes already-unlocked profit
    pub fn balance_of(&self, owner: &Pubkey, now: i64) -> u64 {
        let committed = self.committed.borrow();
        let balance = committed.state.shares.balance_of(owner);
        if *owner == self.key {
            balance - committed.state.unlocked_shares(&self.key, now)
        } else {
            balance
        }
    }

    pub fn allowance(&self, owner: &Pubkey, spender: &Pubkey) -> u64 {
        self.committed.borrow().state.shares.allowance(owner, spender)
    }

    /// Asset value of one whole share (10^decimals base units)
    pub fn price_per_share(&self, now: i64) -> Result<u64> {
        let committed = self.committed.borrow();
        let one_share = 10u64
            .checked_pow(committed.state.decimals as u32)
            .ok_or(VaultError::MathOverflow)?;
        committed
            .state
            .convert_to_assets(&self.key, one_share, Rounding::Down, now)
    }

    pub fn convert_to_shares(&self, assets: u64, now: i64) -> Result<u64> {
        self.committed
            .borrow()
            .state
            .convert_to_shares(&self.key, assets, Rounding::Down, now)
    }

    pub fn convert_to_assets(&self, shares: u64, now: i64) -> Result<u64> {
        self.committed
            .borrow()
            .state
            .convert_to_assets(&self.key, shares, Rounding::Down, now)
    }

    pub fn preview_deposit(&self, assets: u64, now: i64) -> Result<u64> {
        self.convert_to_shares(assets, now)
    }

    pub fn preview_mint(&self, shares: u64, now: i64) -> Result<u64> {
        self.committed
            .borrow()
            .state
            .convert_to_assets(&self.key, shares, Rounding::Up, now)
    }

    pub fn preview_withdraw(&self, assets: u64, now: i64) -> Result<u64> {
        self.committed
            .borrow()
            .state
            .convert_to_shares(&self.key, assets, Rounding::Up, now)
    }

    pub fn preview_redeem(&self, shares: u64, now: i64) -> Result<u64> {
        self.convert_to_assets(shares, now)
    }

    pub fn max_deposit(&self, receiver: &Pubkey, now: i64) -> u64 {
        self.view(now, |inv| inv.max_deposit(receiver))
    }

    pub fn max_mint(&self, receiver: &Pubkey, now: i64) -> Result<u64> {
        self.view(now, |inv| {
            inv.convert_to_shares(inv.max_deposit(receiver), Rounding::Down)
        })
    }

    pub fn max_withdraw(
        &self,
        owner: &Pubkey,
        max_loss: u16,
        strategies: &[Pubkey],
        now: i64,
    ) -> Result<u64> {
        self.view(now, |inv| inv.max_withdraw(owner, max_loss, strategies))
    }

    pub fn max_redeem(
        &self,
        owner: &Pubkey,
        max_loss: u16,
        strategies: &[Pubkey],
        now: i64,
    ) -> Result<u64> {
        self.view(now, |inv| {
            let max_assets = inv.max_withdraw(owner, max_loss, strategies)?;
            let shares = inv.convert_to_shares(max_assets, Rounding::Up)?;
            Ok(shares.min(inv.state.shares.balance_of(owner)))
        })
    }

    /// Loss share a withdrawal of `assets_needed` from `strategy` would bear
    pub fn assess_share_of_unrealised_losses(
        &self,
        strategy: &Pubkey,
        assets_needed: u64,
    ) -> Result<u64> {
        self.view(0, |inv| {
            let params = inv.state.strategy(strategy);
            require!(params.is_active(), VaultError::InactiveStrategy);
            let handle = inv.strategy_handle(strategy)?;
            inv.assess_share_of_unrealised_losses(handle.as_ref(), params.current_debt, assets_needed)
        })
    }

    /// Record for `strategy`, zeroed when not registered
    pub fn strategy(&self, strategy: &Pubkey) -> StrategyParams {
        self.committed.borrow().state.strategy(strategy)
    }

    pub fn default_queue(&self) -> Vec<Pubkey> {
        self.committed.borrow().state.default_queue.clone()
    }

    pub fn is_shutdown(&self) -> bool {
        self.committed.borrow().state.shutdown
    }

    pub fn profit_unlocking_rate(&self) -> u128 {
        self.committed
            .borrow()
            .state
            .profit_unlock
            .profit_unlocking_rate
    }

    pub fn full_profit_unlock_date(&self) -> i64 {
        self.committed
            .borrow()
            .state
            .profit_unlock
            .full_profit_unlock_date
    }
}
