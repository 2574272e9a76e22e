// Execution context shared by every vault instruction
//
// An instruction runs against a working copy of the vault state. The copy is
// committed only when the instruction returns Ok, so a failure anywhere
// leaves the vault exactly as it was (Solana transaction semantics). The
// asset token and strategy ledgers are checkpointed alongside it and rolled
// back on the same failure.

use std::{cell::Cell, collections::BTreeMap, rc::Rc};

use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::VaultError,
    events::SharesTransferred,
    interfaces::*,
    math::{self, Rounding},
    state::VaultState,
};

/// Who is calling and when
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Call {
    pub signer: Pubkey,
    pub unix_timestamp: i64,
}

impl Call {
    pub fn new(signer: Pubkey, unix_timestamp: i64) -> Self {
        Self {
            signer,
            unix_timestamp,
        }
    }
}

/// Handles to the collaborators the vault state refers to by key
#[derive(Clone, Default)]
pub struct Links {
    pub strategies: BTreeMap<Pubkey, Rc<dyn Strategy>>,
    pub accountant: Option<Rc<dyn Accountant>>,
    pub deposit_limit_module: Option<Rc<dyn DepositLimitModule>>,
    pub withdraw_limit_module: Option<Rc<dyn WithdrawLimitModule>>,
    pub fee_registry: Option<Rc<dyn FeeRegistry>>,
}

impl Links {
    /// Every key recorded in `state` must have a handle with the same key
    pub fn check_against(&self, state: &VaultState) -> Result<()> {
        for key in state.strategies.keys() {
            require!(
                self.strategies.get(key).is_some_and(|s| s.key() == *key),
                VaultError::CollaboratorMismatch
            );
        }
        require!(
            self.strategies.len() == state.strategies.len(),
            VaultError::CollaboratorMismatch
        );
        require!(
            self.accountant.as_ref().map(|a| a.key()) == state.accountant,
            VaultError::CollaboratorMismatch
        );
        require!(
            self.deposit_limit_module.as_ref().map(|m| m.key()) == state.deposit_limit_module,
            VaultError::CollaboratorMismatch
        );
        require!(
            self.withdraw_limit_module.as_ref().map(|m| m.key()) == state.withdraw_limit_module,
            VaultError::CollaboratorMismatch
        );
        require!(
            self.fee_registry.as_ref().map(|r| r.key()) == state.fee_registry,
            VaultError::CollaboratorMismatch
        );
        Ok(())
    }
}

/// Scoped non-reentrancy lock; released on drop, including on early return
pub struct ReentrancyGuard<'a> {
    entered: &'a Cell<bool>,
}

impl<'a> ReentrancyGuard<'a> {
    pub fn acquire(entered: &'a Cell<bool>) -> Result<Self> {
        require!(!entered.get(), VaultError::Reentrancy);
        entered.set(true);
        Ok(Self { entered })
    }
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.entered.set(false);
    }
}

/// Open checkpoints on the collaborator ledgers an operation can write to
///
/// Dropped without `commit` (an `Err` return or a panic), it rolls every
/// ledger back in reverse order.
pub struct CollaboratorJournal<'a> {
    asset: &'a dyn AssetToken,
    strategies: Vec<Rc<dyn Strategy>>,
    open: bool,
}

impl<'a> CollaboratorJournal<'a> {
    pub fn open(asset: &'a dyn AssetToken, strategies: Vec<Rc<dyn Strategy>>) -> Self {
        asset.checkpoint();
        for strategy in &strategies {
            strategy.checkpoint();
        }
        Self {
            asset,
            strategies,
            open: true,
        }
    }

    pub fn commit(mut self) {
        for strategy in self.strategies.iter().rev() {
            strategy.commit();
        }
        self.asset.commit();
        self.open = false;
    }
}

impl Drop for CollaboratorJournal<'_> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        msg!("Operation failed: rolling back collaborator ledgers");
        for strategy in self.strategies.iter().rev() {
            strategy.rollback();
        }
        self.asset.rollback();
    }
}

/// Working copy handed to instruction handlers
pub struct Invocation<'v> {
    /// Address of the vault (holder of idle assets and strategy shares)
    pub vault: Pubkey,
    pub signer: Pubkey,
    pub now: i64,
    pub asset: &'v dyn AssetToken,
    pub state: VaultState,
    pub links: Links,
}

impl<'v> Invocation<'v> {
    pub fn require_authority(&self) -> Result<()> {
        require_keys_eq!(self.signer, self.state.authority, VaultError::Unauthorized);
        Ok(())
    }

    /// Handle for a registered strategy
    pub fn strategy_handle(&self, strategy: &Pubkey) -> Result<Rc<dyn Strategy>> {
        self.links
            .strategies
            .get(strategy)
            .cloned()
            .ok_or_else(|| error!(VaultError::InactiveStrategy))
    }

    /// The vault's own asset balance as reported by the token ledger
    pub fn asset_balance(&self) -> u64 {
        self.asset.balance_of(&self.vault)
    }

    pub fn total_supply(&self) -> u64 {
        self.state.total_supply(&self.vault, self.now)
    }

    pub fn convert_to_shares(&self, assets: u64, rounding: Rounding) -> Result<u64> {
        self.state
            .convert_to_shares(&self.vault, assets, rounding, self.now)
    }

    pub fn convert_to_assets(&self, shares: u64, rounding: Rounding) -> Result<u64> {
        self.state
            .convert_to_assets(&self.vault, shares, rounding, self.now)
    }

    pub fn issue_shares(&mut self, shares: u64, recipient: &Pubkey) -> Result<()> {
        self.state.shares.mint(recipient, shares)?;
        emit!(SharesTransferred {
            vault: self.vault,
            from: Pubkey::default(),
            to: *recipient,
            shares,
        });
        Ok(())
    }

    /// Issue shares for `amount` that has already been added to the totals
    ///
    /// Returns 0 without minting when the amount is worth no shares.
    pub fn issue_shares_for_amount(&mut self, amount: u64, recipient: &Pubkey) -> Result<u64> {
        let new_shares =
            math::shares_for_deposited_amount(amount, self.total_supply(), self.state.total_assets())?;
        if new_shares == 0 {
            return Ok(0);
        }

        self.issue_shares(new_shares, recipient)?;
        Ok(new_shares)
    }

    pub fn burn_shares(&mut self, shares: u64, owner: &Pubkey) -> Result<()> {
        self.state.shares.burn(owner, shares)?;
        emit!(SharesTransferred {
            vault: self.vault,
            from: *owner,
            to: Pubkey::default(),
            shares,
        });
        Ok(())
    }

    /// Burn the profit shares that have unlocked since the last update
    pub fn burn_unlocked_shares(&mut self) -> Result<()> {
        let vault = self.vault;
        let unlocked = self.state.unlocked_shares(&vault, self.now);
        if unlocked == 0 {
            return Ok(());
        }

        if self.state.profit_unlock.full_profit_unlock_date > self.now {
            self.state.profit_unlock.last_profit_update = self.now;
        }
        self.burn_shares(unlocked, &vault)
    }

    /// Assets `receiver` may still deposit
    pub fn max_deposit(&self, receiver: &Pubkey) -> u64 {
        if *receiver == Pubkey::default() || *receiver == self.vault {
            return 0;
        }
        if let Some(module) = &self.links.deposit_limit_module {
            return module.available_deposit_limit(receiver);
        }
        if self.state.shutdown {
            return 0;
        }
        self.state
            .deposit_limit
            .saturating_sub(self.state.total_assets())
    }

    /// Assets `owner` could withdraw right now, given idle funds and the queue
    pub fn max_withdraw(&self, owner: &Pubkey, max_loss: u16, strategies: &[Pubkey]) -> Result<u64> {
        let max_assets =
            self.convert_to_assets(self.state.shares.balance_of(owner), Rounding::Down)?;

        if let Some(module) = &self.links.withdraw_limit_module {
            return Ok(module
                .available_withdraw_limit(owner, max_loss, strategies)
                .min(max_assets));
        }

        let mut have = self.state.total_idle;
        if max_assets <= have {
            return Ok(max_assets);
        }

        let mut loss: u64 = 0;
        for key in self.state.withdrawal_queue(strategies) {
            let params = self.state.strategy(&key);
            require!(params.is_active(), VaultError::InactiveStrategy);
            let strategy = self.strategy_handle(&key)?;

            let mut to_withdraw = (max_assets - have).min(params.current_debt);
            let mut unrealised_loss = self.assess_share_of_unrealised_losses(
                strategy.as_ref(),
                params.current_debt,
                to_withdraw,
            )?;

            let strategy_limit = strategy.convert_to_assets(strategy.max_redeem(&self.vault));
            if strategy_limit < to_withdraw - unrealised_loss {
                unrealised_loss =
                    math::mul_div(unrealised_loss, strategy_limit, to_withdraw, Rounding::Down)?;
                to_withdraw = strategy_limit + unrealised_loss;
            }

            if to_withdraw == 0 {
                continue;
            }

            if unrealised_loss > 0 && max_loss < MAX_BPS {
                let allowed = math::bps_of(have.saturating_add(to_withdraw), max_loss)?;
                if loss.saturating_add(unrealised_loss) > allowed {
                    break;
                }
            }

            have = have.saturating_add(to_withdraw);
            if have >= max_assets {
                break;
            }
            loss = loss.saturating_add(unrealised_loss);
        }

        Ok(have.min(max_assets))
    }

    /// Portion of `assets_needed` a withdrawer must bear because the
    /// strategy's live value has fallen below its recorded debt (rounded up)
    pub fn assess_share_of_unrealised_losses(
        &self,
        strategy: &dyn Strategy,
        current_debt: u64,
        assets_needed: u64,
    ) -> Result<u64> {
        let strategy_assets = strategy.convert_to_assets(strategy.balance_of(&self.vault));
        if strategy_assets >= current_debt || current_debt == 0 {
            return Ok(0);
        }

        let retained = math::mul_div(assets_needed, strategy_assets, current_debt, Rounding::Down)?;
        Ok(assets_needed - retained)
    }

    /// Redeem enough strategy shares to receive `assets`
    ///
    /// Callers measure what actually arrived; the return value of the
    /// strategy is ignored.
    pub fn withdraw_from_strategy(&self, strategy: &dyn Strategy, assets: u64) -> Result<()> {
        let shares = strategy
            .preview_withdraw(assets)
            .min(strategy.balance_of(&self.vault));
        strategy.redeem(shares, &self.vault, &self.vault)?;
        Ok(())
    }
}
