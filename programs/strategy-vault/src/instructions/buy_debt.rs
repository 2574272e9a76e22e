use anchor_lang::prelude::*;

use crate::{
    context::Invocation,
    errors::*,
    events::*,
    math::{self, Rounding},
};

/// Sell part of a strategy position to the signer at book value
///
/// The signer pays `amount` of asset (capped at the strategy's debt) into
/// idle and receives the matching fraction of the vault's strategy shares.
/// Lets an illiquid strategy be unwound without realising a loss.
pub fn handler(inv: &mut Invocation<'_>, strategy_key: Pubkey, amount: u64) -> Result<()> {
    // CHECKS
    inv.require_authority()?;

    let current_debt = inv.state.active_strategy_mut(&strategy_key)?.current_debt;
    let strategy = inv.strategy_handle(&strategy_key)?;

    require!(current_debt > 0, VaultError::NothingToBuy);
    require!(amount > 0, VaultError::ZeroAmount);
    let amount = amount.min(current_debt);

    let strategy_shares = math::mul_div(
        strategy.balance_of(&inv.vault),
        amount,
        current_debt,
        Rounding::Down,
    )?;
    require!(strategy_shares > 0, VaultError::CannotBuyZero);

    // EFFECTS
    let new_debt = current_debt - amount;
    inv.state.active_strategy_mut(&strategy_key)?.current_debt = new_debt;
    inv.state.total_debt = inv
        .state
        .total_debt
        .checked_sub(amount)
        .ok_or(VaultError::MathOverflow)?;
    inv.state.total_idle = inv
        .state
        .total_idle
        .checked_add(amount)
        .ok_or(VaultError::MathOverflow)?;

    // INTERACTIONS
    inv.asset
        .transfer_from(&inv.vault, &inv.signer, &inv.vault, amount)?;
    strategy.transfer(&inv.vault, &inv.signer, strategy_shares)?;

    emit!(DebtUpdated {
        vault: inv.vault,
        strategy: strategy_key,
        current_debt,
        new_debt,
    });
    emit!(DebtPurchased {
        vault: inv.vault,
        strategy: strategy_key,
        buyer: inv.signer,
        amount,
        strategy_shares,
    });

    Ok(())
}
