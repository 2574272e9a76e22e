use anchor_lang::prelude::*;

use crate::{constants::*, context::Invocation, errors::*, events::*, math};

/// Move a strategy's allocation toward `target_debt`
///
/// Decreasing pulls assets back (never leaving idle under the minimum, and
/// refusing while the strategy sits on unrealised losses). Increasing
/// deposits idle assets up to the strategy's max debt and deposit limit.
/// Ledgers always follow the measured balance change of the vault.
/// Returns the strategy's new debt.
///
/// Security checklist:
/// ✅ 1. AUTHORITY: Signer must be the vault authority
/// ✅ 2. ALLOWANCE: Strategy approved for exactly the deposit, reset to zero after
/// ✅ 3. SLIPPAGE: Shortfall on a pull bounded by `max_loss`
/// ✅ 4. EVENTS: Emits DebtUpdated
pub fn handler(
    inv: &mut Invocation<'_>,
    strategy_key: Pubkey,
    target_debt: u64,
    max_loss: u16,
) -> Result<u64> {
    inv.require_authority()?;
    require!(max_loss <= MAX_BPS, VaultError::InvalidMaxLoss);

    let params = *inv.state.active_strategy_mut(&strategy_key)?;
    let strategy = inv.strategy_handle(&strategy_key)?;
    let current_debt = params.current_debt;

    let mut new_debt = if inv.state.shutdown { 0 } else { target_debt };
    require!(new_debt != current_debt, VaultError::DebtUnchanged);

    if current_debt > new_debt {
        let mut assets_to_withdraw = current_debt - new_debt;

        // Pull extra to restore the idle floor, bounded by what is allocated
        let minimum_total_idle = inv.state.minimum_total_idle;
        let total_idle = inv.state.total_idle;
        if total_idle.saturating_add(assets_to_withdraw) < minimum_total_idle {
            assets_to_withdraw = (minimum_total_idle - total_idle).min(current_debt);
        }

        let withdrawable = strategy.convert_to_assets(strategy.max_redeem(&inv.vault));
        require!(withdrawable != 0, VaultError::NothingToWithdraw);
        if withdrawable < assets_to_withdraw {
            msg!(
                "Strategy {} limits withdrawal to {} of {}",
                strategy_key,
                withdrawable,
                assets_to_withdraw
            );
            assets_to_withdraw = withdrawable;
        }

        let unrealised_loss = inv.assess_share_of_unrealised_losses(
            strategy.as_ref(),
            current_debt,
            assets_to_withdraw,
        )?;
        require!(
            unrealised_loss == 0,
            VaultError::StrategyHasUnrealisedLosses
        );

        // INTERACTIONS
        let pre_balance = inv.asset_balance();
        inv.withdraw_from_strategy(strategy.as_ref(), assets_to_withdraw)?;
        let withdrawn = inv
            .asset_balance()
            .saturating_sub(pre_balance)
            .min(current_debt);

        if withdrawn < assets_to_withdraw && max_loss < MAX_BPS {
            require!(
                assets_to_withdraw - withdrawn <= math::bps_of(assets_to_withdraw, max_loss)?,
                VaultError::TooMuchLoss
            );
        } else if withdrawn > assets_to_withdraw {
            assets_to_withdraw = withdrawn;
        }

        // EFFECTS: a shortfall stays realised as a drop in total assets
        inv.state.total_idle = inv
            .state
            .total_idle
            .checked_add(withdrawn)
            .ok_or(VaultError::MathOverflow)?;
        inv.state.total_debt = inv
            .state
            .total_debt
            .checked_sub(assets_to_withdraw)
            .ok_or(VaultError::MathOverflow)?;
        new_debt = current_debt - assets_to_withdraw;
    } else {
        require!(
            new_debt <= params.max_debt,
            VaultError::TargetAboveMaxDebt
        );

        let max_deposit = strategy.max_deposit(&inv.vault);
        if max_deposit == 0 {
            msg!("Strategy {} accepts no deposits", strategy_key);
            return Ok(current_debt);
        }

        let minimum_total_idle = inv.state.minimum_total_idle;
        let total_idle = inv.state.total_idle;
        if total_idle <= minimum_total_idle {
            msg!("Idle {} at or below minimum {}", total_idle, minimum_total_idle);
            return Ok(current_debt);
        }

        let assets_to_deposit = (new_debt - current_debt)
            .min(max_deposit)
            .min(total_idle - minimum_total_idle);

        // INTERACTIONS: approve exactly, deposit, revoke the approval
        let pre_balance = inv.asset_balance();
        inv.asset
            .approve(&inv.vault, &strategy_key, assets_to_deposit)?;
        strategy.deposit(assets_to_deposit, &inv.vault)?;
        inv.asset.approve(&inv.vault, &strategy_key, 0)?;
        let deposited = pre_balance.saturating_sub(inv.asset_balance());

        // EFFECTS
        inv.state.total_idle = inv
            .state
            .total_idle
            .checked_sub(deposited)
            .ok_or(VaultError::MathOverflow)?;
        inv.state.total_debt = inv
            .state
            .total_debt
            .checked_add(deposited)
            .ok_or(VaultError::MathOverflow)?;
        new_debt = current_debt
            .checked_add(deposited)
            .ok_or(VaultError::MathOverflow)?;
    }

    inv.state.active_strategy_mut(&strategy_key)?.current_debt = new_debt;
    emit!(DebtUpdated {
        vault: inv.vault,
        strategy: strategy_key,
        current_debt,
        new_debt,
    });

    Ok(new_debt)
}
