use anchor_lang::prelude::*;

use crate::{
    context::Invocation,
    errors::*,
    events::*,
    math::{self, Rounding},
    state::blended_unlock_period,
};

/// Realise a strategy's gain or loss against its recorded debt
///
/// Fees are charged by burning shares and re-issuing them to the fee
/// recipients; profit (plus any refund) is minted to the vault as locked
/// shares that unlock linearly. Returns `(gain, loss)`.
pub fn handler(inv: &mut Invocation<'_>, strategy_key: Pubkey) -> Result<(u64, u64)> {
    inv.require_authority()?;

    let current_debt = inv.state.active_strategy_mut(&strategy_key)?.current_debt;
    let strategy = inv.strategy_handle(&strategy_key)?;

    inv.burn_unlocked_shares()?;

    let strategy_assets = strategy.convert_to_assets(strategy.balance_of(&inv.vault));
    let (gain, loss) = if strategy_assets > current_debt {
        (strategy_assets - current_debt, 0)
    } else {
        (0, current_debt - strategy_assets)
    };

    // Fee policy
    let mut total_fees = 0;
    let mut total_refunds = 0;
    let mut protocol_fees = 0;
    let mut protocol_fee_recipient = Pubkey::default();
    let accountant = inv.links.accountant.clone();
    if let Some(accountant) = &accountant {
        (total_fees, total_refunds) = accountant.report(&strategy_key, gain, loss)?;

        if total_fees > 0 {
            if let Some(registry) = &inv.links.fee_registry {
                let (protocol_fee_bps, recipient) = registry.protocol_fee_config();
                // Without a recipient the protocol share stays with the accountant
                if protocol_fee_bps > 0 && recipient != Pubkey::default() {
                    protocol_fees = math::bps_of(total_fees, protocol_fee_bps)?;
                    protocol_fee_recipient = recipient;
                }
            }
        }
    }

    // Share amounts priced before any totals move
    let mut shares_to_burn = 0;
    let mut accountant_fees_shares = 0;
    let mut protocol_fees_shares = 0;
    let loss_and_fees = loss.checked_add(total_fees).ok_or(VaultError::MathOverflow)?;
    if loss_and_fees > 0 {
        shares_to_burn = inv.convert_to_shares(loss_and_fees, Rounding::Up)?;
        if total_fees > 0 {
            accountant_fees_shares =
                inv.convert_to_shares(total_fees - protocol_fees, Rounding::Down)?;
            if protocol_fees > 0 {
                protocol_fees_shares = inv.convert_to_shares(protocol_fees, Rounding::Down)?;
            }
        }
    }

    // Refunds, capped by what the accountant can actually pay
    if let Some(accountant) = accountant.as_ref().filter(|_| total_refunds > 0) {
        let accountant_key = accountant.key();
        total_refunds = total_refunds
            .min(inv.asset.balance_of(&accountant_key))
            .min(inv.asset.allowance(&accountant_key, &inv.vault));

        if total_refunds > 0 {
            inv.asset
                .transfer_from(&inv.vault, &accountant_key, &inv.vault, total_refunds)?;
            inv.state.total_idle = inv
                .state
                .total_idle
                .checked_add(total_refunds)
                .ok_or(VaultError::MathOverflow)?;
        }
    }

    // Record the gain, then lock it (with refunds) as vault-owned shares
    if gain > 0 {
        inv.state.active_strategy_mut(&strategy_key)?.current_debt = current_debt
            .checked_add(gain)
            .ok_or(VaultError::MathOverflow)?;
        inv.state.total_debt = inv
            .state
            .total_debt
            .checked_add(gain)
            .ok_or(VaultError::MathOverflow)?;
    }

    let vault = inv.vault;
    let profit_max_unlock_time = inv.state.profit_max_unlock_time;
    let mut newly_locked_shares = 0;
    let gain_and_refunds = gain
        .checked_add(total_refunds)
        .ok_or(VaultError::MathOverflow)?;
    if gain_and_refunds > 0 && profit_max_unlock_time != 0 {
        newly_locked_shares = inv.issue_shares_for_amount(gain_and_refunds, &vault)?;
    }

    if loss > 0 {
        inv.state.active_strategy_mut(&strategy_key)?.current_debt = current_debt - loss;
        inv.state.total_debt = inv
            .state
            .total_debt
            .checked_sub(loss)
            .ok_or(VaultError::MathOverflow)?;
    }

    let mut previously_locked_shares =
        inv.state.shares.balance_of(&vault) - newly_locked_shares;

    // Absorb loss and fees from the newly locked shares first, then older ones
    if shares_to_burn > 0 {
        shares_to_burn = shares_to_burn.min(previously_locked_shares + newly_locked_shares);
        inv.burn_shares(shares_to_burn, &vault)?;

        let shares_not_to_lock = shares_to_burn.min(newly_locked_shares);
        newly_locked_shares -= shares_not_to_lock;
        previously_locked_shares -= shares_to_burn - shares_not_to_lock;
    }

    if accountant_fees_shares > 0 {
        if let Some(accountant) = &accountant {
            inv.issue_shares(accountant_fees_shares, &accountant.key())?;
        }
    }
    if protocol_fees_shares > 0 {
        inv.issue_shares(protocol_fees_shares, &protocol_fee_recipient)?;
    }

    // Blend the remaining schedule with the full period for new shares
    let total_locked_shares = previously_locked_shares + newly_locked_shares;
    if total_locked_shares > 0 {
        let previously_locked_remaining = inv.state.profit_unlock.remaining(inv.now);
        let new_period = blended_unlock_period(
            previously_locked_shares,
            previously_locked_remaining,
            newly_locked_shares,
            profit_max_unlock_time,
        )?;
        let now = inv.now;
        inv.state
            .profit_unlock
            .relock(total_locked_shares, new_period, now)?;
    } else {
        inv.state.profit_unlock.profit_unlocking_rate = 0;
    }

    let now = inv.now;
    let strategy_params = inv.state.active_strategy_mut(&strategy_key)?;
    strategy_params.last_report = now;
    let reported_debt = strategy_params.current_debt;

    // Fees were paid by dilution: report their value at the new price
    if loss_and_fees > gain_and_refunds || profit_max_unlock_time == 0 {
        total_fees = inv.convert_to_assets(
            accountant_fees_shares.saturating_add(protocol_fees_shares),
            Rounding::Down,
        )?;
    }

    emit!(StrategyReported {
        vault,
        strategy: strategy_key,
        gain,
        loss,
        current_debt: reported_debt,
        protocol_fees,
        total_fees,
        total_refunds,
        timestamp: now,
    });

    Ok((gain, loss))
}
