use anchor_lang::prelude::*;

use crate::{
    constants::*,
    context::Invocation,
    errors::*,
    events::*,
    math::{self, Rounding},
    state::validate_queue,
};

/// Withdraw exactly `assets` (less any loss the withdrawer must bear)
///
/// Returns the shares burned from `owner`.
pub fn handler(
    inv: &mut Invocation<'_>,
    assets: u64,
    receiver: Pubkey,
    owner: Pubkey,
    max_loss: u16,
    strategies: &[Pubkey],
) -> Result<u64> {
    let shares = inv.convert_to_shares(assets, Rounding::Up)?;
    redeem_shares(inv, receiver, owner, assets, shares, max_loss, strategies)?;
    Ok(shares)
}

/// Burn exactly `shares` for their asset value
///
/// Returns the assets sent to `receiver`.
pub fn redeem_handler(
    inv: &mut Invocation<'_>,
    shares: u64,
    receiver: Pubkey,
    owner: Pubkey,
    max_loss: u16,
    strategies: &[Pubkey],
) -> Result<u64> {
    let assets = inv.convert_to_assets(shares, Rounding::Down)?;
    redeem_shares(inv, receiver, owner, assets, shares, max_loss, strategies)
}

/// Shared withdrawal path: source liquidity from idle, then from the queue
///
/// Every asset movement is measured from the vault's balance before and
/// after each strategy call. A strategy returning less than asked is a
/// realised loss borne by this withdrawer, checked against `max_loss`.
///
/// Security checklist:
/// ✅ 1. OWNER AUTHORISATION: Third-party signers spend the owner's allowance
/// ✅ 2. QUEUE VALIDATION: Custom queues checked for inactive and duplicate entries
/// ✅ 3. BALANCE MEASUREMENT: Strategy payouts read back from the token ledger
/// ✅ 4. SLIPPAGE: Total realised loss bounded by `max_loss`
/// ✅ 5. EVENTS: Emits DebtUpdated per strategy touched and Withdrawn
fn redeem_shares(
    inv: &mut Invocation<'_>,
    receiver: Pubkey,
    owner: Pubkey,
    assets: u64,
    shares: u64,
    max_loss: u16,
    strategies: &[Pubkey],
) -> Result<u64> {
    // CHECKS
    require!(receiver != Pubkey::default(), VaultError::ZeroAddress);
    require!(max_loss <= MAX_BPS, VaultError::InvalidMaxLoss);

    if inv.links.withdraw_limit_module.is_some() {
        require!(
            assets <= inv.max_withdraw(&owner, max_loss, strategies)?,
            VaultError::ExceedWithdrawLimit
        );
    }

    require!(shares > 0, VaultError::NoSharesToRedeem);
    require!(
        inv.state.shares.balance_of(&owner) >= shares,
        VaultError::InsufficientShares
    );

    if inv.signer != owner {
        let spender = inv.signer;
        inv.state.shares.spend_allowance(&owner, &spender, shares)?;
    }

    let mut requested_assets = assets;
    let mut curr_total_idle = inv.state.total_idle;

    if requested_assets > curr_total_idle {
        let queue = inv.state.withdrawal_queue(strategies);
        if !strategies.is_empty() && !inv.state.use_default_queue {
            validate_queue(&queue, &inv.state.strategies)?;
        }

        let mut curr_total_debt = inv.state.total_debt;
        let mut assets_needed = requested_assets - curr_total_idle;

        for key in queue {
            let current_debt = inv.state.active_strategy_mut(&key)?.current_debt;
            let strategy = inv.strategy_handle(&key)?;

            let mut assets_to_withdraw = assets_needed.min(current_debt);
            let max_withdraw = strategy.convert_to_assets(strategy.max_redeem(&inv.vault));

            let mut unrealised_loss = inv.assess_share_of_unrealised_losses(
                strategy.as_ref(),
                current_debt,
                assets_to_withdraw,
            )?;

            if unrealised_loss > 0 {
                // The strategy limit binds: shrink the loss share in proportion
                if max_withdraw < assets_to_withdraw - unrealised_loss {
                    let wanted = assets_to_withdraw - unrealised_loss;
                    unrealised_loss =
                        math::mul_div(unrealised_loss, max_withdraw, wanted, Rounding::Down)?;
                    assets_to_withdraw = max_withdraw + unrealised_loss;
                }

                assets_to_withdraw -= unrealised_loss;
                requested_assets -= unrealised_loss;
                assets_needed -= unrealised_loss;
                curr_total_debt = curr_total_debt
                    .checked_sub(unrealised_loss)
                    .ok_or(VaultError::MathOverflow)?;
            }

            assets_to_withdraw = assets_to_withdraw.min(max_withdraw);
            if assets_to_withdraw == 0 {
                // Nothing to pull, but the loss share is still realised
                if unrealised_loss > 0 {
                    let new_debt = current_debt - unrealised_loss;
                    inv.state.active_strategy_mut(&key)?.current_debt = new_debt;
                    emit!(DebtUpdated {
                        vault: inv.vault,
                        strategy: key,
                        current_debt,
                        new_debt,
                    });
                }
                msg!("Skipping strategy {}: nothing withdrawable", key);
                continue;
            }

            // INTERACTIONS: measure, never trust the returned amount
            let pre_balance = inv.asset_balance();
            inv.withdraw_from_strategy(strategy.as_ref(), assets_to_withdraw)?;
            let withdrawn = inv.asset_balance().saturating_sub(pre_balance);

            let remaining_debt = current_debt - unrealised_loss;
            let mut loss = 0;
            if withdrawn > assets_to_withdraw {
                // Surplus beyond the remaining debt is left unaccounted
                assets_to_withdraw = withdrawn.min(remaining_debt);
            } else if withdrawn < assets_to_withdraw {
                loss = assets_to_withdraw - withdrawn;
            }

            curr_total_idle = curr_total_idle
                .checked_add(assets_to_withdraw - loss)
                .ok_or(VaultError::MathOverflow)?;
            requested_assets = requested_assets
                .checked_sub(loss)
                .ok_or(VaultError::MathOverflow)?;
            curr_total_debt = curr_total_debt
                .checked_sub(assets_to_withdraw)
                .ok_or(VaultError::MathOverflow)?;

            let new_debt = remaining_debt - assets_to_withdraw;
            inv.state.active_strategy_mut(&key)?.current_debt = new_debt;
            emit!(DebtUpdated {
                vault: inv.vault,
                strategy: key,
                current_debt,
                new_debt,
            });

            if requested_assets <= curr_total_idle {
                break;
            }
            assets_needed = assets_needed.saturating_sub(assets_to_withdraw);
        }

        require!(
            curr_total_idle >= requested_assets,
            VaultError::InsufficientAssets
        );
        inv.state.total_debt = curr_total_debt;
    }

    // Slippage guard on the loss this withdrawer realised
    if assets > requested_assets && max_loss < MAX_BPS {
        require!(
            assets - requested_assets <= math::bps_of(assets, max_loss)?,
            VaultError::TooMuchLoss
        );
    }

    // EFFECTS
    inv.burn_shares(shares, &owner)?;
    inv.state.total_idle = curr_total_idle - requested_assets;

    // INTERACTIONS
    inv.asset.transfer(&inv.vault, &receiver, requested_assets)?;

    emit!(Withdrawn {
        vault: inv.vault,
        sender: inv.signer,
        receiver,
        owner,
        assets: requested_assets,
        shares,
        timestamp: inv.now,
    });

    Ok(requested_assets)
}
