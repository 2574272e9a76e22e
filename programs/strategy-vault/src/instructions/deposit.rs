use anchor_lang::prelude::*;

use crate::{
    constants::*, context::Invocation, errors::*, events::*, math::Rounding,
};

/// Deposit `assets` from the signer and issue shares to `receiver`
///
/// `MAX_AMOUNT` deposits the signer's whole asset balance.
/// Returns the shares issued.
///
/// Security checklist:
/// ✅ 1. RECEIVER VALIDATION: Rejects the zero address and the vault itself
/// ✅ 2. LIMITS: Deposit limit or limit module checked before any transfer
/// ✅ 3. MATH SAFETY: Shares priced on the pre-deposit basis, rounded down
/// ✅ 4. BUSINESS LOGIC: Checks-effects-interactions pattern
/// ✅ 5. EVENTS: Emits Deposited
pub fn handler(inv: &mut Invocation<'_>, assets: u64, receiver: Pubkey) -> Result<u64> {
    // CHECKS
    require!(!inv.state.shutdown, VaultError::VaultShutdown);
    require_receiver(inv, &receiver)?;

    let assets = if assets == MAX_AMOUNT {
        inv.asset.balance_of(&inv.signer)
    } else {
        assets
    };
    require!(assets > 0, VaultError::ZeroAmount);
    require!(
        assets <= inv.max_deposit(&receiver),
        VaultError::ExceedDepositLimit
    );

    // EFFECTS
    inv.state.total_idle = inv
        .state
        .total_idle
        .checked_add(assets)
        .ok_or(VaultError::MathOverflow)?;
    let shares = inv.issue_shares_for_amount(assets, &receiver)?;
    require!(shares > 0, VaultError::CannotMintZero);

    // INTERACTIONS
    inv.asset
        .transfer_from(&inv.vault, &inv.signer, &inv.vault, assets)?;

    emit!(Deposited {
        vault: inv.vault,
        sender: inv.signer,
        owner: receiver,
        assets,
        shares,
        timestamp: inv.now,
    });

    Ok(shares)
}

/// Issue exactly `shares` to `receiver`, pulling the assets they cost
///
/// Returns the assets pulled from the signer.
pub fn mint_handler(inv: &mut Invocation<'_>, shares: u64, receiver: Pubkey) -> Result<u64> {
    // CHECKS
    require!(!inv.state.shutdown, VaultError::VaultShutdown);
    require_receiver(inv, &receiver)?;

    let assets = inv.convert_to_assets(shares, Rounding::Up)?;
    require!(assets > 0, VaultError::ZeroAmount);
    require!(
        assets <= inv.max_deposit(&receiver),
        VaultError::ExceedDepositLimit
    );

    // EFFECTS
    inv.state.total_idle = inv
        .state
        .total_idle
        .checked_add(assets)
        .ok_or(VaultError::MathOverflow)?;
    inv.issue_shares(shares, &receiver)?;

    // INTERACTIONS
    inv.asset
        .transfer_from(&inv.vault, &inv.signer, &inv.vault, assets)?;

    emit!(Deposited {
        vault: inv.vault,
        sender: inv.signer,
        owner: receiver,
        assets,
        shares,
        timestamp: inv.now,
    });

    Ok(assets)
}

fn require_receiver(inv: &Invocation<'_>, receiver: &Pubkey) -> Result<()> {
    require!(
        *receiver != Pubkey::default() && *receiver != inv.vault,
        VaultError::ZeroAddress
    );
    Ok(())
}
