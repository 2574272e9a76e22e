use anchor_lang::prelude::*;

use crate::{context::Invocation, errors::*, events::*};

/// Move the signer's shares to `to`
pub fn transfer(inv: &mut Invocation<'_>, to: Pubkey, shares: u64) -> Result<()> {
    let from = inv.signer;
    move_shares(inv, from, to, shares)
}

/// Move `from`'s shares to `to`, spending the signer's allowance
pub fn transfer_from(inv: &mut Invocation<'_>, from: Pubkey, to: Pubkey, shares: u64) -> Result<()> {
    let spender = inv.signer;
    inv.state.shares.spend_allowance(&from, &spender, shares)?;
    move_shares(inv, from, to, shares)
}

pub fn approve(inv: &mut Invocation<'_>, spender: Pubkey, shares: u64) -> Result<()> {
    let owner = inv.signer;
    set_allowance(inv, owner, spender, shares)
}

pub fn increase_allowance(inv: &mut Invocation<'_>, spender: Pubkey, shares: u64) -> Result<()> {
    let owner = inv.signer;
    let current = inv.state.shares.allowance(&owner, &spender);
    let updated = current.checked_add(shares).ok_or(VaultError::MathOverflow)?;
    set_allowance(inv, owner, spender, updated)
}

pub fn decrease_allowance(inv: &mut Invocation<'_>, spender: Pubkey, shares: u64) -> Result<()> {
    let owner = inv.signer;
    let current = inv.state.shares.allowance(&owner, &spender);
    let updated = current
        .checked_sub(shares)
        .ok_or(VaultError::InsufficientAllowance)?;
    set_allowance(inv, owner, spender, updated)
}

fn move_shares(inv: &mut Invocation<'_>, from: Pubkey, to: Pubkey, shares: u64) -> Result<()> {
    require!(
        to != Pubkey::default() && to != inv.vault,
        VaultError::ZeroAddress
    );

    inv.state.shares.transfer(&from, &to, shares)?;

    emit!(SharesTransferred {
        vault: inv.vault,
        from,
        to,
        shares,
    });
    Ok(())
}

fn set_allowance(inv: &mut Invocation<'_>, owner: Pubkey, spender: Pubkey, shares: u64) -> Result<()> {
    require!(spender != Pubkey::default(), VaultError::ZeroAddress);

    inv.state.shares.approve(&owner, &spender, shares);

    emit!(SharesApproved {
        vault: inv.vault,
        owner,
        spender,
        shares,
    });
    Ok(())
}
