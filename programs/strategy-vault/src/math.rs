use anchor_lang::prelude::*;

use crate::{constants::*, errors::VaultError};

/// Rounding direction for share/asset conversions
///
/// Deposits and redemptions round down, mints and withdrawals round up,
/// so the vault never hands out more value than it holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

/// `a * b / denominator` with a u128 intermediate and the requested rounding
pub fn mul_div(a: u64, b: u64, denominator: u64, rounding: Rounding) -> Result<u64> {
    require!(denominator != 0, VaultError::MathOverflow);

    let numerator = (a as u128)
        .checked_mul(b as u128)
        .ok_or(VaultError::MathOverflow)?;
    let denominator = denominator as u128;

    let mut quotient = numerator / denominator;
    if rounding == Rounding::Up && numerator % denominator != 0 {
        quotient += 1;
    }

    u64::try_from(quotient).map_err(|_| error!(VaultError::MathOverflow))
}

/// Convert an asset amount to shares at the current price
///
/// - `0` and the `MAX_AMOUNT` sentinel pass through unchanged
/// - Empty supply prices shares 1:1
/// - Zero assets with outstanding supply means the vault is dead: 0 shares
pub fn convert_to_shares(
    assets: u64,
    total_supply: u64,
    total_assets: u64,
    rounding: Rounding,
) -> Result<u64> {
    if assets == 0 || assets == MAX_AMOUNT {
        return Ok(assets);
    }
    if total_supply == 0 {
        return Ok(assets);
    }
    if total_assets == 0 {
        return Ok(0);
    }

    mul_div(assets, total_supply, total_assets, rounding)
}

/// Convert a share amount to assets at the current price
pub fn convert_to_assets(
    shares: u64,
    total_supply: u64,
    total_assets: u64,
    rounding: Rounding,
) -> Result<u64> {
    if shares == 0 || shares == MAX_AMOUNT {
        return Ok(shares);
    }
    if total_supply == 0 {
        return Ok(shares);
    }

    mul_div(shares, total_assets, total_supply, rounding)
}

/// Shares to issue for `amount` that has ALREADY been added to `total_assets`
///
/// The price is taken on the pre-deposit basis `total_assets - amount`.
/// When that basis is empty while shares are outstanding, issuing would
/// value existing holders at zero, so the call fails.
pub fn shares_for_deposited_amount(amount: u64, total_supply: u64, total_assets: u64) -> Result<u64> {
    if total_supply == 0 {
        return Ok(amount);
    }

    require!(total_assets > amount, VaultError::AmountTooHigh);

    mul_div(amount, total_supply, total_assets - amount, Rounding::Down)
}

/// `amount * bps / MAX_BPS`, rounded down
pub fn bps_of(amount: u64, bps: u16) -> Result<u64> {
    mul_div(amount, bps as u64, MAX_BPS as u64, Rounding::Down)
}
