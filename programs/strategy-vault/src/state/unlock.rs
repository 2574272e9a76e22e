use anchor_lang::prelude::*;

use crate::{constants::MAX_BPS_EXTENDED, errors::VaultError};

/// Linear unlock schedule for profit shares held by the vault
///
/// Reported profit is minted as shares to the vault itself and burned
/// gradually, so the price per share rises over the unlock period rather
/// than in a single step.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq)]
pub struct ProfitUnlock {
    /// Timestamp at which every locked share is unlocked (0 = never scheduled)
    pub full_profit_unlock_date: i64,

    /// Shares unlocked per second, scaled by `MAX_BPS_EXTENDED`
    pub profit_unlocking_rate: u128,

    /// Last time unlocked shares were burned
    pub last_profit_update: i64,
}

impl ProfitUnlock {
    /// Shares out of `locked_balance` that have unlocked by `now`
    pub fn unlocked_shares(&self, locked_balance: u64, now: i64) -> u64 {
        if self.full_profit_unlock_date > now {
            let elapsed = now.saturating_sub(self.last_profit_update).max(0) as u128;
            let unlocked = self.profit_unlocking_rate.saturating_mul(elapsed) / MAX_BPS_EXTENDED;
            u64::try_from(unlocked)
                .unwrap_or(u64::MAX)
                .min(locked_balance)
        } else if self.full_profit_unlock_date != 0 {
            locked_balance
        } else {
            0
        }
    }

    /// Restart the schedule so `total_locked` shares unlock evenly over `period`
    pub fn relock(&mut self, total_locked: u64, period: u64, now: i64) -> Result<()> {
        if total_locked == 0 || period == 0 {
            self.profit_unlocking_rate = 0;
            return Ok(());
        }

        self.profit_unlocking_rate = (total_locked as u128)
            .checked_mul(MAX_BPS_EXTENDED)
            .ok_or(VaultError::MathOverflow)?
            / period as u128;
        let period = i64::try_from(period).map_err(|_| error!(VaultError::MathOverflow))?;
        self.full_profit_unlock_date = now.checked_add(period).ok_or(VaultError::MathOverflow)?;
        self.last_profit_update = now;
        Ok(())
    }

    /// Seconds until the current schedule fully unlocks
    pub fn remaining(&self, now: i64) -> u64 {
        self.full_profit_unlock_date.saturating_sub(now).max(0) as u64
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Unlock period for the combined locked position after a report
///
/// Share-weighted average of the time left on previously locked shares and
/// the full configured period for newly locked ones.
pub fn blended_unlock_period(
    previously_locked_shares: u64,
    previously_locked_remaining: u64,
    newly_locked_shares: u64,
    configured_period: u64,
) -> Result<u64> {
    let total_locked = previously_locked_shares as u128 + newly_locked_shares as u128;
    if total_locked == 0 {
        return Ok(0);
    }

    let previous_weight = (previously_locked_shares as u128)
        .checked_mul(previously_locked_remaining as u128)
        .ok_or(VaultError::MathOverflow)?;
    let new_weight = (newly_locked_shares as u128)
        .checked_mul(configured_period as u128)
        .ok_or(VaultError::MathOverflow)?;
    let period = previous_weight
        .checked_add(new_weight)
        .ok_or(VaultError::MathOverflow)?
        / total_locked;

    u64::try_from(period).map_err(|_| error!(VaultError::MathOverflow))
}
