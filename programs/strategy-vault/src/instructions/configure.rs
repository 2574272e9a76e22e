use std::rc::Rc;

use anchor_lang::prelude::*;

use crate::{
    constants::*,
    context::Invocation,
    errors::*,
    events::*,
    interfaces::{Accountant, DepositLimitModule, WithdrawLimitModule},
};

pub fn set_accountant(inv: &mut Invocation<'_>, accountant: Option<Rc<dyn Accountant>>) -> Result<()> {
    inv.require_authority()?;

    let key = accountant.as_ref().map(|a| a.key());
    inv.state.accountant = key;
    inv.links.accountant = accountant;

    emit!(UpdatedAccountant {
        vault: inv.vault,
        accountant: key,
    });
    Ok(())
}

pub fn set_deposit_limit(inv: &mut Invocation<'_>, deposit_limit: u64) -> Result<()> {
    inv.require_authority()?;
    require!(!inv.state.shutdown, VaultError::VaultShutdown);

    inv.state.deposit_limit = deposit_limit;

    emit!(UpdatedDepositLimit {
        vault: inv.vault,
        deposit_limit,
    });
    Ok(())
}

pub fn set_deposit_limit_module(
    inv: &mut Invocation<'_>,
    module: Option<Rc<dyn DepositLimitModule>>,
) -> Result<()> {
    inv.require_authority()?;
    require!(!inv.state.shutdown, VaultError::VaultShutdown);

    let key = module.as_ref().map(|m| m.key());
    inv.state.deposit_limit_module = key;
    inv.links.deposit_limit_module = module;

    emit!(UpdatedDepositLimitModule {
        vault: inv.vault,
        deposit_limit_module: key,
    });
    Ok(())
}

pub fn set_withdraw_limit_module(
    inv: &mut Invocation<'_>,
    module: Option<Rc<dyn WithdrawLimitModule>>,
) -> Result<()> {
    inv.require_authority()?;

    let key = module.as_ref().map(|m| m.key());
    inv.state.withdraw_limit_module = key;
    inv.links.withdraw_limit_module = module;

    emit!(UpdatedWithdrawLimitModule {
        vault: inv.vault,
        withdraw_limit_module: key,
    });
    Ok(())
}

pub fn set_minimum_total_idle(inv: &mut Invocation<'_>, minimum_total_idle: u64) -> Result<()> {
    inv.require_authority()?;

    inv.state.minimum_total_idle = minimum_total_idle;

    emit!(UpdatedMinimumTotalIdle {
        vault: inv.vault,
        minimum_total_idle,
    });
    Ok(())
}

/// Change the unlock period for future profit
///
/// Zero turns locking off: every currently locked share is burned at once,
/// so pending profit is reflected in the price immediately.
pub fn set_profit_max_unlock_time(
    inv: &mut Invocation<'_>,
    profit_max_unlock_time: u64,
) -> Result<()> {
    inv.require_authority()?;
    require!(
        profit_max_unlock_time <= MAX_PROFIT_UNLOCK_TIME,
        VaultError::InvalidUnlockTime
    );

    if profit_max_unlock_time == 0 {
        let vault = inv.vault;
        let locked = inv.state.shares.balance_of(&vault);
        if locked > 0 {
            inv.burn_shares(locked, &vault)?;
        }
        inv.state.profit_unlock.reset();
    }
    inv.state.profit_max_unlock_time = profit_max_unlock_time;

    emit!(UpdatedProfitMaxUnlockTime {
        vault: inv.vault,
        profit_max_unlock_time,
    });
    Ok(())
}
