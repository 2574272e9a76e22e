use std::rc::Rc;

use anchor_lang::prelude::*;

use crate::{context::Invocation, errors::*, events::*, interfaces::Strategy, state::*};

/// Register a strategy and append it to the default queue if there is room
pub fn handler(inv: &mut Invocation<'_>, strategy: Rc<dyn Strategy>) -> Result<()> {
    // CHECKS
    inv.require_authority()?;

    let strategy_key = strategy.key();
    require!(
        strategy_key != Pubkey::default() && strategy_key != inv.vault,
        VaultError::ZeroAddress
    );
    require_keys_eq!(strategy.asset(), inv.state.asset_mint, VaultError::InvalidAsset);
    require!(
        !inv.state.strategy(&strategy_key).is_active(),
        VaultError::StrategyAlreadyActive
    );

    // EFFECTS
    inv.state
        .strategies
        .insert(strategy_key, StrategyParams::activated(inv.now));
    inv.links.strategies.insert(strategy_key, strategy);

    if !enqueue(&mut inv.state.default_queue, strategy_key) {
        msg!("Default queue full, {} not queued", strategy_key);
    }

    emit!(StrategyChanged {
        vault: inv.vault,
        strategy: strategy_key,
        change_type: StrategyChangeType::Added,
        timestamp: inv.now,
    });

    Ok(())
}

/// Set the ceiling `update_debt` may raise a strategy's debt to
pub fn update_max_debt_handler(
    inv: &mut Invocation<'_>,
    strategy_key: Pubkey,
    new_max_debt: u64,
) -> Result<()> {
    inv.require_authority()?;

    inv.state.active_strategy_mut(&strategy_key)?.max_debt = new_max_debt;

    emit!(UpdatedMaxDebtForStrategy {
        vault: inv.vault,
        strategy: strategy_key,
        new_max_debt,
    });

    Ok(())
}
