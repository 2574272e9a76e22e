use anchor_lang::prelude::*;

use crate::{context::Invocation, errors::*, events::*, state::*};

/// Remove a strategy from the vault
///
/// Without `force` the strategy must carry no debt. A forced revoke writes
/// any remaining debt off as an immediate loss to the whole vault.
pub fn handler(inv: &mut Invocation<'_>, strategy_key: Pubkey, force: bool) -> Result<()> {
    inv.require_authority()?;

    let current_debt = inv.state.active_strategy_mut(&strategy_key)?.current_debt;

    if current_debt != 0 {
        require!(force, VaultError::StrategyHasDebt);

        inv.state.total_debt = inv
            .state
            .total_debt
            .checked_sub(current_debt)
            .ok_or(VaultError::MathOverflow)?;

        emit!(StrategyReported {
            vault: inv.vault,
            strategy: strategy_key,
            gain: 0,
            loss: current_debt,
            current_debt: 0,
            protocol_fees: 0,
            total_fees: 0,
            total_refunds: 0,
            timestamp: inv.now,
        });
    }

    inv.state.strategies.remove(&strategy_key);
    inv.links.strategies.remove(&strategy_key);
    dequeue(&mut inv.state.default_queue, &strategy_key);

    emit!(StrategyChanged {
        vault: inv.vault,
        strategy: strategy_key,
        change_type: StrategyChangeType::Revoked,
        timestamp: inv.now,
    });

    Ok(())
}
