use anchor_lang::prelude::*;

use crate::{context::Invocation, events::*};

/// Permanently stop deposits; debt updates afterwards can only unwind to zero
pub fn handler(inv: &mut Invocation<'_>) -> Result<()> {
    inv.require_authority()?;

    inv.state.shutdown = true;
    inv.state.deposit_limit = 0;
    if inv.state.deposit_limit_module.take().is_some() {
        inv.links.deposit_limit_module = None;
        emit!(UpdatedDepositLimitModule {
            vault: inv.vault,
            deposit_limit_module: None,
        });
    }

    emit!(UpdatedDepositLimit {
        vault: inv.vault,
        deposit_limit: 0,
    });
    emit!(VaultShutdown {
        vault: inv.vault,
        timestamp: inv.now,
    });

    Ok(())
}
