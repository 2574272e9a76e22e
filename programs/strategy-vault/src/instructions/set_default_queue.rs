use anchor_lang::prelude::*;

use crate::{context::Invocation, events::*, state::validate_queue};

/// Replace the default withdrawal queue
pub fn handler(inv: &mut Invocation<'_>, new_default_queue: Vec<Pubkey>) -> Result<()> {
    inv.require_authority()?;
    validate_queue(&new_default_queue, &inv.state.strategies)?;

    inv.state.default_queue = new_default_queue.clone();

    emit!(UpdatedDefaultQueue {
        vault: inv.vault,
        new_default_queue,
    });

    Ok(())
}

/// Pin every withdrawal to the default queue, ignoring caller-supplied ones
pub fn use_default_queue_handler(inv: &mut Invocation<'_>, use_default_queue: bool) -> Result<()> {
    inv.require_authority()?;

    inv.state.use_default_queue = use_default_queue;

    emit!(UpdatedUseDefaultQueue {
        vault: inv.vault,
        use_default_queue,
    });

    Ok(())
}
