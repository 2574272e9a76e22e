use anchor_lang::prelude::*;

use crate::{errors::*, events::*, interfaces::*, state::*};

/// Build the initial state of a vault for `asset`
///
/// The vault starts empty: no shares, no strategies, no profit locked.
pub fn handler(
    vault: Pubkey,
    config: &VaultConfig,
    asset: &dyn AssetToken,
    fee_registry: Option<&dyn FeeRegistry>,
    now: i64,
) -> Result<VaultState> {
    // CHECKS
    require!(vault != Pubkey::default(), VaultError::ZeroAddress);
    require!(config.authority != Pubkey::default(), VaultError::ZeroAddress);

    // EFFECTS
    let mut state = VaultState::new(asset.mint(), config)?;
    state.fee_registry = fee_registry.map(|registry| registry.key());

    emit!(VaultInitialized {
        vault,
        authority: state.authority,
        asset_mint: state.asset_mint,
        timestamp: now,
    });

    Ok(state)
}
