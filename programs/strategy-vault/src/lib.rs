// Strategy Vault - multi-strategy allocator vault accounting for Solana
// Architecture: owned vault state + narrow collaborator interfaces
// Atomicity: every instruction runs on a working copy, committed only on success

use anchor_lang::prelude::*;

pub mod constants;
pub mod context;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod interfaces;
pub mod math;
pub mod state;
pub mod vault;

pub use context::{Call, Links};
pub use vault::Vault;

declare_id!("FZrNASBRSLQcc3FjKCP6pR4PHHvn1AYfU7hv3TGL3F61");
