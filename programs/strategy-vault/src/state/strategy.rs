use std::collections::{BTreeMap, BTreeSet};

use anchor_lang::prelude::*;

use crate::{constants::MAX_QUEUE_LENGTH, errors::VaultError};

/// Per-strategy accounting record
///
/// A zeroed record (activation == 0) means the strategy is not registered.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrategyParams {
    /// Timestamp the strategy was added
    pub activation: i64,

    /// Timestamp of the last processed report
    pub last_report: i64,

    /// Assets the vault has allocated to the strategy, at the vault's own book value
    pub current_debt: u64,

    /// Ceiling for `current_debt` when increasing allocation
    pub max_debt: u64,
}

impl StrategyParams {
    pub fn activated(now: i64) -> Self {
        Self {
            activation: now,
            last_report: now,
            current_debt: 0,
            max_debt: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.activation != 0
    }
}

/// Lifecycle change recorded in `StrategyChanged` events
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyChangeType {
    Added,
    Revoked,
}

/// Append to the default queue unless it is full; returns whether it was added
pub fn enqueue(queue: &mut Vec<Pubkey>, strategy: Pubkey) -> bool {
    if queue.len() >= MAX_QUEUE_LENGTH || queue.contains(&strategy) {
        return false;
    }
    queue.push(strategy);
    true
}

/// Remove a strategy from the queue, preserving the order of the rest
pub fn dequeue(queue: &mut Vec<Pubkey>, strategy: &Pubkey) {
    if let Some(position) = queue.iter().position(|s| s == strategy) {
        queue.remove(position);
    }
}

/// Validate a replacement default queue: bounded, duplicate-free, all active
pub fn validate_queue(
    queue: &[Pubkey],
    strategies: &BTreeMap<Pubkey, StrategyParams>,
) -> Result<()> {
    require!(queue.len() <= MAX_QUEUE_LENGTH, VaultError::QueueTooLong);

    let mut seen = BTreeSet::new();
    for strategy in queue {
        require!(
            strategies.get(strategy).is_some_and(StrategyParams::is_active),
            VaultError::InactiveStrategy
        );
        require!(seen.insert(*strategy), VaultError::DuplicateStrategy);
    }
    Ok(())
}
