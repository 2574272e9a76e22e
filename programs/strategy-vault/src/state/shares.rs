use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::{constants::MAX_AMOUNT, errors::VaultError};

/// Share token ledger: balances, allowances and raw total supply
///
/// `total_supply` here counts every minted share, including profit shares
/// still held by the vault. The vault's public supply subtracts the
/// portion of those that has already unlocked.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq)]
pub struct ShareLedger {
    pub total_supply: u64,

    pub balances: BTreeMap<Pubkey, u64>,

    /// (owner, spender) => remaining allowance
    pub allowances: BTreeMap<(Pubkey, Pubkey), u64>,
}

impl ShareLedger {
    pub fn balance_of(&self, owner: &Pubkey) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Pubkey, spender: &Pubkey) -> u64 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn mint(&mut self, to: &Pubkey, shares: u64) -> Result<()> {
        self.total_supply = self
            .total_supply
            .checked_add(shares)
            .ok_or(VaultError::MathOverflow)?;
        let balance = self.balance_of(to);
        self.set_balance(to, balance.checked_add(shares).ok_or(VaultError::MathOverflow)?);
        Ok(())
    }

    pub fn burn(&mut self, from: &Pubkey, shares: u64) -> Result<()> {
        let balance = self.balance_of(from);
        require!(balance >= shares, VaultError::InsufficientShares);
        self.set_balance(from, balance - shares);
        self.total_supply = self
            .total_supply
            .checked_sub(shares)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    pub fn transfer(&mut self, from: &Pubkey, to: &Pubkey, shares: u64) -> Result<()> {
        let from_balance = self.balance_of(from);
        require!(from_balance >= shares, VaultError::InsufficientShares);
        self.set_balance(from, from_balance - shares);
        let to_balance = self.balance_of(to);
        self.set_balance(to, to_balance.checked_add(shares).ok_or(VaultError::MathOverflow)?);
        Ok(())
    }

    pub fn approve(&mut self, owner: &Pubkey, spender: &Pubkey, amount: u64) {
        if amount == 0 {
            self.allowances.remove(&(*owner, *spender));
        } else {
            self.allowances.insert((*owner, *spender), amount);
        }
    }

    /// Consume `amount` of allowance; an unlimited allowance is never decremented
    pub fn spend_allowance(&mut self, owner: &Pubkey, spender: &Pubkey, amount: u64) -> Result<()> {
        let current = self.allowance(owner, spender);
        if current == MAX_AMOUNT {
            return Ok(());
        }
        require!(current >= amount, VaultError::InsufficientAllowance);
        self.approve(owner, spender, current - amount);
        Ok(())
    }

    fn set_balance(&mut self, owner: &Pubkey, balance: u64) {
        if balance == 0 {
            self.balances.remove(owner);
        } else {
            self.balances.insert(*owner, balance);
        }
    }
}
