// Shared mocks for vault integration tests
//
// MockToken is an in-memory asset ledger. MockStrategy is a small tokenized
// vault over that ledger whose value is its token balance; tests make it
// gain (airdrop), lose (slash), cap its limits, shortchange redemptions or
// call back into the vault. Both ledgers honour vault checkpoints, so a
// failed vault operation leaves them exactly as they were.

#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use anchor_lang::{error::Error, prelude::*};
use strategy_vault::{
    constants::*,
    errors::VaultError,
    interfaces::*,
    state::{VaultConfig, VaultState},
    Call, Vault,
};

pub const START: i64 = 1_700_000_000;
pub const DAY: i64 = 24 * 60 * 60;

// =============================================================================
// Assertions
// =============================================================================

pub fn error_code(err: &Error) -> Option<u32> {
    match err {
        Error::AnchorError(e) => Some(e.error_code_number),
        Error::ProgramError(_) => None,
    }
}

#[track_caller]
pub fn assert_vault_error<T: std::fmt::Debug>(result: Result<T>, expected: VaultError) {
    let err = result.expect_err("operation should fail");
    assert_eq!(
        error_code(&err),
        Some(u32::from(expected)),
        "unexpected error: {:?}",
        err
    );
}

// =============================================================================
// Asset token
// =============================================================================

type Balances = BTreeMap<Pubkey, u64>;
type Allowances = BTreeMap<(Pubkey, Pubkey), u64>;

pub struct MockToken {
    mint: Pubkey,
    balances: RefCell<Balances>,
    allowances: RefCell<Allowances>,
    checkpoints: RefCell<Vec<(Balances, Allowances)>>,
}

impl MockToken {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            mint: Pubkey::new_unique(),
            balances: RefCell::new(BTreeMap::new()),
            allowances: RefCell::new(BTreeMap::new()),
            checkpoints: RefCell::new(Vec::new()),
        })
    }

    pub fn balances(&self) -> Balances {
        self.balances.borrow().clone()
    }

    /// Create tokens out of thin air
    pub fn airdrop(&self, to: &Pubkey, amount: u64) {
        *self.balances.borrow_mut().entry(*to).or_default() += amount;
    }

    /// Destroy tokens held by `from`
    pub fn slash(&self, from: &Pubkey, amount: u64) {
        let mut balances = self.balances.borrow_mut();
        let balance = balances.entry(*from).or_default();
        *balance -= amount;
    }

    fn move_tokens(&self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        let mut balances = self.balances.borrow_mut();
        let from_balance = balances.get(from).copied().unwrap_or(0);
        if from_balance < amount {
            return Err(ProgramError::InsufficientFunds.into());
        }
        balances.insert(*from, from_balance - amount);
        *balances.entry(*to).or_default() += amount;
        Ok(())
    }
}

impl Checkpointed for MockToken {
    fn checkpoint(&self) {
        let snapshot = (self.balances.borrow().clone(), self.allowances.borrow().clone());
        self.checkpoints.borrow_mut().push(snapshot);
    }

    fn commit(&self) {
        self.checkpoints.borrow_mut().pop();
    }

    fn rollback(&self) {
        if let Some((balances, allowances)) = self.checkpoints.borrow_mut().pop() {
            *self.balances.borrow_mut() = balances;
            *self.allowances.borrow_mut() = allowances;
        }
    }
}

impl AssetToken for MockToken {
    fn mint(&self) -> Pubkey {
        self.mint
    }

    fn balance_of(&self, owner: &Pubkey) -> u64 {
        self.balances.borrow().get(owner).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Pubkey, spender: &Pubkey) -> u64 {
        self.allowances
            .borrow()
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn approve(&self, owner: &Pubkey, spender: &Pubkey, amount: u64) -> Result<()> {
        self.allowances
            .borrow_mut()
            .insert((*owner, *spender), amount);
        Ok(())
    }

    fn transfer(&self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        self.move_tokens(from, to, amount)
    }

    fn transfer_from(&self, spender: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        let allowance = self.allowance(from, spender);
        if allowance < amount {
            return Err(ProgramError::InsufficientFunds.into());
        }
        self.move_tokens(from, to, amount)?;
        if allowance != u64::MAX {
            self.approve(from, spender, allowance - amount)?;
        }
        Ok(())
    }
}

// =============================================================================
// Strategy
// =============================================================================

pub struct MockStrategy {
    key: Pubkey,
    token: Rc<MockToken>,
    asset: Pubkey,
    shares: RefCell<Balances>,
    total_shares: Cell<u64>,
    checkpoints: RefCell<Vec<(Balances, u64)>>,
    /// Cap on `max_redeem`, in shares
    pub redeem_cap: Cell<Option<u64>>,
    /// Cap on `max_deposit`, in assets
    pub deposit_cap: Cell<Option<u64>>,
    /// Basis points of every redemption that is never paid out
    pub redeem_haircut_bps: Cell<u64>,
    /// Extra assets paid on every redemption
    pub redeem_bonus: Cell<u64>,
    /// Vault to call back into during `redeem`
    pub reenter: RefCell<Option<Weak<Vault>>>,
    pub reentry_error: RefCell<Option<Error>>,
}

impl MockStrategy {
    pub fn new(token: &Rc<MockToken>) -> Rc<Self> {
        Self::with_asset(token, token.mint())
    }

    pub fn with_asset(token: &Rc<MockToken>, asset: Pubkey) -> Rc<Self> {
        Rc::new(Self {
            key: Pubkey::new_unique(),
            token: token.clone(),
            asset,
            shares: RefCell::new(BTreeMap::new()),
            total_shares: Cell::new(0),
            checkpoints: RefCell::new(Vec::new()),
            redeem_cap: Cell::new(None),
            deposit_cap: Cell::new(None),
            redeem_haircut_bps: Cell::new(0),
            redeem_bonus: Cell::new(0),
            reenter: RefCell::new(None),
            reentry_error: RefCell::new(None),
        })
    }

    pub fn total_assets(&self) -> u64 {
        self.token.balance_of(&self.key)
    }

    /// Yield accrues as tokens arriving at the strategy
    pub fn earn(&self, amount: u64) {
        self.token.airdrop(&self.key, amount);
    }

    /// Value lost by the strategy
    pub fn lose(&self, amount: u64) {
        self.token.slash(&self.key, amount);
    }

    /// Share balances and total supply
    pub fn share_ledger(&self) -> (Balances, u64) {
        (self.shares.borrow().clone(), self.total_shares.get())
    }

    fn shares_of(&self, owner: &Pubkey) -> u64 {
        self.shares.borrow().get(owner).copied().unwrap_or(0)
    }
}

impl Checkpointed for MockStrategy {
    fn checkpoint(&self) {
        let snapshot = self.share_ledger();
        self.checkpoints.borrow_mut().push(snapshot);
    }

    fn commit(&self) {
        self.checkpoints.borrow_mut().pop();
    }

    fn rollback(&self) {
        if let Some((shares, total_shares)) = self.checkpoints.borrow_mut().pop() {
            *self.shares.borrow_mut() = shares;
            self.total_shares.set(total_shares);
        }
    }
}

impl Strategy for MockStrategy {
    fn key(&self) -> Pubkey {
        self.key
    }

    fn asset(&self) -> Pubkey {
        self.asset
    }

    fn balance_of(&self, owner: &Pubkey) -> u64 {
        self.shares_of(owner)
    }

    fn convert_to_assets(&self, shares: u64) -> u64 {
        let total_shares = self.total_shares.get();
        if total_shares == 0 {
            return shares;
        }
        (shares as u128 * self.total_assets() as u128 / total_shares as u128) as u64
    }

    fn convert_to_shares(&self, assets: u64) -> u64 {
        let total_shares = self.total_shares.get();
        let total_assets = self.total_assets();
        if total_shares == 0 || total_assets == 0 {
            return assets;
        }
        (assets as u128 * total_shares as u128 / total_assets as u128) as u64
    }

    fn preview_withdraw(&self, assets: u64) -> u64 {
        let total_shares = self.total_shares.get();
        let total_assets = self.total_assets();
        if total_shares == 0 || total_assets == 0 {
            return assets;
        }
        let numerator = assets as u128 * total_shares as u128;
        numerator.div_ceil(total_assets as u128) as u64
    }

    fn max_deposit(&self, _receiver: &Pubkey) -> u64 {
        self.deposit_cap.get().unwrap_or(u64::MAX)
    }

    fn max_redeem(&self, owner: &Pubkey) -> u64 {
        let balance = self.shares_of(owner);
        self.redeem_cap.get().map_or(balance, |cap| cap.min(balance))
    }

    fn deposit(&self, assets: u64, receiver: &Pubkey) -> Result<u64> {
        let shares = self.convert_to_shares(assets);
        self.token
            .transfer_from(&self.key, receiver, &self.key, assets)?;
        *self.shares.borrow_mut().entry(*receiver).or_default() += shares;
        self.total_shares.set(self.total_shares.get() + shares);
        Ok(shares)
    }

    fn redeem(&self, shares: u64, receiver: &Pubkey, owner: &Pubkey) -> Result<u64> {
        if let Some(vault) = self.reenter.borrow().as_ref().and_then(Weak::upgrade) {
            let call = Call::new(self.key, START);
            if let Err(err) = vault.deposit(&call, 1, self.key) {
                *self.reentry_error.borrow_mut() = Some(err);
            }
        }

        let assets = self.convert_to_assets(shares);
        let balance = self.shares_of(owner);
        if balance < shares {
            return Err(ProgramError::InsufficientFunds.into());
        }
        self.shares.borrow_mut().insert(*owner, balance - shares);
        self.total_shares.set(self.total_shares.get() - shares);

        let haircut = assets * self.redeem_haircut_bps.get() / MAX_BPS as u64;
        let paid = assets - haircut;
        self.token.transfer(&self.key, receiver, paid)?;
        self.token.slash(&self.key, haircut);

        let bonus = self.redeem_bonus.get();
        if bonus > 0 {
            self.token.airdrop(receiver, bonus);
        }
        Ok(paid + bonus)
    }

    fn transfer(&self, from: &Pubkey, to: &Pubkey, shares: u64) -> Result<()> {
        let balance = self.shares_of(from);
        if balance < shares {
            return Err(ProgramError::InsufficientFunds.into());
        }
        let mut all = self.shares.borrow_mut();
        all.insert(*from, balance - shares);
        *all.entry(*to).or_default() += shares;
        Ok(())
    }
}

// =============================================================================
// Fee policy, limit modules, registry
// =============================================================================

pub struct MockAccountant {
    key: Pubkey,
    /// Fee charged as basis points of reported gain
    pub performance_fee_bps: Cell<u64>,
    /// Flat fee charged on every report
    pub flat_fee: Cell<u64>,
    pub refund: Cell<u64>,
}

impl MockAccountant {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            key: Pubkey::new_unique(),
            performance_fee_bps: Cell::new(0),
            flat_fee: Cell::new(0),
            refund: Cell::new(0),
        })
    }
}

impl Accountant for MockAccountant {
    fn key(&self) -> Pubkey {
        self.key
    }

    fn report(&self, _strategy: &Pubkey, gain: u64, _loss: u64) -> Result<(u64, u64)> {
        let fees = gain * self.performance_fee_bps.get() / MAX_BPS as u64 + self.flat_fee.get();
        Ok((fees, self.refund.get()))
    }
}

pub struct MockFeeRegistry {
    key: Pubkey,
    pub fee_bps: u16,
    pub recipient: Pubkey,
}

impl FeeRegistry for MockFeeRegistry {
    fn key(&self) -> Pubkey {
        self.key
    }

    fn protocol_fee_config(&self) -> (u16, Pubkey) {
        (self.fee_bps, self.recipient)
    }
}

pub struct MockDepositLimit {
    key: Pubkey,
    pub limit: Cell<u64>,
}

impl MockDepositLimit {
    pub fn new(limit: u64) -> Rc<Self> {
        Rc::new(Self {
            key: Pubkey::new_unique(),
            limit: Cell::new(limit),
        })
    }
}

impl DepositLimitModule for MockDepositLimit {
    fn key(&self) -> Pubkey {
        self.key
    }

    fn available_deposit_limit(&self, _receiver: &Pubkey) -> u64 {
        self.limit.get()
    }
}

pub struct MockWithdrawLimit {
    key: Pubkey,
    pub limit: Cell<u64>,
}

impl MockWithdrawLimit {
    pub fn new(limit: u64) -> Rc<Self> {
        Rc::new(Self {
            key: Pubkey::new_unique(),
            limit: Cell::new(limit),
        })
    }
}

impl WithdrawLimitModule for MockWithdrawLimit {
    fn key(&self) -> Pubkey {
        self.key
    }

    fn available_withdraw_limit(&self, _owner: &Pubkey, _max_loss: u16, _strategies: &[Pubkey]) -> u64 {
        self.limit.get()
    }
}

// =============================================================================
// Harness
// =============================================================================

/// Everything a vault operation can write: its own state plus the asset and
/// strategy ledgers
#[derive(Debug, PartialEq)]
pub struct Ledgers {
    pub state: VaultState,
    pub balances: Balances,
    pub allowances: Allowances,
    pub strategy_shares: Vec<(Balances, u64)>,
}

pub struct Harness {
    pub token: Rc<MockToken>,
    pub vault: Rc<Vault>,
    pub authority: Pubkey,
    strategies: RefCell<Vec<Rc<MockStrategy>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(adjust: impl FnOnce(&mut VaultConfig)) -> Self {
        Self::build(adjust, None)
    }

    pub fn with_fee_registry(fee_bps: u16, recipient: Pubkey) -> Self {
        let registry: Rc<dyn FeeRegistry> = Rc::new(MockFeeRegistry {
            key: Pubkey::new_unique(),
            fee_bps,
            recipient,
        });
        Self::build(|_| {}, Some(registry))
    }

    fn build(adjust: impl FnOnce(&mut VaultConfig), registry: Option<Rc<dyn FeeRegistry>>) -> Self {
        let token = MockToken::new();
        let authority = Pubkey::new_unique();
        let mut config = VaultConfig {
            authority,
            deposit_limit: u64::MAX,
            ..VaultConfig::default()
        };
        adjust(&mut config);

        let vault = Vault::initialize(
            Pubkey::new_unique(),
            config,
            token.clone(),
            registry,
            START,
        )
        .unwrap();

        Self {
            token,
            vault: Rc::new(vault),
            authority,
            strategies: RefCell::new(Vec::new()),
        }
    }

    pub fn admin(&self) -> Call {
        self.admin_at(START)
    }

    pub fn admin_at(&self, now: i64) -> Call {
        Call::new(self.authority, now)
    }

    pub fn key(&self) -> Pubkey {
        self.vault.key()
    }

    /// Fund `user` and approve the vault to pull `amount`
    pub fn fund(&self, user: &Pubkey, amount: u64) {
        self.token.airdrop(user, amount);
        let allowance = self.token.allowance(user, &self.key());
        self.token
            .approve(user, &self.key(), allowance.saturating_add(amount))
            .unwrap();
    }

    /// New user holding shares from a deposit of `amount`
    pub fn depositor(&self, amount: u64) -> Pubkey {
        let user = Pubkey::new_unique();
        self.fund(&user, amount);
        self.vault
            .deposit(&Call::new(user, START), amount, user)
            .unwrap();
        user
    }

    /// Registered strategy with an unlimited max debt
    pub fn strategy(&self) -> Rc<MockStrategy> {
        let strategy = MockStrategy::new(&self.token);
        self.vault
            .add_strategy(&self.admin(), strategy.clone())
            .unwrap();
        self.vault
            .update_max_debt_for_strategy(&self.admin(), strategy.key(), u64::MAX)
            .unwrap();
        self.strategies.borrow_mut().push(strategy.clone());
        strategy
    }

    /// Registered strategy already holding `debt` of the vault's idle assets
    pub fn funded_strategy(&self, debt: u64) -> Rc<MockStrategy> {
        let strategy = self.strategy();
        self.vault
            .update_debt(&self.admin(), strategy.key(), debt, 0)
            .unwrap();
        strategy
    }

    pub fn ledgers(&self) -> Ledgers {
        Ledgers {
            state: self.vault.state(),
            balances: self.token.balances(),
            allowances: self.token.allowances.borrow().clone(),
            strategy_shares: self
                .strategies
                .borrow()
                .iter()
                .map(|strategy| strategy.share_ledger())
                .collect(),
        }
    }

    /// Run a vault operation expected to fail and check nothing moved
    #[track_caller]
    pub fn assert_fails_untouched<T: std::fmt::Debug>(
        &self,
        op: impl FnOnce(&Vault) -> Result<T>,
        expected: VaultError,
    ) {
        let before = self.ledgers();
        assert_vault_error(op(&self.vault), expected);
        assert_eq!(self.ledgers(), before, "failed operation left ledgers changed");
    }

    /// `total_assets == total_idle + total_debt`, debt matches the strategies
    /// and idle is exactly the vault's token balance (no donations)
    pub fn assert_accounting(&self) {
        let state = self.vault.state();
        assert_eq!(self.vault.total_assets(), state.total_idle + state.total_debt);
        let strategy_debt: u64 = state.strategies.values().map(|s| s.current_debt).sum();
        assert_eq!(strategy_debt, state.total_debt);
        assert_eq!(self.token.balance_of(&self.key()), state.total_idle);
    }
}

pub fn max_loss_none() -> u16 {
    0
}

pub fn max_loss_any() -> u16 {
    MAX_BPS
}
