use anchor_lang::prelude::*;

/// Custom error codes for the Strategy Vault program
///
/// Input validation failures come first, then solvency guards, then
/// strategy lifecycle and configuration errors.
#[error_code]
pub enum VaultError {
    #[msg("Address must not be the zero address or the vault itself")]
    ZeroAddress,

    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Cannot mint zero shares")]
    CannotMintZero,

    #[msg("Vault is shut down")]
    VaultShutdown,

    #[msg("Amount exceeds the deposit limit")]
    ExceedDepositLimit,

    #[msg("Amount exceeds the withdraw limit")]
    ExceedWithdrawLimit,

    #[msg("Max loss must not exceed 10000 basis points")]
    InvalidMaxLoss,

    #[msg("Realised loss exceeds the allowed max loss")]
    TooMuchLoss,

    #[msg("No shares to redeem")]
    NoSharesToRedeem,

    #[msg("Insufficient shares")]
    InsufficientShares,

    #[msg("Insufficient allowance")]
    InsufficientAllowance,

    #[msg("Insufficient assets in vault to cover the withdrawal")]
    InsufficientAssets,

    #[msg("Amount too high - would issue shares against a vault with no remaining value")]
    AmountTooHigh,

    #[msg("Math overflow occurred during calculation")]
    MathOverflow,

    #[msg("Strategy is not active")]
    InactiveStrategy,

    #[msg("Strategy is already active")]
    StrategyAlreadyActive,

    #[msg("Strategy asset does not match vault asset")]
    InvalidAsset,

    #[msg("Strategy still has debt")]
    StrategyHasDebt,

    #[msg("Strategy has unrealised losses")]
    StrategyHasUnrealisedLosses,

    #[msg("New debt equals current debt")]
    DebtUnchanged,

    #[msg("Target debt is higher than the strategy max debt")]
    TargetAboveMaxDebt,

    #[msg("Nothing to withdraw from strategy")]
    NothingToWithdraw,

    #[msg("Nothing to buy")]
    NothingToBuy,

    #[msg("Cannot buy zero strategy shares")]
    CannotBuyZero,

    #[msg("Queue exceeds the maximum length")]
    QueueTooLong,

    #[msg("Queue contains a duplicate strategy")]
    DuplicateStrategy,

    #[msg("Profit unlock time exceeds one year")]
    InvalidUnlockTime,

    #[msg("Unauthorized - only vault authority can perform this action")]
    Unauthorized,

    #[msg("Vault is already executing an operation")]
    Reentrancy,

    #[msg("Collaborator handles do not match the recorded vault state")]
    CollaboratorMismatch,
}
