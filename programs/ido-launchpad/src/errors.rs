use anchor_lang::prelude::*;

#[error_code]
pub enum IdoError {
    #[msg("Unauthorized: caller lacks the required role")]
    Unauthorized,

    #[msg("Invalid parameter")]
    InvalidParameter,

    #[msg("Invalid amount: outside the allowed contribution bounds")]
    InvalidAmount,

    #[msg("Contribution would exceed the hard cap")]
    CapacityExceeded,

    #[msg("Operation window is not open yet")]
    WindowNotOpen,

    #[msg("Operation window has closed")]
    WindowClosed,

    #[msg("Entitlement already claimed")]
    AlreadyClaimed,

    #[msg("Pool already settled")]
    AlreadySettled,

    #[msg("Nothing to claim")]
    NothingToClaim,

    #[msg("Locker fee insufficient")]
    InsufficientFee,

    #[msg("Fee accounts missing or not authorized")]
    InsufficientAllowance,

    #[msg("Token transfer failed")]
    TransferFailed,

    #[msg("Soft cap not reached")]
    SoftCapNotReached,

    #[msg("Soft cap reached: refunds are disabled")]
    SoftCapReached,

    #[msg("Contribution already refunded")]
    AlreadyRefunded,

    #[msg("Liquidity is still locked")]
    StillLocked,

    #[msg("Locker already withdrawn")]
    AlreadyWithdrawn,

    #[msg("Venue returned no liquidity position")]
    LiquidityProvisionFailed,

    #[msg("Account does not match the pool's venue descriptor")]
    VenueMismatch,

    #[msg("Metadata URI too long")]
    MetadataTooLong,

    #[msg("Math overflow occurred")]
    MathOverflow,

    #[msg("Venue took more than the settlement offered")]
    VenueOverdraw,

    #[msg("Mint transfers may deliver less than the amount sent")]
    UnsupportedMint,
}
