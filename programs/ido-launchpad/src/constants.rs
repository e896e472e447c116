use anchor_lang::prelude::*;
use crate::errors::IdoError;

pub const FACTORY_SEED: &[u8] = b"ido_factory";
pub const POOL_SEED: &[u8] = b"ido_pool";
pub const REWARD_VAULT_SEED: &[u8] = b"reward_vault";
pub const USER_INFO_SEED: &[u8] = b"user_info";
pub const WRAPPED_BASE_SEED: &[u8] = b"wrapped_base";
pub const LOCKER_FACTORY_SEED: &[u8] = b"locker_factory";
pub const LOCKER_SEED: &[u8] = b"locker";
pub const LOCKER_VAULT_SEED: &[u8] = b"locker_vault";

/// The base asset is native SOL; amounts are lamports
pub const BASE_DECIMALS: u8 = 9;

/// One whole unit of the base asset (1 SOL in lamports)
pub const BASE_SCALE: u128 = 1_000_000_000;

/// Divider for `liquidity_percent`
pub const PERCENT_DIVIDER: u64 = 100;

/// Maximum length of a pool's metadata URI in bytes
pub const MAX_METADATA_URI_LEN: usize = 200;

/// Reward-asset entitlement for a base-asset amount at a fixed rate.
///
/// `rate` is expressed in reward units (already scaled by the reward mint's
/// decimals) per whole base unit, so the result is
/// `base_amount * rate / BASE_SCALE`, rounded down.
pub fn calculate_entitlement(base_amount: u64, rate: u64) -> Result<u64> {
    let scaled = (base_amount as u128)
        .checked_mul(rate as u128)
        .ok_or(IdoError::MathOverflow)?
        / BASE_SCALE;

    u64::try_from(scaled).map_err(|_| error!(IdoError::MathOverflow))
}

/// Share of the raised base asset committed to liquidity
pub fn calculate_liquidity_base(total_invested: u64, liquidity_percent: u8) -> Result<u64> {
    require!(
        liquidity_percent as u64 <= PERCENT_DIVIDER,
        IdoError::InvalidParameter
    );

    let base = (total_invested as u128)
        .checked_mul(liquidity_percent as u128)
        .ok_or(IdoError::MathOverflow)?
        / PERCENT_DIVIDER as u128;

    // bounded by total_invested
    Ok(base as u64)
}

/// Reward asset paired with `liquidity_base` when provisioning liquidity
pub fn calculate_liquidity_reward(liquidity_base: u64, listing_rate: u64) -> Result<u64> {
    calculate_entitlement(liquidity_base, listing_rate)
}

/// Split a creation fee into `(burned, forwarded)` parts.
///
/// `burned = fee * numerator / denominator` rounded down; the remainder goes to
/// the fee recipient so the two parts always add up to `fee`.
pub fn split_creation_fee(fee: u64, numerator: u64, denominator: u64) -> Result<(u64, u64)> {
    require!(denominator > 0, IdoError::InvalidParameter);
    require!(numerator <= denominator, IdoError::InvalidParameter);

    let burned = ((fee as u128)
        .checked_mul(numerator as u128)
        .ok_or(IdoError::MathOverflow)?
        / denominator as u128) as u64;
    let forwarded = fee
        .checked_sub(burned)
        .ok_or(IdoError::MathOverflow)?;

    Ok((burned, forwarded))
}
