use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod ledger;
pub mod state;
pub mod venue;
pub mod instructions;

use instructions::*;

declare_id!("xdoPad9VqKh3nTfW2rGmYs7uCeBzR4jN8aHvLkX5pQw");

#[program]
pub mod ido_launchpad {
    use super::*;

    /// Initialize the pool registry
    ///
    /// Called once; the signer becomes the registry owner.
    pub fn initialize_factory(
        ctx: Context<InitializeFactory>,
        fee_mint: Option<Pubkey>,
        fee_amount: u64,
        burn_numerator: u64,
        burn_denominator: u64,
        fee_recipient: Pubkey,
    ) -> Result<()> {
        instructions::initialize_factory::handler(
            ctx,
            fee_mint,
            fee_amount,
            burn_numerator,
            burn_denominator,
            fee_recipient,
        )
    }

    /// Update the creation fee and the share of it that is burned
    pub fn configure(
        ctx: Context<ConfigureFactory>,
        fee_mint: Option<Pubkey>,
        fee_amount: u64,
        burn_numerator: u64,
        burn_denominator: u64,
    ) -> Result<()> {
        instructions::configure_factory::configure_handler(
            ctx,
            fee_mint,
            fee_amount,
            burn_numerator,
            burn_denominator,
        )
    }

    /// Set the wallet receiving the forwarded part of the creation fee
    ///
    /// Owner only. Pools already created keep the fee they were charged.
    pub fn set_fee_recipient(ctx: Context<ConfigureFactory>, recipient: Pubkey) -> Result<()> {
        instructions::configure_factory::set_fee_recipient_handler(ctx, recipient)
    }

    /// Hand the pool registry to a new owner
    ///
    /// Owner only. The new owner takes over fee configuration; existing pools
    /// are unaffected.
    pub fn transfer_ownership(ctx: Context<ConfigureFactory>, new_owner: Pubkey) -> Result<()> {
        instructions::configure_factory::transfer_ownership_handler(ctx, new_owner)
    }

    /// Create a token sale
    ///
    /// Charges the creation fee and escrows the reward asset needed to honor
    /// every entitlement at the hard cap plus the liquidity side.
    pub fn create_pool(
        ctx: Context<CreatePool>,
        params: state::FinancialParameters,
        timestamps: state::Timestamps,
        venue: state::VenueDescriptor,
        metadata_uri: String,
    ) -> Result<()> {
        instructions::create_pool::handler(ctx, params, timestamps, venue, metadata_uri)
    }

    /// Contribute lamports to an active sale
    pub fn pay(ctx: Context<Pay>, amount: u64) -> Result<()> {
        instructions::pay::handler(ctx, amount)
    }

    /// Claim the reward asset after a successful sale has closed
    pub fn claim(ctx: Context<Claim>) -> Result<()> {
        instructions::claim::handler(ctx)
    }

    /// Take back a contribution to a sale that missed its soft cap
    pub fn refund(ctx: Context<Refund>) -> Result<()> {
        instructions::refund::handler(ctx)
    }

    /// Settle a successful sale
    ///
    /// Provisions liquidity to the venue, locks the position, and releases the
    /// remaining lamports and surplus reward asset to the owner.
    pub fn withdraw<'info>(
        ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
        locker_fee: u64,
    ) -> Result<()> {
        instructions::withdraw::handler(ctx, locker_fee)
    }

    /// Return the reward escrow of a failed sale to its owner
    pub fn reclaim_reserve(ctx: Context<ReclaimReserve>) -> Result<()> {
        instructions::reclaim_reserve::handler(ctx)
    }

    /// Initialize the locker registry
    pub fn initialize_locker_factory(ctx: Context<InitializeLockerFactory>, fee: u64) -> Result<()> {
        instructions::initialize_locker_factory::handler(ctx, fee)
    }

    /// Change the lamport fee charged per locker
    ///
    /// Owner only. Applies to lockers created afterwards, including the one
    /// recorded at pool settlement.
    pub fn set_locker_fee(ctx: Context<LockerAdmin>, fee: u64) -> Result<()> {
        instructions::locker_admin::set_fee_handler(ctx, fee)
    }

    /// Send the accrued locker fees to the registry owner
    ///
    /// Moves exactly the accrued lamports; the registry keeps its rent.
    pub fn withdraw_locker_fees(ctx: Context<LockerAdmin>) -> Result<()> {
        instructions::locker_admin::withdraw_fees_handler(ctx)
    }

    /// Hand the locker registry to a new owner
    ///
    /// Owner only. Existing lockers keep their beneficiaries.
    pub fn transfer_locker_ownership(ctx: Context<LockerAdmin>, new_owner: Pubkey) -> Result<()> {
        instructions::locker_admin::transfer_ownership_handler(ctx, new_owner)
    }

    /// Lock a liquidity position until `unlock_time`
    ///
    /// The signer deposits the position and pays the registry fee;
    /// `beneficiary` is the only account allowed to release it.
    pub fn create_locker(
        ctx: Context<CreateLocker>,
        locker_fee: u64,
        amount: u64,
        unlock_time: i64,
        beneficiary: Pubkey,
    ) -> Result<()> {
        instructions::create_locker::handler(ctx, locker_fee, amount, unlock_time, beneficiary)
    }

    /// Release a locked position to its beneficiary
    pub fn unlock(ctx: Context<Unlock>) -> Result<()> {
        instructions::unlock::handler(ctx)
    }
}

// Re-export for external use
pub use state::*;
pub use errors::*;
pub use constants::*;
