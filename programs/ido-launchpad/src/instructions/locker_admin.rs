use anchor_lang::prelude::*;

use crate::constants::*;
use crate::instructions::configure_factory::OwnershipTransferred;
use crate::instructions::initialize_locker_factory::LockerFeeUpdated;
use crate::ledger;
use crate::state::*;

/// Owner-only administration of the locker registry
#[derive(Accounts)]
pub struct LockerAdmin<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [LOCKER_FACTORY_SEED],
        bump = locker_factory.bump
    )]
    pub locker_factory: Account<'info, LockerFactory>,
}

/// Change the lamport fee charged per locker
pub fn set_fee_handler(ctx: Context<LockerAdmin>, fee: u64) -> Result<()> {
    let locker_factory = &mut ctx.accounts.locker_factory;
    locker_factory.set_fee(ctx.accounts.owner.key(), fee)?;

    emit!(LockerFeeUpdated {
        factory: locker_factory.key(),
        fee,
    });

    Ok(())
}

/// Send the accrued locker fees to the owner
pub fn withdraw_fees_handler(ctx: Context<LockerAdmin>) -> Result<()> {
    let amount = ctx
        .accounts
        .locker_factory
        .take_fees(ctx.accounts.owner.key())?;

    ledger::transfer_lamports(
        &ctx.accounts.locker_factory.to_account_info(),
        &ctx.accounts.owner.to_account_info(),
        amount,
    )?;

    emit!(LockerFeesWithdrawn {
        factory: ctx.accounts.locker_factory.key(),
        owner: ctx.accounts.owner.key(),
        amount,
    });

    Ok(())
}

pub fn transfer_ownership_handler(ctx: Context<LockerAdmin>, new_owner: Pubkey) -> Result<()> {
    let locker_factory = &mut ctx.accounts.locker_factory;
    let previous_owner = locker_factory.owner;
    locker_factory.transfer_ownership(ctx.accounts.owner.key(), new_owner)?;

    emit!(OwnershipTransferred {
        registry: locker_factory.key(),
        previous_owner,
        new_owner,
    });

    Ok(())
}

#[event]
pub struct LockerFeesWithdrawn {
    pub factory: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}
