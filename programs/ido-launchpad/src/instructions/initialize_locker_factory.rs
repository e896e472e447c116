use anchor_lang::prelude::*;

use crate::constants::*;
use crate::state::*;

/// Create the locker registry
///
/// Accounts:
/// - owner: Registry owner (signer, pays rent)
/// - locker_factory: Registry account (PDA), also holds the collected fees
/// - system_program: System program
#[derive(Accounts)]
pub struct InitializeLockerFactory<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        init,
        payer = owner,
        space = LockerFactory::SIZE,
        seeds = [LOCKER_FACTORY_SEED],
        bump
    )]
    pub locker_factory: Account<'info, LockerFactory>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitializeLockerFactory>, fee: u64) -> Result<()> {
    let locker_factory = &mut ctx.accounts.locker_factory;
    locker_factory.initialize(ctx.accounts.owner.key(), fee, ctx.bumps.locker_factory);

    msg!("Locker registry initialized with fee {}", fee);
    emit!(LockerFeeUpdated {
        factory: locker_factory.key(),
        fee,
    });

    Ok(())
}

#[event]
pub struct LockerFeeUpdated {
    pub factory: Pubkey,
    pub fee: u64,
}
