use anchor_lang::prelude::*;

use crate::constants::*;
use crate::ledger;
use crate::state::*;

/// Return a contribution to a sale that closed below its soft cap
///
/// Accounts:
/// - contributor: Contributor (signer, receives lamports)
/// - ido_pool: Failed sale holding the lamports
/// - user_info: Contributor record
#[derive(Accounts)]
pub struct Refund<'info> {
    #[account(mut)]
    pub contributor: Signer<'info>,

    #[account(
        mut,
        seeds = [POOL_SEED, ido_pool.factory.as_ref(), &ido_pool.index.to_le_bytes()],
        bump = ido_pool.bump
    )]
    pub ido_pool: Box<Account<'info, IdoPool>>,

    #[account(
        mut,
        seeds = [USER_INFO_SEED, ido_pool.key().as_ref(), contributor.key().as_ref()],
        bump = user_info.bump
    )]
    pub user_info: Box<Account<'info, UserInfo>>,
}

pub fn handler(ctx: Context<Refund>) -> Result<()> {
    let clock = Clock::get()?;

    let user_info = &mut ctx.accounts.user_info;
    let amount = ctx
        .accounts
        .ido_pool
        .record_refund(user_info, clock.unix_timestamp)?;

    ledger::transfer_lamports(
        &ctx.accounts.ido_pool.to_account_info(),
        &ctx.accounts.contributor.to_account_info(),
        amount,
    )?;

    emit!(Refunded {
        pool: ctx.accounts.ido_pool.key(),
        contributor: ctx.accounts.contributor.key(),
        amount,
        timestamp: clock.unix_timestamp,
    });

    Ok(())
}

#[event]
pub struct Refunded {
    pub pool: Pubkey,
    pub contributor: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}
