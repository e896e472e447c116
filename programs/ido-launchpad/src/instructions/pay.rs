use anchor_lang::prelude::*;

use crate::constants::*;
use crate::ledger;
use crate::state::*;

/// Contribute lamports to an active sale
///
/// The contribution is checked against the hard cap and the contributor's
/// cumulative bounds before any lamports move; the entitlement is fixed at
/// the pool's token rate.
///
/// Accounts:
/// - contributor: Contributor (signer, pays lamports)
/// - ido_pool: Sale receiving the lamports
/// - user_info: Contributor record (PDA, created on first payment)
/// - system_program: System program
#[derive(Accounts)]
pub struct Pay<'info> {
    #[account(mut)]
    pub contributor: Signer<'info>,

    #[account(
        mut,
        seeds = [POOL_SEED, ido_pool.factory.as_ref(), &ido_pool.index.to_le_bytes()],
        bump = ido_pool.bump
    )]
    pub ido_pool: Box<Account<'info, IdoPool>>,

    #[account(
        init_if_needed,
        payer = contributor,
        space = UserInfo::SIZE,
        seeds = [USER_INFO_SEED, ido_pool.key().as_ref(), contributor.key().as_ref()],
        bump
    )]
    pub user_info: Box<Account<'info, UserInfo>>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Pay>, amount: u64) -> Result<()> {
    Pay::execute(ctx, amount)
}

impl<'info> Pay<'info> {
    fn execute(ctx: Context<Pay>, amount: u64) -> Result<()> {
        let clock = Clock::get()?;
        let contributor = ctx.accounts.contributor.key();
        let pool_key = ctx.accounts.ido_pool.key();

        let user_info = &mut ctx.accounts.user_info;
        user_info.bind(pool_key, contributor, ctx.bumps.user_info)?;
        ctx.accounts
            .ido_pool
            .record_payment(user_info, amount, clock.unix_timestamp)?;

        ledger::collect_lamports(
            ctx.accounts.system_program.to_account_info(),
            ctx.accounts.contributor.to_account_info(),
            ctx.accounts.ido_pool.to_account_info(),
            amount,
        )?;

        let ido_pool = &ctx.accounts.ido_pool;
        let user_info = &ctx.accounts.user_info;
        emit!(Contributed {
            pool: pool_key,
            contributor,
            amount,
            invested_amount: user_info.invested_amount,
            entitlement: user_info.entitlement,
            total_invested: ido_pool.total_invested,
            timestamp: clock.unix_timestamp,
        });

        Ok(())
    }
}

#[event]
pub struct Contributed {
    pub pool: Pubkey,
    pub contributor: Pubkey,
    pub amount: u64,
    pub invested_amount: u64,
    pub entitlement: u64,
    pub total_invested: u64,
    pub timestamp: i64,
}
