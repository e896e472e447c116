use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

use crate::constants::*;
use crate::errors::IdoError;
use crate::ledger;
use crate::state::*;

/// Return the reward escrow of a failed sale to its owner
///
/// Contributors of a failed sale are refunded in lamports and never claim,
/// so the whole vault balance goes back.
///
/// Accounts:
/// - owner: Sale owner (signer)
/// - ido_pool: Failed sale
/// - reward_mint / reward_vault: Reward asset and the pool's escrow
/// - owner_reward_account: Owner's reward ATA (created if missing)
#[derive(Accounts)]
pub struct ReclaimReserve<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [POOL_SEED, ido_pool.factory.as_ref(), &ido_pool.index.to_le_bytes()],
        bump = ido_pool.bump,
        has_one = owner @ IdoError::Unauthorized,
        has_one = reward_mint @ IdoError::InvalidParameter,
        has_one = reward_vault @ IdoError::InvalidParameter
    )]
    pub ido_pool: Box<Account<'info, IdoPool>>,

    #[account(mint::token_program = token_program)]
    pub reward_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub reward_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = owner,
        associated_token::mint = reward_mint,
        associated_token::authority = owner,
        associated_token::token_program = token_program
    )]
    pub owner_reward_account: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<ReclaimReserve>) -> Result<()> {
    let clock = Clock::get()?;

    ctx.accounts
        .ido_pool
        .record_reserve_reclaim(ctx.accounts.owner.key(), clock.unix_timestamp)?;

    let ido_pool = &ctx.accounts.ido_pool;
    let index = ido_pool.index.to_le_bytes();
    let bump = [ido_pool.bump];
    let signer_seeds: &[&[u8]] = &[POOL_SEED, ido_pool.factory.as_ref(), &index, &bump];

    let amount = ctx.accounts.reward_vault.amount;
    ledger::transfer_tokens(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.reward_vault.to_account_info(),
        ctx.accounts.reward_mint.to_account_info(),
        ctx.accounts.owner_reward_account.to_account_info(),
        ido_pool.to_account_info(),
        amount,
        ctx.accounts.reward_mint.decimals,
        &[signer_seeds],
    )?;

    emit!(ReserveReclaimed {
        pool: ido_pool.key(),
        owner: ctx.accounts.owner.key(),
        amount,
        timestamp: clock.unix_timestamp,
    });

    Ok(())
}

#[event]
pub struct ReserveReclaimed {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}
