use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

use crate::constants::*;
use crate::errors::IdoError;
use crate::ledger;
use crate::state::*;

/// Claim the reward-asset entitlement once the sale has closed
///
/// Accounts:
/// - contributor: Contributor (signer)
/// - ido_pool: Sale
/// - user_info: Contributor record
/// - reward_mint: Reward mint
/// - reward_vault: Pool vault holding the escrow
/// - contributor_reward_account: Contributor's reward ATA (created if missing)
#[derive(Accounts)]
pub struct Claim<'info> {
    #[account(mut)]
    pub contributor: Signer<'info>,

    #[account(
        mut,
        seeds = [POOL_SEED, ido_pool.factory.as_ref(), &ido_pool.index.to_le_bytes()],
        bump = ido_pool.bump,
        has_one = reward_mint @ IdoError::InvalidParameter,
        has_one = reward_vault @ IdoError::InvalidParameter
    )]
    pub ido_pool: Box<Account<'info, IdoPool>>,

    #[account(
        mut,
        seeds = [USER_INFO_SEED, ido_pool.key().as_ref(), contributor.key().as_ref()],
        bump = user_info.bump
    )]
    pub user_info: Box<Account<'info, UserInfo>>,

    #[account(mint::token_program = token_program)]
    pub reward_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub reward_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = contributor,
        associated_token::mint = reward_mint,
        associated_token::authority = contributor,
        associated_token::token_program = token_program
    )]
    pub contributor_reward_account: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Claim>) -> Result<()> {
    Claim::execute(ctx)
}

impl<'info> Claim<'info> {
    fn execute(ctx: Context<Claim>) -> Result<()> {
        let clock = Clock::get()?;

        let user_info = &mut ctx.accounts.user_info;
        let entitlement = ctx
            .accounts
            .ido_pool
            .record_claim(user_info, clock.unix_timestamp)?;

        let ido_pool = &ctx.accounts.ido_pool;
        let index = ido_pool.index.to_le_bytes();
        let bump = [ido_pool.bump];
        let signer_seeds: &[&[u8]] = &[POOL_SEED, ido_pool.factory.as_ref(), &index, &bump];

        ledger::transfer_tokens(
            ctx.accounts.token_program.to_account_info(),
            ctx.accounts.reward_vault.to_account_info(),
            ctx.accounts.reward_mint.to_account_info(),
            ctx.accounts.contributor_reward_account.to_account_info(),
            ido_pool.to_account_info(),
            entitlement,
            ctx.accounts.reward_mint.decimals,
            &[signer_seeds],
        )?;

        emit!(Claimed {
            pool: ido_pool.key(),
            contributor: ctx.accounts.contributor.key(),
            amount: entitlement,
            total_claimed: ido_pool.total_claimed,
            timestamp: clock.unix_timestamp,
        });

        Ok(())
    }
}

#[event]
pub struct Claimed {
    pub pool: Pubkey,
    pub contributor: Pubkey,
    pub amount: u64,
    pub total_claimed: u64,
    pub timestamp: i64,
}
