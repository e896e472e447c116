use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

use crate::constants::*;
use crate::errors::IdoError;
use crate::ledger;
use crate::state::*;

/// Release a locked position to its beneficiary after `unlock_time`
///
/// Accounts:
/// - beneficiary: Locker beneficiary (signer)
/// - locker: Locker being released
/// - lp_mint / locker_vault: Position mint and the locker's vault
/// - beneficiary_lp_account: Beneficiary's position ATA (created if missing)
#[derive(Accounts)]
pub struct Unlock<'info> {
    #[account(mut)]
    pub beneficiary: Signer<'info>,

    #[account(
        mut,
        seeds = [LOCKER_SEED, locker.factory.as_ref(), &locker.id.to_le_bytes()],
        bump = locker.bump,
        has_one = beneficiary @ IdoError::Unauthorized,
        has_one = lp_mint @ IdoError::InvalidParameter,
        constraint = locker.vault == locker_vault.key() @ IdoError::InvalidParameter
    )]
    pub locker: Box<Account<'info, Locker>>,

    #[account(mint::token_program = token_program)]
    pub lp_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub locker_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = beneficiary,
        associated_token::mint = lp_mint,
        associated_token::authority = beneficiary,
        associated_token::token_program = token_program
    )]
    pub beneficiary_lp_account: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Unlock>) -> Result<()> {
    let clock = Clock::get()?;

    let amount = ctx
        .accounts
        .locker
        .release(ctx.accounts.beneficiary.key(), clock.unix_timestamp)?;

    let locker = &ctx.accounts.locker;
    let id = locker.id.to_le_bytes();
    let bump = [locker.bump];
    let signer_seeds: &[&[u8]] = &[LOCKER_SEED, locker.factory.as_ref(), &id, &bump];

    ledger::transfer_tokens(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.locker_vault.to_account_info(),
        ctx.accounts.lp_mint.to_account_info(),
        ctx.accounts.beneficiary_lp_account.to_account_info(),
        locker.to_account_info(),
        amount,
        ctx.accounts.lp_mint.decimals,
        &[signer_seeds],
    )?;

    emit!(LockerUnlocked {
        locker: locker.key(),
        beneficiary: ctx.accounts.beneficiary.key(),
        amount,
        timestamp: clock.unix_timestamp,
    });

    Ok(())
}

#[event]
pub struct LockerUnlocked {
    pub locker: Pubkey,
    pub beneficiary: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}
