use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

use crate::constants::*;
use crate::errors::IdoError;
use crate::ledger;
use crate::state::*;

/// Lock an existing liquidity position until `unlock_time`
///
/// The creator pays the registry fee in lamports and deposits the position;
/// only `beneficiary` can release it.
///
/// Accounts:
/// - creator: Depositor (signer, pays fee and rent)
/// - locker_factory: Locker registry
/// - locker: New locker (PDA indexed by the registry counter)
/// - lp_mint: Mint of the locked position
/// - locker_vault: Locker-owned vault (PDA)
/// - creator_lp_account: Creator's position account
#[derive(Accounts)]
pub struct CreateLocker<'info> {
    #[account(mut)]
    pub creator: Signer<'info>,

    #[account(
        mut,
        seeds = [LOCKER_FACTORY_SEED],
        bump = locker_factory.bump
    )]
    pub locker_factory: Box<Account<'info, LockerFactory>>,

    #[account(
        init,
        payer = creator,
        space = Locker::SIZE,
        seeds = [
            LOCKER_SEED,
            locker_factory.key().as_ref(),
            &locker_factory.lockers_created.to_le_bytes()
        ],
        bump
    )]
    pub locker: Box<Account<'info, Locker>>,

    #[account(mint::token_program = token_program)]
    pub lp_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        init,
        payer = creator,
        seeds = [LOCKER_VAULT_SEED, locker.key().as_ref()],
        bump,
        token::mint = lp_mint,
        token::authority = locker,
        token::token_program = token_program
    )]
    pub locker_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = creator_lp_account.mint == lp_mint.key() @ IdoError::InvalidParameter,
        constraint = creator_lp_account.owner == creator.key() @ IdoError::Unauthorized
    )]
    pub creator_lp_account: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<CreateLocker>,
    locker_fee: u64,
    amount: u64,
    unlock_time: i64,
    beneficiary: Pubkey,
) -> Result<()> {
    let clock = Clock::get()?;
    Locker::validate_request(amount, unlock_time, clock.unix_timestamp)?;
    require_keys_neq!(beneficiary, Pubkey::default(), IdoError::InvalidParameter);
    ledger::require_exact_transfers(&ctx.accounts.lp_mint.to_account_info())?;

    let (id, fee) = ctx.accounts.locker_factory.charge(locker_fee)?;
    ledger::collect_lamports(
        ctx.accounts.system_program.to_account_info(),
        ctx.accounts.creator.to_account_info(),
        ctx.accounts.locker_factory.to_account_info(),
        fee,
    )?;

    ledger::transfer_tokens(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.creator_lp_account.to_account_info(),
        ctx.accounts.lp_mint.to_account_info(),
        ctx.accounts.locker_vault.to_account_info(),
        ctx.accounts.creator.to_account_info(),
        amount,
        ctx.accounts.lp_mint.decimals,
        &[],
    )?;

    let factory_key = ctx.accounts.locker_factory.key();
    let locker_vault_key = ctx.accounts.locker_vault.key();
    ctx.accounts.locker.initialize(
        id,
        factory_key,
        beneficiary,
        ctx.accounts.lp_mint.key(),
        locker_vault_key,
        amount,
        unlock_time,
        &clock,
        ctx.bumps.locker,
        ctx.bumps.locker_vault,
    );

    emit!(LockerCreated {
        locker: ctx.accounts.locker.key(),
        id,
        beneficiary,
        lp_mint: ctx.accounts.lp_mint.key(),
        amount,
        unlock_time,
        fee,
        timestamp: clock.unix_timestamp,
    });

    Ok(())
}

#[event]
pub struct LockerCreated {
    pub locker: Pubkey,
    pub id: u64,
    pub beneficiary: Pubkey,
    pub lp_mint: Pubkey,
    pub amount: u64,
    pub unlock_time: i64,
    pub fee: u64,
    pub timestamp: i64,
}
