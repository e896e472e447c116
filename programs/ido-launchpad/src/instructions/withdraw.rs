use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{self, CloseAccount, SyncNative, Token};
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

use crate::constants::*;
use crate::errors::IdoError;
use crate::instructions::create_locker::LockerCreated;
use crate::ledger;
use crate::state::*;
use crate::venue;

/// Settle a successful sale
///
/// Runs as one instruction, so any failing step reverts all of them:
/// 1. wrap the liquidity share of the raise and provision it, with the
///    matching reward amount, to the venue; the position is minted straight
///    into a new locker vault
/// 2. charge the locker fee and record the locker for the owner until
///    `timestamps.unlock`
/// 3. release the residual lamports and the surplus reward asset to the owner
/// 4. mark the pool settled
///
/// Venue-specific accounts are passed as remaining accounts.
///
/// Accounts:
/// - owner: Sale owner (signer, pays locker fee and rent)
/// - ido_pool: Sale being settled
/// - reward_mint / reward_vault: Reward asset and the pool's escrow
/// - owner_reward_account: Owner's reward ATA (created if missing)
/// - wrapped_base_mint: Wrapped-SOL mint from the venue descriptor
/// - pool_wrapped_base: Temporary wrapped-SOL account of the pool (closed at the end)
/// - lp_mint: Liquidity position mint of the venue pool
/// - locker_factory / locker / locker_vault: Locker registry, new locker, its vault
/// - venue_program / venue_factory: Venue accounts from the descriptor
#[derive(Accounts)]
pub struct Withdraw<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [POOL_SEED, ido_pool.factory.as_ref(), &ido_pool.index.to_le_bytes()],
        bump = ido_pool.bump,
        has_one = owner @ IdoError::Unauthorized,
        has_one = reward_mint @ IdoError::InvalidParameter,
        has_one = reward_vault @ IdoError::InvalidParameter,
        has_one = locker_factory @ IdoError::InvalidParameter
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

    #[account(
        address = ido_pool.venue.wrapped_base @ IdoError::VenueMismatch,
        mint::token_program = base_token_program
    )]
    pub wrapped_base_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        init,
        payer = owner,
        seeds = [WRAPPED_BASE_SEED, ido_pool.key().as_ref()],
        bump,
        token::mint = wrapped_base_mint,
        token::authority = ido_pool,
        token::token_program = base_token_program
    )]
    pub pool_wrapped_base: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(mut, mint::token_program = lp_token_program)]
    pub lp_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        seeds = [LOCKER_FACTORY_SEED],
        bump = locker_factory.bump
    )]
    pub locker_factory: Box<Account<'info, LockerFactory>>,

    #[account(
        init,
        payer = owner,
        space = Locker::SIZE,
        seeds = [
            LOCKER_SEED,
            locker_factory.key().as_ref(),
            &locker_factory.lockers_created.to_le_bytes()
        ],
        bump
    )]
    pub locker: Box<Account<'info, Locker>>,

    #[account(
        init,
        payer = owner,
        seeds = [LOCKER_VAULT_SEED, locker.key().as_ref()],
        bump,
        token::mint = lp_mint,
        token::authority = locker,
        token::token_program = lp_token_program
    )]
    pub locker_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    /// CHECK: Venue program, validated against the pool's venue descriptor
    #[account(
        executable,
        address = ido_pool.venue.router @ IdoError::VenueMismatch
    )]
    pub venue_program: UncheckedAccount<'info>,

    /// CHECK: Venue configuration, validated against the pool's venue descriptor
    #[account(address = ido_pool.venue.factory @ IdoError::VenueMismatch)]
    pub venue_factory: UncheckedAccount<'info>,

    pub token_program: Interface<'info, TokenInterface>,
    pub base_token_program: Program<'info, Token>,
    pub lp_token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
    locker_fee: u64,
) -> Result<()> {
    Withdraw::execute(ctx, locker_fee)
}

impl<'info> Withdraw<'info> {
    fn execute(ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>, locker_fee: u64) -> Result<()> {
        let clock = Clock::get()?;
        let now = clock.unix_timestamp;
        let plan = ctx
            .accounts
            .ido_pool
            .settlement_plan(ctx.accounts.owner.key(), now)?;

        let pool_key = ctx.accounts.ido_pool.key();
        let factory = ctx.accounts.ido_pool.factory;
        let index = ctx.accounts.ido_pool.index.to_le_bytes();
        let bump = [ctx.accounts.ido_pool.bump];
        let signer_seeds: &[&[u8]] = &[POOL_SEED, factory.as_ref(), &index, &bump];

        let lp_amount = if plan.liquidity_base > 0 {
            ctx.accounts
                .provision_liquidity(&plan, ctx.remaining_accounts, signer_seeds)?
        } else {
            0
        };

        let (locker_id, fee) = ctx.accounts.locker_factory.charge(locker_fee)?;
        ledger::collect_lamports(
            ctx.accounts.system_program.to_account_info(),
            ctx.accounts.owner.to_account_info(),
            ctx.accounts.locker_factory.to_account_info(),
            fee,
        )?;

        let unlock_time = ctx.accounts.ido_pool.timestamps.unlock;
        let locker_vault_key = ctx.accounts.locker_vault.key();
        ctx.accounts.locker.initialize(
            locker_id,
            ctx.accounts.locker_factory.key(),
            ctx.accounts.owner.key(),
            ctx.accounts.lp_mint.key(),
            locker_vault_key,
            lp_amount,
            unlock_time,
            &clock,
            ctx.bumps.locker,
            ctx.bumps.locker_vault,
        );

        ledger::transfer_lamports(
            &ctx.accounts.ido_pool.to_account_info(),
            &ctx.accounts.owner.to_account_info(),
            plan.residual_base,
        )?;

        // Returns the rent and any base the venue did not take
        token::close_account(CpiContext::new_with_signer(
            ctx.accounts.base_token_program.to_account_info(),
            CloseAccount {
                account: ctx.accounts.pool_wrapped_base.to_account_info(),
                destination: ctx.accounts.owner.to_account_info(),
                authority: ctx.accounts.ido_pool.to_account_info(),
            },
            &[signer_seeds],
        ))?;

        ctx.accounts.reward_vault.reload()?;
        let surplus = ctx
            .accounts
            .ido_pool
            .surplus_reward(ctx.accounts.reward_vault.amount);
        ledger::transfer_tokens(
            ctx.accounts.token_program.to_account_info(),
            ctx.accounts.reward_vault.to_account_info(),
            ctx.accounts.reward_mint.to_account_info(),
            ctx.accounts.owner_reward_account.to_account_info(),
            ctx.accounts.ido_pool.to_account_info(),
            surplus,
            ctx.accounts.reward_mint.decimals,
            &[signer_seeds],
        )?;

        ctx.accounts.ido_pool.mark_settled(now);

        emit!(LockerCreated {
            locker: ctx.accounts.locker.key(),
            id: locker_id,
            beneficiary: ctx.accounts.owner.key(),
            lp_mint: ctx.accounts.lp_mint.key(),
            amount: lp_amount,
            unlock_time,
            fee,
            timestamp: now,
        });
        emit!(PoolSettled {
            pool: pool_key,
            owner: ctx.accounts.owner.key(),
            total_invested: ctx.accounts.ido_pool.total_invested,
            liquidity_base: plan.liquidity_base,
            liquidity_reward: plan.liquidity_reward,
            residual_base: plan.residual_base,
            surplus_reward: surplus,
            locker: ctx.accounts.locker.key(),
            lp_amount,
            timestamp: now,
        });

        Ok(())
    }

    /// Wrap the liquidity share and hand both sides to the venue.
    ///
    /// The venue may take at most the planned amounts from the pool's vaults
    /// and must leave their authorities untouched. Returns the liquidity
    /// position amount credited to the locker vault.
    fn provision_liquidity(
        &mut self,
        plan: &Settlement,
        remaining: &[AccountInfo<'info>],
        signer_seeds: &[&[u8]],
    ) -> Result<u64> {
        ledger::transfer_lamports(
            &self.ido_pool.to_account_info(),
            &self.pool_wrapped_base.to_account_info(),
            plan.liquidity_base,
        )?;
        token::sync_native(CpiContext::new(
            self.base_token_program.to_account_info(),
            SyncNative {
                account: self.pool_wrapped_base.to_account_info(),
            },
        ))?;

        self.pool_wrapped_base.reload()?;
        let base_before = self.pool_wrapped_base.amount;
        let reward_before = self.reward_vault.amount;
        let lp_before = self.locker_vault.amount;
        venue::add_liquidity(
            venue::AddLiquidity {
                venue_program: self.venue_program.to_account_info(),
                authority: self.ido_pool.to_account_info(),
                base_source: self.pool_wrapped_base.to_account_info(),
                reward_source: self.reward_vault.to_account_info(),
                lp_recipient: self.locker_vault.to_account_info(),
                lp_mint: self.lp_mint.to_account_info(),
                base_mint: self.wrapped_base_mint.to_account_info(),
                reward_mint: self.reward_mint.to_account_info(),
                venue_factory: self.venue_factory.to_account_info(),
                base_token_program: self.base_token_program.to_account_info(),
                reward_token_program: self.token_program.to_account_info(),
                lp_token_program: self.lp_token_program.to_account_info(),
            },
            remaining,
            plan.liquidity_base,
            plan.liquidity_reward,
            &[signer_seeds],
        )?;

        // The pool signed the venue call, so both of its vaults are re-read
        self.pool_wrapped_base.reload()?;
        self.reward_vault.reload()?;
        plan.verify_consumption(
            base_before.saturating_sub(self.pool_wrapped_base.amount),
            reward_before.saturating_sub(self.reward_vault.amount),
        )?;
        let pool_key = self.ido_pool.key();
        for vault in [&self.pool_wrapped_base, &self.reward_vault] {
            require!(
                vault.owner == pool_key
                    && vault.delegate.is_none()
                    && vault.close_authority.is_none(),
                IdoError::VenueOverdraw
            );
        }

        self.locker_vault.reload()?;
        let lp_amount = self
            .locker_vault
            .amount
            .checked_sub(lp_before)
            .ok_or(IdoError::LiquidityProvisionFailed)?;
        require!(lp_amount > 0, IdoError::LiquidityProvisionFailed);

        Ok(lp_amount)
    }
}

#[event]
pub struct PoolSettled {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub total_invested: u64,
    pub liquidity_base: u64,
    pub liquidity_reward: u64,
    pub residual_base: u64,
    pub surplus_reward: u64,
    pub locker: Pubkey,
    pub lp_amount: u64,
    pub timestamp: i64,
}
