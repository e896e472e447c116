use anchor_lang::prelude::*;
use anchor_spl::token_interface::{self, Burn, Mint, TokenAccount, TokenInterface};

use crate::constants::*;
use crate::errors::IdoError;
use crate::ledger;
use crate::state::*;

/// Create a sale and escrow its worst-case reward requirement
///
/// Accounts:
/// - creator: Sale owner (signer, pays rent, fee and reward escrow)
/// - ido_factory: Pool registry
/// - ido_pool: New pool account (PDA indexed by the registry counter)
/// - reward_mint: Mint of the asset being sold
/// - reward_vault: Pool-owned vault receiving the escrow (PDA)
/// - creator_reward_account: Creator's reward-asset account
/// - locker_factory: Locker registry used at settlement
/// - fee_mint / creator_fee_account / fee_recipient_account / fee_token_program:
///   required only while the registry charges a creation fee
/// - token_program: Token program of the reward mint
/// - system_program: System program
#[derive(Accounts)]
pub struct CreatePool<'info> {
    #[account(mut)]
    pub creator: Signer<'info>,

    #[account(
        mut,
        seeds = [FACTORY_SEED],
        bump = ido_factory.bump
    )]
    pub ido_factory: Box<Account<'info, IdoFactory>>,

    #[account(
        init,
        payer = creator,
        space = IdoPool::SIZE,
        seeds = [
            POOL_SEED,
            ido_factory.key().as_ref(),
            &ido_factory.pools_created.to_le_bytes()
        ],
        bump
    )]
    pub ido_pool: Box<Account<'info, IdoPool>>,

    #[account(mint::token_program = token_program)]
    pub reward_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        init,
        payer = creator,
        seeds = [REWARD_VAULT_SEED, ido_pool.key().as_ref()],
        bump,
        token::mint = reward_mint,
        token::authority = ido_pool,
        token::token_program = token_program
    )]
    pub reward_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = creator_reward_account.mint == reward_mint.key() @ IdoError::InvalidParameter,
        constraint = creator_reward_account.owner == creator.key() @ IdoError::Unauthorized
    )]
    pub creator_reward_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        seeds = [LOCKER_FACTORY_SEED],
        bump = locker_factory.bump
    )]
    pub locker_factory: Box<Account<'info, LockerFactory>>,

    #[account(mut)]
    pub fee_mint: Option<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub creator_fee_account: Option<InterfaceAccount<'info, TokenAccount>>,

    #[account(mut)]
    pub fee_recipient_account: Option<InterfaceAccount<'info, TokenAccount>>,

    pub fee_token_program: Option<Interface<'info, TokenInterface>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<CreatePool>,
    params: FinancialParameters,
    timestamps: Timestamps,
    venue: VenueDescriptor,
    metadata_uri: String,
) -> Result<()> {
    CreatePool::execute(ctx, params, timestamps, venue, metadata_uri)
}

impl<'info> CreatePool<'info> {
    fn execute(
        ctx: Context<CreatePool>,
        params: FinancialParameters,
        timestamps: Timestamps,
        venue: VenueDescriptor,
        metadata_uri: String,
    ) -> Result<()> {
        let clock = Clock::get()?;
        let creator = ctx.accounts.creator.key();
        let factory_key = ctx.accounts.ido_factory.key();
        ledger::require_exact_transfers(&ctx.accounts.reward_mint.to_account_info())?;

        // Fee settings are read once so the whole creation uses one snapshot
        let fee_config = ctx.accounts.ido_factory.fee_config();
        let index = ctx.accounts.ido_factory.next_pool_index()?;

        let ido_pool = &mut ctx.accounts.ido_pool;
        ido_pool.initialize(
            creator,
            factory_key,
            index,
            ctx.accounts.reward_mint.key(),
            ctx.accounts.reward_vault.key(),
            ctx.accounts.reward_mint.decimals,
            params,
            timestamps,
            venue,
            ctx.accounts.locker_factory.key(),
            metadata_uri,
            &clock,
            ctx.bumps.ido_pool,
            ctx.bumps.reward_vault,
        )?;
        let reward_reserve = ido_pool.reward_reserve;
        let pool_key = ido_pool.key();

        let (fee_burned, fee_forwarded) = if fee_config.fee_amount > 0 {
            ctx.accounts.collect_creation_fee(&fee_config)?
        } else {
            (0, 0)
        };

        // Escrow the full worst case: every entitlement plus the liquidity side
        ledger::transfer_tokens(
            ctx.accounts.token_program.to_account_info(),
            ctx.accounts.creator_reward_account.to_account_info(),
            ctx.accounts.reward_mint.to_account_info(),
            ctx.accounts.reward_vault.to_account_info(),
            ctx.accounts.creator.to_account_info(),
            reward_reserve,
            ctx.accounts.reward_mint.decimals,
            &[],
        )?;
        ctx.accounts.reward_vault.reload()?;
        require!(
            ctx.accounts.reward_vault.amount == reward_reserve,
            IdoError::TransferFailed
        );

        emit!(PoolCreated {
            pool: pool_key,
            factory: factory_key,
            index,
            owner: creator,
            reward_mint: ctx.accounts.reward_mint.key(),
            reward_reserve,
            hard_cap: params.hard_cap,
            start: timestamps.start,
            end: timestamps.end,
            fee_burned,
            fee_forwarded,
            timestamp: clock.unix_timestamp,
        });

        Ok(())
    }

    /// Burn the configured share of the creation fee and forward the rest
    fn collect_creation_fee(&self, config: &FeeConfig) -> Result<(u64, u64)> {
        let fee_mint = self
            .fee_mint
            .as_ref()
            .ok_or(IdoError::InsufficientAllowance)?;
        let source = self
            .creator_fee_account
            .as_ref()
            .ok_or(IdoError::InsufficientAllowance)?;
        let recipient = self
            .fee_recipient_account
            .as_ref()
            .ok_or(IdoError::InsufficientAllowance)?;
        let fee_token_program = self
            .fee_token_program
            .as_ref()
            .ok_or(IdoError::InsufficientAllowance)?;

        require!(
            config.fee_mint == Some(fee_mint.key()),
            IdoError::InsufficientAllowance
        );
        require!(
            source.mint == fee_mint.key() && source.owner == self.creator.key(),
            IdoError::InsufficientAllowance
        );
        require!(
            recipient.mint == fee_mint.key() && recipient.owner == config.fee_recipient,
            IdoError::InsufficientAllowance
        );
        require_keys_eq!(
            *fee_mint.to_account_info().owner,
            fee_token_program.key(),
            IdoError::InsufficientAllowance
        );
        require!(source.amount >= config.fee_amount, IdoError::TransferFailed);

        let (burned, forwarded) = config.split()?;

        if burned > 0 {
            token_interface::burn(
                CpiContext::new(
                    fee_token_program.to_account_info(),
                    Burn {
                        mint: fee_mint.to_account_info(),
                        from: source.to_account_info(),
                        authority: self.creator.to_account_info(),
                    },
                ),
                burned,
            )?;
        }

        ledger::transfer_tokens(
            fee_token_program.to_account_info(),
            source.to_account_info(),
            fee_mint.to_account_info(),
            recipient.to_account_info(),
            self.creator.to_account_info(),
            forwarded,
            fee_mint.decimals,
            &[],
        )?;

        msg!("Creation fee: burned={}, forwarded={}", burned, forwarded);
        Ok((burned, forwarded))
    }
}

#[event]
pub struct PoolCreated {
    pub pool: Pubkey,
    pub factory: Pubkey,
    pub index: u64,
    pub owner: Pubkey,
    pub reward_mint: Pubkey,
    pub reward_reserve: u64,
    pub hard_cap: u64,
    pub start: i64,
    pub end: i64,
    pub fee_burned: u64,
    pub fee_forwarded: u64,
    pub timestamp: i64,
}
