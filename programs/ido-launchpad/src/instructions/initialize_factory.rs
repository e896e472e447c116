use anchor_lang::prelude::*;

use crate::constants::*;
use crate::state::*;

/// Create the pool registry
///
/// Called once; the signer becomes the registry owner.
///
/// Accounts:
/// - owner: Registry owner (signer, pays rent)
/// - ido_factory: Registry account (PDA)
/// - system_program: System program
#[derive(Accounts)]
pub struct InitializeFactory<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        init,
        payer = owner,
        space = IdoFactory::SIZE,
        seeds = [FACTORY_SEED],
        bump
    )]
    pub ido_factory: Account<'info, IdoFactory>,

    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<InitializeFactory>,
    fee_mint: Option<Pubkey>,
    fee_amount: u64,
    burn_numerator: u64,
    burn_denominator: u64,
    fee_recipient: Pubkey,
) -> Result<()> {
    let ido_factory = &mut ctx.accounts.ido_factory;
    let config = FeeConfig {
        fee_mint,
        fee_amount,
        burn_numerator,
        burn_denominator,
        fee_recipient,
    };

    ido_factory.initialize(ctx.accounts.owner.key(), config, ctx.bumps.ido_factory)?;

    emit!(FactoryConfigured {
        factory: ido_factory.key(),
        fee_mint,
        fee_amount,
        burn_numerator,
        burn_denominator,
        fee_recipient,
    });

    Ok(())
}

#[event]
pub struct FactoryConfigured {
    pub factory: Pubkey,
    pub fee_mint: Option<Pubkey>,
    pub fee_amount: u64,
    pub burn_numerator: u64,
    pub burn_denominator: u64,
    pub fee_recipient: Pubkey,
}
