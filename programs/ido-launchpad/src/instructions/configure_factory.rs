use anchor_lang::prelude::*;

use crate::constants::*;
use crate::instructions::initialize_factory::FactoryConfigured;
use crate::state::*;

/// Owner-only administration of the pool registry
#[derive(Accounts)]
pub struct ConfigureFactory<'info> {
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [FACTORY_SEED],
        bump = ido_factory.bump
    )]
    pub ido_factory: Account<'info, IdoFactory>,
}

/// Change the creation fee and the burned share of it
pub fn configure_handler(
    ctx: Context<ConfigureFactory>,
    fee_mint: Option<Pubkey>,
    fee_amount: u64,
    burn_numerator: u64,
    burn_denominator: u64,
) -> Result<()> {
    let ido_factory = &mut ctx.accounts.ido_factory;
    ido_factory.configure(
        ctx.accounts.owner.key(),
        fee_mint,
        fee_amount,
        burn_numerator,
        burn_denominator,
    )?;

    emit!(FactoryConfigured {
        factory: ido_factory.key(),
        fee_mint,
        fee_amount,
        burn_numerator,
        burn_denominator,
        fee_recipient: ido_factory.fee_recipient,
    });

    Ok(())
}

pub fn set_fee_recipient_handler(ctx: Context<ConfigureFactory>, recipient: Pubkey) -> Result<()> {
    let ido_factory = &mut ctx.accounts.ido_factory;
    ido_factory.set_fee_recipient(ctx.accounts.owner.key(), recipient)?;

    msg!("Fee recipient set to {}", recipient);
    Ok(())
}

pub fn transfer_ownership_handler(ctx: Context<ConfigureFactory>, new_owner: Pubkey) -> Result<()> {
    let ido_factory = &mut ctx.accounts.ido_factory;
    let previous_owner = ido_factory.owner;
    ido_factory.transfer_ownership(ctx.accounts.owner.key(), new_owner)?;

    emit!(OwnershipTransferred {
        registry: ido_factory.key(),
        previous_owner,
        new_owner,
    });

    Ok(())
}

#[event]
pub struct OwnershipTransferred {
    pub registry: Pubkey,
    pub previous_owner: Pubkey,
    pub new_owner: Pubkey,
}
