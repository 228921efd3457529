//! Market Fetching
//!
//! Functions for reading exchange reserves and user balances through a
//! [`ReserveProvider`].

use vex_core::{Address, AssetId};

use crate::provider::ReserveProvider;
use crate::state::{AmmError, Hop, MarketSnapshot, Route, SwapKind};
use crate::validate::SubmitContext;

/// Fetch reserves and fee of the exchange paired with `token`
pub async fn fetch_market<P>(provider: &P, token: &AssetId) -> Result<MarketSnapshot, AmmError>
where
    P: ReserveProvider + ?Sized,
{
    let exchange = provider
        .exchange_for(token)
        .ok_or_else(|| AmmError::MarketNotFound(token.clone()))?;
    let base = AssetId::native();

    let (token_balance, base_balance, fee_bps) = tokio::try_join!(
        provider.balance(&exchange, token),
        provider.balance(&exchange, &base),
        provider.swap_fee(&exchange),
    )?;

    let market = MarketSnapshot {
        exchange,
        token: token.clone(),
        token_reserve: token_balance.value,
        token_decimals: token_balance.decimals,
        base_reserve: base_balance.value,
        base_decimals: base_balance.decimals,
        fee_bps,
    };
    tracing::debug!("Fetched market: {}", market);
    Ok(market)
}

/// Fetch every market a swap of `kind` crosses, oriented input to output
pub async fn fetch_route<P>(
    provider: &P,
    kind: SwapKind,
    input: &AssetId,
    output: &AssetId,
) -> Result<Route, AmmError>
where
    P: ReserveProvider + ?Sized,
{
    match kind {
        SwapKind::BaseToToken => {
            let market = fetch_market(provider, output).await?;
            Ok(Route {
                kind,
                hops: vec![Hop::base_to_token(&market)],
                input_decimals: market.base_decimals,
                output_decimals: market.token_decimals,
            })
        }
        SwapKind::TokenToBase => {
            let market = fetch_market(provider, input).await?;
            Ok(Route {
                kind,
                hops: vec![Hop::token_to_base(&market)],
                input_decimals: market.token_decimals,
                output_decimals: market.base_decimals,
            })
        }
        SwapKind::TokenToToken => {
            let (sell, buy) = tokio::try_join!(
                fetch_market(provider, input),
                fetch_market(provider, output),
            )?;
            Ok(Route {
                kind,
                hops: vec![Hop::token_to_base(&sell), Hop::base_to_token(&buy)],
                input_decimals: sell.token_decimals,
                output_decimals: buy.token_decimals,
            })
        }
    }
}

/// Read the balance and, for token inputs, the exchange allowance that a
/// submission of `input` by `account` is checked against
pub async fn fetch_submit_context<P>(
    provider: &P,
    account: &Address,
    input: &AssetId,
) -> Result<SubmitContext, AmmError>
where
    P: ReserveProvider + ?Sized,
{
    let account = Address::parse(account.as_str())?;
    let balance = provider.balance(&account, input).await?;

    if input.is_native() {
        return Ok(SubmitContext {
            balance,
            allowance: None,
        });
    }

    let spender = provider
        .exchange_for(input)
        .ok_or_else(|| AmmError::MarketNotFound(input.clone()))?;
    let spender = Address::parse(spender.as_str())?;
    let allowance = provider.allowance(input, &account, &spender).await?;

    Ok(SubmitContext {
        balance,
        allowance: Some(allowance),
    })
}
