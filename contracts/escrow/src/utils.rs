use cosmwasm_std::{Deps, StdResult, Uint128};
use neutron_sdk::bindings::msg::IbcFee;
use neutron_sdk::bindings::query::NeutronQuery;
use neutron_sdk::query::min_ibc_fee::query_min_ibc_fee;

use crossfund::consts::FEE_DENOM;

use crate::error::ContractError;

/// Minimal IBC fee for interchain transactions paid in the native fee denom.
pub fn min_ntrn_ibc_fee(deps: Deps<NeutronQuery>) -> Result<IbcFee, ContractError> {
    let fee = query_min_ibc_fee(deps)?.min_fee;

    Ok(IbcFee {
        recv_fee: fee.recv_fee,
        ack_fee: fee
            .ack_fee
            .into_iter()
            .filter(|a| a.denom == FEE_DENOM)
            .collect(),
        timeout_fee: fee
            .timeout_fee
            .into_iter()
            .filter(|a| a.denom == FEE_DENOM)
            .collect(),
    })
}

/// Amount escrowed by the fee refunder for a single interchain transaction.
pub fn total_fee_amount(fee: &IbcFee) -> StdResult<Uint128> {
    fee.ack_fee
        .iter()
        .chain(&fee.timeout_fee)
        .filter(|coin| coin.denom == FEE_DENOM)
        .try_fold(Uint128::zero(), |acc, coin| Ok(acc.checked_add(coin.amount)?))
}
