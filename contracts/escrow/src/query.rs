#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{to_json_binary, Binary, Deps, Env, Order, StdResult, Storage};
use cw_storage_plus::Bound;
use itertools::Itertools;
use neutron_sdk::bindings::query::NeutronQuery;

use crossfund::consts::MAX_PAGE_LIMIT;
use crossfund::msg::{AllProposalsResponse, ProposalResponse, QueryMsg};
use crossfund::types::Proposal;

use crate::error::ContractError;
use crate::ica::query_interchain_account_address;
use crate::ledger::address_funds;
use crate::proposal::{load_proposal, proposal_funding};
use crate::state::{ACKNOWLEDGEMENT_RESULTS, APPLICATIONS, CONFIG, ERRORS_QUEUE, PROPOSALS};

/// Expose available contract queries.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps<NeutronQuery>, _env: Env, msg: QueryMsg) -> Result<Binary, ContractError> {
    match msg {
        QueryMsg::AllProposals { start_after, limit } => {
            let limit = limit.unwrap_or(MAX_PAGE_LIMIT).min(MAX_PAGE_LIMIT);
            let proposals = PROPOSALS
                .range(
                    deps.storage,
                    start_after.map(Bound::exclusive),
                    None,
                    Order::Ascending,
                )
                .take(limit as usize)
                .map(|item| {
                    item.and_then(|(id, proposal)| proposal_response(deps.storage, id, proposal))
                })
                .try_collect()?;

            Ok(to_json_binary(&AllProposalsResponse { proposals })?)
        }
        QueryMsg::Proposal { proposal_id } => {
            let proposal = load_proposal(deps.storage, proposal_id)?;
            Ok(to_json_binary(&proposal_response(
                deps.storage,
                proposal_id,
                proposal,
            )?)?)
        }
        QueryMsg::AddressFunds {
            address,
            skip_locked,
        } => Ok(to_json_binary(&address_funds(
            deps.storage,
            &address,
            skip_locked.unwrap_or_default(),
        )?)?),
        QueryMsg::InterchainAccountAddress {
            proposal_id,
            connection_id,
        } => Ok(to_json_binary(&query_interchain_account_address(
            deps.storage,
            proposal_id,
            connection_id,
        )?)?),
        QueryMsg::AcknowledgementResult {
            proposal_id,
            sequence_id,
            channel_id,
        } => {
            let result = match channel_id {
                Some(channel) => ACKNOWLEDGEMENT_RESULTS
                    .may_load(deps.storage, (proposal_id, &channel, sequence_id))?,
                None => ACKNOWLEDGEMENT_RESULTS
                    .sub_prefix(proposal_id)
                    .range(deps.storage, None, None, Order::Ascending)
                    .filter_ok(|((_, sequence), _)| *sequence == sequence_id)
                    .map_ok(|(_, result)| result)
                    .next()
                    .transpose()?,
            };
            Ok(to_json_binary(&result)?)
        }
        QueryMsg::ErrorsQueue {} => {
            let errors = ERRORS_QUEUE
                .range(deps.storage, None, None, Order::Ascending)
                .collect::<StdResult<Vec<_>>>()?;
            Ok(to_json_binary(&errors)?)
        }
        QueryMsg::Config {} => Ok(to_json_binary(&CONFIG.load(deps.storage)?)?),
    }
}

fn proposal_response(
    storage: &dyn Storage,
    id: u64,
    proposal: Proposal,
) -> StdResult<ProposalResponse> {
    let funding = proposal_funding(storage, id)?
        .into_iter()
        .map(|(_, entry)| entry)
        .collect();
    let applications = APPLICATIONS
        .prefix(id)
        .range(storage, None, None, Order::Ascending)
        .try_collect()?;

    Ok(ProposalResponse {
        id,
        title: proposal.title,
        description: proposal.description,
        proposer: proposal.proposer,
        funding,
        applications,
    })
}
