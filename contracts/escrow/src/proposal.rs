use cosmwasm_std::{attr, Addr, DepsMut, MessageInfo, Order, Response, StdResult, Storage};
use cw_utils::PaymentError;
use neutron_sdk::bindings::msg::NeutronMsg;

use crossfund::types::{FundingEntry, Proposal};

use crate::error::ContractError;
use crate::ledger;
use crate::state::{FUNDING, PROPOSALS, PROPOSAL_INDEX};

/// Store a new proposal under the next sequential id.
pub fn create_proposal(
    storage: &mut dyn Storage,
    title: String,
    description: String,
    proposer: Addr,
) -> StdResult<u64> {
    let id = PROPOSAL_INDEX.may_load(storage)?.unwrap_or_default();
    PROPOSALS.save(
        storage,
        id,
        &Proposal {
            title,
            description,
            proposer,
        },
    )?;
    PROPOSAL_INDEX.save(storage, &(id + 1))?;

    Ok(id)
}

pub fn load_proposal(storage: &dyn Storage, proposal_id: u64) -> Result<Proposal, ContractError> {
    PROPOSALS
        .may_load(storage, proposal_id)?
        .ok_or(ContractError::ProposalNotFound(proposal_id))
}

pub fn ensure_proposal_exists(storage: &dyn Storage, proposal_id: u64) -> Result<(), ContractError> {
    if PROPOSALS.has(storage, proposal_id) {
        Ok(())
    } else {
        Err(ContractError::ProposalNotFound(proposal_id))
    }
}

/// Funding entries of a proposal as (index, entry) pairs in deposit order.
pub fn proposal_funding(
    storage: &dyn Storage,
    proposal_id: u64,
) -> StdResult<Vec<(u64, FundingEntry)>> {
    FUNDING
        .prefix(proposal_id)
        .range(storage, None, None, Order::Ascending)
        .collect()
}

/// Append a funding entry to a proposal and credit its sender's custody balance.
/// Entries are never locked on arrival. Returns the entry index or None for zero amounts.
pub fn record_funding(
    storage: &mut dyn Storage,
    proposal_id: u64,
    mut entry: FundingEntry,
) -> Result<Option<u64>, ContractError> {
    ensure_proposal_exists(storage, proposal_id)?;

    if entry.amount.is_zero() {
        return Ok(None);
    }
    entry.locked = false;

    let index = FUNDING
        .prefix(proposal_id)
        .keys(storage, None, None, Order::Descending)
        .next()
        .transpose()?
        .map_or(0, |last| last + 1);
    FUNDING.save(storage, (proposal_id, index), &entry)?;

    ledger::credit(
        storage,
        &entry.sender,
        proposal_id,
        &entry.denom,
        entry.amount,
        entry.remote.as_deref(),
    )?;

    Ok(Some(index))
}

pub fn submit_proposal(
    deps: DepsMut,
    info: MessageInfo,
    title: String,
    description: String,
) -> Result<Response<NeutronMsg>, ContractError> {
    let id = create_proposal(deps.storage, title, description, info.sender.clone())?;

    Ok(Response::new().add_attributes([
        attr("action", "submit_proposal"),
        attr("proposal_id", id.to_string()),
        attr("proposer", info.sender),
    ]))
}

/// Deposit every attached coin as a separate funding entry.
pub fn fund_proposal(
    deps: DepsMut,
    info: MessageInfo,
    proposal_id: u64,
    auto_agree: bool,
) -> Result<Response<NeutronMsg>, ContractError> {
    ensure_proposal_exists(deps.storage, proposal_id)?;

    if info.funds.is_empty() {
        return Err(PaymentError::NoFunds {}.into());
    }

    let mut attrs = vec![
        attr("action", "fund_proposal"),
        attr("proposal_id", proposal_id.to_string()),
        attr("sender", &info.sender),
    ];
    for coin in info.funds {
        let recorded = record_funding(
            deps.storage,
            proposal_id,
            FundingEntry {
                denom: coin.denom.clone(),
                amount: coin.amount,
                sender: info.sender.to_string(),
                auto_agree,
                native: true,
                locked: false,
                remote: None,
            },
        )?;
        if recorded.is_some() {
            attrs.push(attr("funds", coin.to_string()));
        }
    }

    Ok(Response::new().add_attributes(attrs))
}
