use std::num::IntErrorKind;

use cosmos_sdk_proto::cosmos::bank::v1beta1::MsgSend;
use cosmos_sdk_proto::cosmos::tx::v1beta1::{TxBody, TxRaw};
use cosmwasm_std::{
    attr, Binary, DepsMut, Env, Response, StdError, Storage, SubMsg, Uint128,
};
use neutron_sdk::bindings::msg::NeutronMsg;
use neutron_sdk::bindings::query::NeutronQuery;
use neutron_sdk::bindings::types::Height;
use neutron_sdk::interchain_queries::v045::new_register_transfers_query_msg;
use prost::Message;
use sha2::{Digest, Sha256};

use crossfund::consts::{AUTO_AGREE_MEMO, BANK_SEND_TYPE_URL, MAX_TRANSFER_MESSAGES};
use crossfund::types::{Config, FundingEntry};

use crate::error::ContractError;
use crate::ica::{load_registration, queue_failure};
use crate::instantiate::TRANSFERS_QUERY_REPLY_ID;
use crate::proposal::record_funding;
use crate::state::{
    CONFIG, INTERCHAIN_ACCOUNTS, PENDING_QUERY, PROCESSED_TXS, TRANSFERS_QUERIES,
};

/// Build an interchain TX query watching incoming bank transfers to `recipient`.
/// The query id is bound to the registration in reply.
pub fn transfers_query_submsg(
    config: &Config,
    connection_id: &str,
    recipient: &str,
    min_height: Option<u64>,
    reply_always: bool,
) -> Result<SubMsg<NeutronMsg>, ContractError> {
    let msg = new_register_transfers_query_msg(
        connection_id.to_string(),
        recipient.to_string(),
        config.update_period,
        min_height,
    )?;

    Ok(if reply_always {
        SubMsg::reply_always(msg, TRANSFERS_QUERY_REPLY_ID)
    } else {
        SubMsg::reply_on_success(msg, TRANSFERS_QUERY_REPLY_ID)
    })
}

/// Register the transfers query of an already resolved interchain account.
pub fn register_transfers_query(
    deps: DepsMut<NeutronQuery>,
    proposal_id: u64,
    connection_id: String,
    min_height: Option<u64>,
) -> Result<Response<NeutronMsg>, ContractError> {
    let registration = load_registration(deps.storage, proposal_id, &connection_id)?;
    let address = registration
        .address
        .ok_or_else(|| ContractError::IcaNotResolved {
            proposal_id,
            connection_id: connection_id.clone(),
        })?;
    if let Some(query_id) = registration.transfers_query_id {
        return Err(ContractError::TransfersQueryExists(query_id));
    }

    let config = CONFIG.load(deps.storage)?;
    let submsg = transfers_query_submsg(&config, &connection_id, &address, min_height, false)?;
    PENDING_QUERY.save(deps.storage, &(proposal_id, connection_id.clone()))?;

    Ok(Response::new().add_submessage(submsg).add_attributes([
        attr("action", "register_transfers_query"),
        attr("proposal_id", proposal_id.to_string()),
        attr("connection_id", connection_id),
        attr("address", address),
    ]))
}

/// Bind a freshly registered transfers query to the registration waiting for it.
pub fn bind_transfers_query(
    storage: &mut dyn Storage,
    query_id: u64,
) -> Result<Response<NeutronMsg>, ContractError> {
    let (proposal_id, connection_id) = PENDING_QUERY.load(storage)?;
    PENDING_QUERY.remove(storage);

    INTERCHAIN_ACCOUNTS.update(storage, (proposal_id, &connection_id), |registration| {
        let mut registration = registration.ok_or_else(|| {
            StdError::generic_err(format!(
                "Registration for proposal {proposal_id} on {connection_id} disappeared"
            ))
        })?;
        registration.transfers_query_id = Some(query_id);
        Ok::<_, StdError>(registration)
    })?;
    TRANSFERS_QUERIES.save(storage, query_id, &(proposal_id, connection_id.clone()))?;

    Ok(Response::new().add_attributes([
        attr("action", "bind_transfers_query"),
        attr("proposal_id", proposal_id.to_string()),
        attr("connection_id", connection_id),
        attr("query_id", query_id.to_string()),
    ]))
}

/// The automatic query registration failed. The account stays resolved and the
/// query can be registered again with `register_transfers_query`.
pub fn transfers_query_failed(
    storage: &mut dyn Storage,
    error: String,
) -> Result<Response<NeutronMsg>, ContractError> {
    let pending = PENDING_QUERY.may_load(storage)?;
    PENDING_QUERY.remove(storage);

    let error = match pending {
        Some((proposal_id, connection_id)) => {
            format!("transfers query for proposal {proposal_id} on {connection_id}: {error}")
        }
        None => error,
    };
    queue_failure(storage, "register_transfers_query", error)
}

fn decode_err(err: prost::DecodeError) -> StdError {
    StdError::generic_err(format!("Can't decode remote transaction: {err}"))
}

/// Fold bank transfers to an interchain account into the proposal funding.
/// Every remote transaction is accounted for at most once.
pub fn reconcile(
    deps: DepsMut<NeutronQuery>,
    env: Env,
    query_id: u64,
    height: Height,
    data: Binary,
) -> Result<Response<NeutronMsg>, ContractError> {
    let (proposal_id, connection_id) = TRANSFERS_QUERIES
        .may_load(deps.storage, query_id)?
        .ok_or_else(|| StdError::generic_err(format!("Unknown transfers query {query_id}")))?;
    let address = load_registration(deps.storage, proposal_id, &connection_id)?
        .address
        .ok_or_else(|| ContractError::IcaNotResolved {
            proposal_id,
            connection_id: connection_id.clone(),
        })?;

    let tx_hash = Sha256::digest(data.as_slice());
    let tx_key = (proposal_id, connection_id.as_str(), tx_hash.as_slice());
    let response = Response::new().add_attributes([
        attr("action", "reconcile"),
        attr("proposal_id", proposal_id.to_string()),
        attr("query_id", query_id.to_string()),
        attr("remote_height", height.revision_height.to_string()),
        attr("tx_hash", Binary::from(tx_hash.as_slice()).to_base64()),
    ]);
    if PROCESSED_TXS.has(deps.storage, tx_key) {
        return Ok(response.add_attribute("duplicate", "true"));
    }

    let tx = TxRaw::decode(data.as_slice()).map_err(decode_err)?;
    let body = TxBody::decode(tx.body_bytes.as_slice()).map_err(decode_err)?;
    let auto_agree = body.memo == AUTO_AGREE_MEMO;

    let mut deposits = vec![];
    for message in body.messages.iter().take(MAX_TRANSFER_MESSAGES) {
        if message.type_url != BANK_SEND_TYPE_URL {
            continue;
        }
        let transfer = MsgSend::decode(message.value.as_slice()).map_err(decode_err)?;
        if transfer.to_address != address {
            continue;
        }
        for coin in transfer.amount {
            let amount = coin.amount.parse::<u128>().map_err(|err| match err.kind() {
                IntErrorKind::PosOverflow => StdError::generic_err(format!(
                    "Transfer of {} {} exceeds the maximum of {}",
                    coin.amount,
                    coin.denom,
                    u128::MAX
                )),
                _ => StdError::generic_err(format!("Invalid amount {} {}", coin.amount, coin.denom)),
            })?;
            let recorded = record_funding(
                deps.storage,
                proposal_id,
                FundingEntry {
                    denom: coin.denom.clone(),
                    amount: Uint128::new(amount),
                    sender: transfer.from_address.clone(),
                    auto_agree,
                    native: false,
                    locked: false,
                    remote: Some(address.clone()),
                },
            )?;
            if recorded.is_some() {
                deposits.push(attr(
                    "deposit",
                    format!("{}:{amount}{}", transfer.from_address, coin.denom),
                ));
            }
        }
    }

    if deposits.is_empty() {
        return Err(StdError::generic_err(format!(
            "No transfers to {address} found in remote transaction"
        ))
        .into());
    }

    PROCESSED_TXS.save(deps.storage, tx_key, &env.block.height)?;

    Ok(response.add_attributes(deposits))
}
