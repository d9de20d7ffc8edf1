use cosmwasm_std::{
    attr, from_json, DepsMut, Env, MessageInfo, Order, Response, StdResult, Storage,
};
use neutron_sdk::bindings::msg::NeutronMsg;
use neutron_sdk::bindings::query::NeutronQuery;

use crossfund::ica::{get_port_id, proposal_ica_id, proposal_id_from_port, OpenAckVersion};
use crossfund::msg::InterchainAccountAddressResponse;
use crossfund::types::InterchainAccount;

use crate::error::ContractError;
use crate::observer::transfers_query_submsg;
use crate::proposal::ensure_proposal_exists;
use crate::state::{add_error_to_queue, CONFIG, INTERCHAIN_ACCOUNTS, PENDING_QUERY};

/// Open an interchain account owned by the proposal on the given connection.
/// Attached funds pay the registration fee.
pub fn register_ica(
    deps: DepsMut<NeutronQuery>,
    env: Env,
    info: MessageInfo,
    proposal_id: u64,
    connection_id: String,
) -> Result<Response<NeutronMsg>, ContractError> {
    ensure_proposal_exists(deps.storage, proposal_id)?;

    if INTERCHAIN_ACCOUNTS.has(deps.storage, (proposal_id, &connection_id)) {
        return Err(ContractError::AlreadyRegistered {
            proposal_id,
            connection_id,
        });
    }

    let ica_id = proposal_ica_id(proposal_id);
    let port_id = get_port_id(env.contract.address.as_str(), &ica_id);

    INTERCHAIN_ACCOUNTS.save(
        deps.storage,
        (proposal_id, &connection_id),
        &InterchainAccount {
            port_id: port_id.clone(),
            connection_id: connection_id.clone(),
            channel_id: None,
            counterparty_channel_id: None,
            host_connection_id: None,
            address: None,
            transfers_query_id: None,
        },
    )?;

    let register_fee = if info.funds.is_empty() {
        None
    } else {
        Some(info.funds)
    };
    let register_msg =
        NeutronMsg::register_interchain_account(connection_id.clone(), ica_id, register_fee);

    Ok(Response::new().add_message(register_msg).add_attributes([
        attr("action", "register_ica"),
        attr("proposal_id", proposal_id.to_string()),
        attr("connection_id", connection_id),
        attr("port_id", port_id),
    ]))
}

/// Store a failed asynchronous callback and let the callback succeed.
pub fn queue_failure(
    storage: &mut dyn Storage,
    action: &str,
    error: impl ToString,
) -> Result<Response<NeutronMsg>, ContractError> {
    let error = error.to_string();
    let index = add_error_to_queue(storage, format!("{action}: {error}"))?;

    Ok(Response::new().add_attributes([
        attr("action", action),
        attr("error", error),
        attr("errors_queue_index", index.to_string()),
    ]))
}

/// Resolve a pending registration once the host chain acknowledged the channel.
/// Resolution immediately starts watching the account for incoming transfers.
pub fn on_open_ack(
    deps: DepsMut<NeutronQuery>,
    env: Env,
    port_id: String,
    channel_id: String,
    counterparty_channel_id: String,
    counterparty_version: String,
) -> Result<Response<NeutronMsg>, ContractError> {
    const ACTION: &str = "open_ack";

    let proposal_id = match proposal_id_from_port(env.contract.address.as_str(), &port_id) {
        Ok(proposal_id) => proposal_id,
        Err(err) => return queue_failure(deps.storage, ACTION, err),
    };
    let version: OpenAckVersion = match from_json(counterparty_version.as_bytes()) {
        Ok(version) => version,
        Err(err) => {
            return queue_failure(
                deps.storage,
                ACTION,
                format!("Can't parse counterparty version of {port_id}: {err}"),
            )
        }
    };

    let connection_id = version.controller_connection_id;
    let key = (proposal_id, connection_id.as_str());
    let Some(mut registration) = INTERCHAIN_ACCOUNTS.may_load(deps.storage, key)? else {
        return queue_failure(
            deps.storage,
            ACTION,
            format!("Unknown registration for proposal {proposal_id} on {connection_id}"),
        );
    };

    if registration.address.is_some() {
        return Ok(Response::new().add_attributes([
            attr("action", ACTION),
            attr("port_id", port_id),
            attr("ignored", "already_resolved"),
        ]));
    }

    registration.channel_id = Some(channel_id.clone());
    registration.counterparty_channel_id = Some(counterparty_channel_id);
    registration.host_connection_id = Some(version.host_connection_id);
    registration.address = Some(version.address.clone());
    INTERCHAIN_ACCOUNTS.save(deps.storage, key, &registration)?;

    let response = Response::new().add_attributes([
        attr("action", ACTION),
        attr("proposal_id", proposal_id.to_string()),
        attr("connection_id", &connection_id),
        attr("channel_id", channel_id),
        attr("address", &version.address),
    ]);

    let config = CONFIG.load(deps.storage)?;
    match transfers_query_submsg(
        &config,
        &connection_id,
        &version.address,
        Some(env.block.height),
        true,
    ) {
        Ok(submsg) => {
            PENDING_QUERY.save(deps.storage, &(proposal_id, connection_id))?;
            Ok(response.add_submessage(submsg))
        }
        Err(err) => {
            let index = add_error_to_queue(
                deps.storage,
                format!("{ACTION}: can't register transfers query for {connection_id}: {err}"),
            )?;
            Ok(response.add_attribute("errors_queue_index", index.to_string()))
        }
    }
}

pub fn load_registration(
    storage: &dyn Storage,
    proposal_id: u64,
    connection_id: &str,
) -> Result<InterchainAccount, ContractError> {
    INTERCHAIN_ACCOUNTS
        .may_load(storage, (proposal_id, connection_id))?
        .ok_or_else(|| ContractError::RegistrationNotFound {
            proposal_id,
            connection_id: connection_id.to_string(),
        })
}

/// Find the registration of a proposal whose remote address is `address`.
pub fn registration_by_address(
    storage: &dyn Storage,
    proposal_id: u64,
    address: &str,
) -> StdResult<Option<InterchainAccount>> {
    INTERCHAIN_ACCOUNTS
        .prefix(proposal_id)
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, registration)| registration))
        .find(|item| match item {
            Ok(registration) => registration.address.as_deref() == Some(address),
            Err(_) => true,
        })
        .transpose()
}

pub fn query_interchain_account_address(
    storage: &dyn Storage,
    proposal_id: u64,
    connection_id: String,
) -> Result<InterchainAccountAddressResponse, ContractError> {
    let registration = load_registration(storage, proposal_id, &connection_id)?;

    Ok(InterchainAccountAddressResponse {
        interchain_account_address: registration.address,
        port_id: registration.port_id,
        connection_id,
    })
}
