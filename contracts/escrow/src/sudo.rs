#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{attr, DepsMut, Env, Response};
use neutron_sdk::bindings::msg::NeutronMsg;
use neutron_sdk::bindings::query::NeutronQuery;
use neutron_sdk::sudo::msg::SudoMsg;

use crate::error::ContractError;
use crate::ica::on_open_ack;
use crate::observer::reconcile;
use crate::withdraw::{process_ica_ack, AckOutcome};

/// Callbacks from the Neutron interchain accounts and interchain queries modules.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn sudo(
    deps: DepsMut<NeutronQuery>,
    env: Env,
    msg: SudoMsg,
) -> Result<Response<NeutronMsg>, ContractError> {
    match msg {
        SudoMsg::OpenAck {
            port_id,
            channel_id,
            counterparty_channel_id,
            counterparty_version,
        } => on_open_ack(
            deps,
            env,
            port_id,
            channel_id,
            counterparty_channel_id,
            counterparty_version,
        ),
        SudoMsg::TxQueryResult {
            query_id,
            height,
            data,
        } => reconcile(deps, env, query_id, height, data),
        SudoMsg::Response { request, data } => {
            process_ica_ack(deps.storage, request, AckOutcome::Response(data))
        }
        SudoMsg::Error { request, details } => {
            process_ica_ack(deps.storage, request, AckOutcome::Error(details))
        }
        SudoMsg::Timeout { request } => {
            process_ica_ack(deps.storage, request, AckOutcome::Timeout)
        }
        _ => Ok(Response::new().add_attributes([attr("action", "sudo"), attr("ignored", "true")])),
    }
}
