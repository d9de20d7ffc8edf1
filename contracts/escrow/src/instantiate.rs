#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    attr, ensure, from_json, DepsMut, Env, MessageInfo, Reply, Response, StdError, SubMsgResponse,
    SubMsgResult,
};
use cw2::set_contract_version;
use neutron_sdk::bindings::msg::{
    MsgRegisterInterchainQueryResponse, MsgSubmitTxResponse, NeutronMsg,
};
use neutron_sdk::bindings::query::NeutronQuery;

use crossfund::consts::DEFAULT_UPDATE_PERIOD;
use crossfund::msg::InstantiateMsg;
use crossfund::types::Config;

use crate::error::ContractError;
use crate::observer::{bind_transfers_query, transfers_query_failed};
use crate::state::CONFIG;
use crate::withdraw::track_withdrawal;

/// Contract name that is used for migration.
pub const CONTRACT_NAME: &str = env!("CARGO_PKG_NAME");
/// Contract version that is used for migration.
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");
/// ID for the interchain transaction submission reply
pub const SUBMIT_TX_REPLY_ID: u64 = 1;
/// ID for the transfers query registration reply
pub const TRANSFERS_QUERY_REPLY_ID: u64 = 2;

/// Creates a new contract with the specified parameters in the [`InstantiateMsg`].
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut<NeutronQuery>,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response<NeutronMsg>, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let owner = msg
        .owner
        .map(|owner| deps.api.addr_validate(&owner))
        .transpose()?
        .unwrap_or(info.sender);

    let update_period = msg.update_period.unwrap_or(DEFAULT_UPDATE_PERIOD);
    ensure!(
        update_period > 0,
        StdError::generic_err("Update period must be positive")
    );

    let config = Config {
        owner,
        update_period,
        unlock_on_expiry: msg.unlock_on_expiry.unwrap_or(true),
    };
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attributes([
        attr("action", "instantiate_escrow"),
        attr("owner", config.owner),
        attr("update_period", config.update_period.to_string()),
    ]))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn reply(
    deps: DepsMut<NeutronQuery>,
    _env: Env,
    msg: Reply,
) -> Result<Response<NeutronMsg>, ContractError> {
    match msg {
        Reply {
            id: TRANSFERS_QUERY_REPLY_ID,
            result:
                SubMsgResult::Ok(SubMsgResponse {
                    data: Some(data), ..
                }),
        } => {
            let response: MsgRegisterInterchainQueryResponse = from_json(data)?;
            bind_transfers_query(deps.storage, response.id)
        }
        Reply {
            id: TRANSFERS_QUERY_REPLY_ID,
            result: SubMsgResult::Err(err),
        } => transfers_query_failed(deps.storage, err),
        Reply {
            id: SUBMIT_TX_REPLY_ID,
            result:
                SubMsgResult::Ok(SubMsgResponse {
                    data: Some(data), ..
                }),
        } => {
            let response: MsgSubmitTxResponse = from_json(data)?;
            track_withdrawal(deps.storage, response.channel, response.sequence_id)
        }
        _ => Err(ContractError::FailedToParseReply {}),
    }
}
