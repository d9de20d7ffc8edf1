use cosmwasm_schema::cw_serde;
use cosmwasm_std::Binary;
use cw_multi_test::{Contract, ContractWrapper};
use neutron_sdk::bindings::msg::NeutronMsg;
use neutron_sdk::bindings::query::NeutronQuery;

pub fn escrow_contract() -> Box<dyn Contract<NeutronMsg, NeutronQuery>> {
    Box::new(
        ContractWrapper::new(
            crossfund_escrow::execute::execute,
            crossfund_escrow::instantiate::instantiate,
            crossfund_escrow::query::query,
        )
        .with_sudo(crossfund_escrow::sudo::sudo)
        .with_reply(crossfund_escrow::instantiate::reply)
        .with_migrate_empty(crossfund_escrow::migration::migrate),
    )
}

/// Relayer packet as delivered in interchain transaction callbacks.
#[cw_serde]
pub struct TestRequestPacket {
    pub sequence: Option<u64>,
    pub source_channel: Option<String>,
}

#[cw_serde]
pub struct TestHeight {
    pub revision_number: u64,
    pub revision_height: u64,
}

/// Sudo callbacks the Neutron chain delivers to the escrow.
#[cw_serde]
pub enum TestSudoMsg {
    Response {
        request: TestRequestPacket,
        data: Binary,
    },
    Error {
        request: TestRequestPacket,
        details: String,
    },
    Timeout {
        request: TestRequestPacket,
    },
    OpenAck {
        port_id: String,
        channel_id: String,
        counterparty_channel_id: String,
        counterparty_version: String,
    },
    TxQueryResult {
        query_id: u64,
        height: TestHeight,
        data: Binary,
    },
}
