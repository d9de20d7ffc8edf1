#![allow(dead_code)]

use cosmos_sdk_proto::cosmos::bank::v1beta1::MsgSend;
use cosmos_sdk_proto::cosmos::base::v1beta1::Coin as ProtoCoin;
use cosmos_sdk_proto::cosmos::tx::v1beta1::{TxBody, TxRaw};
use cosmos_sdk_proto::prost::Message;
use cosmos_sdk_proto::Any;
use cosmwasm_std::{
    to_json_string, Addr, Binary, BlockInfo, Coin, Empty, MemoryStorage, StdResult, Timestamp,
    Uint128,
};
use cw_multi_test::error::AnyResult;
use cw_multi_test::{
    no_init, App, AppBuilder, AppResponse, BankKeeper, BankSudo, DistributionKeeper, Executor,
    GovFailingModule, IbcFailingModule, MockAddressGenerator, MockApiBech32, StakeKeeper,
    StargateFailingModule, WasmKeeper,
};
use cw_utils::Expiration;
use derivative::Derivative;
use neutron_sdk::bindings::msg::NeutronMsg;
use neutron_sdk::bindings::query::NeutronQuery;
use neutron_sdk::bindings::types::ProtobufAny;

use crossfund::consts::BANK_SEND_TYPE_URL;
use crossfund::ica::{get_port_id, proposal_ica_id, OpenAckVersion};
use crossfund::msg::{
    AllProposalsResponse, ApplicationSubmission, ExecuteMsg, InstantiateMsg,
    InterchainAccountAddressResponse, ProposalResponse, QueryMsg,
};
use crossfund::types::{AcknowledgementResult, Config, CustodyEntry, ShareHolder};

use crate::common::contracts::{escrow_contract, TestHeight, TestRequestPacket, TestSudoMsg};
use crate::common::neutron_module::{
    MockNeutronModule, ICA_CHANNEL, ICA_CHANNELS, SUBMITTED_TXS,
};

pub const DENOM: &str = "untrn";
pub const CONNECTION_ID: &str = "connection-0";
pub const HOST_CONNECTION_ID: &str = "connection-7";

pub type NeutronApp = App<
    BankKeeper,
    MockApiBech32,
    MemoryStorage,
    MockNeutronModule,
    WasmKeeper<NeutronMsg, NeutronQuery>,
    StakeKeeper,
    DistributionKeeper,
    IbcFailingModule,
    GovFailingModule,
    StargateFailingModule,
>;

fn mock_ntrn_app(failing_queries: bool) -> NeutronApp {
    let api = MockApiBech32::new("neutron");
    let neutron_module = if failing_queries {
        MockNeutronModule::failing_queries(&api)
    } else {
        MockNeutronModule::new(&api)
    };
    AppBuilder::new_custom()
        .with_custom(neutron_module)
        .with_api(api)
        .with_wasm(WasmKeeper::new().with_address_generator(MockAddressGenerator))
        .with_block(BlockInfo {
            height: 1,
            time: Timestamp::from_seconds(1_700_000_000),
            chain_id: "cw-multitest-1".to_string(),
        })
        .build(no_init)
}

/// Builds a remote transaction carrying bank transfers as relayed by an interchain TX query.
pub fn remote_transfers_tx(transfers: &[(&str, &str, Coin)], memo: &str) -> Binary {
    let transfers = transfers
        .iter()
        .map(|(from, to, coin)| (*from, *to, coin.denom.clone(), coin.amount.to_string()))
        .collect::<Vec<_>>();
    encode_transfers(&transfers, memo)
}

/// Same as [`remote_transfers_tx`] with the amount given verbatim as the host chain encodes it.
pub fn remote_raw_transfer_tx(from: &str, to: &str, denom: &str, amount: &str) -> Binary {
    encode_transfers(&[(from, to, denom.to_string(), amount.to_string())], "")
}

fn encode_transfers(transfers: &[(&str, &str, String, String)], memo: &str) -> Binary {
    let messages = transfers
        .iter()
        .map(|(from, to, denom, amount)| Any {
            type_url: BANK_SEND_TYPE_URL.to_string(),
            value: MsgSend {
                from_address: from.to_string(),
                to_address: to.to_string(),
                amount: vec![ProtoCoin {
                    denom: denom.clone(),
                    amount: amount.clone(),
                }],
            }
            .encode_to_vec(),
        })
        .collect();
    let body = TxBody {
        messages,
        memo: memo.to_string(),
        ..Default::default()
    };
    let tx = TxRaw {
        body_bytes: body.encode_to_vec(),
        ..Default::default()
    };

    Binary::from(tx.encode_to_vec())
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct EscrowHelper {
    #[derivative(Debug = "ignore")]
    pub app: NeutronApp,
    pub owner: Addr,
    pub escrow: Addr,
}

impl EscrowHelper {
    pub fn new() -> Self {
        Self::with_options(
            InstantiateMsg {
                owner: None,
                update_period: None,
                unlock_on_expiry: None,
            },
            false,
        )
    }

    pub fn with_options(msg: InstantiateMsg, failing_queries: bool) -> Self {
        let mut app = mock_ntrn_app(failing_queries);
        let owner = app.api().addr_make("owner");

        let escrow_code_id = app.store_code(escrow_contract());
        let escrow = app
            .instantiate_contract(
                escrow_code_id,
                owner.clone(),
                &msg,
                &[],
                "CrossFund",
                Some(owner.to_string()),
            )
            .unwrap();

        Self { app, owner, escrow }
    }

    pub fn addr(&self, name: &str) -> Addr {
        self.app.api().addr_make(name)
    }

    /// Remote chain address of a 32 byte account.
    pub fn remote_addr(&self, name: &str) -> String {
        MockApiBech32::new("cosmos").addr_make(name).to_string()
    }

    pub fn mint_tokens(&mut self, user: &Addr, coins: &[Coin]) -> AnyResult<AppResponse> {
        self.app.sudo(
            BankSudo::Mint {
                to_address: user.to_string(),
                amount: coins.to_vec(),
            }
            .into(),
        )
    }

    pub fn balance(&self, user: &Addr, denom: &str) -> Uint128 {
        self.app
            .wrap()
            .query_balance(user, denom)
            .unwrap()
            .amount
    }

    pub fn timetravel(&mut self, time: u64) {
        self.app.update_block(|block| {
            block.time = block.time.plus_seconds(time);
        })
    }

    pub fn blocktravel(&mut self, blocks: u64) {
        self.app.update_block(|block| {
            block.height += blocks;
        })
    }

    pub fn block_height(&self) -> u64 {
        self.app.block_info().height
    }

    fn execute(&mut self, sender: &Addr, msg: &ExecuteMsg, funds: &[Coin]) -> AnyResult<AppResponse> {
        self.app
            .execute_contract(sender.clone(), self.escrow.clone(), msg, funds)
    }

    /// Migrate the escrow to a freshly stored copy of its code.
    pub fn migrate(&mut self, sender: &Addr) -> AnyResult<AppResponse> {
        let code_id = self.app.store_code(escrow_contract());
        self.app
            .migrate_contract(sender.clone(), self.escrow.clone(), &Empty {}, code_id)
    }

    pub fn submit_proposal(&mut self, sender: &Addr, title: &str) -> AnyResult<u64> {
        let response = self.execute(
            sender,
            &ExecuteMsg::SubmitProposal {
                title: title.to_string(),
                description: format!("{title} description"),
            },
            &[],
        )?;

        let id = response
            .events
            .iter()
            .flat_map(|event| &event.attributes)
            .find(|attr| attr.key == "proposal_id")
            .map(|attr| attr.value.parse().unwrap())
            .unwrap();
        Ok(id)
    }

    pub fn fund_proposal(
        &mut self,
        sender: &Addr,
        proposal_id: u64,
        funds: &[Coin],
        auto_agree: bool,
    ) -> AnyResult<AppResponse> {
        if !funds.is_empty() {
            self.mint_tokens(sender, funds).unwrap();
        }
        self.execute(
            sender,
            &ExecuteMsg::FundProposal {
                proposal_id,
                auto_agree: Some(auto_agree),
            },
            funds,
        )
    }

    pub fn submit_application(
        &mut self,
        sender: &Addr,
        proposal_id: u64,
        applicants: &[(&Addr, u8)],
        auditors: &[(&Addr, u8)],
        deliver_by: Expiration,
    ) -> AnyResult<AppResponse> {
        let holders = |holders: &[(&Addr, u8)]| {
            holders
                .iter()
                .map(|(recipient, percent_share)| ShareHolder {
                    recipient: (*recipient).clone(),
                    percent_share: *percent_share,
                })
                .collect::<Vec<_>>()
        };
        self.execute(
            sender,
            &ExecuteMsg::SubmitApplication {
                proposal_id,
                application: ApplicationSubmission {
                    applicants: holders(applicants),
                    auditors: holders(auditors),
                    deliver_by,
                },
            },
            &[],
        )
    }

    pub fn approve(
        &mut self,
        sender: &Addr,
        proposal_id: u64,
        applicant: &Addr,
    ) -> AnyResult<AppResponse> {
        self.execute(
            sender,
            &ExecuteMsg::ApproveApplication {
                proposal_id,
                application_sender: applicant.to_string(),
            },
            &[],
        )
    }

    pub fn accept(
        &mut self,
        sender: &Addr,
        proposal_id: u64,
        applicant: &Addr,
    ) -> AnyResult<AppResponse> {
        self.execute(
            sender,
            &ExecuteMsg::AcceptApplication {
                proposal_id,
                application_sender: applicant.to_string(),
            },
            &[],
        )
    }

    pub fn verify(
        &mut self,
        sender: &Addr,
        proposal_id: u64,
        applicant: &Addr,
        stop_at: Option<u64>,
    ) -> AnyResult<AppResponse> {
        self.execute(
            sender,
            &ExecuteMsg::VerifyApplication {
                proposal_id,
                application_sender: applicant.to_string(),
                stop_at,
            },
            &[],
        )
    }

    pub fn release_expired(
        &mut self,
        sender: &Addr,
        proposal_id: u64,
        applicant: &Addr,
    ) -> AnyResult<AppResponse> {
        self.execute(
            sender,
            &ExecuteMsg::ReleaseExpiredApplication {
                proposal_id,
                application_sender: applicant.to_string(),
            },
            &[],
        )
    }

    pub fn withdraw(
        &mut self,
        sender: &Addr,
        proposal_id: u64,
        remote_recipient: Option<String>,
        funds: &[Coin],
    ) -> AnyResult<AppResponse> {
        self.execute(
            sender,
            &ExecuteMsg::WithdrawFunds {
                proposal_id,
                remote_recipient,
            },
            funds,
        )
    }

    pub fn update_config(
        &mut self,
        sender: &Addr,
        update_period: Option<u64>,
        unlock_on_expiry: Option<bool>,
    ) -> AnyResult<AppResponse> {
        self.execute(
            sender,
            &ExecuteMsg::UpdateConfig {
                update_period,
                unlock_on_expiry,
            },
            &[],
        )
    }

    pub fn register_ica(
        &mut self,
        sender: &Addr,
        proposal_id: u64,
        connection_id: &str,
    ) -> AnyResult<AppResponse> {
        self.execute(
            sender,
            &ExecuteMsg::RegisterIca {
                proposal_id,
                connection_id: connection_id.to_string(),
            },
            &[],
        )
    }

    pub fn register_transfers_query(
        &mut self,
        sender: &Addr,
        proposal_id: u64,
        connection_id: &str,
    ) -> AnyResult<AppResponse> {
        self.execute(
            sender,
            &ExecuteMsg::RegisterTransfersQuery {
                proposal_id,
                connection_id: connection_id.to_string(),
                min_height: None,
            },
            &[],
        )
    }

    pub fn port_id(&self, proposal_id: u64) -> String {
        get_port_id(self.escrow.as_str(), &proposal_ica_id(proposal_id))
    }

    pub fn sudo(&mut self, msg: &TestSudoMsg) -> AnyResult<AppResponse> {
        self.app.wasm_sudo(self.escrow.clone(), msg)
    }

    /// Channel handshake acknowledgement carrying the remote account address.
    pub fn open_ack(
        &mut self,
        proposal_id: u64,
        connection_id: &str,
        address: &str,
    ) -> AnyResult<AppResponse> {
        let version = OpenAckVersion {
            version: "ics27-1".to_string(),
            controller_connection_id: connection_id.to_string(),
            host_connection_id: HOST_CONNECTION_ID.to_string(),
            address: address.to_string(),
            encoding: "proto3".to_string(),
            tx_type: "sdk_multi_msg".to_string(),
        };
        let port_id = self.port_id(proposal_id);
        let channel_id = self.ica_channel(proposal_id, connection_id);
        self.sudo(&TestSudoMsg::OpenAck {
            port_id,
            channel_id,
            counterparty_channel_id: "channel-42".to_string(),
            counterparty_version: to_json_string(&version).unwrap(),
        })
    }

    /// Channel opened for an interchain account. Unregistered accounts fall back to the
    /// first channel.
    pub fn ica_channel(&self, proposal_id: u64, connection_id: &str) -> String {
        ICA_CHANNELS
            .may_load(
                self.app.storage(),
                (connection_id, proposal_ica_id(proposal_id).as_str()),
            )
            .unwrap()
            .unwrap_or_else(|| ICA_CHANNEL.to_string())
    }

    /// Register an interchain account and complete its handshake.
    pub fn create_ica(&mut self, proposal_id: u64, name: &str) -> String {
        self.create_ica_on(proposal_id, CONNECTION_ID, name)
    }

    pub fn create_ica_on(&mut self, proposal_id: u64, connection_id: &str, name: &str) -> String {
        let address = self.remote_addr(name);
        let owner = self.owner.clone();
        self.register_ica(&owner, proposal_id, connection_id).unwrap();
        self.open_ack(proposal_id, connection_id, &address).unwrap();
        address
    }

    pub fn tx_query_result(&mut self, query_id: u64, data: Binary) -> AnyResult<AppResponse> {
        let revision_height = self.block_height();
        self.sudo(&TestSudoMsg::TxQueryResult {
            query_id,
            height: TestHeight {
                revision_number: 0,
                revision_height,
            },
            data,
        })
    }

    pub fn packet(sequence: u64) -> TestRequestPacket {
        Self::packet_on(ICA_CHANNEL, sequence)
    }

    pub fn packet_on(channel: &str, sequence: u64) -> TestRequestPacket {
        TestRequestPacket {
            sequence: Some(sequence),
            source_channel: Some(channel.to_string()),
        }
    }

    pub fn submitted_txs(&self) -> Vec<(String, String, Vec<ProtobufAny>)> {
        SUBMITTED_TXS
            .may_load(self.app.storage())
            .unwrap()
            .unwrap_or_default()
    }

    pub fn query_config(&self) -> StdResult<Config> {
        self.app
            .wrap()
            .query_wasm_smart(&self.escrow, &QueryMsg::Config {})
    }

    pub fn query_proposal(&self, proposal_id: u64) -> StdResult<ProposalResponse> {
        self.app
            .wrap()
            .query_wasm_smart(&self.escrow, &QueryMsg::Proposal { proposal_id })
    }

    pub fn query_proposals(
        &self,
        start_after: Option<u64>,
        limit: Option<u32>,
    ) -> StdResult<AllProposalsResponse> {
        self.app.wrap().query_wasm_smart(
            &self.escrow,
            &QueryMsg::AllProposals { start_after, limit },
        )
    }

    pub fn query_funds(
        &self,
        address: &str,
        skip_locked: bool,
    ) -> StdResult<Vec<(String, CustodyEntry)>> {
        self.app.wrap().query_wasm_smart(
            &self.escrow,
            &QueryMsg::AddressFunds {
                address: address.to_string(),
                skip_locked: Some(skip_locked),
            },
        )
    }

    /// Sum of custody rows of an address in a denom.
    pub fn custody(&self, address: &str, denom: &str, locked: Option<bool>) -> Uint128 {
        self.query_funds(address, false)
            .unwrap()
            .into_iter()
            .filter(|(row_denom, entry)| {
                row_denom == denom && locked.map_or(true, |locked| entry.locked == locked)
            })
            .map(|(_, entry)| entry.amount)
            .sum()
    }

    pub fn query_ica(
        &self,
        proposal_id: u64,
        connection_id: &str,
    ) -> StdResult<InterchainAccountAddressResponse> {
        self.app.wrap().query_wasm_smart(
            &self.escrow,
            &QueryMsg::InterchainAccountAddress {
                proposal_id,
                connection_id: connection_id.to_string(),
            },
        )
    }

    pub fn query_ack(
        &self,
        proposal_id: u64,
        sequence_id: u64,
    ) -> StdResult<Option<AcknowledgementResult>> {
        self.app.wrap().query_wasm_smart(
            &self.escrow,
            &QueryMsg::AcknowledgementResult {
                proposal_id,
                sequence_id,
                channel_id: None,
            },
        )
    }

    pub fn query_ack_on(
        &self,
        proposal_id: u64,
        channel_id: &str,
        sequence_id: u64,
    ) -> StdResult<Option<AcknowledgementResult>> {
        self.app.wrap().query_wasm_smart(
            &self.escrow,
            &QueryMsg::AcknowledgementResult {
                proposal_id,
                sequence_id,
                channel_id: Some(channel_id.to_string()),
            },
        )
    }

    pub fn query_errors(&self) -> StdResult<Vec<(u32, String)>> {
        self.app
            .wrap()
            .query_wasm_smart(&self.escrow, &QueryMsg::ErrorsQueue {})
    }
}
