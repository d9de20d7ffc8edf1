/// Denom used to pay IBC fees
pub const FEE_DENOM: &str = "untrn";
/// Default number of blocks between two runs of an interchain transfers query
pub const DEFAULT_UPDATE_PERIOD: u64 = 6;
/// Timeout for interchain account transactions in seconds
pub const ICA_TX_TIMEOUT: u64 = 3600;
/// Sum of shares every application must distribute
pub const TOTAL_SHARE: u32 = 100;
/// Max number of applicants plus auditors in one application
pub const MAX_SHAREHOLDERS: usize = 50;
/// Max number of messages inspected in a single remote transaction
pub const MAX_TRANSFER_MESSAGES: usize = 20;
/// Remote deposits carrying this memo auto agree to the majority decision
pub const AUTO_AGREE_MEMO: &str = "auto_agree";
/// Approved funds must exceed this percentage of a denom's funding to pull in auto agreeing funds
pub const AUTO_AGREE_MAJORITY_PERCENT: u64 = 50;
/// Protobuf type url of the Cosmos SDK bank send message
pub const BANK_SEND_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";
/// Interchain accounts controller port prefix
pub const ICA_CONTROLLER_PORT_PREFIX: &str = "icacontroller-";
/// Max items per page in queries
pub const MAX_PAGE_LIMIT: u32 = 50;
