use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressInfoEmbedded {
    pub address: String,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: String,
    pub isscript: bool,
    pub iswitness: bool,
    pub witness_version: u64,
    pub witness_program: String,
    pub script: ScriptType,
    pub hex: String,
    pub sigsrequired: u64,
    pub pubkey: String,
    pub pubkeys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub embedded: AddressInfoEmbedded,
}
