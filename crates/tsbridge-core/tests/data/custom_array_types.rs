use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultLiquidation {
    #[serde(flatten)]
    pub vault: Vault,
    #[serde(rename = "liquidationHeight")]
    pub liquidation_height: u64,
    #[serde(rename = "liquidationPenalty")]
    pub liquidation_penalty: u64,
    #[serde(rename = "batchCount")]
    pub batch_count: u64,
    pub batches: Vec<VaultLiquidationBatch>,
}
