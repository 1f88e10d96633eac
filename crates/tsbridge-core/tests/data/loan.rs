use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoanStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "IN_LIQUIDATION")]
    InLiquidation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanScheme {
    pub id: String,
    #[serde(rename = "minColRatio")]
    pub min_col_ratio: Decimal,
    pub status: LoanStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
}

impl Loan {
    pub async fn get_loan_scheme(&self, id: String) -> Result<LoanScheme> {
        self.call("getloanscheme", &[id.into()]).await
    }

    pub async fn list_loan_schemes(&self) -> Result<Vec<LoanScheme>> {
        self.call("listloanschemes", &[]).await
    }
}
