//! Wallet scalars: withdrawal limits and account balance.
//!
//! Neither holds a collection; both are replaced wholesale by their fetches.

use serde::{Deserialize, Serialize};
use tayori_types::{BankDetail, WithdrawConfig};

use crate::domain::Domain;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Withdraw {
    #[serde(default)]
    pub config: Option<WithdrawConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum WithdrawAction {
    SetConfig(Option<WithdrawConfig>),
}

impl Domain for Withdraw {
    const NAME: &'static str = "withdraw";

    type Action = WithdrawAction;

    fn reduce(self, action: WithdrawAction) -> Self {
        match action {
            WithdrawAction::SetConfig(config) => Self { config },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    #[serde(default)]
    pub detail: Option<BankDetail>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum BankAction {
    SetDetail(Option<BankDetail>),
}

impl Domain for Bank {
    const NAME: &'static str = "bank";

    type Action = BankAction;

    fn reduce(self, action: BankAction) -> Self {
        match action {
            BankAction::SetDetail(detail) => Self { detail },
        }
    }
}
