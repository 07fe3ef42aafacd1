//! Wallet payloads.
//!
//! The client stores these as-is; limits and fees are enforced server-side.

use serde::{Deserialize, Serialize};

use crate::Fields;

/// Withdrawal limits and fee rate (percent).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WithdrawConfig {
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: f64,
    #[serde(default)]
    pub rate: f64,
    #[serde(flatten)]
    pub extra: Fields,
}

/// Account balance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BankDetail {
    #[serde(default)]
    pub cash: f64,
    #[serde(flatten)]
    pub extra: Fields,
}
