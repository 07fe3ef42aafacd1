//! Service response envelope.
//!
//! Every service call resolves to `{ result, data?, message? }`. The flag is
//! authoritative: an envelope with `result = false` never yields data to a
//! merge, even when the server attached some.

use serde::{Deserialize, Serialize};

/// Response wrapper carrying a success flag plus payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<D> {
    /// Missing flag reads as failure.
    #[serde(default)]
    pub result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<D>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<D> Envelope<D> {
    /// Successful envelope with data.
    pub fn ok(data: D) -> Self {
        Self { result: true, data: Some(data), message: None }
    }

    /// Failed envelope with a user-facing message.
    pub fn fail(message: impl Into<String>) -> Self {
        Self { result: false, data: None, message: Some(message.into()) }
    }

    pub fn is_ok(&self) -> bool {
        self.result
    }

    /// Data, only when the call succeeded.
    pub fn data(&self) -> Option<&D> {
        if self.result { self.data.as_ref() } else { None }
    }

    /// Consume into data, only when the call succeeded.
    pub fn into_data(self) -> Option<D> {
        if self.result { self.data } else { None }
    }

    /// Convert the data, keeping flag and message.
    ///
    /// The conversion runs whenever data is present, so a malformed payload
    /// surfaces as an error even on a failed envelope.
    pub fn try_map<U, F, E>(self, f: F) -> Result<Envelope<U>, E>
    where
        F: FnOnce(D) -> Result<U, E>,
    {
        let data = match self.data {
            Some(d) => Some(f(d)?),
            None => None,
        };
        Ok(Envelope { result: self.result, data, message: self.message })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_result_is_failure() {
        let env: Envelope<serde_json::Value> =
            serde_json::from_value(json!({ "data": { "list": [] } })).unwrap();
        assert!(!env.is_ok());
        assert!(env.data().is_none());
        assert!(env.into_data().is_none());
    }

    #[test]
    fn test_ok_yields_data() {
        let env = Envelope::ok(3u32);
        assert_eq!(env.data(), Some(&3));
        assert_eq!(env.into_data(), Some(3));
    }

    #[test]
    fn test_fail_keeps_message() {
        let env: Envelope<u32> = Envelope::fail("余额不足");
        assert_eq!(env.message.as_deref(), Some("余额不足"));
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json, json!({ "result": false, "message": "余额不足" }));
    }

    #[test]
    fn test_try_map_preserves_flag() {
        let env: Envelope<serde_json::Value> = Envelope::ok(json!(5));
        let mapped: Envelope<u32> = env.try_map(serde_json::from_value).unwrap();
        assert!(mapped.is_ok());
        assert_eq!(mapped.data, Some(5));

        let bad: Envelope<serde_json::Value> = Envelope::ok(json!("five"));
        assert!(bad.try_map(serde_json::from_value::<u32>).is_err());
    }
}
