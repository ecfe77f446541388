//! HLR roaming status models.

use serde::{Deserialize, Serialize};

/// Identity of the network currently serving a terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServingMccMnc {
    #[serde(default)]
    pub mcc: Option<String>,

    #[serde(default)]
    pub mnc: Option<String>,
}

/// Roaming status of one terminal, from a query response or a notification.
///
/// Query wire root: `roaming`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roaming {
    pub address: String,

    #[serde(default)]
    pub current_roaming: Option<String>,

    #[serde(default)]
    pub serving_mcc_mnc: Option<ServingMccMnc>,

    #[serde(default)]
    pub retrieval_status: Option<String>,

    #[serde(default)]
    pub callback_data: Option<String>,
}

/// Envelope the operator posts when a tracked terminal's roaming status
/// changes.
///
/// Wire root: `terminalRoamingStatusList`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoamingNotification {
    pub roaming: Roaming,

    #[serde(default)]
    pub callback_data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roaming_wire_names() {
        let roaming: Roaming = serde_json::from_str(
            r#"{
                "address": "tel:+15551230007",
                "currentRoaming": "No",
                "servingMccMnc": { "mcc": "228", "mnc": "01" },
                "retrievalStatus": "Retrieved"
            }"#,
        )
        .unwrap();

        assert_eq!(roaming.address, "tel:+15551230007");
        assert_eq!(roaming.current_roaming.as_deref(), Some("No"));
        let serving = roaming.serving_mcc_mnc.unwrap();
        assert_eq!(serving.mcc.as_deref(), Some("228"));
        assert_eq!(serving.mnc.as_deref(), Some("01"));
    }

    #[test]
    fn test_minimal_roaming() {
        let roaming: Roaming =
            serde_json::from_str(r#"{"address": "tel:+15551230008"}"#).unwrap();
        assert_eq!(roaming.current_roaming, None);
        assert_eq!(roaming.serving_mcc_mnc, None);
    }
}
