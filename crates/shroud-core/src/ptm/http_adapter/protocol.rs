use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::{CoreError, TransportError};
use crate::types::{ExtraMetadata, Feature, FeatureSet, PrivacyFlag};

use super::super::Received;

/// Body of `GET /transaction/{key}`.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ReceiveResponse {
    payload: String,
    #[serde(default)]
    privacy_flag: Option<u64>,
    #[serde(default)]
    managed_parties: Vec<String>,
    #[serde(default)]
    sender_key: Option<String>,
    #[serde(default)]
    mandatory_recipients: Vec<String>,
}

pub(super) fn decode_receive_body(body: &str) -> Result<Received, CoreError> {
    let response: ReceiveResponse = serde_json::from_str(body).map_err(|e| {
        TransportError::InvalidResponse(format!("decode receive response: {e}; body={body}"))
    })?;
    decode_receive_response(response)
}

fn decode_receive_response(response: ReceiveResponse) -> Result<Received, CoreError> {
    let payload = BASE64
        .decode(response.payload.as_bytes())
        .map_err(|e| TransportError::InvalidResponse(format!("invalid payload base64: {e}")))?;

    // Checked before the empty short-circuit: an unknown flag must never
    // surface as non-participation. Managers predating privacy enhancements
    // omit the flag.
    let privacy_flag = match response.privacy_flag {
        Some(raw) => PrivacyFlag::try_from(raw)?,
        None => PrivacyFlag::StandardPrivate,
    };

    if payload.is_empty() {
        return Ok(Received::default());
    }

    let mut managed_parties = response.managed_parties;
    let sender = response.sender_key.unwrap_or_default();
    if managed_parties.is_empty() && !sender.is_empty() {
        managed_parties.push(sender.clone());
    }

    Ok(Received {
        sender,
        payload,
        metadata: Some(ExtraMetadata {
            privacy_flag,
            managed_parties,
            mandatory_recipients: response.mandatory_recipients,
        }),
    })
}

/// Map the API versions advertised by `GET /version/api` to capabilities.
/// Unparseable entries are ignored.
pub(super) fn features_from_versions(versions: &[String]) -> FeatureSet {
    let Some(highest) = versions.iter().filter_map(|v| parse_api_version(v)).max() else {
        return FeatureSet::empty();
    };

    const THRESHOLDS: [((u32, u32), Feature); 4] = [
        ((2, 0), Feature::PrivacyEnhancements),
        ((2, 1), Feature::MultiTenancy),
        ((3, 0), Feature::MultiplePrivateStates),
        ((4, 0), Feature::MandatoryRecipients),
    ];

    THRESHOLDS
        .iter()
        .filter(|(min, _)| highest >= *min)
        .map(|(_, feature)| *feature)
        .collect()
}

fn parse_api_version(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.trim().trim_start_matches('v').split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = match parts.next() {
        Some(minor) => minor.parse().ok()?,
        None => 0,
    };
    Some((major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_receive_response() {
        let body = serde_json::json!({
            "payload": BASE64.encode(b"private payload"),
            "privacyFlag": 1,
            "managedParties": ["alice", "bob"],
            "senderKey": "carol",
        })
        .to_string();

        let received = decode_receive_body(&body).expect("must decode");
        assert_eq!(received.payload, b"private payload");
        assert_eq!(received.sender, "carol");
        assert_eq!(received.managed_parties(), ["alice", "bob"]);
        let metadata = received.metadata.expect("metadata present");
        assert_eq!(metadata.privacy_flag, PrivacyFlag::PartyProtection);
        assert!(metadata.mandatory_recipients.is_empty());
    }

    #[test]
    fn legacy_response_defaults_to_standard_private_and_sender_party() {
        let body = serde_json::json!({
            "payload": BASE64.encode(b"x"),
            "senderKey": "carol",
        })
        .to_string();

        let received = decode_receive_body(&body).expect("must decode");
        assert_eq!(received.managed_parties(), ["carol"]);
        assert_eq!(
            received.metadata.map(|m| m.privacy_flag),
            Some(PrivacyFlag::StandardPrivate)
        );
    }

    #[test]
    fn empty_payload_is_non_participant_result() {
        let body = serde_json::json!({ "payload": "", "privacyFlag": 0 }).to_string();
        let received = decode_receive_body(&body).expect("must decode");
        assert!(received.is_empty());
    }

    #[test]
    fn empty_payload_with_unknown_flag_is_an_error() {
        let body = serde_json::json!({ "payload": "", "privacyFlag": 99 }).to_string();
        let err = decode_receive_body(&body).expect_err("must reject flag");
        assert!(matches!(err, CoreError::UnknownPrivacyFlag(99)));
    }

    #[test]
    fn unknown_privacy_flag_is_an_error() {
        let body = serde_json::json!({
            "payload": BASE64.encode(b"x"),
            "privacyFlag": 16,
        })
        .to_string();

        let err = decode_receive_body(&body).expect_err("must reject flag");
        assert!(matches!(err, CoreError::UnknownPrivacyFlag(16)));
    }

    #[test]
    fn malformed_body_is_transport_error() {
        let err = decode_receive_body("{not json").expect_err("must reject");
        assert!(matches!(
            err,
            CoreError::Transport(TransportError::InvalidResponse(_))
        ));

        let body = serde_json::json!({ "payload": "%%%" }).to_string();
        let err = decode_receive_body(&body).expect_err("must reject base64");
        assert!(err.to_string().contains("invalid payload base64"));
    }

    #[test]
    fn features_follow_highest_api_version() {
        let versions: Vec<String> = ["1.0", "2.0", "2.1", "garbage"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let features = features_from_versions(&versions);
        assert!(features.contains(Feature::PrivacyEnhancements));
        assert!(features.contains(Feature::MultiTenancy));
        assert!(!features.contains(Feature::MultiplePrivateStates));

        let all = features_from_versions(&["5.0".to_string()]);
        assert_eq!(all.iter().count(), 4);

        assert!(features_from_versions(&["1.0".to_string()]).is_empty());
        assert!(features_from_versions(&[]).is_empty());
    }
}
