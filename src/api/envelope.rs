//! Response envelope decoding.
//!
//! Every Marketo response shares the same administrative wrapper:
//!
//! ```json
//! {"requestId": "..", "success": true, "nextPageToken": "..",
//!  "moreResults": false, "errors": [], "result": [...]}
//! ```
//!
//! [`ApiEnvelope`] decodes those fields once and leaves the `result` payload to
//! a caller-chosen type.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use super::error::{ApiError, ApiErrorDetail, Result};

/// A payload kept as unparsed JSON for callers that decode it themselves.
pub type RawPayload = Box<RawValue>;

/// A non-fatal warning attached to a response.
pub type ApiWarning = String;

/// The common response wrapper with a typed payload slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    /// Server-side request identifier.
    #[serde(default)]
    pub request_id: String,
    /// Whether the API accepted the request.
    #[serde(default)]
    pub success: bool,
    /// Continuation cursor for the next page, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    /// Whether more results are available after this page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_results: Option<bool>,
    /// Structured errors, in server order.
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
    /// Non-fatal warnings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ApiWarning>,
    /// The call-specific payload.
    #[serde(
        default = "Option::default",
        skip_serializing_if = "Option::is_none",
        bound(deserialize = "T: Deserialize<'de>")
    )]
    pub result: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Whether the API reported a failure, either by flag or by error list.
    pub fn is_rejected(&self) -> bool {
        !self.success || !self.errors.is_empty()
    }

    /// Turn an API-level rejection into an error.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with the reported error list when
    /// `success` is false or errors are present.
    pub fn into_result(self) -> Result<Self> {
        if self.is_rejected() {
            return Err(ApiError::Api(self.errors));
        }
        Ok(self)
    }

    /// The payload, or an empty default when the server omitted it.
    pub fn result_or_default(self) -> T
    where
        T: Default,
    {
        self.result.unwrap_or_default()
    }
}

impl ApiEnvelope<RawPayload> {
    /// Decode a deferred raw payload into a concrete type.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if the payload does not match `U`, or
    /// `ApiError::InvalidResponse` if there is no payload at all.
    pub fn decode_result<U: DeserializeOwned>(&self) -> Result<U> {
        let raw = self
            .result
            .as_ref()
            .ok_or_else(|| ApiError::InvalidResponse("response has no result".to_string()))?;
        Ok(serde_json::from_str(raw.get())?)
    }
}

/// Decode a response body into an envelope.
///
/// A `success: false` envelope decodes fine; use [`ApiEnvelope::into_result`]
/// to turn it into an error.
///
/// # Errors
///
/// Returns `ApiError::Decode` if the body is not valid JSON or does not match
/// the envelope shape.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<ApiEnvelope<T>> {
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u64,
    }

    #[test]
    fn test_success_envelope_with_typed_payload() {
        let body = br#"{
            "requestId": "e42b#14272d07d78",
            "success": true,
            "result": [{"id": 50}, {"id": 51}]
        }"#;
        let envelope: ApiEnvelope<Vec<Item>> = decode(body).unwrap();

        assert_eq!(envelope.request_id, "e42b#14272d07d78");
        assert!(envelope.success);
        assert!(envelope.errors.is_empty());
        assert_eq!(envelope.next_page_token, None);
        assert_eq!(envelope.more_results, None);
        assert_eq!(envelope.result, Some(vec![Item { id: 50 }, Item { id: 51 }]));
    }

    #[test]
    fn test_failure_envelope_surfaces_errors_verbatim() {
        let body = br#"{"success": false, "errors":[{"code":"1003","message":"rate limit"}]}"#;
        let envelope: ApiEnvelope<Vec<Item>> = decode(body).unwrap();

        assert!(!envelope.success);
        assert!(envelope.result.is_none());
        assert_eq!(
            envelope.errors,
            vec![ApiErrorDetail {
                code: "1003".to_string(),
                message: "rate limit".to_string(),
            }]
        );

        match envelope.into_result() {
            Err(ApiError::Api(details)) => {
                assert_eq!(details[0].code, "1003");
                assert_eq!(details[0].message, "rate limit");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_pagination_fields() {
        let body = br#"{
            "requestId": "1",
            "success": true,
            "nextPageToken": "GIYDAOBNGEYS2MBWKQYDAORQGA5DAMBOGAYDAKZQGAYDALBQ",
            "moreResults": true,
            "result": []
        }"#;
        let envelope: ApiEnvelope<Vec<Item>> = decode(body).unwrap();
        assert_eq!(
            envelope.next_page_token.as_deref(),
            Some("GIYDAOBNGEYS2MBWKQYDAORQGA5DAMBOGAYDAKZQGAYDALBQ")
        );
        assert_eq!(envelope.more_results, Some(true));
    }

    #[test]
    fn test_raw_payload_is_deferred() {
        let body = br#"{"requestId":"1","success":true,"result":[{"id":7,"custom":{"x":1}}]}"#;
        let envelope: ApiEnvelope<RawPayload> = decode(body).unwrap();
        assert!(envelope.result.as_ref().unwrap().get().contains("custom"));

        let items: Vec<Item> = envelope.decode_result().unwrap();
        assert_eq!(items, vec![Item { id: 7 }]);
    }

    #[test]
    fn test_raw_payload_missing_is_invalid_response() {
        let envelope: ApiEnvelope<RawPayload> = decode(br#"{"success":true}"#).unwrap();
        let err = envelope.decode_result::<Vec<Item>>().unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        let err = decode::<Vec<Item>>(b"<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_type_mismatch_is_decode_error() {
        let err = decode::<Vec<Item>>(br#"{"success":true,"result":"nope"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_errors_with_success_true_is_rejected() {
        let body = br#"{"success":true,"errors":[{"code":"610","message":"Requested resource not found"}]}"#;
        let envelope: ApiEnvelope<Vec<Item>> = decode(body).unwrap();
        assert!(envelope.is_rejected());
        assert!(envelope.into_result().is_err());
    }

    #[test]
    fn test_result_or_default() {
        let envelope: ApiEnvelope<Vec<Item>> = decode(br#"{"success":true}"#).unwrap();
        assert!(envelope.into_result().unwrap().result_or_default().is_empty());
    }
}
