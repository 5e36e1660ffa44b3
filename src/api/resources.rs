//! Resource calls built on the [`Requester`] contract.
//!
//! Each call builds its path and query, sends it through the requester and
//! decodes the envelope. API-level rejections are returned as envelopes with
//! `success: false`; callers decide whether to use
//! [`ApiEnvelope::into_result`].

use tracing::{debug, error, instrument};

use super::client::{get_paging_cursor, Requester};
use super::envelope::{decode, ApiEnvelope};
use super::error::{ApiError, Result};
use super::pager::PagingCursor;
use super::signer::RequestBody;
use super::types::{
    Activity, ActivityRequest, ActivityType, DailyErrorStats, Lead, LeadChange, LeadUpdate,
    LeadUpdateResult, LeadsRequest,
};

/// Fetch a single lead by id.
///
/// # Errors
///
/// Returns transport or decode errors.
#[instrument(skip(req))]
pub async fn lead<R: Requester + ?Sized>(req: &R, lead_id: &str) -> Result<ApiEnvelope<Vec<Lead>>> {
    let path = format!("lead/{}.json", urlencoding::encode(lead_id));
    get_decoded(req, &path).await
}

/// Fetch one page of the leads in a static list.
///
/// # Errors
///
/// Returns transport or decode errors.
#[instrument(skip(req))]
pub async fn leads_by_list<R: Requester + ?Sized>(
    req: &R,
    request: &LeadsRequest,
) -> Result<ApiEnvelope<Vec<Lead>>> {
    let mut path = format!("list/{}/leads.json", urlencoding::encode(&request.list_id));
    if let Some(token) = request.next_page_token.as_deref().filter(|t| !t.is_empty()) {
        path.push_str(&format!("?nextPageToken={}", urlencoding::encode(token)));
    }
    get_decoded(req, &path).await
}

/// Create or update leads.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` if the update cannot be serialized, or
/// transport or decode errors.
#[instrument(skip_all, fields(action = ?update.action, records = update.input.len()))]
pub async fn update_leads<R: Requester + ?Sized>(
    req: &R,
    update: &LeadUpdate,
) -> Result<ApiEnvelope<Vec<LeadUpdateResult>>> {
    let body = RequestBody::json(update)
        .map_err(|e| ApiError::InvalidInput(format!("could not serialize lead update: {}", e)))?;
    let response = req.post("leads.json", body).await?;
    decode_logged(&response)
}

/// List the activity types accepted by [`activities`].
///
/// # Errors
///
/// Returns transport or decode errors.
#[instrument(skip(req))]
pub async fn activity_types<R: Requester + ?Sized>(req: &R) -> Result<ApiEnvelope<Vec<ActivityType>>> {
    get_decoded(req, "activities/types.json").await
}

/// Start an activity feed at `request.since` and fetch its first page.
///
/// Continue with [`activities_page`] using the envelope's `next_page_token`.
///
/// # Errors
///
/// - `ApiError::InvalidInput` if no activity type is given or `since` is invalid
/// - transport, decode or API errors from the paging-token call
/// - transport or decode errors from the listing call
#[instrument(skip(req))]
pub async fn activities<R: Requester + ?Sized>(
    req: &R,
    request: &ActivityRequest,
) -> Result<ApiEnvelope<Vec<Activity>>> {
    if request.activity_type_ids.iter().all(|id| id.trim().is_empty()) {
        error!("Missing activity type id");
        return Err(ApiError::InvalidInput(
            "at least one activity type id is required".to_string(),
        ));
    }

    let cursor = get_paging_cursor(req, &request.since).await?;
    activities_page(req, request, &cursor).await
}

/// Fetch one page of an activity feed from an existing cursor.
///
/// `request.since` is ignored; the cursor already anchors the window.
///
/// # Errors
///
/// Returns transport or decode errors.
pub async fn activities_page<R: Requester + ?Sized>(
    req: &R,
    request: &ActivityRequest,
    cursor: &PagingCursor,
) -> Result<ApiEnvelope<Vec<Activity>>> {
    let mut query = vec![
        ("nextPageToken", cursor.as_str().to_string()),
        ("activityTypeIds", request.activity_type_ids.join(",")),
    ];
    if let Some(list_id) = request.list_id.as_deref().filter(|l| !l.is_empty()) {
        query.push(("listId", list_id.to_string()));
    }
    if !request.lead_ids.is_empty() {
        query.push(("leadIds", request.lead_ids.join(",")));
    }

    let path = format!("activities.json?{}", encode_query(&query));
    get_decoded(req, &path).await
}

/// Start a lead-change feed at `since` and fetch its first page.
///
/// # Errors
///
/// - `ApiError::InvalidInput` if `since` is invalid
/// - transport, decode or API errors
#[instrument(skip(req))]
pub async fn lead_changes<R: Requester + ?Sized>(
    req: &R,
    since: &str,
    list_id: &str,
    fields: &str,
) -> Result<ApiEnvelope<Vec<LeadChange>>> {
    let cursor = get_paging_cursor(req, since).await?;
    lead_changes_page(req, &cursor, list_id, fields).await
}

/// Fetch one page of a lead-change feed from an existing cursor.
///
/// # Errors
///
/// Returns transport or decode errors.
pub async fn lead_changes_page<R: Requester + ?Sized>(
    req: &R,
    cursor: &PagingCursor,
    list_id: &str,
    fields: &str,
) -> Result<ApiEnvelope<Vec<LeadChange>>> {
    let query = [
        ("nextPageToken", cursor.as_str().to_string()),
        ("fields", fields.to_string()),
        ("listId", list_id.to_string()),
    ];
    let path = format!("activities/leadchanges.json?{}", encode_query(&query));
    get_decoded(req, &path).await
}

/// Error codes and their counts for the current day.
///
/// # Errors
///
/// Returns transport or decode errors.
#[instrument(skip(req))]
pub async fn daily_errors<R: Requester + ?Sized>(req: &R) -> Result<ApiEnvelope<Vec<DailyErrorStats>>> {
    get_decoded(req, "stats/errors.json").await
}

async fn get_decoded<R, T>(req: &R, path: &str) -> Result<ApiEnvelope<T>>
where
    R: Requester + ?Sized,
    T: serde::de::DeserializeOwned,
{
    debug!("Get: {}", path);
    let body = req.get(path).await?;
    decode_logged(&body)
}

fn decode_logged<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<ApiEnvelope<T>> {
    decode(body).map_err(|e| {
        error!("Error with JSON: {}", e);
        e
    })
}

fn encode_query(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio_test::{assert_err, assert_ok};

    /// Serves canned bodies in order and records what was asked.
    #[derive(Default)]
    struct FakeRequester {
        bodies: Mutex<VecDeque<Result<Vec<u8>>>>,
        calls: Mutex<Vec<String>>,
        posted: Mutex<Vec<RequestBody>>,
    }

    impl FakeRequester {
        fn with_bodies(bodies: &[&str]) -> Self {
            let fake = Self::default();
            {
                let mut queue = fake.bodies.lock().unwrap();
                for body in bodies {
                    queue.push_back(Ok(body.as_bytes().to_vec()));
                }
            }
            fake
        }

        fn with_error(err: ApiError) -> Self {
            let fake = Self::default();
            fake.bodies.lock().unwrap().push_back(Err(err));
            fake
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn next(&self) -> Result<Vec<u8>> {
            self.bodies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::InvalidResponse("no canned body".to_string())))
        }
    }

    #[async_trait]
    impl Requester for FakeRequester {
        async fn get(&self, path: &str) -> Result<Vec<u8>> {
            self.calls.lock().unwrap().push(format!("GET {}", path));
            self.next()
        }

        async fn post(&self, path: &str, body: RequestBody) -> Result<Vec<u8>> {
            self.calls.lock().unwrap().push(format!("POST {}", path));
            self.posted.lock().unwrap().push(body);
            self.next()
        }
    }

    const PAGING_TOKEN: &str = r#"{"requestId":"1","success":true,"nextPageToken":"TOKEN1"}"#;

    #[tokio::test]
    async fn test_daily_errors() {
        let fake = FakeRequester::with_bodies(&[r#"{
            "requestId": "123ab#456c789de10",
            "result": [
                {"date": "2016-04-07", "total": 10, "errors": [{"errorCode": "1003", "count": 10}]}
            ],
            "success": true
        }"#]);

        let envelope = daily_errors(&fake).await.unwrap();
        assert_eq!(fake.calls(), vec!["GET stats/errors.json"]);
        assert_eq!(envelope.request_id, "123ab#456c789de10");
        assert!(envelope.success);

        let stats = envelope.result.unwrap();
        assert_eq!(stats[0].date, "2016-04-07");
        assert_eq!(stats[0].total, 10);
        assert_eq!(stats[0].errors[0].error_code, "1003");
        assert_eq!(stats[0].errors[0].count, 10);
    }

    #[tokio::test]
    async fn test_requester_error_is_passed_through() {
        let fake = FakeRequester::with_error(ApiError::Transport {
            status: 500,
            body: "boom".to_string(),
        });
        let err = assert_err!(daily_errors(&fake).await);
        assert!(matches!(err, ApiError::Transport { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_rejected_envelope_is_returned() {
        let fake = FakeRequester::with_bodies(&[
            r#"{"requestId":"1","success":false,"errors":[{"code":"1013","message":"Object not found"}]}"#,
        ]);
        let envelope = assert_ok!(lead(&fake, "42").await);
        assert!(!envelope.success);
        assert!(envelope.result.is_none());
        assert_eq!(envelope.errors[0].code, "1013");
    }

    #[tokio::test]
    async fn test_lead_path() {
        let fake = FakeRequester::with_bodies(&[
            r#"{"requestId":"1","success":true,"result":[{"id":42,"firstName":"Ann"}]}"#,
        ]);
        let envelope = lead(&fake, "42").await.unwrap();
        assert_eq!(fake.calls(), vec!["GET lead/42.json"]);
        assert_eq!(envelope.result.unwrap()[0].first_name.as_deref(), Some("Ann"));
    }

    #[tokio::test]
    async fn test_leads_by_list_with_and_without_token() {
        let page = r#"{"requestId":"1","success":true,"result":[],"nextPageToken":"NEXT"}"#;
        let fake = FakeRequester::with_bodies(&[page, page]);

        let first = LeadsRequest {
            list_id: "1001".to_string(),
            next_page_token: None,
        };
        let envelope = leads_by_list(&fake, &first).await.unwrap();

        let second = LeadsRequest {
            list_id: "1001".to_string(),
            next_page_token: envelope.next_page_token,
        };
        leads_by_list(&fake, &second).await.unwrap();

        assert_eq!(
            fake.calls(),
            vec![
                "GET list/1001/leads.json",
                "GET list/1001/leads.json?nextPageToken=NEXT"
            ]
        );
    }

    #[tokio::test]
    async fn test_update_leads_posts_json() {
        let fake = FakeRequester::with_bodies(&[
            r#"{"requestId":"1","success":true,"result":[{"id":50,"status":"updated"}]}"#,
        ]);
        let update = LeadUpdate {
            action: crate::api::types::LeadAction::UpdateOnly,
            lookup_field: "email".to_string(),
            input: vec![serde_json::json!({"email": "a@b.com"})],
        };

        let envelope = update_leads(&fake, &update).await.unwrap();
        assert_eq!(fake.calls(), vec!["POST leads.json"]);
        assert_eq!(envelope.result.unwrap()[0].status, "updated");

        let posted = fake.posted.lock().unwrap();
        match &posted[0] {
            RequestBody::Json(bytes) => {
                let json: serde_json::Value = serde_json::from_slice(bytes).unwrap();
                assert_eq!(json["action"], "updateOnly");
            }
            other => panic!("Expected JSON body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_activities_requires_type() {
        let fake = FakeRequester::default();
        let request = ActivityRequest {
            since: "2016-04-07".to_string(),
            ..Default::default()
        };
        let err = activities(&fake, &request).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_activities_invalid_date_skips_network() {
        let fake = FakeRequester::default();
        let request = ActivityRequest {
            activity_type_ids: vec!["1".to_string()],
            since: "whenever".to_string(),
            ..Default::default()
        };
        let err = activities(&fake, &request).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_activities_handshake() {
        let fake = FakeRequester::with_bodies(&[
            PAGING_TOKEN,
            r#"{"requestId":"2","success":true,"nextPageToken":"TOKEN2","moreResults":true,
                "result":[{"id":1,"leadId":2,"activityDate":"2016-04-07T10:00:00Z","activityTypeId":1}]}"#,
        ]);
        let request = ActivityRequest {
            activity_type_ids: vec!["1".to_string(), "12".to_string()],
            since: "2016-04-07T10:00-0800".to_string(),
            list_id: Some("1001".to_string()),
            lead_ids: vec!["5".to_string(), "6".to_string()],
        };

        let envelope = activities(&fake, &request).await.unwrap();
        assert_eq!(envelope.next_page_token.as_deref(), Some("TOKEN2"));
        assert_eq!(envelope.result.unwrap()[0].lead_id, 2);

        let calls = fake.calls();
        assert_eq!(
            calls[0],
            "GET activities/pagingtoken.json?sinceDatetime=2016-04-07T10%3A00-0800"
        );
        assert_eq!(
            calls[1],
            "GET activities.json?nextPageToken=TOKEN1&activityTypeIds=1%2C12&listId=1001&leadIds=5%2C6"
        );
    }

    #[tokio::test]
    async fn test_activities_page_continues_without_new_cursor() {
        let fake = FakeRequester::with_bodies(&[r#"{"requestId":"3","success":true,"moreResults":false}"#]);
        let request = ActivityRequest {
            activity_type_ids: vec!["1".to_string()],
            ..Default::default()
        };

        let envelope = activities_page(&fake, &request, &PagingCursor::new("TOKEN2"))
            .await
            .unwrap();
        assert!(envelope.result.is_none());
        assert_eq!(
            fake.calls(),
            vec!["GET activities.json?nextPageToken=TOKEN2&activityTypeIds=1"]
        );
    }

    #[tokio::test]
    async fn test_lead_changes_handshake() {
        let fake = FakeRequester::with_bodies(&[
            PAGING_TOKEN,
            r#"{"requestId":"2","success":true,"result":[{"id":1,"leadId":2,"activityDate":"2016-04-07T10:00:00Z",
                "activityTypeId":13,"fields":[{"id":48,"name":"firstName","newValue":"Ann","oldValue":null}]}]}"#,
        ]);

        let envelope = lead_changes(&fake, "2016-04-07T10:00-0800", "1001", "firstName,email")
            .await
            .unwrap();
        let changes = envelope.result.unwrap();
        assert_eq!(changes[0].fields[0].new_value.as_deref(), Some("Ann"));
        assert!(changes[0].fields[0].old_value.is_none());

        assert_eq!(
            fake.calls()[1],
            "GET activities/leadchanges.json?nextPageToken=TOKEN1&fields=firstName%2Cemail&listId=1001"
        );
    }

    #[tokio::test]
    async fn test_paging_token_rejection_stops_feed() {
        let fake = FakeRequester::with_bodies(&[
            r#"{"requestId":"1","success":false,"errors":[{"code":"1003","message":"rate limit"}]}"#,
        ]);
        let err = lead_changes(&fake, "2016-04-07", "1001", "email").await.unwrap_err();
        assert_eq!(err.details()[0].code, "1003");
        assert_eq!(fake.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let fake = FakeRequester::with_bodies(&["<html>"]);
        let err = activity_types(&fake).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
