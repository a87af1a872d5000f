//! Response classification predicates
//!
//! The upstream API signals "empty" and "error" differently per endpoint
//! and omits keys entirely rather than sending nulls, so every predicate
//! here tolerates absent or malformed structure instead of requiring it.
//! A lookup failure short-circuits the crawl branch; nothing in this
//! module can fail.

use crate::types::RecordKind;
use serde_json::Value;

/// Transport-level check: exactly HTTP 200 passes
pub fn is_response_valid(status: u16) -> bool {
    status == 200
}

/// Payload-level check: the body carries no top-level API error object
///
/// Zoho reports failures as `{"response": {"error": {"code": ...}}}`,
/// e.g. code 4100 "Unable to populate data" or 4600 "Unable to process
/// your request". An error body is rejected even if it also carries rows.
pub fn is_json_valid(body: &Value) -> bool {
    body.get("response")
        .and_then(|r| r.get("error"))
        .is_none()
}

/// Empty-result check, per endpoint kind
///
/// Live records signal exhaustion with a `response.nodata` marker; the
/// deletions endpoint instead reports `DeletedIDs` as absent, `false`, or
/// an empty string when there is nothing left.
pub fn has_data(body: &Value, kind: RecordKind) -> bool {
    match kind {
        RecordKind::Live => body
            .get("response")
            .and_then(|r| r.get("nodata"))
            .is_none(),
        RecordKind::Deleted => {
            match body
                .get("response")
                .and_then(|r| r.get("result"))
                .and_then(|r| r.get("DeletedIDs"))
            {
                Some(Value::String(ids)) => !ids.trim().is_empty(),
                Some(Value::Bool(b)) => *b,
                // Absent, null, or any unexpected shape means no ids
                _ => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_status_200_is_valid() {
        assert!(is_response_valid(200));
        for status in [0, 199, 201, 204, 301, 400, 401, 404, 429, 500, 503] {
            assert!(!is_response_valid(status), "status {status} should fail");
        }
    }

    #[test]
    fn test_error_body_rejected_even_with_rows() {
        let body = json!({
            "response": {
                "error": {"code": "4100", "message": "Unable to populate data"},
                "result": {"Leads": {"row": [{"no": "1", "FL": []}]}}
            }
        });
        assert!(!is_json_valid(&body));
    }

    #[test]
    fn test_clean_body_is_valid() {
        let body = json!({"response": {"result": {"Leads": {"row": []}}}});
        assert!(is_json_valid(&body));

        // Absent structure means no error, not a failure
        assert!(is_json_valid(&json!({})));
        assert!(is_json_valid(&json!("not even an object")));
    }

    #[test]
    fn test_live_nodata_marker() {
        let empty = json!({"response": {"nodata": {"code": "4422"}}});
        assert!(!has_data(&empty, RecordKind::Live));

        let full = json!({"response": {"result": {"Leads": {"row": []}}}});
        assert!(has_data(&full, RecordKind::Live));
    }

    #[test]
    fn test_deleted_ids_sentinels() {
        let present = json!({"response": {"result": {"DeletedIDs": "1,2,3"}}});
        assert!(has_data(&present, RecordKind::Deleted));

        let empty = json!({"response": {"result": {"DeletedIDs": ""}}});
        assert!(!has_data(&empty, RecordKind::Deleted));

        let blank = json!({"response": {"result": {"DeletedIDs": "   "}}});
        assert!(!has_data(&blank, RecordKind::Deleted));

        let false_sentinel = json!({"response": {"result": {"DeletedIDs": false}}});
        assert!(!has_data(&false_sentinel, RecordKind::Deleted));

        let missing = json!({"response": {"result": {}}});
        assert!(!has_data(&missing, RecordKind::Deleted));

        let no_response = json!({});
        assert!(!has_data(&no_response, RecordKind::Deleted));
    }

    #[test]
    fn test_deleted_ids_unexpected_shapes_mean_no_data() {
        for ids in [json!(42), json!(["a1", "a2"]), json!({"id": "a1"}), json!(null)] {
            let body = json!({"response": {"result": {"DeletedIDs": ids}}});
            assert!(!has_data(&body, RecordKind::Deleted), "shape {ids} should read as empty");
        }
    }
}
