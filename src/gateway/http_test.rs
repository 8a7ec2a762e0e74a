use super::*;
use crate::config::Timeouts;

fn config(base: &str) -> GatewayConfig {
    GatewayConfig {
        api_base_url: base.into(),
        timeouts: Timeouts { request_secs: 5, connect_secs: 1 },
        autosave_debounce_ms: 10,
    }
}

// =========================================================================
// endpoint
// =========================================================================

#[test]
fn endpoint_joins_with_single_slash() {
    assert_eq!(endpoint("http://h/api", "assets"), "http://h/api/assets");
    assert_eq!(endpoint("http://h/api/", "/plans/3/svg"), "http://h/api/plans/3/svg");
}

// =========================================================================
// status & parsing
// =========================================================================

#[test]
fn success_statuses_pass_body_through() {
    assert_eq!(check_status(200, "ok".into()).unwrap(), "ok");
    assert_eq!(check_status(201, "{}".into()).unwrap(), "{}");
}

#[test]
fn error_status_keeps_body() {
    let err = check_status(502, "bad gateway".into()).unwrap_err();
    assert_eq!(err, PersistenceError::Response { status: 502, body: "bad gateway".into() });
    assert!(err.retryable());
}

#[test]
fn parse_codes_list() {
    let json = r#"[{"id": 1, "code": "A", "libelle": "a", "universId": 2},
                   {"id": 2, "code": "B", "position": {"pos_x": 1.0, "pos_y": 2.0, "width": 5.0}}]"#;
    let codes: Vec<GeoCodeRecord> = parse_json(json).unwrap();
    assert_eq!(codes.len(), 2);
    assert!(codes[0].position.is_none());
    assert_eq!(codes[1].position.unwrap().width, Some(5.0));
}

#[test]
fn parse_malformed_json_is_parse_error() {
    let err = parse_json::<Vec<GeoCodeRecord>>("not json").unwrap_err();
    assert!(matches!(err, PersistenceError::Parse(_)));
    assert!(!err.retryable());
}

#[test]
fn parse_ack_rejected() {
    let err = parse_ack(r#"{"success": false, "message": "Code déjà placé"}"#).unwrap_err();
    assert_eq!(err, PersistenceError::Rejected("Code déjà placé".into()));
}

#[test]
fn parse_ack_position_id() {
    assert_eq!(parse_ack(r#"{"success": true, "position_id": 12}"#).unwrap().position_id, Some(12));
}

// =========================================================================
// client
// =========================================================================

#[test]
fn new_keeps_base_url() {
    let store = HttpPlanStore::new(&config("http://localhost:9")).unwrap();
    assert_eq!(store.base_url, "http://localhost:9");
}

#[tokio::test]
async fn unreachable_host_is_retryable_request_error() {
    // Port 9 (discard) is closed on test hosts; connection is refused.
    let store = HttpPlanStore::new(&config("http://127.0.0.1:9")).unwrap();
    let err = store.fetch_codes(1).await.unwrap_err();
    assert!(matches!(err, PersistenceError::Request(_)));
    assert!(err.retryable());
}
