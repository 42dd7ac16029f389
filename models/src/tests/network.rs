use crate::network::UNREACHABLE_ADDRESS;
use crate::{
    ConnectivityEvent, ConnectivityKind, IdentityKind, NetworkIdentity, WebConnectionReport,
};

#[test]
fn given_connectivity_kinds_when_checked_then_only_wifi_and_ethernet_are_lan() {
    assert!(ConnectivityKind::Wifi.is_lan());
    assert!(ConnectivityKind::Ethernet.is_lan());
    assert!(!ConnectivityKind::Cellular.is_lan());
    assert!(!ConnectivityKind::None.is_lan());
    assert!(!ConnectivityKind::Unknown.is_lan());
}

/// **VALUE**: The host forwards connectivity events from the webview as JSON; the wire
/// names must stay lowercase and `is_connected` optional.
///
/// **BUG THIS CATCHES**: Would catch a dropped `rename_all` or a missing serde default.
#[test]
fn given_frontend_payload_when_deserialized_then_parses_event() {
    // GIVEN: A payload without is_connected
    let json = r#"{"kind":"wifi"}"#;

    // WHEN: Deserializing
    let event: ConnectivityEvent = serde_json::from_str(json).unwrap();

    // THEN: Defaults to connected wifi
    assert_eq!(event, ConnectivityEvent::new(ConnectivityKind::Wifi));
}

#[test]
fn given_unreachable_identity_when_built_then_uses_sentinel() {
    let identity = NetworkIdentity::unreachable();

    assert_eq!(identity.kind, IdentityKind::Lan);
    assert_eq!(identity.address.as_deref(), Some(UNREACHABLE_ADDRESS));
    assert_eq!(NetworkIdentity::none().address, None);
}

fn web(connection_type: Option<&str>, online: bool) -> ConnectivityEvent {
    ConnectivityEvent::from(&WebConnectionReport {
        connection_type: connection_type.map(str::to_string),
        online,
    })
}

/// **VALUE**: Verifies a webview without `navigator.connection` never claims a LAN.
///
/// **WHY THIS MATTERS**: WebKit has no Network Information API. Mapping "online" to
/// ethernet makes a phone on cellular publish a LAN address nobody can reach.
///
/// **BUG THIS CATCHES**: Would catch an unknown connection type defaulting to a LAN kind.
#[test]
fn given_online_without_connection_type_when_converted_then_unknown_not_lan() {
    // GIVEN / WHEN
    let event = web(None, true);

    // THEN
    assert_eq!(event.kind, ConnectivityKind::Unknown);
    assert!(!event.kind.is_lan());
    assert!(event.is_connected);
}

#[test]
fn given_web_connection_types_when_converted_then_mapped() {
    assert_eq!(web(Some("wifi"), true).kind, ConnectivityKind::Wifi);
    assert_eq!(web(Some("ethernet"), true).kind, ConnectivityKind::Ethernet);
    assert_eq!(web(Some("cellular"), true).kind, ConnectivityKind::Cellular);
    assert_eq!(web(Some("bluetooth"), true).kind, ConnectivityKind::Unknown);
    assert_eq!(web(Some("other"), true).kind, ConnectivityKind::Unknown);
}

/// **VALUE**: Verifies going offline wins over a stale connection type.
///
/// **BUG THIS CATCHES**: Would catch `wifi` being kept after the browser reports offline.
#[test]
fn given_offline_report_when_converted_then_none_and_disconnected() {
    let event = web(Some("wifi"), false);

    assert_eq!(event.kind, ConnectivityKind::None);
    assert!(!event.is_connected);
}

/// **VALUE**: Verifies the report's wire shape matches what the status page sends.
#[test]
fn given_frontend_report_when_deserialized_then_type_is_optional() {
    let with_type: WebConnectionReport =
        serde_json::from_str(r#"{"type":"wifi","online":true}"#).unwrap();
    let without_type: WebConnectionReport = serde_json::from_str(r#"{"online":true}"#).unwrap();

    assert_eq!(with_type.connection_type.as_deref(), Some("wifi"));
    assert_eq!(without_type.connection_type, None);
    assert!(without_type.online);
}
