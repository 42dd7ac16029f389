use crate::fakes::{fast_config, harness};

use server_core::network::{LanAddressQuery, LocalIpQuery};

use models::{ConnectivityEvent, ConnectivityKind, IdentityKind, UNREACHABLE_ADDRESS};

use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

#[tokio::test]
async fn given_wifi_when_event_handled_then_identity_has_lan_address() {
    // GIVEN
    let h = harness(fast_config());

    // WHEN
    let identity = h
        .supervisor
        .network()
        .handle_event(ConnectivityEvent::new(ConnectivityKind::Wifi))
        .await;

    // THEN
    assert_eq!(identity.kind, IdentityKind::Lan);
    assert_eq!(identity.address.as_deref(), Some("192.168.1.20"));
    assert_eq!(
        h.supervisor.access_info().lan_address.as_deref(),
        Some("192.168.1.20")
    );
}

/// **VALUE**: Verifies leaving the LAN clears a previously known address.
///
/// **WHY THIS MATTERS**: On cellular the old Wi-Fi address is unreachable; showing it would
/// send the user to a dead WebDAV URL.
///
/// **BUG THIS CATCHES**: Would catch keeping the last address on non-LAN connectivity.
#[tokio::test]
async fn given_prior_lan_address_when_switched_to_cellular_then_address_cleared() {
    // GIVEN
    let h = harness(fast_config());
    let network = h.supervisor.network();
    network
        .handle_event(ConnectivityEvent::new(ConnectivityKind::Wifi))
        .await;

    // WHEN
    let identity = network
        .handle_event(ConnectivityEvent::new(ConnectivityKind::Cellular))
        .await;

    // THEN
    assert_eq!(identity.kind, IdentityKind::None);
    assert!(identity.address.is_none());
    assert!(network.current().address.is_none());
}

/// **VALUE**: Verifies a failed address lookup on a LAN yields the unreachable sentinel.
///
/// **BUG THIS CATCHES**: Would catch propagating the lookup error or keeping a stale address.
#[tokio::test]
async fn given_lan_lookup_failure_when_event_handled_then_unreachable_sentinel() {
    // GIVEN
    let h = harness(fast_config());
    *h.lan.address.lock().unwrap() = None;

    // WHEN
    let identity = h
        .supervisor
        .network()
        .handle_event(ConnectivityEvent::new(ConnectivityKind::Ethernet))
        .await;

    // THEN
    assert_eq!(identity.kind, IdentityKind::Lan);
    assert_eq!(identity.address.as_deref(), Some(UNREACHABLE_ADDRESS));
    assert_eq!(h.lan.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_disconnected_wifi_when_event_handled_then_no_lookup() {
    let h = harness(fast_config());
    let event = ConnectivityEvent {
        kind: ConnectivityKind::Wifi,
        is_connected: false,
    };

    let identity = h.supervisor.network().handle_event(event).await;

    assert_eq!(identity.kind, IdentityKind::None);
    assert_eq!(h.lan.calls.load(Ordering::SeqCst), 0);
}

/// **VALUE**: Verifies subscribers see identity changes pushed through the event stream.
///
/// **WHY THIS MATTERS**: The status screen updates live when the device joins a network.
///
/// **BUG THIS CATCHES**: Would catch a watcher that drops events or never publishes.
#[tokio::test]
async fn given_event_stream_when_watched_then_identity_published() {
    // GIVEN
    let h = harness(fast_config());
    let (tx, rx) = mpsc::channel(4);
    let subscription = h.supervisor.watch_connectivity(ReceiverStream::new(rx));
    let mut identity_rx = h.supervisor.network().subscribe();

    // WHEN
    tx.send(ConnectivityEvent::new(ConnectivityKind::Wifi))
        .await
        .expect("send");

    // THEN
    let identity = tokio::time::timeout(
        Duration::from_secs(2),
        identity_rx.wait_for(|i| i.address.is_some()),
    )
    .await
    .expect("identity within timeout")
    .expect("channel open")
    .clone();
    assert_eq!(identity.address.as_deref(), Some("192.168.1.20"));

    // WHEN: The event source goes away
    drop(tx);

    // THEN: The watcher finishes on its own
    tokio::time::timeout(Duration::from_secs(2), async {
        while !subscription.is_finished() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("watcher should finish when the stream ends");
}

/// **VALUE**: Verifies the real address query never panics, whatever the host network.
///
/// **ENVIRONMENT-DEPENDENT**: CI containers may have no routable interface. Both outcomes
/// are valid; a loopback address is not.
#[tokio::test]
async fn given_any_environment_when_local_ip_queried_then_handles_gracefully() {
    match LocalIpQuery.lan_address().await {
        Ok(address) => {
            assert_ne!(address, "127.0.0.1");
            assert_ne!(address, UNREACHABLE_ADDRESS);
        }
        Err(_) => {
            // No usable interface in this environment
        }
    }
}
