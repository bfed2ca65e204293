//! Tests for wallet connection and snapshots

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeProvider, ALICE};
use slate_agent::{
    blockchain::{
        models::{AccountInfo, AccountResources, Network},
        provider::ProviderSlot,
        services::{
            connector::{ConnectorSettings, WalletConnector},
            snapshot::SnapshotBuilder,
        },
    },
    error::{AgentError, ProviderError},
};

fn connector(slot: &ProviderSlot, required_network: Option<Network>) -> WalletConnector {
    WalletConnector::new(
        slot.clone(),
        ConnectorSettings {
            required_network,
            ..ConnectorSettings::default()
        },
    )
}

#[tokio::test(start_paused = true)]
async fn connect_waits_for_late_injection() {
    let slot = ProviderSlot::empty();
    let late = slot.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        late.inject(Arc::new(FakeProvider::unlocked().on_host("nile.trongrid.io")))
            .await;
    });

    let info = connector(&slot, None).connect().await.unwrap();
    assert_eq!(info.address, ALICE);
    assert_eq!(info.node_host, "nile.trongrid.io");
    assert_eq!(info.network, Network::Nile);
}

#[tokio::test(start_paused = true)]
async fn connect_without_provider_is_provider_missing() {
    let slot = ProviderSlot::empty();
    let err = connector(&slot, None).connect().await.unwrap_err();
    assert!(matches!(err, AgentError::ProviderMissing));
}

#[tokio::test(start_paused = true)]
async fn rejected_access_is_no_account() {
    let slot = ProviderSlot::with_provider(Arc::new(FakeProvider::locked().denying_access()));
    let err = connector(&slot, None).connect().await.unwrap_err();
    assert!(matches!(err, AgentError::NoAccount));
}

#[tokio::test(start_paused = true)]
async fn locked_provider_that_never_reveals_is_no_account() {
    let slot = ProviderSlot::with_provider(Arc::new(FakeProvider::locked()));
    let err = connector(&slot, None).connect().await.unwrap_err();
    assert!(matches!(err, AgentError::NoAccount));
}

#[tokio::test(start_paused = true)]
async fn address_revealed_after_access_is_used() {
    let slot = ProviderSlot::with_provider(Arc::new(
        FakeProvider::locked().revealing_on_access("TNewlyUnlockedAccount"),
    ));
    let info = connector(&slot, None).connect().await.unwrap();
    assert_eq!(info.address, "TNewlyUnlockedAccount");
    assert_eq!(info.network, Network::Mainnet);
}

#[tokio::test(start_paused = true)]
async fn required_network_mismatch_is_wrong_network() {
    let slot = ProviderSlot::with_provider(Arc::new(
        FakeProvider::unlocked().on_host("api.shasta.trongrid.io"),
    ));
    let err = connector(&slot, Some(Network::Nile)).connect().await.unwrap_err();
    match err {
        AgentError::WrongNetwork { expected, actual } => {
            assert_eq!(expected, Network::Nile);
            assert_eq!(actual, Network::Unknown);
        }
        other => panic!("expected WrongNetwork, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn unknown_network_connects_when_nothing_is_required() {
    let slot = ProviderSlot::with_provider(Arc::new(FakeProvider::unlocked().on_host("10.0.0.5")));
    let info = connector(&slot, None).connect().await.unwrap();
    assert_eq!(info.network, Network::Unknown);
}

#[tokio::test(start_paused = true)]
async fn check_provider_reports_absence_without_failing() {
    let slot = ProviderSlot::empty();
    let status = connector(&slot, None).check_provider().await;
    assert!(!status.present);
    assert!(!status.ready);

    slot.inject(Arc::new(FakeProvider::locked())).await;
    let status = connector(&slot, None).check_provider().await;
    assert!(status.present);
    assert!(!status.ready);
    assert_eq!(status.address, None);
}

// --- Snapshots ---

async fn connected(provider: FakeProvider) -> (ProviderSlot, slate_agent::blockchain::models::ConnectionInfo) {
    let slot = ProviderSlot::with_provider(Arc::new(provider));
    let info = connector(&slot, None).connect().await.unwrap();
    (slot, info)
}

#[tokio::test]
async fn snapshot_composes_three_reads() {
    let (slot, info) = connected(
        FakeProvider::unlocked()
            .with_balance(Ok(12_345_678))
            .with_account(Ok(AccountInfo {
                frozen_for_bandwidth_sun: 2_000_000,
                frozen_for_energy_sun: 500_000,
                owner_keys: 2,
                owner_threshold: 2,
                active_permissions: 1,
            }))
            .with_resources(Ok(AccountResources {
                energy_used: 10,
                energy_limit: 100,
                net_used: 5,
                net_limit: 50,
                free_net_used: 200,
                free_net_limit: 600,
            })),
    )
    .await;

    let snapshot = SnapshotBuilder::new(slot).snapshot(&info).await.unwrap();
    assert_eq!(snapshot.address, ALICE);
    assert_eq!(snapshot.native_balance, 12.345678);
    assert_eq!(snapshot.frozen_for_bandwidth, 2.0);
    assert_eq!(snapshot.frozen_for_energy, 0.5);
    assert_eq!(snapshot.energy.limit, 100);
    assert_eq!(snapshot.bandwidth.free_limit, 600);
    assert_eq!(snapshot.permissions.owner_keys, 2);
    assert_eq!(snapshot.permissions.active_count, 1);
}

#[tokio::test]
async fn snapshot_fails_when_any_read_fails() {
    let (slot, info) = connected(
        FakeProvider::unlocked()
            .with_balance(Ok(1_000_000))
            .with_resources(Err(ProviderError::Http {
                status: 503,
                body: "busy".into(),
            })),
    )
    .await;

    let err = SnapshotBuilder::new(slot).snapshot(&info).await.unwrap_err();
    assert!(matches!(err, AgentError::ProviderUnavailable(_)));
}

#[tokio::test]
async fn snapshot_defaults_missing_fields_to_zero() {
    let (slot, info) = connected(FakeProvider::unlocked().with_balance(Ok(3_000_000))).await;

    let snapshot = SnapshotBuilder::new(slot).snapshot(&info).await.unwrap();
    assert_eq!(snapshot.native_balance, 3.0);
    assert_eq!(snapshot.frozen_for_energy, 0.0);
    assert_eq!(snapshot.energy.used, 0);
    assert_eq!(snapshot.permissions.owner_threshold, 0);
}

#[tokio::test]
async fn snapshot_without_provider_is_unavailable() {
    let (slot, info) = connected(FakeProvider::unlocked()).await;
    slot.eject().await;
    let err = SnapshotBuilder::new(slot).snapshot(&info).await.unwrap_err();
    assert!(matches!(err, AgentError::ProviderUnavailable(_)));
}
