use std::env;
use std::sync::Once;
use std::time::Duration;

use shroud_core::ptm::{HttpManager, ManagerHandle, PrivateTransactionManager};
use shroud_core::{EncryptedPayloadReference, PrivacyResolver, Transaction};

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("shroud_core=debug")),
            )
            .with_target(true)
            .try_init();
    });
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a running private transaction manager holding a known payload"]
async fn live_manager_resolves_known_payload() {
    init_tracing();

    let url = env::var("SHROUD_TEST_PTM_URL").expect("SHROUD_TEST_PTM_URL must be set");
    let key = env::var("SHROUD_TEST_PAYLOAD_KEY").expect("SHROUD_TEST_PAYLOAD_KEY must be set");
    let expected = env::var("SHROUD_TEST_PAYLOAD_HEX").expect("SHROUD_TEST_PAYLOAD_HEX must be set");

    let manager = HttpManager::connect(&url, Duration::from_secs(10), None)
        .await
        .expect("manager must be reachable");
    eprintln!(
        "[itest] connected to {} with features {:?}",
        manager.base_url(),
        manager.features()
    );

    let reference: EncryptedPayloadReference = key.parse().expect("payload key must parse");
    let tx = Transaction::new(reference.as_bytes().to_vec());
    let resolver = PrivacyResolver::new(ManagerHandle::new(manager));

    assert!(resolver.is_private(&tx));
    let data = resolver
        .private_input_data(&tx)
        .await
        .expect("known payload must resolve");
    assert_eq!(data.to_string(), expected);

    let unknown = Transaction::new(vec![0x5a; shroud_core::REFERENCE_LEN]);
    let data = resolver
        .private_input_data(&unknown)
        .await
        .expect("unknown payload is non-participation");
    assert_eq!(data.to_string(), "0x");
}
