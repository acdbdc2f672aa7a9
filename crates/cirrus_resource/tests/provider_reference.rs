//! Provider reference resolution across clones and tasks.

use std::time::Duration;

use cirrus_output::OutputData;
use cirrus_resource::{ProviderResource, Registration, Resource, UNKNOWN_VALUE};
use futures::FutureExt;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_callers_share_one_resolution() {
    let provider = ProviderResource::new("kubernetes", "cluster");

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let provider = provider.clone();
            tokio::spawn(async move { provider.reference().await })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(provider.cached_reference().is_none());

    provider
        .handle()
        .complete(Registration::new(
            "urn:pulumi:dev::proj::pulumi:providers:kubernetes::cluster",
            "9f1c",
        ))
        .unwrap();

    for waiter in waiters {
        assert_eq!(
            waiter.await.unwrap().unwrap(),
            "urn:pulumi:dev::proj::pulumi:providers:kubernetes::cluster::9f1c"
        );
    }

    let cached = provider.reference().now_or_never();
    assert_eq!(
        cached,
        Some(Ok(
            "urn:pulumi:dev::proj::pulumi:providers:kubernetes::cluster::9f1c".to_string()
        ))
    );
}

#[tokio::test]
async fn preview_provider_uses_sentinel() {
    let provider = ProviderResource::new("pkg", "p");
    provider
        .handle()
        .complete(
            Registration::new("urn:pulumi:stack::proj::pkg:index:Provider::p", "")
                .with_id(OutputData::unknown(false)),
        )
        .unwrap();

    let reference = provider.reference().await.unwrap();
    assert_eq!(
        reference,
        format!("urn:pulumi:stack::proj::pkg:index:Provider::p::{UNKNOWN_VALUE}")
    );
}
