//! Component output submission.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use cirrus_deployment::{DeploymentError, Inputs, RegistrationEngine};
use cirrus_output::Output;
use cirrus_resource::{
    Component, ComponentResource, CustomResource, Resource, ResourceError, ResourceHandle,
    ResourceOptions,
};
use common::{MockMonitor, urn};
use serde_json::{Value, json};

struct Website {
    inner: ComponentResource,
    url: Output<Value>,
}

impl Resource for Website {
    fn handle(&self) -> &ResourceHandle {
        self.inner.handle()
    }
}

impl Component for Website {
    fn output_properties(&self) -> BTreeMap<String, Output<Value>> {
        BTreeMap::from([
            ("url".to_string(), self.url.clone()),
            ("urn".to_string(), self.urn().apply(Value::String)),
        ])
    }
}

#[tokio::test]
async fn empty_outputs_are_submitted() {
    let monitor = Arc::new(MockMonitor::new());
    let engine = RegistrationEngine::from_arc(monitor.clone());

    let component = ComponentResource::new("my:index:Stack", "stack");
    engine
        .register(&component, Inputs::new(), ResourceOptions::new())
        .unwrap();
    engine.register_outputs(&component).unwrap();
    engine.wait_for_completion().await.unwrap();

    let submissions = monitor.output_submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].urn, urn("my:index:Stack", "stack"));
    assert!(submissions[0].outputs.is_empty());
}

#[tokio::test]
async fn component_outputs_skip_the_urn() {
    let monitor = Arc::new(MockMonitor::new());
    let engine = RegistrationEngine::from_arc(monitor.clone());

    let site = Website {
        inner: ComponentResource::new("my:index:Website", "site"),
        url: Output::known(json!("https://example.com")),
    };
    engine
        .register(&site, Inputs::new(), ResourceOptions::new())
        .unwrap();
    engine.register_outputs(&site).unwrap();
    engine.wait_for_completion().await.unwrap();

    let submissions = monitor.output_submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].outputs.get("url"), Some(&json!("https://example.com")));
    assert!(!submissions[0].outputs.contains_key("urn"));
}

#[tokio::test]
async fn outputs_wait_for_children() {
    let monitor = Arc::new(MockMonitor::new().delay("bucket", Duration::from_millis(30)));
    let engine = RegistrationEngine::from_arc(monitor.clone());

    let component = ComponentResource::new("my:index:Website", "site");
    engine
        .register(&component, Inputs::new(), ResourceOptions::new())
        .unwrap();

    let bucket = CustomResource::new("aws:s3/bucket:Bucket", "bucket");
    engine
        .register(&bucket, Inputs::new(), ResourceOptions::new().with_parent(&component))
        .unwrap();

    let outputs = Inputs::from([("bucket".to_string(), bucket.id().apply(Value::String))]);
    engine.register_output_map(&component, outputs).unwrap();
    engine.wait_for_completion().await.unwrap();

    let submissions = monitor.output_submissions();
    assert_eq!(submissions[0].outputs["bucket"], json!("bucket-id"));
}

#[tokio::test]
async fn last_submission_wins() {
    let monitor = Arc::new(MockMonitor::new());
    let engine = RegistrationEngine::from_arc(monitor.clone());

    let component = ComponentResource::new("my:index:Stack", "stack");
    engine
        .register(&component, Inputs::new(), ResourceOptions::new())
        .unwrap();

    // The first snapshot resolves well after the second.
    let slow = Output::from_future(async {
        tokio::time::sleep(Duration::from_millis(40)).await;
        json!("first")
    });
    engine
        .register_output_map(&component, Inputs::from([("value".to_string(), slow)]))
        .unwrap();
    engine
        .register_output_map(
            &component,
            Inputs::from([("value".to_string(), Output::known(json!("second")))]),
        )
        .unwrap();
    engine.wait_for_completion().await.unwrap();

    let submissions = monitor.output_submissions();
    let last = submissions.last().unwrap();
    assert_eq!(last.outputs["value"], json!("second"));
    assert!(
        submissions
            .iter()
            .all(|submission| submission.outputs["value"] != json!("first"))
    );
}

#[tokio::test]
async fn outputs_before_registration_are_rejected() {
    let engine = RegistrationEngine::from_arc(Arc::new(MockMonitor::new()));
    let component = ComponentResource::new("my:index:Stack", "stack");

    let err = engine.register_outputs(&component).unwrap_err();
    assert!(matches!(
        err,
        DeploymentError::Argument(ResourceError::NotRegistered { .. })
    ));
}

#[tokio::test]
async fn failed_component_fails_the_submission() {
    let monitor = Arc::new(MockMonitor::new().fail("stack", "denied"));
    let engine = RegistrationEngine::from_arc(monitor.clone());

    let component = ComponentResource::new("my:index:Stack", "stack");
    engine
        .register(&component, Inputs::new(), ResourceOptions::new())
        .unwrap();
    engine.register_outputs(&component).unwrap();

    assert!(engine.wait_for_completion().await.is_err());
    assert!(monitor.output_submissions().is_empty());
}
