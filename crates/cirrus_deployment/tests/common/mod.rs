//! A recording stand-in for the engine's resource monitor.

#![allow(dead_code, reason = "not every test uses every helper")]

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use cirrus_monitor::types::{
    CallRequest, CallResponse, InvokeResponse, Properties, ReadResourceRequest,
    ReadResourceResponse, RegisterResourceOutputsRequest, RegisterResourceRequest,
    RegisterResourceResponse, ResourceInvokeRequest, SupportsFeatureRequest,
    SupportsFeatureResponse,
};
use cirrus_monitor::{ResourceMonitor, TransportError};
use hashbrown::HashMap;
use parking_lot::Mutex;
use serde_json::Value;

/// Something the monitor was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A `RegisterResource` call started.
    RegisterStarted(String),
    /// A `RegisterResource` call answered.
    RegisterFinished(String),
    /// A `ReadResource` call.
    Read(String),
    /// A `RegisterResourceOutputs` call.
    Outputs(String),
    /// An `Invoke` call.
    Invoke(String),
    /// A `Call` call.
    Call(String),
    /// A `SupportsFeature` call.
    Feature(String),
}

#[derive(Default)]
struct Script {
    delays: HashMap<String, Duration>,
    failures: HashMap<String, String>,
    objects: HashMap<String, Properties>,
    ids: HashMap<String, String>,
    invoke_results: VecDeque<InvokeResponse>,
    call_results: VecDeque<CallResponse>,
    features: HashMap<String, bool>,
}

/// Mock monitor that records every request and answers from a script.
///
/// Registrations answer with `urn:pulumi:test::proj::{type}::{name}` and an
/// id of `{name}-id` unless scripted otherwise, echoing the inputs back as
/// outputs.
#[derive(Default)]
pub struct MockMonitor {
    script: Mutex<Script>,
    events: Mutex<Vec<Event>>,
    registrations: Mutex<Vec<RegisterResourceRequest>>,
    reads: Mutex<Vec<ReadResourceRequest>>,
    outputs: Mutex<Vec<RegisterResourceOutputsRequest>>,
    invokes: Mutex<Vec<ResourceInvokeRequest>>,
    calls: Mutex<Vec<CallRequest>>,
}

impl MockMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays the response to the registration of `name`.
    pub fn delay(self, name: &str, delay: Duration) -> Self {
        self.script.lock().delays.insert(name.to_string(), delay);
        self
    }

    /// Rejects the registration of `name` with `message`.
    pub fn fail(self, name: &str, message: &str) -> Self {
        self.script
            .lock()
            .failures
            .insert(name.to_string(), message.to_string());
        self
    }

    /// Answers the registration of `name` with `object` instead of its inputs.
    pub fn object(self, name: &str, object: Value) -> Self {
        if let Value::Object(object) = object {
            self.script.lock().objects.insert(name.to_string(), object);
        }
        self
    }

    /// Answers the registration of `name` with `id`.
    pub fn id(self, name: &str, id: &str) -> Self {
        self.script
            .lock()
            .ids
            .insert(name.to_string(), id.to_string());
        self
    }

    /// Queues the answer to the next `Invoke`.
    pub fn invoke_result(self, response: InvokeResponse) -> Self {
        self.script.lock().invoke_results.push_back(response);
        self
    }

    /// Queues the answer to the next `Call`.
    pub fn call_result(self, response: CallResponse) -> Self {
        self.script.lock().call_results.push_back(response);
        self
    }

    /// Sets the answer to `SupportsFeature` for `feature`.
    pub fn feature(self, feature: &str, supported: bool) -> Self {
        self.script
            .lock()
            .features
            .insert(feature.to_string(), supported);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn registrations(&self) -> Vec<RegisterResourceRequest> {
        self.registrations.lock().clone()
    }

    pub fn registration(&self, name: &str) -> Option<RegisterResourceRequest> {
        self.registrations
            .lock()
            .iter()
            .find(|request| request.name == name)
            .cloned()
    }

    pub fn reads(&self) -> Vec<ReadResourceRequest> {
        self.reads.lock().clone()
    }

    pub fn output_submissions(&self) -> Vec<RegisterResourceOutputsRequest> {
        self.outputs.lock().clone()
    }

    pub fn invokes(&self) -> Vec<ResourceInvokeRequest> {
        self.invokes.lock().clone()
    }

    pub fn calls(&self) -> Vec<CallRequest> {
        self.calls.lock().clone()
    }

    /// Position of `event` in the log.
    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events.lock().iter().position(|e| e == event)
    }

    fn record(&self, event: Event) {
        self.events.lock().push(event);
    }
}

pub fn urn(type_token: &str, name: &str) -> String {
    format!("urn:pulumi:test::proj::{type_token}::{name}")
}

#[async_trait]
impl ResourceMonitor for MockMonitor {
    async fn supports_feature(
        &self,
        request: SupportsFeatureRequest,
    ) -> Result<SupportsFeatureResponse, TransportError> {
        self.record(Event::Feature(request.id.clone()));
        let has_support = self
            .script
            .lock()
            .features
            .get(&request.id)
            .copied()
            .unwrap_or(false);
        Ok(SupportsFeatureResponse { has_support })
    }

    async fn invoke(
        &self,
        request: ResourceInvokeRequest,
    ) -> Result<InvokeResponse, TransportError> {
        self.record(Event::Invoke(request.tok.clone()));
        self.invokes.lock().push(request);
        let response = self.script.lock().invoke_results.pop_front();
        Ok(response.unwrap_or_default())
    }

    async fn call(&self, request: CallRequest) -> Result<CallResponse, TransportError> {
        self.record(Event::Call(request.tok.clone()));
        self.calls.lock().push(request);
        let response = self.script.lock().call_results.pop_front();
        Ok(response.unwrap_or_default())
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequest,
    ) -> Result<ReadResourceResponse, TransportError> {
        self.record(Event::Read(request.name.clone()));
        let response = ReadResourceResponse {
            urn: urn(&request.type_token, &request.name),
            properties: request.properties.clone(),
        };
        self.reads.lock().push(request);
        Ok(response)
    }

    async fn register_resource(
        &self,
        request: RegisterResourceRequest,
    ) -> Result<RegisterResourceResponse, TransportError> {
        let name = request.name.clone();
        self.record(Event::RegisterStarted(name.clone()));
        self.registrations.lock().push(request.clone());

        let (delay, failure, object, id) = {
            let script = self.script.lock();
            (
                script.delays.get(&name).copied(),
                script.failures.get(&name).cloned(),
                script.objects.get(&name).cloned(),
                script.ids.get(&name).cloned(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.record(Event::RegisterFinished(name.clone()));

        if let Some(message) = failure {
            return Err(TransportError::Status {
                method: "RegisterResource".into(),
                status: 400,
                message,
            });
        }

        let id = match id {
            Some(id) => id,
            None if request.custom => format!("{name}-id"),
            None => String::new(),
        };
        Ok(RegisterResourceResponse {
            urn: urn(&request.type_token, &name),
            id,
            object: object.unwrap_or(request.object),
            ..Default::default()
        })
    }

    async fn register_resource_outputs(
        &self,
        request: RegisterResourceOutputsRequest,
    ) -> Result<(), TransportError> {
        self.record(Event::Outputs(request.urn.clone()));
        self.outputs.lock().push(request);
        Ok(())
    }
}
