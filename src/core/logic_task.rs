//! The seam shared by logic tasks run inside the master.
//!
//! A logic task runs to completion in-process (no worker dispatch). It
//! declares how its parameter JSON is parsed and exposes start/pause/kill.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Parses the raw parameter JSON of a task
pub trait TaskParameterDeserializer<P>: Send + Sync {
    fn deserialize(&self, task_params_json: &str) -> Result<P, serde_json::Error>;
}

/// Deserializer for any serde type
pub struct JsonParameterDeserializer<P> {
    _marker: PhantomData<fn() -> P>,
}

impl<P> JsonParameterDeserializer<P> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<P> Default for JsonParameterDeserializer<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: DeserializeOwned> TaskParameterDeserializer<P> for JsonParameterDeserializer<P> {
    fn deserialize(&self, task_params_json: &str) -> Result<P, serde_json::Error> {
        serde_json::from_str(task_params_json)
    }
}

/// A task executed in-process by the workflow engine
#[async_trait]
pub trait LogicTask: Send {
    /// Parameter schema of the task
    type Parameters;

    /// What a completed `start` yields
    type Output: Send;

    type Error: std::error::Error + Send + Sync + 'static;

    /// Deserializer for `Parameters`, used before any execution happens
    fn parameter_deserializer() -> Box<dyn TaskParameterDeserializer<Self::Parameters>>
    where
        Self: Sized;

    async fn start(&mut self) -> Result<Self::Output, Self::Error>;

    async fn pause(&mut self) -> Result<(), Self::Error>;

    async fn kill(&mut self) -> Result<(), Self::Error>;
}
