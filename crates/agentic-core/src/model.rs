//! Model resolution and deterministic model clients.
//!
//! `ModelRouter` maps an agent's `model_ref` to a `ModelClient`. The two
//! clients here never call out to a real service: `ScriptedModel` replays a
//! fixed list of responses and `FnModel` decides with a closure. The reference
//! scenarios and the tests run on them.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use tracing::debug;

use agentic_contracts::{
    error::{AgenticError, AgenticResult},
    model::{Completion, CompletionRequest, CompletionResponse, CompletionUsage},
};

use crate::traits::ModelClient;

/// Resolves model references to clients: exact match first, then the
/// fallback, if one was set.
#[derive(Default, Clone)]
pub struct ModelRouter {
    clients: HashMap<String, Arc<dyn ModelClient>>,
    fallback: Option<Arc<dyn ModelClient>>,
}

impl ModelRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `client` under `model_ref`, replacing any previous one.
    pub fn register(&mut self, model_ref: impl Into<String>, client: Arc<dyn ModelClient>) {
        self.clients.insert(model_ref.into(), client);
    }

    pub fn set_fallback(&mut self, client: Arc<dyn ModelClient>) {
        self.fallback = Some(client);
    }

    pub fn resolve(&self, model_ref: &str) -> AgenticResult<Arc<dyn ModelClient>> {
        if let Some(client) = self.clients.get(model_ref) {
            return Ok(client.clone());
        }
        if let Some(fallback) = &self.fallback {
            debug!(model_ref = %model_ref, "no exact model match, using fallback");
            return Ok(fallback.clone());
        }
        Err(AgenticError::UnknownModel {
            model_ref: model_ref.to_string(),
        })
    }
}

/// Replays a fixed script of responses, one per decision step.
///
/// Every request is recorded so tests can inspect what the scheduler sent.
/// Running past the end of the script is a `ModelError`.
pub struct ScriptedModel {
    name: String,
    script: Mutex<VecDeque<AgenticResult<Completion>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Build a model from a list of responses.
    pub fn replying(
        name: impl Into<String>,
        responses: impl IntoIterator<Item = CompletionResponse>,
    ) -> Self {
        let model = Self::new(name);
        for response in responses {
            model.push(response);
        }
        model
    }

    pub fn push(&self, response: CompletionResponse) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(response.into()));
        }
    }

    /// Queue a response that reports `usage`.
    pub fn push_metered(&self, response: CompletionResponse, usage: CompletionUsage) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(Completion { response, usage }));
        }
    }

    /// Queue a failure for the next decision step.
    pub fn push_error(&self, error: AgenticError) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(error));
        }
    }

    /// All requests received so far, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl ModelClient for ScriptedModel {
    fn complete(&self, request: &CompletionRequest) -> AgenticResult<CompletionResponse> {
        self.complete_with_usage(request).map(|c| c.response)
    }

    fn complete_with_usage(&self, request: &CompletionRequest) -> AgenticResult<Completion> {
        let mut requests = self.requests.lock().map_err(|e| AgenticError::ModelError {
            model_ref: self.name.clone(),
            reason: format!("request log poisoned: {}", e),
        })?;
        requests.push(request.clone());
        drop(requests);

        let mut script = self.script.lock().map_err(|e| AgenticError::ModelError {
            model_ref: self.name.clone(),
            reason: format!("script poisoned: {}", e),
        })?;
        script.pop_front().unwrap_or_else(|| {
            Err(AgenticError::ModelError {
                model_ref: self.name.clone(),
                reason: "script exhausted".to_string(),
            })
        })
    }
}

type Decide = dyn Fn(&CompletionRequest) -> AgenticResult<CompletionResponse> + Send + Sync;
type Meter = dyn Fn(&CompletionRequest, &CompletionResponse) -> CompletionUsage + Send + Sync;

/// A model whose decisions come from a closure over the request.
///
/// An optional meter reports usage for each decision.
pub struct FnModel {
    decide: Box<Decide>,
    meter: Option<Box<Meter>>,
}

impl FnModel {
    pub fn new<F>(decide: F) -> Self
    where
        F: Fn(&CompletionRequest) -> AgenticResult<CompletionResponse> + Send + Sync + 'static,
    {
        Self {
            decide: Box::new(decide),
            meter: None,
        }
    }

    pub fn metered<M>(mut self, meter: M) -> Self
    where
        M: Fn(&CompletionRequest, &CompletionResponse) -> CompletionUsage + Send + Sync + 'static,
    {
        self.meter = Some(Box::new(meter));
        self
    }
}

impl ModelClient for FnModel {
    fn complete(&self, request: &CompletionRequest) -> AgenticResult<CompletionResponse> {
        (self.decide)(request)
    }

    fn complete_with_usage(&self, request: &CompletionRequest) -> AgenticResult<Completion> {
        let response = (self.decide)(request)?;
        let usage = self
            .meter
            .as_ref()
            .map(|meter| meter(request, &response))
            .unwrap_or_default();
        Ok(Completion { response, usage })
    }
}
