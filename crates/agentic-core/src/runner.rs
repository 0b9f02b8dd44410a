//! The turn scheduler.
//!
//! An `AgentRunner` drives one agent through turns. It is a pull-based state
//! machine: `start` opens a turn, every call to `next()` advances it just far
//! enough to yield the next caller-visible event, and `continue_with` answers
//! a pending interrupt. Nothing runs between calls.
//!
//! ```text
//! Idle -> Running -> AwaitingTool -> Running -> ... -> Finished | Failed
//!                         |
//!                         +-> AwaitingInput -> (continue_with) -> Running
//! ```
//!
//! All parked state is explicit data (`TurnLog`, `ToolBatch`), so a parked
//! runner can be checkpointed and restored in another process.

use std::{sync::Arc, time::Instant};

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use agentic_contracts::{
    command::AgentCommand,
    error::{AgenticError, AgenticResult},
    event::{payload, Event, EventKind},
    ids::{AgentId, CallId, RunId, TurnId},
    model::{CompletionRequest, CompletionResponse, TurnUsage},
    state::TurnState,
};

use crate::{
    agent::AgentSnapshot,
    context::{RunContext, RunVars},
    engine::Engine,
    subagent,
    tool::{ToolEmission, ToolOutcome},
    turn::{
        BatchCheckpoint, PendingCall, RunnerCheckpoint, SuspendedCall, SuspendedCheckpoint,
        ToolBatch, TurnLog, Waiting, WaitingCheckpoint,
    },
};

/// User id used when the caller does not name one.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Drives one agent's turns.
///
/// A top-level runner owns its run: the memory blocks its agents store stay
/// in the engine's store until `close` is called. A runner dropped without
/// `close` leaves them there, so a checkpoint can still be restored later;
/// abandoned runs are cleaned up with [`Engine::release_run`].
pub struct AgentRunner {
    engine: Arc<Engine>,
    agent_id: AgentId,
    run_id: RunId,
    user_id: String,
    depth: u32,
    state: TurnState,
    log: TurnLog,
    /// Conversational events of every turn since the last `reset_history`.
    conversation: Vec<Event>,
    batch: Option<ToolBatch>,
    /// Agent configuration as of the decision step that produced `batch`.
    snapshot: Option<AgentSnapshot>,
    final_output: Option<String>,
    failure: Option<AgenticError>,
    vars: RunVars,
    /// Model usage of the current turn.
    usage: TurnUsage,
}

impl AgentRunner {
    /// A top-level runner (depth 0) on a fresh run.
    pub fn new(engine: Arc<Engine>, agent_id: AgentId) -> AgenticResult<Self> {
        if !engine.agents().contains(&agent_id) {
            return Err(AgenticError::UnknownAgent {
                agent: agent_id.to_string(),
            });
        }
        Ok(Self::build(
            engine,
            agent_id,
            RunId::new(),
            ANONYMOUS_USER.to_string(),
            0,
            RunVars::default(),
        ))
    }

    /// A runner for a child agent, one level below the calling context.
    pub(crate) fn nested(ctx: &RunContext, child: AgentId) -> Self {
        Self::build(
            ctx.engine.clone(),
            child,
            ctx.run_id,
            ctx.calling_user_id.clone(),
            ctx.depth + 1,
            ctx.vars.clone(),
        )
    }

    fn build(
        engine: Arc<Engine>,
        agent_id: AgentId,
        run_id: RunId,
        user_id: String,
        depth: u32,
        vars: RunVars,
    ) -> Self {
        Self {
            engine,
            agent_id,
            run_id,
            user_id,
            depth,
            state: TurnState::Idle,
            log: TurnLog::open(TurnId::new()),
            conversation: Vec::new(),
            batch: None,
            snapshot: None,
            final_output: None,
            failure: None,
            vars,
            usage: TurnUsage::default(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// The current turn, once one has been started.
    pub fn turn_id(&self) -> Option<TurnId> {
        match self.state {
            TurnState::Idle => None,
            _ => Some(self.log.turn_id),
        }
    }

    /// Every event of the current turn, including caller-originated ones.
    pub fn events(&self) -> &[Event] {
        &self.log.events
    }

    /// The history the model sees at the next decision step.
    pub fn conversation(&self) -> &[Event] {
        &self.conversation
    }

    /// Final text of the last finished turn.
    pub fn final_output(&self) -> Option<&str> {
        self.final_output.as_deref()
    }

    /// Model usage of the current or last turn.
    pub fn usage(&self) -> &TurnUsage {
        &self.usage
    }

    /// Variables shared by every agent of this run.
    pub fn vars(&self) -> &RunVars {
        &self.vars
    }

    /// Why the last turn failed.
    pub fn failure(&self) -> Option<&AgenticError> {
        self.failure.as_ref()
    }

    /// The interrupt the caller must answer, while parked.
    pub fn pending_interrupt(&self) -> Option<&Event> {
        if self.state != TurnState::AwaitingInput {
            return None;
        }
        self.log
            .events
            .iter()
            .rev()
            .find(|e| e.kind == EventKind::InterruptRequest)
    }

    /// The agent's welcome text, if it has one.
    pub fn welcome(&self) -> Option<String> {
        self.engine.agents().welcome_of(&self.agent_id).ok().flatten()
    }

    /// Open a new turn with `input`.
    ///
    /// Fails with `AlreadyRunning` unless the runner is idle or its last turn
    /// ended. The conversation of earlier turns is kept.
    pub fn start(&mut self, input: &str) -> AgenticResult<()> {
        if !self.state.can_start() {
            return Err(AgenticError::AlreadyRunning {
                state: self.state.to_string(),
            });
        }

        self.log = TurnLog::open(TurnId::new());
        self.batch = None;
        self.snapshot = None;
        self.final_output = None;
        self.failure = None;
        self.usage = TurnUsage::default();
        self.state = TurnState::Running;

        info!(
            agent_id = %self.agent_id,
            turn_id = %self.log.turn_id,
            depth = self.depth,
            "turn started"
        );

        if let Err(e) = self.emit(EventKind::UserInput, payload::text(input)) {
            self.fail(e);
        }
        Ok(())
    }

    /// Answer the pending interrupt and make the turn runnable again.
    ///
    /// Fails with `NotAwaitingInput`, leaving the runner untouched, unless an
    /// interrupt is pending. Failures while resuming are reported through the
    /// event stream, like any other turn failure.
    pub fn continue_with(&mut self, response: &str) -> AgenticResult<()> {
        if self.state != TurnState::AwaitingInput {
            return Err(AgenticError::NotAwaitingInput {
                state: self.state.to_string(),
            });
        }
        if let Err(e) = self.resume(response) {
            self.fail(e);
        }
        Ok(())
    }

    /// Cancel the current turn and every parked descendant.
    ///
    /// A no-op once the turn has ended.
    pub fn cancel(&mut self) {
        self.cancel_with("cancelled by caller");
    }

    fn cancel_with(&mut self, reason: &str) {
        if self.state.is_active() || self.state == TurnState::AwaitingInput {
            self.fail(AgenticError::Cancelled {
                reason: reason.to_string(),
            });
        }
    }

    /// Forget the conversation of earlier turns.
    pub fn reset_history(&mut self) -> AgenticResult<()> {
        if !self.state.can_start() {
            return Err(AgenticError::AlreadyRunning {
                state: self.state.to_string(),
            });
        }
        self.conversation.clear();
        debug!(agent_id = %self.agent_id, "conversation history cleared");
        Ok(())
    }

    /// End the run: cancel a parked turn and release the run's memory blocks.
    ///
    /// Returns the number of blocks released.
    pub fn close(mut self) -> AgenticResult<usize> {
        self.cancel_with("run closed");
        if self.depth > 0 {
            return Ok(0);
        }
        let released = self.engine.memory().release_run(&self.run_id)?;
        info!(
            agent_id = %self.agent_id,
            run_id = %self.run_id,
            released,
            "run closed"
        );
        Ok(released)
    }

    /// Pull every event up to the next stop.
    pub fn drain(&mut self) -> Vec<Event> {
        self.by_ref().collect()
    }

    // ── Scheduling ──

    fn advance(&mut self) {
        let result = match self.state {
            TurnState::Running => self.decide(),
            TurnState::AwaitingTool => self.dispatch_next(),
            _ => Ok(()),
        };
        if let Err(e) = result {
            self.fail(e);
        }
    }

    fn decide(&mut self) -> AgenticResult<()> {
        let snapshot = self.engine.agents().snapshot(&self.agent_id)?;
        let client = self.engine.models().resolve(&snapshot.model_ref)?;
        let request = CompletionRequest {
            agent_id: self.agent_id.clone(),
            instructions: snapshot.instructions.clone(),
            history: self.conversation.clone(),
            tool_schemas: snapshot.schemas(),
        };

        debug!(
            agent_id = %self.agent_id,
            turn_id = %self.log.turn_id,
            model_ref = %snapshot.model_ref,
            history = request.history.len(),
            tools = request.tool_schemas.len(),
            "requesting model decision"
        );

        let started = Instant::now();
        let completion = client.complete_with_usage(&request)?;
        let mut usage = completion.usage;
        if usage.model.is_empty() {
            usage.model = snapshot.model_ref.clone();
        }
        if usage.elapsed_ms == 0 {
            usage.elapsed_ms = started.elapsed().as_millis() as u64;
        }
        self.usage.record(&usage);
        debug!(
            agent_id = %self.agent_id,
            turn_id = %self.log.turn_id,
            model = %usage.model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            cost = usage.cost,
            elapsed_ms = usage.elapsed_ms,
            "model decision received"
        );

        match completion.response {
            CompletionResponse::Text { content } => self.finish(content),
            CompletionResponse::ToolCalls { calls } => {
                if calls.is_empty() {
                    return Err(AgenticError::ModelError {
                        model_ref: snapshot.model_ref.clone(),
                        reason: "returned an empty tool call batch".to_string(),
                    });
                }
                let pending: Vec<PendingCall> = calls
                    .into_iter()
                    .map(|call| PendingCall {
                        call_id: CallId::new(),
                        tool: call.tool_name,
                        arguments: call.arguments,
                    })
                    .collect();
                for call in &pending {
                    self.emit(
                        EventKind::ToolCallRequest,
                        payload::tool_call(&call.call_id, &call.tool, &call.arguments),
                    )?;
                }
                debug!(
                    agent_id = %self.agent_id,
                    turn_id = %self.log.turn_id,
                    calls = pending.len(),
                    "tool batch scheduled"
                );
                self.batch = Some(ToolBatch::new(pending));
                self.snapshot = Some(snapshot);
                self.state = TurnState::AwaitingTool;
                Ok(())
            }
        }
    }

    fn finish(&mut self, content: String) -> AgenticResult<()> {
        self.emit(EventKind::ModelOutputChunk, payload::text(&content))?;
        self.emit(
            EventKind::TurnComplete,
            payload::turn_complete(&content, &self.usage),
        )?;
        self.final_output = Some(content);
        self.state = TurnState::Finished;
        info!(
            agent_id = %self.agent_id,
            turn_id = %self.log.turn_id,
            depth = self.depth,
            events = self.log.events.len(),
            completions = self.usage.completions,
            input_tokens = self.usage.input_tokens,
            output_tokens = self.usage.output_tokens,
            "turn finished"
        );
        self.seal();
        Ok(())
    }

    fn dispatch_next(&mut self) -> AgenticResult<()> {
        let next = self.batch_mut()?.take_next();
        match next {
            Some(call) => self.dispatch(call),
            None => self.settle_batch(),
        }
    }

    fn dispatch(&mut self, call: PendingCall) -> AgenticResult<()> {
        let snapshot = self.snapshot.as_ref().ok_or_else(|| AgenticError::StateMachine {
            reason: "tool batch without an agent snapshot".to_string(),
        })?;
        let Some(tool) = snapshot.tool(&call.tool).cloned() else {
            let err = AgenticError::UnknownTool {
                agent: snapshot.name.clone(),
                tool: call.tool.clone(),
            };
            warn!(
                agent_id = %self.agent_id,
                turn_id = %self.log.turn_id,
                tool = %call.tool,
                "model requested a tool the agent does not have"
            );
            return self.emit(
                EventKind::ToolResult,
                payload::tool_error(&call.call_id, &call.tool, &err.to_string()),
            );
        };

        debug!(
            agent_id = %self.agent_id,
            turn_id = %self.log.turn_id,
            call_id = %call.call_id,
            tool = %call.tool,
            kind = ?tool.kind(),
            "dispatching tool call"
        );

        match tool.invoke(&call.arguments, &self.context()) {
            Ok(outcome) => self.absorb(call, outcome),
            Err(err) => {
                warn!(
                    agent_id = %self.agent_id,
                    turn_id = %self.log.turn_id,
                    tool = %call.tool,
                    error = %err,
                    "tool call failed"
                );
                self.emit(
                    EventKind::ToolResult,
                    payload::tool_error(&call.call_id, &call.tool, &err.message),
                )
            }
        }
    }

    fn absorb(&mut self, call: PendingCall, outcome: ToolOutcome) -> AgenticResult<()> {
        match outcome {
            ToolOutcome::Value(value) => self.emit_result(&call, &value),
            ToolOutcome::Events { emissions, value } => {
                for emission in emissions {
                    match emission {
                        ToolEmission::Output(output) => self.emit(
                            EventKind::ToolOutput,
                            payload::tool_output(&call.call_id, &call.tool, &output),
                        )?,
                        ToolEmission::Command(command) => self.apply_command(&call, &command)?,
                        ToolEmission::SetState(values) => self.apply_state(&call, &values)?,
                    }
                }
                self.emit_result(&call, &value)
            }
            ToolOutcome::Suspend { prompt, remember } => {
                debug!(
                    agent_id = %self.agent_id,
                    call_id = %call.call_id,
                    tool = %call.tool,
                    "tool call suspended for input"
                );
                self.park(call, Waiting::Human { prompt, remember })
            }
            ToolOutcome::Finish(value) => {
                self.emit_result(&call, &value)?;
                info!(
                    agent_id = %self.agent_id,
                    turn_id = %self.log.turn_id,
                    tool = %call.tool,
                    "tool finished the turn"
                );
                self.abandon_batch(&format!("not run: turn finished by '{}'", call.tool));
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                self.finish(text)
            }
            ToolOutcome::Delegated(child) => {
                debug!(
                    agent_id = %self.agent_id,
                    call_id = %call.call_id,
                    child = %child.0.agent_id(),
                    "child agent parked on an interrupt"
                );
                self.park(call, Waiting::Child(child.0))
            }
        }
    }

    fn apply_command(&mut self, call: &PendingCall, command: &AgentCommand) -> AgenticResult<()> {
        let body = serde_json::to_value(command).map_err(|e| AgenticError::StateMachine {
            reason: format!("failed to encode agent command: {}", e),
        })?;
        match self.engine.agents().apply_command(&self.agent_id, command) {
            Ok(()) => {
                info!(
                    agent_id = %self.agent_id,
                    tool = %command.tool(),
                    command = %body,
                    "agent configuration changed"
                );
                self.emit(
                    EventKind::ConfigChange,
                    payload::config_change(&call.call_id, &body, true, None),
                )
            }
            Err(e) => {
                warn!(
                    agent_id = %self.agent_id,
                    command = %body,
                    error = %e,
                    "agent configuration change rejected"
                );
                self.emit(
                    EventKind::ConfigChange,
                    payload::config_change(&call.call_id, &body, false, Some(&e.to_string())),
                )
            }
        }
    }

    fn apply_state(&mut self, call: &PendingCall, values: &Map<String, Value>) -> AgenticResult<()> {
        self.vars.merge(values);
        debug!(
            agent_id = %self.agent_id,
            run_id = %self.run_id,
            keys = ?values.keys().collect::<Vec<_>>(),
            "run variables written"
        );
        self.emit(
            EventKind::StateChange,
            payload::state_change(&call.call_id, values),
        )
    }

    fn park(&mut self, call: PendingCall, waiting: Waiting) -> AgenticResult<()> {
        self.batch_mut()?
            .suspended
            .push_back(SuspendedCall { call, waiting });
        Ok(())
    }

    /// Every call has been dispatched: either surface the first suspension or
    /// hand control back to the model.
    fn settle_batch(&mut self) -> AgenticResult<()> {
        let parked = self.batch_mut()?.suspended.len();
        if parked > 0 {
            self.surface_interrupt()?;
            self.state = TurnState::AwaitingInput;
            info!(
                agent_id = %self.agent_id,
                turn_id = %self.log.turn_id,
                depth = self.depth,
                parked,
                "turn parked awaiting input"
            );
        } else {
            self.batch = None;
            self.snapshot = None;
            self.state = TurnState::Running;
        }
        Ok(())
    }

    /// Emit the `InterruptRequest` for the front of the suspended queue.
    ///
    /// A child's interrupt is relayed with the origin's depth and agent, and
    /// with this runner's call id prepended to its path.
    fn surface_interrupt(&mut self) -> AgenticResult<()> {
        let (body, depth, source) = {
            let front = self
                .batch
                .as_ref()
                .and_then(|batch| batch.suspended.front())
                .ok_or_else(|| AgenticError::StateMachine {
                    reason: "no suspended call to surface".to_string(),
                })?;
            let call_id = front.call.call_id;

            match &front.waiting {
                Waiting::Human { prompt, .. } => {
                    let body = payload::interrupt_request(
                        &call_id,
                        &front.call.tool,
                        prompt,
                        &self.agent_id,
                        self.depth,
                        &[call_id.to_string()],
                    );
                    (body, self.depth, self.agent_id.clone())
                }
                Waiting::Child(child) => {
                    let inner =
                        child
                            .pending_interrupt()
                            .ok_or_else(|| AgenticError::StateMachine {
                                reason: format!(
                                    "child '{}' parked without an interrupt",
                                    child.agent_id()
                                ),
                            })?;
                    let origin_depth = inner
                        .payload
                        .get("origin_depth")
                        .and_then(Value::as_u64)
                        .map(|d| d as u32)
                        .unwrap_or(inner.depth);
                    let origin_agent = inner
                        .payload
                        .get("origin_agent")
                        .and_then(Value::as_str)
                        .map(AgentId::new)
                        .unwrap_or_else(|| inner.source_agent_id.clone());
                    let mut path = vec![call_id.to_string()];
                    if let Some(Value::Array(inner_path)) = inner.payload.get("path") {
                        path.extend(inner_path.iter().filter_map(Value::as_str).map(String::from));
                    }
                    let body = payload::interrupt_request(
                        &call_id,
                        inner.tool().unwrap_or(&front.call.tool),
                        inner.prompt().unwrap_or_default(),
                        &origin_agent,
                        origin_depth,
                        &path,
                    );
                    (
                        payload::relayed(body, &self.agent_id),
                        origin_depth,
                        origin_agent,
                    )
                }
            }
        };
        self.emit_from(EventKind::InterruptRequest, body, depth, source)
    }

    fn resume(&mut self, response: &str) -> AgenticResult<()> {
        let suspended = self
            .batch_mut()?
            .suspended
            .pop_front()
            .ok_or_else(|| AgenticError::StateMachine {
                reason: "awaiting input without a suspended call".to_string(),
            })?;
        let call = suspended.call;

        self.emit(
            EventKind::InterruptResponse,
            payload::interrupt_response(&call.call_id, response),
        )?;
        info!(
            agent_id = %self.agent_id,
            turn_id = %self.log.turn_id,
            call_id = %call.call_id,
            "resuming suspended call"
        );
        self.state = TurnState::AwaitingTool;

        match suspended.waiting {
            Waiting::Human { remember, .. } => {
                if let Some(key) = remember {
                    let mut values = Map::new();
                    values.insert(key, Value::String(response.to_string()));
                    self.apply_state(&call, &values)?;
                }
                self.emit_result(&call, &Value::String(response.to_string()))?;
            }
            Waiting::Child(mut child) => {
                child.continue_with(response)?;
                match subagent::settle(*child) {
                    Ok(ToolOutcome::Delegated(again)) => {
                        self.batch_mut()?.suspended.push_front(SuspendedCall {
                            call,
                            waiting: Waiting::Child(again.0),
                        });
                    }
                    Ok(ToolOutcome::Value(value)) => self.emit_result(&call, &value)?,
                    Ok(other) => {
                        return Err(AgenticError::StateMachine {
                            reason: format!("unexpected child outcome: {:?}", other),
                        })
                    }
                    Err(err) => self.emit(
                        EventKind::ToolResult,
                        payload::tool_error(&call.call_id, &call.tool, &err.message),
                    )?,
                }
            }
        }
        self.settle_batch()
    }

    fn fail(&mut self, err: AgenticError) {
        warn!(
            agent_id = %self.agent_id,
            turn_id = %self.log.turn_id,
            depth = self.depth,
            category = %err.category(),
            error = %err,
            "turn failed"
        );

        self.abandon_batch(&format!("not completed: {}", err));
        self.state = TurnState::Failed;

        let body = payload::error(&err.category().to_string(), &err.to_string());
        if let Err(e) = self.emit(EventKind::Error, body) {
            warn!(agent_id = %self.agent_id, error = %e, "could not record error event");
        }
        self.failure = Some(err);
        self.seal();
    }

    /// Drop the open batch. Parked children are cancelled and every call
    /// without a result gets an error result, so the conversation never
    /// carries a call the model was not answered on.
    fn abandon_batch(&mut self, reason: &str) {
        self.snapshot = None;
        let Some(batch) = self.batch.take() else {
            return;
        };
        let open = batch.unanswered();
        for suspended in batch.suspended {
            if let Waiting::Child(mut child) = suspended.waiting {
                child.cancel_with("ancestor turn ended");
            }
        }
        for call in open {
            if let Err(e) = self.emit(
                EventKind::ToolResult,
                payload::tool_error(&call.call_id, &call.tool, reason),
            ) {
                warn!(
                    agent_id = %self.agent_id,
                    call_id = %call.call_id,
                    error = %e,
                    "could not record abandoned call"
                );
            }
        }
    }

    // ── Plumbing ──

    fn batch_mut(&mut self) -> AgenticResult<&mut ToolBatch> {
        self.batch.as_mut().ok_or_else(|| AgenticError::StateMachine {
            reason: format!("no tool batch in state '{}'", self.state),
        })
    }

    fn context(&self) -> RunContext {
        RunContext {
            run_id: self.run_id,
            turn_id: self.log.turn_id,
            current_agent_id: self.agent_id.clone(),
            calling_user_id: self.user_id.clone(),
            depth: self.depth,
            vars: self.vars.clone(),
            engine: self.engine.clone(),
        }
    }

    fn emit_result(&mut self, call: &PendingCall, value: &Value) -> AgenticResult<()> {
        self.emit(
            EventKind::ToolResult,
            payload::tool_result(&call.call_id, &call.tool, value),
        )
    }

    fn emit(&mut self, kind: EventKind, body: Value) -> AgenticResult<()> {
        let source = self.agent_id.clone();
        self.emit_from(kind, body, self.depth, source)
    }

    /// Append an event to the turn log and hand it to every sink.
    ///
    /// The event is logged even if a sink rejects it; the first sink error is
    /// returned.
    fn emit_from(
        &mut self,
        kind: EventKind,
        body: Value,
        depth: u32,
        source: AgentId,
    ) -> AgenticResult<()> {
        let event = Event {
            kind,
            payload: body,
            depth,
            source_agent_id: source,
            turn_id: self.log.turn_id,
            sequence_no: self.log.next_sequence(),
            timestamp: Utc::now(),
        };
        debug!(
            agent_id = %self.agent_id,
            turn_id = %event.turn_id,
            sequence_no = event.sequence_no,
            kind = %event.kind,
            depth = event.depth,
            "event emitted"
        );

        let mut outcome = Ok(());
        for sink in self.engine.sinks() {
            if let Err(e) = sink.record(&event) {
                if outcome.is_ok() {
                    outcome = Err(e);
                }
            }
        }

        if kind.is_conversational() {
            self.conversation.push(event.clone());
        }
        self.log.push(event);
        outcome
    }

    fn seal(&self) {
        for sink in self.engine.sinks() {
            if let Err(e) = sink.seal(&self.agent_id, &self.log.turn_id) {
                warn!(
                    agent_id = %self.agent_id,
                    turn_id = %self.log.turn_id,
                    error = %e,
                    "event sink failed to seal turn"
                );
            }
        }
    }

    // ── Checkpoints ──

    /// Capture the runner, including parked descendants, as plain data.
    pub fn checkpoint(&self) -> RunnerCheckpoint {
        RunnerCheckpoint {
            agent_id: self.agent_id.clone(),
            run_id: self.run_id,
            user_id: self.user_id.clone(),
            depth: self.depth,
            state: self.state,
            log: self.log.clone(),
            conversation: self.conversation.clone(),
            batch: self.batch.as_ref().map(|batch| BatchCheckpoint {
                calls: batch.calls.clone(),
                dispatched: batch.dispatched,
                suspended: batch
                    .suspended
                    .iter()
                    .map(|s| SuspendedCheckpoint {
                        call: s.call.clone(),
                        waiting: match &s.waiting {
                            Waiting::Human { prompt, remember } => WaitingCheckpoint::Human {
                                prompt: prompt.clone(),
                                remember: remember.clone(),
                            },
                            Waiting::Child(child) => WaitingCheckpoint::Child {
                                runner: Box::new(child.checkpoint()),
                            },
                        },
                    })
                    .collect(),
            }),
            final_output: self.final_output.clone(),
            failure: self.failure.clone(),
            vars: self.vars.snapshot(),
            usage: self.usage,
        }
    }

    /// Rebuild a runner from a checkpoint against `engine`.
    ///
    /// Every agent named in the checkpoint must be registered in `engine`.
    /// The agent snapshot of an in-flight batch is retaken from the registry.
    pub fn restore(engine: Arc<Engine>, checkpoint: RunnerCheckpoint) -> AgenticResult<Self> {
        Self::restore_in(engine, checkpoint, None)
    }

    /// Nested runners share the run variables of the runner above them.
    fn restore_in(
        engine: Arc<Engine>,
        checkpoint: RunnerCheckpoint,
        vars: Option<RunVars>,
    ) -> AgenticResult<Self> {
        if !engine.agents().contains(&checkpoint.agent_id) {
            return Err(AgenticError::Checkpoint {
                reason: format!(
                    "agent '{}' is not registered in this engine",
                    checkpoint.agent_id
                ),
            });
        }

        let vars = vars.unwrap_or_else(|| RunVars::from_map(checkpoint.vars));
        let batch = match checkpoint.batch {
            Some(b) => {
                let mut batch = ToolBatch::new(b.calls);
                batch.dispatched = b.dispatched;
                for s in b.suspended {
                    let waiting = match s.waiting {
                        WaitingCheckpoint::Human { prompt, remember } => {
                            Waiting::Human { prompt, remember }
                        }
                        WaitingCheckpoint::Child { runner } => Waiting::Child(Box::new(
                            Self::restore_in(engine.clone(), *runner, Some(vars.clone()))?,
                        )),
                    };
                    batch.suspended.push_back(SuspendedCall {
                        call: s.call,
                        waiting,
                    });
                }
                Some(batch)
            }
            None => None,
        };
        let snapshot = match batch {
            Some(_) => Some(engine.agents().snapshot(&checkpoint.agent_id)?),
            None => None,
        };

        info!(
            agent_id = %checkpoint.agent_id,
            run_id = %checkpoint.run_id,
            state = %checkpoint.state,
            "runner restored from checkpoint"
        );

        Ok(Self {
            engine,
            agent_id: checkpoint.agent_id,
            run_id: checkpoint.run_id,
            user_id: checkpoint.user_id,
            depth: checkpoint.depth,
            state: checkpoint.state,
            log: checkpoint.log,
            conversation: checkpoint.conversation,
            batch,
            snapshot,
            final_output: checkpoint.final_output,
            failure: checkpoint.failure,
            vars,
            usage: checkpoint.usage,
        })
    }
}

/// Lazily drives the turn. Returns `None` once the turn is finished, failed
/// or parked on an interrupt; calling it again is harmless.
impl Iterator for AgentRunner {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        loop {
            if let Some(event) = self.log.next_visible() {
                return Some(event);
            }
            if !self.state.is_active() {
                return None;
            }
            self.advance();
        }
    }
}

impl std::fmt::Debug for AgentRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRunner")
            .field("agent_id", &self.agent_id)
            .field("run_id", &self.run_id)
            .field("depth", &self.depth)
            .field("state", &self.state)
            .field("events", &self.log.events.len())
            .finish()
    }
}
