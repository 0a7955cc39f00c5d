//! The agent and its turn loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use tandem_context::ContextManager;
use tandem_context::Summarizer;
use tandem_driver::GenerateRequest;
use tandem_driver::GenerateResponse;
use tandem_driver::ModelDriver;
use tandem_error::AgentError;
use tandem_error::ErrorCode;
use tandem_error::Result;
use tandem_guardrails::Guardrail;
use tandem_guardrails::race_guardrails;
use tandem_hooks::HookContext;
use tandem_hooks::HookEvent;
use tandem_hooks::HookOutput;
use tandem_hooks::HookRegistry;
use tandem_permissions::CanUseTool;
use tandem_permissions::GateDecision;
use tandem_permissions::PermissionPipeline;
use tandem_permissions::filter_tools;
use tandem_protocol::Checkpoint;
use tandem_protocol::ContentPart;
use tandem_protocol::ConversationState;
use tandem_protocol::FinishReason;
use tandem_protocol::Interrupt;
use tandem_protocol::InterruptKind;
use tandem_protocol::Message;
use tandem_protocol::PermissionMode;
use tandem_protocol::Role;
use tandem_protocol::StreamChunk;
use tandem_protocol::TokenUsage;
use tandem_protocol::ToolResultOutput;
use tandem_protocol::TurnResult;
use tandem_store::Checkpointer;
use tandem_tasks::TaskManager;
use tandem_tools::InterruptResponses;
use tandem_tools::InterruptSignal;
use tandem_tools::ToolContext;
use tandem_tools::ToolFailure;
use tandem_tools::ToolRegistry;
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::OwnedMutexGuard;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::Skill;
use crate::config::SubagentDefinition;
use crate::options::GenerateOptions;
use crate::prompt::PromptBuilder;
use crate::prompt::PromptContext;
use crate::retry::RetryController;

static AGENT_COUNTER: AtomicU64 = AtomicU64::new(0);

pub(crate) fn next_agent_id() -> String {
    format!("agent-{}", AGENT_COUNTER.fetch_add(1, Ordering::SeqCst) + 1)
}

/// Chunk channel used by the streaming surface.
///
/// Unbounded: the consumer reads lazily and the producer never blocks on a
/// slow reader mid-turn.
pub(crate) type ChunkSender = mpsc::UnboundedSender<Result<StreamChunk>>;

/// Mutable state for one turn.
pub(crate) struct TurnState {
    pub thread_id: Option<String>,
    pub forked_session_id: Option<String>,
    pub messages: Vec<Message>,
    pub state: Arc<StdMutex<ConversationState>>,
    pub usage: TokenUsage,
    pub steps: u32,
    pub effective_tools: Vec<String>,
    pub cancel: CancellationToken,
}

impl TurnState {
    /// The persisted view of the messages: everything but the leading system
    /// message, which is rebuilt fresh each turn.
    pub fn persistable_messages(&self) -> Vec<Message> {
        match self.messages.first() {
            Some(m) if m.role == Role::System => self.messages[1..].to_vec(),
            _ => self.messages.clone(),
        }
    }

    fn state_snapshot(&self) -> ConversationState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

pub(crate) enum StepOutcome {
    Continue,
    Interrupted(TurnResult),
}

/// An agent: a configured turn executor.
///
/// Created through [`crate::AgentBuilder`]; ids take the form `agent-<N>`.
pub struct Agent {
    pub(crate) id: String,
    pub(crate) driver: Arc<dyn ModelDriver>,
    pub(crate) fallback: Option<Arc<dyn ModelDriver>>,
    pub(crate) system_prompt: Option<String>,
    pub(crate) prompt_builder: Option<Arc<dyn PromptBuilder>>,
    pub(crate) tools: Arc<ToolRegistry>,
    pub(crate) allowed_tools: Option<Vec<String>>,
    pub(crate) disallowed_tools: Vec<String>,
    pub(crate) disabled_core_tools: Vec<String>,
    pub(crate) hooks: Arc<HookRegistry>,
    pub(crate) checkpointer: Option<Arc<dyn Checkpointer>>,
    pub(crate) context: Option<Arc<ContextManager>>,
    pub(crate) task_manager: Arc<TaskManager>,
    pub(crate) permission_mode: StdMutex<PermissionMode>,
    pub(crate) can_use_tool: Option<Arc<dyn CanUseTool>>,
    pub(crate) responses: InterruptResponses,
    pub(crate) skills: Vec<Skill>,
    pub(crate) plugin_names: Vec<String>,
    pub(crate) subagents: HashMap<String, SubagentDefinition>,
    pub(crate) input_guardrails: Vec<Arc<dyn Guardrail>>,
    pub(crate) delegation_instructions: Option<String>,
    pub(crate) max_steps: u32,
    pub(crate) max_retries: u32,
    thread_locks: StdMutex<HashMap<String, Arc<TokioMutex<()>>>>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent").field("id", &self.id).finish()
    }
}

impl Agent {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        driver: Arc<dyn ModelDriver>,
        fallback: Option<Arc<dyn ModelDriver>>,
        system_prompt: Option<String>,
        prompt_builder: Option<Arc<dyn PromptBuilder>>,
        tools: Arc<ToolRegistry>,
        allowed_tools: Option<Vec<String>>,
        disallowed_tools: Vec<String>,
        disabled_core_tools: Vec<String>,
        hooks: Arc<HookRegistry>,
        checkpointer: Option<Arc<dyn Checkpointer>>,
        context: Option<Arc<ContextManager>>,
        task_manager: Arc<TaskManager>,
        permission_mode: PermissionMode,
        can_use_tool: Option<Arc<dyn CanUseTool>>,
        skills: Vec<Skill>,
        plugin_names: Vec<String>,
        subagents: HashMap<String, SubagentDefinition>,
        input_guardrails: Vec<Arc<dyn Guardrail>>,
        delegation_instructions: Option<String>,
        max_steps: u32,
        max_retries: u32,
    ) -> Self {
        Self {
            id: next_agent_id(),
            driver,
            fallback,
            system_prompt,
            prompt_builder,
            tools,
            allowed_tools,
            disallowed_tools,
            disabled_core_tools,
            hooks,
            checkpointer,
            context,
            task_manager,
            permission_mode: StdMutex::new(permission_mode),
            can_use_tool,
            responses: InterruptResponses::new(),
            skills,
            plugin_names,
            subagents,
            input_guardrails,
            delegation_instructions,
            max_steps,
            max_retries,
            thread_locks: StdMutex::new(HashMap::new()),
        }
    }

    /// The agent id (`agent-<N>`).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The agent's task manager.
    pub fn task_manager(&self) -> Arc<TaskManager> {
        self.task_manager.clone()
    }

    /// The tools the agent will offer the model this turn.
    pub fn get_active_tools(&self) -> Vec<String> {
        self.effective_tools()
    }

    /// The agent's skills.
    pub fn get_skills(&self) -> &[Skill] {
        &self.skills
    }

    /// The current permission mode.
    pub fn permission_mode(&self) -> PermissionMode {
        *self
            .permission_mode
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Switch the permission mode for subsequent turns.
    pub fn set_permission_mode(&self, mode: PermissionMode) {
        info!(agent_id = %self.id, mode = %mode, "Permission mode changed");
        *self
            .permission_mode
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = mode;
    }

    /// Run one turn to completion or interruption.
    pub async fn generate(&self, options: GenerateOptions) -> Result<TurnResult> {
        self.generate_inner(options, None).await
    }

    /// The pending interrupt for a thread, if any.
    pub async fn get_interrupt(&self, thread_id: &str) -> Result<Option<Interrupt>> {
        let Some(checkpointer) = &self.checkpointer else {
            return Ok(None);
        };
        Ok(checkpointer
            .load(thread_id)
            .await?
            .and_then(|c| c.pending_interrupt))
    }

    // ── Turn internals ──────────────────────────────────────────────

    pub(crate) fn thread_lock(&self, thread_id: &str) -> Arc<TokioMutex<()>> {
        let mut locks = self.thread_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(TokioMutex::new(())))
            .clone()
    }

    pub(crate) fn effective_tools(&self) -> Vec<String> {
        let registered: Vec<String> = self
            .tools
            .names()
            .into_iter()
            .filter(|name| !self.disabled_core_tools.contains(name))
            .collect();
        filter_tools(
            &registered,
            self.allowed_tools.as_deref(),
            &self.disallowed_tools,
        )
    }

    fn build_system_prompt(&self, effective_tools: &[String]) -> Option<String> {
        if let Some(prompt) = &self.system_prompt {
            return Some(prompt.clone());
        }
        self.prompt_builder.as_ref().map(|builder| {
            builder.build(&PromptContext {
                tools: effective_tools,
                skills: &self.skills,
                plugins: &self.plugin_names,
                permission_mode: self.permission_mode(),
                delegation_instructions: self.delegation_instructions.as_deref(),
            })
        })
    }

    fn pipeline(&self) -> PermissionPipeline {
        PermissionPipeline::new(
            self.permission_mode(),
            self.can_use_tool.clone(),
            self.hooks.clone(),
        )
    }

    pub(crate) fn summarizer(&self) -> Arc<dyn Summarizer> {
        Arc::new(DriverSummarizer {
            driver: self.driver.clone(),
        })
    }

    pub(crate) async fn generate_inner(
        &self,
        options: GenerateOptions,
        emitter: Option<ChunkSender>,
    ) -> Result<TurnResult> {
        let thread_for_errors = options
            .fork_session
            .clone()
            .or_else(|| options.thread_id.clone());

        let result = self.generate_unwrapped(options, emitter).await;
        match (result, thread_for_errors) {
            (Err(err), Some(thread_id)) if err.metadata_value("threadId").is_none() => {
                Err(err.with_thread_id(thread_id))
            }
            (other, _) => other,
        }
    }

    async fn generate_unwrapped(
        &self,
        mut options: GenerateOptions,
        emitter: Option<ChunkSender>,
    ) -> Result<TurnResult> {
        // Step 1: PreGenerate hooks, sequential, errors propagate.
        let pre_ctx = HookContext::new(HookEvent::PreGenerate).with_cancel(options.cancel.clone());
        let pre_ctx = match &options.thread_id {
            Some(thread_id) => pre_ctx.with_thread_id(thread_id.clone()),
            None => pre_ctx,
        };
        let outputs = self.hooks.run(&pre_ctx).await?;

        // respond_with dominates over updated_input.
        for output in &outputs {
            if let HookOutput::RespondWith { result } = output {
                debug!(agent_id = %self.id, "PreGenerate hook short-circuited the turn");
                return Ok(result.clone());
            }
        }
        for output in outputs {
            match output {
                HookOutput::UpdateInput { prompt, messages } => {
                    if prompt.is_some() {
                        options.prompt = prompt;
                    }
                    if messages.is_some() {
                        options.messages = messages;
                    }
                }
                HookOutput::Block { reason } => {
                    return Err(AgentError::new(
                        ErrorCode::Authorization,
                        format!("generation blocked by hook: {reason}"),
                    ));
                }
                _ => {}
            }
        }

        // Input guardrails race against the incoming text.
        if !self.input_guardrails.is_empty() {
            let input_text = options.prompt.clone().unwrap_or_else(|| {
                options
                    .messages
                    .as_ref()
                    .and_then(|m| m.last())
                    .map(Message::text)
                    .unwrap_or_default()
            });
            race_guardrails(&self.input_guardrails, &input_text, &options.cancel, true).await?;
        }

        // Step 2: thread load (and fork).
        let effective_thread = options
            .fork_session
            .clone()
            .or_else(|| options.thread_id.clone());

        let _turn_guard: Option<OwnedMutexGuard<()>> = match &effective_thread {
            Some(thread_id) if self.checkpointer.is_some() => {
                Some(self.thread_lock(thread_id).lock_owned().await)
            }
            _ => None,
        };

        let mut prior_messages = Vec::new();
        let mut state = ConversationState::new();
        let forked_session_id = options.fork_session.clone();

        if let Some(checkpointer) = &self.checkpointer {
            if let Some(fork_id) = &options.fork_session {
                let source = match &options.thread_id {
                    Some(source_id) => checkpointer.load(source_id).await?,
                    None => None,
                };
                let fork = match source {
                    Some(source) => source.fork_to(fork_id.clone()),
                    // Missing source: the fork still succeeds as a fresh thread.
                    None => Checkpoint::new(fork_id.clone()),
                };
                let saved = checkpointer.save(fork).await?;
                prior_messages = saved.messages;
                state = saved.state;
            } else if let Some(thread_id) = &options.thread_id {
                if let Some(checkpoint) = checkpointer.load(thread_id).await? {
                    prior_messages = checkpoint.messages;
                    state = checkpoint.state;
                }
            }
        }

        // Step 3: message assembly.
        let effective_tools = self.effective_tools();
        let mut messages = Vec::new();
        if let Some(system) = self.build_system_prompt(&effective_tools) {
            messages.push(Message::system(system));
        }
        messages.extend(prior_messages);
        match (&options.prompt, &options.messages) {
            (Some(prompt), _) => messages.push(Message::user(prompt.clone())),
            (None, Some(user_messages)) => messages.extend(user_messages.clone()),
            (None, None) => {
                return Err(AgentError::validation(
                    "generate requires a prompt or messages",
                ));
            }
        }

        // Step 4: context compaction.
        if let Some(context) = &self.context {
            messages = context.process(messages, self.summarizer()).await?;
        }

        let mut turn = TurnState {
            thread_id: effective_thread,
            forked_session_id,
            messages,
            state: Arc::new(StdMutex::new(state)),
            usage: TokenUsage::default(),
            steps: 0,
            effective_tools,
            cancel: options.cancel.clone(),
        };

        // Steps 6-8: the generation loop.
        self.run_loop(&mut turn, emitter.as_ref()).await
    }

    /// The model/tool loop: generate, execute tool calls, repeat until the
    /// model stops, the step bound is hit, or a tool interrupts.
    pub(crate) async fn run_loop(
        &self,
        turn: &mut TurnState,
        emitter: Option<&ChunkSender>,
    ) -> Result<TurnResult> {
        let mut controller = RetryController::new(
            self.driver.clone(),
            self.fallback.clone(),
            self.hooks.clone(),
            turn.thread_id.clone(),
            self.max_retries,
        );

        let mut last_response: Option<GenerateResponse> = None;
        loop {
            if turn.cancel.is_cancelled() {
                return Err(AgentError::abort("turn cancelled"));
            }

            if turn.steps >= self.max_steps {
                warn!(agent_id = %self.id, steps = turn.steps, "Step bound reached");
                let response = last_response.unwrap_or(GenerateResponse {
                    content: Vec::new(),
                    usage: TokenUsage::default(),
                    finish_reason: FinishReason::Length,
                });
                return self.finalize_complete(turn, &response, emitter).await;
            }
            turn.steps += 1;

            let request = GenerateRequest::new(turn.messages.clone())
                .with_tools(self.tools.definitions_for(&turn.effective_tools));

            // A per-turn cancel aborts the in-flight model call.
            let response = tokio::select! {
                biased;
                () = turn.cancel.cancelled() => {
                    return Err(AgentError::abort("turn cancelled"));
                }
                response = self.model_step(&mut controller, request, emitter) => response?,
            };
            turn.usage.add(response.usage);

            self.append_assistant_message(turn, &response);
            if let Some(context) = &self.context {
                context.record_usage(&turn.messages, turn.usage.total());
            }

            if !response.has_tool_calls() {
                return self.finalize_complete(turn, &response, emitter).await;
            }

            match self.process_pending_tool_calls(turn, emitter).await? {
                StepOutcome::Continue => {
                    last_response = Some(response);
                }
                StepOutcome::Interrupted(result) => return Ok(result),
            }
        }
    }

    async fn model_step(
        &self,
        controller: &mut RetryController,
        request: GenerateRequest,
        emitter: Option<&ChunkSender>,
    ) -> Result<GenerateResponse> {
        match emitter {
            None => {
                controller
                    .run(|driver| {
                        let request = request.clone();
                        async move { driver.generate(request).await }
                    })
                    .await
            }
            Some(emitter) => {
                let stream = controller
                    .run(|driver| {
                        let request = request.clone();
                        async move { driver.stream(request).await }
                    })
                    .await?;
                crate::stream::collect_and_forward(stream, emitter).await
            }
        }
    }

    fn append_assistant_message(&self, turn: &mut TurnState, response: &GenerateResponse) {
        if response.content.is_empty() {
            return;
        }
        let only_text = response
            .content
            .iter()
            .all(|p| matches!(p, ContentPart::Text { .. }));
        let message = if only_text {
            Message::assistant(response.text())
        } else {
            Message::assistant_parts(response.content.clone())
        };
        turn.messages.push(message);
    }

    /// Execute the unanswered tool calls of the last assistant message, in
    /// the order the model emitted them.
    pub(crate) async fn process_pending_tool_calls(
        &self,
        turn: &mut TurnState,
        emitter: Option<&ChunkSender>,
    ) -> Result<StepOutcome> {
        for (call_id, tool_name, args) in pending_tool_calls(&turn.messages) {
            if turn.cancel.is_cancelled() {
                return Err(AgentError::abort("turn cancelled during tool execution"));
            }

            let pipeline = self.pipeline();
            let decision = pipeline
                .evaluate(
                    &tool_name,
                    &args,
                    &call_id,
                    self.tools.is_edit_tool(&tool_name),
                    &turn.effective_tools,
                    turn.thread_id.as_deref(),
                    &turn.cancel,
                )
                .await;

            match decision {
                GateDecision::Allow => {
                    match self
                        .execute_tool_unchecked(turn, &call_id, &tool_name, &args, emitter)
                        .await?
                    {
                        StepOutcome::Continue => {}
                        interrupted => return Ok(interrupted),
                    }
                }
                GateDecision::Deny(err) => {
                    self.emit_tool_failure_hooks(turn, &call_id, &tool_name, &args, &err)
                        .await;
                    self.append_tool_result(
                        turn,
                        &call_id,
                        &tool_name,
                        ToolResultOutput::text(err.message.clone()),
                        emitter,
                    )
                    .await;
                }
                GateDecision::NeedsApproval { reason } => {
                    if turn.thread_id.is_some() && self.checkpointer.is_some() {
                        let interrupt = Interrupt::new(
                            turn.thread_id.clone().unwrap_or_default(),
                            InterruptKind::Approval,
                            call_id.clone(),
                            tool_name.clone(),
                            serde_json::json!({
                                "toolName": tool_name,
                                "args": args,
                                "reason": reason,
                            }),
                        );
                        return self.suspend_turn(turn, interrupt).await.map(StepOutcome::Interrupted);
                    }
                    // Without a checkpointer the approval cannot be
                    // delivered later; surface the reason to the model.
                    let err = AgentError::tool(reason.clone())
                        .with_metadata("toolName", tool_name.clone())
                        .with_metadata("toolInput", args.clone());
                    self.emit_tool_failure_hooks(turn, &call_id, &tool_name, &args, &err)
                        .await;
                    self.append_tool_result(
                        turn,
                        &call_id,
                        &tool_name,
                        ToolResultOutput::text(reason),
                        emitter,
                    )
                    .await;
                }
            }
        }

        Ok(StepOutcome::Continue)
    }

    /// Execute one tool call that has already passed (or legitimately
    /// skipped) the permission pipeline.
    pub(crate) async fn execute_tool_unchecked(
        &self,
        turn: &mut TurnState,
        call_id: &str,
        tool_name: &str,
        args: &serde_json::Value,
        emitter: Option<&ChunkSender>,
    ) -> Result<StepOutcome> {
        let Some(tool) = self.tools.get(tool_name) else {
            let err = AgentError::tool(format!("tool not found: {tool_name}"));
            self.emit_tool_failure_hooks(turn, call_id, tool_name, args, &err)
                .await;
            self.append_tool_result(
                turn,
                call_id,
                tool_name,
                ToolResultOutput::text(err.message.clone()),
                emitter,
            )
            .await;
            return Ok(StepOutcome::Continue);
        };

        let mut ctx = ToolContext::new(
            call_id,
            tool_name,
            turn.state.clone(),
            self.responses.clone(),
        )
        .with_cancel(turn.cancel.clone());
        if let Some(thread_id) = &turn.thread_id {
            ctx = ctx.with_thread_id(thread_id.clone());
        }

        match tool.execute(args.clone(), &mut ctx).await {
            Ok(output) => {
                let post_ctx = HookContext::new(HookEvent::PostToolUse)
                    .with_tool(call_id, tool_name, args.clone())
                    .with_metadata("isError", serde_json::json!(output.is_error))
                    .with_cancel(turn.cancel.clone());
                let _ = self.hooks.run_logged(&post_ctx).await;

                self.append_tool_result(turn, call_id, tool_name, output.content, emitter)
                    .await;
                Ok(StepOutcome::Continue)
            }
            Err(ToolFailure::Interrupt(signal)) => {
                let interrupt = self.interrupt_from_signal(turn, signal);
                self.suspend_turn(turn, interrupt)
                    .await
                    .map(StepOutcome::Interrupted)
            }
            Err(ToolFailure::Error(err)) => {
                // Tool failures stay inside the turn: the model sees the
                // message as a tool result and may recover.
                let err = if err.code == ErrorCode::Tool {
                    err
                } else {
                    AgentError::tool(err.message.clone())
                        .with_metadata("toolName", tool_name)
                        .with_source(err)
                };
                self.emit_tool_failure_hooks(turn, call_id, tool_name, args, &err)
                    .await;
                self.append_tool_result(
                    turn,
                    call_id,
                    tool_name,
                    ToolResultOutput::text(err.message.clone()),
                    emitter,
                )
                .await;
                Ok(StepOutcome::Continue)
            }
        }
    }

    fn interrupt_from_signal(&self, turn: &TurnState, signal: InterruptSignal) -> Interrupt {
        Interrupt::new(
            turn.thread_id.clone().unwrap_or_default(),
            signal.kind,
            signal.tool_call_id,
            signal.tool_name,
            signal.request,
        )
    }

    async fn emit_tool_failure_hooks(
        &self,
        turn: &TurnState,
        call_id: &str,
        tool_name: &str,
        args: &serde_json::Value,
        err: &AgentError,
    ) {
        let ctx = HookContext::new(HookEvent::PostToolUseFailure)
            .with_tool(call_id, tool_name, args.clone())
            .with_metadata("error", serde_json::json!(err.message))
            .with_cancel(turn.cancel.clone());
        let _ = self.hooks.run_logged(&ctx).await;
    }

    pub(crate) async fn append_tool_result(
        &self,
        turn: &mut TurnState,
        call_id: &str,
        tool_name: &str,
        output: ToolResultOutput,
        emitter: Option<&ChunkSender>,
    ) {
        if let Some(emitter) = emitter {
            let _ = emitter.send(Ok(StreamChunk::ToolResult {
                tool_call_id: call_id.to_string(),
                tool_name: tool_name.to_string(),
                output: output.clone(),
            }));
        }
        turn.messages.push(Message::tool_results(vec![
            ContentPart::ToolResult {
                id: call_id.to_string(),
                name: tool_name.to_string(),
                output,
            },
        ]));
    }

    /// Persist the pending interrupt and return the interrupted result.
    ///
    /// Always saves, even on the very first turn for a thread: the resumable
    /// state must exist for `resume` to find.
    pub(crate) async fn suspend_turn(
        &self,
        turn: &mut TurnState,
        interrupt: Interrupt,
    ) -> Result<TurnResult> {
        info!(
            agent_id = %self.id,
            interrupt_id = %interrupt.id,
            tool_name = %interrupt.tool_name,
            "Turn interrupted"
        );

        if let (Some(thread_id), Some(_)) = (&turn.thread_id, &self.checkpointer) {
            let checkpoint = Checkpoint {
                thread_id: thread_id.clone(),
                step: 0,
                messages: turn.persistable_messages(),
                state: turn.state_snapshot(),
                pending_interrupt: Some(interrupt.clone()),
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            };
            self.save_with_retry(checkpoint).await?;
        }

        Ok(TurnResult::Interrupted {
            interrupt,
            forked_session_id: turn.forked_session_id.clone(),
        })
    }

    pub(crate) async fn finalize_complete(
        &self,
        turn: &mut TurnState,
        response: &GenerateResponse,
        emitter: Option<&ChunkSender>,
    ) -> Result<TurnResult> {
        if let (Some(thread_id), Some(_)) = (&turn.thread_id, &self.checkpointer) {
            let checkpoint = Checkpoint {
                thread_id: thread_id.clone(),
                step: 0,
                messages: turn.persistable_messages(),
                state: turn.state_snapshot(),
                pending_interrupt: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            };
            self.save_with_retry(checkpoint).await?;
        }

        if let Some(emitter) = emitter {
            let _ = emitter.send(Ok(StreamChunk::Finish {
                finish_reason: response.finish_reason,
                total_usage: turn.usage,
            }));
        }

        let post_ctx = HookContext::new(HookEvent::PostGenerate).with_cancel(turn.cancel.clone());
        let post_ctx = match &turn.thread_id {
            Some(thread_id) => post_ctx.with_thread_id(thread_id.clone()),
            None => post_ctx,
        };
        let _ = self.hooks.run_logged(&post_ctx).await;

        debug!(
            agent_id = %self.id,
            steps = turn.steps,
            input_tokens = turn.usage.input_tokens,
            output_tokens = turn.usage.output_tokens,
            "Turn complete"
        );

        Ok(TurnResult::Complete {
            text: response.text(),
            usage: turn.usage,
            finish_reason: response.finish_reason,
            steps: turn.steps,
            forked_session_id: turn.forked_session_id.clone(),
        })
    }

    /// Save a checkpoint, honoring hook-directed retries.
    ///
    /// We must not report a successful turn while losing state: if no hook
    /// opts into a retry (or retries are exhausted) the save error aborts the
    /// turn.
    async fn save_with_retry(&self, checkpoint: Checkpoint) -> Result<Checkpoint> {
        let Some(checkpointer) = &self.checkpointer else {
            return Err(AgentError::configuration("no checkpointer configured"));
        };

        let mut attempts = 0u32;
        loop {
            match checkpointer.save(checkpoint.clone()).await {
                Ok(saved) => return Ok(saved),
                Err(err) => {
                    let ctx = HookContext::new(HookEvent::PostGenerateFailure)
                        .with_thread_id(checkpoint.thread_id.clone())
                        .with_metadata("error", serde_json::json!(err.message))
                        .with_metadata("code", serde_json::json!(err.code.code()));
                    let outputs = self.hooks.run_logged(&ctx).await;
                    let retry = outputs.iter().find_map(|o| match o {
                        HookOutput::Retry { retry_delay_ms } => Some(*retry_delay_ms),
                        _ => None,
                    });

                    match retry {
                        Some(delay_ms) if attempts < self.max_retries => {
                            attempts += 1;
                            if delay_ms > 0 {
                                tokio::time::sleep(std::time::Duration::from_millis(delay_ms))
                                    .await;
                            }
                        }
                        _ => return Err(err),
                    }
                }
            }
        }
    }
}

/// Summariser backed by the agent's own driver.
struct DriverSummarizer {
    driver: Arc<dyn ModelDriver>,
}

#[async_trait]
impl Summarizer for DriverSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest::new(vec![Message::user(prompt)]);
        let response = self.driver.generate(request).await?;
        Ok(response.text())
    }
}

/// The unanswered tool calls of the last assistant message, in emission
/// order.
pub(crate) fn pending_tool_calls(
    messages: &[Message],
) -> Vec<(String, String, serde_json::Value)> {
    let answered: Vec<&str> = messages
        .iter()
        .flat_map(|m| match &m.content {
            tandem_protocol::MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::ToolResult { id, .. } => Some(id.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>(),
            tandem_protocol::MessageContent::Text(_) => Vec::new(),
        })
        .collect();

    let last_assistant = messages.iter().rev().find(|m| m.role == Role::Assistant);
    let Some(assistant) = last_assistant else {
        return Vec::new();
    };

    assistant
        .tool_calls()
        .into_iter()
        .filter_map(|part| match part {
            ContentPart::ToolCall { id, name, args } if !answered.contains(&id.as_str()) => {
                Some((id.clone(), name.clone(), args.clone()))
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
#[path = "agent.test.rs"]
mod tests;
