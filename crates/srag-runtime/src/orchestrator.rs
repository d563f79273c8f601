//! Bounded orchestration loop
//!
//! The orchestrator implements the agent loop:
//! 1. Call the LLM with the conversation history and the tool definitions
//! 2. Check the stop reason
//! 3. If tool use was requested, dispatch the tools and loop back
//! 4. If completed, return the final response
//!
//! The loop is bounded by an iteration ceiling; crossing it is an error,
//! not a silent truncation. Every model response and both task boundaries
//! are written to the audit log.

use crate::prompt::{REPORT_TASK, SYSTEM_PROMPT};
use serde_json::json;
use srag_core::{AuditEntry, AuditLog, Error, Result};
use srag_llm::{CompletionRequest, ContentBlock, LLMProvider, Message, StopReason};
use srag_tools::ToolRegistry;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Max tokens per completion
const MAX_TOKENS: usize = 4096;

/// Low temperature: the agent narrates data, it does not ideate
const TEMPERATURE: f32 = 0.1;

/// Characters of model output kept in audit previews
const AUDIT_PREVIEW_CHARS: usize = 200;

/// Outcome of one task execution
///
/// Always returned, even on failure: the audit trail of a failed run is
/// exactly as interesting as that of a successful one.
#[derive(Debug)]
pub struct TaskOutcome {
    /// Whether the task ran to completion
    pub success: bool,

    /// Final agent response (empty on failure)
    pub response: String,

    /// Error description when `success` is false
    pub error: Option<String>,

    /// Audit entries recorded during this task, in order
    pub audit: Vec<AuditEntry>,
}

/// Configuration for the orchestration loop
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Model identifier sent to the provider
    pub model: String,

    /// Hard ceiling on loop round trips
    pub max_iterations: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.1-8b-instant".to_string(),
            max_iterations: 15,
        }
    }
}

/// Drives the LLM → tool dispatch → LLM loop for one agent
pub struct Orchestrator {
    provider: Arc<dyn LLMProvider>,
    registry: Arc<ToolRegistry>,
    config: OrchestratorConfig,
    audit: AuditLog,
}

impl Orchestrator {
    /// Create a new orchestrator
    ///
    /// The audit log is shared: the store accessor behind the tools writes
    /// its query records into the same log, so a task outcome carries the
    /// full interleaved trail.
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        registry: Arc<ToolRegistry>,
        config: OrchestratorConfig,
        audit: AuditLog,
    ) -> Self {
        Self {
            provider,
            registry,
            config,
            audit,
        }
    }

    /// Run the standard full-report task
    pub async fn generate_full_report(&self) -> TaskOutcome {
        self.run(REPORT_TASK).await
    }

    /// Execute one task to completion
    pub async fn run(&self, task: &str) -> TaskOutcome {
        // Entries recorded before this task belong to earlier runs
        let audit_start = self.audit.len();

        self.audit
            .record("inicio_execucao", json!({ "tarefa": preview(task) }));

        let result = self.run_loop(task).await;
        let outcome = match result {
            Ok(response) => {
                self.audit
                    .record("fim_execucao", json!({ "status": "sucesso" }));
                TaskOutcome {
                    success: true,
                    response,
                    error: None,
                    audit: Vec::new(),
                }
            }
            Err(err) => {
                let message = err.to_string();
                self.audit
                    .record("erro_execucao", json!({ "erro": message }));
                TaskOutcome {
                    success: false,
                    response: String::new(),
                    error: Some(message),
                    audit: Vec::new(),
                }
            }
        };

        TaskOutcome {
            audit: self.audit.snapshot().split_off(audit_start),
            ..outcome
        }
    }

    async fn run_loop(&self, task: &str) -> Result<String> {
        let mut conversation = vec![Message::user(task)];
        let mut iteration = 0;

        loop {
            iteration += 1;
            if iteration > self.config.max_iterations {
                warn!(
                    max_iterations = self.config.max_iterations,
                    "Limite de iterações atingido"
                );
                return Err(Error::IterationLimitExceeded(self.config.max_iterations));
            }

            info!(
                iteration = iteration,
                max_iterations = self.config.max_iterations,
                "Iteração do agente iniciada"
            );

            let tools = self.registry.definitions();
            debug!(tool_count = tools.len(), "Ferramentas disponíveis");

            let mut request_builder = CompletionRequest::builder(&self.config.model)
                .messages(conversation.clone())
                .system(SYSTEM_PROMPT)
                .max_tokens(MAX_TOKENS)
                .temperature(TEMPERATURE);
            if !tools.is_empty() {
                request_builder = request_builder.tools(tools);
            }

            let response = self
                .provider
                .complete(request_builder.build())
                .await
                .map_err(|e| Error::ProcessingFailed(e.to_string()))?;

            info!(
                stop_reason = ?response.stop_reason,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "Resposta do modelo recebida"
            );

            self.audit_response(&response.message, response.stop_reason);
            conversation.push(response.message.clone());

            match response.stop_reason {
                StopReason::EndTurn => {
                    let text = response
                        .message
                        .text()
                        .unwrap_or("Sem resposta")
                        .to_string();
                    info!(iteration = iteration, "Agente concluiu a tarefa");
                    return Ok(text);
                }

                StopReason::ToolUse => {
                    let results = self.dispatch_tools(&response.message).await;
                    if results.is_empty() {
                        warn!("Stop reason tool_use sem chamadas de ferramenta");
                        return Err(Error::ProcessingFailed(
                            "o modelo sinalizou uso de ferramenta sem chamar nenhuma".to_string(),
                        ));
                    }
                    conversation.extend(results);
                }

                StopReason::MaxTokens => {
                    warn!("Resposta truncada pelo limite de tokens");
                    return Err(Error::ProcessingFailed(
                        "resposta truncada pelo limite de tokens".to_string(),
                    ));
                }
            }
        }
    }

    /// Record the model's response in the audit log
    fn audit_response(&self, message: &Message, stop_reason: StopReason) {
        let tipo = if stop_reason == StopReason::ToolUse {
            "tool_call"
        } else {
            "resposta_final"
        };
        let tool_names: Vec<&str> = message
            .tool_uses()
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();

        self.audit.record(
            "resposta_agente",
            json!({
                "tipo": tipo,
                "ferramentas": tool_names,
                "conteudo": preview(message.text().unwrap_or("")),
            }),
        );
    }

    /// Dispatch the tool calls in an assistant message, in order
    ///
    /// An unknown tool name becomes an error tool result fed back to the
    /// model; the loop keeps running so the model can recover.
    async fn dispatch_tools(&self, message: &Message) -> Vec<Message> {
        let mut results = Vec::new();

        for block in message.tool_uses() {
            let ContentBlock::ToolUse { id, name, input } = block else {
                continue;
            };

            info!(tool_name = %name, tool_id = %id, "Executando ferramenta");

            let Some(tool) = self.registry.get(name) else {
                warn!(tool_name = %name, "Ferramenta desconhecida");
                results.push(Message::tool_error(
                    id.clone(),
                    format!("Ferramenta desconhecida: {name}"),
                ));
                continue;
            };

            match tool.execute(input.clone()).await {
                Ok(value) => {
                    let text = value
                        .as_str()
                        .map_or_else(|| value.to_string(), ToString::to_string);
                    debug!(
                        tool_name = %name,
                        result_preview = %preview(&text),
                        "Ferramenta executada"
                    );
                    results.push(Message::tool_result(id.clone(), text));
                }
                Err(err) => {
                    warn!(tool_name = %name, error = %err, "Falha na ferramenta");
                    results.push(Message::tool_error(id.clone(), format!("Erro: {err}")));
                }
            }
        }

        results
    }
}

fn preview(text: &str) -> String {
    text.chars().take(AUDIT_PREVIEW_CHARS).collect()
}
