//! LLM-backed reasoning backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::assignments::model::{WorkItem, Worker};
use crate::error::BackendError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::types::{ExtractedFeatures, MAX_KEYWORDS};
use crate::reasoning::{ConfidenceVerdict, ReasoningBackend, parse};

const REASONING_TEMPERATURE: f32 = 0.3;
const FEATURES_MAX_TOKENS: u32 = 512;
const CONFIDENCE_MAX_TOKENS: u32 = 256;

/// Prompts an [`LlmProvider`] and validates every reply against a schema.
pub struct LlmReasoner {
    llm: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl LlmReasoner {
    pub fn new(llm: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// One bounded completion. Transport errors and timeouts become `BackendError`s.
    async fn ask(&self, system: String, user: String, max_tokens: u32) -> Result<String, BackendError> {
        let request = CompletionRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user)])
            .with_temperature(REASONING_TEMPERATURE)
            .with_max_tokens(max_tokens);

        match tokio::time::timeout(self.timeout, self.llm.complete(request)).await {
            Ok(Ok(response)) => {
                tracing::debug!(
                    model = self.llm.model_name(),
                    input_tokens = response.input_tokens,
                    output_tokens = response.output_tokens,
                    "Reasoning completion received"
                );
                Ok(response.content)
            }
            Ok(Err(e)) => Err(BackendError::Request(e.to_string())),
            Err(_) => Err(BackendError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl ReasoningBackend for LlmReasoner {
    fn name(&self) -> &str {
        self.llm.model_name()
    }

    async fn extract_features(&self, task: &WorkItem) -> Result<ExtractedFeatures, BackendError> {
        let raw = self
            .ask(
                build_features_system_prompt(),
                build_features_user_prompt(task),
                FEATURES_MAX_TOKENS,
            )
            .await?;
        parse::parse_features(&raw)
    }

    async fn score_confidence(
        &self,
        task: &WorkItem,
        worker: &Worker,
    ) -> Result<ConfidenceVerdict, BackendError> {
        let raw = self
            .ask(
                build_confidence_system_prompt(),
                build_confidence_user_prompt(task, worker),
                CONFIDENCE_MAX_TOKENS,
            )
            .await?;
        parse::parse_confidence(&raw)
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_features_system_prompt() -> String {
    format!(
        "You analyze work items for a task assignment engine.\n\n\
         Read the task and respond with ONLY a JSON object:\n\
         {{\"keywords\": [\"...\"], \"skills\": [\"...\"], \"technical_tags\": [\"...\"], \"effort_level\": \"low|medium|high\"}}\n\n\
         Rules:\n\
         - At most {MAX_KEYWORDS} keywords, most important first\n\
         - Skills are capabilities a person needs (e.g. \"python\", \"api design\")\n\
         - Technical tags are named technologies or tools mentioned or implied\n\
         - Use lowercase for every entry"
    )
}

fn build_features_user_prompt(task: &WorkItem) -> String {
    let description: String = task.description.chars().take(2000).collect();
    format!("Title: {}\n\nDescription:\n{}", task.title, description)
}

fn build_confidence_system_prompt() -> String {
    "You evaluate how well a team member fits a task.\n\n\
     Weigh their role, skills, responsibilities and current workload.\n\
     Respond with ONLY a JSON object:\n\
     {\"confidence\": 0.0, \"reason\": \"...\"}\n\n\
     Rules:\n\
     - confidence is a number between 0.0 and 1.0\n\
     - reason is one short sentence\n\
     - A heavy workload (close to 1.0) should lower confidence"
        .to_string()
}

fn build_confidence_user_prompt(task: &WorkItem, worker: &Worker) -> String {
    let mut prompt = String::with_capacity(512);

    prompt.push_str(&format!("Task: {}\n", task.title));
    let description: String = task.description.chars().take(1000).collect();
    prompt.push_str(&format!("Description: {}\n\n", description));

    prompt.push_str(&format!("Candidate: {}\n", worker.name));
    prompt.push_str(&format!("Role: {}\n", worker.role));
    if !worker.skills.is_empty() {
        prompt.push_str(&format!("Skills: {}\n", worker.skills.join(", ")));
    }
    if !worker.responsibilities.is_empty() {
        prompt.push_str(&format!("Responsibilities: {}\n", worker.responsibilities));
    }
    prompt.push_str(&format!("Current workload: {:.2}", worker.workload_score));

    prompt
}
