//! services/api/src/adapters/plan_llm.rs
//!
//! This module contains the adapter for the study-plan LLM.
//! It implements the `PlanGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    error::OpenAIError,
    Client,
};
use async_trait::async_trait;
use study_tracker_core::{
    domain::{round_hours, Module},
    ports::{PlanGenerationService, PortError, PortResult},
};

/// Fixed instruction block appended after the per-module progress summary.
const PLAN_INSTRUCTIONS: &str = r#"
You are an intelligent study-plan generator.
Based on the input above, create a detailed, realistic study plan for the next 2 weeks.

**Goal:**
Create a plan that distributes the preparation optimally across the upcoming exams.
For every day, state:
- the date
- the modules to study
- the recommended study time in hours per module
- optionally short learning goals or focus topics

**Output requirements:**
- Time frame: the next 14 days (starting today or from a given start date)
- Output in a clear tabular or list format
- Keep the time distribution realistic (no 10-hour stretches)
- Allow for rest days or shorter study blocks on weekends

**Answer format:**
Day (date):
- Module: X hours - topic/focus: ...
"#;

/// Composes the natural-language prompt sent to the text-generation service:
/// one progress line per module, followed by the fixed instruction block.
pub fn build_study_prompt(modules: &[Module]) -> String {
    let mut prompt = String::from("I am studying for the following modules:\n\n");

    for module in modules {
        let actual = round_hours(module.actual_hours);
        let remaining = round_hours(module.remaining_hours());
        let exam_info = match module.exam_date {
            Some(date) => format!(" (exam on {})", date.format("%d.%m.%Y")),
            None => String::new(),
        };
        prompt.push_str(&format!(
            "- {}: target {}h, already studied {}h, {}h remaining{}\n",
            module.name, module.target_hours, actual, remaining, exam_info
        ));
    }

    prompt.push_str(PLAN_INSTRUCTIONS);
    prompt
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `PlanGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiPlanAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiPlanAdapter {
    /// Creates a new `OpenAiPlanAdapter`. Generation parameters come from the
    /// process configuration, never from user input.
    pub fn new(client: Client<OpenAIConfig>, model: String, temperature: f32, max_tokens: u32) -> Self {
        Self {
            client,
            model,
            temperature,
            max_tokens,
        }
    }
}

//=========================================================================================
// `PlanGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PlanGenerationService for OpenAiPlanAdapter {
    async fn generate_plan(&self, prompt: &str) -> PortResult<String> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(PortError::Unexpected(
                "No response received from the text-generation service".to_string(),
            ));
        }

        Ok(text)
    }
}
