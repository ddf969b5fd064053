use std::sync::Arc;

use anyhow::{Result, anyhow};
use log::{debug, error, info};
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::generation::parameters::{KeepAlive, TimeUnit};
use ollama_rs::models::ModelOptions;
use openai::Credentials;
use openai::chat::{
    ChatCompletion, ChatCompletionMessage, ChatCompletionMessageRole,
    ChatCompletionResponseFormat,
};

mod plan;

pub use plan::{GeneratedExercise, GeneratedPlan, PromptBuilder, PromptContext, generate_workout_plan};

fn strip_code_fences(s: &str) -> &str {
    let mut trimmed = s.trim();
    if let Some(stripped) = trimmed.strip_prefix("```json") {
        trimmed = stripped;
    } else if let Some(stripped) = trimmed.strip_prefix("```") {
        trimmed = stripped;
    }
    if let Some(stripped) = trimmed.strip_suffix("```") {
        trimmed = stripped;
    }
    trimmed.trim()
}

type MockFn = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
const OLLAMA_DEFAULT_MODEL: &str = "llama3.2:3b";

enum LlmBackend {
    /// `api_key` of `None` falls back to the openai crate's env credentials
    /// at call time.
    OpenAi {
        model: String,
        api_key: Option<String>,
    },
    Ollama {
        model: String,
        client: ollama_rs::Ollama,
    },
    Mock {
        responder: MockFn,
    },
}

/// Chat-completion client used by the plan generator. One system prompt, one
/// user prompt, one text reply.
pub struct LlmInterface {
    backend: LlmBackend,
}

fn chat_message(role: ChatCompletionMessageRole, content: &str) -> ChatCompletionMessage {
    ChatCompletionMessage {
        role,
        content: Some(content.to_string()),
        name: None,
        function_call: None,
        tool_call_id: None,
        tool_calls: None,
    }
}

impl LlmInterface {
    pub fn new_openai(api_key: Option<String>, model: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string());
        info!("Plan LLM: openai model={} explicit_key={}", model, api_key.is_some());
        Self {
            backend: LlmBackend::OpenAi { model, api_key },
        }
    }

    pub fn new_ollama(model: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| OLLAMA_DEFAULT_MODEL.to_string());
        info!("Plan LLM: ollama model={}", model);
        Self {
            backend: LlmBackend::Ollama {
                model,
                client: ollama_rs::Ollama::default(),
            },
        }
    }

    pub fn new_mock_fn(f: impl Fn(&str, &str) -> String + Send + Sync + 'static) -> Self {
        Self {
            backend: LlmBackend::Mock {
                responder: Arc::new(f),
            },
        }
    }

    pub fn describe(&self) -> String {
        match &self.backend {
            LlmBackend::OpenAi { model, .. } => format!("openai({})", model),
            LlmBackend::Ollama { model, .. } => format!("ollama({})", model),
            LlmBackend::Mock { .. } => "mock".to_string(),
        }
    }

    /// Send one prompt pair and return the trimmed reply text.
    pub async fn call(&self, system: &str, user: &str) -> Result<String> {
        debug!(
            "LLM call backend={} system_len={} user_len={}",
            self.describe(),
            system.len(),
            user.len()
        );
        let reply = match &self.backend {
            LlmBackend::OpenAi { model, api_key } => {
                Self::call_openai(model, api_key.as_deref(), system, user).await?
            }
            LlmBackend::Ollama { model, client } => {
                Self::call_ollama(client, model, system, user).await?
            }
            LlmBackend::Mock { responder } => responder(system, user),
        };
        let reply = reply.trim().to_string();
        debug!("LLM reply length={}", reply.len());
        Ok(reply)
    }

    async fn call_openai(
        model: &str,
        api_key: Option<&str>,
        system: &str,
        user: &str,
    ) -> Result<String> {
        let credentials = match api_key {
            Some(key) => Credentials::new(key, ""),
            None => Credentials::from_env(),
        };
        let messages = vec![
            chat_message(ChatCompletionMessageRole::System, system),
            chat_message(ChatCompletionMessageRole::User, user),
        ];
        let completion = ChatCompletion::builder(model, messages)
            .response_format(ChatCompletionResponseFormat::json_object())
            .credentials(credentials)
            .create()
            .await
            .inspect_err(|e| error!("OpenAI chat completion failed: {}", e))?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("OpenAI returned no choices"))?;
        Ok(choice.message.content.unwrap_or_default())
    }

    async fn call_ollama(
        client: &ollama_rs::Ollama,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<String> {
        let request = GenerationRequest::new(model.to_string(), user.to_string())
            .system(system.to_string())
            .options(ModelOptions::default().temperature(0.3))
            .keep_alive(KeepAlive::Until {
                time: 30,
                unit: TimeUnit::Minutes,
            });
        let response = client
            .generate(request)
            .await
            .inspect_err(|e| error!("Ollama generate failed: {}", e))?;
        Ok(response.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  {}  "), "{}");
    }

    #[tokio::test]
    async fn mock_call_trims() {
        let llm = LlmInterface::new_mock_fn(|system, user| format!("  {}|{}\n", system, user));
        assert_eq!(llm.call("sys", "user").await.unwrap(), "sys|user");
        assert_eq!(llm.describe(), "mock");
    }

    #[test]
    fn backends_describe_default_models() {
        let openai = LlmInterface::new_openai(Some("sk-test".into()), None);
        assert_eq!(openai.describe(), "openai(gpt-4o-mini)");
        let ollama = LlmInterface::new_ollama(Some("qwen2.5:7b".into()));
        assert_eq!(ollama.describe(), "ollama(qwen2.5:7b)");
    }

    #[test]
    fn chat_messages_carry_role_and_text() {
        let msg = chat_message(ChatCompletionMessageRole::System, "be brief");
        assert_eq!(msg.content.as_deref(), Some("be brief"));
        assert!(msg.tool_calls.is_none());
    }
}
