use crate::prompt::build_transform_prompt;
use crate::validate::{parse_model_array, reconcile};
use std::sync::Arc;
use swatch_common::{Result, SwatchError};
use swatch_llm::{AnthropicClient, LLMConfig, LLMProvider};
use swatch_tokens::{IdGenerator, TimestampIds, TokenSet};
use tracing::{debug, info, warn};

const LABEL_LIMIT: usize = 40;

/// Restyles a token set from a natural-language direction.
pub struct TokenTransformer {
    llm: Arc<dyn LLMProvider>,
    ids: Arc<dyn IdGenerator>,
}

impl TokenTransformer {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self::with_ids(llm, Arc::new(TimestampIds::new()))
    }

    pub fn with_ids(llm: Arc<dyn LLMProvider>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { llm, ids }
    }

    /// One model round trip. The returned set always carries exactly the
    /// base's names in the base's order.
    pub async fn transform(
        &self,
        base: &TokenSet,
        direction: &str,
        brand_context: Option<&str>,
    ) -> Result<TokenSet> {
        info!("Transforming {} tokens toward \"{}\"", base.len(), direction);

        let prompt = build_transform_prompt(base, direction, brand_context)?;
        let response = self
            .llm
            .generate(&prompt)
            .await
            .map_err(|e| SwatchError::Llm(format!("{:#}", e)))?;

        let items = parse_model_array(&response.content)?;
        let reconciled = reconcile(base, &items);

        if !reconciled.rejected.is_empty() {
            warn!(
                "Dropped {} model items: {}",
                reconciled.rejected.len(),
                reconciled.rejected.join("; ")
            );
        }
        if !reconciled.backfilled.is_empty() {
            debug!("Backfilled {} tokens from base", reconciled.backfilled.len());
        }

        Ok(TokenSet::derived(
            base,
            self.ids.next_id("tokens-ai"),
            truncate_label(direction),
            direction,
            reconciled.tokens,
        ))
    }
}

fn truncate_label(direction: &str) -> String {
    if direction.chars().count() > LABEL_LIMIT {
        let head: String = direction.chars().take(LABEL_LIMIT).collect();
        format!("{}...", head)
    } else {
        direction.to_string()
    }
}

/// Transform with a fresh Anthropic client built from `credential`.
pub async fn transform_tokens(
    credential: &str,
    base: &TokenSet,
    direction: &str,
    brand_context: Option<&str>,
) -> Result<TokenSet> {
    if credential.trim().is_empty() {
        return Err(SwatchError::Config(
            "ANTHROPIC_API_KEY is not configured; set ANTHROPIC_API_KEY or pass a key".to_string(),
        ));
    }

    let client = AnthropicClient::new(LLMConfig {
        api_key: credential.to_string(),
        ..Default::default()
    })
    .map_err(|e| SwatchError::Llm(format!("{:#}", e)))?;

    TokenTransformer::new(Arc::new(client))
        .transform(base, direction, brand_context)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use swatch_llm::{LLMResponse, Message};
    use swatch_tokens::{SequentialIds, Token, TokenCategory, TokenSource};

    struct MockLLM {
        reply: std::result::Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockLLM {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LLMProvider for MockLLM {
        async fn generate(&self, prompt: &str) -> anyhow::Result<LLMResponse> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(LLMResponse {
                    content: text.clone(),
                    finish_reason: Some("end_turn".into()),
                    usage: None,
                }),
                Err(message) => Err(anyhow::anyhow!(message.clone())),
            }
        }

        async fn generate_with_context(&self, messages: Vec<Message>) -> anyhow::Result<LLMResponse> {
            let joined: Vec<_> = messages.into_iter().map(|m| m.content).collect();
            self.generate(&joined.join("\n")).await
        }
    }

    fn base() -> TokenSet {
        TokenSet::extracted(
            "extracted-1",
            "primer.style (extracted)",
            vec![
                Token::new("--color-canvas-default", "#ffffff"),
                Token::new("--color-fg-default", "#1f2328"),
                Token::new("--radius-2", "6px"),
            ],
        )
    }

    fn transformer(llm: Arc<MockLLM>) -> TokenTransformer {
        TokenTransformer::with_ids(llm, Arc::new(SequentialIds::new()))
    }

    #[tokio::test]
    async fn test_transform_repairs_partial_response() {
        let reply = r##"```json
[
  {"name": "--radius-2", "value": "16px", "category": "radius"},
  {"name": "--color-canvas-default", "value": "#0d1117", "category": "color"},
  {"name": "--color-fg-default", "value": 42}
]
```"##;
        let llm = MockLLM::replying(reply);
        let result = transformer(llm.clone())
            .transform(&base(), "Dark mode", None)
            .await
            .unwrap();

        let pairs: Vec<_> = result
            .tokens
            .iter()
            .map(|t| (t.name.as_str(), t.value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            [
                ("--color-canvas-default", "#0d1117"),
                ("--color-fg-default", "#1f2328"),
                ("--radius-2", "16px"),
            ]
        );
        assert_eq!(result.id, "tokens-ai-1");
        assert_eq!(result.label, "Dark mode");
        assert_eq!(result.direction.as_deref(), Some("Dark mode"));
        assert_eq!(result.parent_id.as_deref(), Some("extracted-1"));
        assert_eq!(result.source, TokenSource::Generated);
        assert_eq!(result.tokens[2].category, TokenCategory::Radius);

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("--radius-2"));
    }

    #[tokio::test]
    async fn test_transform_truncates_long_labels() {
        let direction = "Muted earth tones with generous rounding and soft shadows";
        let result = transformer(MockLLM::replying("[]"))
            .transform(&base(), direction, Some("Outdoor brand"))
            .await
            .unwrap();

        assert_eq!(result.label, "Muted earth tones with generous rounding...");
        assert_eq!(result.direction.as_deref(), Some(direction));
        // empty array backfills everything
        assert_eq!(result.tokens, base().tokens);
    }

    #[tokio::test]
    async fn test_transform_rejects_unparseable_reply() {
        let err = transformer(MockLLM::replying("Sorry, I can't help with that."))
            .transform(&base(), "Dark", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SwatchError::ModelResponse(ref m) if m.contains("Sorry, I can't")));

        let err = transformer(MockLLM::replying(r#"{"tokens": []}"#))
            .transform(&base(), "Dark", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SwatchError::ModelResponse(_)));
    }

    #[tokio::test]
    async fn test_transform_surfaces_provider_errors() {
        let err = transformer(MockLLM::failing("Anthropic API error (401): invalid x-api-key"))
            .transform(&base(), "Dark", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SwatchError::Llm(ref m) if m.contains("invalid x-api-key")));
    }

    #[tokio::test]
    async fn test_transform_tokens_requires_credential() {
        let err = transform_tokens("  ", &base(), "Dark", None).await.unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("set ANTHROPIC_API_KEY or pass a key"));
    }

    #[test]
    fn test_truncate_label_boundary() {
        let exact = "a".repeat(40);
        assert_eq!(truncate_label(&exact), exact);
        assert_eq!(truncate_label(&"a".repeat(41)), format!("{}...", exact));
    }
}
