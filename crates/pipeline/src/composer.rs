//! Prompt composition.
//!
//! A composed prompt is built from up to four sections, always in this order:
//!
//! 1. **System** text
//! 2. **Knowledge** block (stored entries, newest first)
//! 3. **Context** block
//! 4. **Conversation** history followed by the current turn
//!
//! Without history the prompt is passed through verbatim after the first
//! three sections. Empty strings and empty lists count as absent.
//!
//! [`render`] is pure: identical inputs always produce identical output.
//! [`PromptComposer`] only adds the knowledge store read.

use std::sync::Arc;

use llmgate_core::error::KnowledgeError;
use llmgate_core::knowledge::{KnowledgeEntry, KnowledgeStore};
use llmgate_core::message::GenerationRequest;
use tracing::debug;

use crate::labels::PromptLabels;

/// Render the prompt for `request` given the knowledge entries fetched for it.
pub fn render(
    request: &GenerationRequest,
    entries: &[KnowledgeEntry],
    labels: &PromptLabels,
) -> String {
    let mut out = String::new();

    if let Some(system) = non_empty(request.system.as_deref()) {
        out.push_str(&format!("{}: {system}\n", labels.system));
    }

    if request.use_knowledge && !entries.is_empty() {
        out.push_str(&format!("{}:\n", labels.knowledge_header));
        for entry in entries {
            out.push_str(&format!(
                "- [{}] {}: {}\n",
                entry.category, entry.title, entry.content
            ));
        }
        out.push('\n');
    }

    if let Some(context) = non_empty(request.context.as_deref()) {
        out.push_str(&format!("{}:\n{context}\n", labels.context_header));
    }

    match request.history() {
        Some(history) => {
            for message in history {
                if let Some(label) = labels.role(message.role) {
                    out.push_str(&format!("{label}: {}\n", message.content));
                }
            }
            out.push_str(&format!(
                "{}: {}\n{}:",
                labels.user, request.prompt, labels.assistant
            ));
        }
        None => out.push_str(&request.prompt),
    }

    out
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Builds prompts, reading the knowledge store when a request asks for it.
#[derive(Clone)]
pub struct PromptComposer {
    store: Arc<dyn KnowledgeStore>,
    labels: PromptLabels,
}

impl PromptComposer {
    pub fn new(store: Arc<dyn KnowledgeStore>, labels: PromptLabels) -> Self {
        Self { store, labels }
    }

    /// Compose the prompt for `request`.
    pub async fn compose(&self, request: &GenerationRequest) -> Result<String, KnowledgeError> {
        let entries = if request.use_knowledge {
            let category = non_empty(request.knowledge_category.as_deref());
            self.store.list(category).await?
        } else {
            Vec::new()
        };

        let prompt = render(request, &entries, &self.labels);
        debug!(
            knowledge_entries = entries.len(),
            history = request.history().map_or(0, <[_]>::len),
            prompt_len = prompt.len(),
            "Composed prompt"
        );
        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmgate_core::knowledge::NewKnowledge;
    use llmgate_core::message::{ChatMessage, Role};
    use llmgate_knowledge::InMemoryKnowledgeStore;

    fn entry(id: i64, category: &str, title: &str, content: &str) -> KnowledgeEntry {
        KnowledgeEntry {
            id,
            category: category.into(),
            title: title.into(),
            content: content.into(),
            created_at: Default::default(),
        }
    }

    fn english() -> PromptLabels {
        PromptLabels::english()
    }

    #[test]
    fn plain_prompt_passes_through() {
        let req = GenerationRequest::new("What is Rust?");
        assert_eq!(render(&req, &[], &english()), "What is Rust?");
    }

    #[test]
    fn all_sections_in_order() {
        let mut req = GenerationRequest::new("bye");
        req.system = Some("Be brief.".into());
        req.context = Some("It is Friday.".into());
        req.messages = Some(vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")]);
        let entries = vec![entry(2, "ops", "Deploy", "Fridays are frozen")];

        let prompt = render(&req, &entries, &english());
        assert_eq!(
            prompt,
            "system: Be brief.\n\
             Stored knowledge base:\n\
             - [ops] Deploy: Fridays are frozen\n\
             \n\
             Context:\n\
             It is Friday.\n\
             user: hi\n\
             assistant: hello\n\
             user: bye\n\
             assistant:"
        );
    }

    #[test]
    fn knowledge_is_skipped_when_disabled() {
        let mut req = GenerationRequest::new("q");
        req.use_knowledge = false;
        let entries = vec![entry(1, "c", "t", "x")];
        let prompt = render(&req, &entries, &english());
        assert!(!prompt.contains("Stored knowledge base"));
        assert_eq!(prompt, "q");
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let mut req = GenerationRequest::new("q");
        req.system = Some(String::new());
        req.context = Some(String::new());
        req.messages = Some(vec![]);
        assert_eq!(render(&req, &[], &english()), "q");
    }

    #[test]
    fn unrecognized_roles_are_dropped() {
        let mut req = GenerationRequest::new("next");
        req.messages = Some(vec![
            ChatMessage::new(Role::Unrecognized, "tool output"),
            ChatMessage::system("rules"),
        ]);
        assert_eq!(
            render(&req, &[], &english()),
            "system: rules\nuser: next\nassistant:"
        );
    }

    #[test]
    fn japanese_labels() {
        let mut req = GenerationRequest::new("こんにちは");
        req.context = Some("背景".into());
        req.messages = Some(vec![ChatMessage::user("やあ")]);
        let entries = [entry(1, "一般", "題", "内容")];
        let prompt = render(&req, &entries, &PromptLabels::japanese());
        assert_eq!(
            prompt,
            "保存された知識ベース:\n- [一般] 題: 内容\n\n\
             コンテキスト情報:\n背景\n\
             ユーザー: やあ\nユーザー: こんにちは\nアシスタント:"
        );
    }

    #[test]
    fn render_is_deterministic() {
        let mut req = GenerationRequest::new("q");
        req.system = Some("s".into());
        let entries = vec![entry(2, "a", "b", "c"), entry(1, "d", "e", "f")];
        assert_eq!(
            render(&req, &entries, &english()),
            render(&req, &entries, &english())
        );
    }

    #[tokio::test]
    async fn composer_reads_store_newest_first() {
        let store = Arc::new(InMemoryKnowledgeStore::new());
        store.save(NewKnowledge::new("lang", "Rust", "memory safe")).await.unwrap();
        store.save(NewKnowledge::new("lang", "Go", "garbage collected")).await.unwrap();
        let composer = PromptComposer::new(store, english());

        let prompt = composer.compose(&GenerationRequest::new("q")).await.unwrap();
        assert_eq!(
            prompt,
            "Stored knowledge base:\n\
             - [lang] Go: garbage collected\n\
             - [lang] Rust: memory safe\n\nq"
        );
    }

    #[tokio::test]
    async fn composer_filters_by_category() {
        let store = Arc::new(InMemoryKnowledgeStore::new());
        store.save(NewKnowledge::new("a", "in", "1")).await.unwrap();
        store.save(NewKnowledge::new("b", "out", "2")).await.unwrap();
        let composer = PromptComposer::new(store, english());

        let mut req = GenerationRequest::new("q");
        req.knowledge_category = Some("a".into());
        let prompt = composer.compose(&req).await.unwrap();
        assert!(prompt.contains("[a] in: 1"));
        assert!(!prompt.contains("out"));
    }

    #[tokio::test]
    async fn empty_store_matches_disabled_knowledge() {
        let composer = PromptComposer::new(Arc::new(InMemoryKnowledgeStore::new()), english());
        let mut req = GenerationRequest::new("q");
        req.system = Some("s".into());
        let with = composer.compose(&req).await.unwrap();
        req.use_knowledge = false;
        let without = composer.compose(&req).await.unwrap();
        assert_eq!(with, without);
    }
}
