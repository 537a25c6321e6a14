//! Labels used when rendering prompts.

use llmgate_core::message::Role;

/// The words a composed prompt is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptLabels {
    pub system: &'static str,
    pub user: &'static str,
    pub assistant: &'static str,
    pub knowledge_header: &'static str,
    pub context_header: &'static str,
}

impl PromptLabels {
    pub const fn english() -> Self {
        Self {
            system: "system",
            user: "user",
            assistant: "assistant",
            knowledge_header: "Stored knowledge base",
            context_header: "Context",
        }
    }

    pub const fn japanese() -> Self {
        Self {
            system: "システム",
            user: "ユーザー",
            assistant: "アシスタント",
            knowledge_header: "保存された知識ベース",
            context_header: "コンテキスト情報",
        }
    }

    /// Labels for a configured locale. Unknown locales fall back to English.
    pub fn for_locale(locale: &str) -> Self {
        match locale {
            "ja" => Self::japanese(),
            _ => Self::english(),
        }
    }

    /// The label of a history role; `None` for roles that are not rendered.
    pub fn role(&self, role: Role) -> Option<&'static str> {
        match role {
            Role::System => Some(self.system),
            Role::User => Some(self.user),
            Role::Assistant => Some(self.assistant),
            Role::Unrecognized => None,
        }
    }
}

impl Default for PromptLabels {
    fn default() -> Self {
        Self::english()
    }
}
