//! The fixed catalog of selectable language models.

use serde::Serialize;

/// A model the user can pick in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Ollama model identifier, used for both embeddings and answers.
    pub id: &'static str,
    /// One-line description shown under the selector.
    pub description: &'static str,
}

/// Model selected when the page first loads.
pub const DEFAULT_MODEL: &str = "llama2";

/// Every model offered by the UI, in display order.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "llama2",
        description: "Best for general-purpose tasks and balanced performance",
    },
    ModelInfo {
        id: "mistral",
        description: "Excellent for technical and analytical content",
    },
    ModelInfo {
        id: "gemma",
        description: "Optimized for fast and efficient responses",
    },
];

/// Look up a catalog entry by identifier.
pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|model| model.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_in_catalog() {
        assert_eq!(find_model(DEFAULT_MODEL).map(|m| m.id), Some("llama2"));
        assert_eq!(MODELS.len(), 3);
    }

    #[test]
    fn unknown_models_are_not_found() {
        assert!(find_model("gpt-4").is_none());
        assert!(find_model("Mistral").is_none());
    }
}
