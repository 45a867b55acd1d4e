use eyre::{Result, eyre};

use crate::config::ProviderKind;

/// A selectable model: the Hub id sent with requests and a display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub id: &'static str,
    pub name: &'static str,
}

pub const LIVE_MODELS: &[ModelDescriptor] = &[
    ModelDescriptor { id: "meta-llama/Llama-3.2-1B-Instruct", name: "LlamaFin-1B" },
    ModelDescriptor { id: "meta-llama/Llama-3.2-3B-Instruct", name: "LlamaFin-3B" },
    ModelDescriptor { id: "meta-llama/Llama-3.1-70B", name: "LlamaFin-70B" },
];

pub const SIMULATED_MODELS: &[ModelDescriptor] = &[
    ModelDescriptor { id: "financial-bert", name: "Financial BERT" },
    ModelDescriptor { id: "finbert", name: "FinBERT" },
    ModelDescriptor { id: "fin-gpt", name: "FinGPT" },
];

pub fn catalog(kind: ProviderKind) -> &'static [ModelDescriptor] {
    match kind {
        ProviderKind::Live => LIVE_MODELS,
        ProviderKind::Simulated => SIMULATED_MODELS,
    }
}

/// Holds the active catalog and which entry is selected.
///
/// Changing the selection never touches conversation history; it only
/// changes the id sent with the next request.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    models: &'static [ModelDescriptor],
    selected: usize,
}

impl ModelSelector {
    pub fn new(models: &'static [ModelDescriptor]) -> Self {
        Self { models, selected: 0 }
    }

    pub fn for_provider(kind: ProviderKind, preferred: Option<&str>) -> Result<Self> {
        let mut selector = Self::new(catalog(kind));
        if let Some(query) = preferred {
            selector.select(query)?;
        }
        Ok(selector)
    }

    pub fn models(&self) -> &'static [ModelDescriptor] {
        self.models
    }

    pub fn selected(&self) -> &ModelDescriptor {
        &self.models[self.selected]
    }

    /// Select by id or display name, ignoring case. On an unknown name the
    /// current selection is kept.
    pub fn select(&mut self, query: &str) -> Result<&ModelDescriptor> {
        let query = query.trim();
        let index = self
            .models
            .iter()
            .position(|m| m.id.eq_ignore_ascii_case(query) || m.name.eq_ignore_ascii_case(query))
            .ok_or_else(|| {
                let choices = self.models.iter().map(|m| m.id).collect::<Vec<_>>().join(", ");
                eyre!("Unknown model '{}'. Available models: {}", query, choices)
            })?;

        self.selected = index;
        Ok(self.selected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_entry_is_the_default() {
        let selector = ModelSelector::for_provider(ProviderKind::Live, None).unwrap();
        assert_eq!(selector.selected().id, "meta-llama/Llama-3.2-1B-Instruct");

        let selector = ModelSelector::for_provider(ProviderKind::Simulated, None).unwrap();
        assert_eq!(selector.selected().id, "financial-bert");
    }

    #[test]
    fn selects_by_id_or_name() {
        let mut selector = ModelSelector::new(LIVE_MODELS);
        assert_eq!(selector.select("llamafin-3b").unwrap().id, "meta-llama/Llama-3.2-3B-Instruct");
        assert_eq!(selector.select("meta-llama/Llama-3.1-70B").unwrap().name, "LlamaFin-70B");
    }

    #[test]
    fn unknown_model_keeps_selection() {
        let mut selector = ModelSelector::new(SIMULATED_MODELS);
        selector.select("finbert").unwrap();

        let err = selector.select("gpt-4").unwrap_err();
        assert!(err.to_string().contains("financial-bert, finbert, fin-gpt"));
        assert_eq!(selector.selected().id, "finbert");
    }

    #[test]
    fn preferred_model_must_exist_in_catalog() {
        assert!(ModelSelector::for_provider(ProviderKind::Live, Some("finbert")).is_err());
    }
}
