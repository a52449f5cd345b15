//! LLM provider resolution and the up-front credential check.
//!
//! A translation must fail on a missing API key before the PDF is even
//! opened, so the key is looked up here rather than on the first request.
//! Lookups go through a caller-supplied function; production code passes
//! [`env_lookup`], tests pass a map.

use crate::config::{TranslationConfig, DEFAULT_MODEL};
use crate::error::PdfTranslateError;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::{debug, info};

/// A provider `edgequake_llm` can build by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownProvider {
    pub name: &'static str,
    /// Environment variable holding the API key; `None` for local servers.
    pub key_var: Option<&'static str>,
    pub default_model: &'static str,
}

/// Providers in auto-detection order.
pub const KNOWN_PROVIDERS: &[KnownProvider] = &[
    KnownProvider {
        name: "openai",
        key_var: Some("OPENAI_API_KEY"),
        default_model: DEFAULT_MODEL,
    },
    KnownProvider {
        name: "anthropic",
        key_var: Some("ANTHROPIC_API_KEY"),
        default_model: "claude-3-5-haiku-latest",
    },
    KnownProvider {
        name: "gemini",
        key_var: Some("GEMINI_API_KEY"),
        default_model: "gemini-2.0-flash",
    },
    KnownProvider {
        name: "mistral",
        key_var: Some("MISTRAL_API_KEY"),
        default_model: "mistral-small-latest",
    },
    KnownProvider {
        name: "openrouter",
        key_var: Some("OPENROUTER_API_KEY"),
        default_model: "openai/gpt-4o-mini",
    },
    KnownProvider {
        name: "xai",
        key_var: Some("XAI_API_KEY"),
        default_model: "grok-2-latest",
    },
    KnownProvider {
        name: "azure",
        key_var: Some("AZURE_OPENAI_API_KEY"),
        default_model: DEFAULT_MODEL,
    },
    KnownProvider {
        name: "ollama",
        key_var: None,
        default_model: "llama3.2",
    },
    KnownProvider {
        name: "lmstudio",
        key_var: None,
        default_model: "local-model",
    },
];

pub fn known_provider(name: &str) -> Option<&'static KnownProvider> {
    KNOWN_PROVIDERS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Reads a non-empty environment variable.
pub fn env_lookup(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

/// Check that the credential for `provider` is present.
///
/// Providers without a key (local servers) and names this crate does not
/// know always pass; `edgequake_llm` reports their configuration errors.
pub fn require_credential(
    provider: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), PdfTranslateError> {
    let Some(var) = known_provider(provider).and_then(|p| p.key_var) else {
        return Ok(());
    };
    if lookup(var).is_some() {
        Ok(())
    } else {
        Err(PdfTranslateError::MissingCredential {
            provider: provider.to_string(),
            hint: format!("Set {var} in the environment."),
        })
    }
}

/// A provider/model pair chosen from configuration and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderChoice {
    pub provider: String,
    pub model: String,
}

/// Pick a provider and model without building anything.
///
/// Resolution order:
/// 1. `config.provider_name`, with `config.model` or that provider's default
/// 2. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 3. the first provider in [`KNOWN_PROVIDERS`] whose key is present
///
/// The credential of the chosen provider is checked in every case.
pub fn choose_provider(
    config: &TranslationConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ProviderChoice, PdfTranslateError> {
    let model_for = |name: &str| {
        config.model.clone().unwrap_or_else(|| {
            known_provider(name)
                .map(|p| p.default_model)
                .unwrap_or(DEFAULT_MODEL)
                .to_string()
        })
    };

    let choice = if let Some(ref name) = config.provider_name {
        ProviderChoice {
            provider: name.clone(),
            model: model_for(name),
        }
    } else if let (Some(provider), Some(model)) = (
        lookup("EDGEQUAKE_LLM_PROVIDER"),
        lookup("EDGEQUAKE_MODEL"),
    ) {
        ProviderChoice {
            model: config.model.clone().unwrap_or(model),
            provider,
        }
    } else {
        let detected = KNOWN_PROVIDERS
            .iter()
            .find(|p| p.key_var.is_some_and(|var| lookup(var).is_some()))
            .ok_or_else(|| PdfTranslateError::MissingCredential {
                provider: "auto".to_string(),
                hint: "No LLM credential found. Set OPENAI_API_KEY (or ANTHROPIC_API_KEY, \
GEMINI_API_KEY, MISTRAL_API_KEY, ...), or pass --provider ollama for a local model."
                    .to_string(),
            })?;
        ProviderChoice {
            provider: detected.name.to_string(),
            model: model_for(detected.name),
        }
    };

    require_credential(&choice.provider, &lookup)?;
    debug!("Provider choice: {}/{}", choice.provider, choice.model);
    Ok(choice)
}

/// Resolve the provider for `config`, from most to least specific.
///
/// A pre-built `config.provider` is used as-is. Otherwise a provider is
/// chosen with [`choose_provider`] and built through
/// [`ProviderFactory::create_llm_provider`].
pub fn resolve_provider(config: &TranslationConfig) -> Result<Arc<dyn LLMProvider>, PdfTranslateError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let choice = choose_provider(config, env_lookup)?;
    info!("Using provider {} with model {}", choice.provider, choice.model);
    ProviderFactory::create_llm_provider(&choice.provider, &choice.model).map_err(|e| {
        PdfTranslateError::MissingCredential {
            provider: choice.provider.clone(),
            hint: e.to_string(),
        }
    })
}
