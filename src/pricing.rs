//! Billing cost computation for completion results.

use std::collections::HashMap;

use crate::core::{ChatCompletion, LlmError};

/// The pricing collaborator: maps one completion result to its billing
/// cost in dollars.
///
/// Implementations must return a non-negative cost, or
/// [`LlmError::Pricing`] when the result lacks the metadata they need.
pub trait CompletionPricer: Send + Sync {
    fn price(&self, result: &ChatCompletion) -> Result<f64, LlmError>;
}

/// Per-model token rates, expressed in dollars per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

impl ModelPricing {
    pub fn per_mtok(input_per_mtok: f64, output_per_mtok: f64) -> Self {
        Self {
            input_per_mtok,
            output_per_mtok,
        }
    }
}

/// A [`CompletionPricer`] backed by a per-model rate table.
///
/// The model is taken from the result itself, so one table prices mixed
/// batches. Lookup is exact; register every model identifier the service
/// may echo back (including dated snapshot names).
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    rates: HashMap<String, ModelPricing>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>, pricing: ModelPricing) -> Self {
        self.rates.insert(model.into(), pricing);
        self
    }

    pub fn rates_for(&self, model: &str) -> Option<ModelPricing> {
        self.rates.get(model).copied()
    }
}

impl CompletionPricer for PriceTable {
    fn price(&self, result: &ChatCompletion) -> Result<f64, LlmError> {
        let model = result.model.as_deref().ok_or_else(|| LlmError::Pricing {
            message: "result carries no model identifier".to_string(),
        })?;

        let rates = self.rates_for(model).ok_or_else(|| LlmError::Pricing {
            message: format!("no rates registered for model '{model}'"),
        })?;

        let usage = result.usage.as_ref().ok_or_else(|| LlmError::Pricing {
            message: format!("result for model '{model}' carries no usage metadata"),
        })?;

        Ok(f64::from(usage.prompt_tokens) * rates.input_per_mtok / 1_000_000.0
            + f64::from(usage.completion_tokens) * rates.output_per_mtok / 1_000_000.0)
    }
}
