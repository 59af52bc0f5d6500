//! # llm-batch
//!
//! Concurrent batch dispatch for chat completion APIs: fan a list of
//! conversations out to one completion call each, sum the billing cost,
//! and pull the final text out of every result.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use llm_batch::{
//!     BatchClient, CompletionConfig, CompletionOptions, Message, ModelPricing, PriceTable,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BatchClient::new(CompletionConfig::from_env()?)?;
//!
//!     let batch = vec![
//!         vec![Message::user("What is 2+2?")],
//!         vec![Message::user("What is 3+3?")],
//!     ];
//!     let options = CompletionOptions::new().set("temperature", 0.0);
//!     let pricing =
//!         PriceTable::new().with_model("gpt-4o-mini", ModelPricing::per_mtok(0.15, 0.60));
//!
//!     let output = client
//!         .process(&batch, "gpt-4o-mini", &options, &pricing)
//!         .await?;
//!     println!("{:?} (${:.4})", output.responses, output.total_cost);
//!     Ok(())
//! }
//! ```
//!
//! Every call in a batch is issued immediately with no concurrency cap;
//! callers wanting a limit should chunk their batches before dispatching.

pub mod batch;
pub mod completions;
pub mod core;
pub mod pricing;
pub mod progress;

pub use crate::batch::{BatchClient, BatchOutput, extract_text, total_cost};
pub use crate::completions::{CompletionClient, CompletionConfig};
pub use crate::core::{
    error::LlmError,
    traits::ChatCompleter,
    types::{ChatCompletion, ChatRole, Choice, ChoiceMessage, CompletionOptions, Message, Usage},
};
pub use crate::pricing::{CompletionPricer, ModelPricing, PriceTable};
pub use crate::progress::{LogProgress, ProgressReporter};
