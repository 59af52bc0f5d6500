//! Concurrent batch dispatch, cost aggregation, and text extraction.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future;
use tracing::warn;

use crate::completions::{CompletionClient, CompletionConfig};
use crate::core::{ChatCompleter, ChatCompletion, CompletionOptions, LlmError, Message};
use crate::pricing::CompletionPricer;
use crate::progress::ProgressReporter;

/// Everything [`BatchClient::process`] produces for one batch: extracted
/// texts, the raw results, and the summed billing cost.
#[derive(Debug)]
pub struct BatchOutput {
    /// Final text content per batch entry, index-aligned with the input.
    /// All-empty when extraction failed for the batch; see [`extract_text`].
    pub responses: Vec<String>,
    pub results: Vec<ChatCompletion>,
    pub total_cost: f64,
}

/// Fans batches of conversations out to concurrent completion calls.
///
/// The completer is constructed by the caller and owned by the client;
/// dispatched calls share nothing with each other beyond it.
pub struct BatchClient<C: ChatCompleter> {
    completer: C,
    progress: Option<Arc<dyn ProgressReporter>>,
}

impl BatchClient<CompletionClient> {
    /// Create a batch client backed by an OpenAI-compatible endpoint.
    pub fn new(config: CompletionConfig) -> Result<Self, LlmError> {
        Ok(Self::with_completer(CompletionClient::new(config)?))
    }
}

impl<C: ChatCompleter> BatchClient<C> {
    /// Create a batch client over any [`ChatCompleter`] implementation.
    pub fn with_completer(completer: C) -> Self {
        Self {
            completer,
            progress: None,
        }
    }

    /// Report completion counts to `reporter` while dispatching.
    ///
    /// The reporter only observes; it never alters the ordering or values
    /// of returned results.
    pub fn progress(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress = Some(reporter);
        self
    }

    /// Issue one concurrent completion call per entry of `batch` and wait
    /// for all of them.
    ///
    /// All calls are initiated immediately with no concurrency cap, and the
    /// returned results are index-aligned with `batch` regardless of the
    /// order in which calls finish. The first individual failure aborts the
    /// whole dispatch with [`LlmError::Completion`] naming the failing
    /// entry; there are no partial results and no retries.
    pub async fn dispatch(
        &self,
        batch: &[Vec<Message>],
        model: &str,
        options: &CompletionOptions,
    ) -> Result<Vec<ChatCompletion>, LlmError> {
        if model.is_empty() {
            return Err(LlmError::Configuration(
                "Model identifier must not be empty".to_string(),
            ));
        }
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let total = batch.len();
        let progress = self.progress.as_deref();
        if let Some(reporter) = progress {
            reporter.begin(total);
        }

        let completed = AtomicUsize::new(0);
        let completed = &completed;

        let calls = batch.iter().enumerate().map(|(index, messages)| async move {
            let result = self
                .completer
                .complete(model, messages, options)
                .await
                .map_err(|source| LlmError::Completion {
                    index,
                    source: Box::new(source),
                })?;

            if let Some(reporter) = progress {
                // Calls finish in arbitrary order; the counter keeps the
                // reported counts monotonic.
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                reporter.task_completed(done, total);
            }

            Ok::<_, LlmError>(result)
        });

        let results = future::try_join_all(calls).await?;

        if let Some(reporter) = progress {
            reporter.finish();
        }

        Ok(results)
    }

    /// Dispatch `batch`, sum the cost of the results, and extract their
    /// final text content.
    ///
    /// Dispatch and pricing failures propagate; extraction failures degrade
    /// to empty strings as documented on [`extract_text`].
    pub async fn process(
        &self,
        batch: &[Vec<Message>],
        model: &str,
        options: &CompletionOptions,
        pricer: &dyn CompletionPricer,
    ) -> Result<BatchOutput, LlmError> {
        let results = self.dispatch(batch, model, options).await?;
        let total_cost = total_cost(&results, pricer)?;
        let responses = extract_text(&results, batch.len());

        Ok(BatchOutput {
            responses,
            results,
            total_cost,
        })
    }
}

/// Sum the billing cost of every result in a batch.
///
/// An empty batch costs `0.0`. Fails with [`LlmError::Pricing`] as soon as
/// any single result cannot be priced.
pub fn total_cost(
    results: &[ChatCompletion],
    pricer: &dyn CompletionPricer,
) -> Result<f64, LlmError> {
    let mut total = 0.0;
    for result in results {
        total += pricer.price(result)?;
    }
    Ok(total)
}

/// Pull the final text content (the last choice's message) out of each
/// result.
///
/// If extraction fails for *any* entry the whole batch degrades: a warning
/// carrying the triggering error is logged and `expected_count` empty
/// strings are returned, with no partial extraction. Callers that need to
/// distinguish "truly empty" from "extraction failed" must inspect the raw
/// results.
pub fn extract_text(results: &[ChatCompletion], expected_count: usize) -> Vec<String> {
    match try_extract_text(results) {
        Ok(texts) => texts,
        Err(err) => {
            warn!(error = %err, "Failed to extract batch responses, returning empty strings");
            vec![String::new(); expected_count]
        }
    }
}

fn try_extract_text(results: &[ChatCompletion]) -> Result<Vec<String>, LlmError> {
    results
        .iter()
        .enumerate()
        .map(|(index, result)| {
            let choice = result.choices.last().ok_or_else(|| {
                LlmError::Extraction(format!("result {index} has no choices"))
            })?;
            choice.message.content.clone().ok_or_else(|| {
                LlmError::Extraction(format!("result {index} has no message content"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::core::{Choice, ChoiceMessage, Usage};

    fn completion(content: &str) -> ChatCompletion {
        ChatCompletion {
            id: Some("cmpl-test".to_string()),
            model: Some("test-model".to_string()),
            choices: vec![Choice {
                index: Some(0),
                message: ChoiceMessage {
                    role: "assistant".to_string(),
                    content: Some(content.to_string()),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        }
    }

    /// Echoes each payload's content back, sleeping so that later entries
    /// finish before earlier ones.
    struct StaggeredCompleter {
        batch_size: u64,
    }

    #[async_trait]
    impl ChatCompleter for StaggeredCompleter {
        async fn complete(
            &self,
            _model: &str,
            messages: &[Message],
            _options: &CompletionOptions,
        ) -> Result<ChatCompletion, LlmError> {
            let index: u64 = messages[0].content.parse().unwrap();
            tokio::time::sleep(Duration::from_millis((self.batch_size - index) * 10)).await;
            Ok(completion(&messages[0].content))
        }
    }

    /// Fails for one payload, succeeds for the rest.
    struct FailingCompleter {
        fail_on: String,
    }

    #[async_trait]
    impl ChatCompleter for FailingCompleter {
        async fn complete(
            &self,
            _model: &str,
            messages: &[Message],
            _options: &CompletionOptions,
        ) -> Result<ChatCompletion, LlmError> {
            if messages[0].content == self.fail_on {
                return Err(LlmError::Api {
                    message: "boom".to_string(),
                    status_code: Some(500),
                });
            }
            Ok(completion(&messages[0].content))
        }
    }

    struct FlatPricer(f64);

    impl CompletionPricer for FlatPricer {
        fn price(&self, _result: &ChatCompletion) -> Result<f64, LlmError> {
            Ok(self.0)
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        begun: Mutex<Vec<usize>>,
        completions: Mutex<Vec<(usize, usize)>>,
        finished: AtomicUsize,
    }

    impl ProgressReporter for RecordingReporter {
        fn begin(&self, total: usize) {
            self.begun.lock().unwrap().push(total);
        }

        fn task_completed(&self, completed: usize, total: usize) {
            self.completions.lock().unwrap().push((completed, total));
        }

        fn finish(&self) {
            self.finished.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn indexed_batch(size: usize) -> Vec<Vec<Message>> {
        (0..size).map(|i| vec![Message::user(i.to_string())]).collect()
    }

    #[tokio::test]
    async fn dispatch_preserves_input_order_under_reversed_completion() {
        let client = BatchClient::with_completer(StaggeredCompleter { batch_size: 5 });
        let results = client
            .dispatch(&indexed_batch(5), "test-model", &CompletionOptions::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 5);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(
                results[i].choices[0].message.content.as_deref(),
                Some(i.to_string().as_str()),
                "result {i} out of place: {result:?}"
            );
        }
    }

    #[tokio::test]
    async fn dispatch_of_empty_batch_returns_empty_result() {
        let client = BatchClient::with_completer(FailingCompleter {
            fail_on: "unused".to_string(),
        });
        let results = client
            .dispatch(&[], "test-model", &CompletionOptions::new())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn dispatch_rejects_empty_model() {
        let client = BatchClient::with_completer(FailingCompleter {
            fail_on: "unused".to_string(),
        });
        let error = client
            .dispatch(&indexed_batch(1), "", &CompletionOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(error, LlmError::Configuration(_)));
    }

    #[tokio::test]
    async fn single_failure_aborts_whole_dispatch() {
        let client = BatchClient::with_completer(FailingCompleter {
            fail_on: "1".to_string(),
        });
        let error = client
            .dispatch(&indexed_batch(3), "test-model", &CompletionOptions::new())
            .await
            .unwrap_err();

        match error {
            LlmError::Completion { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(
                    *source,
                    LlmError::Api {
                        status_code: Some(500),
                        ..
                    }
                ));
            }
            other => panic!("Expected Completion error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn progress_reporter_sees_every_completion() {
        let reporter = Arc::new(RecordingReporter::default());
        let client = BatchClient::with_completer(StaggeredCompleter { batch_size: 4 })
            .progress(reporter.clone());

        client
            .dispatch(&indexed_batch(4), "test-model", &CompletionOptions::new())
            .await
            .unwrap();

        assert_eq!(*reporter.begun.lock().unwrap(), vec![4]);
        assert_eq!(reporter.finished.load(Ordering::Relaxed), 1);

        let completions = reporter.completions.lock().unwrap();
        assert_eq!(completions.len(), 4);
        let mut counts: Vec<usize> = completions.iter().map(|(done, _)| *done).collect();
        counts.sort_unstable();
        assert_eq!(counts, vec![1, 2, 3, 4]);
        assert!(completions.iter().all(|(_, total)| *total == 4));
    }

    #[test]
    fn total_cost_of_empty_batch_is_zero() {
        assert_eq!(total_cost(&[], &FlatPricer(0.001)).unwrap(), 0.0);
    }

    #[test]
    fn total_cost_sums_individual_prices() {
        let results = vec![completion("4"), completion("6")];
        let total = total_cost(&results, &FlatPricer(0.001)).unwrap();
        assert!((total - 0.002).abs() < 1e-12);
    }

    #[test]
    fn extract_text_takes_last_choice() {
        let mut result = completion("draft");
        result.choices.push(Choice {
            index: Some(1),
            message: ChoiceMessage {
                role: "assistant".to_string(),
                content: Some("final".to_string()),
            },
            finish_reason: Some("stop".to_string()),
        });

        assert_eq!(extract_text(&[result], 1), vec!["final".to_string()]);
    }

    #[test]
    fn one_malformed_result_blanks_the_whole_batch() {
        let mut malformed = completion("ignored");
        malformed.choices.clear();
        let results = vec![completion("4"), malformed, completion("6")];

        let texts = extract_text(&results, 3);
        assert_eq!(texts, vec![String::new(), String::new(), String::new()]);
    }

    #[test]
    fn missing_content_blanks_the_whole_batch() {
        let mut malformed = completion("ignored");
        malformed.choices[0].message.content = None;

        let texts = extract_text(&[completion("4"), malformed], 2);
        assert_eq!(texts, vec![String::new(), String::new()]);
    }

    #[tokio::test]
    async fn process_returns_texts_results_and_cost() {
        let client = BatchClient::with_completer(StaggeredCompleter { batch_size: 2 });
        let batch = indexed_batch(2);

        let output = client
            .process(&batch, "test-model", &CompletionOptions::new(), &FlatPricer(0.001))
            .await
            .unwrap();

        assert_eq!(output.responses, vec!["0".to_string(), "1".to_string()]);
        assert_eq!(output.results.len(), 2);
        assert!((output.total_cost - 0.002).abs() < 1e-12);
    }

    #[tokio::test]
    async fn process_of_empty_batch_is_all_empty() {
        let client = BatchClient::with_completer(FailingCompleter {
            fail_on: "unused".to_string(),
        });

        let output = client
            .process(&[], "test-model", &CompletionOptions::new(), &FlatPricer(0.001))
            .await
            .unwrap();

        assert!(output.responses.is_empty());
        assert!(output.results.is_empty());
        assert_eq!(output.total_cost, 0.0);
    }
}
