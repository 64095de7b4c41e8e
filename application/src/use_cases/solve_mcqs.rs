//! Solve MCQs use case
//!
//! Orchestrates a full request: extract questions once, then for each
//! question dispatch to the models, vote, and assemble the answer. The whole
//! request runs under one deadline and is all-or-nothing.

use crate::config::PipelineConfig;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::ocr::TextExtractor;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::vision::{ImageInput, VisionExtractor};
use crate::use_cases::dispatch::{DispatchError, ModelDispatcher};
use crate::use_cases::extract_questions::{
    Extraction, ExtractionError, ExtractionPath, QuestionExtractor,
};
use futures::stream::{self, StreamExt, TryStreamExt};
use mcq_domain::{EnsembleResult, EnsembleVoter, Model, Question};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{Instrument, info, info_span};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Errors that end a request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Request timed out after {0:?}")]
    RequestTimeout(Duration),
}

impl SolveError {
    /// Stable machine-readable code for error payloads
    pub fn code(&self) -> &'static str {
        match self {
            SolveError::Extraction(ExtractionError::EmptyText) => "no_text",
            SolveError::Extraction(ExtractionError::NoQuestions) => "no_questions",
            SolveError::Extraction(ExtractionError::Timeout(_)) => "extraction_timeout",
            SolveError::Extraction(_) => "extraction_failed",
            SolveError::Dispatch(_) => "no_models",
            SolveError::RequestTimeout(_) => "request_timeout",
        }
    }
}

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Include ensemble details in the output
    pub debug: bool,
    /// Models to use instead of the configured list
    pub requested_models: Option<Vec<Model>>,
}

impl SolveOptions {
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_models(mut self, models: Vec<Model>) -> Self {
        self.requested_models = Some(models);
        self
    }
}

/// One answered question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnsweredQuestion {
    pub question: String,
    /// Winners rendered as `"label) text"`
    pub answer: Vec<String>,
    pub question_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveMetadata {
    pub models: Vec<Model>,
    /// RFC 3339
    pub timestamp: String,
}

/// Extra detail returned when `debug` is set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveDebug {
    pub request_id: u64,
    pub extraction_path: ExtractionPath,
    pub ensembles: Vec<EnsembleResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveOutput {
    #[serde(rename = "originalText", skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    pub questions: Vec<AnsweredQuestion>,
    pub metadata: SolveMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<SolveDebug>,
}

/// Use case answering every question found in an image or text
pub struct SolveMcqsUseCase<G: LlmGateway + ?Sized + 'static> {
    extractor: QuestionExtractor<G>,
    dispatcher: ModelDispatcher<G>,
    voter: EnsembleVoter,
    config: PipelineConfig,
}

impl<G: LlmGateway + ?Sized + 'static> SolveMcqsUseCase<G> {
    pub fn new(gateway: Arc<G>, config: PipelineConfig) -> Self {
        let extractor = QuestionExtractor::new(
            Arc::clone(&gateway),
            config.structuring_model.clone(),
            config.timeouts.extraction,
        )
        .with_params(config.structuring_generation)
        .with_self_correction(config.self_correction);

        let dispatcher = ModelDispatcher::new(gateway, config.timeouts.model)
            .with_primary(config.primary_provider.clone())
            .with_params(config.generation);

        let voter = EnsembleVoter::new(config.weights.clone()).with_threshold(config.threshold);

        Self {
            extractor,
            dispatcher,
            voter,
            config,
        }
    }

    pub fn with_vision(mut self, vision: Arc<dyn VisionExtractor>) -> Self {
        self.extractor = self.extractor.with_vision(vision);
        self
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn TextExtractor>) -> Self {
        self.extractor = self.extractor.with_ocr(ocr);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Answer the questions in an image with default (no-op) progress
    pub async fn process_image(
        &self,
        image: &ImageInput,
        options: &SolveOptions,
    ) -> Result<SolveOutput, SolveError> {
        self.process_image_with_progress(image, options, &NoProgress)
            .await
    }

    /// Answer the questions in an image with progress callbacks
    pub async fn process_image_with_progress(
        &self,
        image: &ImageInput,
        options: &SolveOptions,
        progress: &dyn ProgressNotifier,
    ) -> Result<SolveOutput, SolveError> {
        let request_id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        let span = info_span!("request", id = request_id, mode = "image");

        let flow = async {
            info!(bytes = image.len(), mime = image.mime_type(), "Processing image");
            progress.on_extraction_start();
            let extraction = self.extractor.extract(image).await?;
            self.answer_extraction(request_id, extraction, None, options, progress)
                .await
        };

        self.with_deadline(flow.instrument(span)).await
    }

    /// Answer the questions in raw text with default (no-op) progress
    pub async fn process_text(
        &self,
        text: &str,
        options: &SolveOptions,
    ) -> Result<SolveOutput, SolveError> {
        self.process_text_with_progress(text, options, &NoProgress)
            .await
    }

    /// Answer the questions in raw text, skipping image extraction
    pub async fn process_text_with_progress(
        &self,
        text: &str,
        options: &SolveOptions,
        progress: &dyn ProgressNotifier,
    ) -> Result<SolveOutput, SolveError> {
        let request_id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        let span = info_span!("request", id = request_id, mode = "text");

        let flow = async {
            info!(chars = text.len(), "Processing text");
            progress.on_extraction_start();
            let extraction = self.extractor.extract_from_text(text).await?;
            self.answer_extraction(
                request_id,
                extraction,
                Some(text.to_string()),
                options,
                progress,
            )
            .await
        };

        self.with_deadline(flow.instrument(span)).await
    }

    async fn with_deadline<F>(&self, flow: F) -> Result<SolveOutput, SolveError>
    where
        F: std::future::Future<Output = Result<SolveOutput, SolveError>>,
    {
        let deadline = self.config.timeouts.request;
        timeout(deadline, flow)
            .await
            .map_err(|_| SolveError::RequestTimeout(deadline))?
    }

    async fn answer_extraction(
        &self,
        request_id: u64,
        extraction: Extraction,
        original_text: Option<String>,
        options: &SolveOptions,
        progress: &dyn ProgressNotifier,
    ) -> Result<SolveOutput, SolveError> {
        let Extraction { questions, path } = extraction;
        if questions.is_empty() {
            return Err(ExtractionError::NoQuestions.into());
        }
        info!(count = questions.len(), path = %path, "Questions extracted");
        progress.on_extraction_complete(path, questions.len());

        let models = self.resolve_models(options)?;
        let ensembles = self.answer_all(&questions, &models, progress).await?;

        let answered = questions
            .iter()
            .zip(&ensembles)
            .map(|(question, result)| AnsweredQuestion {
                question: question.text().to_string(),
                answer: result
                    .selected_labels
                    .iter()
                    .map(|label| question.render_answer(label))
                    .collect(),
                question_id: question.id().to_string(),
            })
            .collect();

        info!(
            questions = ensembles.len(),
            models = models.len(),
            "Request complete"
        );

        Ok(SolveOutput {
            original_text,
            questions: answered,
            metadata: SolveMetadata {
                models,
                timestamp: chrono::Utc::now().to_rfc3339(),
            },
            debug: options.debug.then_some(SolveDebug {
                request_id,
                extraction_path: path,
                ensembles,
            }),
        })
    }

    fn resolve_models(&self, options: &SolveOptions) -> Result<Vec<Model>, DispatchError> {
        let models = match &options.requested_models {
            Some(requested) if !requested.is_empty() => requested.clone(),
            _ => self.config.models.clone(),
        };
        if models.is_empty() {
            return Err(DispatchError::NoModels);
        }
        Ok(models)
    }

    /// Dispatch and vote per question, in question order.
    ///
    /// At most `max_concurrent_questions` questions are in flight.
    async fn answer_all(
        &self,
        questions: &[Question],
        models: &[Model],
        progress: &dyn ProgressNotifier,
    ) -> Result<Vec<EnsembleResult>, DispatchError> {
        let total = questions.len();
        let concurrency = self.config.max_concurrent_questions.max(1);

        stream::iter(questions.iter().enumerate())
            .map(|(index, question)| async move {
                progress.on_question_start(question, index, total);
                let outcomes = self.dispatcher.dispatch(question, models, progress).await?;
                let result = self.voter.vote(question, &outcomes);
                info!(
                    question = question.id(),
                    selected = %result.selected_labels.join(","),
                    confidence = %format!("{:.0}%", result.final_confidence * 100.0),
                    "Question answered"
                );
                progress.on_question_complete(&result);
                Ok::<_, DispatchError>(result)
            })
            .buffered(concurrency)
            .try_collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeoutConfig;
    use crate::ports::llm_gateway::{BackendReply, GatewayError, GenerationParams};
    use crate::ports::vision::VisionError;
    use async_trait::async_trait;
    use mcq_domain::{QuestionOption, WeightTable};
    use std::sync::Mutex;

    const STRUCTURED: &str = r#"[
        {"id":"1","question":"What happens if an abstract class has no abstract methods?","options":[
            {"label":"A","text":"It will not compile."},
            {"label":"B","text":"The class can still be abstract."},
            {"label":"C","text":"Java adds an abstract method."},
            {"label":"D","text":"It becomes a concrete class."}]},
        {"id":"2","question":"Which are primes?","options":["4","5","7"],"multiChoice":true}
    ]"#;

    /// Gateway playing both the structuring model and the graders
    struct FakeBackend {
        structuring_reply: String,
        /// Answer JSON per model id; models not listed fail
        answers: Vec<(Model, String)>,
        slow_models: Vec<Model>,
        calls: Mutex<usize>,
    }

    impl FakeBackend {
        fn new(answers: Vec<(Model, &str)>) -> Self {
            Self {
                structuring_reply: STRUCTURED.to_string(),
                answers: answers
                    .into_iter()
                    .map(|(m, a)| (m, a.to_string()))
                    .collect(),
                slow_models: Vec::new(),
                calls: Mutex::new(0),
            }
        }

        fn with_slow(mut self, model: Model) -> Self {
            self.slow_models.push(model);
            self
        }
    }

    #[async_trait]
    impl LlmGateway for FakeBackend {
        async fn invoke(
            &self,
            model: &Model,
            prompt: &str,
            _params: &GenerationParams,
        ) -> Result<BackendReply, GatewayError> {
            *self.calls.lock().unwrap() += 1;
            if prompt.starts_with("You are a strict parser") {
                return Ok(BackendReply::new(model.clone(), self.structuring_reply.clone()));
            }
            if self.slow_models.contains(model) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            // The prime question gets the same answer shape with its own labels
            let is_prime_question = prompt.contains("Which are primes?");
            match self.answers.iter().find(|(m, _)| m == model) {
                Some((_, answer)) if is_prime_question => Ok(BackendReply::new(
                    model.clone(),
                    answer.replace("\"B\"", "\"B\", \"C\""),
                )),
                Some((_, answer)) => Ok(BackendReply::new(model.clone(), answer.clone())),
                None => Err(GatewayError::ModelNotAvailable(model.to_string())),
            }
        }
    }

    struct StaticVision(Result<Vec<Question>, VisionError>);

    #[async_trait]
    impl VisionExtractor for StaticVision {
        fn name(&self) -> &str {
            "static"
        }

        async fn extract(&self, _image: &ImageInput) -> Result<Vec<Question>, VisionError> {
            self.0.clone()
        }
    }

    fn graders() -> Vec<Model> {
        vec![
            Model::cerebras("m1"),
            Model::cerebras("m2"),
            Model::gemini("m3"),
        ]
    }

    fn agreeing_backend() -> FakeBackend {
        let [m1, m2, m3]: [Model; 3] = graders().try_into().unwrap();
        FakeBackend::new(vec![
            (m1, r#"{"selected_options":["B"],"confidence":0.9,"reasoning":"r"}"#),
            (m2, r#"<think>hmm</think>```json
{"selected_options":["b"],"confidence":0.7}
```"#),
            (m3, r#"{"selected_options":["2"],"confidence":0.6}"#),
        ])
    }

    fn config() -> PipelineConfig {
        PipelineConfig::default()
            .with_models(graders())
            .with_weights(WeightTable::uniform(1.0))
    }

    fn abstract_question() -> Question {
        Question::new(
            "1",
            "What happens if an abstract class has no abstract methods?",
            vec![
                QuestionOption::new("A", "It will not compile."),
                QuestionOption::new("B", "The class can still be abstract."),
            ],
            false,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_process_text_end_to_end() {
        let use_case = SolveMcqsUseCase::new(Arc::new(agreeing_backend()), config());
        let output = use_case
            .process_text("raw text", &SolveOptions::default().with_debug(true))
            .await
            .unwrap();

        assert_eq!(output.questions.len(), 2);
        assert_eq!(
            output.questions[0].answer,
            vec!["B) The class can still be abstract."]
        );
        assert_eq!(output.questions[0].question_id, "1");
        assert_eq!(output.questions[1].answer, vec!["B) 5", "C) 7"]);
        assert_eq!(output.original_text.as_deref(), Some("raw text"));
        assert_eq!(output.metadata.models, graders());

        let debug = output.debug.unwrap();
        assert_eq!(debug.extraction_path, ExtractionPath::Text);
        assert!((debug.ensembles[0].final_confidence - 0.7333).abs() < 1e-3);
        assert!(debug.ensembles[1].ambiguous);
    }

    #[tokio::test]
    async fn test_process_image_with_vision() {
        let use_case = SolveMcqsUseCase::new(Arc::new(agreeing_backend()), config())
            .with_vision(Arc::new(StaticVision(Ok(vec![abstract_question()]))));
        let output = use_case
            .process_image(&ImageInput::from_bytes(vec![0xFF, 0xD8, 0xFF]), &SolveOptions::default())
            .await
            .unwrap();
        assert_eq!(output.questions.len(), 1);
        assert_eq!(output.questions[0].answer, vec!["B) The class can still be abstract."]);
        assert!(output.debug.is_none());
        assert!(output.original_text.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_model_does_not_fail_question() {
        let backend = agreeing_backend().with_slow(Model::gemini("m3"));
        let use_case = SolveMcqsUseCase::new(Arc::new(backend), config());
        let output = use_case
            .process_text("raw text", &SolveOptions::default().with_debug(true))
            .await
            .unwrap();
        assert_eq!(
            output.questions[0].answer,
            vec!["B) The class can still be abstract."]
        );
        let debug = output.debug.unwrap();
        assert_eq!(debug.ensembles[0].answered_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_deadline_discards_partial_results() {
        let backend = agreeing_backend().with_slow(Model::gemini("m3"));
        // Two questions, each waiting out a 25s model timeout: 50s > 30s
        let timeouts = TimeoutConfig::default().with_request(Duration::from_secs(30));
        let use_case = SolveMcqsUseCase::new(Arc::new(backend), config().with_timeouts(timeouts));
        let err = use_case
            .process_text("raw text", &SolveOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, SolveError::RequestTimeout(Duration::from_secs(30)));
        assert_eq!(err.code(), "request_timeout");
    }

    #[tokio::test(start_paused = true)]
    async fn test_parallel_questions_fit_the_deadline() {
        let backend = agreeing_backend().with_slow(Model::gemini("m3"));
        let timeouts = TimeoutConfig::default().with_request(Duration::from_secs(30));
        let use_case = SolveMcqsUseCase::new(
            Arc::new(backend),
            config()
                .with_timeouts(timeouts)
                .with_max_concurrent_questions(2),
        );
        let output = use_case
            .process_text("raw text", &SolveOptions::default())
            .await
            .unwrap();
        assert_eq!(output.questions.len(), 2);
        assert_eq!(output.questions[0].question_id, "1");
        assert_eq!(output.questions[1].question_id, "2");
    }

    #[tokio::test]
    async fn test_requested_models_override_config() {
        let use_case = SolveMcqsUseCase::new(Arc::new(agreeing_backend()), config());
        let only_m1 = vec![Model::cerebras("m1")];
        let output = use_case
            .process_text("raw text", &SolveOptions::default().with_models(only_m1.clone()))
            .await
            .unwrap();
        assert_eq!(output.metadata.models, only_m1);
    }

    #[tokio::test]
    async fn test_extraction_failure_is_terminal() {
        let use_case = SolveMcqsUseCase::new(Arc::new(agreeing_backend()), config())
            .with_vision(Arc::new(StaticVision(Err(VisionError::Other(
                "blurry".into(),
            )))));
        let err = use_case
            .process_image(&ImageInput::from_bytes(vec![1]), &SolveOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "extraction_failed");
    }

    #[tokio::test]
    async fn test_empty_text_and_empty_models() {
        let use_case = SolveMcqsUseCase::new(Arc::new(agreeing_backend()), config());
        let err = use_case
            .process_text(" ", &SolveOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "no_text");

        let no_models = SolveMcqsUseCase::new(
            Arc::new(agreeing_backend()),
            config().with_models(Vec::new()),
        );
        let err = no_models
            .process_text("raw text", &SolveOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, SolveError::Dispatch(DispatchError::NoModels));
    }

    #[test]
    fn test_output_shape() {
        let output = SolveOutput {
            original_text: None,
            questions: vec![AnsweredQuestion {
                question: "Q".into(),
                answer: vec!["A) yes".into()],
                question_id: "1".into(),
            }],
            metadata: SolveMetadata {
                models: vec![Model::cerebras("llama-3.3-70b")],
                timestamp: "2025-01-01T00:00:00+00:00".into(),
            },
            debug: None,
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["questions"][0]["answer"][0], "A) yes");
        assert_eq!(json["metadata"]["models"][0], "cerebras:llama-3.3-70b");
        assert!(json.get("debug").is_none());
        assert!(json.get("originalText").is_none());
    }
}
