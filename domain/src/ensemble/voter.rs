//! Weighted quota voting over per-model outcomes

use super::labels::LabelNormalizer;
use super::outcome::{ModelOutcome, ModelVerdict};
use super::weights::WeightTable;
use crate::core::question::{Question, QuestionOption};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Minimum share of contributing weight an option needs to be selected
pub const DEFAULT_THRESHOLD: f64 = 0.25;

/// How the winning set was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// At least one option cleared the quota
    Quota,
    /// Nothing cleared the quota; the top scorer was taken
    TopScore,
    /// No model produced a countable vote
    NoVotes,
}

/// The ensembled answer for one question.
///
/// Derived from the outcomes once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleResult {
    pub question_id: String,
    pub options: Vec<QuestionOption>,
    /// Winning canonical labels, in option order
    pub selected_labels: Vec<String>,
    /// Weighted mean confidence of the models that answered
    pub final_confidence: f64,
    /// Share of the total score per canonical label
    pub option_probabilities: BTreeMap<String, f64>,
    /// One audit record per outcome, in dispatch order
    pub per_model: Vec<ModelVerdict>,
    /// More than one option was selected
    pub ambiguous: bool,
    pub decision: Decision,
}

impl EnsembleResult {
    /// Number of models whose answer was counted
    pub fn answered_count(&self) -> usize {
        self.per_model.iter().filter(|v| v.is_answered()).count()
    }
}

/// Vote with a weight table and threshold fixed at construction
///
/// # Example
///
/// ```
/// use mcq_domain::{EnsembleVoter, Model, ModelOutcome, ParsedAnswer, Question, QuestionOption, WeightTable};
///
/// let question = Question::new(
///     "1",
///     "Capital of Italy?",
///     vec![QuestionOption::new("A", "Paris"), QuestionOption::new("B", "Rome")],
///     false,
/// )
/// .unwrap();
/// let outcomes = vec![ModelOutcome::success(
///     Model::cerebras("llama-3.3-70b"),
///     ParsedAnswer::new(vec!["B"], 0.9),
///     "{}",
/// )];
///
/// let voter = EnsembleVoter::new(WeightTable::uniform(1.0));
/// let result = voter.vote(&question, &outcomes);
/// assert_eq!(result.selected_labels, vec!["B"]);
/// assert_eq!(result.final_confidence, 0.9);
/// assert!(!result.ambiguous);
/// ```
#[derive(Debug, Clone)]
pub struct EnsembleVoter {
    weights: WeightTable,
    threshold: f64,
}

impl EnsembleVoter {
    pub fn new(weights: WeightTable) -> Self {
        Self {
            weights,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn vote(&self, question: &Question, outcomes: &[ModelOutcome]) -> EnsembleResult {
        vote(question, outcomes, &self.weights, self.threshold)
    }
}

/// Combine per-model outcomes into one decision.
///
/// An option wins when its score reaches `threshold` times the total weight
/// of the models that answered. When nothing reaches the quota, the single
/// top scorer wins, with ties going to the option listed first.
pub fn vote(
    question: &Question,
    outcomes: &[ModelOutcome],
    weights: &WeightTable,
    threshold: f64,
) -> EnsembleResult {
    let options = question.options();
    let normalizer = LabelNormalizer::new(options);

    // Indexed by option position
    let mut scores = vec![0.0_f64; options.len()];
    let mut scored = vec![false; options.len()];
    let mut total_weight = 0.0_f64;
    let mut weighted_confidence = 0.0_f64;
    let mut per_model = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        match outcome {
            ModelOutcome::Success { model, answer, .. } => {
                let weight = weights.weight(model);
                total_weight += weight;
                weighted_confidence += weight * answer.confidence;

                let mut counted: Vec<String> = Vec::new();
                for raw in &answer.selected_options {
                    let Some(label) = normalizer.resolve(raw, options) else {
                        debug!(
                            question = question.id(),
                            model = %model,
                            label = raw.as_str(),
                            "Skipping label that matches no option"
                        );
                        continue;
                    };
                    if counted.contains(&label) {
                        continue;
                    }
                    if let Some(position) = question.position(&label) {
                        scores[position] += weight;
                        scored[position] = true;
                    }
                    counted.push(label);
                }

                per_model.push(ModelVerdict::Answered {
                    model: model.clone(),
                    weight,
                    raw_labels: answer.selected_options.clone(),
                    counted_labels: counted,
                    confidence: answer.confidence,
                    reasoning: answer.reasoning.clone(),
                });
            }
            ModelOutcome::ParseFailure { model, raw_text } => {
                per_model.push(ModelVerdict::Unparsed {
                    model: model.clone(),
                    raw_text: raw_text.clone(),
                });
            }
            ModelOutcome::CallFailure { model, error_kind } => {
                per_model.push(ModelVerdict::Failed {
                    model: model.clone(),
                    error: error_kind.clone(),
                });
            }
        }
    }

    let quota = threshold * total_weight;
    let mut winners: Vec<usize> = (0..options.len())
        .filter(|&i| scored[i] && scores[i] >= quota)
        .collect();

    let decision = if !winners.is_empty() {
        Decision::Quota
    } else if let Some(top) = top_scorer(&scores, &scored) {
        winners.push(top);
        Decision::TopScore
    } else {
        Decision::NoVotes
    };

    let final_confidence = if total_weight > 0.0 {
        weighted_confidence / total_weight
    } else {
        0.0
    };

    let score_sum: f64 = scores.iter().sum();
    let option_probabilities = options
        .iter()
        .zip(&scores)
        .map(|(option, score)| {
            let probability = if score_sum > 0.0 { score / score_sum } else { 0.0 };
            (option.label.clone(), probability)
        })
        .collect();

    let selected_labels: Vec<String> = winners.iter().map(|&i| options[i].label.clone()).collect();

    trace!(
        question = question.id(),
        ?decision,
        selected = ?selected_labels,
        total_weight,
        "Ensemble vote complete"
    );

    EnsembleResult {
        question_id: question.id().to_string(),
        options: options.to_vec(),
        ambiguous: selected_labels.len() > 1,
        selected_labels,
        final_confidence,
        option_probabilities,
        per_model,
        decision,
    }
}

/// Position of the strictly highest score; the earliest position wins ties
fn top_scorer(scores: &[f64], scored: &[bool]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &score) in scores.iter().enumerate() {
        if !scored[i] {
            continue;
        }
        match best {
            Some(b) if scores[b] >= score => {}
            _ => best = Some(i),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Model;
    use crate::parsing::answer::ParsedAnswer;

    fn abstract_question() -> Question {
        Question::new(
            "1",
            "A class is declared abstract but has no abstract methods. What happens?",
            vec![
                QuestionOption::new("A", "It will not compile."),
                QuestionOption::new("B", "The class can still be abstract."),
                QuestionOption::new("C", "It must declare a constructor."),
                QuestionOption::new("D", "It becomes final."),
            ],
            false,
        )
        .unwrap()
    }

    fn five_options() -> Question {
        let options = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|l| QuestionOption::new(*l, format!("Option {}", l)))
            .collect();
        Question::new("5", "Five", options, false).unwrap()
    }

    fn answered(name: &str, labels: &[&str], confidence: f64) -> ModelOutcome {
        ModelOutcome::success(
            Model::custom("test", name),
            ParsedAnswer::new(labels.to_vec(), confidence),
            "{}",
        )
    }

    fn weights(entries: &[(&str, f64)]) -> WeightTable {
        entries.iter().fold(WeightTable::new(0.15), |table, (name, w)| {
            table
                .with_weight(&Model::custom("test", *name), *w)
                .unwrap()
        })
    }

    #[test]
    fn test_single_model() {
        let outcomes = vec![answered("m1", &["B"], 0.9)];
        let result = vote(
            &abstract_question(),
            &outcomes,
            &weights(&[("m1", 1.0)]),
            DEFAULT_THRESHOLD,
        );
        assert_eq!(result.selected_labels, vec!["B"]);
        assert_eq!(result.final_confidence, 0.9);
        assert!(!result.ambiguous);
        assert_eq!(result.decision, Decision::Quota);
        assert_eq!(result.option_probabilities["B"], 1.0);
        assert_eq!(result.option_probabilities["A"], 0.0);
    }

    #[test]
    fn test_two_agree_third_errors() {
        let outcomes = vec![
            answered("m1", &["C"], 0.8),
            ModelOutcome::call_failure(Model::custom("test", "m2"), "connection reset"),
            answered("m3", &["c"], 0.6),
        ];
        let table = weights(&[("m1", 0.3), ("m2", 0.5), ("m3", 0.2)]);
        let result = vote(&abstract_question(), &outcomes, &table, DEFAULT_THRESHOLD);

        assert_eq!(result.selected_labels, vec!["C"]);
        assert_eq!(result.option_probabilities["C"], 1.0);
        assert!((result.final_confidence - (0.3 * 0.8 + 0.2 * 0.6) / 0.5).abs() < 1e-12);
        assert_eq!(result.per_model.len(), 3);
        assert!(matches!(result.per_model[1], ModelVerdict::Failed { ref error, .. } if error == "connection reset"));
    }

    #[test]
    fn test_threshold_boundary_included() {
        let outcomes = vec![answered("m1", &["A"], 0.5), answered("m2", &["B"], 0.5)];
        let table = weights(&[("m1", 0.25), ("m2", 0.75)]);
        let result = vote(&abstract_question(), &outcomes, &table, 0.25);
        assert_eq!(result.selected_labels, vec!["A", "B"]);
        assert!(result.ambiguous);
    }

    #[test]
    fn test_just_below_threshold_wins_by_top_score() {
        let outcomes = vec![
            answered("m1", &["A"], 0.5),
            answered("m2", &["B"], 0.5),
            answered("m3", &["C"], 0.5),
            answered("m4", &["D"], 0.5),
            answered("m5", &["E"], 0.5),
        ];
        let table = weights(&[
            ("m1", 0.249999),
            ("m2", 0.2),
            ("m3", 0.2),
            ("m4", 0.2),
            ("m5", 0.150001),
        ]);
        let result = vote(&five_options(), &outcomes, &table, 0.25);
        assert_eq!(result.selected_labels, vec!["A"]);
        assert_eq!(result.decision, Decision::TopScore);
        assert!(!result.ambiguous);
    }

    #[test]
    fn test_top_score_tie_goes_to_first_option() {
        // Five options, five equal votes: every score is 0.2 < 0.25
        let outcomes = vec![
            answered("m1", &["E"], 0.5),
            answered("m2", &["D"], 0.5),
            answered("m3", &["C"], 0.5),
            answered("m4", &["B"], 0.5),
            answered("m5", &["A"], 0.5),
        ];
        let result = vote(&five_options(), &outcomes, &WeightTable::uniform(1.0), 0.25);
        assert_eq!(result.selected_labels, vec!["A"]);
        assert_eq!(result.decision, Decision::TopScore);
    }

    #[test]
    fn test_end_to_end_agreement() {
        let outcomes = vec![
            answered("m1", &["B"], 0.9),
            answered("m2", &["B"], 0.7),
            answered("m3", &["B"], 0.6),
        ];
        let question = abstract_question();
        let result = vote(&question, &outcomes, &WeightTable::uniform(1.0), DEFAULT_THRESHOLD);
        assert_eq!(result.selected_labels, vec!["B"]);
        assert!((result.final_confidence - 0.733).abs() < 1e-3);
        assert!(!result.ambiguous);
        assert_eq!(
            question.render_answer(&result.selected_labels[0]),
            "B) The class can still be abstract."
        );
    }

    #[test]
    fn test_vote_is_idempotent() {
        let outcomes = vec![
            answered("m1", &["A", "B"], 0.9),
            ModelOutcome::parse_failure(Model::custom("test", "m2"), "no json"),
            answered("m3", &["2"], 0.4),
        ];
        let table = weights(&[("m1", 0.4), ("m3", 0.35)]);
        let first = vote(&abstract_question(), &outcomes, &table, DEFAULT_THRESHOLD);
        let second = vote(&abstract_question(), &outcomes, &table, DEFAULT_THRESHOLD);
        assert_eq!(first, second);
        assert_eq!(
            first.final_confidence.to_bits(),
            second.final_confidence.to_bits()
        );
    }

    #[test]
    fn test_no_successful_outcomes() {
        let outcomes = vec![
            ModelOutcome::timeout(Model::custom("test", "m1")),
            ModelOutcome::parse_failure(Model::custom("test", "m2"), "???"),
        ];
        let result = vote(
            &abstract_question(),
            &outcomes,
            &WeightTable::default(),
            DEFAULT_THRESHOLD,
        );
        assert!(result.selected_labels.is_empty());
        assert_eq!(result.final_confidence, 0.0);
        assert_eq!(result.decision, Decision::NoVotes);
        assert!(result.option_probabilities.values().all(|p| *p == 0.0));
        assert_eq!(result.answered_count(), 0);
    }

    #[test]
    fn test_unknown_labels_not_counted() {
        let outcomes = vec![answered("m1", &["Z", "b", "B"], 0.8)];
        let result = vote(
            &abstract_question(),
            &outcomes,
            &WeightTable::uniform(1.0),
            DEFAULT_THRESHOLD,
        );
        assert_eq!(result.selected_labels, vec!["B"]);
        assert_eq!(result.option_probabilities["B"], 1.0);
        match &result.per_model[0] {
            ModelVerdict::Answered { counted_labels, .. } => {
                assert_eq!(counted_labels, &vec!["B".to_string()])
            }
            other => panic!("unexpected verdict {:?}", other),
        }
    }

    #[test]
    fn test_answered_without_labels_still_weighs_confidence() {
        let outcomes = vec![answered("m1", &["A"], 1.0), answered("m2", &[], 0.0)];
        let result = vote(
            &abstract_question(),
            &outcomes,
            &WeightTable::uniform(1.0),
            DEFAULT_THRESHOLD,
        );
        assert_eq!(result.selected_labels, vec!["A"]);
        assert_eq!(result.final_confidence, 0.5);
    }

    #[test]
    fn test_voter_uses_configured_threshold() {
        let outcomes = vec![answered("m1", &["A"], 0.5), answered("m2", &["B"], 0.5)];
        let table = weights(&[("m1", 0.4), ("m2", 0.6)]);
        let voter = EnsembleVoter::new(table).with_threshold(0.5);
        let result = voter.vote(&abstract_question(), &outcomes);
        assert_eq!(result.selected_labels, vec!["B"]);
    }
}
