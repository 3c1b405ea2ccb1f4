//! Question answering over the trained model.
//!
//! A [`Chatbot`] is built once at startup and shared read-only by every request
//! handler. It never changes after construction.

use crate::dataset::DatasetRow;
use crate::matcher::{best_match, Match, DEFAULT_THRESHOLD};
use crate::model::TrainedModel;
use crate::text::normalize;

/// Reply for blank queries and queries made only of stopwords or punctuation.
pub const INVALID_QUERY_RESPONSE: &str = "Please type a valid question.";

/// Reply when no dataset problem is similar enough.
pub const NO_MATCH_RESPONSE: &str =
    "I do not understand this query. Please ask only computer-related questions.";

/// How a query was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer<'a> {
    /// Nothing left to match after normalization.
    Invalid,
    /// Best score stayed under the threshold.
    NoMatch { best_score: f32 },
    Matched { row: &'a DatasetRow, score: f32 },
}

impl Answer<'_> {
    /// Text sent back to the user.
    pub fn text(&self) -> &str {
        match self {
            Answer::Invalid => INVALID_QUERY_RESPONSE,
            Answer::NoMatch { .. } => NO_MATCH_RESPONSE,
            Answer::Matched { row, .. } => &row.solution,
        }
    }
}

pub struct Chatbot {
    rows: Vec<DatasetRow>,
    model: TrainedModel,
    threshold: f32,
}

impl Chatbot {
    /// Pairs dataset rows with the model trained on them.
    ///
    /// Returns `None` if the model does not hold exactly one vector per row.
    pub fn new(rows: Vec<DatasetRow>, model: TrainedModel, threshold: f32) -> Option<Chatbot> {
        if rows.len() != model.index().len() {
            return None;
        }

        Some(Chatbot { rows, model, threshold })
    }

    /// Trains a model in memory; handy for tests and one-off tools.
    pub fn from_rows(rows: Vec<DatasetRow>, weighting: crate::index::IdfWeighting) -> Chatbot {
        let model = TrainedModel::train(&rows, weighting, String::new());
        Chatbot { rows, model, threshold: DEFAULT_THRESHOLD }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Chatbot {
        self.threshold = threshold;
        self
    }

    /// Resolves a raw user query.
    ///
    /// Blank input, or input that normalizes to nothing, is rejected before the
    /// matcher runs.
    pub fn answer(&self, query: &str) -> Answer<'_> {
        if query.trim().is_empty() {
            return Answer::Invalid;
        }

        let cleaned = normalize(query);
        if cleaned.is_empty() {
            return Answer::Invalid;
        }

        let index = self.model.index();
        let query_vec = index.transform(&cleaned);

        match best_match(&query_vec, index.documents(), self.threshold) {
            Some(Match { index, score }) => Answer::Matched { row: &self.rows[index], score },
            None => {
                let best_score = crate::matcher::similarities(&query_vec, index.documents())
                    .into_iter()
                    .fold(0.0, f32::max);
                Answer::NoMatch { best_score }
            }
        }
    }

    /// Reply text for a raw user query.
    pub fn respond(&self, query: &str) -> String {
        let answer = self.answer(query);
        match &answer {
            Answer::Matched { score, .. } => tracing::debug!(score, "query matched"),
            Answer::NoMatch { best_score } => tracing::debug!(best_score, "query below threshold"),
            Answer::Invalid => tracing::debug!("invalid query"),
        }
        answer.text().to_string()
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}
