//! TF-IDF vector index over the normalized dataset problems.
//!
//! The vocabulary is built once from the training corpus and frozen. Queries are
//! projected into the same space; tokens never seen during the build carry no
//! weight.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::text::tokens;
use crate::vector::SparseVector;

/// Inverse document frequency formula.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdfWeighting {
    /// `ln(N / df)`. A token found in every document gets no weight.
    #[default]
    Standard,
    /// `ln((1 + N) / (1 + df)) + 1`, never zero.
    Smooth,
}

impl IdfWeighting {
    fn idf(self, n_docs: usize, doc_freq: usize) -> f32 {
        let n = n_docs as f32;
        let df = doc_freq as f32;
        match self {
            IdfWeighting::Standard => (n / df).ln(),
            IdfWeighting::Smooth => ((1.0 + n) / (1.0 + df)).ln() + 1.0,
        }
    }
}

impl std::str::FromStr for IdfWeighting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(IdfWeighting::Standard),
            "smooth" => Ok(IdfWeighting::Smooth),
            other => Err(format!("Unknown weighting '{}', expected 'standard' or 'smooth'", other)),
        }
    }
}

/// Frozen token to dimension mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: HashMap<String, u32>,
}

impl Vocabulary {
    pub fn dimension(&self, token: &str) -> Option<u32> {
        self.terms.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    weighting: IdfWeighting,
    vocabulary: Vocabulary,
    idf: Vec<f32>,
    documents: Vec<SparseVector>,
}

impl VectorIndex {
    /// Builds the index from normalized problem texts.
    ///
    /// Dimensions are assigned in lexicographic token order so the same corpus
    /// always yields the same layout. Each document vector holds
    /// `tf(t, d) * idf(t)` for its tokens.
    ///
    /// # Examples
    ///
    /// ```
    /// use fixbot::index::{IdfWeighting, VectorIndex};
    ///
    /// let corpus = vec!["printer printing".to_string(), "wifi dropping".to_string()];
    /// let index = VectorIndex::build(&corpus, IdfWeighting::Standard);
    /// assert_eq!(index.len(), 2);
    /// assert_eq!(index.vocabulary().len(), 4);
    /// ```
    pub fn build(corpus: &[String], weighting: IdfWeighting) -> VectorIndex {
        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in corpus {
            let unique: BTreeSet<&str> = tokens(doc).collect();
            for token in unique {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }

        // only tokens seen in at least one document get here, so df >= 1
        let mut terms = HashMap::with_capacity(doc_freq.len());
        let mut idf = Vec::with_capacity(doc_freq.len());
        for (dim, (token, df)) in doc_freq.iter().enumerate() {
            terms.insert(token.to_string(), dim as u32);
            idf.push(weighting.idf(corpus.len(), *df));
        }

        let mut index = VectorIndex {
            weighting,
            vocabulary: Vocabulary { terms },
            idf,
            documents: Vec::new(),
        };
        index.documents = corpus.iter().map(|doc| index.transform(doc)).collect();

        tracing::debug!(
            documents = index.documents.len(),
            vocabulary = index.vocabulary.len(),
            ?weighting,
            "built tf-idf index"
        );

        index
    }

    /// Projects normalized text into the frozen vocabulary space.
    ///
    /// Out-of-vocabulary tokens are skipped, so a text with no known token maps
    /// to the zero vector.
    pub fn transform(&self, normalized: &str) -> SparseVector {
        let mut tf: HashMap<u32, u32> = HashMap::new();
        for token in tokens(normalized) {
            if let Some(dim) = self.vocabulary.dimension(token) {
                *tf.entry(dim).or_insert(0) += 1;
            }
        }

        let pairs = tf.into_iter()
            .map(|(dim, count)| (dim, count as f32 * self.idf[dim as usize]))
            .collect();

        SparseVector::from_pairs(pairs)
    }

    pub fn documents(&self) -> &[SparseVector] {
        &self.documents
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn weighting(&self) -> IdfWeighting {
        self.weighting
    }

    /// IDF weight of a vocabulary token.
    pub fn idf(&self, token: &str) -> Option<f32> {
        self.vocabulary.dimension(token).map(|dim| self.idf[dim as usize])
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod index_test {
    use super::*;

    fn corpus(docs: &[&str]) -> Vec<String> {
        docs.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_vocabulary_is_lexicographic() {
        let index = VectorIndex::build(&corpus(&["zebra apple", "mango"]), IdfWeighting::Standard);
        let vocab = index.vocabulary();

        assert_eq!(vocab.dimension("apple"), Some(0));
        assert_eq!(vocab.dimension("mango"), Some(1));
        assert_eq!(vocab.dimension("zebra"), Some(2));
        assert_eq!(vocab.dimension("kiwi"), None);
    }

    #[test]
    fn test_standard_idf_values() {
        let index = VectorIndex::build(
            &corpus(&["printer jam", "printer offline", "wifi slow", "disk full"]),
            IdfWeighting::Standard,
        );

        // N = 4, df(printer) = 2, df(jam) = 1
        assert!((index.idf("printer").unwrap() - (2.0f32).ln()).abs() < 1e-6);
        assert!((index.idf("jam").unwrap() - (4.0f32).ln()).abs() < 1e-6);
    }

    #[test]
    fn test_term_frequency_scales_weight() {
        let index = VectorIndex::build(&corpus(&["error error disk", "wifi"]), IdfWeighting::Standard);
        let doc = &index.documents()[0];

        let error_dim = index.vocabulary().dimension("error").unwrap();
        let disk_dim = index.vocabulary().dimension("disk").unwrap();
        assert!((doc.get(error_dim) - 2.0 * doc.get(disk_dim)).abs() < 1e-6);
    }

    #[test]
    fn test_token_in_every_document_has_zero_standard_weight() {
        let index = VectorIndex::build(&corpus(&["slow laptop", "slow wifi"]), IdfWeighting::Standard);
        assert_eq!(index.idf("slow"), Some(0.0));

        let slow_dim = index.vocabulary().dimension("slow").unwrap();
        assert_eq!(index.documents()[0].get(slow_dim), 0.0);
    }

    #[test]
    fn test_smooth_idf_never_zero() {
        let index = VectorIndex::build(&corpus(&["slow laptop", "slow wifi"]), IdfWeighting::Smooth);
        // ln(3/3) + 1
        assert!((index.idf("slow").unwrap() - 1.0).abs() < 1e-6);
        assert!(index.idf("laptop").unwrap() > 1.0);
    }

    #[test]
    fn test_single_document_smooth_has_weight() {
        let index = VectorIndex::build(&corpus(&["printer printing"]), IdfWeighting::Smooth);
        assert!(!index.documents()[0].is_zero());
    }

    #[test]
    fn test_transform_ignores_unknown_tokens() {
        let index = VectorIndex::build(&corpus(&["printer printing", "wifi slow"]), IdfWeighting::Standard);

        let with_noise = index.transform("printer printing anything");
        let exact = index.transform("printer printing");
        assert_eq!(with_noise, exact);

        let unknown = index.transform("quantum flux capacitor");
        assert!(unknown.is_zero());
    }

    #[test]
    fn test_transform_matches_document_vector() {
        let docs = corpus(&["screen flickering", "keyboard keys stuck", "mouse lag"]);
        let index = VectorIndex::build(&docs, IdfWeighting::Standard);

        for (doc, vector) in docs.iter().zip(index.documents()) {
            assert_eq!(&index.transform(doc), vector);
        }
    }

    #[test]
    fn test_empty_corpus() {
        let index = VectorIndex::build(&[], IdfWeighting::Standard);
        assert!(index.is_empty());
        assert!(index.vocabulary().is_empty());
        assert!(index.transform("anything").is_zero());
    }

    #[test]
    fn test_empty_document_gets_zero_vector() {
        let index = VectorIndex::build(&corpus(&["", "battery"]), IdfWeighting::Standard);
        assert_eq!(index.len(), 2);
        assert!(index.documents()[0].is_zero());
    }

    #[test]
    fn test_weighting_from_str() {
        assert_eq!("standard".parse::<IdfWeighting>(), Ok(IdfWeighting::Standard));
        assert_eq!(" Smooth ".parse::<IdfWeighting>(), Ok(IdfWeighting::Smooth));
        assert!("bm25".parse::<IdfWeighting>().is_err());
    }
}
