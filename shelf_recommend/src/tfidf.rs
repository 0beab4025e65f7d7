//! TF-IDF vectorizer for product text, the input of the content index

use crate::catalog::Product;
use crate::error::{RecommendError, Result};
use crate::mapping::IdMapping;
use crate::sparse::CsrMatrix;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

const MIN_TOKEN_CHARS: usize = 2;

/// TF-IDF vectorizer with a fixed vocabulary.
///
/// This implementation:
/// - Lowercases and splits on anything that isn't alphanumeric
/// - Keeps the `max_features` terms with the highest document frequency
/// - Uses smoothed IDF, `ln((1 + n) / (1 + df)) + 1`, and L2-normalises rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: BTreeMap<String, u32>,
    idf: Vec<f32>,
    max_features: usize,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Result<Self> {
        if max_features == 0 {
            return Err(RecommendError::InvalidArgument(
                "max_features must be positive".to_string(),
            ));
        }

        Ok(Self {
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
            max_features,
        })
    }

    fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
            .map(str::to_lowercase)
    }

    /// Learn the vocabulary and IDF weights
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) {
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();
        for doc in documents {
            let unique: BTreeSet<String> = Self::tokenize(doc.as_ref()).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = doc_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);
        ranked.sort_by(|a, b| a.0.cmp(&b.0));

        let n_docs = documents.len() as f32;
        self.idf = ranked
            .iter()
            .map(|(_, df)| ((1.0 + n_docs) / (1.0 + *df as f32)).ln() + 1.0)
            .collect();
        self.vocabulary = ranked
            .into_iter()
            .enumerate()
            .map(|(col, (term, _))| (term, col as u32))
            .collect();
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Sparse, L2-normalised TF-IDF entries of one document
    pub fn transform(&self, document: &str) -> Vec<(u32, f32)> {
        let mut tf: BTreeMap<u32, f32> = BTreeMap::new();
        for token in Self::tokenize(document) {
            if let Some(&col) = self.vocabulary.get(&token) {
                *tf.entry(col).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(u32, f32)> = tf
            .into_iter()
            .map(|(col, count)| (col, count * self.idf[col as usize]))
            .collect();

        let norm = entries.iter().map(|(_, v)| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, value) in entries.iter_mut() {
                *value /= norm;
            }
        }

        entries
    }

    /// Fit on `documents` and return their TF-IDF rows, one per document
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<CsrMatrix> {
        self.fit(documents);
        let rows = documents.iter().map(|doc| self.transform(doc.as_ref())).collect();
        CsrMatrix::from_rows(self.vocabulary_len(), rows)
    }
}

/// Build the content matrix and its mapping from catalog products.
///
/// Products whose text yields no vocabulary term get no row, so they are
/// absent from the content index.
pub fn build_content_index<'a, I>(products: I, max_features: usize) -> Result<(IdMapping, CsrMatrix)>
where
    I: IntoIterator<Item = &'a Product>,
{
    let mut documents: BTreeMap<&str, String> = BTreeMap::new();
    for product in products {
        documents
            .entry(product.product_id.as_str())
            .or_insert_with(|| product.content_text());
    }

    let texts: Vec<&String> = documents.values().collect();
    let mut vectorizer = TfidfVectorizer::new(max_features)?;
    let full = vectorizer.fit_transform(&texts)?;

    let mut ids = Vec::new();
    let mut rows = Vec::new();
    for (row, id) in documents.keys().enumerate() {
        let entries = match full.row(row) {
            Some(entries) if !entries.is_empty() => entries,
            _ => continue,
        };
        ids.push(id.to_string());
        rows.push(
            entries
                .indices
                .iter()
                .copied()
                .zip(entries.values.iter().copied())
                .collect::<Vec<(u32, f32)>>(),
        );
    }

    let mapping = IdMapping::from_ordered_ids(ids)?;
    let matrix = CsrMatrix::from_rows(vectorizer.vocabulary_len(), rows)?;

    info!(
        "Built content matrix: {} products x {} terms",
        matrix.rows(),
        matrix.cols()
    );

    Ok((mapping, matrix))
}
