use ryoshu_core::{FieldConfidence, IntegratedFields, IntegrationPolicy, OcrResult, OcrSource};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::FieldExtractor;
use crate::normalize::{StoreNameNormalizer, SuffixStrippingNormalizer};
use crate::score;

/// Evaluated confidence of one input transcription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredResult {
    pub source: OcrSource,
    pub evaluated_confidence: f64,
}

/// Everything the classifier needs about one receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptScan {
    pub text: String,
    pub fields: IntegratedFields,
    pub scores: Vec<ScoredResult>,
    pub needs_review: bool,
}

/// Reconciles several OCR transcriptions of the same receipt.
///
/// Holds no per-call state: every method works only on its arguments, so one
/// integrator can be shared across threads.
pub struct Integrator {
    policy: IntegrationPolicy,
    extractor: FieldExtractor,
    normalizer: Box<dyn StoreNameNormalizer>,
}

impl Default for Integrator {
    fn default() -> Self {
        Self::new(IntegrationPolicy::default())
    }
}

impl Integrator {
    pub fn new(policy: IntegrationPolicy) -> Self {
        let extractor = FieldExtractor::from_policy(&policy);
        let normalizer = SuffixStrippingNormalizer::new(policy.corporate_suffixes.clone());
        Self { policy, extractor, normalizer: Box::new(normalizer) }
    }

    pub fn with_extractor(mut self, extractor: FieldExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_normalizer(mut self, normalizer: impl StoreNameNormalizer + 'static) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    pub fn policy(&self) -> &IntegrationPolicy {
        &self.policy
    }

    pub fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }

    // ── Full text ─────────────────────────────────────────────────────────────

    /// Pick the single transcription with the highest source-weighted
    /// confidence. Texts are never merged; on ties the earliest result wins.
    /// Results with a non-finite confidence only win when no other result
    /// can be scored.
    pub fn integrate_results(&self, results: &[OcrResult]) -> String {
        let first = match results {
            [] => return String::new(),
            [only] => return only.text.clone(),
            [first, ..] => first,
        };

        let mut best: Option<(&OcrResult, f64)> = None;
        for r in results {
            let s = self.selection_score(r);
            if !s.is_finite() {
                continue;
            }
            if best.map_or(true, |(_, b)| s > b) {
                best = Some((r, s));
            }
        }

        match best {
            Some((r, score)) => {
                debug!(source = %r.source, score, candidates = results.len(), "selected full text");
                r.text.clone()
            }
            None => first.text.clone(),
        }
    }

    fn selection_score(&self, result: &OcrResult) -> f64 {
        let weight = if self.policy.is_trusted(&result.source) {
            self.policy.selection_weight
        } else {
            1.0
        };
        result.confidence * weight
    }

    // ── Structured fields ─────────────────────────────────────────────────────

    /// Vote on store name, date and amount across all transcriptions.
    ///
    /// Candidates are grouped by normalized value; each group's confidence is
    /// the sum of its sources' raw confidences, boosted when more than one
    /// distinct source agrees. A field nobody found comes back empty with zero
    /// confidence. Results with a non-finite confidence do not vote.
    pub fn integrate_fields(&self, results: &[OcrResult]) -> IntegratedFields {
        let mut store_names: Tally<String> = Tally::default();
        let mut dates: Tally<String> = Tally::default();
        let mut amounts: Tally<i64> = Tally::default();

        for r in results.iter().filter(|r| r.confidence.is_finite()) {
            let extracted = self.extractor.extract(&r.text);

            if let Some(date) = extracted.date_string() {
                dates.add(date.clone(), date, r.confidence, &r.source);
            }
            if let Some(name) = extracted.store_name {
                let key = self.normalizer.normalize(&name);
                store_names.add(key, name, r.confidence, &r.source);
            }
            if let Some(amount) = extracted.amount {
                amounts.add(amount, amount.to_string(), r.confidence, &r.source);
            }
        }

        let bonus = self.policy.corroboration_bonus;
        IntegratedFields {
            store_name: store_names.best("store_name", bonus),
            date: dates.best("date", bonus),
            amount: amounts.best("amount", bonus),
        }
    }

    // ── Per-result scoring ────────────────────────────────────────────────────

    pub fn evaluate_confidence(&self, result: &OcrResult) -> f64 {
        score::evaluate_confidence(result, &self.policy)
    }

    /// `evaluate_confidence` for every result, in input order.
    pub fn score_all(&self, results: &[OcrResult]) -> Vec<ScoredResult> {
        results
            .iter()
            .map(|r| ScoredResult {
                source: r.source.clone(),
                evaluated_confidence: self.evaluate_confidence(r),
            })
            .collect()
    }

    /// Full text, fields and per-result scores in one pass.
    pub fn scan(&self, results: &[OcrResult]) -> ReceiptScan {
        let fields = self.integrate_fields(results);
        let needs_review = fields.needs_review(self.policy.review_threshold);
        ReceiptScan {
            text: self.integrate_results(results),
            fields,
            scores: self.score_all(results),
            needs_review,
        }
    }
}

// ── Voting ────────────────────────────────────────────────────────────────────

/// Candidates for one field, keyed by normalized value in first-seen order.
struct Tally<K> {
    entries: Vec<(K, FieldConfidence)>,
}

impl<K> Default for Tally<K> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<K: PartialEq> Tally<K> {
    fn add(&mut self, key: K, value: String, confidence: f64, source: &OcrSource) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, field)) => field.corroborate(confidence, source),
            None => self
                .entries
                .push((key, FieldConfidence::new(value, confidence, source.clone()))),
        }
    }

    /// Highest adjusted confidence wins; the winner carries that adjusted
    /// confidence. Ties go to the first candidate seen.
    fn best(self, field: &str, bonus: f64) -> FieldConfidence {
        let mut best: Option<FieldConfidence> = None;
        for (_, mut candidate) in self.entries {
            if candidate.is_corroborated() {
                candidate.confidence *= bonus;
            }
            debug!(
                field,
                value = %candidate.value,
                confidence = candidate.confidence,
                sources = candidate.sources.len(),
                "field candidate"
            );
            if best.as_ref().map_or(true, |b| candidate.confidence > b.confidence) {
                best = Some(candidate);
            }
        }
        best.unwrap_or_else(FieldConfidence::absent)
    }
}
