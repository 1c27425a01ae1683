use ryoshu_core::{IntegrationPolicy, OcrResult};

/// Hiragana, katakana, CJK unified ideographs and full-width forms.
pub fn is_japanese(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309F}'
        | '\u{30A0}'..='\u{30FF}'
        | '\u{4E00}'..='\u{9FAF}'
        | '\u{FF00}'..='\u{FFEF}')
}

/// Share of characters in `text` that are Japanese script, 0.0 for empty text.
pub fn japanese_ratio(text: &str) -> f64 {
    let (total, japanese) = text
        .chars()
        .fold((0usize, 0usize), |(t, j), c| (t + 1, j + usize::from(is_japanese(c))));
    if total == 0 {
        0.0
    } else {
        japanese as f64 / total as f64
    }
}

/// Plausibility score for a single transcription, capped at
/// `policy.max_confidence`.
pub fn evaluate_confidence(result: &OcrResult, policy: &IntegrationPolicy) -> f64 {
    let mut score = result.confidence;
    let len = result.text.chars().count();

    if policy.is_trusted(&result.source) {
        score *= policy.trusted_source_bonus;
    }
    if len < policy.short_text_len {
        score *= policy.short_text_penalty;
    }
    if len > policy.long_text_len {
        score *= policy.long_text_penalty;
    }
    if japanese_ratio(&result.text) > policy.japanese_ratio_threshold {
        score *= policy.japanese_bonus;
    }

    score.min(policy.max_confidence)
}
