use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use ryoshu_core::IntegrationPolicy;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_date_kanji,
    r"([0-9]{4})[年/\-]([0-9]{1,2})[月/\-]([0-9]{1,2})日?");
re!(re_date_numeric,
    r"([0-9]{4}|[0-9]{2})[/\-]([0-9]{1,2})[/\-]([0-9]{1,2})");

re!(re_amount_total,
    r"(?:合計|総計|お買上計)[\s:：]*[¥￥]?\s*([0-9,，]+)");
re!(re_amount_currency,
    r"[¥￥]\s*([0-9,，]+)");

// ── Matcher strategies ───────────────────────────────────────────────────────

/// One way of finding a field in raw OCR text.
pub trait FieldMatcher<T>: Send + Sync {
    fn find(&self, text: &str) -> Option<T>;
}

/// Takes the first non-blank line as the store name.
pub struct FirstLine;

impl FieldMatcher<String> for FirstLine {
    fn find(&self, text: &str) -> Option<String> {
        text.lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
    }
}

/// A date regex whose capture groups 1–3 are year, month and day.
pub struct DatePattern {
    regex: Regex,
}

impl DatePattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self { regex: Regex::new(pattern)? })
    }

    /// `2024年3月5日`, `2024/3/5`, `2024-03-05`.
    pub fn kanji() -> Self {
        Self { regex: re_date_kanji().clone() }
    }

    /// `2024/3/5`, `24-3-5`.
    pub fn numeric() -> Self {
        Self { regex: re_date_numeric().clone() }
    }
}

impl FieldMatcher<NaiveDate> for DatePattern {
    /// The first hit that is a real calendar date, so numbers shaped like
    /// dates (`0120-12-3456`) do not hide the date after them.
    fn find(&self, text: &str) -> Option<NaiveDate> {
        self.regex.captures_iter(text).find_map(|c| {
            let year = c.get(1)?.as_str();
            let year: i32 = if year.len() == 2 {
                format!("20{year}").parse().ok()?
            } else {
                year.parse().ok()?
            };
            let month: u32 = c.get(2)?.as_str().parse().ok()?;
            let day: u32 = c.get(3)?.as_str().parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
    }
}

/// An amount regex whose capture group 1 is the number, possibly with
/// ASCII or full-width thousands separators.
pub struct AmountPattern {
    regex: Regex,
    accept_zero: bool,
}

impl AmountPattern {
    pub fn new(pattern: &str, accept_zero: bool) -> Result<Self, regex::Error> {
        Ok(Self { regex: Regex::new(pattern)?, accept_zero })
    }

    /// `合計 ¥1,200`, `総計：3,300`, `お買上計 ￥540`.
    pub fn labeled_total(accept_zero: bool) -> Self {
        Self { regex: re_amount_total().clone(), accept_zero }
    }

    /// Any `¥`/`￥`-prefixed number.
    pub fn currency(accept_zero: bool) -> Self {
        Self { regex: re_amount_currency().clone(), accept_zero }
    }
}

impl FieldMatcher<i64> for AmountPattern {
    fn find(&self, text: &str) -> Option<i64> {
        let c = self.regex.captures(text)?;
        let amount = parse_yen(c.get(1)?.as_str())?;
        if amount == 0 && !self.accept_zero {
            return None;
        }
        Some(amount)
    }
}

// ── Extraction ───────────────────────────────────────────────────────────────

/// Structured fields found in a single transcription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub store_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub amount: Option<i64>,
}

impl ExtractedFields {
    /// The date in its canonical `YYYY-MM-DD` form.
    pub fn date_string(&self) -> Option<String> {
        self.date.map(|d| d.format("%Y-%m-%d").to_string())
    }
}

/// Ordered matcher chains per field. The first matcher that yields a value
/// wins.
pub struct FieldExtractor {
    store_name: Vec<Box<dyn FieldMatcher<String>>>,
    date: Vec<Box<dyn FieldMatcher<NaiveDate>>>,
    amount: Vec<Box<dyn FieldMatcher<i64>>>,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::from_policy(&IntegrationPolicy::default())
    }
}

impl FieldExtractor {
    pub fn from_policy(policy: &IntegrationPolicy) -> Self {
        let zero = policy.accept_zero_amount;
        Self {
            store_name: vec![Box::new(FirstLine)],
            date: vec![Box::new(DatePattern::kanji()), Box::new(DatePattern::numeric())],
            amount: vec![
                Box::new(AmountPattern::labeled_total(zero)),
                Box::new(AmountPattern::currency(zero)),
            ],
        }
    }

    /// An extractor with no matchers; build it up with the `push_*` methods.
    pub fn empty() -> Self {
        Self { store_name: vec![], date: vec![], amount: vec![] }
    }

    pub fn push_store_name(mut self, m: impl FieldMatcher<String> + 'static) -> Self {
        self.store_name.push(Box::new(m));
        self
    }

    pub fn push_date(mut self, m: impl FieldMatcher<NaiveDate> + 'static) -> Self {
        self.date.push(Box::new(m));
        self
    }

    pub fn push_amount(mut self, m: impl FieldMatcher<i64> + 'static) -> Self {
        self.amount.push(Box::new(m));
        self
    }

    pub fn extract(&self, text: &str) -> ExtractedFields {
        ExtractedFields {
            store_name: first_match(&self.store_name, text),
            date: first_match(&self.date, text),
            amount: first_match(&self.amount, text),
        }
    }
}

fn first_match<T>(chain: &[Box<dyn FieldMatcher<T>>], text: &str) -> Option<T> {
    chain.iter().find_map(|m| m.find(text))
}

// ── Amount parsing ────────────────────────────────────────────────────────────

fn parse_yen(s: &str) -> Option<i64> {
    let clean: String = s.chars().filter(|c| *c != ',' && *c != '，').collect();
    clean.parse().ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
