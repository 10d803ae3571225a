use crate::data::models::WordRecord;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Arabic harakat, tatweel and the zero-width non-joiner.
    static ref MARKS_RE: Regex = Regex::new(r"[\u{064B}-\u{0652}\u{0670}\u{0640}\u{200C}]").unwrap();
    static ref PUNCTUATION_RE: Regex = Regex::new(r"[.,;:!?«»،؛؟()\[\]\x22']").unwrap();
    static ref SPACES_RE: Regex = Regex::new(r"\s+").unwrap();
}

const MATCH_THRESHOLD: f32 = 0.8;

pub struct VocabularySearch;

impl VocabularySearch {
    /// Words whose term, meaning or example resemble `query`, best first.
    pub fn search(query: &str, words: Vec<WordRecord>) -> Vec<(WordRecord, f32)> {
        let needle = Self::normalize(query);
        if needle.is_empty() {
            return words.into_iter().map(|w| (w, 1.0)).collect();
        }

        let mut results: Vec<(WordRecord, f32)> = words
            .into_iter()
            .filter_map(|word| {
                let mut fields = vec![Self::normalize(&word.word), Self::normalize(&word.meaning)];
                if let Some(example) = &word.example {
                    fields.push(Self::normalize(example));
                }
                let score = fields
                    .iter()
                    .map(|field| Self::field_score(&needle, field))
                    .fold(0.0, f32::max);
                (score > MATCH_THRESHOLD).then_some((word, score))
            })
            .collect();

        results.sort_by(|a, b| b.1.total_cmp(&a.1));
        results
    }

    /// Folds the spellings a Persian keyboard and an Arabic one disagree
    /// on, so "كتاب" finds "کتاب".
    pub fn normalize(text: &str) -> String {
        let folded: String = text
            .chars()
            .map(|c| match c {
                'ي' | 'ى' => 'ی',
                'ك' => 'ک',
                'ة' => 'ه',
                'أ' | 'إ' | 'ٱ' => 'ا',
                '۰'..='۹' => char::from_u32(c as u32 - '۰' as u32 + '0' as u32).unwrap_or(c),
                other => other,
            })
            .collect::<String>()
            .to_lowercase();
        let stripped = MARKS_RE.replace_all(&folded, "");
        let stripped = PUNCTUATION_RE.replace_all(&stripped, " ");
        SPACES_RE.replace_all(stripped.trim(), " ").into_owned()
    }

    /// A phrase matches if any of its words does.
    fn field_score(needle: &str, field: &str) -> f32 {
        let whole = Self::similarity(needle, field);
        field
            .split(' ')
            .map(|token| Self::similarity(needle, token))
            .fold(whole, f32::max)
    }

    fn similarity(a: &str, b: &str) -> f32 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        if a == b {
            return 1.0;
        }

        let (a_len, b_len) = (a.chars().count() as f32, b.chars().count() as f32);

        if b.contains(a) {
            return 0.6 + (a_len / b_len) * 0.4;
        }

        if a.contains(b) {
            return 0.5 + (b_len / a_len) * 0.3;
        }

        let jaro_winkler = strsim::jaro_winkler(a, b) as f32;
        if jaro_winkler > 0.85 {
            return jaro_winkler;
        }

        let len_sim = 1.0 - (a_len - b_len).abs() / (a_len + b_len);
        len_sim * 0.3
    }
}
