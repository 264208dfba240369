//! Lexicon-based polarity scoring for English and Portuguese reviews.
//!
//! Text is lowercased, accent-folded ("ótima" → "otima") and split into
//! clauses at punctuation. Each word is looked up first as a whole word,
//! then by the longest matching stem, so inflections such as "funciona",
//! "funcionou", "recommended" or "perfectly" resolve to one entry.
//!
//! Within a clause, a directly preceding intensifier scales a word, and a
//! negator among the three preceding tokens flips and dampens it. Negation
//! never crosses a clause boundary. The text's polarity is the mean
//! contribution, always within [-1, 1]; texts without any lexicon word score
//! 0.0.

use std::collections::HashMap;

use once_cell::sync::Lazy;

const NEGATION_FACTOR: f64 = -0.5;
const NEGATION_WINDOW: usize = 3;

/// Whole words, matched exactly. Short or ambiguous forms live here so they
/// do not act as prefixes of unrelated words.
static WORDS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        // English
        ("best", 1.0),
        ("good", 0.7),
        ("nice", 0.6),
        ("fine", 0.4),
        ("well", 0.3),
        ("worth", 0.3),
        ("fast", 0.2),
        ("pleased", 0.6),
        ("glad", 0.5),
        ("bad", -0.7),
        ("badly", -0.6),
        ("hate", -0.8),
        ("hated", -0.8),
        ("hates", -0.8),
        ("died", -0.6),
        ("dead", -0.6),
        ("fake", -0.5),
        ("wrong", -0.5),
        ("poor", -0.4),
        ("poorly", -0.5),
        ("slow", -0.3),
        ("cheap", -0.2),
        ("cheaply", -0.4),
        ("stopped", -0.4),
        // Portuguese
        ("bom", 0.7),
        ("boa", 0.7),
        ("bons", 0.7),
        ("boas", 0.7),
        ("bem", 0.4),
        ("amei", 0.8),
        ("amo", 0.7),
        ("top", 0.6),
        ("show", 0.5),
        ("legal", 0.5),
        ("vale", 0.4),
        ("melhor", 0.7),
        ("feliz", 0.7),
        ("certinho", 0.4),
        ("ruim", -0.7),
        ("ruins", -0.7),
        ("pior", -0.8),
        ("mal", -0.4),
        ("lixo", -0.8),
        ("odiei", -0.8),
        ("caro", -0.3),
        ("lento", -0.3),
        ("lenta", -0.3),
        ("parou", -0.4),
    ]
    .into_iter()
    .collect()
});

/// Stems, matched as word prefixes; the longest matching stem wins.
static STEMS: Lazy<Vec<(&'static str, f64)>> = Lazy::new(|| {
    let mut stems = vec![
        // English
        ("excellen", 1.0),
        ("wonderful", 1.0),
        ("perfect", 1.0),
        ("awesome", 1.0),
        ("superb", 1.0),
        ("outstanding", 1.0),
        ("beautif", 0.85),
        ("great", 0.8),
        ("fantastic", 0.8),
        ("impress", 0.8),
        ("happy", 0.8),
        ("happi", 0.8),
        ("amaz", 0.6),
        ("love", 0.6),
        ("recommend", 0.5),
        ("satisf", 0.5),
        ("reliab", 0.5),
        ("comfort", 0.5),
        ("sturd", 0.5),
        ("enjoy", 0.5),
        ("durab", 0.4),
        ("exceed", 0.4),
        ("easi", 0.43),
        ("easy", 0.43),
        ("solid", 0.3),
        ("work", 0.3),
        ("terrib", -1.0),
        ("awful", -1.0),
        ("horrib", -1.0),
        ("worst", -1.0),
        ("garbage", -0.8),
        ("scam", -0.8),
        ("worse", -0.7),
        ("disappoint", -0.7),
        ("unusable", -0.7),
        ("worthless", -0.7),
        ("dissatisf", -0.6),
        ("unsatisf", -0.6),
        ("regret", -0.6),
        ("defect", -0.6),
        ("fault", -0.6),
        ("junk", -0.6),
        ("damag", -0.6),
        ("annoy", -0.6),
        ("useless", -0.5),
        ("flims", -0.5),
        ("broke", -0.5),
        ("fail", -0.5),
        ("waste", -0.5),
        ("mislead", -0.5),
        ("crack", -0.4),
        ("leak", -0.4),
        ("problem", -0.3),
        ("nois", -0.3),
        ("refund", -0.3),
        // Portuguese (accent-folded)
        ("excelent", 1.0),
        ("perfeit", 1.0),
        ("maravilh", 1.0),
        ("sensaciona", 0.9),
        ("incrive", 0.9),
        ("otim", 0.8),
        ("ador", 0.8),
        ("lind", 0.8),
        ("encant", 0.7),
        ("gost", 0.6),
        ("bonit", 0.6),
        ("recomend", 0.6),
        ("satisfeit", 0.6),
        ("confortav", 0.5),
        ("eficien", 0.5),
        ("resistent", 0.4),
        ("facil", 0.4),
        ("rapid", 0.3),
        ("funcion", 0.3),
        ("pessim", -1.0),
        ("horrive", -1.0),
        ("terrive", -1.0),
        ("decepcion", -0.75),
        ("decepca", -0.7),
        ("arrepend", -0.7),
        ("insatisfeit", -0.6),
        ("infeliz", -0.6),
        ("defeit", -0.6),
        ("estrag", -0.6),
        ("danific", -0.6),
        ("falsific", -0.6),
        ("quebr", -0.5),
        ("falh", -0.5),
        ("errad", -0.5),
        ("engan", -0.5),
        ("fragil", -0.4),
        ("devolv", -0.4),
        ("devoluc", -0.4),
        ("reclam", -0.4),
        ("frac", -0.4),
        ("demor", -0.3),
        ("barulh", -0.3),
    ];
    stems.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    stems
});

static INTENSIFIERS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        ("extremely", 1.5),
        ("incredibly", 1.5),
        ("absolutely", 1.4),
        ("completely", 1.4),
        ("totally", 1.4),
        ("highly", 1.3),
        ("very", 1.3),
        ("really", 1.3),
        ("super", 1.3),
        ("so", 1.2),
        ("too", 1.2),
        ("extremamente", 1.5),
        ("absolutamente", 1.4),
        ("completamente", 1.4),
        ("totalmente", 1.4),
        ("muito", 1.3),
        ("muita", 1.3),
        ("realmente", 1.3),
        ("bastante", 1.2),
        ("bem", 1.2),
        ("tao", 1.2),
    ]
    .into_iter()
    .collect()
});

/// "stopped" and "parou" negate the verb that follows ("parou de funcionar").
const NEGATORS: &[&str] = &[
    "not", "no", "never", "nothing", "without", "nor", "hardly", "stopped", "nao", "nunca", "nem",
    "jamais", "sem", "nenhum", "nenhuma", "parou", "deixou",
];

/// Scores free text on a negative-to-positive scale.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolarityScorer;

impl PolarityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Polarity of `text` in [-1, 1]; 0.0 when nothing in the text carries
    /// sentiment.
    pub fn polarity(&self, text: &str) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;

        for clause in clauses(text) {
            for (i, token) in clause.iter().enumerate() {
                if modifies_next(&clause, i) {
                    continue;
                }
                let Some(base) = word_polarity(token) else {
                    continue;
                };
                let mut value = base;

                if let Some(factor) = i
                    .checked_sub(1)
                    .and_then(|prev| INTENSIFIERS.get(clause[prev].as_str()))
                {
                    value = (value * factor).clamp(-1.0, 1.0);
                }

                let window = &clause[i.saturating_sub(NEGATION_WINDOW)..i];
                if window.iter().any(|t| is_negator(t)) {
                    value *= NEGATION_FACTOR;
                }

                sum += value;
                count += 1;
            }
        }

        if count == 0 {
            0.0
        } else {
            (sum / count as f64).clamp(-1.0, 1.0)
        }
    }
}

/// Polarity of a single folded token, by whole word then by longest stem.
fn word_polarity(token: &str) -> Option<f64> {
    if let Some(&value) = WORDS.get(token) {
        return Some(value);
    }
    STEMS
        .iter()
        .find(|(stem, _)| token.starts_with(stem))
        .map(|&(_, value)| value)
}

/// An intensifier directly in front of a sentiment word only scales it
/// ("muito bem"); on its own it may still carry sentiment ("funciona bem").
fn modifies_next(clause: &[String], i: usize) -> bool {
    INTENSIFIERS.contains_key(clause[i].as_str())
        && clause
            .get(i + 1)
            .is_some_and(|next| word_polarity(next).is_some())
}

fn is_negator(token: &str) -> bool {
    NEGATORS.contains(&token) || token.ends_with("n't")
}

fn clauses(text: &str) -> Vec<Vec<String>> {
    text.split(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '\n'))
        .map(tokenize)
        .filter(|tokens| !tokens.is_empty())
        .collect()
}

/// Lowercase, accent-folded word tokens; apostrophes are kept inside words
/// ("don't").
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphabetic() || c == '\'' || c == '\u{2019}'))
        .map(|w| w.trim_matches(|c| c == '\'' || c == '\u{2019}'))
        .filter(|w| !w.is_empty())
        .map(|w| {
            w.to_lowercase()
                .chars()
                .map(|c| if c == '\u{2019}' { '\'' } else { fold_accent(c) })
                .collect()
        })
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        other => other,
    }
}
