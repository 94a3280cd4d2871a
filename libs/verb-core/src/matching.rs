//! Answer matching: translation checks, the verb-usage heuristic and the
//! word-overlap scorer used when no AI grading is available.

use std::collections::HashSet;

use crate::types::{EvaluationResult, EvaluationSource, ScoreBand, SentenceUsage};

const BASIC_FEEDBACK_DETAIL: &str = "Basic word matching analysis performed.";
const BASIC_SUGGESTIONS: &str =
    "Compare your words with the target sentence one by one and try again.";

/// Check a typed translation against the canonical one.
///
/// Both sides are trimmed and lower-cased. Inner runs of whitespace are
/// also collapsed, so "to  go" is accepted as a typing slip. A leading "to "
/// is ignored on either side, so "go" matches "to go".
pub fn check_translation(user_input: &str, correct_translation: &str) -> bool {
    let typed = normalize(user_input);
    let correct = normalize(correct_translation);

    typed == correct || strip_infinitive_marker(&typed) == strip_infinitive_marker(&correct)
}

fn normalize(s: &str) -> String {
    normalize_whitespace(s).to_lowercase()
}

/// Normalize whitespace in a string (trim and collapse multiple spaces).
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_infinitive_marker(s: &str) -> &str {
    s.strip_prefix("to ").unwrap_or(s)
}

/// Check whether a sentence uses the verb and looks plausibly conjugated.
///
/// Presence is a case-insensitive substring test for the verb's bare stem
/// (the infinitive without its "-en"/"-n" ending), so "Ich gehe" counts as
/// using "gehen". Conjugation is checked against [`conjugation_candidates`].
/// Both answers are soft: strong verbs ("sehen" -> "sieht") are missed and
/// unrelated words can match.
pub fn check_sentence_usage(sentence: &str, verb: &str) -> SentenceUsage {
    let sentence = sentence.to_lowercase();
    let verb = verb.trim().to_lowercase();

    let stem = verb_stem(&verb);
    if stem.is_empty() || !sentence.contains(stem) {
        return SentenceUsage {
            verb_present: false,
            plausible_conjugation: false,
        };
    }

    let plausible_conjugation = conjugation_candidates(&verb)
        .iter()
        .any(|form| sentence.contains(form.as_str()));

    SentenceUsage {
        verb_present: true,
        plausible_conjugation,
    }
}

fn verb_stem(verb: &str) -> &str {
    verb.strip_suffix("en")
        .or_else(|| verb.strip_suffix('n'))
        .filter(|stem| !stem.is_empty())
        .unwrap_or(verb)
}

/// Naive surface forms of an infinitive: the infinitive itself, the last two
/// characters replaced by "e", "st" or "t", and the last character dropped.
///
/// Forms are lower-cased and de-duplicated, in that order.
pub fn conjugation_candidates(verb: &str) -> Vec<String> {
    let verb = verb.trim().to_lowercase();
    let chars: Vec<char> = verb.chars().collect();

    let mut forms = vec![verb.clone()];
    if chars.len() > 2 {
        let stem: String = chars[..chars.len() - 2].iter().collect();
        for suffix in ["e", "st", "t"] {
            forms.push(format!("{stem}{suffix}"));
        }
    }
    if chars.len() > 1 {
        forms.push(chars[..chars.len() - 1].iter().collect());
    }

    let mut seen = HashSet::new();
    forms.retain(|form| seen.insert(form.clone()));
    forms
}

/// Score a candidate sentence against a target by word overlap.
///
/// Both strings are lower-cased and split on whitespace; punctuation stays
/// attached to its word. Each target word, in order and including duplicates,
/// is correct if it appears anywhere in the candidate. An empty target scores 0.
pub fn score_basic(target: &str, candidate: &str) -> EvaluationResult {
    let target = target.to_lowercase();
    let candidate = candidate.to_lowercase();
    let candidate_words: HashSet<&str> = candidate.split_whitespace().collect();

    let (words_correct, words_incorrect): (Vec<&str>, Vec<&str>) = target
        .split_whitespace()
        .partition(|word| candidate_words.contains(word));

    let accuracy_percent = accuracy(words_correct.len(), words_correct.len() + words_incorrect.len());

    EvaluationResult {
        score: ScoreBand::from_accuracy(accuracy_percent),
        accuracy_percent,
        words_correct: words_correct.into_iter().map(str::to_string).collect(),
        words_incorrect: words_incorrect.into_iter().map(str::to_string).collect(),
        feedback_summary: format!("You got {accuracy_percent}% of the words right! Keep practicing!"),
        feedback_detail: BASIC_FEEDBACK_DETAIL.to_string(),
        suggestions: BASIC_SUGGESTIONS.to_string(),
        source: EvaluationSource::Basic,
    }
}

fn accuracy(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (correct as f64 * 100.0 / total as f64).round() as u8
}
