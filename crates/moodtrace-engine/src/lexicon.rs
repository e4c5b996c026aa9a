//! Word-list sentiment scorer (always-available baseline)
//!
//! Deterministic and dependency-free at runtime: no I/O, never fails once
//! constructed. Used as the fusion baseline and as the fallback whenever
//! every external strategy is absent.

use crate::config::LexiconConfig;
use aho_corasick::{AhoCorasick, MatchKind};
use moodtrace_core::{Result, Sentiment};
use regex::Regex;
use std::collections::HashSet;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "amazing", "wonderful", "fantastic", "awesome", "love",
    "loved", "loving", "like", "liked", "happy", "glad", "pleased", "delighted", "perfect",
    "best", "better", "nice", "brilliant", "superb", "outstanding", "helpful", "thanks",
    "thank", "grateful", "appreciate", "appreciated", "beautiful", "enjoy", "enjoyed",
    "enjoying", "fun", "cool", "impressive", "incredible", "exciting", "excited", "satisfied",
    "satisfying", "solved", "fixed", "resolved", "success", "successful", "easy", "smooth",
    "clear", "useful", "valuable", "recommend", "positive", "correct", "pleasant", "kind",
    "friendly", "terrific", "fabulous", "lovely", "marvelous", "neat", "super", "stellar",
    "spectacular", "phenomenal", "remarkable", "glorious", "joy", "joyful", "cheerful",
    "thrilled", "ecstatic", "elated", "relieved", "comfortable", "confident", "hopeful",
    "optimistic", "win", "winning", "progress", "improved", "improvement", "favorite",
    "reliable", "efficient", "elegant", "intuitive", "handy", "thoughtful", "generous", "yay",
    "congratulations", "congrats", "bravo", "proud", "magnificent", "exceptional", "ideal",
    "adore", "delightful",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "hate", "hated", "hating", "worst", "worse",
    "poor", "sad", "angry", "mad", "upset", "annoyed", "annoying", "frustrated", "frustrating",
    "frustration", "disappointed", "disappointing", "disappointment", "broken", "fail",
    "failed", "failing", "failure", "fails", "error", "errors", "bug", "buggy", "crash",
    "crashed", "crashes", "wrong", "useless", "waste", "wasted", "stupid", "ridiculous",
    "pathetic", "nasty", "ugly", "painful", "pain", "hurt", "hurts", "unfortunately",
    "problem", "problems", "trouble", "difficult", "confusing", "confused", "lost", "stuck",
    "unhappy", "miserable", "depressed", "depressing", "worried", "anxious", "scared",
    "afraid", "dreadful", "disgusting", "gross", "lame", "sucks", "sucked", "garbage",
    "trash", "junk", "mess", "messy", "hopeless", "helpless", "unacceptable", "outrageous",
    "furious", "irritated", "irritating", "tired", "sick", "boring", "bored", "blame",
    "complaint", "regret", "lousy", "mediocre", "flawed", "incorrect", "impossible", "crap",
    "rubbish", "disaster", "nightmare",
];

const EXCITED_WORDS: &[&str] = &[
    "wow", "omg", "yay", "amazing", "awesome", "incredible", "excited", "exciting",
    "thrilled", "ecstatic", "furious", "outraged", "urgent", "asap", "immediately", "hurry",
    "insane", "unbelievable", "love", "hate",
];

const DOMINANT_WORDS: &[&str] = &[
    "must", "need", "demand", "demands", "require", "required", "insist", "expect", "want",
    "fix", "stop", "now", "immediately", "asap", "give", "tell", "make", "should", "do",
    "change", "cancel", "refund",
];

const FRUSTRATION_CUE_WORDS: &[&str] = &[
    "frustrated", "frustrating", "annoying", "annoyed", "again", "still", "seriously",
    "ridiculous", "useless", "broken", "ugh", "argh", "unacceptable", "furious",
];

const FRUSTRATION_CUE_PHRASES: &[&str] = &[
    "not working",
    "doesn't work",
    "does not work",
    "fed up",
    "sick of",
    "waste of time",
    "give up",
];

const CONFUSION_CUE_WORDS: &[&str] = &[
    "confused", "confusing", "unclear", "lost", "puzzled", "baffled", "huh",
];

const CONFUSION_CUE_PHRASES: &[&str] = &[
    "don't understand",
    "do not understand",
    "not sure",
    "what do you mean",
    "makes no sense",
    "doesn't make sense",
    "how do i",
];

/// Raw output of the lexicon scorer
#[derive(Debug, Clone, PartialEq)]
pub struct LexiconScore {
    pub valence: f64,
    pub arousal: f64,
    pub dominance: f64,
    pub confidence: f64,
    pub primary_emotion: &'static str,

    /// Positive plus negative word hits
    pub matched: usize,

    pub total_tokens: usize,
}

impl LexiconScore {
    /// Convert into a [`Sentiment`] tagged with its provenance
    pub fn to_sentiment(&self) -> Sentiment {
        Sentiment::new(
            self.valence,
            self.arousal,
            self.dominance,
            self.confidence,
            self.primary_emotion,
        )
        .with_label("lexicon")
        .with_label(format!("lexicon_hits={}", self.matched))
    }
}

/// Lexicon-based valence/arousal/dominance scorer
pub struct LexiconScorer {
    tokenizer: Regex,
    positive: HashSet<String>,
    negative: HashSet<String>,
    excited: HashSet<&'static str>,
    dominant: HashSet<&'static str>,
    frustration_cues: HashSet<&'static str>,
    confusion_cues: HashSet<&'static str>,
    frustration_phrases: AhoCorasick,
    confusion_phrases: AhoCorasick,
}

impl LexiconScorer {
    pub fn new() -> Result<Self> {
        Self::with_config(&LexiconConfig::default())
    }

    /// Build a scorer, extending the built-in word sets from configuration
    pub fn with_config(config: &LexiconConfig) -> Result<Self> {
        let tokenizer = Regex::new(r"[\w']+").map_err(|e| {
            moodtrace_core::Error::internal(format!("Failed to build lexicon tokenizer: {e}"))
        })?;

        let positive = POSITIVE_WORDS
            .iter()
            .map(|w| w.to_string())
            .chain(config.extra_positive.iter().map(|w| w.to_lowercase()))
            .collect();
        let negative = NEGATIVE_WORDS
            .iter()
            .map(|w| w.to_string())
            .chain(config.extra_negative.iter().map(|w| w.to_lowercase()))
            .collect();

        Ok(Self {
            tokenizer,
            positive,
            negative,
            excited: EXCITED_WORDS.iter().copied().collect(),
            dominant: DOMINANT_WORDS.iter().copied().collect(),
            frustration_cues: FRUSTRATION_CUE_WORDS.iter().copied().collect(),
            confusion_cues: CONFUSION_CUE_WORDS.iter().copied().collect(),
            frustration_phrases: build_phrase_matcher(FRUSTRATION_CUE_PHRASES, "frustration")?,
            confusion_phrases: build_phrase_matcher(CONFUSION_CUE_PHRASES, "confusion")?,
        })
    }

    /// Lowercased word tokens of `text`
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokenizer
            .find_iter(text)
            .map(|m| m.as_str().trim_matches('\'').to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Score `text`. Identical input always yields identical output.
    pub fn score(&self, text: &str) -> LexiconScore {
        let tokens = self.tokenize(text);
        let total = tokens.len().max(1) as f64;

        let mut pos = 0usize;
        let mut neg = 0usize;
        let mut excited = 0usize;
        let mut dominant = 0usize;
        let mut frustration_cue = false;
        let mut confusion_cue = false;

        for token in &tokens {
            let token = token.as_str();
            if self.positive.contains(token) {
                pos += 1;
            }
            if self.negative.contains(token) {
                neg += 1;
            }
            if self.excited.contains(token) {
                excited += 1;
            }
            if self.dominant.contains(token) {
                dominant += 1;
            }
            frustration_cue |= self.frustration_cues.contains(token);
            confusion_cue |= self.confusion_cues.contains(token);
        }
        frustration_cue |= contains_phrase(&self.frustration_phrases, text);
        confusion_cue |= contains_phrase(&self.confusion_phrases, text);

        let exclamations = text.chars().filter(|&c| c == '!').count();

        let valence = ((pos as f64 - neg as f64) / total * 3.0).clamp(-1.0, 1.0);
        let arousal =
            ((excited as f64 * 0.5 + exclamations as f64 * 0.1) / total * 5.0).clamp(0.0, 1.0);
        let dominance = (dominant as f64 / total * 5.0).clamp(0.0, 1.0);

        let matched = pos + neg;
        let confidence = if matched == 0 {
            0.15
        } else {
            (matched as f64 / 3.0).max(0.3).min(1.0)
        };

        let primary_emotion = if valence <= -0.25 && frustration_cue {
            "frustrated"
        } else if valence <= -0.25 && confusion_cue {
            "confused"
        } else if valence >= 0.25 {
            "happy"
        } else if valence <= -0.25 {
            "sad"
        } else if dominance > 0.4 {
            "assertive"
        } else {
            "neutral"
        };

        LexiconScore {
            valence,
            arousal,
            dominance,
            confidence,
            primary_emotion,
            matched,
            total_tokens: tokens.len(),
        }
    }
}

fn build_phrase_matcher(phrases: &[&str], kind: &str) -> Result<AhoCorasick> {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::Standard)
        .build(phrases)
        .map_err(|e| {
            moodtrace_core::Error::internal(format!("Failed to build {kind} cue matcher: {e}"))
        })
}

/// True when a phrase occurs in `text` as whole words
fn contains_phrase(matcher: &AhoCorasick, text: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    matcher.find_overlapping_iter(text).any(|m| {
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}
