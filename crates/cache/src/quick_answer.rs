//! Quick-answer short-circuit in front of the agent.
//!
//! Lookup order for a normalized message:
//!
//! 1. exact match in the canned table
//! 2. exact match in the runtime cache of earlier answers
//! 3. keyword containment
//! 4. loose containment against the canned questions
//!
//! Hits from (3) and (4) are written back to the runtime cache so the next
//! identical message takes the exact-match path.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use sb_domain::config::CacheConfig;
use sb_domain::trace::TraceEvent;

use crate::canned::{CANNED_ANSWERS, GENERAL_QUESTION_KEYWORDS, KEYWORD_ANSWERS};

/// Messages shorter than this (in characters) are never matched as a
/// fragment of a longer canned question.
const MIN_FRAGMENT_CHARS: usize = 5;

/// Canonical form used as the lookup key: trimmed, lower-cased, trailing
/// `?`, `!` and `.` removed.
pub fn normalize(message: &str) -> String {
    message
        .trim()
        .to_lowercase()
        .trim_end_matches(['?', '!', '.'])
        .to_owned()
}

/// Which lookup step produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Canned,
    Cached,
    Keyword,
    Similar,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Canned => "canned",
            Self::Cached => "cached",
            Self::Keyword => "keyword",
            Self::Similar => "similar",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickAnswer {
    pub text: String,
    pub source: AnswerSource,
}

struct RuntimeCache {
    answers: HashMap<String, String>,
    /// Insertion order, oldest first.  Only used when a capacity is set.
    order: VecDeque<String>,
}

pub struct QuickAnswers {
    canned: Vec<(String, String)>,
    canned_index: HashMap<String, usize>,
    keywords: Vec<(String, String)>,
    runtime: Mutex<RuntimeCache>,
    /// `0` means unbounded.
    capacity: usize,
}

impl QuickAnswers {
    /// Build with the built-in tables.
    pub fn new(capacity: usize) -> Self {
        Self::with_tables(
            CANNED_ANSWERS.iter().map(|(q, a)| (q.to_string(), a.to_string())),
            KEYWORD_ANSWERS.iter().map(|(k, a)| (k.to_string(), a.to_string())),
            capacity,
        )
    }

    pub fn from_config(cfg: &CacheConfig) -> Self {
        Self::new(cfg.quick_answer_capacity)
    }

    /// Build with custom tables.  Questions are normalized on the way in.
    pub fn with_tables(
        canned: impl IntoIterator<Item = (String, String)>,
        keywords: impl IntoIterator<Item = (String, String)>,
        capacity: usize,
    ) -> Self {
        let canned: Vec<(String, String)> = canned
            .into_iter()
            .map(|(q, a)| (normalize(&q), a))
            .collect();
        let mut canned_index = HashMap::with_capacity(canned.len());
        for (i, (q, _)) in canned.iter().enumerate() {
            canned_index.entry(q.clone()).or_insert(i);
        }
        Self {
            canned,
            canned_index,
            keywords: keywords.into_iter().collect(),
            runtime: Mutex::new(RuntimeCache {
                answers: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    /// Try to answer `message` without the agent.
    pub fn lookup(&self, message: &str) -> Option<QuickAnswer> {
        let clean = normalize(message);
        if clean.is_empty() {
            return None;
        }

        let answer = self.resolve(&clean)?;
        if matches!(answer.source, AnswerSource::Keyword | AnswerSource::Similar) {
            self.insert(clean.clone(), answer.text.clone());
        }

        tracing::info!(source = answer.source.as_str(), message = %clean, "quick answer");
        TraceEvent::QuickAnswer {
            source: answer.source.as_str().to_owned(),
            normalized: clean,
        }
        .emit();
        Some(answer)
    }

    /// Runtime-cache lookup only (step 2).
    pub fn cached(&self, message: &str) -> Option<String> {
        self.runtime.lock().answers.get(&normalize(message)).cloned()
    }

    /// Remember an answer computed elsewhere (e.g. by the agent).
    pub fn remember(&self, message: &str, answer: &str) {
        let clean = normalize(message);
        if clean.is_empty() {
            return;
        }
        self.insert(clean, answer.to_owned());
    }

    /// Number of runtime-cached answers.
    pub fn len(&self) -> usize {
        self.runtime.lock().answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runtime.lock().answers.is_empty()
    }

    pub fn clear(&self) {
        let mut runtime = self.runtime.lock();
        runtime.answers.clear();
        runtime.order.clear();
    }

    // ── Private helpers ───────────────────────────────────────────────

    fn resolve(&self, clean: &str) -> Option<QuickAnswer> {
        if let Some(&i) = self.canned_index.get(clean) {
            return Some(QuickAnswer {
                text: self.canned[i].1.clone(),
                source: AnswerSource::Canned,
            });
        }

        if let Some(text) = self.runtime.lock().answers.get(clean).cloned() {
            return Some(QuickAnswer {
                text,
                source: AnswerSource::Cached,
            });
        }

        if let Some((_, text)) = self.keywords.iter().find(|(k, _)| clean.contains(k.as_str())) {
            return Some(QuickAnswer {
                text: text.clone(),
                source: AnswerSource::Keyword,
            });
        }

        let long_enough = clean.chars().count() > MIN_FRAGMENT_CHARS;
        self.canned
            .iter()
            .find(|(q, _)| clean.contains(q.as_str()) || (long_enough && q.contains(clean)))
            .map(|(_, text)| QuickAnswer {
                text: text.clone(),
                source: AnswerSource::Similar,
            })
    }

    fn insert(&self, key: String, answer: String) {
        let mut runtime = self.runtime.lock();
        if runtime.answers.insert(key.clone(), answer).is_some() {
            return;
        }
        if self.capacity == 0 {
            return;
        }
        runtime.order.push_back(key);
        while runtime.answers.len() > self.capacity {
            match runtime.order.pop_front() {
                Some(oldest) => {
                    runtime.answers.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

/// Whether the agent's answer to `message` is worth remembering.
pub fn is_general_question(message: &str) -> bool {
    let clean = normalize(message);
    GENERAL_QUESTION_KEYWORDS.iter().any(|k| clean.contains(k))
}
