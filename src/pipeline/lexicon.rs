//! Lexicon & cue store: symptom terms and negation cue phrases.
//!
//! Both are built once at startup and shared read-only across worker threads.
//! Terms always iterate in sorted order so that mention order, and therefore
//! per-note truncation, is reproducible.

use std::collections::BTreeSet;
use std::path::Path;

use regex::Regex;

use super::error::PipelineError;

/// Built-in symptom terms used when no lexicon file is configured.
pub const DEFAULT_SYMPTOM_TERMS: &[&str] = &[
    "abdominal distension",
    "abdominal pain",
    "agitation",
    "anorexia",
    "anxiety",
    "arthralgia",
    "ascites",
    "back pain",
    "bleeding",
    "bloating",
    "blurred vision",
    "bradycardia",
    "bruising",
    "chest pain",
    "chest tightness",
    "chills",
    "claudication",
    "confusion",
    "constipation",
    "cough",
    "cyanosis",
    "dehydration",
    "delirium",
    "depression",
    "diaphoresis",
    "diarrhea",
    "dizziness",
    "dyspepsia",
    "dysphagia",
    "dyspnea",
    "dysuria",
    "edema",
    "epistaxis",
    "erythema",
    "fatigue",
    "fever",
    "flank pain",
    "headache",
    "hematemesis",
    "hematochezia",
    "hematuria",
    "hemoptysis",
    "hiccups",
    "hypotension",
    "hypoxia",
    "incontinence",
    "insomnia",
    "jaundice",
    "lethargy",
    "lightheadedness",
    "malaise",
    "melena",
    "myalgia",
    "nausea",
    "night sweats",
    "numbness",
    "orthopnea",
    "pain",
    "pallor",
    "palpitations",
    "paresthesia",
    "pruritus",
    "rash",
    "rigors",
    "seizure",
    "shortness of breath",
    "somnolence",
    "sore throat",
    "swelling",
    "syncope",
    "tachycardia",
    "tachypnea",
    "tremor",
    "urinary retention",
    "vertigo",
    "vomiting",
    "weakness",
    "weight gain",
    "weight loss",
    "wheezing",
];

/// Negation cues searched for in the window before each match.
pub const DEFAULT_NEGATION_CUES: &[&str] = &[
    "deny",
    "denies",
    "denied",
    "no",
    "no history of",
    "without",
    "never had",
    "not complaining",
    "not report",
    "not have",
    "not experiencing",
    "absence of",
];

/// Lowercase, trim and collapse internal whitespace.
pub fn normalize_phrase(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole-word pattern for a phrase; internal spaces match any run of
/// whitespace so line-wrapped phrases still match.
pub fn phrase_pattern(phrase: &str) -> String {
    let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
    format!(r"\b{}\b", words.join(r"\s+"))
}

// ═══════════════════════════════════════════
// Lexicon
// ═══════════════════════════════════════════

/// Set of lowercase symptom terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexicon {
    terms: BTreeSet<String>,
}

impl Lexicon {
    pub fn new<I, S>(terms: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms: BTreeSet<String> = terms
            .into_iter()
            .map(|t| normalize_phrase(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();

        if terms.is_empty() {
            return Err(PipelineError::Config("lexicon has no terms".into()));
        }
        Ok(Self { terms })
    }

    /// One term per line; blank lines and `#` comments are skipped.
    pub fn parse(source: &str) -> Result<Self, PipelineError> {
        Self::new(
            source
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        )
    }

    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::MissingInput(path.display().to_string()));
        }
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// Terms in lexicographic order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    /// Compile one match pattern per term. A failure here is a startup error.
    pub fn compile(&self) -> Result<CompiledLexicon, PipelineError> {
        let patterns = self
            .terms
            .iter()
            .map(|term| {
                Regex::new(&phrase_pattern(term))
                    .map(|regex| TermPattern {
                        term: term.clone(),
                        regex,
                    })
                    .map_err(|source| PipelineError::PatternCompile {
                        term: term.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(terms = patterns.len(), "Compiled lexicon patterns");
        Ok(CompiledLexicon { patterns })
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            terms: DEFAULT_SYMPTOM_TERMS
                .iter()
                .map(|t| normalize_phrase(t))
                .collect(),
        }
    }
}

/// A lexicon term with its compiled whole-word pattern.
#[derive(Debug, Clone)]
pub struct TermPattern {
    pub term: String,
    pub regex: Regex,
}

/// Compiled lexicon, patterns kept in sorted term order.
#[derive(Debug, Clone)]
pub struct CompiledLexicon {
    patterns: Vec<TermPattern>,
}

impl CompiledLexicon {
    pub fn patterns(&self) -> &[TermPattern] {
        &self.patterns
    }
}

// ═══════════════════════════════════════════
// Negation cues
// ═══════════════════════════════════════════

/// Negation cue phrases compiled into a single whole-word alternation.
#[derive(Debug, Clone)]
pub struct NegationCues {
    cues: Vec<String>,
    regex: Regex,
}

impl NegationCues {
    pub fn new<I, S>(cues: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cues: Vec<String> = cues
            .into_iter()
            .map(|c| normalize_phrase(c.as_ref()))
            .filter(|c| !c.is_empty())
            .collect();
        cues.sort();
        cues.dedup();

        if cues.is_empty() {
            return Err(PipelineError::Config("negation cue list is empty".into()));
        }

        // Longest first so multi-word cues win over their prefixes.
        let mut ordered: Vec<&String> = cues.iter().collect();
        ordered.sort_by_key(|c| std::cmp::Reverse(c.len()));
        let alternation = ordered
            .iter()
            .map(|c| {
                let words: Vec<String> = c.split_whitespace().map(regex::escape).collect();
                words.join(r"\s+")
            })
            .collect::<Vec<_>>()
            .join("|");

        let regex = Regex::new(&format!(r"\b(?:{alternation})\b")).map_err(|source| {
            PipelineError::PatternCompile {
                term: "negation cues".into(),
                source,
            }
        })?;

        Ok(Self { cues, regex })
    }

    /// True if `window` contains any cue as a whole word or phrase.
    /// Expects lowercased text.
    pub fn matches(&self, window: &str) -> bool {
        self.regex.is_match(window)
    }

    pub fn cues(&self) -> &[String] {
        &self.cues
    }
}

impl Default for NegationCues {
    fn default() -> Self {
        // Built from constant cue phrases; escaping guarantees a valid pattern.
        Self::new(DEFAULT_NEGATION_CUES).expect("default negation cues compile")
    }
}
