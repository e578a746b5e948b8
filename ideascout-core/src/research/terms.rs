//! Search term generation from free-text idea descriptions.
//!
//! The AI path asks the completion provider for comma-separated terms. The
//! heuristic path is deterministic: domain booster terms picked by keyword
//! match, followed by the idea's own content words.

use crate::brain::{CompletionProvider, CompletionRequest};
use crate::error::LlmError;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum number of search terms ever returned.
pub const MAX_TERMS: usize = 5;

/// Returned when neither the AI nor the heuristic finds anything usable.
pub const GENERIC_TERMS: [&str; 3] = ["innovation", "technology adoption", "business model"];

const SYSTEM_PROMPT: &str = "You are a research librarian who turns startup ideas into \
academic literature search terms. Reply with 3 to 5 comma-separated search terms and nothing else.";

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "app", "application", "apps",
    "are", "as", "at", "based", "be", "been", "best", "better", "build", "business", "but",
    "by", "can", "company", "could", "create", "do", "does", "easy", "every", "for", "from",
    "get", "has", "have", "help", "helps", "how", "idea", "in", "into", "is", "it", "its",
    "just", "let", "lets", "like", "make", "makes", "mobile", "more", "most", "new", "not",
    "of", "on", "online", "or", "our", "over", "people", "platform", "powered", "product",
    "service", "services", "should", "so", "solution", "startup", "such", "system", "than",
    "that", "the", "their", "them", "then", "there", "these", "they", "this", "through", "to",
    "tool", "up", "use", "used", "user", "users", "uses", "using", "via", "want", "was", "way",
    "we", "web", "website", "what", "when", "where", "which", "while", "who", "will", "with",
    "would", "you", "your",
];

/// A keyword group: when any keyword matches the idea, its boosters are
/// prepended to the search terms.
struct BoosterGroup {
    keywords: &'static [&'static str],
    boosters: &'static [&'static str],
}

const BOOSTER_GROUPS: &[BoosterGroup] = &[
    BoosterGroup {
        keywords: &[
            "ai", "artificial intelligence", "machine learning", "ml", "deep learning", "neural",
            "llm", "chatbot", "nlp", "predictive",
        ],
        boosters: &["artificial intelligence", "machine learning", "neural networks"],
    },
    BoosterGroup {
        keywords: &[
            "computer vision", "vision", "image", "images", "photo", "photos", "camera", "video",
            "visual",
        ],
        boosters: &["computer vision", "image recognition", "deep learning"],
    },
    BoosterGroup {
        keywords: &[
            "agriculture", "agricultural", "farming", "farm", "farms", "farmer", "farmers", "crop",
            "crops", "harvest", "soil", "livestock", "agritech",
        ],
        boosters: &["agriculture", "precision farming", "crop yield"],
    },
    BoosterGroup {
        keywords: &[
            "health", "healthcare", "medical", "medicine", "patient", "patients", "clinical",
            "hospital", "diagnosis", "wellness",
        ],
        boosters: &["healthcare", "medical informatics", "clinical decision support"],
    },
    BoosterGroup {
        keywords: &[
            "finance", "financial", "fintech", "banking", "payment", "payments", "investment",
            "trading", "loan", "loans", "insurance",
        ],
        boosters: &["financial technology", "risk assessment", "algorithmic trading"],
    },
    BoosterGroup {
        keywords: &[
            "education", "educational", "edtech", "student", "students", "teaching", "school",
            "tutoring", "course", "courses",
        ],
        boosters: &["educational technology", "e-learning", "personalized learning"],
    },
    BoosterGroup {
        keywords: &[
            "energy", "solar", "renewable", "climate", "carbon", "battery", "emissions",
            "sustainability", "sustainable",
        ],
        boosters: &["renewable energy", "sustainability", "energy efficiency"],
    },
    BoosterGroup {
        keywords: &[
            "blockchain", "crypto", "cryptocurrency", "web3", "nft", "ledger", "smart contract",
        ],
        boosters: &["blockchain", "distributed ledger", "smart contracts"],
    },
];

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Push `term` unless an equal term (ignoring case) is already present.
fn push_unique(terms: &mut Vec<String>, term: &str) {
    if !terms.iter().any(|t| t.eq_ignore_ascii_case(term)) {
        terms.push(term.to_string());
    }
}

/// Lowercase alphanumeric words of `text`.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Deterministic fallback: domain boosters, then the idea's content words.
pub fn heuristic_terms(idea: &str) -> Vec<String> {
    let words = tokenize(idea);
    let padded = format!(" {} ", words.join(" "));

    let matched: Vec<&BoosterGroup> = BOOSTER_GROUPS
        .iter()
        .filter(|group| {
            group.keywords.iter().any(|kw| {
                if kw.contains(' ') {
                    padded.contains(&format!(" {} ", kw))
                } else {
                    words.iter().any(|w| w == kw)
                }
            })
        })
        .collect();

    let mut terms = Vec::new();

    // Round-robin across matched groups so each one is represented within the cap.
    let depth = matched.iter().map(|g| g.boosters.len()).max().unwrap_or(0);
    for i in 0..depth {
        for group in &matched {
            if let Some(booster) = group.boosters.get(i) {
                push_unique(&mut terms, booster);
            }
        }
    }

    for word in words
        .iter()
        .filter(|w| w.chars().count() >= 3 && !is_stop_word(w))
    {
        push_unique(&mut terms, word);
    }

    terms.truncate(MAX_TERMS);
    if terms.is_empty() {
        terms = GENERIC_TERMS.iter().map(|t| t.to_string()).collect();
    }
    terms
}

const PREAMBLE_NOUNS: [&str; 4] = ["term", "terms", "keyword", "keywords"];

fn is_preamble_label(label: &str) -> bool {
    if label.contains([',', '\n', ';']) {
        return false;
    }
    let label = label.to_lowercase();
    let words: Vec<&str> = label.split_whitespace().collect();
    words.first() == Some(&"here") || words.last().is_some_and(|w| PREAMBLE_NOUNS.contains(w))
}

/// Drop a leading `Search terms:` style label. Other colons are kept.
fn strip_preamble(raw: &str) -> &str {
    match raw.split_once(':') {
        Some((label, rest)) if is_preamble_label(label) => rest,
        _ => raw,
    }
}

/// Strip list numbering, bullets and quoting from one raw AI term.
fn clean_ai_term(raw: &str) -> String {
    let mut term = raw.trim();
    let digits = term.len() - term.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        let rest = &term[digits..];
        if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            term = stripped;
        }
    }
    let term = term.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '*' | '•' | '-' | '.' | '[' | ']')
    });
    crate::normalize::normalize_whitespace(term)
}

/// Parse a raw completion into search terms.
///
/// Drops a leading preamble label, splits on commas and newlines, skips
/// empty, numeric and stop-word tokens, deduplicates and caps at
/// [`MAX_TERMS`].
pub fn parse_ai_terms(raw: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let raw = strip_preamble(raw.trim_start());
    for piece in raw.split([',', '\n', ';']) {
        let term = clean_ai_term(piece);
        if term.is_empty() {
            continue;
        }
        if term.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ' ') {
            continue;
        }
        if is_stop_word(&term.to_lowercase()) {
            continue;
        }
        push_unique(&mut terms, &term);
    }
    terms.truncate(MAX_TERMS);
    terms
}

/// Turns an idea description into 1–5 academic search terms.
pub struct SearchTermGenerator {
    provider: Option<Arc<dyn CompletionProvider>>,
    temperature: f32,
    max_tokens: usize,
}

impl SearchTermGenerator {
    /// Create a generator. With `None`, only the heuristic path is used.
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self {
            provider,
            temperature: 0.3,
            max_tokens: 100,
        }
    }

    /// A generator that never calls an AI provider.
    pub fn heuristic() -> Self {
        Self::new(None)
    }

    /// Override the sampling parameters sent to the provider.
    pub fn with_sampling(mut self, temperature: f32, max_tokens: usize) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Generate search terms. Never fails and never returns an empty list.
    ///
    /// A single AI failure falls straight through to the heuristic; there
    /// are no retries.
    pub async fn generate(&self, idea: &str) -> Vec<String> {
        if let Some(provider) = &self.provider {
            match self.generate_with_ai(provider.as_ref(), idea).await {
                Ok(terms) if !terms.is_empty() => {
                    debug!(count = terms.len(), model = provider.model_name(), "AI search terms");
                    return terms;
                }
                Ok(_) => warn!("AI returned no usable search terms; using heuristic terms"),
                Err(e) => warn!(error = %e, "AI term generation failed; using heuristic terms"),
            }
        }
        let terms = heuristic_terms(idea);
        debug!(terms = ?terms, "Heuristic search terms");
        terms
    }

    async fn generate_with_ai(
        &self,
        provider: &dyn CompletionProvider,
        idea: &str,
    ) -> Result<Vec<String>, LlmError> {
        let request = CompletionRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: format!(
                "Generate 3-5 academic search terms for this startup idea: {}\n\
                 Return only the terms, separated by commas.",
                idea.trim()
            ),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let response = provider.complete(request).await?;
        Ok(parse_ai_terms(&response.text))
    }
}
