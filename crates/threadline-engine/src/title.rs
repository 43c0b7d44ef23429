use threadline_llm::CompletionOracle;

use crate::config::DEFAULT_TITLE_EXCERPT_CHARS;

/// Leading words dropped by the local heuristic (compared case-insensitively)
const LEADING_WORDS: &[&str] = &[
    "how", "what", "why", "when", "where", "who", "can", "could", "would", "should", "is",
    "are", "do", "does", "did", "will", "please", "help", "explain", "tell", "show",
];

const MAX_TITLE_WORDS: usize = 4;

/// Derive a short title from a user message without contacting the oracle
///
/// Drops one leading question/command word, removes `?`, `!` and `.`,
/// keeps the first four words (adding `...` when more followed) and
/// upper-cases the first character. Pure and deterministic.
pub fn heuristic_title(message: &str) -> String {
    let stripped = strip_leading_word(message);
    let cleaned: String = stripped
        .chars()
        .filter(|c| !matches!(c, '?' | '!' | '.'))
        .collect();
    
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    let mut title = words
        .iter()
        .take(MAX_TITLE_WORDS)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if words.len() > MAX_TITLE_WORDS {
        title.push_str("...");
    }
    
    capitalize(&title)
}

/// The word must start the message and be followed by whitespace
fn strip_leading_word(message: &str) -> &str {
    let Some(end) = message.find(char::is_whitespace) else {
        return message;
    };
    let word = &message[..end];
    if LEADING_WORDS.iter().any(|w| w.eq_ignore_ascii_case(word)) {
        message[end..].trim_start()
    } else {
        message
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Names a new thread from its first exchange
#[derive(Clone)]
pub struct TitleSynthesizer {
    oracle: CompletionOracle,
    excerpt_chars: usize,
}

impl TitleSynthesizer {
    pub fn new(oracle: CompletionOracle) -> Self {
        Self {
            oracle,
            excerpt_chars: DEFAULT_TITLE_EXCERPT_CHARS,
        }
    }
    
    pub fn with_excerpt_chars(mut self, chars: usize) -> Self {
        self.excerpt_chars = chars;
        self
    }
    
    pub fn prompt(&self, first_user_message: &str, first_reply: &str) -> String {
        let excerpt: String = first_reply.chars().take(self.excerpt_chars).collect();
        format!(
            "Based on this conversation, generate a short, descriptive title (3-5 words maximum) \
            that captures the main topic or question. Be concise and clear.\n\n\
            User: {}\nAssistant: {}...\n\n\
            Generate only the title, nothing else:",
            first_user_message, excerpt
        )
    }
    
    /// Ask the oracle for a title; any failure or empty answer yields [`heuristic_title`]
    ///
    /// Only an empty user message can produce an empty title.
    pub async fn synthesize(&self, first_user_message: &str, first_reply: &str) -> String {
        let prompt = self.prompt(first_user_message, first_reply);
        
        match self.oracle.try_complete(&prompt).await {
            Ok(Some(raw)) => {
                let title = clean_title(&raw);
                if title.is_empty() {
                    tracing::debug!("Oracle title was blank after cleanup, using heuristic");
                    heuristic_title(first_user_message)
                } else {
                    title
                }
            }
            Ok(None) => {
                tracing::debug!("Oracle returned no title, using heuristic");
                heuristic_title(first_user_message)
            }
            Err(e) => {
                tracing::warn!("Title synthesis failed, using heuristic: {:#}", e);
                heuristic_title(first_user_message)
            }
        }
    }
}

fn clean_title(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '\'' | '"'))
        .collect::<String>()
        .trim()
        .to_string()
}
