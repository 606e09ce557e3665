//! Rule-based intent classifier
//!
//! Keyword and pattern rules for travel requests: intent kind, destination,
//! origin, duration, party size, interests and budget.

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::{ClassifyError, IntentClassifier, SessionContext};
use crate::domain::{Budget, Category, Intent, IntentKind};

const PLAN_WORDS: &[&str] = &["plan", "trip", "itinerary", "travel", "vacation", "holiday"];
const SEARCH_WORDS: &[&str] = &["find", "search", "look", "show"];
const MODIFY_WORDS: &[&str] = &["modify", "change", "update", "add", "remove", "replace", "more", "swap"];

const DESTINATIONS: &[&str] = &[
    "tokyo",
    "japan",
    "paris",
    "france",
    "rome",
    "italy",
    "barcelona",
    "spain",
    "london",
    "uk",
    "new york",
    "nyc",
    "los angeles",
    "bali",
    "thailand",
    "amsterdam",
    "berlin",
    "prague",
    "vienna",
    "budapest",
    "lisbon",
    "kyoto",
];

const INTERESTS: &[(&str, &[&str])] = &[
    ("culture", &["culture", "cultural", "history", "historical", "museum", "art"]),
    ("food", &["food", "cuisine", "restaurant", "dining", "culinary"]),
    ("adventure", &["adventure", "hiking", "outdoor", "sports", "active"]),
    ("nightlife", &["nightlife", "bars", "clubs", "entertainment"]),
    ("relaxation", &["relax", "spa", "beach", "peaceful", "quiet"]),
    ("shopping", &["shopping", "markets", "stores"]),
    ("nature", &["nature", "parks", "wildlife", "scenery"]),
];

const FOCUS: &[(Category, &[&str])] = &[
    (Category::Flights, &["flight", "fly", "airfare"]),
    (Category::Hotels, &["hotel", "accommodation", "stay", "lodging"]),
    (Category::Activities, &["activities", "things to do", "attraction", "sightseeing"]),
    (Category::Dining, &["restaurant", "dining", "eat"]),
    (Category::DestinationInfo, &["weather", "best time", "guide", "info"]),
];

/// Keyword and regex rules over lowercased text
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    duration: Regex,
    party: Regex,
    origin: Regex,
}

impl KeywordClassifier {
    pub fn new() -> Result<Self, ClassifyError> {
        Ok(Self {
            duration: Regex::new(r"\b(\d+)\s*-?\s*(days?|nights?|weeks?)\b")?,
            party: Regex::new(r"\b(\d+)\s*(people|persons?|travell?ers?|guests?|adults?)\b")?,
            origin: Regex::new(r"\bfrom\s+([a-z][a-z ]*?)(?:\s+(?:to|for|on|in|with)\b|[,.!?]|$)")?,
        })
    }

    /// Classify without the async trait wrapper
    pub fn classify_text(&self, raw_text: &str, context: &SessionContext) -> Result<Intent, ClassifyError> {
        debug!(%raw_text, has_history = context.has_history(), "KeywordClassifier::classify_text: called");
        let text = raw_text.trim().to_lowercase();
        let words = tokenize(&text);
        if words.is_empty() {
            debug!("KeywordClassifier::classify_text: empty input");
            return Err(ClassifyError::Unclassifiable(raw_text.to_string()));
        }

        let origin = self.origin(&text);
        let destination = destination(&text, origin.as_deref());
        let interests = interests(&text, &words);
        let focus = focus(&text, &words);

        let kind = match kind(&words, context) {
            Some(kind) => kind,
            None if destination.is_some() => {
                debug!("KeywordClassifier::classify_text: general inquiry about a destination");
                IntentKind::Search
            }
            None => {
                debug!("KeywordClassifier::classify_text: no rule matched");
                return Err(ClassifyError::Unclassifiable(raw_text.to_string()));
            }
        };

        let mut intent = Intent::new(kind, raw_text)
            .with_interests(interests)
            .with_budget(budget(&text, &words))
            .with_party_size(self.party_size(&text, &words).unwrap_or(crate::domain::DEFAULT_PARTY_SIZE));

        intent = match kind {
            IntentKind::Search if focus.is_empty() && destination.is_some() && !has_any(&words, SEARCH_WORDS) => {
                intent.with_focus([Category::DestinationInfo])
            }
            _ => intent.with_focus(focus),
        };

        let subject = destination.or_else(|| match kind {
            IntentKind::NewPlan => None,
            _ => context.last_subject().map(String::from),
        });
        if let Some(subject) = subject {
            intent = intent.with_subject(subject);
        }
        if let Some(origin) = origin {
            intent = intent.with_origin(origin);
        }
        if let Some(duration) = self.duration(&text) {
            intent = intent.with_duration(duration);
        }

        debug!(kind = %intent.kind, subject = ?intent.subject, interests = ?intent.interests, "KeywordClassifier::classify_text: classified");
        Ok(intent)
    }

    fn duration(&self, text: &str) -> Option<String> {
        if let Some(caps) = self.duration.captures(text) {
            return Some(format!("{} {}", &caps[1], &caps[2]));
        }
        text.contains("weekend").then(|| "weekend".to_string())
    }

    fn party_size(&self, text: &str, words: &[&str]) -> Option<u32> {
        if let Some(caps) = self.party.captures(text) {
            return caps[1].parse().ok().filter(|n| *n > 0);
        }
        if words.iter().any(|w| matches!(*w, "solo" | "alone" | "myself")) {
            return Some(1);
        }
        words.contains(&"couple").then_some(2)
    }

    fn origin(&self, text: &str) -> Option<String> {
        let caps = self.origin.captures(text)?;
        let origin = caps[1].trim();
        (!origin.is_empty()).then(|| title_case(origin))
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify(&self, raw_text: &str, context: &SessionContext) -> Result<Intent, ClassifyError> {
        self.classify_text(raw_text, context)
    }
}

/// Intent kind from trigger words
///
/// With a prior request in the session, edit words win over plan words so
/// "change my trip" is a modification rather than a new plan.
fn kind(words: &[&str], context: &SessionContext) -> Option<IntentKind> {
    let plan = has_any(words, PLAN_WORDS);
    let search = has_any(words, SEARCH_WORDS);
    let modify = has_any(words, MODIFY_WORDS);

    if context.has_history() && modify {
        return Some(IntentKind::Modify);
    }
    if plan {
        Some(IntentKind::NewPlan)
    } else if search {
        Some(IntentKind::Search)
    } else if modify {
        Some(IntentKind::Modify)
    } else {
        None
    }
}

/// First known destination mentioned, skipping the origin
fn destination(text: &str, origin: Option<&str>) -> Option<String> {
    let origin = origin.map(str::to_lowercase);
    DESTINATIONS
        .iter()
        .filter(|d| origin.as_deref() != Some(**d))
        .filter_map(|d| find_phrase(text, d).map(|pos| (pos, *d)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, d)| title_case(d))
}

fn interests(text: &str, words: &[&str]) -> Vec<String> {
    INTERESTS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| matches_keyword(text, words, k)))
        .map(|(tag, _)| tag.to_string())
        .collect()
}

fn focus(text: &str, words: &[&str]) -> Vec<Category> {
    FOCUS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| matches_keyword(text, words, k)))
        .map(|(category, _)| *category)
        .collect()
}

fn budget(text: &str, words: &[&str]) -> Budget {
    if has_any(words, &["budget", "cheap", "affordable"]) {
        Budget::Budget
    } else if has_any(words, &["luxury", "premium"]) || text.contains("high-end") {
        Budget::Luxury
    } else {
        Budget::MidRange
    }
}

/// Split into alphanumeric words
fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect()
}

/// True if any word starts with any of the keywords
fn has_any(words: &[&str], keywords: &[&str]) -> bool {
    keywords.iter().any(|k| words.iter().any(|w| w.starts_with(k)))
}

/// Single words match as word prefixes; phrases match on word boundaries
fn matches_keyword(text: &str, words: &[&str], keyword: &str) -> bool {
    if keyword.contains(' ') {
        find_phrase(text, keyword).is_some()
    } else {
        words.iter().any(|w| w.starts_with(keyword))
    }
}

/// Position of a phrase that starts and ends on word boundaries
fn find_phrase(text: &str, phrase: &str) -> Option<usize> {
    text.match_indices(phrase).map(|(pos, _)| pos).find(|&pos| {
        let before = text[..pos].chars().next_back();
        let after = text[pos + phrase.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
