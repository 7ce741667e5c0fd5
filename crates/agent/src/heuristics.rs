//! Keyword heuristics shared by the controller and the retriever.
//!
//! Everything here is a pure function of the utterance text. Matching is
//! case-insensitive; plan names are matched on word boundaries so that
//! "basic" inside an unrelated word never counts as a plan mention.

/// Interrogative cues that mark a mid-form utterance as a clarifying
/// question rather than a field value.
const QUESTION_CUES: &[&str] = &[
    "why",
    "what",
    "how",
    "when",
    "where",
    "who",
    "which",
    "do you need",
    "do you ask",
    "do you want",
    "do you require",
    "need my",
    "ask for",
    "want my",
    "require my",
];

const REASON_CUES: &[&str] = &["why", "what for", "purpose", "reason"];

const DATA_REFERENCES: &[&str] =
    &["details", "information", "you need", "you ask", "you collect", "you require", "you want"];

const LEAD_QUESTION_PHRASES: &[&str] =
    &["why these", "why my", "what about my", "what will you do", "what happens to"];

const PRO_WORDS: &[&str] = &["pro", "professional", "premium"];
const BASIC_WORDS: &[&str] = &["basic", "starter", "standard"];

const PRO_PHRASES: &[&str] = &["pro plan", "professional plan", "premium plan"];
const BASIC_PHRASES: &[&str] = &["basic plan", "starter plan", "standard plan"];

pub fn normalize(text: &str) -> String {
    text.to_ascii_lowercase()
}

fn words(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split(|ch: char| !ch.is_ascii_alphanumeric()).filter(|word| !word.is_empty())
}

pub fn contains_any(normalized: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| normalized.contains(phrase))
}

pub fn has_any_word(normalized: &str, candidates: &[&str]) -> bool {
    words(normalized).any(|word| candidates.contains(&word))
}

/// True when a mid-form utterance looks like a question instead of a value.
pub fn is_clarifying_question(text: &str) -> bool {
    let normalized = normalize(text);
    contains_any(&normalized, QUESTION_CUES) || text.trim_end().ends_with('?')
}

/// Gratitude expressions short-circuit the turn without touching the
/// classifier.
pub fn is_gratitude(text: &str) -> bool {
    let normalized = normalize(text);
    if normalized.contains("thank")
        || normalized.contains("appreciate")
        || normalized.contains("grateful")
    {
        return true;
    }
    has_any_word(&normalized, &["thanks", "ty", "thx"])
}

/// A follow-up asking why the lead's details were collected. The caller
/// gates this on the lead actually having been captured.
pub fn is_lead_data_question(text: &str) -> bool {
    let normalized = normalize(text);

    let has_reason_cue = contains_any(&normalized, REASON_CUES);
    let references_data = contains_any(&normalized, DATA_REFERENCES)
        || has_any_word(&normalized, &["my", "data"]);

    (has_reason_cue && references_data) || contains_any(&normalized, LEAD_QUESTION_PHRASES)
}

/// Plan names detected in a single piece of text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlanMentions {
    pub pro: bool,
    pub basic: bool,
}

impl PlanMentions {
    pub fn exactly_one(&self) -> bool {
        self.pro != self.basic
    }

    pub fn any(&self) -> bool {
        self.pro || self.basic
    }
}

pub fn plan_mentions(text: &str) -> PlanMentions {
    let normalized = normalize(text);
    PlanMentions {
        pro: has_any_word(&normalized, PRO_WORDS) || contains_any(&normalized, PRO_PHRASES),
        basic: has_any_word(&normalized, BASIC_WORDS) || contains_any(&normalized, BASIC_PHRASES),
    }
}

#[cfg(test)]
mod tests {
    use super::{is_clarifying_question, is_gratitude, is_lead_data_question, plan_mentions};

    #[test]
    fn question_detection_covers_cues_and_question_marks() {
        assert!(is_clarifying_question("why do you need this?"));
        assert!(is_clarifying_question("do you need my full name"));
        assert!(is_clarifying_question("is this required?"));
        assert!(!is_clarifying_question("Jane Doe"));
        assert!(!is_clarifying_question("jane@example.com"));
    }

    #[test]
    fn gratitude_detection_matches_fixed_phrases() {
        for text in ["thanks!", "Thank you so much", "appreciate it", "ty", "I'm grateful"] {
            assert!(is_gratitude(text), "should match: {text}");
        }
        assert!(!is_gratitude("what does the pro plan cost"));
        assert!(!is_gratitude("party on saturday"), "`ty` must match whole words only");
    }

    #[test]
    fn lead_data_question_needs_reason_and_reference() {
        assert!(is_lead_data_question("why did you need my details?"));
        assert!(is_lead_data_question("what is the purpose of this information"));
        assert!(is_lead_data_question("what will you do with that"));
        assert!(!is_lead_data_question("why is the sky blue"));
        assert!(!is_lead_data_question("tell me about the pro plan"));
    }

    #[test]
    fn plan_mentions_match_whole_words_only() {
        let mentions = plan_mentions("what is the difference between plans?");
        assert!(!mentions.basic, "`basic` must not match inside `difference`-like words");
        assert!(!mentions.pro);

        assert!(plan_mentions("the pro plan").pro);
        assert!(plan_mentions("premium tier").pro);
        assert!(plan_mentions("basic plan pricing").basic);
        assert!(!plan_mentions("basically i want to edit videos").basic);
    }

    #[test]
    fn plan_mentions_exactly_one() {
        assert!(plan_mentions("pro plan").exactly_one());
        assert!(!plan_mentions("basic vs pro").exactly_one());
        assert!(!plan_mentions("your plans").exactly_one());
    }
}
