use serde::{Deserialize, Serialize};

/// Coarse category of a user utterance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    ProductInquiry,
    HighIntent,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::ProductInquiry => "product_inquiry",
            Self::HighIntent => "high_intent",
        }
    }

    /// Maps a raw classifier label onto an intent.
    ///
    /// Remote models occasionally wrap the label in extra prose, so this is
    /// a substring match rather than an exact parse. Anything unrecognized
    /// maps to `ProductInquiry`; this is the single defaulting point for
    /// unknown labels in the whole system.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_ascii_lowercase();
        if normalized.contains("greeting") {
            Self::Greeting
        } else if normalized.contains("high_intent") || normalized.contains("high") {
            Self::HighIntent
        } else {
            Self::ProductInquiry
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Intent;

    #[test]
    fn parses_exact_labels() {
        assert_eq!(Intent::from_label("greeting"), Intent::Greeting);
        assert_eq!(Intent::from_label("product_inquiry"), Intent::ProductInquiry);
        assert_eq!(Intent::from_label("high_intent"), Intent::HighIntent);
    }

    #[test]
    fn tolerates_wrapped_labels() {
        assert_eq!(Intent::from_label("The intent is: greeting."), Intent::Greeting);
        assert_eq!(Intent::from_label("HIGH_INTENT\n"), Intent::HighIntent);
        assert_eq!(Intent::from_label("high interest in purchase"), Intent::HighIntent);
    }

    #[test]
    fn unknown_labels_default_to_product_inquiry() {
        assert_eq!(Intent::from_label("complaint"), Intent::ProductInquiry);
        assert_eq!(Intent::from_label(""), Intent::ProductInquiry);
    }
}
