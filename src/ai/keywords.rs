//! Fixed rule tables used when no generative model is available.

use crate::model::db::issue::{IssueCategory, IssuePrediction, IssuePriority};

pub const FALLBACK_CONFIDENCE: f64 = 0.7;
pub const FALLBACK_HOURS: f64 = 24.0;

/// What a rule looks for in the lowercased message.
enum Trigger {
    /// Any of these as a whole word.
    Word(&'static [&'static str]),
    /// Any of these anywhere in the text.
    Phrase(&'static [&'static str]),
}

impl Trigger {
    fn matches(&self, text: &str) -> bool {
        match self {
            Self::Word(words) => text
                .split(|c: char| !c.is_alphanumeric())
                .any(|token| words.contains(&token)),
            Self::Phrase(phrases) => phrases.iter().any(|phrase| text.contains(phrase)),
        }
    }
}

/// Chat rules, first match wins.
const CHAT_RULES: &[(Trigger, &str)] = &[
    (
        Trigger::Word(&["hi", "hello", "hey", "greetings"]),
        "Hello! I am your Hostel Assistant. I can help you with Issues, Mess Menu, Gate Passes, and more. What do you need?",
    ),
    (
        Trigger::Phrase(&["who are you", "what can you do"]),
        "I am an AI-powered assistant designed to manage hostel activities. I can help you report issues, check the food menu, apply for gate passes, and find lost items.",
    ),
    (
        Trigger::Phrase(&["thank"]),
        "You're welcome! Let me know if you need anything else.",
    ),
    (
        Trigger::Phrase(&["issue", "problem", "complaint"]),
        "To report an issue, go to the 'Create Issue' section. You can report Plumbing, Electrical, or Furniture problems and track their status.",
    ),
    (
        Trigger::Phrase(&["water", "leak"]),
        "For water or plumbing issues, please report it immediately under the 'Plumbing' category in the Issues tab so maintenance can fix it.",
    ),
    (
        Trigger::Phrase(&["internet", "wifi"]),
        "If Wi-Fi is down, try restarting your device first. If it persists, report it under 'Internet' issues.",
    ),
    (
        Trigger::Phrase(&["emergency", "urgent", "fire"]),
        "FOR EMERGENCIES: Please mark your issue as 'Emergency' priority immediately. You should also call the Warden or Security directly.",
    ),
    (
        Trigger::Phrase(&["mess", "food", "menu", "dinner", "lunch"]),
        "You can view the daily breakfast, lunch, and dinner menu in the 'Mess' section. Don't forget to vote for your favorite dishes!",
    ),
    (
        Trigger::Phrase(&["lost", "found", "wallet", "key"]),
        "Lost something? Check the 'Lost & Found' section. If you found an item, please list it there to help its owner find it.",
    ),
    (
        Trigger::Phrase(&["gate", "pass", "leave", "outing"]),
        "Need to go out? Apply for a 'Gate Pass' in the app. Once approved by the warden, you can show the digital pass at the security gate.",
    ),
    (
        Trigger::Phrase(&["laundry", "wash", "cloth"]),
        "You can check the availability of washing machines in the 'Laundry' section and book a slot to avoid waiting.",
    ),
    (
        Trigger::Phrase(&["warden", "contact", "number"]),
        "You can find contact details for the Warden and Security in the 'Dashboard' or notice board. For app support, contact the admin.",
    ),
    (
        Trigger::Phrase(&["rule", "timing"]),
        "Hostel gates close at 10:00 PM. Silence hours start at 11:00 PM. Please maintain cleanliness and discipline.",
    ),
    (
        Trigger::Phrase(&["buy", "sell", "market"]),
        "Visit the 'Marketplace' to buy or sell used books, electronics, and furniture within the hostel community.",
    ),
];

pub const DEFAULT_CHAT_REPLY: &str =
    "I can help with Issues, Mess, Gate Pass, Laundry, and Marketplace. Could you please rephrase your question?";

/// Reply to a chat message from the rule table.
pub fn chat_reply(message: &str) -> &'static str {
    let text = message.to_lowercase();
    CHAT_RULES
        .iter()
        .find(|(trigger, _)| trigger.matches(&text))
        .map_or(DEFAULT_CHAT_REPLY, |(_, reply)| reply)
}

/// Category rules, first match wins.
const CATEGORY_RULES: &[(&[&str], IssueCategory, IssuePriority)] = &[
    (
        &["water", "pipe", "leak", "drainage", "tap", "shower"],
        IssueCategory::Plumbing,
        IssuePriority::High,
    ),
    (
        &["light", "electric", "fan", "plug", "switch", "power"],
        IssueCategory::Electrical,
        IssuePriority::High,
    ),
    (
        &["dirty", "clean", "garbage", "trash", "dust"],
        IssueCategory::Cleanliness,
        IssuePriority::Medium,
    ),
    (
        &["internet", "wifi", "network", "connection"],
        IssueCategory::Internet,
        IssuePriority::Medium,
    ),
    (
        &["bed", "chair", "table", "door", "window", "furniture"],
        IssueCategory::Furniture,
        IssuePriority::Low,
    ),
    (
        &["security", "theft", "lock", "break-in"],
        IssueCategory::Security,
        IssuePriority::High,
    ),
];

/// Categorise an issue from keywords in its title and description.
pub fn categorize(title: &str, description: &str) -> IssuePrediction {
    let text = format!("{title} {description}").to_lowercase();
    let (category, priority) = CATEGORY_RULES
        .iter()
        .find(|(words, _, _)| words.iter().any(|word| text.contains(word)))
        .map_or((IssueCategory::Others, IssuePriority::Medium), |(_, c, p)| {
            (*c, *p)
        });
    IssuePrediction {
        category,
        priority,
        confidence_score: FALLBACK_CONFIDENCE,
        estimated_resolution_hours: FALLBACK_HOURS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_needs_a_whole_word() {
        assert!(chat_reply("Hi there").starts_with("Hello!"));
        // "this" and "which" contain "hi" but are not greetings.
        assert!(chat_reply("which day is this menu for").contains("'Mess'"));
    }

    #[test]
    fn rules_apply_in_order() {
        // Mentions both an issue and water; the issue rule comes first.
        assert!(chat_reply("I have an issue with water").contains("'Create Issue'"));
        assert!(chat_reply("There is a water leak").contains("'Plumbing'"));
        assert!(chat_reply("FIRE in block 2").starts_with("FOR EMERGENCIES"));
        assert!(chat_reply("how do I apply for a gate pass").contains("'Gate Pass'"));
        assert!(chat_reply("Thanks a lot").starts_with("You're welcome"));
    }

    #[test]
    fn unmatched_chat() {
        assert_eq!(chat_reply("qwerty"), DEFAULT_CHAT_REPLY);
    }

    #[test]
    fn categorisation() {
        let prediction = categorize("Fan not working", "The ceiling fan stopped");
        assert_eq!(prediction.category, IssueCategory::Electrical);
        assert_eq!(prediction.priority, IssuePriority::High);
        assert_eq!(prediction.confidence_score, FALLBACK_CONFIDENCE);
        assert_eq!(prediction.estimated_resolution_hours, FALLBACK_HOURS);

        let prediction = categorize("Room smells", "Garbage not collected");
        assert_eq!(prediction.category, IssueCategory::Cleanliness);
        assert_eq!(prediction.priority, IssuePriority::Medium);

        let prediction = categorize("Noise", "Neighbours are loud at night");
        assert_eq!(prediction.category, IssueCategory::Others);
        assert_eq!(prediction.priority, IssuePriority::Medium);
    }

    #[test]
    fn plumbing_wins_over_later_rules() {
        let prediction = categorize("Shower light", "Water drips onto the light");
        assert_eq!(prediction.category, IssueCategory::Plumbing);
    }
}
