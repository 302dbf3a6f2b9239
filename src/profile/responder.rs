use super::{ASSISTANT_NAME, ProfileRecord};
use fancy_regex::Regex;
use std::sync::LazyLock;

const BIO_KEYWORDS: &[&str] = &[
    "bakhat",
    "muhammad",
    "nasar",
    "about bakhat",
    "who is bakhat",
    "who is muhammad",
    "bio of bakhat",
];

// Whole words only: "function" must not read as "fun". Word characters are
// ASCII, so "我fun" still counts.
static HOBBY_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?<![A-Za-z0-9_])(hobby|hobbies|fun)(?![A-Za-z0-9_])").ok()
});

fn contains_any(q: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| q.contains(n))
}

fn mentions_hobbies(q: &str) -> bool {
    HOBBY_PATTERN
        .as_ref()
        .and_then(|re| re.is_match(q).ok())
        .unwrap_or(false)
}

/// Answer `question` from the profile alone.
///
/// Case-insensitive keyword rules, checked in a fixed order; the first rule
/// that matches decides the answer. Never fails and never returns an empty
/// string: anything unmatched (including an empty question) gets the
/// introductory fallback.
pub fn respond(question: &str, profile: &ProfileRecord) -> String {
    let q = question.to_lowercase();

    if q.contains("name") {
        return format!("His name is {}.", profile.name);
    }

    if contains_any(&q, BIO_KEYWORDS) {
        return profile.bio.clone();
    }

    if contains_any(&q, &["skill", "tech", "stack"]) {
        return format!("Key skills: {}.", profile.skills.join(", "));
    }

    if q.contains("project") {
        return profile
            .projects
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{}. {} — {}", i + 1, p.title, p.desc))
            .collect::<Vec<_>>()
            .join("\n");
    }

    if contains_any(&q, &["goal", "future"]) {
        return format!("Goals: {}.", profile.goals.join(", "));
    }

    if mentions_hobbies(&q) {
        return format!("Hobbies: {}.", profile.hobbies.join(", "));
    }

    if contains_any(&q, &["contact", "email", "linkedin", "github"]) {
        let c = &profile.contact;
        return format!(
            "Contact: email {}. GitHub {}. LinkedIn {}.",
            c.email, c.github, c.linkedin
        );
    }

    if contains_any(&q, &["strongest", "strength"]) {
        let top: Vec<&str> = profile.skills.iter().take(3).map(String::as_str).collect();
        return format!("Strongest areas: {}.", top.join(", "));
    }

    format!(
        "Hi! I am {ASSISTANT_NAME}. Ask me about {}'s skills, projects, goals, hobbies, or contact info, or ask any general question.",
        profile.name
    )
}

/// The widget's opening message. Its wording is recognised as boilerplate
/// and kept out of hosted-model context.
pub fn greeting(profile: &ProfileRecord) -> String {
    format!(
        "Hi 👋 I'm {ASSISTANT_NAME}, here to tell you everything about {}. Ask about projects, skills, goals, hobbies, or contact info.",
        profile.name
    )
}
