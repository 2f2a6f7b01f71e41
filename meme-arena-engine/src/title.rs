//! Personalised voter titles derived from recent upvotes.

/// How many of the caller's latest upvotes are considered.
pub const RECENT_UPVOTE_WINDOW: usize = 5;

pub const ANONYMOUS_TITLE: &str = "Cyber Warrior";
pub const NEWCOMER_TITLE: &str = "Rising Champion";

/// Checked in order against the lowercased titles of upvoted memes.
const KEYWORD_TITLES: [(&str, &str); 9] = [
    ("bug", "Code Slayer"),
    ("production", "Deploy Master"),
    ("client", "Client Whisperer"),
    ("code", "Syntax Samurai"),
    ("emotional", "Feels Guardian"),
    ("damage", "Chaos Controller"),
    ("monitor", "Screen Collector"),
    ("frontend", "UI Ninja"),
    ("backend", "Logic Lord"),
];

const FALLBACK_TITLES: [&str; 4] = ["Meme Connoisseur", "Humor Expert", "Laugh Master", "Comedy Critic"];

/// Picks a title for an identified voter.
///
/// `upvote_count` is the number of recent upvotes (at most
/// [`RECENT_UPVOTE_WINDOW`]); `upvoted_titles` are the titles of the memes
/// they point at that still exist.
pub fn voter_title(upvoted_titles: &[String], upvote_count: usize) -> &'static str {
    if upvote_count == 0 {
        return NEWCOMER_TITLE;
    }

    let lowered: Vec<String> = upvoted_titles.iter().map(|t| t.to_lowercase()).collect();
    for (keyword, title) in KEYWORD_TITLES {
        if lowered.iter().any(|t| t.contains(keyword)) {
            return title;
        }
    }

    FALLBACK_TITLES[upvote_count % FALLBACK_TITLES.len()]
}
