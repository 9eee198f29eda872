/// Phrases freelancers use when advertising their own services. A line that
/// contains any of them is not a job request.
pub const NEGATIVE_PHRASES: [&str; 9] = [
    "i will",
    "i can",
    "i offer",
    "my service",
    "my gig",
    "hire me",
    "check out my gig",
    "offering my services",
    "available for work",
];

pub fn is_job_request(line: &str) -> bool {
    let line = line.to_lowercase();
    !NEGATIVE_PHRASES.iter().any(|phrase| line.contains(phrase))
}

/// Loose match: a single token of the search term appearing anywhere in the
/// line is enough.
pub fn matches_term(line: &str, search_term: &str) -> bool {
    let line = line.to_lowercase();
    search_term
        .split_whitespace()
        .any(|token| line.contains(&token.to_lowercase()))
}
