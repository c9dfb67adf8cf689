use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::text::normalize_whitespace;

static RE_IN_CHAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)\s*\(in the chair\)$").expect("invalid regex: in the chair")
});
static RE_ONE_PAREN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^()]+?)\s*\(([^()]+)\)$").expect("invalid regex: one parenthesis")
});
static RE_TWO_PARENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^()]+?)\s*\(([^()]+)\)\s*\(([^()]+)\)$").expect("invalid regex: two parentheses")
});
static RE_PLAIN_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][^()\[\]:;]{0,79}$").expect("invalid regex: plain name")
});
static RE_HONORIFIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Mr|Ms|Mrs|Miss|Dr|Sir)\.?\s+(.+)$").expect("invalid regex: honorific")
});
static RE_OFFICE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^The\b|\b(Speaker|Chair|Chairman|Chairwoman|Deputy|Minister|Secretary|Solicitor|Attorney|Advocate|Leader|Whip|Lord Privy Seal|Paymaster)\b")
        .expect("invalid regex: office title")
});
static RE_PERSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Mr|Ms|Mrs|Miss|Dr|Sir|Lord|Baroness|Baron|Viscount|Earl|Countess|Duke|Lady|Dame|Bishop)\b")
        .expect("invalid regex: person")
});

pub const DEBATE_CHAIR: &str = "Debate Chair";

/// A speaker identity resolved from a label such as
/// `Mr David Hanson (Delyn) (Lab):`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Member {
    /// The label as printed, without the trailing colon.
    pub printed_name: String,
    pub name: String,
    /// Surname-led key used to match later mentions of the same person.
    pub search_name: String,
    /// Full name with the honorific stripped, order preserved.
    pub index_name: String,
    pub post: Option<String>,
    pub party: Option<String>,
    pub constituency: Option<String>,
}

impl Member {
    fn new(printed_name: &str, name: &str) -> Self {
        Member {
            printed_name: printed_name.to_string(),
            name: name.to_string(),
            search_name: search_key(name),
            index_name: index_key(name),
            post: None,
            party: None,
            constituency: None,
        }
    }
}

/// Resolves raw speaker labels and caches identities for one parsing run.
#[derive(Debug, Default)]
pub struct MemberResolver {
    cache: HashMap<String, Arc<Member>>,
}

impl MemberResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` when the label does not introduce a speaker, in which
    /// case the paragraph continues the current contribution.
    pub fn resolve(&mut self, raw_label: &str) -> Option<Arc<Member>> {
        let member = parse_label(raw_label)?;
        let cached = self
            .cache
            .entry(member.search_name.clone())
            .or_insert_with(|| Arc::new(member));
        Some(Arc::clone(cached))
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Parses a label without consulting the cache.
pub fn parse_label(raw_label: &str) -> Option<Member> {
    let label = normalize_whitespace(raw_label);
    let label = label.strip_suffix(':')?.trim_end();
    if label.is_empty() {
        return None;
    }

    if let Some(caps) = RE_IN_CHAIR.captures(label) {
        let name = caps[1].trim();
        return Some(Member {
            printed_name: label.to_string(),
            name: name.to_string(),
            search_name: name.to_string(),
            index_name: name.to_string(),
            post: Some(DEBATE_CHAIR.to_string()),
            party: None,
            constituency: None,
        });
    }

    if let Some(caps) = RE_TWO_PARENS.captures(label) {
        let mut member = Member::new(label, caps[1].trim());
        member.constituency = Some(caps[2].trim().to_string());
        member.party = Some(caps[3].trim().to_string());
        return Some(member);
    }

    if let Some(caps) = RE_ONE_PAREN.captures(label) {
        let outer = caps[1].trim();
        let inner = caps[2].trim();
        // "<post> (<name>)" unless the outer part is itself a person and the
        // inner part a constituency.
        if RE_OFFICE_TITLE.is_match(outer) || RE_PERSON.is_match(inner) {
            let mut member = Member::new(label, inner);
            member.post = Some(outer.to_string());
            return Some(member);
        }
        let mut member = Member::new(label, outer);
        member.constituency = Some(inner.to_string());
        return Some(member);
    }

    if RE_PLAIN_NAME.is_match(label) {
        return Some(Member::new(label, label));
    }

    None
}

/// Surname-led key. With an honorific the title is moved behind the surname
/// and the presumed first name dropped, so `Mr David Hanson` and `Mr Hanson`
/// share the key `Hanson, Mr`. Office titles are used verbatim.
pub fn search_key(name: &str) -> String {
    let name = normalize_whitespace(name);
    if RE_OFFICE_TITLE.is_match(&name) {
        return name;
    }

    if let Some(caps) = RE_HONORIFIC.captures(&name) {
        let title = &caps[1];
        let surname = caps[2].split_whitespace().last().unwrap_or_default();
        return format!("{}, {}", surname, title);
    }

    let tokens: Vec<&str> = name.split_whitespace().collect();
    match tokens.split_last() {
        Some((surname, given)) if !given.is_empty() => {
            format!("{}, {}", surname, given.join(" "))
        }
        _ => name,
    }
}

pub fn index_key(name: &str) -> String {
    let name = normalize_whitespace(name);
    if RE_OFFICE_TITLE.is_match(&name) {
        return name;
    }
    match RE_HONORIFIC.captures(&name) {
        Some(caps) => caps[2].to_string(),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_time_speaker() {
        let member = parse_label("Mr David Hanson (Delyn) (Lab):").expect("should resolve");
        assert_eq!(member.name, "Mr David Hanson");
        assert_eq!(member.search_name, "Hanson, Mr");
        assert_eq!(member.index_name, "David Hanson");
        assert_eq!(member.constituency.as_deref(), Some("Delyn"));
        assert_eq!(member.party.as_deref(), Some("Lab"));
        assert!(member.post.is_none());
    }

    #[test]
    fn test_repeat_mention_returns_cached_identity() {
        let mut resolver = MemberResolver::new();
        let first = resolver
            .resolve("Mr David Hanson (Delyn) (Lab):")
            .expect("should resolve");
        let again = resolver.resolve("Mr Hanson:").expect("should resolve");

        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(again.index_name, "David Hanson");
        assert_eq!(again.constituency.as_deref(), Some("Delyn"));
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_chair() {
        let member = parse_label("Mr Jim Hood (in the Chair):").expect("should resolve");
        assert_eq!(member.post.as_deref(), Some(DEBATE_CHAIR));
        assert_eq!(member.name, "Mr Jim Hood");
        assert_eq!(member.search_name, "Mr Jim Hood");
        assert_eq!(member.index_name, "Mr Jim Hood");
    }

    #[test]
    fn test_office_holder() {
        let member =
            parse_label("The Secretary of State for Wales (Mrs Cheryl Gillan):").expect("resolve");
        assert_eq!(
            member.post.as_deref(),
            Some("The Secretary of State for Wales")
        );
        assert_eq!(member.name, "Mrs Cheryl Gillan");
        assert_eq!(
            member.printed_name,
            "The Secretary of State for Wales (Mrs Cheryl Gillan)"
        );
        assert_eq!(member.search_name, "Gillan, Mrs");
        assert_eq!(member.index_name, "Cheryl Gillan");
    }

    #[test]
    fn test_deputy_speaker_does_not_collide_with_speaker() {
        let mut resolver = MemberResolver::new();
        let speaker = resolver.resolve("Mr Speaker:").expect("resolve");
        let deputy = resolver.resolve("Mr Deputy Speaker:").expect("resolve");
        assert!(!Arc::ptr_eq(&speaker, &deputy));
        assert_eq!(speaker.search_name, "Mr Speaker");
        assert_eq!(deputy.index_name, "Mr Deputy Speaker");
    }

    #[test]
    fn test_name_without_honorific() {
        let mut resolver = MemberResolver::new();
        let first = resolver
            .resolve("Natascha Engel (North East Derbyshire) (Lab):")
            .expect("resolve");
        assert_eq!(first.index_name, "Natascha Engel");
        assert_eq!(first.search_name, "Engel, Natascha");

        let again = resolver.resolve("Natascha Engel:").expect("resolve");
        assert!(Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn test_name_with_constituency_only() {
        let member = parse_label("Mr Peter Bone (Wellingborough):").expect("resolve");
        assert_eq!(member.constituency.as_deref(), Some("Wellingborough"));
        assert!(member.post.is_none());
        assert_eq!(member.index_name, "Peter Bone");
    }

    #[test]
    fn test_lords_office_holder() {
        let member = parse_label("The Deputy Speaker (Lord Geddes):").expect("resolve");
        assert_eq!(member.post.as_deref(), Some("The Deputy Speaker"));
        assert_eq!(member.name, "Lord Geddes");
    }

    #[test]
    fn test_not_a_speaker() {
        assert!(parse_label("Sitting suspended.").is_none());
        assert!(parse_label("AYES").is_none());
        assert!(parse_label(":").is_none());
        assert!(parse_label("the hon. Gentleman said: ").is_none());
    }
}
