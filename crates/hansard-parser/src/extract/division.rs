use std::sync::LazyLock;

use regex::Regex;

use crate::document::Division;

static RE_DIVIDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^The (House|Committee) (having )?divided").expect("invalid regex: divided")
});
static RE_TALLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:Ayes|Contents)\s*(\d+)\s*[,;]\s*(?:Noes|Not[- ]Contents)\s*(\d+)")
        .expect("invalid regex: tally")
});
static RE_DIVISION_NO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Division No\.\s*(\d+)").expect("invalid regex: division number")
});
static RE_DIVISION_ON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Division on\b").expect("invalid regex: division on")
});
static RE_DIVISION_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\s*(\d{1,2}(?:[.:]\d{2})?\s*(?:am|pm))").expect("invalid regex: division time")
});
static RE_TELLERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Tellers for the (Ayes|Noes|Contents|Not[- ]Contents)\s*:?\s*(.*)$")
        .expect("invalid regex: tellers")
});
static RE_LIST_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^,()\[\]]+,(\s.*)?$").expect("invalid regex: list name")
});
static RE_DIVISION_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(Question accordingly|Resolved(,| in the (affirmative|negative))|Ordered,)|\b(agreed to|negatived|disagreed to)\.?$|\b(agreed|disagreed)( accordingly)?\.$",
    )
    .expect("invalid regex: division end")
});

/// Whether a line opens a division record.
pub fn starts_division(line: &str) -> bool {
    RE_DIVIDED.is_match(line) || RE_DIVISION_NO.is_match(line) || RE_DIVISION_ON.is_match(line)
}

/// Whether a line is part of the division record rather than speech.
pub fn is_division_line(line: &str) -> bool {
    let line = line.trim();
    starts_division(line)
        || RE_TALLY.is_match(line)
        || RE_DIVISION_TIME.is_match(line)
        || RE_TELLERS.is_match(line)
        || list_marker(line).is_some()
}

fn list_marker(line: &str) -> Option<List> {
    match line.trim_end_matches(':').to_uppercase().as_str() {
        "AYES" | "CONTENTS" => Some(List::Ayes),
        "NOES" | "NOT-CONTENTS" | "NOT CONTENTS" => Some(List::Noes),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum List {
    Ayes,
    Noes,
    TellersAyes,
    TellersNoes,
}

/// Accumulates the lines of one division until it is flushed.
#[derive(Debug, Clone, Default)]
pub struct DivisionBuilder {
    division: Division,
    list: Option<List>,
}

impl DivisionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line. Returns `false` when the line is not part of the
    /// division, which ends it.
    pub fn feed(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return true;
        }
        // Lords print the outcome between the tally and the lists.
        if RE_DIVISION_END.is_match(line) {
            return self.list.is_none();
        }

        let mut matched = RE_DIVIDED.is_match(line) || RE_DIVISION_ON.is_match(line);
        if let Some(caps) = RE_TALLY.captures(line) {
            self.division.ayes_count = caps[1].parse().ok();
            self.division.noes_count = caps[2].parse().ok();
            matched = true;
        }
        if let Some(caps) = RE_DIVISION_NO.captures(line) {
            self.division.number = Some(caps[1].to_string());
            matched = true;
        }
        if let Some(caps) = RE_DIVISION_TIME.captures(line) {
            self.division.time = Some(caps[1].to_string());
            matched = true;
        }
        if matched {
            return true;
        }

        if let Some(list) = list_marker(line) {
            self.list = Some(list);
            return true;
        }

        if let Some(caps) = RE_TELLERS.captures(line) {
            let list = if caps[1].eq_ignore_ascii_case("ayes")
                || caps[1].eq_ignore_ascii_case("contents")
            {
                List::TellersAyes
            } else {
                List::TellersNoes
            };
            self.list = Some(list);
            self.push_tellers(&caps[2]);
            return true;
        }

        match self.list {
            Some(List::Ayes) => {
                push_name(&mut self.division.ayes, line);
                true
            }
            Some(List::Noes) => {
                push_name(&mut self.division.noes, line);
                true
            }
            Some(List::TellersAyes | List::TellersNoes) => {
                self.push_tellers(line);
                true
            }
            None => false,
        }
    }

    fn push_tellers(&mut self, line: &str) {
        let tellers = match self.list {
            Some(List::TellersAyes) => &mut self.division.tellers_ayes,
            Some(List::TellersNoes) => &mut self.division.tellers_noes,
            _ => return,
        };
        for name in line.split(" and ") {
            let name = name.trim().trim_end_matches(" and").trim();
            if !name.is_empty() && name != "and" {
                tellers.push(name.to_string());
            }
        }
    }

    /// Whether a vote or tellers list has been opened.
    pub fn has_lists(&self) -> bool {
        self.list.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.division == Division::default()
    }

    pub fn finish(self) -> Division {
        self.division
    }
}

/// A line that does not look like "Surname, Forename" continues the previous
/// entry: it was wrapped onto a new line in the source.
fn push_name(list: &mut Vec<String>, line: &str) {
    if RE_LIST_NAME.is_match(line) {
        list.push(line.to_string());
        return;
    }
    match list.pop() {
        Some(previous) => list.push(format!("{} {}", previous, line)),
        None => list.push(line.to_string()),
    }
}
