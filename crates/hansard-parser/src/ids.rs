//! Stable identifiers. Every identifier is its parent's identifier plus a
//! zero-padded running sequence, so re-parsing the same source yields the same
//! identifiers.

use chrono::NaiveDate;

use crate::types::House;

pub fn daily_part_id(date: NaiveDate, house: House) -> String {
    format!("{}_hansard_{}", date.format("%Y-%m-%d"), house.slug())
}

pub fn component_id(daily_part_id: &str, prefix: &str) -> String {
    format!("{}_{}", daily_part_id, prefix)
}

pub fn section_id(parent_id: &str, sequence: u32) -> String {
    format!("{}_{:06}", parent_id, sequence)
}

pub fn paragraph_id(section_id: &str, sequence: u32) -> String {
    format!("{}_p{:06}", section_id, sequence)
}

pub fn contribution_id(debate_id: &str, sequence: u32) -> String {
    format!("{}__{:06}", debate_id, sequence)
}

/// Hands out sequence numbers starting at 1.
#[derive(Debug, Clone, Default)]
pub struct Sequence(u32);

impl Sequence {
    pub fn next(&mut self) -> u32 {
        self.0 += 1;
        self.0
    }

    pub fn current(&self) -> u32 {
        self.0
    }
}
