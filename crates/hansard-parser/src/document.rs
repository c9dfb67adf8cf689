use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::types::{House, TranscriptType};

/// One day's record for one house.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DailyPart {
    pub id: String,
    pub date: NaiveDate,
    pub house: House,
    pub volume: Option<String>,
    pub part: Option<String>,
    pub components: Vec<Component>,
}

impl DailyPart {
    pub fn new(id: &str, date: NaiveDate, house: House) -> Self {
        DailyPart {
            id: id.to_string(),
            date,
            house,
            volume: None,
            part: None,
            components: Vec::new(),
        }
    }

    /// Replaces a component with the same identifier, else appends it, keeping
    /// components in sequence order.
    pub fn upsert_component(&mut self, component: Component) {
        match self.components.iter_mut().find(|c| c.id == component.id) {
            Some(existing) => *existing = component,
            None => {
                self.components.push(component);
                self.components.sort_by_key(|c| c.sequence);
            }
        }
    }

    pub fn component(&self, transcript: TranscriptType) -> Option<&Component> {
        self.components.iter().find(|c| c.transcript == transcript)
    }
}

impl Display for DailyPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "┌─ {} ─ {}", self.house, self.date)?;
        if let Some(volume) = &self.volume {
            write!(f, "│  Volume {}", volume)?;
            if let Some(part) = &self.part {
                write!(f, " · Part {}", part)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "└─ {} component(s)", self.components.len())?;
        for component in &self.components {
            writeln!(f)?;
            write!(f, "{}", component)?;
        }
        Ok(())
    }
}

/// One transcript type within a daily part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Component {
    pub id: String,
    pub name: String,
    pub transcript: TranscriptType,
    pub sequence: u32,
    pub url: Option<String>,
    pub sections: Vec<Section>,
}

impl Component {
    pub fn upsert_section(&mut self, section: Section) {
        upsert(&mut self.sections, section);
    }

    /// Every section in document order, children after their parent.
    pub fn all_sections(&self) -> Vec<&Section> {
        let mut out = Vec::new();
        for section in &self.sections {
            section.collect(&mut out);
        }
        out
    }
}

impl Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "══ {} ({})", self.name, self.id)?;
        for section in &self.sections {
            section.render(f, 0)?;
        }
        Ok(())
    }
}

fn upsert(sections: &mut Vec<Section>, section: Section) {
    match sections.iter_mut().find(|s| s.id == section.id) {
        Some(existing) => *existing = section,
        None => {
            sections.push(section);
            sections.sort_by_key(|s| s.sequence);
        }
    }
}

/// One logical unit of business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Section {
    pub id: String,
    pub kind: SectionKind,
    pub title: String,
    pub url: Option<String>,
    pub sequence: u32,
    pub columns: Vec<String>,
    pub parent_id: Option<String>,
    /// Unique speakers, in order of first contribution.
    pub members: Vec<String>,
    pub paragraphs: Vec<Paragraph>,
    pub children: Vec<Section>,
}

impl Section {
    pub fn new(id: &str, kind: SectionKind, title: &str, sequence: u32) -> Self {
        Section {
            id: id.to_string(),
            kind,
            title: title.to_string(),
            url: None,
            sequence,
            columns: Vec::new(),
            parent_id: None,
            members: Vec::new(),
            paragraphs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn upsert_child(&mut self, child: Section) {
        upsert(&mut self.children, child);
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Section>) {
        out.push(self);
        for child in &self.children {
            child.collect(out);
        }
    }

    pub fn speakers(&self) -> impl Iterator<Item = &str> {
        self.paragraphs.iter().filter_map(|p| p.kind.speaker())
    }

    fn render(&self, f: &mut std::fmt::Formatter<'_>, depth: usize) -> std::fmt::Result {
        let indent = "  ".repeat(depth);
        write!(f, "{}── [{}] {}", indent, self.kind.name(), self.title)?;
        if !self.columns.is_empty() {
            write!(f, " (col. {})", self.columns.join("-"))?;
        }
        writeln!(f)?;
        if let Some(department) = self.kind.department() {
            writeln!(f, "{}   Department: {}", indent, department)?;
        }
        if !self.members.is_empty() {
            writeln!(f, "{}   Members: {}", indent, self.members.join(", "))?;
        }
        for paragraph in &self.paragraphs {
            writeln!(f, "{}   {}", indent, paragraph)?;
        }
        for child in &self.children {
            child.render(f, depth + 1)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionKind {
    Container,
    Debate {
        bill_title: Option<String>,
        bill_stage: Option<String>,
        chair: Vec<String>,
    },
    Statement {
        department: Option<String>,
    },
    Question {
        department: Option<String>,
        asked_by: Option<String>,
        number: Option<String>,
        uin: Option<String>,
        question_type: String,
    },
    Petition {
        petition_number: Option<String>,
    },
    PetitionObservation {
        petition_id: Option<String>,
        department: Option<String>,
    },
    MinisterialCorrection {
        department: Option<String>,
    },
    Preamble {
        chair: Vec<String>,
    },
    MemberIntroduction,
    Division(Division),
    SectionGroup,
}

impl SectionKind {
    pub fn debate() -> Self {
        SectionKind::Debate {
            bill_title: None,
            bill_stage: None,
            chair: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::Container => "Container",
            SectionKind::Debate { .. } => "Debate",
            SectionKind::Statement { .. } => "Statement",
            SectionKind::Question { .. } => "Question",
            SectionKind::Petition { .. } => "Petition",
            SectionKind::PetitionObservation { .. } => "PetitionObservation",
            SectionKind::MinisterialCorrection { .. } => "MinisterialCorrection",
            SectionKind::Preamble { .. } => "Preamble",
            SectionKind::MemberIntroduction => "MemberIntroduction",
            SectionKind::Division(_) => "Division",
            SectionKind::SectionGroup => "SectionGroup",
        }
    }

    pub fn department(&self) -> Option<&str> {
        match self {
            SectionKind::Statement { department }
            | SectionKind::Question { department, .. }
            | SectionKind::PetitionObservation { department, .. }
            | SectionKind::MinisterialCorrection { department } => department.as_deref(),
            _ => None,
        }
    }

    /// Sections that can hold a division paragraph.
    pub fn holds_divisions(&self) -> bool {
        matches!(
            self,
            SectionKind::Debate { .. }
                | SectionKind::Statement { .. }
                | SectionKind::Question { .. }
                | SectionKind::MemberIntroduction
        )
    }

    pub fn add_chair(&mut self, name: &str) -> bool {
        match self {
            SectionKind::Debate { chair, .. } | SectionKind::Preamble { chair } => {
                if !chair.iter().any(|c| c == name) {
                    chair.push(name.to_string());
                }
                true
            }
            _ => false,
        }
    }
}

/// A recorded vote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Division {
    pub number: Option<String>,
    pub time: Option<String>,
    pub ayes_count: Option<u32>,
    pub noes_count: Option<u32>,
    pub ayes: Vec<String>,
    pub noes: Vec<String>,
    pub tellers_ayes: Vec<String>,
    pub tellers_noes: Vec<String>,
}

impl Display for Division {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Division")?;
        if let Some(number) = &self.number {
            write!(f, " No. {}", number)?;
        }
        if let Some(time) = &self.time {
            write!(f, " [{}]", time)?;
        }
        write!(
            f,
            ": Ayes {}, Noes {}",
            self.ayes_count.unwrap_or(self.ayes.len() as u32),
            self.noes_count.unwrap_or(self.noes.len() as u32)
        )
    }
}

/// The atomic unit of text within a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Paragraph {
    pub id: String,
    pub sequence: u32,
    pub column: Option<String>,
    pub url: Option<String>,
    pub kind: ParagraphKind,
}

impl Display for Paragraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let preview: String = self.kind.text().chars().take(100).collect();
        match &self.kind {
            ParagraphKind::Contribution { speaker_label, .. }
            | ParagraphKind::ContributionTable { speaker_label, .. } => {
                write!(f, "▸ {}: {}", speaker_label, preview)
            }
            ParagraphKind::Timestamp { text } => write!(f, "⏱ {}", text),
            ParagraphKind::Division(division) => write!(f, "☐ {}", division),
            _ => write!(f, "· {}", preview),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParagraphKind {
    Contribution {
        text: String,
        html: String,
        speaker: String,
        speaker_label: String,
        contribution_id: String,
    },
    NonContribution {
        text: String,
        html: String,
    },
    Timestamp {
        text: String,
    },
    ContributionTable {
        html: String,
        speaker: String,
        speaker_label: String,
        contribution_id: String,
    },
    NonContributionTable {
        html: String,
    },
    Division(Division),
}

impl ParagraphKind {
    pub fn text(&self) -> &str {
        match self {
            ParagraphKind::Contribution { text, .. }
            | ParagraphKind::NonContribution { text, .. }
            | ParagraphKind::Timestamp { text } => text,
            ParagraphKind::ContributionTable { html, .. }
            | ParagraphKind::NonContributionTable { html } => html,
            ParagraphKind::Division(_) => "",
        }
    }

    pub fn speaker(&self) -> Option<&str> {
        match self {
            ParagraphKind::Contribution { speaker, .. }
            | ParagraphKind::ContributionTable { speaker, .. } => Some(speaker),
            _ => None,
        }
    }

    pub fn contribution_id(&self) -> Option<&str> {
        match self {
            ParagraphKind::Contribution {
                contribution_id, ..
            }
            | ParagraphKind::ContributionTable {
                contribution_id, ..
            } => Some(contribution_id),
            _ => None,
        }
    }
}
