use crate::columns::ColumnRange;
use crate::document::{Component, Paragraph, ParagraphKind, Section, SectionKind};
use crate::ids::{self, Sequence};
use crate::state::{Event, ParseState, TransitionHook};

use super::division::DivisionBuilder;

/// The section currently receiving paragraphs.
#[derive(Debug)]
pub(super) struct OpenSection {
    pub section: Section,
    pub columns: ColumnRange,
    paragraphs: Sequence,
    contributions: Sequence,
}

/// A container section that stays open while its children are parsed.
#[derive(Debug)]
pub(super) struct Frame {
    pub section: Section,
    columns: ColumnRange,
    children: Sequence,
}

#[derive(Debug, Clone)]
pub(super) struct Speaker {
    pub key: String,
    pub label: String,
    pub contribution_id: String,
}

/// Everything the close hook touches: the component under construction, the
/// open section, the container path above it and the pending buffers.
#[derive(Debug)]
pub(super) struct Context {
    pub component: Component,
    sections: Sequence,
    pub open: Option<OpenSection>,
    pub containers: Vec<Frame>,
    pub division: Option<DivisionBuilder>,
    pub speaker: Option<Speaker>,
    pub column: Option<String>,
    pub link: Option<String>,
}

impl Context {
    pub fn new(component: Component) -> Self {
        Context {
            component,
            sections: Sequence::default(),
            open: None,
            containers: Vec::new(),
            division: None,
            speaker: None,
            column: None,
            link: None,
        }
    }

    fn new_section(&mut self, kind: SectionKind, title: &str) -> Section {
        let (id, sequence, parent_id) = match self.containers.last_mut() {
            Some(frame) => {
                let sequence = frame.children.next();
                (
                    ids::section_id(&frame.section.id, sequence),
                    sequence,
                    Some(frame.section.id.clone()),
                )
            }
            None => {
                let sequence = self.sections.next();
                (ids::section_id(&self.component.id, sequence), sequence, None)
            }
        };
        let mut section = Section::new(&id, kind, title, sequence);
        section.parent_id = parent_id;
        section.url = self.link.clone();
        section
    }

    fn observed_columns(&self) -> ColumnRange {
        let mut columns = ColumnRange::new();
        if let Some(column) = &self.column {
            columns.observe(column);
        }
        columns
    }

    pub fn open_section(&mut self, kind: SectionKind, title: &str) -> &mut Section {
        self.close_open_section();
        let section = self.new_section(kind, title);
        log::debug!(
            "Opened {} section {} '{}'",
            section.kind.name(),
            section.id,
            section.title
        );
        let columns = self.observed_columns();
        let open = self.open.insert(OpenSection {
            section,
            columns,
            paragraphs: Sequence::default(),
            contributions: Sequence::default(),
        });
        &mut open.section
    }

    pub fn push_container(&mut self, kind: SectionKind, title: &str, link: Option<String>) {
        let mut section = self.new_section(kind, title);
        if link.is_some() {
            section.url = link;
        }
        log::debug!("Opened container {} '{}'", section.id, section.title);
        let columns = self.observed_columns();
        self.containers.push(Frame {
            section,
            columns,
            children: Sequence::default(),
        });
    }

    /// Closes containers until `keep` remain.
    pub fn pop_containers(&mut self, keep: usize) {
        while self.containers.len() > keep {
            let Some(frame) = self.containers.pop() else {
                break;
            };
            let mut section = frame.section;
            section.columns = frame.columns.finalize();
            self.attach(section);
        }
    }

    fn attach(&mut self, section: Section) {
        match self.containers.last_mut() {
            Some(frame) => {
                for column in &section.columns {
                    frame.columns.observe(column);
                }
                frame.section.upsert_child(section);
            }
            None => self.component.upsert_section(section),
        }
    }

    /// Appends a paragraph to the open section, returning its sequence.
    pub fn add_paragraph(&mut self, kind: ParagraphKind) -> Option<u32> {
        let open = self.open.as_mut()?;
        let sequence = open.paragraphs.next();
        if let Some(column) = &self.column {
            open.columns.observe(column);
        }
        open.section.paragraphs.push(Paragraph {
            id: ids::paragraph_id(&open.section.id, sequence),
            sequence,
            column: self.column.clone(),
            url: self.link.clone(),
            kind,
        });
        Some(sequence)
    }

    /// Appends a paragraph to the innermost container.
    pub fn add_container_paragraph(&mut self, kind: ParagraphKind) {
        let Some(frame) = self.containers.last_mut() else {
            return;
        };
        let sequence = frame.section.paragraphs.len() as u32 + 1;
        if let Some(column) = &self.column {
            frame.columns.observe(column);
        }
        frame.section.paragraphs.push(Paragraph {
            id: ids::paragraph_id(&frame.section.id, sequence),
            sequence,
            column: self.column.clone(),
            url: self.link.clone(),
            kind,
        });
    }

    pub fn next_contribution_id(&mut self) -> Option<String> {
        let open = self.open.as_mut()?;
        let sequence = open.contributions.next();
        Some(ids::contribution_id(&open.section.id, sequence))
    }

    /// Emits the pending division: as a paragraph when the open section can
    /// hold one, otherwise as a section of its own.
    pub fn flush_division(&mut self) {
        let Some(builder) = self.division.take() else {
            return;
        };
        if builder.is_empty() {
            return;
        }
        let division = builder.finish();

        if self
            .open
            .as_ref()
            .is_some_and(|open| open.section.kind.holds_divisions())
        {
            self.add_paragraph(ParagraphKind::Division(division));
            return;
        }

        let title = match &division.number {
            Some(number) => format!("Division No. {}", number),
            None => "Division".to_string(),
        };
        let mut section = self.new_section(SectionKind::Division(division), &title);
        section.columns = self.observed_columns().finalize();
        log::debug!("Recorded standalone division {}", section.id);
        self.attach(section);
    }

    /// Finalizes the open section: flushes buffers, collapses the column range,
    /// derives the member list and attaches it to its parent. A no-op when
    /// nothing is open.
    pub fn close_open_section(&mut self) {
        self.flush_division();
        self.speaker = None;

        let Some(open) = self.open.take() else {
            return;
        };
        let mut section = open.section;
        section.columns = open.columns.finalize();

        let mut members: Vec<String> = Vec::new();
        for speaker in section.speakers() {
            if !members.iter().any(|m| m == speaker) {
                members.push(speaker.to_string());
            }
        }
        section.members = members;

        log::debug!(
            "Closed section {} with {} paragraph(s)",
            section.id,
            section.paragraphs.len()
        );
        self.attach(section);
    }

    pub fn finish(mut self) -> Component {
        self.close_open_section();
        self.pop_containers(0);
        self.component
    }
}

impl TransitionHook for Context {
    fn before_transition(&mut self, from: ParseState, event: Event) {
        log::trace!("Finalizing open section before {} from {:?}", event, from);
        self.close_open_section();
    }
}
