//! The segmentation engine. One parameterized extractor walks the node stream
//! of every transcript type; a [`Profile`] decides what headings mean and which
//! sub-modes are active.

mod context;
pub mod division;
pub mod profile;

use std::sync::LazyLock;

use regex::Regex;

use crate::document::{Component, ParagraphKind, SectionKind};
use crate::ids;
use crate::member::{DEBATE_CHAIR, Member, MemberResolver};
use crate::node::{AnchorKind, Classifier, FragmentType, Node, NodeKind};
use crate::state::{Event, ParseState, StateMachine};
use crate::types::ComponentSpec;

use context::{Context, Speaker};
use division::DivisionBuilder;
pub use profile::{ORAL_ANSWER, PrimaryRole, Profile, SubjectKind, WRITTEN_ANSWER};

static RE_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{1,2}(\.\d{2})?\s*(am|pm)|12 noon|12 midnight|noon|midnight)$")
        .expect("invalid regex: timestamp")
});
static RE_QUESTION_LEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:T|Q)?\d+)\.(?:\s*\[(\d+)\])?$").expect("invalid regex: question lead")
});
static RE_UIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]\s*$").expect("invalid regex: uin"));
static RE_PETITION_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(P\d{6})\]").expect("invalid regex: petition number"));
static RE_CHAIR_NOTICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[(.+?) in the Chair\]$").expect("invalid regex: chair notice")
});
static RE_PETITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(The )?(humble )?Petition of\b").expect("invalid regex: petition")
});
static RE_OBSERVATIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Observations? (from|by)\b").expect("invalid regex: observations")
});
static RE_BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(Sitting suspended|Sitting resumed|Question put|Question agreed|Motion made|Debate resumed|Hon\. Members:|Several hon\. Members rose|Bill read|Ordered,|Resolved(,| in the (affirmative|negative))|Adjourned at|Main Question|The (House|Committee) (proceeded|adjourned|being|then|consisted))",
    )
    .expect("invalid regex: boilerplate")
});
static RE_BILL_STAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\[.+\]\s*)?(First Reading|Second Reading|Third Reading|Report Stage|Report|Consideration|Committee|Ways and Means|Money|Programme|Lords Amendments?|Remaining Stages)\b")
        .expect("invalid regex: bill stage")
});
static RE_INTRODUCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(Introduction:|New Members?\b|Members? Sworn\b|Oaths? and Affirmations?\b)")
        .expect("invalid regex: introduction")
});
static RE_DATE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+day,? \d{1,2} \w+ \d{4}$").expect("invalid regex: date line")
});
static RE_NAVIGATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(Next Section|Previous Section|Index|Home Page|Back to top)$")
        .expect("invalid regex: navigation")
});
static RE_PREAMBLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(Prayers\b.*|The (House|Committee) met at .*)$")
        .expect("invalid regex: preamble line")
});

pub const ORAL_ANSWERS: &str = "Oral Answers to Questions";

pub fn is_timestamp(text: &str) -> bool {
    RE_TIMESTAMP.is_match(text.trim())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadingRole {
    Department,
    Subject,
    Topic,
    Introduction,
}

/// A heading waiting for content to decide how it nests.
#[derive(Debug, Clone)]
struct PendingHeading {
    text: String,
    role: HeadingRole,
    link: Option<String>,
}

/// Segments the node stream of one transcript into a [`Component`].
#[derive(Debug)]
pub struct Segmenter<'r> {
    profile: &'static Profile,
    machine: StateMachine,
    ctx: Context,
    classifier: Classifier,
    resolver: &'r mut MemberResolver,
    headings: Vec<PendingHeading>,
    oral: bool,
    department: Option<String>,
    subject: Option<String>,
    last_petition: Option<String>,
    page_url: String,
}

impl<'r> Segmenter<'r> {
    pub fn new(daily_part_id: &str, spec: &ComponentSpec, resolver: &'r mut MemberResolver) -> Self {
        let component = Component {
            id: ids::component_id(daily_part_id, spec.prefix),
            name: spec.name.to_string(),
            transcript: spec.transcript,
            sequence: spec.sequence,
            url: None,
            sections: Vec::new(),
        };
        let mut segmenter = Segmenter {
            profile: Profile::for_transcript(spec.transcript),
            machine: StateMachine::new(),
            ctx: Context::new(component),
            classifier: Classifier::new(),
            resolver,
            headings: Vec::new(),
            oral: false,
            department: None,
            subject: None,
            last_petition: None,
            page_url: String::new(),
        };
        segmenter.transition(Event::Start);
        segmenter
    }

    pub fn state(&self) -> ParseState {
        self.machine.state()
    }

    pub fn feed_page(&mut self, url: &str, nodes: &[Node]) {
        if self.ctx.component.url.is_none() {
            self.ctx.component.url = Some(url.to_string());
        }
        self.page_url = url.to_string();
        log::debug!("Segmenting {} node(s) from {}", nodes.len(), url);
        for node in nodes {
            self.consume(node);
        }
    }

    pub fn finish(mut self) -> Component {
        self.resolve_headings();
        self.transition(Event::Finish);
        let component = self.ctx.finish();
        log::debug!(
            "Finished {} with {} top-level section(s)",
            component.id,
            component.sections.len()
        );
        component
    }

    fn transition(&mut self, event: Event) -> bool {
        match self.machine.fire(event, &mut self.ctx) {
            Ok(_) => true,
            Err(err) => {
                log::debug!("Transition rejected: {}", err);
                false
            }
        }
    }

    fn consume(&mut self, node: &Node) {
        let kind = self.classifier.classify(node);
        self.ctx.link = Some(self.classifier.link(&self.page_url));

        match kind {
            NodeKind::Anchor(AnchorKind::Column(column)) => self.ctx.column = Some(column),
            NodeKind::Anchor(AnchorKind::Fragment(FragmentType::Division)) => {
                self.begin_division()
            }
            NodeKind::Anchor(_) | NodeKind::Ignorable => {}
            NodeKind::Heading(level) => self.heading(level, node),
            NodeKind::Paragraph => self.paragraph(node),
            NodeKind::Table => self.table(node),
        }
    }

    fn heading(&mut self, level: u8, node: &Node) {
        let text = node.text.as_str();
        if text.is_empty() {
            return;
        }
        self.ctx.flush_division();

        if is_timestamp(text) {
            self.timestamp(text);
            return;
        }
        if let Some(caps) = RE_CHAIR_NOTICE.captures(text) {
            self.chair_notice(&caps[1], node);
            return;
        }
        if self.in_preamble() && (RE_PREAMBLE_LINE.is_match(text) || RE_DATE_LINE.is_match(text)) {
            self.note(node);
            return;
        }
        if RE_DATE_LINE.is_match(text)
            || profile::COMPONENT_TITLES
                .iter()
                .any(|title| text.eq_ignore_ascii_case(title))
        {
            log::trace!("Skipping title heading '{}'", text);
            return;
        }
        if self.profile.is_intro_heading(text) {
            self.open_preamble(text);
            return;
        }
        if self.profile.oral_answers && text.eq_ignore_ascii_case(ORAL_ANSWERS) {
            self.open_oral_answers(text);
            return;
        }
        if self.is_repeated_heading(text) {
            log::debug!("Suppressing repeated heading '{}'", text);
            return;
        }

        let role = self.heading_role(level, text);
        self.transition(Event::SetNewHeading);
        self.headings.push(PendingHeading {
            text: text.to_string(),
            role,
            link: self.ctx.link.clone(),
        });
    }

    fn heading_role(&mut self, level: u8, text: &str) -> HeadingRole {
        if RE_INTRODUCTION.is_match(text) {
            return HeadingRole::Introduction;
        }
        let fragment = self.classifier.fragment();
        match self.profile.primary {
            PrimaryRole::Debate if self.oral => match fragment {
                Some(FragmentType::DepartmentHeading) => HeadingRole::Department,
                Some(FragmentType::SubjectHeading) => HeadingRole::Subject,
                Some(FragmentType::Heading) => {
                    log::debug!("Leaving oral answers at '{}'", text);
                    self.oral = false;
                    HeadingRole::Topic
                }
                _ if level <= 3 => HeadingRole::Department,
                _ => HeadingRole::Subject,
            },
            PrimaryRole::Debate => HeadingRole::Topic,
            PrimaryRole::DepartmentContainer | PrimaryRole::Department => match fragment {
                Some(FragmentType::DepartmentHeading) => HeadingRole::Department,
                Some(FragmentType::SubjectHeading) => HeadingRole::Subject,
                _ if level <= 3 => HeadingRole::Department,
                _ => HeadingRole::Subject,
            },
        }
    }

    fn is_repeated_heading(&self, text: &str) -> bool {
        self.headings.last().is_some_and(|h| h.text == text)
            || self.is_title_repeat(text)
            || self
                .ctx
                .containers
                .last()
                .is_some_and(|frame| frame.section.title == text)
    }

    fn is_title_repeat(&self, text: &str) -> bool {
        self.ctx
            .open
            .as_ref()
            .is_some_and(|open| open.section.title == text)
    }

    fn in_preamble(&self) -> bool {
        self.ctx
            .open
            .as_ref()
            .is_some_and(|open| matches!(open.section.kind, SectionKind::Preamble { .. }))
    }

    /// Turns the pending heading stack into sections once content arrives.
    fn resolve_headings(&mut self) {
        if self.headings.is_empty() {
            return;
        }
        let headings = std::mem::take(&mut self.headings);
        self.transition(Event::StopNewHeading);

        let (departments, rest): (Vec<_>, Vec<_>) = headings
            .into_iter()
            .partition(|h| h.role == HeadingRole::Department);

        if let Some(department) = departments.last() {
            self.department = Some(department.text.clone());
            self.subject = None;
            let container_keep = match self.profile.primary {
                PrimaryRole::DepartmentContainer => Some(0),
                PrimaryRole::Debate if self.oral => Some(self.ctx.containers.len().min(1)),
                _ => None,
            };
            match container_keep {
                Some(keep) => self.open_container(
                    SectionKind::Container,
                    &department.text,
                    keep,
                    department.link.clone(),
                ),
                None if rest.is_empty() && self.profile.subjects_open => {
                    let kind = self.profile.subject_kind(self.department.as_deref());
                    let keep = self.ctx.containers.len();
                    self.open(kind, &department.text, keep, department.link.clone());
                }
                None => {}
            }
        }

        if let Some(intro) = rest.iter().find(|h| h.role == HeadingRole::Introduction) {
            self.open(
                SectionKind::MemberIntroduction,
                &intro.text,
                0,
                intro.link.clone(),
            );
            return;
        }

        match self.profile.primary {
            PrimaryRole::Debate if !self.oral => self.resolve_topics(rest),
            _ => self.resolve_subjects(rest),
        }
    }

    fn resolve_topics(&mut self, headings: Vec<PendingHeading>) {
        match headings.as_slice() {
            [] => {}
            [single] => self.open(SectionKind::debate(), &single.text, 0, single.link.clone()),
            [bill, stage] if RE_BILL_STAGE.is_match(&stage.text) => {
                let kind = SectionKind::Debate {
                    bill_title: Some(bill.text.clone()),
                    bill_stage: Some(stage.text.clone()),
                    chair: Vec::new(),
                };
                self.open(kind, &bill.text, 0, bill.link.clone());
            }
            [primary, secondary] => {
                self.open_container(
                    SectionKind::Container,
                    &primary.text,
                    0,
                    primary.link.clone(),
                );
                self.open(SectionKind::debate(), &secondary.text, 1, secondary.link.clone());
            }
            [primary, grouped @ ..] => {
                self.open_container(
                    SectionKind::SectionGroup,
                    &primary.text,
                    0,
                    primary.link.clone(),
                );
                for heading in grouped {
                    self.open(SectionKind::debate(), &heading.text, 1, heading.link.clone());
                }
            }
        }
    }

    fn resolve_subjects(&mut self, headings: Vec<PendingHeading>) {
        for heading in headings {
            self.subject = Some(heading.text.clone());
            if self.profile.subjects_open && !self.oral {
                let kind = self.profile.subject_kind(self.department.as_deref());
                let keep = self.ctx.containers.len();
                self.open(kind, &heading.text, keep, heading.link);
            }
        }
    }

    /// Opens a section below the first `keep` containers. Children of a
    /// container go through `start_subsection`.
    fn open(&mut self, kind: SectionKind, title: &str, keep: usize, link: Option<String>) {
        self.transition(Event::StartNewSection);
        self.ctx.pop_containers(keep);
        if !self.ctx.containers.is_empty() {
            self.transition(Event::StartSubsection);
        }
        let section = self.ctx.open_section(kind, title);
        if link.is_some() {
            section.url = link;
        }
    }

    fn open_container(&mut self, kind: SectionKind, title: &str, keep: usize, link: Option<String>) {
        self.transition(Event::StartNewSection);
        self.ctx.pop_containers(keep);
        self.ctx.push_container(kind, title, link);
    }

    fn open_preamble(&mut self, title: &str) {
        self.resolve_headings();
        self.oral = false;
        self.department = None;
        self.subject = None;
        let link = self.ctx.link.clone();
        self.open(SectionKind::Preamble { chair: Vec::new() }, title, 0, link);
    }

    fn open_oral_answers(&mut self, title: &str) {
        self.resolve_headings();
        self.oral = true;
        self.department = None;
        self.subject = None;
        let link = self.ctx.link.clone();
        self.open_container(SectionKind::Container, title, 0, link);
    }

    fn oral_question(&self, number: Option<String>, uin: Option<String>) -> SectionKind {
        SectionKind::Question {
            department: self.department.clone(),
            asked_by: None,
            number,
            uin,
            question_type: ORAL_ANSWER.to_string(),
        }
    }

    /// Opens a default section for content that arrives with nothing open.
    fn ensure_open(&mut self) {
        if self.ctx.open.is_some() {
            return;
        }
        let title = self
            .subject
            .clone()
            .or_else(|| self.department.clone())
            .or_else(|| self.ctx.containers.last().map(|f| f.section.title.clone()))
            .unwrap_or_else(|| self.ctx.component.name.clone());
        let kind = if self.oral {
            self.oral_question(None, None)
        } else {
            self.profile.subject_kind(self.department.as_deref())
        };
        let keep = self.ctx.containers.len();
        self.open(kind, &title, keep, None);
    }

    fn paragraph(&mut self, node: &Node) {
        if node.text.is_empty() || RE_NAVIGATION.is_match(&node.text) {
            return;
        }
        if self.feed_division(node) {
            return;
        }
        if self.profile.divisions
            && node
                .lines
                .first()
                .is_some_and(|line| division::starts_division(line))
        {
            self.resolve_headings();
            self.ctx.division = Some(DivisionBuilder::new());
            self.feed_division(node);
            return;
        }
        if is_timestamp(&node.text) {
            self.timestamp(&node.text);
            return;
        }
        if let Some(caps) = RE_CHAIR_NOTICE.captures(&node.text) {
            self.chair_notice(&caps[1], node);
            return;
        }

        self.resolve_headings();
        if self.is_title_repeat(&node.text) {
            log::trace!("Dropping paragraph repeating the title '{}'", node.text);
            return;
        }

        if self.profile.subject == SubjectKind::Petition {
            if RE_PETITION.is_match(&node.text) {
                self.open_petition();
            } else if RE_OBSERVATIONS.is_match(&node.text) {
                self.open_observation();
            }
        }
        if self.oral {
            self.open_question(node);
        }

        if node.italic || RE_BOILERPLATE.is_match(&node.text) {
            self.ctx.speaker = None;
            self.note(node);
            return;
        }

        let member = node
            .label
            .as_deref()
            .and_then(|label| self.resolver.resolve(label));
        match member {
            Some(member) => self.contribution(&member, node),
            None => match self.ctx.speaker.clone() {
                Some(speaker) => self.push(contribution(&speaker, &node.text, &node.html)),
                None => self.note(node),
            },
        }
    }

    /// One Question section per oral question number.
    fn open_question(&mut self, node: &Node) {
        if node.label.is_none() {
            return;
        }
        let Some(caps) = RE_QUESTION_LEAD.captures(&node.lead) else {
            return;
        };
        let number = caps[1].to_string();
        let uin = caps
            .get(2)
            .map(|m| m.as_str().to_string())
            .or_else(|| RE_UIN.captures(&node.body).map(|c| c[1].to_string()));

        let title = self
            .subject
            .clone()
            .or_else(|| self.department.clone())
            .unwrap_or_else(|| format!("Question {}", number));
        let kind = self.oral_question(Some(number), uin);
        let keep = self.ctx.containers.len();
        let link = self.ctx.link.clone();
        self.open(kind, &title, keep, link);
    }

    fn open_petition(&mut self) {
        let title = self
            .subject
            .clone()
            .or_else(|| self.department.clone())
            .unwrap_or_else(|| "Petition".to_string());
        let keep = self.ctx.containers.len();
        let link = self.ctx.link.clone();
        self.open(
            SectionKind::Petition {
                petition_number: None,
            },
            &title,
            keep,
            link,
        );
        self.last_petition = self.ctx.open.as_ref().map(|open| open.section.id.clone());
    }

    fn open_observation(&mut self) {
        let title = self
            .subject
            .clone()
            .or_else(|| self.department.clone())
            .unwrap_or_else(|| "Observations".to_string());
        let kind = SectionKind::PetitionObservation {
            petition_id: self.last_petition.clone(),
            department: self.department.clone(),
        };
        let keep = self.ctx.containers.len();
        let link = self.ctx.link.clone();
        self.open(kind, &title, keep, link);
    }

    fn contribution(&mut self, member: &Member, node: &Node) {
        self.ensure_open();
        if member.post.as_deref() == Some(DEBATE_CHAIR)
            && let Some(open) = self.ctx.open.as_mut()
        {
            open.section.kind.add_chair(&member.name);
        }

        let key = member.index_name.clone();
        let continuing = self
            .ctx
            .speaker
            .as_ref()
            .filter(|current| current.key == key)
            .map(|current| current.contribution_id.clone());
        let contribution_id = match continuing {
            Some(id) => id,
            None => match self.ctx.next_contribution_id() {
                Some(id) => id,
                None => return,
            },
        };
        if let Some(open) = self.ctx.open.as_mut()
            && let SectionKind::Question { asked_by, .. } = &mut open.section.kind
            && asked_by.is_none()
        {
            *asked_by = Some(key.clone());
        }

        let label = node
            .label
            .as_deref()
            .unwrap_or_default()
            .trim_end_matches(':')
            .trim()
            .to_string();
        let speaker = Speaker {
            key,
            label,
            contribution_id,
        };
        if !node.body.is_empty() {
            self.push(contribution(&speaker, &node.body, &node.html));
        }
        self.ctx.speaker = Some(speaker);
    }

    fn chair_notice(&mut self, name: &str, node: &Node) {
        self.resolve_headings();
        self.ensure_open();
        if let Some(open) = self.ctx.open.as_mut()
            && !open.section.kind.add_chair(name)
        {
            log::debug!("Chair notice in {} section ignored", open.section.kind.name());
        }
        self.push(ParagraphKind::NonContribution {
            text: node.text.clone(),
            html: node.html.clone(),
        });
    }

    fn timestamp(&mut self, text: &str) {
        self.resolve_headings();
        let kind = ParagraphKind::Timestamp {
            text: text.to_string(),
        };
        if self.ctx.open.is_none() && !self.ctx.containers.is_empty() {
            self.ctx.add_container_paragraph(kind);
            return;
        }
        self.push(kind);
    }

    /// A paragraph outside any contribution. With no section open it belongs
    /// to the innermost container, if there is one.
    fn note(&mut self, node: &Node) {
        let kind = ParagraphKind::NonContribution {
            text: node.text.clone(),
            html: node.html.clone(),
        };
        if self.ctx.open.is_none() && !self.ctx.containers.is_empty() {
            self.ctx.add_container_paragraph(kind);
            return;
        }
        self.push(kind);
    }

    fn table(&mut self, node: &Node) {
        if self.feed_division(node) || node.html.is_empty() {
            return;
        }
        self.resolve_headings();
        let kind = match self.ctx.speaker.clone() {
            Some(speaker) => ParagraphKind::ContributionTable {
                html: node.html.clone(),
                speaker: speaker.key,
                speaker_label: speaker.label,
                contribution_id: speaker.contribution_id,
            },
            None => ParagraphKind::NonContributionTable {
                html: node.html.clone(),
            },
        };
        self.push(kind);
    }

    /// Appends to the open section, opening a default one if needed, then
    /// picks up identifiers printed in the text.
    fn push(&mut self, kind: ParagraphKind) {
        self.ensure_open();
        let text = kind.text().to_string();
        let Some(sequence) = self.ctx.add_paragraph(kind) else {
            return;
        };
        let Some(open) = self.ctx.open.as_mut() else {
            return;
        };
        match &mut open.section.kind {
            // Only the first paragraph carries the petition number.
            SectionKind::Petition { petition_number }
                if sequence == 1 && petition_number.is_none() =>
            {
                *petition_number = RE_PETITION_NUMBER
                    .captures(&text)
                    .map(|caps| caps[1].to_string());
            }
            SectionKind::Question { uin, .. } if uin.is_none() => {
                *uin = RE_UIN.captures(&text).map(|caps| caps[1].to_string());
            }
            _ => {}
        }
    }

    fn begin_division(&mut self) {
        if !self.profile.divisions || self.ctx.division.is_some() {
            return;
        }
        self.resolve_headings();
        self.ctx.division = Some(DivisionBuilder::new());
    }

    /// Feeds a node to the pending division. Returns `false` when there is
    /// none or the node ends it, in which case the node is processed normally.
    fn feed_division(&mut self, node: &Node) -> bool {
        let Some(builder) = self.ctx.division.as_ref() else {
            return false;
        };
        let ends = (node.italic && builder.has_lists()) || self.starts_speech(node);
        if ends {
            self.ctx.flush_division();
            return false;
        }

        let Some(builder) = self.ctx.division.as_mut() else {
            return false;
        };
        let mut lines = node.lines.iter();
        let Some(first) = lines.next() else {
            return true;
        };
        if !builder.feed(first) {
            self.ctx.flush_division();
            return false;
        }
        for line in lines {
            if !builder.feed(line) {
                log::debug!("Division ended mid-paragraph at '{}'", line);
                self.ctx.flush_division();
                return true;
            }
        }
        true
    }

    /// A bold label that names a member opens speech, never a list entry.
    fn starts_speech(&mut self, node: &Node) -> bool {
        node.label.as_deref().is_some_and(|label| {
            !division::is_division_line(label) && self.resolver.resolve(label).is_some()
        })
    }
}

fn contribution(speaker: &Speaker, text: &str, html: &str) -> ParagraphKind {
    ParagraphKind::Contribution {
        text: text.to_string(),
        html: html.to_string(),
        speaker: speaker.key.clone(),
        speaker_label: speaker.label.clone(),
        contribution_id: speaker.contribution_id.clone(),
    }
}
