use crate::document::SectionKind;
use crate::types::TranscriptType;

pub const ORAL_ANSWER: &str = "for oral answer";
pub const WRITTEN_ANSWER: &str = "for written answer";

/// Headings that only repeat the component's own name.
pub const COMPONENT_TITLES: &[&str] = &[
    "Written Ministerial Statements",
    "Written Statements",
    "Written Answers to Questions",
    "Written Answers",
    "Ministerial Corrections",
    "Petitions",
];

/// What a primary (department-level) heading means for a transcript type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryRole {
    /// Headings name debates; the heading stack decides the nesting.
    Debate,
    /// Department headings open a container for the questions below them.
    DepartmentContainer,
    /// Department headings label the sections that follow.
    Department,
}

/// The section variant opened for a subject heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    Debate,
    Question,
    Statement,
    Petition,
    MinisterialCorrection,
}

#[derive(Debug)]
pub struct Profile {
    pub transcript: TranscriptType,
    /// Headings that open the sitting preamble.
    pub intro_headings: &'static [&'static str],
    pub oral_answers: bool,
    pub divisions: bool,
    pub primary: PrimaryRole,
    pub subject: SubjectKind,
    /// Whether subject headings open a section straight away, rather than
    /// waiting for a paragraph that starts one.
    pub subjects_open: bool,
}

impl Profile {
    pub fn for_transcript(transcript: TranscriptType) -> &'static Profile {
        match transcript {
            TranscriptType::Debates => &DEBATES,
            TranscriptType::WestminsterHall => &WESTMINSTER_HALL,
            TranscriptType::GrandCommittee => &GRAND_COMMITTEE,
            TranscriptType::WrittenStatements => &WRITTEN_STATEMENTS,
            TranscriptType::Petitions => &PETITIONS,
            TranscriptType::WrittenAnswers => &WRITTEN_ANSWERS,
            TranscriptType::MinisterialCorrections => &MINISTERIAL_CORRECTIONS,
        }
    }

    pub fn subject_kind(&self, department: Option<&str>) -> SectionKind {
        let department = department.map(str::to_string);
        match self.subject {
            SubjectKind::Debate => SectionKind::debate(),
            SubjectKind::Question => SectionKind::Question {
                department,
                asked_by: None,
                number: None,
                uin: None,
                question_type: WRITTEN_ANSWER.to_string(),
            },
            SubjectKind::Statement => SectionKind::Statement { department },
            SubjectKind::Petition => SectionKind::Petition {
                petition_number: None,
            },
            SubjectKind::MinisterialCorrection => SectionKind::MinisterialCorrection { department },
        }
    }

    pub fn is_intro_heading(&self, text: &str) -> bool {
        self.intro_headings
            .iter()
            .any(|heading| text.eq_ignore_ascii_case(heading))
    }
}

static DEBATES: Profile = Profile {
    transcript: TranscriptType::Debates,
    intro_headings: &["House of Commons", "House of Lords"],
    oral_answers: true,
    divisions: true,
    primary: PrimaryRole::Debate,
    subject: SubjectKind::Debate,
    subjects_open: true,
};

static WESTMINSTER_HALL: Profile = Profile {
    transcript: TranscriptType::WestminsterHall,
    intro_headings: &["Westminster Hall"],
    oral_answers: false,
    divisions: false,
    primary: PrimaryRole::Debate,
    subject: SubjectKind::Debate,
    subjects_open: true,
};

static GRAND_COMMITTEE: Profile = Profile {
    transcript: TranscriptType::GrandCommittee,
    intro_headings: &["Grand Committee"],
    oral_answers: false,
    divisions: false,
    primary: PrimaryRole::Debate,
    subject: SubjectKind::Debate,
    subjects_open: true,
};

static WRITTEN_ANSWERS: Profile = Profile {
    transcript: TranscriptType::WrittenAnswers,
    intro_headings: &[],
    oral_answers: false,
    divisions: false,
    primary: PrimaryRole::DepartmentContainer,
    subject: SubjectKind::Question,
    subjects_open: true,
};

static WRITTEN_STATEMENTS: Profile = Profile {
    transcript: TranscriptType::WrittenStatements,
    intro_headings: &[],
    oral_answers: false,
    divisions: false,
    primary: PrimaryRole::Department,
    subject: SubjectKind::Statement,
    subjects_open: true,
};

static PETITIONS: Profile = Profile {
    transcript: TranscriptType::Petitions,
    intro_headings: &[],
    oral_answers: false,
    divisions: false,
    primary: PrimaryRole::Department,
    subject: SubjectKind::Petition,
    subjects_open: false,
};

static MINISTERIAL_CORRECTIONS: Profile = Profile {
    transcript: TranscriptType::MinisterialCorrections,
    intro_headings: &[],
    oral_answers: false,
    divisions: false,
    primary: PrimaryRole::Department,
    subject: SubjectKind::MinisterialCorrection,
    subjects_open: true,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_transcript_has_a_profile() {
        for transcript in [
            TranscriptType::Debates,
            TranscriptType::WestminsterHall,
            TranscriptType::GrandCommittee,
            TranscriptType::WrittenStatements,
            TranscriptType::Petitions,
            TranscriptType::WrittenAnswers,
            TranscriptType::MinisterialCorrections,
        ] {
            assert_eq!(Profile::for_transcript(transcript).transcript, transcript);
        }
    }

    #[test]
    fn test_only_debates_use_sub_modes() {
        let debates = Profile::for_transcript(TranscriptType::Debates);
        assert!(debates.oral_answers && debates.divisions);

        let answers = Profile::for_transcript(TranscriptType::WrittenAnswers);
        assert!(!answers.oral_answers && !answers.divisions);
        assert_eq!(answers.primary, PrimaryRole::DepartmentContainer);
    }

    #[test]
    fn test_written_answer_subject_kind() {
        let profile = Profile::for_transcript(TranscriptType::WrittenAnswers);
        let kind = profile.subject_kind(Some("Treasury"));
        assert_eq!(kind.department(), Some("Treasury"));
        let SectionKind::Question { question_type, .. } = kind else {
            panic!("expected question");
        };
        assert_eq!(question_type, WRITTEN_ANSWER);
    }

    #[test]
    fn test_intro_heading_is_case_insensitive() {
        let profile = Profile::for_transcript(TranscriptType::WestminsterHall);
        assert!(profile.is_intro_heading("WESTMINSTER HALL"));
        assert!(!profile.is_intro_heading("House of Commons"));
    }
}
