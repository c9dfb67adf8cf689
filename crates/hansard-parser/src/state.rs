//! The segmentation state machine. Every transition except `Start` runs the
//! hook before the state changes; a rejected event runs nothing.

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseState {
    Idle,
    Starting,
    SettingHeading,
    HeadingComplete,
    ParsingSection,
    ParsingSubsection,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Start,
    SetNewHeading,
    StopNewHeading,
    StartNewSection,
    StartSubsection,
    Finish,
}

impl Event {
    fn finalizes(&self) -> bool {
        !matches!(self, Event::Start)
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Event::Start => "start",
            Event::SetNewHeading => "set_new_heading",
            Event::StopNewHeading => "stop_new_heading",
            Event::StartNewSection => "start_new_section",
            Event::StartSubsection => "start_subsection",
            Event::Finish => "finish",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {event} from {state:?}")]
pub struct TransitionError {
    pub state: ParseState,
    pub event: Event,
}

use ParseState::*;

const ACTIVE: &[ParseState] = &[
    Starting,
    SettingHeading,
    HeadingComplete,
    ParsingSection,
    ParsingSubsection,
];

const ANY_BUT_IDLE: &[ParseState] = &[
    Starting,
    SettingHeading,
    HeadingComplete,
    ParsingSection,
    ParsingSubsection,
    Finished,
];

/// (event, allowed source states, target state)
const TRANSITIONS: &[(Event, &[ParseState], ParseState)] = &[
    (Event::Start, &[Idle], Starting),
    (Event::SetNewHeading, ACTIVE, SettingHeading),
    (Event::StopNewHeading, &[SettingHeading], HeadingComplete),
    (Event::StartNewSection, ACTIVE, ParsingSection),
    (Event::StartSubsection, &[Starting, ParsingSection], ParsingSubsection),
    (Event::Finish, ANY_BUT_IDLE, Finished),
];

/// Invoked before a transition changes state.
pub trait TransitionHook {
    fn before_transition(&mut self, from: ParseState, event: Event);
}

#[derive(Debug, Clone)]
pub struct StateMachine {
    state: ParseState,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self { state: Idle }
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn target(from: ParseState, event: Event) -> Option<ParseState> {
        TRANSITIONS
            .iter()
            .find(|(e, sources, _)| *e == event && sources.contains(&from))
            .map(|(_, _, to)| *to)
    }

    /// Guard first, then the hook, then the state change.
    pub fn fire<H: TransitionHook>(
        &mut self,
        event: Event,
        hook: &mut H,
    ) -> Result<ParseState, TransitionError> {
        let to = Self::target(self.state, event).ok_or(TransitionError {
            state: self.state,
            event,
        })?;
        if event.finalizes() {
            hook.before_transition(self.state, event);
        }
        log::trace!("{:?} --{}--> {:?}", self.state, event, to);
        self.state = to;
        Ok(to)
    }
}
