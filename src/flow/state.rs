//! View state machine: which screen a session is on.

use serde::{Deserialize, Serialize};

/// The screens of the diagnostic flow.
///
/// Mostly linear: Intro → Quiz → ServiceSelection → Registration →
/// AgentHandover → Intro, plus "redo diagnosis" (ServiceSelection → Quiz)
/// and the per-screen back edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    #[default]
    Intro,
    Quiz,
    ServiceSelection,
    Registration,
    AgentHandover,
}

impl ViewState {
    /// Whether `target` is an edge of the flow graph from `self`.
    /// Every view can return to Intro.
    pub fn can_transition_to(&self, target: ViewState) -> bool {
        use ViewState::*;
        matches!(
            (self, target),
            (_, Intro)
                | (Intro, Quiz)
                | (Quiz, ServiceSelection)
                | (ServiceSelection, Registration)
                | (ServiceSelection, Quiz)
                | (Registration, AgentHandover)
                | (Registration, ServiceSelection)
        )
    }

    /// Where the back button leads from this view.
    pub fn back_target(&self) -> ViewState {
        match self {
            Self::Registration => Self::ServiceSelection,
            _ => Self::Intro,
        }
    }
}

impl std::fmt::Display for ViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Intro => "intro",
            Self::Quiz => "quiz",
            Self::ServiceSelection => "service_selection",
            Self::Registration => "registration",
            Self::AgentHandover => "agent_handover",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ViewState; 5] = [
        ViewState::Intro,
        ViewState::Quiz,
        ViewState::ServiceSelection,
        ViewState::Registration,
        ViewState::AgentHandover,
    ];

    #[test]
    fn forward_path() {
        use ViewState::*;
        let path = [Intro, Quiz, ServiceSelection, Registration, AgentHandover, Intro];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} should transition to {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn redo_and_back_edges() {
        use ViewState::*;
        assert!(ServiceSelection.can_transition_to(Quiz));
        assert!(Registration.can_transition_to(ServiceSelection));
        for view in ALL {
            assert!(view.can_transition_to(Intro));
            assert!(view.can_transition_to(view.back_target()));
        }
    }

    #[test]
    fn skipping_is_not_an_edge() {
        use ViewState::*;
        assert!(!Intro.can_transition_to(Registration));
        assert!(!Intro.can_transition_to(AgentHandover));
        assert!(!Quiz.can_transition_to(Registration));
        assert!(!AgentHandover.can_transition_to(Registration));
    }

    #[test]
    fn back_targets() {
        use ViewState::*;
        assert_eq!(Registration.back_target(), ServiceSelection);
        assert_eq!(Quiz.back_target(), Intro);
        assert_eq!(ServiceSelection.back_target(), Intro);
        assert_eq!(AgentHandover.back_target(), Intro);
        assert_eq!(Intro.back_target(), Intro);
    }

    #[test]
    fn display_matches_serde() {
        for view in ALL {
            let json = serde_json::to_string(&view).unwrap();
            assert_eq!(format!("\"{view}\""), json);
        }
    }

    #[test]
    fn new_sessions_start_at_intro() {
        assert_eq!(ViewState::default(), ViewState::Intro);
    }
}
