//! Flow controller: the single owner of a session's view and the payload
//! carried between views.
//!
//! The controller is synchronous and does no I/O. Async work (registration,
//! agent notification, chat replies) is started by `FlowSession`, which
//! hands the task's `AbortHandle` back here so leaving a view cancels it.
//! Completions carry the epoch they were started in; `epoch` changes on
//! every view change, so completions for a view that was left are ignored.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::state::ViewState;
use crate::chat::ChatState;
use crate::config::AgentDirectory;
use crate::error::{FlowError, NotifyError, RegistrationError};
use crate::handover::{HandoverPayload, HandoverState, HandoverStatus};
use crate::notice::Notice;
use crate::quiz::{
    AnswerValue, QuizCursor, QuizEngine, QuizResult, QuizStep, area_law_questions,
};
use crate::registration::{self, RegistrationState};
use crate::services::pricing::CONTACT_EMAIL;
use crate::services::{Service, TierAction, find_service, find_tier};

pub struct FlowController {
    view: ViewState,
    epoch: u64,
    quiz: QuizEngine,
    quiz_result: Option<QuizResult>,
    selected_service: Option<Service>,
    registration: RegistrationState,
    handover: Option<HandoverState>,
    chat: Option<ChatState>,
    chat_epoch: u64,
    notice: Option<Notice>,
    view_task: Option<AbortHandle>,
    chat_task: Option<AbortHandle>,
    updated_at: DateTime<Utc>,
}

impl Default for FlowController {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowController {
    pub fn new() -> Self {
        Self {
            view: ViewState::Intro,
            epoch: 0,
            quiz: QuizEngine::new(area_law_questions()),
            quiz_result: None,
            selected_service: None,
            registration: RegistrationState::default(),
            handover: None,
            chat: None,
            chat_epoch: 0,
            notice: None,
            view_task: None,
            chat_task: None,
            updated_at: Utc::now(),
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn quiz(&self) -> &QuizEngine {
        &self.quiz
    }

    pub fn quiz_result(&self) -> Option<&QuizResult> {
        self.quiz_result.as_ref()
    }

    pub fn selected_service(&self) -> Option<&Service> {
        self.selected_service.as_ref()
    }

    pub fn registration(&self) -> &RegistrationState {
        &self.registration
    }

    pub fn handover(&self) -> Option<&HandoverState> {
        self.handover.as_ref()
    }

    pub fn chat(&self) -> Option<&ChatState> {
        self.chat.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // ── Navigation ─────────────────────────────────────────────────────

    /// Switch to `target`.
    ///
    /// Refuses views whose payload is missing, and the agent handover,
    /// which is only entered by completing registration. Leaving a view
    /// cancels its pending task and clears its sub-state; entering Quiz
    /// starts a fresh run; entering Intro forgets the selected service.
    /// Navigating to the current view is a no-op, except for Quiz, which
    /// restarts.
    pub fn navigate_to(&mut self, target: ViewState) -> Result<(), FlowError> {
        if target == ViewState::AgentHandover && self.view != target {
            warn!(from = %self.view, "Navigation to agent handover refused");
            return Err(FlowError::NotNavigable { target });
        }
        self.enter(target)
    }

    fn enter(&mut self, target: ViewState) -> Result<(), FlowError> {
        self.check_payload(target)?;

        if target == self.view && target != ViewState::Quiz {
            return Ok(());
        }
        if !self.view.can_transition_to(target) {
            debug!(from = %self.view, to = %target, "Non-linear navigation");
        }

        self.leave_view();

        match target {
            ViewState::Quiz => {
                self.quiz.load(area_law_questions());
                self.quiz.reset();
                self.quiz_result = None;
            }
            ViewState::Intro => {
                self.selected_service = None;
            }
            ViewState::ServiceSelection | ViewState::Registration | ViewState::AgentHandover => {}
        }

        info!(from = %self.view, to = %target, "View changed");
        self.view = target;
        self.epoch += 1;
        Ok(())
    }

    /// Registration and handover need both the diagnosis and the service;
    /// service selection needs the diagnosis.
    fn check_payload(&self, target: ViewState) -> Result<(), FlowError> {
        let missing = match target {
            ViewState::Intro | ViewState::Quiz => None,
            _ if self.quiz_result.is_none() => Some("quiz result"),
            ViewState::Registration | ViewState::AgentHandover
                if self.selected_service.is_none() =>
            {
                Some("selected service")
            }
            _ => None,
        };
        match missing {
            Some(missing) => {
                warn!(target = %target, missing, "Navigation refused");
                Err(FlowError::MissingPayload { target, missing })
            }
            None => Ok(()),
        }
    }

    fn leave_view(&mut self) {
        if let Some(task) = self.view_task.take() {
            task.abort();
        }
        match self.view {
            ViewState::Registration => self.registration = RegistrationState::default(),
            ViewState::AgentHandover => self.handover = None,
            _ => {}
        }
    }

    fn require_view(&self, expected: ViewState) -> Result<(), FlowError> {
        if self.view == expected {
            Ok(())
        } else {
            Err(FlowError::WrongView {
                expected,
                actual: self.view,
            })
        }
    }

    /// "Iniciar diagnóstico".
    pub fn start_diagnosis(&mut self) -> Result<(), FlowError> {
        self.navigate_to(ViewState::Quiz)
    }

    /// The current screen's back button.
    pub fn back(&mut self) -> Result<(), FlowError> {
        self.navigate_to(self.view.back_target())
    }

    /// Run a pricing tier's action. Diagnosis tiers navigate to the quiz;
    /// the quote tier stays put, posts the contact address as a notice and
    /// hands back its `mailto:` link.
    pub fn apply_tier(&mut self, tier_id: &str) -> Result<TierAction, FlowError> {
        let tier = find_tier(tier_id).ok_or_else(|| FlowError::UnknownTier {
            id: tier_id.to_string(),
        })?;
        match tier.action {
            TierAction::StartDiagnosis => self.start_diagnosis()?,
            TierAction::ContactForQuote { .. } => {
                self.notice = Some(Notice::info(format!(
                    "Escríbenos a {CONTACT_EMAIL} para cotizar tu caso."
                )));
            }
        }
        Ok(tier.action)
    }

    // ── Quiz ───────────────────────────────────────────────────────────

    pub fn answer(&mut self, question_id: &str, value: AnswerValue) -> Result<(), FlowError> {
        self.require_view(ViewState::Quiz)?;
        self.quiz.handle_answer_change(question_id, value)?;
        Ok(())
    }

    /// Advance the quiz. On submission the result is classified and stored
    /// and the view moves to service selection.
    pub fn next(&mut self) -> Result<QuizStep, FlowError> {
        self.require_view(ViewState::Quiz)?;
        let step = self.quiz.handle_next();
        if let QuizStep::Submitted(ref answers) = step {
            let result = QuizResult::from_answers(answers.clone());
            info!(area = %result.area, answers = result.answers.len(), "Quiz submitted");
            self.quiz_result = Some(result);
            self.navigate_to(ViewState::ServiceSelection)?;
        }
        Ok(step)
    }

    pub fn previous(&mut self) -> Result<(), FlowError> {
        self.require_view(ViewState::Quiz)?;
        self.quiz.handle_previous();
        Ok(())
    }

    /// "Rehacer diagnóstico": drop the result and start the quiz again.
    pub fn redo_diagnosis(&mut self) -> Result<(), FlowError> {
        self.require_view(ViewState::ServiceSelection)?;
        self.navigate_to(ViewState::Quiz)
    }

    // ── Service selection ──────────────────────────────────────────────

    pub fn select_service(&mut self, service_id: &str) -> Result<Service, FlowError> {
        self.require_view(ViewState::ServiceSelection)?;
        let service = find_service(service_id).ok_or_else(|| FlowError::UnknownService {
            id: service_id.to_string(),
        })?;
        info!(service_id = %service.id, "Service selected");
        self.selected_service = Some(service.clone());
        self.navigate_to(ViewState::Registration)?;
        Ok(service)
    }

    // ── Registration ───────────────────────────────────────────────────

    /// Validate the email and mark registration as in flight. Returns the
    /// epoch the completion must present.
    pub fn begin_registration(&mut self, email: &str) -> Result<u64, FlowError> {
        self.require_view(ViewState::Registration)?;
        if self.registration.processing {
            return Err(FlowError::AlreadyProcessing);
        }
        if !registration::is_valid_email(email) {
            self.notice = Some(Notice::warning(registration::INVALID_EMAIL_MESSAGE));
            return Err(FlowError::InvalidEmail);
        }
        self.registration.processing = true;
        self.registration.email = Some(email.to_string());
        Ok(self.epoch)
    }

    fn is_current(&self, epoch: u64, view: ViewState) -> bool {
        let current = self.epoch == epoch && self.view == view;
        if !current {
            debug!(epoch, current_epoch = self.epoch, view = %self.view, "Ignoring stale completion");
        }
        current
    }

    /// The registrar accepted the email. Shows the success notice; the
    /// view changes later in [`finish_registration`](Self::finish_registration).
    pub fn registration_succeeded(&mut self, epoch: u64, email: &str) -> bool {
        if !self.is_current(epoch, ViewState::Registration) {
            return false;
        }
        self.notice = Some(Notice::success(registration::success_message(email)));
        true
    }

    /// Move on to the agent handover. Called from the registration task
    /// itself, so its handle is released rather than aborted.
    pub fn finish_registration(&mut self, epoch: u64) -> Result<bool, FlowError> {
        if !self.is_current(epoch, ViewState::Registration) {
            return Ok(false);
        }
        self.view_task = None;
        self.enter(ViewState::AgentHandover)?;
        Ok(true)
    }

    pub fn registration_failed(&mut self, epoch: u64, err: &RegistrationError) -> bool {
        if !self.is_current(epoch, ViewState::Registration) {
            return false;
        }
        warn!(error = %err, "Registration failed");
        self.registration.processing = false;
        self.notice = Some(Notice::error(registration::failure_message(err)));
        true
    }

    // ── Agent handover ─────────────────────────────────────────────────

    /// Build the handover payload for the selected service and mark the
    /// notification as in flight.
    pub fn begin_handover(&mut self, agents: &AgentDirectory) -> Result<HandoverPayload, FlowError> {
        self.require_view(ViewState::AgentHandover)?;
        if self.handover.as_ref().is_some_and(|h| !h.is_done()) {
            return Err(FlowError::AlreadyProcessing);
        }
        let missing = |missing: &'static str| FlowError::MissingPayload {
            target: ViewState::AgentHandover,
            missing,
        };
        let result = self.quiz_result.as_ref().ok_or(missing("quiz result"))?;
        let service = self
            .selected_service
            .as_ref()
            .ok_or(missing("selected service"))?;
        let payload =
            HandoverPayload::build(agents, service, Some(result.area), result.answers.clone());
        info!(
            submission_id = %payload.submission_id,
            service_id = %payload.service_id,
            agent = %payload.agent_name,
            webhook = %payload.webhook_url,
            "Handing over to agent"
        );
        self.handover = Some(HandoverState::notifying(&payload));
        Ok(payload)
    }

    /// Record the notifier's outcome.
    pub fn handover_finished(&mut self, epoch: u64, outcome: Result<(), NotifyError>) -> bool {
        if !self.is_current(epoch, ViewState::AgentHandover) {
            return false;
        }
        self.view_task = None;
        let Some(handover) = self.handover.as_mut() else {
            return false;
        };
        match outcome {
            Ok(()) => {
                info!(submission_id = %handover.submission_id, "Agent notified");
                handover.set_status(HandoverStatus::Completed);
            }
            Err(e) => {
                warn!(submission_id = %handover.submission_id, error = %e, "Agent notification failed");
                handover.set_status(HandoverStatus::Failed {
                    reason: e.to_string(),
                });
                self.notice = Some(Notice::error(handover.status_text.clone()));
            }
        }
        true
    }

    /// "Volver al inicio" from the handover screen.
    pub fn acknowledge(&mut self) -> Result<(), FlowError> {
        self.require_view(ViewState::AgentHandover)?;
        self.navigate_to(ViewState::Intro)
    }

    // ── Chat overlay ───────────────────────────────────────────────────

    /// Open (or reopen) the chat. Returns the message awaiting a reply, if
    /// the chat was opened with one, and the chat epoch to answer with.
    pub fn open_chat(&mut self, initial_message: Option<&str>) -> (u64, Option<String>) {
        self.cancel_chat_task();
        let (chat, pending) = ChatState::open(initial_message);
        self.chat = Some(chat);
        (self.chat_epoch, pending)
    }

    pub fn close_chat(&mut self) {
        self.cancel_chat_task();
        self.chat = None;
    }

    /// Post a user message. `Ok(None)` when the input was ignored.
    pub fn send_chat(&mut self, text: &str) -> Result<Option<(u64, String)>, FlowError> {
        let chat = self.chat.as_mut().ok_or(FlowError::ChatClosed)?;
        Ok(chat.submit(text).map(|t| (self.chat_epoch, t)))
    }

    pub fn receive_chat(&mut self, chat_epoch: u64, reply: String) -> bool {
        if chat_epoch != self.chat_epoch {
            return false;
        }
        match self.chat.as_mut() {
            Some(chat) => {
                chat.receive(reply);
                self.chat_task = None;
                true
            }
            None => false,
        }
    }

    fn cancel_chat_task(&mut self) {
        if let Some(task) = self.chat_task.take() {
            task.abort();
        }
        self.chat_epoch += 1;
    }

    // ── Notices & tasks ────────────────────────────────────────────────

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Track the task belonging to the current view.
    pub fn set_view_task(&mut self, task: AbortHandle) {
        if let Some(old) = self.view_task.replace(task) {
            old.abort();
        }
    }

    pub fn set_chat_task(&mut self, task: AbortHandle) {
        if let Some(old) = self.chat_task.replace(task) {
            old.abort();
        }
    }

    /// Abort every pending task.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.view_task.take() {
            task.abort();
        }
        if let Some(task) = self.chat_task.take() {
            task.abort();
        }
    }

    pub fn snapshot(&self, session_id: Uuid, agents: &AgentDirectory) -> FlowSnapshot {
        FlowSnapshot {
            session_id,
            view: self.view,
            epoch: self.epoch,
            quiz: (self.view == ViewState::Quiz).then(|| self.quiz.snapshot()),
            quiz_result: self.quiz_result.clone(),
            selected_service: self.selected_service.clone(),
            agent_name: self
                .selected_service
                .as_ref()
                .map(|s| agents.agent_name(&s.id)),
            registration: self.registration.clone(),
            handover: self.handover.clone(),
            chat_open: self.chat.is_some(),
            chat: self.chat.clone(),
            notice: self.notice.clone(),
            updated_at: self.updated_at,
        }
    }
}

impl Drop for FlowController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Read model of a session, sent to clients after every change.
#[derive(Debug, Clone, Serialize)]
pub struct FlowSnapshot {
    pub session_id: Uuid,
    pub view: ViewState,
    pub epoch: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz: Option<QuizCursor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_result: Option<QuizResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_service: Option<Service>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    pub registration: RegistrationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handover: Option<HandoverState>,
    pub chat_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat: Option<ChatState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
    pub updated_at: DateTime<Utc>,
}
