//! Interview Session Controller
//!
//! `InterviewSession` walks an [`InterviewScript`] one question at a time:
//! speak the prompt, listen for the answer, pause, then move on. It owns the
//! session state and the transcript; the speech ports only receive requests
//! and report back through the session's event channel.
//!
//! Every phase entry moves the session to a new [`Generation`]. Requests are
//! issued under the current generation and their events carry it back, so an
//! event that arrives after the session has moved on (a completion for a
//! cancelled utterance, the end of a capture that was stopped, a timer from a
//! previous run) is recognised as stale and dropped.
//!
//! Speech failures never escape this module. Any synthesizer refusal or failure
//! counts as "spoken", a failed capture re-prompts once per question, and a
//! missing recognizer leaves the session waiting for typed answers.

use crate::{
    script::{CLOSING_REMARK, GREETING, InterviewScript, REPROMPT},
    speech::{
        EventKind, EventSender, Generation, SessionEvent, SpeechError, SpeechInputPort,
        SpeechOutputPort, emit,
    },
    transcript::{Speaker, TranscriptLog, Turn},
};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::Instant};
use tracing::{debug, error, info, warn};

/// Display-only confidence score reported in every summary.
pub const CONFIDENCE_SCORE: u8 = 85;

/// Default pause between an answer and the next prompt.
pub const DEFAULT_THINKING_PAUSE: Duration = Duration::from_millis(1000);

/// The externally visible state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Speaking,
    Listening,
    Thinking,
    Complete,
}

/// What the output port is currently saying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Utterance {
    Prompt,
    Reprompt,
    Closing,
}

/// What follows the current Thinking pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NextPrompt {
    Question,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Speaking(Utterance),
    /// `capturing` is false once the input stream has ended (or could not
    /// start) and the session is waiting for the candidate to finish.
    Listening {
        capturing: bool,
    },
    Thinking(NextPrompt),
    Complete,
}

impl Stage {
    fn phase(self) -> Phase {
        match self {
            Stage::Idle => Phase::Idle,
            Stage::Speaking(_) => Phase::Speaking,
            Stage::Listening { .. } => Phase::Listening,
            Stage::Thinking(_) => Phase::Thinking,
            Stage::Complete => Phase::Complete,
        }
    }
}

/// Tunables for a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub thinking_pause: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            thinking_pause: DEFAULT_THINKING_PAUSE,
        }
    }
}

/// How a session reached Complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Ending {
    /// The closing remark was spoken after the last answer.
    Finished,
    /// The candidate ended the interview early.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Number of recorded answers.
    pub questions_answered: usize,
    /// One-based number of the question the session had reached.
    pub question_reached: usize,
    pub total_questions: usize,
    pub duration_secs: u64,
    pub confidence_score: u8,
    pub ending: Ending,
}

impl SessionSummary {
    /// Duration formatted as `m:ss`.
    pub fn duration_label(&self) -> String {
        format!("{}:{:02}", self.duration_secs / 60, self.duration_secs % 60)
    }
}

/// Read model handed to a display surface.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub question_index: usize,
    pub total_questions: usize,
    pub turns: Vec<Turn>,
    pub pending_transcript: String,
    pub notice: Option<String>,
    pub summary: Option<SessionSummary>,
}

/// Drives one interview at a time against a pair of speech ports.
pub struct InterviewSession {
    script: InterviewScript,
    options: SessionOptions,
    output: Arc<dyn SpeechOutputPort>,
    input: Arc<dyn SpeechInputPort>,
    events: EventSender,
    stage: Stage,
    generation: Generation,
    question_index: usize,
    pending: String,
    transcript: TranscriptLog,
    auto_reprompted: bool,
    started_at: Option<Instant>,
    thinking_timer: Option<JoinHandle<()>>,
    notice: Option<String>,
    summary: Option<SessionSummary>,
}

impl InterviewSession {
    /// Creates an idle session.
    ///
    /// `events` must be the sending half of the channel the ports report on;
    /// the session also uses it for its own timer and for completions it
    /// synthesizes when a port refuses a request.
    pub fn new(
        script: InterviewScript,
        output: Arc<dyn SpeechOutputPort>,
        input: Arc<dyn SpeechInputPort>,
        events: EventSender,
    ) -> Self {
        Self {
            script,
            options: SessionOptions::default(),
            output,
            input,
            events,
            stage: Stage::Idle,
            generation: Generation::default(),
            question_index: 0,
            pending: String::new(),
            transcript: TranscriptLog::new(),
            auto_reprompted: false,
            started_at: None,
            thinking_timer: None,
            notice: None,
            summary: None,
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    // --- User actions ---

    /// Starts a fresh session, abandoning any session in progress.
    pub async fn start(&mut self) {
        if self.is_active() {
            info!(generation = %self.generation, "Restarting interview; cancelling in-flight speech.");
            self.halt_ports().await;
        }

        self.question_index = 0;
        self.pending.clear();
        self.transcript.clear();
        self.auto_reprompted = false;
        self.summary = None;
        self.started_at = Some(Instant::now());

        self.notice = self.degraded_notice();
        if let Some(notice) = &self.notice {
            warn!(%notice, "Starting interview in degraded mode.");
        }
        info!(questions = self.script.len(), "Interview started.");

        let greeting = format!("{GREETING}{}", self.current_prompt());
        self.say(greeting, Utterance::Prompt).await;
    }

    /// Same as [`start`](Self::start); offered for the "Restart" action.
    pub async fn restart(&mut self) {
        self.start().await;
    }

    /// Ends the current answer.
    ///
    /// With nothing heard, the candidate is re-prompted and the question is
    /// asked again without using up a slot. Ignored outside Listening.
    pub async fn finish_answer(&mut self) {
        let Stage::Listening { capturing } = self.stage else {
            debug!(phase = ?self.phase(), "finish_answer ignored outside Listening.");
            return;
        };
        if capturing {
            self.input.stop().await;
        }
        if self.pending.trim().is_empty() {
            info!(question_index = self.question_index, "Nothing heard; re-prompting.");
            self.say(REPROMPT.to_string(), Utterance::Reprompt).await;
        } else {
            self.record_answer().await;
        }
    }

    /// Supplies answer text directly, for hosts without recognition.
    ///
    /// Overwrites the pending transcript the same way a recognition result does.
    pub fn submit_text(&mut self, text: &str) {
        if self.phase() == Phase::Listening {
            self.pending = text.to_string();
        } else {
            debug!(phase = ?self.phase(), "Typed answer ignored outside Listening.");
        }
    }

    /// Ends the interview immediately. A no-op once Complete.
    pub async fn stop(&mut self) {
        match self.stage {
            Stage::Complete => {
                debug!("stop ignored: interview already complete.");
                return;
            }
            Stage::Idle => {}
            _ => self.halt_ports().await,
        }
        self.complete(Ending::Stopped);
    }

    // --- Port events ---

    /// Applies one event from the ports or the Thinking timer.
    pub async fn handle_event(&mut self, event: SessionEvent) {
        if event.generation != self.generation {
            debug!(
                event_generation = %event.generation,
                generation = %self.generation,
                kind = ?event.kind,
                "Discarding stale session event."
            );
            return;
        }

        match (self.stage, event.kind) {
            (Stage::Speaking(utterance), EventKind::SpeakCompleted) => {
                self.on_spoken(utterance).await;
            }
            (Stage::Speaking(utterance), EventKind::SpeakFailed(reason)) => {
                warn!(%reason, "Speech synthesis failed; continuing as if spoken.");
                self.on_spoken(utterance).await;
            }
            (Stage::Listening { capturing: true }, EventKind::RecognitionStarted) => {
                debug!("Recognition started.");
            }
            (Stage::Listening { capturing: true }, EventKind::RecognitionResult(text)) => {
                self.pending = text;
            }
            (Stage::Listening { capturing: true }, EventKind::RecognitionEnded) => {
                self.on_capture_ended().await;
            }
            (Stage::Listening { capturing: true }, EventKind::RecognitionFailed(reason)) => {
                warn!(%reason, question_index = self.question_index, "Speech recognition failed.");
                self.on_capture_ended().await;
            }
            (Stage::Thinking(next), EventKind::ThinkingElapsed) => {
                self.thinking_timer = None;
                self.ask(next).await;
            }
            (stage, kind) => {
                debug!(?stage, ?kind, "Ignoring event not expected in this phase.");
            }
        }
    }

    // --- Read model ---

    pub fn phase(&self) -> Phase {
        self.stage.phase()
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn pending_transcript(&self) -> &str {
        &self.pending
    }

    pub fn transcript(&self) -> &TranscriptLog {
        &self.transcript
    }

    pub fn script(&self) -> &InterviewScript {
        &self.script
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    /// True while a session is running (Speaking, Listening or Thinking).
    pub fn is_active(&self) -> bool {
        !matches!(self.stage, Stage::Idle | Stage::Complete)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase(),
            question_index: self.question_index,
            total_questions: self.script.len(),
            turns: self.transcript.turns().to_vec(),
            pending_transcript: self.pending.clone(),
            notice: self.notice.clone(),
            summary: self.summary.clone(),
        }
    }

    // --- Transitions ---

    fn enter(&mut self, stage: Stage) -> Generation {
        self.generation = self.generation.next();
        self.stage = stage;
        debug!(generation = %self.generation, phase = ?stage.phase(), question_index = self.question_index, "Session phase changed.");
        self.generation
    }

    /// Records an AI turn and hands it to the output port.
    async fn say(&mut self, text: String, utterance: Utterance) {
        self.transcript.push(Turn::ai(text.clone()));
        let generation = self.enter(Stage::Speaking(utterance));

        match self.output.speak(&text, generation).await {
            Ok(()) => {}
            Err(SpeechError::Busy) => {
                error!(%generation, "Speech output refused a request while busy; continuing as if spoken.");
                emit(&self.events, generation, EventKind::SpeakCompleted);
            }
            Err(e) => {
                warn!(error = %e, "Speech output unavailable; continuing as if spoken.");
                emit(&self.events, generation, EventKind::SpeakCompleted);
            }
        }
    }

    async fn on_spoken(&mut self, utterance: Utterance) {
        match utterance {
            Utterance::Prompt | Utterance::Reprompt => self.listen().await,
            Utterance::Closing => {
                self.input.stop().await;
                self.complete(Ending::Finished);
            }
        }
    }

    async fn listen(&mut self) {
        self.pending.clear();
        let generation = self.enter(Stage::Listening { capturing: true });

        match self.input.start(generation).await {
            Ok(()) => {}
            Err(SpeechError::Unavailable) => {
                // No recognizer: the capture ends at once with nothing heard.
                debug!(%generation, "Recognition unavailable; ending capture immediately.");
                emit(&self.events, generation, EventKind::RecognitionEnded);
            }
            Err(e) => {
                warn!(error = %e, "Speech recognition could not start.");
                emit(
                    &self.events,
                    generation,
                    EventKind::RecognitionFailed(e.to_string()),
                );
            }
        }
    }

    /// The input stream ended on its own (silence, error) rather than via
    /// `finish_answer`.
    async fn on_capture_ended(&mut self) {
        self.stage = Stage::Listening { capturing: false };

        if !self.pending.trim().is_empty() {
            self.record_answer().await;
        } else if !self.auto_reprompted {
            self.auto_reprompted = true;
            info!(question_index = self.question_index, "Capture ended without an answer; re-prompting.");
            self.say(REPROMPT.to_string(), Utterance::Reprompt).await;
        } else {
            info!(question_index = self.question_index, "Capture ended without an answer; waiting for the candidate.");
        }
    }

    async fn record_answer(&mut self) {
        let answer = std::mem::take(&mut self.pending);
        self.transcript.push(Turn::user(answer.trim()));
        info!(question_index = self.question_index, "Answer recorded.");

        let next = if self.question_index < self.script.last_index() {
            self.question_index += 1;
            NextPrompt::Question
        } else {
            NextPrompt::Closing
        };

        let generation = self.enter(Stage::Thinking(next));
        let events = self.events.clone();
        let pause = self.options.thinking_pause;
        self.thinking_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(pause).await;
            emit(&events, generation, EventKind::ThinkingElapsed);
        }));
    }

    async fn ask(&mut self, next: NextPrompt) {
        self.auto_reprompted = false;
        match next {
            NextPrompt::Question => {
                let prompt = self.current_prompt().to_string();
                self.say(prompt, Utterance::Prompt).await;
            }
            NextPrompt::Closing => {
                self.say(CLOSING_REMARK.to_string(), Utterance::Closing).await;
            }
        }
    }

    fn complete(&mut self, ending: Ending) {
        self.enter(Stage::Complete);
        self.pending.clear();

        let summary = SessionSummary {
            questions_answered: self.transcript.count(Speaker::User),
            question_reached: self.question_index + 1,
            total_questions: self.script.len(),
            duration_secs: self
                .started_at
                .map(|started| started.elapsed().as_secs())
                .unwrap_or(0),
            confidence_score: CONFIDENCE_SCORE,
            ending,
        };
        info!(
            ?ending,
            answered = summary.questions_answered,
            total = summary.total_questions,
            "Interview complete."
        );
        self.summary = Some(summary);
    }

    /// Force-stops both ports and the Thinking timer.
    async fn halt_ports(&mut self) {
        if let Some(timer) = self.thinking_timer.take() {
            timer.abort();
        }
        self.input.stop().await;
        self.output.cancel().await;
    }

    fn current_prompt(&self) -> &str {
        self.script.prompt(self.question_index).unwrap_or_default()
    }

    fn degraded_notice(&self) -> Option<String> {
        let notice = match (self.output.is_available(), self.input.is_available()) {
            (true, true) => return None,
            (false, true) => "Speech synthesis is unavailable; questions are shown as text only.",
            (true, false) => "Speech recognition is unavailable; type your answers instead.",
            (false, false) => {
                "Speech synthesis and recognition are unavailable; the interview runs in text-only mode."
            }
        };
        Some(notice.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::{MockSpeechInputPort, MockSpeechOutputPort, event_channel};

    fn two_questions() -> InterviewScript {
        InterviewScript::new(["Q1", "Q2"]).unwrap()
    }

    #[tokio::test]
    async fn test_stop_while_speaking_cancels_and_issues_no_further_requests() {
        let (tx, _rx) = event_channel();

        let mut output = MockSpeechOutputPort::new();
        output.expect_is_available().return_const(true);
        output.expect_speak().times(1).returning(|_, _| Ok(()));
        output.expect_cancel().times(1).returning(|| ());

        let mut input = MockSpeechInputPort::new();
        input.expect_is_available().return_const(true);
        input.expect_start().times(0);
        input.expect_stop().times(1).returning(|| ());

        let mut session =
            InterviewSession::new(two_questions(), Arc::new(output), Arc::new(input), tx);
        session.start().await;
        assert_eq!(session.phase(), Phase::Speaking);
        let speaking_generation = session.generation();

        session.stop().await;
        assert_eq!(session.phase(), Phase::Complete);

        // The cancelled utterance's completion arrives late and must be ignored.
        session
            .handle_event(SessionEvent {
                generation: speaking_generation,
                kind: EventKind::SpeakCompleted,
            })
            .await;
        assert_eq!(session.phase(), Phase::Complete);

        // Idempotent: no second cancel/stop.
        session.stop().await;
        let summary = session.summary().unwrap();
        assert_eq!(summary.ending, Ending::Stopped);
        assert_eq!(summary.questions_answered, 0);
    }

    #[tokio::test]
    async fn test_busy_output_counts_as_spoken() {
        let (tx, mut rx) = event_channel();

        let mut output = MockSpeechOutputPort::new();
        output.expect_is_available().return_const(true);
        output
            .expect_speak()
            .times(1)
            .returning(|_, _| Err(SpeechError::Busy));

        let mut input = MockSpeechInputPort::new();
        input.expect_is_available().return_const(true);
        input.expect_start().times(1).returning(|_| Ok(()));

        let mut session =
            InterviewSession::new(two_questions(), Arc::new(output), Arc::new(input), tx);
        session.start().await;

        assert_eq!(session.phase(), Phase::Speaking);
        assert_eq!(session.transcript().len(), 1);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.generation, session.generation());
        assert_eq!(event.kind, EventKind::SpeakCompleted);

        // The refused prompt does not stall the interview.
        session.handle_event(event).await;
        assert_eq!(session.phase(), Phase::Listening);
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.question_index(), 0);
    }

    #[tokio::test]
    async fn test_stop_from_idle_completes_without_port_calls() {
        let (tx, _rx) = event_channel();
        let output = MockSpeechOutputPort::new();
        let input = MockSpeechInputPort::new();

        let mut session =
            InterviewSession::new(two_questions(), Arc::new(output), Arc::new(input), tx);
        session.stop().await;

        assert_eq!(session.phase(), Phase::Complete);
        assert_eq!(session.summary().unwrap().question_reached, 1);
    }

    #[tokio::test]
    async fn test_finish_answer_outside_listening_is_ignored() {
        let (tx, _rx) = event_channel();
        let output = MockSpeechOutputPort::new();
        let input = MockSpeechInputPort::new();

        let mut session =
            InterviewSession::new(two_questions(), Arc::new(output), Arc::new(input), tx);
        session.finish_answer().await;

        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn test_summary_duration_label() {
        let summary = SessionSummary {
            questions_answered: 5,
            question_reached: 5,
            total_questions: 5,
            duration_secs: 323,
            confidence_score: CONFIDENCE_SCORE,
            ending: Ending::Finished,
        };
        assert_eq!(summary.duration_label(), "5:23");
    }

    #[test]
    fn test_phase_serializes_by_name() {
        assert_eq!(serde_json::to_string(&Phase::Listening).unwrap(), "\"Listening\"");
    }
}
