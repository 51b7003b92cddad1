//! Console Interview Runtime
//!
//! Owns an [`InterviewSession`] and feeds it from two sources at once: the
//! speech event channel and the candidate's typed commands. After every step
//! the [`TranscriptView`] prints whatever changed.

use crate::terminal::LineRecognizer;
use anyhow::{Context, Result};
use hireflow_core::{
    script::InterviewScript,
    session::{Ending, InterviewSession, Phase, SessionOptions, SessionSummary},
    speech::{
        EventReceiver,
        scripted::{ScriptedRecognizer, ScriptedVoice},
        event_channel,
    },
    transcript::Speaker,
};
use std::{io::Write, sync::Arc};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Answers used by `demo` when none are given.
pub const DEMO_ANSWERS: [&str; 3] = [
    "I have spent five years building backend services and leading small teams.",
    "I once missed a deadline, owned it with the client, and changed how we estimate.",
    "I want to grow into a staff role where I can mentor other engineers.",
];

/// A line of console input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Anything that is not a slash command is answer text.
    Answer(String),
    Finish,
    Stop,
    Restart,
    Quit,
}

impl ConsoleCommand {
    /// Returns `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        match line {
            "" => None,
            "/done" => Some(Self::Finish),
            "/stop" | "/end" => Some(Self::Stop),
            "/restart" => Some(Self::Restart),
            "/quit" | "/exit" => Some(Self::Quit),
            text => Some(Self::Answer(text.to_string())),
        }
    }
}

/// Prints the parts of a session that changed since the last render.
pub struct TranscriptView<W> {
    out: W,
    shown_turns: usize,
    shown_phase: Phase,
    shown_summary: bool,
}

impl<W: Write> TranscriptView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown_turns: 0,
            shown_phase: Phase::Idle,
            shown_summary: false,
        }
    }

    /// Forgets what was shown, for a session that is about to start over.
    pub fn reset(&mut self) -> std::io::Result<()> {
        self.shown_turns = 0;
        self.shown_phase = Phase::Idle;
        self.shown_summary = false;
        writeln!(self.out, "\n--- Interview restarted ---")
    }

    pub fn render(&mut self, session: &InterviewSession) -> std::io::Result<()> {
        let turns = session.transcript().turns();
        if self.shown_turns == 0 && !turns.is_empty() {
            if let Some(notice) = session.notice() {
                writeln!(self.out, "! {notice}")?;
            }
        }
        for turn in turns.iter().skip(self.shown_turns) {
            let label = match turn.speaker {
                Speaker::Ai => "Interviewer",
                Speaker::User => "You",
            };
            writeln!(self.out, "{label}: {}", turn.text)?;
        }
        self.shown_turns = turns.len();

        let phase = session.phase();
        if phase != self.shown_phase {
            self.shown_phase = phase;
            match phase {
                Phase::Listening => writeln!(
                    self.out,
                    "  (question {} of {}; type your answer, /done when finished)",
                    session.question_index() + 1,
                    session.script().len()
                )?,
                Phase::Thinking => writeln!(self.out, "  (thinking...)")?,
                Phase::Idle | Phase::Speaking | Phase::Complete => {}
            }
        }

        if phase == Phase::Complete && !self.shown_summary {
            if let Some(summary) = session.summary() {
                self.print_summary(summary)?;
            }
            self.shown_summary = true;
        }
        self.out.flush()
    }

    fn print_summary(&mut self, summary: &SessionSummary) -> std::io::Result<()> {
        let how = match summary.ending {
            Ending::Finished => "finished",
            Ending::Stopped => "stopped early",
        };
        writeln!(self.out, "\nInterview complete ({how}).")?;
        writeln!(
            self.out,
            "  Questions answered: {} of {}",
            summary.questions_answered, summary.total_questions
        )?;
        writeln!(self.out, "  Duration: {}", summary.duration_label())?;
        writeln!(self.out, "  Confidence score: {}%", summary.confidence_score)
    }

    /// Tells the candidate why typed text was not taken as an answer.
    pub fn hint(&mut self, phase: Phase) -> std::io::Result<()> {
        let hint = match phase {
            Phase::Speaking | Phase::Thinking => "(wait for the question to finish)",
            Phase::Complete => "(the interview is over; /restart or /quit)",
            Phase::Idle | Phase::Listening => return Ok(()),
        };
        writeln!(self.out, "  {hint}")?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Runs one interactive interview against the terminal adapters.
pub struct InterviewRuntime<W> {
    session: InterviewSession,
    events: EventReceiver,
    recognizer: Arc<LineRecognizer>,
    view: TranscriptView<W>,
}

impl<W: Write> InterviewRuntime<W> {
    /// `recognizer` must be the same instance the session listens through.
    pub fn new(
        session: InterviewSession,
        events: EventReceiver,
        recognizer: Arc<LineRecognizer>,
        out: W,
    ) -> Self {
        Self {
            session,
            events,
            recognizer,
            view: TranscriptView::new(out),
        }
    }

    /// Starts the interview and serves it until `/quit` or the end of input.
    ///
    /// A finished interview stays on screen until the candidate restarts or
    /// quits. Quitting mid-interview stops it first. Returns the summary of
    /// the last interview, if it reached one.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<ConsoleCommand>,
    ) -> Result<Option<SessionSummary>> {
        self.session.start().await;
        self.view.render(&self.session)?;

        loop {
            tokio::select! {
                // Drain speech events before acting on the next command.
                biased;
                Some(event) = self.events.recv() => {
                    self.session.handle_event(event).await;
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        info!("Console input closed.");
                        break;
                    };
                    if !self.apply(command).await? {
                        break;
                    }
                }
            }
            self.view.render(&self.session)?;
        }

        self.session.stop().await;
        self.view.render(&self.session)?;
        Ok(self.session.summary().cloned())
    }

    /// Returns false when the candidate asked to leave.
    async fn apply(&mut self, command: ConsoleCommand) -> Result<bool> {
        debug!(?command, phase = ?self.session.phase(), "Console command.");
        match command {
            ConsoleCommand::Answer(text) => {
                if self.recognizer.feed(&text) {
                    return Ok(true);
                }
                if self.session.phase() == Phase::Listening {
                    // Without an active capture the text is a typed answer.
                    self.session.submit_text(&text);
                    self.session.finish_answer().await;
                } else {
                    self.view.hint(self.session.phase())?;
                }
            }
            ConsoleCommand::Finish => self.session.finish_answer().await,
            ConsoleCommand::Stop => self.session.stop().await,
            ConsoleCommand::Restart => {
                self.view.reset()?;
                self.session.restart().await;
            }
            ConsoleCommand::Quit => return Ok(false),
        }
        Ok(true)
    }
}

/// Runs a complete interview unattended, answering from `answers`.
pub async fn run_demo<W, I, S>(
    script: InterviewScript,
    answers: I,
    options: SessionOptions,
    out: W,
) -> Result<SessionSummary>
where
    W: Write,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let answers: Vec<String> = answers.into_iter().map(Into::into).collect();
    anyhow::ensure!(!answers.is_empty(), "A demo interview needs at least one answer");

    let (tx, mut rx) = event_channel();
    let voice = Arc::new(ScriptedVoice::auto_completing(tx.clone()));
    let recognizer = Arc::new(ScriptedRecognizer::answering(tx.clone(), answers));
    let mut session = InterviewSession::new(script, voice, recognizer, tx).with_options(options);
    let mut view = TranscriptView::new(out);

    session.start().await;
    view.render(&session)?;
    while session.phase() != Phase::Complete {
        let event = rx.recv().await.context("Speech event channel closed")?;
        session.handle_event(event).await;
        view.render(&session)?;
    }

    session
        .summary()
        .cloned()
        .context("Completed interview has no summary")
}
