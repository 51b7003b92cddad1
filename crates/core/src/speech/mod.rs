//! Speech Ports
//!
//! The interview controller talks to the host's speech capabilities only
//! through the two traits in this module. Implementations accept a request
//! immediately and report its outcome later as a [`SessionEvent`] on the
//! session's event channel, tagged with the [`Generation`] the request was
//! issued under. Nothing here queues: a second `speak` while one is in flight
//! is refused with [`SpeechError::Busy`].
//!
//! - `scripted`: deterministic doubles driven by hand (tests) or by canned
//!   answers (demo runs).

pub mod scripted;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Tag identifying which request an asynchronous event belongs to.
///
/// The controller moves to a fresh generation every time it enters a phase,
/// so anything carrying an older tag is stale and gets dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failures a speech capability can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("Speech capability is not available in this environment")]
    Unavailable,
    #[error("Speech output is already speaking")]
    Busy,
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),
    #[error("Speech recognition failed: {0}")]
    Recognition(String),
}

/// What happened, as reported back to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// The output port finished rendering the current utterance.
    SpeakCompleted,
    /// The output port gave up on the current utterance.
    SpeakFailed(String),
    /// The input port began capturing.
    RecognitionStarted,
    /// Best current hypothesis (interim or final) for the utterance being captured.
    RecognitionResult(String),
    /// The capture stream ended, on request or on its own.
    RecognitionEnded,
    /// The capture attempt failed.
    RecognitionFailed(String),
    /// The pause between an answer and the next prompt is over.
    ThinkingElapsed,
}

/// An event tagged with the generation of the request that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub generation: Generation,
    pub kind: EventKind,
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Creates the channel a session and its ports share.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Sends an event, tolerating a receiver that has already gone away.
pub fn emit(events: &EventSender, generation: Generation, kind: EventKind) {
    if events.send(SessionEvent { generation, kind }).is_err() {
        debug!(%generation, "Dropping speech event: session receiver closed.");
    }
}

/// Submits text for audio rendering.
///
/// `speak` returns as soon as the request is accepted or refused. An accepted
/// request later produces exactly one `SpeakCompleted` or `SpeakFailed`
/// event, unless it is cancelled first, in which case it produces nothing.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechOutputPort: Send + Sync {
    /// Whether the host has a synthesis capability at all.
    fn is_available(&self) -> bool;

    /// Whether a request is currently in flight.
    fn is_speaking(&self) -> bool;

    async fn speak(&self, text: &str, generation: Generation) -> Result<(), SpeechError>;

    /// Ends any in-flight request without signalling completion.
    async fn cancel(&self);
}

/// Captures spoken answers.
///
/// While started, the port emits zero or more `RecognitionResult` events and
/// finally one `RecognitionEnded` (or `RecognitionFailed`).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechInputPort: Send + Sync {
    fn is_available(&self) -> bool;

    /// Begins a capture session. Starting while already started is a no-op.
    async fn start(&self, generation: Generation) -> Result<(), SpeechError>;

    /// Ends the capture session. Safe to call when not started.
    async fn stop(&self);
}
