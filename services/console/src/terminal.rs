//! Terminal Speech Adapters
//!
//! Stand-ins for a real synthesizer and recognizer when the interview runs in
//! a terminal. [`TerminalVoice`] "speaks" by waiting as long as the text would
//! take to say aloud; [`LineRecognizer`] turns each typed line into a
//! recognition result.

use async_trait::async_trait;
use hireflow_core::speech::{
    EventKind, EventSender, Generation, SpeechError, SpeechInputPort, SpeechOutputPort, emit,
};
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::task::JoinHandle;
use tracing::{debug, info};

const MIN_SPEAKING_TIME: Duration = Duration::from_millis(300);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// How long `text` takes to say at `words_per_minute`.
pub fn speaking_time(text: &str, words_per_minute: u32) -> Duration {
    let words = text.split_whitespace().count() as u64;
    let millis = words * 60_000 / u64::from(words_per_minute.max(1));
    Duration::from_millis(millis).max(MIN_SPEAKING_TIME)
}

/// Simulated synthesizer with a realistic speaking duration.
pub struct TerminalVoice {
    available: bool,
    words_per_minute: u32,
    events: EventSender,
    in_flight: Arc<Mutex<Option<(Generation, JoinHandle<()>)>>>,
}

impl TerminalVoice {
    pub fn new(events: EventSender, words_per_minute: u32) -> Self {
        Self {
            available: true,
            words_per_minute,
            events,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// A voice for hosts without synthesis; every request is refused.
    pub fn unavailable(events: EventSender) -> Self {
        Self {
            available: false,
            ..Self::new(events, 1)
        }
    }
}

#[async_trait]
impl SpeechOutputPort for TerminalVoice {
    fn is_available(&self) -> bool {
        self.available
    }

    fn is_speaking(&self) -> bool {
        lock(&self.in_flight).is_some()
    }

    async fn speak(&self, text: &str, generation: Generation) -> Result<(), SpeechError> {
        if !self.available {
            return Err(SpeechError::Unavailable);
        }
        let mut in_flight = lock(&self.in_flight);
        if in_flight.is_some() {
            return Err(SpeechError::Busy);
        }

        let duration = speaking_time(text, self.words_per_minute);
        debug!(%generation, ?duration, "Speaking.");
        let slot = self.in_flight.clone();
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let mut current = lock(&slot);
            // A cancel may have cleared the slot while this task was waking up.
            if matches!(current.as_ref(), Some((g, _)) if *g == generation) {
                current.take();
                drop(current);
                emit(&events, generation, EventKind::SpeakCompleted);
            }
        });
        *in_flight = Some((generation, handle));
        Ok(())
    }

    async fn cancel(&self) {
        if let Some((generation, handle)) = lock(&self.in_flight).take() {
            handle.abort();
            debug!(%generation, "Speech cancelled.");
        }
    }
}

#[derive(Debug, Default)]
struct Capture {
    generation: Option<Generation>,
    heard: String,
}

/// Recognizer fed with typed lines.
///
/// In single-shot mode every line is a complete utterance and ends the
/// capture. In continuous mode lines accumulate into one growing hypothesis
/// until the capture is stopped.
pub struct LineRecognizer {
    available: bool,
    continuous: bool,
    events: EventSender,
    capture: Mutex<Capture>,
}

impl LineRecognizer {
    pub fn new(events: EventSender, continuous: bool) -> Self {
        Self {
            available: true,
            continuous,
            events,
            capture: Mutex::new(Capture::default()),
        }
    }

    /// A recognizer for hosts without speech input.
    pub fn unavailable(events: EventSender) -> Self {
        Self {
            available: false,
            ..Self::new(events, false)
        }
    }

    pub fn is_capturing(&self) -> bool {
        lock(&self.capture).generation.is_some()
    }

    /// Hands a typed line to the active capture. Returns false when nothing
    /// is capturing, leaving the caller to deliver the text another way.
    pub fn feed(&self, line: &str) -> bool {
        let mut capture = lock(&self.capture);
        let Some(generation) = capture.generation else {
            return false;
        };

        if self.continuous && !capture.heard.is_empty() {
            capture.heard.push(' ');
        }
        capture.heard.push_str(line.trim());
        emit(
            &self.events,
            generation,
            EventKind::RecognitionResult(capture.heard.clone()),
        );

        if !self.continuous {
            *capture = Capture::default();
            emit(&self.events, generation, EventKind::RecognitionEnded);
        }
        true
    }
}

#[async_trait]
impl SpeechInputPort for LineRecognizer {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn start(&self, generation: Generation) -> Result<(), SpeechError> {
        if !self.available {
            return Err(SpeechError::Unavailable);
        }
        let mut capture = lock(&self.capture);
        if capture.generation.is_some() {
            return Ok(());
        }
        capture.generation = Some(generation);
        capture.heard.clear();
        info!(%generation, "Listening for a typed answer.");
        emit(&self.events, generation, EventKind::RecognitionStarted);
        Ok(())
    }

    async fn stop(&self) {
        let mut capture = lock(&self.capture);
        if let Some(generation) = capture.generation.take() {
            capture.heard.clear();
            emit(&self.events, generation, EventKind::RecognitionEnded);
        }
    }
}
