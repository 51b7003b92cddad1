//! Deterministic speech doubles.
//!
//! `ScriptedVoice` and `ScriptedRecognizer` implement the speech ports
//! without any audio. By default they only record requests; the holder of a
//! clone decides when a request completes, fails or hears something. The
//! `auto_completing` / `answering` constructors drive themselves, which is what
//! a demo run against canned answers needs.

use super::{
    EventKind, EventSender, Generation, SpeechError, SpeechInputPort, SpeechOutputPort, emit,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct VoiceState {
    available: bool,
    auto_complete: bool,
    in_flight: Option<Generation>,
    spoken: Vec<String>,
    cancels: usize,
}

/// Speech output double.
#[derive(Clone)]
pub struct ScriptedVoice {
    state: Arc<Mutex<VoiceState>>,
    events: EventSender,
}

impl ScriptedVoice {
    /// A voice whose requests stay in flight until `complete` or `fail` is called.
    pub fn new(events: EventSender) -> Self {
        Self::with_state(
            events,
            VoiceState {
                available: true,
                ..Default::default()
            },
        )
    }

    /// A voice that reports completion as soon as a request is accepted.
    pub fn auto_completing(events: EventSender) -> Self {
        Self::with_state(
            events,
            VoiceState {
                available: true,
                auto_complete: true,
                ..Default::default()
            },
        )
    }

    /// A host without synthesis.
    pub fn unavailable(events: EventSender) -> Self {
        Self::with_state(events, VoiceState::default())
    }

    fn with_state(events: EventSender, state: VoiceState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            events,
        }
    }

    /// Finishes the in-flight request. Returns false if nothing was in flight.
    pub fn complete(&self) -> bool {
        let finished = self.state.lock().unwrap().in_flight.take();
        match finished {
            Some(generation) => {
                emit(&self.events, generation, EventKind::SpeakCompleted);
                true
            }
            None => false,
        }
    }

    /// Fails the in-flight request. Returns false if nothing was in flight.
    pub fn fail(&self, reason: &str) -> bool {
        let failed = self.state.lock().unwrap().in_flight.take();
        match failed {
            Some(generation) => {
                emit(
                    &self.events,
                    generation,
                    EventKind::SpeakFailed(reason.to_string()),
                );
                true
            }
            None => false,
        }
    }

    /// Every text accepted so far, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.state.lock().unwrap().spoken.clone()
    }

    pub fn in_flight(&self) -> Option<Generation> {
        self.state.lock().unwrap().in_flight
    }

    pub fn cancel_count(&self) -> usize {
        self.state.lock().unwrap().cancels
    }
}

#[async_trait]
impl SpeechOutputPort for ScriptedVoice {
    fn is_available(&self) -> bool {
        self.state.lock().unwrap().available
    }

    fn is_speaking(&self) -> bool {
        self.state.lock().unwrap().in_flight.is_some()
    }

    async fn speak(&self, text: &str, generation: Generation) -> Result<(), SpeechError> {
        let mut state = self.state.lock().unwrap();
        if !state.available {
            return Err(SpeechError::Unavailable);
        }
        if state.in_flight.is_some() {
            return Err(SpeechError::Busy);
        }
        state.spoken.push(text.to_string());
        if state.auto_complete {
            emit(&self.events, generation, EventKind::SpeakCompleted);
        } else {
            state.in_flight = Some(generation);
        }
        Ok(())
    }

    async fn cancel(&self) {
        let mut state = self.state.lock().unwrap();
        state.in_flight = None;
        state.cancels += 1;
    }
}

#[derive(Default)]
struct RecognizerState {
    available: bool,
    active: Option<Generation>,
    answers: Vec<String>,
    next_answer: usize,
    starts: usize,
    stops: usize,
}

/// Speech input double.
#[derive(Clone)]
pub struct ScriptedRecognizer {
    state: Arc<Mutex<RecognizerState>>,
    events: EventSender,
}

impl ScriptedRecognizer {
    /// A recognizer that hears only what `hear` feeds it.
    pub fn new(events: EventSender) -> Self {
        Self::with_state(
            events,
            RecognizerState {
                available: true,
                ..Default::default()
            },
        )
    }

    /// A recognizer that answers every capture with the next canned answer
    /// (cycling) and then ends the stream, like a non-continuous browser engine.
    pub fn answering<I, S>(events: EventSender, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_state(
            events,
            RecognizerState {
                available: true,
                answers: answers.into_iter().map(Into::into).collect(),
                ..Default::default()
            },
        )
    }

    /// A host without recognition.
    pub fn unavailable(events: EventSender) -> Self {
        Self::with_state(events, RecognizerState::default())
    }

    fn with_state(events: EventSender, state: RecognizerState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            events,
        }
    }

    /// Emits a hypothesis for the active capture. Returns false when not capturing.
    pub fn hear(&self, text: &str) -> bool {
        let active = self.state.lock().unwrap().active;
        match active {
            Some(generation) => {
                emit(
                    &self.events,
                    generation,
                    EventKind::RecognitionResult(text.to_string()),
                );
                true
            }
            None => false,
        }
    }

    /// Ends the capture on the engine's own initiative (e.g. silence timeout).
    pub fn end(&self) -> bool {
        let ended = self.state.lock().unwrap().active.take();
        match ended {
            Some(generation) => {
                emit(&self.events, generation, EventKind::RecognitionEnded);
                true
            }
            None => false,
        }
    }

    /// Fails the active capture.
    pub fn fail(&self, reason: &str) -> bool {
        let failed = self.state.lock().unwrap().active.take();
        match failed {
            Some(generation) => {
                emit(
                    &self.events,
                    generation,
                    EventKind::RecognitionFailed(reason.to_string()),
                );
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().unwrap().active.is_some()
    }

    pub fn start_count(&self) -> usize {
        self.state.lock().unwrap().starts
    }

    pub fn stop_count(&self) -> usize {
        self.state.lock().unwrap().stops
    }
}

#[async_trait]
impl SpeechInputPort for ScriptedRecognizer {
    fn is_available(&self) -> bool {
        self.state.lock().unwrap().available
    }

    async fn start(&self, generation: Generation) -> Result<(), SpeechError> {
        let mut state = self.state.lock().unwrap();
        if !state.available {
            return Err(SpeechError::Unavailable);
        }
        if state.active.is_some() {
            return Ok(());
        }
        state.starts += 1;
        emit(&self.events, generation, EventKind::RecognitionStarted);

        if state.answers.is_empty() {
            state.active = Some(generation);
        } else {
            let answer = state.answers[state.next_answer % state.answers.len()].clone();
            state.next_answer += 1;
            emit(
                &self.events,
                generation,
                EventKind::RecognitionResult(answer),
            );
            emit(&self.events, generation, EventKind::RecognitionEnded);
        }
        Ok(())
    }

    async fn stop(&self) {
        let mut state = self.state.lock().unwrap();
        state.stops += 1;
        if let Some(generation) = state.active.take() {
            emit(&self.events, generation, EventKind::RecognitionEnded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::event_channel;

    #[tokio::test]
    async fn test_voice_refuses_overlapping_requests() {
        let (tx, mut rx) = event_channel();
        let voice = ScriptedVoice::new(tx);
        let first = Generation::default().next();

        voice.speak("one", first).await.unwrap();
        let second = voice.speak("two", first.next()).await;
        assert_eq!(second, Err(SpeechError::Busy));
        assert_eq!(voice.in_flight(), Some(first));

        assert!(voice.complete());
        let event = rx.recv().await.unwrap();
        assert_eq!(event.generation, first);
        assert_eq!(event.kind, EventKind::SpeakCompleted);
        assert_eq!(voice.spoken(), ["one"]);
    }

    #[tokio::test]
    async fn test_voice_cancel_is_silent() {
        let (tx, mut rx) = event_channel();
        let voice = ScriptedVoice::new(tx);
        voice.speak("one", Generation::default()).await.unwrap();

        voice.cancel().await;
        assert!(!voice.is_speaking());
        assert!(!voice.complete());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unavailable_voice() {
        let (tx, _rx) = event_channel();
        let voice = ScriptedVoice::unavailable(tx);
        assert!(!voice.is_available());
        assert_eq!(
            voice.speak("x", Generation::default()).await,
            Err(SpeechError::Unavailable)
        );
    }

    #[tokio::test]
    async fn test_recognizer_start_is_idempotent() {
        let (tx, mut rx) = event_channel();
        let recognizer = ScriptedRecognizer::new(tx);
        let generation = Generation::default();

        recognizer.start(generation).await.unwrap();
        recognizer.start(generation.next()).await.unwrap();
        assert_eq!(recognizer.start_count(), 1);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::RecognitionStarted);
        assert!(rx.try_recv().is_err());

        assert!(recognizer.hear("hello"));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.generation, generation);
        assert_eq!(event.kind, EventKind::RecognitionResult("hello".into()));
    }

    #[tokio::test]
    async fn test_recognizer_stop_when_idle_is_safe() {
        let (tx, mut rx) = event_channel();
        let recognizer = ScriptedRecognizer::new(tx);

        recognizer.stop().await;
        assert!(rx.try_recv().is_err());

        recognizer.start(Generation::default()).await.unwrap();
        recognizer.stop().await;
        recognizer.stop().await;
        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            [EventKind::RecognitionStarted, EventKind::RecognitionEnded]
        );
    }

    #[tokio::test]
    async fn test_answering_recognizer_cycles_answers() {
        let (tx, mut rx) = event_channel();
        let recognizer = ScriptedRecognizer::answering(tx, ["a", "b"]);

        for _ in 0..3 {
            recognizer.start(Generation::default()).await.unwrap();
        }
        let results: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| match e.kind {
                EventKind::RecognitionResult(text) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(results, ["a", "b", "a"]);
        assert!(!recognizer.is_active());
    }
}
