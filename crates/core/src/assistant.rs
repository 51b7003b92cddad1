//! HR Chat Assistant
//!
//! A keyword-matching responder over the [`Directory`]. There is no language
//! understanding: the lower-cased query is checked against a fixed, ordered
//! table of phrases and the first hit decides the answer.

use crate::directory::{CandidateStage, Directory};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

pub const WELCOME: &str =
    "Hello! I am your AI HR Assistant. Ask me about employee stats, policies, or candidates.";

const FALLBACK: &str =
    "I'm not sure about that. Try asking about employee counts, departments, or specific candidates.";

const LEAVE_POLICY: &str = "Our standard leave policy allows for 20 days of PTO per year. Remote work is supported for most engineering and product roles.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Headcount,
    Salary,
    Policy,
    Hiring,
    Performance,
}

/// Checked in order; the first row with a matching phrase wins.
const DECISION_TABLE: [(&[&str], Topic); 5] = [
    (&["how many employees", "count"], Topic::Headcount),
    (&["salary", "paid"], Topic::Salary),
    (&["policy", "leave"], Topic::Policy),
    (&["hiring", "candidates"], Topic::Hiring),
    (&["performance"], Topic::Performance),
];

fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Answers a free-text question about the directory.
pub fn respond(query: &str, directory: &Directory) -> String {
    let query = query.to_lowercase();
    let topic = DECISION_TABLE
        .iter()
        .find(|(phrases, _)| phrases.iter().any(|p| query.contains(p)))
        .map(|(_, topic)| *topic);

    match topic {
        Some(Topic::Headcount) => {
            let departments: HashSet<_> =
                directory.employees().iter().map(|e| &e.department).collect();
            format!(
                "We currently have {} active employees across {} departments.",
                directory.employees().len(),
                departments.len()
            )
        }
        Some(Topic::Salary) => format!(
            "The average salary in the company is ${}.",
            thousands(directory.average_salary())
        ),
        Some(Topic::Policy) => LEAVE_POLICY.to_string(),
        Some(Topic::Hiring) => format!(
            "We have {} active candidates in the pipeline. {} offer(s) are currently out.",
            directory.candidates().len(),
            directory.candidates_in(CandidateStage::Offer).count()
        ),
        Some(Topic::Performance) => match directory.top_performer() {
            Some(top) => format!(
                "The average performance score is {:.1}. Our top performer is {}.",
                directory.average_performance(),
                top.name
            ),
            None => "There are no employees to rate yet.".to_string(),
        },
        None => FALLBACK.to_string(),
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Serialize, Clone)]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Conversation log for the assistant, opened with a welcome message.
#[derive(Debug, Clone)]
pub struct ChatAssistant {
    messages: Vec<ChatMessage>,
}

impl Default for ChatAssistant {
    fn default() -> Self {
        Self {
            messages: vec![ChatMessage::new(Sender::Ai, WELCOME)],
        }
    }
}

impl ChatAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the user's message and the assistant's reply, returning the reply.
    pub fn send(&mut self, text: &str, directory: &Directory) -> &ChatMessage {
        self.messages.push(ChatMessage::new(Sender::User, text));
        self.messages
            .push(ChatMessage::new(Sender::Ai, respond(text, directory)));
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}
