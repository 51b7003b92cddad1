//! Directory Shell
//!
//! A line-oriented front end over [`Directory`]: search and list staff, hire
//! and remove employees, and move candidates through the hiring pipeline.
//! Record bodies are given as JSON, the same shape the store deserializes.

use anyhow::{Context, Result, bail};
use hireflow_core::directory::{
    Candidate, CandidatePatch, CandidateStage, Directory, Employee, EmployeePatch, NewCandidate,
    NewEmployee,
};
use serde::de::DeserializeOwned;

pub const HELP: &str = "\
Commands:
  list [TERM]              employees whose name or role contains TERM
  show ID                  one employee
  hire {JSON}              add an employee
  update ID {JSON}         change some fields of an employee
  remove ID                delete an employee
  candidates [STAGE]       the hiring pipeline, optionally one stage
  apply {JSON}             add a candidate
  rescore ID {JSON}        change some fields of a candidate
  move ID STAGE            move a candidate to Applied/Screening/Interview/Offer/Rejected
  stats                    headline figures
  help";

fn parse_json<T: DeserializeOwned>(body: &str, what: &str) -> Result<T> {
    serde_json::from_str(body).with_context(|| format!("Invalid {what} JSON"))
}

fn parse_stage(raw: &str) -> Result<CandidateStage> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .with_context(|| format!("Unknown candidate stage '{raw}'"))
}

/// Splits `ID {JSON}` into the id and the body.
fn id_and_body(rest: &str) -> Result<(&str, &str)> {
    rest.split_once(char::is_whitespace)
        .map(|(id, body)| (id, body.trim()))
        .context("Expected an id followed by a JSON body")
}

pub fn employee_line(e: &Employee) -> String {
    format!(
        "{} | {} | {} | {} | {:?} | joined {} | ${} | perf {:.1}",
        e.id, e.name, e.role, e.department, e.status, e.join_date, e.salary, e.performance
    )
}

pub fn candidate_line(c: &Candidate) -> String {
    format!(
        "{} | {} | {} | {:?} | score {}",
        c.id, c.name, c.role, c.stage, c.score
    )
}

fn lines<T>(items: impl Iterator<Item = T>, line: impl Fn(T) -> String, empty: &str) -> String {
    let out: Vec<String> = items.map(line).collect();
    if out.is_empty() {
        empty.to_string()
    } else {
        out.join("\n")
    }
}

/// Owns a directory for the lifetime of one shell session.
pub struct RecordsShell {
    directory: Directory,
}

impl RecordsShell {
    pub fn new(directory: Directory) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Runs one command line and returns the text to print.
    pub fn execute(&mut self, line: &str) -> Result<String> {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((line, ""));

        let output = match command {
            "list" => lines(
                self.directory.search_employees(rest),
                employee_line,
                "No employees match.",
            ),
            "show" => self
                .directory
                .employee(rest)
                .map(employee_line)
                .with_context(|| format!("No employee with id '{rest}'"))?,
            "hire" => {
                let new: NewEmployee = parse_json(rest, "employee")?;
                format!("Hired {}", employee_line(self.directory.add_employee(new)?))
            }
            "update" => {
                let (id, body) = id_and_body(rest)?;
                let patch: EmployeePatch = parse_json(body, "employee update")?;
                format!("Updated {}", employee_line(self.directory.update_employee(id, patch)?))
            }
            "remove" => {
                let removed = self.directory.delete_employee(rest)?;
                format!("Removed {}", removed.name)
            }
            "candidates" if rest.is_empty() => lines(
                self.directory.candidates().iter(),
                candidate_line,
                "No candidates.",
            ),
            "candidates" => lines(
                self.directory.candidates_in(parse_stage(rest)?),
                candidate_line,
                "No candidates in that stage.",
            ),
            "apply" => {
                let new: NewCandidate = parse_json(rest, "candidate")?;
                format!("Added {}", candidate_line(self.directory.add_candidate(new)?))
            }
            "rescore" => {
                let (id, body) = id_and_body(rest)?;
                let patch: CandidatePatch = parse_json(body, "candidate update")?;
                format!(
                    "Updated {}",
                    candidate_line(self.directory.update_candidate(id, patch)?)
                )
            }
            "move" => {
                let (id, stage) = rest
                    .split_once(char::is_whitespace)
                    .context("Expected a candidate id and a stage")?;
                let stage = parse_stage(stage.trim())?;
                format!(
                    "Moved {}",
                    candidate_line(self.directory.move_candidate_stage(id, stage)?)
                )
            }
            "stats" => serde_json::to_string_pretty(&self.directory.stats())?,
            "help" => HELP.to_string(),
            other => bail!("Unknown command '{other}'; type help"),
        };
        Ok(output)
    }
}
