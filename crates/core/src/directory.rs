//! Employee and Candidate Directory
//!
//! An explicitly owned, in-memory store of staff and hiring-pipeline records.
//! Whoever needs it (the console, the chat assistant) borrows it; there is no
//! shared global instance.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Open positions are not tracked per requisition; the dashboard shows a fixed figure.
pub const OPEN_POSITIONS: usize = 12;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DirectoryError {
    #[error("No employee with id '{0}'")]
    EmployeeNotFound(String),
    #[error("No candidate with id '{0}'")]
    CandidateNotFound(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidField(&'static str, String),
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeStatus {
    Active,
    OnLeave,
    Remote,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStage {
    Applied,
    Screening,
    Interview,
    Offer,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub role: String,
    pub department: String,
    pub email: String,
    pub status: EmployeeStatus,
    pub join_date: NaiveDate,
    pub salary: u32,
    /// Rating between 1.0 and 5.0.
    pub performance: f32,
}

/// Everything needed to create an employee; the directory assigns the id.
#[derive(Debug, Deserialize, Clone)]
pub struct NewEmployee {
    pub name: String,
    pub role: String,
    pub department: String,
    pub email: String,
    pub status: EmployeeStatus,
    pub join_date: NaiveDate,
    pub salary: u32,
    pub performance: f32,
}

/// Partial update for an employee. `None` fields are left alone.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EmployeePatch {
    pub name: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub email: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub join_date: Option<NaiveDate>,
    pub salary: Option<u32>,
    pub performance: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub role: String,
    pub stage: CandidateStage,
    pub score: u8,
    pub email: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewCandidate {
    pub name: String,
    pub role: String,
    pub stage: CandidateStage,
    pub score: u8,
    pub email: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CandidatePatch {
    pub name: Option<String>,
    pub role: Option<String>,
    pub stage: Option<CandidateStage>,
    pub score: Option<u8>,
    pub email: Option<String>,
}

/// Headline figures for the dashboard.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DirectoryStats {
    pub total_employees: usize,
    pub open_positions: usize,
    pub active_candidates: usize,
    /// Mean performance rounded to one decimal; 0.0 with no employees.
    pub avg_performance: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Directory {
    employees: Vec<Employee>,
    candidates: Vec<Candidate>,
}

fn check_performance(value: f32) -> Result<f32, DirectoryError> {
    if (1.0..=5.0).contains(&value) {
        Ok(value)
    } else {
        Err(DirectoryError::InvalidField(
            "performance",
            format!("{value} is outside 1.0..=5.0"),
        ))
    }
}

fn check_score(value: u8) -> Result<u8, DirectoryError> {
    if value <= 100 {
        Ok(value)
    } else {
        Err(DirectoryError::InvalidField(
            "score",
            format!("{value} is above 100"),
        ))
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A directory pre-filled with the sample company.
    pub fn seeded() -> Self {
        let employee = |id: &str,
                        name: &str,
                        role: &str,
                        department: &str,
                        email: &str,
                        status,
                        (y, m, d): (i32, u32, u32),
                        salary,
                        performance| Employee {
            id: id.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            department: department.to_string(),
            email: email.to_string(),
            status,
            join_date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
            salary,
            performance,
        };
        let candidate = |id: &str, name: &str, role: &str, stage, score, email: &str| Candidate {
            id: id.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            stage,
            score,
            email: email.to_string(),
        };

        use CandidateStage::*;
        use EmployeeStatus::*;
        Self {
            employees: vec![
                employee("1", "Alice Johnson", "Senior Developer", "Engineering", "alice@company.com", Active, (2021, 3, 15), 120_000, 4.8),
                employee("2", "Bob Smith", "Product Manager", "Product", "bob@company.com", Remote, (2020, 6, 10), 115_000, 4.5),
                employee("3", "Charlie Davis", "UX Designer", "Design", "charlie@company.com", OnLeave, (2022, 1, 20), 95_000, 4.2),
                employee("4", "Diana Prince", "HR Specialist", "HR", "diana@company.com", Active, (2019, 11, 5), 85_000, 4.9),
                employee("5", "Evan Wright", "Frontend Dev", "Engineering", "evan@company.com", Active, (2023, 2, 14), 90_000, 4.0),
            ],
            candidates: vec![
                candidate("101", "Frank Miller", "Senior Developer", Interview, 85, "frank@example.com"),
                candidate("102", "Grace Hoppers", "Data Scientist", Applied, 0, "grace@example.com"),
                candidate("103", "Hank Pym", "Product Manager", Offer, 92, "hank@example.com"),
            ],
        }
    }

    // --- Employees ---

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn employee(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    /// Employees whose name or role contains `term`, ignoring case. A blank
    /// term matches everyone.
    pub fn search_employees<'a>(&'a self, term: &str) -> impl Iterator<Item = &'a Employee> + use<'a> {
        let term = term.trim().to_lowercase();
        self.employees.iter().filter(move |e| {
            e.name.to_lowercase().contains(&term) || e.role.to_lowercase().contains(&term)
        })
    }

    pub fn add_employee(&mut self, new: NewEmployee) -> Result<&Employee, DirectoryError> {
        let employee = Employee {
            id: new_id(),
            name: new.name,
            role: new.role,
            department: new.department,
            email: new.email,
            status: new.status,
            join_date: new.join_date,
            salary: new.salary,
            performance: check_performance(new.performance)?,
        };
        self.employees.push(employee);
        Ok(&self.employees[self.employees.len() - 1])
    }

    pub fn update_employee(
        &mut self,
        id: &str,
        patch: EmployeePatch,
    ) -> Result<&Employee, DirectoryError> {
        if let Some(performance) = patch.performance {
            check_performance(performance)?;
        }
        let employee = self
            .employees
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| DirectoryError::EmployeeNotFound(id.to_string()))?;

        if let Some(name) = patch.name {
            employee.name = name;
        }
        if let Some(role) = patch.role {
            employee.role = role;
        }
        if let Some(department) = patch.department {
            employee.department = department;
        }
        if let Some(email) = patch.email {
            employee.email = email;
        }
        if let Some(status) = patch.status {
            employee.status = status;
        }
        if let Some(join_date) = patch.join_date {
            employee.join_date = join_date;
        }
        if let Some(salary) = patch.salary {
            employee.salary = salary;
        }
        if let Some(performance) = patch.performance {
            employee.performance = performance;
        }
        Ok(&*employee)
    }

    pub fn delete_employee(&mut self, id: &str) -> Result<Employee, DirectoryError> {
        let position = self
            .employees
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| DirectoryError::EmployeeNotFound(id.to_string()))?;
        Ok(self.employees.remove(position))
    }

    // --- Candidates ---

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn candidate(&self, id: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    pub fn add_candidate(&mut self, new: NewCandidate) -> Result<&Candidate, DirectoryError> {
        let candidate = Candidate {
            id: new_id(),
            name: new.name,
            role: new.role,
            stage: new.stage,
            score: check_score(new.score)?,
            email: new.email,
        };
        self.candidates.push(candidate);
        Ok(&self.candidates[self.candidates.len() - 1])
    }

    pub fn update_candidate(
        &mut self,
        id: &str,
        patch: CandidatePatch,
    ) -> Result<&Candidate, DirectoryError> {
        if let Some(score) = patch.score {
            check_score(score)?;
        }
        let candidate = self
            .candidates
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DirectoryError::CandidateNotFound(id.to_string()))?;

        if let Some(name) = patch.name {
            candidate.name = name;
        }
        if let Some(role) = patch.role {
            candidate.role = role;
        }
        if let Some(stage) = patch.stage {
            candidate.stage = stage;
        }
        if let Some(score) = patch.score {
            candidate.score = score;
        }
        if let Some(email) = patch.email {
            candidate.email = email;
        }
        Ok(&*candidate)
    }

    pub fn move_candidate_stage(
        &mut self,
        id: &str,
        stage: CandidateStage,
    ) -> Result<&Candidate, DirectoryError> {
        self.update_candidate(
            id,
            CandidatePatch {
                stage: Some(stage),
                ..Default::default()
            },
        )
    }

    pub fn candidates_in(&self, stage: CandidateStage) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(move |c| c.stage == stage)
    }

    // --- Derived figures ---

    pub fn stats(&self) -> DirectoryStats {
        DirectoryStats {
            total_employees: self.employees.len(),
            open_positions: OPEN_POSITIONS,
            active_candidates: self.candidates.len(),
            avg_performance: (self.average_performance() * 10.0).round() / 10.0,
        }
    }

    /// Mean performance rating, unrounded.
    pub fn average_performance(&self) -> f32 {
        if self.employees.is_empty() {
            return 0.0;
        }
        self.employees.iter().map(|e| e.performance).sum::<f32>() / self.employees.len() as f32
    }

    /// Mean salary rounded to whole currency units.
    pub fn average_salary(&self) -> u64 {
        if self.employees.is_empty() {
            return 0;
        }
        let total: u64 = self.employees.iter().map(|e| u64::from(e.salary)).sum();
        (total as f64 / self.employees.len() as f64).round() as u64
    }

    /// Head count per department, ordered by department name.
    pub fn department_distribution(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for employee in &self.employees {
            *counts.entry(employee.department.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn top_performer(&self) -> Option<&Employee> {
        self.employees
            .iter()
            .reduce(|best, e| if best.performance > e.performance { best } else { e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_hire() -> NewEmployee {
        NewEmployee {
            name: "Ivy Chen".into(),
            role: "Data Engineer".into(),
            department: "Engineering".into(),
            email: "ivy@company.com".into(),
            status: EmployeeStatus::Active,
            join_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            salary: 110_000,
            performance: 3.5,
        }
    }

    #[test]
    fn test_search_matches_name_or_role_ignoring_case() {
        let directory = Directory::seeded();
        let names = |term: &str| -> Vec<String> {
            directory
                .search_employees(term)
                .map(|e| e.name.clone())
                .collect()
        };

        assert_eq!(names("ALICE"), ["Alice Johnson"]);
        // "dev" hits "Senior Developer" and "Frontend Dev".
        assert_eq!(names("dev"), ["Alice Johnson", "Evan Wright"]);
        // Department is not searched.
        assert!(names("engineering").is_empty());
        assert_eq!(names("  ").len(), 5);
    }

    #[test]
    fn test_seeded_stats() {
        let directory = Directory::seeded();
        let stats = directory.stats();

        assert_eq!(stats.total_employees, 5);
        assert_eq!(stats.open_positions, 12);
        assert_eq!(stats.active_candidates, 3);
        assert_eq!(stats.avg_performance, 4.5);
        assert_eq!(directory.average_salary(), 101_000);
    }

    #[test]
    fn test_department_distribution() {
        let directory = Directory::seeded();
        let distribution = directory.department_distribution();

        assert_eq!(distribution.len(), 4);
        assert_eq!(distribution["Engineering"], 2);
        assert_eq!(distribution["HR"], 1);
    }

    #[test]
    fn test_add_employee_assigns_unique_ids() {
        let mut directory = Directory::seeded();
        let first = directory.add_employee(new_hire()).unwrap().id.clone();
        let second = directory.add_employee(new_hire()).unwrap().id.clone();

        assert_ne!(first, second);
        assert_eq!(directory.employees().len(), 7);
        assert_eq!(directory.employee(&first).unwrap().name, "Ivy Chen");
    }

    #[test]
    fn test_add_employee_rejects_bad_performance() {
        let mut directory = Directory::new();
        let mut hire = new_hire();
        hire.performance = 7.0;

        let err = directory.add_employee(hire).unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidField("performance", _)));
        assert!(directory.employees().is_empty());
    }

    #[test]
    fn test_update_employee_applies_only_given_fields() {
        let mut directory = Directory::seeded();
        let updated = directory
            .update_employee(
                "3",
                EmployeePatch {
                    status: Some(EmployeeStatus::Active),
                    salary: Some(99_000),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.status, EmployeeStatus::Active);
        assert_eq!(updated.salary, 99_000);
        assert_eq!(updated.name, "Charlie Davis");
    }

    #[test]
    fn test_missing_ids_are_reported() {
        let mut directory = Directory::seeded();
        assert_eq!(
            directory.delete_employee("nope").unwrap_err(),
            DirectoryError::EmployeeNotFound("nope".into())
        );
        assert_eq!(
            directory
                .move_candidate_stage("nope", CandidateStage::Offer)
                .unwrap_err(),
            DirectoryError::CandidateNotFound("nope".into())
        );
    }

    #[test]
    fn test_delete_employee() {
        let mut directory = Directory::seeded();
        let removed = directory.delete_employee("1").unwrap();

        assert_eq!(removed.name, "Alice Johnson");
        assert!(directory.employee("1").is_none());
        assert_eq!(directory.top_performer().unwrap().name, "Diana Prince");
    }

    #[test]
    fn test_move_candidate_stage() {
        let mut directory = Directory::seeded();
        directory
            .move_candidate_stage("102", CandidateStage::Screening)
            .unwrap();

        assert_eq!(
            directory.candidate("102").unwrap().stage,
            CandidateStage::Screening
        );
        assert_eq!(directory.candidates_in(CandidateStage::Offer).count(), 1);
    }

    #[test]
    fn test_add_candidate_rejects_score_above_100() {
        let mut directory = Directory::new();
        let err = directory
            .add_candidate(NewCandidate {
                name: "Jo".into(),
                role: "Analyst".into(),
                stage: CandidateStage::Applied,
                score: 101,
                email: "jo@example.com".into(),
            })
            .unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidField("score", _)));
    }

    #[test]
    fn test_empty_directory_averages() {
        let directory = Directory::new();
        assert_eq!(directory.stats().avg_performance, 0.0);
        assert_eq!(directory.average_salary(), 0);
        assert!(directory.top_performer().is_none());
    }
}
