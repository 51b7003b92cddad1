//! Terminal front end for the HR console.
//!
//! - `config`: environment-driven settings.
//! - `terminal`: speech port adapters backed by timers and typed lines.
//! - `runtime`: the interactive interview loop, its renderer and the demo run.
//! - `records`: a command shell over the employee and candidate directory.

pub mod config;
pub mod records;
pub mod runtime;
pub mod terminal;
