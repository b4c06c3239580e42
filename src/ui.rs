// UI layer: terminal prompts with `dialoguer`, a spinner with `indicatif`
// while the grader runs, and styled output for results and errors.

use crate::error::{AtheneError, Result};
use crate::poller::{format_duration, Progress};
use crate::response::{CodeBlockKind, SubmitResults};
use crate::session::{parse_assignment_id, Prompter};
use crossterm::style::{style, Stylize};
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Asks for the assignment id and the token on the terminal. Empty answers
/// abandon the run.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn assignment_id(&mut self) -> Result<String> {
        // Accepts the bare id or the problem page URL.
        let input: String = Input::new()
            .with_prompt("Enter Assignment ID".bold().to_string())
            .allow_empty(true)
            .interact_text()?;
        let id = parse_assignment_id(&input);
        if id.is_empty() {
            return Err(AtheneError::AuthAbandoned);
        }
        Ok(id)
    }

    fn auth_token(&mut self, expired: bool) -> Result<String> {
        if expired {
            println!("Session timeout");
        }
        // `Password` hides input in terminal.
        let token: String = Password::new()
            .with_prompt("Enter Athene Token (not echoed)".bold().to_string())
            .allow_empty_password(true)
            .interact()?;
        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(AtheneError::AuthAbandoned);
        }
        Ok(token)
    }
}

/// Spinner showing how long the submission has been waiting.
pub struct WaitProgress {
    spinner: ProgressBar,
}

impl WaitProgress {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self { spinner }
    }
}

impl Default for WaitProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for WaitProgress {
    fn tick(&mut self, elapsed: Duration) {
        self.spinner.set_message(format!(
            "Waiting for Athene to grade submission... {}",
            format_duration(elapsed)
        ));
        self.spinner.tick();
    }

    fn finish(&mut self) {
        let message = self.spinner.message();
        self.spinner.finish_with_message(message);
    }
}

pub fn print_submitted() {
    println!("{}", "Submitted files".bold());
}

pub fn print_still_grading() {
    println!("Submission is still being graded.");
}

pub fn print_no_submissions() {
    println!("No submissions yet.");
}

pub fn print_session_timeout() {
    println!();
    println!(
        "{}",
        "Session timeout, use \"athene status\" to check status.".bold()
    );
}

pub fn print_submission_results(results: &SubmitResults) {
    let summary = format!(
        "Passed {} of {} test cases",
        results.test_cases_passed, results.total_test_cases
    );
    if results.all_passed() {
        println!("{}", style(summary).green().bold());
    } else {
        println!("{}", style(summary).red().bold());
    }

    if let Some((points, total)) = results.score() {
        println!("Received {} out of {} points", points, total);
    }

    println!();

    for block in &results.code_blocks {
        let title = style(&block.title).bold();
        match block.kind() {
            CodeBlockKind::CompileErrors | CodeBlockKind::RuntimeError => {
                println!("{}", title.red())
            }
            CodeBlockKind::FailedTestCase => println!("{}", title.yellow()),
            CodeBlockKind::Other => println!("{}", title),
        }
        println!("{}", block.content);
    }
}

pub fn print_error(err: &AtheneError) {
    eprintln!("{}", style(err).red());
}
