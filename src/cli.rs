// Command-line surface: three subcommands, each resolving the session once
// and then printing what the grader says.

use crate::api::AtheneClient;
use crate::config::{ConfigStore, FileConfigStore};
use crate::error::Result;
use crate::poller::{PollOutcome, SubmissionPoller};
use crate::response::AtheneResponse;
use crate::session::establish;
use crate::settings::Settings;
use crate::ui::{self, TerminalPrompter, WaitProgress};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "athene", version, about = "Submit files to Athene and check grading results")]
pub struct Cli {
    /// Log protocol details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submits files to an Athene assignment.
    Submit {
        /// Files to submit, in the order that they appear on the Athene page.
        files: Vec<PathBuf>,
    },
    /// Fetches the status of an Athene assignment.
    Status,
    /// Clears cached Athene information for the current directory.
    Clear,
}

pub fn run(command: &Command, settings: &Settings) -> Result<()> {
    let store = FileConfigStore::current_dir()?;
    match command {
        Command::Submit { files } => submit(files, &store, settings),
        Command::Status => status(&store, settings),
        Command::Clear => store.clear(),
    }
}

fn submit(files: &[PathBuf], store: &impl ConfigStore, settings: &Settings) -> Result<()> {
    let mut client = AtheneClient::new()?;
    let initial = establish(&mut client, store, &mut TerminalPrompter, settings)?;

    println!();

    if initial.athene_res == AtheneResponse::Pending {
        ui::print_still_grading();
        return Ok(());
    }

    let mut poller = SubmissionPoller::new(&client, &initial.assignment_url, settings);
    poller.submit(initial.athene_res.upload_slots(), files)?;
    ui::print_submitted();

    match poller.wait(&mut WaitProgress::new())? {
        PollOutcome::Done { results, .. } => {
            println!();
            ui::print_submission_results(&results);
        }
        PollOutcome::Timeout { .. } => ui::print_session_timeout(),
    }
    Ok(())
}

fn status(store: &impl ConfigStore, settings: &Settings) -> Result<()> {
    let mut client = AtheneClient::new()?;
    let initial = establish(&mut client, store, &mut TerminalPrompter, settings)?;

    match &initial.athene_res {
        AtheneResponse::Pending => ui::print_still_grading(),
        AtheneResponse::Ready {
            results: Some(results),
            ..
        } => {
            println!();
            ui::print_submission_results(results);
        }
        _ => ui::print_no_submissions(),
    }
    Ok(())
}
