// Library root
// -----------
// Client for the Athene grading site, which has no public API: pages are
// scraped and forms are posted the way a browser would.
//
// Module responsibilities:
// - `response`: interprets problem page markup into `AtheneResponse`.
// - `session`: resolves the assignment/token context and recovers once from
//   an expired session.
// - `poller`: uploads files and waits for grading to finish.
// - `api`: blocking HTTP transport (GET page, multipart POST).
// - `config`: per-directory cache of the assignment id and token.
// - `settings`, `error`: runtime settings and the error taxonomy.
// - `cli`, `ui`: command definitions and terminal interaction.
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod poller;
pub mod response;
pub mod session;
pub mod settings;
pub mod ui;

pub use error::{AtheneError, Result};
pub use response::{interpret, AtheneResponse, CodeBlock, SubmitResults, UploadSlot};
pub use settings::Settings;
