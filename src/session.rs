// Session coordinator: resolves the assignment context (cache or prompts),
// authenticates against the problem page, recovers once from an expired
// token and refreshes the cache.

use crate::api::Transport;
use crate::config::{ConfigStore, LocalConfig};
use crate::error::{AtheneError, Result};
use crate::response::{interpret, AtheneResponse};
use crate::settings::Settings;
use tracing::{debug, info, warn};

/// Source of credentials when nothing usable is cached. Both calls block
/// until the user answers and return `AtheneError::AuthAbandoned` on empty
/// input.
pub trait Prompter {
    fn assignment_id(&mut self) -> Result<String>;

    /// `expired` is set when a cached token was just rejected.
    fn auth_token(&mut self, expired: bool) -> Result<String>;
}

/// Parsed page plus the context it was fetched with.
#[derive(Clone, Debug)]
pub struct InitialResponse {
    pub athene_res: AtheneResponse,
    pub assignment_id: String,
    pub assignment_url: String,
}

/// Authenticate and fetch the assignment page once.
///
/// A freshly entered token that comes back timed out is reported as
/// `InvalidSessionOrAssignment`; a cached one gets exactly one new prompt
/// before `RepeatedSessionTimeout`. The cache is rewritten after every
/// successful authentication.
pub fn establish<T, S, P>(
    transport: &mut T,
    store: &S,
    prompter: &mut P,
    settings: &Settings,
) -> Result<InitialResponse>
where
    T: Transport + ?Sized,
    S: ConfigStore + ?Sized,
    P: Prompter + ?Sized,
{
    let cached = store.load()?;
    let from_cache = cached.is_some();

    let (assignment_id, mut auth_token) = match cached {
        Some(config) => (config.assignment_id, config.auth_token),
        None => {
            let id = prompter.assignment_id()?;
            let token = prompter.auth_token(false)?;
            (id, token)
        }
    };

    let assignment_url = settings.assignment_url(&assignment_id);
    info!(%assignment_id, from_cache, "establishing session");

    let mut athene_res = authenticate(transport, &assignment_url, &auth_token)?;

    if athene_res == AtheneResponse::SessionTimedOut {
        if !from_cache {
            return Err(AtheneError::InvalidSessionOrAssignment);
        }

        warn!(%assignment_id, "cached session timed out, asking for a new token");
        auth_token = prompter.auth_token(true)?;
        athene_res = authenticate(transport, &assignment_url, &auth_token)?;

        if athene_res == AtheneResponse::SessionTimedOut {
            return Err(AtheneError::RepeatedSessionTimeout);
        }
    }

    store.save(&LocalConfig {
        assignment_id: assignment_id.clone(),
        auth_token,
    })?;

    Ok(InitialResponse {
        athene_res,
        assignment_id,
        assignment_url,
    })
}

/// Re-fetch and interpret the page with whatever token the transport holds.
pub fn refresh<T>(transport: &T, assignment_url: &str) -> Result<AtheneResponse>
where
    T: Transport + ?Sized,
{
    let markup = transport.fetch(assignment_url)?;
    let athene_res = interpret(&markup);
    debug!(state = state_name(&athene_res), "interpreted problem page");
    Ok(athene_res)
}

fn authenticate<T>(transport: &mut T, assignment_url: &str, token: &str) -> Result<AtheneResponse>
where
    T: Transport + ?Sized,
{
    transport.set_token(token)?;
    refresh(&*transport, assignment_url)
}

fn state_name(res: &AtheneResponse) -> &'static str {
    match res {
        AtheneResponse::SessionTimedOut => "session-timed-out",
        AtheneResponse::Pending => "pending",
        AtheneResponse::Ready { .. } => "ready",
    }
}

/// Pull the assignment id out of a pasted problem URL such as
/// `https://athenecurricula.org/problem/abc123/`. Anything else is taken as
/// the id itself.
pub fn parse_assignment_id(input: &str) -> String {
    let input = input.trim();
    input
        .split("/problem/")
        .nth(1)
        .map(|rest| rest.trim_end_matches('/'))
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_alphanumeric() || c == '_'))
        .unwrap_or(input)
        .to_string()
}
