// Transport to the grading service: a small blocking HTTP client that fetches
// the problem page and posts submissions. The service keys sessions on the
// PHPSESSID cookie, which is the token the user copies from their browser.

use crate::error::{AtheneError, Result};
use crate::response::UploadSlot;
use reqwest::blocking::{multipart, Client};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

pub const SESSION_COOKIE: &str = "PHPSESSID";

/// What the session coordinator and the poller need from the network.
pub trait Transport {
    /// Use `token` as the session credential on every later request.
    fn set_token(&mut self, token: &str) -> Result<()>;

    /// GET a page and return its body. The server reports state in the
    /// markup, so the status code is not treated as a failure here.
    fn fetch(&self, url: &str) -> Result<String>;

    /// POST one multipart file part per slot, keyed by the slot id.
    fn submit(&self, url: &str, files: &[(UploadSlot, PathBuf)]) -> Result<()>;
}

/// Blocking client holding the session cookie for authenticated calls.
#[derive(Clone)]
pub struct AtheneClient {
    client: Client,
    session: Option<HeaderValue>,
}

impl AtheneClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("athene-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(AtheneClient {
            client,
            session: None,
        })
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &self.session {
            headers.insert(COOKIE, cookie.clone());
        }
        headers
    }
}

impl Transport for AtheneClient {
    fn set_token(&mut self, token: &str) -> Result<()> {
        let mut value = HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, token))
            .map_err(|_| AtheneError::InvalidToken)?;
        value.set_sensitive(true);
        self.session = Some(value);
        Ok(())
    }

    fn fetch(&self, url: &str) -> Result<String> {
        let res = self.client.get(url).headers(self.auth_headers()).send()?;
        let status = res.status();
        debug!(%url, %status, "fetched problem page");
        if !status.is_success() {
            warn!(%url, %status, "problem page returned a non-success status");
        }
        Ok(res.text()?)
    }

    fn submit(&self, url: &str, files: &[(UploadSlot, PathBuf)]) -> Result<()> {
        let mut form = multipart::Form::new();
        for (slot, path) in files {
            let contents = fs::read(path).map_err(|source| AtheneError::FileRead {
                path: path.clone(),
                source,
            })?;
            let file_name = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or(slot.id.as_str())
                .to_string();
            debug!(slot = %slot.id, %file_name, "attaching file");
            form = form.part(slot.id.clone(), multipart::Part::bytes(contents).file_name(file_name));
        }

        let res = self
            .client
            .post(url)
            .headers(self.auth_headers())
            .multipart(form)
            .send()?;
        let status = res.status();
        debug!(%url, %status, "submitted files");
        if status.as_u16() >= 400 {
            let body = res.text().unwrap_or_default();
            return Err(AtheneError::TransportFailure {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn slot(id: &str) -> UploadSlot {
        UploadSlot {
            id: id.into(),
            name: format!("{}.py", id),
        }
    }

    #[test]
    fn fetch_sends_session_cookie() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/problem/hw1/")
            .match_header("cookie", "PHPSESSID=tok123")
            .with_status(200)
            .with_body("<html>page</html>")
            .create();

        let mut client = AtheneClient::new().unwrap();
        client.set_token("tok123").unwrap();
        let body = client
            .fetch(&format!("{}/problem/hw1/", server.url()))
            .unwrap();

        assert_eq!(body, "<html>page</html>");
        mock.assert();
    }

    #[test]
    fn fetch_returns_body_on_error_status() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/problem/hw1/")
            .with_status(500)
            .with_body("oops")
            .create();

        let client = AtheneClient::new().unwrap();
        let body = client
            .fetch(&format!("{}/problem/hw1/", server.url()))
            .unwrap();

        assert_eq!(body, "oops");
        mock.assert();
    }

    #[test]
    fn rejects_tokens_that_cannot_be_headers() {
        let mut client = AtheneClient::new().unwrap();
        assert!(matches!(
            client.set_token("bad\ntoken"),
            Err(AtheneError::InvalidToken)
        ));
        assert!(client.session.is_none());
    }

    #[test]
    fn submit_posts_one_part_per_slot() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("main.py");
        let second = dir.path().join("util.py");
        fs::write(&first, "print('hi')").unwrap();
        fs::write(&second, "def f(): pass").unwrap();

        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/problem/hw1/")
            .match_header("cookie", "PHPSESSID=tok")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="file1"; filename="main.py""#.into()),
                Matcher::Regex(r#"name="file2"; filename="util.py""#.into()),
                Matcher::Regex("def f\\(\\): pass".into()),
            ]))
            .with_status(200)
            .create();

        let mut client = AtheneClient::new().unwrap();
        client.set_token("tok").unwrap();
        client
            .submit(
                &format!("{}/problem/hw1/", server.url()),
                &[(slot("file1"), first), (slot("file2"), second)],
            )
            .unwrap();

        mock.assert();
    }

    #[test]
    fn submit_error_status_is_a_transport_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.py");
        fs::write(&path, "x = 1").unwrap();

        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/problem/hw1/")
            .with_status(403)
            .with_body("forbidden")
            .create();

        let client = AtheneClient::new().unwrap();
        let err = client
            .submit(
                &format!("{}/problem/hw1/", server.url()),
                &[(slot("file1"), path)],
            )
            .unwrap_err();

        match err {
            AtheneError::TransportFailure { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "forbidden");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        mock.assert();
    }

    #[test]
    fn submit_missing_file_makes_no_request() {
        let mut server = mockito::Server::new();
        let mock = server.mock("POST", "/problem/hw1/").expect(0).create();

        let client = AtheneClient::new().unwrap();
        let err = client
            .submit(
                &format!("{}/problem/hw1/", server.url()),
                &[(slot("file1"), PathBuf::from("/definitely/not/here.py"))],
            )
            .unwrap_err();

        assert!(matches!(err, AtheneError::FileRead { .. }));
        mock.assert();
    }
}
