// Response interpreter: turns the server-rendered problem page into a typed
// `AtheneResponse`. The service has no API, so everything here is a fixed
// set of literal markers and row/block patterns matched against its markup.
// All patterns live in this module.

use once_cell::sync::Lazy;
use regex::Regex;

const SESSION_TIMEOUT_MARKER: &str = "Your session has timed out. Please refresh the page.";
const PENDING_MARKER: &str = "... pending ...";
const RESULTS_MARKER: &str = "Most recent submission results";

static SCORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Score: (\d+)/(\d+) points").unwrap());
static TEST_CASES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"You passed (\d+) of (\d+) test cases").unwrap());
static CODE_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<b>([^<]+)</b>\s*<pre class=(\w+)>\s*<span>([^<]*)</span>\s*</pre>").unwrap()
});
static UPLOAD_SLOT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"<tr><th align=right>([^<]*)</th><td><input size=\d+ type=file name=(file\d+)></td></tr>",
    )
    .unwrap()
});

/// One file input the problem page currently offers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadSlot {
    /// Form field name, e.g. `file1`.
    pub id: String,
    /// Label shown next to the input, without the trailing colon.
    pub name: String,
}

/// What a block of grading feedback holds, derived from its title and class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeBlockKind {
    CompileErrors,
    RuntimeError,
    FailedTestCase,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeBlock {
    pub title: String,
    /// CSS class of the `<pre>` element (`cmd`, `file`, ...).
    pub style: String,
    pub content: String,
}

impl CodeBlock {
    pub fn kind(&self) -> CodeBlockKind {
        match self.style.as_str() {
            "cmd" if self.title == "errors:" => CodeBlockKind::CompileErrors,
            "file" if self.title.contains("test code") && self.title.contains("following error") => {
                CodeBlockKind::RuntimeError
            }
            "file" if self.title.contains(':') => CodeBlockKind::FailedTestCase,
            _ => CodeBlockKind::Other,
        }
    }
}

/// Graded results of the most recent submission.
///
/// `points` and `total_points` are set together or not at all. The test case
/// counts default to 0 when the page doesn't mention them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitResults {
    pub test_cases_passed: u32,
    pub total_test_cases: u32,
    pub code_blocks: Vec<CodeBlock>,
    pub points: Option<u32>,
    pub total_points: Option<u32>,
}

impl SubmitResults {
    pub fn all_passed(&self) -> bool {
        self.test_cases_passed >= self.total_test_cases
    }

    pub fn score(&self) -> Option<(u32, u32)> {
        self.points.zip(self.total_points)
    }
}

/// State of an assignment page as seen by the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AtheneResponse {
    SessionTimedOut,
    Pending,
    /// Past results and a fresh upload form may both be present.
    Ready {
        results: Option<SubmitResults>,
        upload_slots: Vec<UploadSlot>,
    },
}

impl AtheneResponse {
    pub fn upload_slots(&self) -> &[UploadSlot] {
        match self {
            AtheneResponse::Ready { upload_slots, .. } => upload_slots,
            _ => &[],
        }
    }

    pub fn results(&self) -> Option<&SubmitResults> {
        match self {
            AtheneResponse::Ready { results, .. } => results.as_ref(),
            _ => None,
        }
    }
}

/// Interpret a problem page. Never fails: fragments that are missing or don't
/// match degrade to defaults.
pub fn interpret(markup: &str) -> AtheneResponse {
    if markup.contains(SESSION_TIMEOUT_MARKER) {
        return AtheneResponse::SessionTimedOut;
    }

    if markup.contains(PENDING_MARKER) {
        return AtheneResponse::Pending;
    }

    // Only look at the page from the results heading onwards so boilerplate
    // earlier in the page can't produce a false match.
    let results = markup
        .find(RESULTS_MARKER)
        .map(|start| parse_results(&markup[start..]));

    AtheneResponse::Ready {
        results,
        upload_slots: parse_upload_slots(markup),
    }
}

fn parse_results(section: &str) -> SubmitResults {
    let (points, total_points) = match capture_pair(&SCORE_RE, section) {
        Some((points, total)) => (Some(points), Some(total)),
        None => (None, None),
    };
    let (test_cases_passed, total_test_cases) =
        capture_pair(&TEST_CASES_RE, section).unwrap_or((0, 0));

    let code_blocks = CODE_BLOCK_RE
        .captures_iter(section)
        .map(|caps| CodeBlock {
            title: decode_entities(&caps[1]),
            style: caps[2].to_string(),
            content: decode_entities(&caps[3]),
        })
        .collect();

    SubmitResults {
        test_cases_passed,
        total_test_cases,
        code_blocks,
        points,
        total_points,
    }
}

fn parse_upload_slots(markup: &str) -> Vec<UploadSlot> {
    UPLOAD_SLOT_RE
        .captures_iter(markup)
        .map(|caps| UploadSlot {
            id: caps[2].to_string(),
            name: decode_entities(&caps[1])
                .trim_end_matches(|c: char| c == ':' || c.is_whitespace())
                .trim_start()
                .to_string(),
        })
        .collect()
}

/// Both numbers of a two-group pattern, or `None` if either is missing or
/// doesn't fit a `u32`.
fn capture_pair(re: &Regex, text: &str) -> Option<(u32, u32)> {
    let caps = re.captures(text)?;
    let first = caps[1].parse().ok()?;
    let second = caps[2].parse().ok()?;
    Some((first, second))
}

/// Decode HTML character references, leaving every other character as is.
fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
