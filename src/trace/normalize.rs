//! Normalization of backend debug log lines into short trace entries

use once_cell::sync::Lazy;
use regex::Regex;

/// Messages longer than this are truncated
pub const MAX_TRACE_LEN: usize = 100;

/// Marker appended to truncated messages
pub const ELLIPSIS: &str = "...";

/// `[SEVERITY] rest-of-message`
static SEVERITY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(?:DEBUG|INFO|WARNING|ERROR)\]\s*(.*)$").expect("valid severity regex"));

/// Known noise prefixes, each stripped at most once per extraction round
static NOISE_PREFIXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // [MainProcess(1):MainThread(2)]
        r"^\[[A-Za-z_][\w-]*\(\d+\):[A-Za-z_][\w-]*\(\d+\)\]\s*",
        // [pocket_logger], [hyperpocket.logger]
        r"^\[[\w.]*logger\]\s*",
        // [profile:default], [profile=team-a], [profile]
        r"^\[profile(?:\s*[:=][^\]]*)?\]\s*",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid noise prefix regex"))
    .collect()
});

/// Normalize one raw trace line.
///
/// Lines without a severity tag pass through untouched. Tagged lines lose the
/// tag and any known noise prefixes, then get truncated to [`MAX_TRACE_LEN`]
/// characters. Output never starts with a severity tag, so running the
/// function on its own output is a no-op.
pub fn normalize(line: &str) -> String {
    let Some(mut message) = extract_message(line) else {
        return line.to_string();
    };

    // A message can carry a second severity tag behind the noise prefixes
    while let Some(inner) = extract_message(&message) {
        message = inner;
    }

    truncate(&message)
}

/// Strip the severity tag and noise prefixes from one tagged line
fn extract_message(line: &str) -> Option<String> {
    let captures = SEVERITY_TAG.captures(line)?;
    let rest = captures.get(1).map_or("", |m| m.as_str());
    Some(strip_noise(rest).to_string())
}

/// Remove each noise prefix at most once, in whatever order they appear
fn strip_noise(message: &str) -> &str {
    let mut remaining = message;
    let mut used = vec![false; NOISE_PREFIXES.len()];

    loop {
        let hit = NOISE_PREFIXES
            .iter()
            .enumerate()
            .find(|(idx, re)| !used[*idx] && re.is_match(remaining));

        match hit {
            Some((idx, re)) => {
                used[idx] = true;
                remaining = re.find(remaining).map_or(remaining, |m| &remaining[m.end()..]);
            }
            None => return remaining,
        }
    }
}

fn truncate(message: &str) -> String {
    if message.chars().count() <= MAX_TRACE_LEN {
        return message.to_string();
    }

    let keep = MAX_TRACE_LEN - ELLIPSIS.len();
    let mut out: String = message.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}
