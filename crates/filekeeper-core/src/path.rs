//! Path token sanitizing, tokenizing and normalization.
//!
//! Raw path strings arriving from loosely formatted sources are split on both
//! `/` and `\`, and every resulting token has junk characters trimmed from its
//! edges. Empty tokens are dropped: they carry no path information.

use std::path::{Path, PathBuf};

/// Characters trimmed from both edges of a token.
///
/// `..` needs no entry of its own: every run of dots is trimmed through `.`.
pub const DISALLOWED: &[char] = &[
    ' ', '~', '*', ',', '#', '%', '&', '{', '}', '<', '>', '?', '=', '+', '@', ':', ';', '\'',
    '"', '!', '$', '/', '\\', '.', '`', '|',
];

/// Safety cap on sanitizer passes.
pub const MAX_STRIP_PASSES: usize = 10;

/// Result of a bounded sanitizer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripOutcome {
    /// The trimmed token.
    pub value: String,
    /// Number of passes that were run.
    pub passes: usize,
    /// Whether the last pass removed nothing (fixed point reached).
    pub converged: bool,
}

/// Trim disallowed characters from the edges of `token`.
///
/// Interior characters are left untouched. A token made only of disallowed
/// characters becomes empty.
///
/// ```
/// use filekeeper_core::strip;
///
/// assert_eq!(strip(".~logs$/@"), "logs");
/// assert_eq!(strip("my logs"), "my logs");
/// assert_eq!(strip("..."), "");
/// ```
pub fn strip(token: &str) -> String {
    let outcome = strip_with_limit(token, MAX_STRIP_PASSES);
    if !outcome.converged {
        tracing::warn!(
            token,
            passes = outcome.passes,
            "sanitizer hit pass cap before reaching a fixed point"
        );
    }
    outcome.value
}

/// Run the sanitizer for at most `max_passes` passes.
///
/// Each pass trims the leading and trailing run of [`DISALLOWED`] characters
/// as a whole, so any mix of junk is gone after one pass and the second pass
/// confirms the fixed point. Iteration stops as soon as a pass leaves the
/// token unchanged.
pub fn strip_with_limit(token: &str, max_passes: usize) -> StripOutcome {
    let mut current = token;
    let mut passes = 0;

    while passes < max_passes {
        passes += 1;
        let before = current;
        current = current.trim_matches(is_disallowed);
        if current == before {
            return StripOutcome {
                value: current.to_string(),
                passes,
                converged: true,
            };
        }
    }

    // A token that is already clean converges without running a pass.
    let converged = strip_pass_is_noop(current);
    StripOutcome {
        value: current.to_string(),
        passes,
        converged,
    }
}

fn strip_pass_is_noop(token: &str) -> bool {
    !token.starts_with(is_disallowed) && !token.ends_with(is_disallowed)
}

fn is_disallowed(c: char) -> bool {
    DISALLOWED.contains(&c)
}

/// Split a raw path on `/` and `\` into its non-empty segments.
///
/// Whitespace around separators is treated as part of the boundary. Segment
/// contents are not sanitized, so `.`, `..` and leading dots survive.
///
/// ```
/// use filekeeper_core::tokenize;
///
/// assert_eq!(tokenize("..dir\\.dir/file."), vec!["..dir", ".dir", "file."]);
/// ```
pub fn tokenize(path: &str) -> Vec<String> {
    path.split(['/', '\\'])
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tokenize `path` and sanitize every token, dropping tokens that end up empty.
///
/// ```
/// use filekeeper_core::normalize;
///
/// assert_eq!(normalize(".dir\\dir./file.."), vec!["dir", "dir", "file"]);
/// ```
pub fn normalize(path: &str) -> Vec<String> {
    tokenize(path)
        .iter()
        .map(|token| strip(token))
        .filter(|token| !token.is_empty())
        .collect()
}

/// Normalize `path` and re-join the tokens with `/`.
pub fn normalize_to_string(path: &str) -> String {
    normalize(path).join("/")
}

/// Append the normalized components of an untrusted `raw` path to `base`.
///
/// Because tokens never contain separators and `.`/`..` are stripped away,
/// the result can never escape `base`.
pub fn join_under(base: impl AsRef<Path>, raw: &str) -> PathBuf {
    let mut path = base.as_ref().to_path_buf();
    for token in normalize(raw) {
        path.push(token);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded_cases(core: &str) -> Vec<String> {
        let mut cases = Vec::new();
        for junk in DISALLOWED {
            cases.push(format!("{junk}{core}"));
            cases.push(format!("{core}{junk}"));
            cases.push(format!("{junk}{core}{junk}"));
            cases.push(format!("{junk}{core}."));
            cases.push(format!("{core}.{junk}"));
            cases.push(format!("{junk}.{core}"));
            cases.push(format!(".{core}{junk}"));
            cases.push(format!("{junk}.{core}.{junk}"));
            cases.push(format!(".{junk}.{core}.."));
            cases.push(format!("..{core}.{junk}."));
            cases.push(format!(".{junk}.{core}.{junk}."));
        }
        cases
    }

    #[test]
    fn test_strip_every_disallowed_padding() {
        for case in padded_cases("logs") {
            assert_eq!(strip(&case), "logs", "input: {case:?}");
        }
    }

    #[test]
    fn test_strip_mixed_edges() {
        assert_eq!(strip(".~logs$/@"), "logs");
        assert_eq!(strip("  |`logs`|  "), "logs");
    }

    #[test]
    fn test_strip_leaves_interior() {
        assert_eq!(strip("a.b c"), "a.b c");
        assert_eq!(strip("~a$b~"), "a$b");
    }

    #[test]
    fn test_strip_all_junk_is_empty() {
        assert_eq!(strip("~~..$$  //"), "");
        assert_eq!(strip(""), "");
    }

    #[test]
    fn test_strip_is_idempotent() {
        for case in padded_cases("some-dir_01") {
            let once = strip(&case);
            assert_eq!(strip(&once), once);
        }
    }

    #[test]
    fn test_strip_clean_token_converges_in_one_pass() {
        let outcome = strip_with_limit("logs", MAX_STRIP_PASSES);
        assert_eq!(outcome.value, "logs");
        assert_eq!(outcome.passes, 1);
        assert!(outcome.converged);
    }

    #[test]
    fn test_strip_long_alternating_padding() {
        let padded = format!("{}logs{}", ".~".repeat(15), "$@".repeat(12));
        let outcome = strip_with_limit(&padded, MAX_STRIP_PASSES);
        assert_eq!(outcome.value, "logs");
        assert_eq!(outcome.passes, 2);
        assert!(outcome.converged);
    }

    #[test]
    fn test_strip_single_pass_reaches_fixed_point() {
        let outcome = strip_with_limit(".~.~.~logs", 1);
        assert_eq!(outcome.value, "logs");
        assert_eq!(outcome.passes, 1);
        assert!(outcome.converged);
    }

    #[test]
    fn test_strip_zero_passes() {
        let outcome = strip_with_limit("~logs", 0);
        assert_eq!(outcome.value, "~logs");
        assert_eq!(outcome.passes, 0);
        assert!(!outcome.converged);

        assert!(strip_with_limit("logs", 0).converged);
    }

    #[test]
    fn test_tokenize_keeps_dots() {
        assert_eq!(tokenize("..dir\\.dir/file."), vec!["..dir", ".dir", "file."]);
    }

    #[test]
    fn test_tokenize_separator_order_independent() {
        let expected = vec!["a", "b", "c"];
        assert_eq!(tokenize("a/b\\c"), expected);
        assert_eq!(tokenize("a\\b/c"), expected);
    }

    #[test]
    fn test_tokenize_runs_and_whitespace() {
        assert_eq!(tokenize("  a //\\ b /  c  "), vec!["a", "b", "c"]);
        assert_eq!(tokenize("/leading/and/trailing/"), vec!["leading", "and", "trailing"]);
        assert_eq!(tokenize("  single  "), vec!["single"]);
        assert!(tokenize("").is_empty());
        assert!(tokenize(" / \\ ").is_empty());
    }

    #[test]
    fn test_normalize_strips_tokens() {
        assert_eq!(normalize(".dir\\dir./file.."), vec!["dir", "dir", "file"]);
    }

    #[test]
    fn test_normalize_drops_empty_tokens() {
        assert_eq!(normalize("a/../b/./~~/c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_normalize_idempotent_through_rejoin() {
        for raw in [
            ".dir\\dir./file..",
            "  ~home/ user@ /..//logs$ ",
            "C:\\Temp\\..\\out",
            "plain",
            format!("{}logs", ".~".repeat(15)).as_str(),
            format!("a/{}b{}/c", "~.".repeat(20), " $".repeat(20)).as_str(),
        ] {
            let once = normalize(raw);
            let twice = normalize(&once.join("/"));
            assert_eq!(once, twice, "input: {raw:?}");
        }
    }

    #[test]
    fn test_normalize_to_string() {
        assert_eq!(normalize_to_string("\\\\server\\share\\.x."), "server/share/x");
    }

    #[test]
    fn test_join_under_cannot_escape() {
        let joined = join_under("/data/out", "../../etc/passwd");
        assert_eq!(joined, PathBuf::from("/data/out/etc/passwd"));

        let joined = join_under("/data/out", "..\\..");
        assert_eq!(joined, PathBuf::from("/data/out"));
    }
}
