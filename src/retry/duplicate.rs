//! Detect retried create calls that had already succeeded server-side.
//!
//! The Sheets API has no idempotency keys. When an add/duplicate-sheet call
//! commits remotely but the response is lost (5xx, reset), the next attempt
//! fails with a 400 "already exists". Only that ordering counts: if the very
//! first attempt already reports a duplicate, the resource genuinely existed.

use super::ErrorKind;

const ALREADY_EXISTS: &str = "already exists";
const DUPLICATE: &str = "duplicate";

/// Outcome of a failed create-style call, judged from its attempt history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateVerdict {
    /// An earlier attempt created the resource; re-fetch and use it.
    DisguisedSuccess,
    /// The resource existed before the call was made.
    AlreadyExists,
    /// A plain failure.
    Failed,
}

pub fn is_duplicate_error(kind: &ErrorKind) -> bool {
    match kind {
        ErrorKind::Permanent { code: 400, message } => {
            let message = message.to_ascii_lowercase();
            message.contains(ALREADY_EXISTS) || mentions_word(&message, DUPLICATE)
        }
        _ => false,
    }
}

// Request paths such as `duplicateSheet` appear in unrelated 400s, so the
// match must not run into an identifier.
fn mentions_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + word.len()..].chars().next();
        !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
    })
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Judge the ordered per-attempt errors of a create-style call.
pub fn create_verdict(history: &[ErrorKind]) -> CreateVerdict {
    let Some((first, rest)) = history.split_first() else {
        return CreateVerdict::Failed;
    };

    if is_duplicate_error(first) {
        CreateVerdict::AlreadyExists
    } else if rest.iter().any(is_duplicate_error) {
        CreateVerdict::DisguisedSuccess
    } else {
        CreateVerdict::Failed
    }
}

pub fn is_disguised_success(history: &[ErrorKind]) -> bool {
    create_verdict(history) == CreateVerdict::DisguisedSuccess
}
