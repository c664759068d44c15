//! Publish trigger detection.
//!
//! Decides from the user's latest utterance whether the turn's result
//! should be pushed to the document workspace. The policy is a fixed,
//! case-insensitive substring match; there is no intent model.

/// Keywords naming the target workspace, in Korean and in Latin script.
pub const WORKSPACE_KEYWORDS: &[&str] = &["노션", "notion"];

/// Action verbs asking for the result to be stored or sent.
///
/// Korean forms come first, then their English counterparts
/// (save, update, send, upload, add).
pub const ACTION_KEYWORDS: &[&str] = &[
    "저장", "업데이트", "전송", "보내", "업로드", "추가", "save", "update", "send", "upload", "add",
];

/// Returns `true` if the utterance asks for the result to be published.
///
/// Matches when any keyword from either [`WORKSPACE_KEYWORDS`] or
/// [`ACTION_KEYWORDS`] appears anywhere in the text, ignoring case. A
/// workspace mention without an action verb also triggers.
#[must_use]
pub fn should_publish(utterance: &str) -> bool {
    let lowered = utterance.to_lowercase();
    WORKSPACE_KEYWORDS
        .iter()
        .chain(ACTION_KEYWORDS)
        .any(|keyword| lowered.contains(keyword))
}

/// Returns every keyword present in the utterance, for diagnostics.
#[must_use]
pub fn matched_keywords(utterance: &str) -> Vec<&'static str> {
    let lowered = utterance.to_lowercase();
    WORKSPACE_KEYWORDS
        .iter()
        .chain(ACTION_KEYWORDS)
        .copied()
        .filter(|keyword| lowered.contains(keyword))
        .collect()
}
