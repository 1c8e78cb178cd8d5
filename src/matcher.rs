//! Phrase matching over transcripts.
//!
//! Maps a phrase search to the set of time windows to cut. Each transcript
//! entry containing the phrase yields its own window; overlapping or
//! adjacent windows are deliberately not merged, so repeated mentions close
//! together produce separate clips.

use crate::transcript::TranscriptEntry;
use serde::{Deserialize, Serialize};

/// A time window within a source video selected for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipWindow {
    /// Start offset in seconds, never negative.
    pub start: f64,
    /// Window length in seconds.
    pub duration: f64,
}

/// Find every entry containing `phrase` (case-insensitive) and compute its
/// clip window, padded by `before` and `after` seconds.
///
/// Returns an empty vec when nothing matches.
pub fn match_phrase(
    transcript: &[TranscriptEntry],
    phrase: &str,
    before: f64,
    after: f64,
) -> Vec<ClipWindow> {
    let needle = phrase.to_lowercase();
    let mut windows = Vec::new();

    for entry in transcript {
        if !entry.text.to_lowercase().contains(&needle) {
            continue;
        }

        let end = entry.start + entry.duration;
        let start = (entry.start - before).max(0.0);
        let duration = (end - start) + after;

        windows.push(ClipWindow { start, duration });
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str, start: f64, duration: f64) -> TranscriptEntry {
        TranscriptEntry {
            text: text.to_string(),
            start,
            duration,
        }
    }

    #[test]
    fn test_matches_padded_windows() {
        let transcript = vec![
            entry("intro", 0.0, 2.0),
            entry("discussing amplification now", 5.0, 3.0),
            entry("more amplification talk", 20.0, 2.0),
        ];

        let windows = match_phrase(&transcript, "amplification", 2.0, 2.0);

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0], ClipWindow { start: 3.0, duration: 7.0 });
        assert_eq!(windows[1], ClipWindow { start: 18.0, duration: 6.0 });
    }

    #[test]
    fn test_case_insensitive() {
        let transcript = vec![entry("The AMPLIFICATION question", 10.0, 4.0)];

        let windows = match_phrase(&transcript, "Amplification", 0.0, 0.0);

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, 10.0);
        assert_eq!(windows[0].duration, 4.0);
    }

    #[test]
    fn test_no_match_returns_empty() {
        let transcript = vec![entry("nothing relevant here", 0.0, 5.0)];
        assert!(match_phrase(&transcript, "amplification", 2.0, 2.0).is_empty());
    }

    #[test]
    fn test_start_clamped_to_zero() {
        let transcript = vec![entry("amplification early", 1.0, 2.0)];

        let windows = match_phrase(&transcript, "amplification", 5.0, 1.0);

        assert_eq!(windows[0].start, 0.0);
        // end = 3.0, clamped start = 0.0, plus 1.0 after
        assert_eq!(windows[0].duration, 4.0);
    }

    #[test]
    fn test_overlapping_windows_not_merged() {
        let transcript = vec![
            entry("amplification once", 10.0, 2.0),
            entry("amplification twice", 12.0, 2.0),
        ];

        let windows = match_phrase(&transcript, "amplification", 3.0, 3.0);

        // Windows overlap in time but remain separate matches
        assert_eq!(windows.len(), 2);
        assert!(windows[0].start + windows[0].duration > windows[1].start);
    }
}
