//! Assembly of per-segment fragments into one ordered transcript.
//!
//! Pure: no I/O, no failure modes. Fragment order on input is whatever the
//! dispatcher collected; output order is always segment-index order.

use crate::pipeline::types::TranscriptFragment;

/// Format whole seconds as HH:MM:SS, truncating any fractional part.
pub fn format_hms(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Concatenate fragments in segment-index order into the final transcript.
///
/// Each entry renders as `[HH:MM:SS] text`; lines are newline-separated and
/// trailing whitespace is trimmed. Empty input yields an empty string.
pub fn assemble(fragments: &[TranscriptFragment]) -> String {
    let mut ordered: Vec<&TranscriptFragment> = fragments.iter().collect();
    ordered.sort_by_key(|fragment| fragment.segment_index);

    let mut lines = Vec::new();
    for fragment in ordered {
        for entry in &fragment.entries {
            lines.push(format!(
                "[{}] {}",
                format_hms(entry.absolute_secs),
                entry.text
            ));
        }
    }

    lines.join("\n").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::FragmentEntry;

    fn fragment(index: usize, entries: &[(f64, &str)]) -> TranscriptFragment {
        TranscriptFragment {
            segment_index: index,
            entries: entries
                .iter()
                .map(|(secs, text)| FragmentEntry {
                    absolute_secs: *secs,
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_orders_by_segment_index_not_insertion_order() {
        let fragments = vec![
            fragment(2, &[(600.0, "b")]),
            fragment(0, &[(0.0, "a")]),
            fragment(1, &[(300.0, "c")]),
        ];

        let transcript = assemble(&fragments);
        let texts: Vec<&str> = transcript
            .lines()
            .map(|line| line.split_once("] ").unwrap().1)
            .collect();
        assert_eq!(texts, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_renders_timestamp_lines() {
        let fragments = vec![fragment(0, &[(1.0, "hello"), (63.0, "world")])];
        assert_eq!(
            assemble(&fragments),
            "[00:00:01] hello\n[00:01:03] world"
        );
    }

    #[test]
    fn test_empty_input_is_empty_string() {
        assert_eq!(assemble(&[]), "");
    }

    #[test]
    fn test_fragment_without_entries_adds_nothing() {
        let fragments = vec![fragment(0, &[]), fragment(1, &[(300.0, "only")])];
        assert_eq!(assemble(&fragments), "[00:05:00] only");
    }

    #[test]
    fn test_format_hms_truncates_fractions() {
        assert_eq!(format_hms(0.0), "00:00:00");
        assert_eq!(format_hms(59.999), "00:00:59");
        assert_eq!(format_hms(61.5), "00:01:01");
        assert_eq!(format_hms(3661.0), "01:01:01");
        assert_eq!(format_hms(7322.9), "02:02:02");
    }

    #[test]
    fn test_format_hms_negative_clamps_to_zero() {
        assert_eq!(format_hms(-5.0), "00:00:00");
    }

    #[test]
    fn test_trailing_whitespace_is_trimmed() {
        let fragments = vec![fragment(0, &[(0.0, "line")])];
        let transcript = assemble(&fragments);
        assert_eq!(transcript, transcript.trim_end());
    }
}
