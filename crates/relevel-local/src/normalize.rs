//! Deterministic payload normalization.
//!
//! Rules, applied in order: collapse horizontal whitespace runs to one space,
//! collapse blank-line runs to a single line break, trim, truncate to
//! [`MAX_PAYLOAD_CHARS`] on a char boundary. Truncation bounds the remote
//! call's cost and latency; it is reported as a flag, never as an error.

/// Hard cap on the rewrite payload, in chars.
pub const MAX_PAYLOAD_CHARS: usize = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub text: String,
    pub truncated: bool,
}

pub fn normalize(raw: &str) -> Payload {
    let mut lines: Vec<String> = Vec::new();
    for line in raw.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if !collapsed.is_empty() {
            lines.push(collapsed);
        }
    }
    let joined = lines.join("\n");
    let (text, truncated) = truncate_to_chars(joined.trim(), MAX_PAYLOAD_CHARS);
    Payload { text, truncated }
}

fn truncate_to_chars(s: &str, max_chars: usize) -> (String, bool) {
    let mut out = String::new();
    let mut n = 0usize;
    for ch in s.chars() {
        if n >= max_chars {
            return (out, true);
        }
        out.push(ch);
        n += 1;
    }
    (out, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_runs_and_blank_lines() {
        let p = normalize("  First   line \t here \n\n\n Second\tline \n");
        assert_eq!(p.text, "First line here\nSecond line");
        assert!(!p.truncated);
    }

    #[test]
    fn whitespace_only_input_normalizes_to_empty() {
        let p = normalize(" \n \t \n\n ");
        assert_eq!(p.text, "");
        assert!(!p.truncated);
    }

    #[test]
    fn truncates_exactly_at_the_char_cap() {
        let long = "x".repeat(MAX_PAYLOAD_CHARS + 500);
        let p = normalize(&long);
        assert_eq!(p.text.chars().count(), MAX_PAYLOAD_CHARS);
        assert!(p.truncated);

        let exact = "y".repeat(MAX_PAYLOAD_CHARS);
        let p = normalize(&exact);
        assert_eq!(p.text.chars().count(), MAX_PAYLOAD_CHARS);
        assert!(!p.truncated, "input at the cap is not truncated");
    }

    #[test]
    fn truncation_respects_multibyte_boundaries() {
        let long = "é".repeat(MAX_PAYLOAD_CHARS + 10);
        let p = normalize(&long);
        assert_eq!(p.text.chars().count(), MAX_PAYLOAD_CHARS);
        assert!(p.text.is_char_boundary(p.text.len()));
    }
}
