//! Content-Security-Policy configuration
//!
//! Picks the two CSP headers out of the handler's init parameters.

pub const CSP_HEADER: &str = "Content-Security-Policy";
pub const CSP_REPORT_ONLY_HEADER: &str = "Content-Security-Policy-Report-Only";

/// Optional CSP header values, trimmed and never blank
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityPolicy {
    pub content_security_policy: Option<String>,
    pub content_security_policy_report_only: Option<String>,
}

impl SecurityPolicy {
    /// Scan init parameters, matching names case-insensitively.
    ///
    /// Later parameters win over earlier ones with the same name.
    pub fn from_params<'a, I>(params: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut policy = Self::default();
        for (name, value) in params {
            if name.eq_ignore_ascii_case(CSP_HEADER) {
                policy.content_security_policy = blank_to_none(value);
            } else if name.eq_ignore_ascii_case(CSP_REPORT_ONLY_HEADER) {
                policy.content_security_policy_report_only = blank_to_none(value);
            }
        }
        policy
    }

    /// Headers to emit, in a stable order
    pub fn headers(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (CSP_HEADER, self.content_security_policy.as_deref()),
            (
                CSP_REPORT_ONLY_HEADER,
                self.content_security_policy_report_only.as_deref(),
            ),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
    }
}

/// Whitespace that surrounds a parameter value.
///
/// No-break spaces are content, the ASCII separator controls are not.
fn is_blank_char(c: char) -> bool {
    match c {
        '\u{a0}' | '\u{2007}' | '\u{202f}' | '\u{85}' => false,
        '\u{1c}'..='\u{1f}' => true,
        _ => c.is_whitespace(),
    }
}

fn blank_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim_matches(is_blank_char);
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
