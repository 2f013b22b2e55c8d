//! Variable extraction from free-text prompts.
//!
//! Each variable key owns an ordered list of case-insensitive patterns. The
//! first pattern that matches supplies the value (capture group 1); later
//! patterns for that key are not consulted. Keys are evaluated independently,
//! so one stretch of text may feed several keys. Keys without a match are
//! left out of the result.
//!
//! | Key | Example trigger |
//! |-----|-----------------|
//! | `asset_id` | `asset/123456`, `asset:123456`, `asset id 42`, `on 1234567` |
//! | `new_url` | `to "newsite.com"`, `to <newsite.com>`, `to newsite.com` |
//! | `link_text` | `link in "Get in touch"`, `"Contact" link` |
//! | `old_url` | `replace all "oldsite.com" links` |
//! | `old_domain` | `domain "/en/"` |
//! | `new_domain` | `domain "/en/" links to "/uk/"` |
//! | `operation` | `replace all`, `change link in`, `domain` |

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Extracted variables, keyed by the names in [`keys`]
pub type Variables = BTreeMap<String, String>;

/// Variable names produced by [`extract`]
pub mod keys {
    /// Numeric asset identifier
    pub const ASSET_ID: &str = "asset_id";
    /// Replacement URL
    pub const NEW_URL: &str = "new_url";
    /// URL being replaced
    pub const OLD_URL: &str = "old_url";
    /// Visible text of the link to change
    pub const LINK_TEXT: &str = "link_text";
    /// Domain or path segment being replaced
    pub const OLD_DOMAIN: &str = "old_domain";
    /// Replacement domain or path segment
    pub const NEW_DOMAIN: &str = "new_domain";
    /// Kind of edit, see [`super::Operation`]
    pub const OPERATION: &str = "operation";
}

/// Link edit requested by the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Replace every link pointing at one URL
    ReplaceAll,
    /// Change one link identified by its text
    ChangeSpecific,
    /// Swap a domain or locale segment across links
    ReplaceDomain,
}

impl Operation {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReplaceAll => "replace_all",
            Self::ChangeSpecific => "change_specific",
            Self::ReplaceDomain => "replace_domain",
        }
    }

    /// Classify a prompt by literal phrases.
    ///
    /// "replace all" wins unless the prompt also talks about a domain, in
    /// which case it is a domain replacement.
    pub fn classify(prompt: &str) -> Option<Self> {
        let lower = prompt.to_lowercase();
        let mentions_domain = lower.contains("domain");

        if lower.contains("replace all") {
            Some(if mentions_domain {
                Self::ReplaceDomain
            } else {
                Self::ReplaceAll
            })
        } else if lower.contains("change link in") {
            Some(Self::ChangeSpecific)
        } else if mentions_domain {
            Some(Self::ReplaceDomain)
        } else {
            None
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Rule {
    key: &'static str,
    patterns: Vec<Regex>,
    strip_protocol: bool,
}

impl Rule {
    fn new(key: &'static str, patterns: &[&str]) -> Self {
        Self {
            key,
            patterns: patterns
                .iter()
                .map(|p| Regex::new(p).expect("extraction patterns are compile-time constants"))
                .collect(),
            strip_protocol: false,
        }
    }

    fn stripping_protocol(mut self) -> Self {
        self.strip_protocol = true;
        self
    }

    fn apply(&self, prompt: &str) -> Option<String> {
        let value = self
            .patterns
            .iter()
            .find_map(|re| re.captures(prompt))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())?;

        let value = if self.strip_protocol {
            strip_protocol(value)
        } else {
            value
        };
        (!value.is_empty()).then(|| value.to_string())
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(
            keys::ASSET_ID,
            &[
                r"(?i)\basset[\s_-]*id\s*[:=#]?\s*(\d+)",
                r"(?i)\basset(?:\s*[/:=]\s*|\s+)(\d+)",
                r"(?i)\bon\s+(\d{6,8})\b",
            ],
        ),
        // Values must look like a host or URL (contain a dot or a scheme).
        // A bare value never ends in sentence punctuation.
        Rule::new(
            keys::NEW_URL,
            &[
                r#"(?i)\bto\s+"(https?://[^"]+|[^"]*\.[^"]*)""#,
                r"(?i)\bto\s+<([^>]*\.[^>]*)>",
                r#"(?i)\bto\s+((?:https?://)?[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(?:\.[a-z0-9-]+)+(?:/(?:[^\s"'<>]*[^\s"'<>.,;:!?)])?)?)"#,
            ],
        )
        .stripping_protocol(),
        Rule::new(
            keys::LINK_TEXT,
            &[
                r#"(?i)\blink\s+in\s+"([^"]+)""#,
                r#"(?i)"([^"]+)"\s+(?:to|link)\b"#,
            ],
        ),
        Rule::new(
            keys::OLD_URL,
            &[r#"(?i)\breplace\s+all\s+"([^"]+)"\s+links?\b"#],
        ),
        Rule::new(keys::OLD_DOMAIN, &[r#"(?i)\bdomain\s+"([^"]+)""#]),
        Rule::new(
            keys::NEW_DOMAIN,
            &[
                r#"(?i)\bto\s+"([^"]+)"[^"]*?\bdomain\b"#,
                r#"(?i)\bdomain\s+"[^"]+"\s+links?\s+to\s+"([^"]+)""#,
            ],
        ),
    ]
});

fn strip_protocol(value: &str) -> &str {
    ["https://", "http://"]
        .iter()
        .find_map(|scheme| {
            value
                .get(..scheme.len())
                .filter(|head| head.eq_ignore_ascii_case(scheme))
                .map(|_| &value[scheme.len()..])
        })
        .unwrap_or(value)
}

/// Extract every recognizable variable from `prompt`.
pub fn extract(prompt: &str) -> Variables {
    let mut variables: Variables = RULES
        .iter()
        .filter_map(|rule| rule.apply(prompt).map(|v| (rule.key.to_string(), v)))
        .collect();

    if let Some(op) = Operation::classify(prompt) {
        variables.insert(keys::OPERATION.to_string(), op.as_str().to_string());
    }

    variables
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(vars: &'a Variables, key: &str) -> Option<&'a str> {
        vars.get(key).map(String::as_str)
    }

    #[test]
    fn test_asset_id_separator_forms() {
        for prompt in [
            "fix asset/123456 now",
            "fix asset:123456 now",
            "fix asset=123456 now",
            "fix asset 123456 now",
            "fix Asset ID: 123456 now",
        ] {
            assert_eq!(get(&extract(prompt), keys::ASSET_ID), Some("123456"), "{prompt}");
        }
    }

    #[test]
    fn test_asset_id_after_on() {
        let vars = extract("run link check on 1234567");
        assert_eq!(get(&vars, keys::ASSET_ID), Some("1234567"));

        // Too short to be an asset number
        assert!(extract("run it on 12345").get(keys::ASSET_ID).is_none());
    }

    #[test]
    fn test_new_url_forms() {
        assert_eq!(
            get(&extract(r#"point it to "newsite.com""#), keys::NEW_URL),
            Some("newsite.com")
        );
        assert_eq!(
            get(&extract("point it to <newsite.com>"), keys::NEW_URL),
            Some("newsite.com")
        );
        assert_eq!(
            get(&extract("point it to https://www.newsite.com/uk"), keys::NEW_URL),
            Some("www.newsite.com/uk")
        );
        assert_eq!(
            get(&extract(r#"links to "HTTP://newsite.com""#), keys::NEW_URL),
            Some("newsite.com")
        );
    }

    #[test]
    fn test_bare_new_url_drops_trailing_punctuation() {
        assert_eq!(
            get(&extract("Point the link to www.autodesk.com/uk/support."), keys::NEW_URL),
            Some("www.autodesk.com/uk/support")
        );
        assert_eq!(
            get(&extract("send them to example.com."), keys::NEW_URL),
            Some("example.com")
        );
        assert_eq!(
            get(&extract("move it to https://a.com/b/, then stop"), keys::NEW_URL),
            Some("a.com/b/")
        );
    }

    #[test]
    fn test_quoted_new_url_with_scheme_needs_no_dot() {
        assert_eq!(
            get(&extract(r#"change it to "http://intranet/page""#), keys::NEW_URL),
            Some("intranet/page")
        );
    }

    #[test]
    fn test_new_url_requires_host_like_value() {
        assert!(extract(r#"change it to "/uk/""#).get(keys::NEW_URL).is_none());
        assert!(extract("go to replace things").get(keys::NEW_URL).is_none());
    }

    #[test]
    fn test_link_text_preserves_case() {
        let vars = extract(r#"change link in "Contact Sales" to "x.com""#);
        assert_eq!(get(&vars, keys::LINK_TEXT), Some("Contact Sales"));
    }

    #[test]
    fn test_link_text_before_link_word() {
        let vars = extract(r#"update the "Support" link please"#);
        assert_eq!(get(&vars, keys::LINK_TEXT), Some("Support"));

        // "links" is not "link"
        assert!(extract(r#"update "Support" links"#).get(keys::LINK_TEXT).is_none());
    }

    #[test]
    fn test_new_domain_before_domain_word() {
        let vars = extract(r#"switch to "/uk/" for the domain"#);
        assert_eq!(get(&vars, keys::NEW_DOMAIN), Some("/uk/"));
        assert_eq!(get(&vars, keys::OPERATION), Some("replace_domain"));
    }

    #[test]
    fn test_operation_classification() {
        assert_eq!(Operation::classify("Replace All old links"), Some(Operation::ReplaceAll));
        assert_eq!(
            Operation::classify("please change link in footer"),
            Some(Operation::ChangeSpecific)
        );
        assert_eq!(
            Operation::classify("replace all domain links"),
            Some(Operation::ReplaceDomain)
        );
        assert_eq!(Operation::classify("fix the domain"), Some(Operation::ReplaceDomain));
        assert_eq!(Operation::classify("validate email links"), None);
    }

    #[test]
    fn test_missing_keys_are_omitted() {
        let vars = extract("Validate email links in Draftr content");
        assert!(vars.is_empty());
    }

    #[test]
    fn test_overlapping_rules_not_resolved() {
        // Both the URL and domain rules fire on the same prompt
        let vars = extract(r#"replace all "old.com" links to "new.com" and domain "/en/""#);
        assert_eq!(get(&vars, keys::OLD_URL), Some("old.com"));
        assert_eq!(get(&vars, keys::OLD_DOMAIN), Some("/en/"));
        assert_eq!(get(&vars, keys::NEW_URL), Some("new.com"));
        assert_eq!(get(&vars, keys::NEW_DOMAIN), Some("new.com"));
    }

    #[test]
    fn test_strip_protocol() {
        assert_eq!(strip_protocol("https://a.com"), "a.com");
        assert_eq!(strip_protocol("Http://a.com"), "a.com");
        assert_eq!(strip_protocol("a.com"), "a.com");
        assert_eq!(strip_protocol("é"), "é");
    }
}
