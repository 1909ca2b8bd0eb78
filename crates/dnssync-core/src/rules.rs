//! Regex rules applied to record content
//!
//! A [`RecordSelector`] decides whether a record qualifies for a role
//! (type, name and optional match rule), what value is read out of it
//! (optional extract rule) and how new content is spliced into it
//! (optional replace rule).

use regex::NoExpand;

use crate::config::{RecordSelector, RegexRule};
use crate::traits::Record;

impl RegexRule {
    /// Text of the configured group in the first match
    ///
    /// `None` when the pattern does not match, the group does not take part
    /// in the match, or the captured text is empty.
    pub fn capture<'c>(&self, content: &'c str) -> Option<&'c str> {
        let captures = self.regex().captures(content)?;
        captures
            .get(self.group())
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Replace every match in `content` with `replacement`, taken literally
    pub fn replace_all(&self, content: &str, replacement: &str) -> String {
        self.regex()
            .replace_all(content, NoExpand(replacement))
            .into_owned()
    }
}

impl RecordSelector {
    /// Whether `record` qualifies for this selector
    pub fn selects(&self, record: &Record) -> bool {
        record.record_type == self.record_type
            && record.name == self.name
            && self
                .match_rule
                .as_ref()
                .is_none_or(|rule| rule.capture(&record.content).is_some())
    }

    /// Value read out of a qualifying record's content
    ///
    /// Raw content without an extract rule; empty when the extract rule
    /// finds nothing.
    pub fn extract_value(&self, content: &str) -> String {
        match &self.extract_rule {
            Some(rule) => rule.capture(content).unwrap_or_default().to_string(),
            None => content.to_string(),
        }
    }

    /// New content for this record once `value` has to be written into it
    ///
    /// With a replace rule every match in `old_content` is replaced by
    /// `value`; without one the whole content becomes `value`.
    pub fn rewrite_content(&self, old_content: &str, value: &str) -> String {
        match &self.replace_rule {
            Some(rule) => rule.replace_all(old_content, value),
            None => value.to_string(),
        }
    }
}
