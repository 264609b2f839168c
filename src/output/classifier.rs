// src/output/classifier.rs

//! Severity classification of tool output lines.
//!
//! Lines are checked in this order:
//! 1. the custom error regex, if configured;
//! 2. the custom warning regex, if configured;
//! 3. the canonical `origin(location): [subcategory] error|warning [CODE]: text`
//!    format understood by build tools, unless disabled.
//!
//! Anything else is a plain message.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::output::sink::OutputDiagnostic;

static CANONICAL_WITH_ORIGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<origin>[^\s(][^(]*?)\s*(?:\((?P<location>[\d,\-\s]+)\))?\s*:\s*(?:[^:]*?\s)?(?i:(?P<category>error|warning))(?:\s+(?P<code>[A-Za-z]+\d+))?\s*:\s*(?P<text>.*)$",
    )
    .expect("canonical origin pattern is valid")
});

static CANONICAL_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:[^:]*?\s)?(?i:(?P<category>error|warning))(?:\s+(?P<code>[A-Za-z]+\d+))?\s*:\s*(?P<text>.*)$",
    )
    .expect("canonical bare pattern is valid")
});

/// How a line should be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Message,
    Warning(OutputDiagnostic),
    Error(OutputDiagnostic),
}

/// Decides the severity of one line of output.
pub trait OutputClassifier: Send + Sync {
    fn classify(&self, line: &str) -> Classification;
}

/// Knobs for [`CanonicalClassifier`].
#[derive(Debug, Clone, Default)]
pub struct ClassifierSettings {
    /// Skip canonical-format detection entirely.
    pub ignore_standard_format: bool,
    pub custom_error: Option<Regex>,
    pub custom_warning: Option<Regex>,
}

/// The default classifier.
#[derive(Debug, Clone, Default)]
pub struct CanonicalClassifier {
    settings: ClassifierSettings,
}

impl CanonicalClassifier {
    pub fn new(settings: ClassifierSettings) -> Self {
        Self { settings }
    }
}

impl OutputClassifier for CanonicalClassifier {
    fn classify(&self, line: &str) -> Classification {
        if let Some(re) = &self.settings.custom_error {
            if re.is_match(line) {
                return Classification::Error(OutputDiagnostic::from_line(line));
            }
        }
        if let Some(re) = &self.settings.custom_warning {
            if re.is_match(line) {
                return Classification::Warning(OutputDiagnostic::from_line(line));
            }
        }
        if self.settings.ignore_standard_format {
            return Classification::Message;
        }

        let caps = CANONICAL_WITH_ORIGIN
            .captures(line)
            .or_else(|| CANONICAL_BARE.captures(line));

        match caps {
            Some(caps) => canonical_classification(line, &caps),
            None => Classification::Message,
        }
    }
}

fn canonical_classification(line: &str, caps: &Captures<'_>) -> Classification {
    let group = |name: &str| {
        caps.name(name)
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let diag = OutputDiagnostic {
        origin: group("origin"),
        location: group("location"),
        code: group("code"),
        text: group("text").unwrap_or_default(),
        line: line.to_string(),
    };

    let is_error = caps
        .name("category")
        .is_some_and(|m| m.as_str().eq_ignore_ascii_case("error"));

    if is_error {
        Classification::Error(diag)
    } else {
        Classification::Warning(diag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> Classification {
        CanonicalClassifier::default().classify(line)
    }

    #[test]
    fn compiler_style_error_with_location() {
        match classify("main.c(10,5): error C2065: 'x': undeclared identifier") {
            Classification::Error(diag) => {
                assert_eq!(diag.origin.as_deref(), Some("main.c"));
                assert_eq!(diag.location.as_deref(), Some("10,5"));
                assert_eq!(diag.code.as_deref(), Some("C2065"));
                assert_eq!(diag.text, "'x': undeclared identifier");
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn windows_path_origin_keeps_drive_letter() {
        match classify(r"C:\src\app.cs(3): warning CS0168: unused variable") {
            Classification::Warning(diag) => {
                assert_eq!(diag.origin.as_deref(), Some(r"C:\src\app.cs"));
                assert_eq!(diag.code.as_deref(), Some("CS0168"));
            }
            other => panic!("expected warning, got {other:?}"),
        }
    }

    #[test]
    fn bare_error_prefix() {
        assert!(matches!(classify("error: linker failed"), Classification::Error(_)));
        assert!(matches!(classify("fatal error LNK1104: cannot open"), Classification::Error(_)));
        assert!(matches!(classify("Warning: deprecated flag"), Classification::Warning(_)));
    }

    #[test]
    fn plain_lines_are_messages() {
        assert_eq!(classify("compiling main.c"), Classification::Message);
        assert_eq!(classify("0 errors, 0 warnings"), Classification::Message);
        assert_eq!(classify(""), Classification::Message);
    }

    #[test]
    fn custom_regexes_take_precedence() {
        let classifier = CanonicalClassifier::new(ClassifierSettings {
            ignore_standard_format: true,
            custom_error: Some(Regex::new("^FAIL").unwrap()),
            custom_warning: Some(Regex::new("^WARN").unwrap()),
        });

        assert!(matches!(classifier.classify("FAIL test_a"), Classification::Error(_)));
        assert!(matches!(classifier.classify("WARN slow"), Classification::Warning(_)));
        assert_eq!(classifier.classify("error: ignored"), Classification::Message);
    }
}
