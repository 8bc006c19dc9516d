//! Optional regex line transform.
//!
//! A single substitution applied to each reconstructed logical line before
//! layout. Lines that do not match pass through untouched. A pattern that
//! fails to compile disables the transform for the whole run: one
//! diagnostic, no fatal error, no retry.

use regex::Regex;
use std::borrow::Cow;
use tracing::warn;

/// Compiled line transform; inert when the pattern did not compile.
#[derive(Debug)]
pub struct Transformer {
    re: Option<Regex>,
    replacement: String,
}

impl Transformer {
    /// Compile `pattern`; on failure the transformer becomes a no-op.
    pub fn new(pattern: &str, replacement: &str) -> Self {
        let re = match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(pattern, error = %e, "cannot compile transform pattern, transform disabled");
                None
            }
        };
        Self {
            re,
            replacement: replacement.to_string(),
        }
    }

    /// Whether a usable pattern is loaded.
    pub const fn is_active(&self) -> bool {
        self.re.is_some()
    }

    /// Apply the substitution; borrows the input when nothing matches.
    pub fn apply<'a>(&self, line: &'a str) -> Cow<'a, str> {
        match &self.re {
            Some(re) => re.replace(line, self.replacement.as_str()),
            None => Cow::Borrowed(line),
        }
    }
}
