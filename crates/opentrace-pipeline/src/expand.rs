//! Environment variable expansion for raw pipeline text.
//!
//! Only the braced `${VAR}` form is expanded. A bare `$name` is the step
//! reference sigil and passes through untouched. `$${VAR}` escapes to the
//! literal text `${VAR}`.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::warn;

static ENV_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(\$)?\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env token regex")
});

/// Expand `${VAR}` tokens from the process environment.
///
/// Unset variables expand to the empty string.
pub fn expand_env(text: &str) -> Cow<'_, str> {
    expand_with(text, |name| std::env::var(name).ok())
}

/// Expand `${VAR}` tokens using a custom lookup.
pub fn expand_with<F>(text: &str, lookup: F) -> Cow<'_, str>
where
    F: Fn(&str) -> Option<String>,
{
    ENV_TOKEN.replace_all(text, |caps: &Captures<'_>| {
        let name = &caps[2];
        if caps.get(1).is_some() {
            return format!("${{{name}}}");
        }
        lookup(name).unwrap_or_else(|| {
            warn!(variable = %name, "Environment variable is not set, expanding to empty string");
            String::new()
        })
    })
}
