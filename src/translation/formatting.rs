/*!
 * Post-processing applied to translated chapter text.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Replacement for every quote character
pub const QUOTE_REPLACEMENT: &str = "―";

/// ASCII, typographic and angle quotes
static QUOTE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["'“”‘’«»„‚]"#).expect("quote pattern is a valid regex"));

/// Replace quotes with a horizontal bar, the dialogue style used in
/// Spanish-language books
pub fn replace_quotes(text: &str) -> Cow<'_, str> {
    QUOTE_PATTERN.replace_all(text, QUOTE_REPLACEMENT)
}
