//! The formatter gate: every emitted buffer is reparsed and reprinted
//! canonically before it leaves the generator.

use crate::error::{CodegenError, Result};
use tracing::warn;

/// Formats an emitted buffer through `syn` + `prettyplease`.
///
/// On a parse failure the buffer is rejected, unless `save_unformatted` is
/// set, in which case the raw bytes come back as a best-effort fallback;
/// buggy template output is more usefully debugged unformatted. The switch
/// is a development affordance and defaults off.
pub fn format_source(source: &str, save_unformatted: bool) -> Result<String> {
    match syn::parse_file(source) {
        Ok(file) => Ok(prettyplease::unparse(&file)),
        Err(e) if save_unformatted => {
            warn!(error = %e, "Formatter rejected output; surfacing unformatted bytes");
            Ok(source.to_string())
        }
        Err(e) => Err(CodegenError::FormatRejected(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_normalizes_whitespace() {
        let formatted = format_source("pub   fn   f(  ) { 1 ; }", false).expect("format");
        assert!(formatted.contains("pub fn f()"));
    }

    #[test]
    fn test_format_is_idempotent() {
        let once = format_source("pub struct S { pub a: i64, pub b: bool }", false).expect("format");
        let twice = format_source(&once, false).expect("format");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rejects_invalid_source() {
        let err = format_source("pub struct {", false).expect_err("should reject");
        assert!(matches!(err, CodegenError::FormatRejected(_)));
    }

    #[test]
    fn test_debug_switch_surfaces_raw_bytes() {
        let raw = "pub struct {";
        let result = format_source(raw, true).expect("fallback");
        assert_eq!(result, raw);
    }
}
