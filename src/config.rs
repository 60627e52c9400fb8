//! Compiler options, with environment overrides.
use std::env;

const ENV_ELIDE_COPIES: &str = "COMPUTATIONS_ELIDE_COPIES";
const ENV_VERIFY: &str = "COMPUTATIONS_VERIFY";

/// Knobs for the in-place compiler pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Remove copies whose source has no other reader.
    pub elide_copies: bool,
    /// Check the final schedule for reads of overwritten storage.
    pub verify: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            elide_copies: true,
            verify: true,
        }
    }
}

impl CompileOptions {
    /// Defaults overridden by `COMPUTATIONS_ELIDE_COPIES` and `COMPUTATIONS_VERIFY`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            elide_copies: env_flag(ENV_ELIDE_COPIES).unwrap_or(defaults.elide_copies),
            verify: env_flag(ENV_VERIFY).unwrap_or(defaults.verify),
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(parse_bool(&value)),
        _ => None,
    }
}

fn parse_bool(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Mutex;

    // Tests in this module share the process environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn set_or_clear(key: &str, value: Option<&str>) {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }

    #[rstest]
    #[case("1", true)]
    #[case("true", true)]
    #[case(" YES ", true)]
    #[case("on", true)]
    #[case("0", false)]
    #[case("off", false)]
    #[case("nope", false)]
    fn test_parse_bool(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(parse_bool(raw), expected);
    }

    #[test]
    fn test_defaults_enable_everything() {
        let opts = CompileOptions::default();
        assert!(opts.elide_copies);
        assert!(opts.verify);
    }

    #[rstest]
    #[case(None, None, true, true)]
    #[case(Some("0"), None, false, true)]
    #[case(None, Some("off"), true, false)]
    #[case(Some("yes"), Some("1"), true, true)]
    #[case(Some("false"), Some("false"), false, false)]
    #[case(Some("  "), Some(""), true, true)]
    fn test_from_env_overrides_defaults(
        #[case] elide: Option<&str>,
        #[case] verify: Option<&str>,
        #[case] expect_elide: bool,
        #[case] expect_verify: bool,
    ) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        set_or_clear(ENV_ELIDE_COPIES, elide);
        set_or_clear(ENV_VERIFY, verify);

        let opts = CompileOptions::from_env();

        env::remove_var(ENV_ELIDE_COPIES);
        env::remove_var(ENV_VERIFY);
        assert_eq!(
            opts,
            CompileOptions {
                elide_copies: expect_elide,
                verify: expect_verify,
            }
        );
    }
}
