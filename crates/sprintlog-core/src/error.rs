use std::fmt;

/// Machine-readable error codes for scripts and CI annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    SprintNameMissing,
    ConfigParseError,
    EmptyLog,
    MalformedLog,
    MalformedInput,
    LogReadFailed,
    LogWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::SprintNameMissing => "E1001",
            Self::ConfigParseError => "E1002",
            Self::EmptyLog => "E2001",
            Self::MalformedLog => "E2002",
            Self::MalformedInput => "E2003",
            Self::LogReadFailed => "E2004",
            Self::LogWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::SprintNameMissing => "Sprint name not configured",
            Self::ConfigParseError => "Config file parse error",
            Self::EmptyLog => "Snapshot log has no snapshots",
            Self::MalformedLog => "Snapshot log is not valid JSON",
            Self::MalformedInput => "Observed items file is not valid JSON",
            Self::LogReadFailed => "Snapshot log could not be read",
            Self::LogWriteFailed => "Snapshot log write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::SprintNameMissing => Some("Pass --sprint or set SPRINT_NAME."),
            Self::ConfigParseError => Some("Fix syntax in .sprintlog.toml and retry."),
            Self::EmptyLog => Some("Run `sprintlog snapshot` to record a baseline first."),
            Self::MalformedLog => {
                Some("Restore the log from version control; it is never rewritten partially.")
            }
            Self::MalformedInput => Some("Re-export the board items and retry."),
            Self::LogReadFailed => Some("Check that the log file exists and is readable."),
            Self::LogWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => {
                Some("Another sprintlog run holds the log lock. Retry after it finishes.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 9] = [
        ErrorCode::SprintNameMissing,
        ErrorCode::ConfigParseError,
        ErrorCode::EmptyLog,
        ErrorCode::MalformedLog,
        ErrorCode::MalformedInput,
        ErrorCode::LogReadFailed,
        ErrorCode::LogWriteFailed,
        ErrorCode::LockContention,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let text = code.code();
            assert_eq!(text.len(), 5);
            assert!(text.starts_with('E'));
            assert!(text.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn display_matches_code() {
        assert_eq!(ErrorCode::EmptyLog.to_string(), "E2001");
    }
}
