//////////////////////////////////////////////////////////////
/// error.rs
///
/// The closed error taxonomy the interpreter throws, the diagnostic
/// printer (`Msg`) the rest of the crate logs through, and the kinds
/// of reset a caught error can trigger.
///
/// Grounded in `original_source/MiniForth.c`'s `Err_t`/`errors[]` table;
/// see DESIGN.md for `Msg`/`DebugLevel`'s call-site contract.
use std::fmt;

/// The closed set of conditions the interpreter can throw. Every
/// fallible operation in the kernel, compiler and interpreter layers
/// returns `Result<_, ErrorCode>` rather than panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Ok,
    StackUnderflow,
    StackOverflow,
    DivByZero,
    ReturnStackUnderflow,
    ReturnStackOverflow,
    UserStackUnderflow,
    UserStackOverflow,
    NoSpace,
    WordNotFound,
    NotANumber,
    Unresolved,
    Unsave,
    CompileOnly,
    InterpretOnly,
    FileError,
    Quit,
    Bye,
    Undefined,
}

impl ErrorCode {
    /// Human-readable text, matching the register of the original
    /// `errors[]` string table.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::Ok => "ok",
            ErrorCode::StackUnderflow => "stack underflow",
            ErrorCode::StackOverflow => "stack overflow",
            ErrorCode::DivByZero => "division by zero",
            ErrorCode::ReturnStackUnderflow => "return stack underflow",
            ErrorCode::ReturnStackOverflow => "return stack overflow",
            ErrorCode::UserStackUnderflow => "user stack underflow",
            ErrorCode::UserStackOverflow => "user stack overflow",
            ErrorCode::NoSpace => "dictionary full",
            ErrorCode::WordNotFound => "word not found",
            ErrorCode::NotANumber => "not a number",
            ErrorCode::Unresolved => "unresolved branch executed",
            ErrorCode::Unsave => "nothing to un-save",
            ErrorCode::CompileOnly => "compile-only word used outside compilation",
            ErrorCode::InterpretOnly => "interpret-only word used during compilation",
            ErrorCode::FileError => "file error",
            ErrorCode::Quit => "quit",
            ErrorCode::Bye => "bye",
            ErrorCode::Undefined => "undefined condition",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ErrorCode {}

/// What a caught error should do to the interpreter's run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    /// Stay on the current token stream, clear only the stacks.
    Warm,
    /// Abandon all input frames, reset to the post-seal dictionary.
    Cold,
    /// Leave the process.
    Exit,
}

/// Diagnostic severity levels for the `Msg` sink below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl DebugLevel {
    pub fn from_str_loose(s: &str) -> Option<DebugLevel> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Some(DebugLevel::Error),
            "warning" => Some(DebugLevel::Warning),
            "info" => Some(DebugLevel::Info),
            "debug" => Some(DebugLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for DebugLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DebugLevel::Error => "error",
            DebugLevel::Warning => "warning",
            DebugLevel::Info => "info",
            DebugLevel::Debug => "debug",
        };
        write!(f, "{}", s)
    }
}

/// The interpreter's diagnostic sink. Messages below the configured
/// level are suppressed; `error` and `warning` are always emitted
/// (they are not gated by level, only `info`/`debug`-style tracing
/// would be - see `internals::debug`).
pub struct Msg {
    level: DebugLevel,
    /// Number of errors reported since the last reset - exposed for
    /// tests and for the `-q` quiet-exit-code convention.
    error_count: usize,
}

impl Msg {
    pub fn new() -> Msg {
        Msg { level: DebugLevel::Warning, error_count: 0 }
    }

    pub fn set_level(&mut self, level: DebugLevel) {
        self.level = level;
    }

    pub fn get_level(&self) -> DebugLevel {
        self.level
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// error - report a failure with a context tag and an optional
    /// detail value, e.g. `msg.error("find", "word not found", Some(name))`.
    pub fn error<T: fmt::Display>(&mut self, context: &str, text: &str, detail: Option<T>) {
        self.error_count += 1;
        match detail {
            Some(d) => eprintln!("error: {}: {}: {}", context, text, d),
            None => eprintln!("error: {}: {}", context, text),
        }
    }

    pub fn warning<T: fmt::Display>(&self, context: &str, text: &str, detail: Option<T>) {
        if self.level < DebugLevel::Warning {
            return;
        }
        match detail {
            Some(d) => eprintln!("warning: {}: {}: {}", context, text, d),
            None => eprintln!("warning: {}: {}", context, text),
        }
    }

    pub fn info(&self, text: &str) {
        if self.level >= DebugLevel::Info {
            println!("info: {}", text);
        }
    }

    pub fn debug(&self, text: &str) {
        if self.level >= DebugLevel::Debug {
            println!("debug: {}", text);
        }
    }
}

impl Default for Msg {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_level_ordering() {
        assert!(DebugLevel::Error < DebugLevel::Warning);
        assert!(DebugLevel::Warning < DebugLevel::Info);
        assert!(DebugLevel::Info < DebugLevel::Debug);
    }

    #[test]
    fn debug_level_from_str() {
        assert_eq!(DebugLevel::from_str_loose("Debug"), Some(DebugLevel::Debug));
        assert_eq!(DebugLevel::from_str_loose("bogus"), None);
    }

    #[test]
    fn msg_counts_errors() {
        let mut m = Msg::new();
        m.error::<&str>("test", "boom", None);
        m.error("test", "boom2", Some(5));
        assert_eq!(m.error_count(), 2);
    }
}
