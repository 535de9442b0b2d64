//////////////////////////////////////////////////////////////
/// io_words.rs
///
/// Character and line I/O primitives (`key`, `emit`, `accept`,
/// `query`), `include-file`, and the program-exit words
/// `bye`/`quit`/`abort`.
///
/// See DESIGN.md; exact semantics follow `original_source/MiniForth.c`'s
/// `accept()`/`key()`/`emit()`/`include_file()`.
use std::io::Write as _;

use crate::error::ErrorCode;
use crate::internals::parsing::InputFrame;
use crate::runtime::ForthRuntime;

pub const MAX_INPUT_DEPTH: usize = 4;

/// `key` - block for one character from the active input source and
/// push its code point.
pub fn f_key(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let depth = rt.input.len();
    match rt.reader.get_mut(depth - 1).and_then(|r| r.read_char()) {
        Some(c) => rt.kernel.data.push(c as i64),
        None => Err(ErrorCode::FileError),
    }
}

/// `emit` - pop a character code and write it to stdout.
pub fn f_emit(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let code = rt.kernel.data.pop()?;
    if let Some(c) = char::from_u32(code as u32) {
        print!("{}", c);
        std::io::stdout().flush().ok();
    }
    Ok(())
}

/// `accept` - `( addr max -- len )` read one line from the console into
/// the byte range starting at `addr`, truncated to `max` bytes, and
/// push the number of bytes actually stored.
pub fn f_accept(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let max = rt.kernel.data.pop()? as usize;
    let addr = rt.kernel.data.pop()? as usize;
    let line = rt.reader.first_mut().and_then(|r| r.get_line()).unwrap_or_default();
    let bytes = line.as_bytes();
    let n = bytes.len().min(max);
    for (i, b) in bytes[..n].iter().enumerate() {
        rt.kernel.arena.set_byte(addr + i, *b);
    }
    rt.kernel.data.push(n as i64)
}

/// `query` - refill the terminal's own input frame from the console,
/// discarding whatever was left unparsed.
pub fn f_query(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let line = rt.reader.first_mut().and_then(|r| r.get_line()).ok_or(ErrorCode::FileError)?;
    if let Some(frame) = rt.input.first_mut() {
        frame.set_line(line);
    }
    Ok(())
}

/// `include-file` - parse a filename and push a new input frame reading
/// from it, up to the stack's depth limit (at most 4 nested frames,
/// terminal plus 3 included files).
pub fn f_include_file(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    if rt.input.len() >= MAX_INPUT_DEPTH {
        rt.msg_warn("include-file", "input nesting too deep");
        return Err(ErrorCode::FileError);
    }
    let name = rt.next_source_token().ok_or(ErrorCode::FileError)?;
    let path = rt.resolve_include_path(&name);
    let handle = crate::internals::files::FileHandle::new_file(&path, crate::internals::files::FileMode::RO)
        .map_err(|e| {
            rt.msg.error("include-file", "unable to open", Some(e));
            ErrorCode::FileError
        })?;
    rt.reader.push(handle);
    rt.input.push(InputFrame::new(name));
    Ok(())
}

/// `bye` - stop the outer interpreter loop and exit the process.
pub fn f_bye(_rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    Err(ErrorCode::Bye)
}

/// `quit` - clear the return stack and drop back to the top-level
/// interpreter loop, without touching the dictionary or data stack.
pub fn f_quit_word(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    rt.kernel.ret.clear();
    Ok(())
}

/// `abort` - warm reset: clear all three stacks and any pending control
/// structures, keep the dictionary and open files.
pub fn f_abort(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    crate::internals::reset::warm(rt);
    Ok(())
}

/// `[` - drop out of compiling mode from inside a colon definition.
pub fn f_lbracket(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    rt.compiling = false;
    Ok(())
}

/// `]` - resume compiling mode.
pub fn f_rbracket(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    rt.compiling = true;
    Ok(())
}

/// `(` - skip a comment up to and including the closing paren.
pub fn f_paren_comment(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    if let Some(frame) = rt.input.last_mut() {
        frame.parse_to(')');
    }
    Ok(())
}

/// `\` - skip the remainder of the current line as a comment.
pub fn f_backslash_comment(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    if let Some(frame) = rt.input.last_mut() {
        frame.pos = frame.buffer.len();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_prints_without_touching_dict() {
        let mut rt = ForthRuntime::new();
        rt.kernel.data.push('A' as i64).unwrap();
        assert!(f_emit(&mut rt).is_ok());
        assert_eq!(rt.kernel.data.depth(), 0);
    }

    #[test]
    fn bracket_toggle_flips_compiling() {
        let mut rt = ForthRuntime::new();
        f_rbracket(&mut rt).unwrap();
        assert!(rt.compiling);
        f_lbracket(&mut rt).unwrap();
        assert!(!rt.compiling);
    }

    #[test]
    fn quit_word_clears_only_return_stack() {
        let mut rt = ForthRuntime::new();
        rt.kernel.data.push(1).unwrap();
        rt.kernel.ret.push(2).unwrap();
        f_quit_word(&mut rt).unwrap();
        assert_eq!(rt.kernel.ret.depth(), 0);
        assert_eq!(rt.kernel.data.depth(), 1);
    }

    #[test]
    fn paren_comment_consumes_to_closing_paren() {
        let mut rt = ForthRuntime::new();
        rt.push_source_line("this is a comment ) dup".to_string());
        f_paren_comment(&mut rt).unwrap();
        assert_eq!(rt.next_source_token().as_deref(), Some("dup"));
    }

    fn scratch_file(tag: &str, contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("f3core-io-{}-{}.fs", std::process::id(), tag));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn include_file_nests_and_sees_words_defined_by_the_inner_file() {
        let inner = scratch_file("inner", ": greet 42 ;\n");
        let outer = scratch_file("outer", &format!("include-file {}\ngreet\n", inner.display()));

        let mut rt = ForthRuntime::new();
        rt.cold_start();
        rt.push_source_line(format!("include-file {}", outer.display()));
        rt.quit();

        assert_eq!(rt.msg.error_count(), 0);
        assert_eq!(rt.kernel.data.pop().unwrap(), 42);

        std::fs::remove_file(inner).ok();
        std::fs::remove_file(outer).ok();
    }
}
