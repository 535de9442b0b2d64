//////////////////////////////////////////////////////////////
/// reset.rs
///
/// The three recovery boundaries this interpreter relies on:
/// per-primitive (a single builtin call fails), per-token (the outer
/// interpreter's loop catches it and keeps going), and per-program
/// (`quit`'s outermost loop, which can only be left by `bye`).
/// `setjmp`/`longjmp` in `original_source/MiniForth.c` becomes plain
/// `Result` propagation plus these two explicit reset functions.
use crate::error::ErrorCode;
use crate::runtime::ForthRuntime;

/// warm reset - used after a per-token error: clear the stacks and the
/// control/leave bookkeeping, leave the dictionary, arena and open
/// files untouched, return to interactive input.
pub fn warm(rt: &mut ForthRuntime) {
    rt.kernel.warm_reset();
    rt.leave_stack.clear();
    rt.compiling = false;
}

/// cold reset - `abort`/`cold`: warm reset, plus truncate the
/// dictionary and arena back to the post-seal state and drop every
/// input frame except the terminal.
pub fn cold(rt: &mut ForthRuntime) {
    warm(rt);
    rt.dict.truncate(rt.sealed_word_count);
    rt.kernel.arena.forget();
    rt.input.truncate(1);
    if let Some(frame) = rt.input.first_mut() {
        frame.buffer.clear();
        frame.pos = 0;
    }
}

/// `warm` - the callable form of a warm reset, matching
/// `original_source`'s `resetter` word and spec.md §5's "`warm` cancels
/// all nested execution and returns to the outer loop."
pub fn f_warm(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    warm(rt);
    Ok(())
}

/// `cold` - the callable form of a cold reset, matching
/// `original_source`'s `cold` word and spec.md §5's "`cold` additionally
/// discards user definitions."
pub fn f_cold(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    cold(rt);
    Ok(())
}

/// Translate a caught `ErrorCode` into the reset it demands, reporting
/// through `Msg` along the way. Returns `true` if the caller (the
/// outer `quit` loop) should keep running, `false` if it should exit.
pub fn handle(rt: &mut ForthRuntime, err: ErrorCode, context: &str) -> bool {
    match err {
        ErrorCode::Bye => false,
        ErrorCode::Quit => {
            cold(rt);
            true
        }
        other => {
            rt.msg.error(context, other.message(), None::<&str>);
            warm(rt);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warm_clears_stacks_but_keeps_dictionary() {
        let mut rt = ForthRuntime::new();
        let words_before = rt.dict.len();
        rt.kernel.data.push(1).unwrap();
        rt.kernel.ret.push(2).unwrap();
        warm(&mut rt);
        assert_eq!(rt.kernel.data.depth(), 0);
        assert_eq!(rt.kernel.ret.depth(), 0);
        assert_eq!(rt.dict.len(), words_before);
    }

    #[test]
    fn cold_truncates_user_dictionary() {
        let mut rt = ForthRuntime::new();
        let sealed = rt.sealed_word_count;
        rt.dict.words.push(crate::internals::dictionary::DictEntry {
            name_addr: 0,
            cfa: crate::internals::dictionary::CodeField::Colon,
            flag: crate::internals::dictionary::WordFlag::Normal,
            pfa: Some(0),
            does_body: None,
        });
        cold(&mut rt);
        assert_eq!(rt.dict.len(), sealed);
    }

    #[test]
    fn handle_bye_stops_the_loop() {
        let mut rt = ForthRuntime::new();
        assert!(!handle(&mut rt, ErrorCode::Bye, "test"));
    }

    #[test]
    fn handle_ordinary_error_keeps_running() {
        let mut rt = ForthRuntime::new();
        assert!(handle(&mut rt, ErrorCode::WordNotFound, "test"));
    }
}
