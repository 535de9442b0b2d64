//////////////////////////////////////////////////////////////////
/// runtime.rs
///
/// Forth Runtime Engine
///
/// `ForthRuntime` owns every piece of mutable state the interpreter
/// touches: the three-stack/arena `Kernel`, the `Dictionary`, the input
/// frame stack and its matching file readers, and the diagnostic sink.
/// `cold_start` installs the builtin word table and seals the arena;
/// `quit` is the outer interpreter's top-level loop.
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{ErrorCode, Msg};
use crate::internals::compiler;
use crate::internals::control;
use crate::internals::debug;
use crate::internals::dictionary::{encode_word_ref, Dictionary};
use crate::internals::files::FileHandle;
use crate::internals::inner;
use crate::internals::io_words;
use crate::internals::numeric_io;
use crate::internals::parsing::{self, InputFrame};
use crate::internals::reset;
use crate::internals::stack_words;
use crate::kernel::Kernel;

pub struct ForthRuntime {
    pub kernel: Kernel,
    pub dict: Dictionary,
    /// Stack of active input sources, terminal at index 0. Capped at
    /// `io_words::MAX_INPUT_DEPTH` by `include-file`.
    pub input: Vec<InputFrame>,
    /// One `FileHandle` per frame in `input`, in lockstep: `reader[i]`
    /// refills `input[i]` when its buffer runs dry.
    pub reader: Vec<FileHandle>,
    /// `state` - true while compiling a colon definition.
    pub compiling: bool,
    /// The dictionary entry most recently built by `create`, `:` or a
    /// child of a defining word - target of `;`, `immediate`, `does>`
    /// and `recurse`.
    pub last_created: Option<usize>,
    /// Pending forward branches from `leave`, one nesting level's worth
    /// delimited by a `usize::MAX` sentinel pushed by `do`/`?do`.
    pub leave_stack: Vec<usize>,
    /// Scratch buffer for pictured numeric output (`<#`...`#>`).
    pub hold_buf: Vec<u8>,
    /// Working magnitude and sign captured by `<#`, consumed digit by
    /// digit by `#`/`#s` and consulted by `sign` - see `internals::numeric_io`.
    pub pn_value: u64,
    pub pn_negative: bool,
    pub msg: Msg,
    /// Consulted by the inner interpreter's NEXT loop when `tracing`
    /// is on (see `internals::debug::f_trace`).
    pub tracing: bool,
    pub show_stack: bool,
    /// Dictionary length right after `cold_start` finishes registering
    /// builtins - the floor a cold reset truncates back to.
    pub sealed_word_count: usize,
    /// Polled once per inner-interpreter step. An external handler (not
    /// wired by this crate) can set this to request a clean exit from
    /// outside the run loop.
    pub signal: Arc<AtomicI64>,
    pub timer: Instant,
}

impl ForthRuntime {
    pub fn new() -> ForthRuntime {
        ForthRuntime {
            kernel: Kernel::new(),
            dict: Dictionary::new(),
            input: vec![InputFrame::new("terminal")],
            reader: vec![FileHandle::new_stdin()],
            compiling: false,
            last_created: None,
            leave_stack: Vec::new(),
            hold_buf: Vec::new(),
            pn_value: 0,
            pn_negative: false,
            msg: Msg::new(),
            tracing: false,
            show_stack: true,
            sealed_word_count: 0,
            signal: Arc::new(AtomicI64::new(0)),
            timer: Instant::now(),
        }
    }

    /// Swap the console reader for the crossterm-backed line editor,
    /// used when running attached to an interactive terminal. Falls
    /// back silently to the plain stdin reader if raw mode can't be
    /// entered (e.g. stdin is not a tty).
    pub fn use_tui_console(&mut self) {
        if let Ok(fh) = FileHandle::new_tui() {
            self.reader[0] = fh;
        }
    }

    pub fn msg_warn(&self, context: &str, text: &str) {
        self.msg.warning(context, text, None::<&str>);
    }

    /// Polled by the inner interpreter between opcodes: a nonzero
    /// signal value asks the run loop to stop as if `bye` had been
    /// executed.
    pub fn poll_signal(&self) -> Result<(), ErrorCode> {
        if self.signal.load(Ordering::Relaxed) != 0 {
            Err(ErrorCode::Bye)
        } else {
            Ok(())
        }
    }

    /// Test helper: push a line of source directly into the current
    /// (innermost) input frame, bypassing the reader stack.
    pub fn push_source_line(&mut self, line: String) {
        if let Some(frame) = self.input.last_mut() {
            frame.set_line(line);
        }
    }

    /// Pull the next whitespace-delimited token, refilling from the
    /// active reader (and unwinding exhausted `include-file` frames on
    /// EOF) as needed. `None` only at true end of input on the
    /// outermost (terminal) frame.
    pub fn next_source_token(&mut self) -> Option<String> {
        loop {
            if self.input.is_empty() {
                return None;
            }
            if let Some(tok) = self.input.last_mut().unwrap().next_token() {
                return Some(tok);
            }
            let depth = self.input.len();
            let refill = self.reader.get_mut(depth - 1).and_then(|r| r.get_line());
            match refill {
                Some(line) => self.input.last_mut().unwrap().set_line(line),
                None => {
                    self.input.pop();
                    self.reader.pop();
                    if self.input.is_empty() {
                        return None;
                    }
                }
            }
        }
    }

    /// Resolve a filename for `include-file`: try it as given first,
    /// then under each `OFF_PATH`-separated prefix.
    pub fn resolve_include_path(&self, name: &str) -> PathBuf {
        let direct = PathBuf::from(name);
        if direct.exists() {
            return direct;
        }
        if let Ok(off_path) = std::env::var("OFF_PATH") {
            for prefix in off_path.split(':') {
                let candidate = PathBuf::from(prefix).join(name);
                if candidate.exists() {
                    return candidate;
                }
            }
        }
        direct
    }

    /// Register every builtin primitive and seal the dictionary/arena
    /// at that point - the floor a cold reset restores to.
    pub fn cold_start(&mut self) {
        self.compile_builtins();
        self.kernel.arena.seal();
        self.sealed_word_count = self.dict.len();
    }

    fn compile_builtins(&mut self) {
        macro_rules! word {
            ($name:expr, $f:path) => {
                self.dict.add_builtin($name, $f, "", false);
            };
        }
        macro_rules! imm {
            ($name:expr, $f:path) => {
                self.dict.add_builtin($name, $f, "", true);
            };
        }

        // stack_words
        word!("dup", stack_words::f_dup);
        word!("drop", stack_words::f_drop);
        word!("swap", stack_words::f_swap);
        word!("over", stack_words::f_over);
        word!("rot", stack_words::f_rot);
        word!("nip", stack_words::f_nip);
        word!("tuck", stack_words::f_tuck);
        word!("pick", stack_words::f_pick);
        word!("roll", stack_words::f_roll);
        word!("depth", stack_words::f_depth);
        word!(">r", stack_words::f_to_r);
        word!("r>", stack_words::f_r_from);
        word!("r@", stack_words::f_r_fetch);
        word!("i", stack_words::f_i);
        word!("j", stack_words::f_j);
        word!(">u", stack_words::f_to_u);
        word!("u>", stack_words::f_u_from);
        word!("u@", stack_words::f_u_fetch);

        // arith_words
        word!("+", crate::internals::arith_words::f_plus);
        word!("-", crate::internals::arith_words::f_minus);
        word!("*", crate::internals::arith_words::f_times);
        word!("/", crate::internals::arith_words::f_divide);
        word!("mod", crate::internals::arith_words::f_mod);
        word!("negate", crate::internals::arith_words::f_negate);
        word!("abs", crate::internals::arith_words::f_abs);
        word!("min", crate::internals::arith_words::f_min);
        word!("max", crate::internals::arith_words::f_max);
        word!("true", crate::internals::arith_words::f_true);
        word!("false", crate::internals::arith_words::f_false);
        word!("=", crate::internals::arith_words::f_equal);
        word!("==", crate::internals::arith_words::f_equal);
        word!("<>", crate::internals::arith_words::f_not_equal);
        word!("!=", crate::internals::arith_words::f_not_equal);
        word!("<", crate::internals::arith_words::f_less);
        word!(">", crate::internals::arith_words::f_greater);
        word!("<=", crate::internals::arith_words::f_less_equal);
        word!(">=", crate::internals::arith_words::f_greater_equal);
        word!("0=", crate::internals::arith_words::f_0equal);
        word!("0<", crate::internals::arith_words::f_0less);
        word!("and", crate::internals::arith_words::f_and);
        word!("&", crate::internals::arith_words::f_and);
        word!("or", crate::internals::arith_words::f_or);
        word!("xor", crate::internals::arith_words::f_xor);
        word!("not", crate::internals::arith_words::f_not);
        word!("lshift", crate::internals::arith_words::f_lshift);
        word!("rshift", crate::internals::arith_words::f_rshift);
        word!("cells", crate::internals::arith_words::f_cells);
        word!("cellsize", crate::internals::arith_words::f_cellsize);

        // numeric_io
        word!("<#", numeric_io::f_less_number_sign);
        word!("#", numeric_io::f_number_sign);
        word!("#s", numeric_io::f_number_sign_s);
        word!("hold", numeric_io::f_hold);
        word!("sign", numeric_io::f_sign);
        word!("#>", numeric_io::f_number_sign_greater);
        word!("count", numeric_io::f_count);
        word!("type", numeric_io::f_type);
        word!(".", numeric_io::f_dot);
        word!("u.", numeric_io::f_u_dot);
        word!("hex", numeric_io::f_hex);
        word!("decimal", numeric_io::f_decimal);

        // control flow (all compile-only, and all immediate)
        imm!("if", control::f_if);
        imm!("else", control::f_else);
        imm!("then", control::f_then);
        imm!("begin", control::f_begin);
        imm!("again", control::f_again);
        imm!("until", control::f_until);
        imm!("while", control::f_while);
        imm!("repeat", control::f_repeat);
        imm!("do", control::f_do);
        imm!("?do", control::f_qdo);
        imm!("loop", control::f_loop);
        imm!("+loop", control::f_ploop);
        imm!("leave", control::f_leave);

        // compiler
        fn f_create_word(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
            compiler::f_create(rt).map(|_| ())
        }
        word!("create", f_create_word);
        word!("variable", compiler::f_variable);
        word!("constant", compiler::f_constant);
        word!(":", compiler::f_colon);
        imm!(";", compiler::f_semicolon);
        imm!("recurse", compiler::f_recurse);
        imm!("does>", compiler::f_does);
        word!("immediate", compiler::f_immediate);
        word!("'", compiler::f_tick);
        word!(">body", compiler::f_to_body);
        word!("execute", inner::f_execute);
        word!("forget", compiler::f_forget);

        // memory access - the raw arena primitives everything above is
        // built from.
        word!(",", f_comma);
        word!("@", f_fetch);
        word!("!", f_store);
        word!("c@", f_cfetch);
        word!("c!", f_cstore);
        word!("here", f_here);
        word!("allot", f_allot);

        // debug / introspection
        word!("words", debug::f_words);
        word!(".s", debug::f_dot_s);
        word!("trace", debug::f_trace);
        word!("see", debug::f_see);

        // io + outer-interpreter state
        word!("key", io_words::f_key);
        word!("emit", io_words::f_emit);
        word!("accept", io_words::f_accept);
        word!("query", io_words::f_query);
        word!("include-file", io_words::f_include_file);
        word!("bye", io_words::f_bye);
        word!("quit", io_words::f_quit_word);
        word!("abort", io_words::f_abort);
        word!("warm", reset::f_warm);
        word!("cold", reset::f_cold);
        imm!("[", io_words::f_lbracket);
        imm!("]", io_words::f_rbracket);
        imm!("(", io_words::f_paren_comment);
        imm!("\\", io_words::f_backslash_comment);
        imm!("s\"", f_s_quote);
        imm!(".\"", f_dot_quote);
    }

    /// Interpret or compile one already-tokenized word: look it up,
    /// dispatch or compile a call to it; failing that, try it as a
    /// number; failing that, report `WordNotFound`.
    fn interpret_token(&mut self, tok: &str) -> Result<(), ErrorCode> {
        if let Some(r) = self.dict.lookup(tok, &self.kernel.arena) {
            if self.compiling && !self.dict.is_immediate(r) {
                self.kernel.arena.comma(encode_word_ref(r))?;
                Ok(())
            } else {
                inner::execute(self, r)
            }
        } else if let Some(n) = parsing::parse_number(tok, self.kernel.base) {
            if self.compiling {
                compiler::compile_literal(self, n)
            } else {
                self.kernel.data.push(n)
            }
        } else {
            self.msg_warn("interpret", &format!("{} ?", tok));
            Err(ErrorCode::WordNotFound)
        }
    }

    /// The outer interpreter's top-level loop: read a token, interpret
    /// or compile it, recover from any error via the three reset
    /// boundaries, until `bye` or true end of input.
    pub fn quit(&mut self) {
        loop {
            let tok = match self.next_source_token() {
                Some(t) => t,
                None => break,
            };
            if let Err(e) = self.interpret_token(&tok) {
                if !reset::handle(self, e, &tok) {
                    break;
                }
            }
            let line_done = self.input.len() == 1 && self.input[0].exhausted();
            if line_done && !self.compiling && self.show_stack {
                debug::f_dot_s(self).ok();
            }
        }
    }

    /// `-x <word>`: execute one word non-interactively and report its
    /// error, if any, to stderr without entering `quit`.
    pub fn execute_word(&mut self, name: &str) -> Result<(), ErrorCode> {
        match self.dict.lookup(name, &self.kernel.arena) {
            Some(r) => inner::execute(self, r),
            None => {
                self.msg.error("execute", "word not found", Some(name));
                Err(ErrorCode::WordNotFound)
            }
        }
    }
}

impl Default for ForthRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// `s"` - parse a quoted string and, while compiling, compile it as a
/// string literal (pushes its counted-string address when the word
/// runs); while interpreting, cache it immediately and push the
/// address.
fn f_s_quote(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let text = parse_quoted(rt);
    if rt.compiling {
        compiler::compile_strlit(rt, &text)
    } else {
        let addr = rt.kernel.arena.cache(&text)?;
        rt.kernel.data.push(addr as crate::kernel::Cell)
    }
}

/// `."` - parse a quoted string and, while compiling, compile it
/// followed by a call to `type`; while interpreting, print it directly.
fn f_dot_quote(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let text = parse_quoted(rt);
    if rt.compiling {
        compiler::compile_strlit(rt, &text)?;
        let type_ix = rt.dict.builtin_index("type").expect("type must be registered before \".\"");
        rt.kernel
            .arena
            .comma(encode_word_ref(crate::internals::dictionary::WordRef::Builtin(type_ix)))?;
        Ok(())
    } else {
        print!("{}", text);
        Ok(())
    }
}

/// `,` - pop a value and compile it as the next cell at `here`.
fn f_comma(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let v = rt.kernel.data.pop()?;
    rt.kernel.arena.comma(v)?;
    Ok(())
}

/// `@` - fetch the cell at the popped address.
fn f_fetch(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let addr = rt.kernel.data.pop()? as usize;
    rt.kernel.data.push(rt.kernel.arena.get_cell(addr))
}

/// `!` - `( value addr -- )` store a cell at an address.
fn f_store(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let addr = rt.kernel.data.pop()? as usize;
    let v = rt.kernel.data.pop()?;
    rt.kernel.arena.set_cell(addr, v);
    Ok(())
}

/// `c@` - fetch a single byte.
fn f_cfetch(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let addr = rt.kernel.data.pop()? as usize;
    rt.kernel.data.push(rt.kernel.arena.get_byte(addr) as crate::kernel::Cell)
}

/// `c!` - `( value addr -- )` store a single byte.
fn f_cstore(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let addr = rt.kernel.data.pop()? as usize;
    let v = rt.kernel.data.pop()?;
    rt.kernel.arena.set_byte(addr, v as u8);
    Ok(())
}

/// `here` - push the current dictionary cursor.
fn f_here(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    rt.kernel.data.push(rt.kernel.arena.here() as crate::kernel::Cell)
}

/// `allot` - advance `here` by the popped (cell) count, zero-filling.
fn f_allot(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let n = rt.kernel.data.pop()?;
    for _ in 0..n.max(0) {
        rt.kernel.arena.comma(0)?;
    }
    Ok(())
}

fn parse_quoted(rt: &mut ForthRuntime) -> String {
    let frame = match rt.input.last_mut() {
        Some(f) => f,
        None => return String::new(),
    };
    if frame.buffer.as_bytes().get(frame.pos) == Some(&b' ') {
        frame.pos += 1;
    }
    frame.parse_to('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booted() -> ForthRuntime {
        let mut rt = ForthRuntime::new();
        rt.cold_start();
        rt
    }

    #[test]
    fn cold_start_seals_dictionary() {
        let rt = booted();
        assert!(rt.dict.builtin_index("dup").is_some());
        assert_eq!(rt.sealed_word_count, rt.dict.len());
    }

    #[test]
    fn interprets_arithmetic_line() {
        let mut rt = booted();
        rt.push_source_line("2 3 + .".to_string());
        rt.quit();
        // "." printed to stdout; nothing left to assert on the stack
        // beyond successful completion (no panics, no stray error).
        assert_eq!(rt.msg.error_count(), 0);
    }

    #[test]
    fn compiles_and_runs_a_colon_word() {
        let mut rt = booted();
        rt.push_source_line(": sq dup * ;".to_string());
        rt.quit();
        assert!(rt.dict.lookup("sq", &rt.kernel.arena).is_some());
        rt.push_source_line("5 sq".to_string());
        rt.quit();
        assert_eq!(rt.kernel.data.pop().unwrap(), 25);
    }

    #[test]
    fn bye_stops_the_loop() {
        let mut rt = booted();
        rt.push_source_line("1 2 + bye 99".to_string());
        rt.quit();
        assert_eq!(rt.kernel.data.pop().unwrap(), 3);
    }

    #[test]
    fn unknown_word_warns_and_keeps_running() {
        let mut rt = booted();
        rt.push_source_line("bogus-word 7".to_string());
        rt.quit();
        assert_eq!(rt.msg.error_count(), 1);
        assert_eq!(rt.kernel.data.pop().unwrap(), 7);
    }

    #[test]
    fn does_builds_a_working_defining_word() {
        let mut rt = booted();
        rt.push_source_line(": const create , does> @ ;".to_string());
        rt.quit();
        rt.push_source_line("42 const answer".to_string());
        rt.quit();
        rt.push_source_line("answer".to_string());
        rt.quit();
        assert_eq!(rt.kernel.data.pop().unwrap(), 42);
    }

    #[test]
    fn tick_execute_equals_direct_invocation() {
        let mut rt = booted();
        rt.push_source_line(": sq dup * ;".to_string());
        rt.quit();
        rt.push_source_line("6 sq".to_string());
        rt.quit();
        let direct = rt.kernel.data.pop().unwrap();
        rt.push_source_line("6 ' sq execute".to_string());
        rt.quit();
        let via_execute = rt.kernel.data.pop().unwrap();
        assert_eq!(direct, via_execute);
        assert_eq!(rt.msg.error_count(), 0);
    }

    #[test]
    fn to_body_matches_the_address_create_pushes() {
        let mut rt = booted();
        rt.push_source_line(": holder create , ;".to_string());
        rt.quit();
        rt.push_source_line("99 holder x".to_string());
        rt.quit();
        rt.push_source_line("x".to_string());
        rt.quit();
        let direct_addr = rt.kernel.data.pop().unwrap();
        rt.push_source_line("' x >body".to_string());
        rt.quit();
        let via_to_body = rt.kernel.data.pop().unwrap();
        assert_eq!(direct_addr, via_to_body);
        assert_eq!(rt.msg.error_count(), 0);
    }

    #[test]
    fn warm_and_cold_are_callable_words() {
        let mut rt = booted();
        rt.push_source_line("1 2 3 warm".to_string());
        rt.quit();
        assert_eq!(rt.kernel.data.depth(), 0);

        rt.push_source_line(": temp-word 1 ;".to_string());
        rt.quit();
        assert!(rt.dict.lookup("temp-word", &rt.kernel.arena).is_some());
        rt.push_source_line("cold".to_string());
        rt.quit();
        assert!(rt.dict.lookup("temp-word", &rt.kernel.arena).is_none());
    }
}
