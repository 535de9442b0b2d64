//////////////////////////////////////////////////////////////
/// compiler.rs
///
/// The threaded-code compiler: `create`, `:`/`;`, `constant`,
/// `variable`, literal compilation and `does>`.
///
/// See DESIGN.md; exact semantics follow `original_source/MiniForth.c`'s
/// `create()`/`colon()`/`constant()`/`does()`.
use crate::error::ErrorCode;
use crate::internals::dictionary::{decode_word_ref, encode_word_ref, is_word_ref, CodeField, DictEntry, WordFlag, WordRef};
use crate::internals::opcodes::*;
use crate::internals::parsing::next_token;
use crate::runtime::ForthRuntime;

/// Parse the next token out of the current input frame.
fn parse_name(rt: &mut ForthRuntime) -> Result<String, ErrorCode> {
    rt.next_source_token().ok_or_else(|| {
        rt.msg_warn("create", "name expected, input exhausted");
        ErrorCode::WordNotFound
    })
}

/// `create` - parse a name, cache it, and append a new dictionary
/// entry whose `pfa` is `here` at the moment of creation - exactly the
/// address the next `,`/`allot`/compiled body cell will land at. This
/// single convention is what lets `variable`, `constant`, `:` and
/// `create ... does>` all share one code path.
pub fn f_create(rt: &mut ForthRuntime) -> Result<usize, ErrorCode> {
    let name = parse_name(rt)?;
    if rt.dict.lookup(&name, &rt.kernel.arena).is_some() {
        rt.msg_warn("create", &format!("redefining {}", name));
    }
    let name_addr = rt.kernel.arena.cache(&name)?;
    let pfa = rt.kernel.arena.here();
    rt.dict.words.push(DictEntry {
        name_addr,
        cfa: CodeField::Create,
        flag: WordFlag::Normal,
        pfa: Some(pfa),
        does_body: None,
    });
    let ix = rt.dict.words.len() - 1;
    rt.last_created = Some(ix);
    Ok(ix)
}

pub fn f_variable(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let ix = f_create(rt)?;
    rt.kernel.arena.comma(0)?;
    rt.dict.words[ix].cfa = CodeField::Variable;
    Ok(())
}

pub fn f_constant(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let value = rt.kernel.data.pop()?;
    let ix = f_create(rt)?;
    rt.kernel.arena.comma(value)?;
    rt.dict.words[ix].cfa = CodeField::Constant;
    Ok(())
}

/// `:` - begin a colon definition. The new entry is `Undefined` until
/// `;` completes it: a partially-compiled word is not visible to
/// lookup/recursion by name, though `recurse` can still reach it
/// directly.
pub fn f_colon(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let ix = f_create(rt)?;
    rt.dict.words[ix].cfa = CodeField::Colon;
    rt.dict.words[ix].flag = WordFlag::Undefined;
    rt.compiling = true;
    Ok(())
}

pub fn f_semicolon(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    if !rt.compiling {
        rt.msg_warn(";", "not compiling");
        return Err(ErrorCode::CompileOnly);
    }
    rt.kernel.arena.comma(OP_TERMINATE)?;
    if let Some(ix) = rt.last_created {
        rt.dict.words[ix].flag = WordFlag::Normal;
    }
    rt.compiling = false;
    Ok(())
}

/// `recurse` - compile a call to the word currently being defined.
pub fn f_recurse(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let ix = rt.last_created.ok_or(ErrorCode::WordNotFound)?;
    rt.kernel.arena.comma(encode_word_ref(WordRef::User(ix)))?;
    Ok(())
}

/// `does>` - compiled into the defining word's own body. See
/// `opcodes::OP_DOES` for the runtime half of this, in `internals::inner`.
pub fn f_does(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    if !rt.compiling {
        rt.msg_warn("does>", "not compiling");
        return Err(ErrorCode::CompileOnly);
    }
    rt.kernel.arena.comma(OP_DOES)?;
    Ok(())
}

/// Compile a literal value: `(literal)` opcode followed by the value cell.
pub fn compile_literal(rt: &mut ForthRuntime, value: crate::kernel::Cell) -> Result<(), ErrorCode> {
    rt.kernel.arena.comma(OP_LITERAL)?;
    rt.kernel.arena.comma(value)?;
    Ok(())
}

/// Compile a string literal: `(strlit)` opcode followed by the cached
/// string's arena address.
pub fn compile_strlit(rt: &mut ForthRuntime, text: &str) -> Result<(), ErrorCode> {
    let addr = rt.kernel.arena.cache(text)?;
    rt.kernel.arena.comma(OP_STRLIT)?;
    rt.kernel.arena.comma(addr as crate::kernel::Cell)?;
    Ok(())
}

/// `immediate` - mark the most recently defined word as immediate.
pub fn f_immediate(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let ix = rt.last_created.ok_or(ErrorCode::WordNotFound)?;
    rt.dict.words[ix].flag = WordFlag::Immediate;
    Ok(())
}

/// `'` (tick) - parse the next name and push its execution token
/// (encoded word reference).
pub fn f_tick(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let name = parse_name(rt)?;
    match rt.dict.lookup(&name, &rt.kernel.arena) {
        Some(r) => {
            rt.kernel.data.push(encode_word_ref(r))?;
            Ok(())
        }
        None => {
            rt.msg_warn("'", &format!("{} not found", name));
            Err(ErrorCode::WordNotFound)
        }
    }
}

/// `forget` - parse a name, drop it and every user word defined after
/// it, and rewind the dictionary/string arena cursors back to the
/// state they were in right before that word was created. Forgetting
/// the oldest user word (the first one compiled after `cold_start`'s
/// seal) restores `here` and the string cursor to exactly the sealed
/// floor - Testable Property 6. A name that only resolves to a
/// built-in primitive cannot be forgotten.
pub fn f_forget(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let name = parse_name(rt)?;
    match rt.dict.lookup(&name, &rt.kernel.arena) {
        Some(WordRef::User(ix)) => {
            let entry = &rt.dict.words[ix];
            let name_addr = entry.name_addr;
            let body_start = entry.pfa.unwrap_or_else(|| rt.kernel.arena.here());
            let name_len = rt.kernel.arena.string_len(name_addr);
            rt.dict.words.truncate(ix);
            rt.kernel.arena.rewind_to(body_start, name_addr + name_len + 1);
            if rt.last_created.is_some_and(|lc| lc >= ix) {
                rt.last_created = None;
            }
            Ok(())
        }
        _ => {
            rt.msg_warn("forget", &format!("{} not found", name));
            Err(ErrorCode::WordNotFound)
        }
    }
}

/// `>body` - `( xt -- addr )` turn an execution token (as `'` pushes)
/// into the `pfa` the word's body starts at - the same address
/// `create`/`variable`/`constant`/`:` pushes or stores into when the
/// word itself runs. Testable Property 4: `create X ;` followed by
/// `X` pushes the same address `' X >body` yields. Primitives have no
/// `pfa` and cannot be turned `>body`.
pub fn f_to_body(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let cell = rt.kernel.data.pop()?;
    if !is_word_ref(cell) {
        rt.msg_warn(">body", "not an execution token");
        return Err(ErrorCode::WordNotFound);
    }
    match decode_word_ref(cell) {
        WordRef::User(ix) => {
            let pfa = rt.dict.words.get(ix).and_then(|e| e.pfa).ok_or(ErrorCode::Undefined)?;
            rt.kernel.data.push(pfa as crate::kernel::Cell)
        }
        WordRef::Builtin(_) => {
            rt.msg_warn(">body", "primitive has no body");
            Err(ErrorCode::Undefined)
        }
    }
}

/// Low-level helper shared with the outer interpreter: parse the
/// scratch token out of whatever buffer is active right now.
pub fn scratch_token(buffer: &str, pos: &mut usize) -> Option<String> {
    next_token(buffer, pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ForthRuntime;

    fn rt_with_source(src: &str) -> ForthRuntime {
        let mut rt = ForthRuntime::new();
        rt.push_source_line(src.to_string());
        rt
    }

    #[test]
    fn create_sets_pfa_to_here() {
        let mut rt = rt_with_source("foo");
        let here_before = rt.kernel.arena.here();
        let ix = f_create(&mut rt).unwrap();
        assert_eq!(rt.dict.words[ix].pfa, Some(here_before));
    }

    #[test]
    fn variable_allocates_one_cell() {
        let mut rt = rt_with_source("v1");
        f_variable(&mut rt).unwrap();
        let ix = rt.last_created.unwrap();
        assert_eq!(rt.dict.words[ix].cfa, CodeField::Variable);
        let pfa = rt.dict.words[ix].pfa.unwrap();
        assert_eq!(rt.kernel.arena.get_cell(pfa), 0);
    }

    #[test]
    fn constant_stores_popped_value() {
        let mut rt = rt_with_source("c1");
        rt.kernel.data.push(42).unwrap();
        f_constant(&mut rt).unwrap();
        let ix = rt.last_created.unwrap();
        let pfa = rt.dict.words[ix].pfa.unwrap();
        assert_eq!(rt.kernel.arena.get_cell(pfa), 42);
    }

    #[test]
    fn colon_is_undefined_until_semicolon() {
        let mut rt = rt_with_source("word1");
        f_colon(&mut rt).unwrap();
        let ix = rt.last_created.unwrap();
        assert_eq!(rt.dict.words[ix].flag, WordFlag::Undefined);
        assert!(rt.dict.lookup("word1", &rt.kernel.arena).is_none());
        f_semicolon(&mut rt).unwrap();
        assert_eq!(rt.dict.words[ix].flag, WordFlag::Normal);
        assert!(rt.dict.lookup("word1", &rt.kernel.arena).is_some());
    }

    #[test]
    fn semicolon_without_colon_errors() {
        let mut rt = ForthRuntime::new();
        assert!(matches!(f_semicolon(&mut rt), Err(ErrorCode::CompileOnly)));
    }

    #[test]
    fn forget_removes_word_and_rewinds_arena() {
        let mut rt = ForthRuntime::new();
        rt.cold_start();
        let here_before = rt.kernel.arena.here();
        let words_before = rt.dict.len();
        rt.push_source_line(": a 1 ;".to_string());
        rt.quit();
        assert!(rt.dict.lookup("a", &rt.kernel.arena).is_some());
        rt.push_source_line("forget a".to_string());
        rt.quit();
        assert!(rt.dict.lookup("a", &rt.kernel.arena).is_none());
        assert_eq!(rt.dict.len(), words_before);
        assert_eq!(rt.kernel.arena.here(), here_before);
    }

    #[test]
    fn forget_drops_only_the_named_word_and_later_ones() {
        let mut rt = ForthRuntime::new();
        rt.cold_start();
        rt.push_source_line(": a 1 ; : b 2 ;".to_string());
        rt.quit();
        let b_ix = match rt.dict.lookup("b", &rt.kernel.arena).unwrap() {
            WordRef::User(ix) => ix,
            _ => unreachable!(),
        };
        let b_pfa = rt.dict.words[b_ix].pfa.unwrap();
        rt.push_source_line("forget b".to_string());
        rt.quit();
        assert!(rt.dict.lookup("a", &rt.kernel.arena).is_some());
        assert!(rt.dict.lookup("b", &rt.kernel.arena).is_none());
        assert_eq!(rt.kernel.arena.here(), b_pfa);
    }

    #[test]
    fn to_body_matches_the_pfa_create_pushes() {
        let mut rt = rt_with_source("x");
        let ix = f_create(&mut rt).unwrap();
        let pfa = rt.dict.words[ix].pfa.unwrap();
        rt.kernel.data.push(encode_word_ref(WordRef::User(ix))).unwrap();
        f_to_body(&mut rt).unwrap();
        assert_eq!(rt.kernel.data.pop().unwrap(), pfa as crate::kernel::Cell);
    }

    fn noop(_rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
        Ok(())
    }

    #[test]
    fn to_body_rejects_a_primitive() {
        let mut rt = ForthRuntime::new();
        rt.dict.add_builtin("noop", noop, "", false);
        rt.kernel.data.push(encode_word_ref(WordRef::Builtin(0))).unwrap();
        assert!(matches!(f_to_body(&mut rt), Err(ErrorCode::Undefined)));
    }

    #[test]
    fn forget_unknown_word_errors() {
        let mut rt = ForthRuntime::new();
        rt.push_source_line("bogus".to_string());
        assert!(matches!(f_forget(&mut rt), Err(ErrorCode::WordNotFound)));
    }
}
