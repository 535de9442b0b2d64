//////////////////////////////////////////////////////////////
/// inner.rs
///
/// The inner interpreter: the NEXT loop that walks a colon body's
/// thread of cells, dispatching on the `CodeField` redesign instead of
/// the original `void*`/function-pointer polymorphism.
///
/// See DESIGN.md for the dispatch shape's grounding; the do-loop and
/// `does>` runtime mechanics follow `original_source/MiniForth.c`'s
/// `execute()`/`inner()`.
use crate::error::ErrorCode;
use crate::internals::debug;
use crate::internals::dictionary::{decode_word_ref, is_word_ref, CodeField, WordRef};
use crate::internals::opcodes::*;
use crate::kernel::{Cell, FALSE};
use crate::runtime::ForthRuntime;

/// Execute anything the compiler or outer interpreter can name: a
/// primitive, or a user word of any `CodeField` kind.
pub fn execute(rt: &mut ForthRuntime, r: WordRef) -> Result<(), ErrorCode> {
    match r {
        WordRef::Builtin(ix) => {
            let f = rt
                .dict
                .builtins
                .get(ix)
                .ok_or(ErrorCode::WordNotFound)?
                .code;
            f(rt)
        }
        WordRef::User(ix) => execute_user(rt, ix),
    }
}

/// `execute` - `( xt -- )` pop an execution token (the same encoded
/// word reference `'`/`>body` traffic in) and run it, per spec.md
/// §4.8's "execute consumes a dictionary-entry pointer from the data
/// stack and invokes it." Observationally equivalent to typing the
/// word's name at the outer interpreter - Testable Property 5.
pub fn f_execute(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let cell = rt.kernel.data.pop()?;
    if !is_word_ref(cell) {
        rt.msg_warn("execute", "not an execution token");
        return Err(ErrorCode::WordNotFound);
    }
    execute(rt, decode_word_ref(cell))
}

fn execute_user(rt: &mut ForthRuntime, ix: usize) -> Result<(), ErrorCode> {
    let entry = rt.dict.words.get(ix).ok_or(ErrorCode::WordNotFound)?.clone();
    match entry.cfa {
        CodeField::Variable | CodeField::Create => {
            let pfa = entry.pfa.ok_or(ErrorCode::Undefined)?;
            rt.kernel.data.push(pfa as Cell)
        }
        CodeField::Constant => {
            let pfa = entry.pfa.ok_or(ErrorCode::Undefined)?;
            let v = rt.kernel.arena.get_cell(pfa);
            rt.kernel.data.push(v)
        }
        CodeField::Does => {
            let pfa = entry.pfa.ok_or(ErrorCode::Undefined)?;
            rt.kernel.data.push(pfa as Cell)?;
            let body = entry.does_body.ok_or(ErrorCode::Undefined)?;
            run(rt, body)
        }
        CodeField::Colon => {
            let body = entry.pfa.ok_or(ErrorCode::Undefined)?;
            run(rt, body)
        }
    }
}

/// The NEXT loop. `pc` is a cell address in the shared arena; calling
/// into a colon (or does>) body pushes the resume address onto the
/// return stack and jumps, exactly like the classic threaded-code
/// inner interpreter - this is why a *third*, disjoint user stack is
/// required for `>r`/`r>`-style scratch storage: the return stack here
/// is genuinely live control-flow state.
fn run(rt: &mut ForthRuntime, start: usize) -> Result<(), ErrorCode> {
    let mut pc = start;
    loop {
        rt.poll_signal()?;
        let cell = rt.kernel.arena.get_cell(pc);
        if rt.tracing {
            debug::trace_step(rt, pc, cell);
        }
        match cell {
            OP_TERMINATE | OP_EXIT => match rt.kernel.ret.pop() {
                Ok(resume) => pc = resume as usize,
                Err(_) => return Ok(()),
            },
            OP_LITERAL => {
                let v = rt.kernel.arena.get_cell(pc + 1);
                rt.kernel.data.push(v)?;
                pc += 2;
            }
            OP_STRLIT => {
                let addr = rt.kernel.arena.get_cell(pc + 1);
                rt.kernel.data.push(addr)?;
                pc += 2;
            }
            OP_BRANCH => {
                pc = rt.kernel.arena.get_cell(pc + 1) as usize;
            }
            OP_QBRANCH => {
                let target = rt.kernel.arena.get_cell(pc + 1) as usize;
                let flag = rt.kernel.data.pop()?;
                pc = if flag == FALSE { target } else { pc + 2 };
            }
            OP_DO => {
                let index = rt.kernel.data.pop()?;
                let limit = rt.kernel.data.pop()?;
                rt.kernel.ret.push(limit)?;
                rt.kernel.ret.push(index)?;
                pc += 1;
            }
            OP_QDO => {
                let target = rt.kernel.arena.get_cell(pc + 1) as usize;
                let index = rt.kernel.data.pop()?;
                let limit = rt.kernel.data.pop()?;
                if index == limit {
                    pc = target;
                } else {
                    rt.kernel.ret.push(limit)?;
                    rt.kernel.ret.push(index)?;
                    pc += 2;
                }
            }
            OP_LOOP => {
                let target = rt.kernel.arena.get_cell(pc + 1) as usize;
                let index = rt.kernel.ret.pop()? + 1;
                let limit = rt.kernel.ret.pop()?;
                if index < limit {
                    rt.kernel.ret.push(limit)?;
                    rt.kernel.ret.push(index)?;
                    pc = target;
                } else {
                    pc += 2;
                }
            }
            OP_PLOOP => {
                let target = rt.kernel.arena.get_cell(pc + 1) as usize;
                let step = rt.kernel.data.pop()?;
                let index = rt.kernel.ret.pop()? + step;
                let limit = rt.kernel.ret.pop()?;
                let done = if step >= 0 { index >= limit } else { index <= limit };
                if !done {
                    rt.kernel.ret.push(limit)?;
                    rt.kernel.ret.push(index)?;
                    pc = target;
                } else {
                    pc += 2;
                }
            }
            OP_DOES => {
                let child_ix = rt.last_created.ok_or(ErrorCode::Undefined)?;
                rt.dict.words[child_ix].cfa = CodeField::Does;
                rt.dict.words[child_ix].does_body = Some(pc + 1);
                match rt.kernel.ret.pop() {
                    Ok(resume) => pc = resume as usize,
                    Err(_) => return Ok(()),
                }
            }
            OP_UNRESOLVED => return Err(ErrorCode::Unresolved),
            _ if cell > 0 => {
                pc += 1;
                match decode_word_ref(cell) {
                    WordRef::Builtin(bix) => {
                        let f = rt.dict.builtins.get(bix).ok_or(ErrorCode::WordNotFound)?.code;
                        f(rt)?;
                    }
                    WordRef::User(uix) => {
                        let entry = rt.dict.words.get(uix).ok_or(ErrorCode::WordNotFound)?.clone();
                        match entry.cfa {
                            CodeField::Variable | CodeField::Create => {
                                rt.kernel.data.push(entry.pfa.ok_or(ErrorCode::Undefined)? as Cell)?;
                            }
                            CodeField::Constant => {
                                let pfa = entry.pfa.ok_or(ErrorCode::Undefined)?;
                                rt.kernel.data.push(rt.kernel.arena.get_cell(pfa))?;
                            }
                            CodeField::Does => {
                                rt.kernel.data.push(entry.pfa.ok_or(ErrorCode::Undefined)? as Cell)?;
                                rt.kernel.ret.push(pc as Cell)?;
                                pc = entry.does_body.ok_or(ErrorCode::Undefined)?;
                            }
                            CodeField::Colon => {
                                rt.kernel.ret.push(pc as Cell)?;
                                pc = entry.pfa.ok_or(ErrorCode::Undefined)?;
                            }
                        }
                    }
                }
            }
            _ => return Err(ErrorCode::Undefined),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internals::dictionary::{encode_word_ref, Builtin, CodeField, DictEntry, WordFlag};
    use crate::runtime::ForthRuntime;

    fn push_one(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
        rt.kernel.data.push(1)
    }

    #[test]
    fn executes_literal_and_terminate() {
        let mut rt = ForthRuntime::new();
        let body = rt.kernel.arena.here();
        rt.kernel.arena.comma(OP_LITERAL).unwrap();
        rt.kernel.arena.comma(99).unwrap();
        rt.kernel.arena.comma(OP_TERMINATE).unwrap();
        run(&mut rt, body).unwrap();
        assert_eq!(rt.kernel.data.pop().unwrap(), 99);
    }

    #[test]
    fn calls_nested_colon_word() {
        let mut rt = ForthRuntime::new();
        let inner_body = rt.kernel.arena.here();
        rt.kernel.arena.comma(OP_LITERAL).unwrap();
        rt.kernel.arena.comma(7).unwrap();
        rt.kernel.arena.comma(OP_TERMINATE).unwrap();
        let name = rt.kernel.arena.cache("inner").unwrap();
        rt.dict.words.push(DictEntry {
            name_addr: name,
            cfa: CodeField::Colon,
            flag: WordFlag::Normal,
            pfa: Some(inner_body),
            does_body: None,
        });
        let inner_ix = rt.dict.words.len() - 1;

        let outer_body = rt.kernel.arena.here();
        rt.kernel.arena.comma(encode_word_ref(WordRef::User(inner_ix))).unwrap();
        rt.kernel.arena.comma(OP_TERMINATE).unwrap();
        run(&mut rt, outer_body).unwrap();
        assert_eq!(rt.kernel.data.pop().unwrap(), 7);
    }

    #[test]
    fn unresolved_branch_errors() {
        let mut rt = ForthRuntime::new();
        let body = rt.kernel.arena.here();
        rt.kernel.arena.comma(OP_UNRESOLVED).unwrap();
        assert!(matches!(run(&mut rt, body), Err(ErrorCode::Unresolved)));
    }

    #[test]
    fn tracing_prints_each_step_but_leaves_execution_unchanged() {
        let mut rt = ForthRuntime::new();
        rt.tracing = true;
        let body = rt.kernel.arena.here();
        rt.kernel.arena.comma(OP_LITERAL).unwrap();
        rt.kernel.arena.comma(99).unwrap();
        rt.kernel.arena.comma(OP_TERMINATE).unwrap();
        run(&mut rt, body).unwrap();
        assert_eq!(rt.kernel.data.pop().unwrap(), 99);
    }

    #[test]
    fn execute_runs_the_same_as_direct_dispatch() {
        let mut rt = ForthRuntime::new();
        rt.dict.builtins.push(Builtin { name: "push-one", code: push_one, doc: "", immediate: false });
        rt.kernel.data.push(encode_word_ref(WordRef::Builtin(0))).unwrap();
        f_execute(&mut rt).unwrap();
        assert_eq!(rt.kernel.data.pop().unwrap(), 1);
    }

    #[test]
    fn execute_rejects_a_non_execution_token() {
        let mut rt = ForthRuntime::new();
        rt.kernel.data.push(OP_LITERAL).unwrap();
        assert!(matches!(f_execute(&mut rt), Err(ErrorCode::WordNotFound)));
    }

    #[test]
    fn calls_builtin() {
        let mut rt = ForthRuntime::new();
        rt.dict.builtins.push(Builtin { name: "push-one", code: push_one, doc: "", immediate: false });
        let body = rt.kernel.arena.here();
        rt.kernel.arena.comma(encode_word_ref(WordRef::Builtin(0))).unwrap();
        rt.kernel.arena.comma(OP_TERMINATE).unwrap();
        run(&mut rt, body).unwrap();
        assert_eq!(rt.kernel.data.pop().unwrap(), 1);
    }
}
