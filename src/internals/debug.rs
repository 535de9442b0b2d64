//////////////////////////////////////////////////////////////
/// debug.rs
///
/// Introspection: `words` (list the dictionary), `see` (decompile a
/// word's thread), `.s` and the `trace` toggle consulted by the inner
/// interpreter's signal-poll point.
///
/// See DESIGN.md; simplified to a one-shot decompile/listing rather
/// than an interactive single-step tracer, since introspection here
/// is scoped to `see`/`trace`/`.s`.
use crate::error::ErrorCode;
use crate::internals::dictionary::{decode_word_ref, CodeField, WordRef};
use crate::internals::opcodes::*;
use crate::kernel::Cell;
use crate::runtime::ForthRuntime;

/// `words` - list every visible name, newest first.
pub fn f_words(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    for name in rt.dict.names(&rt.kernel.arena) {
        print!("{} ", name);
    }
    println!();
    Ok(())
}

/// `.s` - non-destructively print the data stack, bottom to top.
pub fn f_dot_s(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    print!("<{}> ", rt.kernel.data.depth());
    for v in rt.kernel.data.iter_bottom_up() {
        print!("{} ", v);
    }
    println!();
    Ok(())
}

/// `trace` - toggle the tracing flag the inner interpreter's signal
/// poll point consults before each opcode.
pub fn f_trace(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    rt.tracing = !rt.tracing;
    Ok(())
}

/// `see` - decompile a colon definition's thread into a readable
/// listing of opcodes and word references.
pub fn f_see(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let name = rt.next_source_token().ok_or(ErrorCode::WordNotFound)?;
    let r = rt.dict.lookup(&name, &rt.kernel.arena).ok_or(ErrorCode::WordNotFound)?;
    let ix = match r {
        crate::internals::dictionary::WordRef::User(ix) => ix,
        crate::internals::dictionary::WordRef::Builtin(bix) => {
            println!(": {} ( primitive ) ;", rt.dict.builtins[bix].name);
            return Ok(());
        }
    };
    let entry = rt.dict.words[ix].clone();
    print!(": {} ", name);
    match entry.cfa {
        CodeField::Variable => println!("( variable ) ;"),
        CodeField::Constant => println!("( constant = {} ) ;", rt.kernel.arena.get_cell(entry.pfa.unwrap())),
        CodeField::Create => println!("( create ) ;"),
        CodeField::Colon | CodeField::Does => {
            let mut pc = entry.pfa.unwrap();
            loop {
                let cell = rt.kernel.arena.get_cell(pc);
                match cell {
                    OP_TERMINATE | OP_EXIT => {
                        print!("; ");
                        break;
                    }
                    OP_LITERAL => {
                        print!("{} ", rt.kernel.arena.get_cell(pc + 1));
                        pc += 2;
                    }
                    OP_STRLIT => {
                        let addr = rt.kernel.arena.get_cell(pc + 1) as usize;
                        print!("s\" {}\" ", rt.kernel.arena.get_string(addr));
                        pc += 2;
                    }
                    OP_BRANCH => {
                        print!("(branch->{}) ", rt.kernel.arena.get_cell(pc + 1));
                        pc += 2;
                    }
                    OP_QBRANCH => {
                        print!("(?branch->{}) ", rt.kernel.arena.get_cell(pc + 1));
                        pc += 2;
                    }
                    OP_DO => {
                        print!("do ");
                        pc += 1;
                    }
                    OP_QDO => {
                        print!("?do->{} ", rt.kernel.arena.get_cell(pc + 1));
                        pc += 2;
                    }
                    OP_LOOP => {
                        print!("loop->{} ", rt.kernel.arena.get_cell(pc + 1));
                        pc += 2;
                    }
                    OP_PLOOP => {
                        print!("+loop->{} ", rt.kernel.arena.get_cell(pc + 1));
                        pc += 2;
                    }
                    OP_DOES => {
                        print!("does> ");
                        pc += 1;
                    }
                    _ if cell > 0 => {
                        match decode_word_ref(cell) {
                            crate::internals::dictionary::WordRef::Builtin(bix) => {
                                print!("{} ", rt.dict.builtins[bix].name);
                            }
                            crate::internals::dictionary::WordRef::User(uix) => {
                                print!("{} ", rt.kernel.arena.get_string(rt.dict.words[uix].name_addr));
                            }
                        }
                        pc += 1;
                    }
                    _ => {
                        print!("(unknown-opcode {}) ", cell);
                        break;
                    }
                }
            }
            println!();
        }
    }
    Ok(())
}

/// `trace` - print the data stack followed by a one-line description
/// of the thread cell about to execute. Called from the inner
/// interpreter's NEXT loop (`internals::inner::run`) once per step
/// while `tracing` is on. Grounded in the teacher's `u_step`, minus its
/// interactive step/continue prompt - this core's `trace` toggle is a
/// plain on/off switch, not a stepper.
pub fn trace_step(rt: &ForthRuntime, pc: usize, cell: Cell) {
    print!("<{}> ", rt.kernel.data.depth());
    for v in rt.kernel.data.iter_bottom_up() {
        print!("{} ", v);
    }
    match cell {
        OP_TERMINATE | OP_EXIT => println!("; "),
        OP_LITERAL => println!("{} ", rt.kernel.arena.get_cell(pc + 1)),
        OP_STRLIT => {
            let addr = rt.kernel.arena.get_cell(pc + 1) as usize;
            println!("s\" {}\" ", rt.kernel.arena.get_string(addr));
        }
        OP_BRANCH => println!("branch->{}", rt.kernel.arena.get_cell(pc + 1)),
        OP_QBRANCH => println!("?branch->{}", rt.kernel.arena.get_cell(pc + 1)),
        OP_DO => println!("do"),
        OP_QDO => println!("?do->{}", rt.kernel.arena.get_cell(pc + 1)),
        OP_LOOP => println!("loop->{}", rt.kernel.arena.get_cell(pc + 1)),
        OP_PLOOP => println!("+loop->{}", rt.kernel.arena.get_cell(pc + 1)),
        OP_DOES => println!("does>"),
        OP_UNRESOLVED => println!("(unresolved)"),
        _ if cell > 0 => match decode_word_ref(cell) {
            WordRef::Builtin(bix) => println!("{}", rt.dict.builtins[bix].name),
            WordRef::User(uix) => println!("{}", rt.kernel.arena.get_string(rt.dict.words[uix].name_addr)),
        },
        _ => println!("(unknown opcode {})", cell),
    }
}
