//////////////////////////////////////////////////////////////
/// control.rs
///
/// The control-flow compiler: the mark/resolve protocol and the
/// `if/else/then`, `begin/while/repeat/until/again` and
/// `do/loop/+loop/leave` word families built on top of it.
///
/// Marks live on the data stack during compilation. The do-loop
/// runtime behavior follows `original_source/MiniForth.c`'s
/// `qdo`/`do_do`/`do_loop`/`loop`/`do_I`/`ploop`/`do_ploop`.
use crate::error::ErrorCode;
use crate::internals::opcodes::*;
use crate::runtime::ForthRuntime;

/// `>mark` - reserve a forward-branch target slot at `here`, emitting
/// an unresolved placeholder, and push its address.
pub fn forward_mark(rt: &mut ForthRuntime) -> Result<usize, ErrorCode> {
    rt.kernel.arena.comma(OP_UNRESOLVED)
}

/// `>resolve` - patch a forward-branch slot to land on the current `here`.
pub fn forward_resolve(rt: &mut ForthRuntime, slot: usize) {
    let target = rt.kernel.arena.here() as crate::kernel::Cell;
    rt.kernel.arena.set_cell(slot, target);
}

/// `<mark` - record the current `here` as a backward-branch target.
pub fn backward_mark(rt: &ForthRuntime) -> usize {
    rt.kernel.arena.here()
}

/// `<resolve` - emit a backward-branch target cell pointing at `dest`.
pub fn backward_resolve(rt: &mut ForthRuntime, dest: usize) -> Result<(), ErrorCode> {
    rt.kernel.arena.comma(dest as crate::kernel::Cell)?;
    Ok(())
}

fn require_compiling(rt: &ForthRuntime, word: &str) -> Result<(), ErrorCode> {
    if !rt.compiling {
        rt.msg_warn(word, "compile-only word used while interpreting");
        return Err(ErrorCode::CompileOnly);
    }
    Ok(())
}

pub fn f_if(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    require_compiling(rt, "if")?;
    rt.kernel.arena.comma(OP_QBRANCH)?;
    let slot = forward_mark(rt)?;
    rt.kernel.data.push(slot as i64)?;
    Ok(())
}

pub fn f_else(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    require_compiling(rt, "else")?;
    let if_slot = rt.kernel.data.pop()? as usize;
    rt.kernel.arena.comma(OP_BRANCH)?;
    let else_slot = forward_mark(rt)?;
    forward_resolve(rt, if_slot);
    rt.kernel.data.push(else_slot as i64)?;
    Ok(())
}

pub fn f_then(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    require_compiling(rt, "then")?;
    let slot = rt.kernel.data.pop()? as usize;
    forward_resolve(rt, slot);
    Ok(())
}

pub fn f_begin(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    require_compiling(rt, "begin")?;
    let dest = backward_mark(rt);
    rt.kernel.data.push(dest as i64)?;
    Ok(())
}

pub fn f_again(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    require_compiling(rt, "again")?;
    let dest = rt.kernel.data.pop()? as usize;
    rt.kernel.arena.comma(OP_BRANCH)?;
    backward_resolve(rt, dest)
}

pub fn f_until(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    require_compiling(rt, "until")?;
    let dest = rt.kernel.data.pop()? as usize;
    rt.kernel.arena.comma(OP_QBRANCH)?;
    backward_resolve(rt, dest)
}

pub fn f_while(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    require_compiling(rt, "while")?;
    let begin_dest = rt.kernel.data.pop()? as usize;
    rt.kernel.arena.comma(OP_QBRANCH)?;
    let slot = forward_mark(rt)?;
    // push back in begin, while order so `repeat` can unwind both.
    rt.kernel.data.push(begin_dest as i64)?;
    rt.kernel.data.push(slot as i64)?;
    Ok(())
}

pub fn f_repeat(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    require_compiling(rt, "repeat")?;
    let while_slot = rt.kernel.data.pop()? as usize;
    let begin_dest = rt.kernel.data.pop()? as usize;
    rt.kernel.arena.comma(OP_BRANCH)?;
    backward_resolve(rt, begin_dest)?;
    forward_resolve(rt, while_slot);
    Ok(())
}

/// `do` - compile the runtime loop-entry opcode and mark the loop body
/// start for `loop`/`+loop` to branch back to.
pub fn f_do(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    require_compiling(rt, "do")?;
    rt.kernel.arena.comma(OP_DO)?;
    let dest = backward_mark(rt);
    rt.kernel.data.push(dest as i64)?;
    rt.leave_stack.push(usize::MAX); // sentinel marking this nesting level
    Ok(())
}

/// `?do` - like `do`, but skips the loop body entirely (the classic
/// zero-trip check) when index and limit arrive equal. The skip target
/// is a forward mark, unresolved until the matching `loop`/`+loop`
/// closes - it rides `leave_stack` alongside any `leave`s compiled
/// inside the body, exactly the same resolve-on-close mechanism.
pub fn f_qdo(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    require_compiling(rt, "?do")?;
    rt.kernel.arena.comma(OP_QDO)?;
    let skip_slot = forward_mark(rt)?;
    let dest = backward_mark(rt);
    rt.kernel.data.push(dest as i64)?;
    rt.leave_stack.push(usize::MAX);
    rt.leave_stack.push(skip_slot);
    Ok(())
}

fn close_loop(rt: &mut ForthRuntime, opcode: crate::kernel::Cell) -> Result<(), ErrorCode> {
    let dest = rt.kernel.data.pop()? as usize;
    rt.kernel.arena.comma(opcode)?;
    backward_resolve(rt, dest)?;
    let after = rt.kernel.arena.here() as crate::kernel::Cell;
    while let Some(slot) = rt.leave_stack.pop() {
        if slot == usize::MAX {
            break;
        }
        rt.kernel.arena.set_cell(slot, after);
    }
    Ok(())
}

pub fn f_loop(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    require_compiling(rt, "loop")?;
    close_loop(rt, OP_LOOP)
}

pub fn f_ploop(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    require_compiling(rt, "+loop")?;
    close_loop(rt, OP_PLOOP)
}

/// `leave` - compile an unconditional forward branch out of the
/// innermost do-loop, resolved when that loop's `loop`/`+loop` closes.
pub fn f_leave(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    require_compiling(rt, "leave")?;
    rt.kernel.arena.comma(OP_BRANCH)?;
    let slot = forward_mark(rt)?;
    rt.leave_stack.push(slot);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ForthRuntime;

    fn compiling_runtime() -> ForthRuntime {
        let mut rt = ForthRuntime::new();
        rt.compiling = true;
        rt
    }

    #[test]
    fn if_then_resolves_forward_branch() {
        let mut rt = compiling_runtime();
        f_if(&mut rt).unwrap();
        let qbranch_slot = rt.kernel.arena.here() - 1;
        f_then(&mut rt).unwrap();
        let landing = rt.kernel.arena.get_cell(qbranch_slot);
        assert_eq!(landing, rt.kernel.arena.here() as i64);
    }

    #[test]
    fn begin_until_resolves_backward_branch() {
        let mut rt = compiling_runtime();
        let top = rt.kernel.arena.here();
        f_begin(&mut rt).unwrap();
        f_until(&mut rt).unwrap();
        // cell right after OP_QBRANCH should point back at `top`.
        let target_addr = rt.kernel.arena.here() - 1;
        assert_eq!(rt.kernel.arena.get_cell(target_addr), top as i64);
    }

    #[test]
    fn leave_is_resolved_by_loop() {
        let mut rt = compiling_runtime();
        f_do(&mut rt).unwrap();
        f_leave(&mut rt).unwrap();
        let leave_slot = rt.kernel.arena.here() - 1;
        f_loop(&mut rt).unwrap();
        assert_eq!(rt.kernel.arena.get_cell(leave_slot), rt.kernel.arena.here() as i64);
    }

    #[test]
    fn control_words_require_compile_mode() {
        let mut rt = ForthRuntime::new();
        rt.compiling = false;
        assert!(matches!(f_if(&mut rt), Err(ErrorCode::CompileOnly)));
    }

    #[test]
    fn qdo_skip_slot_is_resolved_by_loop() {
        let mut rt = compiling_runtime();
        f_qdo(&mut rt).unwrap();
        let skip_slot = rt.kernel.arena.here() - 1;
        f_loop(&mut rt).unwrap();
        assert_eq!(rt.kernel.arena.get_cell(skip_slot), rt.kernel.arena.here() as i64);
    }
}
