//////////////////////////////////////////////////////////////
/// stack_words.rs
///
/// Data-stack shuffling, return-stack transfer (`>r`/`r>`/`r@`), the
/// user stack (`>u`/`u>`/`u@`) and the do-loop index words `i`/`j`.
///
/// See DESIGN.md for the primitives this file's routines are grounded on.
use crate::error::ErrorCode;
use crate::runtime::ForthRuntime;

pub fn f_dup(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let v = rt.kernel.data.top()?;
    rt.kernel.data.push(v)
}

pub fn f_drop(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    rt.kernel.data.pop()?;
    Ok(())
}

pub fn f_swap(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let b = rt.kernel.data.pop()?;
    let a = rt.kernel.data.pop()?;
    rt.kernel.data.push(b)?;
    rt.kernel.data.push(a)
}

pub fn f_over(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let v = rt.kernel.data.pick(1)?;
    rt.kernel.data.push(v)
}

pub fn f_rot(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let c = rt.kernel.data.pop()?;
    let b = rt.kernel.data.pop()?;
    let a = rt.kernel.data.pop()?;
    rt.kernel.data.push(b)?;
    rt.kernel.data.push(c)?;
    rt.kernel.data.push(a)
}

pub fn f_nip(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let b = rt.kernel.data.pop()?;
    rt.kernel.data.pop()?;
    rt.kernel.data.push(b)
}

pub fn f_tuck(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let b = rt.kernel.data.pop()?;
    let a = rt.kernel.data.pop()?;
    rt.kernel.data.push(b)?;
    rt.kernel.data.push(a)?;
    rt.kernel.data.push(b)
}

/// `pick` - `ix` is popped from the stack; `0 pick` is equivalent to
/// `dup`. Adopts the stricter bound documented in DESIGN.md.
pub fn f_pick(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let ix = rt.kernel.data.pop()? as usize;
    let v = rt.kernel.data.pick(ix)?;
    rt.kernel.data.push(v)
}

pub fn f_roll(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let ix = rt.kernel.data.pop()? as usize;
    rt.kernel.data.roll(ix)
}

pub fn f_depth(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let d = rt.kernel.data.depth() as i64;
    rt.kernel.data.push(d)
}

pub fn f_to_r(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let v = rt.kernel.data.pop()?;
    rt.kernel.ret.push(v)
}

pub fn f_r_from(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let v = rt.kernel.ret.pop()?;
    rt.kernel.data.push(v)
}

pub fn f_r_fetch(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let v = rt.kernel.ret.top()?;
    rt.kernel.data.push(v)
}

/// `i` - the innermost active `do`-loop's index, the top of the return stack.
pub fn f_i(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let v = rt.kernel.ret.pick(0)?;
    rt.kernel.data.push(v)
}

/// `j` - the next-outer loop's index: inner index, inner limit, then
/// the outer index sit on the return stack in that order.
pub fn f_j(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let v = rt.kernel.ret.pick(2)?;
    rt.kernel.data.push(v)
}

/// `>u` - push the data-stack top onto the user stack. Exists so
/// auxiliary scratch values never have to ride the return stack, which
/// also carries live control-flow addresses.
pub fn f_to_u(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let v = rt.kernel.data.pop()?;
    rt.kernel.user.push(v)
}

pub fn f_u_from(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let v = rt.kernel.user.pop()?;
    rt.kernel.data.push(v)
}

pub fn f_u_fetch(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let v = rt.kernel.user.top()?;
    rt.kernel.data.push(v)
}
