//////////////////////////////////////////////////////////////
/// arith_words.rs
///
/// Arithmetic, comparison and bitwise-logic primitives.
///
/// See DESIGN.md; the comparison/logic set is filled out from
/// `original_source/MiniForth.c`'s `Primitives[]` table.
use crate::error::ErrorCode;
use crate::kernel::{Cell, FALSE, TRUE};
use crate::runtime::ForthRuntime;

fn flag(b: bool) -> Cell {
    if b {
        TRUE
    } else {
        FALSE
    }
}

fn binop(rt: &mut ForthRuntime, f: impl Fn(Cell, Cell) -> Cell) -> Result<(), ErrorCode> {
    let b = rt.kernel.data.pop()?;
    let a = rt.kernel.data.pop()?;
    rt.kernel.data.push(f(a, b))
}

pub fn f_plus(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    binop(rt, |a, b| a.wrapping_add(b))
}

pub fn f_minus(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    binop(rt, |a, b| a.wrapping_sub(b))
}

pub fn f_times(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    binop(rt, |a, b| a.wrapping_mul(b))
}

pub fn f_divide(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let b = rt.kernel.data.pop()?;
    let a = rt.kernel.data.pop()?;
    if b == 0 {
        rt.msg_warn("/", "division by zero");
        return Err(ErrorCode::DivByZero);
    }
    rt.kernel.data.push(a / b)
}

pub fn f_mod(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let b = rt.kernel.data.pop()?;
    let a = rt.kernel.data.pop()?;
    if b == 0 {
        rt.msg_warn("mod", "division by zero");
        return Err(ErrorCode::DivByZero);
    }
    rt.kernel.data.push(a % b)
}

pub fn f_negate(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let a = rt.kernel.data.pop()?;
    rt.kernel.data.push(-a)
}

pub fn f_abs(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let a = rt.kernel.data.pop()?;
    rt.kernel.data.push(a.abs())
}

pub fn f_min(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    binop(rt, |a, b| a.min(b))
}

pub fn f_max(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    binop(rt, |a, b| a.max(b))
}

pub fn f_true(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    rt.kernel.data.push(TRUE)
}

pub fn f_false(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    rt.kernel.data.push(FALSE)
}

pub fn f_equal(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    binop(rt, |a, b| flag(a == b))
}

pub fn f_not_equal(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    binop(rt, |a, b| flag(a != b))
}

pub fn f_less(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    binop(rt, |a, b| flag(a < b))
}

pub fn f_greater(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    binop(rt, |a, b| flag(a > b))
}

pub fn f_less_equal(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    binop(rt, |a, b| flag(a <= b))
}

pub fn f_greater_equal(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    binop(rt, |a, b| flag(a >= b))
}

pub fn f_0equal(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let a = rt.kernel.data.pop()?;
    rt.kernel.data.push(flag(a == 0))
}

pub fn f_0less(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let a = rt.kernel.data.pop()?;
    rt.kernel.data.push(flag(a < 0))
}

pub fn f_and(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    binop(rt, |a, b| a & b)
}

pub fn f_or(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    binop(rt, |a, b| a | b)
}

pub fn f_xor(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    binop(rt, |a, b| a ^ b)
}

pub fn f_not(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let a = rt.kernel.data.pop()?;
    rt.kernel.data.push(flag(a == FALSE))
}

pub fn f_lshift(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    binop(rt, |a, b| a.wrapping_shl(b as u32))
}

pub fn f_rshift(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    binop(rt, |a, b| a.wrapping_shr(b as u32))
}

/// `cells` - convert a cell count to a byte count.
pub fn f_cells(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let n = rt.kernel.data.pop()?;
    rt.kernel.data.push(n * crate::kernel::CELL_BYTES as Cell)
}

/// `cellsize` - push the width of one cell, in bytes.
pub fn f_cellsize(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    rt.kernel.data.push(crate::kernel::CELL_BYTES as Cell)
}
