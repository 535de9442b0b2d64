//////////////////////////////////////////////////////////////
/// numeric_io.rs
///
/// Pictured numeric output (`<#`, `#`, `#s`, `hold`, `sign`, `#>`) and
/// the counted-string helpers `count`/`type`.
///
/// Grounded in `original_source/MiniForth.c`'s `hld`-based pictured
/// numeric word set and its `count()`/`type()` primitives. See
/// DESIGN.md for the sign-handling departure from that original.
use crate::error::ErrorCode;
use crate::kernel::Cell;
use crate::runtime::ForthRuntime;

/// `<#` - begin a pictured numeric conversion: pop the value, clear the
/// hold buffer, and stash the value's sign and magnitude as the working
/// state `#`/`#s`/`sign` operate on. Unlike the stack-threaded ANS idiom
/// (which keeps the working value on the data stack and needs a
/// `dup >r ... r>` dance to preserve the sign across `#s`), the value
/// leaves the data stack here entirely - `sign` and `#>` need no
/// argument, matching the literal `n <# #s sign #> type` usage this
/// core supports.
pub fn f_less_number_sign(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let value = rt.kernel.data.pop()?;
    rt.hold_buf.clear();
    rt.pn_negative = value < 0;
    rt.pn_value = value.unsigned_abs();
    Ok(())
}

/// `#` - extract one digit (least significant, in the current base)
/// from the working value, prepending it to the hold buffer.
pub fn f_number_sign(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let base = rt.kernel.base as u64;
    let digit = (rt.pn_value % base) as u32;
    let c = std::char::from_digit(digit, base as u32).unwrap_or('?');
    rt.hold_buf.insert(0, c as u8);
    rt.pn_value /= base;
    Ok(())
}

/// `#s` - repeat `#` until the working value is exhausted. A do-while
/// loop, so `0 <# #s #>` still emits a single `0` digit.
pub fn f_number_sign_s(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    loop {
        f_number_sign(rt)?;
        if rt.pn_value == 0 {
            break;
        }
    }
    Ok(())
}

/// `hold` - insert an arbitrary character (popped as its code point)
/// into the hold buffer ahead of any digits already converted.
pub fn f_hold(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let code = rt.kernel.data.pop()?;
    rt.hold_buf.insert(0, code as u8);
    Ok(())
}

/// `sign` - insert a `-` if the value captured by `<#` was negative.
pub fn f_sign(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    if rt.pn_negative {
        rt.hold_buf.insert(0, b'-');
    }
    Ok(())
}

/// `#>` - end the conversion, leaving the finished text cached as a
/// counted string address.
pub fn f_number_sign_greater(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let text = String::from_utf8_lossy(&rt.hold_buf).into_owned();
    let addr = rt.kernel.arena.cache(&text)?;
    rt.kernel.data.push(addr as Cell)
}

/// `count` - counted string address -> (data address, length).
pub fn f_count(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let addr = rt.kernel.data.pop()? as usize;
    let len = rt.kernel.arena.string_len(addr);
    rt.kernel.data.push((addr + 1) as Cell)?;
    rt.kernel.data.push(len as Cell)
}

/// `type` - print a counted string.
pub fn f_type(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let addr = rt.kernel.data.pop()? as usize;
    print!("{}", rt.kernel.arena.get_string(addr));
    Ok(())
}

/// `.` - print the popped cell in the current base, space-terminated.
pub fn f_dot(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let value = rt.kernel.data.pop()?;
    print!("{} ", format_in_base(value, rt.kernel.base));
    Ok(())
}

/// `u.` - print the popped cell as unsigned, in the current base.
pub fn f_u_dot(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    let value = rt.kernel.data.pop()? as u64;
    print!("{} ", format_unsigned_in_base(value, rt.kernel.base));
    Ok(())
}

fn format_in_base(value: Cell, base: Cell) -> String {
    if base == 10 {
        return value.to_string();
    }
    let neg = value < 0;
    let s = format_unsigned_in_base(value.unsigned_abs(), base);
    if neg {
        format!("-{}", s)
    } else {
        s
    }
}

fn format_unsigned_in_base(mut value: u64, base: Cell) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let base = base as u64;
    let mut digits = Vec::new();
    while value > 0 {
        let d = (value % base) as u32;
        digits.push(std::char::from_digit(d, base as u32).unwrap_or('?'));
        value /= base;
    }
    digits.iter().rev().collect()
}

/// `hex` - switch the current radix to 16.
pub fn f_hex(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    rt.kernel.base = 16;
    Ok(())
}

/// `decimal` - switch the current radix back to 10.
pub fn f_decimal(rt: &mut ForthRuntime) -> Result<(), ErrorCode> {
    rt.kernel.base = 10;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pictured_output_decimal() {
        let mut rt = ForthRuntime::new();
        rt.kernel.data.push(255).unwrap();
        f_less_number_sign(&mut rt).unwrap();
        f_number_sign_s(&mut rt).unwrap();
        f_number_sign_greater(&mut rt).unwrap();
        let addr = rt.kernel.data.pop().unwrap() as usize;
        assert_eq!(rt.kernel.arena.get_string(addr), "255");
    }

    #[test]
    fn pictured_output_with_sign() {
        // -123 <# #s sign #> type -> "-123"
        let mut rt = ForthRuntime::new();
        rt.kernel.data.push(-123).unwrap();
        f_less_number_sign(&mut rt).unwrap();
        f_number_sign_s(&mut rt).unwrap();
        f_sign(&mut rt).unwrap();
        f_number_sign_greater(&mut rt).unwrap();
        let addr = rt.kernel.data.pop().unwrap() as usize;
        assert_eq!(rt.kernel.arena.get_string(addr), "-123");
        assert!(rt.kernel.data.pop().is_err());
    }

    #[test]
    fn pictured_output_zero_emits_one_digit() {
        let mut rt = ForthRuntime::new();
        rt.kernel.data.push(0).unwrap();
        f_less_number_sign(&mut rt).unwrap();
        f_number_sign_s(&mut rt).unwrap();
        f_number_sign_greater(&mut rt).unwrap();
        let addr = rt.kernel.data.pop().unwrap() as usize;
        assert_eq!(rt.kernel.arena.get_string(addr), "0");
    }

    #[test]
    fn hex_pictured_output() {
        let mut rt = ForthRuntime::new();
        f_hex(&mut rt).unwrap();
        rt.kernel.data.push(255).unwrap();
        f_less_number_sign(&mut rt).unwrap();
        f_number_sign_s(&mut rt).unwrap();
        f_number_sign_greater(&mut rt).unwrap();
        let addr = rt.kernel.data.pop().unwrap() as usize;
        assert_eq!(rt.kernel.arena.get_string(addr), "ff");
    }

    #[test]
    fn dot_prints_lowercase_hex() {
        // S8: hex $ff . decimal 255 . -> "ff 255 "
        let mut rt = ForthRuntime::new();
        f_hex(&mut rt).unwrap();
        assert_eq!(format_in_base(0xff, rt.kernel.base), "ff");
        f_decimal(&mut rt).unwrap();
        assert_eq!(format_in_base(255, rt.kernel.base), "255");
    }

    #[test]
    fn count_and_type() {
        let mut rt = ForthRuntime::new();
        let addr = rt.kernel.arena.cache("hi").unwrap();
        rt.kernel.data.push(addr as Cell).unwrap();
        f_count(&mut rt).unwrap();
        assert_eq!(rt.kernel.data.pop().unwrap(), 2);
        assert_eq!(rt.kernel.data.pop().unwrap(), (addr + 1) as Cell);
    }
}
