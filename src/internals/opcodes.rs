//////////////////////////////////////////////////////////////
/// opcodes.rs
///
/// The small set of non-word thread cells the inner interpreter
/// recognizes directly, instead of treating them as a dictionary
/// reference. These are negative so they can never collide with a
/// `WordRef` encoding (always non-negative - see
/// `internals::dictionary::encode_word_ref`), and 0 is reserved as the
/// colon-body terminator: every thread is terminated by a null cell.
use crate::kernel::Cell;

pub const OP_TERMINATE: Cell = 0;
pub const OP_LITERAL: Cell = -1;
pub const OP_STRLIT: Cell = -2;
pub const OP_BRANCH: Cell = -3;
pub const OP_QBRANCH: Cell = -4;
pub const OP_DO: Cell = -5;
/// Unlike `OP_DO`, `?do` needs a forward target for the zero-trip
/// skip: the cell right after `OP_QDO` holds the post-loop address,
/// patched by the matching `loop`/`+loop` exactly like a `leave`
/// branch - see `internals::control::f_qdo`.
pub const OP_QDO: Cell = -6;
pub const OP_LOOP: Cell = -7;
pub const OP_PLOOP: Cell = -8;
pub const OP_EXIT: Cell = -9;
/// Compiled by `does>` into the body of a `create`d word's defining
/// word. At runtime (executed once per child, at create-time) it
/// retargets the most-recently-created word to `CodeField::Does` with
/// its `does_body` set to the cell right after this opcode, then
/// returns from the defining word early - see `internals::inner`.
pub const OP_DOES: Cell = -10;

/// Placeholder written by `>mark` into a not-yet-patched branch
/// target slot. If the inner interpreter ever tries to read this as
/// an executable opcode (a malformed compile left a mark unresolved)
/// it throws `ErrorCode::Unresolved`.
pub const OP_UNRESOLVED: Cell = Cell::MIN;
