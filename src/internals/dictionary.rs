//////////////////////////////////////////////////////////////
/// dictionary.rs
///
/// The dictionary: the table of built-in primitives, the append-only
/// list of user-defined words, and name lookup.
///
/// A dictionary entry no longer doubles as four hand-packed heap
/// cells the way the original C `Dict_t{cfa,nfa,flg,pfa}` record did -
/// `cfa` becomes the `CodeField` enum below, and each entry is a plain
/// Rust struct living in a `Vec`, not a quadruple of cells threaded
/// through the arena.
use crate::kernel::Cell;

/// How a word's body should be dispatched by the inner interpreter.
/// This is the `cfa` redesign: a tagged enum instead of a raw
/// function/code pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeField {
    /// Call a native Rust routine, identified by its index into the
    /// builtins table.
    Primitive(usize),
    /// A colon definition: `pfa` is the arena address of its first
    /// body cell, a thread of opcodes/word-references terminated by 0.
    Colon,
    /// A `variable`: `pfa` is the arena address holding its value;
    /// executing the word pushes that address.
    Variable,
    /// A `constant`: `pfa` is the arena address holding its value;
    /// executing the word pushes the value itself.
    Constant,
    /// A `create`d word with no `does>`: identical runtime behavior to
    /// `Variable` (push `pfa`), kept as a distinct tag for `see`.
    Create,
    /// A `create ... does>` word: `pfa` points at the child's own data
    /// cells, and execution also runs the defining word's captured
    /// does-body (recorded separately in `DictEntry::does_body`).
    Does,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordFlag {
    Normal,
    Immediate,
    /// Marked during `:` before `;` completes it - executing or
    /// finding it as a call target is an error.
    Undefined,
}

/// One dictionary entry. `name_addr` is a counted string living in the
/// arena's string region.
#[derive(Debug, Clone)]
pub struct DictEntry {
    pub name_addr: usize,
    pub cfa: CodeField,
    pub flag: WordFlag,
    pub pfa: Option<usize>,
    /// For `Does` words: the arena address of the defining word's
    /// captured do-body (the cells copied in by `does>`/deferred-does>).
    pub does_body: Option<usize>,
}

/// A reference to something the compiler or interpreter can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordRef {
    User(usize),
    Builtin(usize),
}

pub type BuiltinFn = fn(&mut crate::runtime::ForthRuntime) -> Result<(), crate::error::ErrorCode>;

#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub code: BuiltinFn,
    pub doc: &'static str,
    pub immediate: bool,
}

pub struct Dictionary {
    pub builtins: Vec<Builtin>,
    pub words: Vec<DictEntry>,
}

impl Dictionary {
    pub fn new() -> Dictionary {
        Dictionary { builtins: Vec::new(), words: Vec::new() }
    }

    pub fn add_builtin(&mut self, name: &'static str, code: BuiltinFn, doc: &'static str, immediate: bool) -> usize {
        self.builtins.push(Builtin { name, code, doc, immediate });
        self.builtins.len() - 1
    }

    pub fn builtin_index(&self, name: &str) -> Option<usize> {
        self.builtins.iter().position(|b| b.name == name)
    }

    /// Newest-first lookup across user words, falling back to
    /// primitives. Later definitions of the same name shadow earlier
    /// ones.
    pub fn lookup(&self, name: &str, arena: &crate::kernel::Arena) -> Option<WordRef> {
        for (ix, entry) in self.words.iter().enumerate().rev() {
            if entry.flag == WordFlag::Undefined {
                continue;
            }
            if arena.get_string(entry.name_addr) == name {
                return Some(WordRef::User(ix));
            }
        }
        self.builtin_index(name).map(WordRef::Builtin)
    }

    pub fn is_immediate(&self, r: WordRef) -> bool {
        match r {
            WordRef::User(ix) => self.words[ix].flag == WordFlag::Immediate,
            WordRef::Builtin(ix) => self.builtins[ix].immediate,
        }
    }

    /// `words` - list every name currently visible, newest first, used
    /// by the `words` introspection primitive and by `see`.
    pub fn names(&self, arena: &crate::kernel::Arena) -> Vec<String> {
        let mut out: Vec<String> = self.words.iter().rev().map(|e| arena.get_string(e.name_addr)).collect();
        out.extend(self.builtins.iter().map(|b| b.name.to_string()));
        out
    }

    /// Truncate the user dictionary back to `len` entries - used by a
    /// cold reset alongside `Arena::forget`.
    pub fn truncate(&mut self, len: usize) {
        self.words.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

/// Pack a `WordRef` into a thread cell. User indices are offset by one
/// so that a reference to user word 0 never collides with the `0`
/// colon-body terminator (`opcodes::OP_TERMINATE`); builtin indices are
/// tagged with a high bit so they never collide with a user index or
/// with a negative opcode constant (see `internals::control` and
/// `internals::inner` for the opcode constants, all of which are < 0).
const BUILTIN_TAG: Cell = 1 << 48;

pub fn encode_word_ref(r: WordRef) -> Cell {
    match r {
        WordRef::User(ix) => ix as Cell + 1,
        WordRef::Builtin(ix) => BUILTIN_TAG | (ix as Cell),
    }
}

pub fn decode_word_ref(cell: Cell) -> WordRef {
    if cell & BUILTIN_TAG != 0 {
        WordRef::Builtin((cell & (BUILTIN_TAG - 1)) as usize)
    } else {
        WordRef::User((cell - 1) as usize)
    }
}

/// True for any cell that is a valid, non-zero word reference -
/// distinguishes a dictionary-pointer cell from `OP_TERMINATE` (0) and
/// from the negative opcode constants in `internals::opcodes`.
pub fn is_word_ref(cell: Cell) -> bool {
    cell > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Arena;

    fn noop(_rt: &mut crate::runtime::ForthRuntime) -> Result<(), crate::error::ErrorCode> {
        Ok(())
    }

    #[test]
    fn lookup_prefers_newest_user_word() {
        let mut arena = Arena::new();
        let mut dict = Dictionary::new();
        dict.add_builtin("dup", noop, "duplicate tos", false);
        let n1 = arena.cache("foo").unwrap();
        dict.words.push(DictEntry { name_addr: n1, cfa: CodeField::Colon, flag: WordFlag::Normal, pfa: Some(0), does_body: None });
        let n2 = arena.cache("foo").unwrap();
        dict.words.push(DictEntry { name_addr: n2, cfa: CodeField::Colon, flag: WordFlag::Normal, pfa: Some(10), does_body: None });
        match dict.lookup("foo", &arena) {
            Some(WordRef::User(ix)) => assert_eq!(ix, 1),
            other => panic!("expected newest user word, got {:?}", other),
        }
    }

    #[test]
    fn lookup_falls_back_to_builtin() {
        let arena = Arena::new();
        let mut dict = Dictionary::new();
        dict.add_builtin("dup", noop, "duplicate tos", false);
        assert_eq!(dict.lookup("dup", &arena), Some(WordRef::Builtin(0)));
    }

    #[test]
    fn word_ref_roundtrip() {
        assert_eq!(decode_word_ref(encode_word_ref(WordRef::User(7))), WordRef::User(7));
        assert_eq!(decode_word_ref(encode_word_ref(WordRef::Builtin(3))), WordRef::Builtin(3));
    }

    #[test]
    fn undefined_word_is_invisible_to_lookup() {
        let mut arena = Arena::new();
        let mut dict = Dictionary::new();
        let n = arena.cache("partial").unwrap();
        dict.words.push(DictEntry { name_addr: n, cfa: CodeField::Colon, flag: WordFlag::Undefined, pfa: Some(0), does_body: None });
        assert_eq!(dict.lookup("partial", &arena), None);
    }
}
