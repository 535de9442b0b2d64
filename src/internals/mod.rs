pub mod arith_words;
pub mod compiler;
pub mod control;
pub mod debug;
pub mod dictionary;
pub mod files;
pub mod inner;
pub mod io_words;
pub mod numeric_io;
pub mod opcodes;
pub mod parsing;
pub mod reset;
pub mod stack_words;
pub mod terminal;
pub mod tui;
