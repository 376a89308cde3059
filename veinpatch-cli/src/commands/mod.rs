pub mod common;
pub mod disasm;
pub mod methods;
pub mod names;
pub mod patch;
