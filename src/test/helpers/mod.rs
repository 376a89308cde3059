//! Helper functions for inspecting classes in tests.

use crate::{
    assembly::{Instruction, StackAnalysis},
    classfile::{ClassFile, Code},
};

/// The body of the first method called `name`.
pub fn method_code<'a>(class: &'a ClassFile, name: &str) -> &'a Code {
    let position = class
        .method_position(name, None)
        .unwrap_or_else(|| panic!("no method {name}"));
    class.methods[position]
        .code()
        .unwrap_or_else(|| panic!("{name} has no code"))
}

/// Simulated stack depth on entry to every reachable return instruction, in order.
pub fn return_depths(class: &ClassFile, name: &str) -> Vec<u16> {
    let code = method_code(class, name);
    let analysis = StackAnalysis::run(code, &class.pool, name).unwrap();
    code.instructions
        .iter()
        .zip(&analysis.depths)
        .filter(|(instruction, _)| matches!(instruction, Instruction::Return { .. }))
        .filter_map(|(_, depth)| *depth)
        .collect()
}

/// Every local variable slot an instruction of `code` touches.
pub fn referenced_slots(code: &Code) -> Vec<u16> {
    let mut slots: Vec<u16> = code
        .instructions
        .iter()
        .filter_map(Instruction::local_access)
        .flat_map(|(index, width)| index..index + width)
        .collect();
    slots.sort_unstable();
    slots.dedup();
    slots
}
