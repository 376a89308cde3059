//! An ordered, index-addressed instruction sequence.

use std::ops::Index;

use crate::assembly::Instruction;

/// The instructions of one method body.
///
/// Insertion and removal keep every branch target inside the list pointing at the same
/// instruction it pointed at before.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionList {
    items: Vec<Instruction>,
}

impl InstructionList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        InstructionList { items: Vec::new() }
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Instruction at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.items.get(index)
    }

    /// Iterate over the instructions in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.items.iter()
    }

    /// Borrow the instructions as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Instruction] {
        &self.items
    }

    /// Insert `sequence` so that its first instruction ends up at `at`.
    ///
    /// Targets at or after `at` move along with the instructions they point to, so code that
    /// jumped to the instruction previously at `at` still reaches it, not the new sequence.
    pub fn insert_all(&mut self, at: usize, sequence: Vec<Instruction>) {
        let count = sequence.len();
        for instruction in &mut self.items {
            for target in instruction.targets_mut() {
                if *target >= at {
                    *target += count;
                }
            }
        }
        self.items.splice(at..at, sequence);
    }

    /// Remove the instruction at `at`, moving targets after it down by one.
    ///
    /// Callers must make sure nothing targets `at`; see [`InstructionList::is_branch_target`].
    pub fn remove(&mut self, at: usize) -> Instruction {
        let removed = self.items.remove(at);
        for instruction in &mut self.items {
            for target in instruction.targets_mut() {
                if *target > at {
                    *target -= 1;
                }
            }
        }
        removed
    }

    /// Whether any branch or switch in the list targets `index`.
    #[must_use]
    pub fn is_branch_target(&self, index: usize) -> bool {
        self.items
            .iter()
            .any(|instruction| instruction.branch_targets().contains(&index))
    }
}

impl Index<usize> for InstructionList {
    type Output = Instruction;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

impl From<Vec<Instruction>> for InstructionList {
    fn from(items: Vec<Instruction>) -> Self {
        InstructionList { items }
    }
}

impl<'a> IntoIterator for &'a InstructionList {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::opcodes;

    fn nop() -> Instruction {
        Instruction::Other {
            opcode: opcodes::NOP,
            operands: vec![],
        }
    }

    fn goto(target: usize) -> Instruction {
        Instruction::Jump {
            opcode: opcodes::GOTO,
            target,
        }
    }

    #[test]
    fn insert_shifts_targets() {
        let mut list = InstructionList::from(vec![goto(2), goto(0), Instruction::Pop]);
        list.insert_all(1, vec![nop(), nop()]);

        assert_eq!(list.len(), 5);
        assert_eq!(list[0], goto(4));
        assert_eq!(list[3], goto(0));
        assert!(list[1].is_nop());
    }

    #[test]
    fn insert_at_target_keeps_target_on_original() {
        let mut list = InstructionList::from(vec![goto(1), Instruction::Pop]);
        list.insert_all(1, vec![nop()]);
        assert_eq!(list[0], goto(2));
        assert_eq!(list[2], Instruction::Pop);
    }

    #[test]
    fn remove_shifts_targets() {
        let mut list = InstructionList::from(vec![goto(3), nop(), Instruction::Pop, nop()]);
        assert!(!list.is_branch_target(2));
        assert_eq!(list.remove(2), Instruction::Pop);
        assert_eq!(list[0], goto(2));
        assert!(list.is_branch_target(2));
    }
}
