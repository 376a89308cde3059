//! Recomputing method metadata after splicing.

use log::debug;

use crate::{
    assembly::{encode, StackAnalysis},
    classfile::{Code, ConstantPool, Method},
    Result,
};

/// Method metadata after re-encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Maxima {
    /// Recomputed `max_stack`
    pub max_stack: u16,
    /// Recomputed `max_locals`
    pub max_locals: u16,
    /// Length of the encoded code array
    pub code_length: usize,
}

/// Recompute `max_stack` and `max_locals` of `code`, the (possibly modified) body of `method`.
///
/// `max_stack` is replaced by the simulated maximum. `max_locals` never shrinks and covers every
/// slot an instruction touches. The body is also encoded once, so a splice whose branches no
/// longer fit fails here rather than when the class is written.
///
/// # Errors
/// - [`crate::Error::StackUnderflow`] or [`crate::Error::Consistency`] from the stack simulation
/// - [`crate::Error::BranchOutOfRange`] or [`crate::Error::Malformed`] from encoding
/// - [`crate::Error::InvalidDescriptor`] if the method descriptor cannot be parsed
pub fn reencode(code: &mut Code, pool: &ConstantPool, method: &Method) -> Result<Maxima> {
    let analysis = StackAnalysis::run(code, pool, &method.name)?;
    let encoded = encode(&code.instructions, &method.name)?;

    code.max_stack = analysis.max_stack;
    code.max_locals = code.local_watermark(method.parameter_slots()?);

    debug!(
        "{}: max_stack {}, max_locals {}, {} bytes of code",
        method.name,
        code.max_stack,
        code.max_locals,
        encoded.bytes.len()
    );

    Ok(Maxima {
        max_stack: code.max_stack,
        max_locals: code.max_locals,
        code_length: encoded.bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assembly::Instruction,
        classfile::{ClassFile, ValueKind},
        test::factories::item_in_world_manager,
        Error,
    };

    fn target(class: &ClassFile) -> &Method {
        let position = class.method_position("uncheckedTryHarvestBlock", None).unwrap();
        &class.methods[position]
    }

    #[test]
    fn untouched_method_keeps_maxima() {
        let class = ClassFile::from_mem(&item_in_world_manager().build()).unwrap();
        let method = target(&class);
        let mut code = method.code().unwrap().clone();

        let maxima = reencode(&mut code, &class.pool, method).unwrap();
        assert_eq!(maxima.max_stack, 4);
        assert_eq!(maxima.max_locals, 4);
        assert_eq!(maxima.code_length, 9);
        assert_eq!(&code, method.code().unwrap());
    }

    #[test]
    fn grows_with_new_locals() {
        let class = ClassFile::from_mem(&item_in_world_manager().build()).unwrap();
        let method = target(&class);
        let mut code = method.code().unwrap().clone();
        code.insert(
            5,
            vec![
                Instruction::Other {
                    opcode: crate::assembly::opcodes::DUP,
                    operands: vec![],
                },
                Instruction::StoreLocal {
                    index: 9,
                    kind: ValueKind::Int,
                },
            ],
        );
        let maxima = reencode(&mut code, &class.pool, method).unwrap();
        assert_eq!(maxima.max_locals, 10);
        assert_eq!(maxima.max_stack, 4);
    }

    #[test]
    fn underflow_is_reported() {
        let class = ClassFile::from_mem(&item_in_world_manager().build()).unwrap();
        let method = target(&class);
        let mut code = method.code().unwrap().clone();
        code.insert(0, vec![Instruction::Pop]);

        assert!(matches!(
            reencode(&mut code, &class.pool, method),
            Err(Error::StackUnderflow { index: 0, .. })
        ));
    }
}
