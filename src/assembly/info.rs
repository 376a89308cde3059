//! Static per-opcode metadata: mnemonic, operand layout, stack effect and control flow.
//!
//! Stack effects are counted in slots, so `long` and `double` values count twice. Opcodes
//! whose effect depends on a constant pool entry or an operand (field access, invocations,
//! `multianewarray`, `wide`) carry [`VARIABLE`] and are resolved by [`crate::assembly::stack`].

use crate::{assembly::opcodes, classfile::ValueKind};

/// Marker for stack effects that cannot be read from the table alone.
pub const VARIABLE: u8 = u8::MAX;

/// How the operand bytes following an opcode are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandLayout {
    /// No operand bytes
    None,
    /// A fixed number of operand bytes
    Fixed(u8),
    /// Signed 16-bit branch offset
    Branch16,
    /// Signed 32-bit branch offset
    Branch32,
    /// Padding, default, low, high and jump offsets
    TableSwitch,
    /// Padding, default, pair count and match/offset pairs
    LookupSwitch,
    /// Modified opcode followed by a 16-bit local index (and a 16-bit constant for `iinc`)
    Wide,
}

/// How an instruction affects control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    /// Execution continues with the next instruction
    Sequential,
    /// Either branches or continues with the next instruction
    ConditionalBranch,
    /// Always branches
    UnconditionalBranch,
    /// Jumps to a subroutine, pushing the return address (`jsr`, `jsr_w`)
    Subroutine,
    /// Returns from a subroutine (`ret`)
    SubroutineReturn,
    /// Multi-way branch
    Switch,
    /// Returns from the method
    Return,
    /// Throws an exception
    Throw,
}

/// Metadata of a single opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    /// Assembler mnemonic
    pub mnemonic: &'static str,
    /// Operand layout
    pub operands: OperandLayout,
    /// Slots popped, or [`VARIABLE`]
    pub pops: u8,
    /// Slots pushed, or [`VARIABLE`]
    pub pushes: u8,
    /// Control flow behaviour
    pub flow: FlowType,
}

const fn op(
    mnemonic: &'static str,
    operands: OperandLayout,
    pops: u8,
    pushes: u8,
    flow: FlowType,
) -> OpcodeInfo {
    OpcodeInfo {
        mnemonic,
        operands,
        pops,
        pushes,
        flow,
    }
}

/// Metadata for opcodes `0x00` through `0xC9`, indexed by opcode.
#[rustfmt::skip]
pub static OPCODES: [OpcodeInfo; 0xCA] = [
    op("nop", OperandLayout::None, 0, 0, FlowType::Sequential), // 0x00
    op("aconst_null", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x01
    op("iconst_m1", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x02
    op("iconst_0", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x03
    op("iconst_1", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x04
    op("iconst_2", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x05
    op("iconst_3", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x06
    op("iconst_4", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x07
    op("iconst_5", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x08
    op("lconst_0", OperandLayout::None, 0, 2, FlowType::Sequential), // 0x09
    op("lconst_1", OperandLayout::None, 0, 2, FlowType::Sequential), // 0x0A
    op("fconst_0", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x0B
    op("fconst_1", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x0C
    op("fconst_2", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x0D
    op("dconst_0", OperandLayout::None, 0, 2, FlowType::Sequential), // 0x0E
    op("dconst_1", OperandLayout::None, 0, 2, FlowType::Sequential), // 0x0F
    op("bipush", OperandLayout::Fixed(1), 0, 1, FlowType::Sequential), // 0x10
    op("sipush", OperandLayout::Fixed(2), 0, 1, FlowType::Sequential), // 0x11
    op("ldc", OperandLayout::Fixed(1), 0, 1, FlowType::Sequential), // 0x12
    op("ldc_w", OperandLayout::Fixed(2), 0, 1, FlowType::Sequential), // 0x13
    op("ldc2_w", OperandLayout::Fixed(2), 0, 2, FlowType::Sequential), // 0x14
    op("iload", OperandLayout::Fixed(1), 0, 1, FlowType::Sequential), // 0x15
    op("lload", OperandLayout::Fixed(1), 0, 2, FlowType::Sequential), // 0x16
    op("fload", OperandLayout::Fixed(1), 0, 1, FlowType::Sequential), // 0x17
    op("dload", OperandLayout::Fixed(1), 0, 2, FlowType::Sequential), // 0x18
    op("aload", OperandLayout::Fixed(1), 0, 1, FlowType::Sequential), // 0x19
    op("iload_0", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x1A
    op("iload_1", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x1B
    op("iload_2", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x1C
    op("iload_3", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x1D
    op("lload_0", OperandLayout::None, 0, 2, FlowType::Sequential), // 0x1E
    op("lload_1", OperandLayout::None, 0, 2, FlowType::Sequential), // 0x1F
    op("lload_2", OperandLayout::None, 0, 2, FlowType::Sequential), // 0x20
    op("lload_3", OperandLayout::None, 0, 2, FlowType::Sequential), // 0x21
    op("fload_0", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x22
    op("fload_1", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x23
    op("fload_2", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x24
    op("fload_3", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x25
    op("dload_0", OperandLayout::None, 0, 2, FlowType::Sequential), // 0x26
    op("dload_1", OperandLayout::None, 0, 2, FlowType::Sequential), // 0x27
    op("dload_2", OperandLayout::None, 0, 2, FlowType::Sequential), // 0x28
    op("dload_3", OperandLayout::None, 0, 2, FlowType::Sequential), // 0x29
    op("aload_0", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x2A
    op("aload_1", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x2B
    op("aload_2", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x2C
    op("aload_3", OperandLayout::None, 0, 1, FlowType::Sequential), // 0x2D
    op("iaload", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x2E
    op("laload", OperandLayout::None, 2, 2, FlowType::Sequential), // 0x2F
    op("faload", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x30
    op("daload", OperandLayout::None, 2, 2, FlowType::Sequential), // 0x31
    op("aaload", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x32
    op("baload", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x33
    op("caload", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x34
    op("saload", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x35
    op("istore", OperandLayout::Fixed(1), 1, 0, FlowType::Sequential), // 0x36
    op("lstore", OperandLayout::Fixed(1), 2, 0, FlowType::Sequential), // 0x37
    op("fstore", OperandLayout::Fixed(1), 1, 0, FlowType::Sequential), // 0x38
    op("dstore", OperandLayout::Fixed(1), 2, 0, FlowType::Sequential), // 0x39
    op("astore", OperandLayout::Fixed(1), 1, 0, FlowType::Sequential), // 0x3A
    op("istore_0", OperandLayout::None, 1, 0, FlowType::Sequential), // 0x3B
    op("istore_1", OperandLayout::None, 1, 0, FlowType::Sequential), // 0x3C
    op("istore_2", OperandLayout::None, 1, 0, FlowType::Sequential), // 0x3D
    op("istore_3", OperandLayout::None, 1, 0, FlowType::Sequential), // 0x3E
    op("lstore_0", OperandLayout::None, 2, 0, FlowType::Sequential), // 0x3F
    op("lstore_1", OperandLayout::None, 2, 0, FlowType::Sequential), // 0x40
    op("lstore_2", OperandLayout::None, 2, 0, FlowType::Sequential), // 0x41
    op("lstore_3", OperandLayout::None, 2, 0, FlowType::Sequential), // 0x42
    op("fstore_0", OperandLayout::None, 1, 0, FlowType::Sequential), // 0x43
    op("fstore_1", OperandLayout::None, 1, 0, FlowType::Sequential), // 0x44
    op("fstore_2", OperandLayout::None, 1, 0, FlowType::Sequential), // 0x45
    op("fstore_3", OperandLayout::None, 1, 0, FlowType::Sequential), // 0x46
    op("dstore_0", OperandLayout::None, 2, 0, FlowType::Sequential), // 0x47
    op("dstore_1", OperandLayout::None, 2, 0, FlowType::Sequential), // 0x48
    op("dstore_2", OperandLayout::None, 2, 0, FlowType::Sequential), // 0x49
    op("dstore_3", OperandLayout::None, 2, 0, FlowType::Sequential), // 0x4A
    op("astore_0", OperandLayout::None, 1, 0, FlowType::Sequential), // 0x4B
    op("astore_1", OperandLayout::None, 1, 0, FlowType::Sequential), // 0x4C
    op("astore_2", OperandLayout::None, 1, 0, FlowType::Sequential), // 0x4D
    op("astore_3", OperandLayout::None, 1, 0, FlowType::Sequential), // 0x4E
    op("iastore", OperandLayout::None, 3, 0, FlowType::Sequential), // 0x4F
    op("lastore", OperandLayout::None, 4, 0, FlowType::Sequential), // 0x50
    op("fastore", OperandLayout::None, 3, 0, FlowType::Sequential), // 0x51
    op("dastore", OperandLayout::None, 4, 0, FlowType::Sequential), // 0x52
    op("aastore", OperandLayout::None, 3, 0, FlowType::Sequential), // 0x53
    op("bastore", OperandLayout::None, 3, 0, FlowType::Sequential), // 0x54
    op("castore", OperandLayout::None, 3, 0, FlowType::Sequential), // 0x55
    op("sastore", OperandLayout::None, 3, 0, FlowType::Sequential), // 0x56
    op("pop", OperandLayout::None, 1, 0, FlowType::Sequential), // 0x57
    op("pop2", OperandLayout::None, 2, 0, FlowType::Sequential), // 0x58
    op("dup", OperandLayout::None, 1, 2, FlowType::Sequential), // 0x59
    op("dup_x1", OperandLayout::None, 2, 3, FlowType::Sequential), // 0x5A
    op("dup_x2", OperandLayout::None, 3, 4, FlowType::Sequential), // 0x5B
    op("dup2", OperandLayout::None, 2, 4, FlowType::Sequential), // 0x5C
    op("dup2_x1", OperandLayout::None, 3, 5, FlowType::Sequential), // 0x5D
    op("dup2_x2", OperandLayout::None, 4, 6, FlowType::Sequential), // 0x5E
    op("swap", OperandLayout::None, 2, 2, FlowType::Sequential), // 0x5F
    op("iadd", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x60
    op("ladd", OperandLayout::None, 4, 2, FlowType::Sequential), // 0x61
    op("fadd", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x62
    op("dadd", OperandLayout::None, 4, 2, FlowType::Sequential), // 0x63
    op("isub", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x64
    op("lsub", OperandLayout::None, 4, 2, FlowType::Sequential), // 0x65
    op("fsub", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x66
    op("dsub", OperandLayout::None, 4, 2, FlowType::Sequential), // 0x67
    op("imul", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x68
    op("lmul", OperandLayout::None, 4, 2, FlowType::Sequential), // 0x69
    op("fmul", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x6A
    op("dmul", OperandLayout::None, 4, 2, FlowType::Sequential), // 0x6B
    op("idiv", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x6C
    op("ldiv", OperandLayout::None, 4, 2, FlowType::Sequential), // 0x6D
    op("fdiv", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x6E
    op("ddiv", OperandLayout::None, 4, 2, FlowType::Sequential), // 0x6F
    op("irem", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x70
    op("lrem", OperandLayout::None, 4, 2, FlowType::Sequential), // 0x71
    op("frem", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x72
    op("drem", OperandLayout::None, 4, 2, FlowType::Sequential), // 0x73
    op("ineg", OperandLayout::None, 1, 1, FlowType::Sequential), // 0x74
    op("lneg", OperandLayout::None, 2, 2, FlowType::Sequential), // 0x75
    op("fneg", OperandLayout::None, 1, 1, FlowType::Sequential), // 0x76
    op("dneg", OperandLayout::None, 2, 2, FlowType::Sequential), // 0x77
    op("ishl", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x78
    op("lshl", OperandLayout::None, 3, 2, FlowType::Sequential), // 0x79
    op("ishr", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x7A
    op("lshr", OperandLayout::None, 3, 2, FlowType::Sequential), // 0x7B
    op("iushr", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x7C
    op("lushr", OperandLayout::None, 3, 2, FlowType::Sequential), // 0x7D
    op("iand", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x7E
    op("land", OperandLayout::None, 4, 2, FlowType::Sequential), // 0x7F
    op("ior", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x80
    op("lor", OperandLayout::None, 4, 2, FlowType::Sequential), // 0x81
    op("ixor", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x82
    op("lxor", OperandLayout::None, 4, 2, FlowType::Sequential), // 0x83
    op("iinc", OperandLayout::Fixed(2), 0, 0, FlowType::Sequential), // 0x84
    op("i2l", OperandLayout::None, 1, 2, FlowType::Sequential), // 0x85
    op("i2f", OperandLayout::None, 1, 1, FlowType::Sequential), // 0x86
    op("i2d", OperandLayout::None, 1, 2, FlowType::Sequential), // 0x87
    op("l2i", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x88
    op("l2f", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x89
    op("l2d", OperandLayout::None, 2, 2, FlowType::Sequential), // 0x8A
    op("f2i", OperandLayout::None, 1, 1, FlowType::Sequential), // 0x8B
    op("f2l", OperandLayout::None, 1, 2, FlowType::Sequential), // 0x8C
    op("f2d", OperandLayout::None, 1, 2, FlowType::Sequential), // 0x8D
    op("d2i", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x8E
    op("d2l", OperandLayout::None, 2, 2, FlowType::Sequential), // 0x8F
    op("d2f", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x90
    op("i2b", OperandLayout::None, 1, 1, FlowType::Sequential), // 0x91
    op("i2c", OperandLayout::None, 1, 1, FlowType::Sequential), // 0x92
    op("i2s", OperandLayout::None, 1, 1, FlowType::Sequential), // 0x93
    op("lcmp", OperandLayout::None, 4, 1, FlowType::Sequential), // 0x94
    op("fcmpl", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x95
    op("fcmpg", OperandLayout::None, 2, 1, FlowType::Sequential), // 0x96
    op("dcmpl", OperandLayout::None, 4, 1, FlowType::Sequential), // 0x97
    op("dcmpg", OperandLayout::None, 4, 1, FlowType::Sequential), // 0x98
    op("ifeq", OperandLayout::Branch16, 1, 0, FlowType::ConditionalBranch), // 0x99
    op("ifne", OperandLayout::Branch16, 1, 0, FlowType::ConditionalBranch), // 0x9A
    op("iflt", OperandLayout::Branch16, 1, 0, FlowType::ConditionalBranch), // 0x9B
    op("ifge", OperandLayout::Branch16, 1, 0, FlowType::ConditionalBranch), // 0x9C
    op("ifgt", OperandLayout::Branch16, 1, 0, FlowType::ConditionalBranch), // 0x9D
    op("ifle", OperandLayout::Branch16, 1, 0, FlowType::ConditionalBranch), // 0x9E
    op("if_icmpeq", OperandLayout::Branch16, 2, 0, FlowType::ConditionalBranch), // 0x9F
    op("if_icmpne", OperandLayout::Branch16, 2, 0, FlowType::ConditionalBranch), // 0xA0
    op("if_icmplt", OperandLayout::Branch16, 2, 0, FlowType::ConditionalBranch), // 0xA1
    op("if_icmpge", OperandLayout::Branch16, 2, 0, FlowType::ConditionalBranch), // 0xA2
    op("if_icmpgt", OperandLayout::Branch16, 2, 0, FlowType::ConditionalBranch), // 0xA3
    op("if_icmple", OperandLayout::Branch16, 2, 0, FlowType::ConditionalBranch), // 0xA4
    op("if_acmpeq", OperandLayout::Branch16, 2, 0, FlowType::ConditionalBranch), // 0xA5
    op("if_acmpne", OperandLayout::Branch16, 2, 0, FlowType::ConditionalBranch), // 0xA6
    op("goto", OperandLayout::Branch16, 0, 0, FlowType::UnconditionalBranch), // 0xA7
    op("jsr", OperandLayout::Branch16, 0, 1, FlowType::Subroutine), // 0xA8
    op("ret", OperandLayout::Fixed(1), 0, 0, FlowType::SubroutineReturn), // 0xA9
    op("tableswitch", OperandLayout::TableSwitch, 1, 0, FlowType::Switch), // 0xAA
    op("lookupswitch", OperandLayout::LookupSwitch, 1, 0, FlowType::Switch), // 0xAB
    op("ireturn", OperandLayout::None, 1, 0, FlowType::Return), // 0xAC
    op("lreturn", OperandLayout::None, 2, 0, FlowType::Return), // 0xAD
    op("freturn", OperandLayout::None, 1, 0, FlowType::Return), // 0xAE
    op("dreturn", OperandLayout::None, 2, 0, FlowType::Return), // 0xAF
    op("areturn", OperandLayout::None, 1, 0, FlowType::Return), // 0xB0
    op("return", OperandLayout::None, 0, 0, FlowType::Return), // 0xB1
    op("getstatic", OperandLayout::Fixed(2), VARIABLE, VARIABLE, FlowType::Sequential), // 0xB2
    op("putstatic", OperandLayout::Fixed(2), VARIABLE, VARIABLE, FlowType::Sequential), // 0xB3
    op("getfield", OperandLayout::Fixed(2), VARIABLE, VARIABLE, FlowType::Sequential), // 0xB4
    op("putfield", OperandLayout::Fixed(2), VARIABLE, VARIABLE, FlowType::Sequential), // 0xB5
    op("invokevirtual", OperandLayout::Fixed(2), VARIABLE, VARIABLE, FlowType::Sequential), // 0xB6
    op("invokespecial", OperandLayout::Fixed(2), VARIABLE, VARIABLE, FlowType::Sequential), // 0xB7
    op("invokestatic", OperandLayout::Fixed(2), VARIABLE, VARIABLE, FlowType::Sequential), // 0xB8
    op("invokeinterface", OperandLayout::Fixed(4), VARIABLE, VARIABLE, FlowType::Sequential), // 0xB9
    op("invokedynamic", OperandLayout::Fixed(4), VARIABLE, VARIABLE, FlowType::Sequential), // 0xBA
    op("new", OperandLayout::Fixed(2), 0, 1, FlowType::Sequential), // 0xBB
    op("newarray", OperandLayout::Fixed(1), 1, 1, FlowType::Sequential), // 0xBC
    op("anewarray", OperandLayout::Fixed(2), 1, 1, FlowType::Sequential), // 0xBD
    op("arraylength", OperandLayout::None, 1, 1, FlowType::Sequential), // 0xBE
    op("athrow", OperandLayout::None, 1, 0, FlowType::Throw), // 0xBF
    op("checkcast", OperandLayout::Fixed(2), 1, 1, FlowType::Sequential), // 0xC0
    op("instanceof", OperandLayout::Fixed(2), 1, 1, FlowType::Sequential), // 0xC1
    op("monitorenter", OperandLayout::None, 1, 0, FlowType::Sequential), // 0xC2
    op("monitorexit", OperandLayout::None, 1, 0, FlowType::Sequential), // 0xC3
    op("wide", OperandLayout::Wide, VARIABLE, VARIABLE, FlowType::Sequential), // 0xC4
    op("multianewarray", OperandLayout::Fixed(3), VARIABLE, 1, FlowType::Sequential), // 0xC5
    op("ifnull", OperandLayout::Branch16, 1, 0, FlowType::ConditionalBranch), // 0xC6
    op("ifnonnull", OperandLayout::Branch16, 1, 0, FlowType::ConditionalBranch), // 0xC7
    op("goto_w", OperandLayout::Branch32, 0, 0, FlowType::UnconditionalBranch), // 0xC8
    op("jsr_w", OperandLayout::Branch32, 0, 1, FlowType::Subroutine), // 0xC9
];

/// Look up an opcode, returning `None` for reserved and undefined bytes.
#[must_use]
pub fn opcode_info(opcode: u8) -> Option<&'static OpcodeInfo> {
    OPCODES.get(usize::from(opcode))
}

/// Opcode of the `<x>load` form with a one byte index operand.
#[must_use]
pub fn load_opcode(kind: ValueKind) -> u8 {
    opcodes::ILOAD + kind_offset(kind)
}

/// Opcode of the `<x>load_0` short form; `_1` to `_3` follow it.
#[must_use]
pub fn load_short_opcode(kind: ValueKind) -> u8 {
    opcodes::ILOAD_0 + 4 * kind_offset(kind)
}

/// Opcode of the `<x>store` form with a one byte index operand.
#[must_use]
pub fn store_opcode(kind: ValueKind) -> u8 {
    opcodes::ISTORE + kind_offset(kind)
}

/// Opcode of the `<x>store_0` short form; `_1` to `_3` follow it.
#[must_use]
pub fn store_short_opcode(kind: ValueKind) -> u8 {
    opcodes::ISTORE_0 + 4 * kind_offset(kind)
}

/// Opcode returning a value of `kind`, or `return` for void.
#[must_use]
pub fn return_opcode(kind: Option<ValueKind>) -> u8 {
    match kind {
        Some(kind) => opcodes::IRETURN + kind_offset(kind),
        None => opcodes::RETURN,
    }
}

/// The local variable access performed by a load/store opcode.
///
/// Returns the value kind, whether the opcode stores, and the implicit index of short forms.
#[must_use]
pub fn local_opcode(opcode: u8) -> Option<(ValueKind, bool, Option<u16>)> {
    match opcode {
        opcodes::ILOAD..=opcodes::ALOAD => Some((kind_at(opcode - opcodes::ILOAD), false, None)),
        opcodes::ILOAD_0..=opcodes::ALOAD_3 => {
            let relative = opcode - opcodes::ILOAD_0;
            Some((kind_at(relative / 4), false, Some(u16::from(relative % 4))))
        }
        opcodes::ISTORE..=opcodes::ASTORE => {
            Some((kind_at(opcode - opcodes::ISTORE), true, None))
        }
        opcodes::ISTORE_0..=opcodes::ASTORE_3 => {
            let relative = opcode - opcodes::ISTORE_0;
            Some((kind_at(relative / 4), true, Some(u16::from(relative % 4))))
        }
        _ => None,
    }
}

/// The value kind returned by a return opcode; `Some(None)` for `return`.
#[must_use]
pub fn return_kind(opcode: u8) -> Option<Option<ValueKind>> {
    match opcode {
        opcodes::IRETURN..=opcodes::ARETURN => Some(Some(kind_at(opcode - opcodes::IRETURN))),
        opcodes::RETURN => Some(None),
        _ => None,
    }
}

fn kind_offset(kind: ValueKind) -> u8 {
    match kind {
        ValueKind::Int => 0,
        ValueKind::Long => 1,
        ValueKind::Float => 2,
        ValueKind::Double => 3,
        ValueKind::Reference => 4,
    }
}

fn kind_at(offset: u8) -> ValueKind {
    match offset {
        0 => ValueKind::Int,
        1 => ValueKind::Long,
        2 => ValueKind::Float,
        3 => ValueKind::Double,
        _ => ValueKind::Reference,
    }
}
