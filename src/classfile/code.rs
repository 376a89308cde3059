//! The `Code` attribute (JVMS §4.7.3) and the sub-attributes that point into it.
//!
//! Every position inside a method body (exception ranges, line numbers, local variable scopes
//! and stack map frames) is stored as an instruction index. Byte offsets only exist while
//! parsing and writing, which is what allows [`Code::insert`] and [`Code::remove`] to splice
//! instructions without leaving any table stale.

use crate::{
    assembly::{decode, encode, index_of, Instruction, InstructionList},
    classfile::{
        attributes::{parse_attributes, write_attribute},
        stackmap::{parse_frames, write_frames},
        ConstantPool, RawAttribute, StackMapFrame,
    },
    file::{io::emit_be, parser::Parser},
    Result,
};

/// An entry of the exception table. `end` is exclusive and may equal the instruction count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// First covered instruction
    pub start: usize,
    /// First instruction after the covered range
    pub end: usize,
    /// First instruction of the handler
    pub handler: usize,
    /// `Class` constant of the caught type, 0 for any
    pub catch_type: u16,
}

/// A `LineNumberTable` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineNumber {
    /// First instruction of the line
    pub start: usize,
    /// Source line number
    pub line: u16,
}

/// A `LocalVariableTable` or `LocalVariableTypeTable` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    /// First instruction of the scope
    pub start: usize,
    /// First instruction after the scope; may equal the instruction count
    pub end: usize,
    /// `Utf8` name
    pub name_index: u16,
    /// `Utf8` descriptor or signature
    pub descriptor_index: u16,
    /// Local variable slot
    pub index: u16,
}

/// An attribute of a `Code` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeAttribute {
    /// `LineNumberTable`
    LineNumberTable {
        /// Attribute name constant
        name_index: u16,
        /// Entries in file order
        entries: Vec<LineNumber>,
    },
    /// `LocalVariableTable`
    LocalVariableTable {
        /// Attribute name constant
        name_index: u16,
        /// Entries in file order
        entries: Vec<LocalVariable>,
    },
    /// `LocalVariableTypeTable`
    LocalVariableTypeTable {
        /// Attribute name constant
        name_index: u16,
        /// Entries in file order
        entries: Vec<LocalVariable>,
    },
    /// `StackMapTable`
    StackMapTable {
        /// Attribute name constant
        name_index: u16,
        /// Frames in ascending target order
        frames: Vec<StackMapFrame>,
    },
    /// Anything else, kept verbatim
    Other(RawAttribute),
}

/// A decoded method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    /// Declared maximum operand stack depth, in slots
    pub max_stack: u16,
    /// Declared number of local variable slots
    pub max_locals: u16,
    /// The instructions
    pub instructions: InstructionList,
    /// Exception table in file order
    pub exception_table: Vec<ExceptionHandler>,
    /// Sub-attributes in file order
    pub attributes: Vec<CodeAttribute>,
}

fn to_index(offsets: &[usize], offset: usize, what: &str) -> Result<usize> {
    index_of(offsets, offset).ok_or_else(|| {
        malformed_error!("{} offset {} is not an instruction boundary", what, offset)
    })
}

fn to_offset(offsets: &[usize], index: usize) -> Result<u16> {
    offsets
        .get(index)
        .and_then(|offset| u16::try_from(*offset).ok())
        .ok_or_else(|| malformed_error!("Instruction index {} has no offset", index))
}

fn parse_local_variables(body: &[u8], offsets: &[usize]) -> Result<Vec<LocalVariable>> {
    let mut parser = Parser::new(body);
    let entries = parser.read_table(|parser| {
        let start_pc = usize::from(parser.read_be::<u16>()?);
        let length = usize::from(parser.read_be::<u16>()?);
        Ok(LocalVariable {
            start: to_index(offsets, start_pc, "Local variable start")?,
            end: to_index(offsets, start_pc + length, "Local variable end")?,
            name_index: parser.read_be::<u16>()?,
            descriptor_index: parser.read_be::<u16>()?,
            index: parser.read_be::<u16>()?,
        })
    })?;
    if parser.has_more_data() {
        return Err(malformed_error!("Local variable table has trailing bytes"));
    }
    Ok(entries)
}

fn write_local_variables(
    buffer: &mut Vec<u8>,
    entries: &[LocalVariable],
    offsets: &[usize],
) -> Result<()> {
    emit_be(buffer, entries.len() as u16);
    for entry in entries {
        let start = to_offset(offsets, entry.start)?;
        let end = to_offset(offsets, entry.end)?;
        emit_be(buffer, start);
        emit_be(buffer, end.saturating_sub(start));
        emit_be(buffer, entry.name_index);
        emit_be(buffer, entry.descriptor_index);
        emit_be(buffer, entry.index);
    }
    Ok(())
}

fn shift(position: &mut usize, at: usize, delta: isize) {
    if *position >= at {
        *position = position.saturating_add_signed(delta);
    }
}

impl Code {
    /// Parse the body of a `Code` attribute.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an empty or truncated code array, undecodable
    /// instructions, table offsets that are not instruction boundaries and trailing bytes.
    pub fn parse(body: &[u8], pool: &ConstantPool) -> Result<Code> {
        let mut parser = Parser::new(body);
        let max_stack = parser.read_be::<u16>()?;
        let max_locals = parser.read_be::<u16>()?;
        let code_length = parser.read_be::<u32>()? as usize;
        if code_length == 0 {
            return Err(malformed_error!("Code attribute with an empty code array"));
        }

        let decoded = decode(parser.read_bytes(code_length)?, pool)?;
        let offsets = &decoded.offsets;

        let exception_table = parser.read_table(|parser| {
            let start = to_index(offsets, usize::from(parser.read_be::<u16>()?), "Handler start")?;
            let end = to_index(offsets, usize::from(parser.read_be::<u16>()?), "Handler end")?;
            let handler = to_index(offsets, usize::from(parser.read_be::<u16>()?), "Handler")?;
            if start >= end || handler >= decoded.instructions.len() {
                return Err(malformed_error!(
                    "Invalid exception handler {}..{} -> {}",
                    start,
                    end,
                    handler
                ));
            }
            Ok(ExceptionHandler {
                start,
                end,
                handler,
                catch_type: parser.read_be::<u16>()?,
            })
        })?;

        let attributes = parse_attributes(
            &mut parser,
            pool,
            |name, name_index, body| {
                Ok(Some(match name {
                    "LineNumberTable" => {
                        let mut parser = Parser::new(body);
                        let entries = parser.read_table(|parser| {
                            let start_pc = usize::from(parser.read_be::<u16>()?);
                            Ok(LineNumber {
                                start: to_index(offsets, start_pc, "Line number")?,
                                line: parser.read_be::<u16>()?,
                            })
                        })?;
                        if parser.has_more_data() {
                            return Err(malformed_error!("LineNumberTable has trailing bytes"));
                        }
                        CodeAttribute::LineNumberTable {
                            name_index,
                            entries,
                        }
                    }
                    "LocalVariableTable" => CodeAttribute::LocalVariableTable {
                        name_index,
                        entries: parse_local_variables(body, offsets)?,
                    },
                    "LocalVariableTypeTable" => CodeAttribute::LocalVariableTypeTable {
                        name_index,
                        entries: parse_local_variables(body, offsets)?,
                    },
                    "StackMapTable" => CodeAttribute::StackMapTable {
                        name_index,
                        frames: parse_frames(body, |offset| {
                            to_index(offsets, offset, "Stack map frame")
                        })?,
                    },
                    _ => return Ok(None),
                }))
            },
            CodeAttribute::Other,
        )?;

        if parser.has_more_data() {
            return Err(malformed_error!(
                "Code attribute has {} trailing bytes",
                parser.remaining()
            ));
        }

        Ok(Code {
            max_stack,
            max_locals,
            instructions: decoded.instructions,
            exception_table,
            attributes,
        })
    }

    /// Write the body of the `Code` attribute, recomputing every offset and length.
    ///
    /// `method` is only used to label errors.
    ///
    /// # Errors
    /// Returns any encoding error, see [`crate::assembly::encode`].
    pub fn write(&self, buffer: &mut Vec<u8>, method: &str) -> Result<()> {
        let encoded = encode(&self.instructions, method)?;
        let offsets = &encoded.offsets;

        emit_be(buffer, self.max_stack);
        emit_be(buffer, self.max_locals);
        emit_be(buffer, encoded.bytes.len() as u32);
        buffer.extend_from_slice(&encoded.bytes);

        emit_be(buffer, self.exception_table.len() as u16);
        for handler in &self.exception_table {
            emit_be(buffer, to_offset(offsets, handler.start)?);
            emit_be(buffer, to_offset(offsets, handler.end)?);
            emit_be(buffer, to_offset(offsets, handler.handler)?);
            emit_be(buffer, handler.catch_type);
        }

        emit_be(buffer, self.attributes.len() as u16);
        for attribute in &self.attributes {
            match attribute {
                CodeAttribute::LineNumberTable {
                    name_index,
                    entries,
                } => write_attribute(buffer, *name_index, |buffer| {
                    emit_be(buffer, entries.len() as u16);
                    for entry in entries {
                        emit_be(buffer, to_offset(offsets, entry.start)?);
                        emit_be(buffer, entry.line);
                    }
                    Ok(())
                })?,
                CodeAttribute::LocalVariableTable {
                    name_index,
                    entries,
                }
                | CodeAttribute::LocalVariableTypeTable {
                    name_index,
                    entries,
                } => write_attribute(buffer, *name_index, |buffer| {
                    write_local_variables(buffer, entries, offsets)
                })?,
                CodeAttribute::StackMapTable { name_index, frames } => {
                    write_attribute(buffer, *name_index, |buffer| {
                        write_frames(buffer, frames, |index| to_offset(offsets, index))
                    })?;
                }
                CodeAttribute::Other(raw) => raw.write(buffer)?,
            }
        }
        Ok(())
    }

    fn shift_positions(&mut self, at: usize, delta: isize) {
        for handler in &mut self.exception_table {
            shift(&mut handler.start, at, delta);
            shift(&mut handler.end, at, delta);
            shift(&mut handler.handler, at, delta);
        }
        for attribute in &mut self.attributes {
            match attribute {
                CodeAttribute::LineNumberTable { entries, .. } => {
                    for entry in entries {
                        shift(&mut entry.start, at, delta);
                    }
                }
                CodeAttribute::LocalVariableTable { entries, .. }
                | CodeAttribute::LocalVariableTypeTable { entries, .. } => {
                    for entry in entries {
                        shift(&mut entry.start, at, delta);
                        shift(&mut entry.end, at, delta);
                    }
                }
                CodeAttribute::StackMapTable { frames, .. } => {
                    for frame in frames {
                        frame.shift(at, delta);
                    }
                }
                CodeAttribute::Other(_) => {}
            }
        }
    }

    /// Insert `sequence` so that its first instruction lands at index `at`.
    ///
    /// Every branch target, exception range, line number, local variable scope and stack map
    /// frame at or after `at` moves along with the instruction it referred to.
    pub fn insert(&mut self, at: usize, sequence: Vec<Instruction>) {
        let count = sequence.len() as isize;
        self.instructions.insert_all(at, sequence);
        self.shift_positions(at, count);
    }

    /// Whether a branch, exception handler start or handler entry, or stack map frame refers to
    /// the instruction at `index`.
    #[must_use]
    pub fn is_referenced(&self, index: usize) -> bool {
        self.instructions.is_branch_target(index)
            || self
                .exception_table
                .iter()
                .any(|handler| handler.start == index || handler.handler == index)
            || self.attributes.iter().any(|attribute| match attribute {
                CodeAttribute::StackMapTable { frames, .. } => {
                    frames.iter().any(|frame| frame.references(index))
                }
                _ => false,
            })
    }

    /// Remove the instruction at `at`.
    ///
    /// Positions after `at` move down by one. Line numbers and local variable scopes starting
    /// at `at` move to the following instruction; line numbers on a removed final instruction
    /// are dropped.
    ///
    /// # Errors
    /// Returns [`crate::Error::Consistency`] if `at` is out of range or is referenced by a
    /// branch, an exception handler or a stack map frame.
    pub fn remove(&mut self, at: usize, method: &str) -> Result<Instruction> {
        if at >= self.instructions.len() {
            return Err(consistency_error!(method, at, "no instruction to remove"));
        }
        if self.is_referenced(at) {
            return Err(consistency_error!(
                method,
                at,
                "{} is referenced and cannot be removed",
                self.instructions[at]
            ));
        }

        let removed = self.instructions.remove(at);
        self.shift_positions(at + 1, -1);

        let len = self.instructions.len();
        for attribute in &mut self.attributes {
            if let CodeAttribute::LineNumberTable { entries, .. } = attribute {
                entries.retain(|entry| entry.start < len);
            }
        }
        Ok(removed)
    }

    /// First local variable slot not used by the parameters or by any instruction, and not
    /// below the declared `max_locals`.
    ///
    /// `parameter_slots` includes the receiver of instance methods.
    #[must_use]
    pub fn local_watermark(&self, parameter_slots: u16) -> u16 {
        self.instructions
            .iter()
            .filter_map(Instruction::local_access)
            .map(|(index, width)| index.saturating_add(width))
            .fold(self.max_locals.max(parameter_slots), u16::max)
    }

    /// The `LineNumberTable` entries, if the method has any.
    pub fn line_numbers(&self) -> impl Iterator<Item = &LineNumber> {
        self.attributes.iter().flat_map(|attribute| match attribute {
            CodeAttribute::LineNumberTable { entries, .. } => entries.as_slice(),
            _ => &[],
        })
    }
}
