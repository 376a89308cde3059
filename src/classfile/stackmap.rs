//! `StackMapTable` frames (JVMS §4.7.4).
//!
//! Frames are anchored to instruction indices instead of byte offsets, so inserting or removing
//! instructions only has to shift indices. Offset deltas are recomputed on write; a compact
//! frame whose delta no longer fits is upgraded to its extended form.

use crate::{
    file::{io::emit_be, parser::Parser},
    Result,
};

/// Verification type of a local or stack entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationType {
    /// `Top_variable_info`
    Top,
    /// `Integer_variable_info`
    Integer,
    /// `Float_variable_info`
    Float,
    /// `Double_variable_info`
    Double,
    /// `Long_variable_info`
    Long,
    /// `Null_variable_info`
    Null,
    /// `UninitializedThis_variable_info`
    UninitializedThis,
    /// `Object_variable_info`, a `Class` constant
    Object(u16),
    /// `Uninitialized_variable_info`, anchored to the index of the `new` instruction
    Uninitialized(usize),
}

impl VerificationType {
    fn parse(parser: &mut Parser, to_index: &impl Fn(usize) -> Result<usize>) -> Result<Self> {
        let tag = parser.read_be::<u8>()?;
        Ok(match tag {
            0 => VerificationType::Top,
            1 => VerificationType::Integer,
            2 => VerificationType::Float,
            3 => VerificationType::Double,
            4 => VerificationType::Long,
            5 => VerificationType::Null,
            6 => VerificationType::UninitializedThis,
            7 => VerificationType::Object(parser.read_be::<u16>()?),
            8 => {
                let offset = parser.read_be::<u16>()?;
                VerificationType::Uninitialized(to_index(usize::from(offset))?)
            }
            _ => return Err(malformed_error!("Invalid verification type tag {}", tag)),
        })
    }

    fn write(&self, buffer: &mut Vec<u8>, to_offset: &impl Fn(usize) -> Result<u16>) -> Result<()> {
        match self {
            VerificationType::Top => buffer.push(0),
            VerificationType::Integer => buffer.push(1),
            VerificationType::Float => buffer.push(2),
            VerificationType::Double => buffer.push(3),
            VerificationType::Long => buffer.push(4),
            VerificationType::Null => buffer.push(5),
            VerificationType::UninitializedThis => buffer.push(6),
            VerificationType::Object(class_index) => {
                buffer.push(7);
                emit_be(buffer, *class_index);
            }
            VerificationType::Uninitialized(index) => {
                buffer.push(8);
                emit_be(buffer, to_offset(*index)?);
            }
        }
        Ok(())
    }

    /// Shift an `Uninitialized` anchor by `delta` if it lies at or after `at`.
    pub(crate) fn shift(&mut self, at: usize, delta: isize) {
        if let VerificationType::Uninitialized(index) = self {
            if *index >= at {
                *index = index.saturating_add_signed(delta);
            }
        }
    }
}

/// The shape of a frame, with any locals and stack entries it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameKind {
    /// `same_frame` (0-63)
    Same,
    /// `same_frame_extended` (251)
    SameExtended,
    /// `same_locals_1_stack_item_frame` (64-127)
    SameLocals1StackItem(VerificationType),
    /// `same_locals_1_stack_item_frame_extended` (247)
    SameLocals1StackItemExtended(VerificationType),
    /// `chop_frame` (248-250), removing 1 to 3 locals
    Chop(u8),
    /// `append_frame` (252-254)
    Append(Vec<VerificationType>),
    /// `full_frame` (255)
    Full {
        /// Declared locals
        locals: Vec<VerificationType>,
        /// Declared stack
        stack: Vec<VerificationType>,
    },
}

/// A frame anchored at an instruction index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackMapFrame {
    /// Index of the instruction the frame describes
    pub target: usize,
    /// Frame contents
    pub kind: FrameKind,
}

impl StackMapFrame {
    fn types_mut(&mut self) -> Box<dyn Iterator<Item = &mut VerificationType> + '_> {
        match &mut self.kind {
            FrameKind::Same | FrameKind::SameExtended | FrameKind::Chop(_) => {
                Box::new(std::iter::empty())
            }
            FrameKind::SameLocals1StackItem(item)
            | FrameKind::SameLocals1StackItemExtended(item) => Box::new(std::iter::once(item)),
            FrameKind::Append(locals) => Box::new(locals.iter_mut()),
            FrameKind::Full { locals, stack } => {
                Box::new(locals.iter_mut().chain(stack.iter_mut()))
            }
        }
    }

    /// Shift the frame target and any `Uninitialized` anchors at or after `at` by `delta`.
    pub(crate) fn shift(&mut self, at: usize, delta: isize) {
        if self.target >= at {
            self.target = self.target.saturating_add_signed(delta);
        }
        for item in self.types_mut() {
            item.shift(at, delta);
        }
    }

    /// Whether the frame is anchored at `index` or an `Uninitialized` entry refers to it.
    pub(crate) fn references(&self, index: usize) -> bool {
        let uninitialized = VerificationType::Uninitialized(index);
        self.target == index
            || match &self.kind {
                FrameKind::Same | FrameKind::SameExtended | FrameKind::Chop(_) => false,
                FrameKind::SameLocals1StackItem(item)
                | FrameKind::SameLocals1StackItemExtended(item) => *item == uninitialized,
                FrameKind::Append(locals) => locals.contains(&uninitialized),
                FrameKind::Full { locals, stack } => {
                    locals.contains(&uninitialized) || stack.contains(&uninitialized)
                }
            }
    }
}

fn read_types(
    parser: &mut Parser,
    count: usize,
    to_index: &impl Fn(usize) -> Result<usize>,
) -> Result<Vec<VerificationType>> {
    let mut types = Vec::with_capacity(count);
    for _ in 0..count {
        types.push(VerificationType::parse(parser, to_index)?);
    }
    Ok(types)
}

fn write_types(
    buffer: &mut Vec<u8>,
    types: &[VerificationType],
    to_offset: &impl Fn(usize) -> Result<u16>,
) -> Result<()> {
    for item in types {
        item.write(buffer, to_offset)?;
    }
    Ok(())
}

/// Parse a `StackMapTable` body.
///
/// `to_index` maps a bytecode offset to the index of the instruction starting there.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for reserved frame types, unknown verification tags and
/// offsets that are not instruction boundaries.
pub fn parse_frames(
    body: &[u8],
    to_index: impl Fn(usize) -> Result<usize>,
) -> Result<Vec<StackMapFrame>> {
    let mut parser = Parser::new(body);
    let count = parser.read_be::<u16>()?;

    let mut frames = Vec::with_capacity(usize::from(count));
    let mut previous: Option<usize> = None;
    for _ in 0..count {
        let frame_type = parser.read_be::<u8>()?;
        let (delta, kind) = match frame_type {
            0..=63 => (u16::from(frame_type), FrameKind::Same),
            64..=127 => (
                u16::from(frame_type - 64),
                FrameKind::SameLocals1StackItem(VerificationType::parse(&mut parser, &to_index)?),
            ),
            247 => {
                let delta = parser.read_be::<u16>()?;
                let item = VerificationType::parse(&mut parser, &to_index)?;
                (delta, FrameKind::SameLocals1StackItemExtended(item))
            }
            248..=250 => (parser.read_be::<u16>()?, FrameKind::Chop(251 - frame_type)),
            251 => (parser.read_be::<u16>()?, FrameKind::SameExtended),
            252..=254 => {
                let delta = parser.read_be::<u16>()?;
                let locals = read_types(&mut parser, usize::from(frame_type - 251), &to_index)?;
                (delta, FrameKind::Append(locals))
            }
            255 => {
                let delta = parser.read_be::<u16>()?;
                let local_count = parser.read_be::<u16>()?;
                let locals = read_types(&mut parser, usize::from(local_count), &to_index)?;
                let stack_count = parser.read_be::<u16>()?;
                let stack = read_types(&mut parser, usize::from(stack_count), &to_index)?;
                (delta, FrameKind::Full { locals, stack })
            }
            _ => return Err(malformed_error!("Reserved stack map frame type {}", frame_type)),
        };

        let offset = match previous {
            None => usize::from(delta),
            Some(previous) => previous + usize::from(delta) + 1,
        };
        previous = Some(offset);
        frames.push(StackMapFrame {
            target: to_index(offset)?,
            kind,
        });
    }

    if parser.has_more_data() {
        return Err(malformed_error!(
            "StackMapTable has {} trailing bytes",
            parser.remaining()
        ));
    }

    Ok(frames)
}

/// Write a `StackMapTable` body.
///
/// `to_offset` maps an instruction index to its bytecode offset.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the frames are not in strictly ascending offset order.
pub fn write_frames(
    buffer: &mut Vec<u8>,
    frames: &[StackMapFrame],
    to_offset: impl Fn(usize) -> Result<u16>,
) -> Result<()> {
    let count = u16::try_from(frames.len())
        .map_err(|_| malformed_error!("Too many stack map frames - {}", frames.len()))?;
    emit_be(buffer, count);

    let mut previous: Option<u16> = None;
    for frame in frames {
        let offset = to_offset(frame.target)?;
        let delta = match previous {
            None => Some(offset),
            Some(previous) => offset.checked_sub(previous).and_then(|d| d.checked_sub(1)),
        }
        .ok_or_else(|| {
            malformed_error!("Stack map frame at offset {} is out of order", offset)
        })?;
        previous = Some(offset);

        match &frame.kind {
            FrameKind::Same if delta <= 63 => buffer.push(delta as u8),
            FrameKind::Same | FrameKind::SameExtended => {
                buffer.push(251);
                emit_be(buffer, delta);
            }
            FrameKind::SameLocals1StackItem(item) if delta <= 63 => {
                buffer.push(64 + delta as u8);
                item.write(buffer, &to_offset)?;
            }
            FrameKind::SameLocals1StackItem(item)
            | FrameKind::SameLocals1StackItemExtended(item) => {
                buffer.push(247);
                emit_be(buffer, delta);
                item.write(buffer, &to_offset)?;
            }
            FrameKind::Chop(removed) => {
                buffer.push(251 - removed);
                emit_be(buffer, delta);
            }
            FrameKind::Append(locals) => {
                buffer.push(251 + locals.len() as u8);
                emit_be(buffer, delta);
                write_types(buffer, locals, &to_offset)?;
            }
            FrameKind::Full { locals, stack } => {
                buffer.push(255);
                emit_be(buffer, delta);
                emit_be(buffer, locals.len() as u16);
                write_types(buffer, locals, &to_offset)?;
                emit_be(buffer, stack.len() as u16);
                write_types(buffer, stack, &to_offset)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Identity mapping: every offset is an instruction boundary
    fn identity_index(offset: usize) -> Result<usize> {
        Ok(offset)
    }

    fn identity_offset(index: usize) -> Result<u16> {
        Ok(index as u16)
    }

    #[test]
    fn all_frame_kinds_roundtrip() {
        let body = [
            0x00, 0x06, // 6 frames
            0x05, // same, offset 5
            0x41, 0x01, // same_locals_1_stack_item, delta 1 -> offset 7, Integer
            0xF7, 0x00, 0x02, 0x08, 0x00, 0x05, // extended, delta 2 -> 10, Uninitialized(5)
            0xF9, 0x00, 0x00, // chop 2, delta 0 -> 11
            0xFC, 0x00, 0x03, 0x07, 0x00, 0x09, // append 1 Object(#9), delta 3 -> 15
            0xFF, 0x00, 0x01, 0x00, 0x01, 0x04, 0x00, 0x01, 0x06, // full, -> 17
        ];
        let frames = parse_frames(&body, identity_index).unwrap();

        assert_eq!(frames.len(), 6);
        assert_eq!(frames[0].target, 5);
        assert_eq!(frames[1].target, 7);
        assert_eq!(
            frames[2].kind,
            FrameKind::SameLocals1StackItemExtended(VerificationType::Uninitialized(5))
        );
        assert_eq!(frames[3].kind, FrameKind::Chop(2));
        assert_eq!(frames[4].target, 15);
        assert_eq!(frames[5].target, 17);

        let mut out = Vec::new();
        write_frames(&mut out, &frames, identity_offset).unwrap();
        assert_eq!(out, body);
    }

    #[test]
    fn compact_frame_upgrades_when_delta_grows() {
        let frames = vec![StackMapFrame {
            target: 100,
            kind: FrameKind::Same,
        }];
        let mut out = Vec::new();
        write_frames(&mut out, &frames, identity_offset).unwrap();
        assert_eq!(out, [0x00, 0x01, 0xFB, 0x00, 0x64]);

        let frames = vec![StackMapFrame {
            target: 64,
            kind: FrameKind::SameLocals1StackItem(VerificationType::Null),
        }];
        let mut out = Vec::new();
        write_frames(&mut out, &frames, identity_offset).unwrap();
        assert_eq!(out, [0x00, 0x01, 0xF7, 0x00, 0x40, 0x05]);
    }

    #[test]
    fn shift_moves_targets_and_uninitialized() {
        let mut frame = StackMapFrame {
            target: 4,
            kind: FrameKind::Full {
                locals: vec![VerificationType::Uninitialized(3)],
                stack: vec![VerificationType::Uninitialized(1)],
            },
        };
        frame.shift(2, 3);
        assert_eq!(frame.target, 7);
        assert_eq!(
            frame.kind,
            FrameKind::Full {
                locals: vec![VerificationType::Uninitialized(6)],
                stack: vec![VerificationType::Uninitialized(1)],
            }
        );
        assert!(frame.references(6));
        assert!(!frame.references(3));
    }

    #[test]
    fn rejects_reserved_frame_type() {
        assert!(parse_frames(&[0x00, 0x01, 0x80], identity_index).is_err());
    }

    #[test]
    fn rejects_unordered_frames() {
        let frames = vec![
            StackMapFrame {
                target: 5,
                kind: FrameKind::Same,
            },
            StackMapFrame {
                target: 5,
                kind: FrameKind::Same,
            },
        ];
        let mut out = Vec::new();
        assert!(write_frames(&mut out, &frames, identity_offset).is_err());
    }
}
