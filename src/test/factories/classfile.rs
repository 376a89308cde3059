//! Builders for class files assembled in memory.

use crate::{
    assembly::{opcodes, Dispatch, Instruction, InstructionList, MemberRef},
    classfile::{
        ClassAccessFlags, ClassFile, Code, CodeAttribute, ConstantPool, ExceptionHandler, Field,
        FieldAccessFlags, FrameKind, LineNumber, Method, MethodAttribute, MethodAccessFlags,
        RawAttribute, StackMapFrame, ValueKind, VerificationType,
    },
};

/// Internal name of the patched class.
pub const TARGET_CLASS: &str = "net/minecraft/item/ItemInWorldManager";
/// Descriptor of the world field.
pub const WORLD_TYPE: &str = "Lnet/minecraft/world/World;";
/// Descriptor of the player field.
pub const PLAYER_TYPE: &str = "Lnet/minecraft/entity/player/EntityPlayerMP;";

/// Builds a class from hand-assembled methods.
pub struct ClassBuilder {
    pool: ConstantPool,
    this_class: u16,
    super_class: u16,
    fields: Vec<Field>,
    methods: Vec<Method>,
    attributes: Vec<RawAttribute>,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        let mut pool = ConstantPool::new();
        let this_class = pool.class_index(name).unwrap();
        let super_class = pool.class_index("java/lang/Object").unwrap();
        ClassBuilder {
            pool,
            this_class,
            super_class,
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, descriptor: &str) -> Self {
        let name_index = self.pool.utf8_index(name).unwrap();
        let descriptor_index = self.pool.utf8_index(descriptor).unwrap();
        self.fields.push(Field {
            access: FieldAccessFlags::PUBLIC,
            name_index,
            descriptor_index,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            attributes: Vec::new(),
        });
        self
    }

    pub fn method(mut self, name: &str, descriptor: &str, code: Code) -> Self {
        let code_index = self.pool.utf8_index("Code").unwrap();
        self.push_method(
            MethodAccessFlags::PUBLIC,
            name,
            descriptor,
            vec![MethodAttribute::Code {
                name_index: code_index,
                code: Box::new(code),
            }],
        );
        self
    }

    pub fn abstract_method(mut self, name: &str, descriptor: &str) -> Self {
        self.push_method(
            MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT,
            name,
            descriptor,
            Vec::new(),
        );
        self
    }

    pub fn source_file(mut self, file: &str) -> Self {
        let name_index = self.pool.utf8_index("SourceFile").unwrap();
        let file_index = self.pool.utf8_index(file).unwrap();
        self.attributes.push(RawAttribute {
            name_index,
            info: file_index.to_be_bytes().to_vec(),
        });
        self
    }

    fn push_method(
        &mut self,
        access: MethodAccessFlags,
        name: &str,
        descriptor: &str,
        attributes: Vec<MethodAttribute>,
    ) {
        let name_index = self.pool.utf8_index(name).unwrap();
        let descriptor_index = self.pool.utf8_index(descriptor).unwrap();
        self.methods.push(Method {
            access,
            name_index,
            descriptor_index,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            attributes,
        });
    }

    pub fn pool(&mut self) -> &mut ConstantPool {
        &mut self.pool
    }

    pub fn get_field(&mut self, owner: &str, name: &str, descriptor: &str) -> Instruction {
        Instruction::LoadField {
            field: self.member(owner, name, descriptor, false),
            is_static: false,
        }
    }

    pub fn put_field(&mut self, owner: &str, name: &str, descriptor: &str) -> Instruction {
        Instruction::StoreField {
            field: self.member(owner, name, descriptor, false),
            is_static: false,
        }
    }

    pub fn invoke(
        &mut self,
        dispatch: Dispatch,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Instruction {
        Instruction::InvokeMethod {
            method: self.member(owner, name, descriptor, true),
            dispatch,
        }
    }

    fn member(&mut self, owner: &str, name: &str, descriptor: &str, method: bool) -> MemberRef {
        let index = if method {
            self.pool.method_ref(owner, name, descriptor).unwrap()
        } else {
            self.pool.field_ref(owner, name, descriptor).unwrap()
        };
        MemberRef {
            index,
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }

    pub fn into_class(self) -> ClassFile {
        ClassFile {
            minor_version: 0,
            major_version: 50,
            pool: self.pool,
            access: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            this_class: self.this_class,
            super_class: self.super_class,
            interfaces: Vec::new(),
            fields: self.fields,
            methods: self.methods,
            attributes: self.attributes,
        }
    }

    pub fn build(self) -> Vec<u8> {
        self.into_class().to_bytes().unwrap()
    }
}

/// A method body with no tables.
pub fn code(max_stack: u16, max_locals: u16, instructions: Vec<Instruction>) -> Code {
    Code {
        max_stack,
        max_locals,
        instructions: InstructionList::from(instructions),
        exception_table: Vec::new(),
        attributes: Vec::new(),
    }
}

pub fn load(index: u16, kind: ValueKind) -> Instruction {
    Instruction::LoadLocal { index, kind }
}

pub fn store(index: u16, kind: ValueKind) -> Instruction {
    Instruction::StoreLocal { index, kind }
}

pub fn op(opcode: u8) -> Instruction {
    Instruction::Other {
        opcode,
        operands: Vec::new(),
    }
}

pub fn ret(kind: Option<ValueKind>) -> Instruction {
    Instruction::Return { kind }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Naming {
    Canonical,
    Srg,
    Obfuscated,
}

impl Naming {
    fn names(self) -> [&'static str; 4] {
        match self {
            Naming::Canonical => [
                "theWorld",
                "thisPlayerMP",
                "tryHarvestBlock",
                "uncheckedTryHarvestBlock",
            ],
            Naming::Srg => ["field_73092_a", "field_73090_b", "func_73084_b", "func_73082_a"],
            Naming::Obfuscated => ["a", "b", "c", "d"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tail {
    Pop,
    Stored,
    NopThenPop,
}

/// Builds an `ItemInWorldManager` look-alike.
///
/// The default `uncheckedTryHarvestBlock(III)V` body is
///
/// ```text
/// 0 aload_0
/// 1 iload_1
/// 2 iload_2
/// 3 iload_3
/// 4 invokevirtual tryHarvestBlock(III)Z
/// 5 pop
/// 6 return
/// ```
pub struct ItemInWorldManagerBuilder {
    naming: Naming,
    anchor: bool,
    tail: Tail,
    guarded: bool,
    handler: bool,
    line_numbers: bool,
    max_locals: Option<u16>,
}

pub fn item_in_world_manager() -> ItemInWorldManagerBuilder {
    ItemInWorldManagerBuilder {
        naming: Naming::Canonical,
        anchor: true,
        tail: Tail::Pop,
        guarded: false,
        handler: false,
        line_numbers: false,
        max_locals: None,
    }
}

impl ItemInWorldManagerBuilder {
    /// Members carry their SRG names.
    pub fn srg_names(mut self) -> Self {
        self.naming = Naming::Srg;
        self
    }

    /// Members carry raw obfuscated names (`a`, `b`, `c`, `d`).
    pub fn obfuscated_names(mut self) -> Self {
        self.naming = Naming::Obfuscated;
        self
    }

    /// Call `destroyBlock` instead of `tryHarvestBlock`.
    pub fn without_anchor(mut self) -> Self {
        self.anchor = false;
        self
    }

    /// Keep the call result in local 4 instead of popping it.
    pub fn with_result_stored(mut self) -> Self {
        self.tail = Tail::Stored;
        self
    }

    /// Put a `nop` between the call and its `pop`.
    pub fn with_nop_before_pop(mut self) -> Self {
        self.tail = Tail::NopThenPop;
        self
    }

    /// Skip the call when the world is null; adds a stack map frame at the `return`.
    pub fn guarded(mut self) -> Self {
        self.guarded = true;
        self
    }

    /// Cover the call with a catch-all handler that drops the exception.
    pub fn with_handler(mut self) -> Self {
        self.handler = true;
        self
    }

    /// Add a line number for every instruction of the patched method.
    pub fn with_line_numbers(mut self) -> Self {
        self.line_numbers = true;
        self
    }

    /// Declare more local variable slots than the body uses.
    pub fn with_max_locals(mut self, max_locals: u16) -> Self {
        self.max_locals = Some(max_locals);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.into_class().to_bytes().unwrap()
    }

    pub fn into_class(self) -> ClassFile {
        let [world, player, try_harvest, unchecked] = self.naming.names();
        let mut class = ClassBuilder::new(TARGET_CLASS)
            .field(world, WORLD_TYPE)
            .field(player, PLAYER_TYPE)
            .source_file("ItemInWorldManager.java");

        let init = {
            let object_init = class.invoke(Dispatch::Special, "java/lang/Object", "<init>", "()V");
            let put_world = class.put_field(TARGET_CLASS, world, WORLD_TYPE);
            code(
                2,
                2,
                vec![
                    load(0, ValueKind::Reference),
                    object_init,
                    load(0, ValueKind::Reference),
                    load(1, ValueKind::Reference),
                    put_world,
                    ret(None),
                ],
            )
        };
        let harvest = code(
            1,
            4,
            vec![op(opcodes::ICONST_1), ret(Some(ValueKind::Int))],
        );
        let unchecked_body = self.unchecked_body(&mut class, world, try_harvest);

        class
            .method("<init>", &format!("({WORLD_TYPE})V"), init)
            .method(try_harvest, "(III)Z", harvest)
            .method(unchecked, "(III)V", unchecked_body)
            .into_class()
    }

    fn unchecked_body(&self, class: &mut ClassBuilder, world: &str, try_harvest: &str) -> Code {
        let mut instructions = Vec::new();
        if self.guarded {
            instructions.push(load(0, ValueKind::Reference));
            instructions.push(class.get_field(TARGET_CLASS, world, WORLD_TYPE));
            // Target patched below, once the position of the return is known.
            instructions.push(Instruction::Jump {
                opcode: opcodes::IFNULL,
                target: 0,
            });
        }

        let first_covered = instructions.len();
        let callee = if self.anchor { try_harvest } else { "destroyBlock" };
        instructions.push(load(0, ValueKind::Reference));
        instructions.push(load(1, ValueKind::Int));
        instructions.push(load(2, ValueKind::Int));
        instructions.push(load(3, ValueKind::Int));
        instructions.push(class.invoke(Dispatch::Virtual, TARGET_CLASS, callee, "(III)Z"));
        match self.tail {
            Tail::Pop => instructions.push(Instruction::Pop),
            Tail::Stored => instructions.push(store(4, ValueKind::Int)),
            Tail::NopThenPop => {
                instructions.push(op(opcodes::NOP));
                instructions.push(Instruction::Pop);
            }
        }

        let exit = instructions.len();
        instructions.push(ret(None));
        if self.guarded {
            if let Some(Instruction::Jump { target, .. }) = instructions.get_mut(2) {
                *target = exit;
            }
        }

        let mut body = code(
            4,
            self.max_locals
                .unwrap_or(if self.tail == Tail::Stored { 5 } else { 4 }),
            Vec::new(),
        );
        let mut frames = Vec::new();
        if self.guarded {
            frames.push(StackMapFrame {
                target: exit,
                kind: FrameKind::Same,
            });
        }
        if self.handler {
            let handler = instructions.len();
            instructions.push(Instruction::Pop);
            instructions.push(ret(None));
            body.exception_table.push(ExceptionHandler {
                start: first_covered,
                end: exit,
                handler,
                catch_type: 0,
            });
            let throwable = class.pool().class_index("java/lang/Throwable").unwrap();
            frames.push(StackMapFrame {
                target: handler,
                kind: FrameKind::SameLocals1StackItem(VerificationType::Object(throwable)),
            });
        }

        if self.line_numbers {
            let name_index = class.pool().utf8_index("LineNumberTable").unwrap();
            body.attributes.push(CodeAttribute::LineNumberTable {
                name_index,
                entries: (0..instructions.len())
                    .map(|start| LineNumber {
                        start,
                        line: 100 + start as u16,
                    })
                    .collect(),
            });
        }
        if !frames.is_empty() {
            let name_index = class.pool().utf8_index("StackMapTable").unwrap();
            body.attributes.push(CodeAttribute::StackMapTable { name_index, frames });
        }

        body.instructions = InstructionList::from(instructions);
        body
    }
}
