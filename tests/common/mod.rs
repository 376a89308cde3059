//! Byte-level class file assembly shared by the integration tests.
//!
//! Classes are written opcode by opcode without going through the library, so the tests check
//! the parser against an independent encoder.

#![allow(dead_code)]

pub const TARGET_CLASS: &str = "net/minecraft/item/ItemInWorldManager";
pub const TARGET_BINARY_NAME: &str = "net.minecraft.item.ItemInWorldManager";
pub const WORLD_TYPE: &str = "Lnet/minecraft/world/World;";
pub const PLAYER_TYPE: &str = "Lnet/minecraft/entity/player/EntityPlayerMP;";

const ALOAD_0: u8 = 0x2A;
const ILOAD_1: u8 = 0x1B;
const ILOAD_2: u8 = 0x1C;
const ILOAD_3: u8 = 0x1D;
const ICONST_1: u8 = 0x04;
const GETFIELD: u8 = 0xB4;
const IFNULL: u8 = 0xC6;
const INVOKEVIRTUAL: u8 = 0xB6;
const POP: u8 = 0x57;
const IRETURN: u8 = 0xAC;
const RETURN: u8 = 0xB1;

/// A constant pool under construction. Entries are never deduplicated.
#[derive(Default)]
pub struct Pool {
    bytes: Vec<u8>,
    count: u16,
}

impl Pool {
    fn push(&mut self, tag: u8, body: &[u8]) -> u16 {
        self.count += 1;
        self.bytes.push(tag);
        self.bytes.extend_from_slice(body);
        self.count
    }

    pub fn utf8(&mut self, value: &str) -> u16 {
        let mut body = (value.len() as u16).to_be_bytes().to_vec();
        body.extend_from_slice(value.as_bytes());
        self.push(1, &body)
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.push(7, &name.to_be_bytes())
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let mut body = name.to_be_bytes().to_vec();
        body.extend_from_slice(&descriptor.to_be_bytes());
        self.push(12, &body)
    }

    fn member(&mut self, tag: u8, owner: &str, name: &str, descriptor: &str) -> u16 {
        let owner = self.class(owner);
        let name_and_type = self.name_and_type(name, descriptor);
        let mut body = owner.to_be_bytes().to_vec();
        body.extend_from_slice(&name_and_type.to_be_bytes());
        self.push(tag, &body)
    }

    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member(9, owner, name, descriptor)
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member(10, owner, name, descriptor)
    }
}

/// Assembles a class file from raw parts.
pub struct ClassAssembler {
    pub pool: Pool,
    this_class: u16,
    super_class: u16,
    fields: Vec<u8>,
    field_count: u16,
    methods: Vec<u8>,
    method_count: u16,
    attributes: Vec<u8>,
    attribute_count: u16,
}

impl ClassAssembler {
    pub fn new(name: &str) -> Self {
        let mut pool = Pool::default();
        let this_class = pool.class(name);
        let super_class = pool.class("java/lang/Object");
        ClassAssembler {
            pool,
            this_class,
            super_class,
            fields: Vec::new(),
            field_count: 0,
            methods: Vec::new(),
            method_count: 0,
            attributes: Vec::new(),
            attribute_count: 0,
        }
    }

    pub fn field(&mut self, access: u16, name: &str, descriptor: &str) -> &mut Self {
        let name = self.pool.utf8(name);
        let descriptor = self.pool.utf8(descriptor);
        self.fields.extend_from_slice(&access.to_be_bytes());
        self.fields.extend_from_slice(&name.to_be_bytes());
        self.fields.extend_from_slice(&descriptor.to_be_bytes());
        self.fields.extend_from_slice(&0_u16.to_be_bytes());
        self.field_count += 1;
        self
    }

    /// Add a method with a `Code` attribute holding `code` and no exception table.
    pub fn method(
        &mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        max_stack: u16,
        max_locals: u16,
        code: &[u8],
    ) -> &mut Self {
        let name = self.pool.utf8(name);
        let descriptor = self.pool.utf8(descriptor);
        let code_name = self.pool.utf8("Code");

        let out = &mut self.methods;
        out.extend_from_slice(&access.to_be_bytes());
        out.extend_from_slice(&name.to_be_bytes());
        out.extend_from_slice(&descriptor.to_be_bytes());
        out.extend_from_slice(&1_u16.to_be_bytes());
        out.extend_from_slice(&code_name.to_be_bytes());
        out.extend_from_slice(&(12 + code.len() as u32).to_be_bytes());
        out.extend_from_slice(&max_stack.to_be_bytes());
        out.extend_from_slice(&max_locals.to_be_bytes());
        out.extend_from_slice(&(code.len() as u32).to_be_bytes());
        out.extend_from_slice(code);
        out.extend_from_slice(&0_u16.to_be_bytes());
        out.extend_from_slice(&0_u16.to_be_bytes());
        self.method_count += 1;
        self
    }

    pub fn source_file(&mut self, file: &str) -> &mut Self {
        let name = self.pool.utf8("SourceFile");
        let file = self.pool.utf8(file);
        self.attributes.extend_from_slice(&name.to_be_bytes());
        self.attributes.extend_from_slice(&2_u32.to_be_bytes());
        self.attributes.extend_from_slice(&file.to_be_bytes());
        self.attribute_count += 1;
        self
    }

    pub fn assemble(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABE_u32.to_be_bytes());
        out.extend_from_slice(&0_u16.to_be_bytes());
        out.extend_from_slice(&50_u16.to_be_bytes());
        out.extend_from_slice(&(self.pool.count + 1).to_be_bytes());
        out.extend_from_slice(&self.pool.bytes);
        out.extend_from_slice(&0x0021_u16.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&0_u16.to_be_bytes());
        out.extend_from_slice(&self.field_count.to_be_bytes());
        out.extend_from_slice(&self.fields);
        out.extend_from_slice(&self.method_count.to_be_bytes());
        out.extend_from_slice(&self.methods);
        out.extend_from_slice(&self.attribute_count.to_be_bytes());
        out.extend_from_slice(&self.attributes);
        out
    }
}

/// Member names used by an `ItemInWorldManager` build.
#[derive(Clone, Copy)]
pub struct Names {
    pub target: &'static str,
    pub anchor: &'static str,
    pub world: &'static str,
    pub player: &'static str,
}

pub const CANONICAL: Names = Names {
    target: "uncheckedTryHarvestBlock",
    anchor: "tryHarvestBlock",
    world: "theWorld",
    player: "thisPlayerMP",
};

pub const SRG: Names = Names {
    target: "func_73082_a",
    anchor: "func_73084_b",
    world: "field_73092_a",
    player: "field_73090_b",
};

pub const OBFUSCATED: Names = Names {
    target: "d",
    anchor: "c",
    world: "a",
    player: "b",
};

/// SRG records for the obfuscated `sq` build.
pub const SQ_MAPPINGS: &str = "\
CL: sq net/minecraft/item/ItemInWorldManager
FD: sq/a net/minecraft/item/ItemInWorldManager/field_73092_a
FD: sq/b net/minecraft/item/ItemInWorldManager/field_73090_b
MD: sq/c (III)Z net/minecraft/item/ItemInWorldManager/func_73084_b (III)Z
MD: sq/d (III)V net/minecraft/item/ItemInWorldManager/func_73082_a (III)V
";

/// Shape of a generated `ItemInWorldManager`.
#[derive(Clone, Copy)]
pub struct Shape {
    pub class: &'static str,
    pub names: Names,
    /// Name of the method invoked where the anchor call normally sits
    pub called: Option<&'static str>,
    /// Skip the body when `theWorld` is null
    pub guarded: bool,
    pub max_locals: u16,
}

impl Default for Shape {
    fn default() -> Self {
        Shape {
            class: TARGET_CLASS,
            names: CANONICAL,
            called: None,
            guarded: false,
            max_locals: 4,
        }
    }
}

impl Shape {
    pub fn named(names: Names) -> Self {
        Shape {
            names,
            ..Shape::default()
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let names = self.names;
        let mut class = ClassAssembler::new(self.class);
        class
            .field(0x0001, names.world, WORLD_TYPE)
            .field(0x0001, names.player, PLAYER_TYPE)
            .method(0x0001, names.anchor, "(III)Z", 1, 4, &[ICONST_1, IRETURN]);

        let called = self.called.unwrap_or(names.anchor);
        let anchor = class.pool.method_ref(self.class, called, "(III)Z");
        let mut code = Vec::new();
        if self.guarded {
            let world = class.pool.field_ref(self.class, names.world, WORLD_TYPE);
            code.push(ALOAD_0);
            code.push(GETFIELD);
            code.extend_from_slice(&world.to_be_bytes());
            code.push(IFNULL);
            // ifnull at 4, return at 15
            code.extend_from_slice(&11_i16.to_be_bytes());
        }
        code.extend_from_slice(&[ALOAD_0, ILOAD_1, ILOAD_2, ILOAD_3, INVOKEVIRTUAL]);
        code.extend_from_slice(&anchor.to_be_bytes());
        code.extend_from_slice(&[POP, RETURN]);

        class
            .method(0x0001, names.target, "(III)V", 4, self.max_locals, &code)
            .source_file("ItemInWorldManager.java");
        class.assemble()
    }
}
