use std::path::Path;

use serde::Serialize;
use veinpatch::{
    mapping::{IdentityRemapper, MemberRemapper, NameResolver},
    TransformerConfig,
};

use crate::{
    app::GlobalOptions,
    commands::common::{access_string, load_class, load_remapper},
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct MethodEntry {
    access: String,
    name: String,
    descriptor: String,
    instructions: Option<usize>,
    max_stack: Option<u16>,
    max_locals: Option<u16>,
    /// Canonical name, when the method is one the patcher looks for
    known_as: Option<String>,
}

#[derive(Debug, Serialize)]
struct MethodsOutput {
    class: String,
    /// Deobfuscated class name from the mapping file
    mapped_class: Option<String>,
    methods: Vec<MethodEntry>,
    count: usize,
}

/// Canonical name of a method the patcher looks for, after SRG and built-in mapping.
fn known_as(
    config: &TransformerConfig,
    resolver: &NameResolver,
    remapper: &dyn MemberRemapper,
    owner: &str,
    name: &str,
    descriptor: &str,
) -> Option<String> {
    let mapped = remapper.map_method_name(owner, name, descriptor);
    let canonical = resolver.canonical_name(mapped);
    [&config.target_method, &config.anchor_callee]
        .into_iter()
        .find(|known| known.as_str() == canonical)
        .cloned()
}

pub fn run(
    path: &Path,
    obfuscated: bool,
    srg: Option<&Path>,
    opts: &GlobalOptions,
) -> anyhow::Result<()> {
    let class = load_class(path)?;
    let owner = class.name()?.into_owned();
    let config = TransformerConfig::default();
    let resolver = NameResolver::new(obfuscated);
    let srg = load_remapper(srg)?;
    let remapper: &dyn MemberRemapper = match &srg {
        Some(srg) => srg,
        None => &IdentityRemapper,
    };

    let methods: Vec<MethodEntry> = class
        .methods
        .iter()
        .map(|method| {
            let known_as = known_as(
                &config,
                &resolver,
                remapper,
                &owner,
                &method.name,
                &method.descriptor,
            );
            let code = method.code();
            MethodEntry {
                access: access_string(method.access),
                name: method.name.clone(),
                descriptor: method.descriptor.clone(),
                instructions: code.map(|code| code.instructions.len()),
                max_stack: code.map(|code| code.max_stack),
                max_locals: code.map(|code| code.max_locals),
                known_as,
            }
        })
        .collect();

    let output = MethodsOutput {
        mapped_class: srg
            .as_ref()
            .and_then(|srg| srg.map_class_name(&owner))
            .map(str::to_string),
        class: owner,
        count: methods.len(),
        methods,
    };

    print_output(&output, opts, |out| {
        match &out.mapped_class {
            Some(mapped) => println!("{} = {} ({} methods):", out.class, mapped, out.count),
            None => println!("{} ({} methods):", out.class, out.count),
        }
        let mut tw = TabWriter::new(&[
            ("Access", Align::Left),
            ("Method", Align::Left),
            ("Instrs", Align::Right),
            ("Stack", Align::Right),
            ("Locals", Align::Right),
            ("Known as", Align::Left),
        ])
        .indent("  ");
        let dash = || "-".to_string();
        for entry in &out.methods {
            tw.row(vec![
                entry.access.clone(),
                format!("{}{}", entry.name, entry.descriptor),
                entry.instructions.map_or_else(dash, |n| n.to_string()),
                entry.max_stack.map_or_else(dash, |n| n.to_string()),
                entry.max_locals.map_or_else(dash, |n| n.to_string()),
                entry.known_as.clone().unwrap_or_default(),
            ]);
        }
        tw.print();
    })
}
