use std::{fs, path::Path};

use anyhow::{bail, Context};
use log::info;
use serde::Serialize;
use veinpatch::{ClassFile, VeinMinerTransformer};

use crate::{
    app::GlobalOptions,
    commands::common::{load_remapper, patched_path},
    output::{print_output, Align, TabWriter},
};

pub struct PatchOptions<'a> {
    pub output: Option<&'a Path>,
    pub obfuscated: bool,
    pub name: Option<&'a str>,
    pub transformed_name: Option<&'a str>,
    pub srg: Option<&'a Path>,
    pub dry_run: bool,
    pub global: &'a GlobalOptions,
}

#[derive(Debug, Serialize)]
struct PatchOutput {
    file: String,
    output: Option<String>,
    class: String,
    method: String,
    descriptor: String,
    obfuscated: bool,
    anchor: usize,
    slot: u16,
    inserted: usize,
    removed: usize,
    max_stack: u16,
    max_locals: u16,
    size_before: usize,
    size_after: usize,
}

pub fn run(path: &Path, opts: &PatchOptions) -> anyhow::Result<()> {
    let mut transformer = VeinMinerTransformer::new();
    if let Some(remapper) = load_remapper(opts.srg)? {
        info!("Loaded {} mapping records", remapper.len());
        transformer = transformer.with_remapper(remapper);
    }

    if let Some(transformed_name) = opts.transformed_name {
        if !transformer.config().is_target(transformed_name) {
            bail!(
                "{transformed_name} is not {}, nothing to patch",
                transformer.config().target_class
            );
        }
    }
    let obfuscated = opts.obfuscated
        || matches!(
            (opts.name, opts.transformed_name),
            (Some(name), Some(transformed_name)) if name != transformed_name
        );

    let bytes =
        fs::read(path).with_context(|| format!("failed to read class file: {}", path.display()))?;
    let mut class = ClassFile::from_mem(&bytes)
        .with_context(|| format!("failed to load class file: {}", path.display()))?;
    let report = transformer
        .patch(&mut class, obfuscated)
        .with_context(|| format!("failed to patch {}", path.display()))?;
    let patched = class.to_bytes()?;

    let output = if opts.dry_run {
        None
    } else {
        let output = opts
            .output
            .map_or_else(|| patched_path(path), Path::to_path_buf);
        fs::write(&output, &patched)
            .with_context(|| format!("failed to write {}", output.display()))?;
        info!("Wrote {}", output.display());
        Some(output.display().to_string())
    };

    let result = PatchOutput {
        file: path.display().to_string(),
        output,
        class: report.class,
        method: report.method,
        descriptor: report.descriptor,
        obfuscated,
        anchor: report.anchor,
        slot: report.slot,
        inserted: report.inserted,
        removed: report.removed,
        max_stack: report.max_stack,
        max_locals: report.max_locals,
        size_before: bytes.len(),
        size_after: patched.len(),
    };

    print_output(&result, opts.global, |r| {
        let mut tw = TabWriter::new(&[("Field", Align::Left), ("Value", Align::Left)]);
        tw.row(vec!["Class".into(), r.class.clone()]);
        tw.row(vec!["Method".into(), format!("{}{}", r.method, r.descriptor)]);
        tw.row(vec!["Names".into(), if r.obfuscated { "srg" } else { "canonical" }.into()]);
        tw.row(vec!["Anchor".into(), format!("#{}", r.anchor)]);
        tw.row(vec!["Result slot".into(), r.slot.to_string()]);
        tw.row(vec![
            "Instructions".into(),
            format!("+{} at #{}, -1 at #{}", r.inserted, r.anchor + 1, r.removed),
        ]);
        tw.row(vec!["max_stack".into(), r.max_stack.to_string()]);
        tw.row(vec!["max_locals".into(), r.max_locals.to_string()]);
        tw.row(vec![
            "Size".into(),
            format!("{} -> {} bytes", r.size_before, r.size_after),
        ]);
        tw.row(vec![
            "Output".into(),
            r.output.clone().unwrap_or_else(|| "(dry run)".into()),
        ]);
        tw.print();
    })
}
