use std::{
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::bail;
use veinpatch::{assembly::encode, classfile::Code, ClassFile};

use crate::commands::common::{access_string, load_class};

pub fn run(path: &Path, method_filter: Option<&str>, bytes: bool) -> anyhow::Result<()> {
    let class = load_class(path)?;

    let stdout = io::stdout();
    let mut w = BufWriter::new(stdout.lock());

    writeln!(w, "class {}", class.name()?)?;
    let mut shown = 0;
    for method in &class.methods {
        if method_filter.is_some_and(|filter| !method.name.contains(filter)) {
            continue;
        }
        shown += 1;

        writeln!(w)?;
        writeln!(
            w,
            "  {} {}{}",
            access_string(method.access),
            method.name,
            method.descriptor
        )?;
        match method.code() {
            Some(code) => format_code(&mut w, &class, &method.name, code, bytes)?,
            None => writeln!(w, "    // no code")?,
        }
    }

    if shown == 0 {
        if let Some(filter) = method_filter {
            bail!("no methods matching '{filter}' found");
        }
    }

    w.flush()?;
    Ok(())
}

fn format_code(
    w: &mut impl Write,
    class: &ClassFile,
    method: &str,
    code: &Code,
    bytes: bool,
) -> anyhow::Result<()> {
    let encoded = encode(&code.instructions, method)?;
    writeln!(
        w,
        "    // max_stack {}, max_locals {}, {} bytes",
        code.max_stack,
        code.max_locals,
        encoded.bytes.len()
    )?;

    for (index, instruction) in code.instructions.iter().enumerate() {
        let start = encoded.offsets[index];
        write!(w, "    #{index:<4} {start:>5}: ")?;
        if bytes {
            let end = encoded.offsets[index + 1];
            let hex: Vec<String> = encoded.bytes[start..end]
                .iter()
                .map(|b| format!("{b:02X}"))
                .collect();
            write!(w, "{:<16} ", hex.join(" "))?;
        }
        writeln!(w, "{instruction}")?;
    }

    for handler in &code.exception_table {
        let catch = if handler.catch_type == 0 {
            "any".to_string()
        } else {
            class.pool.class_name(handler.catch_type)?.into_owned()
        };
        writeln!(
            w,
            "    catch {catch} [#{}, #{}) -> #{}",
            handler.start, handler.end, handler.handler
        )?;
    }
    Ok(())
}
