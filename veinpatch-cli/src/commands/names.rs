use serde::Serialize;
use veinpatch::mapping::{NameResolver, BUILTIN_MAPPINGS};

use crate::{
    app::GlobalOptions,
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct NameEntry {
    canonical: &'static str,
    resolved: &'static str,
}

#[derive(Debug, Serialize)]
struct NamesOutput {
    mode: &'static str,
    names: Vec<NameEntry>,
}

pub fn run(obfuscated: bool, opts: &GlobalOptions) -> anyhow::Result<()> {
    let resolver = NameResolver::new(obfuscated);
    let output = NamesOutput {
        mode: if resolver.is_obfuscated() {
            "srg"
        } else {
            "canonical"
        },
        names: BUILTIN_MAPPINGS
            .iter()
            .map(|&(canonical, _)| NameEntry {
                canonical,
                resolved: resolver.resolve(canonical),
            })
            .collect(),
    };

    print_output(&output, opts, |out| {
        println!("Names as resolved in {} mode:", out.mode);
        let mut tw = TabWriter::new(&[("Canonical", Align::Left), ("Resolved", Align::Left)])
            .indent("  ");
        for entry in &out.names {
            tw.row(vec![entry.canonical.to_string(), entry.resolved.to_string()]);
        }
        tw.print();
    })
}
