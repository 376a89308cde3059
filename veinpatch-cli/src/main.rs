mod app;
mod commands;
mod output;

use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .expect("failed to set Ctrl+C handler");

    let cli = Cli::parse();

    // veinpatch info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("veinpatch", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Patch {
            path,
            output,
            obfuscated,
            name,
            transformed_name,
            srg,
            dry_run,
        } => commands::patch::run(
            path,
            &commands::patch::PatchOptions {
                output: output.as_deref(),
                obfuscated: *obfuscated,
                name: name.as_deref(),
                transformed_name: transformed_name.as_deref(),
                srg: srg.as_deref(),
                dry_run: *dry_run,
                global: &cli.global,
            },
        ),
        Command::Methods {
            path,
            obfuscated,
            srg,
        } => commands::methods::run(path, *obfuscated, srg.as_deref(), &cli.global),
        Command::Disasm { path, method, bytes } => {
            commands::disasm::run(path, method.as_deref(), *bytes)
        }
        Command::Names { obfuscated } => commands::names::run(*obfuscated, &cli.global),
    }
}
