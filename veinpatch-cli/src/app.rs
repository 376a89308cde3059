use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// veinpatch - wire the VeinMiner handler into ItemInWorldManager class files
#[derive(Debug, Parser)]
#[command(name = "veinpatch", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Patch an ItemInWorldManager class file.
    Patch {
        /// Path to the class file.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Where to write the patched class. Defaults to <FILE> with a `.patched.class` suffix.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Look for SRG names instead of canonical names.
        #[arg(long)]
        obfuscated: bool,

        /// Name the class is stored under. Together with --transformed-name, a mismatch
        /// implies --obfuscated.
        #[arg(long, requires = "transformed_name")]
        name: Option<String>,

        /// Deobfuscated binary name of the class.
        #[arg(long, requires = "name")]
        transformed_name: Option<String>,

        /// SRG mapping file used to map raw member names.
        #[arg(long, value_name = "FILE")]
        srg: Option<PathBuf>,

        /// Patch in memory and report, without writing the result.
        #[arg(long)]
        dry_run: bool,
    },

    /// List the methods of a class file.
    Methods {
        /// Path to the class file.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Recognise SRG names of the patched members.
        #[arg(long)]
        obfuscated: bool,

        /// SRG mapping file used to map the class and raw member names.
        #[arg(long, value_name = "FILE")]
        srg: Option<PathBuf>,
    },

    /// Disassemble method bodies.
    Disasm {
        /// Path to the class file.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Only methods whose name contains this string.
        #[arg(short, long)]
        method: Option<String>,

        /// Show the encoded bytes of every instruction.
        #[arg(long)]
        bytes: bool,
    },

    /// Print the built-in canonical to SRG name table.
    Names {
        /// Print the names an obfuscated environment resolves to.
        #[arg(long)]
        obfuscated: bool,
    },
}
