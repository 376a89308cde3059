use std::path::{Path, PathBuf};

use anyhow::Context;
use veinpatch::{classfile::MethodAccessFlags, mapping::SrgRemapper, ClassFile};

/// Parse a class file from disk.
pub fn load_class(path: &Path) -> anyhow::Result<ClassFile> {
    ClassFile::from_path(path)
        .with_context(|| format!("failed to load class file: {}", path.display()))
}

/// Load an SRG mapping file, if one was given.
pub fn load_remapper(path: Option<&Path>) -> anyhow::Result<Option<SrgRemapper>> {
    path.map(|path| {
        SrgRemapper::from_path(path)
            .with_context(|| format!("failed to load mappings: {}", path.display()))
    })
    .transpose()
}

/// `Foo.class` becomes `Foo.patched.class`; other names get `.patched` appended.
pub fn patched_path(path: &Path) -> PathBuf {
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) if ext == "class" => {
            let mut name = stem.to_os_string();
            name.push(".patched.class");
            path.with_file_name(name)
        }
        _ => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".patched");
            PathBuf::from(name)
        }
    }
}

/// Lowercase flag names, space separated.
pub fn access_string(flags: MethodAccessFlags) -> String {
    flags
        .iter_names()
        .map(|(name, _)| name.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}
