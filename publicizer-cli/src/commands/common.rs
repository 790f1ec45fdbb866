use std::{
    io::BufRead,
    path::{Path, PathBuf},
};

use anyhow::Context;
use publicizer::Module;

/// Load a .NET module for inspection.
pub fn load_module(path: &Path) -> anyhow::Result<Module> {
    Module::from_path(path).with_context(|| format!("failed to load assembly: {}", path.display()))
}

/// Collect the `.dll` files directly inside `dir`, sorted by path.
pub fn collect_dlls(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_dll(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Returns true if the path has a `.dll` extension, ignoring case.
pub fn is_dll(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("dll"))
}

/// Extract a display-friendly filename from a path.
pub fn file_display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}

/// Block until a line is read from stdin.
pub fn wait_for_enter() -> anyhow::Result<()> {
    eprintln!("Press Enter to exit...");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(())
}
