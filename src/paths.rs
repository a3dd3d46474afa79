use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const BIN_DIR: &str = "bin";
const CONF_DIR: &str = "conf";
const DATA_DIR: &str = "data";
const HOME_ENV: &str = "SOLUTIONS_HOME";

/// `SOLUTIONS_HOME` if set, otherwise derived from the executable location.
pub fn install_root() -> Result<PathBuf> {
    match std::env::var(HOME_ENV) {
        Ok(home) if home.trim().is_empty() => anyhow::bail!("{} is set but empty", HOME_ENV),
        Ok(home) => Ok(PathBuf::from(home)),
        Err(_) => {
            let exe = std::env::current_exe().context("Failed to resolve executable path")?;
            root_for_executable(&exe)
        }
    }
}

/// A binary installed as `<root>/bin/solutions` belongs to `<root>`;
/// anywhere else the executable's own directory is the root.
fn root_for_executable(exe: &Path) -> Result<PathBuf> {
    let exe_dir = exe
        .parent()
        .context("Failed to resolve executable directory")?;

    if exe_dir.file_name().and_then(|name| name.to_str()) != Some(BIN_DIR) {
        return Ok(exe_dir.to_path_buf());
    }
    exe_dir
        .parent()
        .map(Path::to_path_buf)
        .context("Failed to resolve install root from bin")
}

pub fn conf_dir() -> Result<PathBuf> {
    Ok(install_root()?.join(CONF_DIR))
}

pub fn data_dir() -> Result<PathBuf> {
    Ok(install_root()?.join(DATA_DIR))
}
