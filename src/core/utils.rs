use dirs::home_dir;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

const DEFAULT_DIR_NAME: &str = ".stall_ledger";
const HOME_ENV: &str = "STALL_LEDGER_HOME";
const STORE_FILE: &str = "store.json";
const CONFIG_FILE: &str = "config.json";

/// Resolves the files the engine keeps under its application directory.
pub struct PathResolver;

impl PathResolver {
    /// Application data directory: `$STALL_LEDGER_HOME`, else `~/.stall_ledger`.
    pub fn base_dir() -> PathBuf {
        if let Some(custom) = env::var_os(HOME_ENV) {
            return PathBuf::from(custom);
        }
        home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DIR_NAME)
    }

    pub fn store_file_in(base: &Path) -> PathBuf {
        base.join(STORE_FILE)
    }

    pub fn config_file_in(base: &Path) -> PathBuf {
        base.join(CONFIG_FILE)
    }
}

pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_under_base() {
        let base = PathBuf::from("/srv/fair");
        assert_eq!(
            PathResolver::store_file_in(&base),
            PathBuf::from("/srv/fair/store.json")
        );
        assert_eq!(
            PathResolver::config_file_in(&base),
            PathBuf::from("/srv/fair/config.json")
        );
    }
}
