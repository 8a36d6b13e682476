//! `.env` loading for the `dotenv-load` setting

use crate::error::{ConfigError, ConfigResult};
use crate::runner::Environment;
use std::path::Path;
use tracing::debug;

/// Name of the file loaded next to the recipe file
pub const DOTENV_FILENAME: &str = ".env";

/// Load `.env` from `dir`. A missing file yields an empty environment.
pub fn load_dotenv(dir: &Path) -> ConfigResult<Environment> {
    let path = dir.join(DOTENV_FILENAME);
    if !path.is_file() {
        return Ok(Environment::new());
    }

    let dotenv_error = |error: dotenvy::Error| ConfigError::Dotenv {
        path: path.display().to_string(),
        error: error.to_string(),
    };

    let mut environment = Environment::new();
    for item in dotenvy::from_path_iter(&path).map_err(dotenv_error)? {
        let (key, value) = item.map_err(dotenv_error)?;
        environment.insert(key, value);
    }

    debug!(
        path = %path.display(),
        variables = environment.len(),
        "loaded dotenv file"
    );
    Ok(environment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_dotenv_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_dotenv(temp_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_load_dotenv_pairs() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(".env"),
            "# settings\nDATABASE_URL=postgres://localhost/db\nQUOTED=\"a b\"\n",
        )
        .unwrap();

        let environment = load_dotenv(temp_dir.path()).unwrap();
        assert_eq!(
            environment.get("DATABASE_URL"),
            Some(&"postgres://localhost/db".to_string())
        );
        assert_eq!(environment.get("QUOTED"), Some(&"a b".to_string()));
    }
}
