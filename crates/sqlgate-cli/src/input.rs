//! Reading SQL input from files or stdin.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// A named SQL source.
pub struct SqlSource {
    pub name: String,
    pub sql: String,
}

/// Reads the given files, or stdin when none are provided.
pub fn read_input(files: &[PathBuf]) -> Result<Vec<SqlSource>> {
    if files.is_empty() {
        let mut sql = String::new();
        std::io::stdin()
            .read_to_string(&mut sql)
            .context("failed to read from stdin")?;
        return Ok(vec![SqlSource {
            name: "<stdin>".to_string(),
            sql,
        }]);
    }

    files
        .iter()
        .map(|path| {
            let sql = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(SqlSource {
                name: path.display().to_string(),
                sql,
            })
        })
        .collect()
}
