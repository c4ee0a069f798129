use std::collections::HashMap;

use anyhow::{anyhow, Result};
use regex::Regex;

use crate::domain::model::ClassTable;

/// Parsea la entrada `names` de los metadatos de un export Ultralytics,
/// con forma `{0: 'Green Light', 1: 'Red Light', ...}`.
pub fn parse_names(raw: &str) -> Result<ClassTable> {
    let re = Regex::new(r#"(\d+)\s*:\s*['"]([^'"]*)['"]"#).expect("regex estática");

    let mut names = HashMap::new();
    for cap in re.captures_iter(raw) {
        let id: usize = cap[1].parse()?;
        names.insert(id, cap[2].to_string());
    }

    if names.is_empty() {
        return Err(anyhow!("formato de 'names' no reconocido: {raw}"));
    }
    Ok(ClassTable::new(names))
}
