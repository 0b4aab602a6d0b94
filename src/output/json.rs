use crate::error::Result;
use crate::model::DuplicateHostKey;

pub fn render_json(duplicates: &[DuplicateHostKey]) -> Result<String> {
    let mut json = serde_json::to_string_pretty(duplicates)?;
    json.push('\n');
    Ok(json)
}
