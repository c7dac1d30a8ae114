use crate::validation::{FieldKind, validate_field};
use anyhow::Result;
use colored::Colorize;

pub fn handle_validate(kind: FieldKind, value: &str) -> Result<()> {
    validate_field(kind, value)?;
    println!("{} {}", "Valid".green(), value);
    Ok(())
}
