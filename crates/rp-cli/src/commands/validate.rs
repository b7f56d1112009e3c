//! The validate command

use std::path::Path;

use colored::Colorize;

use crate::error::Result;

/// Validate a manifest and print a summary of what it declares.
pub fn run_validate(file: &Path) -> Result<()> {
    let provider = rp_manifest::validate_manifest(file)?;
    let location = provider.location();
    println!(
        "{} {} is valid: {} resource {}, {} API {}, location {}",
        "OK".green().bold(),
        provider.namespace.cyan(),
        provider.types.len(),
        plural(provider.types.len(), "type", "types"),
        provider.version_count(),
        plural(provider.version_count(), "version", "versions"),
        location.name
    );
    for (name, resource_type) in &provider.types {
        let versions: Vec<&str> = resource_type.api_versions.keys().map(String::as_str).collect();
        println!("   {name}: {}", versions.join(", "));
    }
    Ok(())
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}
