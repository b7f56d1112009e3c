//! The register-type command

use std::path::Path;

use crate::commands::block_on;
use crate::config::Settings;
use crate::error::Result;

/// Register a single type from a manifest into an existing provider.
pub fn run_register_type(settings: &Settings, file: &Path, type_name: &str) -> Result<()> {
    let registrar = settings.registrar(settings.client()?);
    block_on(settings, |ctx| async move {
        registrar.register_single_type(&ctx, file, type_name).await?;
        Ok(())
    })
}
