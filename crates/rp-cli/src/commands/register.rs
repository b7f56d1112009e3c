//! The register command

use std::path::Path;

use colored::Colorize;

use rp_register::{Context, ControlPlane, InMemoryControlPlane, Registrar};

use crate::commands::block_on;
use crate::config::Settings;
use crate::error::Result;
use crate::output;

/// Register one manifest file.
pub fn run_register(settings: &Settings, file: &Path, dry_run: bool) -> Result<()> {
    if dry_run {
        let registrar = settings.registrar(InMemoryControlPlane::new());
        block_on(settings, |ctx| async move {
            register(&registrar, &ctx, file).await?;
            output::print_dry_run(&registrar.client().calls());
            Ok(())
        })
    } else {
        let registrar = settings.registrar(settings.client()?);
        block_on(settings, |ctx| async move { register(&registrar, &ctx, file).await })
    }
}

async fn register<C: ControlPlane>(registrar: &Registrar<C>, ctx: &Context, file: &Path) -> Result<()> {
    let provider = registrar.register_file(ctx, file).await?;
    println!(
        "{} Registered {} with {} resource types on plane {}",
        "OK".green().bold(),
        provider.namespace.cyan(),
        provider.types.len(),
        registrar.plane()
    );
    Ok(())
}
