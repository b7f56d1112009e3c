//! The register-dir command

use std::path::Path;

use colored::Colorize;

use rp_register::{Context, ControlPlane, InMemoryControlPlane, Registrar};

use crate::commands::block_on;
use crate::config::Settings;
use crate::error::Result;
use crate::output;

/// Register every manifest in a directory.
pub fn run_register_dir(settings: &Settings, dir: &Path, dry_run: bool) -> Result<()> {
    if dry_run {
        let registrar = settings.registrar(InMemoryControlPlane::new());
        block_on(settings, |ctx| async move {
            register_dir(&registrar, &ctx, dir).await?;
            output::print_dry_run(&registrar.client().calls());
            Ok(())
        })
    } else {
        let registrar = settings.registrar(settings.client()?);
        block_on(settings, |ctx| async move { register_dir(&registrar, &ctx, dir).await })
    }
}

async fn register_dir<C: ControlPlane>(registrar: &Registrar<C>, ctx: &Context, dir: &Path) -> Result<()> {
    let files = registrar.register_directory(ctx, dir).await?;
    if files.is_empty() {
        println!("{} No manifest files found in {}", "!!".yellow().bold(), dir.display());
        return Ok(());
    }
    println!(
        "{} Registered {} manifest files from {}",
        "OK".green().bold(),
        files.len(),
        dir.display()
    );
    Ok(())
}
