//! Command implementations for rp-cli

pub mod completions;
pub mod register;
pub mod register_dir;
pub mod register_type;
pub mod validate;

use std::future::Future;

use tracing::warn;

use rp_register::Context;

use crate::config::Settings;
use crate::error::Result;

pub use completions::run_completions;
pub use register::run_register;
pub use register_dir::run_register_dir;
pub use register_type::run_register_type;
pub use validate::run_validate;

/// Drive an async command to completion.
///
/// The command receives a context bounded by the configured timeout and
/// canceled on Ctrl-C.
pub fn block_on<F, Fut>(settings: &Settings, command: F) -> Result<()>
where
    F: FnOnce(Context) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(async {
        let ctx = settings.context();
        let interrupt = ctx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, canceling registration");
                interrupt.cancel();
            }
        });
        command(ctx).await
    })
}
