//! Human-readable output.

use colored::Colorize;

use rp_register::{Call, CallKind, ProgressEvent};

/// Print a registration progress event as one line on stdout.
pub fn print_progress(event: &ProgressEvent<'_>) {
    match event {
        ProgressEvent::Conflict { .. } => println!("{} {}", "!!".yellow().bold(), event),
        ProgressEvent::TypeRegistered { .. } => println!("{} {}", "OK".green().bold(), event),
        _ => println!("{} {}", "=>".blue().bold(), event),
    }
}

/// One line per recorded call, in the form a live run would send it.
pub fn describe_call(call: &Call) -> String {
    let method = match call.kind {
        CallKind::GetProvider | CallKind::GetResourceType | CallKind::GetApiVersion | CallKind::GetLocation => "GET",
        _ => "PUT",
    };
    format!("{method} {}/{}", call.plane, call.target)
}

pub fn print_dry_run(calls: &[Call]) {
    println!(
        "{} {} calls recorded, nothing was sent:",
        "DRY RUN".yellow().bold(),
        calls.len()
    );
    for call in calls {
        println!("   {}", describe_call(call));
    }
}
