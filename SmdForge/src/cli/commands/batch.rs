//! CLI interface for directory and archive batches

use std::sync::Once;

use crate::cli::progress::{GEAR, LOOKING_GLASS, WARNING, batch_bar, print_done, print_step};
use crate::config::Config;
use crate::converter::{BatchPhase, Direction, batch_convert};

use super::BatchArgs;

pub fn execute(args: &BatchArgs, direction: Direction) -> anyhow::Result<()> {
    let config = Config::load();
    let mut options = config.batch_options(direction);
    if let Some(variant) = args.variant {
        options.variant = variant;
    }
    if args.sequential {
        options.parallel = false;
    }
    if args.stop_on_error {
        options.stop_on_error = true;
    }
    if let Some(dir) = &args.error_log {
        options.error_log_dir = Some(dir.clone());
    }

    print_step(
        1,
        2,
        LOOKING_GLASS,
        &format!(
            "Scanning {} for {} ({})",
            args.input.display(),
            direction,
            options.variant
        ),
    );

    let pb = batch_bar(args.quiet);
    let announce = Once::new();
    let result = batch_convert(&args.input, &args.output, &options, |progress| {
        if progress.phase == BatchPhase::Converting {
            announce.call_once(|| {
                pb.println(format!(
                    "{} {}Converting {} files",
                    console::style("[2/2]").bold().dim(),
                    GEAR,
                    progress.total
                ));
            });
        }
        pb.set_length(progress.total as u64);
        pb.set_position(progress.current as u64);
        if let Some(ref name) = progress.current_file {
            pb.set_message(name.clone());
        }
    })?;
    pb.finish_and_clear();

    if result.processed + result.not_started == 0 {
        println!("No model files found in: {}", args.input.display());
        return Ok(());
    }

    println!();
    println!("Conversion complete:");
    println!("  Processed: {}", result.processed);
    println!("  Success: {}", result.successful);
    println!("  Failed: {}", result.failed());
    if result.not_started > 0 {
        println!("  Not started: {}", result.not_started);
    }

    if !result.failures.is_empty() {
        println!();
        println!("{WARNING}Failures:");
        for failure in &result.failures {
            println!("  {}", failure.error);
        }
        if let Some(log) = &result.error_log {
            println!("Error log written to {}", log.display());
        }
    }

    print_done(result.elapsed);

    if result.is_success() {
        Ok(())
    } else {
        anyhow::bail!("{} of {} files failed", result.failed(), result.processed)
    }
}
