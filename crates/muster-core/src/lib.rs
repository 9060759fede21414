pub mod cli;
pub mod commands;
pub mod config;
pub mod dates;
pub mod group;
pub mod holiday;
pub mod render;
pub mod report;
pub mod segment;
pub mod session;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use crate::session::Session;

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let pre = cli::preprocess_args(&raw_args)?;
    let cli = cli::GlobalCli::parse_from(pre.cleaned_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(verbose = cli.verbose, quiet = cli.quiet, "starting muster");
    debug!(?pre.rc_overrides, "preprocessed rc overrides");

    let mut cfg = config::Config::load(cli.musterrc.as_deref())?;
    cfg.apply_overrides(
        pre.rc_overrides
            .into_iter()
            .chain(cli.rc_overrides.into_iter().map(|kv| (kv.key, kv.value))),
    );

    let mode = cfg.merge_mode()?;
    let format = cfg.display_format()?;
    let holidays = cfg
        .holiday_provider()
        .context("failed to resolve holiday table")?;
    info!(
        mode = mode.as_str(),
        format = format.as_str(),
        region = holidays.name(),
        "session options resolved"
    );

    let mut session = Session::new(mode, format, holidays);
    let mut renderer = render::Renderer::new(&cfg)?;

    if cli.rest.is_empty() {
        commands::repl(&mut session, &cfg, &mut renderer)?;
    } else {
        // One-shot invocation: run the trailing tokens as a single
        // command. Nothing outlives the process, so skip prompts.
        let line = cli
            .rest
            .iter()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let mut auto_confirm = |_: &str| true;
        commands::dispatch_line(&mut session, &cfg, &mut renderer, &line, &mut auto_confirm)?;
    }

    info!("done");
    Ok(())
}
