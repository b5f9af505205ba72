use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use lapoz_core::SiteBuilder;
use std::path::Path;

use crate::config::LapozConfig;

/// Arguments shared by `build` and `serve`.
pub fn add_content_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("content")
                .short('s')
                .long("content")
                .value_name("DIR")
                .help("Content directory holding the documentation tree [default: ./docs]"),
        )
        .arg(
            Arg::new("theme")
                .short('t')
                .long("theme")
                .value_name("DIR")
                .help("Theme directory overriding the built-in templates [default: ./theme]"),
        )
        .arg(
            Arg::new("public")
                .long("public")
                .value_name("DIR")
                .help("Static assets served as-is [default: ./public]"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file [default: ./lapoz.toml]"),
        )
}

pub fn make_subcommand() -> Command {
    add_content_args(Command::new("build"))
        .about("Render every page into a static site")
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for the generated site [default: ./out]"),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    // Load cascading configuration
    let config = LapozConfig::load(args)?;
    let build = &config.build;

    let output_dir = Path::new(&build.output);
    let mut builder = SiteBuilder::new()
        .content_dir(&build.content)
        .output_dir(output_dir)
        .public_dir(&build.public)
        .config(config.site.clone());
    if let Some(theme) = build.theme_dir() {
        builder = builder.theme_dir(theme);
    }

    let report = builder.build()?.render_all()?;

    println!(
        "Built {} pages and copied {} assets into {}",
        report.pages,
        report.assets,
        output_dir.display()
    );

    Ok(())
}
