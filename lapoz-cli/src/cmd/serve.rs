use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use lapoz_server::{DocsServer, ServerConfig};
use std::path::PathBuf;

use super::build::add_content_args;
use crate::config::LapozConfig;

pub fn make_subcommand() -> Command {
    add_content_args(Command::new("serve"))
        .about("Serve the documentation, rendering pages on request")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .value_parser(clap::value_parser!(u16))
                .help("Port to serve on [default: 3000]"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Host to bind to [default: 127.0.0.1]"),
        )
        .arg(
            Arg::new("open")
                .long("open")
                .help("Open browser automatically")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-reload")
                .long("no-reload")
                .help("Do not watch files or reload connected browsers")
                .action(ArgAction::SetTrue),
        )
}

pub async fn execute(args: &ArgMatches) -> Result<()> {
    // Load cascading configuration
    let config = LapozConfig::load(args)?;
    let theme_dir = config.build.theme_dir();
    let build = config.build;

    let server_config = ServerConfig {
        host: build.host,
        port: build.port,
        content_dir: PathBuf::from(build.content),
        theme_dir,
        public_dir: PathBuf::from(build.public),
        site: config.site,
        live_reload: build.live_reload,
        open: build.open,
        ..ServerConfig::default()
    };

    DocsServer::new(server_config).run().await
}
