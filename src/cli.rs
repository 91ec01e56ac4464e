// src/cli.rs

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the command-line interface for the application
pub fn build_cli() -> Command {
    Command::new("queueloader")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Queue video URLs and download them one after another with yt-dlp")
        .arg(
            Arg::new("urls")
                .help("URLs to queue, downloaded in the order given")
                .num_args(0..)
                .index(1),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .short('o')
                .help("Folder downloads are saved to")
                .value_name("DIRECTORY"),
        )
        .arg(
            Arg::new("ytdlp")
                .long("ytdlp")
                .help("yt-dlp executable to run")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Give up on a single download after this many seconds (0 disables)")
                .value_name("SECONDS")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("interactive")
                .long("interactive")
                .short('i')
                .help("Read URLs and commands from standard input")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("save-settings")
                .long("save-settings")
                .help("Remember the output folder, yt-dlp path and timeout for later runs")
                .action(ArgAction::SetTrue),
        )
}
