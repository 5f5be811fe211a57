use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::*;
use human_panic::setup_panic;
use log::*;
use snaprotate::{BtrfsClient, BtrfsError, Config, SubvolumeInfo};
use std::path::PathBuf;
use std::process;

fn main() {
    setup_panic!();

    let options = CliOptions::parse();
    let level = match options.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    pretty_env_logger::formatted_builder().filter_level(level).init();

    debug!("Debug verbosity enabled.");
    trace!("Trace verbosity enabled.");

    match command_dispatch(options) {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("{}", e);
            for cause in e.chain().skip(1) {
                debug!("Caused by: {}", cause);
            }
            if let Some(BtrfsError::Execution { stderr, .. }) = e.downcast_ref::<BtrfsError>() {
                if !stderr.trim().is_empty() {
                    error!("btrfs: {}", stderr.trim());
                }
            }
            process::exit(1);
        }
    }
}

fn command_dispatch(options: CliOptions) -> Result<i32> {
    let mut config = Config::from_env().context("Failed to read SNAPROTATE_ configuration.")?;
    if options.btrfs_exe.is_some() {
        config.btrfs_exe = options.btrfs_exe;
    }
    let client = BtrfsClient::from_config(&config)?;
    debug!("Using btrfs executable {:?}.", client.executable());

    match options.subcmd {
        Commands::Snapshot { source, dest } => {
            client
                .create_snapshot(&source, &dest)
                .with_context(|| format!("Failed to snapshot {:?} to {:?}.", source, dest))?;
            info!("Created snapshot {:?}.", dest);
        }
        Commands::Delete { path } => {
            client
                .delete_snapshot(&path)
                .with_context(|| format!("Failed to delete snapshot {:?}.", path))?;
            info!("Deleted snapshot {:?}.", path);
        }
        Commands::List { path, json } => {
            let subvolumes = client
                .list_subvolumes(&path)
                .with_context(|| format!("Failed to list subvolumes of {:?}.", path))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&subvolumes)?);
            } else {
                subvolumes.iter().for_each(|s| println!("{}", s));
            }
        }
        Commands::Show { path, json } => {
            let info = client
                .show_subvolume(&path)
                .with_context(|| format!("Failed to show subvolume {:?}.", path))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print_info_table(&info);
            }
        }
        Commands::Probe { path } => {
            let is_btrfs = client.is_btrfs_path(&path);
            println!("{}", if is_btrfs { "yes" } else { "no" });
            return Ok(if is_btrfs { 0 } else { 1 });
        }
        Commands::Version => {
            let version = client.version().context("Failed to query btrfs version.")?;
            println!("{}", version);
        }
    }

    Ok(0)
}

fn print_info_table(info: &SubvolumeInfo) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Attribute").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

    info.iter().for_each(|(k, v)| {
        table.add_row(vec![Cell::new(k).fg(Color::Blue), Cell::new(v)]);
    });

    println!("{}", table);
}

#[derive(Parser)]
#[clap(version, author, about)]
struct CliOptions {
    /// Enable debug logs. Use twice to enable trace logs.
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Path to the btrfs executable. Overrides SNAPROTATE_BTRFS_EXE.
    #[clap(long, value_name = "PATH")]
    btrfs_exe: Option<PathBuf>,
    #[clap(subcommand)]
    subcmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Snapshot a subvolume.
    Snapshot { source: PathBuf, dest: PathBuf },
    /// Delete a snapshot subvolume.
    Delete { path: PathBuf },
    /// List the subvolumes below a path.
    List {
        path: PathBuf,
        /// Print a JSON array.
        #[clap(long)]
        json: bool,
    },
    /// Show the attributes of a subvolume.
    Show {
        path: PathBuf,
        /// Print a JSON object.
        #[clap(long)]
        json: bool,
    },
    /// Exit with status 0 when the path is on btrfs.
    Probe { path: PathBuf },
    /// Print the btrfs-progs version.
    Version,
}
