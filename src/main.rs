/*!
 * vfsctl
 * Command-line access to a local-disk mount point
 */

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing::info;

use workspace_vfs::{init_tracing, MountConfig, MountPoint, Path};

/// Inspect and maintain a local-disk VFS mount point
#[derive(Parser, Debug)]
#[command(name = "vfsctl")]
struct Cli {
    /// Native directory backing the mount point
    #[arg(long, env = "VFS_ROOT", default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a folder
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Print file content
    Cat { path: String },
    /// md5 of every file below a path
    Hash { path: String },
    /// Print properties as JSON
    Props { path: String },
    /// Export a folder as a zip archive
    Zip { folder: String, archive: PathBuf },
    /// Import a zip archive into a folder
    Unzip {
        archive: PathBuf,
        folder: String,
        /// Replace existing files
        #[arg(long)]
        overwrite: bool,
        /// Leading path levels to drop from every entry
        #[arg(long, default_value_t = 0)]
        skip: usize,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mount = MountPoint::builder(&cli.root)
        .with_config(MountConfig::from_env().with_background_indexing(false))
        .build()?;
    info!(root = %cli.root.display(), "mounted");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Ls { path } => {
            let folder = mount.get_existing(&path)?;
            for child in folder.children()? {
                let marker = if child.is_folder() { "/" } else { "" };
                writeln!(out, "{:>10}  {}{}", child.length()?, child.name(), marker)
                    .into_diagnostic()?;
            }
        }
        Command::Cat { path } => {
            let file = mount.get_existing(&path)?;
            let mut content = file.get_content()?;
            io::copy(&mut content, &mut out).into_diagnostic()?;
        }
        Command::Hash { path } => {
            let item = mount.get_existing(&path)?;
            for (relative, digest) in item.content_hashes()? {
                writeln!(out, "{}  {}", digest, relative).into_diagnostic()?;
            }
        }
        Command::Props { path } => {
            let item = mount.get_existing(&path)?;
            let json = serde_json::to_string_pretty(&item.get_properties()?).into_diagnostic()?;
            writeln!(out, "{}", json).into_diagnostic()?;
        }
        Command::Zip { folder, archive } => {
            let folder = mount.get_existing(&folder)?;
            let mut content = folder.zip()?;
            let mut file = File::create(&archive).into_diagnostic()?;
            let written = io::copy(&mut content, &mut file).into_diagnostic()?;
            info!(
                folder = %folder,
                archive = %archive.display(),
                bytes = written,
                "archive written"
            );
        }
        Command::Unzip {
            archive,
            folder,
            overwrite,
            skip,
        } => {
            let folder = mount.get_virtual_file(&Path::parse(&folder)?);
            let file = File::open(&archive).into_diagnostic()?;
            folder.unzip(io::BufReader::new(file), overwrite, skip)?;
        }
    }

    out.flush().into_diagnostic()?;
    Ok(())
}
