//! pwfile: inspect and create password files from the command line.
//!
//! Usage:
//!   pwfile <FILE> info
//!   pwfile <FILE> tree
//!   pwfile <FILE> get web mail
//!   pwfile <FILE> export vault.txt
//!   pwfile <FILE> init
//!
//! The password comes from `--password` or `PWFILE_PASSWORD`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use passwordfile_core::file::render_text;
use passwordfile_core::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const MASK: &str = "********";

#[derive(Parser, Debug)]
#[command(name = "pwfile")]
#[command(about = "Read and create encrypted password files")]
struct Args {
    /// Password file to operate on
    file: String,

    /// Password (prefer the environment variable)
    #[arg(short, long, env = "PWFILE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// JSON codec configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print load/save telemetry as JSON to stderr
    #[arg(long)]
    telemetry: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show version, features and entry counts
    Info,
    /// Print the entry hierarchy
    Tree,
    /// Write the entries to a plain-text file (unencrypted!)
    Export {
        target: PathBuf,
    },
    /// Create a new file with an empty "accounts" root
    Init {
        /// Skip encryption and password hashing
        #[arg(long)]
        plain: bool,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the fields of an account, or the children of a category
    Get {
        /// Labels below the root, e.g. `web mail`
        #[arg(required = true)]
        path: Vec<String>,
        /// Show password fields in clear text
        #[arg(long)]
        reveal: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let mut file = PasswordFile::new();
    file.set_path(&args.file);
    if let Some(pw) = &args.password {
        file.set_password(pw.as_str());
    }
    if let Some(path) = &args.config {
        let cfg = CodecConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        file.set_config(cfg)?;
    }

    match &args.command {
        Command::Info => info_cmd(&mut file)?,
        Command::Tree => {
            load(&mut file)?;
            let root = file.root_entry().context("file has no root entry")?;
            print!("{}", render_text(file.tree(), root)?);
        }
        Command::Export { target } => {
            load(&mut file)?;
            file.export_to_textfile(target)
                .with_context(|| format!("exporting to {}", target.display()))?;
            info!(path = %target.display(), "exported");
        }
        Command::Init { plain, force } => init_cmd(&mut file, *plain, *force)?,
        Command::Get { path, reveal } => get_cmd(&mut file, path, *reveal)?,
    }

    if args.telemetry {
        if let Some(t) = file.last_telemetry() {
            eprintln!("{}", t.to_json()?);
        }
    }
    Ok(())
}

fn load(file: &mut PasswordFile) -> Result<()> {
    file.open(OpenOptions::READ_ONLY)
        .with_context(|| format!("opening {}", file.path()))?;
    if file.is_encryption_used() && file.password().is_empty() {
        bail!("{} is encrypted; pass --password or set PWFILE_PASSWORD", file.path());
    }
    file.load().with_context(|| format!("loading {}", file.path()))?;
    debug!(version = file.version(), "loaded");
    Ok(())
}

fn info_cmd(file: &mut PasswordFile) -> Result<()> {
    file.open(OpenOptions::READ_ONLY)
        .with_context(|| format!("opening {}", file.path()))?;
    let encrypted = file.is_encryption_used();
    println!("Encrypted:            {}", if encrypted { "yes" } else { "no" });
    println!("Size:                 {} bytes", file.size()?);

    if encrypted && file.password().is_empty() {
        println!("(password required for details)");
        return Ok(());
    }
    file.load().with_context(|| format!("loading {}", file.path()))?;
    print!("{}", file.summary(file.save_options()));
    Ok(())
}

fn init_cmd(file: &mut PasswordFile, plain: bool, force: bool) -> Result<()> {
    if !force && std::path::Path::new(file.path()).exists() {
        bail!("{} already exists; use --force to overwrite", file.path());
    }
    let options = if plain { SaveOptions::COMPRESSION } else { SaveOptions::recommended() };
    if options.contains(SaveOptions::ENCRYPTION) && file.password().is_empty() {
        bail!("a password is required for an encrypted file");
    }
    file.generate_root_entry();
    file.create().with_context(|| format!("creating {}", file.path()))?;
    file.save(options)?;
    println!("created {} (version {}, {})", file.path(), file.version(), options);
    Ok(())
}

fn get_cmd(file: &mut PasswordFile, path: &[String], reveal: bool) -> Result<()> {
    load(file)?;
    let root = file.root_entry().context("file has no root entry")?;
    let tree = file.tree();
    let Some(id) = tree.find_by_path(root, path, false)? else {
        bail!("no entry at {}", path.join("/"));
    };

    match tree.entry(id)?.kind() {
        EntryKind::Node(_) => {
            for child in tree.children(id)? {
                let e = tree.entry(*child)?;
                let marker = if e.is_node() { "/" } else { "" };
                println!("{}{}", e.label(), marker);
            }
        }
        EntryKind::Account(_) => {
            for field in tree.fields(id)? {
                let value = match field.field_type() {
                    FieldType::Password if !reveal => MASK,
                    _ => field.value(),
                };
                println!("{:<15} {}", field.name(), value);
            }
        }
    }
    Ok(())
}
