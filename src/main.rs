//! # Remotepack CLI
//!
//! Command-line interface for building and downloading remote control data.
//!
//! ## Usage
//!
//! ```bash
//! # Pack the demo configuration to a file
//! remotepack remote.dat
//!
//! # Pack and show the per-entity layout
//! remotepack --verbose remote.dat
//!
//! # Pack, write the file, then download and verify over serial
//! remotepack --download remote.dat
//!
//! # Use a different serial device
//! remotepack --download --device /dev/ttyACM1 remote.dat
//! ```

use clap::Parser;
use std::fs;
use std::path::PathBuf;

use remotepack::{
    PackError, demo,
    pack::Package,
    transport::{SerialTransport, serial},
};

/// Remotepack - remote control data packer
#[derive(Parser, Debug)]
#[command(name = "remotepack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output path for the packed blob
    output: PathBuf,

    /// Write the packed blob to the output path (the default)
    #[arg(long)]
    save: bool,

    /// Also download the blob to the remote over serial and verify it
    #[arg(long)]
    download: bool,

    /// Serial device path
    #[arg(long, default_value = serial::DEFAULT_DEVICE)]
    device: String,

    /// Show the per-entity layout of the packed blob
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), PackError> {
    let cli = Cli::parse();

    let config = demo::living_room()?;

    let mut package = Package::new();
    package.append(Box::new(config));

    if cli.verbose {
        println!("{:>8}  {:>6}  description", "offset", "size");
        for entry in package.layout() {
            println!(
                "{:>8}  {:>6}  {}",
                format!("0x{:05X}", entry.offset),
                entry.size,
                entry.description
            );
        }
        println!();
    }

    let blob = package.pack()?;

    fs::write(&cli.output, &blob)?;
    println!("Packed {} bytes to {}", blob.len(), cli.output.display());

    if cli.download {
        let mut transport = SerialTransport::open(&cli.device)?;
        println!("Downloading to {}...", cli.device);
        transport.download(&blob)?;
        transport.verify(&blob)?;
        println!("Downloaded and verified successfully!");
    }

    Ok(())
}
