use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use mars_core::{LoadSummary, Payload};
use mars_runtime::{InlineHost, RuntimeCore};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Entry {
    handle: u32,
    #[serde(rename = "type")]
    ty: String,
    size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<(u32, u32)>,
}

#[derive(Debug, Serialize)]
struct Report {
    records: u32,
    declared_count: u32,
    declared_size: u32,
    payload_bytes: u64,
    header_matches: bool,
    resources: Vec<Entry>,
}

impl Report {
    fn new(summary: &LoadSummary, runtime: &RuntimeCore) -> Self {
        let resources = runtime
            .resources()
            .iter()
            .map(|(handle, res)| Entry {
                handle: handle.get(),
                ty: res.resource_type().to_string(),
                size: res.payload().byte_size(),
                label: match res.payload() {
                    Payload::Label(name) => Some(name.clone()),
                    _ => None,
                },
                dimensions: res.as_bitmap().map(|b| b.dimensions()),
            })
            .collect();

        Self {
            records: summary.records,
            declared_count: summary.declared_count,
            declared_size: summary.declared_size,
            payload_bytes: summary.payload_bytes,
            header_matches: summary.matches_header(),
            resources,
        }
    }

    fn write_text<W: Write>(&self, w: &mut W) -> Result<()> {
        writeln!(
            w,
            "{} records, header declares {} resources / {} bytes{}",
            self.records,
            self.declared_count,
            self.declared_size,
            if self.header_matches { "" } else { " (mismatch)" }
        )?;
        for e in &self.resources {
            write!(w, "#{:<5} {:<12} {:>10}", e.handle, e.ty, e.size)?;
            if let Some((width, height)) = e.dimensions {
                write!(w, "  {}x{}", width, height)?;
            }
            if let Some(label) = &e.label {
                write!(w, "  {:?}", label)?;
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

fn inspect<R: Read>(reader: &mut R, decode_images: bool) -> Result<Report> {
    let mut builder = RuntimeCore::builder()
        .with_host(Arc::new(InlineHost))
        .with_unbound_warnings(false);
    if !decode_images {
        builder = builder.without_image_decoding();
    }
    let mut runtime = builder.build()?;
    let summary = runtime.load_resources(reader)?;
    Ok(Report::new(&summary, &runtime))
}

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Container to list
    input: PathBuf,

    /// Print a json document instead of a table
    #[arg(short, long)]
    json: bool,

    /// Keep images compressed instead of decoding them
    #[arg(long)]
    no_decode: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let file = File::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?;
    let report = inspect(&mut BufReader::new(file), !args.no_decode)
        .with_context(|| format!("loading {}", args.input.display()))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        report.write_text(&mut out)?;
    }
    if !report.header_matches {
        log::warn!("{}: header does not match the records", args.input.display());
    }
    Ok(())
}
