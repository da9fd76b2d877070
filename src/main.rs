//! `mxl2mid` converts a MusicXML vocal score into a Standard MIDI File.

use anyhow::Context;
use clap::Parser;
use mxl2mid::midi::defaults::DEFAULT_CHARSET;
use mxl2mid::{convert_file, parse_musicxml, ConversionSettings};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mxl2mid", author, version, about, long_about = None)]
struct Args {
    /// MusicXML (partwise) file to convert
    input: PathBuf,

    /// Output file (defaults to INPUT.mid)
    output: Option<PathBuf>,

    /// Charset for lyric text (any WHATWG label, e.g. "Shift_JIS", "EUC-KR")
    #[arg(short, long, default_value = DEFAULT_CHARSET)]
    charset: String,

    /// Write lyrics as UTF-8 without transcoding
    #[arg(long, conflicts_with = "charset")]
    raw_text: bool,

    /// Print the parsed score as JSON instead of converting
    #[arg(long)]
    dump_score: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.dump_score {
        let xml = std::fs::read(&args.input)
            .with_context(|| format!("error while reading {}", args.input.display()))?;
        let score = parse_musicxml(&xml)
            .with_context(|| format!("error while parsing {}", args.input.display()))?;
        println!("{}", serde_json::to_string_pretty(&score)?);
        return Ok(());
    }

    let settings = if args.raw_text {
        ConversionSettings::raw()
    } else {
        ConversionSettings::with_charset(&args.charset)
    };

    let output = convert_file(&args.input, args.output.as_deref(), &settings)
        .with_context(|| format!("error while converting {}", args.input.display()))?;
    eprintln!("Successfully wrote {}", output.display());
    Ok(())
}
