use std::error::Error;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use fskmodem_core::{
    Decoder, Encoder, ModemConfig, ToneMap, DEFAULT_AMPLITUDE, DEFAULT_BINS, DEFAULT_FREQS,
    DEFAULT_SAMPLE_RATE, DEFAULT_SYMBOL_DURATION, DEFAULT_SYNC_SYMBOLS,
};

#[derive(Parser)]
#[command(name = "fskmodem")]
#[command(about = "16-FSK data-over-audio modem: binary payloads in and out of WAV files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a binary file into a WAV audio file
    Encode {
        /// Input binary file
        #[arg(short = 'i', value_name = "INPUT.BIN")]
        input: PathBuf,

        /// Output WAV file
        #[arg(short = 'o', value_name = "OUTPUT.WAV")]
        output: PathBuf,

        /// Peak amplitude of the generated sinusoids
        #[arg(long, default_value_t = DEFAULT_AMPLITUDE)]
        amp: i16,

        #[command(flatten)]
        opts: ModemOpts,
    },

    /// Decode a WAV audio file back into the binary payload
    Decode {
        /// Input WAV file
        #[arg(short = 'i', value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Output binary file
        #[arg(short = 'o', value_name = "OUTPUT.BIN")]
        output: PathBuf,

        #[command(flatten)]
        opts: ModemOpts,
    },
}

/// Options shared by encode and decode; they must match end-to-end.
#[derive(Args)]
struct ModemOpts {
    /// Sample rate in Hz
    #[arg(long = "sr", default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: u32,

    /// Symbol duration in seconds
    #[arg(long = "symdur", alias = "bitdur", default_value_t = DEFAULT_SYMBOL_DURATION)]
    symbol_duration: f64,

    /// Number of sync preamble symbols
    #[arg(long = "sync", default_value_t = DEFAULT_SYNC_SYMBOLS)]
    sync_symbols: usize,

    /// Tone frequency overrides in Hz, one per symbol value
    /// (free-frequency mode; mutually exclusive with --binN)
    #[arg(long)]
    f0: Option<f64>,
    #[arg(long)]
    f1: Option<f64>,
    #[arg(long)]
    f2: Option<f64>,
    #[arg(long)]
    f3: Option<f64>,
    #[arg(long)]
    f4: Option<f64>,
    #[arg(long)]
    f5: Option<f64>,
    #[arg(long)]
    f6: Option<f64>,
    #[arg(long)]
    f7: Option<f64>,
    #[arg(long)]
    f8: Option<f64>,
    #[arg(long)]
    f9: Option<f64>,
    #[arg(long)]
    f10: Option<f64>,
    #[arg(long)]
    f11: Option<f64>,
    #[arg(long)]
    f12: Option<f64>,
    #[arg(long)]
    f13: Option<f64>,
    #[arg(long)]
    f14: Option<f64>,
    #[arg(long)]
    f15: Option<f64>,

    /// DFT bin overrides, one per symbol value
    /// (bin-aligned mode, the default)
    #[arg(long)]
    bin0: Option<u32>,
    #[arg(long)]
    bin1: Option<u32>,
    #[arg(long)]
    bin2: Option<u32>,
    #[arg(long)]
    bin3: Option<u32>,
    #[arg(long)]
    bin4: Option<u32>,
    #[arg(long)]
    bin5: Option<u32>,
    #[arg(long)]
    bin6: Option<u32>,
    #[arg(long)]
    bin7: Option<u32>,
    #[arg(long)]
    bin8: Option<u32>,
    #[arg(long)]
    bin9: Option<u32>,
    #[arg(long)]
    bin10: Option<u32>,
    #[arg(long)]
    bin11: Option<u32>,
    #[arg(long)]
    bin12: Option<u32>,
    #[arg(long)]
    bin13: Option<u32>,
    #[arg(long)]
    bin14: Option<u32>,
    #[arg(long)]
    bin15: Option<u32>,
}

impl ModemOpts {
    fn config(&self, amplitude: i16) -> Result<ModemConfig, String> {
        let freqs = [
            self.f0, self.f1, self.f2, self.f3, self.f4, self.f5, self.f6, self.f7, self.f8,
            self.f9, self.f10, self.f11, self.f12, self.f13, self.f14, self.f15,
        ];
        let bins = [
            self.bin0, self.bin1, self.bin2, self.bin3, self.bin4, self.bin5, self.bin6, self.bin7,
            self.bin8, self.bin9, self.bin10, self.bin11, self.bin12, self.bin13, self.bin14,
            self.bin15,
        ];

        let any_freq = freqs.iter().any(Option::is_some);
        let any_bin = bins.iter().any(Option::is_some);
        if any_freq && any_bin {
            return Err("--fN and --binN options are mutually exclusive".to_string());
        }

        let tones = if any_freq {
            let mut table = DEFAULT_FREQS;
            for (slot, freq) in table.iter_mut().zip(freqs) {
                if let Some(freq) = freq {
                    *slot = freq;
                }
            }
            ToneMap::FreeFreq(table)
        } else {
            let mut table = DEFAULT_BINS;
            for (slot, bin) in table.iter_mut().zip(bins) {
                if let Some(bin) = bin {
                    *slot = bin;
                }
            }
            ToneMap::DftBin(table)
        };

        Ok(ModemConfig {
            sample_rate: self.sample_rate,
            symbol_duration: self.symbol_duration,
            sync_symbols: self.sync_symbols,
            amplitude,
            tones,
        })
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Encode {
            input,
            output,
            amp,
            opts,
        } => run_encode(&input, &output, amp, &opts),
        Commands::Decode {
            input,
            output,
            opts,
        } => run_decode(&input, &output, &opts),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(true).init();
}

fn run_encode(
    input: &PathBuf,
    output: &PathBuf,
    amp: i16,
    opts: &ModemOpts,
) -> Result<(), Box<dyn Error>> {
    let config = opts.config(amp)?;
    let payload = std::fs::read(input)?;
    println!("Read {} bytes from {}", payload.len(), input.display());

    let encoder = Encoder::new(config)?;
    let mut writer = BufWriter::new(File::create(output)?);
    encoder.encode_to_writer(&payload, 0, &mut writer)?;
    writer.flush()?;

    println!(
        "Encoded {} payload bytes (frame+FEC+16-FSK) to {}",
        payload.len(),
        output.display()
    );
    Ok(())
}

fn run_decode(input: &PathBuf, output: &PathBuf, opts: &ModemOpts) -> Result<(), Box<dyn Error>> {
    let config = opts.config(DEFAULT_AMPLITUDE)?;

    let decoder = Decoder::new(config)?;
    let mut reader = BufReader::new(File::open(input)?);
    let (payload, seq) = decoder.decode_from_reader(&mut reader)?;

    std::fs::write(output, &payload)?;
    println!(
        "Decoded {} payload bytes (seq {}) to {}",
        payload.len(),
        seq,
        output.display()
    );
    Ok(())
}
