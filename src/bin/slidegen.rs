use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use slidegen::{
    ComparisonSize, DecoderLogLevel, DocumentOptions, FrameFormat, FrameSource, ProgressCallback,
    ProgressInfo, ScratchStore, SlideError, SlideGenerator, SlideOptions, VideoSource,
};

const CLI_AFTER_HELP: &str = "Examples:\n  slidegen lecture.mp4 5 30\n  slidegen lecture.mp4 10 15 --header \"Operating Systems, week 3\" --progress\n  slidegen lecture.mp4 5 30 --output-base decks --format png --json\n  slidegen --completions zsh > _slidegen";

#[derive(Debug, Parser)]
#[command(
    name = "slidegen",
    version,
    about = "Turn a screen-recorded lecture into a slide PDF",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Video file to turn into slides.
    #[arg(value_parser = existing_file, required_unless_present = "completions")]
    video: Option<PathBuf>,

    /// Minimum percent difference (exclusive, 0-100) from the last kept frame.
    #[arg(
        value_parser = clap::value_parser!(u8).range(0..=100),
        required_unless_present = "completions"
    )]
    diff_threshold: Option<u8>,

    /// Look at every Nth decoded frame.
    #[arg(
        value_parser = clap::value_parser!(u64).range(1..),
        required_unless_present = "completions"
    )]
    skip_rate: Option<u64>,

    /// Directory in which the numbered output directory is created.
    #[arg(long, default_value = ".")]
    output_base: PathBuf,

    /// Image format for the kept frames (jpg, png).
    #[arg(long, default_value = "jpg")]
    format: FrameFormat,

    /// Text printed at the top of every page.
    #[arg(long)]
    header: Option<String>,

    /// Space above each frame in points (defaults to 40 with --header, else 0).
    #[arg(long)]
    margin: Option<u32>,

    /// Resolution frames are compared at, as WIDTHxHEIGHT.
    #[arg(long, default_value = "720x480")]
    size: ComparisonSize,

    /// Show a progress bar instead of one line per sampled frame.
    #[arg(long)]
    progress: bool,

    /// List every kept frame when done.
    #[arg(long)]
    verbose: bool,

    /// Print the run report as JSON.
    #[arg(long)]
    json: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, value_parser = parse_log_level)]
    log_level: Option<DecoderLogLevel>,

    /// Print a shell completion script and exit.
    #[arg(long, value_enum, exclusive = true)]
    completions: Option<Shell>,
}

fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("no such video file: {value}"))
    }
}

fn parse_log_level(value: &str) -> Result<DecoderLogLevel, String> {
    match value.to_ascii_lowercase().as_str() {
        "quiet" => Ok(DecoderLogLevel::Quiet),
        "fatal" => Ok(DecoderLogLevel::Fatal),
        "error" => Ok(DecoderLogLevel::Error),
        "warning" | "warn" => Ok(DecoderLogLevel::Warning),
        "info" => Ok(DecoderLogLevel::Info),
        "debug" => Ok(DecoderLogLevel::Debug),
        other => Err(format!("unsupported log level: {other}")),
    }
}

struct TerminalProgress {
    bar: Option<ProgressBar>,
}

impl TerminalProgress {
    fn new(show_bar: bool, total: Option<u64>) -> Result<Self, Box<dyn std::error::Error>> {
        if !show_bar {
            return Ok(Self { bar: None });
        }

        let bar = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                let style = ProgressStyle::with_template(
                    "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
                )?;
                bar.set_style(style.progress_chars("##-"));
                bar
            }
            None => ProgressBar::new_spinner(),
        };
        Ok(Self { bar: Some(bar) })
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message("done");
        }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let frame = info.current_frame.unwrap_or(info.current);
        let difference = info
            .difference
            .map_or_else(|| "None".to_string(), |difference| format!("{difference:.2}"));

        match &self.bar {
            Some(bar) => {
                bar.set_position(frame + 1);
                bar.set_message(format!("diff {difference}, {} slides", info.retained));
            }
            None => {
                let (frame, total) = match info.total {
                    Some(total) => (frame.min(total), total.to_string()),
                    None => (frame, "?".to_string()),
                };
                eprintln!(
                    "Frame number {frame}/{total}, Diff {difference}, Frames: {}",
                    info.retained
                );
            }
        }
    }
}

fn document_options(cli: &Cli) -> DocumentOptions {
    let mut options = DocumentOptions::new();
    if let Some(header) = &cli.header {
        options = options.with_header(header.clone());
    }
    if let Some(margin) = cli.margin {
        options = options.with_margin(margin);
    }
    options
}

fn print_kept_frames(directory: &Path, count: usize, format: FrameFormat) {
    let store = ScratchStore::at(directory).with_format(format);
    for sequence in 0..count {
        eprintln!("kept {}", store.frame_path(sequence).display());
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "slidegen", &mut io::stdout());
        return Ok(());
    }

    let (Some(video), Some(threshold), Some(skip_rate)) =
        (cli.video.as_ref(), cli.diff_threshold, cli.skip_rate)
    else {
        Cli::command().print_help()?;
        return Ok(());
    };

    if let Some(level) = cli.log_level {
        slidegen::set_decoder_log_level(level);
    }

    let mut source = VideoSource::open(video)?;
    let progress = Arc::new(TerminalProgress::new(cli.progress, source.frame_count_hint())?);

    let options = SlideOptions::new()
        .with_threshold(f64::from(threshold))
        .with_skip_rate(skip_rate)
        .with_comparison_size(cli.size)
        .with_frame_format(cli.format)
        .with_document(document_options(&cli))
        .with_progress(progress.clone());

    let store = ScratchStore::next_available(&cli.output_base, "output").with_format(cli.format);
    let directory = store.directory().to_path_buf();

    let result = SlideGenerator::new(options).run(&mut source, store);
    progress.finish();

    let report = match result {
        Ok(report) => report,
        Err(SlideError::EmptySelection) => {
            return Err(format!(
                "no frames could be read from {}; nothing to assemble",
                video.display()
            )
            .into());
        }
        Err(error) => {
            if directory.exists() {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("partial output left in {}", directory.display()).yellow()
                );
            }
            return Err(error.into());
        }
    };

    if cli.verbose {
        print_kept_frames(&report.directory, report.retained.len(), cli.format);
    }

    if cli.json {
        let payload = json!({
            "directory": report.directory.display().to_string(),
            "document": report.document.display().to_string(),
            "retained": report.retained,
            "decoded_frames": report.decoded_frames,
            "sampled_frames": report.sampled_frames,
            "page_width": report.page_width,
            "page_height": report.page_height,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "{} {}",
            "success:".green().bold(),
            format!(
                "{} slide(s) from {} sampled frame(s) written to {}",
                report.retained.len(),
                report.sampled_frames,
                report.document.display()
            )
            .green()
        );
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
