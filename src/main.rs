use clap::Parser;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use highlight_words::detection::{build_standard_pipeline, ensure_rgb, ocr};
use highlight_words::report;
use highlight_words::{HighlightConfig, WordCandidate};

#[derive(Parser)]
#[command(name = "highlight-words")]
#[command(about = "Find the marker-highlighted words in scanned documents")]
struct Cli {
    /// Image file, or a directory of images
    #[arg(value_name = "PATH")]
    input: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Save intermediate images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// JSON word list to use instead of OCR. For a directory of images,
    /// a directory holding one `<image file name>.json` per image
    #[arg(long, value_name = "PATH")]
    words: Option<PathBuf>,

    /// JSON config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Minimum highlighted fraction of a word (overrides the config file)
    #[arg(long, value_name = "RATIO")]
    ratio_threshold: Option<f64>,

    /// Also write `<stem>.highlighted.png` with highlighted words outlined
    #[arg(long)]
    annotate: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ImageReport {
    image: String,
    text: String,
    words: Vec<WordCandidate>,
}

/// Where each image's words come from: a JSON word list, or OCR
struct WordSource {
    words_path: Option<PathBuf>,
    // Initialized on first use, reused for every image
    engine: Option<ocr::OcrEngine>,
}

impl WordSource {
    fn new(words_path: Option<PathBuf>) -> Self {
        Self {
            words_path,
            engine: None,
        }
    }

    fn words_for(&mut self, image_path: &Path, rgb: &RgbImage) -> anyhow::Result<Vec<WordCandidate>> {
        if let Some(words_path) = &self.words_path {
            let file = if words_path.is_dir() {
                let name = image_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                words_path.join(format!("{}.json", name))
            } else {
                words_path.clone()
            };
            debug!("Loading words from {}", file.display());
            return ocr::load_words(&file);
        }

        let engine = match self.engine.take() {
            Some(engine) => engine,
            None => ocr::init_ocr_engine()?,
        };
        let words = ocr::detect_words(&engine, rgb);
        self.engine = Some(engine);
        words
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "highlight_words=debug,info" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .init();
}

/// The image itself, or the decodable images directly inside a directory
fn collect_images(input: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut images = Vec::new();
    for entry in std::fs::read_dir(input)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if name.ends_with(".highlighted.png") {
            continue;
        }
        if ImageFormat::from_path(&path).is_err() {
            debug!("Skipping {} (not an image)", path.display());
            continue;
        }
        images.push(path);
    }
    images.sort();
    Ok(images)
}

fn process_image(
    path: &Path,
    args: &Cli,
    config: &HighlightConfig,
    source: &mut WordSource,
    debug_dir: Option<PathBuf>,
) -> anyhow::Result<Vec<WordCandidate>> {
    let img = ImageReader::open(path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    debug!("Image loaded: {}x{} {:?}", img.width(), img.height(), img.color());

    // Alpha and grayscale inputs are flattened to RGB, as a plain decoder would
    let img = if img.color().channel_count() == 3 {
        img
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };
    let rgb = ensure_rgb(&img)?;

    let words = ocr::select_single_words(source.words_for(path, &rgb)?);
    info!("{} candidate words", words.len());

    let mut pipeline = build_standard_pipeline(words, *config, args.verbose)?;
    if let Some(dir) = debug_dir {
        pipeline = pipeline.with_debug(dir)?;
    }

    let results = pipeline.run_with_executor(img)?;
    let highlighted: Vec<WordCandidate> = results.into_iter().filter_map(|item| item.word).collect();

    let text_path = report::text_output_path(path);
    report::dump_text(&highlighted, &text_path)?;
    debug!("Wrote {}", text_path.display());

    if args.annotate {
        let annotated = report::annotate(&rgb, &highlighted, report::OUTLINE_COLOR);
        let annotated_path = report::annotation_output_path(path);
        annotated
            .save(&annotated_path)
            .map_err(|e| anyhow::anyhow!("Failed to save {}: {}", annotated_path.display(), e))?;
        debug!("Wrote {}", annotated_path.display());
    }

    Ok(highlighted)
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);
    let started = Instant::now();

    let mut config = match &args.config {
        Some(path) => HighlightConfig::load(path)?,
        None => HighlightConfig::default(),
    };
    if let Some(ratio) = args.ratio_threshold {
        config = config.with_ratio_threshold(ratio);
    }
    config.validate()?;

    let images = collect_images(&args.input)?;
    if images.is_empty() {
        anyhow::bail!("No images found in {}", args.input.display());
    }
    let batch = images.len() > 1;

    let mut source = WordSource::new(args.words.clone());
    let mut reports = Vec::new();
    let mut failures = 0usize;

    for path in &images {
        info!("Processing {}", path.display());

        // One debug subdirectory per image when processing a batch
        let debug_dir = args.debug_out.as_ref().map(|dir| {
            if batch {
                dir.join(path.file_stem().unwrap_or_default())
            } else {
                dir.clone()
            }
        });

        match process_image(path, &args, &config, &mut source, debug_dir) {
            Ok(words) => {
                info!("{} highlighted words", words.len());
                let text = report::highlighted_text(&words);
                if !args.json {
                    println!("{}: {}", path.display(), text.trim_end());
                }
                reports.push(ImageReport {
                    image: path.display().to_string(),
                    text,
                    words,
                });
            }
            Err(e) => {
                error!("Failed to process {}: {:#}", path.display(), e);
                failures += 1;
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    info!("Task complete in {:.1}s", started.elapsed().as_secs_f64());

    if failures > 0 {
        anyhow::bail!("{} of {} images failed", failures, images.len());
    }
    Ok(())
}
