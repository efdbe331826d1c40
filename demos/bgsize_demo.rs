use bgsize::config::ResolverConfig;
use bgsize::element::ElementHandle;
use bgsize::{bail, err};
use bgsize::loader::FileImageLoader;
use bgsize::logging::init_logging;
use bgsize::mode::Mode;
use bgsize::resolver::{CycleOutcome, ImageSizeResolver};
use bgsize::result::BgSizeResult;
use bgsize::style::StyleSheet;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};

#[derive(Parser, Debug)]
#[command(
    name = "bgsize-demo",
    about = "Resolve the natural pixel size of images or of an element's background-image",
    version
)]
struct Cli {
    /// the image paths to resolve, ignored when --style is given
    images: Vec<String>,

    /// inline css declarations of an element, e.g. "background: url(a.png) no-repeat"
    #[arg(long, short)]
    style: Option<String>,

    /// the directory relative image paths are resolved against
    #[arg(long, short, default_value = ".")]
    base_dir: PathBuf,

    /// resolver configuration in RON format
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// print debug logging
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    if let Err(error) = main_internal() {
        error!("Aborted with error: {:?}", error);
        std::process::exit(1);
    }
}

fn main_internal() -> BgSizeResult<()> {
    let cli = Cli::parse();
    init_logging(if cli.verbose { Level::DEBUG } else { Level::INFO })?;

    let config = match &cli.config {
        Some(path) => ResolverConfig::from_ron_file(path)?,
        None => ResolverConfig::default(),
    };
    let style_sheet = Arc::new(StyleSheet::new());
    let element = ElementHandle::new(1);
    let mode = match (&cli.style, cli.images.as_slice()) {
        (Some(style), _) => {
            style_sheet.set_declarations(element, style.clone());
            Mode::Auto
        }
        (None, []) => bail!("Either image paths or --style must be given"),
        (None, [single]) => Mode::SingleUrl(single.clone()),
        (None, images) => Mode::UrlList(images.to_vec()),
    };
    let loader = FileImageLoader::new(cli.base_dir.clone());
    info!("Resolving {} relative to '{}'", mode, loader.base_dir().display());

    let mut resolver = ImageSizeResolver::new(Arc::new(loader), style_sheet, config);
    resolver.element_ref().attach(element);
    resolver.resolve(mode);
    let cycle = resolver
        .take_cycle()
        .ok_or_else(|| err!("No resolution cycle was started"))?;
    match cycle.wait() {
        CycleOutcome::Published => {
            let images = resolver
                .images()
                .ok_or_else(|| err!("Published value vanished"))?;
            let json = serde_json::to_string_pretty(&images)
                .map_err(|error| err!("Failed to serialize result: {}", error))?;
            println!("{}", json);
            Ok(())
        }
        CycleOutcome::NoMatches => {
            println!("null");
            Ok(())
        }
        outcome => Err(err!("Resolution ended without result: {:?}", outcome)),
    }
}
