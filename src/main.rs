use clap::{Parser, Subcommand};
use sitekit::helper::TagOptions;
use sitekit::imaging::RustBackend;
use sitekit::{config, output, site};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sitekit")]
#[command(about = "Static site builder with optimized WebP images")]
#[command(long_about = "\
Static site builder with optimized WebP images

Templates reference images by path; the build replaces each reference with
an optimized WebP rendition, or with the original file if it cannot be
processed. Before rendering, the main stylesheet is minified by an external
tool; afterwards static paths are copied verbatim.

Project structure:

  .
  ├── site.toml              # Optional config (run 'sitekit gen-config')
  ├── index.html             # Page → _site/index.html
  ├── about.md               # Page → _site/about/index.html
  ├── _includes/             # Partials for {% include %}
  ├── _data/                 # Global data (*.json, *.toml)
  ├── css/style.css          # Minified to css/style.min.css
  └── images/                # Copied verbatim; sources for the image helper

Template usage:
  {{ \"images/cat.jpg\" | image }}                        → /img/3f9a1c02be-640.webp
  {{ image(path=\"images/cat.jpg\", alt=\"Cat\", class=\"hero\") }} → <img ...>")]
#[command(version)]
struct Cli {
    /// Project directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full build: minify CSS, render pages, copy static paths
    Build,
    /// Optimize a single image and print the helper's output
    Image {
        /// Image path, relative to the input directory
        path: String,
        /// Print an <img> tag instead of a URL
        #[arg(long)]
        tag: bool,
        /// Alt text for --tag
        #[arg(long, default_value = "")]
        alt: String,
        /// Class attribute for --tag
        #[arg(long, default_value = "")]
        class: String,
    },
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Build => {
            let site_config = config::load_config(&cli.root)?;
            init_thread_pool(&site_config.processing);
            let report = site::build(&cli.root, &site_config)?;
            output::print_build_output(&report);
        }
        Command::Image {
            path,
            tag,
            alt,
            class,
        } => {
            let site_config = config::load_config(&cli.root)?;
            let paths = config::SitePaths::resolve(&cli.root, &site_config);
            let helper = site::image_helper(RustBackend::new(), &site_config, &paths);
            if tag {
                println!("{}", helper.tag(&path, &TagOptions::new(alt, class)));
            } else {
                println!("{}", helper.url(&path));
            }
            if let Ok(stats) = helper
                .processor()
                .process(sitekit::helper::strip_leading_slash(&path))
            {
                for line in output::format_image_output(&path, &stats) {
                    eprintln!("{}", line);
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the default level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sitekit=info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
