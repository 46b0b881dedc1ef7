#[macro_use]
extern crate tracing;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::WrapErr;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use libposter::{source::HttpGeometrySource, AreaResolver, GeometrySource, Poster, SourceConfig};

mod batch;
mod render;

use render::{Format, Renderer};

/// Render map posters from OpenStreetMap data.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// JSON file with the data source settings
    #[clap(short, long, global = true)]
    source_config: Option<PathBuf>,

    /// Log debug output of the pipeline
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one poster file
    Render {
        poster: PathBuf,

        /// Output file [default: <renders>/<dir_name>/<poster_name>.<ext>]
        #[clap(short, long)]
        output: Option<PathBuf>,

        #[clap(long, default_value = "renders")]
        renders: PathBuf,

        #[clap(short, long, value_enum, default_value_t = Format::Svg)]
        format: Format,

        /// Also write every layer as GeoJSON below this directory
        #[clap(long)]
        dump_geojson: Option<PathBuf>,
    },
    /// Render every poster file below a directory
    Batch {
        #[clap(default_value = "config")]
        dir: PathBuf,

        #[clap(short, long, default_value = "renders")]
        out: PathBuf,

        #[clap(short, long, value_enum, default_value_t = Format::Svg)]
        format: Format,

        /// Number of posters rendered at once [default: one per core]
        #[clap(short, long)]
        jobs: Option<usize>,
    },
}

fn source(args: &Args) -> eyre::Result<(HttpGeometrySource, AreaResolver)> {
    let config = match &args.source_config {
        Some(path) => SourceConfig::load(path)
            .wrap_err_with(|| format!("reading source config {}", path.display()))?,
        None => SourceConfig::default(),
    };
    debug!(?config, "source config");
    Ok((
        GeometrySource::from_config(&config)?,
        AreaResolver::new(config.default_radius_m),
    ))
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let default_filter = if args.verbose {
        "libposter=debug,goamapper=debug,geo=warn"
    } else {
        "libposter=info,goamapper=info,geo=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_span_events(FmtSpan::NONE)
        .init();

    let (source, resolver) = source(&args)?;

    match args.command {
        Command::Render {
            poster,
            output,
            renders,
            format,
            dump_geojson,
        } => {
            let renderer = Renderer::new(source, resolver, format).with_geojson_dump(dump_geojson);
            let written = match output {
                Some(output) => {
                    let loaded = Poster::load(&poster)
                        .wrap_err_with(|| format!("loading {}", poster.display()))?;
                    renderer.render(&loaded, &output)?;
                    output
                }
                None => renderer
                    .render_file(&poster, &renders)
                    .wrap_err_with(|| format!("rendering {}", poster.display()))?,
            };
            info!(output = %written.display(), format = ?renderer.format(), "done");
        }
        Command::Batch {
            dir,
            out,
            format,
            jobs,
        } => {
            let files = batch::find_posters(&dir)
                .wrap_err_with(|| format!("listing posters in {}", dir.display()))?;
            info!(posters = files.len(), dir = %dir.display(), "starting batch");

            let renderer = Renderer::new(source, resolver, format);
            let report = match jobs {
                Some(jobs) => rayon::ThreadPoolBuilder::new()
                    .num_threads(jobs)
                    .build()?
                    .install(|| batch::run(&renderer, &files, &out)),
                None => batch::run(&renderer, &files, &out),
            };

            info!(
                rendered = report.rendered.len(),
                failed = report.failed.len(),
                "batch finished"
            );
            for (file, err) in &report.failed {
                eprintln!("{}: {err}", file.display());
            }
            if !report.failed.is_empty() {
                eyre::bail!("{} of {} posters failed", report.failed.len(), files.len());
            }
        }
    }

    Ok(())
}
