use std::path::{Path, PathBuf};

use clap::ValueEnum;
use libposter::{
    poster::{Poster, PosterPipeline},
    ser,
    source::{QueryEndpoint, TagService},
    AreaResolver, GeometrySource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Finished poster document
    Svg,
    /// Layer path commands, for another renderer
    Json,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Svg => "svg",
            Format::Json => "json",
        }
    }
}

/// Renders poster files with one shared geometry source.
pub struct Renderer<S, Q> {
    source: GeometrySource<S, Q>,
    resolver: AreaResolver,
    format: Format,
    dump_geojson: Option<PathBuf>,
}

impl<S: TagService, Q: QueryEndpoint> Renderer<S, Q> {
    pub fn new(source: GeometrySource<S, Q>, resolver: AreaResolver, format: Format) -> Self {
        Self {
            source,
            resolver,
            format,
            dump_geojson: None,
        }
    }

    pub fn with_geojson_dump(mut self, dir: Option<PathBuf>) -> Self {
        self.dump_geojson = dir;
        self
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn render(&self, poster: &Poster, output: &Path) -> libposter::Result<()> {
        let mut pipeline = PosterPipeline::new(&self.source, self.resolver);
        if let Some(dir) = &self.dump_geojson {
            pipeline = pipeline.with_geojson_dump(dir.join(&poster.dir_name).join(&poster.poster_name));
        }
        let paths = pipeline.render(poster)?;

        match self.format {
            Format::Svg => ser::save_svg(output, &paths),
            Format::Json => ser::save_json(output, &paths),
        }
    }

    /// Loads `file` and writes the result to
    /// `<renders>/<dir_name>/<poster_name>.<ext>`.
    pub fn render_file(&self, file: &Path, renders: &Path) -> libposter::Result<PathBuf> {
        let poster = Poster::load(file)?;
        let output = poster.output_path(renders, self.format.extension());
        self.render(&poster, &output)?;
        Ok(output)
    }
}
