use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use ignore::{types::TypesBuilder, WalkBuilder};
use rayon::prelude::*;

use libposter::source::{QueryEndpoint, TagService};

use crate::render::Renderer;

/// Every `*.json` file under `dir`, sorted.
pub fn find_posters(dir: &Path) -> Result<Vec<PathBuf>, ignore::Error> {
    let mut types = TypesBuilder::new();
    types.add("poster", "*.json")?;
    let walk = WalkBuilder::new(dir)
        .types(types.select("poster").build()?)
        .build();

    let mut paths = vec![];
    for entry in walk {
        let entry = entry?;
        if entry.file_type().map_or(false, |t| t.is_file()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

#[derive(Debug, Default)]
pub struct Report {
    pub rendered: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, eyre::Report)>,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}

/// Renders every file independently; a failing or panicking poster is
/// recorded and the others carry on.
pub fn run<S, Q>(renderer: &Renderer<S, Q>, files: &[PathBuf], renders: &Path) -> Report
where
    S: TagService + Sync,
    Q: QueryEndpoint + Sync,
{
    let results: Vec<_> = files
        .par_iter()
        .map(|file| {
            let result = panic::catch_unwind(AssertUnwindSafe(|| renderer.render_file(file, renders)))
                .map_err(|payload| eyre::eyre!("render panicked: {}", panic_message(&*payload)))
                .and_then(|rendered| rendered.map_err(eyre::Report::from));
            match &result {
                Ok(output) => info!(poster = %file.display(), output = %output.display(), "rendered"),
                Err(err) => error!(poster = %file.display(), %err, "failed"),
            }
            (file.clone(), result)
        })
        .collect();

    let mut report = Report::default();
    for (file, result) in results {
        match result {
            Ok(_) => report.rendered.push(file),
            Err(err) => report.failed.push((file, err)),
        }
    }
    report
}
