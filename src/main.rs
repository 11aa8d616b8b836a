//! Command-line dataset preparation: scan class folders, assign splits, and
//! warm the bottleneck cache.

use std::path::PathBuf;
use std::sync::Arc;

use imageset::cache::FeatureCache;
use imageset::config::PrepConfig;
use imageset::dataset::DatasetCatalog;
use imageset::extract::PixelStatExtractor;
use imageset::logging;
use imageset::partition::Split;

struct Options {
    root: PathBuf,
    config: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    manifest_out: Option<PathBuf>,
    skip_features: bool,
}

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };

    let mut config = match &options.config {
        Some(path) => PrepConfig::load(path).map_err(|err| err.to_string())?,
        None => PrepConfig::default(),
    };
    if let Some(dir) = &options.cache_dir {
        config.cache_dir = Some(dir.clone());
    }

    let catalog = DatasetCatalog::scan(&options.root, &config).map_err(|err| err.to_string())?;
    tracing::info!(
        "Discovered {} classes under {}",
        catalog.len(),
        options.root.display()
    );

    if !options.skip_features {
        let cache_dir = match &config.cache_dir {
            Some(dir) => dir.clone(),
            None => imageset::app_dirs::bottleneck_cache_dir().map_err(|err| err.to_string())?,
        };
        let cache = FeatureCache::new(cache_dir, Arc::new(PixelStatExtractor));
        tracing::info!(
            "Warming bottleneck cache at {} (model {})",
            cache.cache_dir().display(),
            cache.extractor_identity()
        );
        for class in catalog.classes() {
            let mut cached = 0usize;
            for split in Split::ALL {
                for handle in class.split(split) {
                    cache.get(&handle).map_err(|err| err.to_string())?;
                    cached += 1;
                }
            }
            tracing::info!("Cached {cached} bottlenecks for class '{}'", class.label());
        }
    }

    let summary = catalog.summary();
    for class in &summary.classes {
        println!(
            "{}: training {} / validation {} / testing {}",
            class.label, class.training, class.validation, class.testing
        );
    }

    if let Some(path) = &options.manifest_out {
        let payload = serde_json::to_vec_pretty(&summary).map_err(|err| err.to_string())?;
        std::fs::write(path, payload).map_err(|err| err.to_string())?;
        println!("Wrote manifest to {}", path.display());
    }
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut root: Option<PathBuf> = None;
    let mut config = None;
    let mut cache_dir = None;
    let mut manifest_out = None;
    let mut skip_features = false;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--root" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--root requires a value".to_string())?;
                root = Some(PathBuf::from(value));
            }
            "--config" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                config = Some(PathBuf::from(value));
            }
            "--cache-dir" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--cache-dir requires a value".to_string())?;
                cache_dir = Some(PathBuf::from(value));
            }
            "--manifest" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--manifest requires a value".to_string())?;
                manifest_out = Some(PathBuf::from(value));
            }
            "--skip-features" => {
                skip_features = true;
            }
            unknown => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
        }
        idx += 1;
    }

    let Some(root) = root else {
        return Err("--root is required".to_string());
    };

    Ok(Some(Options {
        root,
        config,
        cache_dir,
        manifest_out,
        skip_features,
    }))
}

fn help_text() -> String {
    [
        "imageset",
        "",
        "Partitions per-class image folders into deterministic",
        "training/validation/testing splits and caches bottleneck vectors.",
        "",
        "Usage:",
        "  imageset --root <dir> [options]",
        "",
        "Options:",
        "  --root <dir>       Dataset root with one subdirectory per class (required).",
        "  --config <path>    TOML config file (defaults apply when omitted).",
        "  --cache-dir <dir>  Bottleneck cache root (defaults to the app cache dir).",
        "  --manifest <path>  Write per-class split counts as JSON.",
        "  --skip-features    Only partition; do not warm the bottleneck cache.",
    ]
    .join("\n")
}
