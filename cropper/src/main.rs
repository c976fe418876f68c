mod crop;
mod input;

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use decoupe_core::cluster::{cluster_captions, ClusterParams};
use decoupe_core::sample::sample_prefixes;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Cluster image captions by shared prefixes and crop the captioned regions
/// into one folder per cluster.
#[derive(Parser, Debug)]
#[command(name = "cropper", version)]
struct Cli {
    /// Metadata JSON file (items with captions and bounding boxes)
    #[arg(long, default_value = "full_all.json")]
    metadata: PathBuf,

    /// Folder holding the source images
    #[arg(long, default_value = "IMG_EXTREMITIES")]
    image_folder: PathBuf,

    /// Retweet CSV; omit to weigh every caption equally
    #[arg(long)]
    tweets: Option<PathBuf>,

    /// Output folder for the cropped fragments
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Drop captions below this confidence
    #[arg(long, default_value_t = 1.0)]
    confidence_threshold: f64,

    /// Signatures with at most this many tokens bypass the trie
    #[arg(long, default_value_t = 2)]
    signature_threshold: usize,

    /// Weight-floor percentile used when sampling clusters
    #[arg(long, default_value_t = 75.0)]
    percentile_threshold: f64,

    /// Number of clusters to keep when sampling
    #[arg(long, default_value_t = 100)]
    sample_size: usize,

    /// Keep every cluster instead of sampling a subset
    #[arg(long)]
    no_sampling: bool,

    /// Order signatures rarest token first
    #[arg(long)]
    reverse: bool,

    /// Print clusters with at least two members and exit
    #[arg(long)]
    log_clusters: bool,

    /// Skip items before this index (resume)
    #[arg(long)]
    offset: Option<usize>,

    /// Stop once this many items have been visited (truncate)
    #[arg(long)]
    limit: Option<usize>,

    /// Restrict processing to these image files (repeatable)
    #[arg(long = "only-image", value_name = "FILE")]
    only_images: Vec<String>,

    /// RNG seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let sampling = !cli.no_sampling;

    let mut items = input::load_metadata(&cli.metadata, cli.confidence_threshold)?;

    // Restrict to images we can actually open: an explicit whitelist when
    // given, else whatever sits in the flat image folder when sampling.
    if !cli.only_images.is_empty() {
        let whitelist: HashSet<String> = cli.only_images.iter().cloned().collect();
        input::apply_whitelist(&mut items, &whitelist);
    } else if sampling {
        let whitelist = input::scan_image_folder(&cli.image_folder)?;
        input::apply_whitelist(&mut items, &whitelist);
    }

    let retweets = match &cli.tweets {
        Some(path) => input::load_retweets(path)?,
        None => Default::default(),
    };

    let params = ClusterParams {
        signature_threshold: cli.signature_threshold,
        reverse: cli.reverse,
    };
    let clustering = cluster_captions(&items, &retweets, &params);

    let authorized = if sampling {
        if let Some((prefix, weight)) = clustering.most_frequent() {
            info!(
                prefix,
                weight,
                retweet_weighted = cli.tweets.is_some(),
                "most frequent prefix"
            );
        }

        let mut rng = match cli.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let sampled = sample_prefixes(
            &clustering.prefix_weights,
            cli.percentile_threshold,
            cli.sample_size,
            &mut rng,
        )
        .context("sampling clusters")?;
        Some(sampled)
    } else {
        None
    };

    if cli.log_clusters {
        for (prefix, members) in &clustering.clusters {
            if members.len() < 2 {
                continue;
            }
            println!("Gathered {} for {}:", members.len(), prefix);
            for text in members {
                println!("   {text}");
            }
            println!();
        }
        return Ok(());
    }

    fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;

    let bar = ProgressBar::new(items.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} {msg}",
    )?);

    let mut written = 0usize;
    for (idx, item) in items.iter().enumerate() {
        bar.inc(1);
        if cli.offset.is_some_and(|offset| idx < offset) {
            continue;
        }

        // When sampling, images live flat in the folder; otherwise they sit
        // under their item's subfolder.
        let image_path = if sampling {
            cli.image_folder.join(&item.file)
        } else {
            cli.image_folder.join(&item.folder).join(&item.file)
        };

        match crop::process_item(
            &image_path,
            item,
            &clustering.prefixes,
            authorized.as_ref(),
            &cli.output,
        ) {
            Ok(n) => written += n,
            Err(err) => {
                warn!(file = %item.file, folder = %item.folder, error = %err, "skipping item");
            }
        }

        if cli.limit.is_some_and(|limit| idx + 1 >= limit) {
            break;
        }
    }
    bar.finish_and_clear();

    info!(crops = written, output = %cli.output.display(), "done");
    Ok(())
}
