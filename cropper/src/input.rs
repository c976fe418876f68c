use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use decoupe_core::Item;
use serde::Deserialize;
use tracing::info;
use walkdir::WalkDir;

/// Load the metadata file and drop captions below the confidence threshold.
pub fn load_metadata(path: &Path, confidence_threshold: f64) -> Result<Vec<Item>> {
    let f = File::open(path).with_context(|| format!("opening metadata {}", path.display()))?;
    let reader = BufReader::new(f);
    let mut items: Vec<Item> =
        serde_json::from_reader(reader).with_context(|| format!("parsing metadata {}", path.display()))?;

    let before: usize = items.iter().map(|item| item.captions.len()).sum();
    for item in &mut items {
        item.captions
            .retain(|caption| caption.confidence >= confidence_threshold);
    }
    let after: usize = items.iter().map(|item| item.captions.len()).sum();
    info!(
        num_items = items.len(),
        num_captions = after,
        dropped = before - after,
        "metadata loaded"
    );

    Ok(items)
}

#[derive(Debug, Deserialize)]
struct TweetRow {
    retweet_count: u64,
    medias_files: String,
}

/// Load the retweet table. Rows with a zero count are skipped; `medias_files`
/// holds a pipe-delimited list of image files, each assigned the row's count.
/// A file appearing in several rows keeps the last one.
pub fn load_retweets(path: &Path) -> Result<HashMap<String, u64>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("opening tweets {}", path.display()))?;

    let mut retweets = HashMap::new();
    for row in reader.deserialize() {
        let row: TweetRow = row.with_context(|| format!("parsing tweets {}", path.display()))?;
        if row.retweet_count == 0 {
            continue;
        }
        for file in row.medias_files.split('|') {
            retweets.insert(file.to_string(), row.retweet_count);
        }
    }
    info!(num_files = retweets.len(), "retweet counts loaded");

    Ok(retweets)
}

/// Flat listing of the image folder, for whitelisting items to the images
/// actually present.
pub fn scan_image_folder(folder: &Path) -> Result<HashSet<String>> {
    let mut files = HashSet::new();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("listing {}", folder.display()))?;
        if entry.file_type().is_file() {
            files.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(files)
}

/// Drop items whose image file is not in the whitelist.
pub fn apply_whitelist(items: &mut Vec<Item>, whitelist: &HashSet<String>) {
    let before = items.len();
    items.retain(|item| whitelist.contains(&item.file));
    info!(kept = items.len(), dropped = before - items.len(), "image whitelist applied");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn metadata_load_filters_low_confidence_captions() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"[{{"file":"a.jpg","folder":"x","captions":[
                {{"caption":"red brick wall","confidence":1.0,"bounding_box":[0,0,10,10]}},
                {{"caption":"blurry smudge","confidence":0.4,"bounding_box":[5,5,10,10]}}
            ]}}]"#
        )
        .unwrap();

        let items = load_metadata(f.path(), 1.0).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].captions.len(), 1);
        assert_eq!(items[0].captions[0].caption, "red brick wall");
    }

    #[test]
    fn malformed_metadata_is_fatal() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{{not json").unwrap();
        assert!(load_metadata(f.path(), 1.0).is_err());
    }

    #[test]
    fn retweet_rows_split_on_pipes_and_skip_zero_counts() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            "id,retweet_count,medias_files\n1,3,a.jpg|b.jpg\n2,0,c.jpg\n3,7,b.jpg\n"
        )
        .unwrap();

        let retweets = load_retweets(f.path()).unwrap();
        assert_eq!(retweets.get("a.jpg"), Some(&3));
        // Last row wins for files listed more than once.
        assert_eq!(retweets.get("b.jpg"), Some(&7));
        assert_eq!(retweets.get("c.jpg"), None);
    }

    #[test]
    fn whitelist_drops_missing_images() {
        let mut items = vec![
            Item {
                file: "kept.jpg".to_string(),
                folder: "x".to_string(),
                captions: Vec::new(),
            },
            Item {
                file: "gone.jpg".to_string(),
                folder: "x".to_string(),
                captions: Vec::new(),
            },
        ];
        let whitelist: HashSet<String> = ["kept.jpg".to_string()].into();
        apply_whitelist(&mut items, &whitelist);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].file, "kept.jpg");
    }

    #[test]
    fn scan_lists_only_top_level_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("b.jpg"), b"x").unwrap();

        let files = scan_image_folder(dir.path()).unwrap();
        assert!(files.contains("a.jpg"));
        assert!(!files.contains("b.jpg"));
    }
}
