use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use decoupe_core::{BoundingBox, Item};
use image::{DynamicImage, GenericImageView};
use tracing::{debug, warn};

/// Images are thumbnailed to fit this square before cropping, as the
/// reference pipeline does.
pub const THUMBNAIL_MAX: u32 = 800;

/// Intersect a metadata box [x, y, w, h] with the image, returning pixel
/// coordinates for the crop. None when nothing of the box lies inside.
fn clamp_box(bb: &BoundingBox, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let x0 = (bb[0] as i64).clamp(0, i64::from(width));
    let y0 = (bb[1] as i64).clamp(0, i64::from(height));
    let x1 = (bb[0] as i64 + bb[2] as i64).clamp(0, i64::from(width));
    let y1 = (bb[1] as i64 + bb[3] as i64).clamp(0, i64::from(height));

    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
}

/// Crop every surviving caption region of `item` out of `img` and save it
/// under `output/{prefix}/{seq}-{file}`, where `seq` counts crops per
/// (image, prefix). Per-caption failures are logged and skipped; the count
/// of crops actually written is returned.
pub fn emit_crops(
    img: &DynamicImage,
    item: &Item,
    prefixes: &HashMap<String, String>,
    authorized: Option<&HashSet<String>>,
    output: &Path,
) -> usize {
    let mut seq: HashMap<&str, u32> = HashMap::new();
    let mut written = 0;

    for caption in &item.captions {
        let Some(prefix) = prefixes.get(&caption.caption) else {
            // Unassigned captions can only come from a caption set that was
            // not part of the clustering pass.
            warn!(file = %item.file, caption = %caption.caption, "caption has no prefix, skipping");
            continue;
        };
        if let Some(allowed) = authorized {
            if !allowed.contains(prefix) {
                continue;
            }
        }

        let n = seq.entry(prefix.as_str()).or_insert(0);
        match save_crop(img, &caption.bounding_box, output, prefix, *n, &item.file) {
            Ok(()) => written += 1,
            Err(err) => {
                warn!(file = %item.file, prefix = %prefix, error = %err, "crop failed, skipping caption");
            }
        }
        *n += 1;
    }

    written
}

fn save_crop(
    img: &DynamicImage,
    bb: &BoundingBox,
    output: &Path,
    prefix: &str,
    seq: u32,
    file: &str,
) -> Result<()> {
    let (x, y, w, h) = clamp_box(bb, img.width(), img.height())
        .with_context(|| format!("bounding box {bb:?} outside image"))?;

    let cluster_dir = output.join(prefix);
    fs::create_dir_all(&cluster_dir)
        .with_context(|| format!("creating {}", cluster_dir.display()))?;

    let target = cluster_dir.join(format!("{seq}-{file}"));
    let cropped = img.crop_imm(x, y, w, h);
    cropped
        .save(&target)
        .with_context(|| format!("saving {}", target.display()))?;
    debug!(target = %target.display(), "crop written");

    Ok(())
}

/// Open one source image, thumbnail it, and emit its crops. An unreadable
/// image is an error for the caller to log; the item is then skipped.
pub fn process_item(
    image_path: &Path,
    item: &Item,
    prefixes: &HashMap<String, String>,
    authorized: Option<&HashSet<String>>,
    output: &Path,
) -> Result<usize> {
    let img = image::open(image_path)
        .with_context(|| format!("opening image {}", image_path.display()))?;
    let img = img.thumbnail(THUMBNAIL_MAX, THUMBNAIL_MAX);

    Ok(emit_crops(&img, item, prefixes, authorized, output))
}
