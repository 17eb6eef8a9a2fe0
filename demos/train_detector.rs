use std::env;
use std::fs;
use std::path::Path;

use image::{DynamicImage, GrayImage, Luma};
use linfa::ParamGuard;
use linfa_hog::{DetectionParams, HogDetector, HogParams, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Load every decodable image of a directory
fn load_dir(dir: &Path) -> Vec<DynamicImage> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            eprintln!("cannot read {}: {}", dir.display(), err);
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| image::open(entry.path()).ok())
        .collect()
}

/// Striped 32x64 patches, vertical stripes are the object
fn synthetic(rng: &mut SmallRng, vertical: bool, n: usize) -> Vec<DynamicImage> {
    (0..n)
        .map(|_| {
            let phase: u32 = rng.gen_range(0..8);
            let image = GrayImage::from_fn(32, 64, |x, y| {
                let t = if vertical { x } else { y };
                let base: i16 = if (t + phase) % 8 < 4 { 50 } else { 200 };
                Luma([(base + rng.gen_range(-20..20)) as u8])
            });
            DynamicImage::ImageLuma8(image)
        })
        .collect()
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut rng = SmallRng::seed_from_u64(42);
    let (positives, negatives, hog) = if args.len() == 3 {
        (
            load_dir(Path::new(&args[1])),
            load_dir(Path::new(&args[2])),
            HogParams::new(),
        )
    } else {
        println!("usage: train_detector <positive dir> <negative dir>, using synthetic stripes");
        (
            synthetic(&mut rng, true, 50),
            synthetic(&mut rng, false, 50),
            HogParams::new().window(32, 64),
        )
    };
    println!(
        "Train on {} positive and {} negative images",
        positives.len(),
        negatives.len()
    );

    let params = HogDetector::params().hog(hog).c(0.1).check()?;
    let detector = params.fit_images(&positives, &negatives)?;

    let flat = detector.to_vec();
    println!(
        "Detector with {} coefficients and bias {:.4}",
        flat.len() - 1,
        detector.bias()
    );

    // place an object into a background scene
    let (win_width, win_height) = params.hog_params().window();
    let mut scene = negatives
        .first()
        .map(|img| img.to_luma8())
        .unwrap_or_else(|| GrayImage::new(win_width * 3, win_height * 2));
    scene = image::imageops::resize(
        &scene,
        win_width * 3,
        win_height * 2,
        image::imageops::FilterType::Triangle,
    );
    if let Some(object) = positives.first() {
        let object = params.hog_params().window_of(&object.to_luma8());
        if let Some(object) = object {
            image::imageops::replace(&mut scene, &object, win_width as i64, win_height as i64 / 2);
        }
    }

    let detection = DetectionParams::new().win_stride(4, 4).check()?;
    let hits = detector.detect_multi_scale(&DynamicImage::ImageLuma8(scene), &detection)?;
    println!("Found {} objects", hits.len());
    for hit in hits {
        println!(
            "  at ({:.0}, {:.0}) size {:.0}x{:.0} score {:.3}",
            hit.x, hit.y, hit.width, hit.height, hit.score
        );
    }

    Ok(())
}
