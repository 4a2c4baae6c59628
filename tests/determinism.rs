mod common;

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use common::{Fixture, PHOTO};
use nutriscan::{estimate_dish_calories, estimate_from_image, ImageEmbedder, NutriConfig, PipelineContext};

fn repo_config() -> NutriConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("nutriscan.yaml");
    NutriConfig::from_file(path).unwrap()
}

fn png(shade: u8) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(6, 6, image::Rgb([shade, 180, 90]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

#[tokio::test]
async fn repeated_scans_agree() {
    let ctx = Fixture::new().build().await.unwrap();
    let first = estimate_from_image(&ctx, PHOTO).await.unwrap();
    for _ in 0..5 {
        assert_eq!(estimate_from_image(&ctx, PHOTO).await.unwrap(), first);
    }
}

#[tokio::test]
async fn repeated_dish_estimates_agree() {
    let ctx = Fixture::new().build().await.unwrap();
    let first = estimate_dish_calories(&ctx, "beef pho", Some("shellfish")).await.unwrap();
    for _ in 0..5 {
        let again = estimate_dish_calories(&ctx, "beef pho", Some("shellfish")).await.unwrap();
        assert_eq!(again, first);
    }
}

#[tokio::test]
async fn concurrent_requests_share_one_context() {
    let ctx = Arc::new(Fixture::new().build().await.unwrap());
    let expected = estimate_dish_calories(&ctx, "Phở bò", None).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move { estimate_dish_calories(&ctx, "Phở bò", None).await })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), expected);
    }
}

#[tokio::test]
async fn shipped_config_loads_and_answers() {
    let ctx = PipelineContext::load(repo_config()).await.unwrap();
    assert!(!ctx.catalog().is_empty());
    assert_eq!(ctx.image_embedder().dimension(), 8);

    let scan_a = estimate_from_image(&ctx, &png(10)).await.unwrap();
    let scan_b = estimate_from_image(&ctx, &png(10)).await.unwrap();
    assert_eq!(scan_a, scan_b);
    assert_ne!(scan_a.label(), "not_food");

    let dish = estimate_dish_calories(&ctx, "Phở bò tái", Some("peanut")).await.unwrap();
    let (low, high) = dish.calories_range.unwrap();
    assert!(low > 0.0 && low <= high);
    assert_eq!(dish.dish.unwrap().id, "pho_bo");
}

#[tokio::test]
async fn contexts_built_twice_agree() {
    let a = PipelineContext::load(repo_config()).await.unwrap();
    let b = PipelineContext::load(repo_config()).await.unwrap();

    for query in ["com ga", "Bánh mì thịt", "spring rolls", "completely unrelated"] {
        let ra = estimate_dish_calories(&a, query, None).await.unwrap();
        let rb = estimate_dish_calories(&b, query, None).await.unwrap();
        assert_eq!(ra, rb, "{query}");
    }
}
