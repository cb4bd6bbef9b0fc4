use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use tempfile::tempdir;
use todowall::wallpaper::{discover, stage};
use todowall::Wallpaper;

fn write_image(path: &Path, width: u32, height: u32) {
    RgbImage::from_pixel(width, height, Rgb([10, 20, 30]))
        .save(path)
        .unwrap();
}

#[test]
fn discovers_images_sorted_with_their_size() {
    let dir = tempdir().unwrap();
    write_image(&dir.path().join("b.png"), 40, 30);
    write_image(&dir.path().join("a.JPG"), 64, 48);
    fs::write(dir.path().join("notes.txt"), "not an image").unwrap();
    fs::write(dir.path().join("broken.png"), "not an image either").unwrap();
    fs::create_dir(dir.path().join("nested.png")).unwrap();

    let found = discover(dir.path()).unwrap();
    let summary: Vec<(String, u32, u32)> = found
        .iter()
        .map(|w| {
            (
                w.path().file_name().unwrap().to_string_lossy().into_owned(),
                w.width(),
                w.height(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("a.JPG".to_string(), 64, 48),
            ("b.png".to_string(), 40, 30)
        ]
    );
}

#[test]
fn staging_replaces_previous_files_and_keeps_the_original() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("forest.png");
    write_image(&source, 16, 16);
    let original = fs::read(&source).unwrap();

    let temp = dir.path().join("temp");
    fs::create_dir(&temp).unwrap();
    fs::write(temp.join("wallpaperwith_text.png"), "stale").unwrap();
    fs::create_dir(temp.join("keep")).unwrap();

    let wallpaper = Wallpaper::open(&source).unwrap();
    let staged = stage(&wallpaper, &temp).unwrap();

    assert_eq!(staged, temp.join("wallpaper.png"));
    assert_eq!(fs::read(&staged).unwrap(), original);
    assert_eq!(fs::read(&source).unwrap(), original);
    assert!(!temp.join("wallpaperwith_text.png").exists());
    assert!(temp.join("keep").is_dir());
}

#[test]
fn staging_creates_the_temp_directory() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("sky.jpg");
    write_image(&source, 8, 8);

    let wallpaper = Wallpaper::open(&source).unwrap();
    let staged = stage(&wallpaper, &dir.path().join("a").join("b")).unwrap();
    assert!(staged.ends_with("a/b/wallpaper.jpg"));
    assert!(staged.exists());
}

#[test]
fn extensionless_images_are_staged_with_their_format() {
    let dir = tempdir().unwrap();
    let png = dir.path().join("tmp.png");
    write_image(&png, 5, 7);
    let bare = dir.path().join("2024");
    fs::rename(&png, &bare).unwrap();

    let wallpaper = Wallpaper::open(&bare).unwrap();
    assert_eq!((wallpaper.width(), wallpaper.height()), (5, 7));

    let temp = dir.path().join("temp");
    let staged = stage(&wallpaper, &temp).unwrap();
    assert_eq!(staged, temp.join("wallpaper.png"));
}
