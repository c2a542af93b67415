use image::{ImageBuffer, Rgb, RgbImage};
use photomosaic_rust::{default_config, load_candidates, process, Params};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_png(dir: &Path, name: &str, w: u32, h: u32, c: [u8; 3]) {
    let img: RgbImage = ImageBuffer::from_pixel(w, h, Rgb(c));
    img.save(dir.join(name)).expect("write test image");
}

#[test]
fn caps_pool_at_max_images() {
    let dir = tempdir().unwrap();
    for i in 0..10u8 {
        write_png(dir.path(), &format!("img{i:02}.png"), 8 + i as u32, 6 + 2 * i as u32, [i * 20, 100, 200 - i * 10]);
    }
    let pool = load_candidates(dir.path(), Some(3), 5, 7).unwrap();
    assert_eq!(pool.len(), 3);
    assert!(pool.images().iter().all(|img| img.dimensions() == (5, 7)));
    assert_eq!(pool.block_dimensions(), (5, 7));

    let all = load_candidates(dir.path(), None, 5, 7).unwrap();
    assert_eq!(all.len(), 10);
}

#[test]
fn candidate_order_is_stable() {
    let dir = tempdir().unwrap();
    write_png(dir.path(), "c.png", 4, 4, [0, 0, 250]);
    write_png(dir.path(), "a.png", 4, 4, [250, 0, 0]);
    write_png(dir.path(), "b.png", 4, 4, [0, 250, 0]);
    let pool = load_candidates(dir.path(), None, 2, 2).unwrap();
    let firsts: Vec<[u8; 3]> = pool.images().iter().map(|img| img.get_pixel(0, 0).0).collect();
    assert_eq!(firsts, vec![[250, 0, 0], [0, 250, 0], [0, 0, 250]]);
}

#[test]
fn skips_undecodable_entries() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a_broken.png"), b"definitely not a png").unwrap();
    fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    write_png(dir.path(), "b.png", 3, 3, [10, 20, 30]);
    write_png(dir.path(), "c.png", 9, 4, [40, 50, 60]);

    // Broken entries do not count towards the cap.
    let pool = load_candidates(dir.path(), Some(2), 4, 4).unwrap();
    assert_eq!(pool.len(), 2);
}

#[test]
fn empty_or_missing_directory_is_fatal() {
    let dir = tempdir().unwrap();
    assert!(load_candidates(dir.path(), None, 4, 4).is_err());
    fs::write(dir.path().join("junk.bin"), [0u8; 16]).unwrap();
    assert!(load_candidates(dir.path(), None, 4, 4).is_err());
    assert!(load_candidates(&dir.path().join("missing"), None, 4, 4).is_err());

    write_png(dir.path(), "ok.png", 4, 4, [1, 1, 1]);
    assert!(load_candidates(dir.path(), Some(0), 4, 4).is_err());
}

#[test]
fn process_writes_mosaic_from_disk() {
    let root = tempdir().unwrap();
    let pool_dir = root.path().join("pool");
    fs::create_dir(&pool_dir).unwrap();
    write_png(&pool_dir, "blue.png", 20, 20, [0, 0, 255]);
    write_png(&pool_dir, "red.png", 30, 10, [255, 0, 0]);

    let target: RgbImage = ImageBuffer::from_fn(8, 8, |x, _| if x < 4 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) });
    let target_path = root.path().join("target.png");
    target.save(&target_path).unwrap();

    let mut config = default_config();
    config.blocks_x = 2;
    config.blocks_y = 2;
    config.threads = Some(2);
    let out = process(Params { images_dir: pool_dir, target_path: target_path.clone(), output_path: None, config }).unwrap();
    assert_eq!(out, root.path().join("target_mosaic.png"));

    let result = image::open(&out).unwrap().to_rgb8();
    assert_eq!(result.dimensions(), (8, 8));
    for (x, _, p) in result.enumerate_pixels() {
        if x < 4 {
            assert!(p[0] > 250 && p[2] < 5, "left half should be red, got {:?}", p);
        } else {
            assert!(p[2] > 250 && p[0] < 5, "right half should be blue, got {:?}", p);
        }
    }
}

#[test]
fn missing_target_is_fatal() {
    let root = tempdir().unwrap();
    write_png(root.path(), "a.png", 4, 4, [1, 2, 3]);
    let params = Params {
        images_dir: root.path().to_path_buf(),
        target_path: root.path().join("nope.png"),
        output_path: Some(root.path().join("out.png")),
        config: default_config(),
    };
    assert!(process(params).is_err());
    assert!(!root.path().join("out.png").exists());
}
