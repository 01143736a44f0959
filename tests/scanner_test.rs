//! 画像スキャンのテスト

use receipt_review::scanner;
use std::fs::File;
use std::io::Write;
use tempfile::tempdir;

#[test]
fn test_scan_folder_with_images() {
    let dir = tempdir().expect("Failed to create temp dir");

    File::create(dir.path().join("test1.jpg")).unwrap().write_all(b"dummy").unwrap();
    File::create(dir.path().join("test2.JPG")).unwrap().write_all(b"dummy").unwrap();
    File::create(dir.path().join("test3.png")).unwrap().write_all(b"dummy").unwrap();
    File::create(dir.path().join("readme.txt")).unwrap().write_all(b"text").unwrap();

    let result = scanner::scan_folder(dir.path()).unwrap();
    assert_eq!(result.len(), 3);
    assert_eq!(result[0].file_name, "test1.jpg");
    assert_eq!(result[1].file_name, "test2.JPG");
    assert_eq!(result[2].file_name, "test3.png");
}

#[test]
fn test_images_sorted_by_filename() {
    let dir = tempdir().expect("Failed to create temp dir");

    File::create(dir.path().join("c.jpg")).unwrap();
    File::create(dir.path().join("a.jpg")).unwrap();
    File::create(dir.path().join("b.jpg")).unwrap();

    let result = scanner::scan_folder(dir.path()).unwrap();
    let names: Vec<&str> = result.iter().map(|i| i.file_name.as_str()).collect();
    assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
}

/// サブフォルダは対象外
#[test]
fn test_scan_is_not_recursive() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    File::create(dir.path().join("sub").join("inner.jpg")).unwrap();
    File::create(dir.path().join("top.jpg")).unwrap();

    let result = scanner::scan_folder(dir.path()).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].file_name, "top.jpg");
}

/// ファイルとフォルダの混在指定は指定順
#[test]
fn test_collect_mixed_paths_keeps_order() {
    let dir = tempdir().expect("Failed to create temp dir");
    let folder = dir.path().join("batch");
    std::fs::create_dir(&folder).unwrap();
    File::create(folder.join("b.png")).unwrap();
    File::create(folder.join("a.jpg")).unwrap();

    let single = dir.path().join("z.jpeg");
    File::create(&single).unwrap();
    let ignored = dir.path().join("notes.txt");
    File::create(&ignored).unwrap();

    let result = scanner::collect_images(&[single.clone(), folder, ignored]).unwrap();
    let names: Vec<&str> = result.iter().map(|i| i.file_name.as_str()).collect();
    assert_eq!(names, vec!["z.jpeg", "a.jpg", "b.png"]);
    assert_eq!(result[0].path, single);
}
