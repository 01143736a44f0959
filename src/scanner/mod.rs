use crate::error::{ReceiptError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ReceiptImage {
    pub path: PathBuf,
    pub file_name: String,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "JPG", "JPEG", "PNG"];

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|&e| e == ext.to_string_lossy()))
        .unwrap_or(false)
}

fn image_of(path: &Path) -> ReceiptImage {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    ReceiptImage {
        path: path.to_path_buf(),
        file_name,
    }
}

/// フォルダ直下のレシート画像をファイル名順で返す
pub fn scan_folder(folder: &Path) -> Result<Vec<ReceiptImage>> {
    if !folder.exists() {
        return Err(ReceiptError::FolderNotFound(folder.display().to_string()));
    }

    let mut images: Vec<ReceiptImage> = WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && is_image_path(e.path()))
        .map(|e| image_of(e.path()))
        .collect();

    // ファイル名でソート
    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(images)
}

/// ファイルとフォルダの混在指定を展開する
///
/// 指定順を保ち、フォルダ内はファイル名順。画像以外の単体ファイルは無視する。
pub fn collect_images(paths: &[PathBuf]) -> Result<Vec<ReceiptImage>> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_dir() {
            images.extend(scan_folder(path)?);
        } else if path.is_file() {
            if is_image_path(path) {
                images.push(image_of(path));
            }
        } else {
            return Err(ReceiptError::FileNotFound(path.display().to_string()));
        }
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path(Path::new("a.jpg")));
        assert!(is_image_path(Path::new("a.JPG")));
        assert!(is_image_path(Path::new("dir/a.jpeg")));
        assert!(is_image_path(Path::new("a.png")));
        assert!(!is_image_path(Path::new("a.txt")));
        assert!(!is_image_path(Path::new("a.pdf")));
        assert!(!is_image_path(Path::new("noext")));
    }

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"));
        assert!(result.is_err());
    }

    #[test]
    fn test_collect_missing_path_fails() {
        let result = collect_images(&[PathBuf::from("/nonexistent/receipt.jpg")]);
        assert!(matches!(result, Err(ReceiptError::FileNotFound(_))));
    }
}
