//! Directory scanning

use std::{
    cmp::Ordering,
    fs,
    path::{Path, PathBuf},
};

use tokio::task::spawn_blocking;

/// Extensions the enabled `image` decoders can open
pub const EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "tiff", "tif", "ico", "avif",
];

/// The directory to scan for `path`: itself, or its parent for a file
pub fn get_image_dir(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        path.parent().map(|par| par.to_path_buf())
    } else if path.is_dir() {
        Some(path.to_path_buf())
    } else {
        None
    }
}

/// Async scan a dir for image files
pub async fn scan_dir(dir: &Path, include_hidden: bool) -> Vec<PathBuf> {
    let dir = dir.to_path_buf();

    match spawn_blocking(move || scan_dir_sync(&dir, include_hidden)).await {
        Ok(images) => images,
        Err(e) => {
            tracing::error!("Directory scan failed: {e}");
            Vec::new()
        }
    }
}

fn scan_dir_sync(dir: &Path, include_hidden: bool) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            if !include_hidden
                && let Some(name) = path.file_name().and_then(|name| name.to_str())
                && name.starts_with('.')
            {
                return false;
            }
            path.is_file() && is_supported_image(path)
        })
        .collect();

    images.sort_by(|a, b| {
        let a_name = a.file_name().and_then(|name| name.to_str()).unwrap_or("");
        let b_name = b.file_name().and_then(|name| name.to_str()).unwrap_or("");
        human_sort(a_name, b_name)
    });

    tracing::debug!(dir = %dir.display(), count = images.len(), "Scanned directory");
    images
}

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Splits `s` into alternating runs of digits and non-digits.
fn chunks(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}

/// Human-friendly ordering: "img2" sorts before "img10", letters compare case-insensitively
pub fn human_sort(a: &str, b: &str) -> Ordering {
    let mut a_chunks = chunks(a);
    let mut b_chunks = chunks(b);

    loop {
        let ordering = match (a_chunks.next(), b_chunks.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ac), Some(bc)) => {
                let both_numeric = ac.starts_with(|c: char| c.is_ascii_digit())
                    && bc.starts_with(|c: char| c.is_ascii_digit());

                if both_numeric {
                    let a_num = ac.trim_start_matches('0');
                    let b_num = bc.trim_start_matches('0');
                    a_num.len().cmp(&b_num.len()).then_with(|| a_num.cmp(b_num))
                } else {
                    ac.to_lowercase().cmp(&bc.to_lowercase())
                }
            }
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_human_sort() {
        let mut names = vec!["img10.png", "img2.png", "Img1.png", "img02b.png", "a.png"];
        names.sort_by(|a, b| human_sort(a, b));
        assert_eq!(
            names,
            vec!["a.png", "Img1.png", "img2.png", "img02b.png", "img10.png"]
        );
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_image(Path::new("/tmp/photo.JPG")));
        assert!(is_supported_image(Path::new("shot.webp")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b10.png", "b9.jpg", ".hidden.png", "readme.md"] {
            File::create(dir.path().join(name)).unwrap();
        }
        fs::create_dir(dir.path().join("folder.png")).unwrap();

        let names = |paths: Vec<PathBuf>| {
            paths
                .iter()
                .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
                .collect::<Vec<_>>()
        };

        assert_eq!(
            names(scan_dir_sync(dir.path(), false)),
            vec!["b9.jpg", "b10.png"]
        );
        assert_eq!(
            names(scan_dir_sync(dir.path(), true)),
            vec![".hidden.png", "b9.jpg", "b10.png"]
        );
    }

    #[test]
    fn test_image_dir_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.png");
        File::create(&file).unwrap();

        assert_eq!(get_image_dir(&file), Some(dir.path().to_path_buf()));
        assert_eq!(get_image_dir(dir.path()), Some(dir.path().to_path_buf()));
        assert_eq!(get_image_dir(&dir.path().join("missing")), None);
    }
}
