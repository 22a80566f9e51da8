//! Reads already-extracted page text from disk.
//!
//! Two layouts are understood:
//! - a single text file whose pages are separated by form feeds (`\x0c`), as
//!   written by `pdftotext`;
//! - a directory with one `.txt` file per page. Files are taken in path order
//!   and numbered by the trailing digits of their stem (`page-007.txt` is page
//!   7), falling back to their position.
//!
//! Blank pages are kept so numbering survives; the chunk store drops them.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::types::PageText;

const PAGE_BREAK: char = '\x0c';

pub fn read_pages(path: &Path) -> Result<Vec<PageText>> {
    if path.is_dir() { read_page_directory(path) } else { read_page_file(path) }
}

/// Split one text blob into pages on form feeds. A trailing form feed does not
/// open an extra page.
pub fn split_pages(content: &str) -> Vec<PageText> {
    let content = content.strip_suffix(PAGE_BREAK).unwrap_or(content);
    content
        .split(PAGE_BREAK)
        .enumerate()
        .map(|(i, text)| PageText::new(page_number(i), text))
        .collect()
}

/// Name a document after its path's file name, as an upload would.
pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_page_file(path: &Path) -> Result<Vec<PageText>> {
    let content = read_file_content(path)?;
    let pages = split_pages(&content);
    debug!(path = %path.display(), pages = pages.len(), "read page file");
    Ok(pages)
}

fn read_page_directory(dir: &Path) -> Result<Vec<PageText>> {
    let files = list_txt_files(dir);
    let mut pages = Vec::with_capacity(files.len());
    for (i, file) in files.iter().enumerate() {
        let text = read_file_content(file)?;
        let page = stem_page_number(file).unwrap_or_else(|| page_number(i));
        pages.push(PageText { page, text });
    }
    debug!(dir = %dir.display(), pages = pages.len(), "read page directory");
    Ok(pages)
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => {
            let bytes = fs::read(file_path).with_context(|| format!("reading {}", file_path.display()))?;
            Ok(String::from_utf8_lossy(&bytes).to_string())
        }
    }
}

fn stem_page_number(file_path: &Path) -> Option<u32> {
    let stem = file_path.file_stem()?.to_str()?;
    let digits: String = stem.chars().rev().take_while(char::is_ascii_digit).collect();
    let digits: String = digits.chars().rev().collect();
    digits.parse::<u32>().ok().filter(|&n| n > 0)
}

fn page_number(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

/// Every `.txt` file under `root`, in path order. Unreadable entries are
/// skipped.
fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_digits_become_page_numbers() {
        assert_eq!(stem_page_number(Path::new("doc/page-007.txt")), Some(7));
        assert_eq!(stem_page_number(Path::new("doc/12.txt")), Some(12));
        assert_eq!(stem_page_number(Path::new("doc/intro.txt")), None);
        assert_eq!(stem_page_number(Path::new("doc/page0.txt")), None);
    }
}
