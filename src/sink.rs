//! File sink: filename sanitization and chapter file writing.
//!
//! Royal Road chapters are written one at a time as they are fetched; FicHub
//! chapters are written together, numbered, once the whole export is extracted.
//! Existing files at the computed path are overwritten.

use crate::model::ChapterRecord;
use crate::scraper::ScraperError;
use regex::Regex;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, error, info};

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-_. ]").expect("filename pattern"));

/// Keep only alphanumerics, hyphens, and spaces (Royal Road rule).
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == ' ')
        .collect()
}

/// Replace every character outside word characters, `-`, `_`, `.`, and space with `_` (FicHub rule).
pub fn sanitize_filename(title: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(title, "_").into_owned()
}

/// Default Royal Road filename for a chapter: `<sanitized name>.txt`.
pub fn chapter_filename(name: &str) -> String {
    format!("{}.txt", sanitize_title(name))
}

/// FicHub filename: `chapter_<NNN>_<sanitized title>.txt`, `index` is 1-based.
pub fn numbered_chapter_filename(index: usize, title: &str) -> String {
    format!("chapter_{:03}_{}.txt", index, sanitize_filename(title))
}

/// Create the output directory and any missing parents.
pub fn ensure_dir(dir: &Path) -> Result<(), ScraperError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        error!(dir = %dir.display(), error = %e, "failed to create output directory");
        ScraperError::io(dir, e)
    })
}

/// Write `content` to `dir/filename`, replacing any existing file. The handle is
/// closed before a write error is returned.
pub fn write_chapter(dir: &Path, filename: &str, content: &str) -> Result<PathBuf, ScraperError> {
    let path = dir.join(filename);
    let result = File::create(&path).and_then(|mut f| {
        f.write_all(content.as_bytes())?;
        f.flush()
    });
    if let Err(e) = result {
        error!(path = %path.display(), error = %e, "failed to write chapter to file");
        return Err(ScraperError::io(path, e));
    }
    debug!(path = %path.display(), "successfully wrote chapter");
    Ok(path)
}

/// Write every record as `chapter_<NNN>_<title>.txt` under `dir`, in order.
pub fn write_numbered_chapters(
    dir: &Path,
    chapters: &[ChapterRecord],
) -> Result<Vec<PathBuf>, ScraperError> {
    ensure_dir(dir)?;
    let mut written = Vec::with_capacity(chapters.len());
    for (i, chapter) in chapters.iter().enumerate() {
        let filename = numbered_chapter_filename(i + 1, &chapter.title);
        let path = write_chapter(dir, &filename, &chapter.content)?;
        info!(file = %filename, path = %path.display(), "downloaded chapter");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sanitize_title_keeps_alnum_hyphen_space() {
        assert_eq!(
            sanitize_title("1. Good Morning, Brother! (Part 1/2)"),
            "1 Good Morning Brother Part 12"
        );
        assert_eq!(sanitize_title("Chapter 12 - The End?"), "Chapter 12 - The End");
    }

    #[test]
    fn sanitize_title_output_is_allowed_chars_and_idempotent() {
        for input in [
            "",
            "plain",
            "a/b\\c:d*e?f\"g<h>i|j",
            "tabs\tand\nnewlines",
            "Ünïcödé – dash_under.score",
            "第一章 开始",
        ] {
            let once = sanitize_title(input);
            assert!(once
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == ' '));
            assert_eq!(sanitize_title(&once), once);
        }
    }

    #[test]
    fn sanitize_filename_replaces_disallowed_with_underscore() {
        assert_eq!(sanitize_filename("Chapter 1: A/B?"), "Chapter 1_ A_B_");
        assert_eq!(sanitize_filename("keep-these_.ok"), "keep-these_.ok");
    }

    #[test]
    fn sanitize_filename_is_idempotent() {
        for input in ["", "a:b", "Ünïcödé – x", "*?<>|", "tab\there"] {
            let once = sanitize_filename(input);
            assert!(once
                .chars()
                .all(|c| c.is_alphanumeric() || "_-. ".contains(c)));
            assert_eq!(sanitize_filename(&once), once);
        }
    }

    #[test]
    fn numbered_filename_is_zero_padded() {
        assert_eq!(numbered_chapter_filename(1, "Start"), "chapter_001_Start.txt");
        assert_eq!(numbered_chapter_filename(42, "A: B"), "chapter_042_A_ B.txt");
        assert_eq!(numbered_chapter_filename(1234, "x"), "chapter_1234_x.txt");
    }

    #[test]
    fn ensure_dir_creates_parents() -> Result<(), ScraperError> {
        let tmp = TempDir::new().map_err(|e| ScraperError::io("tempdir", e))?;
        let nested = tmp.path().join("a").join("b").join("c");
        ensure_dir(&nested)?;
        assert!(nested.is_dir());
        ensure_dir(&nested)?;
        Ok(())
    }

    #[test]
    fn write_chapter_overwrites_existing_file() -> Result<(), ScraperError> {
        let tmp = TempDir::new().map_err(|e| ScraperError::io("tempdir", e))?;
        write_chapter(tmp.path(), "x.txt", "first version, longer")?;
        let path = write_chapter(tmp.path(), "x.txt", "second")?;
        let read = std::fs::read_to_string(&path).map_err(|e| ScraperError::io(&path, e))?;
        assert_eq!(read, "second");
        Ok(())
    }

    #[test]
    fn write_chapter_reports_io_error_with_path() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("does-not-exist");
        match write_chapter(&missing, "x.txt", "body") {
            Err(ScraperError::Io { path, .. }) => assert_eq!(path, missing.join("x.txt")),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn write_numbered_chapters_writes_in_order() -> Result<(), ScraperError> {
        let tmp = TempDir::new().map_err(|e| ScraperError::io("tempdir", e))?;
        let out = tmp.path().join("out");
        let chapters = vec![
            ChapterRecord {
                title: "Arrival".to_string(),
                content: "one".to_string(),
            },
            ChapterRecord {
                title: "Depart?".to_string(),
                content: "two".to_string(),
            },
        ];
        let written = write_numbered_chapters(&out, &chapters)?;
        assert_eq!(
            written,
            vec![
                out.join("chapter_001_Arrival.txt"),
                out.join("chapter_002_Depart_.txt")
            ]
        );
        assert_eq!(
            std::fs::read_to_string(&written[1]).map_err(|e| ScraperError::io(&written[1], e))?,
            "two"
        );
        Ok(())
    }
}
