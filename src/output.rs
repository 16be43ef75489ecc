use std::io::{Cursor, Write as _};

use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::part::EncodedPart;

pub const ARCHIVE_NAME: &str = "generated_gifs.zip";
pub const PREVIEW_NAME: &str = "preview.html";

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),
}

/// File name of the part at `index`, numbered from 1 in row-major order.
pub fn part_file_name(prefix: &str, index: usize) -> String {
    format!("{prefix}part_{}.gif", index + 1)
}

/// In-memory zip archive of encoded parts.
pub struct PartArchive {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    entries: usize,
}

impl Default for PartArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl PartArchive {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            entries: 0,
        }
    }

    pub fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        // gif data is already lzw compressed
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        self.writer.start_file(name, options)?;
        self.writer.write_all(bytes)?;
        self.entries += 1;

        Ok(())
    }

    pub const fn len(&self) -> usize {
        self.entries
    }

    pub const fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn build(self) -> Result<Vec<u8>, ArchiveError> {
        Ok(self.writer.finish()?.into_inner())
    }
}

/// Bundles `parts` into a zip with one `part_<n>.gif` entry each.
/// Entry names never carry the output prefix, only the archive file does.
pub fn archive_parts(parts: &[EncodedPart]) -> Result<Vec<u8>, ArchiveError> {
    let mut archive = PartArchive::new();

    for part in parts {
        archive.add_entry(&part_file_name("", part.index()), part.bytes())?;
    }

    archive.build()
}

/// Renders an html page showing the part files in a grid with `columns` columns.
pub fn render_preview(parts: &[EncodedPart], columns: u32, prefix: &str) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>gif parts</title>\n<style>\n",
    );

    html.push_str(&format!(
        ".parts {{ display: grid; grid-template-columns: repeat({columns}, auto); gap: 5px; }}\n"
    ));
    html.push_str(".parts img { width: 100%; }\n</style>\n</head>\n<body>\n<div class=\"parts\">\n");

    for part in parts {
        html.push_str(&format!(
            "  <img src=\"{}\" alt=\"GIF Part {}\">\n",
            escape_attr(&part_file_name(prefix, part.index())),
            part.index() + 1
        ));
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn escape_attr(value: &str) -> String {
    let mut res = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '&' => res.push_str("&amp;"),
            '"' => res.push_str("&quot;"),
            '<' => res.push_str("&lt;"),
            '>' => res.push_str("&gt;"),
            c => res.push(c),
        }
    }

    res
}
