// src/storage/archive.rs

//! Report archive extraction.

use std::io::{Cursor, Read};

use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{AppError, Result};
use crate::report::DETAIL_ENTRY;

/// Pull the detail report out of a downloaded archive.
pub fn extract_document(archive: &[u8]) -> Result<Vec<u8>> {
    extract_entry(archive, DETAIL_ENTRY)
}

/// Bytes of one named archive entry.
pub fn extract_entry(archive: &[u8], name: &str) -> Result<Vec<u8>> {
    let mut zip = ZipArchive::new(Cursor::new(archive))
        .map_err(|e| AppError::extraction(name, format!("unreadable archive: {e}")))?;

    let mut entry = match zip.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(AppError::extraction(name, "entry not found in archive"));
        }
        Err(e) => return Err(AppError::extraction(name, e)),
    };

    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| AppError::extraction(name, e))?;
    Ok(bytes)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::{Cursor, Write};

    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    /// In-memory zip with the given entries.
    pub fn zip_of(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}
