//! Model archives
//!
//! Mod releases ship as `.jar` files: zip archives with model files under
//! `assets/pixelmon/models/pokemon/<species>/`. Decoding can read them in
//! place, writing each entry to `<output>/<species>/<rest>`.

use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use zip::ZipArchive;

use super::{Direction, FileAction, Variant};
use crate::error::Result;
use crate::utils::extension_of;

lazy_static! {
    static ref MODEL_ENTRY: Regex =
        Regex::new(r"^assets/pixelmon/models/pokemon/([a-z0-9-]+)/(.+)$").expect("valid regex");
}

/// A model file inside an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Full entry name within the archive
    pub name: String,
    /// Output location relative to the output root (`<species>/<rest>`)
    pub relative: PathBuf,
    /// Decode or clone
    pub action: FileAction,
}

/// Whether a path names a model archive (`.jar` or `.zip`)
pub fn is_archive<P: AsRef<Path>>(path: P) -> bool {
    extension_of(path).is_some_and(|ext| ext == "jar" || ext == "zip")
}

/// Model entries the variant would decode or clone, sorted by entry name
pub fn list_model_entries<R: Read + Seek>(
    archive: &ZipArchive<R>,
    variant: Variant,
) -> Vec<ArchiveEntry> {
    let mut entries: Vec<ArchiveEntry> = archive
        .file_names()
        .filter_map(|name| {
            let captures = MODEL_ENTRY.captures(name)?;
            let action = variant.classify(Path::new(name), Direction::Decode);
            if action == FileAction::Skip {
                return None;
            }
            let relative = PathBuf::from(&captures[1]).join(&captures[2]);
            Some(ArchiveEntry {
                name: name.to_string(),
                relative,
                action,
            })
        })
        .collect();

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

/// Read one entry's bytes
pub fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut file = archive.by_name(name)?;
    let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
    file.read_to_end(&mut data)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn archive(names: &[&str]) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for name in names {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(name.as_bytes()).unwrap();
        }
        let cursor = writer.finish().unwrap();
        ZipArchive::new(cursor).unwrap()
    }

    #[test]
    fn test_lists_model_entries_sorted() {
        let zip = archive(&[
            "assets/pixelmon/models/pokemon/pikachu/pikachu.pqc",
            "assets/pixelmon/models/pokemon/eevee/body.bmd",
            "assets/pixelmon/models/pokemon/eevee/anims/idle.smd",
            "assets/pixelmon/models/pokemon/eevee/skin.png",
            "assets/pixelmon/textures/eevee.bmd",
            "META-INF/MANIFEST.MF",
        ]);

        let entries = list_model_entries(&zip, Variant::Reforged);
        let listed: Vec<(&Path, FileAction)> = entries
            .iter()
            .map(|e| (e.relative.as_path(), e.action))
            .collect();
        assert_eq!(
            listed,
            vec![
                (Path::new("eevee/anims/idle.smd"), FileAction::Clone),
                (Path::new("eevee/body.bmd"), FileAction::Decode),
                (Path::new("pikachu/pikachu.pqc"), FileAction::Clone),
            ]
        );
    }

    #[test]
    fn test_read_entry() {
        let name = "assets/pixelmon/models/pokemon/eevee/body.smdx";
        let mut zip = archive(&[name]);
        assert_eq!(read_entry(&mut zip, name).unwrap(), name.as_bytes());
        assert!(read_entry(&mut zip, "missing").is_err());
    }

    #[test]
    fn test_is_archive() {
        assert!(is_archive("mods/Pixelmon-1.16.jar"));
        assert!(is_archive("models.ZIP"));
        assert!(!is_archive("models/body.bmd"));
    }
}
