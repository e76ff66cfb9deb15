//! Bundle file reader with memory mapping

use std::collections::HashMap;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use binrw::BinRead;
use bytes::Bytes;
use memmap2::Mmap;
use tracing::debug;

use crate::bundle::{AssetKind, BUNDLE_VERSION, BundleHeader, RawEntry};
use crate::error::{FormatError, Result};

/// An opened, memory-resident bundle file
///
/// The file stays mapped for the lifetime of the handle; dropping the handle
/// releases the mapping. Asset payloads are copied out of the map on fetch.
pub struct Bundle {
    name: String,
    mmap: Mmap,
    data_start: usize,
    index: HashMap<String, EntryMeta>,
    order: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct EntryMeta {
    kind: AssetKind,
    offset: u64,
    size: u64,
}

/// One asset fetched out of a bundle
#[derive(Debug, Clone)]
pub struct BundleAsset {
    pub kind: AssetKind,
    pub data: Bytes,
}

impl Bundle {
    /// Open a bundle file, validating header, index, and data checksum
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bundle_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let file = File::open(path)?;
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };

        let mut cursor = Cursor::new(&mmap[..]);
        let header = BundleHeader::read(&mut cursor)?;
        if header.version != BUNDLE_VERSION {
            return Err(FormatError::UnsupportedVersion(header.version));
        }

        let mut index = HashMap::with_capacity(header.count as usize);
        let mut order = Vec::with_capacity(header.count as usize);
        for _ in 0..header.count {
            let raw = RawEntry::read(&mut cursor)?;
            let name = String::from_utf8(raw.name).map_err(|_| FormatError::InvalidName)?;
            let meta = EntryMeta {
                kind: AssetKind::from_wire(raw.kind)?,
                offset: raw.offset,
                size: raw.size,
            };
            if index.insert(name.clone(), meta).is_some() {
                return Err(FormatError::DuplicateAsset(name));
            }
            order.push(name);
        }

        let data_start = cursor.position() as usize;
        let data = &mmap[data_start..];

        for name in &order {
            let meta = index[name];
            let end = meta.offset.checked_add(meta.size);
            if end.map_or(true, |end| end > data.len() as u64) {
                return Err(FormatError::EntryOutOfBounds {
                    name: name.clone(),
                    offset: meta.offset,
                    size: meta.size,
                    data_len: data.len() as u64,
                });
            }
        }

        let digest = md5::compute(data);
        if digest.0 != header.checksum {
            return Err(FormatError::ChecksumMismatch {
                expected: hex::encode(header.checksum),
                actual: hex::encode(digest.0),
            });
        }

        debug!(bundle = %bundle_name, assets = order.len(), "opened bundle");

        Ok(Self {
            name: bundle_name,
            mmap,
            data_start,
            index,
            order,
        })
    }

    /// Bundle name (the file name segment of the path it was opened from)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of assets in the bundle
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, asset: &str) -> bool {
        self.index.contains_key(asset)
    }

    /// Asset names in index order
    pub fn asset_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Fetch a named asset, copying its payload out of the mapping
    pub fn asset(&self, asset: &str) -> Option<BundleAsset> {
        let meta = self.index.get(asset)?;
        let start = self.data_start + meta.offset as usize;
        let end = start + meta.size as usize;
        Some(BundleAsset {
            kind: meta.kind,
            data: Bytes::copy_from_slice(&self.mmap[start..end]),
        })
    }
}

impl std::fmt::Debug for Bundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundle")
            .field("name", &self.name)
            .field("assets", &self.order.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::BundleBuilder;
    use pretty_assertions::assert_eq;
    use std::io::{Seek, SeekFrom, Write};
    use tempfile::TempDir;

    fn write_test_bundle(dir: &TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut builder = BundleBuilder::new();
        builder
            .add_asset("hello.lua", AssetKind::Text, b"return 42".to_vec())
            .unwrap();
        builder
            .add_asset("logo.bin", AssetKind::Binary, vec![0xde, 0xad, 0xbe, 0xef])
            .unwrap();
        builder.write_file(&path).unwrap();
        path
    }

    #[test]
    fn open_and_fetch_assets() {
        let dir = TempDir::new().unwrap();
        let path = write_test_bundle(&dir, "ui");

        let bundle = Bundle::open(&path).unwrap();
        assert_eq!(bundle.name(), "ui");
        assert_eq!(bundle.len(), 2);
        assert!(bundle.contains("hello.lua"));

        let asset = bundle.asset("hello.lua").unwrap();
        assert_eq!(asset.kind, AssetKind::Text);
        assert_eq!(&asset.data[..], b"return 42");

        let asset = bundle.asset("logo.bin").unwrap();
        assert_eq!(asset.kind, AssetKind::Binary);
        assert_eq!(&asset.data[..], &[0xde, 0xad, 0xbe, 0xef]);

        assert!(bundle.asset("missing").is_none());
    }

    #[test]
    fn rejects_bad_magic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk");
        std::fs::write(&path, b"NOPE this is not a bundle").unwrap();

        let err = Bundle::open(&path).unwrap_err();
        assert!(matches!(err, FormatError::Parse(_)));
    }

    #[test]
    fn rejects_truncated_file() {
        let dir = TempDir::new().unwrap();
        let path = write_test_bundle(&dir, "ui");

        let full = std::fs::read(&path).unwrap();
        std::fs::write(&path, &full[..full.len() / 2]).unwrap();

        assert!(Bundle::open(&path).is_err());
    }

    #[test]
    fn rejects_corrupted_data_section() {
        let dir = TempDir::new().unwrap();
        let path = write_test_bundle(&dir, "ui");

        // Flip the last payload byte; the index still parses.
        let len = std::fs::metadata(&path).unwrap().len();
        let mut file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.seek(SeekFrom::Start(len - 1)).unwrap();
        file.write_all(&[0xff]).unwrap();
        drop(file);

        let err = Bundle::open(&path).unwrap_err();
        assert!(matches!(err, FormatError::ChecksumMismatch { .. }));
    }
}
