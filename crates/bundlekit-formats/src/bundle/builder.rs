//! Bundle file builder
//!
//! The packaging side of the container format. Assets are staged in memory
//! and written out in one pass, index first, then the data section whose
//! md5 lands in the header.

use std::collections::HashSet;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use binrw::BinWrite;
use tracing::debug;

use crate::bundle::{AssetKind, BUNDLE_VERSION, BundleHeader, RawEntry};
use crate::error::{FormatError, Result};

/// Builder for bundle container files
#[derive(Debug, Default)]
pub struct BundleBuilder {
    assets: Vec<PendingAsset>,
    names: HashSet<String>,
}

#[derive(Debug)]
struct PendingAsset {
    name: String,
    kind: AssetKind,
    data: Vec<u8>,
}

impl BundleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an asset for writing. Names must be unique within the bundle.
    pub fn add_asset(
        &mut self,
        name: impl Into<String>,
        kind: AssetKind,
        data: impl Into<Vec<u8>>,
    ) -> Result<&mut Self> {
        let name = name.into();
        if name.len() > u16::MAX as usize {
            return Err(FormatError::NameTooLong(name.len()));
        }
        if !self.names.insert(name.clone()) {
            return Err(FormatError::DuplicateAsset(name));
        }
        self.assets.push(PendingAsset {
            name,
            kind,
            data: data.into(),
        });
        Ok(self)
    }

    /// Number of staged assets
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Write the bundle to a writer
    pub fn write_to<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        let mut data = Vec::new();
        let mut entries = Vec::with_capacity(self.assets.len());
        for asset in &self.assets {
            let offset = data.len() as u64;
            data.extend_from_slice(&asset.data);
            entries.push(RawEntry {
                kind: asset.kind.to_wire(),
                name_len: asset.name.len() as u16,
                name: asset.name.clone().into_bytes(),
                offset,
                size: asset.data.len() as u64,
            });
        }

        let header = BundleHeader {
            version: BUNDLE_VERSION,
            count: entries.len() as u32,
            checksum: md5::compute(&data).0,
        };
        header.write(writer)?;
        for entry in &entries {
            entry.write(writer)?;
        }
        writer.write_all(&data)?;

        debug!(
            assets = self.assets.len(),
            bytes = data.len(),
            "wrote bundle"
        );
        Ok(())
    }

    /// Write the bundle to a file at `path`
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        self.write_to(&mut file)?;
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::Bundle;
    use tempfile::TempDir;

    #[test]
    fn rejects_duplicate_asset_names() {
        let mut builder = BundleBuilder::new();
        builder
            .add_asset("a.lua", AssetKind::Text, b"x".to_vec())
            .unwrap();
        let err = builder
            .add_asset("a.lua", AssetKind::Text, b"y".to_vec())
            .unwrap_err();
        assert!(matches!(err, FormatError::DuplicateAsset(name) if name == "a.lua"));
    }

    #[test]
    fn empty_bundle_is_valid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty");
        BundleBuilder::new().write_file(&path).unwrap();

        let bundle = Bundle::open(&path).unwrap();
        assert!(bundle.is_empty());
        assert!(bundle.asset("anything").is_none());
    }
}
