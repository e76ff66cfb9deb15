//! Common types for the bundle store

use bytes::Bytes;

use bundlekit_formats::AssetKind;

use crate::error::{Result, StoreError};

/// An asset fetched from a resident bundle
#[derive(Debug, Clone)]
pub struct Asset {
    name: String,
    kind: AssetKind,
    data: Bytes,
}

impl Asset {
    pub(crate) fn new(name: String, kind: AssetKind, data: Bytes) -> Self {
        Self { name, kind, data }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// View a text asset as UTF-8
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.data).map_err(|_| StoreError::InvalidTextAsset {
            asset: self.name.clone(),
        })
    }
}

/// Counters describing store activity
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Bundles currently resident (excluding the root bundle)
    pub resident_bundles: usize,
    /// Bundle files opened since creation, root included
    pub bundle_loads: u64,
    /// Assets served since creation
    pub asset_fetches: u64,
}
