//! Dependency manifest format
//!
//! The manifest maps a bundle name to its ordered dependency list. It is
//! produced by the packaging step and shipped inside the root bundle as an
//! asset named [`MANIFEST_ASSET_NAME`]; at runtime it is read-only and
//! consumed only through [`Manifest::dependencies`].
//!
//! ```text
//! magic    b"BMFT"
//! version  u16
//! count    u32
//! entries  count x { name_len u16, name, dep_count u16,
//!                    dep_count x (len u16, dep) }
//! ```

use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use binrw::{BinRead, BinWrite, binrw};
use tracing::debug;

use crate::error::{FormatError, Result};

/// Asset name the manifest is stored under inside the root bundle
pub const MANIFEST_ASSET_NAME: &str = "BundleManifest";

/// Current manifest format version
pub const MANIFEST_VERSION: u16 = 1;

#[binrw]
#[brw(little, magic = b"BMFT")]
struct ManifestHeader {
    version: u16,
    count: u32,
}

#[binrw]
#[brw(little)]
struct RawDep {
    len: u16,
    #[br(count = len)]
    name: Vec<u8>,
}

#[binrw]
#[brw(little)]
struct RawManifestEntry {
    name_len: u16,
    #[br(count = name_len)]
    name: Vec<u8>,
    dep_count: u16,
    #[br(count = dep_count)]
    deps: Vec<RawDep>,
}

/// Parsed dependency manifest, read-only after load
#[derive(Debug, Clone)]
pub struct Manifest {
    entries: HashMap<String, Vec<String>>,
    order: Vec<String>,
}

impl Manifest {
    /// Parse a manifest from its serialized form
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let header = ManifestHeader::read(&mut cursor)?;
        if header.version != MANIFEST_VERSION {
            return Err(FormatError::UnsupportedVersion(header.version));
        }

        let mut entries = HashMap::with_capacity(header.count as usize);
        let mut order = Vec::with_capacity(header.count as usize);
        for _ in 0..header.count {
            let raw = RawManifestEntry::read(&mut cursor)?;
            let name = String::from_utf8(raw.name).map_err(|_| FormatError::InvalidName)?;
            let deps = raw
                .deps
                .into_iter()
                .map(|dep| String::from_utf8(dep.name).map_err(|_| FormatError::InvalidName))
                .collect::<Result<Vec<_>>>()?;
            if entries.insert(name.clone(), deps).is_some() {
                return Err(FormatError::DuplicateBundle(name));
            }
            order.push(name);
        }

        debug!(bundles = order.len(), "parsed manifest");
        Ok(Self { entries, order })
    }

    /// Serialize the manifest for embedding in the root bundle
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        let header = ManifestHeader {
            version: MANIFEST_VERSION,
            count: self.order.len() as u32,
        };
        header.write(&mut cursor)?;
        for name in &self.order {
            let deps = &self.entries[name];
            let raw = RawManifestEntry {
                name_len: name.len() as u16,
                name: name.clone().into_bytes(),
                dep_count: deps.len() as u16,
                deps: deps
                    .iter()
                    .map(|dep| RawDep {
                        len: dep.len() as u16,
                        name: dep.clone().into_bytes(),
                    })
                    .collect(),
            };
            raw.write(&mut cursor)?;
        }
        Ok(cursor.into_inner())
    }

    /// Ordered dependencies of a bundle; empty for unlisted names
    pub fn dependencies(&self, bundle: &str) -> &[String] {
        self.entries.get(bundle).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, bundle: &str) -> bool {
        self.entries.contains_key(bundle)
    }

    /// Bundle names in manifest order
    pub fn bundles(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Builder for dependency manifests
///
/// The packaging step guarantees the dependency graph is acyclic; the
/// builder enforces that at [`ManifestBuilder::build`] time. Dependencies
/// naming bundles that were never added are allowed, they resolve to
/// archives packaged separately.
#[derive(Debug, Default)]
pub struct ManifestBuilder {
    entries: Vec<(String, Vec<String>)>,
    names: HashSet<String>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a bundle and its ordered dependency list
    pub fn add_bundle<I, S>(&mut self, name: impl Into<String>, deps: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if name.len() > u16::MAX as usize {
            return Err(FormatError::NameTooLong(name.len()));
        }
        if !self.names.insert(name.clone()) {
            return Err(FormatError::DuplicateBundle(name));
        }
        let deps: Vec<String> = deps.into_iter().map(Into::into).collect();
        for dep in &deps {
            if dep.len() > u16::MAX as usize {
                return Err(FormatError::NameTooLong(dep.len()));
            }
        }
        self.entries.push((name, deps));
        Ok(self)
    }

    /// Validate acyclicity and produce the manifest
    pub fn build(&self) -> Result<Manifest> {
        let entries: HashMap<String, Vec<String>> = self.entries.iter().cloned().collect();
        check_acyclic(&entries)?;
        Ok(Manifest {
            entries,
            order: self.entries.iter().map(|(name, _)| name.clone()).collect(),
        })
    }
}

/// Iterative three-color DFS over the declared bundles. Dependencies on
/// undeclared names are leaves.
fn check_acyclic(entries: &HashMap<String, Vec<String>>) -> Result<()> {
    const WHITE: u8 = 0;
    const GRAY: u8 = 1;
    const BLACK: u8 = 2;

    let mut color: HashMap<&str, u8> = entries.keys().map(|name| (name.as_str(), WHITE)).collect();

    for start in entries.keys() {
        if color[start.as_str()] != WHITE {
            continue;
        }
        let mut stack: Vec<(&str, usize)> = vec![(start.as_str(), 0)];
        color.insert(start.as_str(), GRAY);

        while let Some((node, next_dep)) = stack.pop() {
            let deps = &entries[node];
            if next_dep < deps.len() {
                stack.push((node, next_dep + 1));
                let dep = deps[next_dep].as_str();
                match color.get(dep).copied() {
                    Some(WHITE) => {
                        color.insert(dep, GRAY);
                        stack.push((dep, 0));
                    }
                    Some(GRAY) => {
                        return Err(FormatError::DependencyCycle(dep.to_string()));
                    }
                    // Finished node or undeclared leaf
                    _ => {}
                }
            } else {
                color.insert(node, BLACK);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dependencies_of_unlisted_bundle_are_empty() {
        let manifest = ManifestBuilder::new().build().unwrap();
        assert!(manifest.dependencies("nope").is_empty());
    }

    #[test]
    fn round_trips_through_encode() {
        let mut builder = ManifestBuilder::new();
        builder.add_bundle("ui", ["atlas", "fonts"]).unwrap();
        builder.add_bundle("atlas", Vec::<String>::new()).unwrap();
        let manifest = builder.build().unwrap();

        let parsed = Manifest::parse(&manifest.encode().unwrap()).unwrap();
        assert_eq!(parsed.dependencies("ui"), &["atlas", "fonts"]);
        assert!(parsed.dependencies("atlas").is_empty());
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn undeclared_dependencies_are_allowed() {
        let mut builder = ManifestBuilder::new();
        builder.add_bundle("ui", ["packaged-elsewhere"]).unwrap();
        assert!(builder.build().is_ok());
    }

    #[test]
    fn rejects_direct_cycle() {
        let mut builder = ManifestBuilder::new();
        builder.add_bundle("a", ["b"]).unwrap();
        builder.add_bundle("b", ["a"]).unwrap();
        assert!(matches!(
            builder.build().unwrap_err(),
            FormatError::DependencyCycle(_)
        ));
    }

    #[test]
    fn rejects_self_cycle() {
        let mut builder = ManifestBuilder::new();
        builder.add_bundle("a", ["a"]).unwrap();
        assert!(matches!(
            builder.build().unwrap_err(),
            FormatError::DependencyCycle(_)
        ));
    }

    #[test]
    fn rejects_duplicate_bundle() {
        let mut builder = ManifestBuilder::new();
        builder.add_bundle("a", Vec::<String>::new()).unwrap();
        assert!(matches!(
            builder.add_bundle("a", Vec::<String>::new()).unwrap_err(),
            FormatError::DuplicateBundle(_)
        ));
    }

    #[test]
    fn diamond_graph_is_acyclic() {
        let mut builder = ManifestBuilder::new();
        builder.add_bundle("app", ["ui", "audio"]).unwrap();
        builder.add_bundle("ui", ["core"]).unwrap();
        builder.add_bundle("audio", ["core"]).unwrap();
        builder.add_bundle("core", Vec::<String>::new()).unwrap();
        assert!(builder.build().is_ok());
    }
}
