//! Complete (non-live) stream manifests: list every fragment of the inline bootstrap.

use std::path::PathBuf;

use anyhow::{Context, Result};

use super::parse::parse_bootstrap_info;
use crate::reconcile::{list_fragments, FragmentDescriptor};
use crate::run_table::RunTableSnapshot;
use crate::services::RunTableInspector;
use crate::storage::BootstrapStore;

/// Fragments of one stream manifest and where its bootstrap was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapListing {
    pub bootstrap_path: PathBuf,
    pub fragments: Vec<FragmentDescriptor>,
}

/// Decode the manifest's `bootstrapInfo`, store it as `<name>.bootstrap`,
/// inspect it and list its fragment run table.
pub fn list_manifest_fragments(
    xml: &str,
    name: &str,
    store: &BootstrapStore,
    inspector: &dyn RunTableInspector,
) -> Result<BootstrapListing> {
    let bootstrap = parse_bootstrap_info(xml)?;
    let bootstrap_path = store
        .write_bootstrap(name, &bootstrap)
        .with_context(|| format!("write bootstrap for {}", name))?;
    let text = inspector.inspect(&bootstrap_path)?;
    if let Some(saved) = store
        .write_inspection(name, &text)
        .with_context(|| format!("write inspection for {}", name))?
    {
        tracing::debug!(stream = %name, path = %saved.display(), "saved inspector output");
    }
    let snapshot = RunTableSnapshot::parse(&text)?;
    let fragments = list_fragments(&snapshot)?;
    tracing::debug!(stream = %name, fragments = fragments.len(), "listed manifest fragments");
    Ok(BootstrapListing {
        bootstrap_path,
        fragments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PollError;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use std::path::Path;

    const BOOTSTRAP: &[u8] = b"\x00\x00\x00\x2babst\x00\x00\x00\x00";

    const VOD_TABLE: &str = "\
live: 0
segments: 1
version: 0
flags: 0
quality entries: 0
entries: 1
segment=1,fragments=3
fragments: 1
version: 0
flags: 0
time scale: 1000
entries: 3
fragment=1,timestamp=0,duration=4000
fragment=2,timestamp=4000,duration=4000,discontinuity=2
fragment=3,timestamp=8000,duration=1500
";

    /// Checks the stored bootstrap is the decoded payload and answers with a fixed table.
    struct CheckingInspector;

    impl RunTableInspector for CheckingInspector {
        fn inspect(&self, bootstrap_path: &Path) -> Result<String, PollError> {
            let stored = std::fs::read(bootstrap_path).map_err(PollError::Io)?;
            if stored != BOOTSTRAP {
                return Err(PollError::Inspect("unexpected bootstrap bytes".into()));
            }
            Ok(VOD_TABLE.to_string())
        }
    }

    fn manifest() -> String {
        format!(
            "<manifest><id>vod1</id><bootstrapInfo profile=\"named\">{}</bootstrapInfo></manifest>",
            STANDARD.encode(BOOTSTRAP)
        )
    }

    #[test]
    fn lists_all_fragments_of_inline_bootstrap() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BootstrapStore::create(tmp.path(), true).unwrap();

        let listing = list_manifest_fragments(&manifest(), "vod1", &store, &CheckingInspector).unwrap();

        assert_eq!(listing.bootstrap_path, tmp.path().join("vod1.bootstrap"));
        let numbers: Vec<i64> = listing.fragments.iter().map(|d| d.fragment).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(listing.fragments.iter().all(|d| !d.pulled));
        assert_eq!(listing.fragments[1].discontinuity, 2);
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("vod1.xml")).unwrap(),
            VOD_TABLE
        );
    }

    #[test]
    fn manifest_without_bootstrap_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BootstrapStore::create(tmp.path(), false).unwrap();

        let err = list_manifest_fragments("<manifest/>", "vod1", &store, &CheckingInspector)
            .unwrap_err();

        assert!(err.to_string().contains("bootstrapInfo"), "{:#}", err);
        assert!(!tmp.path().join("vod1.bootstrap").exists());
    }
}
