//! Store construction for subsystems.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::store::{JsonFileStore, Store, StoreError};

/// Opens or creates the store backing one subsystem.
pub trait StoreFactory: Send + Sync {
    fn open(&self, runtime_path: &Path, subsystem: &str) -> Result<Store, StoreError>;
}

/// Location of a subsystem's store file.
pub fn store_path(runtime_path: &Path, subsystem: &str) -> PathBuf {
    runtime_path.join(format!("{}.json", subsystem))
}

/// Factory producing `<runtime_path>/<subsystem>.json` stores.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStoreFactory;

impl StoreFactory for JsonStoreFactory {
    fn open(&self, runtime_path: &Path, subsystem: &str) -> Result<Store, StoreError> {
        JsonFileStore::open(store_path(runtime_path, subsystem)).map(Arc::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_path() {
        assert_eq!(
            store_path(Path::new("/var/lib/netplane"), "netplane-ipam"),
            PathBuf::from("/var/lib/netplane/netplane-ipam.json")
        );
    }

    #[test]
    fn test_separate_files_per_subsystem() {
        let dir = tempfile::tempdir().unwrap();
        let factory = JsonStoreFactory;

        let net = factory.open(dir.path(), "netplane-net").unwrap();
        let ipam = factory.open(dir.path(), "netplane-ipam").unwrap();
        net.write("networks", &vec!["br0"]).unwrap();

        assert_ne!(net.path(), ipam.path());
        assert!(ipam.is_empty());
    }
}
