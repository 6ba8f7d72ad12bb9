//! Column family definitions for the local RocksDB record store.
//!
//! One column family per logical collection, keyed by the derived frame key:
//! - vectors: Frame Vector Records (pass 1 output)
//! - sequence_inputs: Sequence Input Records (pass 2 output)

use rocksdb::{ColumnFamilyDescriptor, Options};

use autoss_types::Collection;

/// Column family name for frame vector records
pub const CF_VECTORS: &str = "vectors";

/// Column family name for sequence input records
pub const CF_SEQUENCE_INPUTS: &str = "sequence_inputs";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_VECTORS, CF_SEQUENCE_INPUTS];

/// Column family backing a collection.
pub fn cf_for(collection: Collection) -> &'static str {
    match collection {
        Collection::Vectors => CF_VECTORS,
        Collection::SequenceInputs => CF_SEQUENCE_INPUTS,
    }
}

/// Write-once JSON documents, compressed
fn record_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    ALL_CF_NAMES
        .iter()
        .map(|name| ColumnFamilyDescriptor::new(*name, record_options()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_collection_has_a_cf() {
        assert_eq!(cf_for(Collection::Vectors), CF_VECTORS);
        assert_eq!(cf_for(Collection::SequenceInputs), CF_SEQUENCE_INPUTS);
        assert_eq!(build_cf_descriptors().len(), ALL_CF_NAMES.len());
    }
}
