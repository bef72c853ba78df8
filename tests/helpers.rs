// Shared test helpers: minimal database fixtures and an in-memory object
// cache double.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use domain_origin::object_cache::ObjectCache;

/// Builds the smallest byte sequence `maxminddb` accepts as a database:
/// a one-node search tree, the 16-byte data-section separator, the metadata
/// marker, and a metadata map with the fields the reader requires.
#[allow(dead_code)] // Used by other test files
pub fn minimal_mmdb() -> Vec<u8> {
    // One node of 24-bit records (6 bytes) plus the data-section separator.
    let mut buf = vec![0u8; 6 + 16];
    buf.extend_from_slice(b"\xab\xcd\xefMaxMind.com");

    // Metadata: a 9-entry map in the MaxMind DB data format.
    buf.push(0xE9);
    push_str(&mut buf, "binary_format_major_version");
    buf.extend_from_slice(&[0xA1, 0x02]); // uint16: 2
    push_str(&mut buf, "binary_format_minor_version");
    buf.push(0xA0); // uint16: 0
    push_str(&mut buf, "build_epoch");
    buf.extend_from_slice(&[0x04, 0x02]); // uint64, 4-byte payload
    buf.extend_from_slice(&1_700_000_000u32.to_be_bytes());
    push_str(&mut buf, "database_type");
    push_str(&mut buf, "Test");
    push_str(&mut buf, "description");
    buf.push(0xE0); // empty map
    push_str(&mut buf, "ip_version");
    buf.extend_from_slice(&[0xA1, 0x06]); // uint16: 6
    push_str(&mut buf, "languages");
    buf.extend_from_slice(&[0x01, 0x04]); // array, 1 element
    push_str(&mut buf, "en");
    push_str(&mut buf, "node_count");
    buf.extend_from_slice(&[0xC1, 0x01]); // uint32: 1
    push_str(&mut buf, "record_size");
    buf.extend_from_slice(&[0xA1, 0x18]); // uint16: 24

    buf
}

fn push_str(buf: &mut Vec<u8>, s: &str) {
    assert!(s.len() < 29, "short-form string encoding only");
    buf.push(0x40 | s.len() as u8);
    buf.extend_from_slice(s.as_bytes());
}

/// In-memory object cache that records traffic for assertions.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    gets: AtomicUsize,
    puts: AtomicUsize,
}

#[allow(dead_code)] // Used by other test files
impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, bytes: Vec<u8>) -> Self {
        let cache = Self::default();
        cache
            .entries
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes);
        cache
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn stored(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ObjectCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().unwrap().get(key).cloned()
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> bool {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        true
    }
}

#[test]
fn test_minimal_mmdb_opens() {
    // The fixture must satisfy the real reader, otherwise every test built
    // on it is meaningless.
    let reader = maxminddb::Reader::from_source(minimal_mmdb()).expect("fixture must parse");
    assert_eq!(reader.metadata.node_count, 1);
    assert_eq!(reader.metadata.record_size, 24);
    assert_eq!(reader.metadata.build_epoch, 1_700_000_000);
}
