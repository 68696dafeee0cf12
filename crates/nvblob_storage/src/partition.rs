//! Partition bookkeeping shared by the backends.
//!
//! A partition is a set of namespaces, each mapping keys to blobs, plus the
//! table of handles currently open against it. Backends wrap a
//! [`PartitionState`] in a lock and add their own persistence.

use crate::backend::{validate_name, OpenMode, SegmentHandle};
use crate::error::{BackendError, BackendResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Describes one stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobEntry {
    /// Namespace holding the blob.
    pub namespace: String,
    /// Key of the blob within the namespace.
    pub key: String,
    /// Blob size in bytes.
    pub size: usize,
}

type Namespaces = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// The persisted part of a partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PartitionImage {
    #[serde(with = "blob_bytes")]
    namespaces: Namespaces,
}

/// Stores blobs as byte strings rather than sequences of integers.
mod blob_bytes {
    use super::Namespaces;
    use serde::de::{self, SeqAccess, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;
    use std::fmt;

    struct BytesRef<'a>(&'a [u8]);

    impl Serialize for BytesRef<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_bytes(self.0)
        }
    }

    struct ByteBuf(Vec<u8>);

    impl<'de> Deserialize<'de> for ByteBuf {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_byte_buf(ByteBufVisitor)
        }
    }

    struct ByteBufVisitor;

    impl<'de> Visitor<'de> for ByteBufVisitor {
        type Value = ByteBuf;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a byte string")
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<ByteBuf, E> {
            Ok(ByteBuf(v.to_vec()))
        }

        fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<ByteBuf, E> {
            Ok(ByteBuf(v))
        }

        // Partitions written before blobs were byte strings.
        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ByteBuf, A::Error> {
            let mut data = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(byte) = seq.next_element()? {
                data.push(byte);
            }
            Ok(ByteBuf(data))
        }
    }

    pub(super) fn serialize<S: Serializer>(
        namespaces: &Namespaces,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let view: BTreeMap<&str, BTreeMap<&str, BytesRef<'_>>> = namespaces
            .iter()
            .map(|(namespace, blobs)| {
                let blobs = blobs
                    .iter()
                    .map(|(key, blob)| (key.as_str(), BytesRef(blob)))
                    .collect();
                (namespace.as_str(), blobs)
            })
            .collect();
        view.serialize(serializer)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Namespaces, D::Error> {
        let raw: BTreeMap<String, BTreeMap<String, ByteBuf>> =
            BTreeMap::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(namespace, blobs)| {
                let blobs = blobs.into_iter().map(|(key, blob)| (key, blob.0)).collect();
                (namespace, blobs)
            })
            .collect())
    }
}

impl PartitionImage {
    /// Bytes charged against the partition capacity.
    ///
    /// Names are charged alongside blob contents so that an empty blob
    /// still costs something.
    pub(crate) fn used_bytes(&self) -> usize {
        self.namespaces
            .iter()
            .map(|(namespace, blobs)| {
                namespace.len()
                    + blobs
                        .iter()
                        .map(|(key, blob)| key.len() + blob.len())
                        .sum::<usize>()
            })
            .sum()
    }
}

#[derive(Debug)]
struct OpenHandle {
    namespace: String,
    mode: OpenMode,
}

/// Live state of a partition: contents, capacity and open handles.
#[derive(Debug)]
pub(crate) struct PartitionState {
    image: PartitionImage,
    capacity: usize,
    initialized: bool,
    handles: HashMap<u32, OpenHandle>,
    next_handle: u32,
}

impl PartitionState {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            image: PartitionImage::default(),
            capacity,
            initialized: false,
            handles: HashMap::new(),
            next_handle: 1,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn image(&self) -> &PartitionImage {
        &self.image
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Installs `image` as the partition contents and marks it online.
    pub(crate) fn load(&mut self, image: PartitionImage) {
        self.image = image;
        self.initialized = true;
    }

    /// Drops all contents and handles and takes the partition offline.
    pub(crate) fn erase(&mut self) {
        self.image = PartitionImage::default();
        self.handles.clear();
        self.initialized = false;
    }

    pub(crate) fn has_namespace(&self, namespace: &str) -> bool {
        self.image.namespaces.contains_key(namespace)
    }

    /// Removes a namespace created by a failed open.
    pub(crate) fn remove_namespace(&mut self, namespace: &str) {
        self.image.namespaces.remove(namespace);
    }

    pub(crate) fn open_handle_count(&self) -> usize {
        self.handles.len()
    }

    pub(crate) fn open(&mut self, namespace: &str, mode: OpenMode) -> BackendResult<SegmentHandle> {
        self.ensure_initialized()?;
        validate_name(namespace)?;

        if !self.image.namespaces.contains_key(namespace) {
            match mode {
                OpenMode::ReadOnly => {
                    return Err(BackendError::NotFound {
                        name: namespace.to_string(),
                    })
                }
                OpenMode::ReadWrite => {
                    let required = self.image.used_bytes() + namespace.len();
                    if required > self.capacity {
                        return Err(BackendError::NotEnoughSpace {
                            required,
                            available: self.capacity,
                        });
                    }
                    self.image
                        .namespaces
                        .insert(namespace.to_string(), BTreeMap::new());
                }
            }
        }

        let id = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1).max(1);
        self.handles.insert(
            id,
            OpenHandle {
                namespace: namespace.to_string(),
                mode,
            },
        );
        Ok(SegmentHandle(id))
    }

    pub(crate) fn close(&mut self, handle: SegmentHandle) {
        self.handles.remove(&handle.0);
    }

    pub(crate) fn blob_size(&self, handle: SegmentHandle, key: &str) -> BackendResult<usize> {
        self.blob(handle, key).map(<[u8]>::len)
    }

    pub(crate) fn read_blob(
        &self,
        handle: SegmentHandle,
        key: &str,
        buf: &mut [u8],
    ) -> BackendResult<usize> {
        let blob = self.blob(handle, key)?;
        if buf.len() < blob.len() {
            return Err(BackendError::InvalidLength {
                required: blob.len(),
                provided: buf.len(),
            });
        }
        buf[..blob.len()].copy_from_slice(blob);
        Ok(blob.len())
    }

    /// Stores a blob and returns the namespace plus the blob it replaced,
    /// which [`PartitionState::restore`] uses to undo the write.
    pub(crate) fn write_blob(
        &mut self,
        handle: SegmentHandle,
        key: &str,
        data: &[u8],
    ) -> BackendResult<(String, Option<Vec<u8>>)> {
        let open = self.handle(handle)?;
        if open.mode == OpenMode::ReadOnly {
            return Err(BackendError::ReadOnly);
        }
        validate_name(key)?;
        let namespace = open.namespace.clone();

        let replaced = self
            .image
            .namespaces
            .get(&namespace)
            .and_then(|blobs| blobs.get(key))
            .map_or(0, |old| key.len() + old.len());
        let required = self.image.used_bytes() - replaced + key.len() + data.len();
        if required > self.capacity {
            return Err(BackendError::NotEnoughSpace {
                required,
                available: self.capacity,
            });
        }

        let previous = self
            .image
            .namespaces
            .entry(namespace.clone())
            .or_default()
            .insert(key.to_string(), data.to_vec());
        Ok((namespace, previous))
    }

    /// Puts back the blob that a write replaced.
    pub(crate) fn restore(&mut self, namespace: &str, key: &str, previous: Option<Vec<u8>>) {
        if let Some(blobs) = self.image.namespaces.get_mut(namespace) {
            match previous {
                Some(blob) => {
                    blobs.insert(key.to_string(), blob);
                }
                None => {
                    blobs.remove(key);
                }
            }
        }
    }

    pub(crate) fn entries(&self) -> Vec<BlobEntry> {
        self.image
            .namespaces
            .iter()
            .flat_map(|(namespace, blobs)| {
                blobs.iter().map(move |(key, blob)| BlobEntry {
                    namespace: namespace.clone(),
                    key: key.clone(),
                    size: blob.len(),
                })
            })
            .collect()
    }

    fn ensure_initialized(&self) -> BackendResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(BackendError::NotInitialized)
        }
    }

    fn handle(&self, handle: SegmentHandle) -> BackendResult<&OpenHandle> {
        self.ensure_initialized()?;
        self.handles
            .get(&handle.0)
            .ok_or(BackendError::InvalidHandle(handle.0))
    }

    fn blob(&self, handle: SegmentHandle, key: &str) -> BackendResult<&[u8]> {
        let open = self.handle(handle)?;
        validate_name(key)?;
        self.image
            .namespaces
            .get(&open.namespace)
            .and_then(|blobs| blobs.get(key))
            .map(Vec::as_slice)
            .ok_or_else(|| BackendError::NotFound {
                name: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn online(capacity: usize) -> PartitionState {
        let mut state = PartitionState::new(capacity);
        state.load(PartitionImage::default());
        state
    }

    #[test]
    fn offline_partition_rejects_open() {
        let mut state = PartitionState::new(1024);
        assert!(matches!(
            state.open("wifi", OpenMode::ReadWrite),
            Err(BackendError::NotInitialized)
        ));
    }

    #[test]
    fn read_only_open_requires_namespace() {
        let mut state = online(1024);
        assert!(matches!(
            state.open("wifi", OpenMode::ReadOnly),
            Err(BackendError::NotFound { .. })
        ));

        let rw = state.open("wifi", OpenMode::ReadWrite).unwrap();
        state.close(rw);
        assert!(state.open("wifi", OpenMode::ReadOnly).is_ok());
    }

    #[test]
    fn write_then_read() {
        let mut state = online(1024);
        let h = state.open("wifi", OpenMode::ReadWrite).unwrap();
        state.write_blob(h, "wifi", b"ssid1").unwrap();

        assert_eq!(state.blob_size(h, "wifi").unwrap(), 5);
        let mut buf = [0u8; 8];
        assert_eq!(state.read_blob(h, "wifi", &mut buf).unwrap(), 5);
        assert_eq!(&buf[..5], b"ssid1");
    }

    #[test]
    fn read_into_short_buffer_fails() {
        let mut state = online(1024);
        let h = state.open("wifi", OpenMode::ReadWrite).unwrap();
        state.write_blob(h, "wifi", b"ssid1").unwrap();

        let mut buf = [0u8; 4];
        assert!(matches!(
            state.read_blob(h, "wifi", &mut buf),
            Err(BackendError::InvalidLength {
                required: 5,
                provided: 4
            })
        ));
    }

    #[test]
    fn read_only_handle_cannot_write() {
        let mut state = online(1024);
        let rw = state.open("cfg", OpenMode::ReadWrite).unwrap();
        state.close(rw);

        let ro = state.open("cfg", OpenMode::ReadOnly).unwrap();
        assert!(matches!(
            state.write_blob(ro, "cfg", b"x"),
            Err(BackendError::ReadOnly)
        ));
    }

    #[test]
    fn closed_handle_is_invalid() {
        let mut state = online(1024);
        let h = state.open("cfg", OpenMode::ReadWrite).unwrap();
        state.close(h);
        assert!(matches!(
            state.blob_size(h, "cfg"),
            Err(BackendError::InvalidHandle(_))
        ));
        assert_eq!(state.open_handle_count(), 0);
    }

    #[test]
    fn capacity_is_enforced_and_replacement_is_credited() {
        // "ns" (2) + "k" (1) + 7 bytes = 10
        let mut state = online(10);
        let h = state.open("ns", OpenMode::ReadWrite).unwrap();
        state.write_blob(h, "k", &[1; 7]).unwrap();

        // Replacing the blob frees its old bytes first.
        state.write_blob(h, "k", &[2; 7]).unwrap();

        let err = state.write_blob(h, "k", &[3; 8]).unwrap_err();
        assert!(matches!(
            err,
            BackendError::NotEnoughSpace {
                required: 11,
                available: 10
            }
        ));

        let mut buf = [0u8; 7];
        state.read_blob(h, "k", &mut buf).unwrap();
        assert_eq!(buf, [2; 7]);
    }

    #[test]
    fn restore_undoes_write() {
        let mut state = online(1024);
        let h = state.open("ns", OpenMode::ReadWrite).unwrap();
        state.write_blob(h, "k", b"old").unwrap();

        let (ns, previous) = state.write_blob(h, "k", b"new").unwrap();
        state.restore(&ns, "k", previous);

        let mut buf = [0u8; 3];
        state.read_blob(h, "k", &mut buf).unwrap();
        assert_eq!(&buf, b"old");

        let (ns, previous) = state.write_blob(h, "fresh", b"v").unwrap();
        state.restore(&ns, "fresh", previous);
        assert!(matches!(
            state.blob_size(h, "fresh"),
            Err(BackendError::NotFound { .. })
        ));
    }

    #[test]
    fn erase_clears_everything() {
        let mut state = online(1024);
        let h = state.open("ns", OpenMode::ReadWrite).unwrap();
        state.write_blob(h, "k", b"v").unwrap();

        state.erase();
        assert!(!state.is_initialized());
        assert_eq!(state.open_handle_count(), 0);
        assert_eq!(state.image().used_bytes(), 0);
    }

    #[test]
    fn namespace_creation_is_charged() {
        let mut state = online(3);
        assert!(matches!(
            state.open("long", OpenMode::ReadWrite),
            Err(BackendError::NotEnoughSpace {
                required: 4,
                available: 3
            })
        ));
        assert!(!state.has_namespace("long"));

        state.open("abc", OpenMode::ReadWrite).unwrap();
        assert!(state.has_namespace("abc"));
        state.remove_namespace("abc");
        assert!(!state.has_namespace("abc"));
    }

    #[test]
    fn blobs_encode_as_cbor_byte_strings() {
        let mut state = online(usize::MAX);
        let h = state.open("ns", OpenMode::ReadWrite).unwrap();
        state.write_blob(h, "k", &[0xFF; 1000]).unwrap();

        let mut encoded = Vec::new();
        ciborium::into_writer(state.image(), &mut encoded).unwrap();
        // Integer arrays would need two bytes per 0xFF element.
        assert!(encoded.len() < 1100, "encoded {} bytes", encoded.len());

        let decoded: PartitionImage = ciborium::from_reader(encoded.as_slice()).unwrap();
        assert_eq!(&decoded, state.image());
    }

    #[test]
    fn integer_array_blobs_still_decode() {
        let legacy: BTreeMap<&str, BTreeMap<&str, BTreeMap<&str, Vec<u8>>>> =
            BTreeMap::from([(
                "namespaces",
                BTreeMap::from([("ns", BTreeMap::from([("k", vec![1u8, 2, 3])]))]),
            )]);
        let mut encoded = Vec::new();
        ciborium::into_writer(&legacy, &mut encoded).unwrap();

        let decoded: PartitionImage = ciborium::from_reader(encoded.as_slice()).unwrap();
        assert_eq!(decoded.used_bytes(), 2 + 1 + 3);
    }

    #[test]
    fn entries_list_blobs() {
        let mut state = online(1024);
        let h = state.open("a", OpenMode::ReadWrite).unwrap();
        state.write_blob(h, "x", b"12").unwrap();
        state.write_blob(h, "y", b"345").unwrap();

        let entries = state.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "x");
        assert_eq!(entries[1].size, 3);
    }

    proptest! {
        #[test]
        fn used_bytes_matches_last_writes(
            writes in prop::collection::vec(("[a-c]", prop::collection::vec(any::<u8>(), 0..32)), 1..16)
        ) {
            let mut state = online(usize::MAX);
            let h = state.open("ns", OpenMode::ReadWrite).unwrap();
            let mut latest = BTreeMap::new();
            for (key, blob) in &writes {
                state.write_blob(h, key, blob).unwrap();
                latest.insert(key.clone(), blob.len());
            }

            let expected = "ns".len() + latest.iter().map(|(k, len)| k.len() + len).sum::<usize>();
            prop_assert_eq!(state.image().used_bytes(), expected);
            prop_assert_eq!(state.entries().len(), latest.len());
        }
    }
}
