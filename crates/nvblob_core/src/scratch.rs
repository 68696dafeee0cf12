//! Scratch buffers for staging blob contents.

use crate::error::{ManagerError, ManagerResult};
use std::ops::{Deref, DerefMut};
use zeroize::Zeroizing;

/// A zero-filled heap buffer that is wiped when dropped.
///
/// Blobs often carry credentials, so staged copies are not left behind
/// in freed memory.
pub(crate) struct ScratchBuffer {
    data: Zeroizing<Vec<u8>>,
}

impl ScratchBuffer {
    /// Allocates `size` zero bytes, reporting allocation failure as an error.
    pub(crate) fn zeroed(size: usize) -> ManagerResult<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| ManagerError::AllocationFailed { size })?;
        data.resize(size, 0);
        Ok(Self {
            data: Zeroizing::new(data),
        })
    }
}

impl Deref for ScratchBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for ScratchBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn zeroed_has_requested_length() {
        let buf = ScratchBuffer::zeroed(64).unwrap();
        assert_eq!(buf.len(), 64);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_length_is_fine() {
        let buf = ScratchBuffer::zeroed(0).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn impossible_allocation_is_reported() {
        let err = ScratchBuffer::zeroed(usize::MAX).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::AllocationFailed);
    }
}
