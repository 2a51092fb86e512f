//! Hash primitive boundary and the production SHA-1 implementation.

use sha1::{Digest, Sha1};

/// Size in bytes of one pipeline block.
pub const BLOCK_BYTES: usize = 64;

/// Size in bytes of the digest produced by the primitive.
pub const DIGEST_BYTES: usize = 20;

/// Incremental hash primitive driven by the block pipeline.
///
/// The pipeline streams one block per `Compute2` step through
/// [`HashPrimitive::update`] and asks for [`HashPrimitive::digest`] after
/// every block, so `digest` must not disturb the running state.
pub trait HashPrimitive {
    /// Absorbs more message bytes.
    fn update(&mut self, bytes: &[u8]);

    /// Returns the digest of everything absorbed since the last reset.
    fn digest(&self) -> [u8; DIGEST_BYTES];

    /// Discards all absorbed input.
    fn reset(&mut self);
}

impl<H: HashPrimitive + ?Sized> HashPrimitive for &mut H {
    fn update(&mut self, bytes: &[u8]) {
        (**self).update(bytes);
    }

    fn digest(&self) -> [u8; DIGEST_BYTES] {
        (**self).digest()
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}

impl<H: HashPrimitive + ?Sized> HashPrimitive for Box<H> {
    fn update(&mut self, bytes: &[u8]) {
        (**self).update(bytes);
    }

    fn digest(&self) -> [u8; DIGEST_BYTES] {
        (**self).digest()
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}

/// SHA-1 primitive backed by the `sha1` crate.
///
/// [`HashPrimitive::digest`] finalizes a copy of the running state, so the
/// value reflects standard SHA-1 padding over the bytes absorbed so far.
#[derive(Debug, Clone, Default)]
pub struct Sha1Primitive {
    hasher: Sha1,
    absorbed: u64,
}

impl Sha1Primitive {
    /// Creates a primitive with no input absorbed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of message bytes absorbed since the last reset.
    #[must_use]
    pub const fn absorbed(&self) -> u64 {
        self.absorbed
    }
}

impl HashPrimitive for Sha1Primitive {
    fn update(&mut self, bytes: &[u8]) {
        Digest::update(&mut self.hasher, bytes);
        self.absorbed = self.absorbed.wrapping_add(bytes.len() as u64);
    }

    fn digest(&self) -> [u8; DIGEST_BYTES] {
        let finalized = self.hasher.clone().finalize();
        let mut out = [0; DIGEST_BYTES];
        out.copy_from_slice(&finalized);
        out
    }

    fn reset(&mut self) {
        Digest::reset(&mut self.hasher);
        self.absorbed = 0;
    }
}
