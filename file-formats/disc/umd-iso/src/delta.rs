//! Delta engines turning a file's current bytes plus a patch into new bytes

use crate::error::Result;

/// A byte-level transform from (old bytes, patch) to new bytes
pub trait DeltaPatch {
    /// Produce the patched content
    fn apply(&self, source: &[u8], patch: &[u8]) -> Result<Vec<u8>>;
}

impl<D: DeltaPatch + ?Sized> DeltaPatch for &D {
    fn apply(&self, source: &[u8], patch: &[u8]) -> Result<Vec<u8>> {
        (**self).apply(source, patch)
    }
}

impl<D: DeltaPatch + ?Sized> DeltaPatch for Box<D> {
    fn apply(&self, source: &[u8], patch: &[u8]) -> Result<Vec<u8>> {
        (**self).apply(source, patch)
    }
}

/// The patch is the new content, verbatim
#[derive(Debug, Clone, Copy, Default)]
pub struct Replace;

impl DeltaPatch for Replace {
    fn apply(&self, _source: &[u8], patch: &[u8]) -> Result<Vec<u8>> {
        Ok(patch.to_vec())
    }
}

/// VCDIFF patches decoded with xdelta3
#[cfg(feature = "xdelta")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Xdelta3;

#[cfg(feature = "xdelta")]
impl DeltaPatch for Xdelta3 {
    fn apply(&self, source: &[u8], patch: &[u8]) -> Result<Vec<u8>> {
        xdelta3::decode(patch, source).ok_or_else(|| {
            crate::Error::delta(format!(
                "xdelta3 could not apply a {} byte patch to {} bytes",
                patch.len(),
                source.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Xor(u8);

    impl DeltaPatch for Xor {
        fn apply(&self, source: &[u8], _patch: &[u8]) -> Result<Vec<u8>> {
            Ok(source.iter().map(|b| b ^ self.0).collect())
        }
    }

    #[test]
    fn test_replace_ignores_source() {
        assert_eq!(Replace.apply(b"old", b"new!").unwrap(), b"new!");
    }

    #[test]
    fn test_engine_through_references() {
        let engine: Box<dyn DeltaPatch> = Box::new(Xor(0xFF));
        assert_eq!(engine.apply(&[0x0F], &[]).unwrap(), vec![0xF0]);
        let by_ref = &Xor(1);
        assert_eq!(by_ref.apply(&[2], &[]).unwrap(), vec![3]);
    }

    #[cfg(feature = "xdelta")]
    #[test]
    fn test_xdelta_rejects_garbage() {
        assert!(Xdelta3.apply(b"source", b"not a vcdiff patch").is_err());
    }
}
