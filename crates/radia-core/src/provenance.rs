// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Provenance of merged-mesh elements.
//!
//! When several objects are merged into one mesh, every merged vertex and
//! triangle remembers which object it came from and its index inside that
//! object. The pair is packed into a single `u32` for compact storage; the
//! split between object bits and index bits is chosen from the object count,
//! and anything that would not fit is rejected instead of wrapping.

use thiserror::Error;

const TOTAL_BITS: u32 = u32::BITS;

/// An element's origin: owning object and index local to that object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Provenance {
    /// Registration index of the owning object.
    pub object: u32,
    /// Index of the element inside the owning object.
    pub index: u32,
}

impl Provenance {
    /// Creates a new provenance pair.
    pub const fn new(object: u32, index: u32) -> Self {
        Self { object, index }
    }
}

/// Capacity violations of a [`ProvenanceCodec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProvenanceError {
    /// More objects than any split of 32 bits can address.
    #[error("{count} objects cannot be addressed (limit {max})")]
    TooManyObjects {
        /// Requested object count.
        count: usize,
        /// Largest supported count.
        max: u64,
    },
    /// An object id beyond the codec's object capacity.
    #[error("object {object} out of range (limit {max})")]
    ObjectOutOfRange {
        /// The offending object id.
        object: u32,
        /// Exclusive upper bound.
        max: u64,
    },
    /// A local index beyond the codec's per-object capacity.
    #[error("local index {index} out of range (limit {max})")]
    IndexOutOfRange {
        /// The offending local index.
        index: u32,
        /// Exclusive upper bound.
        max: u64,
    },
}

/// Packs [`Provenance`] pairs into `u32` and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvenanceCodec {
    index_bits: u32,
}

impl ProvenanceCodec {
    /// Smallest number of index bits any codec keeps.
    pub const MIN_INDEX_BITS: u32 = 1;

    /// Creates a codec with just enough object bits for `object_count` objects,
    /// leaving every remaining bit to local indices.
    pub fn for_objects(object_count: usize) -> Result<Self, ProvenanceError> {
        let object_bits = if object_count <= 1 {
            0
        } else {
            usize::BITS - (object_count - 1).leading_zeros()
        };
        if object_bits > TOTAL_BITS - Self::MIN_INDEX_BITS {
            return Err(ProvenanceError::TooManyObjects {
                count: object_count,
                max: 1u64 << (TOTAL_BITS - Self::MIN_INDEX_BITS),
            });
        }
        Ok(Self {
            index_bits: TOTAL_BITS - object_bits,
        })
    }

    /// Number of bits reserved for the local index.
    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    /// Exclusive upper bound on object ids.
    pub fn max_objects(&self) -> u64 {
        1u64 << (TOTAL_BITS - self.index_bits)
    }

    /// Exclusive upper bound on local indices.
    pub fn max_index(&self) -> u64 {
        1u64 << self.index_bits
    }

    /// Packs a pair, rejecting values that do not fit.
    pub fn encode(&self, provenance: Provenance) -> Result<u32, ProvenanceError> {
        if u64::from(provenance.object) >= self.max_objects() {
            return Err(ProvenanceError::ObjectOutOfRange {
                object: provenance.object,
                max: self.max_objects(),
            });
        }
        if u64::from(provenance.index) >= self.max_index() {
            return Err(ProvenanceError::IndexOutOfRange {
                index: provenance.index,
                max: self.max_index(),
            });
        }
        let packed = (u64::from(provenance.object) << self.index_bits) | u64::from(provenance.index);
        // Both checks above bound `packed` below 2^32.
        Ok(packed as u32)
    }

    /// Unpacks a value produced by [`encode`](Self::encode).
    pub fn decode(&self, packed: u32) -> Provenance {
        let packed = u64::from(packed);
        let mask = self.max_index() - 1;
        Provenance {
            object: (packed >> self.index_bits) as u32,
            index: (packed & mask) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_object_uses_all_bits_for_indices() {
        let codec = ProvenanceCodec::for_objects(1).unwrap();
        assert_eq!(codec.index_bits(), 32);
        assert_eq!(codec.max_objects(), 1);
        let p = Provenance::new(0, u32::MAX);
        assert_eq!(codec.decode(codec.encode(p).unwrap()), p);
    }

    #[test]
    fn object_bits_grow_with_object_count() {
        assert_eq!(ProvenanceCodec::for_objects(2).unwrap().index_bits(), 31);
        assert_eq!(ProvenanceCodec::for_objects(3).unwrap().index_bits(), 30);
        assert_eq!(ProvenanceCodec::for_objects(4).unwrap().index_bits(), 30);
        assert_eq!(ProvenanceCodec::for_objects(5).unwrap().index_bits(), 29);
        assert_eq!(ProvenanceCodec::for_objects(1000).unwrap().index_bits(), 22);
    }

    #[test]
    fn round_trip_over_whole_capacity_edges() {
        for count in [2usize, 5, 17, 1000] {
            let codec = ProvenanceCodec::for_objects(count).unwrap();
            let max_object = (codec.max_objects() - 1) as u32;
            let max_index = (codec.max_index() - 1) as u32;
            for object in [0, 1, max_object / 2, max_object] {
                for index in [0, 1, 2, max_index / 3, max_index - 1, max_index] {
                    let p = Provenance::new(object, index);
                    let packed = codec.encode(p).unwrap();
                    assert_eq!(codec.decode(packed), p, "count={count} {p:?}");
                }
            }
        }
    }

    #[test]
    fn encode_rejects_overflow_instead_of_wrapping() {
        let codec = ProvenanceCodec::for_objects(4).unwrap();
        assert_eq!(
            codec.encode(Provenance::new(4, 0)),
            Err(ProvenanceError::ObjectOutOfRange { object: 4, max: 4 })
        );
        assert_eq!(
            codec.encode(Provenance::new(0, 1 << 30)),
            Err(ProvenanceError::IndexOutOfRange {
                index: 1 << 30,
                max: 1 << 30
            })
        );
    }

    #[test]
    fn too_many_objects_is_rejected() {
        let result = ProvenanceCodec::for_objects(usize::MAX);
        assert!(matches!(result, Err(ProvenanceError::TooManyObjects { .. })));
    }
}
