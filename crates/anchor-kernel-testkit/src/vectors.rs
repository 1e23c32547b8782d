//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the canonical encoding byte for byte. Any
//! implementation that anchors records alongside this one must reproduce
//! them exactly.

use serde_json::{json, Value as Json};

use anchor_kernel_core::canonicalize;

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Input record.
    pub record: Json,
    /// Expected canonical bytes (hex).
    pub expected_canonical: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "keys sorted regardless of input order",
            record: json!({"b": 1, "a": 2}),
            expected_canonical: "a2616102616201",
        },
        GoldenVector {
            name: "shorter key first",
            record: json!({"aa": 1, "b": 2}),
            expected_canonical: "a261620262616101",
        },
        GoldenVector {
            name: "top-level $id is stripped",
            record: json!({"$id": "entry:anchor:xyz", "k": true}),
            expected_canonical: "a1616bf5",
        },
        GoldenVector {
            name: "negative integer",
            record: json!({"n": -1}),
            expected_canonical: "a1616e20",
        },
        GoldenVector {
            name: "text value",
            record: json!({"s": "hi"}),
            expected_canonical: "a16173626869",
        },
        GoldenVector {
            name: "floats are binary64",
            record: json!({"f": 1.5}),
            expected_canonical: "a16166fb3ff8000000000000",
        },
        GoldenVector {
            name: "array with null",
            record: json!({"l": [1, null]}),
            expected_canonical: "a1616c8201f6",
        },
        GoldenVector {
            name: "empty record",
            record: json!({}),
            expected_canonical: "a0",
        },
    ]
}

/// Check every vector, returning the name of the first that fails.
pub fn verify_all_vectors() -> Result<(), String> {
    for vector in all_vectors() {
        let canonical = canonicalize(&vector.record)
            .map_err(|e| format!("{}: {e}", vector.name))?;
        let actual = hex::encode(canonical.as_slice());
        if actual != vector.expected_canonical {
            return Err(format!(
                "{}: expected {}, got {actual}",
                vector.name, vector.expected_canonical
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golden_vectors() {
        verify_all_vectors().unwrap();
    }
}
