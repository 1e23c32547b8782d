//! # Anchor Kernel Testkit
//!
//! Testing utilities for the Anchor Kernel.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Canonical encodings with known bytes, for checking
//!   other implementations against this one
//! - **Generators**: Proptest strategies for records, key permutations and
//!   permission masks
//! - **Fixtures**: Several parties sharing one in-memory ledger, plus a
//!   namespace/registry bootstrap
//!
//! ## Golden Vectors
//!
//! ```rust
//! use anchor_kernel_testkit::vectors::verify_all_vectors;
//!
//! verify_all_vectors().unwrap();
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use anchor_kernel_core::canonicalize;
//! use anchor_kernel_testkit::generators::record_with_permutation;
//!
//! proptest! {
//!     #[test]
//!     fn key_order_is_irrelevant((record, permuted) in record_with_permutation()) {
//!         prop_assert_eq!(canonicalize(&record).unwrap(), canonicalize(&permuted).unwrap());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use anchor_kernel_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let alice = fixture.party(1);
//! let setup = fixture.bootstrap(&alice).await?;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{init_tracing, Bootstrap, TestFixture};
pub use generators::{json_record, permissions, permute_keys, record_with_permutation};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
