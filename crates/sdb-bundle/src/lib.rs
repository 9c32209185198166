//! sdb-bundle: from raw bundle bytes to a readable inner archive
//!
//! Pipeline (strictly linear, any failure aborts):
//! ```text
//! RawLoaded → Layer1Decrypted → OuterArchiveOpened → SignatureChecked
//!           → InnerStreamDecrypted → InnerArchiveOpened → Ready
//! ```
//! Only the `Ready` result ([`DecodedBundle`]) is ever handed out; bytes from
//! before the signature check stay inside [`BundleDecoder::decode`].

pub mod builder;
pub mod decoder;
pub mod raw;
pub mod source;

pub use builder::BundleBuilder;
pub use decoder::{BundleDecoder, DecodedBundle};
pub use raw::RawBundle;
pub use source::{BundleSource, FileSource, MemorySource};

/// Outer archive entry holding the RSA signature of `data`
pub const SIGN_ENTRY: &str = "sign";

/// Outer archive entry holding the counter-stream-encrypted inner archive
pub const DATA_ENTRY: &str = "data";
