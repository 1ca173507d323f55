//! Object-key handling for bucketgate
//!
//! Every client-supplied name goes through [`sanitize`] before it is used as
//! a storage key. The sanitizer is a pure function: no clock, no I/O, no
//! shared state, so it is safe to call from any number of request tasks.
//!
//! ```
//! use bucketgate_keys::{ObjectKey, SanitizePolicy, sanitize};
//!
//! let name = sanitize("my photo (1).JPG", &SanitizePolicy::file_name())?;
//! let folder = sanitize("albums/2024", &SanitizePolicy::folder())?;
//! let key = ObjectKey::compose(Some(&folder), &name);
//! assert_eq!(key.as_str(), "albums/2024/my_photo_(1).JPG");
//! # Ok::<(), bucketgate_keys::KeyError>(())
//! ```

pub mod error;
pub mod key;
pub mod public_url;
pub mod sanitizer;

pub use error::{KeyError, KeyResult};
pub use key::{ObjectKey, fallback_name};
pub use public_url::PublicUrlBuilder;
pub use sanitizer::{
    DEFAULT_MAX_KEY_LENGTH, REPLACEMENT_CHAR, SanitizePolicy, SanitizedKey, sanitize,
    sanitize_with,
};
