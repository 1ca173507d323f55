pub mod backend;
pub mod mock;
pub mod traits;

pub use self::backend::ObjectStoreBackend;
pub use self::mock::MockStorage;
pub use self::traits::{
    DEFAULT_CONTENT_TYPE, ObjectBody, ObjectStorage, StoredObject, guess_content_type,
};
