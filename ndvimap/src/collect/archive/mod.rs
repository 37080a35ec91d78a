pub mod http_archive;
pub mod memory;
pub mod query;
pub mod scene;

pub use http_archive::HttpArchive;
pub use memory::InMemoryArchive;
pub use query::{BandTransform, DateRange, SceneQuery};
pub use scene::{Band, Scene, SceneCollection};

use crate::error::ArchiveError;

/// Session with a remote imagery archive.
///
/// `execute` is one blocking round-trip: the archive applies the spatial and
/// temporal filters and the transform list of `query`, and returns the
/// matching scenes. Implementations do not retry.
pub trait ArchiveClient {
    fn execute(&self, query: &SceneQuery) -> Result<SceneCollection, ArchiveError>;
}

impl<T: ArchiveClient + ?Sized> ArchiveClient for &T {
    fn execute(&self, query: &SceneQuery) -> Result<SceneCollection, ArchiveError> {
        (**self).execute(query)
    }
}

impl<T: ArchiveClient + ?Sized> ArchiveClient for Box<T> {
    fn execute(&self, query: &SceneQuery) -> Result<SceneCollection, ArchiveError> {
        (**self).execute(query)
    }
}
