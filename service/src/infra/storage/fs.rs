//! Filesystem [`ObjectStore`] implementation.

use std::path::PathBuf;

use common::operations::Insert;
use tokio::fs;
use tracerr::Traced;

use crate::{
    domain::{object, Object},
    infra::storage::{Error, ObjectStore},
};

/// [`Fs`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory to store [`Object`]s in.
    pub root: PathBuf,

    /// Public URL the `root` directory is served at.
    pub public_url: String,
}

/// [`ObjectStore`] keeping [`Object`]s as files in a local directory.
#[derive(Clone, Debug)]
pub struct Fs {
    /// [`Config`] of this [`ObjectStore`].
    config: Config,
}

impl Fs {
    /// Creates a new [`Fs`] [`ObjectStore`] with the provided [`Config`].
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Returns the path of the file storing an [`Object`] under the provided
    /// [`object::Key`].
    fn path(&self, key: &object::Key) -> PathBuf {
        key.segments()
            .fold(self.config.root.clone(), |path, s| path.join(s))
    }
}

impl ObjectStore<Insert<Object>> for Fs {
    type Ok = object::Url;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Insert(object): Insert<Object>,
    ) -> Result<Self::Ok, Self::Err> {
        let path = self.path(&object.key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(tracerr::from_and_wrap!(=> Error))?;
        }

        // Readers never observe a partially written file.
        let tmp = path.with_extension("part");
        fs::write(&tmp, &object.content)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        Ok(object::Url::new(format!(
            "{}/{}",
            self.config.public_url.trim_end_matches('/'),
            object.key,
        )))
    }
}
