use crate::schema_reader::{
    ReaderError, SchemaDocument, SchemaDocumentStream, SchemaFormat, SchemaReader,
};
use futures::{StreamExt, stream};
use std::{
    collections::VecDeque,
    path::{Component, Path, PathBuf},
};
use tokio::fs;

const EXTENSIONS: [&str; 2] = ["yaml", "yml"];

///
/// FileSchemaReader
///
/// Walks a folder recursively, yielding every `*.yaml` / `*.yml` file. Each
/// document's source name is its path relative to the root, `/`-separated,
/// without extension. Entries are visited in sorted order; nothing is read
/// until the stream is polled.
///

#[derive(Clone, Debug)]
pub struct FileSchemaReader {
    root: PathBuf,
}

impl FileSchemaReader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SchemaReader for FileSchemaReader {
    fn read_schema(&self) -> SchemaDocumentStream<'_> {
        let walk = Walk {
            root: self.root.clone(),
            dirs: vec![self.root.clone()],
            files: VecDeque::new(),
        };

        stream::try_unfold(walk, |mut walk| async move {
            let document = walk.next_document().await?;
            Ok::<_, ReaderError>(document.map(|document| (document, walk)))
        })
        .boxed()
    }
}

// Depth-first walk state: directories still to list, files still to read.
struct Walk {
    root: PathBuf,
    dirs: Vec<PathBuf>,
    files: VecDeque<PathBuf>,
}

impl Walk {
    async fn next_document(&mut self) -> Result<Option<SchemaDocument>, ReaderError> {
        loop {
            if let Some(path) = self.files.pop_front() {
                return self.read(path).await.map(Some);
            }

            let Some(dir) = self.dirs.pop() else {
                return Ok(None);
            };
            self.list(&dir).await?;
        }
    }

    async fn list(&mut self, dir: &Path) -> Result<(), ReaderError> {
        let io = |source| ReaderError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut entries = fs::read_dir(dir).await.map_err(io)?;
        let mut dirs = Vec::new();
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(io)? {
            let path = entry.path();
            let metadata = fs::metadata(&path).await.map_err(io)?;

            if metadata.is_dir() {
                dirs.push(path);
            } else if metadata.is_file() && is_schema_file(&path) {
                files.push(path);
            }
        }

        dirs.sort();
        files.sort();

        // stack pops from the end, so push in reverse to visit in order
        self.dirs.extend(dirs.into_iter().rev());
        self.files.extend(files);

        Ok(())
    }

    async fn read(&self, path: PathBuf) -> Result<SchemaDocument, ReaderError> {
        let content = fs::read_to_string(&path)
            .await
            .map_err(|source| ReaderError::Io {
                path: path.clone(),
                source,
            })?;

        let format = path
            .extension()
            .map_or(SchemaFormat::Yaml, |ext| {
                SchemaFormat::from_extension(&ext.to_string_lossy())
            });

        Ok(SchemaDocument::new(
            source_name(&self.root, &path),
            format,
            content,
        ))
    }
}

fn is_schema_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

fn source_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path).with_extension("");

    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
