//! On-disk form of a [`Corpus`]: the vector index and a parallel metadata file
//! whose `texts` line up with the index rows. Both files are rewritten whole on
//! every save; concurrent writers race and the last one wins. Both files carry
//! the corpus token, so a pair left behind by two different builds is refused
//! on load. A build that finds no places clears the files instead of leaving
//! an older route's index behind.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::StopWithPlaces,
    error::{storage_error, Error},
    index::{Corpus, EntryOrigin, FlatIndex},
};

pub const INDEX_FILE: &str = "restaurant_index.json";
pub const METADATA_FILE: &str = "restaurant_metadata.json";

#[derive(Serialize, Deserialize)]
struct IndexArtifact {
    token: Uuid,
    index: FlatIndex,
}

#[derive(Serialize, Deserialize)]
struct Metadata {
    token: Uuid,
    texts: Vec<String>,
    #[serde(default)]
    origins: Vec<EntryOrigin>,
    #[serde(default)]
    stops: Vec<StopWithPlaces>,
}

#[tracing::instrument(skip(corpus), fields(token = %corpus.token, rows = corpus.len()))]
pub fn save(corpus: &Corpus, dir: &Path) -> Result<(), Error> {
    fs::create_dir_all(dir)?;

    let artifact = IndexArtifact {
        token: corpus.token,
        index: corpus.index().clone(),
    };
    write_json(&dir.join(INDEX_FILE), &artifact)?;

    let metadata = Metadata {
        token: corpus.token,
        texts: corpus.texts().to_vec(),
        origins: corpus.origins().to_vec(),
        stops: corpus.stops().to_vec(),
    };
    write_json(&dir.join(METADATA_FILE), &metadata)?;

    tracing::info!("saved index to {}", dir.display());

    Ok(())
}

#[tracing::instrument]
pub fn load(dir: &Path) -> Result<Corpus, Error> {
    let artifact: IndexArtifact = read_json(&dir.join(INDEX_FILE))?;
    let metadata: Metadata = read_json(&dir.join(METADATA_FILE))?;

    if artifact.token != metadata.token {
        return Err(storage_error(format!(
            "{} and {} come from different builds ({} vs {})",
            INDEX_FILE, METADATA_FILE, artifact.token, metadata.token
        )));
    }

    Corpus::from_parts(
        artifact.token,
        metadata.texts,
        metadata.origins,
        artifact.index,
        metadata.stops,
    )
}

/// Removes a previously saved corpus, if any.
#[tracing::instrument]
pub fn clear(dir: &Path) -> Result<(), Error> {
    for name in [INDEX_FILE, METADATA_FILE] {
        match fs::remove_file(dir.join(name)) {
            Ok(()) => tracing::info!("removed {}", name),
            Err(err) if err.kind() == ErrorKind::NotFound => (),
            Err(err) => return Err(storage_error(err)),
        }
    }

    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;

    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, Error> {
    let file = File::open(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => storage_error(format!(
            "{} not found; build an index for a route first",
            path.display()
        )),
        _ => storage_error(err),
    })?;

    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[test]
fn saves_and_reloads() {
    use crate::index::fixtures;

    let dir = tempfile::tempdir().unwrap();
    let corpus = Corpus::from_embeddings(
        &fixtures::plan(),
        vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
    )
    .unwrap();

    save(&corpus, dir.path()).unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&fs::read(dir.path().join(METADATA_FILE)).unwrap()).unwrap();
    assert_eq!(raw["texts"].as_array().unwrap().len(), 3);

    let loaded = load(dir.path()).unwrap();
    assert_eq!(loaded.token, corpus.token);
    assert_eq!(loaded.texts(), corpus.texts());
    assert_eq!(loaded.index().len(), 3);
    assert_eq!(loaded.index().dimension(), 2);

    let suggestions = loaded.search(vec![0.0, 1.0], 1).unwrap();
    assert_eq!(suggestions.matches[0].name, "Taco Town");
}

#[test]
fn missing_index_is_reported() {
    let dir = tempfile::tempdir().unwrap();

    let err = load(dir.path()).unwrap_err();
    assert_eq!(err.code, crate::error::STORAGE);
    assert!(err.message.contains(INDEX_FILE));
}

#[test]
fn mismatched_metadata_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = Corpus::from_embeddings(
        &crate::index::fixtures::plan(),
        vec![vec![1.0], vec![1.0], vec![1.0]],
    )
    .unwrap();
    save(&corpus, dir.path()).unwrap();

    fs::write(
        dir.path().join(METADATA_FILE),
        format!(r#"{{"token": "{}", "texts": ["only one"]}}"#, corpus.token),
    )
    .unwrap();

    assert_eq!(load(dir.path()).unwrap_err().code, crate::error::STORAGE);
}

#[test]
fn files_from_different_builds_are_rejected() {
    use crate::index::fixtures;

    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let vectors = || vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];

    let older = Corpus::from_embeddings(&fixtures::plan(), vectors()).unwrap();
    let newer = Corpus::from_embeddings(&fixtures::plan(), vectors()).unwrap();
    save(&older, first.path()).unwrap();
    save(&newer, second.path()).unwrap();

    // same row count, metadata from the other build
    fs::copy(
        second.path().join(METADATA_FILE),
        first.path().join(METADATA_FILE),
    )
    .unwrap();

    let err = load(first.path()).unwrap_err();
    assert_eq!(err.code, crate::error::STORAGE);
    assert!(err.message.contains("different builds"));
}

#[test]
fn clear_removes_saved_corpus() {
    let dir = tempfile::tempdir().unwrap();
    clear(dir.path()).unwrap();

    let corpus = Corpus::from_embeddings(
        &crate::index::fixtures::plan(),
        vec![vec![1.0], vec![1.0], vec![1.0]],
    )
    .unwrap();
    save(&corpus, dir.path()).unwrap();
    clear(dir.path()).unwrap();

    assert!(!dir.path().join(INDEX_FILE).exists());
    assert!(!dir.path().join(METADATA_FILE).exists());
    assert_eq!(load(dir.path()).unwrap_err().code, crate::error::STORAGE);
}
