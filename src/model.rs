//! The trained model module
//! Builds the TF-IDF index from the dataset and caches it on disk

use crate::dataset::{load_dataset, DatasetRow};
use crate::error::{Error, Result};
use crate::index::{IdfWeighting, VectorIndex};
use crate::text::normalize;
use bincode::Options;
use serde::{Serialize, Deserialize};
use sha2::{Digest, Sha256};
use std::{
    fs::File,
    io::{
        BufReader,
        BufWriter,
    },
    path::{Path, PathBuf},
};

/// Bumped whenever the artifact layout or normalization changes.
pub const FORMAT_VERSION: u32 = 1;

/// Upper bound on artifact size, so a corrupt length prefix cannot trigger a
/// huge allocation.
const MAX_ARTIFACT_BYTES: u64 = 512 * 1024 * 1024;

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_ARTIFACT_BYTES)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrainedModel {
    format_version: u32,
    dataset_digest: String,
    index: VectorIndex,
}

impl TrainedModel {
    /// Fits the index on the normalized problem texts of `rows`.
    ///
    /// `dataset_digest` identifies the dataset the model was trained from and is
    /// compared on the next start to detect a stale artifact.
    pub fn train(rows: &[DatasetRow], weighting: IdfWeighting, dataset_digest: String) -> TrainedModel {
        let corpus: Vec<String> = rows.iter()
            .map(|row| normalize(&row.problem))
            .collect();

        TrainedModel {
            format_version: FORMAT_VERSION,
            dataset_digest,
            index: VectorIndex::build(&corpus, weighting),
        }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn dataset_digest(&self) -> &str {
        &self.dataset_digest
    }

    /// True when the artifact was produced from the given dataset digest with
    /// the given weighting by this version of the code.
    pub fn is_fresh(&self, dataset_digest: &str, weighting: IdfWeighting) -> bool {
        self.format_version == FORMAT_VERSION
            && self.dataset_digest == dataset_digest
            && self.index.weighting() == weighting
    }

    /// Saves the model to a file using bincode serialization.
    ///
    /// The artifact is written to a sibling `.tmp` file, synced, and renamed
    /// over `path`, so a failed save leaves any previous artifact in place.
    /// Parent directories are created when missing.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = temp_path(path)?;
        let saved = self.write_to(&tmp_path).and_then(|()| {
            std::fs::rename(&tmp_path, path).map_err(|e| Error::Model {
                reason: format!("Fail to replace '{}': {}", path.display(), e),
            })
        });

        if saved.is_err() {
            let _ = std::fs::remove_file(&tmp_path);
        }
        saved
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::Model {
            reason: format!("Fail to create file for saving '{}': {}", path.display(), e),
        })?;

        let mut writer = BufWriter::new(file);
        codec().serialize_into(&mut writer, self)?;

        // into_inner flushes and reports the error a drop would swallow
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;

        Ok(())
    }

    /// Loads a model previously saved with [`save`](TrainedModel::save).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::Model {
            reason: format!("Fail to open '{}': {}", path.display(), e),
        })?;

        let reader = BufReader::new(file);
        let model: TrainedModel = codec().deserialize_from(reader).map_err(|e| Error::Model {
            reason: format!("Deserialization of '{}' failed: {}", path.display(), e),
        })?;

        Ok(model)
    }
}

/// `model.bin` becomes `model.bin.tmp` in the same directory.
fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| Error::Model {
        reason: format!("'{}' is not a file path", path.display()),
    })?;

    let mut tmp_name = name.to_os_string();
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

/// Hex SHA-256 of the dataset file contents.
pub fn dataset_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Loads the dataset and a model that matches it.
///
/// The cached artifact at `model_path` is reused when it was trained from the
/// same dataset bytes with the same weighting. Otherwise, or when it does not
/// exist, the model is retrained and written back before returning. An
/// artifact that exists but cannot be read is an error.
pub fn load_or_train(
    dataset_path: &Path,
    model_path: &Path,
    weighting: IdfWeighting,
) -> Result<(Vec<DatasetRow>, TrainedModel)> {
    let (rows, bytes) = load_dataset(dataset_path)?;
    let digest = dataset_digest(&bytes);

    if model_path.exists() {
        let cached = TrainedModel::load(model_path)?;
        if cached.is_fresh(&digest, weighting) && cached.index.len() == rows.len() {
            tracing::info!(path = %model_path.display(), "using cached model");
            return Ok((rows, cached));
        }
        tracing::info!(path = %model_path.display(), "cached model is stale, retraining");
    } else {
        tracing::info!(path = %model_path.display(), "no cached model, training");
    }

    let model = TrainedModel::train(&rows, weighting, digest);
    model.save(model_path)?;

    Ok((rows, model))
}

/// Retrains unconditionally and overwrites the artifact.
pub fn retrain(
    dataset_path: &Path,
    model_path: &Path,
    weighting: IdfWeighting,
) -> Result<(Vec<DatasetRow>, TrainedModel)> {
    let (rows, bytes) = load_dataset(dataset_path)?;
    let digest = dataset_digest(&bytes);

    let model = TrainedModel::train(&rows, weighting, digest);
    model.save(model_path)?;
    tracing::info!(
        path = %model_path.display(),
        documents = model.index.len(),
        vocabulary = model.index.vocabulary().len(),
        "model trained and saved"
    );

    Ok((rows, model))
}

#[cfg(test)]
mod model_test {
    use super::*;
    use std::path::PathBuf;

    const CSV: &str = "problem,solution\n\
        printer not printing,Check printer cable and driver installation\n\
        wifi keeps disconnecting,Update the wireless adapter driver\n\
        laptop overheating,Clean the fans and use a cooling pad\n";

    fn write_dataset(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("data.csv");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_train_builds_one_vector_per_row() {
        let rows = crate::dataset::parse_dataset(CSV.as_bytes()).unwrap();
        let model = TrainedModel::train(&rows, IdfWeighting::Standard, "abc".to_string());

        assert_eq!(model.index().len(), 3);
        assert!(model.index().vocabulary().dimension("printer").is_some());
        // stopwords never reach the vocabulary
        assert!(model.index().vocabulary().dimension("not").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");

        let rows = crate::dataset::parse_dataset(CSV.as_bytes()).unwrap();
        let model = TrainedModel::train(&rows, IdfWeighting::Smooth, "digest".to_string());
        model.save(&path).unwrap();

        let loaded = TrainedModel::load(&path).unwrap();
        assert_eq!(loaded.index(), model.index());
        assert_eq!(loaded.dataset_digest(), "digest");
        assert!(loaded.is_fresh("digest", IdfWeighting::Smooth));
        assert!(!loaded.is_fresh("digest", IdfWeighting::Standard));
        assert!(!loaded.is_fresh("other", IdfWeighting::Smooth));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.bin");

        let rows = crate::dataset::parse_dataset(CSV.as_bytes()).unwrap();
        TrainedModel::train(&rows, IdfWeighting::Standard, String::new()).save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");

        let rows = crate::dataset::parse_dataset(CSV.as_bytes()).unwrap();
        let model = TrainedModel::train(&rows, IdfWeighting::Standard, String::new());
        model.save(&path).unwrap();
        // overwriting goes through the same temp file
        model.save(&path).unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path()).unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("model.bin")]);
    }

    #[test]
    fn test_failed_save_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory cannot be replaced by a file
        let path = dir.path().join("model.bin");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let rows = crate::dataset::parse_dataset(CSV.as_bytes()).unwrap();
        let model = TrainedModel::train(&rows, IdfWeighting::Standard, String::new());

        assert!(model.save(&path).is_err());
        assert!(path.join("keep").exists());
        assert!(!dir.path().join("model.bin.tmp").exists());
    }

    #[test]
    fn test_failed_save_keeps_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");

        let rows = crate::dataset::parse_dataset(CSV.as_bytes()).unwrap();
        let model = TrainedModel::train(&rows, IdfWeighting::Standard, "first".to_string());
        model.save(&path).unwrap();
        let before = std::fs::read(&path).unwrap();

        // block the temp file so the next write cannot start
        std::fs::create_dir(dir.path().join("model.bin.tmp")).unwrap();
        let retrained = TrainedModel::train(&rows, IdfWeighting::Smooth, "second".to_string());
        assert!(retrained.save(&path).is_err());

        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert_eq!(TrainedModel::load(&path).unwrap().dataset_digest(), "first");
    }

    #[test]
    fn test_load_nonexistent_file() {
        match TrainedModel::load("nonexistent_model.bin") {
            Err(Error::Model { reason }) => assert!(reason.contains("nonexistent_model.bin")),
            other => panic!("Expected model error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        std::fs::write(&path, b"definitely not bincode").unwrap();

        assert!(TrainedModel::load(&path).is_err());
    }

    #[test]
    fn test_digest_is_stable() {
        let a = dataset_digest(b"problem,solution\n");
        assert_eq!(a, dataset_digest(b"problem,solution\n"));
        assert_ne!(a, dataset_digest(b"problem,solution\nx,y\n"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_load_or_train_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path(), CSV);
        let model_path = dir.path().join("model.bin");

        let (rows, model) = load_or_train(&dataset, &model_path, IdfWeighting::Standard).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(model.dataset_digest(), dataset_digest(CSV.as_bytes()));
        assert!(model_path.exists());
    }

    #[test]
    fn test_load_or_train_reuses_fresh_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path(), CSV);
        let model_path = dir.path().join("model.bin");

        load_or_train(&dataset, &model_path, IdfWeighting::Standard).unwrap();
        let first = std::fs::read(&model_path).unwrap();
        let (_, model) = load_or_train(&dataset, &model_path, IdfWeighting::Standard).unwrap();

        assert_eq!(std::fs::read(&model_path).unwrap(), first);
        assert_eq!(model.index().len(), 3);
    }

    #[test]
    fn test_load_or_train_rebuilds_when_dataset_changes() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path(), CSV);
        let model_path = dir.path().join("model.bin");
        load_or_train(&dataset, &model_path, IdfWeighting::Standard).unwrap();

        let extended = format!("{}no sound from speakers,Check the audio output device\n", CSV);
        write_dataset(dir.path(), &extended);

        let (rows, model) = load_or_train(&dataset, &model_path, IdfWeighting::Standard).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(model.index().len(), 4);
        assert!(TrainedModel::load(&model_path).unwrap().is_fresh(
            &dataset_digest(extended.as_bytes()),
            IdfWeighting::Standard,
        ));
    }

    #[test]
    fn test_load_or_train_rebuilds_when_weighting_changes() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path(), CSV);
        let model_path = dir.path().join("model.bin");

        load_or_train(&dataset, &model_path, IdfWeighting::Standard).unwrap();
        let (_, model) = load_or_train(&dataset, &model_path, IdfWeighting::Smooth).unwrap();
        assert_eq!(model.index().weighting(), IdfWeighting::Smooth);
    }

    #[test]
    fn test_load_or_train_corrupt_artifact_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path(), CSV);
        let model_path = dir.path().join("model.bin");
        std::fs::write(&model_path, b"garbage").unwrap();

        assert!(load_or_train(&dataset, &model_path, IdfWeighting::Standard).is_err());
    }

    #[test]
    fn test_load_or_train_bad_dataset_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path(), "question,answer\na,b\n");
        let model_path = dir.path().join("model.bin");

        assert!(load_or_train(&dataset, &model_path, IdfWeighting::Standard).is_err());
        assert!(!model_path.exists());
    }
}
