//! JSON snapshots of the person and monarch collections.
//!
//! Expected layout:
//!   {data}/monarchs.json          — array of monarch records
//!   {data}/persons.json           — array of person records, or
//!   {data}/persons/**/*.json      — one record or an array per file
//!
//! Updated persons are written back to the file they were read from.

use std::fs;
use std::path::{Path, PathBuf};

use lineage_types::{Monarch, Person};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no persons.json or persons/ directory under {0}")]
    NoPersons(PathBuf),
    #[error("no record {external_id} at position {index}")]
    NoSuchRecord { index: usize, external_id: String },
}

/// Where the core's input comes from and where migrated records go.
pub trait LineageStore {
    fn persons(&self) -> Result<Vec<Person>, StoreError>;
    fn monarchs(&self) -> Result<Vec<Monarch>, StoreError>;
    /// Replace the record at `index` in `persons()` order. The stored
    /// record must carry the same external id; ids are not unique, so
    /// position is what identifies a record.
    fn update_person(&mut self, index: usize, person: &Person) -> Result<(), StoreError>;
    /// Persist pending updates.
    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ── JSON snapshot store ──────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum PersonFileContent {
    Many(Vec<Person>),
    One(Box<Person>),
}

struct PersonFile {
    path: PathBuf,
    persons: Vec<Person>,
    /// File held a bare object rather than an array.
    single: bool,
    dirty: bool,
}

pub struct JsonStore {
    files: Vec<PersonFile>,
    monarchs: Vec<Monarch>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let json = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(data).map_err(|source| StoreError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, &json).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = json.len(), "written");
    Ok(())
}

fn read_person_file(path: &Path) -> Result<PersonFile, StoreError> {
    let (persons, single) = match read_json::<PersonFileContent>(path)? {
        PersonFileContent::Many(persons) => (persons, false),
        PersonFileContent::One(person) => (vec![*person], true),
    };
    Ok(PersonFile {
        path: path.to_path_buf(),
        persons,
        single,
        dirty: false,
    })
}

/// All `*.json` files under `dir`, in file-name order.
fn scan_person_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                warn!(%err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect()
}

impl JsonStore {
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let monarchs: Vec<Monarch> = read_json(&data_dir.join("monarchs.json"))?;

        let single_file = data_dir.join("persons.json");
        let person_dir = data_dir.join("persons");
        let paths = if single_file.is_file() {
            vec![single_file]
        } else if person_dir.is_dir() {
            scan_person_files(&person_dir)
        } else {
            return Err(StoreError::NoPersons(data_dir.to_path_buf()));
        };

        let files = paths
            .iter()
            .map(|p| read_person_file(p))
            .collect::<Result<Vec<_>, _>>()?;

        let person_count: usize = files.iter().map(|f| f.persons.len()).sum();
        info!(
            persons = person_count,
            files = files.len(),
            monarchs = monarchs.len(),
            "loaded snapshot from {}",
            data_dir.display()
        );
        Ok(JsonStore { files, monarchs })
    }
}

impl LineageStore for JsonStore {
    fn persons(&self) -> Result<Vec<Person>, StoreError> {
        Ok(self
            .files
            .iter()
            .flat_map(|f| f.persons.iter().cloned())
            .collect())
    }

    fn monarchs(&self) -> Result<Vec<Monarch>, StoreError> {
        Ok(self.monarchs.clone())
    }

    fn update_person(&mut self, index: usize, person: &Person) -> Result<(), StoreError> {
        let mut offset = index;
        for file in &mut self.files {
            if offset >= file.persons.len() {
                offset -= file.persons.len();
                continue;
            }
            let slot = &mut file.persons[offset];
            if slot.external_id != person.external_id {
                break;
            }
            *slot = person.clone();
            file.dirty = true;
            return Ok(());
        }
        Err(StoreError::NoSuchRecord {
            index,
            external_id: person.external_id.clone(),
        })
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        for file in self.files.iter_mut().filter(|f| f.dirty) {
            match (file.single, file.persons.as_slice()) {
                (true, [person]) => write_json(&file.path, person)?,
                _ => write_json(&file.path, &file.persons)?,
            }
            file.dirty = false;
        }
        Ok(())
    }
}
