use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// A named molecular model, e.g. `Xu01-1a-2a-major`.
///
/// The name is the identity of the structure and the stem of every file the
/// pipeline produces for it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Structure {
    name: String,
}

impl Structure {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name with its last `suffix_len` characters removed.
    ///
    /// Used to match a major model with its minor counterpart
    /// (`Xu01-1a-2a-major` and `Xu01-1a-2a-minor` share `Xu01-1a-2a`).
    pub fn base_name(&self, suffix_len: usize) -> &str {
        let char_count = self.name.chars().count();
        if suffix_len >= char_count {
            return "";
        }
        let cut = self
            .name
            .char_indices()
            .nth(char_count - suffix_len)
            .map_or(self.name.len(), |(i, _)| i);
        &self.name[..cut]
    }

    /// File name of a stage artifact: `<name>-<suffix><tail>`.
    pub fn artifact_name(&self, suffix: &str, tail: &str) -> String {
        format!("{}-{}{}", self.name, suffix, tail)
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The canonical, alphabetically ordered set of structures in a database.
///
/// Iteration order of this set is the row order of every descriptor column, so
/// it must never be reordered after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureSet {
    structures: Vec<Structure>,
}

impl StructureSet {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut structures: Vec<Structure> = names.into_iter().map(Structure::new).collect();
        structures.sort();
        structures.dedup();
        Self { structures }
    }

    /// Enumerates the structures of a raw-model directory.
    ///
    /// Every regular file contributes the part of its file name before the first
    /// `.`; hidden files and subdirectories are ignored.
    pub fn discover(raw_model_dir: &Path) -> io::Result<Self> {
        let mut names = Vec::new();
        for entry in fs::read_dir(raw_model_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let stem = file_name.split('.').next().unwrap_or("");
            if !stem.is_empty() {
                names.push(stem.to_string());
            }
        }
        Ok(Self::from_names(names))
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Structure> {
        self.structures.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Structure> {
        self.structures.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.structures.iter().map(|s| s.name.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a StructureSet {
    type Item = &'a Structure;
    type IntoIter = std::slice::Iter<'a, Structure>;

    fn into_iter(self) -> Self::IntoIter {
        self.structures.iter()
    }
}
