use crate::error::StructuralError;
use crate::roundtrip::RoundtripRecord;
use crate::sidecar::MappingFile;
use relative_path::RelativePath;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid mapping file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid record file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Structural(#[from] StructuralError),
}

pub const ORIGINAL_FILE: &str = "original.mdx";
pub const IMPROVED_FILE: &str = "improved.mdx";
pub const PAGE_FILE: &str = "page.xhtml";
pub const MAPPING_FILE: &str = "mapping.yaml";
pub const EXPECTED_FILE: &str = "expected.xhtml";
pub const EXPECTED_RECORD_FILE: &str = "expected.roundtrip.json";

/// Read a file below `root`
pub fn read_file(relative_path: &RelativePath, root: &Path) -> Result<String, IoError> {
    read_path(&relative_path.to_path(root))
}

/// Read a file, reporting a missing one as [`IoError::NotFound`]
pub fn read_path(path: &Path) -> Result<String, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(IoError::Io)
}

fn read_optional(relative_path: &RelativePath, root: &Path) -> Result<Option<String>, IoError> {
    match read_file(relative_path, root) {
        Ok(text) => Ok(Some(text)),
        Err(IoError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write a file below `root`
pub fn write_file(relative_path: &RelativePath, root: &Path, content: &str) -> Result<(), IoError> {
    write_path(&relative_path.to_path(root), content)
}

/// Write a file, creating parent directories if they don't exist
pub fn write_path(path: &Path, content: &str) -> Result<(), IoError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }
    fs::write(path, content).map_err(IoError::Io)
}

pub fn load_mapping(path: &Path) -> Result<MappingFile, IoError> {
    Ok(MappingFile::from_yaml(&read_path(path)?)?)
}

pub fn save_mapping(path: &Path, mapping: &MappingFile) -> Result<(), IoError> {
    write_path(path, &mapping.to_yaml()?)
}

/// Load a round-trip record, rejecting other schema versions
pub fn load_record(path: &Path) -> Result<RoundtripRecord, IoError> {
    let record: RoundtripRecord = serde_json::from_str(&read_path(path)?)?;
    record.check_schema()?;
    Ok(record)
}

pub fn save_record(path: &Path, record: &RoundtripRecord) -> Result<(), IoError> {
    write_path(path, &record.to_json()?)
}

/// The files of one verification case.
#[derive(Debug, Clone)]
pub struct CaseFiles {
    pub dir: PathBuf,
    pub original: String,
    pub improved: String,
    pub page: String,
    pub mapping: Option<MappingFile>,
    pub expected: Option<String>,
    pub expected_record: Option<RoundtripRecord>,
}

impl CaseFiles {
    /// Directory name, used as the case id
    pub fn name(&self) -> String {
        case_name(&self.dir)
    }
}

pub fn case_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

/// Load a case directory. The three input files are required, the rest optional
pub fn load_case(dir: &Path) -> Result<CaseFiles, IoError> {
    let original = read_file(RelativePath::new(ORIGINAL_FILE), dir)?;
    let improved = read_file(RelativePath::new(IMPROVED_FILE), dir)?;
    let page = read_file(RelativePath::new(PAGE_FILE), dir)?;

    let mapping = read_optional(RelativePath::new(MAPPING_FILE), dir)?
        .map(|text| MappingFile::from_yaml(&text))
        .transpose()?;
    let expected = read_optional(RelativePath::new(EXPECTED_FILE), dir)?;
    let expected_record = match read_optional(RelativePath::new(EXPECTED_RECORD_FILE), dir)? {
        Some(text) => {
            let record: RoundtripRecord = serde_json::from_str(&text)?;
            record.check_schema()?;
            Some(record)
        }
        None => None,
    };

    Ok(CaseFiles {
        dir: dir.to_path_buf(),
        original,
        improved,
        page,
        mapping,
        expected,
        expected_record,
    })
}

/// Whether `dir` holds the required case inputs
pub fn is_case_dir(dir: &Path) -> bool {
    [ORIGINAL_FILE, IMPROVED_FILE, PAGE_FILE]
        .iter()
        .all(|f| dir.join(f).is_file())
}

/// Scan for case directories below `root`, sorted by path
pub fn scan_case_dirs(root: &Path) -> Result<Vec<PathBuf>, IoError> {
    if !root.is_dir() {
        return Err(IoError::NotFound(root.to_path_buf()));
    }

    let mut dirs = Vec::new();
    scan_directory_recursive(root, &mut dirs)?;
    dirs.sort();
    Ok(dirs)
}

fn scan_directory_recursive(dir: &Path, dirs: &mut Vec<PathBuf>) -> Result<(), IoError> {
    if is_case_dir(dir) {
        dirs.push(dir.to_path_buf());
        return Ok(());
    }

    for entry in fs::read_dir(dir).map_err(IoError::Io)? {
        let path = entry.map_err(IoError::Io)?.path();
        if path.is_dir() {
            scan_directory_recursive(&path, dirs)?;
        }
    }

    Ok(())
}
