//! Directory-backed store in a zarr-v2 compatible layout.
//!
//! Each group is a directory holding `.zgroup` and, when non-empty,
//! `.zattrs`. Each array is a directory holding `.zarray` and a single
//! chunk spanning the whole array, optionally zstd-compressed. Arrays with
//! no elements have no chunk file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::codec::primitives::{decode_array_data, encode_array_data, utf32_width};
use crate::error::StoreError;
use crate::model::{ArrayData, DType, NdArray};
use crate::store::path::{expand_tilde, is_remote_url};
use crate::store::{Group, Member};

const ZGROUP: &str = ".zgroup";
const ZATTRS: &str = ".zattrs";
const ZARRAY: &str = ".zarray";
const ZARR_FORMAT: u8 = 2;

/// Options controlling how a store is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// zstd level for chunk payloads; `None` stores chunks uncompressed.
    pub compression_level: Option<i32>,
    /// Replace an existing store at the target path.
    pub overwrite: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            compression_level: Some(3),
            overwrite: false,
        }
    }
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uncompressed() -> Self {
        Self {
            compression_level: None,
            ..Self::default()
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GroupMetadata {
    zarr_format: u8,
}

#[derive(Debug, Serialize, Deserialize)]
struct Compressor {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    level: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArrayMetadata {
    zarr_format: u8,
    shape: Vec<usize>,
    chunks: Vec<usize>,
    dtype: String,
    compressor: Option<Compressor>,
    fill_value: Value,
    order: String,
    #[serde(default)]
    filters: Option<Vec<Value>>,
}

fn io_error(path: &Path, err: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, StoreError> {
    let text = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    serde_json::from_str(&text).map_err(|e| StoreError::MalformedMetadata {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| StoreError::MalformedMetadata {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    fs::write(path, text).map_err(|e| io_error(path, e))
}

// =============================================================================
// DTYPE STRINGS
// =============================================================================

fn typestr(dtype: DType, str_width: usize) -> String {
    match dtype {
        DType::Bool => "|b1".to_string(),
        DType::Int8 => "|i1".to_string(),
        DType::Int16 => "<i2".to_string(),
        DType::Int32 => "<i4".to_string(),
        DType::Int64 => "<i8".to_string(),
        DType::UInt8 => "|u1".to_string(),
        DType::UInt16 => "<u2".to_string(),
        DType::UInt32 => "<u4".to_string(),
        DType::UInt64 => "<u8".to_string(),
        DType::Float32 => "<f4".to_string(),
        DType::Float64 => "<f8".to_string(),
        DType::Bytes => "|S1".to_string(),
        DType::Str => format!("<U{str_width}"),
    }
}

/// Parses a stored typestr into a dtype and, for strings, the width.
fn parse_typestr(s: &str, path: &Path) -> Result<(DType, usize), StoreError> {
    let unsupported = || StoreError::UnsupportedDtype {
        path: path.display().to_string(),
        dtype: s.to_string(),
    };
    let dtype = DType::parse(s).ok_or_else(unsupported)?;
    let multi_byte = dtype.item_size().is_none_or(|size| size > 1);
    if s.starts_with('>') && multi_byte {
        return Err(unsupported());
    }
    let width = s.trim_start_matches(['<', '>', '|', '=']).get(1..).unwrap_or("");
    match dtype {
        DType::Str => width.parse::<usize>().map(|w| (dtype, w)).map_err(|_| unsupported()),
        DType::Bytes if width != "1" => Err(unsupported()),
        _ => Ok((dtype, 0)),
    }
}

fn fill_value(dtype: DType) -> Value {
    match dtype {
        DType::Bool => Value::Bool(false),
        DType::Float32 | DType::Float64 => Value::from(0.0),
        DType::Str | DType::Bytes => Value::from(""),
        _ => Value::from(0),
    }
}

fn chunk_key(ndim: usize) -> String {
    if ndim == 0 {
        return "0".to_string();
    }
    vec!["0"; ndim].join(".")
}

// =============================================================================
// READING
// =============================================================================

/// Opens a store location: a local path (with `~` expansion) or a URL.
///
/// Remote URLs skip the existence check and fail to open, since this
/// crate performs no network access.
pub fn open_storelike(store: &str) -> Result<Group, StoreError> {
    if is_remote_url(store) {
        return Err(StoreError::InvalidStore {
            reason: format!("remote store {store} cannot be opened without network support"),
        });
    }
    let path = expand_tilde(store);
    if !path.exists() {
        return Err(StoreError::NotFound {
            path: store.to_string(),
        });
    }
    read_group(&path)
}

/// Reads the group tree rooted at `path`.
pub fn read_group(path: &Path) -> Result<Group, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound {
            path: path.display().to_string(),
        });
    }
    if !path.join(ZGROUP).is_file() {
        return Err(StoreError::InvalidStore {
            reason: format!("{} is not a zarr group", path.display()),
        });
    }
    read_group_dir(path)
}

fn read_group_dir(path: &Path) -> Result<Group, StoreError> {
    let mut group = Group::new();
    let attrs_path = path.join(ZATTRS);
    if attrs_path.is_file() {
        *group.attrs_mut() = read_json::<Map<String, Value>>(&attrs_path)?;
    }

    let mut entries = fs::read_dir(path)
        .map_err(|e| io_error(path, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| io_error(path, e))?;
    entries.sort();

    for child in entries.iter().filter(|p| p.is_dir()) {
        let Some(name) = child.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let member = if child.join(ZGROUP).is_file() {
            Member::Group(read_group_dir(child)?)
        } else if child.join(ZARRAY).is_file() {
            Member::Array(read_array(child)?)
        } else {
            debug!(path = %child.display(), "skipping directory without zarr metadata");
            continue;
        };
        match member {
            Member::Group(g) => group.insert_group(name, g)?,
            Member::Array(a) => group.create_array(name, a)?,
        }
    }
    Ok(group)
}

fn read_array(path: &Path) -> Result<NdArray, StoreError> {
    let meta_path = path.join(ZARRAY);
    let meta: ArrayMetadata = read_json(&meta_path)?;
    let (dtype, str_width) = parse_typestr(&meta.dtype, &meta_path)?;
    if meta.order != "C" {
        return Err(StoreError::InvalidStore {
            reason: format!("{}: only C order is supported", meta_path.display()),
        });
    }
    let single_chunk = meta.chunks.len() == meta.shape.len()
        && meta.chunks.iter().zip(&meta.shape).all(|(&c, &s)| c >= s);
    if !single_chunk {
        return Err(StoreError::InvalidStore {
            reason: format!("{}: multi-chunk arrays are not supported", meta_path.display()),
        });
    }

    let count = meta
        .shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| StoreError::InvalidStore {
            reason: format!("{}: shape {:?} overflows", meta_path.display(), meta.shape),
        })?;
    let chunk_path = path.join(chunk_key(meta.shape.len()));
    if count == 0 || !chunk_path.is_file() {
        return Ok(NdArray::zeros(dtype, meta.shape));
    }

    let raw = fs::read(&chunk_path).map_err(|e| io_error(&chunk_path, e))?;
    let bytes = match &meta.compressor {
        None => raw,
        Some(c) if c.id == "zstd" => zstd::decode_all(raw.as_slice())
            .map_err(|e| StoreError::DecompressionFailed(e.to_string()))?,
        Some(c) => {
            return Err(StoreError::UnsupportedCompressor {
                path: meta_path.display().to_string(),
                id: c.id.clone(),
            });
        }
    };

    let data = decode_array_data(&bytes, dtype, count, str_width).map_err(|e| match e {
        StoreError::ChunkSize {
            expected, actual, ..
        } => StoreError::ChunkSize {
            path: chunk_path.display().to_string(),
            expected,
            actual,
        },
        other => other,
    })?;
    debug!(path = %path.display(), dtype = %dtype, shape = ?meta.shape, "read array");
    NdArray::new(meta.shape, data).map_err(|e| StoreError::InvalidStore {
        reason: e.to_string(),
    })
}

// =============================================================================
// WRITING
// =============================================================================

/// Writes the group tree to a directory at `path`.
pub fn write_group(path: &Path, group: &Group, options: &StoreOptions) -> Result<(), StoreError> {
    if path.exists() {
        let occupied = fs::read_dir(path)
            .map_err(|e| io_error(path, e))?
            .next()
            .is_some();
        if occupied && !options.overwrite {
            return Err(StoreError::InvalidStore {
                reason: format!("{} already exists; pass overwrite to replace it", path.display()),
            });
        }
        if occupied {
            fs::remove_dir_all(path).map_err(|e| io_error(path, e))?;
        }
    }
    write_group_dir(path, group, options)
}

fn write_group_dir(path: &Path, group: &Group, options: &StoreOptions) -> Result<(), StoreError> {
    fs::create_dir_all(path).map_err(|e| io_error(path, e))?;
    write_json(
        &path.join(ZGROUP),
        &GroupMetadata {
            zarr_format: ZARR_FORMAT,
        },
    )?;
    if !group.attrs().is_empty() {
        write_json(&path.join(ZATTRS), group.attrs())?;
    }
    for (name, member) in group.members() {
        let child = path.join(name);
        match member {
            Member::Group(g) => write_group_dir(&child, g, options)?,
            Member::Array(a) => write_array(&child, a, options)?,
        }
    }
    Ok(())
}

fn write_array(path: &Path, array: &NdArray, options: &StoreOptions) -> Result<(), StoreError> {
    fs::create_dir_all(path).map_err(|e| io_error(path, e))?;
    let str_width = match array.data() {
        ArrayData::Str(values) => utf32_width(values),
        _ => 0,
    };
    let meta = ArrayMetadata {
        zarr_format: ZARR_FORMAT,
        shape: array.shape().to_vec(),
        chunks: array.shape().iter().map(|&s| s.max(1)).collect(),
        dtype: typestr(array.dtype(), str_width),
        compressor: options.compression_level.map(|level| Compressor {
            id: "zstd".to_string(),
            level: Some(level),
        }),
        fill_value: fill_value(array.dtype()),
        order: "C".to_string(),
        filters: None,
    };
    write_json(&path.join(ZARRAY), &meta)?;

    if array.size() == 0 {
        return Ok(());
    }
    let raw = encode_array_data(array.data(), str_width);
    let bytes = match options.compression_level {
        Some(level) => zstd::encode_all(raw.as_slice(), level)
            .map_err(|e| StoreError::CompressionFailed(e.to_string()))?,
        None => raw,
    };
    let chunk_path = path.join(chunk_key(array.ndim()));
    fs::write(&chunk_path, bytes).map_err(|e| io_error(&chunk_path, e))?;
    debug!(path = %path.display(), dtype = %array.dtype(), shape = ?array.shape(), "wrote array");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_group() -> Group {
        let mut root = Group::new();
        root.attrs_mut()
            .insert("geff".to_string(), serde_json::json!({"directed": true}));
        root.create_array("nodes/ids", NdArray::from_vec_1d(vec![0i64, 1, 2]))
            .unwrap();
        root.create_array(
            "nodes/props/label/values",
            NdArray::strings(["a", "bcd", ""]),
        )
        .unwrap();
        root.create_array(
            "nodes/props/label/missing",
            NdArray::from_vec_1d(vec![false, false, true]),
        )
        .unwrap();
        root.create_array("edges/ids", NdArray::zeros(DType::Int64, vec![0, 2]))
            .unwrap();
        root.create_array("edges/props/blob/data", NdArray::bytes(b"xyz".to_vec()))
            .unwrap();
        root
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.zarr");
        let root = sample_group();

        write_group(&path, &root, &StoreOptions::default()).unwrap();
        assert!(path.join(".zgroup").is_file());
        assert!(path.join("nodes/ids/.zarray").is_file());
        assert!(path.join("nodes/ids/0").is_file());
        assert!(!path.join("edges/ids/0.0").exists());

        let back = read_group(&path).unwrap();
        assert_eq!(back, root);
    }

    #[test]
    fn test_overflowing_shape_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.zarr");
        write_group(&path, &sample_group(), &StoreOptions::default()).unwrap();

        let huge = 1usize << 40;
        let meta = serde_json::json!({
            "zarr_format": 2,
            "shape": [huge, huge],
            "chunks": [huge, huge],
            "dtype": "<i8",
            "compressor": null,
            "fill_value": 0,
            "order": "C",
            "filters": null,
        });
        fs::write(path.join("nodes/ids/.zarray"), meta.to_string()).unwrap();

        let err = read_group(&path).unwrap_err();
        assert!(matches!(&err, StoreError::InvalidStore { reason } if reason.contains("overflows")));
    }

    #[test]
    fn test_uncompressed_chunks_are_raw() {
        let dir = tempfile::tempdir().unwrap();
        let mut root = Group::new();
        root.create_array("a", NdArray::from_vec_1d(vec![1i16, 2])).unwrap();
        write_group(dir.path(), &root, &StoreOptions::uncompressed()).unwrap();
        let raw = fs::read(dir.path().join("a/0")).unwrap();
        assert_eq!(raw, vec![1, 0, 2, 0]);
        assert_eq!(read_group(dir.path()).unwrap(), root);
    }

    #[test]
    fn test_overwrite_guard() {
        let dir = tempfile::tempdir().unwrap();
        let root = sample_group();
        write_group(dir.path(), &root, &StoreOptions::default()).unwrap();
        assert!(matches!(
            write_group(dir.path(), &root, &StoreOptions::default()),
            Err(StoreError::InvalidStore { .. })
        ));
        write_group(dir.path(), &root, &StoreOptions::default().with_overwrite(true)).unwrap();
    }

    #[test]
    fn test_open_missing_path() {
        let err = open_storelike("/definitely/not/here.zarr").unwrap_err();
        assert_eq!(err.to_string(), "Path does not exist: /definitely/not/here.zarr");
    }

    #[test]
    fn test_open_non_store_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_group(dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidStore { .. }));
    }

    #[test]
    fn test_open_remote_url() {
        assert!(matches!(
            open_storelike("https://example.com/graph.zarr"),
            Err(StoreError::InvalidStore { .. })
        ));
    }

    #[test]
    fn test_typestrs() {
        let path = Path::new(".zarray");
        assert_eq!(parse_typestr("<U7", path).unwrap(), (DType::Str, 7));
        assert_eq!(parse_typestr("|b1", path).unwrap(), (DType::Bool, 0));
        assert!(parse_typestr(">i4", path).is_err());
        assert!(parse_typestr("|S4", path).is_err());
        assert!(parse_typestr("<f2", path).is_err());
        for dtype in DType::ALL {
            let s = typestr(dtype, 3);
            assert_eq!(parse_typestr(&s, path).unwrap().0, dtype);
        }
    }
}
