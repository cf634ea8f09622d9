use crate::error::FileError;
use fpsample_core::PointCloud;
use ndarray::{Array2, ArrayD};
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use std::fs;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

/// Element type of an array file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    F32,
    F64,
}

impl std::fmt::Display for Dtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dtype::F32 => write!(f, "float32"),
            Dtype::F64 => write!(f, "float64"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpyInfo {
    pub shape: Vec<usize>,
    pub dtype: Dtype,
}

/// Read a `.npy` file of any dimensionality, narrowing f64 data to f32.
///
/// The whole file is read up front so open/read failures surface as
/// [`FileError::Io`] and parse failures as [`FileError::Corrupt`].
fn read_dyn(path: &Path) -> Result<(ArrayD<f32>, Dtype), FileError> {
    let bytes = fs::read(path)?;

    match ArrayD::<f32>::read_npy(bytes.as_slice()) {
        Ok(arr) => Ok((arr, Dtype::F32)),
        Err(_) => match ArrayD::<f64>::read_npy(bytes.as_slice()) {
            Ok(arr) => Ok((arr.mapv(|v| v as f32), Dtype::F64)),
            Err(e) => Err(FileError::Corrupt(e.to_string())),
        },
    }
}

/// Report the shape and element type of a `.npy` file.
pub fn describe(path: impl AsRef<Path>) -> Result<NpyInfo, FileError> {
    let (arr, dtype) = read_dyn(path.as_ref())?;
    Ok(NpyInfo {
        shape: arr.shape().to_vec(),
        dtype,
    })
}

/// Load a single `[N, 3]` point cloud from a `.npy` file.
///
/// Accepts f32 or f64 element types; f64 is narrowed to f32, matching the
/// single-precision pipeline the sampler runs in. Any other shape is
/// rejected with [`FileError::BadShape`].
pub fn read_points(path: impl AsRef<Path>) -> Result<PointCloud, FileError> {
    let (arr, _) = read_dyn(path.as_ref())?;

    if arr.ndim() != 2 || arr.shape()[1] != 3 {
        return Err(FileError::BadShape {
            shape: arr.shape().to_vec(),
        });
    }

    Ok(cloud_from_rows(&arr, arr.shape()[0], 0))
}

/// Load one or many clouds from a `.npy` file.
///
/// A `[N, 3]` array yields one cloud; a `[S, N, 3]` array yields `S` clouds
/// in sample order. This mirrors the two layouts the visualization exporter
/// accepts.
pub fn read_cloud_stack(path: impl AsRef<Path>) -> Result<Vec<PointCloud>, FileError> {
    let (arr, _) = read_dyn(path.as_ref())?;
    let shape = arr.shape().to_vec();

    match shape.as_slice() {
        [_, 3] => Ok(vec![cloud_from_rows(&arr, shape[0], 0)]),
        [s, _, 3] => Ok((0..*s).map(|i| cloud_from_rows(&arr, shape[1], i)).collect()),
        _ => Err(FileError::BadShape { shape }),
    }
}

fn cloud_from_rows(arr: &ArrayD<f32>, num_points: usize, sample: usize) -> PointCloud {
    let mut x = Vec::with_capacity(num_points);
    let mut y = Vec::with_capacity(num_points);
    let mut z = Vec::with_capacity(num_points);

    for i in 0..num_points {
        if arr.ndim() == 2 {
            x.push(arr[[i, 0]]);
            y.push(arr[[i, 1]]);
            z.push(arr[[i, 2]]);
        } else {
            x.push(arr[[sample, i, 0]]);
            y.push(arr[[sample, i, 1]]);
            z.push(arr[[sample, i, 2]]);
        }
    }

    PointCloud::from_xyz(x, y, z)
}

/// Save a cloud as an f32 `[N, 3]` `.npy` file, replacing `path` atomically.
///
/// The data is staged in a temporary file in the same directory and renamed
/// over the target, so an interrupted write can never leave a truncated
/// array behind.
pub fn write_points(path: impl AsRef<Path>, cloud: &PointCloud) -> Result<(), FileError> {
    let path = path.as_ref();
    let n = cloud.len();

    let mut arr = Array2::<f32>::zeros((n, 3));
    for i in 0..n {
        arr[[i, 0]] = cloud.x[i];
        arr[[i, 1]] = cloud.y[i];
        arr[[i, 2]] = cloud.z[i];
    }

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = NamedTempFile::new_in(dir.unwrap_or_else(|| Path::new(".")))?;
    arr.write_npy(&mut tmp)
        .map_err(|e| FileError::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))?;
    tmp.persist(path).map_err(|e| FileError::Io(e.error))?;

    Ok(())
}
