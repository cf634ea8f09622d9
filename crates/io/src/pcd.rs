use crate::error::FileError;
use fpsample_core::PointCloud;
use std::fs;
use std::path::Path;

/// On-disk encoding of the PCD body. The header is ASCII either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PcdFormat {
    #[default]
    Ascii,
    Binary,
}

/// Write an xyz point cloud as a PCD v0.7 file for visualization.
pub fn write_pcd(
    path: impl AsRef<Path>,
    cloud: &PointCloud,
    format: PcdFormat,
) -> Result<(), FileError> {
    let mut buf = header(cloud.len(), format).into_bytes();

    match format {
        PcdFormat::Ascii => {
            let mut body = String::new();
            for i in 0..cloud.len() {
                body.push_str(&format!("{} {} {}\n", cloud.x[i], cloud.y[i], cloud.z[i]));
            }
            buf.extend_from_slice(body.as_bytes());
        }
        PcdFormat::Binary => {
            buf.reserve(cloud.len() * 12);
            for i in 0..cloud.len() {
                buf.extend_from_slice(&cloud.x[i].to_le_bytes());
                buf.extend_from_slice(&cloud.y[i].to_le_bytes());
                buf.extend_from_slice(&cloud.z[i].to_le_bytes());
            }
        }
    }

    fs::write(path, buf)?;
    Ok(())
}

/// Read a PCD file previously written by [`write_pcd`].
///
/// Only the `x y z` float layout this crate emits is supported; PCD files
/// with other field sets are rejected as corrupt.
pub fn read_pcd(path: impl AsRef<Path>) -> Result<PointCloud, FileError> {
    let raw = fs::read(path)?;
    let (meta, body_offset) = parse_header(&raw)?;

    match meta.format {
        PcdFormat::Ascii => read_ascii_body(&raw[body_offset..], meta.points),
        PcdFormat::Binary => read_binary_body(&raw[body_offset..], meta.points),
    }
}

fn header(points: usize, format: PcdFormat) -> String {
    let data = match format {
        PcdFormat::Ascii => "ascii",
        PcdFormat::Binary => "binary",
    };
    format!(
        "# .PCD v0.7 - Point Cloud Data file format\n\
         VERSION 0.7\n\
         FIELDS x y z\n\
         SIZE 4 4 4\n\
         TYPE F F F\n\
         COUNT 1 1 1\n\
         WIDTH {points}\n\
         HEIGHT 1\n\
         VIEWPOINT 0 0 0 1 0 0 0\n\
         POINTS {points}\n\
         DATA {data}\n"
    )
}

struct PcdMeta {
    points: usize,
    format: PcdFormat,
}

/// Parse the ASCII header, returning its metadata and the byte offset of
/// the body (just past the newline ending the DATA line).
fn parse_header(raw: &[u8]) -> Result<(PcdMeta, usize), FileError> {
    let mut points: Option<usize> = None;
    let mut offset = 0;

    for line_bytes in raw.split_inclusive(|&b| b == b'\n') {
        offset += line_bytes.len();
        let line = std::str::from_utf8(line_bytes)
            .map_err(|_| FileError::Corrupt("PCD header is not valid UTF-8".into()))?
            .trim();

        if line.starts_with('#') || line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("FIELDS") => {
                let fields: Vec<&str> = parts.collect();
                if fields != ["x", "y", "z"] {
                    return Err(FileError::Corrupt(format!(
                        "unsupported PCD fields: {:?}",
                        fields
                    )));
                }
            }
            Some("POINTS") => {
                let value = parts
                    .next()
                    .ok_or_else(|| FileError::Corrupt("POINTS line missing count".into()))?;
                points = Some(value.parse::<usize>().map_err(|e| {
                    FileError::Corrupt(format!("invalid POINTS value {value:?}: {e}"))
                })?);
            }
            Some("DATA") => {
                let format = match parts.next() {
                    Some("ascii") => PcdFormat::Ascii,
                    Some("binary") => PcdFormat::Binary,
                    other => {
                        return Err(FileError::Corrupt(format!(
                            "unsupported PCD DATA format: {:?}",
                            other
                        )))
                    }
                };
                let points = points
                    .ok_or_else(|| FileError::Corrupt("PCD header missing POINTS line".into()))?;
                return Ok((PcdMeta { points, format }, offset));
            }
            _ => {}
        }
    }

    Err(FileError::Corrupt("PCD file missing DATA line".into()))
}

fn read_ascii_body(body: &[u8], points: usize) -> Result<PointCloud, FileError> {
    let text = std::str::from_utf8(body)
        .map_err(|_| FileError::Corrupt("PCD ascii body is not valid UTF-8".into()))?;

    let mut x = Vec::with_capacity(points);
    let mut y = Vec::with_capacity(points);
    let mut z = Vec::with_capacity(points);

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut values = line.split_whitespace().map(|v| v.parse::<f32>());
        match (values.next(), values.next(), values.next()) {
            (Some(Ok(px)), Some(Ok(py)), Some(Ok(pz))) => {
                x.push(px);
                y.push(py);
                z.push(pz);
            }
            _ => return Err(FileError::Corrupt(format!("bad PCD data line: {line:?}"))),
        }
    }

    if x.len() != points {
        return Err(FileError::Corrupt(format!(
            "PCD body has {} points, header declares {}",
            x.len(),
            points
        )));
    }

    Ok(PointCloud::from_xyz(x, y, z))
}

fn read_binary_body(body: &[u8], points: usize) -> Result<PointCloud, FileError> {
    let expected = points * 12;
    if body.len() < expected {
        return Err(FileError::Corrupt(format!(
            "binary PCD body too short: have {} bytes, expected {}",
            body.len(),
            expected
        )));
    }

    let mut x = Vec::with_capacity(points);
    let mut y = Vec::with_capacity(points);
    let mut z = Vec::with_capacity(points);

    for record in body[..expected].chunks_exact(12) {
        let f = |off: usize| {
            f32::from_le_bytes([record[off], record[off + 1], record[off + 2], record[off + 3]])
        };
        x.push(f(0));
        y.push(f(4));
        z.push(f(8));
    }

    Ok(PointCloud::from_xyz(x, y, z))
}
