//! Plain text record of the coordinate rebasing offsets
//!
//! Four `key value` lines written next to the LAS file so downstream tools
//! can move the points back to their global position.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use texcloud_core::{CoordinateTransform, Error, Result};
use tracing::info;

pub const X_OFFSET_KEY: &str = "global_x_offset";
pub const Y_OFFSET_KEY: &str = "global_y_offset";
pub const Z_OFFSET_KEY: &str = "global_z_offset";
pub const SCALE_KEY: &str = "scale";

/// `<dir>/<stem>_transform.txt` for an output file `<dir>/<stem>.<ext>`
pub fn sidecar_path<P: AsRef<Path>>(output: P) -> PathBuf {
    let output = output.as_ref();
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("{}_transform.txt", stem))
}

/// Write the transform record
///
/// Values use the shortest representation that reads back to the same
/// `f64`; `-0` is written as `0`.
pub fn write_transform_sidecar<P: AsRef<Path>>(path: P, transform: &CoordinateTransform) -> Result<()> {
    let path = path.as_ref();
    let write_err = |e: std::io::Error| Error::output_write(path, e);
    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);

    let lines = [
        (X_OFFSET_KEY, transform.x_offset),
        (Y_OFFSET_KEY, transform.y_offset),
        (Z_OFFSET_KEY, transform.z_offset),
        (SCALE_KEY, transform.scale),
    ];
    for (key, value) in lines {
        writeln!(writer, "{} {}", key, value + 0.0).map_err(write_err)?;
    }
    writer.flush().map_err(write_err)?;

    info!(path = %path.display(), "Transform parameters saved");
    Ok(())
}

/// Parse a file written by [`write_transform_sidecar`]
pub fn read_transform_sidecar<P: AsRef<Path>>(path: P) -> Result<CoordinateTransform> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::InputAccess {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut values: [Option<f64>; 4] = [None; 4];
    for line in BufReader::new(file).lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let slot = match key {
            X_OFFSET_KEY => 0,
            Y_OFFSET_KEY => 1,
            Z_OFFSET_KEY => 2,
            SCALE_KEY => 3,
            _ => continue,
        };
        let parsed = value
            .parse::<f64>()
            .map_err(|_| Error::InvalidData(format!("invalid value '{}' for {}", value, key)))?;
        values[slot] = Some(parsed);
    }

    let [Some(x_offset), Some(y_offset), Some(z_offset), Some(scale)] = values else {
        return Err(Error::InvalidData(format!(
            "{} is missing transform keys",
            path.display()
        )));
    };
    Ok(CoordinateTransform {
        x_offset,
        y_offset,
        z_offset,
        scale,
        needs_transform: x_offset != 0.0 || y_offset != 0.0,
    })
}
