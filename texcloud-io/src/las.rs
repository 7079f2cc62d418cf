//! LAS 1.3 point cloud output
//!
//! Only point data record format 3 (XYZ, GPS time and RGB, 34 bytes) is
//! produced. Records are buffered in memory and written behind the header in
//! one pass when the writer is closed, after which the file size is checked
//! against the header.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use texcloud_core::{ColoredPoint3d, Error, PointSink, Result, Rgb16};
use tracing::{info, trace};

pub const LAS_SIGNATURE: [u8; 4] = *b"LASF";
pub const LAS_HEADER_SIZE: u16 = 235;
pub const POINT_FORMAT_RGB: u8 = 3;
pub const POINT_RECORD_LENGTH: u16 = 34;
pub const DEFAULT_SCALE: f64 = 0.001;
pub const DEFAULT_GENERATING_SOFTWARE: &str = "texcloud obj2las";

/// Return number 1 (bits 0-2) and number of returns 1 (bits 3-5)
pub const SINGLE_RETURN_FLAGS: u8 = 0x09;

const HEX_DUMP_BYTES: usize = 100;

/// Options for [`Las13Writer`]
#[derive(Debug, Clone, PartialEq)]
pub struct LasWriterOptions {
    pub scale: [f64; 3],
    pub system_identifier: String,
    pub generating_software: String,
}

impl Default for LasWriterOptions {
    fn default() -> Self {
        Self {
            scale: [DEFAULT_SCALE; 3],
            system_identifier: String::new(),
            generating_software: DEFAULT_GENERATING_SOFTWARE.to_string(),
        }
    }
}

impl LasWriterOptions {
    pub fn with_scale(mut self, scale: [f64; 3]) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_system_identifier<S: Into<String>>(mut self, identifier: S) -> Self {
        self.system_identifier = identifier.into();
        self
    }

    pub fn with_generating_software<S: Into<String>>(mut self, software: S) -> Self {
        self.generating_software = software.into();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(Error::InvalidData(format!("invalid LAS scale factors {:?}", self.scale)));
        }
        Ok(())
    }
}

/// The 235 byte LAS 1.3 public header block
#[derive(Debug, Clone, PartialEq)]
pub struct LasHeader {
    pub file_source_id: u16,
    pub global_encoding: u16,
    pub project_id: [u8; 16],
    pub version_major: u8,
    pub version_minor: u8,
    pub system_identifier: [u8; 32],
    pub generating_software: [u8; 32],
    pub creation_day_of_year: u16,
    pub creation_year: u16,
    pub header_size: u16,
    pub offset_to_point_data: u32,
    pub number_of_vlrs: u32,
    pub point_data_format: u8,
    pub point_record_length: u16,
    pub point_count: u32,
    pub points_by_return: [u32; 5],
    pub scale: [f64; 3],
    pub offset: [f64; 3],
    pub min: [f64; 3],
    pub max: [f64; 3],
    pub waveform_data_start: u64,
}

impl LasHeader {
    /// A header for an empty format 3 file created on `date`
    ///
    /// Bounds start inverted so the first point always replaces them.
    pub fn new(options: &LasWriterOptions, date: NaiveDate) -> Self {
        Self {
            file_source_id: 0,
            global_encoding: 0,
            project_id: [0; 16],
            version_major: 1,
            version_minor: 3,
            system_identifier: fixed_text(&options.system_identifier),
            generating_software: fixed_text(&options.generating_software),
            creation_day_of_year: date.ordinal() as u16,
            creation_year: date.year().clamp(0, u16::MAX as i32) as u16,
            header_size: LAS_HEADER_SIZE,
            offset_to_point_data: LAS_HEADER_SIZE as u32,
            number_of_vlrs: 0,
            point_data_format: POINT_FORMAT_RGB,
            point_record_length: POINT_RECORD_LENGTH,
            point_count: 0,
            points_by_return: [0; 5],
            scale: options.scale,
            offset: [0.0; 3],
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
            waveform_data_start: 0,
        }
    }

    /// Serialize the header, little endian
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&LAS_SIGNATURE)?;
        writer.write_u16::<LittleEndian>(self.file_source_id)?;
        writer.write_u16::<LittleEndian>(self.global_encoding)?;
        writer.write_all(&self.project_id)?;
        writer.write_u8(self.version_major)?;
        writer.write_u8(self.version_minor)?;
        writer.write_all(&self.system_identifier)?;
        writer.write_all(&self.generating_software)?;
        writer.write_u16::<LittleEndian>(self.creation_day_of_year)?;
        writer.write_u16::<LittleEndian>(self.creation_year)?;
        writer.write_u16::<LittleEndian>(self.header_size)?;
        writer.write_u32::<LittleEndian>(self.offset_to_point_data)?;
        writer.write_u32::<LittleEndian>(self.number_of_vlrs)?;
        writer.write_u8(self.point_data_format)?;
        writer.write_u16::<LittleEndian>(self.point_record_length)?;
        writer.write_u32::<LittleEndian>(self.point_count)?;
        for count in &self.points_by_return {
            writer.write_u32::<LittleEndian>(*count)?;
        }
        for value in self.scale.iter().chain(&self.offset) {
            writer.write_f64::<LittleEndian>(*value)?;
        }
        // bounds are stored as max/min pairs per axis
        for axis in 0..3 {
            writer.write_f64::<LittleEndian>(self.max[axis])?;
            writer.write_f64::<LittleEndian>(self.min[axis])?;
        }
        writer.write_u64::<LittleEndian>(self.waveform_data_start)?;
        Ok(())
    }

    /// Byte length a complete file with this header must have
    pub fn expected_file_size(&self) -> u64 {
        self.offset_to_point_data as u64 + self.point_count as u64 * self.point_record_length as u64
    }

    fn update_bounds(&mut self, position: [f64; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(position[axis]);
            self.max[axis] = self.max[axis].max(position[axis]);
        }
    }

    /// Fixed point value of `value` on `axis`, `None` when it does not fit an i32
    fn encode_axis(&self, axis: usize, value: f64) -> Option<i32> {
        let scaled = ((value - self.offset[axis]) / self.scale[axis]).round();
        if !scaled.is_finite() || scaled < i32::MIN as f64 || scaled > i32::MAX as f64 {
            return None;
        }
        Some(scaled as i32)
    }
}

fn fixed_text<const N: usize>(text: &str) -> [u8; N] {
    let mut field = [0u8; N];
    let bytes = text.as_bytes();
    let len = bytes.len().min(N);
    field[..len].copy_from_slice(&bytes[..len]);
    field
}

/// One format 3 point data record
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LasPointRecord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub intensity: u16,
    pub return_flags: u8,
    pub classification: u8,
    pub scan_angle_rank: i8,
    pub user_data: u8,
    pub point_source_id: u16,
    pub gps_time: f64,
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl LasPointRecord {
    pub const LEN: usize = POINT_RECORD_LENGTH as usize;

    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        LittleEndian::write_i32(&mut buf[0..4], self.x);
        LittleEndian::write_i32(&mut buf[4..8], self.y);
        LittleEndian::write_i32(&mut buf[8..12], self.z);
        LittleEndian::write_u16(&mut buf[12..14], self.intensity);
        buf[14] = self.return_flags;
        buf[15] = self.classification;
        buf[16] = self.scan_angle_rank as u8;
        buf[17] = self.user_data;
        LittleEndian::write_u16(&mut buf[18..20], self.point_source_id);
        LittleEndian::write_f64(&mut buf[20..28], self.gps_time);
        LittleEndian::write_u16(&mut buf[28..30], self.red);
        LittleEndian::write_u16(&mut buf[30..32], self.green);
        LittleEndian::write_u16(&mut buf[32..34], self.blue);
        buf
    }
}

/// Final state of a closed LAS file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LasSummary {
    pub path: PathBuf,
    pub version: String,
    pub point_format: u8,
    pub record_length: u16,
    pub point_count: u64,
    pub scale: [f64; 3],
    pub offset: [f64; 3],
    pub min: [f64; 3],
    pub max: [f64; 3],
    pub file_size: u64,
}

impl LasSummary {
    fn from_header(path: &Path, header: &LasHeader, file_size: u64) -> Self {
        Self {
            path: path.to_path_buf(),
            version: format!("{}.{}", header.version_major, header.version_minor),
            point_format: header.point_data_format,
            record_length: header.point_record_length,
            point_count: header.point_count as u64,
            scale: header.scale,
            offset: header.offset,
            min: header.min,
            max: header.max,
            file_size,
        }
    }
}

/// Writer for LAS 1.3 files with RGB points
///
/// The header offset of each axis is latched to the first point added.
/// `close` consumes the writer, so no point can be added once the file is
/// finalized.
#[derive(Debug)]
pub struct Las13Writer {
    path: PathBuf,
    file: File,
    header: LasHeader,
    records: Vec<u8>,
}

impl Las13Writer {
    /// Truncate-create `path` with default options
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_options(path, LasWriterOptions::default())
    }

    pub fn with_options<P: AsRef<Path>>(path: P, options: LasWriterOptions) -> Result<Self> {
        options.validate()?;
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| Error::output_write(&path, e))?;
        let header = LasHeader::new(&options, Local::now().date_naive());
        Ok(Self {
            path,
            file,
            header,
            records: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &LasHeader {
        &self.header
    }

    /// Encode one point with its 16 bit color
    ///
    /// Fails with `OutputWrite` when the coordinate does not fit the integer
    /// range around the first point, or when the record count would overflow.
    pub fn add_point_color(&mut self, x: f64, y: f64, z: f64, color: Rgb16) -> Result<()> {
        if self.header.point_count == u32::MAX {
            return Err(Error::output_write(&self.path, "LAS 1.3 point count limit reached"));
        }
        if self.header.point_count == 0 {
            self.header.offset = [x, y, z];
        }

        let mut encoded = [0i32; 3];
        for (axis, value) in [x, y, z].into_iter().enumerate() {
            encoded[axis] = self.header.encode_axis(axis, value).ok_or_else(|| {
                Error::output_write(
                    &self.path,
                    format!(
                        "coordinate {} does not fit a LAS integer with offset {} and scale {}",
                        value, self.header.offset[axis], self.header.scale[axis]
                    ),
                )
            })?;
        }
        let record = LasPointRecord {
            x: encoded[0],
            y: encoded[1],
            z: encoded[2],
            return_flags: SINGLE_RETURN_FLAGS,
            red: color.r,
            green: color.g,
            blue: color.b,
            ..LasPointRecord::default()
        };

        self.header.update_bounds([x, y, z]);
        self.records.extend_from_slice(&record.encode());
        self.header.point_count += 1;
        Ok(())
    }

    /// Write header and records, then verify the file length
    pub fn close(self) -> Result<LasSummary> {
        let Self {
            path,
            file,
            header,
            records,
        } = self;

        let mut writer = BufWriter::new(file);
        let write_err = |e: std::io::Error| Error::output_write(&path, e);
        writer.seek(SeekFrom::Start(0)).map_err(write_err)?;
        header.write_to(&mut writer).map_err(write_err)?;
        writer
            .seek(SeekFrom::Start(header.offset_to_point_data as u64))
            .map_err(write_err)?;
        writer.write_all(&records).map_err(write_err)?;
        writer.flush().map_err(write_err)?;
        let file = writer
            .into_inner()
            .map_err(|e| Error::output_write(&path, e.error()))?;
        drop(file);

        let actual = fs::metadata(&path).map_err(write_err)?.len();
        let expected = header.expected_file_size();
        if actual != expected {
            return Err(Error::output_write(
                &path,
                format!("file size mismatch: expected {} bytes, found {}", expected, actual),
            ));
        }

        let summary = LasSummary::from_header(&path, &header, actual);
        log_summary(&summary, &records);
        Ok(summary)
    }
}

impl PointSink for Las13Writer {
    fn add_point(&mut self, point: ColoredPoint3d) -> Result<()> {
        let p = point.position;
        self.add_point_color(p.x, p.y, p.z, point.color)
    }

    fn point_count(&self) -> u64 {
        self.header.point_count as u64
    }
}

fn log_summary(summary: &LasSummary, records: &[u8]) {
    info!(
        path = %summary.path.display(),
        version = %summary.version,
        point_format = summary.point_format,
        record_length = summary.record_length,
        points = summary.point_count,
        file_size = summary.file_size,
        "LAS file written"
    );
    info!(
        "Scale {:?}, offset {:?}, min {:?}, max {:?}",
        summary.scale, summary.offset, summary.min, summary.max
    );

    if tracing::enabled!(tracing::Level::TRACE) {
        let mut dump = String::new();
        for (i, byte) in records.iter().take(HEX_DUMP_BYTES).enumerate() {
            let _ = write!(dump, "{:02x} ", byte);
            if (i + 1) % LasPointRecord::LEN == 0 {
                dump.push('\n');
            }
        }
        trace!("First {} bytes of point data:\n{}", records.len().min(HEX_DUMP_BYTES), dump);
    }
}
