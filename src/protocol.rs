use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::common::{Point, PointCloud};
use crate::config::SmoothingConfig;
use crate::error::{Result, SmoothError};
use crate::glyph::VertexGlyphs;
use crate::MovingAverageFilter;

// Binary protocol for fast I/O, all little-endian
// Input format: [u32 pointCount][f32 smoothingRadius][f32 iterations][f32* pointData]
// Output format: [u32 pointCount][f32* smoothedPoints]

const HEADER_LEN: usize = 12;
const BYTES_PER_POINT: u64 = 12;

/// A decoded smoothing request, from either wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothRequest {
    pub cloud: PointCloud,
    pub config: SmoothingConfig,
}

/// JSON form: `{"points": [[x, y, z], ...], "radius": r, "iterations": k}`.
/// Every config field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRequest {
    pub points: Vec<Point>,
    #[serde(flatten)]
    pub config: SmoothingConfig,
}

impl From<JsonRequest> for SmoothRequest {
    fn from(req: JsonRequest) -> Self {
        Self {
            cloud: PointCloud::from_points(req.points),
            config: req.config,
        }
    }
}

/// Reads one binary request. The radius is passed through unvalidated; a
/// negative or NaN iteration count reads as zero passes.
pub fn read_request<R: Read>(reader: &mut R) -> Result<SmoothRequest> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header)?;

    let point_count = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let radius = f32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    let iterations = f32::from_le_bytes([header[8], header[9], header[10], header[11]]);

    // The count is untrusted: read at most what it claims instead of
    // allocating for it up front.
    let expected = point_count as u64 * BYTES_PER_POINT;
    let mut buffer = Vec::new();
    reader.by_ref().take(expected).read_to_end(&mut buffer)?;
    if (buffer.len() as u64) < expected {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {expected} bytes of point data, got {}", buffer.len()),
        )
        .into());
    }

    let data: Vec<f32> = buffer
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    Ok(SmoothRequest {
        cloud: PointCloud::from_flat_f32(&data)?,
        config: SmoothingConfig {
            radius: radius as f64,
            iterations: iterations as u32,
            ..SmoothingConfig::default()
        },
    })
}

/// Writes `[u32 count][f32 * 3 * count]` and flushes.
pub fn write_response<W: Write>(writer: &mut W, cloud: &PointCloud) -> Result<()> {
    writer.write_all(&wire_count(cloud.len())?.to_le_bytes())?;

    let bytes: Vec<u8> = cloud
        .to_flat_f32()
        .iter()
        .flat_map(|&f| f.to_le_bytes())
        .collect();
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Encodes a binary request; the client side of [`read_request`].
pub fn write_request<W: Write>(writer: &mut W, request: &SmoothRequest) -> Result<()> {
    writer.write_all(&wire_count(request.cloud.len())?.to_le_bytes())?;
    writer.write_all(&(request.config.radius as f32).to_le_bytes())?;
    writer.write_all(&(request.config.iterations as f32).to_le_bytes())?;

    let bytes: Vec<u8> = request
        .cloud
        .to_flat_f32()
        .iter()
        .flat_map(|&f| f.to_le_bytes())
        .collect();
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Point count as the `u32` the wire header carries.
fn wire_count(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| SmoothError::PointCountOverflow(len))
}

pub fn read_json_request<R: Read>(reader: R) -> Result<SmoothRequest> {
    let req: JsonRequest = serde_json::from_reader(reader)?;
    Ok(req.into())
}

pub fn write_json_response<W: Write>(writer: &mut W, glyphs: &VertexGlyphs) -> Result<()> {
    serde_json::to_writer(&mut *writer, glyphs)?;
    writer.flush()?;
    Ok(())
}

/// Handles one tool request: decode from `reader`, smooth, encode to
/// `writer`. Nothing is written unless smoothing succeeds.
pub fn serve<R: Read, W: Write>(reader: &mut R, writer: &mut W, json: bool) -> Result<()> {
    let SmoothRequest { cloud, config } = if json {
        read_json_request(&mut *reader)?
    } else {
        read_request(reader)?
    };

    info!(
        points = cloud.len(),
        radius = config.radius,
        iterations = config.iterations,
        "received request"
    );

    let filter = MovingAverageFilter::from_config(config)?;
    let glyphs = filter.run(&cloud)?;

    if json {
        write_json_response(writer, &glyphs)
    } else {
        write_response(writer, &glyphs.into_cloud())
    }
}
