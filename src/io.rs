//! Reading sites and writing diagrams.
//!
//! Two site formats are understood:
//! - text, one site per line as `x y` or `id x y`, with `#` starting a comment. Sites without
//!   an id are numbered by their position among the sites of the file.
//! - JSON, an array of `{ "id": .., "x": .., "y": .. }` objects.

use std::io::{self, BufRead, Read, Write};

use log::debug;
use thiserror::Error;

use crate::diagram::Diagram;
use crate::geometry::{Site, SiteId};

#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: expected `x y` or `id x y`, found {content:?}")]
    Malformed { line: usize, content: String },
}

impl From<ReadError> for io::Error {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Io(e) => e,
            e => io::Error::new(io::ErrorKind::InvalidData, e.to_string()),
        }
    }
}

/// Read sites in the text format.
pub fn read_sites<R: BufRead>(reader: R) -> Result<Vec<Site>, ReadError> {
    let mut sites = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let content = line.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }

        let malformed = || ReadError::Malformed {
            line: i + 1,
            content: content.to_string(),
        };
        let parts: Vec<&str> = content.split_whitespace().collect();
        let site = match parts.as_slice() {
            [x, y] => Site::new(
                sites.len() as SiteId,
                x.parse().map_err(|_| malformed())?,
                y.parse().map_err(|_| malformed())?,
            ),
            [id, x, y] => Site::new(
                id.parse().map_err(|_| malformed())?,
                x.parse().map_err(|_| malformed())?,
                y.parse().map_err(|_| malformed())?,
            ),
            _ => return Err(malformed()),
        };
        sites.push(site);
    }
    debug!("read {} sites", sites.len());
    Ok(sites)
}

/// Read sites in the JSON format.
pub fn read_sites_json<R: Read>(reader: R) -> Result<Vec<Site>, ReadError> {
    let sites: Vec<Site> = serde_json::from_reader(reader)?;
    debug!("read {} sites", sites.len());
    Ok(sites)
}

/// Read sites, picking the format from the first non-blank character: `[` means JSON.
pub fn read_sites_auto<R: Read>(mut reader: R) -> Result<Vec<Site>, ReadError> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    if input.trim_start().starts_with('[') {
        read_sites_json(input.as_bytes())
    } else {
        read_sites(input.as_bytes())
    }
}

pub fn write_diagram_json<W: Write>(
    writer: W,
    diagram: &Diagram,
    pretty: bool,
) -> serde_json::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(writer, diagram)
    } else {
        serde_json::to_writer(writer, diagram)
    }
}
