//! Plain-text persistence of performance graphs.
//!
//! A file starts with one header line of `key=value` entries, followed by
//! one block per curve. Blocks are separated by blank lines; each opens with
//! the curve's signed flow and lists one tab-separated row per point:
//!
//! ```text
//! HPG nid=J12 ds_invert=0 us_invert=1 dsta= usta= slope=0.002 length=500 roughness=0.015 diameter=10 max_depth_frac=0.95
//!
//! Q=12.500000
//! 0.912000	1.204000	310.551000	0.000912345678
//! ```
//!
//! Rows hold downstream depth, upstream depth, volume and friction loss.
//! The friction loss column may be omitted when reading.

mod error;

pub use error::StoreError;

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use super::{Curve, Family, Hpg, HpgHeader, ProfilePoint};

const HEADER_TAG: &str = "HPG";
const FLOW_TAG: &str = "Q=";

/// Reads a performance graph.
///
/// Curves with negative flow form the adverse family; all others the forward
/// family. A missing slope is derived from the inverts and length.
///
/// # Errors
///
/// Returns a [`StoreError`] on I/O failure or malformed content. No partial
/// graph is returned.
pub fn read_hpg(reader: impl BufRead) -> Result<Hpg, StoreError> {
    let mut header: Option<HpgHeader> = None;
    let mut blocks: Vec<Block> = Vec::new();
    let mut current: Option<Block> = None;

    for (index, line) in reader.lines().enumerate() {
        let number = index + 1;
        let line = line?;
        let line = line.trim();

        if header.is_none() {
            if !line.is_empty() {
                header = Some(parse_header(line, number)?);
            }
            continue;
        }

        if line.is_empty() {
            blocks.extend(current.take());
            continue;
        }

        if let Some(flow) = line.strip_prefix(FLOW_TAG) {
            blocks.extend(current.take());
            let flow = parse_number(flow).ok_or(StoreError::InvalidBlock { line: number })?;
            current = Some(Block {
                flow,
                points: Vec::new(),
            });
            continue;
        }

        let block = current
            .as_mut()
            .ok_or(StoreError::InvalidBlock { line: number })?;
        block.points.push(parse_row(line, number)?);
    }
    blocks.extend(current);

    let mut header = header.ok_or(StoreError::MissingHeader)?;
    header.slope = header.resolved_slope();

    let (adverse, forward): (Vec<Block>, Vec<Block>) =
        blocks.into_iter().partition(|block| block.flow < 0.0);

    Ok(Hpg::new(
        header,
        Family::new(forward.into_iter().map(Block::into_curve).collect())?,
        Family::new(adverse.into_iter().map(Block::into_curve).collect())?,
    )?)
}

/// Writes a performance graph, forward curves first.
///
/// # Errors
///
/// Returns [`StoreError::InvalidNodeId`] if the node id would not read back
/// as one header entry, and [`StoreError::Io`] if writing fails.
pub fn write_hpg(mut writer: impl Write, hpg: &Hpg) -> Result<(), StoreError> {
    let header = hpg.header();
    if let Some(id) = header
        .node_id
        .as_deref()
        .filter(|id| id.is_empty() || id.contains(char::is_whitespace))
    {
        return Err(StoreError::InvalidNodeId { id: id.to_string() });
    }
    let number = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();

    writeln!(
        writer,
        "{HEADER_TAG} nid={} ds_invert={} us_invert={} dsta={} usta={} slope={} length={} \
         roughness={} diameter={} max_depth_frac={}",
        header.node_id.as_deref().unwrap_or_default(),
        number(header.ds_invert),
        number(header.us_invert),
        number(header.ds_station),
        number(header.us_station),
        number(header.slope),
        number(header.length),
        number(header.roughness),
        number(header.diameter),
        number(header.max_depth_frac),
    )?;

    for curve in hpg.forward().curves().iter().chain(hpg.adverse().curves()) {
        writeln!(writer)?;
        writeln!(writer, "{FLOW_TAG}{:.6}", curve.flow())?;
        for p in curve.points() {
            writeln!(
                writer,
                "{:.6}\t{:.6}\t{:.6}\t{:.12}",
                p.downstream, p.upstream, p.volume, p.friction_loss
            )?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Reads a performance graph from the file at `path`.
///
/// # Errors
///
/// See [`read_hpg`].
pub fn load_hpg(path: impl AsRef<Path>) -> Result<Hpg, StoreError> {
    read_hpg(BufReader::new(File::open(path)?))
}

/// Writes a performance graph to the file at `path`, replacing it.
///
/// # Errors
///
/// See [`write_hpg`].
pub fn save_hpg(path: impl AsRef<Path>, hpg: &Hpg) -> Result<(), StoreError> {
    write_hpg(BufWriter::new(File::create(path)?), hpg)
}

struct Block {
    flow: f64,
    points: Vec<ProfilePoint>,
}

impl Block {
    fn into_curve(self) -> Curve {
        Curve::new(self.flow, self.points)
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_header(line: &str, number: usize) -> Result<HpgHeader, StoreError> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some(HEADER_TAG) {
        return Err(StoreError::MissingHeader);
    }

    let invalid = |entry: &str| StoreError::InvalidHeader {
        line: number,
        entry: entry.to_string(),
    };

    let mut header = HpgHeader::default();
    for entry in tokens {
        let (key, value) = entry.split_once('=').ok_or_else(|| invalid(entry))?;
        let optional = || -> Result<Option<f64>, StoreError> {
            if value.is_empty() {
                Ok(None)
            } else {
                parse_number(value).map(Some).ok_or_else(|| invalid(entry))
            }
        };

        match key {
            "nid" => header.node_id = (!value.is_empty()).then(|| value.to_string()),
            "ds_invert" => header.ds_invert = optional()?,
            "us_invert" => header.us_invert = optional()?,
            "dsta" => header.ds_station = optional()?,
            "usta" => header.us_station = optional()?,
            "slope" => header.slope = optional()?,
            "length" => header.length = optional()?,
            "roughness" => header.roughness = optional()?,
            "diameter" | "max_chan_depth" => header.diameter = optional()?,
            "max_depth_frac" | "unsteadydepth" => header.max_depth_frac = optional()?,
            _ => {}
        }
    }

    Ok(header)
}

fn parse_row(line: &str, number: usize) -> Result<ProfilePoint, StoreError> {
    let invalid = || StoreError::InvalidRow { line: number };

    let values = line
        .split_whitespace()
        .map(|field| parse_number(field).ok_or_else(invalid))
        .collect::<Result<Vec<f64>, _>>()?;

    match values[..] {
        [downstream, upstream, volume] => Ok(ProfilePoint {
            downstream,
            upstream,
            volume,
            friction_loss: 0.0,
        }),
        [downstream, upstream, volume, friction_loss] => Ok(ProfilePoint {
            downstream,
            upstream,
            volume,
            friction_loss,
        }),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    fn point(downstream: f64) -> ProfilePoint {
        ProfilePoint {
            downstream,
            upstream: 1.1 * downstream + 0.123_456_789,
            volume: 100.0 * downstream,
            friction_loss: 0.000_123_456_789_012_3 * downstream,
        }
    }

    fn sample_hpg() -> Hpg {
        let curve = |flow: f64| Curve::new(flow, (1..=4).map(|i| point(f64::from(i))).collect());
        let header = HpgHeader {
            node_id: Some("J12".to_string()),
            ds_invert: Some(0.0),
            us_invert: Some(1.0),
            slope: Some(0.002),
            length: Some(500.0),
            roughness: Some(0.015),
            diameter: Some(10.0),
            max_depth_frac: Some(0.95),
            ..HpgHeader::default()
        };
        Hpg::new(
            header,
            Family::new(vec![curve(1.5), curve(12.25)]).unwrap(),
            Family::new(vec![curve(-3.0)]).unwrap(),
        )
        .unwrap()
    }

    fn round_trip(hpg: &Hpg) -> Hpg {
        let mut buffer = Vec::new();
        write_hpg(&mut buffer, hpg).unwrap();
        read_hpg(buffer.as_slice()).unwrap()
    }

    #[test]
    fn round_trip_preserves_values() {
        let original = sample_hpg();
        let restored = round_trip(&original);

        assert_eq!(restored.header(), original.header());
        assert_eq!(restored.forward().len(), 2);
        assert_eq!(restored.adverse().len(), 1);

        let pairs = original
            .forward()
            .curves()
            .iter()
            .chain(original.adverse().curves())
            .zip(restored.forward().curves().iter().chain(restored.adverse().curves()));
        for (a, b) in pairs {
            assert_abs_diff_eq!(a.flow(), b.flow(), epsilon = 1e-6);
            for (p, q) in a.points().iter().zip(b.points()) {
                assert_abs_diff_eq!(p.downstream, q.downstream, epsilon = 1e-6);
                assert_abs_diff_eq!(p.upstream, q.upstream, epsilon = 1e-6);
                assert_abs_diff_eq!(p.volume, q.volume, epsilon = 1e-6);
                assert_abs_diff_eq!(p.friction_loss, q.friction_loss, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn written_layout() {
        let mut buffer = Vec::new();
        write_hpg(&mut buffer, &sample_hpg()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some(
                "HPG nid=J12 ds_invert=0 us_invert=1 dsta= usta= slope=0.002 length=500 \
                 roughness=0.015 diameter=10 max_depth_frac=0.95"
            )
        );
        assert_eq!(lines.next(), Some(""));
        assert_eq!(lines.next(), Some("Q=1.500000"));
        assert_eq!(
            lines.next(),
            Some("1.000000\t1.223457\t100.000000\t0.000123456789")
        );
    }

    #[test]
    fn node_ids_must_read_back_as_one_entry() {
        for id in ["J 12", "J\t12", ""] {
            let header = HpgHeader {
                node_id: Some(id.to_string()),
                ..HpgHeader::default()
            };
            let hpg = Hpg::new(header, Family::default(), Family::default()).unwrap();

            let mut buffer = Vec::new();
            let err = write_hpg(&mut buffer, &hpg).unwrap_err();
            assert!(matches!(err, StoreError::InvalidNodeId { id: ref bad } if bad == id));
            assert!(buffer.is_empty());
        }

        let header = HpgHeader {
            node_id: Some("J-12/a".to_string()),
            ..HpgHeader::default()
        };
        let hpg = Hpg::new(header, Family::default(), Family::default()).unwrap();
        assert_eq!(round_trip(&hpg).header().node_id.as_deref(), Some("J-12/a"));
    }

    #[test]
    fn header_only_file_has_no_curves() {
        let hpg = read_hpg("HPG nid=A slope=0.01\n".as_bytes()).unwrap();
        assert_eq!(hpg.curve_count(), 0);
        assert_eq!(hpg.header().node_id.as_deref(), Some("A"));
        assert_eq!(hpg.header().slope, Some(0.01));
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(matches!(read_hpg("".as_bytes()), Err(StoreError::MissingHeader)));
        assert!(matches!(
            read_hpg("Q=1.0\n1\t2\t3\n".as_bytes()),
            Err(StoreError::MissingHeader)
        ));
    }

    #[test]
    fn slope_is_derived_and_aliases_are_read() {
        let text = "HPG us_invert=2 ds_invert=1 length=100 max_chan_depth=4 unsteadydepth=0.9 extra=x\n";
        let header = read_hpg(text.as_bytes()).unwrap().header().clone();
        assert_eq!(header.slope, Some(0.01));
        assert_eq!(header.diameter, Some(4.0));
        assert_eq!(header.max_depth_frac, Some(0.9));
    }

    #[test]
    fn three_column_rows_default_friction_loss() {
        let text = "HPG\n\nQ=2\n1\t2\t3\n2\t3\t4\n";
        let hpg = read_hpg(text.as_bytes()).unwrap();
        let curve = &hpg.forward().curves()[0];
        assert_eq!(curve.points().len(), 2);
        assert_eq!(curve.points()[1].friction_loss, 0.0);
    }

    #[test]
    fn malformed_content_reports_line() {
        let bad_row = "HPG\n\nQ=2\n1\t2\t3\n1\tx\t3\n";
        assert!(matches!(
            read_hpg(bad_row.as_bytes()),
            Err(StoreError::InvalidRow { line: 5 })
        ));

        let short_row = "HPG\n\nQ=2\n1\t2\n";
        assert!(matches!(
            read_hpg(short_row.as_bytes()),
            Err(StoreError::InvalidRow { line: 4 })
        ));

        let orphan_row = "HPG\n\n1\t2\t3\n";
        assert!(matches!(
            read_hpg(orphan_row.as_bytes()),
            Err(StoreError::InvalidBlock { line: 3 })
        ));

        let bad_flow = "HPG\n\nQ=abc\n";
        assert!(matches!(
            read_hpg(bad_flow.as_bytes()),
            Err(StoreError::InvalidBlock { line: 3 })
        ));

        let bad_header = "HPG slope=steep\n";
        assert!(matches!(
            read_hpg(bad_header.as_bytes()),
            Err(StoreError::InvalidHeader { line: 1, .. })
        ));
    }

    #[test]
    fn out_of_order_flows_are_rejected() {
        let text = "HPG\n\nQ=5\n1\t2\t3\n\nQ=2\n1\t2\t3\n";
        assert!(matches!(
            read_hpg(text.as_bytes()),
            Err(StoreError::NonMonotonicFlow(_))
        ));
    }

    #[test]
    fn save_and_load_through_a_file() {
        let path = std::env::temp_dir().join(format!("backwater-hpg-{}.hpg", std::process::id()));
        save_hpg(&path, &sample_hpg()).unwrap();
        let loaded = load_hpg(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.curve_count(), 3);

        assert!(matches!(
            load_hpg(path.with_extension("missing")),
            Err(StoreError::Io(_))
        ));
    }
}
