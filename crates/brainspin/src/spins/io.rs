//! Resampling-array persistence as NumPy `.npy` (format v1.0).
//!
//! Layout
//! - Arrays are written in Fortran (column-major) order, matching
//!   `DMatrix` storage. Each rotation is then a contiguous block on disk, so
//!   `load_spins(path, Some(k))` reads exactly the first `k` columns.
//! - Readers also accept C-order files (one bounded read per row) and
//!   format versions 2.0/3.0 headers.
//! - Spins are stored as `<i4`; `<i4`, `<i8`, `<u4` and `<u8` are accepted
//!   on load. Matrices (cost, nulls) are `<f8`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use nalgebra::DMatrix;

use crate::error::{Error, Result};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const ALIGN: usize = 64;

/// Writes `spins` as an `N × R` `<i4` array.
pub fn save_spins(path: impl AsRef<Path>, spins: &DMatrix<usize>) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_header(&mut out, "<i4", spins.shape())?;
    for &s in spins.iter() {
        let v = i32::try_from(s).map_err(|_| Error::npy(format!("spin index {s} does not fit in <i4")))?;
        out.write_all(&v.to_le_bytes())?;
    }
    out.flush()?;
    Ok(())
}

/// Writes an `f64` matrix (cost array, null maps) as `<f8`.
pub fn save_matrix(path: impl AsRef<Path>, matrix: &DMatrix<f64>) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_header(&mut out, "<f8", matrix.shape())?;
    for &x in matrix.iter() {
        out.write_all(&x.to_le_bytes())?;
    }
    out.flush()?;
    Ok(())
}

/// Alias of `save_matrix` for the reassignment cost array.
pub fn save_cost(path: impl AsRef<Path>, cost: &DMatrix<f64>) -> Result<()> {
    save_matrix(path, cost)
}

/// Loads a resampling array, keeping only the first `n_perm` columns if given.
pub fn load_spins(path: impl AsRef<Path>, n_perm: Option<usize>) -> Result<DMatrix<usize>> {
    let (header, mut reader) = open(path)?;
    let decode: fn(&[u8]) -> Result<usize> = match header.descr.as_str() {
        "<i4" => |b| non_negative(i64::from(i32::from_le_bytes(chunk(b)))),
        "<i8" => |b| non_negative(i64::from_le_bytes(chunk(b))),
        "<u4" => |b| Ok(u32::from_le_bytes(chunk(b)) as usize),
        "<u8" => |b| usize::try_from(u64::from_le_bytes(chunk(b))).map_err(|_| Error::npy("index overflow")),
        other => return Err(Error::npy(format!("unsupported dtype {other} for spins"))),
    };
    let values = read_columns(&header, &mut reader, n_perm)?;
    let keep = header.keep(n_perm);
    let data = values.chunks_exact(header.item_size()).map(decode).collect::<Result<Vec<_>>>()?;
    Ok(DMatrix::from_vec(header.nrows, keep, data))
}

/// Loads an `f8` matrix written by `save_matrix`.
pub fn load_matrix(path: impl AsRef<Path>, n_cols: Option<usize>) -> Result<DMatrix<f64>> {
    let (header, mut reader) = open(path)?;
    if header.descr != "<f8" {
        return Err(Error::npy(format!("expected <f8, found {}", header.descr)));
    }
    let values = read_columns(&header, &mut reader, n_cols)?;
    let data: Vec<f64> = values.chunks_exact(8).map(|b| f64::from_le_bytes(chunk(b))).collect();
    Ok(DMatrix::from_vec(header.nrows, header.keep(n_cols), data))
}

/// First `n_perm` columns of an in-memory resampling array.
pub fn truncate_spins(spins: &DMatrix<usize>, n_perm: usize) -> DMatrix<usize> {
    let keep = n_perm.min(spins.ncols());
    spins.columns(0, keep).into_owned()
}

fn non_negative(v: i64) -> Result<usize> {
    usize::try_from(v).map_err(|_| Error::npy(format!("negative index {v}")))
}

fn chunk<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

fn write_header(out: &mut impl Write, descr: &str, (nrows, ncols): (usize, usize)) -> Result<()> {
    let mut dict = format!("{{'descr': '{descr}', 'fortran_order': True, 'shape': ({nrows}, {ncols}), }}");
    // magic + version + u16 length + dict + '\n', padded to ALIGN
    let unpadded = MAGIC.len() + 2 + 2 + dict.len() + 1;
    dict.push_str(&" ".repeat((ALIGN - unpadded % ALIGN) % ALIGN));
    dict.push('\n');
    let len = u16::try_from(dict.len()).map_err(|_| Error::npy("header too long"))?;
    out.write_all(MAGIC)?;
    out.write_all(&[1, 0])?;
    out.write_all(&len.to_le_bytes())?;
    out.write_all(dict.as_bytes())?;
    Ok(())
}

#[derive(Debug)]
struct Header {
    descr: String,
    fortran_order: bool,
    nrows: usize,
    ncols: usize,
    data_start: u64,
}

impl Header {
    fn item_size(&self) -> usize {
        match &self.descr[self.descr.len().saturating_sub(1)..] {
            "8" => 8,
            _ => 4,
        }
    }

    fn keep(&self, n: Option<usize>) -> usize {
        n.map_or(self.ncols, |k| k.min(self.ncols))
    }
}

fn open(path: impl AsRef<Path>) -> Result<(Header, BufReader<File>)> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut preamble = [0u8; 8];
    reader.read_exact(&mut preamble)?;
    if &preamble[..6] != MAGIC {
        return Err(Error::npy("missing magic string"));
    }
    let (header_len, prefix) = match preamble[6] {
        1 => {
            let mut len = [0u8; 2];
            reader.read_exact(&mut len)?;
            (u16::from_le_bytes(len) as usize, 10)
        }
        2 | 3 => {
            let mut len = [0u8; 4];
            reader.read_exact(&mut len)?;
            (u32::from_le_bytes(len) as usize, 12)
        }
        v => return Err(Error::npy(format!("unsupported format version {v}"))),
    };
    let mut dict = vec![0u8; header_len];
    reader.read_exact(&mut dict)?;
    let dict = String::from_utf8(dict).map_err(|_| Error::npy("header is not valid text"))?;
    let header = parse_header(&dict, (prefix + header_len) as u64)?;
    Ok((header, reader))
}

fn dict_value<'a>(dict: &'a str, key: &str) -> Result<&'a str> {
    let tag = format!("'{key}':");
    let start = dict
        .find(&tag)
        .ok_or_else(|| Error::npy(format!("header has no {key}")))?;
    Ok(dict[start + tag.len()..].trim_start())
}

fn parse_header(dict: &str, data_start: u64) -> Result<Header> {
    let descr = dict_value(dict, "descr")?;
    let descr = descr
        .strip_prefix('\'')
        .and_then(|d| d.split('\'').next())
        .ok_or_else(|| Error::npy("malformed descr"))?
        .to_string();
    if !matches!(descr.as_str(), "<i4" | "<i8" | "<u4" | "<u8" | "<f8") {
        return Err(Error::npy(format!("unsupported dtype {descr}")));
    }

    let fortran_order = dict_value(dict, "fortran_order")?.starts_with("True");

    let shape = dict_value(dict, "shape")?;
    let inner = shape
        .strip_prefix('(')
        .and_then(|s| s.split(')').next())
        .ok_or_else(|| Error::npy("malformed shape"))?;
    let dims = inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().map_err(|_| Error::npy(format!("bad dimension {s}"))))
        .collect::<Result<Vec<_>>>()?;
    let (nrows, ncols) = match dims.as_slice() {
        [n] => (*n, 1),
        [n, r] => (*n, *r),
        _ => return Err(Error::npy(format!("expected a 1-D or 2-D array, got shape {dims:?}"))),
    };

    Ok(Header {
        descr,
        fortran_order,
        nrows,
        ncols,
        data_start,
    })
}

/// Raw bytes of the first `n_cols` columns in column-major order.
fn read_columns(header: &Header, reader: &mut BufReader<File>, n_cols: Option<usize>) -> Result<Vec<u8>> {
    let item = header.item_size();
    let keep = header.keep(n_cols);
    let mut buf = vec![0u8; header.nrows * keep * item];
    if header.fortran_order || header.ncols == 1 {
        reader.seek(SeekFrom::Start(header.data_start))?;
        reader.read_exact(&mut buf)?;
        return Ok(buf);
    }
    // C order: row i holds ncols items; take the first `keep` of each row
    let mut row = vec![0u8; keep * item];
    for i in 0..header.nrows {
        let offset = header.data_start + (i * header.ncols * item) as u64;
        reader.seek(SeekFrom::Start(offset))?;
        reader.read_exact(&mut row)?;
        for (j, value) in row.chunks_exact(item).enumerate() {
            let dst = (j * header.nrows + i) * item;
            buf[dst..dst + item].copy_from_slice(value);
        }
    }
    Ok(buf)
}
