//! Bag-of-cells (BOC) serialization.
//!
//! Layout written by [`serialize`]:
//!
//! ```text
//! b5ee9c72                      magic
//! flags:u8                      0x40 (crc32c) | size_bytes
//! off_bytes:u8
//! cells:size_bytes  roots:size_bytes  absent:size_bytes
//! tot_cells_size:off_bytes
//! root_index:size_bytes
//! cell data...                  d1 d2 padded_data ref_index*
//! crc32c:u32le
//! ```
//!
//! Cells are emitted parents-first; identical subtrees are deduplicated by hash.

use std::collections::HashMap;
use std::sync::Arc;

use crc::{Crc, CRC_32_ISCSI};

use crate::cell::Cell;
use crate::error::TonError;

const BOC_MAGIC: [u8; 4] = [0xb5, 0xee, 0x9c, 0x72];
const FLAG_HAS_IDX: u8 = 0x80;
const FLAG_HAS_CRC: u8 = 0x40;

const CRC32C: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

fn min_bytes(value: usize) -> usize {
    let bits = usize::BITS as usize - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

fn push_be(out: &mut Vec<u8>, value: usize, width: usize) {
    let bytes = (value as u64).to_be_bytes();
    out.extend_from_slice(&bytes[8 - width..]);
}

/// Orders the tree so every cell appears before all of its children.
fn topological_order(root: &Arc<Cell>) -> Vec<Arc<Cell>> {
    fn visit(
        cell: &Arc<Cell>,
        seen: &mut HashMap<[u8; 32], ()>,
        post: &mut Vec<Arc<Cell>>,
    ) {
        if seen.insert(cell.hash(), ()).is_some() {
            return;
        }
        for r in cell.refs() {
            visit(r, seen, post);
        }
        post.push(cell.clone());
    }

    let mut seen = HashMap::new();
    let mut post = Vec::new();
    visit(root, &mut seen, &mut post);
    post.reverse();
    post
}

/// Serializes a single-root tree with a CRC32C trailer.
pub fn serialize(root: &Arc<Cell>) -> Vec<u8> {
    let cells = topological_order(root);
    let index: HashMap<[u8; 32], usize> = cells
        .iter()
        .enumerate()
        .map(|(i, c)| (c.hash(), i))
        .collect();

    let size_bytes = min_bytes(cells.len());

    let mut body = Vec::new();
    for cell in &cells {
        body.push(cell.d1());
        body.push(cell.d2());
        body.extend_from_slice(&cell.padded_data());
        for r in cell.refs() {
            // Every ref was visited, so its hash is indexed.
            let idx = index.get(&r.hash()).copied().unwrap_or_default();
            push_be(&mut body, idx, size_bytes);
        }
    }

    let off_bytes = min_bytes(body.len());

    let mut out = Vec::with_capacity(body.len() + 32);
    out.extend_from_slice(&BOC_MAGIC);
    out.push(FLAG_HAS_CRC | size_bytes as u8);
    out.push(off_bytes as u8);
    push_be(&mut out, cells.len(), size_bytes);
    push_be(&mut out, 1, size_bytes);
    push_be(&mut out, 0, size_bytes);
    push_be(&mut out, body.len(), off_bytes);
    push_be(&mut out, 0, size_bytes);
    out.extend_from_slice(&body);

    let crc = CRC32C.checksum(&out);
    out.extend_from_slice(&crc.to_le_bytes());
    out
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], TonError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&e| e <= self.buf.len())
            .ok_or_else(|| TonError::BocError("unexpected end of data".into()))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, TonError> {
        Ok(self.take(1)?[0])
    }

    fn uint(&mut self, width: usize) -> Result<usize, TonError> {
        let bytes = self.take(width)?;
        Ok(bytes.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize))
    }
}

/// Parses a BOC and returns its first root.
pub fn deserialize(bytes: &[u8]) -> Result<Arc<Cell>, TonError> {
    let mut r = Reader { buf: bytes, pos: 0 };
    if r.take(4)? != BOC_MAGIC {
        return Err(TonError::BocError("bad magic".into()));
    }

    let flags = r.u8()?;
    let has_idx = flags & FLAG_HAS_IDX != 0;
    let has_crc = flags & FLAG_HAS_CRC != 0;
    let size_bytes = (flags & 0x07) as usize;
    if size_bytes == 0 || size_bytes > 4 {
        return Err(TonError::BocError(format!("invalid size_bytes {size_bytes}")));
    }
    let off_bytes = r.u8()? as usize;
    if off_bytes == 0 || off_bytes > 8 {
        return Err(TonError::BocError(format!("invalid off_bytes {off_bytes}")));
    }

    let cell_count = r.uint(size_bytes)?;
    let root_count = r.uint(size_bytes)?;
    let _absent = r.uint(size_bytes)?;
    let total_size = r.uint(off_bytes)?;
    if root_count == 0 {
        return Err(TonError::BocError("no roots".into()));
    }
    if root_count > cell_count {
        return Err(TonError::BocError(format!("{root_count} roots for {cell_count} cells")));
    }
    // Every cell carries at least its two descriptor bytes.
    if cell_count > (bytes.len() - r.pos) / 2 {
        return Err(TonError::BocError(format!("cell count {cell_count} exceeds input size")));
    }
    let mut roots = Vec::with_capacity(root_count);
    for _ in 0..root_count {
        roots.push(r.uint(size_bytes)?);
    }
    if has_idx {
        r.take(cell_count * off_bytes)?;
    }

    let data_start = r.pos;
    let mut raw = Vec::with_capacity(cell_count);
    for _ in 0..cell_count {
        let d1 = r.u8()?;
        let d2 = r.u8()?;
        let ref_count = (d1 & 0x07) as usize;
        if d1 & 0x08 != 0 || d1 >> 5 != 0 {
            return Err(TonError::BocError("only ordinary level-0 cells are supported".into()));
        }
        let data = r.take((d2 as usize).div_ceil(2))?;
        let mut refs = Vec::with_capacity(ref_count);
        for _ in 0..ref_count {
            refs.push(r.uint(size_bytes)?);
        }
        raw.push((d2, data, refs));
    }
    if r.pos - data_start != total_size {
        return Err(TonError::BocError("cell data size mismatch".into()));
    }

    if has_crc {
        let body_end = r.pos;
        let expected = u32::from_le_bytes(
            r.take(4)?
                .try_into()
                .map_err(|_| TonError::BocError("short crc".into()))?,
        );
        if CRC32C.checksum(&bytes[..body_end]) != expected {
            return Err(TonError::BocError("crc32c mismatch".into()));
        }
    }
    if r.pos != bytes.len() {
        return Err(TonError::BocError("trailing bytes".into()));
    }

    // Children always have higher indices, so build from the back.
    let mut built: Vec<Option<Arc<Cell>>> = vec![None; cell_count];
    for i in (0..cell_count).rev() {
        let (d2, data, ref_idx) = &raw[i];
        let mut refs = Vec::with_capacity(ref_idx.len());
        for &ri in ref_idx {
            if ri <= i || ri >= cell_count {
                return Err(TonError::BocError(format!("cell {i} has invalid ref {ri}")));
            }
            let child = built[ri]
                .clone()
                .ok_or_else(|| TonError::BocError(format!("unresolved ref {ri}")))?;
            refs.push(child);
        }
        built[i] = Some(Arc::new(Cell::from_padded(data, *d2, refs)?));
    }

    let root = roots[0];
    built
        .get(root)
        .cloned()
        .flatten()
        .ok_or_else(|| TonError::BocError(format!("root index {root} out of range")))
}
