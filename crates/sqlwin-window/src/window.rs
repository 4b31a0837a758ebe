//! The window buffer: header, field directories, packed payloads.
//!
//! Binary layout of the arena (all integers little-endian):
//!
//! ```text
//! offset 0         4         8         12        16
//!        ┌─────────┬─────────┬─────────┬─────────┬──────────────┬─────┐
//!        │ magic   │ columns │ rows    │ slot end│ field slots →│ ... │
//!        └─────────┴─────────┴─────────┴─────────┴──────────────┴─────┘
//!                                                 ┌──────────────┐
//!                                      capacity ← │ ← payloads   │
//!                                                 └──────────────┘
//! ```
//!
//! Each row owns one field directory of `columns` 16-byte slots, allocated
//! contiguously from the low end; the directory for row `r` therefore
//! starts at `16 + r * columns * 16`. A slot is the type code (u32)
//! followed by 8 payload bytes: the value itself for INTEGER/FLOAT, or
//! `(offset: u32, length: u32)` into the payload region for TEXT/BLOB.
//! Payloads are packed from the high end growing downward; the window is
//! full when the two regions would meet.
//!
//! The arena is cleared and re-seeded wholesale between pagination windows
//! and never partially patched, so the buffer only ever holds rows from one
//! contiguous window.

use sqlwin_error::{Result, WindowError};
use sqlwin_types::{ColumnType, ColumnValue};

/// Arena magic, "SQWN".
const WINDOW_MAGIC: u32 = 0x5351_574E;

/// Header length in bytes: magic, column count, row count, slot high-water.
const HEADER_LEN: usize = 16;

/// One field slot: type code (u32), 8 payload bytes, 4 reserved.
const FIELD_SLOT_LEN: usize = 16;

/// Default window capacity, sized for paging UIs.
pub const DEFAULT_CAPACITY: usize = 2 * 1024 * 1024;

/// Signal that an allocation did not fit in the window.
///
/// Recoverable: the materializer reacts by restarting or closing the
/// current pagination window. This never surfaces to callers as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFull;

/// A fixed-capacity binary region holding a contiguous slice of a result
/// set plus per-row directory metadata.
///
/// Exclusively owned by the calling thread for the duration of a
/// materialization call; reused across many calls by clearing at the start
/// of each. The populated arena ([`as_bytes`](Self::as_bytes)) is the
/// caller-visible artifact read back after the call.
pub struct Window {
    buf: Vec<u8>,
    column_count: usize,
    row_count: usize,
    /// Next free byte for field directories; grows upward.
    slot_top: usize,
    /// One past the lowest payload byte; grows downward.
    data_bottom: usize,
    /// `(slot_top, data_bottom)` as of the most recent `alloc_row`, so the
    /// row can be released wholesale if one of its columns does not fit.
    last_row_mark: Option<(usize, usize)>,
}

impl Window {
    /// Create a window with [`DEFAULT_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a window with the given capacity in bytes.
    ///
    /// The capacity is fixed for the window's lifetime. Capacities below
    /// the header size are raised to it; capacities above `u32::MAX` are
    /// clamped (slot offsets are 32-bit).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(HEADER_LEN, u32::MAX as usize);
        let mut window = Self {
            buf: vec![0; capacity],
            column_count: 0,
            row_count: 0,
            slot_top: HEADER_LEN,
            data_bottom: capacity,
            last_row_mark: None,
        };
        window.store_u32(0, WINDOW_MAGIC);
        window
    }

    /// Total arena capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes still available between the directory and payload regions.
    #[must_use]
    pub fn free_space(&self) -> usize {
        self.data_bottom - self.slot_top
    }

    /// Number of rows currently stored.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// The declared column count, 0 until seeded.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// The populated arena, for the external row-reading side.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Discard all rows and payloads, returning the window to its empty
    /// state. The column count must be seeded again before rows can be
    /// allocated.
    pub fn clear(&mut self) {
        self.column_count = 0;
        self.row_count = 0;
        self.slot_top = HEADER_LEN;
        self.data_bottom = self.buf.len();
        self.last_row_mark = None;
        self.store_u32(0, WINDOW_MAGIC);
        self.store_u32(4, 0);
        self.store_u32(8, 0);
        self.store_header_watermark();
    }

    /// Seed the column count for the pagination window being built.
    ///
    /// The count is fixed once rows are stored: re-seeding with a different
    /// count without an intervening [`clear`](Self::clear) is an error.
    pub fn set_column_count(&mut self, columns: usize) -> Result<()> {
        if self.row_count > 0 && columns != self.column_count {
            return Err(WindowError::init(format!(
                "cannot change column count from {} to {columns} with {} rows stored",
                self.column_count, self.row_count
            )));
        }
        self.column_count = columns;
        #[allow(clippy::cast_possible_truncation)]
        self.store_u32(4, columns as u32);
        Ok(())
    }

    /// Allocate the field directory for the next row.
    ///
    /// Every slot is initialized to NULL. Fails with [`WindowFull`] when
    /// there is no room for the directory itself, in which case nothing is
    /// written.
    pub fn alloc_row(&mut self) -> std::result::Result<(), WindowFull> {
        let dir_len = self.column_count * FIELD_SLOT_LEN;
        if self.free_space() < dir_len {
            return Err(WindowFull);
        }
        self.last_row_mark = Some((self.slot_top, self.data_bottom));
        let dir_start = self.slot_top;
        self.slot_top += dir_len;
        for col in 0..self.column_count {
            let slot = dir_start + col * FIELD_SLOT_LEN;
            self.store_slot_header(slot, ColumnType::Null);
            self.store_u32(slot + 4, 0);
            self.store_u32(slot + 8, 0);
        }
        self.row_count += 1;
        #[allow(clippy::cast_possible_truncation)]
        self.store_u32(8, self.row_count as u32);
        self.store_header_watermark();
        Ok(())
    }

    /// Release the most recently allocated row, reclaiming its directory
    /// and any payload bytes written for it. A second call without an
    /// intervening [`alloc_row`](Self::alloc_row) is a no-op.
    pub fn free_last_row(&mut self) {
        if let Some((slot_top, data_bottom)) = self.last_row_mark.take() {
            self.slot_top = slot_top;
            self.data_bottom = data_bottom;
            self.row_count -= 1;
            #[allow(clippy::cast_possible_truncation)]
            self.store_u32(8, self.row_count as u32);
            self.store_header_watermark();
        }
    }

    /// Store NULL into a field slot.
    pub fn put_null(&mut self, row: usize, col: usize) -> std::result::Result<(), WindowFull> {
        let slot = self.slot_offset(row, col);
        self.store_slot_header(slot, ColumnType::Null);
        self.store_u32(slot + 4, 0);
        self.store_u32(slot + 8, 0);
        Ok(())
    }

    /// Store a 64-bit integer into a field slot.
    pub fn put_i64(
        &mut self,
        row: usize,
        col: usize,
        value: i64,
    ) -> std::result::Result<(), WindowFull> {
        let slot = self.slot_offset(row, col);
        self.store_slot_header(slot, ColumnType::Integer);
        self.buf[slot + 4..slot + 12].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Store a 64-bit float into a field slot.
    pub fn put_f64(
        &mut self,
        row: usize,
        col: usize,
        value: f64,
    ) -> std::result::Result<(), WindowFull> {
        let slot = self.slot_offset(row, col);
        self.store_slot_header(slot, ColumnType::Float);
        self.buf[slot + 4..slot + 12].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Store UTF-8 text, packing the bytes into the payload region.
    ///
    /// Fails with [`WindowFull`] when the payload does not fit; the slot is
    /// left untouched (still NULL from allocation).
    pub fn put_text(
        &mut self,
        row: usize,
        col: usize,
        text: &str,
    ) -> std::result::Result<(), WindowFull> {
        let slot = self.slot_offset(row, col);
        let offset = self.alloc_payload(text.as_bytes())?;
        self.store_slot_header(slot, ColumnType::Text);
        self.store_buffer_ref(slot, offset, text.len());
        Ok(())
    }

    /// Store raw bytes, packing them into the payload region.
    pub fn put_blob(
        &mut self,
        row: usize,
        col: usize,
        blob: &[u8],
    ) -> std::result::Result<(), WindowFull> {
        let slot = self.slot_offset(row, col);
        let offset = self.alloc_payload(blob)?;
        self.store_slot_header(slot, ColumnType::Blob);
        self.store_buffer_ref(slot, offset, blob.len());
        Ok(())
    }

    // ── Decode path ───────────────────────────────────────────────────────

    /// The stored type of a field slot.
    pub fn type_at(&self, row: usize, col: usize) -> Result<ColumnType> {
        let slot = self.checked_slot_offset(row, col)?;
        let code = self.load_u32(slot);
        i32::try_from(code)
            .ok()
            .and_then(ColumnType::from_code)
            .ok_or_else(|| {
                WindowError::internal(format!("corrupt field slot ({row},{col}): type code {code}"))
            })
    }

    /// Read back a stored integer. The slot must hold an INTEGER.
    pub fn i64_at(&self, row: usize, col: usize) -> Result<i64> {
        let slot = self.expect_type(row, col, ColumnType::Integer)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.buf[slot + 4..slot + 12]);
        Ok(i64::from_le_bytes(raw))
    }

    /// Read back a stored float. The slot must hold a FLOAT.
    pub fn f64_at(&self, row: usize, col: usize) -> Result<f64> {
        let slot = self.expect_type(row, col, ColumnType::Float)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.buf[slot + 4..slot + 12]);
        Ok(f64::from_le_bytes(raw))
    }

    /// Read back stored text. The slot must hold TEXT.
    pub fn text_at(&self, row: usize, col: usize) -> Result<&str> {
        let slot = self.expect_type(row, col, ColumnType::Text)?;
        let payload = self.payload_at(slot, row, col)?;
        std::str::from_utf8(payload).map_err(|_| {
            WindowError::internal(format!("field slot ({row},{col}): invalid UTF-8 payload"))
        })
    }

    /// Read back a stored blob. The slot must hold a BLOB.
    pub fn blob_at(&self, row: usize, col: usize) -> Result<&[u8]> {
        let slot = self.expect_type(row, col, ColumnType::Blob)?;
        self.payload_at(slot, row, col)
    }

    /// Read back a field slot as an owned [`ColumnValue`].
    pub fn value_at(&self, row: usize, col: usize) -> Result<ColumnValue> {
        match self.type_at(row, col)? {
            ColumnType::Null => Ok(ColumnValue::Null),
            ColumnType::Integer => self.i64_at(row, col).map(ColumnValue::Integer),
            ColumnType::Float => self.f64_at(row, col).map(ColumnValue::Float),
            ColumnType::Text => self.text_at(row, col).map(|s| ColumnValue::Text(s.to_owned())),
            ColumnType::Blob => self.blob_at(row, col).map(|b| ColumnValue::Blob(b.to_vec())),
        }
    }

    // ── Internal helpers ──────────────────────────────────────────────────

    /// Byte offset of a field slot. Row and column must be in range; this
    /// is the writer-side contract (the encoder only touches the row it
    /// just allocated).
    fn slot_offset(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.row_count && col < self.column_count,
            "field slot ({row},{col}) out of range ({} rows, {} columns)",
            self.row_count,
            self.column_count
        );
        HEADER_LEN + (row * self.column_count + col) * FIELD_SLOT_LEN
    }

    fn checked_slot_offset(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.row_count || col >= self.column_count {
            return Err(WindowError::internal(format!(
                "field slot ({row},{col}) out of range ({} rows, {} columns)",
                self.row_count, self.column_count
            )));
        }
        Ok(HEADER_LEN + (row * self.column_count + col) * FIELD_SLOT_LEN)
    }

    fn expect_type(&self, row: usize, col: usize, expected: ColumnType) -> Result<usize> {
        let actual = self.type_at(row, col)?;
        if actual != expected {
            return Err(WindowError::internal(format!(
                "field slot ({row},{col}) holds {actual}, not {expected}"
            )));
        }
        self.checked_slot_offset(row, col)
    }

    /// Carve `payload.len()` bytes off the high end of the free region and
    /// copy the payload in. Zero-length payloads allocate nothing but still
    /// get a valid offset.
    fn alloc_payload(&mut self, payload: &[u8]) -> std::result::Result<usize, WindowFull> {
        if self.free_space() < payload.len() {
            return Err(WindowFull);
        }
        self.data_bottom -= payload.len();
        self.buf[self.data_bottom..self.data_bottom + payload.len()].copy_from_slice(payload);
        Ok(self.data_bottom)
    }

    fn payload_at(&self, slot: usize, row: usize, col: usize) -> Result<&[u8]> {
        let offset = self.load_u32(slot + 4) as usize;
        let length = self.load_u32(slot + 8) as usize;
        if offset + length > self.buf.len() {
            return Err(WindowError::internal(format!(
                "corrupt field slot ({row},{col}): payload {offset}+{length} exceeds arena"
            )));
        }
        Ok(&self.buf[offset..offset + length])
    }

    fn store_slot_header(&mut self, slot: usize, column_type: ColumnType) {
        #[allow(clippy::cast_sign_loss)]
        self.store_u32(slot, column_type.code() as u32);
    }

    fn store_buffer_ref(&mut self, slot: usize, offset: usize, length: usize) {
        #[allow(clippy::cast_possible_truncation)]
        self.store_u32(slot + 4, offset as u32);
        #[allow(clippy::cast_possible_truncation)]
        self.store_u32(slot + 8, length as u32);
    }

    fn store_header_watermark(&mut self) {
        #[allow(clippy::cast_possible_truncation)]
        self.store_u32(12, self.slot_top as u32);
    }

    fn store_u32(&mut self, offset: usize, value: u32) {
        self.buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn load_u32(&self, offset: usize) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.buf[offset..offset + 4]);
        u32::from_le_bytes(raw)
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("capacity", &self.buf.len())
            .field("columns", &self.column_count)
            .field("rows", &self.row_count)
            .field("free_space", &self.free_space())
            .finish()
    }
}

/// Arena capacity needed to store `rows` rows of `columns` columns with
/// `payload` total payload bytes per row. Useful for sizing test windows.
#[must_use]
pub fn capacity_for(rows: usize, columns: usize, payload_per_row: usize) -> usize {
    HEADER_LEN + rows * (columns * FIELD_SLOT_LEN + payload_per_row)
}
