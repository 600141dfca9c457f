//! Scan orders, context neighbors and coefficient bands.
//!
//! A scan order linearizes a square transform block into the sequence in
//! which coefficients are coded. The scan is chosen from the predicted
//! transform type: ADST along one axis concentrates energy along that axis,
//! so the scan follows it.
//!
//! Every table here is generated at compile time and shared process-wide.

use crate::{COEF_BANDS, MAX_NEIGHBORS};

/// Last scan index with its own band entry; later indices use the top band.
pub const MAXBAND_INDEX: usize = 21;

/// Transform size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum TxSize {
    /// 4x4 transform.
    #[default]
    Tx4x4 = 0,
    /// 8x8 transform.
    Tx8x8 = 1,
    /// 16x16 transform.
    Tx16x16 = 2,
    /// 32x32 transform.
    Tx32x32 = 3,
}

impl TxSize {
    /// All transform sizes, smallest first.
    pub const ALL: [TxSize; 4] = [Self::Tx4x4, Self::Tx8x8, Self::Tx16x16, Self::Tx32x32];

    /// Get the size in pixels.
    pub const fn size(&self) -> usize {
        match self {
            Self::Tx4x4 => 4,
            Self::Tx8x8 => 8,
            Self::Tx16x16 => 16,
            Self::Tx32x32 => 32,
        }
    }

    /// Get the log2 of size.
    pub const fn log2(&self) -> u8 {
        match self {
            Self::Tx4x4 => 2,
            Self::Tx8x8 => 3,
            Self::Tx16x16 => 4,
            Self::Tx32x32 => 5,
        }
    }

    /// Number of coefficients in a block of this size.
    pub const fn num_coeffs(&self) -> usize {
        self.size() * self.size()
    }

    /// Width of the block in 4x4 entropy-context units.
    pub const fn units(&self) -> usize {
        self.size() >> 2
    }

    /// Index into per-size tables.
    pub const fn index(&self) -> usize {
        *self as usize
    }
}

/// Predicted transform type (vertical_horizontal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TxType {
    /// DCT in both directions.
    #[default]
    DctDct = 0,
    /// ADST vertical, DCT horizontal.
    AdstDct = 1,
    /// DCT vertical, ADST horizontal.
    DctAdst = 2,
    /// ADST in both directions.
    AdstAdst = 3,
}

/// Scan pattern family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    /// Diagonal zig-zag.
    Default,
    /// Row by row.
    Row,
    /// Column by column.
    Col,
}

impl ScanKind {
    /// Scan family used for a predicted transform type.
    pub const fn for_tx_type(tx_type: TxType) -> Self {
        match tx_type {
            TxType::AdstDct => Self::Row,
            TxType::DctAdst => Self::Col,
            TxType::DctDct | TxType::AdstAdst => Self::Default,
        }
    }
}

/// Already-coded neighbors of one scan position, as raster positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbors {
    positions: [u16; MAX_NEIGHBORS],
    count: u8,
}

impl Neighbors {
    const NONE: Self = Self {
        positions: [0; MAX_NEIGHBORS],
        count: 0,
    };

    const fn one(pos: usize) -> Self {
        Self {
            positions: [pos as u16, pos as u16],
            count: 1,
        }
    }

    const fn two(a: usize, b: usize) -> Self {
        Self {
            positions: [a as u16, b as u16],
            count: 2,
        }
    }

    /// Valid neighbor positions.
    pub fn positions(&self) -> &[u16] {
        &self.positions[..self.count as usize]
    }

    /// Number of valid neighbors (0 only for the first scan position).
    pub const fn count(&self) -> usize {
        self.count as usize
    }
}

/// Map from scan index to coefficient band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandMap {
    translate: [u8; MAXBAND_INDEX + 1],
}

impl BandMap {
    /// Band of the coefficient at `coef_index` in scan order.
    #[inline]
    pub fn band(&self, coef_index: usize) -> usize {
        if coef_index > MAXBAND_INDEX {
            COEF_BANDS - 1
        } else {
            self.translate[coef_index] as usize
        }
    }
}

/// Band map for 4x4 transforms.
pub static BAND_MAP_4X4: BandMap = BandMap {
    translate: [0, 1, 1, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 5, 5, 5, 5, 5, 5, 5, 5, 5],
};

/// Band map for 8x8 and larger transforms.
pub static BAND_MAP_8X8PLUS: BandMap = BandMap {
    translate: [0, 1, 1, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 4, 5, 5, 5, 5, 5, 5, 5],
};

/// A scan order together with its derived tables.
#[derive(Debug)]
pub struct ScanOrder {
    tx_size: TxSize,
    kind: ScanKind,
    scan: &'static [u16],
    iscan: &'static [u16],
    neighbors: &'static [Neighbors],
    bands: &'static BandMap,
}

impl ScanOrder {
    /// Transform size this order covers.
    pub fn tx_size(&self) -> TxSize {
        self.tx_size
    }

    /// Scan family.
    pub fn kind(&self) -> ScanKind {
        self.kind
    }

    /// Number of coefficients.
    pub fn len(&self) -> usize {
        self.scan.len()
    }

    /// Always false; every scan covers at least 16 coefficients.
    pub fn is_empty(&self) -> bool {
        self.scan.is_empty()
    }

    /// Scan index to raster position.
    pub fn scan(&self) -> &'static [u16] {
        self.scan
    }

    /// Raster position to scan index.
    pub fn iscan(&self) -> &'static [u16] {
        self.iscan
    }

    /// Raster position of scan index `c`.
    #[inline]
    pub fn position(&self, c: usize) -> usize {
        self.scan[c] as usize
    }

    /// Context neighbors of scan index `c`.
    #[inline]
    pub fn neighbors(&self, c: usize) -> &Neighbors {
        &self.neighbors[c]
    }

    /// Band map for this transform size.
    pub fn bands(&self) -> &'static BandMap {
        self.bands
    }

    /// Band of scan index `c`.
    #[inline]
    pub fn band(&self, c: usize) -> usize {
        self.bands.band(c)
    }
}

const fn zigzag<const N: usize>(size: usize) -> [u16; N] {
    let mut out = [0u16; N];
    let mut n = 0;
    let mut s = 0;
    while s < 2 * size - 1 {
        let lo = if s >= size { s - size + 1 } else { 0 };
        let hi = if s < size { s } else { size - 1 };
        // Odd diagonals run downwards, even diagonals upwards.
        let mut k = 0;
        while k <= hi - lo {
            let row = if s % 2 == 1 { lo + k } else { hi - k };
            out[n] = (row * size + (s - row)) as u16;
            n += 1;
            k += 1;
        }
        s += 1;
    }
    out
}

const fn row_scan<const N: usize>() -> [u16; N] {
    let mut out = [0u16; N];
    let mut i = 0;
    while i < N {
        out[i] = i as u16;
        i += 1;
    }
    out
}

const fn col_scan<const N: usize>(size: usize) -> [u16; N] {
    let mut out = [0u16; N];
    let mut i = 0;
    while i < N {
        out[i] = ((i % size) * size + i / size) as u16;
        i += 1;
    }
    out
}

const fn inverse<const N: usize>(scan: &[u16; N]) -> [u16; N] {
    let mut out = [0u16; N];
    let mut i = 0;
    while i < N {
        out[scan[i] as usize] = i as u16;
        i += 1;
    }
    out
}

const fn neighbors<const N: usize>(scan: &[u16; N], size: usize, kind: ScanKind) -> [Neighbors; N] {
    let mut out = [Neighbors::NONE; N];
    let mut n = 1;
    while n < N {
        let rc = scan[n] as usize;
        let (i, j) = (rc / size, rc % size);
        let above = rc.wrapping_sub(size);
        let left = rc.wrapping_sub(1);
        out[n] = if i > 0 && j > 0 {
            match kind {
                ScanKind::Col => Neighbors::one(above),
                ScanKind::Row => Neighbors::one(left),
                ScanKind::Default => Neighbors::two(above, left),
            }
        } else if i > 0 {
            Neighbors::one(above)
        } else {
            Neighbors::one(left)
        };
        n += 1;
    }
    out
}

macro_rules! scan_tables {
    ($scan:ident, $iscan:ident, $nb:ident, $n:expr, $size:expr, $kind:expr, $gen:expr) => {
        static $scan: [u16; $n] = $gen;
        static $iscan: [u16; $n] = inverse(&$gen);
        static $nb: [Neighbors; $n] = neighbors(&$gen, $size, $kind);
    };
}

scan_tables!(DEFAULT_SCAN_4X4, DEFAULT_ISCAN_4X4, DEFAULT_NB_4X4, 16, 4, ScanKind::Default, zigzag(4));
scan_tables!(ROW_SCAN_4X4, ROW_ISCAN_4X4, ROW_NB_4X4, 16, 4, ScanKind::Row, row_scan());
scan_tables!(COL_SCAN_4X4, COL_ISCAN_4X4, COL_NB_4X4, 16, 4, ScanKind::Col, col_scan(4));
scan_tables!(DEFAULT_SCAN_8X8, DEFAULT_ISCAN_8X8, DEFAULT_NB_8X8, 64, 8, ScanKind::Default, zigzag(8));
scan_tables!(ROW_SCAN_8X8, ROW_ISCAN_8X8, ROW_NB_8X8, 64, 8, ScanKind::Row, row_scan());
scan_tables!(COL_SCAN_8X8, COL_ISCAN_8X8, COL_NB_8X8, 64, 8, ScanKind::Col, col_scan(8));
scan_tables!(DEFAULT_SCAN_16X16, DEFAULT_ISCAN_16X16, DEFAULT_NB_16X16, 256, 16, ScanKind::Default, zigzag(16));
scan_tables!(ROW_SCAN_16X16, ROW_ISCAN_16X16, ROW_NB_16X16, 256, 16, ScanKind::Row, row_scan());
scan_tables!(COL_SCAN_16X16, COL_ISCAN_16X16, COL_NB_16X16, 256, 16, ScanKind::Col, col_scan(16));
scan_tables!(DEFAULT_SCAN_32X32, DEFAULT_ISCAN_32X32, DEFAULT_NB_32X32, 1024, 32, ScanKind::Default, zigzag(32));

macro_rules! scan_order {
    ($tx:expr, $kind:expr, $scan:ident, $iscan:ident, $nb:ident, $bands:ident) => {
        ScanOrder {
            tx_size: $tx,
            kind: $kind,
            scan: &$scan,
            iscan: &$iscan,
            neighbors: &$nb,
            bands: &$bands,
        }
    };
}

/// Scan orders indexed by `[tx_size][default, row, col]`; 32x32 only has a default.
static SCAN_ORDERS_4X4: [ScanOrder; 3] = [
    scan_order!(TxSize::Tx4x4, ScanKind::Default, DEFAULT_SCAN_4X4, DEFAULT_ISCAN_4X4, DEFAULT_NB_4X4, BAND_MAP_4X4),
    scan_order!(TxSize::Tx4x4, ScanKind::Row, ROW_SCAN_4X4, ROW_ISCAN_4X4, ROW_NB_4X4, BAND_MAP_4X4),
    scan_order!(TxSize::Tx4x4, ScanKind::Col, COL_SCAN_4X4, COL_ISCAN_4X4, COL_NB_4X4, BAND_MAP_4X4),
];

static SCAN_ORDERS_8X8: [ScanOrder; 3] = [
    scan_order!(TxSize::Tx8x8, ScanKind::Default, DEFAULT_SCAN_8X8, DEFAULT_ISCAN_8X8, DEFAULT_NB_8X8, BAND_MAP_8X8PLUS),
    scan_order!(TxSize::Tx8x8, ScanKind::Row, ROW_SCAN_8X8, ROW_ISCAN_8X8, ROW_NB_8X8, BAND_MAP_8X8PLUS),
    scan_order!(TxSize::Tx8x8, ScanKind::Col, COL_SCAN_8X8, COL_ISCAN_8X8, COL_NB_8X8, BAND_MAP_8X8PLUS),
];

static SCAN_ORDERS_16X16: [ScanOrder; 3] = [
    scan_order!(TxSize::Tx16x16, ScanKind::Default, DEFAULT_SCAN_16X16, DEFAULT_ISCAN_16X16, DEFAULT_NB_16X16, BAND_MAP_8X8PLUS),
    scan_order!(TxSize::Tx16x16, ScanKind::Row, ROW_SCAN_16X16, ROW_ISCAN_16X16, ROW_NB_16X16, BAND_MAP_8X8PLUS),
    scan_order!(TxSize::Tx16x16, ScanKind::Col, COL_SCAN_16X16, COL_ISCAN_16X16, COL_NB_16X16, BAND_MAP_8X8PLUS),
];

static SCAN_ORDER_32X32: ScanOrder = scan_order!(
    TxSize::Tx32x32,
    ScanKind::Default,
    DEFAULT_SCAN_32X32,
    DEFAULT_ISCAN_32X32,
    DEFAULT_NB_32X32,
    BAND_MAP_8X8PLUS
);

/// Look up the scan order for a transform size and predicted transform type.
///
/// # Panics
///
/// 32x32 transforms are always DCT_DCT; any other type is a caller bug.
pub fn scan_for(tx_size: TxSize, tx_type: TxType) -> &'static ScanOrder {
    let kind = ScanKind::for_tx_type(tx_type);
    let set = match tx_size {
        TxSize::Tx4x4 => &SCAN_ORDERS_4X4,
        TxSize::Tx8x8 => &SCAN_ORDERS_8X8,
        TxSize::Tx16x16 => &SCAN_ORDERS_16X16,
        TxSize::Tx32x32 => {
            assert_eq!(
                tx_type,
                TxType::DctDct,
                "32x32 transforms only support DCT_DCT"
            );
            return &SCAN_ORDER_32X32;
        }
    };
    match kind {
        ScanKind::Default => &set[0],
        ScanKind::Row => &set[1],
        ScanKind::Col => &set[2],
    }
}

/// Band map for a transform size.
pub fn band_map(tx_size: TxSize) -> &'static BandMap {
    match tx_size {
        TxSize::Tx4x4 => &BAND_MAP_4X4,
        _ => &BAND_MAP_8X8PLUS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_orders() -> Vec<&'static ScanOrder> {
        let mut orders = Vec::new();
        for tx_size in [TxSize::Tx4x4, TxSize::Tx8x8, TxSize::Tx16x16] {
            for tx_type in [TxType::DctDct, TxType::AdstDct, TxType::DctAdst] {
                orders.push(scan_for(tx_size, tx_type));
            }
        }
        orders.push(scan_for(TxSize::Tx32x32, TxType::DctDct));
        orders
    }

    #[test]
    fn test_default_zigzag_4x4() {
        let order = scan_for(TxSize::Tx4x4, TxType::DctDct);
        assert_eq!(
            order.scan(),
            &[0, 1, 4, 8, 5, 2, 3, 6, 9, 12, 13, 10, 7, 11, 14, 15]
        );
    }

    #[test]
    fn test_default_zigzag_8x8_prefix() {
        let order = scan_for(TxSize::Tx8x8, TxType::DctDct);
        assert_eq!(&order.scan()[..10], &[0, 1, 8, 16, 9, 2, 3, 10, 17, 24]);
        assert_eq!(order.scan()[63], 63);
    }

    #[test]
    fn test_row_and_col_scans_4x4() {
        assert_eq!(
            scan_for(TxSize::Tx4x4, TxType::AdstDct).scan(),
            &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]
        );
        assert_eq!(
            scan_for(TxSize::Tx4x4, TxType::DctAdst).scan(),
            &[0, 4, 8, 12, 1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15]
        );
    }

    #[test]
    fn test_adst_adst_uses_default() {
        let order = scan_for(TxSize::Tx8x8, TxType::AdstAdst);
        assert_eq!(order.kind(), ScanKind::Default);
    }

    #[test]
    fn test_scans_are_permutations() {
        for order in all_orders() {
            let n = order.len();
            assert_eq!(n, order.tx_size().num_coeffs());
            let mut seen = vec![false; n];
            for &pos in order.scan() {
                assert!(!seen[pos as usize]);
                seen[pos as usize] = true;
            }
            for c in 0..n {
                assert_eq!(order.iscan()[order.position(c)] as usize, c);
            }
        }
    }

    #[test]
    fn test_neighbors_already_visited() {
        for order in all_orders() {
            assert_eq!(order.neighbors(0).count(), 0);
            for c in 1..order.len() {
                let nb = order.neighbors(c);
                assert!(nb.count() == 1 || nb.count() == 2);
                for &pos in nb.positions() {
                    assert!((order.iscan()[pos as usize] as usize) < c);
                }
            }
        }
    }

    #[test]
    fn test_row_scan_uses_left_neighbor() {
        let order = scan_for(TxSize::Tx4x4, TxType::AdstDct);
        // Raster position 5 is (1, 1); row scans look left only.
        let nb = order.neighbors(5);
        assert_eq!(nb.positions(), &[4]);
    }

    #[test]
    fn test_band_map_monotonic() {
        for bands in [&BAND_MAP_4X4, &BAND_MAP_8X8PLUS] {
            assert_eq!(bands.band(0), 0);
            for c in 1..=MAXBAND_INDEX {
                assert!(bands.band(c) >= bands.band(c - 1));
            }
            for c in MAXBAND_INDEX + 1..1024 {
                assert_eq!(bands.band(c), COEF_BANDS - 1);
            }
        }
    }

    #[test]
    fn test_orders_use_size_band_map() {
        for order in all_orders() {
            assert!(std::ptr::eq(order.bands(), band_map(order.tx_size())));
        }
        assert!(std::ptr::eq(band_map(TxSize::Tx4x4), &BAND_MAP_4X4));
        assert!(std::ptr::eq(band_map(TxSize::Tx32x32), &BAND_MAP_8X8PLUS));
    }

    #[test]
    #[should_panic(expected = "DCT_DCT")]
    fn test_32x32_rejects_adst() {
        scan_for(TxSize::Tx32x32, TxType::AdstDct);
    }

    #[test]
    fn test_tx_size_properties() {
        assert_eq!(TxSize::Tx4x4.size(), 4);
        assert_eq!(TxSize::Tx32x32.log2(), 5);
        assert_eq!(TxSize::Tx16x16.num_coeffs(), 256);
        assert_eq!(TxSize::Tx8x8.units(), 2);
    }
}
