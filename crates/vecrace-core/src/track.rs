use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::vector::{GridCell, Vec2};

/// Classification of a single track cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    OnTrack,
    OffTrack,
    /// Part of the start/finish line. Drivable.
    Start,
}

impl CellKind {
    pub fn is_drivable(self) -> bool {
        !matches!(self, CellKind::OffTrack)
    }
}

/// Answers "what is under this cell?" for the move validator.
pub trait TrackOracle {
    fn classify(&self, cell: GridCell) -> CellKind;
}

impl<T: TrackOracle + ?Sized> TrackOracle for &T {
    fn classify(&self, cell: GridCell) -> CellKind {
        (**self).classify(cell)
    }
}

impl<T: TrackOracle + ?Sized> TrackOracle for Arc<T> {
    fn classify(&self, cell: GridCell) -> CellKind {
        (**self).classify(cell)
    }
}

/// Adapts a closure into a [`TrackOracle`].
pub struct FnOracle<F>(pub F);

impl<F: Fn(GridCell) -> CellKind> TrackOracle for FnOracle<F> {
    fn classify(&self, cell: GridCell) -> CellKind {
        (self.0)(cell)
    }
}

/// How pixel colours map to cell kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackPalette {
    /// Pixels more transparent than this are off track.
    pub min_alpha: u8,
    /// Pixels darker than this (Rec. 601 luma) are off track.
    pub min_luminance: u8,
    /// Colour of the start/finish line.
    pub start_color: [u8; 3],
    /// Per-channel distance still accepted as the start colour.
    pub start_tolerance: u8,
}

impl Default for TrackPalette {
    fn default() -> Self {
        Self {
            min_alpha: 128,
            min_luminance: 96,
            start_color: [255, 0, 0],
            start_tolerance: 48,
        }
    }
}

impl TrackPalette {
    pub fn classify_pixel(&self, [r, g, b, a]: [u8; 4]) -> CellKind {
        if a < self.min_alpha {
            return CellKind::OffTrack;
        }
        let near_start = [r, g, b]
            .iter()
            .zip(self.start_color)
            .all(|(&c, s)| c.abs_diff(s) <= self.start_tolerance);
        if near_start {
            return CellKind::Start;
        }
        let luma = (299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b)) / 1000;
        if luma < u32::from(self.min_luminance) {
            CellKind::OffTrack
        } else {
            CellKind::OnTrack
        }
    }
}

/// Errors building a [`TrackBitmap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackError {
    EmptyDimensions,
    BufferSize { expected: usize, actual: usize },
    RaggedRow { row: usize, expected: usize, actual: usize },
    UnknownGlyph { glyph: char, row: usize, col: usize },
}

impl std::fmt::Display for TrackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDimensions => write!(f, "track must be at least 1x1"),
            Self::BufferSize { expected, actual } => {
                write!(f, "RGBA buffer has {actual} bytes, expected {expected}")
            },
            Self::RaggedRow {
                row,
                expected,
                actual,
            } => write!(f, "row {row} is {actual} cells wide, expected {expected}"),
            Self::UnknownGlyph { glyph, row, col } => {
                write!(f, "unknown track glyph {glyph:?} at row {row}, column {col}")
            },
        }
    }
}

impl std::error::Error for TrackError {}

const OFF_PIXEL: [u8; 4] = [0, 0, 0, 255];
const ON_PIXEL: [u8; 4] = [255, 255, 255, 255];

/// Immutable RGBA track image; one pixel per grid cell, row-major, y down.
///
/// Decoding image files is left to the caller. Share it as a [`SharedTrack`].
#[derive(Debug, Clone)]
pub struct TrackBitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    palette: TrackPalette,
}

/// The track handle passed around by reference count; never copied per turn.
pub type SharedTrack = Arc<TrackBitmap>;

impl TrackBitmap {
    pub fn from_rgba(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        palette: TrackPalette,
    ) -> Result<Self, TrackError> {
        if width == 0 || height == 0 {
            return Err(TrackError::EmptyDimensions);
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(TrackError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            palette,
        })
    }

    /// Build a track from a text sketch: `#` off track, `.` on track,
    /// `S` start/finish. Surrounding whitespace and blank lines are ignored.
    pub fn from_ascii(sketch: &str) -> Result<Self, TrackError> {
        let palette = TrackPalette::default();
        let start_pixel = [
            palette.start_color[0],
            palette.start_color[1],
            palette.start_color[2],
            255,
        ];
        let rows: Vec<&str> = sketch
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let width = rows.first().map_or(0, |r| r.chars().count());

        let mut pixels = Vec::with_capacity(width * rows.len() * 4);
        for (row, line) in rows.iter().enumerate() {
            let actual = line.chars().count();
            if actual != width {
                return Err(TrackError::RaggedRow {
                    row,
                    expected: width,
                    actual,
                });
            }
            for (col, glyph) in line.chars().enumerate() {
                let pixel = match glyph {
                    '#' => OFF_PIXEL,
                    '.' => ON_PIXEL,
                    'S' => start_pixel,
                    _ => return Err(TrackError::UnknownGlyph { glyph, row, col }),
                };
                pixels.extend_from_slice(&pixel);
            }
        }
        Self::from_rgba(width as u32, rows.len() as u32, pixels, palette)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA of the pixel under `cell`, if inside the image.
    pub fn pixel(&self, cell: GridCell) -> Option<[u8; 4]> {
        if cell.x < 0 || cell.y < 0 || cell.x >= i64::from(self.width) || cell.y >= i64::from(self.height) {
            return None;
        }
        let idx = (cell.y as usize * self.width as usize + cell.x as usize) * 4;
        let px = self.pixels.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// All start/finish cells, row-major.
    pub fn start_cells(&self) -> Vec<GridCell> {
        (0..i64::from(self.height))
            .flat_map(|y| (0..i64::from(self.width)).map(move |x| GridCell::new(x, y)))
            .filter(|&cell| self.classify(cell) == CellKind::Start)
            .collect()
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

impl TrackOracle for TrackBitmap {
    /// Cells outside the image are off track.
    fn classify(&self, cell: GridCell) -> CellKind {
        match self.pixel(cell) {
            Some(px) => self.palette.classify_pixel(px),
            None => CellKind::OffTrack,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKETCH: &str = "
        #####
        #.S.#
        #...#
        #####
    ";

    #[test]
    fn ascii_sketch_classifies_cells() {
        let track = TrackBitmap::from_ascii(SKETCH).unwrap();
        assert_eq!((track.width(), track.height()), (5, 4));
        assert_eq!(track.classify(GridCell::new(0, 0)), CellKind::OffTrack);
        assert_eq!(track.classify(GridCell::new(1, 1)), CellKind::OnTrack);
        assert_eq!(track.classify(GridCell::new(2, 1)), CellKind::Start);
        assert_eq!(track.start_cells(), vec![GridCell::new(2, 1)]);
    }

    #[test]
    fn outside_the_image_is_off_track() {
        let track = TrackBitmap::from_ascii("...\n...").unwrap();
        assert_eq!(track.classify(GridCell::new(-1, 0)), CellKind::OffTrack);
        assert_eq!(track.classify(GridCell::new(3, 0)), CellKind::OffTrack);
        assert_eq!(track.classify(GridCell::new(0, 2)), CellKind::OffTrack);
        assert_eq!(track.classify(GridCell::new(2, 1)), CellKind::OnTrack);
    }

    #[test]
    fn rgba_buffer_length_is_checked() {
        let err = TrackBitmap::from_rgba(2, 2, vec![0; 15], TrackPalette::default()).unwrap_err();
        assert_eq!(
            err,
            TrackError::BufferSize {
                expected: 16,
                actual: 15
            }
        );
        assert_eq!(
            TrackBitmap::from_rgba(0, 2, Vec::new(), TrackPalette::default()).unwrap_err(),
            TrackError::EmptyDimensions
        );
    }

    #[test]
    fn ragged_and_unknown_sketches_are_rejected() {
        assert!(matches!(
            TrackBitmap::from_ascii("...\n..").unwrap_err(),
            TrackError::RaggedRow { row: 1, .. }
        ));
        assert!(matches!(
            TrackBitmap::from_ascii("..x").unwrap_err(),
            TrackError::UnknownGlyph { glyph: 'x', row: 0, col: 2 }
        ));
        assert_eq!(TrackBitmap::from_ascii("\n\n").unwrap_err(), TrackError::EmptyDimensions);
    }

    #[test]
    fn palette_thresholds() {
        let palette = TrackPalette::default();
        assert_eq!(palette.classify_pixel([255, 255, 255, 0]), CellKind::OffTrack);
        assert_eq!(palette.classify_pixel([20, 20, 20, 255]), CellKind::OffTrack);
        assert_eq!(palette.classify_pixel([180, 180, 180, 255]), CellKind::OnTrack);
        assert_eq!(palette.classify_pixel([230, 30, 20, 255]), CellKind::Start);
    }

    #[test]
    fn shared_and_closure_oracles() {
        let track: SharedTrack = Arc::new(TrackBitmap::from_ascii(SKETCH).unwrap());
        let by_ref = &track;
        assert_eq!(by_ref.classify(GridCell::new(1, 2)), CellKind::OnTrack);

        let walls = FnOracle(|cell: GridCell| {
            if cell.x >= 3 {
                CellKind::OffTrack
            } else {
                CellKind::OnTrack
            }
        });
        assert_eq!(walls.classify(GridCell::new(2, 9)), CellKind::OnTrack);
        assert_eq!(walls.classify(GridCell::new(3, 0)), CellKind::OffTrack);
        assert!(!CellKind::OffTrack.is_drivable());
        assert!(CellKind::Start.is_drivable());
    }
}
