/// Largest value a display pixel takes; the ROI outline is drawn with it
pub const DISPLAY_MAX: u8 = 254;

/// 8-bit grayscale image ready for presentation
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl DisplayImage {
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.data[row * self.width + col]
    }

    pub fn row(&self, row: usize) -> &[u8] {
        let start = row * self.width;
        &self.data[start..start + self.width]
    }
}
