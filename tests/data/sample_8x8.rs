// Shared 8x8 fixtures, pulled into unit and integration tests with `include!`.

/// Grayscale gradient with a bright 3x3 square at (2, 2)..=(4, 4).
#[allow(dead_code)]
pub const SAMPLE_8X8_GRAY: [u8; 64] = [
    10, 12, 14, 16, 18, 20, 22, 24, //
    12, 14, 16, 18, 20, 22, 24, 26, //
    14, 16, 200, 210, 220, 24, 26, 28, //
    16, 18, 205, 215, 225, 26, 28, 30, //
    18, 20, 210, 220, 230, 28, 30, 32, //
    20, 22, 24, 26, 28, 30, 32, 34, //
    22, 24, 26, 28, 30, 32, 34, 36, //
    24, 26, 28, 30, 32, 34, 36, 38,
];

/// Binary image with a single 3x3 foreground square at (2, 2)..=(4, 4).
#[allow(dead_code)]
pub const SAMPLE_8X8_SQUARE: [u8; 64] = [
    0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 255, 255, 255, 0, 0, 0, //
    0, 0, 255, 255, 255, 0, 0, 0, //
    0, 0, 255, 255, 255, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0,
];
