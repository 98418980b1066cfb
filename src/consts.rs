// Runtime defaults
pub const DEFAULT_THREADS: usize = 16;
pub const OUT_FILE: &str = "./out.ppm";
pub const DEFAULT_APERTURE: f64 = 0.1;

// Floating point comparisons
pub const FEQ_EPSILON: f64 = 0.0001;

// Offset applied along secondary rays so they don't hit their own surface
pub const BIAS_EPSILON: f64 = 0.001;

// Nearest distance accepted for a triangle hit
pub const TRIANGLE_T_MIN: f64 = 0.001;

// Jittered lookups averaged per textured hit
pub const TEXTURE_SAMPLES: usize = 4;

// Texture-space step for bump map differences, and the height gain applied
pub const BUMP_EPSILON: f64 = 0.001;
pub const BUMP_SCALE: f64 = 0.01;

// Sub-pixel grid edge when super-sampling (2 -> 2x2 samples per pixel)
pub const SUPERSAMPLE_GRID: usize = 2;

// Common refraction indices
pub const VACUUM_RI: f64 = 1.0;
pub const GLASS_RI: f64 = 1.52;
