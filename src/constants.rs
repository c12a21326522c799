//! Constants used throughout the application

/// Number of points produced by the face-mesh landmark model
pub const NUM_FACE_MESH_LANDMARKS: usize = 468;

/// Right eye EAR points p1..p6 (outer corner, upper pair, inner corner, lower pair)
pub const RIGHT_EYE_EAR: [usize; 6] = [33, 160, 158, 133, 153, 144];
/// Left eye EAR points p1..p6
pub const LEFT_EYE_EAR: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// Inner eye corners used as the head-position proxy
pub const RIGHT_EYE_INNER: usize = 133;
pub const LEFT_EYE_INNER: usize = 362;

/// Inner lip pair for mouth aperture
pub const UPPER_INNER_LIP: usize = 13;
pub const LOWER_INNER_LIP: usize = 14;

/// Eyebrow regions and the upper-lid point each is measured against
pub const RIGHT_EYEBROW: [usize; 5] = [70, 63, 105, 66, 107];
pub const LEFT_EYEBROW: [usize; 5] = [336, 296, 334, 293, 300];
pub const RIGHT_EYE_TOP: usize = 159;
pub const LEFT_EYE_TOP: usize = 386;

/// Parameter defaults
pub const DEFAULT_EMA_ALPHA: f64 = 0.15;
pub const DEFAULT_CURSOR_SENSITIVITY: f64 = 8.0;
pub const DEFAULT_BLINK_THRESHOLD_RATIO: f64 = 0.75;
pub const DEFAULT_CALIBRATION_FRAMES: usize = 30;
pub const DEFAULT_MOVEMENT_THRESHOLD: f64 = 0.02;
pub const DEFAULT_DOUBLE_CLICK_THRESHOLD: f64 = 0.8;
pub const DEFAULT_EYEBROW_RAISE_THRESHOLD_RATIO: f64 = 1.4;
pub const DEFAULT_RIGHT_CLICK_COOLDOWN: f64 = 1.0;
pub const DEFAULT_MOUTH_OPEN_THRESHOLD_RATIO: f64 = 1.5;
pub const DEFAULT_SCROLL_THRESHOLD: f64 = 0.03;
pub const DEFAULT_SCROLL_STEP: f64 = 50.0;
pub const DEFAULT_SCROLL_INTERVAL: f64 = 0.05;

/// Closed frames a blink must exceed before it counts
pub const DEFAULT_BLINK_DEBOUNCE_FRAMES: u32 = 3;

/// Calibration gives up after this many reads per required sample
pub const DEFAULT_CALIBRATION_ATTEMPT_FACTOR: usize = 10;

/// Sleep between loop iterations
pub const DEFAULT_LOOP_INTERVAL_MS: u64 = 10;

/// Neutral position the smoother starts from
pub const SMOOTHING_ORIGIN: f64 = 0.5;

/// Face-mesh model input edge length
pub const FACE_MESH_INPUT_SIZE: i32 = 192;

/// Scroll magnitude that maps to one X11 wheel notch
pub const SCROLL_STEP_UNITS_PER_NOTCH: i32 = 10;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
