
pub mod signal_modulation;

pub const GPS_L1_FREQ_HZ:f64 = 1.57542e9;				// [Hz]
pub const GPS_L1_CA_CODE_RATE_HZ:f64 = 1.023e6;			// [chips/sec]
pub const GPS_L1_CA_CODE_LENGTH_CHIPS:usize = 1023;
pub const GPS_L1_CA_CODE_PERIOD:f64 = 1.0e-3;			// [sec]

// SBAS L1 shares the L1 C/A numerology; only the PRN range differs
pub const SBAS_L1_PRN_RANGE:(u32, u32) = (120, 158);
pub const GPS_L1_CA_PRN_RANGE:(u32, u32) = (1, 32);
