
use num_complex::Complex;

/// Two-quadrant arctangent carrier phase discriminator.  Insensitive to
/// 180-degree prompt flips, so navigation data bits do not register as
/// phase error.  Returns radians; zero when the prompt is on the Q axis or
/// identically zero.
pub fn pll_two_quadrant_atan(prompt:Complex<f64>) -> f64 {
	if prompt.re == 0.0 { 0.0 } else { (prompt.im / prompt.re).atan() }
}

/// Noncoherent normalized early-minus-late envelope discriminator.  Output
/// in [-1, 1]; the caller scales by (1 - spacing) to obtain chips.  Zero
/// when both envelopes vanish.
pub fn dll_nc_e_minus_l_normalized(early:Complex<f64>, late:Complex<f64>) -> f64 {
	let e = early.norm();
	let l = late.norm();
	if e + l == 0.0 { 0.0 } else { (e - l) / (e + l) }
}
