
// C/A Gold code generation per IS-GPS-200.  Two 10-stage LFSRs (G1 with
// taps 3,10 and G2 with taps 2,3,6,8,9,10) run for one full period; the
// output chip is G1 xor a delayed G2, the delay selecting the PRN.
//
// Registers are kept in a +/-1 representation so that xor becomes a signed
// product and the result is directly usable as a correlation replica.

use super::GPS_L1_CA_CODE_LENGTH_CHIPS;

// G2 delays indexed by PRN-1.  Entries 1-37 are the GPS PRNs of IS-GPS-200
// table 3-I; 120-158 are the SBAS L1 PRNs.  The remainder of the table
// covers the extended PRN assignments.
const G2_DELAY: [u16; 210] = [
	5, 6, 7, 8, 17, 18, 139, 140, 141, 251,
	252, 254, 255, 256, 257, 258, 469, 470, 471, 472,
	473, 474, 509, 512, 513, 514, 515, 516, 859, 860,
	861, 862, 863, 950, 947, 948, 950, 67, 103, 91,
	19, 679, 225, 625, 946, 638, 161, 1001, 554, 280,
	710, 709, 775, 864, 558, 220, 397, 55, 898, 759,
	367, 299, 1018, 729, 695, 780, 801, 788, 732, 34,
	320, 327, 389, 407, 525, 405, 221, 761, 260, 326,
	955, 653, 699, 422, 188, 438, 959, 539, 879, 677,
	586, 153, 792, 814, 446, 264, 1015, 278, 536, 819,
	156, 957, 159, 712, 885, 461, 248, 713, 126, 807,
	279, 122, 197, 693, 632, 771, 467, 647, 203, 145,
	175, 52, 21, 237, 235, 886, 657, 634, 762, 355,
	1012, 176, 603, 130, 359, 595, 68, 386, 797, 456,
	499, 883, 307, 127, 211, 121, 118, 163, 628, 853,
	484, 289, 811, 202, 1021, 463, 568, 904, 670, 230,
	911, 684, 309, 644, 932, 12, 314, 891, 212, 185,
	675, 503, 150, 395, 345, 846, 798, 992, 357, 995,
	877, 112, 144, 476, 193, 109, 445, 291, 87, 399,
	292, 901, 339, 208, 711, 189, 263, 537, 663, 942,
	173, 900, 30, 500, 935, 556, 373, 85, 652, 310,
];

/// One period of the C/A code for the given PRN as +/-1 chips, or None if
/// the PRN has no G2 delay assignment.  A binary 1 chip maps to +1.
pub fn ca_code(prn:u32) -> Option<Vec<i8>> {
	let delay:usize = match (prn as usize).checked_sub(1).and_then(|i| G2_DELAY.get(i)) {
		Some(d) => *d as usize,
		None => return None,
	};

	let n = GPS_L1_CA_CODE_LENGTH_CHIPS;

	// Both registers start all-ones (all -1 in this representation)
	let mut r1 = [-1i8; 10];
	let mut r2 = [-1i8; 10];
	let mut g1 = [0i8; GPS_L1_CA_CODE_LENGTH_CHIPS];
	let mut g2 = [0i8; GPS_L1_CA_CODE_LENGTH_CHIPS];

	for i in 0..n {
		g1[i] = r1[9];
		g2[i] = r2[9];
		let c1 = r1[2] * r1[9];
		let c2 = r2[1] * r2[2] * r2[5] * r2[7] * r2[8] * r2[9];
		for k in (1..10).rev() {
			r1[k] = r1[k - 1];
			r2[k] = r2[k - 1];
		}
		r1[0] = c1;
		r2[0] = c2;
	}

	let mut code:Vec<i8> = Vec::with_capacity(n);
	let mut j = n - delay;
	for i in 0..n {
		code.push(-(g1[i] * g2[j % n]));
		j += 1;
	}

	Some(code)
}

#[cfg(test)]
mod tests {

	use super::*;

	#[test]
	fn prn1_leading_chips() {
		// First 10 chips of PRN 1 are 1100100000 (octal 1440)
		let code = ca_code(1).unwrap();
		let expected:[i8; 10] = [1, 1, -1, -1, 1, -1, -1, -1, -1, -1];
		assert_eq!(&code[..10], &expected);
	}

	#[test]
	fn full_period_and_balance() {
		for prn in 1..=32 {
			let code = ca_code(prn).unwrap();
			assert_eq!(code.len(), 1023);
			assert!(code.iter().all(|c| *c == 1 || *c == -1));
		}
	}

	#[test]
	fn autocorrelation_peak_and_cross_correlation_bound() {
		let a = ca_code(1).unwrap();
		let b = ca_code(2).unwrap();
		let auto_corr:i32 = a.iter().map(|c| (*c as i32) * (*c as i32)).sum();
		assert_eq!(auto_corr, 1023);

		// Gold code cross-correlation takes values in {-65, -1, 63}
		let cross:i32 = a.iter().zip(b.iter()).map(|(x, y)| (*x as i32) * (*y as i32)).sum();
		assert!(cross.abs() <= 65);
	}

	#[test]
	fn out_of_table_prn_rejected() {
		assert!(ca_code(0).is_none());
		assert!(ca_code(211).is_none());
	}

}
