
use serde::{Serialize, Deserialize};

use crate::DigSigProcErr;

pub mod gps_l1_ca;
pub mod tracking;

/// Numerology of one trackable ranging signal.  The tracking core is
/// generic over this record, so GPS L1 C/A and SBAS L1 run through the
/// same loop without any per-system code paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalSpec {
	pub system: char,
	pub code_length_chips: usize,
	pub code_rate_hz: f64,
	pub carrier_freq_hz: f64,
}

impl SignalSpec {

	pub fn gps_l1_ca() -> Self {
		Self {
			system: 'G',
			code_length_chips: gps_l1_ca::GPS_L1_CA_CODE_LENGTH_CHIPS,
			code_rate_hz: gps_l1_ca::GPS_L1_CA_CODE_RATE_HZ,
			carrier_freq_hz: gps_l1_ca::GPS_L1_FREQ_HZ,
		}
	}

	pub fn sbas_l1() -> Self {
		Self { system: 'S', ..Self::gps_l1_ca() }
	}

	pub fn for_system(system:char) -> Result<Self, DigSigProcErr> {
		match system {
			'G' => Ok(Self::gps_l1_ca()),
			'S' => Ok(Self::sbas_l1()),
			_   => Err(DigSigProcErr::UnsupportedSatellite{ system, prn: 0 }),
		}
	}

	pub fn code_period_secs(&self) -> f64 { (self.code_length_chips as f64) / self.code_rate_hz }

	fn prn_range(&self) -> (u32, u32) {
		match self.system {
			'S' => gps_l1_ca::SBAS_L1_PRN_RANGE,
			_   => gps_l1_ca::GPS_L1_CA_PRN_RANGE,
		}
	}

	/// One period of the local ranging code for this signal, +/-1 per chip
	pub fn local_code(&self, prn:u32) -> Result<Vec<i8>, DigSigProcErr> {
		let (lo, hi) = self.prn_range();
		if prn < lo || prn > hi {
			return Err(DigSigProcErr::UnsupportedSatellite{ system: self.system, prn });
		}
		gps_l1_ca::signal_modulation::ca_code(prn)
			.ok_or(DigSigProcErr::UnsupportedSatellite{ system: self.system, prn })
	}

}

#[cfg(test)]
mod tests {

	use super::*;

	#[test]
	fn prn_ranges_per_system() {
		assert!(SignalSpec::gps_l1_ca().local_code(1).is_ok());
		assert!(SignalSpec::gps_l1_ca().local_code(33).is_err());
		assert!(SignalSpec::sbas_l1().local_code(120).is_ok());
		assert!(SignalSpec::sbas_l1().local_code(33).is_err());
		assert!(SignalSpec::for_system('E').is_err());
	}

	#[test]
	fn code_period() {
		let spec = SignalSpec::gps_l1_ca();
		assert!((spec.code_period_secs() - 1.0e-3).abs() < 1.0e-12);
	}

}
