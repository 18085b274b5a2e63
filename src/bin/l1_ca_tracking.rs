
use clap::{Arg, App};
use colored::*;
use num_complex::Complex;

use rust_gnss::ChannelEvent;
use rust_gnss::io::{IqSource, IqFileSourceF32, IqFileSourceI16};
use rust_gnss::gnss::tracking::{Tracking, TrackingConfig, TrackingOutput, AcquisitionHandoff};

pub fn main() -> Result<(), &'static str> {

	env_logger::init();

	let matches = App::new("GPS L1 CA Tracking")
		.version("0.1.0")
		.about("Takes IQ samples centered on 1575.42 MHz and a coarse acquisition estimate, then tracks one satellite's L1 CA signal")
		.arg(Arg::with_name("filename")
			.long("filename")
			.help("Input filename")
			.required(true)
			.takes_value(true))
		.arg(Arg::with_name("input_type")
			.short("t").long("type")
			.takes_value(true)
			.possible_value("i16")
			.possible_value("f32"))
		.arg(Arg::with_name("sample_rate_sps")
			.short("s").long("sample_rate_sps")
			.takes_value(true))
		.arg(Arg::with_name("if_freq_hz")
			.long("if_freq_hz")
			.takes_value(true))
		.arg(Arg::with_name("prn")
			.long("prn")
			.required(true)
			.takes_value(true))
		.arg(Arg::with_name("system")
			.long("system")
			.help("Satellite system: G for GPS, S for SBAS")
			.takes_value(true))
		.arg(Arg::with_name("doppler_hz")
			.long("doppler_hz")
			.help("Acquisition Doppler estimate")
			.takes_value(true))
		.arg(Arg::with_name("code_phase_samples")
			.long("code_phase_samples")
			.help("Acquisition code phase estimate")
			.takes_value(true))
		.arg(Arg::with_name("pll_bw_hz")
			.long("pll_bw_hz")
			.takes_value(true))
		.arg(Arg::with_name("dll_bw_hz")
			.long("dll_bw_hz")
			.takes_value(true))
		.arg(Arg::with_name("dump_prefix")
			.long("dump_prefix")
			.help("Enables the binary tracking dump with this path prefix")
			.takes_value(true))
		.get_matches();

	let fs:f64 = matches.value_of("sample_rate_sps").unwrap_or("4e6").parse().map_err(|_| "Unable to parse sample rate")?;
	let if_freq_hz:f64 = matches.value_of("if_freq_hz").unwrap_or("0.0").parse().map_err(|_| "Unable to parse IF")?;
	let prn:u32 = matches.value_of("prn").ok_or("Missing PRN")?.parse().map_err(|_| "Unable to parse PRN")?;
	let system:char = matches.value_of("system").unwrap_or("G").chars().next().ok_or("Empty system")?;
	let doppler_hz:f64 = matches.value_of("doppler_hz").unwrap_or("0.0").parse().map_err(|_| "Unable to parse Doppler")?;
	let code_phase_samples:f64 = matches.value_of("code_phase_samples").unwrap_or("0.0").parse().map_err(|_| "Unable to parse code phase")?;

	let mut cfg = TrackingConfig::default_l1_ca(fs, (fs * 1.0e-3).round() as usize);
	cfg.if_freq_hz = if_freq_hz;
	if let Some(bw) = matches.value_of("pll_bw_hz") { cfg.pll_bw_hz = bw.parse().map_err(|_| "Unable to parse PLL bandwidth")?; }
	if let Some(bw) = matches.value_of("dll_bw_hz") { cfg.dll_bw_hz = bw.parse().map_err(|_| "Unable to parse DLL bandwidth")?; }
	if let Some(prefix) = matches.value_of("dump_prefix") {
		cfg.dump = true;
		cfg.dump_filename = prefix.to_string();
	}

	let fname:&str = matches.value_of("filename").ok_or("Missing filename")?;
	let mut src:Box<dyn IqSource> = match matches.value_of("input_type") {
		Some("i16") => Box::new(IqFileSourceI16::open(fname).map_err(|_| "Unable to open source file")?),
		_           => Box::new(IqFileSourceF32::open(fname).map_err(|_| "Unable to open source file")?),
	};

	let (event_tx, event_rx) = crossbeam_channel::bounded::<ChannelEvent>(10);

	let mut trk = Tracking::new(cfg, 0, Some(event_tx)).map_err(|_| "Invalid tracking configuration")?;
	trk.set_acquisition(AcquisitionHandoff {
		prn, system,
		acq_delay_samples: code_phase_samples,
		acq_doppler_hz: doppler_hz,
		acq_samplestamp_samples: 0,
	});
	trk.start_tracking().map_err(|_| "Unable to start tracking")?;

	eprintln!("Tracking {}{} from {} at {} [samples/sec]", system, prn, fname, fs);

	let mut buffer:Vec<Complex<f32>> = vec![];
	let mut outputs:[TrackingOutput; 1] = [TrackingOutput::default()];
	let mut last_second:u64 = 0;

	loop {
		let needed = trk.samples_needed();
		if buffer.len() < needed {
			let missing = needed - buffer.len();
			let got = src.read_block(&mut buffer, missing).map_err(|_| "Unable to read from source file")?;
			if got < missing {
				eprintln!("End of file");
				break;
			}
		}

		let (consumed, _produced) = trk.process(&buffer, &mut outputs);
		buffer.drain(..consumed);

		if let Ok(ChannelEvent::LossOfLock{ channel_id }) = event_rx.try_recv() {
			println!("{}", format!("Loss of lock in channel {}", channel_id).red().bold());
			break;
		}

		let second = (trk.sample_counter() as f64 / fs).floor() as u64;
		if second != last_second {
			last_second = second;
			let status = format!("t={:3} [s] doppler={:8.1} [Hz] code_freq={:11.1} [chips/s] cn0={:5.1} [dB-Hz] lock={:+.2}",
				second, trk.carrier_doppler_hz(), trk.code_freq_chips(), trk.cn0_db_hz(), trk.carrier_lock_test());
			if trk.cn0_db_hz() > 35.0 {
				println!("{}", status.green());
			} else {
				println!("{}", status.yellow());
			}
		}
	}

	Ok(())
}
