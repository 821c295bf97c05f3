mod event;

use std::{
	fs::File,
	io::{BufReader, BufWriter, Write},
	path::PathBuf,
	time::Instant,
};

use clap::Parser;
use colored::Colorize;
use rayon::prelude::*;
use shower_shape::Settings;

use crate::event::{EventFeatures, Input};

#[derive(thiserror::Error, Debug)]
enum Error {
	#[error(transparent)]
	Shower(#[from] shower_shape::Error),

	#[error("Event {index}: {source}")]
	Event { index: usize, source: shower_shape::Error },

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	ThreadPool(#[from] rayon::ThreadPoolBuildError),

	#[error("Radius must be finite")]
	InvalidRadius,
}

/// Compute shower shape features for the clusters of every event in the input file.
#[derive(clap::Parser)]
#[command(version)]
struct Command {
	/// Input file with the geometry and the events
	input_file: PathBuf,

	/// Settings file, defaults are used for missing values
	#[arg(long, short)]
	settings: Option<PathBuf>,

	/// Cylinder radius in cm, overrides the settings
	#[arg(long, short)]
	radius: Option<f64>,

	/// Output file location. Written to stdout if not specified.
	#[arg(long, short)]
	output: Option<PathBuf>,

	/// Maximal thread count for multithreading. 0 for the amount of logical cores.
	#[arg(long, default_value_t = 0)]
	max_threads: usize,
}

fn main() {
	env_logger::init();

	if let Err(err) = run(Command::parse()) {
		eprintln!("{} {}", "Error:".red().bold(), err);
		std::process::exit(1);
	}
}

fn run(command: Command) -> Result<(), Error> {
	let mut settings = match &command.settings {
		Some(path) => Settings::from_file(path)?,
		None => Settings::default(),
	};
	if let Some(radius) = command.radius {
		if !radius.is_finite() {
			return Err(Error::InvalidRadius);
		}
		settings.radius = radius;
	}

	let start = Instant::now();
	let input: Input = serde_json::from_reader(BufReader::new(File::open(&command.input_file)?))?;
	log::info!(
		"Loaded {} cells and {} events in {:.2?}",
		input.geometry.len(),
		input.events.len(),
		start.elapsed()
	);

	let start = Instant::now();
	let results = rayon::ThreadPoolBuilder::new()
		.num_threads(command.max_threads)
		.build()?
		.install(|| {
			input
				.events
				.par_iter()
				.enumerate()
				.map(|(index, event)| {
					event
						.process(index, &input.geometry, &settings)
						.map_err(|source| Error::Event { index, source })
				})
				.collect::<Result<Vec<_>, _>>()
		})?;
	log::info!("Processed {} events in {:.2?}", results.len(), start.elapsed());

	match &command.output {
		Some(path) => write(BufWriter::new(File::create(path)?), &results),
		None => write(std::io::stdout().lock(), &results),
	}
}

fn write(mut writer: impl Write, results: &[EventFeatures]) -> Result<(), Error> {
	serde_json::to_writer_pretty(&mut writer, results)?;
	writeln!(writer)?;
	writer.flush()?;
	Ok(())
}
