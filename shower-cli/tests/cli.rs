use std::{fs, process::Command};

const EVENTS: &str = r#"{
	"geometry": [
		{ "id": 1, "position": [20.0, 40.0, 320.0], "layer": 1, "thickness_class": 0, "depth": 1.0 },
		{ "id": 2, "position": [20.0, 40.0, 321.0], "layer": 2, "thickness_class": 0, "depth": 2.0 },
		{ "id": 3, "position": [20.0, 40.0, 322.0], "layer": 3, "thickness_class": 1, "depth": 3.0 },
		{ "id": 4, "position": [20.0, 40.0, 330.0], "layer": 29, "thickness_class": 2, "depth": 27.0 },
		{ "id": 5, "position": [21.5, 40.0, 323.0], "layer": 4, "thickness_class": 0, "depth": 4.0 }
	],
	"events": [
		{
			"hits": {
				"front": [
					{ "id": 1, "energy": 40.0 },
					{ "id": 2, "energy": 80.0 },
					{ "id": 3, "energy": 60.0 },
					{ "id": 5, "energy": 5.0 }
				],
				"middle": [{ "id": 4, "energy": 2.0 }]
			},
			"objects": [{ "hits_and_fractions": [[1, 1.0], [2, 1.0], [3, 1.0], [4, 1.0], [5, 1.0]] }, null]
		},
		{
			"objects": [{ "hits_and_fractions": [[1, 1.0]] }]
		}
	]
}"#;

fn shower() -> Command {
	Command::new(env!("CARGO_BIN_EXE_shower"))
}

#[test]
fn writes_one_table_per_event() {
	let dir = tempfile::tempdir().unwrap();
	let input = dir.path().join("events.json");
	let output = dir.path().join("features.json");
	fs::write(&input, EVENTS).unwrap();

	let status = shower()
		.arg(&input)
		.arg("--output")
		.arg(&output)
		.args(["--max-threads", "2"])
		.status()
		.unwrap();
	assert!(status.success());

	let result: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
	let events = result.as_array().unwrap();
	assert_eq!(events.len(), 2);

	let first = &events[0];
	assert_eq!(first["event"], 0);
	assert_eq!(first["objects"], 2);
	let features = first["features"].as_object().unwrap();
	assert_eq!(features.len(), 16);
	assert!(features.values().all(|column| column.as_array().unwrap().len() == 2));
	assert_eq!(features["nLayers"][0], 5.0);
	assert_eq!(features["lastLayer"][0], 29.0);
	assert!(features["energyFH"][0].as_f64().unwrap() > 0.0);
	assert_eq!(features["sigmaUU"][1], 0.0);

	// no hits in the second event
	let second = &events[1]["features"];
	assert_eq!(second["sigmaUU"][0], -1.0);
	assert_eq!(second["measuredDepth"][0], -999.0);
	assert_eq!(second["nLayers"][0], 0.0);
}

#[test]
fn settings_file_and_stdout() {
	let dir = tempfile::tempdir().unwrap();
	let input = dir.path().join("events.json");
	let settings = dir.path().join("settings.json");
	fs::write(&input, EVENTS).unwrap();
	fs::write(&settings, r#"{ "radius": 0.1 }"#).unwrap();

	let output = shower().arg(&input).arg("--settings").arg(&settings).output().unwrap();
	assert!(output.status.success());
	let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

	// the off-axis cell falls outside the narrow cylinder
	let features = &result[0]["features"];
	assert_eq!(features["nLayers"][0], 4.0);
	assert_eq!(features["lastLayer"][0], 29.0);
}

#[test]
fn missing_input_fails() {
	let dir = tempfile::tempdir().unwrap();
	let output = shower().arg(dir.path().join("missing.json")).output().unwrap();
	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}
