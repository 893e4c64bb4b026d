use serde::Serialize;
use serde_json::Value;

/// TileJSON 3.0.0 document describing one archive.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TileJson {
	pub tilejson: &'static str,
	pub scheme: &'static str,
	pub tiles: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub vector_layers: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub attribution: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub version: Option<Value>,
	pub bounds: [f64; 4],
	pub center: (f64, f64, u8),
	pub minzoom: u8,
	pub maxzoom: u8,
}

impl TileJson {
	pub fn to_json_string(&self) -> String {
		// Serializing plain strings, numbers and JSON values cannot fail.
		serde_json::to_string(self).unwrap_or_default()
	}
}
