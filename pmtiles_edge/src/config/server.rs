use serde::Deserialize;

pub const DEFAULT_IP: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
	/// IP to bind to. Default: 0.0.0.0
	pub ip: Option<String>,

	/// TCP port to bind to. Default: 8080
	pub port: Option<u16>,
}

impl ServerConfig {
	pub fn override_optional_ip(&mut self, ip: &Option<String>) {
		if ip.is_some() {
			self.ip = ip.clone();
		}
	}

	pub fn override_optional_port(&mut self, port: &Option<u16>) {
		if port.is_some() {
			self.port = *port;
		}
	}

	pub fn ip(&self) -> &str {
		self.ip.as_deref().unwrap_or(DEFAULT_IP)
	}

	pub fn port(&self) -> u16 {
		self.port.unwrap_or(DEFAULT_PORT)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_and_overrides() {
		let mut config = ServerConfig::default();
		assert_eq!(config.ip(), "0.0.0.0");
		assert_eq!(config.port(), 8080);

		config.override_optional_port(&Some(3000));
		config.override_optional_ip(&None);
		assert_eq!(config.ip(), "0.0.0.0");
		assert_eq!(config.port(), 3000);

		config.override_optional_ip(&Some("127.0.0.1".to_string()));
		config.override_optional_port(&None);
		assert_eq!(config.ip(), "127.0.0.1");
		assert_eq!(config.port(), 3000);
	}
}
