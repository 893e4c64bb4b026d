use thiserror::Error;

/// Failures of archive reads.
///
/// Callers only ever recover [`ArchiveError::KeyNotFound`]; every other variant is
/// passed on. [`ArchiveError::EtagMismatch`] is consumed inside [`crate::PMTiles`],
/// which invalidates its cached view of the archive and retries once.
#[derive(Debug, Error)]
pub enum ArchiveError {
	#[error("archive '{0}' not found")]
	KeyNotFound(String),

	#[error("archive changed since it was last read (etag mismatch)")]
	EtagMismatch,

	#[error("archive read was cancelled")]
	Cancelled,

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl ArchiveError {
	pub fn is_key_not_found(&self) -> bool {
		matches!(self, ArchiveError::KeyNotFound(_))
	}
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn messages() {
		assert_eq!(
			ArchiveError::KeyNotFound("osm".into()).to_string(),
			"archive 'osm' not found"
		);
		assert_eq!(
			ArchiveError::from(anyhow::anyhow!("boom")).to_string(),
			"boom"
		);
	}

	#[test]
	fn only_key_not_found_is_key_not_found() {
		assert!(ArchiveError::KeyNotFound("a".into()).is_key_not_found());
		assert!(!ArchiveError::EtagMismatch.is_key_not_found());
		assert!(!ArchiveError::Cancelled.is_key_not_found());
		assert!(!ArchiveError::Other(anyhow::anyhow!("x")).is_key_not_found());
	}
}
