//! Reading the run log bundle.
//!
//! GitHub serves run logs as a zip archive with one text file per job step.
//! Bodies that are not zip archives are taken verbatim.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::error::GitHubError;

/// Local file header signature of a zip archive.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Maximum number of entries read from one bundle.
const MAX_ENTRIES: usize = 2_000;

/// Flatten a log bundle into one text blob.
///
/// Entries are concatenated in archive order, each terminated by a newline
/// so a `KEY=value` line at the end of one step never runs into the next.
/// At most `max_bytes` are unpacked; a bundle that inflates past that is
/// rejected rather than truncated, since a cut line could yield a wrong
/// credential.
pub fn read_log_bundle(body: &[u8], max_bytes: u64) -> Result<String, GitHubError> {
    if !body.starts_with(ZIP_MAGIC) {
        return Ok(String::from_utf8_lossy(body).into_owned());
    }

    let mut archive = ZipArchive::new(Cursor::new(body))?;
    let mut text = String::new();
    let mut unpacked: u64 = 0;

    for i in 0..archive.len().min(MAX_ENTRIES) {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }

        let remaining = max_bytes.saturating_sub(unpacked);
        let mut buffer = Vec::new();
        (&mut entry).take(remaining + 1).read_to_end(&mut buffer)?;
        unpacked += buffer.len() as u64;
        if unpacked > max_bytes {
            return Err(GitHubError::BundleTooLarge {
                size: unpacked,
                limit: max_bytes,
            });
        }
        text.push_str(&String::from_utf8_lossy(&buffer));
        if !text.ends_with('\n') {
            text.push('\n');
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn bundle(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, body) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_plain_text_passthrough() {
        let text = read_log_bundle(b"VPS_IP=10.0.0.5\n", 1024).unwrap();
        assert_eq!(text, "VPS_IP=10.0.0.5\n");
    }

    #[test]
    fn test_zip_entries_concatenated() {
        let body = bundle(&[
            ("1_Set up job.txt", "starting"),
            ("2_Expose desktop.txt", "VPS_IP=10.0.0.5\nVPS_USER=admin"),
        ]);
        let text = read_log_bundle(&body, 1024).unwrap();
        assert!(text.contains("starting\n"));
        assert!(text.contains("VPS_IP=10.0.0.5\nVPS_USER=admin\n"));
    }

    #[test]
    fn test_truncated_zip_is_an_error() {
        let mut body = bundle(&[("1.txt", "hello")]);
        body.truncate(10);
        assert!(read_log_bundle(&body, 1024).is_err());
    }

    #[test]
    fn test_inflated_bundle_over_limit_is_rejected() {
        let big = "x".repeat(4096);
        let body = bundle(&[("1.txt", "VPS_IP=10.0.0.5"), ("2.txt", big.as_str())]);

        let err = read_log_bundle(&body, 1024).unwrap_err();
        match err {
            GitHubError::BundleTooLarge { size, limit } => {
                assert_eq!(limit, 1024);
                assert!(size > 1024);
                assert!(size <= 1025);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(read_log_bundle(&body, 8192).is_ok());
    }
}
