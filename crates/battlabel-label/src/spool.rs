use battlabel_core::PrinterError;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_SPOOL_DIR: &str = "temp";
pub const IMAGE_FILE_NAME: &str = "qrcode.png";
pub const TEXT_FILE_NAME: &str = "label.txt";

/// Writes `bytes` to `dir/file_name`, creating `dir` and replacing any
/// previous file. The handle is closed before this returns.
pub fn write_spool_file(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, PrinterError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let mut file = std::fs::File::create(&path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(path)
}

/// Reads the `spool_dir` key from a printer config, defaulting to `temp`.
pub(crate) fn spool_dir_from(config: &toml::Value) -> Result<PathBuf, PrinterError> {
    match config.get("spool_dir") {
        None => Ok(PathBuf::from(DEFAULT_SPOOL_DIR)),
        Some(v) => v.as_str().map(PathBuf::from).ok_or_else(|| {
            PrinterError::InitializationFailed("'spool_dir' must be a string".to_string())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_dir_and_file() {
        let dir = std::env::temp_dir().join("battlabel_spool_create").join("nested");
        let _ = std::fs::remove_dir_all(&dir);

        let path = write_spool_file(&dir, IMAGE_FILE_NAME, b"one").unwrap();
        assert_eq!(path, dir.join(IMAGE_FILE_NAME));
        assert_eq!(std::fs::read(&path).unwrap(), b"one");

        std::fs::remove_dir_all(dir.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_write_overwrites_previous_file() {
        let dir = std::env::temp_dir().join("battlabel_spool_overwrite");
        write_spool_file(&dir, IMAGE_FILE_NAME, b"a much longer first payload").unwrap();
        let path = write_spool_file(&dir, IMAGE_FILE_NAME, b"short").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"short");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_into_file_path_reports_io_error() {
        let blocker = std::env::temp_dir().join("battlabel_spool_blocker");
        std::fs::write(&blocker, b"not a dir").unwrap();
        let result = write_spool_file(&blocker, IMAGE_FILE_NAME, b"x");
        assert!(matches!(result, Err(PrinterError::Io(_))));
        std::fs::remove_file(&blocker).unwrap();
    }

    #[test]
    fn test_spool_dir_default_and_custom() {
        let empty = toml::Value::Table(Default::default());
        assert_eq!(spool_dir_from(&empty).unwrap(), PathBuf::from("temp"));

        let mut t = toml::map::Map::new();
        t.insert("spool_dir".to_string(), toml::Value::String("/tmp/x".to_string()));
        assert_eq!(
            spool_dir_from(&toml::Value::Table(t)).unwrap(),
            PathBuf::from("/tmp/x")
        );
    }

    #[test]
    fn test_spool_dir_wrong_type_fails() {
        let mut t = toml::map::Map::new();
        t.insert("spool_dir".to_string(), toml::Value::Integer(3));
        assert!(matches!(
            spool_dir_from(&toml::Value::Table(t)),
            Err(PrinterError::InitializationFailed(_))
        ));
    }
}
