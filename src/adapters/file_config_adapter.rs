//! `configparser`-backed [`ConfigPort`] for paperledger INI files.
//!
//! Section and key names are case-insensitive. A key whose value is blank
//! reads as absent, so `api_key =` falls back the same way a missing line
//! does.

use crate::domain::error::LedgerError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;
use std::str::FromStr;

pub struct FileConfigAdapter {
    ini: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let mut ini = Ini::new();
        ini.load(path).map_err(|reason| LedgerError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { ini })
    }

    pub fn from_string(content: &str) -> Result<Self, LedgerError> {
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| LedgerError::ConfigParse {
                file: "<inline>".into(),
                reason,
            })?;
        Ok(Self { ini })
    }

    fn value(&self, section: &str, key: &str) -> Option<String> {
        self.ini
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parsed<T: FromStr>(&self, section: &str, key: &str) -> Option<T> {
        self.value(section, key).and_then(|v| v.parse().ok())
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.value(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.parsed(section, key).unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.parsed(section, key).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[ledger]
initial_cash = 250000

[storage]
backend = sqlite
path = /var/lib/paperledger/ledger.db

[quotes]
api_key = demo
lookback_weeks = 4
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("storage", "backend"),
            Some("sqlite".to_string())
        );
        assert_eq!(
            adapter.get_string("storage", "path"),
            Some("/var/lib/paperledger/ledger.db".to_string())
        );
        assert_eq!(adapter.get_double("ledger", "initial_cash", 0.0), 250000.0);
        assert_eq!(adapter.get_int("quotes", "lookback_weeks", 2), 4);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[ledger]\ninitial_cash = 100\n").unwrap();
        assert_eq!(adapter.get_string("ledger", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[quotes]\n").unwrap();
        assert_eq!(adapter.get_int("quotes", "chunk_size", 5), 5);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[quotes]\nchunk_size = abc\n").unwrap();
        assert_eq!(adapter.get_int("quotes", "chunk_size", 5), 5);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[ledger]\ninitial_cash = lots\n").unwrap();
        assert_eq!(adapter.get_double("ledger", "initial_cash", 99.9), 99.9);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[catalog]\npath = /data/sp500.csv\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("catalog", "path"),
            Some("/data/sp500.csv".to_string())
        );
    }

    #[test]
    fn blank_value_reads_as_absent() {
        let adapter =
            FileConfigAdapter::from_string("[quotes]\napi_key =\nchunk_size =   \n").unwrap();
        assert_eq!(adapter.get_string("quotes", "api_key"), None);
        assert_eq!(adapter.get_int("quotes", "chunk_size", 5), 5);
    }

    #[test]
    fn names_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[Ledger]\nInitial_Cash = 5000\n").unwrap();
        assert_eq!(adapter.get_double("ledger", "initial_cash", 0.0), 5000.0);
    }

    #[test]
    fn missing_file_is_config_parse_error() {
        assert!(matches!(
            FileConfigAdapter::from_file("/nonexistent/paperledger.ini"),
            Err(LedgerError::ConfigParse { .. })
        ));
    }
}
