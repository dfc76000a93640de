use std::path::PathBuf;

use embedfs::{includes_from_file, Compression, Include};

use crate::error::{Error, Result};

/// Everything one embedgen run needs, collected from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub includes: Vec<Include>,
    pub compression: Compression,
    pub output_dir: PathBuf,
    pub name: String,
    pub debug: bool,
}

impl Config {
    /// Builds the config from parsed flags. `--include-file` lists are read here.
    pub fn from_matches(matches: &clap::ArgMatches) -> Result<Config> {
        let mut includes = Vec::new();
        for value in matches.values_of("include").into_iter().flatten() {
            let (path, declared_in) = split_declaration(value)?;
            includes.push(Include::new(path, declared_in));
        }
        for value in matches.values_of("include-file").into_iter().flatten() {
            let (list, declared_in) = split_declaration(value)?;
            includes.extend(includes_from_file(list, declared_in)?);
        }
        if includes.is_empty() {
            return Err(Error::CliInput(
                "at least one --include or --include-file is required".to_string(),
            ));
        }

        let name = matches.value_of("name").unwrap_or("bundle").to_string();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(Error::CliInput(format!("invalid bundle name: {:?}", name)));
        }

        Ok(Config {
            includes,
            compression: if matches.is_present("gzip") {
                Compression::Gzip
            } else {
                Compression::None
            },
            output_dir: PathBuf::from(matches.value_of("output").unwrap_or(".")),
            name,
            debug: matches.is_present("debug"),
        })
    }
}

/// Splits `PATH:DECLARING_FILE` on the last colon.
fn split_declaration(value: &str) -> Result<(&str, &str)> {
    match value.rsplit_once(':') {
        Some((path, declared_in)) if !path.is_empty() && !declared_in.is_empty() => {
            Ok((path, declared_in))
        }
        _ => Err(Error::CliInput(format!(
            "expected PATH:DECLARING_FILE, got {:?}",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(args: &[&str]) -> Result<Config> {
        let mut argv = vec!["embedgen"];
        argv.extend_from_slice(args);
        let matches = crate::cli::app().get_matches_from(argv);
        Config::from_matches(&matches)
    }

    #[test]
    fn test_defaults() {
        let config = config(&["--include", "asset:assets.rs"]).unwrap();
        assert_eq!(config.includes, vec![Include::new("asset", "assets.rs")]);
        assert_eq!(config.compression, Compression::None);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.name, "bundle");
        assert!(!config.debug);
    }

    #[test]
    fn test_repeated_includes() {
        let config = config(&[
            "-d",
            "--gzip",
            "-o",
            "out",
            "-n",
            "web",
            "--include",
            "static/css:web_linux.rs",
            "-i",
            "static/js:web_windows_amd64.rs",
        ])
        .unwrap();
        assert_eq!(
            config.includes,
            vec![
                Include::new("static/css", "web_linux.rs"),
                Include::new("static/js", "web_windows_amd64.rs"),
            ]
        );
        assert_eq!(config.compression, Compression::Gzip);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.name, "web");
        assert!(config.debug);
    }

    #[test]
    fn test_include_file_lists_are_read() {
        let tmp = tempfile::tempdir().unwrap();
        let list = tmp.path().join("list.txt");
        std::fs::write(&list, "static/css\n\nstatic/js\n").unwrap();

        let config = config(&[
            "--include-file",
            &format!("{}:web_linux.rs", list.display()),
            "--include",
            "asset:web.rs",
        ])
        .unwrap();
        assert_eq!(
            config.includes,
            vec![
                Include::new("asset", "web.rs"),
                Include::new("static/css", "web_linux.rs"),
                Include::new("static/js", "web_linux.rs"),
            ]
        );
    }

    #[test]
    fn test_missing_include_file_is_an_error() {
        let err = config(&["--include-file", "no/such/list.txt:web.rs"]).unwrap_err();
        assert!(matches!(err, Error::Embed(_)));
    }

    #[test]
    fn test_split_on_last_colon() {
        assert_eq!(split_declaration("a:b:c.rs").unwrap(), ("a:b", "c.rs"));
        assert!(split_declaration("asset").is_err());
        assert!(split_declaration(":x.rs").is_err());
        assert!(split_declaration("asset:").is_err());
    }

    #[test]
    fn test_requires_an_include() {
        assert!(matches!(config(&["--gzip"]), Err(Error::CliInput(_))));
        assert!(matches!(
            config(&["-n", "a/b", "-i", "asset:x.rs"]),
            Err(Error::CliInput(_))
        ));
    }
}
