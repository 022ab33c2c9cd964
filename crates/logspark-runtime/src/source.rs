//! Record sources built from the configured input format.

use std::io::{self, BufRead, BufReader};

use logspark_core::error::Result;
use logspark_core::settings::{InputFormat, Settings};
use logspark_core::Record;
use logspark_data::nginx::NginxReader;
use logspark_data::reader::JsonReader;

/// A blocking stream of decoded records handed to the ingestion task.
pub type RecordSource = Box<dyn Iterator<Item = Result<Record>> + Send>;

/// Build the record source for `settings` on top of `input`.
///
/// For the nginx format the config file is read here, so a missing file or
/// log format fails at startup rather than inside the ingestion task.
pub fn open<R>(settings: &Settings, input: R) -> Result<RecordSource>
where
    R: BufRead + Send + 'static,
{
    match settings.format {
        InputFormat::Json => Ok(Box::new(JsonReader::new(input))),
        InputFormat::Nginx => Ok(Box::new(NginxReader::from_config_file(
            input,
            &settings.nginx_config,
            &settings.nginx_format,
        )?)),
    }
}

/// [`open`] over the process's standard input.
pub fn open_stdin(settings: &Settings) -> Result<RecordSource> {
    open(settings, BufReader::new(io::stdin()))
}
