//! nginx access-log decoding.
//!
//! The line layout is taken from a `log_format` directive in the nginx
//! configuration. Every `$variable` in the format becomes a named capture that
//! extends up to the next literal character, so
//! `'$remote_addr - [$time_local] "$request"'` parses
//! `10.0.0.1 - [01/Jan/2024:00:00:00 +0000] "GET / HTTP/1.1"` into three
//! string fields.

use std::collections::HashSet;
use std::io::{BufRead, Lines};
use std::path::Path;

use logspark_core::error::{Result, SparkError};
use logspark_core::Record;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

// ── Config lookup ─────────────────────────────────────────────────────────────

/// Extract the format string of `log_format <name>` from an nginx config.
///
/// Quoted parts are concatenated, an `escape=` parameter is ignored, and the
/// directive ends at the first `;` outside quotes. Commented-out directives
/// are not matched.
pub fn find_log_format(config: &str, name: &str) -> Option<String> {
    let pattern = format!(r"(?m)^[ \t]*log_format\s+{}\s+", regex::escape(name));
    let start = Regex::new(&pattern).ok()?.find(config)?.end();

    let mut format = String::new();
    let mut chars = config[start..].chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ';' => return Some(format),
            '\'' | '"' => {
                let quote = c;
                loop {
                    match chars.next()? {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                if escaped != quote {
                                    format.push('\\');
                                }
                                format.push(escaped);
                            }
                        }
                        ch if ch == quote => break,
                        ch => format.push(ch),
                    }
                }
            }
            ch if ch.is_whitespace() => {}
            ch => {
                let mut word = String::from(ch);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || next == ';' {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                if !word.starts_with("escape=") {
                    format.push_str(&word);
                }
            }
        }
    }

    // Unterminated directive.
    None
}

// ── LogFormat ─────────────────────────────────────────────────────────────────

/// Compiled line parser for one nginx `log_format`.
#[derive(Debug, Clone)]
pub struct LogFormat {
    regex: Regex,
    fields: Vec<String>,
}

impl LogFormat {
    /// Compile a format string such as
    /// `$remote_addr - $remote_user [$time_local] "$request"`.
    pub fn compile(format: &str) -> Result<Self> {
        let chars: Vec<char> = format.chars().collect();
        let mut pattern = String::from("^");
        let mut fields: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut literal = String::new();

        let mut i = 0;
        while i < chars.len() {
            if chars[i] != '$' {
                literal.push(chars[i]);
                i += 1;
                continue;
            }

            let (name, end) = read_variable(&chars, i + 1);
            if name.is_empty() {
                literal.push('$');
                i += 1;
                continue;
            }

            pattern.push_str(&regex::escape(&literal));
            literal.clear();

            let body = match chars.get(end) {
                Some(&stop) => format!("[^{}]*", regex::escape(&stop.to_string())),
                None => ".*".to_string(),
            };
            if seen.insert(name.clone()) {
                pattern.push_str(&format!("(?P<{name}>{body})"));
                fields.push(name);
            } else {
                pattern.push_str(&format!("(?:{body})"));
            }
            i = end;
        }
        pattern.push_str(&regex::escape(&literal));
        pattern.push('$');

        if fields.is_empty() {
            return Err(SparkError::InvalidFormat(format!(
                "no $variables in {format:?}"
            )));
        }

        let regex =
            Regex::new(&pattern).map_err(|e| SparkError::InvalidFormat(e.to_string()))?;
        debug!(%pattern, "compiled log format");

        Ok(Self { regex, fields })
    }

    /// Variable names in the order they appear in the format.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Split one access-log line into a string-valued record.
    pub fn parse_line(&self, line: &str, line_no: usize) -> Result<Record> {
        let caps = self
            .regex
            .captures(line)
            .ok_or(SparkError::LineMismatch { line: line_no })?;

        let mut record = Record::new();
        for field in &self.fields {
            let text = caps.name(field).map_or("", |m| m.as_str());
            record.insert(field.clone(), Value::String(text.to_string()));
        }
        Ok(record)
    }
}

/// Read a variable name starting at `start` (just after the `$`). Supports
/// both `$name` and `${name}`. Returns the name and the index after it.
fn read_variable(chars: &[char], start: usize) -> (String, usize) {
    if chars.get(start) == Some(&'{') {
        if let Some(close) = chars[start..].iter().position(|&c| c == '}') {
            let name: String = chars[start + 1..start + close].iter().collect();
            if is_variable_name(&name) {
                return (name, start + close + 1);
            }
        }
        return (String::new(), start);
    }

    let mut end = start;
    while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

fn is_variable_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Read `path` and compile its `log_format <name>`.
pub fn load_log_format(path: &Path, name: &str) -> Result<LogFormat> {
    let config = std::fs::read_to_string(path).map_err(|source| SparkError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let format = find_log_format(&config, name).ok_or_else(|| SparkError::FormatNotFound {
        name: name.to_string(),
        path: path.to_path_buf(),
    })?;

    let compiled = LogFormat::compile(&format)?;
    info!(
        name,
        path = %path.display(),
        fields = compiled.fields().len(),
        "loaded nginx log format"
    );
    Ok(compiled)
}

// ── NginxReader ───────────────────────────────────────────────────────────────

/// Iterator over the records of an access-log stream.
pub struct NginxReader<R> {
    lines: Lines<R>,
    format: LogFormat,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> NginxReader<R> {
    pub fn new(input: R, format: LogFormat) -> Self {
        Self {
            lines: input.lines(),
            format,
            line_no: 0,
            done: false,
        }
    }

    /// Build a reader whose format comes from `log_format <name>` in the
    /// config file at `path`.
    pub fn from_config_file(input: R, path: &Path, name: &str) -> Result<Self> {
        Ok(Self::new(input, load_log_format(path, name)?))
    }
}

impl<R: BufRead> Iterator for NginxReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = match self.lines.next() {
                Some(Ok(l)) => l,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(SparkError::Io(e)));
                }
                None => {
                    self.done = true;
                    return None;
                }
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            return Some(self.format.parse_line(&line, self.line_no));
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;

    const NGINX_CONF: &str = r#"
http {
    # log_format main 'commented out $nothing';
    log_format  main  '$remote_addr - $remote_user [$time_local] "$request" '
                      '$status $body_bytes_sent "$http_referer" '
                      '"$http_user_agent" "$http_x_forwarded_for"';

    log_format short escape=json "$status $request_time";

    access_log  /var/log/nginx/access.log  main;
}
"#;

    const LINE: &str = r#"127.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 612 "-" "curl/8.0" "-""#;

    fn write_conf(dir: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("nginx.conf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    // ── find_log_format ───────────────────────────────────────────────────────

    #[test]
    fn test_find_multiline_format() {
        let format = find_log_format(NGINX_CONF, "main").expect("main present");
        assert_eq!(
            format,
            r#"$remote_addr - $remote_user [$time_local] "$request" $status $body_bytes_sent "$http_referer" "$http_user_agent" "$http_x_forwarded_for""#
        );
    }

    #[test]
    fn test_find_ignores_escape_parameter() {
        assert_eq!(
            find_log_format(NGINX_CONF, "short").as_deref(),
            Some("$status $request_time")
        );
    }

    #[test]
    fn test_find_missing_format() {
        assert!(find_log_format(NGINX_CONF, "combined").is_none());
        assert!(find_log_format(NGINX_CONF, "nothing").is_none());
    }

    // ── LogFormat ─────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_main_line() {
        let format = LogFormat::compile(&find_log_format(NGINX_CONF, "main").unwrap()).unwrap();
        assert_eq!(format.fields().len(), 9);

        let rec = format.parse_line(LINE, 1).expect("line matches");
        assert_eq!(rec["remote_addr"], "127.0.0.1");
        assert_eq!(rec["remote_user"], "-");
        assert_eq!(rec["time_local"], "10/Oct/2023:13:55:36 +0000");
        assert_eq!(rec["request"], "GET /index.html HTTP/1.1");
        assert_eq!(rec["status"], "200");
        assert_eq!(rec["body_bytes_sent"], "612");
        assert_eq!(rec["http_user_agent"], "curl/8.0");
    }

    #[test]
    fn test_trailing_variable_takes_rest_of_line() {
        let format = LogFormat::compile("$status $request").unwrap();
        let rec = format.parse_line("404 GET /missing HTTP/1.1", 1).unwrap();
        assert_eq!(rec["status"], "404");
        assert_eq!(rec["request"], "GET /missing HTTP/1.1");
    }

    #[test]
    fn test_braced_and_repeated_variables() {
        let format = LogFormat::compile("${host}:$port $host").unwrap();
        assert_eq!(format.fields(), ["host", "port"]);
        let rec = format.parse_line("example.org:443 example.org", 1).unwrap();
        assert_eq!(rec["host"], "example.org");
        assert_eq!(rec["port"], "443");
    }

    #[test]
    fn test_mismatch_reports_line() {
        let format = LogFormat::compile("[$time_local] $status").unwrap();
        assert!(matches!(
            format.parse_line("no brackets here", 5),
            Err(SparkError::LineMismatch { line: 5 })
        ));
    }

    #[test]
    fn test_format_without_variables_is_invalid() {
        assert!(matches!(
            LogFormat::compile("plain text"),
            Err(SparkError::InvalidFormat(_))
        ));
    }

    // ── load / reader ─────────────────────────────────────────────────────────

    #[test]
    fn test_load_missing_file() {
        let err = load_log_format(Path::new("/definitely/not/nginx.conf"), "main").unwrap_err();
        assert!(matches!(err, SparkError::FileRead { .. }));
    }

    #[test]
    fn test_load_missing_format_name() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_conf(&dir, NGINX_CONF);
        let err = load_log_format(&path, "upstream").unwrap_err();
        assert!(matches!(err, SparkError::FormatNotFound { .. }));
    }

    #[test]
    fn test_reader_from_config_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_conf(&dir, NGINX_CONF);
        let input = format!("{LINE}\n\ngarbage\n{LINE}\n");

        let reader = NginxReader::from_config_file(Cursor::new(input.into_bytes()), &path, "main")
            .expect("reader");
        let results: Vec<Result<Record>> = reader.collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(SparkError::LineMismatch { line: 3 })));
        assert_eq!(results[2].as_ref().unwrap()["status"], "200");
    }
}
